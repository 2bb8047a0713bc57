//! Category substitution: replaces the notes of randomly chosen percussion categories of a
//! stream with example streams.

mod categories;
mod library;
mod policy;

pub use categories::*;
pub use library::*;
pub use policy::*;
