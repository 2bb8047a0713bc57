pub mod event;

mod common;
mod errors;
mod stream;

pub use common::*;
pub use errors::StreamError;
pub use stream::Stream;
