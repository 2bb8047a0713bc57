mod delta;
mod filter_events;
mod merge_events;
mod partition;
mod slice;
mod tempo;

pub use delta::*;
pub use filter_events::*;
pub use merge_events::*;
pub use partition::*;
pub use slice::*;
pub use tempo::*;
