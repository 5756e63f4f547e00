pub mod progress;
pub mod session;

pub use progress::{ChannelSink, DiscardSink, EventSink};
pub use session::Pipeline;
