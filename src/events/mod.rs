//! Outbound events
//!
//! Registry lifecycle transitions and observed values are turned into
//! topic-addressed events and handed to an [`EventSink`].

mod lifecycle;
mod observation;
mod sink;

pub use lifecycle::*;
pub use observation::*;
pub use sink::*;
