//! Data models for the endpoint registry
//!
//! These models represent registered devices and the deltas they send.

mod error;
mod path;
mod record;
mod update;

pub use error::*;
pub use path::*;
pub use record::*;
pub use update::*;
