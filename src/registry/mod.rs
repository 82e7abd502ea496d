//! Endpoint registration registry
//!
//! Tracks active registrations by endpoint name and registration id,
//! notifies listeners of lifecycle changes, and evicts expired leases.

mod clock;
mod index;
mod listener;
mod registration;
mod sweeper;

pub use clock::*;
pub use listener::*;
pub use registration::*;
pub use sweeper::*;
