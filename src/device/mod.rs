//! Device access
//!
//! Thin façade over the request transport for one registered endpoint.

mod handle;
mod request;
mod transport;

pub use handle::*;
pub use request::*;
pub use transport::*;
