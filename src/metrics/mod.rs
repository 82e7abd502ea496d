//! Registry activity metrics

mod prometheus;

pub use self::prometheus::*;
