//! Application-level configuration.
//!
//! - [`PollingParams`]: retry bounds for each polling strategy

pub mod polling_params;

pub use polling_params::PollingParams;
