//! Benchmark matrix driver and metric-extraction pipeline.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod sink;

#[cfg(feature = "cli")]
pub use cli::*;
pub use config::*;
pub use driver::*;
pub use error::*;
pub use extract::*;
pub use sink::*;
