//! Kernel catalog, command-line templates and process-count constraints.

pub mod config;
pub mod registry;
pub mod validator;

pub use config::*;
pub use registry::*;
pub use validator::*;
