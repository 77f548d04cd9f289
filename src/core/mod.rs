//! Core utilities, configuration, and common functionality

pub mod config;
pub mod error;
pub mod logging;
pub mod process;
pub mod validation;

// Re-exports for convenience
pub use config::Limits;
pub use error::AppError;
pub use logging::{init_logger, log_tool_configuration};
