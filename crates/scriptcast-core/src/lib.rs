//! Scriptcast Core Library
//!
//! Domain models, error types, configuration and the backend gateway contract
//! shared by the scriptcast client crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod models;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ErrorMetadata, GatewayError, LogLevel, UploadError, WorkflowError};
pub use gateway::BackendGateway;
