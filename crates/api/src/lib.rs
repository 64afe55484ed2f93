//! HTTP front end for the fraud-risk scoring pipeline.

pub mod config;
pub mod metrics;
pub mod routes;

pub use config::{AppConfig, LogFormat, LoggingConfig};
pub use routes::{AppState, StartupError, router};
