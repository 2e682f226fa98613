//! Port traits (interfaces) for the hexagonal architecture.

pub mod config_port;
pub mod history_port;
pub mod log_port;
pub mod report_port;
pub mod source_port;
pub mod upload_port;
