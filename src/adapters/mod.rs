//! Concrete adapter implementations for ports.

pub mod directory_upload_adapter;
pub mod file_config_adapter;
pub mod json_file_adapter;
pub mod log_adapter;
pub mod state_log_adapter;
pub mod statement_adapter;
pub mod text_decode;
