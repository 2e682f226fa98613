//! Transfer of published files to their remote targets.

use std::path::PathBuf;

use crate::domain::error::TickerError;
use crate::ports::log_port::LogPort;

pub trait UploadPort {
    /// Upload `(label, local_path)` pairs. The label picks the remote target.
    fn upload(&self, files: &[(String, PathBuf)], log: &dyn LogPort) -> Result<(), TickerError>;
}
