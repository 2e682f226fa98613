//! Report publishing port.

use crate::domain::error::TickerError;
use crate::domain::report::ReportPayload;

pub trait ReportPort {
    /// Write the payload; returns the `(label, path)` pairs that were produced.
    fn publish(
        &self,
        payload: &ReportPayload,
    ) -> Result<Vec<(String, std::path::PathBuf)>, TickerError>;
}
