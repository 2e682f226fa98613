//! Canonical history storage port.

use crate::domain::error::TickerError;
use crate::domain::history::History;
use crate::ports::log_port::LogPort;

pub trait HistoryPort {
    /// Load the stored history. A missing or unreadable store yields an empty
    /// history rather than an error.
    fn load(&self, log: &dyn LogPort) -> History;

    /// Replace the stored history as a whole.
    fn store(&self, history: &History) -> Result<(), TickerError>;
}
