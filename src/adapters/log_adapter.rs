//! `LogPort` backed by the `log` facade.

use log::Level;

use crate::ports::log_port::LogPort;

pub const LOG_TARGET: &str = "webticker";

#[derive(Debug, Clone, Copy, Default)]
pub struct LogCrateAdapter;

impl LogPort for LogCrateAdapter {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: LOG_TARGET, level, "{message}");
    }
}
