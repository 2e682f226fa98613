//! Domain error types.

/// Top-level error type for webticker.
#[derive(Debug, thiserror::Error)]
pub enum TickerError {
    #[error("cannot decode {path} with any supported encoding")]
    Decode { path: String },

    #[error("invalid log line {line}: {reason}")]
    LogFormat { line: usize, reason: String },

    #[error("invalid payload in log line {line}: {reason}")]
    LogPayload { line: usize, reason: String },

    #[error("account statement: {reason}")]
    StatementTable { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("upload failed: {reason}")]
    Upload { reason: String },

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TickerError> for std::process::ExitCode {
    fn from(err: &TickerError) -> Self {
        let code: u8 = match err {
            TickerError::Io(_) => 1,
            TickerError::ConfigParse { .. }
            | TickerError::ConfigMissing { .. }
            | TickerError::ConfigInvalid { .. } => 2,
            TickerError::Decode { .. }
            | TickerError::LogFormat { .. }
            | TickerError::LogPayload { .. }
            | TickerError::StatementTable { .. } => 3,
            TickerError::Upload { .. } => 4,
            TickerError::Serialize(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
