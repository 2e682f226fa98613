//! Run settings resolved from configuration.
//!
//! Relative paths are resolved against the directory of the config file.

use std::path::{Path, PathBuf};

use crate::domain::error::TickerError;
use crate::domain::report::{DEFAULT_BOT_NAME, ReportOptions};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_OUTPUT_JSON: &str = "TKB-WebTicker.json";
pub const DEFAULT_WELLDONE_FILE: &str = "TKB-WebTicker-welldone.txt";
pub const DEFAULT_STATE_LOG: &str = "Goldjunge-state.log";
pub const DEFAULT_TERMINAL_FILES_SUBPATH: &str = "MQL5/Files";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadProtocol {
    /// Copy files into locally mounted target paths.
    Directory,
    /// Delegated to an external FTP transport.
    Ftp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadSettings {
    pub enabled: bool,
    pub protocol: UploadProtocol,
    pub json_remote_path: Option<PathBuf>,
    pub html_remote_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerSettings {
    pub output_json: PathBuf,
    pub marker_path: PathBuf,
    pub state_log: PathBuf,
    /// Terminal data directory holding the EA's files; searched for the
    /// state log when it is not next to the config.
    pub terminal_files: Option<PathBuf>,
    pub initial_statement: Option<PathBuf>,
    pub pretty: bool,
    pub report: ReportOptions,
    pub upload: UploadSettings,
}

pub fn validate_settings_config(config: &dyn ConfigPort) -> Result<(), TickerError> {
    let protocol = parse_protocol(config)?;
    let enabled = config.get_bool("upload", "enabled", false);
    if enabled
        && protocol == UploadProtocol::Directory
        && config.get_value("upload", "json_remote_path").is_none()
        && config.get_value("upload", "html_remote_path").is_none()
    {
        return Err(TickerError::ConfigInvalid {
            section: "upload".to_string(),
            key: "json_remote_path".to_string(),
            reason: "upload is enabled but no remote path is set".to_string(),
        });
    }
    Ok(())
}

pub fn build_settings(
    config: &dyn ConfigPort,
    base_dir: &Path,
) -> Result<TickerSettings, TickerError> {
    validate_settings_config(config)?;

    let resolve = |key: &str, default: &str| -> PathBuf {
        let name = config.get_value("web_ticker", key).unwrap_or_else(|| default.to_string());
        base_dir.join(name)
    };

    Ok(TickerSettings {
        output_json: resolve("output_json", DEFAULT_OUTPUT_JSON),
        marker_path: resolve("welldone_file", DEFAULT_WELLDONE_FILE),
        state_log: resolve("state_log", DEFAULT_STATE_LOG),
        terminal_files: config.get_value("paths", "mt5_path").map(|root| {
            let sub = config
                .get_value("paths", "mt5_files_subpath")
                .unwrap_or_else(|| DEFAULT_TERMINAL_FILES_SUBPATH.to_string());
            PathBuf::from(root).join(sub)
        }),
        initial_statement: config
            .get_value("web_ticker", "initial_statement")
            .map(|name| base_dir.join(name)),
        pretty: config.get_bool("web_ticker", "pretty", false),
        report: ReportOptions {
            bot_name: config
                .get_value("project", "name")
                .unwrap_or_else(|| DEFAULT_BOT_NAME.to_string()),
            trade_active: config.get_bool("web_ticker", "trade_active", true),
            pause_message: config.get_value("web_ticker", "trade_pause_message"),
        },
        upload: UploadSettings {
            enabled: config.get_bool("upload", "enabled", false),
            protocol: parse_protocol(config)?,
            json_remote_path: config.get_value("upload", "json_remote_path").map(PathBuf::from),
            html_remote_path: config.get_value("upload", "html_remote_path").map(PathBuf::from),
        },
    })
}

impl TickerSettings {
    /// The configured state log, or the same file name inside the terminal
    /// directory when the configured one does not exist.
    pub fn locate_state_log(&self) -> PathBuf {
        if self.state_log.exists() {
            return self.state_log.clone();
        }
        let fallback = self
            .terminal_files
            .as_ref()
            .zip(self.state_log.file_name())
            .map(|(dir, name)| dir.join(name));
        match fallback {
            Some(path) if path.exists() => path,
            _ => self.state_log.clone(),
        }
    }
}

fn parse_protocol(config: &dyn ConfigPort) -> Result<UploadProtocol, TickerError> {
    let raw = config.get_value("upload", "protocol").unwrap_or_else(|| "ftp".to_string());
    match raw.to_lowercase().as_str() {
        "ftp" => Ok(UploadProtocol::Ftp),
        "directory" => Ok(UploadProtocol::Directory),
        other => Err(TickerError::ConfigInvalid {
            section: "upload".to_string(),
            key: "protocol".to_string(),
            reason: format!("unsupported upload protocol '{other}'"),
        }),
    }
}
