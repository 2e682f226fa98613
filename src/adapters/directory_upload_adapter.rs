//! Upload by copying into locally mounted target paths.

use std::fs;
use std::path::{Path, PathBuf};

use crate::adapters::json_file_adapter::write_atomic;
use crate::domain::error::TickerError;
use crate::domain::settings::UploadSettings;
use crate::ports::log_port::LogPort;
use crate::ports::upload_port::UploadPort;

pub struct DirectoryUploadAdapter {
    json_target: Option<PathBuf>,
    html_target: Option<PathBuf>,
}

impl DirectoryUploadAdapter {
    pub fn new(json_target: Option<PathBuf>, html_target: Option<PathBuf>) -> Self {
        Self {
            json_target,
            html_target,
        }
    }

    pub fn from_settings(settings: &UploadSettings) -> Self {
        Self::new(
            settings.json_remote_path.clone(),
            settings.html_remote_path.clone(),
        )
    }

    fn target(&self, label: &str) -> Option<&Path> {
        if label == "json" {
            self.json_target.as_deref()
        } else {
            self.html_target.as_deref()
        }
    }
}

impl UploadPort for DirectoryUploadAdapter {
    fn upload(&self, files: &[(String, PathBuf)], log: &dyn LogPort) -> Result<(), TickerError> {
        let mut copied = 0;
        for (label, local) in files {
            let Some(target) = self.target(label) else {
                log.debug(&format!("no upload target for '{label}', skipping"));
                continue;
            };
            if !local.exists() {
                log.debug(&format!("{} does not exist, skipping", local.display()));
                continue;
            }
            let bytes = fs::read(local)?;
            write_atomic(target, &bytes).map_err(|e| TickerError::Upload {
                reason: format!("copy {} -> {}: {e}", local.display(), target.display()),
            })?;
            copied += 1;
        }
        log.info(&format!("upload finished ({copied} of {} files)", files.len()));
        Ok(())
    }
}
