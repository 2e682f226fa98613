//! Tagged state log reader.
//!
//! Relevant lines look like
//! `[2024.03.01 10:15:00] ... [WEB_TICKER] {"type":"trade", ...}`.
//! Any structural defect on a tagged line aborts the whole read.

use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use crate::adapters::text_decode::decode_log;
use crate::domain::error::TickerError;
use crate::domain::normalize::TaggedRecord;
use crate::domain::timestamp::parse_terminal;
use crate::ports::log_port::LogPort;
use crate::ports::source_port::StateLogPort;

pub const WEB_TAG: &str = "[WEB_TICKER]";

pub struct StateLogAdapter {
    path: PathBuf,
}

impl StateLogAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StateLogPort for StateLogAdapter {
    fn read_records(&self, log: &dyn LogPort) -> Result<Vec<TaggedRecord>, TickerError> {
        if !self.path.exists() {
            log.info(&format!("state log {} not found, nothing to merge", self.path.display()));
            return Ok(Vec::new());
        }
        let bytes = fs::read(&self.path)?;
        let text = decode_log(&bytes).ok_or_else(|| TickerError::Decode {
            path: self.path.display().to_string(),
        })?;
        let records = parse_state_log(&text)?;
        log.debug(&format!(
            "read {} tagged records from {}",
            records.len(),
            self.path.display()
        ));
        Ok(records)
    }
}

/// Parse decoded log text. Line numbers are 1-based.
pub fn parse_state_log(text: &str) -> Result<Vec<TaggedRecord>, TickerError> {
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let Some(tag_pos) = line.find(WEB_TAG) else {
            continue;
        };
        let number = idx + 1;
        let logged_at = line_timestamp(line, number)?;

        let json_start = line[tag_pos..]
            .find('{')
            .map(|offset| tag_pos + offset)
            .ok_or_else(|| TickerError::LogPayload {
                line: number,
                reason: "no JSON payload after tag".into(),
            })?;
        let payload: Value =
            serde_json::from_str(line[json_start..].trim()).map_err(|e| TickerError::LogPayload {
                line: number,
                reason: e.to_string(),
            })?;
        let Value::Object(payload) = payload else {
            return Err(TickerError::LogPayload {
                line: number,
                reason: "payload is not a JSON object".into(),
            });
        };

        records.push(TaggedRecord {
            line: number,
            logged_at,
            payload,
        });
    }
    Ok(records)
}

fn line_timestamp(line: &str, number: usize) -> Result<chrono::DateTime<chrono::Utc>, TickerError> {
    let cleaned = line.trim_start_matches('\u{feff}');
    let Some(rest) = cleaned.strip_prefix('[') else {
        return Err(TickerError::LogFormat {
            line: number,
            reason: "line does not start with '['".into(),
        });
    };
    let end = rest.find(']').ok_or_else(|| TickerError::LogFormat {
        line: number,
        reason: "missing ']' after timestamp".into(),
    })?;
    let stamp = &rest[..end];
    parse_terminal(stamp).ok_or_else(|| TickerError::LogFormat {
        line: number,
        reason: format!("invalid timestamp '{stamp}'"),
    })
}
