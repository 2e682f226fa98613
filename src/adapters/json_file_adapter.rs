//! JSON payload file: the canonical history store and the published report.
//!
//! The payload file carries the full report with the history block last, so
//! the next run can pick the history up again from the same file.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::domain::error::TickerError;
use crate::domain::history::{HISTORY_VERSION, History};
use crate::domain::report::ReportPayload;
use crate::ports::history_port::HistoryPort;
use crate::ports::log_port::LogPort;
use crate::ports::report_port::ReportPort;

/// Write bytes to `path` through a sibling temp file and a rename, so readers
/// never see a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), TickerError> {
    let parent = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);
    let written = File::create(&temp_path)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&temp_path, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<Vec<u8>, TickerError> {
    let mut bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    bytes.push(b'\n');
    Ok(bytes)
}

/// `<generated_at>\nprofit_7d=<x>\ntrades_7d=<n>\n`
pub fn marker_content(payload: &ReportPayload) -> String {
    let (profit, trades) = payload
        .window("7d")
        .map(|w| (w.summary.profit, w.summary.trades))
        .unwrap_or((0.0, 0));
    format!(
        "{}\nprofit_7d={:?}\ntrades_7d={}\n",
        payload.meta.generated_at, profit, trades
    )
}

#[derive(Serialize)]
struct StoredHistory<'a> {
    history: &'a History,
}

pub struct JsonFileAdapter {
    path: PathBuf,
    marker_path: Option<PathBuf>,
    pretty: bool,
}

impl JsonFileAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            marker_path: None,
            pretty: false,
        }
    }

    pub fn with_marker(mut self, marker_path: PathBuf) -> Self {
        self.marker_path = Some(marker_path);
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    fn history_from_block(&self, mut block: Map<String, Value>, log: &dyn LogPort) -> History {
        let version = block
            .get("version")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(HISTORY_VERSION);
        History {
            version,
            trades: self.records(&mut block, "trades", log),
            snapshots: self.records(&mut block, "snapshots", log),
        }
    }

    /// Entries of one history list; entries that do not deserialize are
    /// dropped with a warning and the rest are kept.
    fn records<T: DeserializeOwned>(
        &self,
        block: &mut Map<String, Value>,
        key: &str,
        log: &dyn LogPort,
    ) -> Vec<T> {
        let entries = match block.remove(key) {
            None | Some(Value::Null) => return Vec::new(),
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                log.warn(&format!(
                    "history {key} in {} is not a list; ignoring it",
                    self.path.display()
                ));
                return Vec::new();
            }
        };
        let mut records = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value(entry) {
                Ok(record) => records.push(record),
                Err(e) => log.warn(&format!(
                    "dropping history {key} entry {index} in {} ({e})",
                    self.path.display()
                )),
            }
        }
        records
    }
}

impl HistoryPort for JsonFileAdapter {
    fn load(&self, log: &dyn LogPort) -> History {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return History::new(),
            Err(e) => {
                log.warn(&format!(
                    "cannot read {}: {e}; starting with an empty history",
                    self.path.display()
                ));
                return History::new();
            }
        };
        let mut payload: Value = match serde_json::from_str(&content) {
            Ok(payload) => payload,
            Err(e) => {
                log.warn(&format!(
                    "{} is not valid JSON ({e}); starting with an empty history",
                    self.path.display()
                ));
                return History::new();
            }
        };
        let block = match payload.get_mut("history").map(Value::take) {
            Some(Value::Object(block)) if !block.is_empty() => block,
            _ => {
                log.info(&format!(
                    "{} has no history block; starting with an empty history",
                    self.path.display()
                ));
                return History::new();
            }
        };
        let history = self.history_from_block(block, log);
        log.debug(&format!(
            "loaded {} trades and {} snapshots from {}",
            history.trades.len(),
            history.snapshots.len(),
            self.path.display()
        ));
        history
    }

    fn store(&self, history: &History) -> Result<(), TickerError> {
        write_atomic(&self.path, &to_json(&StoredHistory { history }, true)?)
    }
}

impl ReportPort for JsonFileAdapter {
    fn publish(&self, payload: &ReportPayload) -> Result<Vec<(String, PathBuf)>, TickerError> {
        write_atomic(&self.path, &to_json(payload, self.pretty)?)?;
        if let Some(marker) = &self.marker_path {
            write_atomic(marker, marker_content(payload).as_bytes())?;
        }
        Ok(vec![("json".to_string(), self.path.clone())])
    }
}
