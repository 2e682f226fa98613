#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use log::Level;
use std::cell::RefCell;
use std::path::PathBuf;
use webticker::domain::error::TickerError;
use webticker::domain::history::History;
use webticker::domain::normalize::TaggedRecord;
use webticker::domain::report::ReportPayload;
pub use webticker::domain::trade::RawTrade;
use webticker::ports::history_port::HistoryPort;
use webticker::ports::log_port::LogPort;
use webticker::ports::report_port::ReportPort;
use webticker::ports::source_port::StateLogPort;
use webticker::ports::upload_port::UploadPort;

#[derive(Default)]
pub struct RecordingLog {
    pub entries: RefCell<Vec<(Level, String)>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl LogPort for RecordingLog {
    fn log(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingUploader {
    pub calls: RefCell<Vec<Vec<(String, PathBuf)>>>,
}

impl UploadPort for RecordingUploader {
    fn upload(&self, files: &[(String, PathBuf)], _log: &dyn LogPort) -> Result<(), TickerError> {
        self.calls.borrow_mut().push(files.to_vec());
        Ok(())
    }
}

/// State log source returning fixed log text, parsed like the real file.
pub struct MockStateLog {
    pub text: String,
}

impl MockStateLog {
    pub fn new(lines: &[String]) -> Self {
        Self {
            text: lines.join("\n"),
        }
    }
}

impl StateLogPort for MockStateLog {
    fn read_records(&self, _log: &dyn LogPort) -> Result<Vec<TaggedRecord>, TickerError> {
        webticker::adapters::state_log_adapter::parse_state_log(&self.text)
    }
}

/// In-memory history store plus report sink.
#[derive(Default)]
pub struct MemoryStore {
    pub history: RefCell<History>,
    pub published: RefCell<Vec<ReportPayload>>,
}

impl MemoryStore {
    pub fn with_history(history: History) -> Self {
        Self {
            history: RefCell::new(history),
            published: RefCell::new(Vec::new()),
        }
    }
}

impl HistoryPort for MemoryStore {
    fn load(&self, _log: &dyn LogPort) -> History {
        self.history.borrow().clone()
    }

    fn store(&self, history: &History) -> Result<(), TickerError> {
        *self.history.borrow_mut() = history.clone();
        Ok(())
    }
}

impl ReportPort for MemoryStore {
    fn publish(&self, payload: &ReportPayload) -> Result<Vec<(String, PathBuf)>, TickerError> {
        *self.history.borrow_mut() = payload.history.clone();
        self.published.borrow_mut().push(payload.clone());
        Ok(vec![("json".to_string(), PathBuf::from("memory.json"))])
    }
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()
}

pub fn terminal(ts: DateTime<Utc>) -> String {
    ts.format("%Y.%m.%d %H:%M:%S").to_string()
}

/// One tagged state log line.
pub fn log_line(logged_at: DateTime<Utc>, payload: &str) -> String {
    format!("[{}] Goldjunge XAUUSD,M5: [WEB_TICKER] {}", terminal(logged_at), payload)
}

pub fn trade_line(ticket: &str, symbol: &str, profit: f64, closed_at: DateTime<Utc>) -> String {
    log_line(
        closed_at,
        &format!(
            r#"{{"type":"trade","ticket":"{ticket}","symbol":"{symbol}","profit":{profit},"volume":0.1,"order_type":"buy","closed_at":"{}"}}"#,
            closed_at.format("%Y-%m-%dT%H:%M:%SZ")
        ),
    )
}

pub fn snapshot_line(at: DateTime<Utc>, balance: f64, equity: f64) -> String {
    log_line(
        at,
        &format!(r#"{{"type":"snapshot","balance":{balance},"equity":{equity},"floating":{}}}"#, equity - balance),
    )
}

pub fn trade(ticket: &str, symbol: &str, profit: f64, closed_at: DateTime<Utc>) -> RawTrade {
    RawTrade {
        ticket: ticket.into(),
        symbol: Some(symbol.into()),
        profit,
        volume: 0.1,
        order_type: Some("buy".into()),
        opened_at: Some(closed_at - Duration::hours(1)),
        closed_at: Some(closed_at),
        ..Default::default()
    }
}

pub fn utf16le(text: &str) -> Vec<u8> {
    let mut out = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// Statement export with a header row, the given trade rows and a results
/// section.
pub fn statement_html(trades: &[(&str, DateTime<Utc>, &str)]) -> String {
    let header = [
        "Zeit", "Position", "Symbol", "Typ", "Kommentar", "Volumen", "Preis", "S / L", "T / P",
        "Zeit", "Preis", "Kommission", "Swap", "Gewinn",
    ];
    let mut rows = vec![cells(&header)];
    for (ticket, closed_at, profit) in trades {
        let open = terminal(*closed_at - Duration::hours(1));
        let close = terminal(*closed_at);
        rows.push(cells(&[
            open.as_str(), *ticket, "XAUUSD", "buy", "", "0.10", "2300.00", "", "",
            close.as_str(), "2301.00", "0.00", "0.00", *profit,
        ]));
    }
    rows.push(cells(&["Ergebnisse"]));
    format!(
        "<html><body><table>{}</table></body></html>",
        rows.concat()
    )
}

fn cells(values: &[&str]) -> String {
    let tds: String = values.iter().map(|v| format!("<td>{v}</td>")).collect();
    format!("<tr>{tds}</tr>")
}
