//! Conversion of tagged log payloads into canonical trades and snapshots.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::snapshot::Snapshot;
use super::timestamp::parse_iso;
use super::trade::RawTrade;

pub const DEFAULT_LOG_SYMBOL: &str = "UNKNOWN";

const ORDER_TYPE_KEYS: [&str; 3] = ["order_type", "direction", "side"];
const COMMENT_KEYS: [&str; 2] = ["comment", "label"];

/// One structured payload from the state log, with the timestamp of the line
/// that carried it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRecord {
    pub line: usize,
    pub logged_at: DateTime<Utc>,
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    Trade,
    Snapshot,
    Other(String),
}

impl TaggedRecord {
    pub fn kind(&self) -> RecordKind {
        match self.payload.get("type").and_then(Value::as_str) {
            Some("trade") => RecordKind::Trade,
            Some("snapshot") => RecordKind::Snapshot,
            Some(other) => RecordKind::Other(other.to_string()),
            None => RecordKind::Other(String::new()),
        }
    }

    fn text(&self, key: &str) -> Option<String> {
        value_text(self.payload.get(key)?)
    }

    fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.text(key))
    }

    fn number(&self, key: &str) -> f64 {
        self.payload.get(key).map(value_number).unwrap_or(0.0)
    }

    fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.payload.get(key)?.as_str().and_then(parse_iso)
    }
}

/// Text form of a JSON scalar; `None` for null, false, empty strings and
/// structured values.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Numeric form of a JSON scalar; anything non-numeric or non-finite is 0.0.
fn value_number(value: &Value) -> f64 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite()).unwrap_or(0.0)
}

pub fn normalize_trade(record: &TaggedRecord) -> RawTrade {
    RawTrade {
        ticket: record.text("ticket").unwrap_or_default(),
        symbol: Some(
            record
                .text("symbol")
                .unwrap_or_else(|| DEFAULT_LOG_SYMBOL.to_string()),
        ),
        volume: record.number("volume"),
        profit: record.number("profit"),
        order_type: record.first_text(&ORDER_TYPE_KEYS),
        comment: record.first_text(&COMMENT_KEYS),
        opened_at: record.timestamp("opened_at"),
        closed_at: Some(record.timestamp("closed_at").unwrap_or(record.logged_at)),
        tp_label: record.text("tp_label"),
        sl_label: record.text("sl_label"),
        exit_reason: record.text("exit_reason"),
    }
}

pub fn normalize_snapshot(record: &TaggedRecord) -> Snapshot {
    Snapshot {
        timestamp: record.timestamp("timestamp").unwrap_or(record.logged_at),
        balance: record.number("balance"),
        equity: record.number("equity"),
        floating: record.number("floating"),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub trades: Vec<RawTrade>,
    pub snapshots: Vec<Snapshot>,
    /// Log line numbers of records with an unknown type.
    pub ignored: Vec<usize>,
}

/// Route each record by its `type`; unknown types are dropped.
pub fn normalize(records: &[TaggedRecord]) -> Normalized {
    let mut out = Normalized::default();
    for record in records {
        match record.kind() {
            RecordKind::Trade => out.trades.push(normalize_trade(record)),
            RecordKind::Snapshot => out.snapshots.push(normalize_snapshot(record)),
            RecordKind::Other(_) => out.ignored.push(record.line),
        }
    }
    out
}
