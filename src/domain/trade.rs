//! Closed trades in their three shapes: as read from a source, as persisted in
//! the history file, and as materialized for aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp::{format_iso, parse_iso, round_to};

pub const PROFIT_PLACES: i32 = 5;
pub const VOLUME_PLACES: i32 = 5;

/// A trade as produced by a source parser or the normalizer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTrade {
    pub ticket: String,
    pub symbol: Option<String>,
    pub volume: f64,
    pub profit: f64,
    pub order_type: Option<String>,
    pub comment: Option<String>,
    pub opened_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub tp_label: Option<String>,
    pub sl_label: Option<String>,
    pub exit_reason: Option<String>,
}

/// A trade as stored in the canonical history.
///
/// Timestamps stay strings so a record written by another tool survives a
/// load/store cycle untouched even when it cannot be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(default)]
    pub ticket: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub profit: f64,
    #[serde(default)]
    pub order_type: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub opened_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub tp_label: Option<String>,
    #[serde(default)]
    pub sl_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<String>,
}

impl TradeRecord {
    pub fn from_raw(trade: &RawTrade) -> Self {
        Self {
            ticket: trade.ticket.clone(),
            symbol: trade.symbol.clone(),
            volume: round_to(trade.volume, VOLUME_PLACES),
            profit: round_to(trade.profit, PROFIT_PLACES),
            order_type: trade.order_type.clone(),
            comment: trade.comment.clone(),
            opened_at: trade.opened_at.as_ref().map(format_iso),
            closed_at: trade.closed_at.as_ref().map(format_iso),
            tp_label: trade.tp_label.clone(),
            sl_label: trade.sl_label.clone(),
            exit_reason: trade.exit_reason.clone(),
        }
    }

    /// Sort key; ISO-8601 UTC strings order the same way as the instants.
    pub fn sort_key(&self) -> &str {
        self.closed_at.as_deref().unwrap_or("")
    }
}

/// A trade with a resolved close time, ready for aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub ticket: String,
    pub symbol: Option<String>,
    pub volume: f64,
    pub profit: f64,
    pub order_type: Option<String>,
    pub comment: Option<String>,
    pub opened_at: Option<DateTime<Utc>>,
    pub closed_at: DateTime<Utc>,
    pub tp_label: Option<String>,
    pub sl_label: Option<String>,
    pub exit_reason: Option<String>,
}

impl ClosedTrade {
    /// `None` when the record has no parseable close time.
    pub fn from_record(record: &TradeRecord) -> Option<Self> {
        let closed_at = record.closed_at.as_deref().and_then(parse_iso)?;
        Some(Self {
            ticket: record.ticket.clone(),
            symbol: record.symbol.clone(),
            volume: record.volume,
            profit: record.profit,
            order_type: record.order_type.clone(),
            comment: record.comment.clone(),
            opened_at: record.opened_at.as_deref().and_then(parse_iso),
            closed_at,
            tp_label: record.tp_label.clone(),
            sl_label: record.sl_label.clone(),
            exit_reason: record.exit_reason.clone(),
        })
    }

    /// `BUY`/`SELL` when the order type mentions either, otherwise the
    /// uppercased order type; empty when there is none.
    pub fn side(&self) -> String {
        canonical_side(self.order_type.as_deref())
    }
}

pub fn canonical_side(order_type: Option<&str>) -> String {
    let Some(order_type) = order_type.filter(|s| !s.is_empty()) else {
        return String::new();
    };
    let side = order_type.to_uppercase();
    if side.contains("BUY") {
        "BUY".to_string()
    } else if side.contains("SELL") {
        "SELL".to_string()
    } else {
        side
    }
}
