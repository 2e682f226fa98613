//! The dashboard payload: meta, account, aggregates and the history itself.

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::aggregate::{
    DailyBucket, Summary, SymbolStats, TradeSummary, WindowStats, build_windows, daily_breakdown,
    rank_symbols, recent_trades, summarize,
};
use super::history::History;
use super::snapshot::SNAPSHOT_PLACES;
use super::timestamp::{format_iso, round_to};
use super::trade::ClosedTrade;

pub const DEFAULT_BOT_NAME: &str = "Sharrow";
pub const DEFAULT_PAUSE_MESSAGE: &str = "Trading currently paused.";

/// Run-level inputs that do not come from the history.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub bot_name: String,
    pub trade_active: bool,
    pub pause_message: Option<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            bot_name: DEFAULT_BOT_NAME.to_string(),
            trade_active: true,
            pause_message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    pub bot: String,
    pub generated_at: String,
    pub snapshot_at: Option<String>,
    pub trade_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_since: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub balance: f64,
    pub equity: f64,
    pub floating: f64,
    pub snapshot_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPayload {
    pub meta: Meta,
    pub account: Account,
    pub overall: Summary,
    #[serde(serialize_with = "serialize_windows")]
    pub windows: Vec<WindowStats>,
    pub top_symbols: Vec<SymbolStats>,
    pub bottom_symbols: Vec<SymbolStats>,
    pub recent_trades: Vec<TradeSummary>,
    pub daily_breakdown: Vec<DailyBucket>,
    pub history: History,
}

impl ReportPayload {
    pub fn window(&self, key: &str) -> Option<&WindowStats> {
        self.windows.iter().find(|w| w.key == key)
    }
}

fn serialize_windows<S: Serializer>(
    windows: &[WindowStats],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(windows.len()))?;
    for window in windows {
        map.serialize_entry(window.key, window)?;
    }
    map.end()
}

pub fn build_payload(
    history: &History,
    options: &ReportOptions,
    now: DateTime<Utc>,
) -> ReportPayload {
    let trades: Vec<ClosedTrade> = history.closed_trades();
    let snapshots = history.account_snapshots();

    let account = match snapshots.last() {
        Some(latest) => Account {
            balance: round_to(latest.balance, SNAPSHOT_PLACES),
            equity: round_to(latest.equity, SNAPSHOT_PLACES),
            floating: round_to(latest.floating, SNAPSHOT_PLACES),
            snapshot_at: Some(format_iso(&latest.timestamp)),
        },
        None => Account {
            balance: 0.0,
            equity: 0.0,
            floating: 0.0,
            snapshot_at: None,
        },
    };

    let generated_at = format_iso(&now);
    let paused = !options.trade_active;
    let meta = Meta {
        bot: options.bot_name.clone(),
        generated_at: generated_at.clone(),
        snapshot_at: account.snapshot_at.clone(),
        trade_active: options.trade_active,
        status: paused.then_some("paused"),
        pause_message: paused.then(|| {
            options
                .pause_message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_PAUSE_MESSAGE.to_string())
        }),
        pause_since: paused.then_some(generated_at),
    };

    let all: Vec<&ClosedTrade> = trades.iter().collect();
    let ranking = rank_symbols(&trades);

    ReportPayload {
        meta,
        account,
        overall: summarize(&all),
        windows: build_windows(&trades, now),
        top_symbols: ranking.top,
        bottom_symbols: ranking.bottom,
        recent_trades: recent_trades(&trades),
        daily_breakdown: daily_breakdown(&trades, now),
        history: history.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::Snapshot;
    use crate::domain::trade::RawTrade;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()
    }

    fn sample_history() -> History {
        let mut history = History::new();
        history.merge(
            &[
                RawTrade {
                    ticket: "1".into(),
                    symbol: Some("XAUUSD".into()),
                    profit: 25.0,
                    volume: 0.05,
                    closed_at: Some(now() - Duration::days(1)),
                    ..Default::default()
                },
                RawTrade {
                    ticket: "2".into(),
                    symbol: Some("EURUSD".into()),
                    profit: -10.0,
                    closed_at: Some(now() - Duration::days(40)),
                    ..Default::default()
                },
            ],
            &[
                Snapshot {
                    timestamp: now() - Duration::hours(2),
                    balance: 1015.0,
                    equity: 1012.346,
                    floating: -2.654,
                },
                Snapshot {
                    timestamp: now() - Duration::hours(5),
                    balance: 990.0,
                    equity: 990.0,
                    floating: 0.0,
                },
            ],
        );
        history
    }

    #[test]
    fn payload_uses_latest_snapshot() {
        let payload = build_payload(&sample_history(), &ReportOptions::default(), now());
        assert_eq!(payload.account.balance, 1015.0);
        assert_eq!(payload.account.equity, 1012.35);
        assert_eq!(payload.account.snapshot_at.as_deref(), Some("2024-07-15T10:00:00Z"));
        assert_eq!(payload.meta.snapshot_at, payload.account.snapshot_at);
    }

    #[test]
    fn payload_without_snapshots_has_zero_account() {
        let payload = build_payload(&History::new(), &ReportOptions::default(), now());
        assert_eq!(payload.account.balance, 0.0);
        assert!(payload.account.snapshot_at.is_none());
        assert_eq!(payload.overall.trades, 0);
        assert_eq!(payload.windows.len(), 3);
    }

    #[test]
    fn payload_aggregates() {
        let payload = build_payload(&sample_history(), &ReportOptions::default(), now());
        assert_eq!(payload.overall.trades, 2);
        assert_eq!(payload.overall.profit, 15.0);
        assert_eq!(payload.window("7d").unwrap().summary.profit, 25.0);
        assert_eq!(payload.window("365d").unwrap().summary.trades, 2);
        assert_eq!(payload.top_symbols[0].symbol, "XAUUSD");
        assert_eq!(payload.recent_trades[0].ticket, "1");
        assert_eq!(payload.daily_breakdown.len(), 1);
    }

    #[test]
    fn active_meta_omits_pause_fields() {
        let payload = build_payload(&History::new(), &ReportOptions::default(), now());
        let json = serde_json::to_value(&payload.meta).unwrap();
        assert_eq!(json["bot"], "Sharrow");
        assert_eq!(json["generated_at"], "2024-07-15T12:00:00Z");
        assert!(json.get("status").is_none());
        assert!(json.get("pause_message").is_none());
    }

    #[test]
    fn paused_meta_uses_default_message() {
        let options = ReportOptions {
            trade_active: false,
            ..ReportOptions::default()
        };
        let payload = build_payload(&History::new(), &options, now());
        assert_eq!(payload.meta.status, Some("paused"));
        assert_eq!(payload.meta.pause_message.as_deref(), Some(DEFAULT_PAUSE_MESSAGE));
        assert_eq!(payload.meta.pause_since.as_deref(), Some("2024-07-15T12:00:00Z"));
    }

    #[test]
    fn windows_serialize_as_ordered_map() {
        let payload = build_payload(&sample_history(), &ReportOptions::default(), now());
        let json = serde_json::to_string(&payload).unwrap();
        let i7 = json.find("\"7d\"").unwrap();
        let i30 = json.find("\"30d\"").unwrap();
        let i365 = json.find("\"365d\"").unwrap();
        assert!(i7 < i30 && i30 < i365);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["windows"]["7d"]["trades"], 1);
        assert_eq!(value["windows"]["7d"]["label"], "Last 7 days");
        assert_eq!(value["windows"]["7d"]["best_trade"]["exit_type"], "manual");
        assert!(value["windows"]["7d"]["best_trade"].get("comment").is_none());
        assert_eq!(value["history"]["version"], 1);
    }
}
