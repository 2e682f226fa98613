//! Canonical trade/snapshot history and the merge engine.
//!
//! The history only grows: a ticket or snapshot timestamp that is already
//! stored is never replaced, so re-running a merge with the same input is a
//! no-op apart from the version stamp.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::snapshot::{Snapshot, SnapshotRecord};
use super::trade::{ClosedTrade, RawTrade, TradeRecord};

pub const HISTORY_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
    #[serde(default)]
    pub snapshots: Vec<SnapshotRecord>,
}

fn current_version() -> u32 {
    HISTORY_VERSION
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

/// What a merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub trades_added: usize,
    pub trades_skipped: usize,
    pub snapshots_added: usize,
    pub snapshots_skipped: usize,
}

impl History {
    pub fn new() -> Self {
        History {
            version: HISTORY_VERSION,
            trades: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    /// Append trades and snapshots whose keys are not stored yet.
    ///
    /// Trades are keyed by ticket and must carry a close time; snapshots are
    /// keyed by their serialized timestamp. First write wins in both cases.
    pub fn merge(&mut self, trades: &[RawTrade], snapshots: &[Snapshot]) -> MergeStats {
        let mut stats = MergeStats::default();

        let mut tickets: HashSet<String> =
            self.trades.iter().map(|t| t.ticket.clone()).collect();
        for trade in trades {
            if trade.ticket.is_empty()
                || trade.closed_at.is_none()
                || tickets.contains(&trade.ticket)
            {
                stats.trades_skipped += 1;
                continue;
            }
            tickets.insert(trade.ticket.clone());
            self.trades.push(TradeRecord::from_raw(trade));
            stats.trades_added += 1;
        }
        if stats.trades_added > 0 {
            self.trades.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        }

        let mut stamps: HashSet<String> =
            self.snapshots.iter().map(|s| s.timestamp.clone()).collect();
        for snapshot in snapshots {
            let record = SnapshotRecord::from_snapshot(snapshot);
            if stamps.contains(&record.timestamp) {
                stats.snapshots_skipped += 1;
                continue;
            }
            stamps.insert(record.timestamp.clone());
            self.snapshots.push(record);
            stats.snapshots_added += 1;
        }
        if stats.snapshots_added > 0 {
            self.snapshots.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        }

        self.version = HISTORY_VERSION;
        stats
    }

    /// Build a fresh history from bootstrap sources (see [`bulk_merge`]).
    pub fn bootstrap(sources: &[Vec<RawTrade>], snapshots: &[Snapshot]) -> (Self, MergeStats) {
        let mut history = History::new();
        history.trades = bulk_merge(sources)
            .iter()
            .map(TradeRecord::from_raw)
            .collect();
        let mut stats = history.merge(&[], snapshots);
        stats.trades_added = history.trades.len();
        (history, stats)
    }

    /// Trades with a parseable close time, ascending by close time.
    pub fn closed_trades(&self) -> Vec<ClosedTrade> {
        let mut trades: Vec<ClosedTrade> = self
            .trades
            .iter()
            .filter_map(ClosedTrade::from_record)
            .collect();
        trades.sort_by_key(|t| t.closed_at);
        trades
    }

    /// Snapshots with a parseable timestamp, ascending.
    pub fn account_snapshots(&self) -> Vec<Snapshot> {
        let mut snapshots: Vec<Snapshot> = self
            .snapshots
            .iter()
            .filter_map(Snapshot::from_record)
            .collect();
        snapshots.sort_by_key(|s| s.timestamp);
        snapshots
    }
}

/// Combine several trade lists into one, keyed by ticket.
///
/// Later sources overwrite earlier ones for the same ticket. Entries without
/// a ticket or close time are dropped; the result is ascending by close time.
pub fn bulk_merge(sources: &[Vec<RawTrade>]) -> Vec<RawTrade> {
    let mut order: Vec<String> = Vec::new();
    let mut merged: HashMap<String, RawTrade> = HashMap::new();

    for trade in sources.iter().flatten() {
        if trade.ticket.is_empty() {
            continue;
        }
        if merged.insert(trade.ticket.clone(), trade.clone()).is_none() {
            order.push(trade.ticket.clone());
        }
    }

    let mut trades: Vec<RawTrade> = order
        .into_iter()
        .filter_map(|ticket| merged.remove(&ticket))
        .filter(|trade| trade.closed_at.is_some())
        .collect();
    trades.sort_by_key(|t| t.closed_at);
    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    fn trade(ticket: &str, hour: u32, profit: f64) -> RawTrade {
        RawTrade {
            ticket: ticket.into(),
            symbol: Some("EURUSD".into()),
            volume: 0.1,
            profit,
            closed_at: Some(at(hour)),
            ..Default::default()
        }
    }

    fn snap(hour: u32, balance: f64) -> Snapshot {
        Snapshot {
            timestamp: at(hour),
            balance,
            equity: balance,
            floating: 0.0,
        }
    }

    #[test]
    fn merge_appends_and_sorts() {
        let mut history = History::new();
        let stats = history.merge(&[trade("2", 10, 1.0), trade("1", 8, 2.0)], &[]);
        assert_eq!(stats.trades_added, 2);
        let tickets: Vec<_> = history.trades.iter().map(|t| t.ticket.as_str()).collect();
        assert_eq!(tickets, vec!["1", "2"]);
    }

    #[test]
    fn merge_keeps_first_seen_ticket() {
        let mut history = History::new();
        history.merge(&[trade("1", 8, 5.0)], &[]);
        let stats = history.merge(&[trade("1", 9, -3.0)], &[]);
        assert_eq!(stats.trades_added, 0);
        assert_eq!(stats.trades_skipped, 1);
        assert_eq!(history.trades.len(), 1);
        assert_eq!(history.trades[0].profit, 5.0);
    }

    #[test]
    fn merge_dedups_within_one_batch() {
        let mut history = History::new();
        history.merge(&[trade("1", 8, 5.0), trade("1", 9, 7.0)], &[]);
        assert_eq!(history.trades.len(), 1);
        assert_eq!(history.trades[0].profit, 5.0);
    }

    #[test]
    fn merge_drops_empty_ticket_and_missing_close() {
        let mut history = History::new();
        let mut open = trade("3", 8, 1.0);
        open.closed_at = None;
        let stats = history.merge(&[trade("", 8, 1.0), open], &[]);
        assert_eq!(stats.trades_added, 0);
        assert_eq!(stats.trades_skipped, 2);
        assert!(history.trades.is_empty());
    }

    #[test]
    fn merge_snapshots_first_write_wins() {
        let mut history = History::new();
        history.merge(&[], &[snap(9, 100.0), snap(7, 90.0)]);
        let stats = history.merge(&[], &[snap(9, 555.0)]);
        assert_eq!(stats.snapshots_skipped, 1);
        assert_eq!(history.snapshots.len(), 2);
        assert_eq!(history.snapshots[0].balance, 90.0);
        assert_eq!(history.snapshots[1].balance, 100.0);
    }

    #[test]
    fn merge_stamps_version() {
        let mut history = History {
            version: 0,
            ..History::new()
        };
        history.merge(&[], &[]);
        assert_eq!(history.version, HISTORY_VERSION);
    }

    #[test]
    fn merge_is_idempotent() {
        let trades = vec![trade("1", 8, 5.0), trade("2", 3, -1.0)];
        let snaps = vec![snap(4, 10.0)];
        let mut once = History::new();
        once.merge(&trades, &snaps);
        let mut twice = once.clone();
        let stats = twice.merge(&trades, &snaps);
        assert_eq!(stats.trades_added + stats.snapshots_added, 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn bulk_merge_later_source_wins() {
        let report = vec![trade("1", 8, 5.0), trade("2", 9, 1.0)];
        let log = vec![trade("1", 8, 6.5)];
        let merged = bulk_merge(&[report, log]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].ticket, "1");
        assert_eq!(merged[0].profit, 6.5);
    }

    #[test]
    fn bulk_merge_filters_and_sorts() {
        let mut open = trade("3", 1, 0.0);
        open.closed_at = None;
        let merged = bulk_merge(&[vec![trade("2", 12, 1.0), open, trade("", 1, 1.0)], vec![
            trade("1", 2, 1.0),
        ]]);
        let tickets: Vec<_> = merged.iter().map(|t| t.ticket.as_str()).collect();
        assert_eq!(tickets, vec!["1", "2"]);
    }

    #[test]
    fn bootstrap_builds_sorted_history() {
        let (history, stats) = History::bootstrap(
            &[vec![trade("9", 15, 2.0), trade("8", 11, 1.0)]],
            &[snap(12, 1.0), snap(12, 2.0)],
        );
        assert_eq!(stats.trades_added, 2);
        assert_eq!(stats.snapshots_added, 1);
        assert_eq!(history.trades[0].ticket, "8");
        assert_eq!(history.version, HISTORY_VERSION);
    }

    #[test]
    fn materialized_trades_skip_unparseable() {
        let mut history = History::new();
        history.merge(&[trade("1", 8, 1.0)], &[]);
        history.trades.push(TradeRecord {
            closed_at: Some("garbage".into()),
            ..TradeRecord::from_raw(&trade("2", 9, 1.0))
        });
        let closed = history.closed_trades();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].closed_at, at(8));
    }

    #[test]
    fn account_snapshots_sorted() {
        let mut history = History::new();
        history.merge(&[], &[snap(5, 1.0), snap(2, 2.0)]);
        let snaps = history.account_snapshots();
        assert!(snaps[0].timestamp < snaps[1].timestamp);
        assert_eq!(snaps[1].timestamp - snaps[0].timestamp, Duration::hours(3));
    }
}
