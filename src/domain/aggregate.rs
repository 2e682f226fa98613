//! Performance aggregates computed from the materialized history.
//!
//! Every function takes trades ascending by close time and an explicit `now`;
//! nothing is cached between runs.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::exit::{ExitType, classify};
use super::timestamp::{format_iso, round_to};
use super::trade::ClosedTrade;

pub const UNKNOWN_SYMBOL: &str = "UNKWN";
pub const RANKED_LIST_LEN: usize = 5;
pub const RECENT_TRADES: usize = 10;
pub const DAILY_BREAKDOWN_DAYS: i64 = 7;

/// Fixed rolling windows: key, length in days, display label.
pub const WINDOWS: [(&str, i64, &str); 3] = [
    ("7d", 7, "Last 7 days"),
    ("30d", 30, "Last 30 days"),
    ("365d", 365, "Last 365 days"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub profit: f64,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
}

pub fn summarize(trades: &[&ClosedTrade]) -> Summary {
    let total = trades.len();
    let profit: f64 = trades.iter().map(|t| t.profit).sum();
    let wins = trades.iter().filter(|t| t.profit > 0.0).count();
    let losses = trades.iter().filter(|t| t.profit < 0.0).count();
    let win_rate = if total > 0 {
        round_to(wins as f64 / total as f64 * 100.0, 2)
    } else {
        0.0
    };
    Summary {
        profit: round_to(profit, 2),
        trades: total,
        wins,
        losses,
        win_rate,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeSummary {
    pub ticket: String,
    pub symbol: Option<String>,
    pub profit: f64,
    pub volume: f64,
    pub order_type: String,
    pub closed_at: String,
    pub exit: &'static str,
    pub exit_type: ExitType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TradeSummary {
    pub fn from_trade(trade: &ClosedTrade, include_comment: bool) -> Self {
        let exit_type = classify(trade);
        TradeSummary {
            ticket: trade.ticket.clone(),
            symbol: trade.symbol.clone(),
            profit: round_to(trade.profit, 2),
            volume: round_to(trade.volume, 2),
            order_type: trade.side(),
            closed_at: format_iso(&trade.closed_at),
            exit: exit_type.label(),
            exit_type,
            comment: if include_comment {
                trade.comment.clone()
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowStats {
    #[serde(skip)]
    pub key: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub summary: Summary,
    pub best_trade: Option<TradeSummary>,
    pub worst_trade: Option<TradeSummary>,
}

/// Stats for each of [`WINDOWS`], in that order.
pub fn build_windows(trades: &[ClosedTrade], now: DateTime<Utc>) -> Vec<WindowStats> {
    WINDOWS
        .iter()
        .map(|&(key, days, label)| {
            let cutoff = now - Duration::days(days);
            let in_window: Vec<&ClosedTrade> =
                trades.iter().filter(|t| t.closed_at >= cutoff).collect();
            WindowStats {
                key,
                label,
                summary: summarize(&in_window),
                best_trade: best_trade(&in_window).map(|t| TradeSummary::from_trade(t, false)),
                worst_trade: worst_trade(&in_window).map(|t| TradeSummary::from_trade(t, false)),
            }
        })
        .collect()
}

/// Highest profit; the earliest trade wins a tie.
fn best_trade<'a>(trades: &[&'a ClosedTrade]) -> Option<&'a ClosedTrade> {
    let mut best: Option<&ClosedTrade> = None;
    for &trade in trades {
        if best.is_none_or(|b| trade.profit > b.profit) {
            best = Some(trade);
        }
    }
    best
}

/// Lowest profit; the earliest trade wins a tie.
fn worst_trade<'a>(trades: &[&'a ClosedTrade]) -> Option<&'a ClosedTrade> {
    let mut worst: Option<&ClosedTrade> = None;
    for &trade in trades {
        if worst.is_none_or(|w| trade.profit < w.profit) {
            worst = Some(trade);
        }
    }
    worst
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolStats {
    pub symbol: String,
    pub profit: f64,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRanking {
    pub ranked: Vec<SymbolStats>,
    pub top: Vec<SymbolStats>,
    pub bottom: Vec<SymbolStats>,
}

/// Rank symbols by total profit, descending.
///
/// Ties keep first-encounter order. With fewer than twice
/// [`RANKED_LIST_LEN`] symbols, `top` and `bottom` share entries.
pub fn rank_symbols(trades: &[ClosedTrade]) -> SymbolRanking {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<SymbolStats> = Vec::new();

    for trade in trades {
        let symbol = trade.symbol.as_deref().unwrap_or(UNKNOWN_SYMBOL);
        let slot = *index.entry(symbol).or_insert_with(|| {
            groups.push(SymbolStats {
                symbol: symbol.to_string(),
                profit: 0.0,
                trades: 0,
                wins: 0,
                losses: 0,
                rank: 0,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.profit += trade.profit;
        group.trades += 1;
        if trade.profit > 0.0 {
            group.wins += 1;
        } else if trade.profit < 0.0 {
            group.losses += 1;
        }
    }

    groups.sort_by(|a, b| b.profit.total_cmp(&a.profit));
    for (i, group) in groups.iter_mut().enumerate() {
        group.rank = i + 1;
    }

    let top = groups.iter().take(RANKED_LIST_LEN).cloned().collect();
    let mut bottom: Vec<SymbolStats> = groups
        .iter()
        .skip(groups.len().saturating_sub(RANKED_LIST_LEN))
        .cloned()
        .collect();
    bottom.sort_by_key(|s| s.rank);

    SymbolRanking {
        ranked: groups,
        top,
        bottom,
    }
}

/// The last [`RECENT_TRADES`] trades, newest first, comments included.
pub fn recent_trades(trades: &[ClosedTrade]) -> Vec<TradeSummary> {
    trades
        .iter()
        .rev()
        .take(RECENT_TRADES)
        .map(|t| TradeSummary::from_trade(t, true))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub profit: f64,
    pub trades: usize,
}

/// Profit and trade count per UTC calendar day over the last
/// [`DAILY_BREAKDOWN_DAYS`] days, ascending by date.
pub fn daily_breakdown(trades: &[ClosedTrade], now: DateTime<Utc>) -> Vec<DailyBucket> {
    let cutoff = now - Duration::days(DAILY_BREAKDOWN_DAYS);
    let mut buckets: Vec<DailyBucket> = Vec::new();
    for trade in trades.iter().filter(|t| t.closed_at >= cutoff) {
        let date = trade.closed_at.date_naive();
        match buckets.iter_mut().find(|b| b.date == date) {
            Some(bucket) => {
                bucket.profit += trade.profit;
                bucket.trades += 1;
            }
            None => buckets.push(DailyBucket {
                date,
                profit: trade.profit,
                trades: 1,
            }),
        }
    }
    buckets.sort_by_key(|b| b.date);
    buckets
}
