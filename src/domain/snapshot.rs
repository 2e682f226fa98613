//! Account snapshots (balance, equity, floating profit at a point in time).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp::{format_iso, parse_iso, round_to};

pub const SNAPSHOT_PLACES: i32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub balance: f64,
    pub equity: f64,
    pub floating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub equity: f64,
    #[serde(default)]
    pub floating: f64,
}

impl SnapshotRecord {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            timestamp: format_iso(&snapshot.timestamp),
            balance: round_to(snapshot.balance, SNAPSHOT_PLACES),
            equity: round_to(snapshot.equity, SNAPSHOT_PLACES),
            floating: round_to(snapshot.floating, SNAPSHOT_PLACES),
        }
    }
}

impl Snapshot {
    pub fn from_record(record: &SnapshotRecord) -> Option<Self> {
        Some(Self {
            timestamp: parse_iso(&record.timestamp)?,
            balance: record.balance,
            equity: record.equity,
            floating: record.floating,
        })
    }
}
