//! Core domain types and logic.

pub mod aggregate;
pub mod error;
pub mod exit;
pub mod history;
pub mod normalize;
pub mod report;
pub mod settings;
pub mod snapshot;
pub mod timestamp;
pub mod trade;
