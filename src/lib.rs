//! webticker: trading history merge and dashboard payload builder.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], orchestration in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
