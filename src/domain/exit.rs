//! Exit classification: take-profit, stop-loss or manual close.
//!
//! Rules are evaluated in table order and the first match wins. All
//! take-profit rules come before any stop-loss rule, so a take-profit hint in
//! a free-text field beats an explicit stop-loss label.

use serde::Serialize;

use super::trade::ClosedTrade;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitType {
    Tp,
    Sl,
    Manual,
}

impl ExitType {
    pub fn label(self) -> &'static str {
        match self {
            ExitType::Tp => "Exit: TP",
            ExitType::Sl => "Exit: SL",
            ExitType::Manual => "Exit Manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitField {
    TpLabel,
    SlLabel,
    ExitReason,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Field is set and non-empty.
    Present,
    /// Field contains one of the hints after trimming and lowercasing.
    ContainsAny(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitRule {
    pub field: ExitField,
    pub matcher: Matcher,
    pub outcome: ExitType,
}

pub const TP_REASON_HINTS: &[&str] = &[
    "deal_reason_tp",
    "tp_hit",
    "takeprofit",
    "take profit",
    "target_tp",
];
pub const SL_REASON_HINTS: &[&str] = &[
    "deal_reason_sl",
    "sl_hit",
    "stoploss",
    "stop loss",
    "target_sl",
];
pub const TP_COMMENT_HINTS: &[&str] =
    &["[tp", " tp", "tp ", "tp:", "tp-", "tp hit", "take profit"];
pub const SL_COMMENT_HINTS: &[&str] =
    &["[sl", " sl", "sl ", "sl:", "sl-", "sl hit", "stop loss"];

pub const EXIT_RULES: [ExitRule; 6] = [
    ExitRule {
        field: ExitField::TpLabel,
        matcher: Matcher::Present,
        outcome: ExitType::Tp,
    },
    ExitRule {
        field: ExitField::ExitReason,
        matcher: Matcher::ContainsAny(TP_REASON_HINTS),
        outcome: ExitType::Tp,
    },
    ExitRule {
        field: ExitField::Comment,
        matcher: Matcher::ContainsAny(TP_COMMENT_HINTS),
        outcome: ExitType::Tp,
    },
    ExitRule {
        field: ExitField::SlLabel,
        matcher: Matcher::Present,
        outcome: ExitType::Sl,
    },
    ExitRule {
        field: ExitField::ExitReason,
        matcher: Matcher::ContainsAny(SL_REASON_HINTS),
        outcome: ExitType::Sl,
    },
    ExitRule {
        field: ExitField::Comment,
        matcher: Matcher::ContainsAny(SL_COMMENT_HINTS),
        outcome: ExitType::Sl,
    },
];

impl ExitRule {
    pub fn matches(&self, trade: &ClosedTrade) -> bool {
        let value = match self.field {
            ExitField::TpLabel => trade.tp_label.as_deref(),
            ExitField::SlLabel => trade.sl_label.as_deref(),
            ExitField::ExitReason => trade.exit_reason.as_deref(),
            ExitField::Comment => trade.comment.as_deref(),
        };
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            return false;
        };
        match self.matcher {
            Matcher::Present => true,
            Matcher::ContainsAny(hints) => {
                let text = value.trim().to_lowercase();
                hints.iter().any(|hint| text.contains(hint))
            }
        }
    }
}

pub fn classify_with(rules: &[ExitRule], trade: &ClosedTrade) -> ExitType {
    rules
        .iter()
        .find(|rule| rule.matches(trade))
        .map(|rule| rule.outcome)
        .unwrap_or(ExitType::Manual)
}

pub fn classify(trade: &ClosedTrade) -> ExitType {
    classify_with(&EXIT_RULES, trade)
}
