//! Account statement (HTML export) reader.
//!
//! The trade table is the first `<table>` in the document. Its header row
//! starts with a "Time"/"Zeit" cell; trade rows follow until a section
//! heading such as "Results" or "Balance" begins.

use std::fs;
use std::path::PathBuf;

use scraper::{ElementRef, Html, Selector};

use crate::adapters::text_decode::decode_statement;
use crate::domain::error::TickerError;
use crate::domain::timestamp::parse_terminal;
use crate::domain::trade::RawTrade;
use crate::ports::log_port::LogPort;
use crate::ports::source_port::StatementPort;

const HEADER_MIN_CELLS: usize = 7;
const TRADE_MIN_CELLS: usize = 14;
const HEADER_LABELS: [&str; 2] = ["time", "zeit"];
const SECTION_TERMINATORS: [&str; 4] = ["Ergebnisse", "Balanceoperationen", "Results", "Balance"];

const COL_OPEN_TIME: usize = 0;
const COL_TICKET: usize = 1;
const COL_SYMBOL: usize = 2;
const COL_TYPE: usize = 3;
const COL_COMMENT: usize = 4;
const COL_VOLUME: usize = 5;
const COL_CLOSE_TIME: usize = 9;

pub struct StatementAdapter {
    path: PathBuf,
}

impl StatementAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StatementPort for StatementAdapter {
    fn read_trades(&self, log: &dyn LogPort) -> Result<Vec<RawTrade>, TickerError> {
        let bytes = fs::read(&self.path)?;
        let html = decode_statement(&bytes).ok_or_else(|| TickerError::Decode {
            path: self.path.display().to_string(),
        })?;
        let trades = parse_statement(&html)?;
        log.info(&format!(
            "statement {}: {} trades",
            self.path.display(),
            trades.len()
        ));
        Ok(trades)
    }
}

fn selector(css: &str) -> Result<Selector, TickerError> {
    Selector::parse(css).map_err(|e| TickerError::StatementTable {
        reason: format!("invalid selector '{css}': {e}"),
    })
}

fn cell_texts(row: ElementRef<'_>, cells: &Selector) -> Vec<String> {
    row.select(cells)
        .map(|cell| cell.text().map(str::trim).collect::<String>())
        .collect()
}

fn is_header(cells: &[String]) -> bool {
    cells.len() >= HEADER_MIN_CELLS
        && cells.first().is_some_and(|first| {
            let first = first.to_lowercase();
            HEADER_LABELS.iter().any(|label| first.starts_with(label))
        })
}

/// Numeric cell: comma decimals become dots, then everything except digits,
/// sign and dot is dropped. Unparseable cells read as zero.
pub fn parse_number(cell: &str) -> f64 {
    let cleaned: String = cell
        .replace(',', ".")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '.')
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

fn optional(cell: &str) -> Option<String> {
    (!cell.is_empty()).then(|| cell.to_string())
}

fn row_trade(cells: &[String]) -> Option<RawTrade> {
    let opened_at = parse_terminal(&cells[COL_OPEN_TIME])?;
    let closed_at = parse_terminal(&cells[COL_CLOSE_TIME])?;
    let profit = cells.last().map(|c| parse_number(c)).unwrap_or(0.0);
    Some(RawTrade {
        ticket: cells[COL_TICKET].clone(),
        symbol: optional(&cells[COL_SYMBOL]),
        order_type: optional(&cells[COL_TYPE]),
        comment: optional(&cells[COL_COMMENT]),
        volume: parse_number(&cells[COL_VOLUME]),
        profit,
        opened_at: Some(opened_at),
        closed_at: Some(closed_at),
        ..Default::default()
    })
}

/// Extract closed trades from decoded statement HTML.
pub fn parse_statement(html: &str) -> Result<Vec<RawTrade>, TickerError> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td, th")?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| TickerError::StatementTable {
            reason: "no table found".into(),
        })?;
    let rows: Vec<Vec<String>> = table
        .select(&row_sel)
        .map(|row| cell_texts(row, &cell_sel))
        .collect();

    let header = rows
        .iter()
        .position(|cells| is_header(cells))
        .ok_or_else(|| TickerError::StatementTable {
            reason: "no 'Time' header row found".into(),
        })?;

    let mut trades = Vec::new();
    for cells in &rows[header + 1..] {
        let Some(first) = cells.first() else {
            break;
        };
        if SECTION_TERMINATORS.iter().any(|label| first.starts_with(label)) {
            break;
        }
        if cells.len() < TRADE_MIN_CELLS {
            continue;
        }
        if let Some(trade) = row_trade(cells) {
            trades.push(trade);
        }
    }
    Ok(trades)
}
