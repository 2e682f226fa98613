//! Input source ports: the incremental state log and the bulk statement.

use crate::domain::error::TickerError;
use crate::domain::normalize::TaggedRecord;
use crate::domain::trade::RawTrade;
use crate::ports::log_port::LogPort;

pub trait StateLogPort {
    /// All tagged records, in file order. A missing log yields no records.
    fn read_records(&self, log: &dyn LogPort) -> Result<Vec<TaggedRecord>, TickerError>;
}

pub trait StatementPort {
    /// Closed trades from the statement's trade table.
    fn read_trades(&self, log: &dyn LogPort) -> Result<Vec<RawTrade>, TickerError>;
}
