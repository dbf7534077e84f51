//! Daily price history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the historical prices table.
///
/// Dividend and split rows share the table with price rows; they bind with
/// zero prices and can be filtered with [`HistoricalPoint::is_price_row`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoricalPoint {
    pub date: Option<NaiveDate>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}

impl HistoricalPoint {
    /// A dated row with a positive close.
    pub fn is_price_row(&self) -> bool {
        self.date.is_some() && self.close > 0.0
    }
}
