//! Key statistics page: financial highlights, trading information, dividends
//! and the multi-period valuation table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Valuation table rows, one entry per reported period (current first).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationMetrics {
    pub market_cap: Vec<String>,
    pub enterprise_value: Vec<String>,
    pub trailing_pe: Vec<String>,
    pub forward_pe: Vec<String>,
    pub peg_ratio: Vec<String>,
    pub price_sales: Vec<String>,
    pub price_book: Vec<String>,
    pub enterprise_value_revenue: Vec<String>,
    pub enterprise_value_ebitda: Vec<String>,
}

/// Ratios are fractions (`0.184` for `18.4%`). Amounts Yahoo prints with a
/// magnitude suffix and that callers usually display as-is stay text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    // Financial highlights
    pub fiscal_year_end: String,
    pub most_recent_quarter: String,
    pub profit_margin: f64,
    pub operating_margin: f64,
    pub return_on_assets: f64,
    pub return_on_equity: f64,
    pub revenue: String,
    pub revenue_per_share: f64,
    pub quarterly_revenue_growth: f64,
    pub ebitda: String,
    pub net_income_available_to_common: String,
    pub diluted_eps: f64,
    pub quarterly_earnings_growth: String,
    pub total_cash: String,
    pub total_cash_per_share: f64,
    pub total_debt: String,
    pub total_debt_equity: f64,
    pub current_ratio: f64,
    pub book_value_per_share: f64,
    pub operating_cash_flow: String,
    pub levered_free_cash_flow: String,

    // Trading information
    pub beta: f64,
    pub fifty_two_week_range: String,
    pub sp500_fifty_two_week_change: f64,
    pub fifty_two_week_high: f64,
    pub fifty_two_week_low: f64,
    pub fifty_day_moving_average: f64,
    pub two_hundred_day_moving_average: f64,
    pub avg_volume_3_month: String,
    pub avg_volume_10_day: String,
    pub shares_outstanding: f64,
    pub implied_shares_outstanding: f64,
    pub float_shares: f64,
    pub percent_held_by_insiders: f64,
    pub percent_held_by_institutions: f64,

    // Dividends and splits
    pub forward_annual_dividend_rate: f64,
    pub forward_annual_dividend_yield: f64,
    pub trailing_annual_dividend_rate: f64,
    pub trailing_annual_dividend_yield: f64,
    pub five_year_avg_dividend_yield: f64,
    pub payout_ratio: f64,
    pub ex_dividend_date: Option<NaiveDate>,
    pub last_split_factor: String,
    pub last_split_date: Option<NaiveDate>,

    pub valuation_metrics: ValuationMetrics,
}
