//! Financial statements. Every field is one table row: a value per period,
//! most recent first (TTM column included when the page shows one).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeStatement {
    pub total_revenue: Vec<f64>,
    pub cost_of_revenue: Vec<f64>,
    pub gross_profit: Vec<f64>,
    pub operating_expense: Vec<f64>,
    pub operating_income: Vec<f64>,
    pub net_non_operating_interest_income_expense: Vec<f64>,
    pub other_income_expense: Vec<f64>,
    pub pretax_income: Vec<f64>,
    pub tax_provision: Vec<f64>,
    pub earnings_from_equity_interest_net_of_tax: Vec<f64>,
    pub net_income_common_stockholders: Vec<f64>,
    pub diluted_ni_available_to_common_stockholders: Vec<f64>,
    pub basic_eps: Vec<f64>,
    pub diluted_eps: Vec<f64>,
    pub basic_average_shares: Vec<f64>,
    pub diluted_average_shares: Vec<f64>,
    pub total_operating_income_as_reported: Vec<f64>,
    pub rent_expense_supplemental: Vec<f64>,
    pub total_expenses: Vec<f64>,
    pub net_income_from_continuing_and_discontinued_operation: Vec<f64>,
    pub normalized_income: Vec<f64>,
    pub interest_income: Vec<f64>,
    pub interest_expense: Vec<f64>,
    pub net_interest_income: Vec<f64>,
    pub ebit: Vec<f64>,
    pub ebitda: Vec<f64>,
    pub reconciled_cost_of_revenue: Vec<f64>,
    pub reconciled_depreciation: Vec<f64>,
    pub net_income_from_continuing_operation: Vec<f64>,
    pub total_unusual_items_excluding_goodwill: Vec<f64>,
    pub total_unusual_items: Vec<f64>,
    pub normalized_ebitda: Vec<f64>,
    pub tax_rate_for_calcs: Vec<f64>,
    pub tax_effect_of_unusual_items: Vec<f64>,
}

/// Annual balance sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceSheet {
    pub total_assets: Vec<f64>,
    pub total_liabilities_net_minority_interest: Vec<f64>,
    pub total_equity_gross_minority_interest: Vec<f64>,
    pub total_capitalization: Vec<f64>,
    pub common_stock_equity: Vec<f64>,
    pub capital_lease_obligations: Vec<f64>,
    pub net_tangible_assets: Vec<f64>,
    pub working_capital: Vec<f64>,
    pub invested_capital: Vec<f64>,
    pub tangible_book_value: Vec<f64>,
    pub total_debt: Vec<f64>,
    pub net_debt: Vec<f64>,
    pub share_issued: Vec<f64>,
    pub ordinary_shares_number: Vec<f64>,
    pub treasury_shares_number: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Financial {
    pub income_statement: IncomeStatement,
    pub balance_sheet: BalanceSheet,
}
