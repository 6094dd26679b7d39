use serde::{Deserialize, Serialize};

use crate::amount::deserialize_amount;

/// Balance sheet stock amounts (point-in-time).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub current_assets: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub current_liabilities: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub inventory: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub total_liabilities: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub equity: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub retained_earnings: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub total_assets: Option<f64>,
}

/// Income statement flow amounts for the period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub ebit: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub interest_expense: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub net_income: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub revenue: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub operating_cash_flow: Option<f64>,
}

/// Prior-period figures. Only revenue is consumed (for growth).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviousYear {
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub revenue: Option<f64>,
}

/// One company's financial data as handed to the scoring engine.
///
/// Every section and every leaf is optional. Upstream sources (scrapers,
/// AI extraction, manual entry) routinely leave gaps; the scorer decides
/// what a gap means, not the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    #[serde(default)]
    pub balance_sheet: Option<BalanceSheet>,
    #[serde(default)]
    pub income_statement: Option<IncomeStatement>,
    #[serde(default)]
    pub cash_flow: Option<CashFlowStatement>,
    #[serde(default)]
    pub previous_year: Option<PreviousYear>,
    /// Beneish M-score computed upstream
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub beneish_m_score: Option<f64>,
    /// Altman Z-score computed upstream
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub altman_z_score: Option<f64>,
}

impl FinancialRecord {
    pub fn balance_sheet_mut(&mut self) -> &mut BalanceSheet {
        self.balance_sheet.get_or_insert_with(BalanceSheet::default)
    }

    pub fn income_statement_mut(&mut self) -> &mut IncomeStatement {
        self.income_statement.get_or_insert_with(IncomeStatement::default)
    }

    pub fn cash_flow_mut(&mut self) -> &mut CashFlowStatement {
        self.cash_flow.get_or_insert_with(CashFlowStatement::default)
    }

    pub fn previous_year_mut(&mut self) -> &mut PreviousYear {
        self.previous_year.get_or_insert_with(PreviousYear::default)
    }
}
