use health_core::FinancialRecord;
use serde::{Deserialize, Serialize};

/// M-score assumed when the record carries none.
pub const DEFAULT_BENEISH_M_SCORE: f64 = -2.0;
/// Z-score assumed when the record carries none.
pub const DEFAULT_ALTMAN_Z_SCORE: f64 = 3.0;

/// The thirteen ratios the scoring policy consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioKind {
    CurrentRatio,
    QuickRatio,
    DebtToEquity,
    InterestCoverage,
    RetainedEarningsRatio,
    ReturnOnAssets,
    ReturnOnEquity,
    NetMargin,
    AssetTurnover,
    OperatingCashflowRatio,
    RevenueGrowth,
    BeneishMScore,
    AltmanZScore,
}

impl RatioKind {
    pub const ALL: [RatioKind; 13] = [
        RatioKind::CurrentRatio,
        RatioKind::QuickRatio,
        RatioKind::DebtToEquity,
        RatioKind::InterestCoverage,
        RatioKind::RetainedEarningsRatio,
        RatioKind::ReturnOnAssets,
        RatioKind::ReturnOnEquity,
        RatioKind::NetMargin,
        RatioKind::AssetTurnover,
        RatioKind::OperatingCashflowRatio,
        RatioKind::RevenueGrowth,
        RatioKind::BeneishMScore,
        RatioKind::AltmanZScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RatioKind::CurrentRatio => "current_ratio",
            RatioKind::QuickRatio => "quick_ratio",
            RatioKind::DebtToEquity => "debt_to_equity",
            RatioKind::InterestCoverage => "interest_coverage",
            RatioKind::RetainedEarningsRatio => "retained_earnings_ratio",
            RatioKind::ReturnOnAssets => "return_on_assets",
            RatioKind::ReturnOnEquity => "return_on_equity",
            RatioKind::NetMargin => "net_margin",
            RatioKind::AssetTurnover => "asset_turnover",
            RatioKind::OperatingCashflowRatio => "operating_cashflow_ratio",
            RatioKind::RevenueGrowth => "revenue_growth",
            RatioKind::BeneishMScore => "beneish_m_score",
            RatioKind::AltmanZScore => "altman_z_score",
        }
    }
}

/// Raw amounts pulled out of a record, gaps already defaulted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInputs {
    pub current_assets: f64,
    pub current_liabilities: f64,
    pub inventory: f64,
    pub total_liabilities: f64,
    pub equity: f64,
    pub retained_earnings: f64,
    pub total_assets: f64,
    pub ebit: f64,
    pub interest_expense: f64,
    pub net_income: f64,
    pub revenue: f64,
    pub operating_cash_flow: f64,
    /// `None` when the record has no prior-period revenue at all
    pub previous_revenue: Option<f64>,
    pub beneish_m_score: f64,
    pub altman_z_score: f64,
}

/// Pull the raw quantities out of a record.
///
/// Missing amounts become `0`; the two forensic scores fall back to their
/// own defaults instead.
pub fn extract_inputs(record: &FinancialRecord) -> RawInputs {
    let bs = record.balance_sheet.clone().unwrap_or_default();
    let is = record.income_statement.clone().unwrap_or_default();
    let cf = record.cash_flow.clone().unwrap_or_default();

    RawInputs {
        current_assets: bs.current_assets.unwrap_or(0.0),
        current_liabilities: bs.current_liabilities.unwrap_or(0.0),
        inventory: bs.inventory.unwrap_or(0.0),
        total_liabilities: bs.total_liabilities.unwrap_or(0.0),
        equity: bs.equity.unwrap_or(0.0),
        retained_earnings: bs.retained_earnings.unwrap_or(0.0),
        total_assets: bs.total_assets.unwrap_or(0.0),
        ebit: is.ebit.unwrap_or(0.0),
        interest_expense: is.interest_expense.unwrap_or(0.0),
        net_income: is.net_income.unwrap_or(0.0),
        revenue: is.revenue.unwrap_or(0.0),
        operating_cash_flow: cf.operating_cash_flow.unwrap_or(0.0),
        previous_revenue: record.previous_year.as_ref().and_then(|p| p.revenue),
        beneish_m_score: record.beneish_m_score.unwrap_or(DEFAULT_BENEISH_M_SCORE),
        altman_z_score: record.altman_z_score.unwrap_or(DEFAULT_ALTMAN_Z_SCORE),
    }
}

/// Divide, resolving a zero denominator to `0` instead of infinity.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// The derived ratios for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    pub current_ratio: f64,
    pub quick_ratio: f64,
    pub debt_to_equity: f64,
    pub interest_coverage: f64,
    pub retained_earnings_ratio: f64,
    pub return_on_assets: f64,
    pub return_on_equity: f64,
    pub net_margin: f64,
    pub asset_turnover: f64,
    pub operating_cashflow_ratio: f64,
    pub revenue_growth: f64,
    pub beneish_m_score: f64,
    pub altman_z_score: f64,
}

impl RatioSet {
    pub fn from_inputs(raw: &RawInputs) -> Self {
        let revenue_growth = match raw.previous_revenue {
            Some(prev) if prev != 0.0 => (raw.revenue - prev) / prev,
            _ => 0.0,
        };

        Self {
            current_ratio: safe_div(raw.current_assets, raw.current_liabilities),
            quick_ratio: safe_div(raw.current_assets - raw.inventory, raw.current_liabilities),
            debt_to_equity: safe_div(raw.total_liabilities, raw.equity),
            interest_coverage: safe_div(raw.ebit, raw.interest_expense),
            retained_earnings_ratio: safe_div(raw.retained_earnings, raw.total_assets),
            return_on_assets: safe_div(raw.net_income, raw.total_assets),
            return_on_equity: safe_div(raw.net_income, raw.equity),
            net_margin: safe_div(raw.net_income, raw.revenue),
            asset_turnover: safe_div(raw.revenue, raw.total_assets),
            operating_cashflow_ratio: safe_div(raw.operating_cash_flow, raw.total_assets),
            revenue_growth,
            beneish_m_score: raw.beneish_m_score,
            altman_z_score: raw.altman_z_score,
        }
    }

    pub fn get(&self, kind: RatioKind) -> f64 {
        match kind {
            RatioKind::CurrentRatio => self.current_ratio,
            RatioKind::QuickRatio => self.quick_ratio,
            RatioKind::DebtToEquity => self.debt_to_equity,
            RatioKind::InterestCoverage => self.interest_coverage,
            RatioKind::RetainedEarningsRatio => self.retained_earnings_ratio,
            RatioKind::ReturnOnAssets => self.return_on_assets,
            RatioKind::ReturnOnEquity => self.return_on_equity,
            RatioKind::NetMargin => self.net_margin,
            RatioKind::AssetTurnover => self.asset_turnover,
            RatioKind::OperatingCashflowRatio => self.operating_cashflow_ratio,
            RatioKind::RevenueGrowth => self.revenue_growth,
            RatioKind::BeneishMScore => self.beneish_m_score,
            RatioKind::AltmanZScore => self.altman_z_score,
        }
    }
}

/// Extract and compute in one step.
pub fn compute_ratios(record: &FinancialRecord) -> RatioSet {
    RatioSet::from_inputs(&extract_inputs(record))
}
