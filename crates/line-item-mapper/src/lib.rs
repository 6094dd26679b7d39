//! Line Item Mapper
//!
//! Maps raw statement line items, as scraped or extracted, onto the
//! canonical [`FinancialRecord`] schema the scorer consumes.

use std::collections::{HashMap, HashSet};

use health_core::{parse_amount, AnalysisError, FinancialRecord};
use serde::{Deserialize, Serialize};

/// A value as it arrived: a JSON number, a formatted string, or nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
    Missing,
}

impl RawAmount {
    fn resolve(&self) -> Result<Option<f64>, AnalysisError> {
        match self {
            RawAmount::Number(n) => Ok(Some(*n)),
            RawAmount::Text(s) => parse_amount(s),
            RawAmount::Missing => Ok(None),
        }
    }
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Number(value)
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    Current,
    Previous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub label: String,
    pub value: RawAmount,
    #[serde(default)]
    pub period: Period,
}

impl LineItem {
    pub fn new(label: &str, value: impl Into<RawAmount>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
            period: Period::Current,
        }
    }

    pub fn previous(label: &str, value: impl Into<RawAmount>) -> Self {
        Self {
            period: Period::Previous,
            ..Self::new(label, value)
        }
    }
}

/// Statement-level unit convention ("in thousands", "in millions").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    #[default]
    Units,
    Thousands,
    Millions,
    Billions,
}

impl Scale {
    pub fn multiplier(&self) -> f64 {
        match self {
            Scale::Units => 1.0,
            Scale::Thousands => 1e3,
            Scale::Millions => 1e6,
            Scale::Billions => 1e9,
        }
    }
}

/// Leaves of the canonical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    CurrentAssets,
    CurrentLiabilities,
    Inventory,
    TotalLiabilities,
    Equity,
    RetainedEarnings,
    TotalAssets,
    Ebit,
    InterestExpense,
    NetIncome,
    Revenue,
    OperatingCashFlow,
    PreviousRevenue,
    BeneishMScore,
    AltmanZScore,
}

impl CanonicalField {
    /// Forensic scores are dimensionless; statement scale never applies.
    fn is_dimensionless(&self) -> bool {
        matches!(self, CanonicalField::BeneishMScore | CanonicalField::AltmanZScore)
    }

    fn assign(&self, record: &mut FinancialRecord, value: f64) {
        let value = Some(value);
        match self {
            CanonicalField::CurrentAssets => record.balance_sheet_mut().current_assets = value,
            CanonicalField::CurrentLiabilities => {
                record.balance_sheet_mut().current_liabilities = value
            }
            CanonicalField::Inventory => record.balance_sheet_mut().inventory = value,
            CanonicalField::TotalLiabilities => record.balance_sheet_mut().total_liabilities = value,
            CanonicalField::Equity => record.balance_sheet_mut().equity = value,
            CanonicalField::RetainedEarnings => record.balance_sheet_mut().retained_earnings = value,
            CanonicalField::TotalAssets => record.balance_sheet_mut().total_assets = value,
            CanonicalField::Ebit => record.income_statement_mut().ebit = value,
            CanonicalField::InterestExpense => record.income_statement_mut().interest_expense = value,
            CanonicalField::NetIncome => record.income_statement_mut().net_income = value,
            CanonicalField::Revenue => record.income_statement_mut().revenue = value,
            CanonicalField::OperatingCashFlow => record.cash_flow_mut().operating_cash_flow = value,
            CanonicalField::PreviousRevenue => record.previous_year_mut().revenue = value,
            CanonicalField::BeneishMScore => record.beneish_m_score = value,
            CanonicalField::AltmanZScore => record.altman_z_score = value,
        }
    }
}

/// Built-in label synonyms, already in normalized form.
const SYNONYMS: &[(&str, CanonicalField)] = &[
    ("current assets", CanonicalField::CurrentAssets),
    ("total current assets", CanonicalField::CurrentAssets),
    ("current liabilities", CanonicalField::CurrentLiabilities),
    ("total current liabilities", CanonicalField::CurrentLiabilities),
    ("inventory", CanonicalField::Inventory),
    ("inventories", CanonicalField::Inventory),
    ("stock in trade", CanonicalField::Inventory),
    ("merchandise inventory", CanonicalField::Inventory),
    ("total liabilities", CanonicalField::TotalLiabilities),
    ("liabilities", CanonicalField::TotalLiabilities),
    ("equity", CanonicalField::Equity),
    ("total equity", CanonicalField::Equity),
    ("shareholders equity", CanonicalField::Equity),
    ("stockholders equity", CanonicalField::Equity),
    ("total shareholders equity", CanonicalField::Equity),
    ("total stockholders equity", CanonicalField::Equity),
    ("net worth", CanonicalField::Equity),
    ("retained earnings", CanonicalField::RetainedEarnings),
    ("accumulated profits", CanonicalField::RetainedEarnings),
    ("reserves and surplus", CanonicalField::RetainedEarnings),
    ("total assets", CanonicalField::TotalAssets),
    ("assets", CanonicalField::TotalAssets),
    ("ebit", CanonicalField::Ebit),
    ("operating income", CanonicalField::Ebit),
    ("operating profit", CanonicalField::Ebit),
    ("earnings before interest and taxes", CanonicalField::Ebit),
    ("interest expense", CanonicalField::InterestExpense),
    ("finance costs", CanonicalField::InterestExpense),
    ("finance cost", CanonicalField::InterestExpense),
    ("interest paid", CanonicalField::InterestExpense),
    ("net income", CanonicalField::NetIncome),
    ("net profit", CanonicalField::NetIncome),
    ("net earnings", CanonicalField::NetIncome),
    ("profit after tax", CanonicalField::NetIncome),
    ("pat", CanonicalField::NetIncome),
    ("net income loss", CanonicalField::NetIncome),
    ("revenue", CanonicalField::Revenue),
    ("revenues", CanonicalField::Revenue),
    ("total revenue", CanonicalField::Revenue),
    ("net sales", CanonicalField::Revenue),
    ("sales", CanonicalField::Revenue),
    ("turnover", CanonicalField::Revenue),
    ("revenue from operations", CanonicalField::Revenue),
    ("operating cash flow", CanonicalField::OperatingCashFlow),
    ("cash from operations", CanonicalField::OperatingCashFlow),
    ("net cash from operating activities", CanonicalField::OperatingCashFlow),
    ("net cash provided by operating activities", CanonicalField::OperatingCashFlow),
    ("net cash flow from operating activities", CanonicalField::OperatingCashFlow),
    ("cash flow from operating activities", CanonicalField::OperatingCashFlow),
    ("beneish m score", CanonicalField::BeneishMScore),
    ("m score", CanonicalField::BeneishMScore),
    ("altman z score", CanonicalField::AltmanZScore),
    ("z score", CanonicalField::AltmanZScore),
];

/// Normalize a label: lowercase, punctuation and `&` dropped, whitespace collapsed.
pub fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .replace('&', " and ")
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result of mapping a statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingOutcome {
    pub record: FinancialRecord,
    /// `(original label, field)` for every item that landed in the record
    pub mapped: Vec<(String, CanonicalField)>,
    pub unmapped: Vec<String>,
    /// Items whose field was already filled by an earlier item
    pub duplicates: Vec<String>,
    /// Items with a blank value; their field stays open for a later item
    pub blank: Vec<String>,
}

pub struct LineItemMapper {
    synonyms: HashMap<String, CanonicalField>,
}

impl LineItemMapper {
    pub fn new() -> Self {
        let synonyms = SYNONYMS
            .iter()
            .map(|(label, field)| (label.to_string(), *field))
            .collect();
        Self { synonyms }
    }

    /// Register an extra label, e.g. a filer-specific caption.
    pub fn with_synonym(mut self, label: &str, field: CanonicalField) -> Self {
        self.synonyms.insert(normalize_label(label), field);
        self
    }

    pub fn lookup(&self, label: &str) -> Option<CanonicalField> {
        self.synonyms.get(&normalize_label(label)).copied()
    }

    pub fn map(&self, items: &[LineItem], scale: Scale) -> Result<MappingOutcome, AnalysisError> {
        let mut outcome = MappingOutcome::default();
        let mut filled: HashSet<CanonicalField> = HashSet::new();

        for item in items {
            let field = match (self.lookup(&item.label), item.period) {
                (Some(CanonicalField::Revenue), Period::Previous) => CanonicalField::PreviousRevenue,
                (Some(field), Period::Current) => field,
                _ => {
                    outcome.unmapped.push(item.label.clone());
                    continue;
                }
            };

            if filled.contains(&field) {
                outcome.duplicates.push(item.label.clone());
                continue;
            }

            let value = item.value.resolve().map_err(|e| {
                AnalysisError::InvalidData(format!("line item {:?}: {}", item.label, e))
            })?;
            let Some(value) = value else {
                outcome.blank.push(item.label.clone());
                continue;
            };
            let value = if field.is_dimensionless() {
                value
            } else {
                value * scale.multiplier()
            };

            field.assign(&mut outcome.record, value);
            filled.insert(field);
            outcome.mapped.push((item.label.clone(), field));
        }

        tracing::debug!(
            mapped = outcome.mapped.len(),
            unmapped = outcome.unmapped.len(),
            duplicates = outcome.duplicates.len(),
            blank = outcome.blank.len(),
            "mapped statement line items"
        );

        Ok(outcome)
    }
}

impl Default for LineItemMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Total Stockholders' Equity "), "total stockholders equity");
        assert_eq!(normalize_label("Reserves & Surplus"), "reserves and surplus");
        assert_eq!(normalize_label("M-Score"), "m score");
        assert_eq!(normalize_label("Net income/(loss)"), "net income loss");
    }

    #[test]
    fn test_maps_a_typical_statement() {
        let items = vec![
            LineItem::new("Total current assets", "1,200"),
            LineItem::new("Total Current Liabilities", 600.0),
            LineItem::new("Inventories", "(0)"),
            LineItem::new("Total stockholders' equity", "2.5k"),
            LineItem::new("Net sales", 9000.0),
            LineItem::previous("Net sales", 8000.0),
            LineItem::new("Net cash provided by operating activities", "$450"),
            LineItem::new("M-Score", "-2.31"),
            LineItem::new("Goodwill", 70.0),
        ];

        let outcome = LineItemMapper::new().map(&items, Scale::Units).unwrap();
        let bs = outcome.record.balance_sheet.as_ref().unwrap();
        assert_eq!(bs.current_assets, Some(1200.0));
        assert_eq!(bs.current_liabilities, Some(600.0));
        assert_eq!(bs.equity, Some(2500.0));
        assert_eq!(outcome.record.income_statement.as_ref().unwrap().revenue, Some(9000.0));
        assert_eq!(outcome.record.previous_year.as_ref().unwrap().revenue, Some(8000.0));
        assert_eq!(outcome.record.cash_flow.as_ref().unwrap().operating_cash_flow, Some(450.0));
        assert_eq!(outcome.record.beneish_m_score, Some(-2.31));
        assert_eq!(outcome.unmapped, vec!["Goodwill".to_string()]);
        assert_eq!(outcome.mapped.len(), 8);
    }

    #[test]
    fn test_scale_skips_forensic_scores() {
        let items = vec![
            LineItem::new("Total assets", 12.5),
            LineItem::new("Altman Z-Score", 2.9),
        ];
        let outcome = LineItemMapper::new().map(&items, Scale::Millions).unwrap();
        let total_assets = outcome.record.balance_sheet.unwrap().total_assets.unwrap();
        assert_relative_eq!(total_assets, 12_500_000.0);
        assert_eq!(outcome.record.altman_z_score, Some(2.9));
    }

    #[test]
    fn test_first_match_wins() {
        let items = vec![
            LineItem::new("Revenue", 100.0),
            LineItem::new("Total revenue", 120.0),
        ];
        let outcome = LineItemMapper::new().map(&items, Scale::Units).unwrap();
        assert_eq!(outcome.record.income_statement.unwrap().revenue, Some(100.0));
        assert_eq!(outcome.duplicates, vec!["Total revenue".to_string()]);
    }

    #[test]
    fn test_previous_period_non_revenue_is_unmapped() {
        let items = vec![LineItem::previous("Total assets", 900.0)];
        let outcome = LineItemMapper::new().map(&items, Scale::Units).unwrap();
        assert!(outcome.record.balance_sheet.is_none());
        assert_eq!(outcome.unmapped, vec!["Total assets".to_string()]);
    }

    #[test]
    fn test_blank_values_map_to_none() {
        let items = vec![
            LineItem::new("Inventory", "n/a"),
            LineItem {
                label: "Equity".to_string(),
                value: RawAmount::Missing,
                period: Period::Current,
            },
        ];
        let outcome = LineItemMapper::new().map(&items, Scale::Thousands).unwrap();
        assert!(outcome.record.balance_sheet.is_none());
        assert!(outcome.mapped.is_empty());
        assert_eq!(outcome.blank, vec!["Inventory".to_string(), "Equity".to_string()]);
    }

    #[test]
    fn test_blank_first_match_leaves_field_open() {
        let items = vec![
            LineItem::new("Revenue", "n/a"),
            LineItem::new("Total revenue", 120.0),
            LineItem::new("Net sales", 130.0),
        ];
        let outcome = LineItemMapper::new().map(&items, Scale::Units).unwrap();
        assert_eq!(outcome.record.income_statement.unwrap().revenue, Some(120.0));
        assert_eq!(outcome.blank, vec!["Revenue".to_string()]);
        assert_eq!(outcome.duplicates, vec!["Net sales".to_string()]);
        assert_eq!(outcome.mapped, vec![("Total revenue".to_string(), CanonicalField::Revenue)]);
    }

    #[test]
    fn test_garbage_value_names_the_label() {
        let items = vec![LineItem::new("Net income", "see note 4")];
        match LineItemMapper::new().map(&items, Scale::Units) {
            Err(AnalysisError::InvalidData(msg)) => assert!(msg.contains("Net income")),
            other => panic!("expected InvalidData, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_synonym() {
        let mapper = LineItemMapper::new().with_synonym("Income from operations", CanonicalField::Ebit);
        assert_eq!(mapper.lookup("INCOME FROM OPERATIONS"), Some(CanonicalField::Ebit));
        assert_eq!(mapper.lookup("Deferred tax"), None);
    }

    #[test]
    fn test_line_items_deserialize() {
        let json = r#"[
            {"label": "Total assets", "value": 1000},
            {"label": "Net sales", "value": "1.2M", "period": "previous"},
            {"label": "Inventory", "value": null}
        ]"#;
        let items: Vec<LineItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items[0].value, RawAmount::Number(1000.0));
        assert_eq!(items[1].period, Period::Previous);
        assert_eq!(items[2].value, RawAmount::Missing);
    }
}
