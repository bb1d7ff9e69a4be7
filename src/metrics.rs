//! # Marketing Metrics Module
//!
//! Pure calculations behind the CPL / ROAS calculator: cost per lead,
//! return on ad spend, return on investment and the lead-to-patient
//! revenue projection, together with the quality bands shown to users.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Share of leads that become patients, in percent
pub const LEAD_CONVERSION_PERCENT: u64 = 30;
/// Average revenue per patient, in hryvnias
pub const AVERAGE_CHECK: u64 = 1500;
/// Number of cells in the ROAS bar
pub const ROAS_BAR_CELLS: usize = 20;
/// Largest lead count the calculator accepts
pub const MAX_LEADS: u64 = 1_000_000;

/// Reasons a calculator input is rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("input is not a number")]
    NotANumber,
    #[error("input must not be negative")]
    Negative,
    #[error("lead count must be greater than zero")]
    ZeroLeads,
    #[error("ad spend must be greater than zero")]
    ZeroSpend,
    #[error("value exceeds the supported maximum of {0}")]
    TooLarge(u64),
}

/// Parse a money amount typed by a user.
///
/// Spaces are ignored and a comma is accepted as decimal separator.
pub fn parse_amount(input: &str) -> Result<f64, MetricError> {
    let normalized: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let value: f64 = normalized.parse().map_err(|_| MetricError::NotANumber)?;
    if !value.is_finite() {
        return Err(MetricError::NotANumber);
    }
    if value < 0.0 {
        return Err(MetricError::Negative);
    }
    Ok(value)
}

/// Parse a whole lead count typed by a user, at most [`MAX_LEADS`]
pub fn parse_lead_count(input: &str) -> Result<u64, MetricError> {
    let normalized: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = normalized.strip_prefix('-').unwrap_or(&normalized);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(MetricError::NotANumber);
    }
    if normalized.starts_with('-') {
        return Err(MetricError::Negative);
    }
    match digits.parse::<u64>() {
        Ok(leads) if leads <= MAX_LEADS => Ok(leads),
        _ => Err(MetricError::TooLarge(MAX_LEADS)),
    }
}

/// Cost per lead: `budget / leads`
pub fn cpl(budget: f64, leads: u64) -> Result<f64, MetricError> {
    if leads == 0 {
        return Err(MetricError::ZeroLeads);
    }
    Ok(budget / leads as f64)
}

/// Return on ad spend in percent: `revenue / spend × 100`
pub fn roas(spend: f64, revenue: f64) -> Result<f64, MetricError> {
    if spend == 0.0 {
        return Err(MetricError::ZeroSpend);
    }
    Ok(revenue / spend * 100.0)
}

/// Return on investment in percent: `(revenue − spend) / spend × 100`
pub fn roi(revenue: f64, spend: f64) -> Result<f64, MetricError> {
    if spend == 0.0 {
        return Err(MetricError::ZeroSpend);
    }
    Ok((revenue - spend) / spend * 100.0)
}

/// Projection of patients and revenue from a lead count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forecast {
    pub patients: u64,
    pub revenue: u64,
}

/// `patients = floor(leads × 0.30)`, `revenue = patients × 1500`.
///
/// Saturates instead of overflowing for counts beyond [`MAX_LEADS`].
pub fn forecast(leads: u64) -> Forecast {
    let patients = leads / 100 * LEAD_CONVERSION_PERCENT + leads % 100 * LEAD_CONVERSION_PERCENT / 100;
    Forecast {
        patients,
        revenue: patients.saturating_mul(AVERAGE_CHECK),
    }
}

/// Quality band of a cost per lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CplBand {
    Excellent,
    Good,
    NeedsOptimization,
}

impl CplBand {
    pub fn from_cpl(cpl: f64) -> Self {
        if cpl < 300.0 {
            CplBand::Excellent
        } else if cpl < 600.0 {
            CplBand::Good
        } else {
            CplBand::NeedsOptimization
        }
    }
}

/// Quality band of a return on ad spend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoasBand {
    Excellent,
    Good,
    NeedsImprovement,
}

impl RoasBand {
    pub fn from_roas(roas: f64) -> Self {
        if roas >= 500.0 {
            RoasBand::Excellent
        } else if roas >= 300.0 {
            RoasBand::Good
        } else {
            RoasBand::NeedsImprovement
        }
    }
}

/// Everything shown on the CPL result screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CplReport {
    pub budget: f64,
    pub leads: u64,
    pub cpl: f64,
    pub band: CplBand,
    pub forecast: Forecast,
    /// ROI of the projected revenue against the budget, absent for a zero budget
    pub forecast_roi: Option<f64>,
}

impl CplReport {
    pub fn compute(budget: f64, leads: u64) -> Result<Self, MetricError> {
        let cpl = cpl(budget, leads)?;
        let forecast = forecast(leads);
        Ok(Self {
            budget,
            leads,
            cpl,
            band: CplBand::from_cpl(cpl),
            forecast,
            forecast_roi: roi(forecast.revenue as f64, budget).ok(),
        })
    }
}

/// Everything shown on the ROAS result screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoasReport {
    pub spend: f64,
    pub revenue: f64,
    pub roas: f64,
    pub profit: f64,
    pub roi: f64,
    pub band: RoasBand,
}

impl RoasReport {
    pub fn compute(spend: f64, revenue: f64) -> Result<Self, MetricError> {
        let roas = roas(spend, revenue)?;
        Ok(Self {
            spend,
            revenue,
            roas,
            profit: revenue - spend,
            roi: roi(revenue, spend)?,
            band: RoasBand::from_roas(roas),
        })
    }

    /// Filled cells of the ROAS bar, one per 50 %, capped at [`ROAS_BAR_CELLS`]
    pub fn bar_cells(&self) -> usize {
        ((self.roas / 50.0).max(0.0) as usize).min(ROAS_BAR_CELLS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_accepts_spaces_and_comma() {
        assert_eq!(parse_amount("5 000"), Ok(5000.0));
        assert_eq!(parse_amount("12,5"), Ok(12.5));
        assert_eq!(parse_amount(" 700 "), Ok(700.0));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount("abc"), Err(MetricError::NotANumber));
        assert_eq!(parse_amount(""), Err(MetricError::NotANumber));
        assert_eq!(parse_amount("inf"), Err(MetricError::NotANumber));
        assert_eq!(parse_amount("NaN"), Err(MetricError::NotANumber));
        assert_eq!(parse_amount("-10"), Err(MetricError::Negative));
    }

    #[test]
    fn test_parse_lead_count() {
        assert_eq!(parse_lead_count("10"), Ok(10));
        assert_eq!(parse_lead_count("1 200"), Ok(1200));
        assert_eq!(parse_lead_count("2.5"), Err(MetricError::NotANumber));
        assert_eq!(parse_lead_count("-3"), Err(MetricError::Negative));
        assert_eq!(parse_lead_count("1 000 000"), Ok(MAX_LEADS));
        assert_eq!(parse_lead_count("1000001"), Err(MetricError::TooLarge(MAX_LEADS)));
    }

    #[test]
    fn test_forecast_floors_patients() {
        assert_eq!(forecast(10), Forecast { patients: 3, revenue: 4500 });
        assert_eq!(forecast(7), Forecast { patients: 2, revenue: 3000 });
        assert_eq!(forecast(3), Forecast { patients: 0, revenue: 0 });
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(CplBand::from_cpl(299.99), CplBand::Excellent);
        assert_eq!(CplBand::from_cpl(300.0), CplBand::Good);
        assert_eq!(CplBand::from_cpl(600.0), CplBand::NeedsOptimization);
        assert_eq!(RoasBand::from_roas(500.0), RoasBand::Excellent);
        assert_eq!(RoasBand::from_roas(300.0), RoasBand::Good);
        assert_eq!(RoasBand::from_roas(299.0), RoasBand::NeedsImprovement);
    }

    #[test]
    fn test_zero_budget_has_no_forecast_roi() {
        let report = CplReport::compute(0.0, 5).unwrap();
        assert_eq!(report.cpl, 0.0);
        assert_eq!(report.forecast_roi, None);
    }
}
