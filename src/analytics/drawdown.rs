//! Просадка: `capital - running_max(capital)` по каждой точке кривой (значения <= 0)

use serde::{Deserialize, Serialize};

use crate::models::EquityPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownStats {
    pub starting_capital: f64,
    pub final_capital: f64,
    pub total_return: f64,
    pub peak_capital: f64,
    /// Наибольшая просадка в долларах (<= 0)
    pub max_drawdown: f64,
    /// Та же просадка как доля от пика (<= 0)
    pub max_drawdown_pct: f64,
}

pub fn drawdown_series(curve: &[EquityPoint]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    curve
        .iter()
        .map(|p| {
            peak = peak.max(p.capital);
            p.capital - peak
        })
        .collect()
}

impl DrawdownStats {
    /// None для пустой кривой
    pub fn from_curve(curve: &[EquityPoint], starting_capital: f64) -> Option<Self> {
        let last = curve.last()?;
        let mut peak = f64::NEG_INFINITY;
        let mut max_drawdown = 0.0_f64;
        let mut max_drawdown_pct = 0.0_f64;
        for point in curve {
            peak = peak.max(point.capital);
            let dd = point.capital - peak;
            max_drawdown = max_drawdown.min(dd);
            if peak > 0.0 {
                max_drawdown_pct = max_drawdown_pct.min(dd / peak);
            }
        }
        Some(Self {
            starting_capital,
            final_capital: last.capital,
            total_return: last.capital - starting_capital,
            peak_capital: peak,
            max_drawdown,
            max_drawdown_pct,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn curve(capitals: &[f64]) -> Vec<EquityPoint> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        capitals
            .iter()
            .enumerate()
            .map(|(i, &c)| EquityPoint {
                timestamp: start + Duration::hours(i as i64),
                cash_equity: c,
                unrealized_pnl: 0.0,
                capital: c,
                daily_loss: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_series() {
        let dd = drawdown_series(&curve(&[100.0, 110.0, 99.0, 120.0, 90.0]));
        assert_eq!(dd, vec![0.0, 0.0, -11.0, 0.0, -30.0]);
    }

    #[test]
    fn test_stats() {
        let stats = DrawdownStats::from_curve(&curve(&[100.0, 110.0, 99.0, 120.0, 90.0]), 100.0).unwrap();
        assert_eq!(stats.max_drawdown, -30.0);
        assert!((stats.max_drawdown_pct + 0.25).abs() < 1e-12);
        assert_eq!(stats.peak_capital, 120.0);
        assert_eq!(stats.total_return, -10.0);
    }

    #[test]
    fn test_monotonic_curve_has_no_drawdown() {
        let stats = DrawdownStats::from_curve(&curve(&[100.0, 101.0, 102.0]), 100.0).unwrap();
        assert_eq!(stats.max_drawdown, 0.0);
        assert_eq!(stats.max_drawdown_pct, 0.0);
    }

    #[test]
    fn test_empty_curve() {
        assert!(DrawdownStats::from_curve(&[], 100.0).is_none());
        assert!(drawdown_series(&[]).is_empty());
    }
}
