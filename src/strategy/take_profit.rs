// Take profit implementation
use crate::models::{Bar, Direction, Position};
use crate::strategy::levels::{LevelCalculator, LevelKind, LevelMethod};

/// Калькулятор цены тейк-профита на момент входа
#[derive(Debug, Clone)]
pub struct TakeProfitCalculator {
    inner: LevelCalculator,
}

impl TakeProfitCalculator {
    pub fn new(method: LevelMethod) -> Self {
        Self {
            inner: LevelCalculator::new(LevelKind::TakeProfit, method),
        }
    }

    pub fn observe(&mut self, bar: &Bar) {
        self.inner.observe(bar);
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    pub fn level(&self, entry_price: f64, direction: Direction) -> f64 {
        self.inner.level(entry_price, direction)
    }

    pub fn compute_take_profit(&self, bars: &[Bar], entry_index: usize, entry_price: f64, direction: Direction) -> f64 {
        self.inner.compute(bars, entry_index, entry_price, direction)
    }
}

pub fn take_profit_hit(position: &Position, current_price: f64) -> bool {
    match position.direction {
        Direction::Long => current_price > position.take_profit_price,
        Direction::Short => current_price < position.take_profit_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_take_profit_hit() {
        let mut pos = Position {
            entry_index: 0,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            entry_price: 100.0,
            quantity: 1.0,
            capital_committed: 100.0,
            direction: Direction::Long,
            signal_label: "test".to_string(),
            stop_loss_price: 95.0,
            take_profit_price: 110.0,
        };
        assert!(!take_profit_hit(&pos, 110.0));
        assert!(take_profit_hit(&pos, 110.5));

        pos.direction = Direction::Short;
        pos.take_profit_price = 90.0;
        assert!(!take_profit_hit(&pos, 95.0));
        assert!(take_profit_hit(&pos, 89.0));
    }

    #[test]
    fn test_calculator_band() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars: Vec<Bar> = (0..5)
            .map(|i| Bar::new(start + Duration::hours(i), 100.0, 101.0, 99.0, 100.0, 1.0))
            .collect();
        let calc = TakeProfitCalculator::new(LevelMethod::VolatilityBand {
            window: 2,
            multiplier: None,
            fallback_pct: 0.03,
        });
        // полоса = 2, дефолтный множитель тейка 1.5
        assert!((calc.compute_take_profit(&bars, 4, 100.0, Direction::Long) - 103.0).abs() < 1e-9);
        assert!((calc.compute_take_profit(&bars, 4, 100.0, Direction::Short) - 97.0).abs() < 1e-9);
    }
}
