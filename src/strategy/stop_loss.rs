// Stop loss implementation
use crate::models::{Bar, Direction, Position};
use crate::strategy::levels::{LevelCalculator, LevelKind, LevelMethod};

/// Калькулятор цены стоп-лосса на момент входа
#[derive(Debug, Clone)]
pub struct StopLossCalculator {
    inner: LevelCalculator,
}

impl StopLossCalculator {
    pub fn new(method: LevelMethod) -> Self {
        Self {
            inner: LevelCalculator::new(LevelKind::StopLoss, method),
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

    pub fn compute_stop_loss(&self, bars: &[Bar], entry_index: usize, entry_price: f64, direction: Direction) -> f64 {
        self.inner.compute(bars, entry_index, entry_price, direction)
    }
}

/// Цена ушла строго за уровень стопа
pub fn stop_loss_hit(position: &Position, current_price: f64) -> bool {
    match position.direction {
        Direction::Long => current_price < position.stop_loss_price,
        Direction::Short => current_price > position.stop_loss_price,
    }
}
