//! Инкрементальные индикаторы для горячего цикла бэктеста.
//! Каждый бар обрабатывается за O(1) (амортизированно), без пересчёта окна с нуля.

pub mod range_band;
pub mod rolling;
pub mod sma;

pub use range_band::RangeBand;
pub use rolling::RollingWindow;
pub use sma::{BarField, Sma};

use crate::models::Bar;

/// Потоковый индикатор: получает бары строго по порядку
pub trait StreamingIndicator {
    /// Добавить бар, вернуть текущее значение (None пока окно не прогрето)
    fn update(&mut self, bar: &Bar) -> Option<f64>;

    fn value(&self) -> Option<f64>;

    /// Сколько баров нужно до первого определённого значения
    fn warmup(&self) -> usize;

    fn name(&self) -> &str;

    fn reset(&mut self);
}
