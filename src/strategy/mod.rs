//! Контракт стратегии и калькуляторы уровней стоп-лосса / тейк-профита

pub mod error;
pub mod levels;
pub mod ma_crossover;
pub mod stop_loss;
pub mod take_profit;

pub use error::StrategyError;
pub use levels::{LevelCalculator, LevelKind, LevelMethod};
pub use ma_crossover::{MaCrossoverConfig, MaCrossoverStrategy};
pub use stop_loss::{StopLossCalculator, stop_loss_hit};
pub use take_profit::{TakeProfitCalculator, take_profit_hit};

use crate::models::{Bar, Direction, EntrySignal};

/// Решающая функция, которую вызывает движок.
///
/// `history` всегда содержит бары до текущего включительно (`history.len() == index + 1`),
/// так что заглянуть в будущее стратегия не может.
///
/// Предикаты `stop_loss` / `take_profit` работают в системе "выше = лучше": для шорта
/// движок передаёт пару цен с переставленными местами.
pub trait Strategy {
    fn name(&self) -> &str;

    fn entry_signal(&mut self, index: usize, history: &[Bar]) -> Result<Option<EntrySignal>, StrategyError>;

    /// Сила сигнала = доля капитала под сделку; 0 означает "не входить"
    fn entry_score(&self, signal: &EntrySignal) -> Result<f64, StrategyError> {
        Ok(signal.strength)
    }

    fn entry_direction(&self, signal: &EntrySignal) -> Result<Option<Direction>, StrategyError> {
        Ok(Some(signal.direction))
    }

    fn stop_loss(&self, entry_price: f64, current_price: f64) -> Result<bool, StrategyError>;

    fn take_profit(&self, entry_price: f64, current_price: f64) -> Result<bool, StrategyError>;

    /// Направленный выход; по умолчанию не срабатывает никогда
    fn exit_signal(&mut self, _index: usize, _history: &[Bar], _entry_price: f64) -> Result<bool, StrategyError> {
        Ok(false)
    }

    /// Сброс внутреннего состояния перед новым прогоном
    fn reset(&mut self) {}
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn entry_signal(&mut self, index: usize, history: &[Bar]) -> Result<Option<EntrySignal>, StrategyError> {
        (**self).entry_signal(index, history)
    }

    fn entry_score(&self, signal: &EntrySignal) -> Result<f64, StrategyError> {
        (**self).entry_score(signal)
    }

    fn entry_direction(&self, signal: &EntrySignal) -> Result<Option<Direction>, StrategyError> {
        (**self).entry_direction(signal)
    }

    fn stop_loss(&self, entry_price: f64, current_price: f64) -> Result<bool, StrategyError> {
        (**self).stop_loss(entry_price, current_price)
    }

    fn take_profit(&self, entry_price: f64, current_price: f64) -> Result<bool, StrategyError> {
        (**self).take_profit(entry_price, current_price)
    }

    fn exit_signal(&mut self, index: usize, history: &[Bar], entry_price: f64) -> Result<bool, StrategyError> {
        (**self).exit_signal(index, history, entry_price)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}
