//! Доменные записи бэктеста: бары, сигналы, позиция, сделки, состояние счёта

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Одна OHLCV свеча
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self { timestamp, open, high, low, close, volume }
    }

    /// Календарный день бара (UTC), по нему считается смена торгового дня
    pub fn trading_day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Парсинг префикса метки сигнала ("long_strong" -> Long)
    pub fn from_label_prefix(label: &str) -> Option<Self> {
        match label.split('_').next() {
            Some("long") => Some(Direction::Long),
            Some("short") => Some(Direction::Short),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }

    /// Пара (entry, current) в системе "выше = лучше".
    /// Для шорта цены меняются местами.
    pub fn oriented(&self, entry_price: f64, current_price: f64) -> (f64, f64) {
        match self {
            Direction::Long => (entry_price, current_price),
            Direction::Short => (current_price, entry_price),
        }
    }

    /// Валовая доходность на единицу количества
    pub fn gross_return(&self, entry_price: f64, exit_price: f64) -> f64 {
        match self {
            Direction::Long => exit_price - entry_price,
            Direction::Short => entry_price - exit_price,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    ExitSignal,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::TakeProfit => "take_profit",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::ExitSignal => "exit_signal",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Сигнал на вход: направление и сила (доля капитала) уже типизированы,
/// метка хранится только для журнала сделок.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySignal {
    pub direction: Direction,
    pub strength: f64,
    pub label: String,
}

impl EntrySignal {
    pub fn new(direction: Direction, strength: f64, label: impl Into<String>) -> Self {
        Self { direction, strength, label: label.into() }
    }

    /// Разбор меток вида `<direction>_<strength>`: strong = 1.0, medium = 0.5, иначе 0.0
    pub fn from_label(label: &str) -> Option<Self> {
        let direction = Direction::from_label_prefix(label)?;
        let strength = match label.rsplit('_').next() {
            Some("strong") => 1.0,
            Some("medium") => 0.5,
            _ => 0.0,
        };
        Some(Self::new(direction, strength, label))
    }
}

/// Открытая позиция. Живёт только внутри движка, закрывается целиком.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub quantity: f64,
    pub capital_committed: f64,
    pub direction: Direction,
    pub signal_label: String,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
}

impl Position {
    /// Количество = выделенный капитал / цена входа, без плеча
    pub fn open(
        entry_index: usize,
        bar: &Bar,
        capital: f64,
        signal: &EntrySignal,
        stop_loss_price: f64,
        take_profit_price: f64,
    ) -> Self {
        Self {
            entry_index,
            entry_time: bar.timestamp,
            entry_price: bar.close,
            quantity: capital / bar.close,
            capital_committed: capital,
            direction: signal.direction,
            signal_label: signal.label.clone(),
            stop_loss_price,
            take_profit_price,
        }
    }
}

/// Закрытая сделка, неизменяемая после записи в журнал
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub capital_committed: f64,
    pub direction: Direction,
    pub pnl_pct: f64,
    pub pnl_dollar: f64,
    pub fee: f64,
    pub signal_label: String,
    pub exit_reason: ExitReason,
}

/// Позиция, оставшаяся открытой на последнем баре, оценённая по его close
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnrealizedSnapshot {
    pub entry_time: DateTime<Utc>,
    pub valuation_time: DateTime<Utc>,
    pub entry_price: f64,
    pub current_price: f64,
    pub quantity: f64,
    pub capital_committed: f64,
    pub direction: Direction,
    pub pnl_pct: f64,
    pub pnl_dollar: f64,
    pub fee: f64,
    pub signal_label: String,
}

/// Денежное состояние счёта, мутируется только движком
#[derive(Debug, Clone, PartialEq)]
pub struct EquityState {
    pub cash_equity: f64,
    pub daily_loss: f64,
    pub current_day: Option<NaiveDate>,
}

impl EquityState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash_equity: initial_capital,
            daily_loss: 0.0,
            current_day: None,
        }
    }

    /// Возвращает true, если начался новый календарный день (дневной убыток обнулён)
    pub fn roll_day(&mut self, day: NaiveDate) -> bool {
        if self.current_day == Some(day) {
            return false;
        }
        self.current_day = Some(day);
        self.daily_loss = 0.0;
        true
    }

    pub fn apply_closed_pnl(&mut self, net_pnl: f64) {
        self.cash_equity += net_pnl;
        self.daily_loss += (-net_pnl).max(0.0);
    }
}

/// Точка кривой капитала, пишется после обработки каждого бара
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub cash_equity: f64,
    pub unrealized_pnl: f64,
    pub capital: f64,
    pub daily_loss: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_signal_from_label() {
        let s = EntrySignal::from_label("long_strong").unwrap();
        assert_eq!(s.direction, Direction::Long);
        assert_eq!(s.strength, 1.0);

        let s = EntrySignal::from_label("short_medium").unwrap();
        assert_eq!(s.direction, Direction::Short);
        assert_eq!(s.strength, 0.5);

        let s = EntrySignal::from_label("long_weak").unwrap();
        assert_eq!(s.strength, 0.0);

        assert!(EntrySignal::from_label("flat_strong").is_none());
    }

    #[test]
    fn test_oriented_prices_swap_for_short() {
        assert_eq!(Direction::Long.oriented(100.0, 110.0), (100.0, 110.0));
        assert_eq!(Direction::Short.oriented(100.0, 110.0), (110.0, 100.0));
    }

    #[test]
    fn test_gross_return_is_directional() {
        assert_eq!(Direction::Long.gross_return(100.0, 105.0), 5.0);
        assert_eq!(Direction::Short.gross_return(100.0, 105.0), -5.0);
    }

    #[test]
    fn test_position_quantity_uses_full_capital() {
        let bar = Bar::new(ts(1, 0), 50.0, 51.0, 49.0, 50.0, 10.0);
        let signal = EntrySignal::new(Direction::Long, 1.0, "long_strong");
        let pos = Position::open(3, &bar, 1000.0, &signal, 45.0, 55.0);
        assert!((pos.quantity - 20.0).abs() < 1e-12);
        assert!((pos.quantity * pos.entry_price - pos.capital_committed).abs() < 1e-9);
    }

    #[test]
    fn test_equity_day_rollover_resets_loss() {
        let mut eq = EquityState::new(1000.0);
        assert!(eq.roll_day(ts(1, 0).date_naive()));
        eq.apply_closed_pnl(-50.0);
        eq.apply_closed_pnl(20.0);
        assert_eq!(eq.daily_loss, 50.0);
        assert!((eq.cash_equity - 970.0).abs() < 1e-9);

        assert!(!eq.roll_day(ts(1, 12).date_naive()));
        assert_eq!(eq.daily_loss, 50.0);

        assert!(eq.roll_day(ts(2, 0).date_naive()));
        assert_eq!(eq.daily_loss, 0.0);
    }

    #[test]
    fn test_exit_reason_serializes_snake_case() {
        let json = serde_json::to_string(&ExitReason::TakeProfit).unwrap();
        assert_eq!(json, "\"take_profit\"");
    }
}
