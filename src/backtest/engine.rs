//! Основной движок бэктестинга: побаровый автомат с одной позицией.
//!
//! Порядок на каждом баре фиксирован:
//! 1. калькуляторы уровней получают бар
//! 2. смена торгового дня (обнуление дневного убытка)
//! 3. выход, если позиция открыта: take-profit, затем stop-loss, затем направленный выход
//! 4. вход, если позиции нет (в том числе только что закрытой на этом же баре)
//! 5. точка кривой капитала
//!
//! Открытая на баре позиция проверяется на выход только со следующего бара.

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::analytics::PerformanceSummary;
use crate::backtest::config::BacktestConfig;
use crate::backtest::error::BacktestError;
use crate::backtest::ledger::TradeLedger;
use crate::backtest::validation::validate_bars;
use crate::models::{Bar, EntrySignal, EquityPoint, EquityState, ExitReason, Position, Trade, UnrealizedSnapshot};
use crate::risk::RiskGate;
use crate::strategy::{
    Strategy, StrategyError, StopLossCalculator, TakeProfitCalculator, stop_loss_hit, take_profit_hit,
};
use crate::utils::commission::settle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Completed,
    Failed,
}

/// Результат успешного прогона
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub trades: Vec<Trade>,
    pub unrealized: Option<UnrealizedSnapshot>,
    pub equity_curve: Vec<EquityPoint>,
    pub final_equity: f64,
    pub summary: PerformanceSummary,
}

pub struct BacktestEngine {
    config: BacktestConfig,
    strategy: Box<dyn Strategy>,
    risk: Box<dyn RiskGate>,
    stop_loss: StopLossCalculator,
    take_profit: TakeProfitCalculator,

    /// Единственная живая позиция
    position: Option<Position>,
    equity: EquityState,
    ledger: TradeLedger,
    equity_curve: Vec<EquityPoint>,
    unrealized: Option<UnrealizedSnapshot>,
    status: RunStatus,
}

impl BacktestEngine {
    /// Конфиг проверяется здесь: с битым конфигом движок не создаётся
    pub fn new(
        config: BacktestConfig,
        strategy: impl Strategy + 'static,
        risk: impl RiskGate + 'static,
    ) -> Result<Self, BacktestError> {
        config.validate()?;
        Ok(Self {
            stop_loss: StopLossCalculator::new(config.stop_loss.clone()),
            take_profit: TakeProfitCalculator::new(config.take_profit.clone()),
            equity: EquityState::new(config.initial_capital),
            strategy: Box::new(strategy),
            risk: Box::new(risk),
            position: None,
            ledger: TradeLedger::new(),
            equity_curve: Vec::new(),
            unrealized: None,
            status: RunStatus::Idle,
            config,
        })
    }

    /// Журнал текущего (или упавшего) прогона
    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    pub fn equity_state(&self) -> &EquityState {
        &self.equity
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn unrealized(&self) -> Option<&UnrealizedSnapshot> {
        self.unrealized.as_ref()
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Прогон по всей серии. Каждый вызов начинает с чистого состояния.
    pub fn run(&mut self, bars: &[Bar]) -> Result<BacktestReport, BacktestError> {
        self.reset();

        if let Err(e) = validate_bars(bars) {
            error!("❌ Rejecting market data: {}", e);
            self.status = RunStatus::Failed;
            return Err(e.into());
        }

        info!(
            "🚀 Backtest start: strategy={}, risk={}, bars={}, capital={:.2}",
            self.strategy.name(),
            self.risk.name(),
            bars.len(),
            self.config.initial_capital
        );

        for index in 0..bars.len() {
            if let Err(source) = self.process_bar(index, bars) {
                error!(
                    "❌ Strategy fault at bar {}: {} ({} trades recorded before abort)",
                    index,
                    source,
                    self.ledger.len()
                );
                self.status = RunStatus::Failed;
                return Err(BacktestError::Strategy { index, source });
            }
        }

        if let Some(last) = bars.last() {
            self.finalize(last);
        }
        self.status = RunStatus::Completed;

        info!(
            "✅ Backtest done: {} trades, cash equity {:.2}, open position: {}",
            self.ledger.len(),
            self.equity.cash_equity,
            if self.unrealized.is_some() { "yes" } else { "no" }
        );

        Ok(self.report())
    }

    fn reset(&mut self) {
        self.strategy.reset();
        self.stop_loss.reset();
        self.take_profit.reset();
        self.position = None;
        self.equity = EquityState::new(self.config.initial_capital);
        self.ledger = TradeLedger::new();
        self.equity_curve.clear();
        self.unrealized = None;
        self.status = RunStatus::Idle;
    }

    fn process_bar(&mut self, index: usize, bars: &[Bar]) -> Result<(), StrategyError> {
        let bar = &bars[index];
        let history = &bars[..=index];

        self.stop_loss.observe(bar);
        self.take_profit.observe(bar);

        let day = bar.trading_day();
        if self.equity.roll_day(day) {
            debug!("[bar {}] new trading day {}, daily loss reset", index, day);
        }

        if let Some(reason) = self.exit_reason(index, bar, history)? {
            self.close_position(bar, reason);
        }

        if self.position.is_none() {
            self.try_enter(index, bar, history)?;
        }

        self.record_equity(bar);
        Ok(())
    }

    /// Все три условия считаются на каждом баре, срабатывает одно по приоритету
    fn exit_reason(&mut self, index: usize, bar: &Bar, history: &[Bar]) -> Result<Option<ExitReason>, StrategyError> {
        let Some(position) = self.position.as_ref() else {
            return Ok(None);
        };
        let price = bar.close;
        let (entry, current) = position.direction.oriented(position.entry_price, price);
        let level_exits = self.config.level_exits;

        let take = self.strategy.take_profit(entry, current)? || (level_exits && take_profit_hit(position, price));
        let stop = self.strategy.stop_loss(entry, current)? || (level_exits && stop_loss_hit(position, price));
        let directional = self.strategy.exit_signal(index, history, position.entry_price)?;

        debug!(
            "[bar {}] exit check @ {:.4}: take={}, stop={}, signal={}",
            index, price, take, stop, directional
        );

        Ok(if take {
            Some(ExitReason::TakeProfit)
        } else if stop {
            Some(ExitReason::StopLoss)
        } else if directional {
            Some(ExitReason::ExitSignal)
        } else {
            None
        })
    }

    fn close_position(&mut self, bar: &Bar, reason: ExitReason) {
        let Some(position) = self.position.take() else {
            return;
        };
        let pnl = settle(
            position.direction,
            position.entry_price,
            bar.close,
            position.quantity,
            self.config.commission_pct,
        );
        self.equity.apply_closed_pnl(pnl.net);

        info!(
            "📤 Exit {} {} @ {:.4} ({}): net {:+.2} (fee {:.2}), equity {:.2}",
            position.direction,
            position.signal_label,
            bar.close,
            reason,
            pnl.net,
            pnl.fee,
            self.equity.cash_equity
        );

        self.ledger.record(Trade {
            entry_time: position.entry_time,
            exit_time: bar.timestamp,
            entry_price: position.entry_price,
            exit_price: bar.close,
            quantity: position.quantity,
            capital_committed: position.capital_committed,
            direction: position.direction,
            pnl_pct: pnl.net / position.capital_committed,
            pnl_dollar: pnl.net,
            fee: pnl.fee,
            signal_label: position.signal_label,
            exit_reason: reason,
        });
    }

    fn try_enter(&mut self, index: usize, bar: &Bar, history: &[Bar]) -> Result<(), StrategyError> {
        let Some(signal) = self.strategy.entry_signal(index, history)? else {
            return Ok(());
        };

        let score = self.strategy.entry_score(&signal)?;
        if !score.is_finite() || score < 0.0 {
            return Err(StrategyError::InvalidSignal(format!(
                "score {} for signal '{}'",
                score, signal.label
            )));
        }
        let Some(direction) = self.strategy.entry_direction(&signal)? else {
            return Ok(());
        };
        if score == 0.0 {
            return Ok(());
        }

        let capital = self.equity.cash_equity * score;
        if capital <= 0.0 {
            warn!("[bar {}] no cash to allocate (equity {:.2}), skipping entry", index, self.equity.cash_equity);
            return Ok(());
        }
        if self.risk.block_entry(capital, &self.equity) {
            debug!("[bar {}] entry {} vetoed by {}", index, signal.label, self.risk.name());
            return Ok(());
        }

        let stop_loss_price = self.stop_loss.level(bar.close, direction);
        let take_profit_price = self.take_profit.level(bar.close, direction);
        let signal = EntrySignal { direction, ..signal };
        let position = Position::open(index, bar, capital, &signal, stop_loss_price, take_profit_price);

        info!(
            "📥 Entry {} {} @ {:.4}: capital {:.2}, qty {:.6}, sl {:.4}, tp {:.4}",
            position.direction,
            position.signal_label,
            position.entry_price,
            position.capital_committed,
            position.quantity,
            position.stop_loss_price,
            position.take_profit_price
        );
        self.position = Some(position);
        Ok(())
    }

    fn record_equity(&mut self, bar: &Bar) {
        let unrealized_pnl = self
            .position
            .as_ref()
            .map(|p| settle(p.direction, p.entry_price, bar.close, p.quantity, self.config.commission_pct).net)
            .unwrap_or(0.0);
        self.equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            cash_equity: self.equity.cash_equity,
            unrealized_pnl,
            capital: self.equity.cash_equity + unrealized_pnl,
            daily_loss: self.equity.daily_loss,
        });
    }

    /// Оставшаяся позиция оценивается по последнему close, в журнал не попадает
    fn finalize(&mut self, last: &Bar) {
        let Some(position) = self.position.as_ref() else {
            return;
        };
        let pnl = settle(
            position.direction,
            position.entry_price,
            last.close,
            position.quantity,
            self.config.commission_pct,
        );
        info!(
            "📌 Position still open at end of data: {} @ {:.4} -> {:.4}, unrealized {:+.2}",
            position.direction, position.entry_price, last.close, pnl.net
        );
        self.unrealized = Some(UnrealizedSnapshot {
            entry_time: position.entry_time,
            valuation_time: last.timestamp,
            entry_price: position.entry_price,
            current_price: last.close,
            quantity: position.quantity,
            capital_committed: position.capital_committed,
            direction: position.direction,
            pnl_pct: pnl.net / position.capital_committed,
            pnl_dollar: pnl.net,
            fee: pnl.fee,
            signal_label: position.signal_label.clone(),
        });
    }

    fn report(&self) -> BacktestReport {
        let summary = PerformanceSummary::calculate(self.ledger.trades(), self.unrealized.as_ref())
            .with_equity_curve(&self.equity_curve, self.config.initial_capital);
        BacktestReport {
            trades: self.ledger.trades().to_vec(),
            unrealized: self.unrealized.clone(),
            equity_curve: self.equity_curve.clone(),
            final_equity: self.equity.cash_equity,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use crate::risk::AllowAll;
    use crate::strategy::LevelMethod;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashMap;

    /// Входы по расписанию, выход по фиксированным процентам
    struct Scripted {
        entries: HashMap<usize, EntrySignal>,
        take_pct: f64,
        stop_pct: f64,
        fail_at: Option<usize>,
    }

    impl Scripted {
        fn new(entries: &[(usize, Direction, f64)]) -> Self {
            Self {
                entries: entries
                    .iter()
                    .map(|&(i, d, s)| (i, EntrySignal::new(d, s, format!("{}_scripted", d))))
                    .collect(),
                take_pct: 0.05,
                stop_pct: 0.05,
                fail_at: None,
            }
        }
    }

    impl Strategy for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn entry_signal(&mut self, index: usize, _history: &[Bar]) -> Result<Option<EntrySignal>, StrategyError> {
            if self.fail_at == Some(index) {
                return Err(StrategyError::InvalidState("scripted failure".to_string()));
            }
            Ok(self.entries.get(&index).cloned())
        }

        fn stop_loss(&self, entry_price: f64, current_price: f64) -> Result<bool, StrategyError> {
            Ok(current_price < entry_price * (1.0 - self.stop_pct))
        }

        fn take_profit(&self, entry_price: f64, current_price: f64) -> Result<bool, StrategyError> {
            Ok(current_price > entry_price * (1.0 + self.take_pct))
        }
    }

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(start + Duration::hours(i as i64), c, c * 1.01, c * 0.99, c, 100.0))
            .collect()
    }

    fn config() -> BacktestConfig {
        BacktestConfig::new(1000.0)
            .with_commission(0.0)
            .with_stop_loss(LevelMethod::FixedPct { pct: 0.05 })
            .with_take_profit(LevelMethod::FixedPct { pct: 0.05 })
    }

    #[test]
    fn test_rejects_invalid_config() {
        let err = BacktestEngine::new(BacktestConfig::new(-5.0), Scripted::new(&[]), AllowAll).err().unwrap();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_status_and_equity_curve() {
        let mut engine = BacktestEngine::new(config(), Scripted::new(&[(1, Direction::Long, 1.0)]), AllowAll).unwrap();
        assert_eq!(engine.status(), RunStatus::Idle);

        let data = bars(&[100.0, 100.0, 101.0, 110.0, 110.0]);
        let report = engine.run(&data).unwrap();
        assert_eq!(engine.status(), RunStatus::Completed);
        assert_eq!(report.equity_curve.len(), data.len());
        assert_eq!(report.trades.len(), 1);
        assert!((report.final_equity - 1100.0).abs() < 1e-9);

        // на баре входа нереализованный PnL нулевой (без комиссии)
        assert_eq!(report.equity_curve[1].unrealized_pnl, 0.0);
        assert!((report.equity_curve[2].unrealized_pnl - 10.0).abs() < 1e-9);
        assert!((report.equity_curve[3].cash_equity - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn test_levels_stored_on_position() {
        let mut engine = BacktestEngine::new(config(), Scripted::new(&[(0, Direction::Short, 0.5)]), AllowAll).unwrap();
        engine.run(&bars(&[200.0, 201.0])).unwrap();
        let position = engine.position().unwrap();
        assert_eq!(position.direction, Direction::Short);
        assert!((position.stop_loss_price - 210.0).abs() < 1e-9);
        assert!((position.take_profit_price - 190.0).abs() < 1e-9);
        assert!((position.capital_committed - 500.0).abs() < 1e-9);
        assert!(engine.unrealized().is_some());
    }

    #[test]
    fn test_level_exits_trigger_without_strategy_predicate() {
        let mut strategy = Scripted::new(&[(0, Direction::Long, 1.0)]);
        strategy.take_pct = 10.0; // предикат стратегии никогда не срабатывает
        let cfg = config().with_take_profit(LevelMethod::FixedPct { pct: 0.02 }).with_level_exits(true);
        let mut engine = BacktestEngine::new(cfg, strategy, AllowAll).unwrap();
        let report = engine.run(&bars(&[100.0, 101.0, 102.5])).unwrap();
        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].exit_reason, ExitReason::TakeProfit);
        assert_eq!(report.trades[0].exit_price, 102.5);
    }

    #[test]
    fn test_strategy_failure_keeps_partial_ledger() {
        let mut strategy = Scripted::new(&[(0, Direction::Long, 1.0)]);
        strategy.fail_at = Some(3);
        let mut engine = BacktestEngine::new(config(), strategy, AllowAll).unwrap();
        let err = engine.run(&bars(&[100.0, 110.0, 110.0, 110.0, 110.0])).unwrap_err();

        assert!(matches!(err, BacktestError::Strategy { index: 3, .. }));
        assert_eq!(err.category(), "strategy");
        assert_eq!(engine.status(), RunStatus::Failed);
        assert_eq!(engine.ledger().len(), 1);
    }

    #[test]
    fn test_negative_score_is_a_strategy_fault() {
        let mut engine = BacktestEngine::new(config(), Scripted::new(&[(2, Direction::Long, -0.5)]), AllowAll).unwrap();
        let err = engine.run(&bars(&[100.0, 100.0, 100.0])).unwrap_err();
        assert!(matches!(
            err,
            BacktestError::Strategy { index: 2, source: StrategyError::InvalidSignal(_) }
        ));
    }

    #[test]
    fn test_zero_score_does_not_enter() {
        let mut engine = BacktestEngine::new(config(), Scripted::new(&[(0, Direction::Long, 0.0)]), AllowAll).unwrap();
        let report = engine.run(&bars(&[100.0, 200.0])).unwrap();
        assert!(report.trades.is_empty());
        assert!(report.unrealized.is_none());
    }

    #[test]
    fn test_rerun_starts_clean() {
        let mut engine = BacktestEngine::new(config(), Scripted::new(&[(0, Direction::Long, 1.0)]), AllowAll).unwrap();
        let data = bars(&[100.0, 110.0, 110.0]);
        let first = engine.run(&data).unwrap();
        let second = engine.run(&data).unwrap();
        assert_eq!(first.trades, second.trades);
        assert_eq!(engine.ledger().len(), 1);
    }

    #[test]
    fn test_bad_data_marks_run_failed() {
        let mut data = bars(&[100.0, 101.0]);
        data[1].close = f64::NAN;
        let mut engine = BacktestEngine::new(config(), Scripted::new(&[]), AllowAll).unwrap();
        let err = engine.run(&data).unwrap_err();
        assert_eq!(err.category(), "market_data");
        assert_eq!(engine.status(), RunStatus::Failed);
    }

    #[test]
    fn test_empty_series_completes() {
        let mut engine = BacktestEngine::new(config(), Scripted::new(&[]), AllowAll).unwrap();
        let report = engine.run(&[]).unwrap();
        assert!(report.trades.is_empty());
        assert!(report.summary.is_empty());
        assert_eq!(report.final_equity, 1000.0);
    }
}
