//! Метрики производительности прогона

use log::info;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::analytics::drawdown::DrawdownStats;
use crate::models::{EquityPoint, Trade, UnrealizedSnapshot};

/// Сводка по журналу сделок и (опционально) незакрытой позиции.
///
/// `total_pnl` включает нереализованный PnL, но незакрытая позиция не считается
/// сделкой: `total_trades` и статистика побед/поражений только по закрытым.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub total_trades: usize,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub total_pnl: f64,
    pub average_pnl: f64,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub unrealized: Option<UnrealizedSnapshot>,
    pub drawdown: Option<DrawdownStats>,
}

impl Default for PerformanceSummary {
    fn default() -> Self {
        Self {
            total_trades: 0,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            total_pnl: 0.0,
            average_pnl: 0.0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            profit_factor: 0.0,
            max_consecutive_wins: 0,
            max_consecutive_losses: 0,
            unrealized: None,
            drawdown: None,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl PerformanceSummary {
    pub fn calculate(trades: &[Trade], unrealized: Option<&UnrealizedSnapshot>) -> Self {
        if trades.is_empty() && unrealized.is_none() {
            return Self::default();
        }

        let pnls: Vec<f64> = trades.iter().map(|t| t.pnl_dollar).collect();
        let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p < 0.0).collect();

        let realized_pnl: f64 = pnls.iter().sum();
        let unrealized_pnl = unrealized.map(|u| u.pnl_dollar).unwrap_or(0.0);
        let total_pnl = realized_pnl + unrealized_pnl;
        let average_pnl = if trades.is_empty() { 0.0 } else { total_pnl / trades.len() as f64 };

        let gross_win: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().map(|l| l.abs()).sum();
        let avg_win = if wins.is_empty() { 0.0 } else { gross_win / wins.len() as f64 };
        let avg_loss = if losses.is_empty() { 0.0 } else { -gross_loss / losses.len() as f64 };
        let profit_factor = if gross_loss > 0.0 {
            gross_win / gross_loss
        } else if gross_win > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
        let win_rate = if trades.is_empty() {
            0.0
        } else {
            wins.len() as f64 / trades.len() as f64 * 100.0
        };

        // Серии; нулевой PnL прерывает обе
        let mut max_wins = 0;
        let mut max_losses = 0;
        let mut current_wins = 0;
        let mut current_losses = 0;
        for pnl in &pnls {
            if *pnl > 0.0 {
                current_wins += 1;
                current_losses = 0;
            } else if *pnl < 0.0 {
                current_losses += 1;
                current_wins = 0;
            } else {
                current_wins = 0;
                current_losses = 0;
            }
            max_wins = max_wins.max(current_wins);
            max_losses = max_losses.max(current_losses);
        }

        Self {
            total_trades: trades.len(),
            realized_pnl,
            unrealized_pnl,
            total_pnl,
            average_pnl,
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate,
            avg_win,
            avg_loss,
            profit_factor,
            max_consecutive_wins: max_wins,
            max_consecutive_losses: max_losses,
            unrealized: unrealized.cloned(),
            drawdown: None,
        }
    }

    /// Добавить просадку по кривой капитала
    pub fn with_equity_curve(mut self, curve: &[EquityPoint], starting_capital: f64) -> Self {
        self.drawdown = DrawdownStats::from_curve(curve, starting_capital);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.total_trades == 0 && self.unrealized.is_none()
    }

    /// Плоская сводка ключ -> значение для рендереров отчётов
    pub fn to_key_values(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("Total Trades".to_string(), json!(self.total_trades));
        if self.is_empty() {
            out.insert("No trades to analyze".to_string(), json!(true));
            return out;
        }

        out.insert("Total PnL ($)".to_string(), json!(round2(self.total_pnl)));
        out.insert("Average PnL ($)".to_string(), json!(round2(self.average_pnl)));
        out.insert("Realized PnL ($)".to_string(), json!(round2(self.realized_pnl)));
        out.insert("Winning Trades".to_string(), json!(self.winning_trades));
        out.insert("Losing Trades".to_string(), json!(self.losing_trades));
        out.insert("Win Rate (%)".to_string(), json!(round2(self.win_rate)));
        out.insert("Average Win ($)".to_string(), json!(round2(self.avg_win)));
        out.insert("Average Loss ($)".to_string(), json!(round2(self.avg_loss)));
        let profit_factor = if self.profit_factor.is_finite() {
            json!(round2(self.profit_factor))
        } else {
            json!("inf")
        };
        out.insert("Profit Factor".to_string(), profit_factor);
        out.insert("Max Consecutive Wins".to_string(), json!(self.max_consecutive_wins));
        out.insert("Max Consecutive Losses".to_string(), json!(self.max_consecutive_losses));

        if let Some(dd) = &self.drawdown {
            out.insert("Total Return ($)".to_string(), json!(round2(dd.total_return)));
            out.insert("Max Drawdown ($)".to_string(), json!(round2(dd.max_drawdown)));
            out.insert("Max Drawdown (%)".to_string(), json!(round2(dd.max_drawdown_pct * 100.0)));
        }

        let unrealized = match &self.unrealized {
            Some(u) => serde_json::to_value(u).unwrap_or(Value::Null),
            None => json!("None"),
        };
        out.insert("Unrealized Position".to_string(), unrealized);
        out
    }

    pub fn log_summary(&self) {
        info!("==== Performance Summary ====");
        info!("  Total trades: {}", self.total_trades);
        if self.is_empty() {
            info!("  No trades to analyze");
            return;
        }
        info!("  Wins: {} | Losses: {}", self.winning_trades, self.losing_trades);
        info!("  Win rate: {:.2}%", self.win_rate);
        info!(
            "  Total P&L: ${:.2} (realized ${:.2}, unrealized ${:.2})",
            self.total_pnl, self.realized_pnl, self.unrealized_pnl
        );
        info!("  Average P&L: ${:.2}", self.average_pnl);
        info!("  Avg win: ${:.2} | Avg loss: ${:.2}", self.avg_win, self.avg_loss);
        info!("  Profit factor: {:.2}", self.profit_factor);
        info!(
            "  Max consecutive: {} wins, {} losses",
            self.max_consecutive_wins, self.max_consecutive_losses
        );
        if let Some(dd) = &self.drawdown {
            info!(
                "  Max drawdown: ${:.2} ({:.2}%)",
                dd.max_drawdown,
                dd.max_drawdown_pct * 100.0
            );
        }
        match &self.unrealized {
            Some(u) => info!(
                "  [Unrealized] {} {:.6} @ {:.2} -> {:.2}, pnl ${:.2}",
                u.direction, u.quantity, u.entry_price, u.current_price, u.pnl_dollar
            ),
            None => info!("  Unrealized position: None"),
        }
    }
}
