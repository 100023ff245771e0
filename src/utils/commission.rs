//! Комиссия и PnL сделки.
//!
//! Комиссия берётся с ноционала по средней цене входа и выхода:
//! `fee = commission_pct * (entry + exit) / 2 * quantity`.
//! От направления она не зависит.

use crate::models::Direction;

pub const DEFAULT_COMMISSION_PCT: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PnlBreakdown {
    pub gross: f64,
    pub fee: f64,
    pub net: f64,
}

pub fn round_trip_fee(commission_pct: f64, entry_price: f64, exit_price: f64, quantity: f64) -> f64 {
    commission_pct * (entry_price + exit_price) / 2.0 * quantity
}

/// Нетто PnL закрытия (или оценки) позиции по цене `exit_price`
pub fn settle(
    direction: Direction,
    entry_price: f64,
    exit_price: f64,
    quantity: f64,
    commission_pct: f64,
) -> PnlBreakdown {
    let gross = direction.gross_return(entry_price, exit_price) * quantity;
    let fee = round_trip_fee(commission_pct, entry_price, exit_price, quantity);
    PnlBreakdown { gross, fee, net: gross - fee }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_on_average_notional() {
        // 0.1% от средней цены 105 * 10
        let fee = round_trip_fee(0.001, 100.0, 110.0, 10.0);
        assert!((fee - 1.05).abs() < 1e-12);
    }

    #[test]
    fn test_fee_symmetry_between_directions() {
        let long = settle(Direction::Long, 100.0, 120.0, 3.0, 0.002);
        let short = settle(Direction::Short, 120.0, 100.0, 3.0, 0.002);
        assert!((long.fee - short.fee).abs() < 1e-12);
        assert!((long.gross - short.gross).abs() < 1e-12);
    }

    #[test]
    fn test_settle_short_loss() {
        let pnl = settle(Direction::Short, 100.0, 110.0, 2.0, 0.001);
        assert!((pnl.gross + 20.0).abs() < 1e-12);
        assert!((pnl.fee - 0.21).abs() < 1e-12);
        assert!((pnl.net + 20.21).abs() < 1e-12);
    }

    #[test]
    fn test_zero_commission() {
        let pnl = settle(Direction::Long, 50.0, 55.0, 4.0, 0.0);
        assert_eq!(pnl.fee, 0.0);
        assert_eq!(pnl.net, pnl.gross);
    }
}
