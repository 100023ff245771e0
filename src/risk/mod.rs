//! Risk Management модуль
//! Предторговая проверка: может запретить вход, но никогда не падает и ничего не мутирует

pub mod daily_loss;

pub use daily_loss::{DailyLossGuard, RiskAction, RiskConfig};

use crate::models::EquityState;

/// Пре-трейд гейт.
///
/// Состояние счёта (капитал, дневной убыток) приходит от движка: гейт не ведёт
/// собственных счётчиков, чтобы не разойтись с движком.
pub trait RiskGate {
    /// true = вход запрещён
    fn block_entry(&self, requested_capital: f64, account: &EquityState) -> bool;

    fn name(&self) -> &str {
        "risk_gate"
    }
}

impl<R: RiskGate + ?Sized> RiskGate for Box<R> {
    fn block_entry(&self, requested_capital: f64, account: &EquityState) -> bool {
        (**self).block_entry(requested_capital, account)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Пропускает всё
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl RiskGate for AllowAll {
    fn block_entry(&self, _requested_capital: f64, _account: &EquityState) -> bool {
        false
    }

    fn name(&self) -> &str {
        "allow_all"
    }
}
