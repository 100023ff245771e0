use log::debug;
use serde::{Deserialize, Serialize};

use super::RiskGate;
use crate::backtest::error::ConfigError;
use crate::models::EquityState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskAction {
    None,
    AllocationTooLarge,
    DailyLossLimit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Максимальная доля кэша под одну сделку (1.0 = весь капитал)
    #[serde(default)]
    pub max_allocation_pct: Option<f64>,
    /// Лимит убытка за календарный день в долларах, > 0. None = без лимита
    #[serde(default)]
    pub max_daily_loss: Option<f64>,
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(pct) = self.max_allocation_pct {
            if !pct.is_finite() || pct <= 0.0 {
                return Err(ConfigError::InvalidValue { field: "risk.max_allocation_pct", value: pct });
            }
        }
        if let Some(limit) = self.max_daily_loss {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(ConfigError::InvalidValue { field: "risk.max_daily_loss", value: limit });
            }
        }
        Ok(())
    }
}

/// Запрет входа по размеру аллокации и по дневному убытку
#[derive(Debug, Clone)]
pub struct DailyLossGuard {
    pub max_allocation_pct: Option<f64>,
    pub max_daily_loss: Option<f64>,
}

impl DailyLossGuard {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            max_allocation_pct: config.max_allocation_pct,
            max_daily_loss: config.max_daily_loss,
        }
    }

    pub fn check_entry(&self, requested_capital: f64, account: &EquityState) -> RiskAction {
        if let Some(limit) = self.max_daily_loss {
            if account.daily_loss >= limit {
                return RiskAction::DailyLossLimit;
            }
        }
        if let Some(pct) = self.max_allocation_pct {
            if requested_capital > account.cash_equity * pct {
                return RiskAction::AllocationTooLarge;
            }
        }
        RiskAction::None
    }
}

impl RiskGate for DailyLossGuard {
    fn block_entry(&self, requested_capital: f64, account: &EquityState) -> bool {
        match self.check_entry(requested_capital, account) {
            RiskAction::None => false,
            action => {
                debug!("risk veto: {:?} (requested={:.2}, daily_loss={:.2})", action, requested_capital, account.daily_loss);
                true
            }
        }
    }

    fn name(&self) -> &str {
        "daily_loss_guard"
    }
}
