use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backtest::error::ConfigError;
use crate::risk::RiskConfig;
use crate::strategy::LevelMethod;
use crate::utils::commission::DEFAULT_COMMISSION_PCT;

fn default_commission_pct() -> f64 {
    DEFAULT_COMMISSION_PCT
}

/// Неизменяемые параметры прогона
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    #[serde(default = "default_commission_pct")]
    pub commission_pct: f64,
    #[serde(default)]
    pub stop_loss: LevelMethod,
    #[serde(default)]
    pub take_profit: LevelMethod,
    /// Выходить также при пробое уровней, посчитанных на входе
    #[serde(default)]
    pub level_exits: bool,
    #[serde(default)]
    pub risk: RiskConfig,
}

impl BacktestConfig {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            commission_pct: DEFAULT_COMMISSION_PCT,
            stop_loss: LevelMethod::default(),
            take_profit: LevelMethod::default(),
            level_exits: false,
            risk: RiskConfig::default(),
        }
    }

    pub fn with_commission(mut self, commission_pct: f64) -> Self {
        self.commission_pct = commission_pct;
        self
    }

    pub fn with_stop_loss(mut self, method: LevelMethod) -> Self {
        self.stop_loss = method;
        self
    }

    pub fn with_take_profit(mut self, method: LevelMethod) -> Self {
        self.take_profit = method;
        self
    }

    pub fn with_level_exits(mut self, enabled: bool) -> Self {
        self.level_exits = enabled;
        self
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigError::NonPositiveCapital(self.initial_capital));
        }
        if !self.commission_pct.is_finite() || self.commission_pct < 0.0 {
            return Err(ConfigError::NegativeCommission(self.commission_pct));
        }
        self.stop_loss.validate("stop_loss")?;
        self.take_profit.validate("take_profit")?;
        self.risk.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_yaml() {
        let config = BacktestConfig::from_yaml_str("initial_capital: 10000\n").unwrap();
        assert_eq!(config.initial_capital, 10000.0);
        assert_eq!(config.commission_pct, 0.001);
        assert_eq!(config.stop_loss, LevelMethod::default());
        assert!(!config.level_exits);
        assert_eq!(config.risk, RiskConfig::default());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
initial_capital: 5000
commission_pct: 0.0005
level_exits: true
stop_loss:
  method: structure
  levels:
    weekly_low: 95.5
    monthly_low: 90.0
take_profit:
  method: fixed_pct
  pct: 0.08
risk:
  max_daily_loss: 250
"#;
        let config = BacktestConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.commission_pct, 0.0005);
        assert!(config.level_exits);
        assert_eq!(config.take_profit, LevelMethod::FixedPct { pct: 0.08 });
        match &config.stop_loss {
            LevelMethod::Structure { levels, fallback_pct } => {
                assert_eq!(levels.len(), 2);
                assert_eq!(*fallback_pct, 0.03);
            }
            other => panic!("unexpected method {:?}", other),
        }
        assert_eq!(config.risk.max_daily_loss, Some(250.0));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            BacktestConfig::new(0.0).validate(),
            Err(ConfigError::NonPositiveCapital(_))
        ));
        assert!(matches!(
            BacktestConfig::new(100.0).with_commission(-0.1).validate(),
            Err(ConfigError::NegativeCommission(_))
        ));
        assert!(matches!(
            BacktestConfig::from_yaml_str("initial_capital: 100\nstop_loss:\n  method: magic\n"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(BacktestConfig::from_yaml_str("commission_pct: 0.001\n").is_err());
        assert!(matches!(
            BacktestConfig::from_yaml_str(
                "initial_capital: 1000\nstop_loss:\n  method: volatility_band\n  window: 1000000000000\n"
            ),
            Err(ConfigError::InvalidValue { field: "stop_loss", .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = BacktestConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
