//! Расчёт абсолютного уровня стоп-лосса / тейк-профита в момент входа.
//!
//! Методы:
//! - `volatility_band`: смещение от цены входа на `multiplier * RangeBand(window)`
//! - `fixed_pct`: смещение на фиксированный процент
//! - `structure`: ближайший внешний уровень поддержки/сопротивления с нужной стороны
//!
//! Уровень считается один раз на входе и дальше не пересчитывается.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::backtest::error::ConfigError;
use crate::indicators::{RangeBand, StreamingIndicator};
use crate::models::{Bar, Direction};

/// Верхняя граница окна полосы, больше 10 лет дневных свечей
pub const MAX_WINDOW: usize = 5_000;

fn default_window() -> usize {
    14
}

fn default_fixed_pct() -> f64 {
    0.1
}

fn default_fallback_pct() -> f64 {
    0.03
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum LevelMethod {
    VolatilityBand {
        #[serde(default = "default_window")]
        window: usize,
        /// None = дефолт по виду уровня (стоп 0.5, тейк 1.5)
        #[serde(default)]
        multiplier: Option<f64>,
        /// Процент на случай, если истории для полосы не хватает
        #[serde(default = "default_fallback_pct")]
        fallback_pct: f64,
    },
    FixedPct {
        #[serde(default = "default_fixed_pct")]
        pct: f64,
    },
    Structure {
        #[serde(default)]
        levels: BTreeMap<String, f64>,
        #[serde(default = "default_fallback_pct")]
        fallback_pct: f64,
    },
}

impl Default for LevelMethod {
    fn default() -> Self {
        LevelMethod::VolatilityBand {
            window: default_window(),
            multiplier: None,
            fallback_pct: default_fallback_pct(),
        }
    }
}

impl LevelMethod {
    pub fn name(&self) -> &'static str {
        match self {
            LevelMethod::VolatilityBand { .. } => "volatility_band",
            LevelMethod::FixedPct { .. } => "fixed_pct",
            LevelMethod::Structure { .. } => "structure",
        }
    }

    pub fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        let check_pct = |value: f64| {
            if value.is_finite() && (0.0..1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue { field, value })
            }
        };
        match self {
            LevelMethod::VolatilityBand { window, multiplier, fallback_pct } => {
                if *window == 0 {
                    return Err(ConfigError::ZeroWindow { field });
                }
                if *window > MAX_WINDOW {
                    return Err(ConfigError::InvalidValue { field, value: *window as f64 });
                }
                if let Some(m) = multiplier {
                    if !m.is_finite() || *m < 0.0 {
                        return Err(ConfigError::InvalidValue { field, value: *m });
                    }
                }
                check_pct(*fallback_pct)
            }
            LevelMethod::FixedPct { pct } => check_pct(*pct),
            LevelMethod::Structure { levels, fallback_pct } => {
                for value in levels.values() {
                    if !value.is_finite() || *value <= 0.0 {
                        return Err(ConfigError::InvalidValue { field, value: *value });
                    }
                }
                check_pct(*fallback_pct)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    StopLoss,
    TakeProfit,
}

impl LevelKind {
    /// Знак смещения от цены входа: стоп в сторону убытка, тейк в сторону прибыли
    pub fn sign(&self, direction: Direction) -> f64 {
        match (self, direction) {
            (LevelKind::StopLoss, Direction::Long) | (LevelKind::TakeProfit, Direction::Short) => -1.0,
            (LevelKind::StopLoss, Direction::Short) | (LevelKind::TakeProfit, Direction::Long) => 1.0,
        }
    }

    pub fn default_multiplier(&self) -> f64 {
        match self {
            LevelKind::StopLoss => 0.5,
            LevelKind::TakeProfit => 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelKind::StopLoss => "stop_loss",
            LevelKind::TakeProfit => "take_profit",
        }
    }
}

/// Калькулятор уровня. Для `volatility_band` держит инкрементальную полосу,
/// которую движок кормит каждым баром через `observe`.
#[derive(Debug, Clone)]
pub struct LevelCalculator {
    kind: LevelKind,
    method: LevelMethod,
    band: Option<RangeBand>,
}

impl LevelCalculator {
    pub fn new(kind: LevelKind, method: LevelMethod) -> Self {
        let band = match &method {
            LevelMethod::VolatilityBand { window, .. } => Some(RangeBand::new(*window)),
            _ => None,
        };
        Self { kind, method, band }
    }

    pub fn observe(&mut self, bar: &Bar) {
        if let Some(band) = self.band.as_mut() {
            band.update(bar);
        }
    }

    pub fn reset(&mut self) {
        if let Some(band) = self.band.as_mut() {
            band.reset();
        }
    }

    /// Уровень по состоянию полосы на последнем наблюдённом баре
    pub fn level(&self, entry_price: f64, direction: Direction) -> f64 {
        let band_value = self.band.as_ref().and_then(|b| b.value());
        self.resolve(band_value, entry_price, direction)
    }

    /// Уровень по истории `bars[..=entry_index]`, без внутреннего состояния
    pub fn compute(&self, bars: &[Bar], entry_index: usize, entry_price: f64, direction: Direction) -> f64 {
        let band_value = match &self.method {
            LevelMethod::VolatilityBand { window, .. } => {
                let end = entry_index.saturating_add(1).min(bars.len());
                RangeBand::value_at(*window, &bars[..end])
            }
            _ => None,
        };
        self.resolve(band_value, entry_price, direction)
    }

    fn resolve(&self, band_value: Option<f64>, entry_price: f64, direction: Direction) -> f64 {
        let sign = self.kind.sign(direction);
        match &self.method {
            LevelMethod::VolatilityBand { multiplier, fallback_pct, .. } => match band_value {
                Some(band) => {
                    let mult = multiplier.unwrap_or_else(|| self.kind.default_multiplier());
                    entry_price + sign * mult * band
                }
                None => {
                    debug!(
                        "{}: not enough history for volatility band, using {:.2}% offset",
                        self.kind.as_str(),
                        fallback_pct * 100.0
                    );
                    entry_price * (1.0 + sign * fallback_pct)
                }
            },
            LevelMethod::FixedPct { pct } => entry_price * (1.0 + sign * pct),
            LevelMethod::Structure { levels, fallback_pct } => {
                let nearest = if sign > 0.0 {
                    levels.values().copied().filter(|&l| l > entry_price).reduce(f64::min)
                } else {
                    levels.values().copied().filter(|&l| l < entry_price).reduce(f64::max)
                };
                nearest.unwrap_or_else(|| entry_price * (1.0 + sign * fallback_pct))
            }
        }
    }
}
