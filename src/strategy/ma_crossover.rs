//! MA Crossover: вход в лонг на пересечении короткой средней снизу вверх через длинную.
//!
//! - объём на баре пересечения выше `volume_multiplier * SMA(volume)` -> `long_strong`
//! - пересечение без всплеска объёма -> `long_medium`
//! - стоп/тейк: фиксированные проценты от цены входа
//!
//! Пока только лонг.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::backtest::error::ConfigError;
use crate::indicators::{BarField, Sma, StreamingIndicator};
use crate::models::{Bar, Direction, EntrySignal};
use crate::strategy::levels::MAX_WINDOW;
use crate::strategy::{Strategy, StrategyError};

fn default_short_window() -> usize {
    5
}

fn default_long_window() -> usize {
    20
}

fn default_volume_window() -> usize {
    10
}

fn default_volume_multiplier() -> f64 {
    1.5
}

fn default_stop_loss_pct() -> f64 {
    0.02
}

fn default_take_profit_pct() -> f64 {
    0.05
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaCrossoverConfig {
    #[serde(default = "default_short_window")]
    pub short_window: usize,
    #[serde(default = "default_long_window")]
    pub long_window: usize,
    #[serde(default = "default_volume_window")]
    pub volume_window: usize,
    #[serde(default = "default_volume_multiplier")]
    pub volume_multiplier: f64,
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: f64,
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: f64,
}

impl Default for MaCrossoverConfig {
    fn default() -> Self {
        Self {
            short_window: default_short_window(),
            long_window: default_long_window(),
            volume_window: default_volume_window(),
            volume_multiplier: default_volume_multiplier(),
            stop_loss_pct: default_stop_loss_pct(),
            take_profit_pct: default_take_profit_pct(),
        }
    }
}

impl MaCrossoverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, window) in [
            ("short_window", self.short_window),
            ("long_window", self.long_window),
            ("volume_window", self.volume_window),
        ] {
            if window == 0 {
                return Err(ConfigError::ZeroWindow { field });
            }
            if window > MAX_WINDOW {
                return Err(ConfigError::InvalidValue { field, value: window as f64 });
            }
        }
        if self.short_window >= self.long_window {
            return Err(ConfigError::Invalid(format!(
                "short_window ({}) must be below long_window ({})",
                self.short_window, self.long_window
            )));
        }
        for (field, value) in [
            ("volume_multiplier", self.volume_multiplier),
            ("stop_loss_pct", self.stop_loss_pct),
            ("take_profit_pct", self.take_profit_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        Ok(())
    }
}

pub struct MaCrossoverStrategy {
    config: MaCrossoverConfig,
    short_ma: Sma,
    long_ma: Sma,
    volume_ma: Sma,
    // значения индикаторов по индексу бара, дополняются по мере роста истории
    short_series: Vec<Option<f64>>,
    long_series: Vec<Option<f64>>,
    volume_series: Vec<Option<f64>>,
}

impl MaCrossoverStrategy {
    pub fn new(config: MaCrossoverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            short_ma: Sma::new(config.short_window, BarField::Close),
            long_ma: Sma::new(config.long_window, BarField::Close),
            volume_ma: Sma::new(config.volume_window, BarField::Volume),
            short_series: Vec::new(),
            long_series: Vec::new(),
            volume_series: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &MaCrossoverConfig {
        &self.config
    }

    fn sync(&mut self, history: &[Bar]) {
        if history.len() < self.short_series.len() {
            self.reset();
        }
        for bar in &history[self.short_series.len()..] {
            self.short_series.push(self.short_ma.update(bar));
            self.long_series.push(self.long_ma.update(bar));
            self.volume_series.push(self.volume_ma.update(bar));
        }
    }
}

impl Strategy for MaCrossoverStrategy {
    fn name(&self) -> &str {
        "MA_Crossover"
    }

    fn entry_signal(&mut self, index: usize, history: &[Bar]) -> Result<Option<EntrySignal>, StrategyError> {
        if history.len() != index + 1 {
            return Err(StrategyError::InvalidState(format!(
                "history has {} bars for index {}",
                history.len(),
                index
            )));
        }
        self.sync(history);

        if index < self.config.long_window {
            return Ok(None);
        }

        let (Some(short_prev), Some(long_prev), Some(short_now), Some(long_now)) = (
            self.short_series[index - 1],
            self.long_series[index - 1],
            self.short_series[index],
            self.long_series[index],
        ) else {
            return Ok(None);
        };

        debug!(
            "[index={}] short_ma={:.2}, long_ma={:.2}, vol={:.2}, mean_vol={:?}",
            index, short_now, long_now, history[index].volume, self.volume_series[index]
        );

        if !(short_prev < long_prev && short_now > long_now) {
            return Ok(None);
        }

        let volume = history[index].volume;
        let volume_spike = self.volume_series[index]
            .is_some_and(|mean| volume > mean * self.config.volume_multiplier);

        let (label, strength) = if volume_spike { ("long_strong", 1.0) } else { ("long_medium", 0.5) };
        info!("[Signal] crossover at index {} -> {}", index, label);
        Ok(Some(EntrySignal::new(Direction::Long, strength, label)))
    }

    fn stop_loss(&self, entry_price: f64, current_price: f64) -> Result<bool, StrategyError> {
        let triggered = current_price < entry_price * (1.0 - self.config.stop_loss_pct);
        if triggered {
            info!("[Stop Loss] triggered at price {:.2} (entry={:.2})", current_price, entry_price);
        }
        Ok(triggered)
    }

    fn take_profit(&self, entry_price: f64, current_price: f64) -> Result<bool, StrategyError> {
        let triggered = current_price > entry_price * (1.0 + self.config.take_profit_pct);
        if triggered {
            info!("[Take Profit] triggered at price {:.2} (entry={:.2})", current_price, entry_price);
        }
        Ok(triggered)
    }

    fn reset(&mut self) {
        self.short_ma.reset();
        self.long_ma.reset();
        self.volume_ma.reset();
        self.short_series.clear();
        self.long_series.clear();
        self.volume_series.clear();
    }
}
