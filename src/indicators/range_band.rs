//! Волатильностная полоса: скользящее среднее от (rolling max(high) - rolling min(low)).
//!
//! Значение определено, когда набралось `2 * window - 1` баров: `window` баров на
//! первый диапазон и ещё `window - 1` на заполнение окна усреднения.

use super::StreamingIndicator;
use super::rolling::RollingWindow;
use crate::models::Bar;

#[derive(Debug, Clone)]
pub struct RangeBand {
    window: usize,
    highs: RollingWindow,
    lows: RollingWindow,
    ranges: RollingWindow,
}

impl RangeBand {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            highs: RollingWindow::new(window),
            lows: RollingWindow::new(window),
            ranges: RollingWindow::new(window),
        }
    }

    /// Значение полосы на последнем баре среза (O(window), без состояния)
    pub fn value_at(window: usize, bars: &[Bar]) -> Option<f64> {
        let needed = window.max(1).saturating_mul(2) - 1;
        if bars.len() < needed {
            return None;
        }
        let mut band = RangeBand::new(window);
        for bar in &bars[bars.len() - needed..] {
            band.update(bar);
        }
        band.value()
    }
}

impl StreamingIndicator for RangeBand {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        self.highs.push(bar.high);
        self.lows.push(bar.low);
        if let (Some(hi), Some(lo)) = (self.highs.max(), self.lows.min()) {
            self.ranges.push(hi - lo);
        }
        self.value()
    }

    fn value(&self) -> Option<f64> {
        self.ranges.mean()
    }

    fn warmup(&self) -> usize {
        self.window.max(1).saturating_mul(2) - 1
    }

    fn name(&self) -> &str {
        "RangeBand"
    }

    fn reset(&mut self) {
        self.highs.clear();
        self.lows.clear();
        self.ranges.clear();
    }
}
