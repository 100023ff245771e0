// Simple Moving Average indicator implementation
use crate::indicators::StreamingIndicator;
use crate::indicators::rolling::RollingWindow;
use crate::models::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarField {
    Close,
    Volume,
}

impl BarField {
    pub fn pick(&self, bar: &Bar) -> f64 {
        match self {
            BarField::Close => bar.close,
            BarField::Volume => bar.volume,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sma {
    field: BarField,
    window: RollingWindow,
}

impl Sma {
    pub fn new(period: usize, field: BarField) -> Self {
        Sma {
            field,
            window: RollingWindow::new(period),
        }
    }
}

impl StreamingIndicator for Sma {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        self.window.push(self.field.pick(bar));
        self.window.mean()
    }

    fn value(&self) -> Option<f64> {
        self.window.mean()
    }

    fn warmup(&self) -> usize {
        self.window.capacity()
    }

    fn name(&self) -> &str {
        "SMA"
    }

    fn reset(&mut self) {
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_sma_on_volume() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut sma = Sma::new(2, BarField::Volume);
        assert_eq!(sma.update(&Bar::new(t, 1.0, 1.0, 1.0, 1.0, 10.0)), None);
        assert_eq!(sma.update(&Bar::new(t, 1.0, 1.0, 1.0, 1.0, 30.0)), Some(20.0));
        assert_eq!(sma.warmup(), 2);
    }
}
