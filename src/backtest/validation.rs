//! Проверка входных баров до старта цикла: порядок времени и корректность цен

use crate::backtest::error::DataError;
use crate::models::Bar;

/// Бары должны идти строго по возрастанию времени, без дублей.
/// Неотсортированный вход отклоняется, а не сортируется молча.
pub fn validate_bars(bars: &[Bar]) -> Result<(), DataError> {
    for (index, bar) in bars.iter().enumerate() {
        for (field, value) in [("open", bar.open), ("high", bar.high), ("low", bar.low), ("close", bar.close)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DataError::InvalidPrice { index, field, value });
            }
        }
        if bar.high < bar.low {
            return Err(DataError::InvertedRange { index, high: bar.high, low: bar.low });
        }
        if !bar.volume.is_finite() || bar.volume < 0.0 {
            return Err(DataError::InvalidVolume { index, value: bar.volume });
        }
        if index > 0 {
            let previous = bars[index - 1].timestamp;
            if bar.timestamp <= previous {
                return Err(DataError::NonMonotonicTimestamp {
                    index,
                    timestamp: bar.timestamp,
                    previous,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(n: usize) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| Bar::new(start + Duration::hours(i as i64), 10.0, 11.0, 9.0, 10.0, 5.0))
            .collect()
    }

    #[test]
    fn test_valid_and_empty() {
        assert!(validate_bars(&series(5)).is_ok());
        assert!(validate_bars(&[]).is_ok());
    }

    #[test]
    fn test_duplicate_timestamp() {
        let mut bars = series(3);
        bars[2].timestamp = bars[1].timestamp;
        assert!(matches!(
            validate_bars(&bars),
            Err(DataError::NonMonotonicTimestamp { index: 2, .. })
        ));
    }

    #[test]
    fn test_out_of_order() {
        let mut bars = series(3);
        bars.swap(0, 1);
        assert!(matches!(
            validate_bars(&bars),
            Err(DataError::NonMonotonicTimestamp { index: 1, .. })
        ));
    }

    #[test]
    fn test_nan_price() {
        let mut bars = series(3);
        bars[1].close = f64::NAN;
        assert!(matches!(
            validate_bars(&bars),
            Err(DataError::InvalidPrice { index: 1, field: "close", .. })
        ));
    }

    #[test]
    fn test_inverted_range_and_volume() {
        let mut bars = series(2);
        bars[0].high = 8.0;
        assert!(matches!(validate_bars(&bars), Err(DataError::InvertedRange { index: 0, .. })));

        let mut bars = series(2);
        bars[1].volume = -1.0;
        assert!(matches!(validate_bars(&bars), Err(DataError::InvalidVolume { index: 1, .. })));
    }
}
