use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{CoreError, Interval, Period, Symbol, UtcDateTime, ValidationError};

const SECONDS_PER_DAY: i64 = 86_400;

/// One adjusted price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ts: UtcDateTime,
    /// Adjusted close.
    pub price: f64,
    pub volume: Option<u64>,
}

impl PricePoint {
    pub fn new(ts: UtcDateTime, price: f64, volume: Option<u64>) -> Result<Self, ValidationError> {
        if !price.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "price" });
        }
        if price <= 0.0 {
            return Err(ValidationError::NonPositiveValue { field: "price" });
        }

        Ok(Self { ts, price, volume })
    }
}

/// Ordered price history for one (symbol, period, interval) request.
///
/// Timestamps are strictly increasing; construction rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: Symbol,
    pub period: Period,
    pub interval: Interval,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(
        symbol: Symbol,
        period: Period,
        interval: Interval,
        points: Vec<PricePoint>,
    ) -> Result<Self, ValidationError> {
        if let Some(index) = points
            .windows(2)
            .position(|pair| pair[1].ts <= pair[0].ts)
        {
            return Err(ValidationError::UnorderedTimestamps { index: index + 1 });
        }

        Ok(Self {
            symbol,
            period,
            interval,
            points,
        })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|point| point.price)
    }

    pub fn last_price(&self) -> Option<f64> {
        self.points.last().map(|point| point.price)
    }

    /// Simple returns between consecutive points.
    pub fn returns(&self) -> Result<ReturnSeries, CoreError> {
        if self.points.len() < 2 {
            return Err(CoreError::InsufficientData {
                required: 2,
                actual: self.points.len(),
            });
        }

        let (timestamps, values) = self
            .points
            .windows(2)
            .map(|pair| (pair[1].ts, pair[1].price / pair[0].price - 1.0))
            .unzip();

        Ok(ReturnSeries { timestamps, values })
    }

    pub fn summary(&self) -> SeriesSummary {
        SeriesSummary {
            symbol: self.symbol.clone(),
            period: self.period,
            interval: self.interval,
            points: self.points.len(),
            first: self.points.first().map(|point| point.ts),
            last: self.points.last().map(|point| point.ts),
            last_price: self.last_price(),
        }
    }
}

/// Lightweight description of a fetched series for report headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub symbol: Symbol,
    pub period: Period,
    pub interval: Interval,
    pub points: usize,
    pub first: Option<UtcDateTime>,
    pub last: Option<UtcDateTime>,
    pub last_price: Option<f64>,
}

/// Simple per-period returns, each stamped with the closing observation's time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    timestamps: Vec<UtcDateTime>,
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Build a series from bare values, stamping them one day apart from the
    /// Unix epoch. Two series of equal length built this way align 1:1.
    pub fn from_values(values: Vec<f64>) -> Result<Self, ValidationError> {
        if values.iter().any(|value| !value.is_finite()) {
            return Err(ValidationError::NonFiniteValue { field: "return" });
        }

        let timestamps = (0..values.len())
            .map(|index| UtcDateTime::from_unix_timestamp(index as i64 * SECONDS_PER_DAY))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { timestamps, values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn timestamps(&self) -> &[UtcDateTime] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Restrict both series to the observations they share.
    ///
    /// Daily-or-coarser series are matched on calendar date, because an index
    /// and a stock from the same provider may be stamped at different times of
    /// day. Series with several points per date fall back to exact timestamps.
    pub fn align(&self, other: &Self) -> (Self, Self) {
        let by_date = self.has_unique_dates() && other.has_unique_dates();
        let key = |ts: UtcDateTime| {
            if by_date {
                ts.unix_timestamp().div_euclid(SECONDS_PER_DAY)
            } else {
                ts.unix_timestamp()
            }
        };

        let other_index: HashMap<i64, usize> = other
            .timestamps
            .iter()
            .enumerate()
            .map(|(index, ts)| (key(*ts), index))
            .collect();

        let mut left = Self::empty();
        let mut right = Self::empty();
        for (index, ts) in self.timestamps.iter().enumerate() {
            if let Some(&other_at) = other_index.get(&key(*ts)) {
                left.timestamps.push(*ts);
                left.values.push(self.values[index]);
                right.timestamps.push(other.timestamps[other_at]);
                right.values.push(other.values[other_at]);
            }
        }

        (left, right)
    }

    fn empty() -> Self {
        Self {
            timestamps: Vec::new(),
            values: Vec::new(),
        }
    }

    fn has_unique_dates(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.timestamps.len());
        self.timestamps
            .iter()
            .all(|ts| seen.insert(ts.unix_timestamp().div_euclid(SECONDS_PER_DAY)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(seconds: i64) -> UtcDateTime {
        UtcDateTime::from_unix_timestamp(seconds).expect("valid timestamp")
    }

    fn series(prices: &[f64]) -> PriceSeries {
        let points = prices
            .iter()
            .enumerate()
            .map(|(index, price)| {
                PricePoint::new(ts(index as i64 * SECONDS_PER_DAY), *price, None)
                    .expect("valid point")
            })
            .collect();
        PriceSeries::new(
            Symbol::parse("TEST").expect("valid"),
            Period::OneYear,
            Interval::OneDay,
            points,
        )
        .expect("valid series")
    }

    #[test]
    fn derives_simple_returns() {
        let returns = series(&[100.0, 110.0, 99.0]).returns().expect("two returns");
        assert_eq!(returns.len(), 2);
        assert!((returns.values()[0] - 0.10).abs() < 1e-12);
        assert!((returns.values()[1] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn single_point_cannot_produce_returns() {
        let err = series(&[100.0]).returns().expect_err("must fail");
        assert!(matches!(
            err,
            CoreError::InsufficientData {
                required: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let point = PricePoint::new(ts(0), 1.0, None).expect("valid");
        let err = PriceSeries::new(
            Symbol::parse("TEST").expect("valid"),
            Period::OneYear,
            Interval::OneDay,
            vec![point, point],
        )
        .expect_err("must fail");
        assert_eq!(err, ValidationError::UnorderedTimestamps { index: 1 });
    }

    #[test]
    fn rejects_non_positive_price() {
        let err = PricePoint::new(ts(0), 0.0, None).expect_err("must fail");
        assert_eq!(err, ValidationError::NonPositiveValue { field: "price" });
    }

    #[test]
    fn aligns_on_calendar_date_when_times_of_day_differ() {
        let asset = ReturnSeries {
            timestamps: vec![
                ts(14 * 3_600),
                ts(SECONDS_PER_DAY + 14 * 3_600),
                ts(2 * SECONDS_PER_DAY + 14 * 3_600),
            ],
            values: vec![0.01, 0.02, 0.03],
        };
        let bench = ReturnSeries {
            timestamps: vec![
                ts(SECONDS_PER_DAY + 21 * 3_600),
                ts(2 * SECONDS_PER_DAY + 21 * 3_600),
            ],
            values: vec![0.5, 0.6],
        };

        let (left, right) = asset.align(&bench);
        assert_eq!(left.values(), &[0.02, 0.03]);
        assert_eq!(right.values(), &[0.5, 0.6]);
    }
}
