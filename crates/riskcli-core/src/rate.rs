//! Risk-free rate normalization.
//!
//! Users type rates the way they read them: `0.03`, `3%` or just `3`.
//! Everything past this module works with an annual decimal.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Annual risk-free rate as a decimal in `[-1, +inf)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskFreeRate(f64);

impl RiskFreeRate {
    pub const ZERO: Self = Self(0.0);

    pub fn from_decimal(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "risk_free_rate",
            });
        }
        if value < -1.0 {
            return Err(ValidationError::RateBelowFloor { value });
        }
        Ok(Self(value))
    }

    pub const fn annual(self) -> f64 {
        self.0
    }

    /// Geometric per-period equivalent: `(1 + rf)^(1/periods) - 1`.
    pub fn daily(self, periods_per_year: f64) -> f64 {
        (1.0 + self.0).powf(1.0 / periods_per_year) - 1.0
    }
}

impl Display for RiskFreeRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RiskFreeRate {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        normalize_rate(value)
    }
}

/// Parse a raw rate token into an annual decimal.
///
/// - `"3%"` and `"3"` both mean three percent (magnitude >= 1 is whole percent)
/// - `"0.03"` is already a decimal and is returned unchanged
/// - an empty token is not a number and is rejected
pub fn normalize_rate(raw: &str) -> Result<RiskFreeRate, ValidationError> {
    let token = raw.trim();
    let invalid = || ValidationError::InvalidRate {
        value: token.to_owned(),
    };

    let (number, is_percent) = match token.strip_suffix('%') {
        Some(stripped) => (stripped.trim(), true),
        None => (token, false),
    };

    let parsed = number.parse::<f64>().map_err(|_| invalid())?;
    if !parsed.is_finite() {
        return Err(invalid());
    }

    let decimal = if is_percent || parsed.abs() >= 1.0 {
        parsed / 100.0
    } else {
        parsed
    };

    RiskFreeRate::from_decimal(decimal)
}
