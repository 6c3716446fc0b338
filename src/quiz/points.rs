use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use thiserror::Error;

const SCALE: i64 = 100;

/// Largest magnitude accepted from authors or snapshots, in whole points.
pub const MAX_POINTS: f64 = 1_000_000_000.0;

/// Score value kept in hundredths of a point.
///
/// Question values are whole or decimal numbers typed by the author and the
/// fairness bonus adds halves, so a fixed-point integer keeps repeated
/// increments exact.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(into = "f64", try_from = "f64")]
pub struct Points(i64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsePointsError {
    #[error("not a number: {0:?}")]
    NotANumber(String),
    #[error("{0:?} is out of range")]
    OutOfRange(String),
    #[error("{0:?} is negative")]
    Negative(String),
}

impl Points {
    pub const ZERO: Points = Points(0);
    pub const ONE: Points = Points(SCALE);
    pub const HALF: Points = Points(SCALE / 2);

    pub const fn whole(n: i64) -> Self {
        Self(n * SCALE)
    }

    pub const fn from_hundredths(h: i64) -> Self {
        Self(h)
    }

    /// `100 * self / max(1, total)`.
    pub fn percent_of(self, total: Points) -> f64 {
        let denominator = total.0.max(SCALE);
        self.0 as f64 * 100.0 / denominator as f64
    }
}

/// Rounds a percentage to `digits` decimals for display.
pub fn round_percent(percent: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (percent * factor).round() / factor
}

impl From<Points> for f64 {
    fn from(points: Points) -> f64 {
        points.0 as f64 / SCALE as f64
    }
}

impl TryFrom<f64> for Points {
    type Error = ParsePointsError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(ParsePointsError::NotANumber(value.to_string()));
        }
        if value.abs() > MAX_POINTS {
            return Err(ParsePointsError::OutOfRange(value.to_string()));
        }
        Ok(Points((value * SCALE as f64).round() as i64))
    }
}

impl Add for Points {
    type Output = Points;

    fn add(self, rhs: Points) -> Points {
        Points(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Points {
    fn add_assign(&mut self, rhs: Points) {
        *self = *self + rhs;
    }
}

impl Sum for Points {
    fn sum<I: Iterator<Item = Points>>(iter: I) -> Points {
        iter.fold(Points::ZERO, Add::add)
    }
}

impl FromStr for Points {
    type Err = ParsePointsError;

    /// Parses an author-typed point value; negative values are refused.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: f64 = trimmed
            .parse()
            .map_err(|_| ParsePointsError::NotANumber(trimmed.to_string()))?;
        if value < 0.0 {
            return Err(ParsePointsError::Negative(trimmed.to_string()));
        }
        Points::try_from(value).map_err(|e| match e {
            ParsePointsError::OutOfRange(_) => ParsePointsError::OutOfRange(trimmed.to_string()),
            _ => ParsePointsError::NotANumber(trimmed.to_string()),
        })
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let (int, frac) = (abs / SCALE, abs % SCALE);
        if frac == 0 {
            return write!(f, "{sign}{int}");
        }
        let frac = format!("{frac:02}");
        write!(f, "{sign}{int}.{}", frac.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integers_and_decimals() {
        assert_eq!("2".parse::<Points>().unwrap(), Points::whole(2));
        assert_eq!(" 1.5 ".parse::<Points>().unwrap(), Points::from_hundredths(150));
        assert!("two".parse::<Points>().is_err());
        assert!("inf".parse::<Points>().is_err());
        assert!("".parse::<Points>().is_err());
    }

    #[test]
    fn refuses_negative_and_huge_values() {
        assert_eq!(
            "-5".parse::<Points>(),
            Err(ParsePointsError::Negative("-5".to_string()))
        );
        assert_eq!(
            "1e300".parse::<Points>(),
            Err(ParsePointsError::OutOfRange("1e300".to_string()))
        );
        assert!(Points::try_from(-1e300).is_err());
        assert_eq!("0".parse::<Points>(), Ok(Points::ZERO));
    }

    #[test]
    fn sums_saturate_instead_of_overflowing() {
        let max = Points::from_hundredths(i64::MAX);
        assert_eq!(max + Points::ONE, max);

        let mut total = max;
        total += Points::HALF;
        assert_eq!(total, max);
        assert_eq!([max, max].into_iter().sum::<Points>(), max);
    }

    #[test]
    fn displays_without_trailing_zeros() {
        assert_eq!(Points::whole(3).to_string(), "3");
        assert_eq!(Points::from_hundredths(250).to_string(), "2.5");
        assert_eq!(Points::from_hundredths(205).to_string(), "2.05");
        assert_eq!(Points::from_hundredths(-50).to_string(), "-0.5");
    }

    #[test]
    fn halves_accumulate_exactly() {
        let total: Points = std::iter::repeat(Points::HALF).take(7).sum();
        assert_eq!(total, Points::from_hundredths(350));
    }

    #[test]
    fn serializes_as_a_plain_number() {
        assert_eq!(serde_json::to_string(&Points::from_hundredths(250)).unwrap(), "2.5");
        assert_eq!(serde_json::from_str::<Points>("0.5").unwrap(), Points::HALF);
    }

    #[test]
    fn percent_guards_against_zero_total() {
        assert_eq!(Points::whole(2).percent_of(Points::whole(2)), 100.0);
        assert_eq!(Points::ZERO.percent_of(Points::ZERO), 0.0);
        assert_eq!(Points::HALF.percent_of(Points::ZERO), 50.0);
        assert_eq!(round_percent(66.666, 1), 66.7);
    }
}
