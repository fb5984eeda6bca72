//! The forecast horizon requested by callers, validated once at the boundary.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPeriodError {
    #[error("Period '{0}' is not an integer")]
    NotAnInteger(String),

    #[error("Period must be a positive number of hours, got {0}")]
    NotPositive(i128),

    #[error("Period of {hours} hours exceeds the maximum of {max}")]
    TooLarge { hours: i128, max: usize },
}

/// Longest forecast horizon accepted, one year of hourly points.
pub const MAX_PERIOD_HOURS: usize = 24 * 365;

/// Number of hourly points to forecast, between one and [`MAX_PERIOD_HOURS`].
///
/// Conversions exist from the common integer types and from strings, so the
/// pipelines can reject bad input before doing any remote work.
///
/// # Examples
///
/// ```
/// use weathercast::Period;
///
/// let period: Period = " 24 ".parse().unwrap();
/// assert_eq!(period.hours(), 24);
/// assert!("2.5".parse::<Period>().is_err());
/// assert!(Period::try_from(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period(NonZeroUsize);

impl Period {
    pub fn new(hours: usize) -> Result<Self, InvalidPeriodError> {
        if hours > MAX_PERIOD_HOURS {
            return Err(InvalidPeriodError::TooLarge {
                hours: hours as i128,
                max: MAX_PERIOD_HOURS,
            });
        }
        NonZeroUsize::new(hours)
            .map(Period)
            .ok_or(InvalidPeriodError::NotPositive(0))
    }

    pub fn hours(&self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.0)
    }
}

impl FromStr for Period {
    type Err = InvalidPeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: i128 = trimmed
            .parse()
            .map_err(|_| InvalidPeriodError::NotAnInteger(trimmed.to_string()))?;
        Period::try_from(value)
    }
}

impl TryFrom<&str> for Period {
    type Error = InvalidPeriodError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for Period {
    type Error = InvalidPeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<i128> for Period {
    type Error = InvalidPeriodError;

    fn try_from(value: i128) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(InvalidPeriodError::NotPositive(value));
        }
        usize::try_from(value)
            .ok()
            .filter(|hours| *hours <= MAX_PERIOD_HOURS)
            .ok_or(InvalidPeriodError::TooLarge {
                hours: value,
                max: MAX_PERIOD_HOURS,
            })
            .and_then(Period::new)
    }
}

macro_rules! period_from_int {
    ($($int:ty),*) => {
        $(
            impl TryFrom<$int> for Period {
                type Error = InvalidPeriodError;

                fn try_from(value: $int) -> Result<Self, Self::Error> {
                    Period::try_from(value as i128)
                }
            }
        )*
    };
}

period_from_int!(i32, i64, isize, u32, u64, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_positive_integers() {
        assert_eq!(Period::try_from(24).unwrap().hours(), 24);
        assert_eq!(Period::try_from(1_usize).unwrap().hours(), 1);
        assert_eq!("168".parse::<Period>().unwrap().hours(), 168);
        assert_eq!(" 7 ".parse::<Period>().unwrap().hours(), 7);
    }

    #[test]
    fn rejects_zero_and_negative() {
        assert_eq!(Period::try_from(0), Err(InvalidPeriodError::NotPositive(0)));
        assert_eq!(
            Period::try_from(-3_i64),
            Err(InvalidPeriodError::NotPositive(-3))
        );
        assert_eq!("-1".parse::<Period>(), Err(InvalidPeriodError::NotPositive(-1)));
        assert!(Period::new(0).is_err());
    }

    #[test]
    fn rejects_non_integers() {
        for input in ["abc", "2.5", "", "24h", "1e3"] {
            assert!(
                matches!(
                    input.parse::<Period>(),
                    Err(InvalidPeriodError::NotAnInteger(_))
                ),
                "{input:?} should not parse"
            );
        }
    }

    #[test]
    fn rejects_periods_beyond_one_year() {
        assert_eq!(Period::new(MAX_PERIOD_HOURS).unwrap().hours(), 8760);
        assert!(matches!(
            Period::new(MAX_PERIOD_HOURS + 1),
            Err(InvalidPeriodError::TooLarge { hours: 8761, .. })
        ));
        assert!(matches!(
            "18446744073709551615".parse::<Period>(),
            Err(InvalidPeriodError::TooLarge { .. })
        ));
        assert!(matches!(
            Period::try_from(usize::MAX),
            Err(InvalidPeriodError::TooLarge { .. })
        ));
        // Larger than i128 cannot be represented at all.
        assert!(matches!(
            "999999999999999999999999999999999999999999".parse::<Period>(),
            Err(InvalidPeriodError::NotAnInteger(_))
        ));
    }

    #[test]
    fn displays_as_hours() {
        assert_eq!(Period::try_from(12).unwrap().to_string(), "12h");
    }
}
