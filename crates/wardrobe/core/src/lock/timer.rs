//! Parsing of padlock timer strings such as `"1h30m"` or `"2d"`.

use chrono::TimeDelta;
use thiserror::Error;

use crate::error::{ErrorSeverity, WardrobeError};

/// Errors raised while validating a padlock timer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("a timer is required for this padlock")]
    Missing,

    #[error("timer string is empty")]
    Empty,

    #[error("unknown time unit '{0}'")]
    UnknownUnit(char),

    #[error("time unit '{0}' has no amount")]
    MissingAmount(char),

    #[error("time unit '{0}' appears out of order or twice")]
    UnitOrder(char),

    #[error("trailing amount without a unit")]
    TrailingAmount,

    #[error("timer is too large")]
    Overflow,

    #[error("timer must be longer than zero")]
    NotPositive,

    #[error("timer exceeds the permitted maximum of {max_secs}s")]
    ExceedsLimit { max_secs: i64 },
}

impl WardrobeError for TimerError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing => "TIMER_MISSING",
            Self::Empty
            | Self::UnknownUnit(_)
            | Self::MissingAmount(_)
            | Self::UnitOrder(_)
            | Self::TrailingAmount
            | Self::Overflow => "TIMER_MALFORMED",
            Self::NotPositive => "TIMER_NOT_POSITIVE",
            Self::ExceedsLimit { .. } => "TIMER_EXCEEDS_LIMIT",
        }
    }
}

/// Units in the order they must appear, with their length in seconds.
const UNITS: [(char, i64); 4] = [('d', 86_400), ('h', 3_600), ('m', 60), ('s', 1)];

/// Parses a duration of the form `[Nd][Nh][Nm][Ns]`.
///
/// Units must appear largest first and at most once. No whitespace or
/// signs are accepted.
pub fn parse_timer(input: &str) -> Result<TimeDelta, TimerError> {
    if input.is_empty() {
        return Err(TimerError::Empty);
    }

    let mut total: i64 = 0;
    let mut amount: Option<i64> = None;
    let mut next_unit = 0usize;

    for c in input.chars() {
        if let Some(digit) = c.to_digit(10) {
            let value = amount
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add(i64::from(digit)))
                .ok_or(TimerError::Overflow)?;
            amount = Some(value);
            continue;
        }

        let unit = c.to_ascii_lowercase();
        let position = UNITS
            .iter()
            .position(|(u, _)| *u == unit)
            .ok_or(TimerError::UnknownUnit(c))?;
        if position < next_unit {
            return Err(TimerError::UnitOrder(c));
        }
        let value = amount.take().ok_or(TimerError::MissingAmount(c))?;
        let secs = value
            .checked_mul(UNITS[position].1)
            .ok_or(TimerError::Overflow)?;
        total = total.checked_add(secs).ok_or(TimerError::Overflow)?;
        next_unit = position + 1;
    }

    if amount.is_some() {
        return Err(TimerError::TrailingAmount);
    }

    TimeDelta::try_seconds(total).ok_or(TimerError::Overflow)
}
