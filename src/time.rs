use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Duration since the start of the service day, in the timezone of the
/// timetable. This corresponds to the "Time" notion found in gtfs stop_times.txt.
/// Values are comprised between 00:00:00 and 48:00:00 (trips departing before
/// midnight may arrive on the next day).
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecondsSinceDayStart {
    seconds: i64,
}

pub const MAX_SECONDS_SINCE_DAY_START: i64 = 48 * 60 * 60; // 48h

#[derive(Debug, Eq, PartialEq, Clone, Copy, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositiveDuration {
    seconds: i64,
}

impl SecondsSinceDayStart {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub fn max() -> Self {
        Self {
            seconds: MAX_SECONDS_SINCE_DAY_START,
        }
    }

    pub fn from_seconds(seconds: i64) -> Option<Self> {
        if !(0..=MAX_SECONDS_SINCE_DAY_START).contains(&seconds) {
            None
        } else {
            Some(Self { seconds })
        }
    }

    pub fn total_seconds(&self) -> i64 {
        self.seconds
    }

    pub fn duration_since(&self, earlier: &SecondsSinceDayStart) -> Option<PositiveDuration> {
        if self.seconds >= earlier.seconds {
            Some(PositiveDuration {
                seconds: self.seconds - earlier.seconds,
            })
        } else {
            None
        }
    }
}

impl PositiveDuration {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub const fn from_hms(hours: i64, minutes: i64, seconds: i64) -> PositiveDuration {
        PositiveDuration {
            seconds: seconds + 60 * minutes + 60 * 60 * hours,
        }
    }

    pub fn from_seconds(seconds: i64) -> Option<Self> {
        if seconds < 0 {
            None
        } else {
            Some(Self { seconds })
        }
    }

    pub fn total_seconds(&self) -> i64 {
        self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0
    }
}

impl Display for PositiveDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let hours = self.seconds / (60 * 60);
        let minutes_in_secs = self.seconds % (60 * 60);
        let minutes = minutes_in_secs / 60;
        let seconds = minutes_in_secs % 60;
        if hours != 0 {
            write!(f, "{}h{:02}m{:02}s", hours, minutes, seconds)
        } else if minutes != 0 {
            write!(f, "{}m{:02}s", minutes, seconds)
        } else {
            write!(f, "{}s", seconds)
        }
    }
}

impl Display for SecondsSinceDayStart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.seconds / 60 / 60,
            self.seconds / 60 % 60,
            self.seconds % 60
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadTimeString {
    time_string: String,
}

impl Display for BadTimeString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unable to parse `{}` as a time. Expected format is hh:mm:ss",
            self.time_string
        )
    }
}

impl std::error::Error for BadTimeString {}

fn parse_hms(s: &str) -> Result<i64, BadTimeString> {
    let mk_err = || BadTimeString {
        time_string: s.to_string(),
    };
    let mut fields = s.split(':');
    let hours: i64 = fields
        .next()
        .and_then(|val| val.parse().ok())
        .ok_or_else(mk_err)?;
    let minutes: i64 = fields
        .next()
        .and_then(|val| val.parse().ok())
        .ok_or_else(mk_err)?;
    let seconds: i64 = fields
        .next()
        .and_then(|val| val.parse().ok())
        .ok_or_else(mk_err)?;
    if fields.next().is_some() || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return Err(mk_err());
    }
    Ok(seconds + 60 * minutes + 60 * 60 * hours)
}

impl FromStr for SecondsSinceDayStart {
    type Err = BadTimeString;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let seconds = parse_hms(s)?;
        SecondsSinceDayStart::from_seconds(seconds).ok_or_else(|| BadTimeString {
            time_string: s.to_string(),
        })
    }
}

impl FromStr for PositiveDuration {
    type Err = BadTimeString;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let seconds = parse_hms(s)?;
        PositiveDuration::from_seconds(seconds).ok_or_else(|| BadTimeString {
            time_string: s.to_string(),
        })
    }
}

impl std::ops::Add for PositiveDuration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            seconds: self.seconds + rhs.seconds,
        }
    }
}

impl std::ops::Add<PositiveDuration> for SecondsSinceDayStart {
    type Output = Self;

    fn add(self, rhs: PositiveDuration) -> Self::Output {
        Self {
            seconds: self.seconds + rhs.seconds,
        }
    }
}

impl std::ops::Mul<i64> for PositiveDuration {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        PositiveDuration {
            seconds: self.seconds * rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_time_strings() {
        let time = SecondsSinceDayStart::from_str("10:05:30").unwrap();
        assert_eq!(time.total_seconds(), 10 * 3600 + 5 * 60 + 30);

        // gtfs times may go past midnight
        let time = SecondsSinceDayStart::from_str("25:00:00").unwrap();
        assert_eq!(time.total_seconds(), 25 * 3600);

        assert!(SecondsSinceDayStart::from_str("49:00:00").is_err());
        assert!(SecondsSinceDayStart::from_str("10:61:00").is_err());
        assert!(SecondsSinceDayStart::from_str("10h00").is_err());
    }

    #[test]
    fn duration_since_is_ordered() {
        let early = SecondsSinceDayStart::from_seconds(600).unwrap();
        let late = SecondsSinceDayStart::from_seconds(900).unwrap();
        assert_eq!(
            late.duration_since(&early),
            Some(PositiveDuration::from_hms(0, 5, 0))
        );
        assert_eq!(early.duration_since(&late), None);
    }
}
