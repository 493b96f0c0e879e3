//! vCalendar date-time and duration values.
//!
//! Only the basic ISO 8601 forms used by vCalendar 1.0 are handled:
//! `19960401`, `19960401T073000` and `19960401T073000Z` for points in time,
//! and `P[nY][nM][nW][nD][T[nH][nM][nS]]` for periods. There is no time
//! zone arithmetic; a trailing `Z` is only recorded. Calendar ranges,
//! leap years included, are checked by `chrono`.

use alloc::string::ToString;
use core::{fmt, str::FromStr};

use bstr::ByteSlice;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use crate::{
    error::{AccessError, DateTimeError, PeriodError},
    tree::{Document, PropertyId},
};

/// An ISO 8601 duration such as `P1DT12H`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Period {
    /// Whole years.
    pub years: u32,
    /// Whole months.
    pub months: u32,
    /// Whole weeks.
    pub weeks: u32,
    /// Whole days.
    pub days: u32,
    /// Whole hours.
    pub hours: u32,
    /// Whole minutes.
    pub minutes: u32,
    /// Whole seconds.
    pub seconds: u32,
}

impl Period {
    fn has_time(&self) -> bool {
        self.hours != 0 || self.minutes != 0 || self.seconds != 0
    }

    fn is_zero(&self) -> bool {
        !self.has_time() && self.years == 0 && self.months == 0 && self.weeks == 0 && self.days == 0
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    /// Designators may come in any order; `M` means minutes once the `T`
    /// marker has been seen and months before it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix('P').ok_or(PeriodError::MissingPrefix)?;
        if rest.is_empty() {
            return Err(PeriodError::Empty);
        }
        let mut period = Self::default();
        let mut in_time = false;
        let mut value: u32 = 0;
        for byte in rest.bytes() {
            if byte.is_ascii_digit() {
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(u32::from(byte - b'0')))
                    .ok_or(PeriodError::Overflow)?;
                continue;
            }
            match byte {
                b'Y' => period.years = value,
                b'M' if in_time => period.minutes = value,
                b'M' => period.months = value,
                b'W' => period.weeks = value,
                b'D' => period.days = value,
                b'T' if in_time => return Err(PeriodError::RepeatedTimeMarker),
                b'T' => in_time = true,
                b'H' => period.hours = value,
                b'S' => period.seconds = value,
                other => return Err(PeriodError::UnexpectedByte(other)),
            }
            value = 0;
        }
        if rest.as_bytes().last().is_some_and(u8::is_ascii_digit) {
            return Err(PeriodError::MissingDesignator);
        }
        Ok(period)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("P0D");
        }
        f.write_str("P")?;
        for (value, designator) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if value != 0 {
                write!(f, "{value}{designator}")?;
            }
        }
        if self.has_time() {
            f.write_str("T")?;
            for (value, designator) in [(self.hours, 'H'), (self.minutes, 'M'), (self.seconds, 'S')] {
                if value != 0 {
                    write!(f, "{value}{designator}")?;
                }
            }
        }
        Ok(())
    }
}

/// A calendar date with an optional time of day.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateTime {
    /// The calendar date.
    pub date: NaiveDate,
    /// The time of day, if the value has one. A leap second is second 59
    /// with a full extra second of nanoseconds, as chrono holds it.
    pub time: Option<NaiveTime>,
    /// The time is in UTC (`Z` suffix). Only written when `time` is set.
    pub utc: bool,
}

impl DateTime {
    /// A date without a time of day.
    ///
    /// # Errors
    ///
    /// [`DateTimeError::OutOfRange`] for an impossible date.
    pub fn date(year: i32, month: u32, day: u32) -> Result<Self, DateTimeError> {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(DateTimeError::OutOfRange("date"))?;
        Ok(Self {
            date,
            time: None,
            utc: false,
        })
    }

    /// The same date at `hour:minute:second`. A `second` of 60 is a leap
    /// second.
    ///
    /// # Errors
    ///
    /// [`DateTimeError::OutOfRange`] for an impossible time.
    pub fn at(self, hour: u32, minute: u32, second: u32, utc: bool) -> Result<Self, DateTimeError> {
        Ok(Self {
            time: Some(time_of_day(hour, minute, second)?),
            utc,
            ..self
        })
    }
}

fn time_of_day(hour: u32, minute: u32, second: u32) -> Result<NaiveTime, DateTimeError> {
    let time = if second == 60 {
        NaiveTime::from_hms_milli_opt(hour, minute, 59, 1_000)
    } else {
        NaiveTime::from_hms_opt(hour, minute, second)
    };
    time.ok_or(DateTimeError::OutOfRange("time"))
}

fn digits(bytes: &[u8]) -> Result<u32, DateTimeError> {
    bytes.iter().try_fold(0u32, |acc, &b| {
        if b.is_ascii_digit() {
            Ok(acc * 10 + u32::from(b - b'0'))
        } else {
            Err(DateTimeError::InvalidFormat)
        }
    })
}

impl FromStr for DateTime {
    type Err = DateTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let b = s.as_bytes();
        let utc = match b.len() {
            8 => false,
            15 | 16 if b[8] == b'T' => match b.get(15) {
                None => false,
                Some(b'Z') => true,
                Some(_) => return Err(DateTimeError::InvalidFormat),
            },
            _ => return Err(DateTimeError::InvalidFormat),
        };
        let year = i32::try_from(digits(&b[0..4])?).map_err(|_| DateTimeError::InvalidFormat)?;
        let value = Self::date(year, digits(&b[4..6])?, digits(&b[6..8])?)?;
        if b.len() == 8 {
            return Ok(value);
        }
        value.at(digits(&b[9..11])?, digits(&b[11..13])?, digits(&b[13..15])?, utc)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self.date;
        write!(f, "{:04}{:02}{:02}", date.year(), date.month(), date.day())?;
        if let Some(time) = self.time {
            let second = time.second() + u32::from(time.nanosecond() >= 1_000_000_000);
            write!(f, "T{:02}{:02}{second:02}", time.hour(), time.minute())?;
            if self.utc {
                f.write_str("Z")?;
            }
        }
        Ok(())
    }
}

impl Document {
    /// Value string `index` read as a period. `None` when the string is
    /// absent, not text, or not a valid period.
    #[must_use]
    pub fn value_period(&self, id: PropertyId, index: usize) -> Option<Period> {
        self.property(id)?.value_string(index)?.to_str().ok()?.parse().ok()
    }

    /// Value string `index` read as a date or date-time. `None` when the
    /// string is absent, not text, or not a valid date.
    #[must_use]
    pub fn value_date_time(&self, id: PropertyId, index: usize) -> Option<DateTime> {
        self.property(id)?.value_string(index)?.to_str().ok()?.parse().ok()
    }

    /// Store `period` as value string `index`.
    ///
    /// # Errors
    ///
    /// As for [`set_value_string`](Self::set_value_string).
    pub fn set_value_period(
        &mut self,
        id: PropertyId,
        index: usize,
        period: &Period,
    ) -> Result<(), AccessError> {
        self.set_value_string(id, index, period.to_string())
    }

    /// Store `value` as value string `index`.
    ///
    /// # Errors
    ///
    /// As for [`set_value_string`](Self::set_value_string).
    pub fn set_value_date_time(
        &mut self,
        id: PropertyId,
        index: usize,
        value: &DateTime,
    ) -> Result<(), AccessError> {
        self.set_value_string(id, index, value.to_string())
    }
}
