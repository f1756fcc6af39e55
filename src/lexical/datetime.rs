//! `date`, `time` and `dateTime` lexical forms.
//!
//! Each sub-kind keeps only the components it carries on the wire. The
//! timezone is kept as an offset in minutes; `Z` is offset zero and is written
//! back as `Z`.

use std::fmt::{self, Write};

use crate::{Error, Result};

/// Which of the three date/time kinds a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeKind {
    Date,
    Time,
    DateTime,
}

impl DateTimeKind {
    /// XSD type name.
    pub fn xsd_name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "dateTime",
        }
    }
}

/// Clock time with nanosecond fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanos: u32,
}

/// A decoded date/time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTime {
    /// date: year + month + day + optional timezone
    Date {
        year: i32,
        month: u8,
        day: u8,
        timezone_offset_minutes: Option<i16>,
    },
    /// time: Uhrzeit + optional timezone
    Time {
        time: ClockTime,
        timezone_offset_minutes: Option<i16>,
    },
    /// dateTime: volle Datum/Zeit + optional timezone
    DateTime {
        year: i32,
        month: u8,
        day: u8,
        time: ClockTime,
        timezone_offset_minutes: Option<i16>,
    },
}

impl DateTime {
    #[inline]
    pub fn kind(&self) -> DateTimeKind {
        match self {
            Self::Date { .. } => DateTimeKind::Date,
            Self::Time { .. } => DateTimeKind::Time,
            Self::DateTime { .. } => DateTimeKind::DateTime,
        }
    }

    pub fn timezone_offset_minutes(&self) -> Option<i16> {
        match *self {
            Self::Date { timezone_offset_minutes, .. }
            | Self::Time { timezone_offset_minutes, .. }
            | Self::DateTime { timezone_offset_minutes, .. } => timezone_offset_minutes,
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::with_capacity(32);
        match self {
            Self::Date { year, month, day, .. } => push_date(&mut s, *year, *month, *day),
            Self::Time { time, .. } => push_time(&mut s, time),
            Self::DateTime { year, month, day, time, .. } => {
                push_date(&mut s, *year, *month, *day);
                s.push('T');
                push_time(&mut s, time);
            }
        }
        if let Some(offset) = self.timezone_offset_minutes() {
            push_timezone(&mut s, offset);
        }
        f.write_str(&s)
    }
}

fn push_date(s: &mut String, year: i32, month: u8, day: u8) {
    if year < 0 {
        let _ = write!(s, "-{:04}-{:02}-{:02}", -(year as i64), month, day);
    } else {
        let _ = write!(s, "{:04}-{:02}-{:02}", year, month, day);
    }
}

fn push_time(s: &mut String, time: &ClockTime) {
    let _ = write!(s, "{:02}:{:02}:{:02}", time.hour, time.minute, time.second);
    if time.nanos != 0 {
        let frac = format!("{:09}", time.nanos);
        s.push('.');
        s.push_str(frac.trim_end_matches('0'));
    }
}

fn push_timezone(s: &mut String, offset: i16) {
    if offset == 0 {
        s.push('Z');
    } else {
        let sign = if offset < 0 { '-' } else { '+' };
        let abs = offset.unsigned_abs();
        let _ = write!(s, "{}{:02}:{:02}", sign, abs / 60, abs % 60);
    }
}

/// Parses the lexical form of `kind`.
pub fn parse(value: &str, kind: DateTimeKind) -> Result<DateTime> {
    let err = || Error::format(kind.xsd_name(), value);
    let trimmed = value.trim();
    let (main, tz) = extract_timezone(trimmed).ok_or_else(err)?;
    match kind {
        DateTimeKind::Date => {
            let (year, month, day) = parse_date(main).ok_or_else(err)?;
            Ok(DateTime::Date { year, month, day, timezone_offset_minutes: tz })
        }
        DateTimeKind::Time => {
            let time = parse_time_components(main).ok_or_else(err)?;
            Ok(DateTime::Time { time, timezone_offset_minutes: tz })
        }
        DateTimeKind::DateTime => {
            let (date_part, time_part) = main.split_once('T').ok_or_else(err)?;
            let (year, month, day) = parse_date(date_part).ok_or_else(err)?;
            let time = parse_time_components(time_part).ok_or_else(err)?;
            Ok(DateTime::DateTime { year, month, day, time, timezone_offset_minutes: tz })
        }
    }
}

/// Splits a trailing `Z` or `±HH:MM` off. `None` for a malformed offset.
fn extract_timezone(value: &str) -> Option<(&str, Option<i16>)> {
    if let Some(without_z) = value.strip_suffix('Z') {
        return Some((without_z, Some(0)));
    }
    // Offset nur am Ende, und nicht das Vorzeichen eines negativen Jahres
    if value.len() > 6 {
        let pos = value.len() - 6;
        let tz = &value[pos..];
        let b = tz.as_bytes();
        if (b[0] == b'+' || b[0] == b'-') && b[3] == b':' {
            let hours: i16 = parse_digits(&tz[1..3])?;
            let minutes: i16 = parse_digits(&tz[4..6])?;
            if hours > 14 || minutes > 59 || (hours == 14 && minutes != 0) {
                return None;
            }
            let sign = if b[0] == b'-' { -1 } else { 1 };
            return Some((&value[..pos], Some(sign * (hours * 60 + minutes))));
        }
    }
    Some((value, None))
}

fn parse_digits<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// `[-]YYYY-MM-DD`, at least four year digits.
fn parse_date(value: &str) -> Option<(i32, u8, u8)> {
    let (negative, rest) = match value.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, value),
    };
    let mut parts = rest.splitn(3, '-');
    let year_str = parts.next()?;
    if year_str.len() < 4 {
        return None;
    }
    let year: i32 = parse_digits(year_str)?;
    let month_str = parts.next()?;
    let day_str = parts.next()?;
    if month_str.len() != 2 || day_str.len() != 2 {
        return None;
    }
    let month: u8 = parse_digits(month_str)?;
    let day: u8 = parse_digits(day_str)?;
    let year = if negative { -year } else { year };
    if year == 0 || !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
        return None;
    }
    Some((year, month, day))
}

/// `HH:MM:SS[.f+]`; fractions beyond nanoseconds are truncated.
fn parse_time_components(value: &str) -> Option<ClockTime> {
    let (clock, frac) = match value.split_once('.') {
        Some((c, f)) => (c, Some(f)),
        None => (value, None),
    };
    if clock.len() != 8 {
        return None;
    }
    let b = clock.as_bytes();
    if b[2] != b':' || b[5] != b':' {
        return None;
    }
    let hour: u8 = parse_digits(&clock[0..2])?;
    let minute: u8 = parse_digits(&clock[3..5])?;
    let second: u8 = parse_digits(&clock[6..8])?;
    if hour > 23 || minute > 59 || second > 59 {
        return None;
    }
    let nanos = match frac {
        None => 0,
        Some(f) => {
            if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let mut digits: String = f.chars().take(9).collect();
            while digits.len() < 9 {
                digits.push('0');
            }
            digits.parse().ok()?
        }
    };
    Some(ClockTime { hour, minute, second, nanos })
}

fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
