//! Calendar rules - weekday classification, week boundaries and expiry projection.
//!
//! Everything here works at day precision. Callers holding a timestamp should pass
//! its date part (`NaiveDateTime::date`), which is what normalizing to midnight means
//! for comparisons: two instants on the same day always compare as equal dates.

use crate::errors::{Error, Result};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use std::fmt;

/// Returns true if `date` falls on a Saturday or Sunday.
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Why a draw date was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawDateRejection {
    /// Draws only happen on weekdays
    Weekend,
    /// The date is before today and the past-date check is enabled
    InPast,
}

impl fmt::Display for DrawDateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekend => write!(f, "draw date cannot be on a Saturday or Sunday"),
            Self::InPast => write!(f, "draw date cannot be in the past"),
        }
    }
}

/// How strictly draw dates are checked at entry time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawDatePolicy {
    /// Reject weekend dates only
    #[default]
    WeekdayOnly,
    /// Reject weekend dates and dates before today
    WeekdayNotPast,
}

/// Validates a draw date under `policy`. `today` is only consulted by
/// [`DrawDatePolicy::WeekdayNotPast`].
///
/// # Errors
/// Returns `Error::InvalidDrawDate` with the rejection reason.
pub fn validate_draw_date(date: NaiveDate, policy: DrawDatePolicy, today: NaiveDate) -> Result<()> {
    if is_weekend(date) {
        return Err(Error::InvalidDrawDate {
            date,
            reason: DrawDateRejection::Weekend,
        });
    }
    if policy == DrawDatePolicy::WeekdayNotPast && date < today {
        return Err(Error::InvalidDrawDate {
            date,
            reason: DrawDateRejection::InPast,
        });
    }
    Ok(())
}

/// How an award's last valid day is derived from its draw date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Redeemable on the weekend right after the draw: expires on the Sunday ending
    /// the draw's week (a Saturday draw expires the next day, a Sunday draw a week later)
    #[default]
    NextSunday,
    /// Usable on any day within `days` days of the draw
    FixedWindow {
        /// Window length in days
        days: u32,
    },
}

impl ExpiryPolicy {
    /// Projects the expiry date for a draw on `draw_date`. Never earlier than the draw.
    #[must_use]
    pub fn expiry_for(self, draw_date: NaiveDate) -> NaiveDate {
        match self {
            Self::NextSunday => {
                let until_sunday = 7 - u64::from(draw_date.weekday().number_from_monday());
                let offset = if until_sunday == 0 { 7 } else { until_sunday };
                draw_date + Days::new(offset)
            }
            Self::FixedWindow { days } => draw_date + Days::new(u64::from(days)),
        }
    }

    /// Whether awards under this policy can only be spent on Saturday and Sunday.
    #[must_use]
    pub const fn weekend_only(self) -> bool {
        matches!(self, Self::NextSunday)
    }

    /// One-line description of when awards expire and when they can be used.
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Self::NextSunday => "Awards can only be used on Saturday and Sunday. \
                An award expires at the end of the Sunday after its draw."
                .to_string(),
            Self::FixedWindow { days } => format!(
                "Awards can be used on any day. An award expires {days} days after its draw."
            ),
        }
    }
}

/// Projects the expiry date for `draw_date` under `policy`.
#[must_use]
pub fn expiry_from_draw_date(draw_date: NaiveDate, policy: ExpiryPolicy) -> NaiveDate {
    policy.expiry_for(draw_date)
}

/// Monday of the week containing `date`.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

/// A Monday-to-Sunday calendar week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekRange {
    /// Monday of the week
    pub monday: NaiveDate,
    /// Sunday of the week
    pub sunday: NaiveDate,
}

impl WeekRange {
    /// Monday 00:00:00.000
    #[must_use]
    pub fn start(&self) -> NaiveDateTime {
        self.monday.and_time(NaiveTime::MIN)
    }

    /// Sunday 23:59:59.999
    #[must_use]
    pub fn end(&self) -> NaiveDateTime {
        #[allow(clippy::expect_used)] // 23:59:59.999 is a valid time of day
        let last_millisecond =
            NaiveTime::from_hms_milli_opt(23, 59, 59, 999).expect("23:59:59.999 is a valid time");
        self.sunday.and_time(last_millisecond)
    }

    /// Whether `date` falls within this week.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.monday <= date && date <= self.sunday
    }

    /// Short label such as `09/01-09/07`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}-{}",
            self.monday.format("%m/%d"),
            self.sunday.format("%m/%d")
        )
    }
}

/// The Monday-to-Sunday week containing `date`.
#[must_use]
pub fn week_range(date: NaiveDate) -> WeekRange {
    let monday = week_start(date);
    WeekRange {
        monday,
        sunday: monday + Days::new(6),
    }
}
