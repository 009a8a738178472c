//! Requested time ranges and the date windows they cover
//!
//! Windows always end at the last *full* period before "today": yesterday for
//! daily ranges, last Sunday for the weekly range, the last day of the previous
//! month for monthly ranges.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unsupported time range '{0}' (expected one of 7d, 30d, 90d, 12m, 5y)")]
pub struct InvalidTimeRange(pub String);

/// Sampling granularity of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Week,
    Month,
}

/// Time range of a trends request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeRange {
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "90d")]
    Days90,
    #[default]
    #[serde(rename = "12m")]
    Months12,
    #[serde(rename = "5y")]
    Years5,
}

/// Inclusive date window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Days7 => "7d",
            Self::Days30 => "30d",
            Self::Days90 => "90d",
            Self::Months12 => "12m",
            Self::Years5 => "5y",
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Self::Days7 | Self::Days30 => Granularity::Day,
            Self::Days90 => Granularity::Week,
            Self::Months12 | Self::Years5 => Granularity::Month,
        }
    }

    /// Number of samples a full series for this range has
    pub fn point_count(&self) -> usize {
        match self {
            Self::Days7 => 7,
            Self::Days30 => 30,
            Self::Days90 => 13,
            Self::Months12 => 12,
            Self::Years5 => 60,
        }
    }

    /// Date window covered by this range, relative to `today`
    pub fn window(&self, today: NaiveDate) -> DateWindow {
        let starts = self.period_starts(today);
        let from = starts.first().copied().unwrap_or(today);
        let to = match self.granularity() {
            Granularity::Day => today - Duration::days(1),
            Granularity::Week => last_sunday(today),
            Granularity::Month => first_of_month(today) - Duration::days(1),
        };
        DateWindow { from, to }
    }

    /// Start date of every period in the window, oldest first
    pub fn period_starts(&self, today: NaiveDate) -> Vec<NaiveDate> {
        let count = self.point_count();
        match self.granularity() {
            Granularity::Day => {
                let last = today - Duration::days(1);
                (0..count)
                    .rev()
                    .map(|back| last - Duration::days(back as i64))
                    .collect()
            }
            Granularity::Week => {
                let last_monday = last_sunday(today) - Duration::days(6);
                (0..count)
                    .rev()
                    .map(|back| last_monday - Duration::weeks(back as i64))
                    .collect()
            }
            Granularity::Month => {
                let current = first_of_month(today);
                (1..=count)
                    .rev()
                    .filter_map(|back| current.checked_sub_months(Months::new(back as u32)))
                    .collect()
            }
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = InvalidTimeRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "7d" => Ok(Self::Days7),
            "30d" => Ok(Self::Days30),
            "90d" => Ok(Self::Days90),
            "12m" | "1y" => Ok(Self::Months12),
            "5y" => Ok(Self::Years5),
            _ => Err(InvalidTimeRange(s.to_string())),
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

fn last_sunday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()) + 1)
}
