use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

pub const MILLIS_PER_DAY: f64 = 86_400_000.0;
/// A working day runs up to 23:59.
pub const FULL_WORKING_DAY_MINUTES: f64 = 1_439.0;

/// UTC day number of a timestamp.
#[must_use]
pub fn day_number(timestamp: f64) -> i64 {
    (timestamp / MILLIS_PER_DAY).floor() as i64
}

/// Working time per day shared by every resource of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calendar {
    /// Inclusive weekday range without working time, `0` being Monday.
    /// `None` makes every day a working day.
    pub weekend_range: Option<(u8, u8)>,
    /// UTC day numbers without working time.
    pub holidays: BTreeSet<i64>,
    /// Working minutes of a regular working day.
    pub working_minutes: f64,
}

impl Default for Calendar {
    fn default() -> Self {
        Self {
            weekend_range: Some((5, 6)),
            holidays: BTreeSet::new(),
            working_minutes: FULL_WORKING_DAY_MINUTES,
        }
    }
}

impl Calendar {
    /// Reorders and clamps the bounds into `0..=6`.
    #[must_use]
    pub fn with_weekend_range(mut self, range: Option<(u8, u8)>) -> Self {
        self.weekend_range = range.map(|(start, end)| {
            let (start, end) = (start.min(6), end.min(6));
            (start.min(end), start.max(end))
        });
        self
    }

    #[must_use]
    pub fn with_holiday(mut self, date: f64) -> Self {
        self.holidays.insert(day_number(date));
        self
    }

    #[must_use]
    pub fn with_working_minutes(mut self, minutes: f64) -> Self {
        self.working_minutes = minutes;
        self
    }

    pub fn validate(&self) -> ChartResult<()> {
        if !self.working_minutes.is_finite()
            || self.working_minutes < 0.0
            || self.working_minutes > FULL_WORKING_DAY_MINUTES
        {
            return Err(ChartError::InvalidConfig(format!(
                "calendar working minutes must be in 0..={FULL_WORKING_DAY_MINUTES}"
            )));
        }
        if let Some((start, end)) = self.weekend_range {
            if start > end || end > 6 {
                return Err(ChartError::InvalidConfig(
                    "calendar weekend range must be an ordered pair of weekdays 0..=6".to_owned(),
                ));
            }
        }
        Ok(())
    }

    /// Working minutes available on UTC day `day`; zero on rest days.
    #[must_use]
    pub fn vacant_minutes(&self, day: i64) -> f64 {
        if self.holidays.contains(&day) {
            return 0.0;
        }
        let weekend = self.weekend_range.is_some_and(|(start, end)| {
            weekday(day).is_some_and(|weekday| (start..=end).contains(&weekday))
        });
        if weekend { 0.0 } else { self.working_minutes }
    }
}

fn weekday(day: i64) -> Option<u8> {
    let moment = DateTime::<Utc>::from_timestamp(day.checked_mul(86_400)?, 0)?;
    u8::try_from(moment.weekday().num_days_from_monday()).ok()
}

/// What sizes the rows: booked activity or available working time, per
/// resource or shared by the whole chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TimeTrackingMode {
    AvailabilityPerChart,
    AvailabilityPerResource,
    ActivityPerChart,
    #[default]
    ActivityPerResource,
}

impl TimeTrackingMode {
    #[must_use]
    pub const fn from_flags(per_chart: bool, track_availability: bool) -> Self {
        match (per_chart, track_availability) {
            (true, true) => Self::AvailabilityPerChart,
            (false, true) => Self::AvailabilityPerResource,
            (true, false) => Self::ActivityPerChart,
            (false, false) => Self::ActivityPerResource,
        }
    }

    #[must_use]
    pub const fn per_chart(self) -> bool {
        matches!(self, Self::AvailabilityPerChart | Self::ActivityPerChart)
    }

    #[must_use]
    pub const fn tracks_availability(self) -> bool {
        matches!(self, Self::AvailabilityPerChart | Self::AvailabilityPerResource)
    }
}
