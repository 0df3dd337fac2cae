use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::bounds::{Bounds, Padding};
use crate::grid::RowHeightCache;

use super::activities::ActivityRegistry;
use super::calendar::{Calendar, MILLIS_PER_DAY};
use super::schedule::{ConflictSpan, ResourceSchedule};

const MILLIS_PER_MINUTE: f64 = 60_000.0;
/// Gap between the conflicts strip and the activity bars.
pub const ACTIVITIES_SPACING: f64 = 1.0;
const MINUTES_PER_DAY: f64 = 1_440.0;
/// Longest activity that is split into daily loads.
const MAX_ACTIVITY_DAYS: i64 = 10_000;

/// Time interval booked on a resource, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub start: f64,
    pub end: f64,
    /// Load per day in minutes; the covered part of each day when absent.
    #[serde(default)]
    pub minutes_per_day: Option<f64>,
}

impl Activity {
    #[must_use]
    pub const fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            minutes_per_day: None,
        }
    }

    #[must_use]
    pub const fn with_minutes_per_day(mut self, minutes: f64) -> Self {
        self.minutes_per_day = Some(minutes);
        self
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start <= self.end
    }

    /// `(UTC day number, minutes)` for every day the activity touches.
    pub(crate) fn daily_loads(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        let first = (self.start / MILLIS_PER_DAY).floor() as i64;
        let last = ((self.end / MILLIS_PER_DAY).ceil() as i64 - 1).max(first);
        (first..=last.min(first + MAX_ACTIVITY_DAYS)).map(move |day| {
            let day_start = day as f64 * MILLIS_PER_DAY;
            let covered = (self.end.min(day_start + MILLIS_PER_DAY) - self.start.max(day_start))
                .max(0.0)
                / MILLIS_PER_MINUTE;
            let minutes = self
                .minutes_per_day
                .filter(|minutes| minutes.is_finite() && *minutes >= 0.0)
                .unwrap_or(covered)
                .min(MINUTES_PER_DAY);
            (day, minutes)
        })
    }
}

/// One row of the resource chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Resource {
    pub name: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl Resource {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            activities: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activities.push(activity);
        self
    }

    /// `(earliest start, latest end)` of the valid activities.
    #[must_use]
    pub fn time_range(&self) -> Option<(f64, f64)> {
        self.activities
            .iter()
            .filter(|activity| activity.is_valid())
            .fold(None, |range: Option<(f64, f64)>, activity| match range {
                None => Some((activity.start, activity.end)),
                Some((min, max)) => Some((f64::min(min, activity.start), f64::max(max, activity.end))),
            })
    }
}

/// Row sizing options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowLayout {
    pub pix_per_hour: f64,
    pub min_row_height: f64,
    pub cell_padding: Padding,
    /// Size every row by the busiest resource.
    pub shared_y_scale: bool,
    /// Size rows by working time when it exceeds the booked load.
    pub track_availability: bool,
    /// Height of the conflicts strip added to over-allocated rows.
    pub conflict_height: f64,
}

impl Default for RowLayout {
    fn default() -> Self {
        Self {
            pix_per_hour: 25.0,
            min_row_height: 50.0,
            cell_padding: Padding::uniform(2.0),
            shared_y_scale: true,
            track_availability: false,
            conflict_height: 15.0,
        }
    }
}

impl RowLayout {
    /// Row height for a daily load of `occupation` minutes, padding included.
    #[must_use]
    pub fn row_height(&self, occupation: f64) -> f64 {
        let content = (self.pix_per_hour * occupation / 60.0).max(self.min_row_height);
        let padding = self.cell_padding.resolve(Bounds::new(0.0, 0.0, 0.0, content));
        content + padding.top + padding.bottom
    }

    /// Extra height of a row whose resource has conflicts.
    #[must_use]
    pub fn conflicts_strip(&self, has_conflicts: bool) -> f64 {
        if has_conflicts {
            self.conflict_height.max(0.0) + ACTIVITIES_SPACING
        } else {
            0.0
        }
    }
}

/// Everything derived from the resource list in one calculation pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceRows {
    pub heights: RowHeightCache,
    pub registry: ActivityRegistry,
    pub time_range: Option<(f64, f64)>,
    pub max_occupation: f64,
    pub schedules: Vec<ResourceSchedule>,
    pub conflicts: Vec<ConflictSpan>,
}

impl ResourceRows {
    #[must_use]
    pub fn compute(resources: &[Resource], layout: &RowLayout, calendar: &Calendar) -> Self {
        let schedules: Vec<ResourceSchedule> = resources
            .iter()
            .map(|resource| ResourceSchedule::compute(resource, calendar, layout.track_availability))
            .collect();
        let max_occupation = schedules
            .iter()
            .map(|schedule| schedule.max_occupation)
            .fold(0.0, f64::max);
        let mut heights = RowHeightCache::new();
        heights.rebuild(schedules.iter().map(|schedule| {
            let occupation = if layout.shared_y_scale {
                max_occupation
            } else {
                schedule.max_occupation
            };
            layout.row_height(occupation) + layout.conflicts_strip(schedule.has_conflicts)
        }));
        let conflicts: Vec<ConflictSpan> = schedules
            .iter()
            .enumerate()
            .flat_map(|(index, schedule)| schedule.conflicts(index))
            .collect();
        let registry =
            ActivityRegistry::from_counts(resources.iter().map(|resource| resource.activities.len()));
        let time_range = resources
            .iter()
            .filter_map(Resource::time_range)
            .fold(None, |range: Option<(f64, f64)>, (start, end)| match range {
                None => Some((start, end)),
                Some((min, max)) => Some((min.min(start), max.max(end))),
            });
        debug!(
            resources = resources.len(),
            activities = registry.total(),
            conflicts = conflicts.len(),
            full_height = heights.total_height(),
            "resource rows calculated"
        );
        Self {
            heights,
            registry,
            time_range,
            max_occupation,
            schedules,
            conflicts,
        }
    }

    #[must_use]
    pub fn full_pixel_height(&self) -> f64 {
        self.heights.total_height()
    }

    #[must_use]
    pub fn has_conflicts(&self, resource: usize) -> bool {
        self.schedules
            .get(resource)
            .is_some_and(|schedule| schedule.has_conflicts)
    }
}
