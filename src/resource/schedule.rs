use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::calendar::{Calendar, MILLIS_PER_DAY};
use super::rows::Resource;

/// Booked and available minutes of one working day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayAllocation {
    pub vacant: f64,
    pub allocated: f64,
    /// Indices of the activities booked on that day.
    pub activities: SmallVec<[usize; 4]>,
}

impl DayAllocation {
    fn new(vacant: f64) -> Self {
        Self {
            vacant,
            allocated: 0.0,
            activities: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn overtime(&self) -> f64 {
        (self.allocated - self.vacant).max(0.0)
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.allocated > self.vacant
    }
}

/// Run of consecutive over-allocated days sharing one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictSpan {
    pub resource: usize,
    /// Start of the first day, epoch milliseconds.
    pub start: f64,
    /// End of the last day, epoch milliseconds.
    pub end: f64,
    pub overtime_minutes: f64,
    pub vacant_minutes: f64,
    pub label: String,
}

/// Per-day allocation of one resource against the calendar.
///
/// Rest days take no allocation, so activities crossing a weekend never
/// conflict there.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceSchedule {
    pub days: BTreeMap<i64, DayAllocation>,
    pub max_occupation: f64,
    pub has_conflicts: bool,
}

impl ResourceSchedule {
    #[must_use]
    pub fn compute(resource: &Resource, calendar: &Calendar, track_availability: bool) -> Self {
        let mut days: BTreeMap<i64, DayAllocation> = BTreeMap::new();
        let mut has_conflicts = false;
        for (index, activity) in resource
            .activities
            .iter()
            .enumerate()
            .filter(|(_, activity)| activity.is_valid())
        {
            for (day, minutes) in activity.daily_loads() {
                let vacant = calendar.vacant_minutes(day);
                if vacant <= 0.0 {
                    continue;
                }
                let allocation = days
                    .entry(day)
                    .or_insert_with(|| DayAllocation::new(vacant));
                if allocation.activities.last() != Some(&index) {
                    allocation.activities.push(index);
                }
                allocation.allocated += minutes;
                has_conflicts |= allocation.is_conflict();
            }
        }
        let max_occupation = days
            .values()
            .map(|allocation| {
                if track_availability {
                    allocation.allocated.max(allocation.vacant)
                } else {
                    allocation.allocated
                }
            })
            .fold(0.0, f64::max);
        Self {
            days,
            max_occupation,
            has_conflicts,
        }
    }

    /// Over-allocated days merged into spans. A span ends at a day that is
    /// not in conflict, a gap in the days, or a change of label.
    #[must_use]
    pub fn conflicts(&self, resource: usize) -> Vec<ConflictSpan> {
        let mut spans: Vec<ConflictSpan> = Vec::new();
        let mut previous_day: Option<i64> = None;
        let mut open = false;
        for (day, allocation) in &self.days {
            if !allocation.is_conflict() {
                open = false;
                continue;
            }
            let label = overtime_label(allocation.overtime(), allocation.vacant);
            let extends = open
                && previous_day.is_some_and(|previous| previous + 1 == *day)
                && spans.last().is_some_and(|span| span.label == label);
            let day_end = (*day + 1) as f64 * MILLIS_PER_DAY;
            match spans.last_mut() {
                Some(span) if extends => span.end = day_end,
                _ => spans.push(ConflictSpan {
                    resource,
                    start: *day as f64 * MILLIS_PER_DAY,
                    end: day_end,
                    overtime_minutes: allocation.overtime(),
                    vacant_minutes: allocation.vacant,
                    label,
                }),
            }
            previous_day = Some(*day);
            open = true;
        }
        spans
    }
}

/// `"<hours>h (<percent>%)"` of the overtime against the working time.
#[must_use]
pub fn overtime_label(overtime_minutes: f64, vacant_minutes: f64) -> String {
    let percent = if vacant_minutes > 0.0 {
        overtime_minutes / vacant_minutes * 100.0
    } else {
        0.0
    };
    format!(
        "{}h ({}%)",
        trim_number(overtime_minutes / 60.0),
        trim_number(percent)
    )
}

fn trim_number(value: f64) -> String {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_owned()
}

#[cfg(test)]
mod tests {
    use super::{ResourceSchedule, overtime_label};
    use crate::resource::calendar::Calendar;
    use crate::resource::rows::{Activity, Resource};

    const DAY: f64 = 86_400_000.0;
    const JAN_1_2024: f64 = 1_704_067_200_000.0;

    fn booked(from_day: f64, to_day: f64, minutes: f64) -> Activity {
        Activity::new(JAN_1_2024 + from_day * DAY, JAN_1_2024 + to_day * DAY)
            .with_minutes_per_day(minutes)
    }

    #[test]
    fn overlapping_bookings_conflict_once_per_run() {
        let resource = Resource::new("crane")
            .with_activity(booked(0.0, 3.0, 1_000.0))
            .with_activity(booked(1.0, 3.0, 1_000.0));
        let schedule = ResourceSchedule::compute(&resource, &Calendar::default(), false);
        assert!(schedule.has_conflicts);
        assert_eq!(schedule.max_occupation, 2_000.0);

        let spans = schedule.conflicts(4);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].resource, 4);
        assert_eq!(spans[0].start, JAN_1_2024 + DAY);
        assert_eq!(spans[0].end, JAN_1_2024 + 3.0 * DAY);
        assert_eq!(spans[0].overtime_minutes, 561.0);
        assert_eq!(spans[0].label, "9.35h (38.99%)");
        let tuesday = schedule.days.values().nth(1).expect("tuesday");
        assert_eq!(tuesday.activities.as_slice(), &[0, 1]);
    }

    #[test]
    fn rest_days_split_conflicts() {
        // Friday through Monday; the weekend takes no allocation.
        let resource = Resource::new("crane")
            .with_activity(booked(4.0, 8.0, 1_000.0))
            .with_activity(booked(4.0, 8.0, 1_000.0));
        let schedule = ResourceSchedule::compute(&resource, &Calendar::default(), false);
        assert_eq!(schedule.days.len(), 2);
        let spans = schedule.conflicts(0);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].start, JAN_1_2024 + 4.0 * DAY);
        assert_eq!(spans[1].start, JAN_1_2024 + 7.0 * DAY);
    }

    #[test]
    fn availability_tracking_sizes_by_working_time() {
        let resource = Resource::new("crane").with_activity(booked(0.0, 1.0, 120.0));
        let calendar = Calendar::default().with_working_minutes(480.0);
        let activity = ResourceSchedule::compute(&resource, &calendar, false);
        let availability = ResourceSchedule::compute(&resource, &calendar, true);
        assert_eq!(activity.max_occupation, 120.0);
        assert_eq!(availability.max_occupation, 480.0);
        assert!(!availability.has_conflicts);
        assert!(availability.conflicts(0).is_empty());
    }

    #[test]
    fn labels_trim_trailing_zeros() {
        assert_eq!(overtime_label(60.0, 480.0), "1h (12.5%)");
        assert_eq!(overtime_label(30.0, 0.0), "0.5h (0%)");
    }
}
