use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ChartError, ChartResult, WarningCode, report_warning};

use super::consistency::{ConsistencyState, ConsistencyStates, Signal, Signals};
use super::invalidation::{Invalidatable, InvalidationState};
use super::scale::{Scale, ScaleKind};

const MILLIS_PER_SECOND: f64 = 1_000.0;
const MILLIS_PER_MINUTE: f64 = 60.0 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: f64 = 60.0 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: f64 = 24.0 * MILLIS_PER_HOUR;
const MILLIS_PER_WEEK: f64 = 7.0 * MILLIS_PER_DAY;

/// 2000-01-01T00:00:00Z, the origin unit boundaries are aligned to.
const ALIGNMENT_ORIGIN_MILLIS: f64 = 946_684_800_000.0;
/// Months between 1970-01 and 2000-01.
const ALIGNMENT_ORIGIN_MONTHS: f64 = 360.0;

const MAX_TICKS: usize = 10_000;
const DEFAULT_UNIT_PIX_SIZE: f64 = 60.0;

/// Calendar interval the time scale steps by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Quarter,
    Semester,
    Year,
}

impl TimeUnit {
    /// Length in milliseconds for units of constant duration.
    #[must_use]
    pub const fn fixed_millis(self) -> Option<f64> {
        match self {
            Self::Millisecond => Some(1.0),
            Self::Second => Some(MILLIS_PER_SECOND),
            Self::Minute => Some(MILLIS_PER_MINUTE),
            Self::Hour => Some(MILLIS_PER_HOUR),
            Self::Day => Some(MILLIS_PER_DAY),
            Self::Week => Some(MILLIS_PER_WEEK),
            Self::Month | Self::Quarter | Self::Semester | Self::Year => None,
        }
    }

    /// Length in months for calendar units.
    #[must_use]
    pub const fn months(self) -> Option<f64> {
        match self {
            Self::Month => Some(1.0),
            Self::Quarter => Some(3.0),
            Self::Semester => Some(6.0),
            Self::Year => Some(12.0),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label_pattern(self) -> &'static str {
        match self {
            Self::Millisecond => "%H:%M:%S%.3f",
            Self::Second => "%H:%M:%S",
            Self::Minute | Self::Hour => "%H:%M",
            Self::Day | Self::Week => "%d %b",
            Self::Month | Self::Quarter | Self::Semester => "%b %Y",
            Self::Year => "%Y",
        }
    }
}

/// One interval produced by [`DateTimeScale::ticks_between`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeTick {
    pub start: f64,
    pub end: f64,
}

fn month_start_millis(month_index: i64) -> Option<f64> {
    let year = i32::try_from(1970 + month_index.div_euclid(12)).ok()?;
    let month = u32::try_from(month_index.rem_euclid(12)).ok()? + 1;
    let date = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
    Some(date.and_utc().timestamp_millis() as f64)
}

/// Fractional months since 1970-01 for a timestamp.
fn month_position(timestamp: f64) -> Option<f64> {
    let moment = DateTime::<Utc>::from_timestamp_millis(timestamp.floor() as i64)?;
    let index = i64::from(moment.year() - 1970) * 12 + i64::from(moment.month0());
    let start = month_start_millis(index)?;
    let next = month_start_millis(index + 1)?;
    Some(index as f64 + (timestamp - start) / (next - start))
}

fn month_position_to_millis(position: f64) -> Option<f64> {
    if !position.is_finite() {
        return None;
    }
    let whole = position.floor();
    let start = month_start_millis(whole as i64)?;
    let next = month_start_millis(whole as i64 + 1)?;
    Some(start + (position - whole) * (next - start))
}

/// Timestamp -> unit position, where one unit is `count` x `unit`.
fn to_units(timestamp: f64, unit: TimeUnit, count: u32) -> f64 {
    if !timestamp.is_finite() {
        return f64::NAN;
    }
    let count = f64::from(count.max(1));
    if let Some(millis) = unit.fixed_millis() {
        return (timestamp - ALIGNMENT_ORIGIN_MILLIS) / (millis * count);
    }
    let months = unit.months().unwrap_or(1.0);
    month_position(timestamp)
        .map(|position| (position - ALIGNMENT_ORIGIN_MONTHS) / (months * count))
        .unwrap_or(f64::NAN)
}

fn from_units(units: f64, unit: TimeUnit, count: u32) -> f64 {
    if !units.is_finite() {
        return f64::NAN;
    }
    let count = f64::from(count.max(1));
    if let Some(millis) = unit.fixed_millis() {
        return units * millis * count + ALIGNMENT_ORIGIN_MILLIS;
    }
    let months = unit.months().unwrap_or(1.0);
    month_position_to_millis(units * months * count + ALIGNMENT_ORIGIN_MONTHS).unwrap_or(f64::NAN)
}

/// Floors a timestamp to the enclosing `count` x `unit` boundary.
#[must_use]
pub fn align_left(timestamp: f64, unit: TimeUnit, count: u32) -> f64 {
    from_units(to_units(timestamp, unit, count).floor(), unit, count)
}

#[must_use]
pub fn format_timestamp(timestamp: f64, unit: TimeUnit) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp.round() as i64)
        .map(|moment| moment.format(unit.label_pattern()).to_string())
        .unwrap_or_default()
}

const SCALE_STATES: ConsistencyStates =
    ConsistencyStates::from_state(ConsistencyState::ScaleRecalculation);
const SCALE_SIGNALS: Signals = Signals::from_signal(Signal::NeedsRecalculation)
    .with_signal(Signal::NeedsReapplication);

/// Date-time scale measured in pixels from a movable origin date.
///
/// `date_to_pix(start_date) == 0`; one `count` x `unit` interval spans
/// `unit_pix_size` pixels. Calendar units (month and longer) interpolate
/// linearly inside each month so the two mappings stay exact inverses.
#[derive(Debug)]
pub struct DateTimeScale {
    unit: TimeUnit,
    count: u32,
    unit_pix_size: f64,
    start_date: f64,
    start_unit: f64,
    minimum: f64,
    maximum: f64,
    invalidation: InvalidationState,
}

impl Default for DateTimeScale {
    fn default() -> Self {
        Self::new()
    }
}

impl DateTimeScale {
    #[must_use]
    pub fn new() -> Self {
        let unit = TimeUnit::default();
        let start_date = ALIGNMENT_ORIGIN_MILLIS;
        Self {
            unit,
            count: 1,
            unit_pix_size: DEFAULT_UNIT_PIX_SIZE,
            start_date,
            start_unit: to_units(start_date, unit, 1),
            minimum: start_date,
            maximum: start_date + MILLIS_PER_DAY,
            invalidation: InvalidationState::new("date_time_scale", SCALE_STATES, SCALE_SIGNALS),
        }
    }

    #[must_use]
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn set_unit(&mut self, unit: TimeUnit) {
        if self.unit != unit {
            self.unit = unit;
            self.recalculate();
        }
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Zero is not a natural number and falls back to 1.
    pub fn set_count(&mut self, count: u32) {
        let count = if count == 0 {
            report_warning(WarningCode::IgnoredInvalidValue, self.invalidation.source());
            1
        } else {
            count
        };
        if self.count != count {
            self.count = count;
            self.recalculate();
        }
    }

    #[must_use]
    pub fn unit_pix_size(&self) -> f64 {
        self.unit_pix_size
    }

    pub fn set_unit_pix_size(&mut self, unit_pix_size: f64) {
        if !unit_pix_size.is_finite() || unit_pix_size <= 0.0 {
            warn!(unit_pix_size, "ignoring non-positive unit pixel size");
            report_warning(WarningCode::IgnoredInvalidValue, self.invalidation.source());
            return;
        }
        if self.unit_pix_size != unit_pix_size {
            self.unit_pix_size = unit_pix_size;
            self.recalculate();
        }
    }

    /// Applies unit, count and pixel size as one recalculation.
    pub fn set_unit_spec(&mut self, unit: TimeUnit, count: u32, unit_pix_size: f64) {
        self.invalidation.suspend_signals_dispatching();
        self.set_unit(unit);
        self.set_count(count);
        self.set_unit_pix_size(unit_pix_size);
        self.invalidation.resume_signals_dispatching(true);
    }

    #[must_use]
    pub fn start_date(&self) -> f64 {
        self.start_date
    }

    /// Moves the pixel origin; only reapplication is needed.
    pub fn set_start_date(&mut self, start_date: f64) {
        if !start_date.is_finite() || self.start_date == start_date {
            return;
        }
        self.start_date = start_date;
        self.start_unit = to_units(start_date, self.unit, self.count);
        self.invalidation
            .invalidate(ConsistencyState::ScaleRecalculation, Signal::NeedsReapplication);
    }

    /// Sets the data range. The minimum is aligned left to a unit boundary,
    /// the maximum to the end of its enclosing unit.
    pub fn set_range(&mut self, minimum: f64, maximum: f64) -> ChartResult<()> {
        if !minimum.is_finite() || !maximum.is_finite() || minimum > maximum {
            return Err(ChartError::InvalidData(
                "date time range must be finite and ordered".to_owned(),
            ));
        }
        let (aligned_min, aligned_max) = self.aligned_range(minimum, maximum);
        if self.minimum == aligned_min && self.maximum == aligned_max {
            return Ok(());
        }
        self.minimum = aligned_min;
        self.maximum = aligned_max;
        self.invalidation
            .invalidate(ConsistencyState::ScaleRecalculation, SCALE_SIGNALS);
        Ok(())
    }

    fn aligned_range(&self, minimum: f64, maximum: f64) -> (f64, f64) {
        let aligned_min = align_left(minimum, self.unit, self.count);
        let aligned_max = from_units(
            to_units(maximum, self.unit, self.count).floor() + 1.0,
            self.unit,
            self.count,
        );
        (aligned_min, aligned_max)
    }

    fn recalculate(&mut self) {
        self.start_unit = to_units(self.start_date, self.unit, self.count);
        let (minimum, maximum) = self.aligned_range(self.minimum, self.maximum - 1.0);
        if minimum.is_finite() && maximum.is_finite() {
            self.minimum = minimum;
            self.maximum = maximum;
        }
        self.invalidation
            .invalidate(ConsistencyState::ScaleRecalculation, SCALE_SIGNALS);
    }

    /// Pixel offset of `date` from the start date.
    #[must_use]
    pub fn date_to_pix(&self, date: f64) -> f64 {
        (to_units(date, self.unit, self.count) - self.start_unit) * self.unit_pix_size
    }

    #[must_use]
    pub fn pix_to_date(&self, pix: f64) -> f64 {
        from_units(pix / self.unit_pix_size + self.start_unit, self.unit, self.count)
    }

    /// Intervals covering `[from_pix, to_pix)`, aligned to `unit`/`count`
    /// (the scale's own when `None`).
    #[must_use]
    pub fn ticks_between(
        &self,
        from_pix: f64,
        to_pix: f64,
        unit: Option<TimeUnit>,
        count: Option<u32>,
    ) -> Vec<TimeTick> {
        let unit = unit.unwrap_or(self.unit);
        let count = count.unwrap_or(self.count).max(1);
        let end = self.pix_to_date(to_pix);
        let mut units = to_units(self.pix_to_date(from_pix), unit, count).floor();
        let mut current = from_units(units, unit, count);
        let mut ticks = Vec::new();
        while current.is_finite() && current < end && ticks.len() < MAX_TICKS {
            units += 1.0;
            let next = from_units(units, unit, count);
            if next.is_nan() || next <= current {
                break;
            }
            ticks.push(TimeTick {
                start: current,
                end: next,
            });
            current = next;
        }
        ticks
    }
}

impl Invalidatable for DateTimeScale {
    fn invalidation(&self) -> &InvalidationState {
        &self.invalidation
    }

    fn invalidation_mut(&mut self) -> &mut InvalidationState {
        &mut self.invalidation
    }
}

impl Scale for DateTimeScale {
    fn kind(&self) -> ScaleKind {
        ScaleKind::Continuous
    }

    fn transform(&self, value: f64) -> f64 {
        let span = self.maximum - self.minimum;
        if span == 0.0 {
            return 0.0;
        }
        (value - self.minimum) / span
    }

    fn inverse_transform(&self, ratio: f64) -> f64 {
        self.minimum + ratio * (self.maximum - self.minimum)
    }

    fn minimum(&self) -> f64 {
        self.minimum
    }

    fn maximum(&self) -> f64 {
        self.maximum
    }

    fn ticks(&self) -> Vec<f64> {
        let from = self.date_to_pix(self.minimum);
        let to = self.date_to_pix(self.maximum);
        let mut values: Vec<f64> = self
            .ticks_between(from, to, None, None)
            .into_iter()
            .map(|tick| tick.start)
            .collect();
        values.push(self.maximum);
        values
    }

    fn tick_label(&self, value: f64) -> String {
        format_timestamp(value, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::{DateTimeScale, MILLIS_PER_DAY, TimeUnit, align_left, format_timestamp};
    use crate::core::scale::Scale;

    const JAN_1_2024: f64 = 1_704_067_200_000.0;
    const FEB_1_2024: f64 = 1_706_745_600_000.0;
    const MAR_1_2024: f64 = 1_709_251_200_000.0;

    #[test]
    fn fixed_units_are_linear() {
        let mut scale = DateTimeScale::new();
        scale.set_start_date(JAN_1_2024);
        assert!((scale.date_to_pix(JAN_1_2024 + 2.5 * MILLIS_PER_DAY) - 150.0).abs() <= 1e-9);
        assert!((scale.pix_to_date(-60.0) - (JAN_1_2024 - MILLIS_PER_DAY)).abs() <= 1e-3);
    }

    #[test]
    fn month_units_follow_calendar_lengths() {
        let mut scale = DateTimeScale::new();
        scale.set_unit(TimeUnit::Month);
        scale.set_unit_pix_size(100.0);
        scale.set_start_date(JAN_1_2024);
        assert!((scale.date_to_pix(FEB_1_2024) - 100.0).abs() <= 1e-9);
        assert!((scale.date_to_pix(MAR_1_2024) - 200.0).abs() <= 1e-9);
        let mid_february = scale.pix_to_date(150.0);
        assert!((scale.date_to_pix(mid_february) - 150.0).abs() <= 1e-9);
    }

    #[test]
    fn range_is_aligned_to_unit_boundaries() {
        let mut scale = DateTimeScale::new();
        scale
            .set_range(JAN_1_2024 + 3.0 * 3_600_000.0, JAN_1_2024 + 2.0 * MILLIS_PER_DAY + 1.0)
            .expect("range");
        assert_eq!(scale.minimum(), JAN_1_2024);
        assert_eq!(scale.maximum(), JAN_1_2024 + 3.0 * MILLIS_PER_DAY);
        assert!(scale.set_range(2.0, 1.0).is_err());
    }

    #[test]
    fn ticks_cover_requested_pixels() {
        let mut scale = DateTimeScale::new();
        scale.set_start_date(JAN_1_2024 + 0.5 * MILLIS_PER_DAY);
        let ticks = scale.ticks_between(0.0, 120.0, None, None);
        assert_eq!(ticks.len(), 3);
        assert_eq!(ticks[0].start, JAN_1_2024);
        assert_eq!(ticks[2].end, JAN_1_2024 + 3.0 * MILLIS_PER_DAY);
    }

    #[test]
    fn zero_count_falls_back_to_one() {
        let mut scale = DateTimeScale::new();
        scale.set_count(0);
        assert_eq!(scale.count(), 1);
    }

    #[test]
    fn alignment_and_labels_use_utc_calendar() {
        assert_eq!(align_left(FEB_1_2024 + 5.0, TimeUnit::Quarter, 1), JAN_1_2024);
        assert_eq!(format_timestamp(FEB_1_2024, TimeUnit::Month), "Feb 2024");
        assert_eq!(format_timestamp(FEB_1_2024, TimeUnit::Year), "2024");
    }
}
