use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

use super::consistency::{ConsistencyState, ConsistencyStates, Signal, Signals};
use super::invalidation::{Invalidatable, InvalidationState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleKind {
    /// Numeric domain with interleaved minor ticks.
    Continuous,
    /// Discrete categories, no minor ticks.
    Ordinal,
}

/// Value <-> ratio mapping consumed by axes and viewports.
///
/// Domain changes dispatch `NeedsReapplication`, so owners redo everything
/// derived from the mapping.
pub trait Scale: Invalidatable {
    fn kind(&self) -> ScaleKind;

    /// Maps a domain value to a ratio; `[0, 1]` covers the domain.
    fn transform(&self, value: f64) -> f64;

    fn inverse_transform(&self, ratio: f64) -> f64;

    fn minimum(&self) -> f64;

    fn maximum(&self) -> f64;

    /// Major tick values in ascending order.
    fn ticks(&self) -> Vec<f64>;

    /// Minor tick values in ascending order. Ordinal scales have none.
    fn minor_ticks(&self) -> Vec<f64> {
        Vec::new()
    }

    fn tick_label(&self, value: f64) -> String;
}

const SCALE_STATES: ConsistencyStates =
    ConsistencyStates::from_state(ConsistencyState::ScaleRecalculation);
const SCALE_SIGNALS: Signals = Signals::from_signal(Signal::NeedsReapplication)
    .with_signal(Signal::NeedsRecalculation);

fn domain_changed_signals() -> Signals {
    SCALE_SIGNALS
}

#[derive(Debug)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
    tick_interval: Option<f64>,
    minor_tick_count: usize,
    invalidation: InvalidationState,
}

impl LinearScale {
    pub fn new(domain_start: f64, domain_end: f64) -> ChartResult<Self> {
        validate_domain(domain_start, domain_end)?;
        Ok(Self {
            domain_start,
            domain_end,
            tick_interval: None,
            minor_tick_count: 4,
            invalidation: InvalidationState::new("linear_scale", SCALE_STATES, SCALE_SIGNALS),
        })
    }

    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    pub fn set_domain(&mut self, domain_start: f64, domain_end: f64) -> ChartResult<()> {
        validate_domain(domain_start, domain_end)?;
        if self.domain_start == domain_start && self.domain_end == domain_end {
            return Ok(());
        }
        self.domain_start = domain_start;
        self.domain_end = domain_end;
        self.invalidation
            .invalidate(ConsistencyState::ScaleRecalculation, domain_changed_signals());
        Ok(())
    }

    /// Sets a fixed major tick interval; `None` picks a 1/2/5 step automatically.
    pub fn set_tick_interval(&mut self, interval: Option<f64>) {
        let interval = interval.filter(|value| value.is_finite() && *value > 0.0);
        if self.tick_interval != interval {
            self.tick_interval = interval;
            self.invalidation
                .invalidate(ConsistencyState::ScaleRecalculation, domain_changed_signals());
        }
    }

    pub fn set_minor_tick_count(&mut self, count: usize) {
        if self.minor_tick_count != count {
            self.minor_tick_count = count;
            self.invalidation
                .invalidate(ConsistencyState::ScaleRecalculation, domain_changed_signals());
        }
    }

    fn major_interval(&self) -> f64 {
        if let Some(interval) = self.tick_interval {
            return interval;
        }
        nice_interval((self.domain_end - self.domain_start).abs() / 5.0)
    }
}

fn validate_domain(domain_start: f64, domain_end: f64) -> ChartResult<()> {
    if !domain_start.is_finite() || !domain_end.is_finite() || domain_start == domain_end {
        return Err(ChartError::InvalidData(
            "scale domain must be finite and non-zero".to_owned(),
        ));
    }
    Ok(())
}

fn nice_interval(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let step = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    step * magnitude
}

fn stepped_values(start: f64, end: f64, interval: f64) -> Vec<f64> {
    let (low, high) = if start <= end { (start, end) } else { (end, start) };
    let first = (low / interval).ceil();
    let last = (high / interval + 1e-9).floor();
    if last < first {
        return Vec::new();
    }
    (first as i64..=last as i64)
        .map(|step| step as f64 * interval)
        .collect()
}

impl Invalidatable for LinearScale {
    fn invalidation(&self) -> &InvalidationState {
        &self.invalidation
    }

    fn invalidation_mut(&mut self) -> &mut InvalidationState {
        &mut self.invalidation
    }
}

impl Scale for LinearScale {
    fn kind(&self) -> ScaleKind {
        ScaleKind::Continuous
    }

    fn transform(&self, value: f64) -> f64 {
        (value - self.domain_start) / (self.domain_end - self.domain_start)
    }

    fn inverse_transform(&self, ratio: f64) -> f64 {
        self.domain_start + ratio * (self.domain_end - self.domain_start)
    }

    fn minimum(&self) -> f64 {
        self.domain_start.min(self.domain_end)
    }

    fn maximum(&self) -> f64 {
        self.domain_start.max(self.domain_end)
    }

    fn ticks(&self) -> Vec<f64> {
        stepped_values(self.domain_start, self.domain_end, self.major_interval())
    }

    fn minor_ticks(&self) -> Vec<f64> {
        if self.minor_tick_count == 0 {
            return Vec::new();
        }
        let interval = self.major_interval() / (self.minor_tick_count + 1) as f64;
        stepped_values(self.domain_start, self.domain_end, interval)
    }

    fn tick_label(&self, value: f64) -> String {
        let rounded = (value * 1e6).round() / 1e6;
        if rounded.fract() == 0.0 {
            format!("{rounded:.0}")
        } else {
            let text = format!("{rounded:.6}");
            text.trim_end_matches('0').trim_end_matches('.').to_owned()
        }
    }
}

/// Category scale: tick `i` sits in the middle of the `i`-th band.
#[derive(Debug)]
pub struct OrdinalScale {
    values: Vec<String>,
    invalidation: InvalidationState,
}

impl OrdinalScale {
    #[must_use]
    pub fn new(values: Vec<String>) -> Self {
        Self {
            values,
            invalidation: InvalidationState::new("ordinal_scale", SCALE_STATES, SCALE_SIGNALS),
        }
    }

    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn set_values(&mut self, values: Vec<String>) {
        if self.values != values {
            self.values = values;
            self.invalidation
                .invalidate(ConsistencyState::ScaleRecalculation, domain_changed_signals());
        }
    }
}

impl Invalidatable for OrdinalScale {
    fn invalidation(&self) -> &InvalidationState {
        &self.invalidation
    }

    fn invalidation_mut(&mut self) -> &mut InvalidationState {
        &mut self.invalidation
    }
}

impl Scale for OrdinalScale {
    fn kind(&self) -> ScaleKind {
        ScaleKind::Ordinal
    }

    fn transform(&self, value: f64) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        (value + 0.5) / self.values.len() as f64
    }

    fn inverse_transform(&self, ratio: f64) -> f64 {
        let len = self.values.len();
        if len == 0 {
            return f64::NAN;
        }
        (ratio * len as f64).floor().clamp(0.0, (len - 1) as f64)
    }

    fn minimum(&self) -> f64 {
        0.0
    }

    fn maximum(&self) -> f64 {
        self.values.len().saturating_sub(1) as f64
    }

    fn ticks(&self) -> Vec<f64> {
        (0..self.values.len()).map(|index| index as f64).collect()
    }

    fn tick_label(&self, value: f64) -> String {
        if value < 0.0 {
            return String::new();
        }
        self.values
            .get(value as usize)
            .cloned()
            .unwrap_or_default()
    }
}
