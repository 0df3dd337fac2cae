use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::bounds::{Bounds, Orientation};

use super::overlap::OverlapMode;

/// Inputs of the stagger pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaggerSettings {
    /// Explicit line count; auto-detected when `None`.
    pub lines: Option<usize>,
    /// Upper bound for the auto-detected line count.
    pub max_lines: Option<usize>,
    pub overlap_mode: OverlapMode,
    pub draw_first: bool,
    pub draw_last: bool,
    pub orientation: Orientation,
}

impl Default for StaggerSettings {
    fn default() -> Self {
        Self {
            lines: None,
            max_lines: None,
            overlap_mode: OverlapMode::NoOverlap,
            draw_first: true,
            draw_last: true,
            orientation: Orientation::Bottom,
        }
    }
}

/// Labels distributed across offset lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaggerLayout {
    /// Draw flag per major tick.
    pub states: Vec<bool>,
    /// Line count in use.
    pub lines: usize,
    /// Detected line count; `max_lines + 1` when the search stopped at the cap.
    pub auto_lines: usize,
    /// Largest label extent across the axis, per line.
    pub lines_size: SmallVec<[f64; 4]>,
    /// Tick indices drawn on each line, in order.
    pub line_members: Vec<Vec<usize>>,
}

impl StaggerLayout {
    /// Distance of `line` from the axis: the sum of every earlier line's size.
    #[must_use]
    pub fn line_offset(&self, line: usize) -> f64 {
        self.lines_size.iter().take(line).sum()
    }

    /// Total extent of every line.
    #[must_use]
    pub fn total_size(&self) -> f64 {
        self.lines_size.iter().sum()
    }

    #[must_use]
    pub fn line_of(&self, index: usize) -> Option<usize> {
        self.line_members
            .iter()
            .position(|members| members.contains(&index))
    }
}

fn collides(candidate: Option<Bounds>, other: Option<Bounds>) -> bool {
    candidate.is_some_and(|bounds| bounds.intersects(other.as_ref()))
}

/// True when every `step`-th label misses its same-class successor.
fn classes_converge(bounds: &[Option<Bounds>], step: usize) -> bool {
    let len = bounds.len();
    (0..step).all(|class| {
        (class..len.saturating_sub(step))
            .step_by(step)
            .all(|index| !collides(bounds[index], bounds[index + step]))
    })
}

/// Smallest converging line count, searched up to `cap`.
fn detect_lines(bounds: &[Option<Bounds>], cap: usize) -> usize {
    (1..=cap)
        .find(|step| classes_converge(bounds, *step))
        .unwrap_or(cap + 1)
}

/// Walk-forward drop restricted to the labels of each line.
fn drop_within_lines(bounds: &[Option<Bounds>], lines: usize, settings: &StaggerSettings) -> Vec<bool> {
    let len = bounds.len();
    let last = len - 1;
    let mut states = vec![false; len];
    for line in 0..lines {
        let mut prev: Option<usize> = None;
        for index in (line..len).step_by(lines) {
            let drawn = if index == 0 {
                settings.draw_first
            } else if index == last {
                settings.draw_last
            } else {
                let last_box = if settings.draw_last { bounds[last] } else { None };
                let prev_box = prev.and_then(|prev| bounds[prev]);
                !(collides(bounds[index], prev_box) || collides(bounds[index], last_box))
            };
            if drawn {
                prev = Some(index);
            }
            states[index] = drawn;
        }
    }
    states[0] &= settings.draw_first;
    states[last] &= settings.draw_last;
    states
}

/// Distributes labels over stagger lines.
///
/// Without an explicit count the smallest line count whose residue classes
/// are collision free is used. When the count is limited (explicit, or the
/// detected count exceeds `max_lines`) and overlap is not allowed, labels
/// still colliding inside a line are dropped.
#[must_use]
pub fn resolve_stagger(bounds: &[Option<Bounds>], settings: &StaggerSettings) -> StaggerLayout {
    let len = bounds.len();
    if len <= 1 {
        return StaggerLayout {
            states: vec![true; len],
            lines: 1,
            auto_lines: 1,
            lines_size: bounds
                .iter()
                .map(|bounds| bounds.map_or(0.0, |bounds| bounds.extent_across(settings.orientation)))
                .collect(),
            line_members: vec![(0..len).collect()],
        };
    }

    let max_lines = settings.max_lines.map(|max| max.max(1));
    let (lines, auto_lines) = match settings.lines {
        Some(lines) => (lines.clamp(1, len), 1),
        None => {
            let cap = max_lines.map_or(len, |max| max.min(len));
            let auto_lines = detect_lines(bounds, cap);
            let lines = match max_lines {
                Some(max) if auto_lines > max => max,
                _ => auto_lines.min(len),
            };
            (lines, auto_lines)
        }
    };
    let limited = settings.lines.is_some() || max_lines.is_some_and(|max| auto_lines > max);

    let states = if limited && settings.overlap_mode == OverlapMode::NoOverlap {
        drop_within_lines(bounds, lines, settings)
    } else {
        let mut states = vec![true; len];
        states[0] = settings.draw_first;
        states[len - 1] = settings.draw_last;
        states
    };

    // A label stays on the line of its residue class, the class it was
    // collision-tested in.
    let mut lines_size: SmallVec<[f64; 4]> = SmallVec::from_elem(0.0, lines);
    let mut line_members: Vec<Vec<usize>> = vec![Vec::new(); lines];
    for (index, _) in states.iter().enumerate().filter(|(_, drawn)| **drawn) {
        let line = index % lines;
        let size = bounds[index].map_or(0.0, |bounds| bounds.extent_across(settings.orientation));
        if lines_size[line] < size {
            lines_size[line] = size;
        }
        line_members[line].push(index);
    }

    StaggerLayout {
        states,
        lines,
        auto_lines,
        lines_size,
        line_members,
    }
}
