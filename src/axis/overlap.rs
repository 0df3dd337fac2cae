use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::bounds::Bounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverlapMode {
    /// Drop labels that would collide with an already placed one.
    #[default]
    NoOverlap,
    /// Draw every label.
    AllowOverlap,
}

/// Draw decisions for major and minor labels, one flag per tick.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverlapResult {
    pub labels: Vec<bool>,
    pub minor_labels: Vec<bool>,
}

impl OverlapResult {
    #[must_use]
    pub fn draw_all(majors: usize, minors: usize) -> Self {
        Self {
            labels: vec![true; majors],
            minor_labels: vec![true; minors],
        }
    }
}

/// Ticks of a continuous scale with their measured label boxes.
#[derive(Debug, Clone, Copy)]
pub struct ContinuousTicks<'a> {
    pub major_ratios: &'a [f64],
    pub major_bounds: &'a [Option<Bounds>],
    pub minor_ratios: &'a [f64],
    pub minor_bounds: &'a [Option<Bounds>],
}

fn collides(candidate: Option<Bounds>, other: Option<Bounds>) -> bool {
    candidate.is_some_and(|bounds| bounds.intersects(other.as_ref()))
}

fn edge_allowed(index: usize, len: usize, draw_first: bool, draw_last: bool) -> bool {
    (index == 0 && draw_first) || (index + 1 == len && draw_last) || (index != 0 && index + 1 != len)
}

fn ratio_allowed(ratio: f64, draw_first: bool, draw_last: bool) -> bool {
    (ratio <= 0.0 && draw_first) || (ratio >= 1.0 && draw_last) || (ratio > 0.0 && ratio < 1.0)
}

fn last_obstacle(
    bounds: &[Option<Bounds>],
    index: usize,
    draw_last: bool,
) -> Option<Bounds> {
    let last = bounds.len().checked_sub(1)?;
    if index != last && draw_last {
        bounds[last]
    } else {
        None
    }
}

/// Walk-forward drop for ordinal axes.
///
/// The first and last labels follow their flags unconditionally. Every other
/// label is drawn iff its box misses the previously drawn box and, when the
/// last label is drawn, the last box.
#[must_use]
pub fn resolve_ordinal_overlap(
    bounds: &[Option<Bounds>],
    draw_first: bool,
    draw_last: bool,
) -> Vec<bool> {
    let len = bounds.len();
    if len <= 1 {
        return vec![true; len];
    }
    let mut states = Vec::with_capacity(len);
    let mut prev: Option<usize> = None;
    for index in 0..len {
        let drawn = if index == 0 {
            draw_first
        } else if index + 1 == len {
            draw_last
        } else {
            let own = bounds[index];
            let prev_box = prev.and_then(|prev| bounds[prev]);
            !(collides(own, prev_box) || collides(own, last_obstacle(bounds, index, draw_last)))
        };
        if drawn {
            prev = Some(index);
        }
        states.push(drawn);
    }
    states
}

/// Merged walk over interleaved major and minor ticks of a continuous scale.
///
/// Majors are placed first: the next drawable major is looked ahead so minors
/// in between can avoid it. A minor sharing a major's ratio is never drawn.
/// Minors avoid the previous and next drawn majors and the previous drawn
/// minor.
#[must_use]
pub fn resolve_continuous_overlap(
    ticks: &ContinuousTicks<'_>,
    draw_first: bool,
    draw_last: bool,
    minor_labels: bool,
) -> OverlapResult {
    let majors = ticks.major_ratios.len().min(ticks.major_bounds.len());
    let minors = ticks.minor_ratios.len().min(ticks.minor_bounds.len());
    if majors <= 1 && minors == 0 {
        return OverlapResult::draw_all(majors, 0);
    }

    let major_bounds = &ticks.major_bounds[..majors];
    let mut result = OverlapResult {
        labels: Vec::with_capacity(majors),
        minor_labels: Vec::with_capacity(minors),
    };
    let mut prev: Option<usize> = None;
    let mut next: Option<usize> = None;
    let mut prev_minor: Option<usize> = None;
    let (mut i, mut j) = (0usize, 0usize);

    while i < majors || j < minors {
        if next.is_none() {
            let mut k = i;
            while next.is_none() && k < majors {
                let own = if edge_allowed(k, majors, draw_first, draw_last) {
                    major_bounds[k]
                } else {
                    None
                };
                let prev_box = prev.and_then(|prev| major_bounds[prev]);
                let last_box = last_obstacle(major_bounds, k, draw_last);
                if own.is_some()
                    && !(collides(own, prev_box) || collides(own, last_box))
                    && ratio_allowed(ticks.major_ratios[k], draw_first, draw_last)
                {
                    next = Some(k);
                }
                k += 1;
            }
        }

        let take_major = i < majors
            && (j >= minors
                || OrderedFloat(ticks.major_ratios[i]) <= OrderedFloat(ticks.minor_ratios[j]));
        if take_major {
            if next == Some(i) {
                prev = Some(i);
                next = None;
                result.labels.push(true);
            } else {
                result.labels.push(false);
            }
            if j < minors
                && OrderedFloat(ticks.major_ratios[i]) == OrderedFloat(ticks.minor_ratios[j])
            {
                result.minor_labels.push(false);
                j += 1;
            }
            i += 1;
            continue;
        }

        let drawn = minor_labels && {
            let own = ticks.minor_bounds[j];
            let prev_box = prev.and_then(|prev| major_bounds[prev]);
            let next_box = next.and_then(|next| major_bounds[next]);
            let prev_minor_box = prev_minor.and_then(|prev| ticks.minor_bounds[prev]);
            !(collides(own, prev_box) || collides(own, next_box) || collides(own, prev_minor_box))
                && ratio_allowed(ticks.minor_ratios[j], draw_first, draw_last)
        };
        if drawn {
            prev_minor = Some(j);
        }
        result.minor_labels.push(drawn);
        j += 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::{ContinuousTicks, resolve_continuous_overlap, resolve_ordinal_overlap};
    use crate::core::bounds::Bounds;

    fn row_of_boxes(count: usize, width: f64, step: f64) -> Vec<Option<Bounds>> {
        (0..count)
            .map(|index| Some(Bounds::new(index as f64 * step, 0.0, width, 10.0)))
            .collect()
    }

    #[test]
    fn dense_ordinal_labels_alternate() {
        let bounds = row_of_boxes(5, 40.0, 30.0);
        assert_eq!(
            resolve_ordinal_overlap(&bounds, true, true),
            vec![true, false, true, false, true]
        );
    }

    #[test]
    fn last_label_blocks_its_neighbor() {
        let bounds = row_of_boxes(4, 40.0, 45.0);
        // 2 misses 1 but touches 3, the drawn last label.
        let mut shifted = bounds.clone();
        shifted[2] = Some(Bounds::new(100.0, 0.0, 40.0, 10.0));
        assert_eq!(
            resolve_ordinal_overlap(&shifted, true, true),
            vec![true, true, false, true]
        );
        assert_eq!(
            resolve_ordinal_overlap(&shifted, true, false),
            vec![true, true, true, false]
        );
    }

    #[test]
    fn hidden_first_label_does_not_block() {
        let bounds = row_of_boxes(3, 40.0, 30.0);
        assert_eq!(
            resolve_ordinal_overlap(&bounds, false, false),
            vec![false, true, false]
        );
    }

    #[test]
    fn degenerate_inputs_draw_everything() {
        assert!(resolve_ordinal_overlap(&[], true, true).is_empty());
        assert_eq!(
            resolve_ordinal_overlap(&row_of_boxes(1, 10.0, 0.0), false, false),
            vec![true]
        );
    }

    #[test]
    fn minor_sharing_a_major_ratio_is_never_drawn() {
        let major_ratios = [0.0, 0.5, 1.0];
        let major_bounds = [
            Some(Bounds::new(0.0, 0.0, 10.0, 10.0)),
            Some(Bounds::new(100.0, 0.0, 10.0, 10.0)),
            Some(Bounds::new(200.0, 0.0, 10.0, 10.0)),
        ];
        let minor_ratios = [0.25, 0.5, 0.75];
        let minor_bounds = [
            Some(Bounds::new(50.0, 0.0, 10.0, 10.0)),
            Some(Bounds::new(100.0, 20.0, 10.0, 10.0)),
            Some(Bounds::new(150.0, 0.0, 10.0, 10.0)),
        ];
        let result = resolve_continuous_overlap(
            &ContinuousTicks {
                major_ratios: &major_ratios,
                major_bounds: &major_bounds,
                minor_ratios: &minor_ratios,
                minor_bounds: &minor_bounds,
            },
            true,
            true,
            true,
        );
        assert_eq!(result.labels, vec![true, true, true]);
        assert_eq!(result.minor_labels, vec![true, false, true]);
    }

    #[test]
    fn minors_avoid_the_next_drawn_major() {
        let major_ratios = [0.0, 1.0];
        let major_bounds = [
            Some(Bounds::new(0.0, 0.0, 10.0, 10.0)),
            Some(Bounds::new(100.0, 0.0, 10.0, 10.0)),
        ];
        let minor_ratios = [0.5, 0.95];
        let minor_bounds = [
            Some(Bounds::new(50.0, 0.0, 10.0, 10.0)),
            Some(Bounds::new(95.0, 0.0, 10.0, 10.0)),
        ];
        let result = resolve_continuous_overlap(
            &ContinuousTicks {
                major_ratios: &major_ratios,
                major_bounds: &major_bounds,
                minor_ratios: &minor_ratios,
                minor_bounds: &minor_bounds,
            },
            true,
            true,
            true,
        );
        assert_eq!(result.labels, vec![true, true]);
        assert_eq!(result.minor_labels, vec![true, false]);
    }

    #[test]
    fn edge_ratios_follow_first_and_last_flags() {
        let major_ratios = [0.0, 0.5, 1.0];
        let major_bounds = [
            Some(Bounds::new(0.0, 0.0, 10.0, 10.0)),
            Some(Bounds::new(50.0, 0.0, 10.0, 10.0)),
            Some(Bounds::new(100.0, 0.0, 10.0, 10.0)),
        ];
        let result = resolve_continuous_overlap(
            &ContinuousTicks {
                major_ratios: &major_ratios,
                major_bounds: &major_bounds,
                minor_ratios: &[],
                minor_bounds: &[],
            },
            false,
            true,
            false,
        );
        assert_eq!(result.labels, vec![false, true, true]);
        assert!(result.minor_labels.is_empty());
    }
}
