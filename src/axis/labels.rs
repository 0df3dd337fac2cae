use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::bounds::{Bounds, Orientation};

/// Measured text extent in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LabelSize {
    pub width: f64,
    pub height: f64,
}

impl LabelSize {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Pure text measurement.
///
/// The overlap resolver probes many trial placements per pass, so an
/// implementation must not touch anything visible.
pub trait LabelMeasurer {
    fn measure(&self, text: &str) -> LabelSize;
}

impl<F> LabelMeasurer for F
where
    F: Fn(&str) -> LabelSize,
{
    fn measure(&self, text: &str) -> LabelSize {
        self(text)
    }
}

/// Every label gets the same box regardless of its text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSizeMeasurer {
    pub size: LabelSize,
}

impl FixedSizeMeasurer {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            size: LabelSize::new(width, height),
        }
    }
}

impl LabelMeasurer for FixedSizeMeasurer {
    fn measure(&self, _text: &str) -> LabelSize {
        self.size
    }
}

/// Monospace approximation: width grows with the character count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharWidthMeasurer {
    pub char_width: f64,
    pub line_height: f64,
}

impl Default for CharWidthMeasurer {
    fn default() -> Self {
        Self {
            char_width: 7.0,
            line_height: 14.0,
        }
    }
}

impl LabelMeasurer for CharWidthMeasurer {
    fn measure(&self, text: &str) -> LabelSize {
        LabelSize::new(text.chars().count() as f64 * self.char_width, self.line_height)
    }
}

/// Geometry a label is placed against: the axis area along the scale and the
/// cross coordinate of the axis line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacement {
    pub orientation: Orientation,
    pub area: Bounds,
    pub line: f64,
    /// Gap between the line and the label: half the stroke plus outside ticks.
    pub offset: f64,
}

impl LabelPlacement {
    /// Zero-thickness geometry with the line at the origin. Boxes computed
    /// here only differ from the final ones by [`LabelPlacement::origin`].
    #[must_use]
    pub fn measuring(orientation: Orientation, length: f64, offset: f64) -> Self {
        let area = if orientation.is_horizontal() {
            Bounds::new(0.0, 0.0, length, 0.0)
        } else {
            Bounds::new(0.0, 0.0, 0.0, length)
        };
        Self {
            orientation,
            area,
            line: 0.0,
            offset,
        }
    }

    /// Translation from measuring geometry into this placement.
    #[must_use]
    pub fn origin(&self) -> (f64, f64) {
        if self.orientation.is_horizontal() {
            (self.area.left, self.line)
        } else {
            (self.line, self.area.top)
        }
    }
}

/// Box a label of `size` occupies at `ratio`; `None` outside `[0, 1]`.
#[must_use]
pub fn label_bounds(placement: &LabelPlacement, ratio: f64, size: LabelSize) -> Option<Bounds> {
    if !(0.0..=1.0).contains(&ratio) {
        return None;
    }
    let area = placement.area;
    let (width, height) = (size.width, size.height);
    let bounds = match placement.orientation {
        Orientation::Bottom => {
            let x = (area.left + ratio * area.width).round();
            Bounds::new(x - width / 2.0, placement.line + placement.offset, width, height)
        }
        Orientation::Top => {
            let x = (area.left + ratio * area.width).round();
            Bounds::new(
                x - width / 2.0,
                placement.line - placement.offset - height,
                width,
                height,
            )
        }
        Orientation::Left => {
            let y = (area.bottom() - ratio * area.height).round();
            Bounds::new(
                placement.line - placement.offset - width,
                y - height / 2.0,
                width,
                height,
            )
        }
        Orientation::Right => {
            let y = (area.bottom() - ratio * area.height).round();
            Bounds::new(placement.line + placement.offset, y - height / 2.0, width, height)
        }
    };
    Some(bounds)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TickKind {
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelBoundsCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub generation: u64,
}

/// Memo table of measured label boxes keyed by tick kind and index.
///
/// Entries carry the generation they were measured in; bumping the
/// generation turns every older entry into a miss.
#[derive(Debug, Default)]
pub struct LabelBoundsCache {
    entries: HashMap<(TickKind, usize), (u64, Option<Bounds>)>,
    generation: u64,
    hits: u64,
    misses: u64,
}

impl LabelBoundsCache {
    const MAX_ENTRIES: usize = 8192;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, kind: TickKind, index: usize) -> Option<Option<Bounds>> {
        let (generation, bounds) = self.entries.get(&(kind, index))?;
        if *generation != self.generation {
            return None;
        }
        self.hits = self.hits.saturating_add(1);
        Some(*bounds)
    }

    pub fn insert(&mut self, kind: TickKind, index: usize, bounds: Option<Bounds>) {
        self.misses = self.misses.saturating_add(1);
        if self.entries.len() >= Self::MAX_ENTRIES {
            self.entries.clear();
        }
        self.entries.insert((kind, index), (self.generation, bounds));
    }

    /// Cached box, measuring through `measure` on a miss.
    pub fn get_or_measure(
        &mut self,
        kind: TickKind,
        index: usize,
        measure: impl FnOnce() -> Option<Bounds>,
    ) -> Option<Bounds> {
        if let Some(bounds) = self.get(kind, index) {
            return bounds;
        }
        let bounds = measure();
        self.insert(kind, index, bounds);
        bounds
    }

    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn stats(&self) -> LabelBoundsCacheStats {
        LabelBoundsCacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.entries.len(),
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CharWidthMeasurer, LabelBoundsCache, LabelMeasurer, LabelPlacement, LabelSize, TickKind,
        label_bounds,
    };
    use crate::core::bounds::{Bounds, Orientation};

    #[test]
    fn char_width_measurer_scales_with_text() {
        let measurer = CharWidthMeasurer::default();
        assert_eq!(measurer.measure("Jan"), LabelSize::new(21.0, 14.0));
        assert_eq!(measurer.measure(""), LabelSize::new(0.0, 14.0));
    }

    #[test]
    fn bottom_labels_hang_below_the_line() {
        let placement = LabelPlacement {
            orientation: Orientation::Bottom,
            area: Bounds::new(10.0, 100.0, 200.0, 30.0),
            line: 100.0,
            offset: 5.5,
        };
        let bounds = label_bounds(&placement, 0.5, LabelSize::new(40.0, 12.0)).expect("bounds");
        assert_eq!(bounds, Bounds::new(90.0, 105.5, 40.0, 12.0));
    }

    #[test]
    fn vertical_labels_grow_upwards() {
        let placement = LabelPlacement {
            orientation: Orientation::Left,
            area: Bounds::new(0.0, 0.0, 30.0, 100.0),
            line: 30.0,
            offset: 0.0,
        };
        let low = label_bounds(&placement, 0.0, LabelSize::new(20.0, 10.0)).expect("low");
        let high = label_bounds(&placement, 1.0, LabelSize::new(20.0, 10.0)).expect("high");
        assert_eq!(low, Bounds::new(10.0, 95.0, 20.0, 10.0));
        assert_eq!(high, Bounds::new(10.0, -5.0, 20.0, 10.0));
    }

    #[test]
    fn out_of_range_ratio_has_no_box() {
        let placement = LabelPlacement::measuring(Orientation::Bottom, 100.0, 0.0);
        assert!(label_bounds(&placement, 1.2, LabelSize::new(10.0, 10.0)).is_none());
        assert!(label_bounds(&placement, -0.1, LabelSize::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn measuring_geometry_translates_into_final_geometry() {
        let measuring = LabelPlacement::measuring(Orientation::Right, 200.0, 3.0);
        let placed = LabelPlacement {
            orientation: Orientation::Right,
            area: Bounds::new(400.0, 20.0, 40.0, 200.0),
            line: 400.0,
            offset: 3.0,
        };
        let size = LabelSize::new(30.0, 12.0);
        let (dx, dy) = placed.origin();
        let translated = label_bounds(&measuring, 0.25, size)
            .expect("measuring")
            .translate(dx, dy);
        assert_eq!(Some(translated), label_bounds(&placed, 0.25, size));
    }

    #[test]
    fn generation_bump_turns_entries_into_misses() {
        let mut cache = LabelBoundsCache::new();
        let bounds = Some(Bounds::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(cache.get_or_measure(TickKind::Major, 0, || bounds), bounds);
        assert_eq!(cache.get_or_measure(TickKind::Major, 0, || None), bounds);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);

        cache.invalidate();
        assert!(cache.get(TickKind::Major, 0).is_none());
        assert_eq!(cache.get_or_measure(TickKind::Major, 0, || None), None);
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.stats().generation, 1);
    }
}
