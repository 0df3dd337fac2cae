use serde::{Deserialize, Serialize};

use crate::core::bounds::{Bounds, Orientation, Padding, SizeSpec, resolve_size};

/// Side of the axis line ticks extend to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TickPosition {
    Inside,
    Center,
    #[default]
    Outside,
}

impl TickPosition {
    /// Part of a tick of `length` that pushes the axis outwards.
    #[must_use]
    pub fn affecting_length(self, length: f64, enabled: bool) -> f64 {
        if !enabled {
            return 0.0;
        }
        match self {
            Self::Outside => length,
            Self::Center => length / 2.0,
            Self::Inside => 0.0,
        }
    }

    /// Start and end of a tick relative to the line, positive outwards.
    #[must_use]
    pub fn span(self, length: f64) -> (f64, f64) {
        match self {
            Self::Outside => (0.0, length),
            Self::Center => (-length / 2.0, length / 2.0),
            Self::Inside => (-length, 0.0),
        }
    }
}

/// Ticks that contribute to the axis size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickExtent {
    pub enabled: bool,
    pub length: f64,
    pub position: TickPosition,
}

/// Axis size across its line: the larger of the major and minor stacks,
/// each stack being its widest label plus the outward part of its ticks.
#[must_use]
pub fn calc_size(
    max_label_size: f64,
    max_minor_label_size: f64,
    ticks: TickExtent,
    minor_ticks: TickExtent,
) -> f64 {
    let major = max_label_size + ticks.position.affecting_length(ticks.length, ticks.enabled);
    let minor = max_minor_label_size
        + minor_ticks
            .position
            .affecting_length(minor_ticks.length, minor_ticks.enabled);
    major.max(minor)
}

/// Length along the axis once padding is removed.
#[must_use]
pub fn axis_length(parent: Bounds, padding: Padding, orientation: Orientation) -> f64 {
    if orientation.is_horizontal() {
        padding.tighten_width(parent.width)
    } else {
        padding.tighten_height(parent.height)
    }
}

/// Places an axis of `size` inside rounded `parent` bounds.
///
/// `size` is used when `width` is `Auto`; explicit widths resolve against the
/// parent's cross dimension.
#[must_use]
pub fn axis_pixel_bounds(
    parent: Bounds,
    padding: Padding,
    orientation: Orientation,
    width: SizeSpec,
    size: impl FnOnce(f64) -> f64,
) -> Bounds {
    let parent = parent.round();
    let length = axis_length(parent, padding, orientation);
    let cross = if orientation.is_horizontal() {
        parent.height
    } else {
        parent.width
    };
    let size = resolve_size(width, cross).unwrap_or_else(|| size(length));
    let pad = padding.resolve(parent);
    let bounds = match orientation {
        Orientation::Top => Bounds::new(parent.left + pad.left, parent.top + pad.top, length, size),
        Orientation::Right => Bounds::new(
            parent.left + parent.width - size - pad.right,
            parent.top + pad.top,
            size,
            length,
        ),
        Orientation::Bottom => Bounds::new(
            parent.left + pad.left,
            parent.top + parent.height - size - pad.bottom,
            length,
            size,
        ),
        Orientation::Left => Bounds::new(parent.left + pad.left, parent.top + pad.top, size, length),
    };
    bounds.round()
}

/// Cross coordinate of the axis line inside its pixel bounds.
#[must_use]
pub fn line_coordinate(bounds: Bounds, orientation: Orientation) -> f64 {
    match orientation {
        Orientation::Top => bounds.bottom(),
        Orientation::Right => bounds.left,
        Orientation::Bottom => bounds.top,
        Orientation::Left => bounds.right(),
    }
}

/// Unit vector pointing away from the plot for this orientation.
#[must_use]
pub fn outward(orientation: Orientation) -> (f64, f64) {
    match orientation {
        Orientation::Top => (0.0, -1.0),
        Orientation::Right => (1.0, 0.0),
        Orientation::Bottom => (0.0, 1.0),
        Orientation::Left => (-1.0, 0.0),
    }
}
