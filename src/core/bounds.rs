use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ChartError, ChartResult};

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    #[must_use]
    pub fn right(self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(self) -> f64 {
        self.top + self.height
    }

    #[must_use]
    pub fn round(self) -> Self {
        Self::new(
            self.left.round(),
            self.top.round(),
            self.width.round(),
            self.height.round(),
        )
    }

    #[must_use]
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self::new(self.left + dx, self.top + dy, self.width, self.height)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }

    /// Strict axis-aligned overlap. A missing neighbor never intersects.
    #[must_use]
    pub fn intersects(self, other: Option<&Bounds>) -> bool {
        let Some(other) = other else {
            return false;
        };
        self.left < other.right()
            && self.right() > other.left
            && self.top < other.bottom()
            && self.bottom() > other.top
    }

    #[must_use]
    pub fn contains_point(self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }

    /// Extent perpendicular to an axis with the given orientation.
    #[must_use]
    pub fn extent_across(self, orientation: Orientation) -> f64 {
        if orientation.is_horizontal() {
            self.height
        } else {
            self.width
        }
    }
}

/// Side of a rectangle a docked element occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Top,
    Right,
    #[default]
    Bottom,
    Left,
}

impl Orientation {
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

/// Declarative size: fixed pixels, a percentage of the container, or
/// content-driven.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SizeSpec {
    Pixels(f64),
    Percent(f64),
    #[default]
    Auto,
}

impl SizeSpec {
    #[must_use]
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl FromStr for SizeSpec {
    type Err = ChartError;

    fn from_str(raw: &str) -> ChartResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        if let Some(percent) = trimmed.strip_suffix('%') {
            let value = percent.trim().parse::<f64>().map_err(|_| {
                ChartError::InvalidConfig(format!("invalid percentage size `{raw}`"))
            })?;
            if !value.is_finite() {
                return Err(ChartError::InvalidConfig(format!(
                    "percentage size `{raw}` must be finite"
                )));
            }
            return Ok(Self::Percent(value));
        }
        let pixels = trimmed
            .strip_suffix("px")
            .unwrap_or(trimmed)
            .trim()
            .parse::<f64>()
            .map_err(|_| ChartError::InvalidConfig(format!("invalid size `{raw}`")))?;
        if !pixels.is_finite() {
            return Err(ChartError::InvalidConfig(format!(
                "size `{raw}` must be finite"
            )));
        }
        Ok(Self::Pixels(pixels))
    }
}

impl fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pixels(value) => write!(f, "{value}"),
            Self::Percent(value) => write!(f, "{value}%"),
            Self::Auto => f.write_str("auto"),
        }
    }
}

impl Serialize for SizeSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Pixels(value) => serializer.serialize_f64(*value),
            Self::Percent(_) => serializer.serialize_str(&self.to_string()),
            Self::Auto => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for SizeSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawSize {
            Number(f64),
            Text(String),
        }

        match Option::<RawSize>::deserialize(deserializer)? {
            None => Ok(Self::Auto),
            Some(RawSize::Number(value)) => Ok(Self::Pixels(value)),
            Some(RawSize::Text(text)) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Resolves `spec` against a container dimension. `Auto` defers to content
/// measurement and yields `None`.
#[must_use]
pub fn resolve_size(spec: SizeSpec, container: f64) -> Option<f64> {
    match spec {
        SizeSpec::Pixels(value) => Some(value),
        SizeSpec::Percent(percent) => Some(container * percent / 100.0),
        SizeSpec::Auto => None,
    }
}

/// Same as [`resolve_size`] with `Auto` treated as zero, the way paddings and
/// offsets resolve.
#[must_use]
pub fn resolve_size_or_zero(spec: SizeSpec, container: f64) -> f64 {
    resolve_size(spec, container).unwrap_or(0.0)
}

/// Snaps a coordinate so a stroke of `thickness` lands on whole device pixels.
///
/// Odd thicknesses center on half pixels, even ones on whole pixels.
#[must_use]
pub fn apply_pixel_shift(value: f64, thickness: f64) -> f64 {
    let shift = if (thickness.round() as i64) & 1 == 1 {
        0.5
    } else {
        0.0
    };
    if value - value.floor() >= 0.5 {
        value.ceil() - shift
    } else {
        value.floor() + shift
    }
}

/// Signed shift for the `index`-th of `count` items: items before the
/// midpoint move by `+value`, the rest by `-value`.
#[must_use]
pub fn pixel_shift_for_index(index: usize, count: usize, value: f64) -> f64 {
    if (index as f64) < count as f64 / 2.0 {
        value
    } else {
        -value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Padding {
    #[serde(default)]
    pub top: SizeSpec,
    #[serde(default)]
    pub right: SizeSpec,
    #[serde(default)]
    pub bottom: SizeSpec,
    #[serde(default)]
    pub left: SizeSpec,
}

/// Padding resolved against concrete bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolvedPadding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: SizeSpec::Pixels(value),
            right: SizeSpec::Pixels(value),
            bottom: SizeSpec::Pixels(value),
            left: SizeSpec::Pixels(value),
        }
    }

    #[must_use]
    pub fn resolve(self, bounds: Bounds) -> ResolvedPadding {
        ResolvedPadding {
            top: resolve_size_or_zero(self.top, bounds.height),
            right: resolve_size_or_zero(self.right, bounds.width),
            bottom: resolve_size_or_zero(self.bottom, bounds.height),
            left: resolve_size_or_zero(self.left, bounds.width),
        }
    }

    #[must_use]
    pub fn tighten_width(self, width: f64) -> f64 {
        width - resolve_size_or_zero(self.left, width) - resolve_size_or_zero(self.right, width)
    }

    #[must_use]
    pub fn tighten_height(self, height: f64) -> f64 {
        height
            - resolve_size_or_zero(self.top, height)
            - resolve_size_or_zero(self.bottom, height)
    }
}

/// Parent bounds minus the space taken by an element docked on
/// `orientation`, padding included.
#[must_use]
pub fn remaining_bounds(
    parent: Bounds,
    occupied: Bounds,
    padding: Padding,
    orientation: Orientation,
) -> Bounds {
    let mut remaining = parent;
    let height_offset = parent.height - padding.tighten_height(parent.height) + occupied.height;
    let width_offset = parent.width - padding.tighten_width(parent.width) + occupied.width;
    match orientation {
        Orientation::Top => {
            remaining.height -= height_offset;
            remaining.top += height_offset;
        }
        Orientation::Right => remaining.width -= width_offset,
        Orientation::Bottom => remaining.height -= height_offset,
        Orientation::Left => {
            remaining.width -= width_offset;
            remaining.left += width_offset;
        }
    }
    remaining
}

#[cfg(test)]
mod tests {
    use super::{
        Bounds, Orientation, Padding, SizeSpec, apply_pixel_shift, pixel_shift_for_index,
        remaining_bounds, resolve_size,
    };

    #[test]
    fn intersection_is_strict_and_ignores_missing_neighbor() {
        let a = Bounds::new(0.0, 0.0, 40.0, 10.0);
        let touching = Bounds::new(40.0, 0.0, 40.0, 10.0);
        let overlapping = Bounds::new(30.0, 0.0, 40.0, 10.0);
        assert!(!a.intersects(Some(&touching)));
        assert!(a.intersects(Some(&overlapping)));
        assert!(!a.intersects(None));
    }

    #[test]
    fn size_spec_parses_percent_pixels_and_auto() {
        assert_eq!("25%".parse::<SizeSpec>().expect("percent"), SizeSpec::Percent(25.0));
        assert_eq!("12px".parse::<SizeSpec>().expect("px"), SizeSpec::Pixels(12.0));
        assert_eq!("auto".parse::<SizeSpec>().expect("auto"), SizeSpec::Auto);
        assert!("wide".parse::<SizeSpec>().is_err());
    }

    #[test]
    fn size_spec_deserializes_from_json_variants() {
        let values: Vec<SizeSpec> =
            serde_json::from_str(r#"[10, "50%", null, "auto"]"#).expect("sizes");
        assert_eq!(
            values,
            vec![
                SizeSpec::Pixels(10.0),
                SizeSpec::Percent(50.0),
                SizeSpec::Auto,
                SizeSpec::Auto
            ]
        );
    }

    #[test]
    fn resolve_size_handles_each_variant() {
        assert_eq!(resolve_size(SizeSpec::Pixels(30.0), 500.0), Some(30.0));
        assert_eq!(resolve_size(SizeSpec::Percent(10.0), 500.0), Some(50.0));
        assert_eq!(resolve_size(SizeSpec::Auto, 500.0), None);
    }

    #[test]
    fn pixel_shift_centers_odd_strokes_on_half_pixels() {
        assert!((apply_pixel_shift(10.2, 1.0) - 10.5).abs() <= 1e-12);
        assert!((apply_pixel_shift(10.7, 1.0) - 10.5).abs() <= 1e-12);
        assert!((apply_pixel_shift(10.2, 2.0) - 10.0).abs() <= 1e-12);
        assert!((apply_pixel_shift(10.7, 2.0) - 11.0).abs() <= 1e-12);
    }

    #[test]
    fn pixel_shift_direction_flips_at_midpoint() {
        assert_eq!(pixel_shift_for_index(0, 4, 0.5), 0.5);
        assert_eq!(pixel_shift_for_index(1, 4, 0.5), 0.5);
        assert_eq!(pixel_shift_for_index(2, 4, 0.5), -0.5);
        assert_eq!(pixel_shift_for_index(3, 4, 0.5), -0.5);
    }

    #[test]
    fn remaining_bounds_subtracts_docked_side() {
        let parent = Bounds::new(0.0, 0.0, 400.0, 300.0);
        let padding = Padding::uniform(5.0);

        let top = remaining_bounds(parent, Bounds::new(5.0, 5.0, 390.0, 20.0), padding, Orientation::Top);
        assert_eq!(top, Bounds::new(0.0, 30.0, 400.0, 270.0));

        let left = remaining_bounds(parent, Bounds::new(5.0, 5.0, 30.0, 290.0), padding, Orientation::Left);
        assert_eq!(left, Bounds::new(40.0, 0.0, 360.0, 300.0));

        let bottom = remaining_bounds(parent, Bounds::new(5.0, 275.0, 390.0, 20.0), padding, Orientation::Bottom);
        assert_eq!(bottom, Bounds::new(0.0, 0.0, 400.0, 270.0));
    }
}
