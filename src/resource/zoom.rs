use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{LevelSpecConfig, ZoomLevelConfig};
use crate::core::time_scale::TimeUnit;
use crate::error::{ErrorCode, report_error};

pub const DEFAULT_UNIT_PIX_SIZE: f64 = 50.0;

/// Header row of a normalized zoom level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub unit: TimeUnit,
    pub count: u32,
    pub formats: Vec<String>,
    pub height: Option<f64>,
}

impl LevelSpec {
    fn normalize(config: &LevelSpecConfig) -> Self {
        Self {
            unit: config.unit.unwrap_or(TimeUnit::Day),
            count: natural_or(config.count, 1),
            formats: config.formats.clone(),
            height: config
                .height
                .filter(|height| height.is_finite() && *height >= 0.0),
        }
    }
}

/// Scale unit, count and pixel size plus the header rows to show with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomLevel {
    pub id: Option<String>,
    pub unit: TimeUnit,
    pub count: u32,
    pub unit_pix_size: f64,
    pub levels: Vec<LevelSpec>,
}

impl ZoomLevel {
    /// `None` when the definition has no header levels.
    #[must_use]
    pub fn normalize(config: &ZoomLevelConfig) -> Option<Self> {
        let levels: Vec<LevelSpec> = config.levels.iter().map(LevelSpec::normalize).collect();
        let first = levels.first()?;
        let unit_pix_size = config
            .unit_pix_size
            .filter(|size| size.is_finite() && *size > 0.0)
            .unwrap_or(DEFAULT_UNIT_PIX_SIZE);
        Some(Self {
            id: config.id.clone().filter(|id| !id.is_empty()),
            unit: config.unit.unwrap_or(first.unit),
            count: natural_or(config.count, first.count),
            unit_pix_size,
            levels,
        })
    }
}

fn natural_or(value: Option<u32>, fallback: u32) -> u32 {
    match value {
        Some(0) | None => fallback.max(1),
        Some(value) => value,
    }
}

/// Zoom level selector: by position or by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZoomLevelRef {
    Index(i64),
    Id(String),
}

impl From<usize> for ZoomLevelRef {
    fn from(index: usize) -> Self {
        Self::Index(i64::try_from(index).unwrap_or(i64::MAX))
    }
}

impl From<&str> for ZoomLevelRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_owned())
    }
}

/// Normalized zoom levels with the current selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZoomLevels {
    levels: Vec<ZoomLevel>,
    current: usize,
}

impl ZoomLevels {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the set with the valid entries of `configs`. Returns `false`
    /// and keeps the previous set when none is valid.
    pub fn replace(&mut self, configs: &[ZoomLevelConfig]) -> bool {
        let mut levels = Vec::with_capacity(configs.len());
        for (index, config) in configs.iter().enumerate() {
            match ZoomLevel::normalize(config) {
                Some(level) => levels.push(level),
                None => warn!(index, "dropping zoom level without header levels"),
            }
        }
        if levels.is_empty() {
            report_error(ErrorCode::InvalidZoomLevels, "resource_chart");
            return false;
        }
        debug!(count = levels.len(), "zoom levels replaced");
        self.levels = levels;
        true
    }

    #[must_use]
    pub fn levels(&self) -> &[ZoomLevel] {
        &self.levels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Unknown ids resolve to nothing; numeric indices clamp into range.
    #[must_use]
    pub fn resolve(&self, reference: &ZoomLevelRef) -> Option<usize> {
        if self.levels.is_empty() {
            return None;
        }
        match reference {
            ZoomLevelRef::Id(id) => self
                .levels
                .iter()
                .position(|level| level.id.as_deref() == Some(id.as_str())),
            ZoomLevelRef::Index(index) => {
                let last = self.levels.len() - 1;
                Some(usize::try_from(*index).map_or(0, |index| index.min(last)))
            }
        }
    }

    /// Selects a level, returning it when the reference resolved.
    pub fn select(&mut self, reference: &ZoomLevelRef) -> Option<&ZoomLevel> {
        let index = self.resolve(reference)?;
        self.current = index;
        self.levels.get(index)
    }

    #[must_use]
    pub fn current(&self) -> Option<&ZoomLevel> {
        self.levels.get(self.current)
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Id of the current level when it has one, its index otherwise.
    #[must_use]
    pub fn current_ref(&self) -> ZoomLevelRef {
        match self.current().and_then(|level| level.id.clone()) {
            Some(id) => ZoomLevelRef::Id(id),
            None => ZoomLevelRef::from(self.current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_UNIT_PIX_SIZE, ZoomLevel, ZoomLevelRef, ZoomLevels};
    use crate::api::{LevelSpecConfig, ZoomLevelConfig};
    use crate::core::time_scale::TimeUnit;

    fn week_levels() -> ZoomLevelConfig {
        ZoomLevelConfig::new(vec![
            LevelSpecConfig {
                unit: Some(TimeUnit::Week),
                count: Some(0),
                ..LevelSpecConfig::default()
            },
            LevelSpecConfig::new(TimeUnit::Month),
        ])
    }

    #[test]
    fn normalization_defaults_to_the_first_level() {
        let level = ZoomLevel::normalize(&week_levels()).expect("level");
        assert_eq!(level.unit, TimeUnit::Week);
        assert_eq!(level.count, 1);
        assert_eq!(level.unit_pix_size, DEFAULT_UNIT_PIX_SIZE);
        assert_eq!(level.levels[0].count, 1);
        assert!(level.id.is_none());
        assert!(ZoomLevel::normalize(&ZoomLevelConfig::default()).is_none());
    }

    #[test]
    fn invalid_entries_are_dropped() {
        let mut levels = ZoomLevels::new();
        assert!(levels.replace(&[ZoomLevelConfig::default(), week_levels()]));
        assert_eq!(levels.len(), 1);
        assert!(!levels.replace(&[ZoomLevelConfig::default()]));
        assert_eq!(levels.len(), 1);
    }

    #[test]
    fn references_resolve_by_id_or_clamped_index() {
        let mut levels = ZoomLevels::new();
        levels.replace(&[
            week_levels().with_id("weeks"),
            week_levels(),
            week_levels().with_id("months"),
        ]);
        assert_eq!(levels.resolve(&ZoomLevelRef::from("months")), Some(2));
        assert_eq!(levels.resolve(&ZoomLevelRef::from("years")), None);
        assert_eq!(levels.resolve(&ZoomLevelRef::Index(-3)), Some(0));
        assert_eq!(levels.resolve(&ZoomLevelRef::Index(99)), Some(2));

        levels.select(&ZoomLevelRef::Index(1));
        assert_eq!(levels.current_ref(), ZoomLevelRef::Index(1));
        levels.select(&ZoomLevelRef::from("weeks"));
        assert_eq!(levels.current_ref(), ZoomLevelRef::from("weeks"));
    }
}
