use crate::core::data::DataSource;

/// Running totals of activities per resource.
///
/// Entry `i` is the number of activities in resources `0..=i`, so a global
/// activity index belongs to the first resource whose total exceeds it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivityRegistry {
    cumulative: Vec<usize>,
}

impl ActivityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_counts(counts: impl IntoIterator<Item = usize>) -> Self {
        let mut registry = Self::new();
        for count in counts {
            registry.push(count);
        }
        registry
    }

    pub fn push(&mut self, count: usize) {
        let total = self.total().saturating_add(count);
        self.cumulative.push(total);
    }

    pub fn clear(&mut self) {
        self.cumulative.clear();
    }

    #[must_use]
    pub fn cumulative(&self) -> &[usize] {
        &self.cumulative
    }

    #[must_use]
    pub fn resources(&self) -> usize {
        self.cumulative.len()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.cumulative.last().copied().unwrap_or(0)
    }

    /// `(resource, activity within resource)` for a global activity index.
    /// Resources without activities are never returned.
    #[must_use]
    pub fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let resource = self.cumulative.partition_point(|total| *total <= index);
        if resource >= self.cumulative.len() {
            return None;
        }
        let cut_off = if resource == 0 {
            0
        } else {
            self.cumulative[resource - 1]
        };
        Some((resource, index - cut_off))
    }

    /// Global index of `activity` inside `resource`; `None` when the
    /// resource has no such activity.
    #[must_use]
    pub fn global_index(&self, resource: usize, activity: usize) -> Option<usize> {
        let total = *self.cumulative.get(resource)?;
        let cut_off = resource
            .checked_sub(1)
            .map_or(0, |previous| self.cumulative[previous]);
        let index = cut_off.checked_add(activity)?;
        (index < total).then_some(index)
    }
}

/// Read-only cursor over every activity of a resource chart.
///
/// Only positions are available; row values live in the resources
/// themselves, so `get` and `meta` are unsupported.
#[derive(Debug, Clone)]
pub struct ActivityIterator<'a> {
    registry: &'a ActivityRegistry,
    current: Option<usize>,
    position: Option<(usize, usize)>,
}

impl<'a> ActivityIterator<'a> {
    #[must_use]
    pub fn new(registry: &'a ActivityRegistry) -> Self {
        Self {
            registry,
            current: None,
            position: None,
        }
    }

    #[must_use]
    pub fn resource_index(&self) -> Option<usize> {
        self.position.map(|(resource, _)| resource)
    }

    #[must_use]
    pub fn activity_index(&self) -> Option<usize> {
        self.position.map(|(_, activity)| activity)
    }
}

impl DataSource for ActivityIterator<'_> {
    fn kind(&self) -> &'static str {
        "ActivityIterator"
    }

    fn reset(&mut self) {
        self.current = None;
        self.position = None;
    }

    fn advance(&mut self) -> bool {
        let next = self.current.map_or(0, |index| index.saturating_add(1));
        self.current = Some(next);
        self.position = self.registry.locate(next);
        self.position.is_some()
    }

    fn select(&mut self, index: usize) -> bool {
        match self.registry.locate(index) {
            Some(position) => {
                self.current = Some(index);
                self.position = Some(position);
                true
            }
            None => false,
        }
    }

    fn index(&self) -> Option<usize> {
        self.current.filter(|_| self.position.is_some())
    }

    fn rows_count(&self) -> usize {
        self.registry.total()
    }
}

#[cfg(test)]
mod tests {
    use super::{ActivityIterator, ActivityRegistry};
    use crate::core::data::DataSource;
    use crate::error::ChartError;

    #[test]
    fn empty_resources_are_skipped() {
        let registry = ActivityRegistry::from_counts([2, 0, 0, 3]);
        assert_eq!(registry.cumulative(), &[2, 2, 2, 5]);
        assert_eq!(registry.locate(1), Some((0, 1)));
        assert_eq!(registry.locate(2), Some((3, 0)));
        assert_eq!(registry.locate(4), Some((3, 2)));
        assert_eq!(registry.locate(5), None);

        assert_eq!(registry.global_index(0, 1), Some(1));
        assert_eq!(registry.global_index(3, 2), Some(4));
        assert_eq!(registry.global_index(1, 0), None);
        assert_eq!(registry.global_index(3, 3), None);
        assert_eq!(registry.global_index(7, 0), None);
    }

    #[test]
    fn iterator_walks_every_activity() {
        let registry = ActivityRegistry::from_counts([1, 0, 2]);
        let mut iterator = ActivityIterator::new(&registry);
        let mut seen = Vec::new();
        while iterator.advance() {
            seen.push((
                iterator.resource_index().expect("resource"),
                iterator.activity_index().expect("activity"),
            ));
        }
        assert_eq!(seen, vec![(0, 0), (2, 0), (2, 1)]);
        assert_eq!(iterator.index(), None);
        assert_eq!(iterator.rows_count(), 3);

        iterator.reset();
        assert!(iterator.select(1));
        assert_eq!(iterator.index(), Some(1));
        assert!(!iterator.select(3));
        assert_eq!(iterator.index(), Some(1));
    }

    #[test]
    fn reading_values_is_reported_as_unsupported() {
        let registry = ActivityRegistry::from_counts([1]);
        let mut iterator = ActivityIterator::new(&registry);
        iterator.advance();
        let error = iterator.get("name").expect_err("no field access");
        assert!(matches!(
            error,
            ChartError::UnsupportedOperation {
                kind: "ActivityIterator",
                operation: "get"
            }
        ));
        assert_eq!(error.to_string(), "ActivityIterator does not support get()");
        assert!(iterator.set_meta("selected", serde_json::json!(true)).is_err());
    }
}
