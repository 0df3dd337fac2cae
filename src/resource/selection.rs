use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Pointer outcome on an activity bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityEvent {
    Hover {
        resource: usize,
        activity: usize,
        global_index: usize,
    },
    Click {
        resource: usize,
        activity: usize,
        global_index: usize,
        selected: bool,
    },
}

/// Hovered and selected activities, by global activity index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivitySelection {
    hovered: Option<usize>,
    selected: BTreeSet<usize>,
}

impl ActivitySelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    #[must_use]
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Moves the hover to `index`. Returns whether anything changed.
    pub fn hover(&mut self, index: usize) -> bool {
        self.hovered.replace(index) != Some(index)
    }

    pub fn unhover(&mut self) -> bool {
        self.hovered.take().is_some()
    }

    /// Selects `index`, dropping the rest of the selection unless
    /// `keep_existing` is set.
    pub fn select(&mut self, index: usize, keep_existing: bool) -> bool {
        if keep_existing {
            return self.selected.insert(index);
        }
        if self.selected.len() == 1 && self.selected.contains(&index) {
            return false;
        }
        self.selected.clear();
        self.selected.insert(index);
        true
    }

    /// Drops `index` from the selection, or everything for `None`.
    pub fn unselect(&mut self, index: Option<usize>) -> bool {
        match index {
            Some(index) => self.selected.remove(&index),
            None => {
                let changed = !self.selected.is_empty();
                self.selected.clear();
                changed
            }
        }
    }

    /// Forgets indices at or beyond `total`.
    pub fn prune(&mut self, total: usize) -> bool {
        let before = self.selected.len();
        self.selected.retain(|index| *index < total);
        let hover_dropped = self.hovered.is_some_and(|index| index >= total);
        if hover_dropped {
            self.hovered = None;
        }
        hover_dropped || self.selected.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::{ActivityEvent, ActivitySelection};

    #[test]
    fn hover_moves_between_activities() {
        let mut selection = ActivitySelection::new();
        assert!(selection.hover(3));
        assert!(!selection.hover(3));
        assert!(selection.hover(1));
        assert_eq!(selection.hovered(), Some(1));
        assert!(selection.unhover());
        assert!(!selection.unhover());
    }

    #[test]
    fn select_replaces_unless_kept() {
        let mut selection = ActivitySelection::new();
        assert!(selection.select(2, false));
        assert!(!selection.select(2, false));
        assert!(selection.select(4, true));
        assert_eq!(selection.selected().collect::<Vec<_>>(), vec![2, 4]);
        assert!(selection.select(5, false));
        assert_eq!(selection.selected().collect::<Vec<_>>(), vec![5]);

        assert!(!selection.unselect(Some(2)));
        assert!(selection.unselect(Some(5)));
        selection.select(1, true);
        selection.select(6, true);
        assert!(selection.unselect(None));
        assert!(!selection.unselect(None));
    }

    #[test]
    fn prune_drops_stale_indices() {
        let mut selection = ActivitySelection::new();
        selection.select(1, true);
        selection.select(7, true);
        selection.hover(9);
        assert!(selection.prune(5));
        assert_eq!(selection.selected().collect::<Vec<_>>(), vec![1]);
        assert_eq!(selection.hovered(), None);
        assert!(!selection.prune(5));
    }

    #[test]
    fn events_serialize_with_a_type_tag() {
        let event = ActivityEvent::Click {
            resource: 1,
            activity: 0,
            global_index: 3,
            selected: true,
        };
        let json = serde_json::to_value(event).expect("json");
        assert_eq!(json["type"], "click");
        assert_eq!(json["global_index"], 3);
    }
}
