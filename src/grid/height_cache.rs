/// Cumulative row bottoms for `O(log n)` hit-testing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowHeightCache {
    bottoms: Vec<f64>,
}

impl RowHeightCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache over already accumulated bottoms; non-monotonic input is
    /// flattened so every bottom is at least the previous one.
    #[must_use]
    pub fn from_bottoms(bottoms: impl IntoIterator<Item = f64>) -> Self {
        let mut cache = Self::new();
        let mut last = 0.0f64;
        for bottom in bottoms {
            let bottom = if bottom.is_finite() { bottom.max(last) } else { last };
            cache.bottoms.push(bottom);
            last = bottom;
        }
        cache
    }

    /// Replaces the cache with the running sum of `heights`. Negative or
    /// non-finite heights count as zero.
    pub fn rebuild(&mut self, heights: impl IntoIterator<Item = f64>) {
        self.bottoms.clear();
        let mut total = 0.0;
        for height in heights {
            if height.is_finite() && height > 0.0 {
                total += height;
            }
            self.bottoms.push(total);
        }
    }

    /// Appends one row below the current last one.
    pub fn push(&mut self, height: f64) {
        let height = if height.is_finite() { height.max(0.0) } else { 0.0 };
        self.bottoms.push(self.total_height() + height);
    }

    pub fn clear(&mut self) {
        self.bottoms.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bottoms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bottoms.is_empty()
    }

    #[must_use]
    pub fn cumulative_bottoms(&self) -> &[f64] {
        &self.bottoms
    }

    #[must_use]
    pub fn heights(&self) -> Vec<f64> {
        let mut top = 0.0;
        self.bottoms
            .iter()
            .map(|bottom| {
                let height = bottom - top;
                top = *bottom;
                height
            })
            .collect()
    }

    #[must_use]
    pub fn total_height(&self) -> f64 {
        self.bottoms.last().copied().unwrap_or(0.0)
    }

    /// Row whose span contains `y`: the first row with `bottom >= y`.
    ///
    /// A `y` exactly on a boundary belongs to the row ending there. Anything
    /// outside `[0, total_height]` hits no row.
    #[must_use]
    pub fn row_at(&self, y: f64) -> Option<usize> {
        if self.bottoms.is_empty() || y.is_nan() || y < 0.0 || y > self.total_height() {
            return None;
        }
        let index = self.bottoms.partition_point(|bottom| *bottom < y);
        (index < self.bottoms.len()).then_some(index)
    }

    /// `(top, bottom)` of a row; `None` for stale indices.
    #[must_use]
    pub fn row_span(&self, index: usize) -> Option<(f64, f64)> {
        let bottom = *self.bottoms.get(index)?;
        let top = if index == 0 { 0.0 } else { self.bottoms[index - 1] };
        Some((top, bottom))
    }

    /// First row whose bottom lies strictly below `offset`, with the distance
    /// from that row's top to `offset`.
    #[must_use]
    pub fn row_at_offset(&self, offset: f64) -> Option<(usize, f64)> {
        if self.bottoms.is_empty() || !offset.is_finite() {
            return None;
        }
        let index = self.bottoms.partition_point(|bottom| *bottom <= offset.max(0.0));
        let (top, _) = self.row_span(index)?;
        Some((index, offset.max(0.0) - top))
    }
}
