use crate::core::bounds::{Bounds, apply_pixel_shift};
use crate::error::ChartResult;
use crate::render::{Fill, LayerId, PathId, Stroke, VectorSurface};

/// Fills used for row bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowFills {
    pub odd: Fill,
    pub even: Fill,
    pub selected: Fill,
    pub row_stroke: Stroke,
}

/// Accumulates row rectangles into a handful of paths so a whole window of
/// rows costs three fill calls and one stroke call.
#[derive(Debug, Default)]
pub struct RowFillPaths {
    odd: Option<PathId>,
    even: Option<PathId>,
    selected: Option<PathId>,
    row_stroke: Option<PathId>,
    rows: usize,
}

impl RowFillPaths {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn paths(&mut self, surface: &mut dyn VectorSurface, layer: LayerId) -> [PathId; 4] {
        [
            *self.odd.get_or_insert_with(|| surface.create_path(layer)),
            *self.even.get_or_insert_with(|| surface.create_path(layer)),
            *self.selected.get_or_insert_with(|| surface.create_path(layer)),
            *self.row_stroke.get_or_insert_with(|| surface.create_path(layer)),
        ]
    }

    /// Clears every accumulator, creating the paths on first use.
    pub fn begin(&mut self, surface: &mut dyn VectorSurface, layer: LayerId) {
        for path in self.paths(surface, layer) {
            surface.clear(path);
        }
        self.rows = 0;
    }

    /// Adds a row band. Rows are numbered from one for display, so index 0
    /// is the first odd row.
    pub fn append_row(&mut self, surface: &mut dyn VectorSurface, index: usize, band: Bounds) {
        let path = if index % 2 == 1 { self.even } else { self.odd };
        if let Some(path) = path {
            surface.append_rect(path, band);
            self.rows += 1;
        }
    }

    /// Horizontal separator under a row.
    pub fn append_separator(&mut self, surface: &mut dyn VectorSurface, left: f64, right: f64, y: f64, thickness: f64) {
        if let Some(path) = self.row_stroke {
            let y = apply_pixel_shift(y, thickness);
            surface.move_to(path, left, y);
            surface.line_to(path, right, y);
        }
    }

    /// Restarts only the selection accumulator.
    pub fn begin_selection(&mut self, surface: &mut dyn VectorSurface, layer: LayerId) {
        let path = *self.selected.get_or_insert_with(|| surface.create_path(layer));
        surface.clear(path);
    }

    pub fn append_selected(&mut self, surface: &mut dyn VectorSurface, band: Bounds) {
        if let Some(path) = self.selected {
            surface.append_rect(path, band);
        }
    }

    pub fn finish_selection(&self, surface: &mut dyn VectorSurface, fills: &RowFills) -> ChartResult<()> {
        match self.selected {
            Some(path) => surface.fill(path, Some(fills.selected)),
            None => Ok(()),
        }
    }

    /// Issues the batched fill and stroke calls.
    pub fn finish(&self, surface: &mut dyn VectorSurface, fills: &RowFills) -> ChartResult<()> {
        if let Some(path) = self.odd {
            surface.fill(path, Some(fills.odd))?;
        }
        if let Some(path) = self.even {
            surface.fill(path, Some(fills.even))?;
        }
        self.finish_selection(surface, fills)?;
        if let Some(path) = self.row_stroke {
            surface.stroke(path, Some(fills.row_stroke))?;
        }
        Ok(())
    }

    /// Rows appended since the last [`RowFillPaths::begin`].
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn selected_path(&self) -> Option<PathId> {
        self.selected
    }

    #[must_use]
    pub fn band_paths(&self) -> (Option<PathId>, Option<PathId>) {
        (self.odd, self.even)
    }
}
