mod primitives;
mod recording_surface;

pub use primitives::{Color, Fill, Stroke, TextHAlign, TextPrimitive};
pub use recording_surface::{LayerRecord, PathRecord, PathSegment, RecordingSurface, SurfaceCommand};

use serde::{Deserialize, Serialize};

use crate::core::bounds::Bounds;
use crate::error::ChartResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathId(pub u32);

/// Retained-mode vector backend consumed by every drawable element.
///
/// Elements only issue commands from inside `draw()` after their geometry is
/// resolved; nothing is ever read back from the surface.
pub trait VectorSurface {
    fn create_layer(&mut self, parent: Option<LayerId>) -> LayerId;

    /// Detaches a layer (and everything below it) from its parent.
    fn remove_layer(&mut self, layer: LayerId);

    /// Re-attaches a layer under `parent`.
    fn set_parent(&mut self, layer: LayerId, parent: Option<LayerId>);

    fn create_path(&mut self, layer: LayerId) -> PathId;

    fn create_rect(&mut self, layer: LayerId, bounds: Bounds) -> PathId;

    fn set_clip(&mut self, layer: LayerId, clip: Option<Bounds>);

    fn set_z_index(&mut self, layer: LayerId, z_index: i32);

    fn move_to(&mut self, path: PathId, x: f64, y: f64);

    fn line_to(&mut self, path: PathId, x: f64, y: f64);

    fn close(&mut self, path: PathId);

    fn clear(&mut self, path: PathId);

    fn fill(&mut self, path: PathId, fill: Option<Fill>) -> ChartResult<()>;

    fn stroke(&mut self, path: PathId, stroke: Option<Stroke>) -> ChartResult<()>;

    fn draw_text(&mut self, layer: LayerId, text: TextPrimitive) -> ChartResult<()>;

    /// Drops every text previously drawn on `layer`.
    fn clear_texts(&mut self, layer: LayerId);

    /// Appends a closed rectangle sub-path.
    fn append_rect(&mut self, path: PathId, bounds: Bounds) {
        self.move_to(path, bounds.left, bounds.top);
        self.line_to(path, bounds.right(), bounds.top);
        self.line_to(path, bounds.right(), bounds.bottom());
        self.line_to(path, bounds.left, bounds.bottom());
        self.close(path);
    }
}
