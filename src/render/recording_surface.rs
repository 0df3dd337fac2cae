use indexmap::IndexMap;

use crate::core::bounds::Bounds;
use crate::error::{ChartError, ChartResult};
use crate::render::{Fill, LayerId, PathId, Stroke, TextPrimitive, VectorSurface};

/// One command as received by the surface, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    CreateLayer(LayerId),
    RemoveLayer(LayerId),
    SetParent(LayerId, Option<LayerId>),
    CreatePath(PathId),
    SetClip(LayerId, Option<Bounds>),
    SetZIndex(LayerId, i32),
    Clear(PathId),
    Fill(PathId),
    Stroke(PathId),
    DrawText(LayerId),
    ClearTexts(LayerId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Close,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerRecord {
    pub parent: Option<LayerId>,
    pub attached: bool,
    pub z_index: i32,
    pub clip: Option<Bounds>,
    pub texts: Vec<TextPrimitive>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathRecord {
    pub layer: LayerId,
    pub segments: Vec<PathSegment>,
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
}

impl PathRecord {
    /// Number of closed sub-paths, i.e. rectangles for row bands.
    #[must_use]
    pub fn closed_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, PathSegment::Close))
            .count()
    }
}

/// Headless surface used by tests and hosts without a graphics backend.
///
/// It keeps the retained scene and the command log so tests can assert both
/// the resulting geometry and how many calls produced it.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    layers: IndexMap<LayerId, LayerRecord>,
    paths: IndexMap<PathId, PathRecord>,
    commands: Vec<SurfaceCommand>,
    next_layer: u32,
    next_path: u32,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&LayerRecord> {
        self.layers.get(&id)
    }

    #[must_use]
    pub fn path(&self, id: PathId) -> Option<&PathRecord> {
        self.paths.get(&id)
    }

    #[must_use]
    pub fn commands(&self) -> &[SurfaceCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    #[must_use]
    pub fn fill_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, SurfaceCommand::Fill(_)))
            .count()
    }

    /// A layer is visible while it and every ancestor stay attached.
    #[must_use]
    pub fn is_visible(&self, id: LayerId) -> bool {
        let mut current = Some(id);
        let mut depth = 0usize;
        while let Some(layer_id) = current {
            let Some(record) = self.layers.get(&layer_id) else {
                return false;
            };
            if !record.attached || depth > self.layers.len() {
                return false;
            }
            current = record.parent;
            depth += 1;
        }
        true
    }

    /// Texts on every visible layer, in layer creation order.
    #[must_use]
    pub fn visible_texts(&self) -> Vec<&TextPrimitive> {
        self.layers
            .iter()
            .filter(|(id, _)| self.is_visible(**id))
            .flat_map(|(_, layer)| layer.texts.iter())
            .collect()
    }

    /// Checks every retained primitive for finite geometry and valid colors.
    pub fn validate(&self) -> ChartResult<()> {
        for path in self.paths.values() {
            for segment in &path.segments {
                let finite = match *segment {
                    PathSegment::MoveTo(x, y) | PathSegment::LineTo(x, y) => {
                        x.is_finite() && y.is_finite()
                    }
                    PathSegment::Close => true,
                };
                if !finite {
                    return Err(ChartError::InvalidData(
                        "path coordinates must be finite".to_owned(),
                    ));
                }
            }
            if let Some(fill) = path.fill {
                fill.color.validate()?;
            }
            if let Some(stroke) = path.stroke {
                stroke.validate()?;
            }
        }
        for layer in self.layers.values() {
            for text in &layer.texts {
                text.validate()?;
            }
        }
        Ok(())
    }

    fn path_mut(&mut self, path: PathId) -> Option<&mut PathRecord> {
        self.paths.get_mut(&path)
    }
}

impl VectorSurface for RecordingSurface {
    fn create_layer(&mut self, parent: Option<LayerId>) -> LayerId {
        let id = LayerId(self.next_layer);
        self.next_layer = self.next_layer.saturating_add(1);
        self.layers.insert(
            id,
            LayerRecord {
                parent,
                attached: true,
                ..LayerRecord::default()
            },
        );
        self.commands.push(SurfaceCommand::CreateLayer(id));
        id
    }

    fn remove_layer(&mut self, layer: LayerId) {
        if let Some(record) = self.layers.get_mut(&layer) {
            record.parent = None;
            record.attached = false;
        }
        self.commands.push(SurfaceCommand::RemoveLayer(layer));
    }

    fn set_parent(&mut self, layer: LayerId, parent: Option<LayerId>) {
        if let Some(record) = self.layers.get_mut(&layer) {
            record.parent = parent;
            record.attached = parent.is_some();
        }
        self.commands.push(SurfaceCommand::SetParent(layer, parent));
    }

    fn create_path(&mut self, layer: LayerId) -> PathId {
        let id = PathId(self.next_path);
        self.next_path = self.next_path.saturating_add(1);
        self.paths.insert(
            id,
            PathRecord {
                layer,
                segments: Vec::new(),
                fill: None,
                stroke: None,
            },
        );
        self.commands.push(SurfaceCommand::CreatePath(id));
        id
    }

    fn create_rect(&mut self, layer: LayerId, bounds: Bounds) -> PathId {
        let id = self.create_path(layer);
        self.append_rect(id, bounds);
        id
    }

    fn set_clip(&mut self, layer: LayerId, clip: Option<Bounds>) {
        if let Some(record) = self.layers.get_mut(&layer) {
            record.clip = clip;
        }
        self.commands.push(SurfaceCommand::SetClip(layer, clip));
    }

    fn set_z_index(&mut self, layer: LayerId, z_index: i32) {
        if let Some(record) = self.layers.get_mut(&layer) {
            record.z_index = z_index;
        }
        self.commands.push(SurfaceCommand::SetZIndex(layer, z_index));
    }

    fn move_to(&mut self, path: PathId, x: f64, y: f64) {
        if let Some(record) = self.path_mut(path) {
            record.segments.push(PathSegment::MoveTo(x, y));
        }
    }

    fn line_to(&mut self, path: PathId, x: f64, y: f64) {
        if let Some(record) = self.path_mut(path) {
            record.segments.push(PathSegment::LineTo(x, y));
        }
    }

    fn close(&mut self, path: PathId) {
        if let Some(record) = self.path_mut(path) {
            record.segments.push(PathSegment::Close);
        }
    }

    fn clear(&mut self, path: PathId) {
        if let Some(record) = self.path_mut(path) {
            record.segments.clear();
        }
        self.commands.push(SurfaceCommand::Clear(path));
    }

    fn fill(&mut self, path: PathId, fill: Option<Fill>) -> ChartResult<()> {
        if let Some(fill) = fill {
            fill.color.validate()?;
        }
        if let Some(record) = self.path_mut(path) {
            record.fill = fill;
        }
        self.commands.push(SurfaceCommand::Fill(path));
        Ok(())
    }

    fn stroke(&mut self, path: PathId, stroke: Option<Stroke>) -> ChartResult<()> {
        if let Some(stroke) = stroke {
            stroke.validate()?;
        }
        if let Some(record) = self.path_mut(path) {
            record.stroke = stroke;
        }
        self.commands.push(SurfaceCommand::Stroke(path));
        Ok(())
    }

    fn draw_text(&mut self, layer: LayerId, text: TextPrimitive) -> ChartResult<()> {
        text.validate()?;
        if let Some(record) = self.layers.get_mut(&layer) {
            record.texts.push(text);
        }
        self.commands.push(SurfaceCommand::DrawText(layer));
        Ok(())
    }

    fn clear_texts(&mut self, layer: LayerId) {
        if let Some(record) = self.layers.get_mut(&layer) {
            record.texts.clear();
        }
        self.commands.push(SurfaceCommand::ClearTexts(layer));
    }
}

#[cfg(test)]
mod tests {
    use super::{PathSegment, RecordingSurface};
    use crate::core::bounds::Bounds;
    use crate::render::{Color, Fill, VectorSurface};

    #[test]
    fn rect_paths_record_closed_sub_paths() {
        let mut surface = RecordingSurface::new();
        let root = surface.create_layer(None);
        let path = surface.create_rect(root, Bounds::new(0.0, 0.0, 10.0, 5.0));
        surface.append_rect(path, Bounds::new(0.0, 5.0, 10.0, 5.0));
        surface
            .fill(path, Some(Fill::solid(Color::rgb(0.9, 0.9, 0.9))))
            .expect("fill");

        let record = surface.path(path).expect("path");
        assert_eq!(record.closed_count(), 2);
        assert_eq!(record.segments[0], PathSegment::MoveTo(0.0, 0.0));
        assert_eq!(surface.fill_calls(), 1);
        assert!(surface.validate().is_ok());
    }

    #[test]
    fn removed_layers_hide_their_texts() {
        let mut surface = RecordingSurface::new();
        let root = surface.create_layer(None);
        let child = surface.create_layer(Some(root));
        surface
            .draw_text(
                child,
                crate::render::TextPrimitive::new(
                    "Jan",
                    1.0,
                    1.0,
                    11.0,
                    Color::rgb(0.0, 0.0, 0.0),
                    crate::render::TextHAlign::Center,
                ),
            )
            .expect("text");
        assert_eq!(surface.visible_texts().len(), 1);

        surface.remove_layer(child);
        assert!(surface.visible_texts().is_empty());
        surface.set_parent(child, Some(root));
        assert_eq!(surface.visible_texts().len(), 1);
    }

    #[test]
    fn invalid_fill_is_rejected() {
        let mut surface = RecordingSurface::new();
        let root = surface.create_layer(None);
        let path = surface.create_path(root);
        assert!(
            surface
                .fill(path, Some(Fill::solid(Color::rgba(2.0, 0.0, 0.0, 1.0))))
                .is_err()
        );
    }
}
