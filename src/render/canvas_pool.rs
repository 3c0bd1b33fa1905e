use std::collections::HashMap;

use crate::{
    assets::decode::PreparedMask,
    foundation::core::{Affine, BezPath, OverlayId, Point, Rgba8Premul, SceneId},
    overlay::draw::{DrawCommand, DrawTarget},
};

/// Pool configuration for retained canvases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CanvasPoolOpts {
    /// Maximum number of canvases kept across all scenes.
    pub max_canvases: usize,
    /// Canvases whose display list grew past this many commands are dropped on release.
    pub max_retained_commands: usize,
}

impl Default for CanvasPoolOpts {
    fn default() -> Self {
        Self {
            max_canvases: 32,
            max_retained_commands: 64 * 1024,
        }
    }
}

/// Display-list canvas owned by one scene between `acquire` and `release`.
#[derive(Debug)]
pub struct Canvas {
    scene: SceneId,
    commands: Vec<DrawCommand>,
}

impl Canvas {
    fn new(scene: SceneId) -> Self {
        Self {
            scene,
            commands: Vec::new(),
        }
    }

    pub fn scene(&self) -> &SceneId {
        &self.scene
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn reset(&mut self, scene: SceneId) {
        self.scene = scene;
        self.commands.clear();
    }
}

impl DrawTarget for Canvas {
    fn begin_overlay(&mut self, id: &OverlayId) {
        self.commands.push(DrawCommand::BeginOverlay(id.clone()));
    }

    fn stroke_path(&mut self, path: &BezPath, color: Rgba8Premul, width: f64) {
        self.commands.push(DrawCommand::StrokePath {
            path: path.clone(),
            color,
            width,
        });
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba8Premul) {
        self.commands.push(DrawCommand::FillPath {
            path: path.clone(),
            color,
        });
    }

    fn draw_text(&mut self, at: Point, text: &str, color: Rgba8Premul) {
        self.commands.push(DrawCommand::Text {
            at,
            text: text.to_owned(),
            color,
        });
    }

    fn draw_mask(&mut self, mask: &PreparedMask, transform: Affine, color: Rgba8Premul) {
        self.commands.push(DrawCommand::Mask {
            width: mask.width,
            height: mask.height,
            transform,
            color,
        });
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CanvasPoolStats {
    pub retained_canvases: usize,
    pub alloc_canvases: u64,
    pub reused_same_scene: u64,
    pub reused_other_scene: u64,
    pub dropped_on_release: u64,
}

/// Bounded pool of canvases keyed by scene id.
///
/// A scene gets its own previous canvas back when one is retained; otherwise any spare canvas is
/// recycled before a new one is allocated.
#[derive(Debug)]
pub struct CanvasPool {
    opts: CanvasPoolOpts,
    stats: CanvasPoolStats,
    by_scene: HashMap<SceneId, Canvas>,
}

impl Default for CanvasPool {
    fn default() -> Self {
        Self::new(CanvasPoolOpts::default())
    }
}

impl CanvasPool {
    pub fn new(opts: CanvasPoolOpts) -> Self {
        Self {
            opts,
            stats: CanvasPoolStats::default(),
            by_scene: HashMap::new(),
        }
    }

    pub fn stats(&self) -> CanvasPoolStats {
        self.stats.clone()
    }

    pub fn acquire(&mut self, scene: &SceneId) -> Canvas {
        if let Some(mut canvas) = self.by_scene.remove(scene) {
            self.stats.retained_canvases = self.stats.retained_canvases.saturating_sub(1);
            self.stats.reused_same_scene = self.stats.reused_same_scene.saturating_add(1);
            canvas.reset(scene.clone());
            return canvas;
        }

        // Recycle the spare with the smallest key so reuse is deterministic.
        let spare = self.by_scene.keys().min().cloned();
        if let Some(key) = spare
            && let Some(mut canvas) = self.by_scene.remove(&key)
        {
            self.stats.retained_canvases = self.stats.retained_canvases.saturating_sub(1);
            self.stats.reused_other_scene = self.stats.reused_other_scene.saturating_add(1);
            canvas.reset(scene.clone());
            return canvas;
        }

        self.stats.alloc_canvases = self.stats.alloc_canvases.saturating_add(1);
        Canvas::new(scene.clone())
    }

    pub fn release(&mut self, canvas: Canvas) {
        if self.opts.max_canvases == 0
            || canvas.commands.capacity() > self.opts.max_retained_commands
            || (self.by_scene.len() >= self.opts.max_canvases
                && !self.by_scene.contains_key(&canvas.scene))
        {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        if self.by_scene.insert(canvas.scene.clone(), canvas).is_some() {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
        } else {
            self.stats.retained_canvases = self.stats.retained_canvases.saturating_add(1);
        }
    }

    /// Drop the retained canvas of a torn-down scene.
    pub fn evict(&mut self, scene: &SceneId) {
        if self.by_scene.remove(scene).is_some() {
            self.stats.retained_canvases = self.stats.retained_canvases.saturating_sub(1);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas_pool.rs"]
mod tests;
