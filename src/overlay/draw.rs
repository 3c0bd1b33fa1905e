use crate::{
    assets::decode::PreparedMask,
    foundation::core::{Affine, BezPath, OverlayId, Point, Rgba8Premul},
    foundation::math::Fnv1a64,
};

/// Per-overlay paint parameters resolved by the engine for one pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaintContext {
    /// Overlay is part of the current selection.
    pub selected: bool,
    /// Overlay is the current pointer target.
    pub hovered: bool,
    /// Stroke width in scene units.
    pub stroke_width: f64,
}

impl Default for PaintContext {
    fn default() -> Self {
        Self {
            selected: false,
            hovered: false,
            stroke_width: 2.0,
        }
    }
}

impl PaintContext {
    /// Stroke width after selection/hover emphasis.
    pub fn effective_stroke_width(&self) -> f64 {
        if self.selected || self.hovered {
            self.stroke_width * 2.0
        } else {
            self.stroke_width
        }
    }
}

/// Abstract drawing surface overlays render into.
///
/// Exact rasterization belongs to the host; implementations here record display lists.
pub trait DrawTarget {
    /// Called by the engine before an overlay emits its commands.
    fn begin_overlay(&mut self, _id: &OverlayId) {}

    fn stroke_path(&mut self, path: &BezPath, color: Rgba8Premul, width: f64);

    fn fill_path(&mut self, path: &BezPath, color: Rgba8Premul);

    fn draw_text(&mut self, at: Point, text: &str, color: Rgba8Premul);

    /// Draw `mask` mapped from the unit square through `transform`.
    fn draw_mask(&mut self, mask: &PreparedMask, transform: Affine, color: Rgba8Premul);
}

/// One recorded draw call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    BeginOverlay(OverlayId),
    StrokePath {
        path: BezPath,
        color: Rgba8Premul,
        width: f64,
    },
    FillPath {
        path: BezPath,
        color: Rgba8Premul,
    },
    Text {
        at: Point,
        text: String,
        color: Rgba8Premul,
    },
    Mask {
        width: u32,
        height: u32,
        transform: Affine,
        color: Rgba8Premul,
    },
}

/// Display-list target for tests and inspection.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    commands: Vec<DrawCommand>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Overlay ids in the order they began painting.
    pub fn painted_ids(&self) -> Vec<OverlayId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::BeginOverlay(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl DrawTarget for RecordingTarget {
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

/// Stable per-field color so a field keeps its hue across samples and sessions.
pub fn field_color(field: &str, alpha: u8) -> Rgba8Premul {
    let mut h = Fnv1a64::new_default();
    h.write_bytes(field.as_bytes());
    let hue = (h.finish() % 360) as f64;
    let (r, g, b) = hsv_to_rgb(hue, 0.7, 0.95);
    Rgba8Premul::from_straight_rgba(r, g, b, alpha)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0..60 => (c, x, 0.0),
        60..120 => (x, c, 0.0),
        120..180 => (0.0, c, x),
        180..240 => (0.0, x, c),
        240..300 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |f: f64| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r), to_u8(g), to_u8(b))
}
