use std::collections::BTreeSet;

use kurbo::Shape as _;

use crate::{
    assets::decode::PreparedMask,
    foundation::core::{Affine, BezPath, OverlayId, Point, Rect, Transform2D, Vec2, is_zero_area},
    foundation::error::{VeneerError, VeneerResult},
    foundation::math::{bounds_of, centroid, convex_hull, path_through, polyline_distance},
    overlay::draw::{DrawTarget, PaintContext, field_color},
    overlay::status::RenderStatus,
};

/// Distance (scene units) within which an open polyline stroke counts as hit.
pub const STROKE_HIT_TOLERANCE: f64 = 4.0;

/// Explicit overlay discriminant; ordering and hit-testing switch on this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayKind {
    Classification,
    BoundingBox,
    Polyline,
    Cuboid,
}

impl OverlayKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::BoundingBox => "bounding-box",
            Self::Polyline => "polyline",
            Self::Cuboid => "cuboid",
        }
    }
}

/// Variant geometry in overlay-local coordinates.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Geometry {
    /// Sample-level label with no spatial extent.
    Classification,
    BoundingBox {
        rect: Rect,
    },
    Polyline {
        points: Vec<Point>,
        #[serde(default)]
        closed: bool,
        #[serde(default)]
        filled: bool,
    },
    /// Eight projected vertices: front face `0..4`, back face `4..8`.
    Cuboid {
        vertices: Vec<Point>,
    },
}

impl Geometry {
    pub fn kind(&self) -> OverlayKind {
        match self {
            Self::Classification => OverlayKind::Classification,
            Self::BoundingBox { .. } => OverlayKind::BoundingBox,
            Self::Polyline { .. } => OverlayKind::Polyline,
            Self::Cuboid { .. } => OverlayKind::Cuboid,
        }
    }

    pub(crate) fn validate(&self) -> VeneerResult<()> {
        match self {
            Self::Classification => Ok(()),
            Self::BoundingBox { rect } => {
                let finite = [rect.x0, rect.y0, rect.x1, rect.y1]
                    .iter()
                    .all(|v| v.is_finite());
                if !finite {
                    return Err(VeneerError::validation("bounding box must be finite"));
                }
                Ok(())
            }
            Self::Polyline { points, .. } => {
                if points.len() < 2 {
                    return Err(VeneerError::validation(
                        "polyline needs at least two points",
                    ));
                }
                if points.iter().any(|p| !p.is_finite()) {
                    return Err(VeneerError::validation("polyline points must be finite"));
                }
                Ok(())
            }
            Self::Cuboid { vertices } => {
                if vertices.len() != 8 {
                    return Err(VeneerError::validation(format!(
                        "cuboid needs 8 vertices, got {}",
                        vertices.len()
                    )));
                }
                if vertices.iter().any(|p| !p.is_finite()) {
                    return Err(VeneerError::validation("cuboid vertices must be finite"));
                }
                Ok(())
            }
        }
    }

    /// Geometry with `affine` baked into every coordinate.
    ///
    /// Boxes become the axis-aligned bounds of their transformed corners.
    pub fn transformed(&self, affine: Affine) -> Self {
        match self {
            Self::Classification => Self::Classification,
            Self::BoundingBox { rect } => Self::BoundingBox {
                rect: affine.transform_rect_bbox(*rect),
            },
            Self::Polyline {
                points,
                closed,
                filled,
            } => Self::Polyline {
                points: points.iter().map(|&p| affine * p).collect(),
                closed: *closed,
                filled: *filled,
            },
            Self::Cuboid { vertices } => Self::Cuboid {
                vertices: vertices.iter().map(|&p| affine * p).collect(),
            },
        }
    }
}

/// Label document as delivered by the data layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OverlayDoc {
    pub id: OverlayId,
    #[serde(default)]
    pub name: String,
    pub field: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default)]
    pub transform: Transform2D,
    #[serde(default)]
    pub z_index: Option<i32>,
    /// Opaque locator of an instance mask the host must decode.
    #[serde(default)]
    pub mask: Option<String>,
}

/// One renderable, selectable, editable annotation.
#[derive(Clone, Debug)]
pub struct Overlay {
    id: OverlayId,
    name: String,
    field: String,
    label: String,
    tags: BTreeSet<String>,
    geometry: Geometry,
    transform: Transform2D,
    z_index: Option<i32>,
    mask_source: Option<String>,

    status: RenderStatus,
    mask: Option<PreparedMask>,
    load_error: Option<String>,
    // Bumped on reset/dispose so in-flight decodes can be recognized as stale.
    generation: u64,
    disposed: bool,
}

impl Overlay {
    pub fn new(id: impl Into<OverlayId>, field: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            field: field.into(),
            label: String::new(),
            tags: BTreeSet::new(),
            geometry,
            transform: Transform2D::default(),
            z_index: None,
            mask_source: None,
            status: RenderStatus::Pending,
            mask: None,
            load_error: None,
            generation: 0,
            disposed: false,
        }
    }

    /// Build a validated overlay from a label document.
    pub fn from_doc(doc: OverlayDoc) -> VeneerResult<Self> {
        if doc.id.as_str().trim().is_empty() {
            return Err(VeneerError::validation("overlay id must be non-empty"));
        }
        if doc.field.trim().is_empty() {
            return Err(VeneerError::validation(format!(
                "overlay '{}' has an empty field",
                doc.id
            )));
        }
        doc.geometry.validate()?;
        if doc.mask.is_some() && doc.geometry.kind() != OverlayKind::BoundingBox {
            return Err(VeneerError::validation(format!(
                "overlay '{}': only bounding boxes carry masks",
                doc.id
            )));
        }

        let mut overlay = Self::new(doc.id, doc.field, doc.geometry);
        overlay.name = doc.name;
        overlay.label = doc.label;
        overlay.tags = doc.tags;
        overlay.transform = doc.transform;
        overlay.z_index = doc.z_index;
        overlay.mask_source = doc.mask;
        Ok(overlay)
    }

    /// Snapshot back into document form (local geometry, transform kept separate).
    pub fn to_doc(&self) -> OverlayDoc {
        OverlayDoc {
            id: self.id.clone(),
            name: self.name.clone(),
            field: self.field.clone(),
            label: self.label.clone(),
            tags: self.tags.clone(),
            geometry: self.geometry.clone(),
            transform: self.transform,
            z_index: self.z_index,
            mask: self.mask_source.clone(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_z_index(mut self, z: i32) -> Self {
        self.z_index = Some(z);
        self
    }

    pub fn with_mask_source(mut self, source: impl Into<String>) -> Self {
        self.mask_source = Some(source.into());
        self
    }

    pub fn id(&self) -> &OverlayId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn kind(&self) -> OverlayKind {
        self.geometry.kind()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn transform(&self) -> Transform2D {
        self.transform
    }

    pub fn z_index(&self) -> Option<i32> {
        self.z_index
    }

    pub fn mask_source(&self) -> Option<&str> {
        self.mask_source.as_deref()
    }

    pub fn render_status(&self) -> RenderStatus {
        self.status
    }

    pub fn mask(&self) -> Option<&PreparedMask> {
        self.mask.as_ref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Effective geometry in scene coordinates.
    pub fn scene_geometry(&self) -> Geometry {
        self.geometry.transformed(self.transform.to_affine())
    }

    pub(crate) fn set_tags(&mut self, tags: BTreeSet<String>) {
        self.tags = tags;
    }

    pub(crate) fn set_field(&mut self, field: String) {
        self.field = field;
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }

    pub(crate) fn set_transform(&mut self, transform: Transform2D) {
        self.transform = transform;
    }

    /// Compose `matrix` on top of the current transform.
    pub fn apply_transform(&mut self, matrix: Affine) {
        self.transform = self.transform.then(matrix);
    }

    /// Whether a decode is still required before the overlay can draw.
    pub fn needs_resource(&self) -> bool {
        self.mask_source.is_some() && self.mask.is_none()
    }

    pub(crate) fn advance_status(&mut self, next: RenderStatus) -> VeneerResult<()> {
        self.status.advance(next)
    }

    /// Store a decoded mask and mark the overlay decoded.
    pub(crate) fn accept_mask(&mut self, mask: PreparedMask) -> VeneerResult<()> {
        self.mask = Some(mask);
        self.load_error = None;
        self.advance_status(RenderStatus::Decoded)
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub(crate) fn record_load_error(&mut self, err: impl Into<String>) {
        self.load_error = Some(err.into());
    }

    /// Drop decoded resources and return to `Pending` for a reload.
    pub fn reset(&mut self) {
        self.mask = None;
        self.load_error = None;
        self.generation = self.generation.wrapping_add(1);
        self.status.reset();
    }

    /// Release decoded resources. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.mask = None;
        self.generation = self.generation.wrapping_add(1);
        self.disposed = true;
    }

    /// Axis-aligned bounds in scene coordinates.
    pub fn bounds(&self) -> Rect {
        let affine = self.transform.to_affine();
        match &self.geometry {
            Geometry::Classification => Rect::ZERO,
            Geometry::BoundingBox { rect } => affine.transform_rect_bbox(*rect),
            Geometry::Polyline { points, .. } => {
                let pts: Vec<Point> = points.iter().map(|&p| affine * p).collect();
                bounds_of(&pts).inflate(STROKE_HIT_TOLERANCE, STROKE_HIT_TOLERANCE)
            }
            Geometry::Cuboid { vertices } => {
                let pts: Vec<Point> = vertices.iter().map(|&p| affine * p).collect();
                bounds_of(&pts)
            }
        }
    }

    /// Whether `point` (scene coordinates) lies on the overlay's effective geometry.
    pub fn hit_test(&self, point: Point) -> bool {
        let bounds = self.bounds();
        if is_zero_area(bounds) || !bounds.contains(point) {
            return false;
        }
        let affine = self.transform.to_affine();
        match &self.geometry {
            Geometry::Classification => false,
            Geometry::BoundingBox { rect } => {
                if affine.determinant().abs() < f64::EPSILON {
                    return false;
                }
                let local = affine.inverse() * point;
                let rect = rect.abs();
                if !rect.contains(local) {
                    return false;
                }
                match &self.mask {
                    Some(mask) => {
                        let u = (local.x - rect.x0) / rect.width();
                        let v = (local.y - rect.y0) / rect.height();
                        mask.sample(u, v) > 0
                    }
                    None => true,
                }
            }
            Geometry::Polyline {
                points,
                closed,
                filled,
            } => {
                let pts: Vec<Point> = points.iter().map(|&p| affine * p).collect();
                if *closed && *filled && path_through(&pts, true).contains(point) {
                    return true;
                }
                polyline_distance(&pts, *closed, point) <= STROKE_HIT_TOLERANCE
            }
            Geometry::Cuboid { vertices } => {
                let pts: Vec<Point> = vertices.iter().map(|&p| affine * p).collect();
                path_through(&convex_hull(&pts), true).contains(point)
            }
        }
    }

    /// Ranking distance used to order hits: centroid distance for area shapes, nearest
    /// segment for open polylines.
    pub fn distance_to(&self, point: Point) -> f64 {
        let affine = self.transform.to_affine();
        match &self.geometry {
            Geometry::Classification => f64::INFINITY,
            Geometry::BoundingBox { rect } => affine
                .transform_rect_bbox(*rect)
                .center()
                .distance(point),
            Geometry::Polyline { points, closed, .. } => {
                let pts: Vec<Point> = points.iter().map(|&p| affine * p).collect();
                if *closed {
                    centroid(&pts).distance(point)
                } else {
                    polyline_distance(&pts, false, point)
                }
            }
            Geometry::Cuboid { vertices } => {
                let pts: Vec<Point> = vertices.iter().map(|&p| affine * p).collect();
                centroid(&pts).distance(point)
            }
        }
    }

    /// Emit draw commands. Nothing is drawn before the overlay reaches `Painting`.
    pub fn render(&self, target: &mut dyn DrawTarget, ctx: &PaintContext) {
        if !self.status.is_drawable() || self.disposed {
            return;
        }
        let color = field_color(&self.field, 255);
        let width = ctx.effective_stroke_width();
        let affine = self.transform.to_affine();

        match &self.geometry {
            Geometry::Classification => {
                let text = if self.label.is_empty() {
                    self.name.as_str()
                } else {
                    self.label.as_str()
                };
                target.draw_text(Point::ORIGIN, text, color);
            }
            Geometry::BoundingBox { rect } => {
                if let Some(mask) = &self.mask {
                    let unit_to_rect = Affine::translate(Vec2::new(rect.x0, rect.y0))
                        * Affine::scale_non_uniform(rect.width(), rect.height());
                    target.draw_mask(mask, affine * unit_to_rect, field_color(&self.field, 128));
                }
                let corners = [
                    Point::new(rect.x0, rect.y0),
                    Point::new(rect.x1, rect.y0),
                    Point::new(rect.x1, rect.y1),
                    Point::new(rect.x0, rect.y1),
                ];
                let pts: Vec<Point> = corners.iter().map(|&p| affine * p).collect();
                target.stroke_path(&path_through(&pts, true), color, width);
                if !self.label.is_empty() {
                    target.draw_text(bounds_of(&pts).origin(), &self.label, color);
                }
            }
            Geometry::Polyline {
                points,
                closed,
                filled,
            } => {
                let pts: Vec<Point> = points.iter().map(|&p| affine * p).collect();
                let path = path_through(&pts, *closed);
                if *closed && *filled {
                    target.fill_path(&path, field_color(&self.field, 96));
                }
                target.stroke_path(&path, color, width);
            }
            Geometry::Cuboid { vertices } => {
                let pts: Vec<Point> = vertices.iter().map(|&p| affine * p).collect();
                target.stroke_path(&cuboid_edges(&pts), color, width);
            }
        }
    }
}

fn cuboid_edges(v: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if v.len() != 8 {
        return path;
    }
    path.extend(path_through(&v[0..4], true));
    path.extend(path_through(&v[4..8], true));
    for i in 0..4 {
        path.move_to(v[i]);
        path.line_to(v[i + 4]);
    }
    path
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/model.rs"]
mod tests;
