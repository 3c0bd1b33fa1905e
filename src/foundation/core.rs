use std::fmt;

pub use kurbo::{Affine, BezPath, Line, Point, Rect, Vec2};

/// Stable overlay identifier, unique within one scene.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct OverlayId(pub String);

impl OverlayId {
    /// Construct an id from any string-like value.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OverlayId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl From<String> for OverlayId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Identifier of one engine instance (one mounted scene).
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct SceneId(pub String);

impl SceneId {
    /// Construct a scene id from any string-like value.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 2D affine transform in canvas `setTransform(a, b, c, d, e, f)` terms.
///
/// `scale` maps to `(a, d)`, `skew` to `(c, b)` and `translate` to `(e, f)`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Transform2D {
    pub scale: Vec2, // default (1,1)
    pub skew: Vec2,
    pub translate: Vec2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            scale: Vec2::new(1.0, 1.0),
            skew: Vec2::ZERO,
            translate: Vec2::ZERO,
        }
    }
}

impl Transform2D {
    pub fn to_affine(self) -> Affine {
        Affine::new([
            self.scale.x,
            self.skew.y,
            self.skew.x,
            self.scale.y,
            self.translate.x,
            self.translate.y,
        ])
    }

    pub fn from_affine(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self {
            scale: Vec2::new(a, d),
            skew: Vec2::new(c, b),
            translate: Vec2::new(e, f),
        }
    }

    /// Compose `matrix` on top of this transform (`matrix * self`).
    pub fn then(self, matrix: Affine) -> Self {
        Self::from_affine(matrix * self.to_affine())
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }
}

/// Return `true` when the rect encloses no area.
pub fn is_zero_area(rect: Rect) -> bool {
    !(rect.width().abs() > 0.0 && rect.height().abs() > 0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
