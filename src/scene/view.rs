use crate::foundation::core::{OverlayId, Point};

/// Host-owned application state one render pass reads.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FrameState {
    pub sample_id: String,
    /// Fields to draw, bottom to top.
    pub active_fields: Vec<String>,
    /// Last known pointer position in scene coordinates.
    pub pointer: Option<Point>,
    /// Thumbnail/grid rendering: no hit-testing, no hover chrome.
    #[serde(rename = "static")]
    pub static_mode: bool,
}

impl FrameState {
    pub fn new(sample_id: impl Into<String>, active_fields: &[&str]) -> Self {
        Self {
            sample_id: sample_id.into(),
            active_fields: active_fields.iter().map(|f| (*f).to_owned()).collect(),
            ..Self::default()
        }
    }

    pub fn with_pointer(mut self, pointer: Point) -> Self {
        self.pointer = Some(pointer);
        self
    }

    pub fn with_static(mut self, static_mode: bool) -> Self {
        self.static_mode = static_mode;
        self
    }
}

/// Overlay under the pointer, as shown by the tooltip.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverInfo {
    pub id: OverlayId,
    pub label: String,
    pub field: String,
}

/// Snapshot the scene tree renders from; derived by the engine once per pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
    pub sample_id: String,
    pub static_mode: bool,
    pub pointer: Option<Point>,
    pub overlay_count: usize,
    pub drawn_count: usize,
    pub pending_count: usize,
    pub hovered: Option<HoverInfo>,
    pub decode_errors: Vec<(OverlayId, String)>,
}
