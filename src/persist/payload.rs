use std::collections::BTreeSet;

use crate::{
    foundation::core::OverlayId,
    overlay::model::{Geometry, Overlay, OverlayKind},
};

/// Normalized description of an overlay to upsert in the label store.
///
/// `geometry` is the effective scene-space geometry with the transform baked in.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CommitPayload {
    pub sample_id: String,
    pub overlay_id: OverlayId,
    pub field: String,
    pub kind: OverlayKind,
    pub label: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub geometry: Geometry,
}

impl CommitPayload {
    pub fn from_overlay(sample_id: &str, overlay: &Overlay) -> Self {
        Self {
            sample_id: sample_id.to_owned(),
            overlay_id: overlay.id().clone(),
            field: overlay.field().to_owned(),
            kind: overlay.kind(),
            label: overlay.label().to_owned(),
            tags: overlay.tags().clone(),
            geometry: overlay.scene_geometry(),
        }
    }

    pub fn to_entry(&self) -> LabelEntry {
        LabelEntry {
            overlay_id: self.overlay_id.clone(),
            sample_id: self.sample_id.clone(),
            field: self.field.clone(),
            kind: self.kind,
            label: self.label.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Identity of an overlay to delete from the label store.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RemovePayload {
    pub sample_id: String,
    pub overlay_id: OverlayId,
    pub field: String,
}

impl RemovePayload {
    pub fn from_overlay(sample_id: &str, overlay: &Overlay) -> Self {
        Self {
            sample_id: sample_id.to_owned(),
            overlay_id: overlay.id().clone(),
            field: overlay.field().to_owned(),
        }
    }
}

/// Row of the in-memory label side table backing list/sidebar views.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LabelEntry {
    pub overlay_id: OverlayId,
    pub sample_id: String,
    pub field: String,
    pub kind: OverlayKind,
    pub label: String,
    pub tags: BTreeSet<String>,
}
