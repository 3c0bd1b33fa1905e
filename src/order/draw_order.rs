use crate::{
    foundation::core::OverlayId,
    overlay::model::{Overlay, OverlayKind},
    scene::store::OverlayScene,
};

/// Back-to-front draw order for `overlays` (given in insertion order).
///
/// Classifications come first whatever their field. Every other overlay is binned by field in
/// `active_fields` order, later fields on top; overlays of inactive fields are dropped. Inside a
/// bin the sort is stable by `z_index` (absent counts as 0).
pub fn compute_draw_order<'a>(
    overlays: impl IntoIterator<Item = &'a Overlay>,
    active_fields: &[String],
) -> Vec<OverlayId> {
    let mut classifications = Vec::new();
    let mut bins: Vec<Vec<&Overlay>> = vec![Vec::new(); active_fields.len()];

    for o in overlays {
        if o.kind() == OverlayKind::Classification {
            classifications.push(o.id().clone());
            continue;
        }
        // A field listed twice draws in its first slot.
        if let Some(bin) = active_fields.iter().position(|f| f == o.field()) {
            bins[bin].push(o);
        }
    }

    let mut order = classifications;
    for mut bin in bins {
        bin.sort_by_key(|o| o.z_index().unwrap_or(0));
        order.extend(bin.into_iter().map(|o| o.id().clone()));
    }
    order
}

#[derive(Debug, Clone)]
struct CachedOrder {
    scene_version: u64,
    fields_version: u64,
    order: Vec<OverlayId>,
}

/// Memoized draw order for one engine.
///
/// The cache is keyed by the scene's version counter and a counter of active-field changes;
/// nothing else (pointer, decode progress) invalidates it.
#[derive(Debug, Default)]
pub struct OrderingEngine {
    active_fields: Vec<String>,
    fields_version: u64,
    cache: Option<CachedOrder>,
    recomputes: u64,
}

impl OrderingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_fields(&self) -> &[String] {
        &self.active_fields
    }

    /// Replace the active-field list. Returns whether it changed.
    pub fn set_active_fields(&mut self, fields: &[String]) -> bool {
        if self.active_fields == fields {
            return false;
        }
        self.active_fields = fields.to_vec();
        self.fields_version = self.fields_version.wrapping_add(1);
        tracing::debug!(fields = ?self.active_fields, "active fields changed");
        true
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Number of times the order was actually recomputed.
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    /// Current draw order, recomputed only when the scene or the active fields changed.
    #[tracing::instrument(skip_all, fields(version = scene.version()))]
    pub fn draw_order(&mut self, scene: &OverlayScene) -> &[OverlayId] {
        let fresh = self.cache.as_ref().is_some_and(|c| {
            c.scene_version == scene.version() && c.fields_version == self.fields_version
        });
        if !fresh {
            tracing::debug!("draw order cache miss");
            self.recomputes += 1;
            self.cache = Some(CachedOrder {
                scene_version: scene.version(),
                fields_version: self.fields_version,
                order: compute_draw_order(scene.iter(), &self.active_fields),
            });
        }
        self.cache.as_ref().map_or(&[], |c| c.order.as_slice())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/order/draw_order.rs"]
mod tests;
