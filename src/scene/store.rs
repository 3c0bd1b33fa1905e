use std::collections::{BTreeSet, HashSet};

use crate::{
    assets::decode::PreparedMask,
    assets::loader::{DecodeQueue, DecodeTicket},
    foundation::core::{OverlayId, Transform2D},
    foundation::error::{VeneerError, VeneerResult},
    overlay::model::{Overlay, OverlayDoc},
    overlay::status::RenderStatus,
    persist::payload::{CommitPayload, RemovePayload},
    scene::events::{self, EventQueue},
};

/// What happened to a decode result handed back by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Mask stored, overlay is now `Decoded`.
    Applied,
    /// Decode failed; reported as a `decode-error` event.
    Failed,
    /// Overlay was removed, disposed, or reset since the ticket was issued.
    Discarded,
}

/// The overlay collection of one scene (one sample), plus selection and decode bookkeeping.
#[derive(Debug)]
pub struct OverlayScene {
    sample_id: String,
    overlays: Vec<Overlay>,
    selected: BTreeSet<OverlayId>,
    // Bumped whenever the set, a field, or a z-index changes. Drives ordering invalidation.
    version: u64,
    // Resource generations are issued scene-wide so a rebuilt overlay never reuses one.
    next_generation: u64,
    decodes: DecodeQueue,
    events: EventQueue,
}

impl OverlayScene {
    pub fn new(sample_id: impl Into<String>, events: EventQueue) -> Self {
        Self {
            sample_id: sample_id.into(),
            overlays: Vec::new(),
            selected: BTreeSet::new(),
            version: 0,
            next_generation: 1,
            decodes: DecodeQueue::default(),
            events,
        }
    }

    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Overlays in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Overlay> {
        self.overlays.iter()
    }

    pub fn get(&self, id: &OverlayId) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: &OverlayId) -> Option<&mut Overlay> {
        self.overlays.iter_mut().find(|o| o.id() == id)
    }

    fn require_mut(&mut self, id: &OverlayId) -> VeneerResult<&mut Overlay> {
        self.get_mut(id)
            .ok_or_else(|| VeneerError::scene(format!("unknown overlay '{id}'")))
    }

    pub fn contains(&self, id: &OverlayId) -> bool {
        self.get(id).is_some()
    }

    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    fn issue_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    /// Replace the whole collection with overlays built from `docs`.
    ///
    /// Nothing changes if any document is invalid or ids collide.
    #[tracing::instrument(skip(self, docs), fields(sample = %self.sample_id))]
    pub fn load(&mut self, docs: Vec<OverlayDoc>) -> VeneerResult<()> {
        let mut seen = HashSet::with_capacity(docs.len());
        let mut built = Vec::with_capacity(docs.len());
        for doc in docs {
            if !seen.insert(doc.id.clone()) {
                return Err(VeneerError::scene(format!(
                    "duplicate overlay id '{}'",
                    doc.id
                )));
            }
            built.push(Overlay::from_doc(doc)?);
        }

        self.teardown();
        for mut overlay in built {
            overlay.set_generation(self.issue_generation());
            self.request_decode(&overlay);
            self.overlays.push(overlay);
        }
        self.bump();
        tracing::debug!(count = self.overlays.len(), "loaded overlays");
        Ok(())
    }

    /// Register a new overlay. A duplicate id is rejected.
    pub fn insert(&mut self, overlay: Overlay) -> VeneerResult<()> {
        let at = self.overlays.len();
        self.insert_at(at, overlay)
    }

    /// Register a new overlay at insertion position `index` (clamped).
    pub fn insert_at(&mut self, index: usize, mut overlay: Overlay) -> VeneerResult<()> {
        if self.contains(overlay.id()) {
            return Err(VeneerError::scene(format!(
                "duplicate overlay id '{}'",
                overlay.id()
            )));
        }
        overlay.set_generation(self.issue_generation());
        self.request_decode(&overlay);
        let at = index.min(self.overlays.len());
        self.overlays.insert(at, overlay);
        self.bump();
        Ok(())
    }

    /// Insertion position of `id`.
    pub fn position(&self, id: &OverlayId) -> Option<usize> {
        self.overlays.iter().position(|o| o.id() == id)
    }

    /// Remove and dispose an overlay, returning it.
    pub fn remove(&mut self, id: &OverlayId) -> VeneerResult<Overlay> {
        let idx = self
            .position(id)
            .ok_or_else(|| VeneerError::scene(format!("unknown overlay '{id}'")))?;
        let mut overlay = self.overlays.remove(idx);
        overlay.dispose();
        self.decodes.cancel(id);
        self.selected.remove(id);
        self.bump();
        Ok(overlay)
    }

    /// Dispose everything and empty the scene.
    pub fn teardown(&mut self) {
        for o in &mut self.overlays {
            o.dispose();
        }
        self.overlays.clear();
        self.selected.clear();
        self.decodes.drain();
        self.bump();
    }

    pub(crate) fn set_transform(
        &mut self,
        id: &OverlayId,
        transform: Transform2D,
    ) -> VeneerResult<Transform2D> {
        let o = self.require_mut(id)?;
        let prev = o.transform();
        o.set_transform(transform);
        Ok(prev)
    }

    pub(crate) fn set_tags(
        &mut self,
        id: &OverlayId,
        tags: BTreeSet<String>,
    ) -> VeneerResult<BTreeSet<String>> {
        let o = self.require_mut(id)?;
        let prev = o.tags().clone();
        o.set_tags(tags);
        Ok(prev)
    }

    pub(crate) fn set_field(&mut self, id: &OverlayId, field: String) -> VeneerResult<String> {
        if field.trim().is_empty() {
            return Err(VeneerError::validation("overlay field must be non-empty"));
        }
        let o = self.require_mut(id)?;
        let prev = o.field().to_owned();
        o.set_field(field);
        self.bump();
        Ok(prev)
    }

    pub(crate) fn set_label(&mut self, id: &OverlayId, label: String) -> VeneerResult<String> {
        let o = self.require_mut(id)?;
        let prev = o.label().to_owned();
        o.set_label(label);
        Ok(prev)
    }

    /// Announce that `id` should be persisted in its current state.
    pub(crate) fn emit_commit(&self, id: &OverlayId) -> VeneerResult<()> {
        let overlay = self
            .get(id)
            .ok_or_else(|| VeneerError::scene(format!("unknown overlay '{id}'")))?;
        let payload = CommitPayload::from_overlay(&self.sample_id, overlay);
        self.events
            .dispatch_event(events::COMMIT, Some(serde_json::to_value(payload)?));
        Ok(())
    }

    /// Announce that `overlay` was deleted from the scene.
    pub(crate) fn emit_remove(&self, overlay: &Overlay) -> VeneerResult<()> {
        let payload = RemovePayload::from_overlay(&self.sample_id, overlay);
        self.events
            .dispatch_event(events::REMOVE, Some(serde_json::to_value(payload)?));
        Ok(())
    }

    fn request_decode(&mut self, overlay: &Overlay) {
        if let Some(source) = overlay.mask_source()
            && overlay.needs_resource()
        {
            self.decodes.push(DecodeTicket {
                overlay: overlay.id().clone(),
                generation: overlay.generation(),
                source: source.to_owned(),
            });
        }
    }

    /// Hand outstanding decode requests to the host.
    pub fn take_decode_requests(&mut self) -> Vec<DecodeTicket> {
        self.decodes.drain()
    }

    /// Accept the result of an out-of-band decode.
    ///
    /// Only flips render status and requests a re-render; ordering is untouched.
    pub fn complete_decode(
        &mut self,
        ticket: &DecodeTicket,
        result: VeneerResult<PreparedMask>,
    ) -> VeneerResult<DecodeOutcome> {
        let Some(overlay) = self.get_mut(&ticket.overlay) else {
            tracing::debug!(overlay = %ticket.overlay, "decode result for removed overlay dropped");
            return Ok(DecodeOutcome::Discarded);
        };
        if overlay.is_disposed()
            || overlay.generation() != ticket.generation
            || overlay.render_status() != RenderStatus::Pending
        {
            tracing::debug!(overlay = %ticket.overlay, "stale decode result dropped");
            return Ok(DecodeOutcome::Discarded);
        }

        match result {
            Ok(mask) => {
                overlay.accept_mask(mask)?;
                self.events.dispatch_event(
                    events::RERENDER,
                    Some(serde_json::json!({ "id": ticket.overlay })),
                );
                Ok(DecodeOutcome::Applied)
            }
            Err(err) => {
                let msg = err.to_string();
                tracing::warn!(overlay = %ticket.overlay, error = %msg, "mask decode failed");
                overlay.record_load_error(msg.clone());
                self.events.dispatch_event(
                    events::DECODE_ERROR,
                    Some(serde_json::json!({ "id": ticket.overlay, "error": msg })),
                );
                Ok(DecodeOutcome::Failed)
            }
        }
    }

    /// Drop decoded resources of `id` and queue a fresh decode.
    pub fn request_reload(&mut self, id: &OverlayId) -> VeneerResult<()> {
        let generation = self.issue_generation();
        let overlay = self.require_mut(id)?;
        overlay.reset();
        overlay.set_generation(generation);
        let snapshot = overlay.clone();
        self.decodes.cancel(id);
        self.request_decode(&snapshot);
        self.events
            .dispatch_event(events::RERENDER, Some(serde_json::json!({ "id": id })));
        Ok(())
    }

    /// Promote overlays that need no resource from `Pending` to `Decoded`.
    pub(crate) fn settle_resource_free(&mut self) -> VeneerResult<()> {
        for o in &mut self.overlays {
            if o.render_status() == RenderStatus::Pending
                && !o.needs_resource()
                && o.load_error().is_none()
                && !o.is_disposed()
            {
                o.advance_status(RenderStatus::Decoded)?;
            }
        }
        Ok(())
    }

    pub fn selected(&self) -> &BTreeSet<OverlayId> {
        &self.selected
    }

    pub fn is_selected(&self, id: &OverlayId) -> bool {
        self.selected.contains(id)
    }

    /// Toggle `id` in the selection; without `additive` the rest of the selection is cleared.
    pub fn toggle_selection(&mut self, id: &OverlayId, additive: bool) -> VeneerResult<()> {
        if !self.contains(id) {
            return Err(VeneerError::scene(format!("unknown overlay '{id}'")));
        }
        let was_selected = self.selected.contains(id);
        if !additive {
            self.selected.clear();
        }
        if was_selected {
            self.selected.remove(id);
        } else {
            self.selected.insert(id.clone());
        }
        self.announce_selection();
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        self.selected.clear();
        self.announce_selection();
    }

    fn announce_selection(&self) {
        self.events.dispatch_event(
            events::SELECT,
            Some(serde_json::json!({ "selected": self.selected })),
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/store.rs"]
mod tests;
