use crate::{
    assets::decode::PreparedMask,
    assets::loader::DecodeTicket,
    foundation::core::{OverlayId, Point, SceneId},
    foundation::error::{VeneerError, VeneerResult},
    history::command::Command,
    history::edits::RemoveOverlay,
    history::manager::{HistoryOpts, UndoManager},
    order::draw_order::OrderingEngine,
    order::hit::{HitList, resolve_hits},
    overlay::draw::{DrawTarget, PaintContext},
    overlay::model::OverlayDoc,
    overlay::status::RenderStatus,
    render::canvas_pool::{Canvas, CanvasPool},
    scene::chrome::build_scene_tree,
    scene::element::{ElementId, ElementTree, UiEvent},
    scene::events::{EventQueue, SceneEvent},
    scene::node::{NodeContext, SceneNode, UpdateQueue},
    scene::store::{DecodeOutcome, OverlayScene},
    scene::view::{FrameState, HoverInfo, ViewState},
};

pub const POINTER_DOWN: &str = "pointerdown";
pub const KEY_DOWN: &str = "keydown";

/// Per-engine configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineOpts {
    /// Base stroke width in scene units; selection and hover double it.
    pub stroke_width: f64,
    pub history: HistoryOpts,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            stroke_width: 2.0,
            history: HistoryOpts::default(),
        }
    }
}

/// Outcome of one render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// Overlays painted this pass, back to front.
    pub drawn: Vec<OverlayId>,
    /// Overlays in the draw order still waiting for their resources.
    pub pending: Vec<OverlayId>,
    pub hits: HitList,
}

/// Owner of one mounted scene: overlays, ordering cache, undo history, and the scene tree.
pub struct OverlayEngine {
    id: SceneId,
    opts: EngineOpts,
    scene: OverlayScene,
    ordering: OrderingEngine,
    history: UndoManager<OverlayScene>,
    events: EventQueue,
    updates: UpdateQueue<FrameState>,
    tree: ElementTree,
    root: SceneNode<ViewState, FrameState>,
    last_hits: HitList,
}

impl OverlayEngine {
    pub fn new(
        id: SceneId,
        sample_id: impl Into<String>,
        opts: EngineOpts,
    ) -> VeneerResult<Self> {
        let events = EventQueue::new();
        let updates = UpdateQueue::new();
        let mut tree = ElementTree::new();
        let ctx = NodeContext::new(updates.clone(), events.clone());
        let root = build_scene_tree(&mut tree, &ctx)?;
        Ok(Self {
            id,
            history: UndoManager::new(opts.history)?,
            opts,
            scene: OverlayScene::new(sample_id, events.clone()),
            ordering: OrderingEngine::new(),
            events,
            updates,
            tree,
            root,
            last_hits: HitList::default(),
        })
    }

    pub fn id(&self) -> &SceneId {
        &self.id
    }

    pub fn opts(&self) -> &EngineOpts {
        &self.opts
    }

    pub fn scene(&self) -> &OverlayScene {
        &self.scene
    }

    pub fn history(&self) -> &UndoManager<OverlayScene> {
        &self.history
    }

    pub fn ordering(&self) -> &OrderingEngine {
        &self.ordering
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn root_element(&self) -> ElementId {
        self.root.element()
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Take every event dispatched since the last call.
    pub fn take_events(&self) -> Vec<SceneEvent> {
        self.events.take()
    }

    /// Apply state updates requested by scene nodes to the host's frame state.
    pub fn apply_updates(&self, frame: &mut FrameState) -> usize {
        self.updates.apply(frame)
    }

    /// Hit list of the most recent render pass.
    pub fn last_hits(&self) -> &HitList {
        &self.last_hits
    }

    /// Replace the scene's overlays. Undo history of the previous set is dropped.
    pub fn load(&mut self, docs: Vec<OverlayDoc>) -> VeneerResult<()> {
        self.scene.load(docs)?;
        self.history.clear();
        self.last_hits = HitList::default();
        Ok(())
    }

    /// Run one render pass into `target`.
    ///
    /// Resource-free overlays are promoted to `Decoded`, the draw order is taken from the cache,
    /// every decoded overlay in it is painted (`Painting` then `Painted`), the pointer is
    /// resolved, and the scene tree is reconciled. Pending overlays are skipped, not waited for.
    #[tracing::instrument(skip_all, fields(scene = %self.id, sample = %frame.sample_id))]
    pub fn render(
        &mut self,
        frame: &FrameState,
        target: &mut dyn DrawTarget,
    ) -> VeneerResult<FrameReport> {
        if frame.sample_id != self.scene.sample_id() {
            return Err(VeneerError::validation(format!(
                "frame is for sample '{}' but the scene holds '{}'",
                frame.sample_id,
                self.scene.sample_id()
            )));
        }

        self.ordering.set_active_fields(&frame.active_fields);
        self.scene.settle_resource_free()?;
        let order = self.ordering.draw_order(&self.scene).to_vec();
        let hits = resolve_hits(&self.scene, &order, frame.pointer, frame.static_mode);
        let hovered = hits.topmost().cloned();

        let mut drawn = Vec::with_capacity(order.len());
        let mut pending = Vec::new();
        for id in &order {
            let selected = self.scene.is_selected(id);
            let Some(overlay) = self.scene.get_mut(id) else {
                continue;
            };
            if overlay.render_status() == RenderStatus::Pending {
                pending.push(id.clone());
                continue;
            }
            if overlay.render_status() == RenderStatus::Decoded {
                overlay.advance_status(RenderStatus::Painting)?;
            }
            let ctx = PaintContext {
                selected,
                hovered: hovered.as_ref() == Some(id),
                stroke_width: self.opts.stroke_width,
            };
            target.begin_overlay(id);
            overlay.render(target, &ctx);
            if overlay.render_status() == RenderStatus::Painting {
                overlay.advance_status(RenderStatus::Painted)?;
            }
            drawn.push(id.clone());
        }

        let view = ViewState {
            sample_id: frame.sample_id.clone(),
            static_mode: frame.static_mode,
            pointer: frame.pointer,
            overlay_count: self.scene.len(),
            drawn_count: drawn.len(),
            pending_count: pending.len(),
            hovered: hovered
                .as_ref()
                .and_then(|id| self.scene.get(id))
                .map(|o| HoverInfo {
                    id: o.id().clone(),
                    label: o.label().to_owned(),
                    field: o.field().to_owned(),
                }),
            decode_errors: self
                .scene
                .iter()
                .filter_map(|o| o.load_error().map(|e| (o.id().clone(), e.to_owned())))
                .collect(),
        };
        self.root.render(&view, &mut self.tree)?;

        tracing::debug!(
            drawn = drawn.len(),
            pending = pending.len(),
            hits = hits.hit_count(),
            "render pass done"
        );
        self.last_hits = hits.clone();
        Ok(FrameReport {
            drawn,
            pending,
            hits,
        })
    }

    /// Render into a canvas from `pool`; the caller releases it when done.
    pub fn render_pooled(
        &mut self,
        frame: &FrameState,
        pool: &mut CanvasPool,
    ) -> VeneerResult<(FrameReport, Canvas)> {
        let mut canvas = pool.acquire(&self.id);
        match self.render(frame, &mut canvas) {
            Ok(report) => Ok((report, canvas)),
            Err(err) => {
                pool.release(canvas);
                Err(err)
            }
        }
    }

    /// Rank overlays under `point` without painting.
    pub fn hit_list(&mut self, active_fields: &[String], point: Option<Point>) -> HitList {
        self.ordering.set_active_fields(active_fields);
        let order = self.ordering.draw_order(&self.scene);
        resolve_hits(&self.scene, order, point, false)
    }

    /// Select the topmost overlay under `point`. A miss without `additive` clears the selection.
    pub fn pointer_down(
        &mut self,
        point: Point,
        additive: bool,
    ) -> VeneerResult<Option<OverlayId>> {
        let active = self.ordering.active_fields().to_vec();
        let target = self.hit_list(&active, Some(point)).topmost().cloned();
        match &target {
            Some(id) => self.scene.toggle_selection(id, additive)?,
            None if !additive => self.scene.clear_selection(),
            None => {}
        }
        Ok(target)
    }

    /// Route a host UI event: tree listeners first, then engine-level pointer/keyboard actions.
    pub fn handle_ui_event(&mut self, event: &UiEvent) -> VeneerResult<()> {
        self.tree.dispatch_ui_event(self.root.element(), event);
        match event.event_type.as_str() {
            POINTER_DOWN => {
                if let Some(p) = event.pointer {
                    self.pointer_down(p, event.additive)?;
                }
            }
            KEY_DOWN => match event.key.as_deref() {
                Some("Escape") => self.scene.clear_selection(),
                Some("Delete" | "Backspace") => {
                    self.delete_selected()?;
                }
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    /// Execute an edit and record it for undo.
    pub fn apply(&mut self, command: impl Command<OverlayScene> + 'static) -> VeneerResult<()> {
        self.history.apply(command, &mut self.scene)
    }

    /// Undo the last edit; returns its description.
    pub fn undo(&mut self) -> VeneerResult<Option<String>> {
        Ok(self
            .history
            .undo(&mut self.scene)?
            .map(|c| c.description()))
    }

    pub fn redo(&mut self) -> VeneerResult<Option<String>> {
        Ok(self
            .history
            .redo(&mut self.scene)?
            .map(|c| c.description()))
    }

    /// Remove every selected overlay, one undo entry each. Returns how many were removed.
    pub fn delete_selected(&mut self) -> VeneerResult<usize> {
        let ids: Vec<OverlayId> = self.scene.selected().iter().cloned().collect();
        for id in &ids {
            self.apply(RemoveOverlay::new(id.clone()))?;
        }
        Ok(ids.len())
    }

    pub fn take_decode_requests(&mut self) -> Vec<DecodeTicket> {
        self.scene.take_decode_requests()
    }

    pub fn complete_decode(
        &mut self,
        ticket: &DecodeTicket,
        result: VeneerResult<PreparedMask>,
    ) -> VeneerResult<DecodeOutcome> {
        self.scene.complete_decode(ticket, result)
    }

    pub fn request_reload(&mut self, id: &OverlayId) -> VeneerResult<()> {
        self.scene.request_reload(id)
    }

    /// Dispose every overlay and forget history; the engine can be loaded again afterwards.
    pub fn teardown(&mut self) {
        tracing::debug!(scene = %self.id, "teardown");
        self.scene.teardown();
        self.history.clear();
        self.ordering.invalidate();
        self.last_hits = HitList::default();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/engine.rs"]
mod tests;
