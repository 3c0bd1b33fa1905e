//! Veneer is an overlay rendering and lifecycle engine for annotated media canvases.
//!
//! A scene is a base media layer plus interactive overlays (bounding boxes, classifications,
//! polylines, cuboids). The public API is engine-oriented:
//!
//! - Load [`OverlayDoc`]s into an [`OverlayEngine`]
//! - Render a [`FrameState`] into any [`DrawTarget`], handing mask decodes back via
//!   [`OverlayEngine::complete_decode`]
//! - Apply undoable edits and forward the resulting `commit`/`remove` events to a
//!   [`PersistenceBridge`]
#![forbid(unsafe_code)]

mod foundation;

pub mod assets;
pub mod history;
pub mod order;
pub mod overlay;
pub mod persist;
pub mod render;
pub mod scene;

pub use crate::foundation::core::{
    Affine, BezPath, Line, OverlayId, Point, Rect, Rgba8Premul, SceneId, Transform2D, Vec2,
};
pub use crate::foundation::error::{VeneerError, VeneerResult};

pub use crate::assets::decode::{PreparedMask, decode_mask};
pub use crate::assets::loader::DecodeTicket;
pub use crate::history::command::Command;
pub use crate::history::edits::{AddOverlay, EditOverlay, OverlayEdit, RemoveOverlay};
pub use crate::history::manager::{HistoryOpts, UndoManager};
pub use crate::order::draw_order::{OrderingEngine, compute_draw_order};
pub use crate::order::hit::{HitList, resolve_hits};
pub use crate::overlay::draw::{DrawCommand, DrawTarget, PaintContext, RecordingTarget};
pub use crate::overlay::model::{Geometry, Overlay, OverlayDoc, OverlayKind};
pub use crate::overlay::status::RenderStatus;
pub use crate::persist::bridge::{BridgeOpts, BridgeOutcome, LabelOperator, PersistenceBridge};
pub use crate::persist::index::{InMemoryLabelIndex, LabelIndex};
pub use crate::persist::payload::{CommitPayload, LabelEntry, RemovePayload};
pub use crate::render::canvas_pool::{Canvas, CanvasPool, CanvasPoolOpts, CanvasPoolStats};
pub use crate::render::engine::{EngineOpts, FrameReport, OverlayEngine};
pub use crate::scene::events::{EventBus, EventQueue, SceneEvent};
pub use crate::scene::store::{DecodeOutcome, OverlayScene};
pub use crate::scene::view::{FrameState, ViewState};
