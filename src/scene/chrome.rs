//! Default node behaviors the engine assembles its scene tree from.
//!
//! The canvas node owns the pointer listeners; tooltip, error banner and thumbnail badge are
//! children shown or hidden per pass.

use std::rc::Rc;

use crate::{
    foundation::error::VeneerResult,
    scene::element::{Element, ElementId, ElementTree, Listener, UiEvent},
    scene::node::{NodeBehavior, NodeContext, SceneNode},
    scene::view::{FrameState, ViewState},
};

pub const POINTER_MOVE: &str = "pointermove";
pub const POINTER_LEAVE: &str = "pointerleave";

/// Root `canvas` element; tracks the pointer into the host state.
#[derive(Debug, Default)]
pub struct CanvasNode;

impl NodeBehavior<ViewState, FrameState> for CanvasNode {
    fn create_element(&self, tree: &mut ElementTree) -> VeneerResult<ElementId> {
        tree.create("canvas")
    }

    fn listeners(&self, ctx: &NodeContext<FrameState>) -> Vec<(String, Listener)> {
        let on_move: Listener = {
            let update = ctx.update.clone();
            Rc::new(move |ev: &UiEvent| {
                let pointer = ev.pointer;
                update.push(move |s: &mut FrameState| s.pointer = pointer);
            })
        };
        let on_leave: Listener = {
            let update = ctx.update.clone();
            Rc::new(move |_: &UiEvent| update.push(|s: &mut FrameState| s.pointer = None))
        };
        vec![
            (POINTER_MOVE.to_owned(), on_move),
            (POINTER_LEAVE.to_owned(), on_leave),
        ]
    }

    fn render_self(&mut self, state: &ViewState, element: &mut Element) -> VeneerResult<()> {
        element.set_attr("data-sample", state.sample_id.as_str());
        element.set_attr("data-overlays", state.overlay_count.to_string());
        element.set_attr("data-drawn", state.drawn_count.to_string());
        if state.static_mode {
            element.set_attr("data-static", "true");
        } else {
            element.remove_attr("data-static");
        }
        Ok(())
    }
}

/// Label of the hovered overlay next to the pointer.
#[derive(Debug, Default)]
pub struct TooltipNode;

impl NodeBehavior<ViewState, FrameState> for TooltipNode {
    fn create_element(&self, tree: &mut ElementTree) -> VeneerResult<ElementId> {
        tree.create("tooltip")
    }

    fn render_self(&mut self, state: &ViewState, element: &mut Element) -> VeneerResult<()> {
        let Some(hover) = &state.hovered else {
            return Ok(());
        };
        let text = if hover.label.is_empty() {
            hover.field.clone()
        } else {
            format!("{} ({})", hover.label, hover.field)
        };
        element.set_text(text);
        element.set_attr("data-overlay", hover.id.as_str());
        if let Some(p) = state.pointer {
            element.set_attr("data-x", format!("{:.1}", p.x));
            element.set_attr("data-y", format!("{:.1}", p.y));
        }
        Ok(())
    }

    fn is_shown(&self, state: &ViewState) -> bool {
        !state.static_mode && state.hovered.is_some()
    }
}

/// Summary of overlays whose resources failed to load.
#[derive(Debug, Default)]
pub struct ErrorBannerNode;

impl NodeBehavior<ViewState, FrameState> for ErrorBannerNode {
    fn create_element(&self, tree: &mut ElementTree) -> VeneerResult<ElementId> {
        tree.create("banner")
    }

    fn render_self(&mut self, state: &ViewState, element: &mut Element) -> VeneerResult<()> {
        let n = state.decode_errors.len();
        element.set_text(if n == 1 {
            "1 overlay failed to load".to_owned()
        } else {
            format!("{n} overlays failed to load")
        });
        let ids: Vec<&str> = state.decode_errors.iter().map(|(id, _)| id.as_str()).collect();
        element.set_attr("data-ids", ids.join(","));
        Ok(())
    }

    fn is_shown(&self, state: &ViewState) -> bool {
        !state.decode_errors.is_empty()
    }
}

/// Overlay count badge on thumbnails.
#[derive(Debug, Default)]
pub struct ThumbnailBadgeNode;

impl NodeBehavior<ViewState, FrameState> for ThumbnailBadgeNode {
    fn create_element(&self, tree: &mut ElementTree) -> VeneerResult<ElementId> {
        tree.create("badge")
    }

    fn render_self(&mut self, state: &ViewState, element: &mut Element) -> VeneerResult<()> {
        element.set_text(state.overlay_count.to_string());
        if state.pending_count > 0 {
            element.set_attr("data-loading", "true");
        } else {
            element.remove_attr("data-loading");
        }
        Ok(())
    }

    fn is_shown(&self, state: &ViewState) -> bool {
        state.static_mode
    }
}

/// Canvas with tooltip, error banner and thumbnail badge children, in that order.
pub fn build_scene_tree(
    tree: &mut ElementTree,
    ctx: &NodeContext<FrameState>,
) -> VeneerResult<SceneNode<ViewState, FrameState>> {
    let children = vec![
        SceneNode::new(tree, TooltipNode, ctx, Vec::new())?,
        SceneNode::new(tree, ErrorBannerNode, ctx, Vec::new())?,
        SceneNode::new(tree, ThumbnailBadgeNode, ctx, Vec::new())?,
    ];
    SceneNode::new(tree, CanvasNode, ctx, children)
}
