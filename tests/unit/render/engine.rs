use super::*;
use crate::{
    foundation::core::Rect,
    history::edits::{AddOverlay, EditOverlay},
    overlay::draw::{DrawCommand, RecordingTarget},
    overlay::model::{Geometry, Overlay},
    scene::events,
};

fn bbox_doc(id: &str, field: &str, rect: Rect) -> OverlayDoc {
    Overlay::new(id, field, Geometry::BoundingBox { rect })
        .with_label(id.to_uppercase())
        .to_doc()
}

fn engine_with(docs: Vec<OverlayDoc>) -> OverlayEngine {
    let mut e =
        OverlayEngine::new(SceneId::new("main"), "sample-1", EngineOpts::default()).unwrap();
    e.load(docs).unwrap();
    e
}

fn frame(fields: &[&str]) -> FrameState {
    FrameState::new("sample-1", fields)
}

fn status(e: &OverlayEngine, id: &str) -> RenderStatus {
    e.scene().get(&OverlayId::new(id)).unwrap().render_status()
}

fn ids(list: &[OverlayId]) -> Vec<&str> {
    list.iter().map(OverlayId::as_str).collect()
}

#[test]
fn masked_overlay_goes_pending_decoded_painted() {
    let mut doc = bbox_doc("m", "gt", Rect::new(0.0, 0.0, 10.0, 10.0));
    doc.mask = Some("masks/m.png".to_owned());
    let mut e = engine_with(vec![doc, bbox_doc("p", "gt", Rect::new(20.0, 0.0, 30.0, 10.0))]);
    let mut target = RecordingTarget::new();

    let report = e.render(&frame(&["gt"]), &mut target).unwrap();
    assert_eq!(ids(&report.drawn), vec!["p"]);
    assert_eq!(ids(&report.pending), vec!["m"]);
    assert_eq!(status(&e, "m"), RenderStatus::Pending);
    assert_eq!(status(&e, "p"), RenderStatus::Painted);

    let tickets = e.take_decode_requests();
    assert_eq!(tickets.len(), 1);
    let mask = PreparedMask::from_raw(1, 1, vec![255]).unwrap();
    assert_eq!(
        e.complete_decode(&tickets[0], Ok(mask)).unwrap(),
        DecodeOutcome::Applied
    );
    assert_eq!(status(&e, "m"), RenderStatus::Decoded);

    target.clear();
    let report = e.render(&frame(&["gt"]), &mut target).unwrap();
    assert_eq!(ids(&report.drawn), vec!["m", "p"]);
    assert!(report.pending.is_empty());
    assert_eq!(status(&e, "m"), RenderStatus::Painted);
    assert!(
        target
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Mask { .. }))
    );

    // Further passes redraw without leaving Painted.
    e.render(&frame(&["gt"]), &mut target).unwrap();
    assert_eq!(status(&e, "m"), RenderStatus::Painted);
}

#[test]
fn painting_follows_draw_order_and_skips_inactive_fields() {
    let mut e = engine_with(vec![
        bbox_doc("A", "x", Rect::new(0.0, 0.0, 1.0, 1.0)),
        bbox_doc("B", "y", Rect::new(0.0, 0.0, 1.0, 1.0)),
        Overlay::new("C", "labels", Geometry::Classification).to_doc(),
        bbox_doc("D", "off", Rect::new(0.0, 0.0, 1.0, 1.0)),
    ]);
    let mut target = RecordingTarget::new();
    e.render(&frame(&["y", "x"]), &mut target).unwrap();

    assert_eq!(ids(&target.painted_ids()), vec!["C", "B", "A"]);
    assert_eq!(status(&e, "D"), RenderStatus::Decoded);
}

#[test]
fn hovered_overlay_gets_tooltip_and_emphasis() {
    let mut e = engine_with(vec![bbox_doc("a", "gt", Rect::new(0.0, 0.0, 10.0, 10.0))]);
    let mut target = RecordingTarget::new();
    let f = frame(&["gt"]).with_pointer(Point::new(5.0, 5.0));
    let report = e.render(&f, &mut target).unwrap();

    assert_eq!(report.hits.topmost().map(OverlayId::as_str), Some("a"));
    let widths: Vec<f64> = target
        .commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::StrokePath { width, .. } => Some(*width),
            _ => None,
        })
        .collect();
    assert_eq!(widths, vec![4.0]);

    let root = e.tree().element(e.root_element()).unwrap();
    let tooltip = e.tree().element(root.children()[0]).unwrap();
    assert_eq!(tooltip.tag(), "tooltip");
    assert_eq!(tooltip.text(), Some("A (gt)"));
}

#[test]
fn static_pass_has_no_hits_and_shows_badge() {
    let mut e = engine_with(vec![bbox_doc("a", "gt", Rect::new(0.0, 0.0, 10.0, 10.0))]);
    let f = frame(&["gt"])
        .with_pointer(Point::new(5.0, 5.0))
        .with_static(true);
    let report = e.render(&f, &mut RecordingTarget::new()).unwrap();
    assert_eq!(report.hits.hit_count(), 0);
    assert_eq!(ids(report.hits.ordered()), vec!["a"]);

    let root = e.tree().element(e.root_element()).unwrap();
    let tags: Vec<&str> = root
        .children()
        .iter()
        .map(|&c| e.tree().element(c).unwrap().tag())
        .collect();
    assert_eq!(tags, vec!["badge"]);
}

#[test]
fn decode_failure_shows_banner_and_rest_still_renders() {
    let mut doc = bbox_doc("m", "gt", Rect::new(0.0, 0.0, 10.0, 10.0));
    doc.mask = Some("broken.png".to_owned());
    let mut e = engine_with(vec![doc, bbox_doc("p", "gt", Rect::new(0.0, 0.0, 1.0, 1.0))]);
    let ticket = e.take_decode_requests().remove(0);
    e.complete_decode(&ticket, Err(VeneerError::decode("truncated")))
        .unwrap();

    let report = e.render(&frame(&["gt"]), &mut RecordingTarget::new()).unwrap();
    assert_eq!(ids(&report.drawn), vec!["p"]);

    let root = e.tree().element(e.root_element()).unwrap();
    let banner = e.tree().element(root.children()[0]).unwrap();
    assert_eq!(banner.tag(), "banner");
    assert_eq!(banner.attr("data-ids"), Some("m"));
    assert!(
        e.take_events()
            .iter()
            .any(|ev| ev.is(events::DECODE_ERROR))
    );
}

#[test]
fn wrong_sample_is_rejected() {
    let mut e = engine_with(Vec::new());
    let f = FrameState::new("other", &["gt"]);
    assert!(e.render(&f, &mut RecordingTarget::new()).is_err());
}

#[test]
fn pointer_down_selects_topmost_and_miss_clears() {
    let mut e = engine_with(vec![
        bbox_doc("big", "gt", Rect::new(0.0, 0.0, 100.0, 100.0)),
        bbox_doc("small", "gt", Rect::new(40.0, 40.0, 60.0, 60.0)),
    ]);
    e.render(&frame(&["gt"]), &mut RecordingTarget::new()).unwrap();

    let hit = e.pointer_down(Point::new(50.0, 50.0), false).unwrap();
    assert_eq!(hit.as_ref().map(OverlayId::as_str), Some("small"));
    e.pointer_down(Point::new(5.0, 5.0), true).unwrap();
    assert_eq!(e.scene().selected().len(), 2);

    assert!(e.pointer_down(Point::new(500.0, 500.0), false).unwrap().is_none());
    assert!(e.scene().selected().is_empty());
}

#[test]
fn delete_key_removes_selection_undoably() {
    let mut e = engine_with(vec![bbox_doc("a", "gt", Rect::new(0.0, 0.0, 10.0, 10.0))]);
    e.render(&frame(&["gt"]), &mut RecordingTarget::new()).unwrap();
    e.handle_ui_event(&UiEvent::new(POINTER_DOWN).at(Point::new(5.0, 5.0)))
        .unwrap();
    e.take_events();

    e.handle_ui_event(&UiEvent::new(KEY_DOWN).with_key("Delete"))
        .unwrap();
    assert!(e.scene().is_empty());
    assert!(e.take_events().iter().any(|ev| ev.is(events::REMOVE)));

    assert_eq!(e.undo().unwrap().as_deref(), Some("remove overlay 'a'"));
    assert_eq!(e.scene().len(), 1);
    let report = e.render(&frame(&["gt"]), &mut RecordingTarget::new()).unwrap();
    assert_eq!(ids(&report.drawn), vec!["a"]);
}

#[test]
fn edits_go_through_history_and_emit_commits() {
    let mut e = engine_with(Vec::new());
    let drawn = Overlay::new("n", "gt", Geometry::Classification).with_label("cat");
    e.apply(AddOverlay::new(&drawn)).unwrap();
    e.apply(EditOverlay::label("n", "dog")).unwrap();
    assert_eq!(e.history().undo_len(), 2);

    assert_eq!(e.undo().unwrap().as_deref(), Some("set label of 'n'"));
    assert_eq!(e.scene().get(&OverlayId::new("n")).unwrap().label(), "cat");
    assert_eq!(e.redo().unwrap().as_deref(), Some("set label of 'n'"));

    let commits = e
        .take_events()
        .into_iter()
        .filter(|ev| ev.is(events::COMMIT))
        .count();
    assert_eq!(commits, 4);
}

#[test]
fn pointer_updates_flow_back_through_the_tree() {
    let mut e = engine_with(Vec::new());
    e.handle_ui_event(&UiEvent::new("pointermove").at(Point::new(1.0, 2.0)))
        .unwrap();
    let mut f = frame(&[]);
    assert_eq!(e.apply_updates(&mut f), 1);
    assert_eq!(f.pointer, Some(Point::new(1.0, 2.0)));
}

#[test]
fn render_pooled_reuses_scene_canvas() {
    let mut e = engine_with(vec![bbox_doc("a", "gt", Rect::new(0.0, 0.0, 1.0, 1.0))]);
    let mut pool = CanvasPool::default();
    let (_, canvas) = e.render_pooled(&frame(&["gt"]), &mut pool).unwrap();
    assert!(!canvas.is_empty());
    pool.release(canvas);
    let (_, canvas) = e.render_pooled(&frame(&["gt"]), &mut pool).unwrap();
    assert_eq!(canvas.scene(), e.id());
    assert_eq!(pool.stats().alloc_canvases, 1);
}

#[test]
fn teardown_disposes_everything() {
    let mut e = engine_with(vec![bbox_doc("a", "gt", Rect::new(0.0, 0.0, 1.0, 1.0))]);
    e.apply(EditOverlay::label("a", "x")).unwrap();
    e.teardown();
    assert!(e.scene().is_empty());
    assert!(!e.history().can_undo());
    let report = e.render(&frame(&["gt"]), &mut RecordingTarget::new()).unwrap();
    assert!(report.drawn.is_empty());
}

#[test]
fn engine_rejects_zero_capacity_history() {
    let opts = EngineOpts {
        history: HistoryOpts { max_size: 0 },
        ..EngineOpts::default()
    };
    assert!(OverlayEngine::new(SceneId::new("main"), "s", opts).is_err());
}

#[test]
fn loading_masked_overlay_is_not_a_pointer_target() {
    let mut doc = bbox_doc("m", "gt", Rect::new(0.0, 0.0, 10.0, 10.0));
    doc.mask = Some("m.png".to_owned());
    let mut e = engine_with(vec![doc]);
    let f = frame(&["gt"]).with_pointer(Point::new(5.0, 5.0));
    let report = e.render(&f, &mut RecordingTarget::new()).unwrap();
    assert!(report.hits.topmost().is_none());
    assert!(e.pointer_down(Point::new(5.0, 5.0), false).unwrap().is_none());
}
