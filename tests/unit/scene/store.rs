use super::*;
use crate::{
    foundation::core::{Point, Rect, Vec2},
    overlay::model::Geometry,
};

fn bbox(id: &str) -> Overlay {
    Overlay::new(
        id,
        "gt",
        Geometry::BoundingBox {
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        },
    )
}

fn doc(id: &str) -> OverlayDoc {
    bbox(id).to_doc()
}

fn masked(id: &str) -> Overlay {
    bbox(id).with_mask_source(format!("{id}.png"))
}

fn full_mask() -> PreparedMask {
    PreparedMask::from_raw(2, 2, vec![255; 4]).unwrap()
}

fn scene() -> OverlayScene {
    OverlayScene::new("sample-1", EventQueue::new())
}

#[test]
fn load_rejects_duplicate_ids_without_touching_state() {
    let mut s = scene();
    s.insert(bbox("keep")).unwrap();
    let before = s.version();

    let err = s.load(vec![doc("a"), doc("a")]).unwrap_err();
    assert!(err.to_string().contains("duplicate overlay id"));
    assert_eq!(s.len(), 1);
    assert!(s.contains(&OverlayId::new("keep")));
    assert_eq!(s.version(), before);
}

#[test]
fn load_replaces_collection_in_document_order() {
    let mut s = scene();
    s.insert(bbox("old")).unwrap();
    s.load(vec![doc("b"), doc("a")]).unwrap();
    let ids: Vec<&str> = s.iter().map(|o| o.id().as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[test]
fn insert_rejects_duplicate_and_bumps_version() {
    let mut s = scene();
    let v0 = s.version();
    s.insert(bbox("a")).unwrap();
    assert!(s.version() > v0);
    let v1 = s.version();
    assert!(s.insert(bbox("a")).is_err());
    assert_eq!(s.version(), v1);
}

#[test]
fn remove_disposes_deselects_and_bumps_version() {
    let mut s = scene();
    s.insert(bbox("a")).unwrap();
    s.toggle_selection(&OverlayId::new("a"), false).unwrap();
    let v = s.version();

    let removed = s.remove(&OverlayId::new("a")).unwrap();
    assert!(removed.is_disposed());
    assert!(s.selected().is_empty());
    assert!(s.version() > v);
    assert!(s.remove(&OverlayId::new("a")).is_err());
}

#[test]
fn decode_success_marks_decoded_and_requests_rerender() {
    let mut s = scene();
    s.insert(masked("m")).unwrap();
    let tickets = s.take_decode_requests();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].source, "m.png");
    s.events().take();

    let out = s.complete_decode(&tickets[0], Ok(full_mask())).unwrap();
    assert_eq!(out, DecodeOutcome::Applied);
    let o = s.get(&OverlayId::new("m")).unwrap();
    assert_eq!(o.render_status(), RenderStatus::Decoded);
    assert!(o.mask().is_some());

    let evs = s.events().take();
    assert_eq!(evs.len(), 1);
    assert!(evs[0].is(events::RERENDER));
}

#[test]
fn decode_after_remove_or_reset_is_discarded() {
    let mut s = scene();
    s.insert(masked("m")).unwrap();
    s.insert(masked("n")).unwrap();
    let tickets = s.take_decode_requests();

    s.remove(&OverlayId::new("m")).unwrap();
    assert_eq!(
        s.complete_decode(&tickets[0], Ok(full_mask())).unwrap(),
        DecodeOutcome::Discarded
    );

    s.request_reload(&OverlayId::new("n")).unwrap();
    assert_eq!(
        s.complete_decode(&tickets[1], Ok(full_mask())).unwrap(),
        DecodeOutcome::Discarded
    );
    let fresh = s.take_decode_requests();
    assert_eq!(fresh.len(), 1);
    assert!(fresh[0].generation > tickets[1].generation);
    assert_eq!(
        s.complete_decode(&fresh[0], Ok(full_mask())).unwrap(),
        DecodeOutcome::Applied
    );
}

#[test]
fn reload_with_new_mask_source_discards_old_ticket() {
    let mut s = scene();
    s.load(vec![bbox("m").with_mask_source("old.png").to_doc()])
        .unwrap();
    let old = s.take_decode_requests().remove(0);

    s.load(vec![bbox("m").with_mask_source("new.png").to_doc()])
        .unwrap();
    let new = s.take_decode_requests().remove(0);
    assert_eq!(new.source, "new.png");
    assert_ne!(old.generation, new.generation);

    assert_eq!(
        s.complete_decode(&old, Ok(full_mask())).unwrap(),
        DecodeOutcome::Discarded
    );
    assert_eq!(
        s.get(&OverlayId::new("m")).unwrap().render_status(),
        RenderStatus::Pending
    );
    assert_eq!(
        s.complete_decode(&new, Ok(full_mask())).unwrap(),
        DecodeOutcome::Applied
    );
}

#[test]
fn reinserted_overlay_ignores_ticket_of_removed_instance() {
    let mut s = scene();
    s.insert(masked("m")).unwrap();
    let stale = s.take_decode_requests().remove(0);

    let removed = s.remove(&OverlayId::new("m")).unwrap();
    s.insert(Overlay::from_doc(removed.to_doc()).unwrap())
        .unwrap();
    let current = s.take_decode_requests().remove(0);

    assert_eq!(
        s.complete_decode(&stale, Ok(full_mask())).unwrap(),
        DecodeOutcome::Discarded
    );
    assert_eq!(
        s.complete_decode(&current, Ok(full_mask())).unwrap(),
        DecodeOutcome::Applied
    );
}

#[test]
fn decode_failure_reports_error_and_stays_pending() {
    let mut s = scene();
    s.insert(masked("m")).unwrap();
    let tickets = s.take_decode_requests();
    s.events().take();

    let out = s
        .complete_decode(&tickets[0], Err(VeneerError::decode("corrupt png")))
        .unwrap();
    assert_eq!(out, DecodeOutcome::Failed);
    let o = s.get(&OverlayId::new("m")).unwrap();
    assert_eq!(o.render_status(), RenderStatus::Pending);
    assert!(o.load_error().unwrap().contains("corrupt png"));

    let evs = s.events().take();
    assert!(evs[0].is(events::DECODE_ERROR));
    assert_eq!(evs[0].details.as_ref().unwrap()["id"], "m");

    // A failed overlay is not promoted by the resource-free pass either.
    s.settle_resource_free().unwrap();
    assert_eq!(
        s.get(&OverlayId::new("m")).unwrap().render_status(),
        RenderStatus::Pending
    );
}

#[test]
fn settle_promotes_only_overlays_without_resources() {
    let mut s = scene();
    s.insert(bbox("plain")).unwrap();
    s.insert(masked("m")).unwrap();
    s.settle_resource_free().unwrap();
    assert_eq!(
        s.get(&OverlayId::new("plain")).unwrap().render_status(),
        RenderStatus::Decoded
    );
    assert_eq!(
        s.get(&OverlayId::new("m")).unwrap().render_status(),
        RenderStatus::Pending
    );
    // Second pass is a no-op rather than an illegal transition.
    s.settle_resource_free().unwrap();
}

#[test]
fn selection_toggles_and_announces() {
    let mut s = scene();
    s.insert(bbox("a")).unwrap();
    s.insert(bbox("b")).unwrap();
    let a = OverlayId::new("a");
    let b = OverlayId::new("b");

    s.toggle_selection(&a, false).unwrap();
    s.toggle_selection(&b, true).unwrap();
    assert_eq!(s.selected().len(), 2);
    s.toggle_selection(&b, false).unwrap();
    assert_eq!(s.selected().len(), 0);
    assert!(s.toggle_selection(&OverlayId::new("zzz"), false).is_err());

    let evs = s.events().take();
    assert_eq!(evs.len(), 3);
    assert!(evs.iter().all(|e| e.is(events::SELECT)));
    assert_eq!(
        evs[1].details.as_ref().unwrap()["selected"],
        serde_json::json!(["a", "b"])
    );

    s.clear_selection();
    assert!(s.events().is_empty());
}

#[test]
fn emit_commit_carries_scene_space_geometry() {
    let mut s = scene();
    s.insert(bbox("a")).unwrap();
    let id = OverlayId::new("a");
    s.set_transform(
        &id,
        Transform2D {
            translate: Vec2::new(5.0, 0.0),
            ..Transform2D::default()
        },
    )
    .unwrap();
    s.emit_commit(&id).unwrap();

    let evs = s.events().take();
    let payload: CommitPayload =
        serde_json::from_value(evs[0].details.clone().unwrap()).unwrap();
    assert_eq!(payload.sample_id, "sample-1");
    assert_eq!(
        payload.geometry,
        Geometry::BoundingBox {
            rect: Rect::new(5.0, 0.0, 15.0, 10.0)
        }
    );
    assert!(s.get(&id).unwrap().hit_test(Point::new(14.0, 5.0)));
}

#[test]
fn set_field_bumps_version_and_rejects_blank() {
    let mut s = scene();
    s.insert(bbox("a")).unwrap();
    let id = OverlayId::new("a");
    let v = s.version();
    assert_eq!(s.set_field(&id, "pred".to_owned()).unwrap(), "gt");
    assert!(s.version() > v);
    assert!(s.set_field(&id, "  ".to_owned()).is_err());
    assert_eq!(s.set_label(&id, "cat".to_owned()).unwrap(), "");
}
