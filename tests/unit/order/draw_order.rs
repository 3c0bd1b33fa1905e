use super::*;
use crate::{foundation::core::Rect, overlay::model::Geometry, scene::events::EventQueue};

fn boxed(id: &str, field: &str) -> Overlay {
    Overlay::new(
        id,
        field,
        Geometry::BoundingBox {
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
        },
    )
}

fn cls(id: &str, field: &str) -> Overlay {
    Overlay::new(id, field, Geometry::Classification)
}

fn fields(f: &[&str]) -> Vec<String> {
    f.iter().map(|s| (*s).to_owned()).collect()
}

fn ids(order: &[OverlayId]) -> Vec<&str> {
    order.iter().map(OverlayId::as_str).collect()
}

#[test]
fn classification_first_then_fields_bottom_to_top() {
    let overlays = [boxed("A", "x"), boxed("B", "y"), cls("C", "z")];
    let order = compute_draw_order(&overlays, &fields(&["y", "x"]));
    assert_eq!(ids(&order), vec!["C", "B", "A"]);
}

#[test]
fn classifications_ignore_active_fields() {
    let overlays = [boxed("A", "x"), cls("C", "inactive")];
    assert_eq!(ids(&compute_draw_order(&overlays, &[])), vec!["C"]);
    let order = compute_draw_order(&overlays, &fields(&["x"]));
    assert_eq!(ids(&order), vec!["C", "A"]);
}

#[test]
fn inactive_and_empty_fields() {
    let overlays = [boxed("A", "x"), boxed("B", "hidden")];
    let order = compute_draw_order(&overlays, &fields(&["empty", "x"]));
    assert_eq!(ids(&order), vec!["A"]);
}

#[test]
fn z_index_sorts_stably_inside_a_bin() {
    let overlays = [
        boxed("a", "x").with_z_index(2),
        boxed("b", "x"),
        boxed("c", "x").with_z_index(-1),
        boxed("d", "x"),
        boxed("e", "y").with_z_index(-5),
    ];
    let order = compute_draw_order(&overlays, &fields(&["x", "y"]));
    assert_eq!(ids(&order), vec!["c", "b", "d", "a", "e"]);
}

#[test]
fn order_is_deterministic() {
    let overlays: Vec<Overlay> = (0..50)
        .map(|i| boxed(&format!("o{i}"), if i % 3 == 0 { "x" } else { "y" }))
        .collect();
    let f = fields(&["x", "y"]);
    let first = compute_draw_order(&overlays, &f);
    for _ in 0..5 {
        assert_eq!(compute_draw_order(&overlays, &f), first);
    }
}

#[test]
fn cache_is_reused_until_scene_or_fields_change() {
    let mut scene = OverlayScene::new("s", EventQueue::new());
    scene.insert(boxed("A", "x")).unwrap();
    scene.insert(boxed("B", "y")).unwrap();

    let mut engine = OrderingEngine::new();
    assert!(engine.set_active_fields(&fields(&["x", "y"])));
    assert_eq!(ids(engine.draw_order(&scene)), vec!["A", "B"]);
    engine.draw_order(&scene);
    assert_eq!(engine.recomputes(), 1);

    assert!(!engine.set_active_fields(&fields(&["x", "y"])));
    engine.draw_order(&scene);
    assert_eq!(engine.recomputes(), 1);

    assert!(engine.set_active_fields(&fields(&["y", "x"])));
    assert_eq!(ids(engine.draw_order(&scene)), vec!["B", "A"]);
    assert_eq!(engine.recomputes(), 2);

    scene.insert(boxed("C", "x")).unwrap();
    assert_eq!(ids(engine.draw_order(&scene)), vec!["B", "A", "C"]);
    assert_eq!(engine.recomputes(), 3);

    scene.set_field(&OverlayId::new("C"), "y".to_owned()).unwrap();
    assert_eq!(ids(engine.draw_order(&scene)), vec!["B", "C", "A"]);
}

#[test]
fn decode_progress_does_not_invalidate() {
    let mut scene = OverlayScene::new("s", EventQueue::new());
    scene.insert(boxed("A", "x")).unwrap();
    let mut engine = OrderingEngine::new();
    engine.set_active_fields(&fields(&["x"]));
    engine.draw_order(&scene);
    scene.settle_resource_free().unwrap();
    engine.draw_order(&scene);
    assert_eq!(engine.recomputes(), 1);
}
