use super::*;

#[test]
fn segment_distance_projects_onto_interior() {
    let d = segment_distance(Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 3.0));
    assert!((d - 3.0).abs() < 1e-9);
}

#[test]
fn segment_distance_clamps_to_endpoints() {
    let d = segment_distance(Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(13.0, 4.0));
    assert!((d - 5.0).abs() < 1e-9);
}

#[test]
fn polyline_distance_considers_closing_segment() {
    let pts = [
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(10.0, 10.0),
    ];
    let p = Point::new(4.0, 5.0);
    let open = polyline_distance(&pts, false, p);
    let closed = polyline_distance(&pts, true, p);
    assert!(closed < open);
}

#[test]
fn bounds_and_centroid_of_square() {
    let pts = [
        Point::new(0.0, 0.0),
        Point::new(4.0, 0.0),
        Point::new(4.0, 2.0),
        Point::new(0.0, 2.0),
    ];
    assert_eq!(bounds_of(&pts), Rect::new(0.0, 0.0, 4.0, 2.0));
    assert_eq!(centroid(&pts), Point::new(2.0, 1.0));
    assert_eq!(bounds_of(&[]), Rect::ZERO);
}

#[test]
fn convex_hull_drops_interior_points() {
    let pts = [
        Point::new(0.0, 0.0),
        Point::new(2.0, 2.0),
        Point::new(4.0, 0.0),
        Point::new(4.0, 4.0),
        Point::new(0.0, 4.0),
        Point::new(1.0, 3.0),
    ];
    let hull = convex_hull(&pts);
    assert_eq!(hull.len(), 4);
    assert!(!hull.contains(&Point::new(2.0, 2.0)));
}

#[test]
fn fnv1a64_matches_reference_vector() {
    let mut h = Fnv1a64::new_default();
    h.write_bytes(b"a");
    assert_eq!(h.finish(), 0xaf63_dc4c_8601_ec8c);
    assert_eq!(Fnv1a64::new_default().finish(), Fnv1a64::OFFSET_BASIS);
}
