use super::*;

#[test]
fn transform_to_affine_identity_and_translation() {
    let t = Transform2D::default();
    assert_eq!(t.to_affine(), Affine::IDENTITY);

    let t = Transform2D {
        translate: Vec2::new(10.0, -2.5),
        ..Transform2D::default()
    };
    assert_eq!(t.to_affine(), Affine::translate(Vec2::new(10.0, -2.5)));
}

#[test]
fn transform_affine_conversion_is_lossless() {
    let t = Transform2D {
        scale: Vec2::new(2.0, 3.0),
        skew: Vec2::new(0.25, -0.5),
        translate: Vec2::new(7.0, 8.0),
    };
    assert_eq!(Transform2D::from_affine(t.to_affine()), t);
}

#[test]
fn then_composes_on_top() {
    let t = Transform2D {
        translate: Vec2::new(1.0, 1.0),
        ..Transform2D::default()
    };
    let out = t.then(Affine::scale(2.0));
    assert_eq!(out.translate, Vec2::new(2.0, 2.0));
    assert_eq!(out.scale, Vec2::new(2.0, 2.0));
}

#[test]
fn zero_area_detection() {
    assert!(is_zero_area(Rect::ZERO));
    assert!(is_zero_area(Rect::new(0.0, 0.0, 5.0, 0.0)));
    assert!(!is_zero_area(Rect::new(0.0, 0.0, 5.0, 1.0)));
}

#[test]
fn overlay_id_serializes_as_plain_string() {
    let id = OverlayId::new("abc");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    assert_eq!(id.to_string(), "abc");
}

#[test]
fn premultiply_rounds_half_up() {
    let c = Rgba8Premul::from_straight_rgba(100, 50, 200, 128);
    assert_eq!(c.r, ((100u16 * 128 + 127) / 255) as u8);
    assert_eq!(c.a, 128);
    assert_eq!(Rgba8Premul::transparent().a, 0);
}
