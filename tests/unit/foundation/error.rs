use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        VeneerError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(VeneerError::scene("x").to_string().contains("scene error:"));
    assert!(
        VeneerError::history("x")
            .to_string()
            .contains("history error:")
    );
    assert!(VeneerError::decode("x").to_string().contains("decode error:"));
    assert!(
        VeneerError::persistence("x")
            .to_string()
            .contains("persistence error:")
    );
    assert!(
        VeneerError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = VeneerError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn serde_json_errors_map_to_serde_variant() {
    let err: VeneerError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, VeneerError::Serde(_)));
}
