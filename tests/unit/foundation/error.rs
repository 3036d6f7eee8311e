use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PlayerError::from(DecodeError::malformed("x"))
            .to_string()
            .contains("decode error: malformed container:")
    );
    assert!(
        PlayerError::from(RendererError::NotPrepared)
            .to_string()
            .contains("renderer error:")
    );
    assert!(
        PlayerError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PlayerError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
