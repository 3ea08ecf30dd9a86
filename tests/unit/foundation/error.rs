use super::*;

#[test]
fn display_prefixes_are_stable() {
    for (err, prefix) in [
        (ClipError::format("x"), "format error:"),
        (ClipError::validation("x"), "validation error:"),
        (
            ClipError::transcode(Stage::FrameExtraction, "x"),
            "transcode error during frame extraction:",
        ),
        (
            ClipError::io(Stage::Workspace, std::io::Error::other("x")),
            "io error during workspace setup:",
        ),
    ] {
        assert!(err.to_string().starts_with(prefix), "{err}");
    }
}

#[test]
fn stage_is_reported_for_stage_carrying_errors() {
    assert_eq!(
        ClipError::transcode(Stage::AudioExtraction, "boom").stage(),
        Some(Stage::AudioExtraction)
    );
    let cleanup = ClipError::io(Stage::Cleanup, std::io::Error::other("boom"));
    assert_eq!(cleanup.stage(), Some(Stage::Cleanup));
    assert_eq!(ClipError::format("bad").stage(), Some(Stage::InputDecode));
    assert_eq!(ClipError::validation("bad").stage(), None);
}

#[test]
fn predicates_match_variants() {
    assert!(ClipError::format("x").is_format());
    let transcode = ClipError::transcode(Stage::AudioExtraction, "x");
    assert!(transcode.is_transcode());
    let io = ClipError::io(Stage::OutputEncode, std::io::Error::other("x"));
    assert!(io.is_io());
    assert!(!ClipError::validation("x").is_io());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ClipError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn io_error_exposes_source() {
    use std::error::Error as _;

    let err = ClipError::io(
        Stage::InputDecode,
        std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
    );
    let source = err.source().expect("io error has a source");
    assert!(source.to_string().contains("missing"));
}
