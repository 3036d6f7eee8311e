use std::time::Duration;

use super::*;
use crate::foundation::core::FrameIndex;

fn doc(body: &str) -> String {
    format!(
        r#"{{"version":"1","fps":10,"canvas":{{"width":16,"height":16}},{body}}}"#
    )
}

const SOLID: &str = r##""assets":{"dot":{"kind":"solid","width":2,"height":2,"color":"#ff0000"}}"##;

#[test]
fn decodes_minimal_document() {
    let src = doc(&format!(
        r#"{SOLID},"frames":[{{"elements":[{{"asset":"dot","opacity":0.5,"z":1}}]}},{{"elements":[]}}]"#
    ));
    let m = decode_bytes(src.as_bytes(), None).unwrap();
    assert_eq!(m.frame_count(), 2);
    assert_eq!(m.loop_mode(), LoopMode::Loop);
    assert_eq!(m.fps().frame_duration(), Duration::from_millis(100));
    let f0 = m.frame(FrameIndex(0)).unwrap();
    assert_eq!(f0.elements().len(), 1);
    assert_eq!(f0.elements()[0].opacity, 0.5);
    assert_eq!(f0.duration(), Duration::from_millis(100));
}

#[test]
fn hold_expands_frame_slots_sharing_one_frame() {
    let src = doc(&format!(
        r#""loop":false,{SOLID},"frames":[{{"elements":[{{"asset":"dot"}}],"hold":3}},{{"elements":[]}}]"#
    ));
    let m = decode_bytes(src.as_bytes(), None).unwrap();
    assert_eq!(m.frame_count(), 4);
    assert_eq!(m.loop_mode(), LoopMode::Once);
    let a = m.frame(FrameIndex(0)).unwrap();
    let b = m.frame(FrameIndex(2)).unwrap();
    assert!(Arc::ptr_eq(a, b));
}

#[test]
fn empty_input_is_empty_source() {
    assert_eq!(decode_bytes(b"", None).unwrap_err(), DecodeError::EmptySource);
}

#[test]
fn garbage_is_malformed() {
    let err = decode_bytes(b"{not json", None).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedContainer(_)));
}

#[test]
fn unknown_version_is_unsupported_even_with_foreign_layout() {
    let err = decode_bytes(br#"{"version":"7","layers":[]}"#, None).unwrap_err();
    assert_eq!(err, DecodeError::UnsupportedVersion("7".to_owned()));
}

#[test]
fn zero_frames_is_malformed() {
    let src = doc(r#""frames":[]"#);
    let err = decode_bytes(src.as_bytes(), None).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedContainer(_)));
}

#[test]
fn unknown_asset_reference_is_missing_asset() {
    let src = doc(&format!(
        r#"{SOLID},"frames":[{{"elements":[{{"asset":"ghost"}}]}}]"#
    ));
    let err = decode_bytes(src.as_bytes(), None).unwrap_err();
    assert!(matches!(err, DecodeError::MissingAsset(ref m) if m.contains("ghost")));
}

#[test]
fn file_backed_asset_without_directory_is_missing_asset() {
    let src = doc(r#""assets":{"img":{"kind":"image","path":"a.png"}},"frames":[{"elements":[]}]"#);
    let err = decode_bytes(src.as_bytes(), None).unwrap_err();
    assert!(matches!(err, DecodeError::MissingAsset(_)));
}

#[test]
fn inline_image_and_path_assets_decode() {
    let src = doc(
        r#""assets":{
            "px":{"kind":"image","width":1,"height":1,"rgba":[255,255,255,128]},
            "tri":{"kind":"path","d":"M0,0 L4,0 L2,3 Z","fill":[0,0,255]},
            "logo":{"kind":"svg","markup":"<svg xmlns='http://www.w3.org/2000/svg' width='2' height='2'/>"}
        },
        "frames":[{"elements":[{"asset":"px"},{"asset":"tri","transform":{"translate":[1,1],"rotation_deg":90}}]}]"#,
    );
    let m = decode_bytes(src.as_bytes(), None).unwrap();
    let t = m.assets();
    assert_eq!(t.len(), 3);
    let Some(Asset::Image(img)) = t.get(t.id("px").unwrap()) else {
        panic!("expected image");
    };
    assert_eq!(img.rgba8_premul.as_slice(), &[128, 128, 128, 128]);
    assert!(matches!(t.get(t.id("tri").unwrap()), Some(Asset::Path(_))));
    assert!(matches!(t.get(t.id("logo").unwrap()), Some(Asset::Image(_))));
}

#[test]
fn image_with_both_sources_is_malformed() {
    let src = doc(
        r#""assets":{"px":{"kind":"image","path":"a.png","width":1,"height":1,"rgba":[0,0,0,0]}},"frames":[{"elements":[]}]"#,
    );
    let err = decode_bytes(src.as_bytes(), None).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedContainer(_)));
}

#[test]
fn hold_zero_is_malformed() {
    let src = doc(r#""frames":[{"elements":[],"hold":0}]"#);
    let err = decode_bytes(src.as_bytes(), None).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedContainer(_)));
}
