use super::*;

#[test]
fn fps_frame_duration_and_floor() {
    let fps = Fps::new(10, 1).unwrap();
    assert_eq!(fps.frame_duration(), Duration::from_millis(100));
    assert_eq!(fps.frames_in(Duration::from_millis(99)), 0);
    assert_eq!(fps.frames_in(Duration::from_millis(100)), 1);
    assert_eq!(fps.frames_in(Duration::from_millis(250)), 2);
}

#[test]
fn fps_ntsc_frames_roundtrip_floor() {
    let fps = Fps::new(30000, 1001).unwrap();
    let d = fps.frames_to_duration(123);
    assert_eq!(fps.frames_in(d), 123);
}

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(24, 0).is_err());
}

#[test]
fn premul_conversion_rounds() {
    let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(c.to_array(), [128, 64, 0, 128]);
    assert_eq!(c.to_straight_rgba(), [255, 128, 0, 128]);
    assert_eq!(Rgba8Premul::transparent().to_straight_rgba(), [0, 0, 0, 0]);
}

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
