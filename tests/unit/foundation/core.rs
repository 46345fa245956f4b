use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn fps_conversions() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.as_f64(), 30.0);
    assert_eq!(fps.secs_to_frames_floor(1.0), 30);
    assert!((fps.frames_to_secs(15) - 0.5).abs() < 1e-12);
    assert_eq!(fps.frame_duration().as_micros(), 33_333);
}

#[test]
fn canvas_video_validation() {
    assert!(Canvas::new(64, 36).validate_for_video().is_ok());
    assert!(Canvas::new(0, 36).validate_for_video().is_err());
    assert!(Canvas::new(63, 36).validate_for_video().is_err());
    assert!(Canvas::new(70_000, 36).validate_for_video().is_err());
}

#[test]
fn canvas_rgba_len() {
    assert_eq!(Canvas::new(16, 8).rgba_len(), 16 * 8 * 4);
    assert_eq!(Canvas::new(4, 0).rgba_len(), 0);
}
