use super::*;
use crate::scene::meteors::MeteorField;
use crate::scene::reveal::TextReveal;

fn empty_scene() -> Scene {
    Scene::from_parts(MeteorField::with_count(0, 1), TextReveal::default())
}

#[test]
fn empty_scene_is_solid_background() {
    let mut r = SceneRenderer::new(Canvas::new(64, 36)).unwrap();
    let frame = r.render(&empty_scene()).unwrap();
    assert_eq!((frame.width, frame.height), (64, 36));
    assert!(frame.premultiplied);
    assert_eq!(frame.data.len(), 64 * 36 * 4);
    for px in frame.data.chunks_exact(4) {
        assert_eq!(px, BACKGROUND_RGBA);
    }
}

#[test]
fn meteor_trail_brightens_pixels_along_its_path() {
    let canvas = Canvas::new(640, 360);
    let mut r = SceneRenderer::new(canvas).unwrap();
    let bg = r.render(&empty_scene()).unwrap();

    let scene = Scene::from_parts(
        MeteorField::from_meteors(
            vec![Meteor {
                pos: Point::new(2.0, 1.0),
                speed: 0.25,
            }],
            5,
        ),
        TextReveal::default(),
    );
    let frame = r.render(&scene).unwrap();
    assert_ne!(frame, bg);

    let lit = frame
        .data
        .chunks_exact(4)
        .filter(|px| px[2] > BACKGROUND_RGBA[2])
        .count();
    assert!(lit > 0);
}

#[test]
fn trail_just_behind_the_head_is_blue_tinted() {
    let canvas = Canvas::new(640, 360);
    let mut r = SceneRenderer::new(canvas).unwrap();
    let head = Point::new(0.0, 0.0);
    let field = MeteorField::from_meteors(vec![Meteor { pos: head, speed: 0.2 }], 1);
    let scene = Scene::from_parts(field, TextReveal::default());

    let frame = r.render(&scene).unwrap();
    let probe = r
        .camera()
        .project(canvas, Point::new(head.x - 0.15, head.y - 0.075));
    let px = frame
        .pixel(probe.x.floor() as u32, probe.y.floor() as u32)
        .unwrap();
    assert!(px[2] > px[0], "expected blue dominant, got {px:?}");
    assert!(px[2] > BACKGROUND_RGBA[2]);
}

#[test]
fn rendering_is_deterministic_for_a_seed() {
    let mut r = SceneRenderer::new(Canvas::new(128, 72)).unwrap();
    let mut a = Scene::new(9);
    let mut b = Scene::new(9);
    a.advance(std::time::Duration::from_millis(500));
    b.advance(std::time::Duration::from_millis(500));
    assert_eq!(r.render(&a).unwrap(), r.render(&b).unwrap());
}

#[test]
fn resize_changes_output_size() {
    let mut r = SceneRenderer::new(Canvas::new(64, 36)).unwrap();
    r.resize(Canvas::new(32, 18)).unwrap();
    let frame = r.render(&empty_scene()).unwrap();
    assert_eq!(frame.canvas(), Canvas::new(32, 18));
}

#[test]
fn invalid_canvas_is_rejected() {
    assert!(matches!(
        SceneRenderer::new(Canvas::new(0, 10)),
        Err(CaptureError::Render(_))
    ));
    assert!(SceneRenderer::new(Canvas::new(70_000, 10)).is_err());
    let mut r = SceneRenderer::new(Canvas::new(8, 8)).unwrap();
    assert!(r.resize(Canvas::new(8, 0)).is_err());
    assert_eq!(r.canvas(), Canvas::new(8, 8));
}

#[test]
fn text_is_skipped_without_a_font() {
    let mut r = SceneRenderer::new(Canvas::new(64, 36)).unwrap();
    assert!(!r.has_font());
    let mut scene = empty_scene();
    scene.reveal_mut().restart(std::time::Duration::ZERO);
    scene.advance(std::time::Duration::from_secs(3));
    assert!(scene.reveal().is_complete());
    let frame = r.render(&scene).unwrap();
    assert!(frame.data.chunks_exact(4).all(|px| px == BACKGROUND_RGBA));
}

#[test]
fn unreadable_font_is_a_render_error() {
    let r = SceneRenderer::new(Canvas::new(8, 8)).unwrap();
    assert!(matches!(
        r.with_font_file("/nonexistent/font.ttf"),
        Err(CaptureError::Render(_))
    ));
}

#[test]
fn garbage_font_bytes_are_rejected() {
    let r = SceneRenderer::new(Canvas::new(8, 8)).unwrap();
    assert!(r.with_font_bytes(b"not a font".to_vec()).is_err());
}
