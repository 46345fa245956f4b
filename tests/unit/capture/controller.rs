use super::*;
use crate::capture::artifact::InMemorySaver;
use crate::encode::encoder::EncoderOpts;
use crate::foundation::core::{Canvas, Fps};
use crate::render::surface::{CanvasSurface, MediaStream};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Script {
    senders: Arc<Mutex<Vec<ChunkSender>>>,
    finished: Arc<Mutex<Vec<SessionId>>>,
    fail_open: bool,
    fail_finish: bool,
    tail: Vec<Vec<u8>>,
}

impl Script {
    fn sender(&self, i: usize) -> ChunkSender {
        self.senders.lock().unwrap()[i].clone()
    }

    fn finished(&self) -> Vec<SessionId> {
        self.finished.lock().unwrap().clone()
    }
}

struct ScriptedBackend(Script);

impl EncoderBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn open(
        &mut self,
        _stream: MediaStream,
        _opts: &EncoderOpts,
        out: ChunkSender,
    ) -> CaptureResult<Box<dyn EncoderHandle>> {
        if self.0.fail_open {
            return Err(CaptureError::encode("no encoder"));
        }
        self.0.senders.lock().unwrap().push(out.clone());
        Ok(Box::new(ScriptedHandle {
            out,
            script: self.0.clone(),
        }))
    }
}

struct ScriptedHandle {
    out: ChunkSender,
    script: Script,
}

impl EncoderHandle for ScriptedHandle {
    fn mime_type(&self) -> &str {
        "video/webm"
    }

    fn finish(self: Box<Self>) -> CaptureResult<()> {
        for chunk in &self.script.tail {
            self.out.send_chunk(chunk.clone());
        }
        self.script.finished.lock().unwrap().push(self.out.session());
        if self.script.fail_finish {
            return Err(CaptureError::encode("finalize failed"));
        }
        Ok(())
    }
}

struct FailingSaver;

impl ArtifactSaver for FailingSaver {
    fn save(&mut self, _artifact: &Artifact) -> CaptureResult<()> {
        Err(CaptureError::encode("disk full"))
    }
}

struct NoStreamSurface;

impl Surface for NoStreamSurface {
    fn canvas(&self) -> Canvas {
        Canvas::new(64, 36)
    }

    fn capture_stream(&mut self, _fps: Fps) -> CaptureResult<MediaStream> {
        Err(CaptureError::encode("stream unavailable"))
    }
}

fn surface() -> CanvasSurface {
    CanvasSurface::new(Canvas::new(64, 36), 4)
}

fn controller(script: &Script, saver: &InMemorySaver) -> CaptureController {
    CaptureController::new(
        CaptureConfig::default(),
        Box::new(ScriptedBackend(script.clone())),
        Box::new(saver.clone()),
    )
    .unwrap()
}

#[test]
fn chunks_are_exported_in_emission_order() {
    let script = Script::default();
    let saver = InMemorySaver::new();
    let mut c = controller(&script, &saver);
    let mut s = surface();

    c.start_recording(&mut s).unwrap();
    assert!(c.is_recording());
    let out = script.sender(0);
    out.send_chunk(b"A".to_vec());
    out.send_chunk(b"BB".to_vec());
    out.send_chunk(b"CCC".to_vec());
    c.stop_recording();
    assert_eq!(c.state(), CaptureState::Stopped);

    let artifact = c.download_video().unwrap().unwrap();
    assert_eq!(artifact.data(), b"ABBCCC");
    assert_eq!(artifact.file_name(), "animation.webm");
    assert_eq!(artifact.mime_type(), "video/webm");
    assert_eq!(saver.saved(), vec![artifact]);
}

#[test]
fn stop_appends_chunks_flushed_during_finalize() {
    let script = Script {
        tail: vec![b"tail".to_vec()],
        ..Script::default()
    };
    let saver = InMemorySaver::new();
    let mut c = controller(&script, &saver);
    let mut s = surface();

    c.start_recording(&mut s).unwrap();
    script.sender(0).send_chunk(b"head".to_vec());
    c.stop_recording();
    assert_eq!(c.chunks(), &[b"head".to_vec(), b"tail".to_vec()]);
}

#[test]
fn stop_when_not_recording_is_a_noop() {
    let script = Script::default();
    let saver = InMemorySaver::new();
    let mut c = controller(&script, &saver);

    c.stop_recording();
    assert_eq!(c.state(), CaptureState::Idle);

    let mut s = surface();
    c.start_recording(&mut s).unwrap();
    c.stop_recording();
    c.stop_recording();
    assert_eq!(c.state(), CaptureState::Stopped);
    assert_eq!(script.finished().len(), 1);
}

#[test]
fn empty_download_is_a_noop() {
    let script = Script::default();
    let saver = InMemorySaver::new();
    let mut c = controller(&script, &saver);

    assert!(c.download_video().unwrap().is_none());

    let mut s = surface();
    c.start_recording(&mut s).unwrap();
    c.stop_recording();
    assert!(c.download_video().unwrap().is_none());
    assert!(saver.saved().is_empty());
}

#[test]
fn empty_chunks_are_not_appended() {
    let script = Script::default();
    let saver = InMemorySaver::new();
    let mut c = controller(&script, &saver);
    let mut s = surface();

    c.start_recording(&mut s).unwrap();
    script.sender(0).send_chunk(Vec::new());
    assert_eq!(c.pump(), 0);
    c.stop_recording();
    assert!(c.chunks().is_empty());
}

#[test]
fn restart_discards_previous_session() {
    let script = Script::default();
    let saver = InMemorySaver::new();
    let mut c = controller(&script, &saver);
    let mut s = surface();

    c.start_recording(&mut s).unwrap();
    let first = script.sender(0);
    first.send_chunk(b"old".to_vec());
    assert_eq!(c.pump(), 1);

    c.start_recording(&mut s).unwrap();
    assert!(c.is_recording());
    assert!(c.chunks().is_empty());
    assert_eq!(script.finished(), vec![first.session()]);

    // Late output from the replaced encoder never reaches the new session.
    assert!(!first.send_chunk(b"late".to_vec()));
    script.sender(1).send_chunk(b"new".to_vec());
    c.stop_recording();

    let artifact = c.download_video().unwrap().unwrap();
    assert_eq!(artifact.data(), b"new");
}

#[test]
fn invalid_surface_leaves_controller_idle() {
    let script = Script::default();
    let saver = InMemorySaver::new();
    let mut c = controller(&script, &saver);

    let mut detached = surface();
    detached.set_attached(false);
    assert!(matches!(
        c.start_recording(&mut detached),
        Err(CaptureError::InvalidSurface(_))
    ));
    assert_eq!(c.state(), CaptureState::Idle);

    let mut zero = CanvasSurface::new(Canvas::new(0, 0), 4);
    assert!(matches!(
        c.start_recording(&mut zero),
        Err(CaptureError::InvalidSurface(_))
    ));
    assert_eq!(c.state(), CaptureState::Idle);
    assert!(c.chunks().is_empty());
    assert!(script.senders.lock().unwrap().is_empty());
}

#[test]
fn invalid_surface_does_not_disturb_a_running_session() {
    let script = Script::default();
    let saver = InMemorySaver::new();
    let mut c = controller(&script, &saver);
    let mut s = surface();

    c.start_recording(&mut s).unwrap();
    script.sender(0).send_chunk(b"keep".to_vec());
    c.pump();

    let mut detached = surface();
    detached.set_attached(false);
    assert!(c.start_recording(&mut detached).is_err());
    assert!(c.is_recording());
    assert_eq!(c.chunks(), &[b"keep".to_vec()]);
}

#[test]
fn encoder_open_failure_rolls_back_to_idle() {
    let script = Script {
        fail_open: true,
        ..Script::default()
    };
    let saver = InMemorySaver::new();
    let mut c = controller(&script, &saver);
    let mut s = surface();

    assert!(matches!(
        c.start_recording(&mut s),
        Err(CaptureError::RecordingStart(_))
    ));
    assert_eq!(c.state(), CaptureState::Idle);
    assert!(!c.is_recording());
}

#[test]
fn stream_failure_is_a_start_error() {
    let script = Script::default();
    let saver = InMemorySaver::new();
    let mut c = controller(&script, &saver);

    assert!(matches!(
        c.start_recording(&mut NoStreamSurface),
        Err(CaptureError::RecordingStart(_))
    ));
    assert_eq!(c.state(), CaptureState::Idle);
}

#[test]
fn finalize_failure_still_stops_with_captured_chunks() {
    let script = Script {
        fail_finish: true,
        ..Script::default()
    };
    let saver = InMemorySaver::new();
    let mut c = controller(&script, &saver);
    let mut s = surface();

    c.start_recording(&mut s).unwrap();
    script.sender(0).send_chunk(b"partial".to_vec());
    c.stop_recording();
    assert_eq!(c.state(), CaptureState::Stopped);
    assert_eq!(c.download_video().unwrap().unwrap().data(), b"partial");
}

#[test]
fn dropping_a_recording_controller_finalizes_even_when_finish_fails() {
    let script = Script {
        fail_finish: true,
        ..Script::default()
    };
    let mut c = controller(&script, &InMemorySaver::new());
    let mut s = surface();

    c.start_recording(&mut s).unwrap();
    let session = c.session_id();
    drop(c);
    assert_eq!(script.finished(), vec![session]);
}

#[test]
fn export_failure_keeps_chunks_for_retry() {
    let script = Script::default();
    let mut c = CaptureController::new(
        CaptureConfig::default(),
        Box::new(ScriptedBackend(script.clone())),
        Box::new(FailingSaver),
    )
    .unwrap();
    let mut s = surface();

    c.start_recording(&mut s).unwrap();
    script.sender(0).send_chunk(b"x".to_vec());
    c.stop_recording();

    assert!(matches!(c.download_video(), Err(CaptureError::Export(_))));
    assert_eq!(c.chunks(), &[b"x".to_vec()]);
    assert!(matches!(c.download_video(), Err(CaptureError::Export(_))));
    assert_eq!(c.captured_bytes(), 1);
}

#[test]
fn download_while_recording_exports_progress_so_far() {
    let script = Script::default();
    let saver = InMemorySaver::new();
    let mut c = controller(&script, &saver);
    let mut s = surface();

    c.start_recording(&mut s).unwrap();
    script.sender(0).send_chunk(b"so-far".to_vec());
    let artifact = c.download_video().unwrap().unwrap();
    assert_eq!(artifact.data(), b"so-far");
    assert!(c.is_recording());
}

#[test]
fn is_recording_tracks_latest_start_and_stop() {
    let script = Script::default();
    let saver = InMemorySaver::new();
    let mut c = controller(&script, &saver);
    let mut s = surface();

    #[derive(Clone, Copy)]
    enum Op {
        Start,
        Stop,
    }
    let ops = [
        Op::Stop,
        Op::Start,
        Op::Start,
        Op::Stop,
        Op::Stop,
        Op::Start,
        Op::Stop,
        Op::Start,
    ];
    let mut expect = false;
    for op in ops {
        match op {
            Op::Start => {
                c.start_recording(&mut s).unwrap();
                expect = true;
            }
            Op::Stop => {
                c.stop_recording();
                expect = false;
            }
        }
        assert_eq!(c.is_recording(), expect);
    }
}

#[test]
fn new_rejects_invalid_config() {
    let cfg = CaptureConfig {
        bitrate_bps: 0,
        ..CaptureConfig::default()
    };
    let res = CaptureController::new(
        cfg,
        Box::new(ScriptedBackend(Script::default())),
        Box::new(InMemorySaver::new()),
    );
    assert!(res.is_err());
}
