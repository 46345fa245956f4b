use super::*;
use crate::encode::encoder::{EncoderEventKind, SessionId, VideoCodec};
use crate::foundation::core::{Canvas, Fps};
use crate::render::frame::FrameRGBA;
use std::sync::mpsc;

fn opts(timeslice_ms: u64) -> EncoderOpts {
    EncoderOpts {
        codec: VideoCodec::Vp8,
        bitrate_bps: 1,
        timeslice: Duration::from_millis(timeslice_ms),
        mime_type: "ignored".to_string(),
        bg_rgba: [0, 0, 0, 255],
    }
}

#[test]
fn finish_flushes_every_queued_frame_in_order() {
    let canvas = Canvas::new(2, 1);
    let (frame_tx, frame_rx) = mpsc::sync_channel(8);
    let stream = MediaStream::new(canvas, Fps::new(30, 1).unwrap(), frame_rx);
    let (tx, rx) = mpsc::channel();

    let mut backend = RawEncoderBackend::new();
    let handle = backend
        .open(stream, &opts(10_000), ChunkSender::new(SessionId(3), tx))
        .unwrap();
    assert_eq!(handle.mime_type(), RAW_MIME_TYPE);

    for v in 1..=3u8 {
        frame_tx
            .send(Arc::new(FrameRGBA::solid(canvas, [v, v, v, 255])))
            .unwrap();
    }
    handle.finish().unwrap();

    let mut bytes = Vec::new();
    for ev in rx.try_iter() {
        assert_eq!(ev.session, SessionId(3));
        match ev.kind {
            EncoderEventKind::Data(d) => bytes.extend(d),
            EncoderEventKind::Error(e) => panic!("unexpected error: {e}"),
        }
    }
    let firsts: Vec<u8> = bytes.chunks_exact(canvas.rgba_len()).map(|f| f[0]).collect();
    assert_eq!(firsts, vec![1, 2, 3]);
}

#[test]
fn finish_without_frames_emits_nothing() {
    let (_frame_tx, frame_rx) = mpsc::sync_channel(1);
    let stream = MediaStream::new(Canvas::new(2, 2), Fps::new(30, 1).unwrap(), frame_rx);
    let (tx, rx) = mpsc::channel();
    let handle = RawEncoderBackend::new()
        .open(stream, &opts(5), ChunkSender::new(SessionId(1), tx))
        .unwrap();
    handle.finish().unwrap();
    assert_eq!(rx.try_iter().count(), 0);
}

#[test]
fn each_frame_is_one_straight_alpha_chunk() {
    let canvas = Canvas::new(1, 1);
    let (frame_tx, frame_rx) = mpsc::sync_channel(4);
    let stream = MediaStream::new(canvas, Fps::new(30, 1).unwrap(), frame_rx);
    let (tx, rx) = mpsc::channel();
    let handle = RawEncoderBackend::new()
        .open(stream, &opts(10_000), ChunkSender::new(SessionId(2), tx))
        .unwrap();

    frame_tx
        .send(Arc::new(FrameRGBA::solid(canvas, [64, 32, 0, 128])))
        .unwrap();
    frame_tx
        .send(Arc::new(FrameRGBA::solid(canvas, [9, 9, 9, 255])))
        .unwrap();
    handle.finish().unwrap();

    let chunks: Vec<Vec<u8>> = rx
        .try_iter()
        .map(|ev| match ev.kind {
            EncoderEventKind::Data(d) => d,
            EncoderEventKind::Error(e) => panic!("unexpected error: {e}"),
        })
        .collect();
    assert_eq!(chunks, vec![vec![128, 64, 0, 128], vec![9, 9, 9, 255]]);
}
