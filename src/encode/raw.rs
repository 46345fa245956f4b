use crate::encode::encoder::{ChunkSender, EncoderBackend, EncoderHandle, EncoderOpts};
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::foundation::math::unpremultiply_in_place;
use crate::render::surface::{MediaStream, StreamRecv};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// MIME type reported by [`RawEncoderBackend`].
pub const RAW_MIME_TYPE: &str = "video/x-raw-rgba";

const POLL: Duration = Duration::from_millis(10);

/// Encoder that passes frames through without compression.
///
/// Every streamed frame becomes one chunk of tightly packed, straight-alpha RGBA8 bytes.
/// Useful for tests and for embedding without `ffmpeg`.
#[derive(Debug, Default)]
pub struct RawEncoderBackend;

impl RawEncoderBackend {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }
}

impl EncoderBackend for RawEncoderBackend {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn open(
        &mut self,
        stream: MediaStream,
        _opts: &EncoderOpts,
        out: ChunkSender,
    ) -> CaptureResult<Box<dyn EncoderHandle>> {
        let stop = Arc::new(AtomicBool::new(false));
        let worker = {
            let stop = stop.clone();
            std::thread::spawn(move || pass_frames(stream, &stop, &out))
        };
        Ok(Box::new(RawEncoderHandle {
            stop,
            worker: Some(worker),
        }))
    }
}

struct RawEncoderHandle {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<u64>>,
}

impl EncoderHandle for RawEncoderHandle {
    fn mime_type(&self) -> &str {
        RAW_MIME_TYPE
    }

    fn finish(mut self: Box<Self>) -> CaptureResult<()> {
        self.stop.store(true, Ordering::Release);
        let frames = match self.worker.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| CaptureError::encode("raw encoder thread panicked"))?,
            None => 0,
        };
        tracing::debug!(frames, "raw encoder finished");
        Ok(())
    }
}

impl Drop for RawEncoderHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}

fn pass_frames(stream: MediaStream, stop: &AtomicBool, out: &ChunkSender) -> u64 {
    let mut frames = 0u64;
    loop {
        let stopping = stop.load(Ordering::Acquire);
        // Drain whatever is queued before honoring a stop request.
        let recv = match stream.try_recv() {
            Some(frame) => StreamRecv::Frame(frame),
            None if stopping => break,
            None => stream.recv_timeout(POLL),
        };
        match recv {
            StreamRecv::Frame(frame) => {
                let mut data = frame.data.clone();
                if frame.premultiplied {
                    unpremultiply_in_place(&mut data);
                }
                frames += 1;
                if !out.send_chunk(data) {
                    break;
                }
            }
            StreamRecv::Timeout => {}
            StreamRecv::Ended => break,
        }
    }
    frames
}

#[cfg(test)]
#[path = "../../tests/unit/encode/raw.rs"]
mod tests;
