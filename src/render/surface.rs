use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::render::frame::FrameRGBA;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::time::Duration;

/// Result of waiting on a [`MediaStream`].
#[derive(Debug)]
pub enum StreamRecv {
    /// The next captured frame.
    Frame(Arc<FrameRGBA>),
    /// No frame arrived within the timeout.
    Timeout,
    /// The surface side went away; no more frames will arrive.
    Ended,
}

/// Live frame stream captured from a [`Surface`].
pub struct MediaStream {
    canvas: Canvas,
    fps: Fps,
    frames: Receiver<Arc<FrameRGBA>>,
}

impl MediaStream {
    /// Build a stream from its receiving half.
    pub fn new(canvas: Canvas, fps: Fps, frames: Receiver<Arc<FrameRGBA>>) -> Self {
        Self {
            canvas,
            fps,
            frames,
        }
    }

    /// Size of every frame on this stream.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Frame rate the stream was captured at.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Wait up to `timeout` for the next frame.
    pub fn recv_timeout(&self, timeout: Duration) -> StreamRecv {
        match self.frames.recv_timeout(timeout) {
            Ok(frame) => StreamRecv::Frame(frame),
            Err(RecvTimeoutError::Timeout) => StreamRecv::Timeout,
            Err(RecvTimeoutError::Disconnected) => StreamRecv::Ended,
        }
    }

    /// Take the next frame if one is already queued.
    pub fn try_recv(&self) -> Option<Arc<FrameRGBA>> {
        self.frames.try_recv().ok()
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("canvas", &self.canvas)
            .field("fps", &self.fps)
            .finish_non_exhaustive()
    }
}

/// A drawable that can emit a real-time frame stream.
///
/// This is the only contract the capture controller needs from the rendering side.
pub trait Surface {
    /// Current drawable size.
    fn canvas(&self) -> Canvas;

    /// Whether a stream can currently be captured.
    fn is_capturable(&self) -> bool {
        true
    }

    /// Open a stream that receives frames at most `fps` times per second.
    fn capture_stream(&mut self, fps: Fps) -> CaptureResult<MediaStream>;
}

struct StreamTap {
    tx: SyncSender<Arc<FrameRGBA>>,
    min_interval: Duration,
    last_sent: Option<Duration>,
}

/// In-process surface the studio presents rendered frames to.
///
/// Presenting never blocks: a stream whose queue is full drops the frame, like a real-time
/// capture track would.
pub struct CanvasSurface {
    canvas: Canvas,
    capacity: usize,
    attached: bool,
    latest: Option<Arc<FrameRGBA>>,
    taps: Vec<StreamTap>,
    dropped_frames: u64,
}

impl CanvasSurface {
    /// Create a surface of `canvas` size whose streams buffer up to `capacity` frames.
    pub fn new(canvas: Canvas, capacity: usize) -> Self {
        Self {
            canvas,
            capacity: capacity.max(1),
            attached: true,
            latest: None,
            taps: Vec::new(),
            dropped_frames: 0,
        }
    }

    /// Mark the surface as (de)attached; a detached surface cannot be captured.
    pub fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    /// Resize the drawable. Open streams are ended since their frame size no longer matches.
    pub fn resize(&mut self, canvas: Canvas) {
        if canvas != self.canvas {
            self.canvas = canvas;
            self.latest = None;
            self.taps.clear();
        }
    }

    /// Publish `frame` rendered at scene time `at` to every open stream.
    pub fn present(&mut self, frame: FrameRGBA, at: Duration) -> CaptureResult<()> {
        if frame.width != self.canvas.width || frame.height != self.canvas.height {
            return Err(CaptureError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.canvas.width, self.canvas.height
            )));
        }

        let frame = Arc::new(frame);
        let mut dropped = 0u64;
        self.taps.retain_mut(|tap| {
            if let Some(last) = tap.last_sent
                && at.saturating_sub(last) < tap.min_interval
            {
                return true;
            }
            match tap.tx.try_send(frame.clone()) {
                Ok(()) => {
                    tap.last_sent = Some(at);
                    true
                }
                Err(TrySendError::Full(_)) => {
                    dropped += 1;
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            }
        });
        if dropped > 0 {
            self.dropped_frames += dropped;
            tracing::trace!(dropped, "stream queue full, frame dropped");
        }
        self.latest = Some(frame);
        Ok(())
    }

    /// Most recently presented frame.
    pub fn latest(&self) -> Option<&FrameRGBA> {
        self.latest.as_deref()
    }

    /// Number of streams not yet observed as closed.
    pub fn stream_count(&self) -> usize {
        self.taps.len()
    }

    /// Frames dropped because a stream was not keeping up.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }
}

impl Surface for CanvasSurface {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn is_capturable(&self) -> bool {
        self.attached
    }

    fn capture_stream(&mut self, fps: Fps) -> CaptureResult<MediaStream> {
        if !self.attached {
            return Err(CaptureError::invalid_surface("surface is detached"));
        }
        let (tx, rx) = mpsc::sync_channel(self.capacity);
        if let Some(frame) = self.latest.as_ref() {
            // The stream starts with whatever is currently on screen.
            let _ = tx.try_send(frame.clone());
        }
        self.taps.push(StreamTap {
            tx,
            min_interval: fps.frame_duration().mul_f64(0.999),
            last_sent: None,
        });
        tracing::debug!(
            width = self.canvas.width,
            height = self.canvas.height,
            fps = fps.as_f64(),
            "stream captured"
        );
        Ok(MediaStream::new(self.canvas, fps, rx))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
