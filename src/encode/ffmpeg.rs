use crate::encode::encoder::{ChunkSender, EncoderBackend, EncoderHandle, EncoderOpts};
use crate::foundation::core::Fps;
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::surface::{MediaStream, StreamRecv};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const READ_BUF_BYTES: usize = 64 * 1024;
const FEED_POLL: Duration = Duration::from_millis(20);

/// Encoder backend that spawns the system `ffmpeg` and streams raw frames to stdin.
///
/// The WebM container is written to stdout and handed to the controller in timeslice-sized
/// chunks, so a session that is cut short still has everything up to the last timeslice.
#[derive(Clone, Debug)]
pub struct FfmpegEncoderBackend {
    program: PathBuf,
}

impl Default for FfmpegEncoderBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegEncoderBackend {
    /// Use `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
        }
    }

    /// Use a specific ffmpeg executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, stream: &MediaStream, opts: &EncoderOpts) -> Command {
        let canvas = stream.canvas();
        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Input: raw RGBA8 frames, flattened to opaque before they hit stdin.
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", canvas.width, canvas.height),
        ]);
        push_input_fps(&mut cmd, stream.fps());
        cmd.args(["-i", "pipe:0", "-an"]);

        cmd.args([
            "-c:v",
            opts.codec.ffmpeg_encoder(),
            "-b:v",
            &opts.bitrate_bps.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-deadline",
            "realtime",
            "-cpu-used",
            "8",
            "-f",
            "webm",
            "pipe:1",
        ]);
        cmd
    }
}

impl EncoderBackend for FfmpegEncoderBackend {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    #[tracing::instrument(skip_all, fields(session = out.session().0))]
    fn open(
        &mut self,
        stream: MediaStream,
        opts: &EncoderOpts,
        out: ChunkSender,
    ) -> CaptureResult<Box<dyn EncoderHandle>> {
        stream.canvas().validate_for_video()?;
        if opts.bitrate_bps == 0 {
            return Err(CaptureError::validation("encoder bitrate must be non-zero"));
        }
        if !is_program_available(&self.program) {
            return Err(CaptureError::encode(format!(
                "'{}' is required for WebM encoding, but was not found on PATH",
                self.program.display()
            )));
        }

        let mut child = self.command(&stream, opts).spawn().map_err(|e| {
            CaptureError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CaptureError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CaptureError::encode("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| CaptureError::encode("failed to open ffmpeg stderr (unexpected)"))?;

        let stop = Arc::new(AtomicBool::new(false));
        let frame_len = stream.canvas().rgba_len();
        let bg = opts.bg_rgba;

        let feeder = {
            let stop = stop.clone();
            let out = out.clone();
            std::thread::spawn(move || feed_frames(stream, stdin, frame_len, bg, &stop, &out))
        };
        let reader = {
            let timeslice = opts.timeslice;
            std::thread::spawn(move || pump_output(stdout, &out, timeslice))
        };
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(codec = opts.codec.tag(), bitrate = opts.bitrate_bps, "ffmpeg started");
        Ok(Box::new(FfmpegEncoderHandle {
            mime_type: opts.mime_type.clone(),
            child: Some(child),
            stop,
            feeder: Some(feeder),
            reader: Some(reader),
            stderr_drain: Some(stderr_drain),
        }))
    }
}

/// A running ffmpeg process bound to one capture session.
pub struct FfmpegEncoderHandle {
    mime_type: String,
    child: Option<Child>,
    stop: Arc<AtomicBool>,
    feeder: Option<JoinHandle<std::io::Result<u64>>>,
    reader: Option<JoinHandle<std::io::Result<u64>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl EncoderHandle for FfmpegEncoderHandle {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn finish(mut self: Box<Self>) -> CaptureResult<()> {
        self.stop.store(true, Ordering::Release);

        // The feeder owns stdin; joining it closes the pipe and lets ffmpeg flush.
        let fed = join_worker(self.feeder.take(), "frame feeder");

        let mut child = self
            .child
            .take()
            .ok_or_else(|| CaptureError::encode("ffmpeg encoder already finished"))?;
        let waited = child.wait();
        if waited.is_err() {
            // stdout and stderr must reach EOF for the joins below to return.
            let _ = child.kill();
        }

        // Joining the reader guarantees the final chunk has been sent.
        let read = join_worker(self.reader.take(), "stdout reader");
        let drained = join_worker(self.stderr_drain.take(), "stderr drain");

        let status = waited.map_err(|e| {
            CaptureError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let bytes = read?;
        let stderr_bytes = drained?;
        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(CaptureError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        let frames = fed?;

        tracing::debug!(frames, bytes, "ffmpeg finished");
        Ok(())
    }
}

impl Drop for FfmpegEncoderHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Join an ffmpeg worker thread, mapping a panic or I/O failure to an encode error.
fn join_worker<T: Default>(
    handle: Option<JoinHandle<std::io::Result<T>>>,
    what: &str,
) -> CaptureResult<T> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| CaptureError::encode(format!("ffmpeg {what} thread panicked")))?
            .map_err(|e| CaptureError::encode(format!("ffmpeg {what} failed: {e}"))),
        None => Ok(T::default()),
    }
}

fn feed_frames<W: Write>(
    stream: MediaStream,
    mut stdin: W,
    frame_len: usize,
    bg_rgba: [u8; 4],
    stop: &AtomicBool,
    out: &ChunkSender,
) -> std::io::Result<u64> {
    let mut scratch = vec![0u8; frame_len];
    let mut written = 0u64;
    loop {
        let stopping = stop.load(Ordering::Acquire);
        // Frames presented before stop are still encoded.
        let frame = match stream.try_recv() {
            Some(frame) => frame,
            None if stopping => break,
            None => match stream.recv_timeout(FEED_POLL) {
                StreamRecv::Frame(frame) => frame,
                StreamRecv::Timeout => continue,
                StreamRecv::Ended => break,
            },
        };
        if frame.data.len() != frame_len {
            out.send_error("frame size changed mid-stream; frame skipped");
            continue;
        }
        flatten_over_bg_to_opaque_rgba8(&mut scratch, &frame.data, frame.premultiplied, bg_rgba);
        if let Err(e) = stdin.write_all(&scratch) {
            out.send_error(format!("failed to write frame to ffmpeg stdin: {e}"));
            return Err(e);
        }
        written += 1;
    }
    Ok(written)
}

fn pump_output(
    mut stdout: ChildStdout,
    out: &ChunkSender,
    timeslice: Duration,
) -> std::io::Result<u64> {
    let mut buf = vec![0u8; READ_BUF_BYTES];
    let mut pending = Vec::new();
    let mut last_emit = Instant::now();
    let mut total = 0u64;
    loop {
        let n = match stdout.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        total += n as u64;
        pending.extend_from_slice(&buf[..n]);
        if last_emit.elapsed() >= timeslice {
            // Drained even once nobody listens; ffmpeg stalls on a full pipe.
            out.send_chunk(std::mem::take(&mut pending));
            last_emit = Instant::now();
        }
    }
    if !pending.is_empty() {
        out.send_chunk(pending);
    }
    Ok(total)
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn flatten_over_bg_to_opaque_rgba8(dst: &mut [u8], src: &[u8], src_is_premul: bool, bg: [u8; 4]) {
    let bg_r = u16::from(bg[0]);
    let bg_g = u16::from(bg[1]);
    let bg_b = u16::from(bg[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255 - a;
        let (r, g, b) = if src_is_premul {
            (
                u16::from(s[0]) + mul_div255_u16(bg_r, inv),
                u16::from(s[1]) + mul_div255_u16(bg_g, inv),
                u16::from(s[2]) + mul_div255_u16(bg_b, inv),
            )
        } else {
            (
                mul_div255_u16(u16::from(s[0]), a) + mul_div255_u16(bg_r, inv),
                mul_div255_u16(u16::from(s[1]), a) + mul_div255_u16(bg_g, inv),
                mul_div255_u16(u16::from(s[2]), a) + mul_div255_u16(bg_b, inv),
            )
        };

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }
}

fn is_program_available(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    is_program_available(Path::new("ffmpeg"))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
