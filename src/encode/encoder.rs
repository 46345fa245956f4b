use crate::foundation::error::CaptureResult;
use crate::render::surface::MediaStream;
use std::sync::mpsc;
use std::time::Duration;

/// Identifier of one capture session; increases on every successful or attempted start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SessionId(pub u64);

/// Video codec written into the WebM container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    /// VP8 via `libvpx`.
    Vp8,
    /// VP9 via `libvpx-vp9`.
    Vp9,
}

impl VideoCodec {
    /// Name of the ffmpeg encoder implementing this codec.
    pub fn ffmpeg_encoder(self) -> &'static str {
        match self {
            Self::Vp8 => "libvpx",
            Self::Vp9 => "libvpx-vp9",
        }
    }

    /// Codec tag as used in MIME `codecs=` parameters.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Vp8 => "vp8",
            Self::Vp9 => "vp9",
        }
    }
}

/// Settings an encoder backend receives when binding to a stream.
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderOpts {
    /// Codec to encode with.
    pub codec: VideoCodec,
    /// Target video bitrate in bits per second.
    pub bitrate_bps: u64,
    /// Period at which buffered output is handed to the controller.
    pub timeslice: Duration,
    /// Container MIME type reported for produced chunks.
    pub mime_type: String,
    /// Background used to flatten alpha before encoding (straight RGBA8).
    pub bg_rgba: [u8; 4],
}

/// Message from an encoder worker to the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderEvent {
    /// Session the event belongs to.
    pub session: SessionId,
    /// Payload.
    pub kind: EncoderEventKind,
}

/// Payload of an [`EncoderEvent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncoderEventKind {
    /// One encoded chunk, in emission order.
    Data(Vec<u8>),
    /// Encoder-side failure observed while the session was running.
    Error(String),
}

/// Sending half handed to encoder workers.
///
/// Every message is tagged with the session it was created for, so output from a replaced
/// session can be told apart from the current one.
#[derive(Clone, Debug)]
pub struct ChunkSender {
    session: SessionId,
    tx: mpsc::Sender<EncoderEvent>,
}

impl ChunkSender {
    /// Create a sender bound to `session`.
    pub fn new(session: SessionId, tx: mpsc::Sender<EncoderEvent>) -> Self {
        Self { session, tx }
    }

    /// Session this sender is bound to.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Deliver one encoded chunk.
    ///
    /// Returns `false` once the controller stopped listening.
    pub fn send_chunk(&self, data: Vec<u8>) -> bool {
        self.send(EncoderEventKind::Data(data))
    }

    /// Report an encoder failure.
    pub fn send_error(&self, msg: impl Into<String>) -> bool {
        self.send(EncoderEventKind::Error(msg.into()))
    }

    fn send(&self, kind: EncoderEventKind) -> bool {
        self.tx
            .send(EncoderEvent {
                session: self.session,
                kind,
            })
            .is_ok()
    }
}

/// Factory for encoders bound to a live frame stream.
pub trait EncoderBackend: Send {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Bind a new encoder to `stream` and start encoding.
    ///
    /// Chunks must be delivered through `out` in emission order. The call returns once the
    /// encoder is running.
    fn open(
        &mut self,
        stream: MediaStream,
        opts: &EncoderOpts,
        out: ChunkSender,
    ) -> CaptureResult<Box<dyn EncoderHandle>>;
}

/// A running encoder owned by exactly one capture session.
pub trait EncoderHandle: Send {
    /// Container MIME type of the produced chunks.
    fn mime_type(&self) -> &str;

    /// Stop consuming frames, flush, and shut the encoder down.
    ///
    /// Every chunk the encoder produces must have been sent before this returns.
    fn finish(self: Box<Self>) -> CaptureResult<()>;
}

#[cfg(test)]
#[path = "../../tests/unit/encode/encoder.rs"]
mod tests;
