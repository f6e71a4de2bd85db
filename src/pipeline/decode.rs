//! Streaming decoder (Bytes -> SseFrame)
//!
//! The upstream delivers `data: {...}` lines over a chunked body with arbitrary split
//! points. Lines are reassembled on raw bytes so a multi-byte UTF-8 sequence cut by a
//! read boundary is never mangled.

use crate::pipeline::{PipelineError, SseFrame};
use crate::{BoxStream, PipeResult};
use bytes::{Bytes, BytesMut};
use futures::{stream, StreamExt};
use std::collections::VecDeque;
use tracing::debug;

const DEFAULT_PREFIX: &str = "data:";
const DEFAULT_DONE_SIGNAL: &str = "[DONE]";
const DEFAULT_MAX_LINE_BYTES: usize = 1 << 20;

/// Synchronous line state machine behind [`SseDecoder`].
///
/// Feed it chunks with [`push`](Self::push); each call returns the frames completed
/// by that chunk, in order.
#[derive(Debug)]
pub struct LineDecoder {
    buf: BytesMut,
    scanned: usize,
    prefix: String,
    done_signal: String,
    max_line_bytes: usize,
    pending_error: bool,
    done: bool,
    overflowed: bool,
}

impl LineDecoder {
    fn new(prefix: String, done_signal: String, max_line_bytes: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            scanned: 0,
            prefix,
            done_signal,
            max_line_bytes,
            pending_error: false,
            done: false,
            overflowed: false,
        }
    }

    /// True once the terminal marker was seen. Nothing is decoded after that.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Frames completed by a chunk are returned even when the chunk also leaves an
    /// over-long unterminated line; that overflow is reported by the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseFrame>, PipelineError> {
        let mut frames = Vec::new();
        if self.done {
            return Ok(frames);
        }
        if self.overflowed {
            return Err(self.overflow_error());
        }
        self.buf.extend_from_slice(chunk);

        while let Some(pos) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
            let line = self.buf.split_to(self.scanned + pos + 1);
            self.scanned = 0;
            if let Some(frame) = self.handle_line(&line) {
                frames.push(frame);
            }
            if self.done {
                self.buf.clear();
                return Ok(frames);
            }
        }
        self.scanned = self.buf.len();

        if self.buf.len() > self.max_line_bytes {
            self.overflowed = true;
            if frames.is_empty() {
                return Err(self.overflow_error());
            }
        }
        Ok(frames)
    }

    /// Flush an unterminated trailing line at end of input.
    pub fn finish(&mut self) -> Result<Option<SseFrame>, PipelineError> {
        if self.overflowed {
            return Err(self.overflow_error());
        }
        if self.done || self.buf.is_empty() {
            return Ok(None);
        }
        let rest = self.buf.split();
        self.scanned = 0;
        Ok(self.handle_line(&rest))
    }

    fn overflow_error(&self) -> PipelineError {
        PipelineError::Decoder(format!(
            "SSE line exceeds {} bytes without a line break",
            self.max_line_bytes
        ))
    }

    fn handle_line(&mut self, raw: &[u8]) -> Option<SseFrame> {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim();
        if line.is_empty() {
            return None;
        }

        if let Some(event) = line.strip_prefix("event:") {
            self.pending_error = event.trim() == "error";
            return None;
        }

        // Comment / heartbeat lines
        if line.starts_with(':') {
            return None;
        }

        let payload = line.strip_prefix(self.prefix.as_str())?.trim_start();
        if payload == self.done_signal {
            self.done = true;
            return None;
        }

        let is_error = std::mem::take(&mut self.pending_error);
        match serde_json::from_str(payload) {
            Ok(value) if is_error => Some(SseFrame::Error(value)),
            Ok(value) => Some(SseFrame::Data(value)),
            Err(e) => {
                debug!(error = %e, line = %truncate(line, 200), "skipping undecodable SSE line");
                None
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// SSE decoder for the detection orchestrator's stream:
/// - splits on `\n` (a trailing `\r` is tolerated)
/// - drops blank lines, comments and `event:` markers
/// - strips `prefix` (default "data:")
/// - stops on `done_signal` (default "[DONE]")
#[derive(Debug, Clone)]
pub struct SseDecoder {
    prefix: String,
    done_signal: String,
    max_line_bytes: usize,
}

impl SseDecoder {
    pub fn new(prefix: Option<String>, done_signal: Option<String>) -> Self {
        Self {
            prefix: prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            done_signal: done_signal.unwrap_or_else(|| DEFAULT_DONE_SIGNAL.to_string()),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// Bound how much of a single unterminated line may be buffered.
    pub fn with_max_line_bytes(mut self, max: usize) -> Result<Self, PipelineError> {
        if max == 0 {
            return Err(PipelineError::Configuration(
                "max_line_bytes must be greater than zero".to_string(),
            ));
        }
        self.max_line_bytes = max;
        Ok(self)
    }

    pub fn line_decoder(&self) -> LineDecoder {
        LineDecoder::new(
            self.prefix.clone(),
            self.done_signal.clone(),
            self.max_line_bytes,
        )
    }

    /// Decode a byte stream into frames.
    ///
    /// The returned stream ends at the terminal marker, dropping `input` (and with it
    /// the upstream connection) even if more bytes are pending. Errors from `input`
    /// are forwarded and end the stream.
    pub fn decode_stream(&self, input: BoxStream<'static, Bytes>) -> BoxStream<'static, SseFrame> {
        struct State {
            input: BoxStream<'static, Bytes>,
            decoder: LineDecoder,
            queue: VecDeque<SseFrame>,
            finished: bool,
        }

        let init = State {
            input,
            decoder: self.line_decoder(),
            queue: VecDeque::new(),
            finished: false,
        };

        let stream = stream::unfold(init, |mut st| async move {
            loop {
                if let Some(frame) = st.queue.pop_front() {
                    return Some((Ok(frame), st));
                }
                if st.finished || st.decoder.is_done() {
                    return None;
                }

                match st.input.next().await {
                    Some(Ok(bytes)) => match st.decoder.push(&bytes) {
                        Ok(frames) => st.queue.extend(frames),
                        Err(e) => {
                            st.finished = true;
                            return Some((Err(e.into()), st));
                        }
                    },
                    Some(Err(e)) => {
                        st.finished = true;
                        return Some((Err(e), st));
                    }
                    None => {
                        st.finished = true;
                        match st.decoder.finish() {
                            Ok(Some(frame)) => st.queue.push_back(frame),
                            Ok(None) => {}
                            Err(e) => return Some((Err(e.into()), st)),
                        }
                    }
                }
            }
        });

        Box::pin(stream)
    }
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Collect every frame of a byte stream; convenience for tests and tooling.
pub async fn collect_frames(
    decoder: &SseDecoder,
    input: BoxStream<'static, Bytes>,
) -> PipeResult<Vec<SseFrame>> {
    let mut frames = Vec::new();
    let mut stream = decoder.decode_stream(input);
    while let Some(frame) = stream.next().await {
        frames.push(frame?);
    }
    Ok(frames)
}
