//! Reader for the agent's chunked event stream.
//!
//! Wire format: frames of `event: <type>` and `data: <json>` lines, each
//! frame terminated by a blank line. Comment lines (`: keepalive`) are
//! ignored.
//!
//! Delivery rules:
//! - A frame whose data does not decode is dropped and counted; reading
//!   continues.
//! - Nothing is read or emitted after a `done` event, even if more frames
//!   are already buffered.
//! - Once cancelled, nothing more is emitted, including frames decoded from
//!   a read that was already in flight.
//! - An unterminated frame at end of stream is discarded.
//! - A failing read, or an idle window with no bytes, ends the stream with
//!   an error.

use std::time::Duration;

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;

use crate::cancel::CancelToken;
use crate::utf8::Utf8Decoder;

use super::error::StreamError;
use super::event::AgentEvent;

const EVENT_FIELD: &str = "event:";
const DATA_FIELD: &str = "data:";
const COMMENT_PREFIX: char = ':';

/// Counters for one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub bytes_read: u64,
    pub frames_dispatched: u64,
    pub frames_dropped: u64,
}

impl std::fmt::Display for StreamStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} bytes, {} frames dispatched, {} dropped",
            self.bytes_read, self.frames_dispatched, self.frames_dropped
        )
    }
}

#[derive(Debug, Default)]
struct Frame {
    event_type: Option<String>,
    data: Option<String>,
}

impl Frame {
    fn is_empty(&self) -> bool {
        self.event_type.is_none() && self.data.is_none()
    }
}

/// Result of closing one frame.
#[derive(Debug)]
pub enum FrameOutcome {
    Event(AgentEvent),
    Dropped {
        event_type: String,
        error: serde_json::Error,
    },
}

/// Turns bytes into frames. Pull-based: lines are only examined when the
/// caller asks for the next frame, so anything after a frame the caller
/// stops at is never looked at.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    text: Utf8Decoder,
    buffer: String,
    frame: Frame,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) {
        let text = self.text.decode(chunk);
        self.buffer.push_str(&text);
    }

    /// Consume complete lines until one closes a frame.
    pub fn next_outcome(&mut self) -> Option<FrameOutcome> {
        while let Some(line) = self.next_line() {
            if let Some(outcome) = self.process_line(&line) {
                return Some(outcome);
            }
        }
        None
    }

    /// End of input. Returns true if a half-built frame was thrown away.
    pub fn finish(&mut self) -> bool {
        let discarded = !self.frame.is_empty() || !self.buffer.is_empty();
        self.frame = Frame::default();
        self.buffer.clear();
        self.text.reset();
        discarded
    }

    fn next_line(&mut self) -> Option<String> {
        let end = self.buffer.find('\n')?;
        let mut line: String = self.buffer.drain(..=end).collect();
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }

    fn process_line(&mut self, line: &str) -> Option<FrameOutcome> {
        if line.is_empty() {
            return self.dispatch();
        }

        if line.starts_with(COMMENT_PREFIX) {
            return None;
        }

        if let Some(value) = line.strip_prefix(EVENT_FIELD) {
            self.frame.event_type = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix(DATA_FIELD) {
            let value = value.strip_prefix(' ').unwrap_or(value);
            match &mut self.frame.data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.frame.data = Some(value.to_string()),
            }
        }
        None
    }

    /// Blank line: decode the frame if it is complete, otherwise ignore.
    fn dispatch(&mut self) -> Option<FrameOutcome> {
        if self.frame.event_type.is_none() || self.frame.data.is_none() {
            return None;
        }
        let frame = std::mem::take(&mut self.frame);
        let event_type = frame.event_type.unwrap_or_default();
        let data = frame.data.unwrap_or_default();

        Some(match AgentEvent::decode(&event_type, &data) {
            Ok(event) => FrameOutcome::Event(event),
            Err(error) => FrameOutcome::Dropped { event_type, error },
        })
    }
}

enum ReadOutcome {
    Chunk(Bytes),
    End,
    Cancelled,
    Failed(StreamError),
}

/// Pulls typed events out of a byte stream.
///
/// Owned by a single subscriber; every event is handed out exactly once.
pub struct EventStreamReader<S> {
    source: S,
    frames: FrameDecoder,
    cancel: CancelToken,
    idle_timeout: Option<Duration>,
    finished: bool,
    stats: StreamStats,
}

impl<S, E> EventStreamReader<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            frames: FrameDecoder::new(),
            cancel: CancelToken::new(),
            idle_timeout: None,
            finished: false,
            stats: StreamStats::default(),
        }
    }

    /// Fail the stream if no bytes arrive for `limit`.
    pub fn with_idle_timeout(mut self, limit: Duration) -> Self {
        self.idle_timeout = Some(limit);
        self
    }

    /// Share an externally owned cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Next event, `None` once the stream is over (done, cancelled or ended),
    /// or a terminal error if the read itself failed.
    pub async fn next(&mut self) -> Option<Result<AgentEvent, StreamError>> {
        loop {
            if self.finished {
                return None;
            }
            if self.cancel.is_cancelled() {
                self.stop("cancelled");
                return None;
            }

            while let Some(outcome) = self.frames.next_outcome() {
                match outcome {
                    FrameOutcome::Event(event) => {
                        if self.cancel.is_cancelled() {
                            self.stop("cancelled");
                            return None;
                        }
                        self.stats.frames_dispatched += 1;
                        if event.is_done() {
                            self.stop("done");
                        }
                        return Some(Ok(event));
                    }
                    FrameOutcome::Dropped { event_type, error } => {
                        self.stats.frames_dropped += 1;
                        tracing::warn!(
                            event_type = %event_type,
                            error = %error,
                            dropped = self.stats.frames_dropped,
                            "Dropped undecodable stream frame"
                        );
                    }
                }
            }

            match self.read_chunk().await {
                ReadOutcome::Chunk(bytes) => {
                    self.stats.bytes_read += bytes.len() as u64;
                    self.frames.feed(&bytes);
                }
                ReadOutcome::End => {
                    if self.frames.finish() {
                        tracing::debug!("Discarded unterminated frame at end of stream");
                    }
                    self.stop("end of stream");
                    return None;
                }
                ReadOutcome::Cancelled => {
                    self.stop("cancelled");
                    return None;
                }
                ReadOutcome::Failed(err) => {
                    tracing::warn!(error = %err, "Event stream failed");
                    self.stop("read failure");
                    return Some(Err(err));
                }
            }
        }
    }

    async fn read_chunk(&mut self) -> ReadOutcome {
        let cancel = self.cancel.clone();
        let idle_timeout = self.idle_timeout;
        let source = &mut self.source;

        let read = async move {
            match idle_timeout {
                Some(limit) => tokio::time::timeout(limit, source.next())
                    .await
                    .map_err(|_| limit),
                None => Ok(source.next().await),
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => ReadOutcome::Cancelled,
            result = read => match result {
                Ok(Some(Ok(bytes))) => ReadOutcome::Chunk(bytes),
                Ok(Some(Err(err))) => ReadOutcome::Failed(StreamError::Read(err.into())),
                Ok(None) => ReadOutcome::End,
                Err(limit) => ReadOutcome::Failed(StreamError::IdleTimeout {
                    duration: limit.as_secs(),
                }),
            },
        }
    }

    fn stop(&mut self, reason: &str) {
        if !self.finished {
            self.finished = true;
            tracing::debug!(reason, stats = %self.stats, "Event stream finished");
        }
    }
}
