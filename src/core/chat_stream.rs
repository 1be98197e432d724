use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, Stream, StreamExt};
use memchr::memchr;
use tracing::{debug, warn};

use crate::api::{ChatRequest, ChatResponse};
use crate::core::error::CompletionError;
use crate::core::message::Message;
use crate::core::providers::{resolve_provider, Credentials, ProviderBinding};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::endpoint_url;

pub const ESTABLISHMENT_TIMEOUT: Duration = Duration::from_secs(30);
pub const CHUNK_TIMEOUT: Duration = Duration::from_secs(15);

/// A forward-only sequence of reply fragments. It ends after the first error.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, CompletionError>> + Send>>;

/// Opens a streamed chat completion against one provider.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Send `request` and resolve once the provider starts responding. The
    /// returned stream yields raw text deltas, possibly empty.
    async fn open(
        &self,
        binding: &ProviderBinding,
        request: &ChatRequest,
    ) -> Result<FragmentStream, CompletionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamTimeouts {
    /// Window for the provider to start responding.
    pub establish: Duration,
    /// Window for each subsequent fragment.
    pub chunk: Duration,
}

impl Default for StreamTimeouts {
    fn default() -> Self {
        Self {
            establish: ESTABLISHMENT_TIMEOUT,
            chunk: CHUNK_TIMEOUT,
        }
    }
}

pub struct CompletionEngine<T = HttpTransport> {
    transport: T,
    credentials: Credentials,
    timeouts: StreamTimeouts,
}

impl CompletionEngine<HttpTransport> {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_transport(HttpTransport::new(), credentials)
    }
}

impl<T: CompletionTransport> CompletionEngine<T> {
    pub fn with_transport(transport: T, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
            timeouts: StreamTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: StreamTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Stream a completion of `messages` from `model`.
    ///
    /// Fails before any fragment is produced when the model is unknown, its
    /// credential is missing, the request is rejected, or the provider does
    /// not start responding within the establishment window.
    pub async fn stream_completion(
        &self,
        messages: &[Message],
        model: &str,
    ) -> Result<FragmentStream, CompletionError> {
        let binding = resolve_provider(model, &self.credentials)?;
        let request = ChatRequest::streaming(model, messages);

        debug!(
            model,
            provider = binding.provider.id(),
            messages = messages.len(),
            "Opening completion stream"
        );

        let establish = self.timeouts.establish;
        let inner = tokio::time::timeout(establish, self.transport.open(&binding, &request))
            .await
            .map_err(|_| CompletionError::EstablishmentTimeout(establish))??;

        Ok(guard_fragments(inner, self.timeouts.chunk))
    }
}

struct Guarded {
    inner: Option<FragmentStream>,
    delivered: usize,
}

/// Apply the per-fragment timeout to `inner` and drop empty fragments.
///
/// Every item pulled from `inner` must arrive within `chunk_timeout`,
/// including empty ones that are then skipped. After a timeout or error the
/// stream yields that error once and ends; fragments already yielded stay
/// with the caller.
pub fn guard_fragments(inner: FragmentStream, chunk_timeout: Duration) -> FragmentStream {
    let state = Guarded {
        inner: Some(inner),
        delivered: 0,
    };

    stream::unfold(state, move |mut state| async move {
        let mut inner = state.inner.take()?;
        loop {
            match tokio::time::timeout(chunk_timeout, inner.next()).await {
                Err(_) => {
                    warn!(
                        delivered = state.delivered,
                        timeout_secs = chunk_timeout.as_secs(),
                        "Completion stream stalled"
                    );
                    return Some((Err(CompletionError::ChunkTimeout(chunk_timeout)), state));
                }
                Ok(None) => {
                    debug!(delivered = state.delivered, "Completion stream finished");
                    return None;
                }
                Ok(Some(Err(err))) => return Some((Err(err), state)),
                Ok(Some(Ok(text))) if text.is_empty() => continue,
                Ok(Some(Ok(text))) => {
                    state.delivered += 1;
                    state.inner = Some(inner);
                    return Some((Ok(text), state));
                }
            }
        }
    })
    .boxed()
}

/// Chat completions over HTTP with server-sent events.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn open(
        &self,
        binding: &ProviderBinding,
        request: &ChatRequest,
    ) -> Result<FragmentStream, CompletionError> {
        let chat_url = endpoint_url(binding.endpoint_base(), "chat/completions");
        let http_request = self
            .client
            .post(chat_url)
            .header("Content-Type", "application/json");
        let http_request = add_auth_headers(http_request, binding.provider, &binding.api_key);

        let response = http_request.json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(CompletionError::Transport(format!(
                "{} (HTTP {})",
                format_api_error(&error_text),
                status
            )));
        }

        Ok(sse_fragments(response.bytes_stream()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SseEvent {
    Delta(String),
    Done,
    Error(String),
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

fn parse_sse_line(line: &str) -> Option<SseEvent> {
    let payload = extract_data_payload(line)?;
    if payload == "[DONE]" {
        return Some(SseEvent::Done);
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => response.into_delta_text().map(SseEvent::Delta),
        Err(_) if payload.trim().is_empty() => None,
        Err(_) => Some(SseEvent::Error(format_api_error(payload))),
    }
}

/// Reassembles SSE lines from arbitrarily split byte chunks.
#[derive(Default)]
struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            match std::str::from_utf8(&self.buffer[..newline_pos]) {
                Ok(line) => events.extend(parse_sse_line(line.trim())),
                Err(err) => warn!(error = %err, "Skipping invalid UTF-8 in stream"),
            }
            self.buffer.drain(..=newline_pos);
        }

        events
    }

    /// Flush a final line that had no trailing newline.
    fn finish(&mut self) -> Vec<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        match std::str::from_utf8(&rest) {
            Ok(line) => parse_sse_line(line.trim()).into_iter().collect(),
            Err(err) => {
                warn!(error = %err, "Skipping invalid UTF-8 in stream");
                Vec::new()
            }
        }
    }
}

struct SseState<S> {
    bytes: S,
    lines: SseLineBuffer,
    pending: VecDeque<SseEvent>,
    finished: bool,
}

/// Decode an SSE byte stream into text deltas. Ends at `[DONE]`, at the end
/// of the body, or after the first error.
fn sse_fragments<S, B, E>(bytes: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = SseState {
        bytes,
        lines: SseLineBuffer::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                match event {
                    SseEvent::Delta(text) => return Some((Ok(text), state)),
                    SseEvent::Done => return None,
                    SseEvent::Error(message) => {
                        state.pending.clear();
                        state.finished = true;
                        return Some((Err(CompletionError::Transport(message)), state));
                    }
                }
            }

            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.lines.push(chunk.as_ref());
                    state.pending.extend(events);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(CompletionError::Transport(err.to_string())), state));
                }
                None => {
                    state.finished = true;
                    let events = state.lines.finish();
                    state.pending.extend(events);
                }
            }
        }
    })
    .boxed()
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
}

/// Describe a provider error body. A JSON body with a recognisable message
/// is summarised and followed by the body itself; anything else is passed
/// through verbatim.
fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error: <empty response>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            return format!("API Error: {summary}\n{trimmed}");
        }
    }

    format!("API Error: {trimmed}")
}
