//! Session service client.
//!
//! [`SessionClient`] is the seam the CLI programs against; [`HttpSessionClient`]
//! implements it over the service's REST API with reqwest.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode, Url};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::sse::{SseDecoder, SseFrame};
use crate::types::{CreateSessionRequest, Session, SessionEvent, SessionList};

/// Buffered events between the body reader task and the consumer.
const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Operations offered by the session service.
pub trait SessionClient: Send + Sync {
    /// Create a session and start it on the given prompt.
    fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> impl Future<Output = Result<Session>> + Send;

    /// Resume a paused session.
    fn resume_session(&self, session_id: &str) -> impl Future<Output = Result<Session>> + Send;

    /// List the caller's sessions.
    fn list_sessions(&self) -> impl Future<Output = Result<Vec<Session>>> + Send;

    /// Subscribe to a session's events.
    fn stream_events(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<EventStream>> + Send;
}

/// Live feed of session events.
///
/// Yields events until the service closes the stream. A transport failure
/// is delivered once as an `Err` and ends the feed. Dropping the stream stops
/// the background reader.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<Result<SessionEvent>>,
    reader: Option<JoinHandle<()>>,
}

impl EventStream {
    /// Create a stream fed by the returned sender.
    pub fn channel(capacity: usize) -> (mpsc::Sender<Result<SessionEvent>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx, reader: None })
    }

    fn with_reader(mut self, reader: JoinHandle<()>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Next event, or `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Result<SessionEvent>> {
        self.rx.recv().await
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// REST client for the Ampbox session service.
#[derive(Debug, Clone)]
pub struct HttpSessionClient {
    http: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
}

impl HttpSessionClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(ClientError::Config("Ampbox URL is empty".into()));
        }
        if config.api_key.trim().is_empty() {
            return Err(ClientError::Config("Ampbox API key is empty".into()));
        }

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ClientError::Config(format!("Invalid Ampbox URL {}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "Invalid Ampbox URL {}",
                config.base_url
            )));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| ClientError::Config("Invalid API key format".into()))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        // reqwest is built with rustls-no-provider; Err means already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url,
            request_timeout: config.request_timeout,
        })
    }

    /// Build `<base>/api/v1/<segments...>`, percent-encoding each segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Config(format!("Invalid Ampbox URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Ok(url)
    }

    async fn check(resp: Response, session_id: Option<&str>) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(classify_status(status, &body, session_id))
    }
}

/// Map a non-success response onto the client's error categories.
pub(crate) fn classify_status(
    status: StatusCode,
    body: &str,
    session_id: Option<&str>,
) -> ClientError {
    match (status, session_id) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => ClientError::Authentication,
        (StatusCode::NOT_FOUND, Some(id)) => ClientError::SessionNotFound(id.to_string()),
        _ => ClientError::Api {
            status: status.as_u16(),
            message: error_message(status, body),
        },
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "detail", "message"] {
            if let Some(msg) = value.get(key).and_then(serde_json::Value::as_str) {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("Unknown").to_string()
    } else {
        trimmed.to_string()
    }
}

impl SessionClient for HttpSessionClient {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<Session> {
        let url = self.endpoint(&["sessions"])?;
        debug!(%url, bundle = %request.bundle, "Creating session");
        let resp = self
            .http
            .post(url)
            .timeout(self.request_timeout)
            .json(&request)
            .send()
            .await?;
        let session: Session = Self::check(resp, None).await?.json().await?;
        info!(session_id = %session.id, status = %session.status, "Session created");
        Ok(session)
    }

    async fn resume_session(&self, session_id: &str) -> Result<Session> {
        let url = self.endpoint(&["sessions", session_id, "resume"])?;
        debug!(%url, "Resuming session");
        let resp = self
            .http
            .post(url)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let session: Session = Self::check(resp, Some(session_id)).await?.json().await?;
        info!(session_id = %session.id, status = %session.status, "Session resumed");
        Ok(session)
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        let url = self.endpoint(&["sessions"])?;
        let resp = self
            .http
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let list: SessionList = Self::check(resp, None).await?.json().await?;
        debug!(count = list.sessions.len(), "Listed sessions");
        Ok(list.sessions)
    }

    async fn stream_events(&self, session_id: &str) -> Result<EventStream> {
        let url = self.endpoint(&["sessions", session_id, "events"])?;
        debug!(%url, "Opening event stream");
        let resp = self
            .http
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let resp = Self::check(resp, Some(session_id)).await?;

        let (tx, stream) = EventStream::channel(EVENT_CHANNEL_CAPACITY);
        let reader = tokio::spawn(read_events(resp, tx));
        Ok(stream.with_reader(reader))
    }
}

/// Decode the SSE body and forward events until the body or receiver ends.
async fn read_events(resp: Response, tx: mpsc::Sender<Result<SessionEvent>>) {
    let mut body = std::pin::pin!(resp.bytes_stream());
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = body.next().await {
        let frames = chunk
            .map_err(|e| ClientError::Stream(e.to_string()))
            .and_then(|bytes| decoder.push(&bytes));
        match frames {
            Ok(frames) => {
                for frame in frames {
                    if !forward(&tx, frame).await {
                        return;
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Event stream error");
                let _ = tx.send(Err(e)).await;
                return;
            }
        }
    }

    if let Some(frame) = decoder.finish() {
        forward(&tx, frame).await;
    }
    debug!("Event stream ended");
}

async fn forward(tx: &mpsc::Sender<Result<SessionEvent>>, frame: SseFrame) -> bool {
    if tx.send(frame.into_session_event()).await.is_err() {
        warn!("Event receiver dropped");
        return false;
    }
    true
}
