//! The protocol data unit: one parsed or built HTTP message.

use std::fmt;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::SystemTime;

use bytes::{BufMut, Bytes, BytesMut};
use http::Method;
use tokio::io::AsyncRead;
use tracing::{debug, trace};

use super::body::{self, AcquiredBody, BodyState};
use super::start_line::{PduKind, StartLine};
use super::typed::TypedHeaders;
use crate::config::PduConfig;
use crate::error::{BodyError, ParseError};
use crate::header::{HeaderStore, try_parse_header};
use crate::path::HttpPath;
use crate::status::StatusCode;
use crate::utils::ensure;
use crate::version::HttpVersion;

/// An HTTP request or response.
///
/// A `Pdu` is created by parsing a raw header block ([`Pdu::parse_request`],
/// [`Pdu::parse_response`]) or by [`PduBuilder::build`](super::PduBuilder::build). Parsing never
/// fails: a malformed header is kept as [`Pdu::parse_error`] and the message reports
/// `400 Bad Request` as its [`status_code`](Pdu::status_code).
///
/// The body is read lazily from the attached stream the first time it is asked for, and at most
/// once. Header fields may still be read through [`TypedHeaders`], which memoizes parsed values.
pub struct Pdu {
    timestamp: SystemTime,
    remote_endpoint: Option<SocketAddr>,
    local_endpoint: Option<SocketAddr>,
    raw_header: String,
    start_line: Option<StartLine>,
    headers: HeaderStore,
    body: Option<Bytes>,
    stream: Option<Box<dyn Read + Send>>,
    body_state: BodyState,
    config: PduConfig,
    parse_error: Option<ParseError>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Pdu {
    pub fn parse_request(raw_header: impl Into<String>) -> Self {
        Self::parse(raw_header, PduKind::Request)
    }

    pub fn parse_response(raw_header: impl Into<String>) -> Self {
        Self::parse(raw_header, PduKind::Response)
    }

    pub fn parse(raw_header: impl Into<String>, kind: PduKind) -> Self {
        let raw_header = raw_header.into();
        let (start_line, headers, parse_error) = match try_parse_header(&raw_header, kind) {
            Ok(block) => (Some(block.start_line), block.headers, None),
            Err(e) => {
                debug!(cause = %e, ?kind, "malformed header block");
                (None, HeaderStore::new(), Some(e))
            }
        };

        Self { start_line, headers, parse_error, ..Self::empty(raw_header) }
    }

    pub(crate) fn from_parts(start_line: StartLine, headers: HeaderStore, raw_header: String) -> Self {
        Self { start_line: Some(start_line), headers, ..Self::empty(raw_header) }
    }

    fn empty(raw_header: String) -> Self {
        Self {
            timestamp: SystemTime::now(),
            remote_endpoint: None,
            local_endpoint: None,
            raw_header,
            start_line: None,
            headers: HeaderStore::new(),
            body: None,
            stream: None,
            body_state: BodyState::Unread,
            config: PduConfig::default(),
            parse_error: None,
            cancel: None,
        }
    }

    /// Attaches the stream the body will be read from.
    pub fn with_stream(mut self, stream: impl Read + Send + 'static) -> Self {
        self.stream = Some(Box::new(stream));
        self
    }

    pub(crate) fn with_boxed_stream(mut self, stream: Box<dyn Read + Send>) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Sets an in-memory body; no stream is read afterwards.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self.body_state = BodyState::Complete;
        self
    }

    pub fn with_config(mut self, config: PduConfig) -> Self {
        self.config = config;
        self
    }

    /// A flag that, once set, makes body acquisition fail with [`BodyError::Cancelled`].
    pub fn with_cancel_signal(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_remote_endpoint(mut self, endpoint: SocketAddr) -> Self {
        self.remote_endpoint = Some(endpoint);
        self
    }

    pub fn with_local_endpoint(mut self, endpoint: SocketAddr) -> Self {
        self.local_endpoint = Some(endpoint);
        self
    }

    /// When the message was parsed or built.
    #[inline]
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    #[inline]
    pub fn remote_endpoint(&self) -> Option<SocketAddr> {
        self.remote_endpoint
    }

    #[inline]
    pub fn local_endpoint(&self) -> Option<SocketAddr> {
        self.local_endpoint
    }

    #[inline]
    pub fn config(&self) -> &PduConfig {
        &self.config
    }

    /// The header block as received, or as serialized by the builder.
    #[inline]
    pub fn raw_header(&self) -> &str {
        &self.raw_header
    }

    #[inline]
    pub fn start_line(&self) -> Option<&StartLine> {
        self.start_line.as_ref()
    }

    pub fn kind(&self) -> Option<PduKind> {
        self.start_line.as_ref().map(StartLine::kind)
    }

    pub fn method(&self) -> Option<&Method> {
        self.start_line.as_ref().and_then(StartLine::method)
    }

    pub fn path(&self) -> Option<&HttpPath> {
        self.start_line.as_ref().and_then(StartLine::path)
    }

    /// The message version; HTTP/1.1 when the header did not parse.
    pub fn version(&self) -> HttpVersion {
        self.start_line.as_ref().map(StartLine::version).unwrap_or_default()
    }

    /// The status of a response, or `400 Bad Request` for any message whose header did not
    /// parse. `None` for a well-formed request.
    pub fn status_code(&self) -> Option<StatusCode> {
        if let Some(e) = &self.parse_error {
            return Some(e.status());
        }
        self.start_line.as_ref().and_then(StartLine::status_code).cloned()
    }

    #[inline]
    pub fn parse_error(&self) -> Option<&ParseError> {
        self.parse_error.as_ref()
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.parse_error.is_none()
    }

    #[inline]
    pub fn headers(&self) -> &HeaderStore {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderStore {
        &mut self.headers
    }

    pub fn is_keep_alive(&self) -> bool {
        TypedHeaders::is_keep_alive(self, self.version())
    }

    #[inline]
    pub fn body_state(&self) -> BodyState {
        self.body_state
    }

    /// Whether the body holds exactly `Content-Length` bytes. Only meaningful after the body
    /// has been acquired.
    #[inline]
    pub fn is_body_complete(&self) -> bool {
        self.body_state.is_complete()
    }

    /// The body, reading it from the attached stream on first use.
    ///
    /// A missing or zero `Content-Length` yields an empty, complete body without touching the
    /// stream. A stream that ends or times out early yields the bytes received so far with
    /// [`BodyState::Truncated`]; only other IO failures are returned as errors. Such a failure
    /// is final: the stream is dropped, the state becomes [`BodyState::Failed`] and every later
    /// call returns [`BodyError::Failed`].
    pub fn body(&mut self) -> Result<&Bytes, BodyError> {
        ensure!(self.body_state != BodyState::Failed, BodyError::Failed);
        if self.body.is_none() {
            let content_length = self.content_length().unwrap_or(0);
            let acquired = match self.stream.as_mut() {
                Some(stream) => body::acquire_body(stream, content_length, &self.config, self.cancel.as_deref()),
                None => Ok(Self::without_stream(content_length)),
            };
            self.store_body(acquired)?;
        }

        Ok(self.body.get_or_insert_with(Bytes::new))
    }

    /// Like [`Pdu::body`], reading from an async transport instead of the attached stream.
    pub async fn body_async<R: AsyncRead + Unpin + ?Sized>(&mut self, reader: &mut R) -> Result<&Bytes, BodyError> {
        ensure!(self.body_state != BodyState::Failed, BodyError::Failed);
        if self.body.is_none() {
            let content_length = self.content_length().unwrap_or(0);
            let acquired = body::acquire_body_async(reader, content_length, &self.config, self.cancel.as_deref()).await;
            self.store_body(acquired)?;
        }

        Ok(self.body.get_or_insert_with(Bytes::new))
    }

    fn without_stream(content_length: u64) -> AcquiredBody {
        let state = if content_length == 0 { BodyState::Complete } else { BodyState::Truncated };
        AcquiredBody { bytes: Bytes::new(), state }
    }

    fn store_body(&mut self, acquired: Result<AcquiredBody, BodyError>) -> Result<(), BodyError> {
        match acquired {
            Ok(acquired) => {
                trace!(body_size = acquired.bytes.len(), state = ?acquired.state, "acquired body");
                self.body = Some(acquired.bytes);
                self.body_state = acquired.state;
                Ok(())
            }
            // nothing was read yet, a later call may still acquire the body
            Err(BodyError::Cancelled) => Err(BodyError::Cancelled),
            Err(e) => {
                self.stream = None;
                self.body_state = BodyState::Failed;
                Err(e)
            }
        }
    }

    pub(crate) fn with_acquired_body(mut self, acquired: AcquiredBody) -> Self {
        self.body = Some(acquired.bytes);
        self.body_state = acquired.state;
        self
    }

    /// The whole message as wire bytes: the header block followed by the body.
    pub fn entire_pdu(&mut self) -> Result<Bytes, BodyError> {
        let body = self.body()?.clone();

        let mut dst = BytesMut::with_capacity(self.raw_header.len() + body.len());
        dst.put_slice(self.raw_header.as_bytes());
        dst.put_slice(&body);
        Ok(dst.freeze())
    }

    /// Writes the start line, the current header fields and the terminating blank line.
    pub fn encode_head(&self, dst: &mut BytesMut) {
        if let Some(start_line) = &self.start_line {
            encode_head(start_line, &self.headers, dst);
        }
    }
}

/// Serializes a message head in wire format.
pub(crate) fn encode_head(start_line: &StartLine, headers: &HeaderStore, dst: &mut BytesMut) {
    dst.put_slice(start_line.to_string().as_bytes());
    dst.put_slice(b"\r\n");
    headers.write_to(dst);
    dst.put_slice(b"\r\n");
}

impl TypedHeaders for Pdu {
    #[inline]
    fn header_store(&self) -> &HeaderStore {
        &self.headers
    }

    #[inline]
    fn header_store_mut(&mut self) -> &mut HeaderStore {
        &mut self.headers
    }
}

impl fmt::Debug for Pdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pdu")
            .field("timestamp", &self.timestamp)
            .field("remote_endpoint", &self.remote_endpoint)
            .field("start_line", &self.start_line)
            .field("headers", &self.headers)
            .field("body_state", &self.body_state)
            .field("parse_error", &self.parse_error)
            .finish_non_exhaustive()
    }
}
