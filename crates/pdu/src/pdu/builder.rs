//! The mutable side of a message: accumulate fields and content, then [`PduBuilder::build`].

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use bytes::{Bytes, BytesMut};
use http::Method;
use tracing::{debug, trace};

use super::body::{AcquiredBody, BodyState};
use super::message::{self, Pdu};
use super::start_line::StartLine;
use super::typed::TypedHeaders;
use crate::config::PduConfig;
use crate::error::BodyError;
use crate::header::{HeaderStore, HeaderValue};
use crate::path::HttpPath;
use crate::status::StatusCode;
use crate::version::HttpVersion;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 1024;

/// A readable, seekable source whose remaining length can be measured.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Content supplied as a stream rather than as bytes.
pub enum ContentStream {
    /// Length known from the current position to the end
    Seekable(Box<dyn ReadSeek>),
    /// Forward-only, length unknown
    Forward(Box<dyn Read + Send>),
}

impl ContentStream {
    pub fn seekable(stream: impl Read + Seek + Send + 'static) -> Self {
        ContentStream::Seekable(Box::new(stream))
    }

    pub fn forward(stream: impl Read + Send + 'static) -> Self {
        ContentStream::Forward(Box::new(stream))
    }

    /// Bytes left from the current position, for seekable streams. The position is restored.
    pub fn remaining_len(&mut self) -> io::Result<Option<u64>> {
        match self {
            ContentStream::Seekable(stream) => {
                let position = stream.stream_position()?;
                let end = stream.seek(SeekFrom::End(0))?;
                stream.seek(SeekFrom::Start(position))?;
                Ok(Some(end.saturating_sub(position)))
            }
            ContentStream::Forward(_) => Ok(None),
        }
    }
}

impl Read for ContentStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ContentStream::Seekable(stream) => stream.read(buf),
            ContentStream::Forward(stream) => stream.read(buf),
        }
    }
}

impl fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentStream::Seekable(_) => f.write_str("ContentStream::Seekable"),
            ContentStream::Forward(_) => f.write_str("ContentStream::Forward"),
        }
    }
}

/// Accumulates a request or response before it is frozen into a [`Pdu`].
///
/// ```
/// use micro_pdu::content_type::ContentType;
/// use micro_pdu::pdu::{PduBuilder, TypedHeaders};
/// use micro_pdu::status::StatusCode;
///
/// let mut builder = PduBuilder::response(StatusCode::OK);
/// builder.set_content_type(ContentType::plain_text());
/// builder.set_content("hello");
///
/// let mut pdu = builder.build().unwrap();
/// assert_eq!(&pdu.entire_pdu().unwrap()[..], b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello");
/// ```
#[derive(Debug)]
pub struct PduBuilder {
    start_line: StartLine,
    headers: HeaderStore,
    content: Option<Bytes>,
    content_stream: Option<ContentStream>,
    config: PduConfig,
    remote_endpoint: Option<SocketAddr>,
    local_endpoint: Option<SocketAddr>,
    cancel: Option<Arc<AtomicBool>>,
}

impl PduBuilder {
    pub fn new(start_line: StartLine) -> Self {
        Self {
            start_line,
            headers: HeaderStore::new(),
            content: None,
            content_stream: None,
            config: PduConfig::default(),
            remote_endpoint: None,
            local_endpoint: None,
            cancel: None,
        }
    }

    pub fn request(method: Method, path: impl Into<HttpPath>) -> Self {
        Self::new(StartLine::request(method, path))
    }

    pub fn response(status: StatusCode) -> Self {
        Self::new(StartLine::status(status))
    }

    #[inline]
    pub fn start_line(&self) -> &StartLine {
        &self.start_line
    }

    pub fn set_version(&mut self, new_version: HttpVersion) -> &mut Self {
        match &mut self.start_line {
            StartLine::Request { version, .. } | StartLine::Status { version, .. } => *version = new_version,
        }
        self
    }

    /// Sets the status; turns a request builder into a response builder.
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        let version = self.start_line.version();
        self.start_line = StartLine::Status { version, status };
        self
    }

    pub fn header(&mut self, name: &str, value: impl Into<HeaderValue>) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    #[inline]
    pub fn headers(&self) -> &HeaderStore {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderStore {
        &mut self.headers
    }

    #[inline]
    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    /// Sets in-memory content; it takes precedence over a content stream.
    pub fn set_content(&mut self, content: impl Into<Bytes>) -> &mut Self {
        self.content = Some(content.into());
        self
    }

    pub fn set_content_stream(&mut self, stream: ContentStream) -> &mut Self {
        self.content_stream = Some(stream);
        self
    }

    pub fn set_config(&mut self, config: PduConfig) -> &mut Self {
        self.config = config;
        self
    }

    pub fn set_remote_endpoint(&mut self, endpoint: SocketAddr) -> &mut Self {
        self.remote_endpoint = Some(endpoint);
        self
    }

    pub fn set_local_endpoint(&mut self, endpoint: SocketAddr) -> &mut Self {
        self.local_endpoint = Some(endpoint);
        self
    }

    pub fn set_cancel_signal(&mut self, cancel: Arc<AtomicBool>) -> &mut Self {
        self.cancel = Some(cancel);
        self
    }

    /// Derives `Content-Length` when it is unset or zero.
    ///
    /// The length comes from the in-memory content if present, otherwise from the bytes left in
    /// a seekable content stream. With neither, the header stays unset. Only `Content-Length` is
    /// written, so calling this repeatedly is harmless.
    pub fn prepare_immutability(&mut self) -> Result<(), BodyError> {
        if self.content_length().is_some_and(|length| length > 0) {
            return Ok(());
        }

        let length = match (&self.content, &mut self.content_stream) {
            (Some(content), _) => Some(content.len() as u64),
            (None, Some(stream)) => stream.remaining_len()?,
            (None, None) => None,
        };

        if let Some(length) = length {
            trace!(content_length = length, "derived content length");
            self.set_content_length(length);
        }
        Ok(())
    }

    /// Writes the head as it would be sent, without preparing it first.
    pub fn encode_head(&self, dst: &mut BytesMut) {
        message::encode_head(&self.start_line, &self.headers, dst);
    }

    /// Prepares the builder and freezes it into a [`Pdu`] whose raw header is the serialized head.
    ///
    /// An explicit positive `Content-Length` is kept even when in-memory content disagrees with
    /// it; the built body is then [`BodyState::Truncated`] rather than complete.
    pub fn build(mut self) -> Result<Pdu, BodyError> {
        self.prepare_immutability()?;
        let declared = self.content_length();

        let mut head = BytesMut::with_capacity(INIT_HEADER_SIZE);
        self.encode_head(&mut head);
        let raw_header = String::from_utf8_lossy(&head).into_owned();

        let mut pdu = Pdu::from_parts(self.start_line, self.headers, raw_header).with_config(self.config);
        if let Some(content) = self.content {
            let state = match declared {
                Some(length) if length != content.len() as u64 => {
                    debug!(declared = length, actual = content.len(), "content does not match Content-Length");
                    BodyState::Truncated
                }
                _ => BodyState::Complete,
            };
            pdu = pdu.with_acquired_body(AcquiredBody { bytes: content, state });
        } else if let Some(stream) = self.content_stream {
            pdu = pdu.with_boxed_stream(Box::new(stream));
        }
        if let Some(endpoint) = self.remote_endpoint {
            pdu = pdu.with_remote_endpoint(endpoint);
        }
        if let Some(endpoint) = self.local_endpoint {
            pdu = pdu.with_local_endpoint(endpoint);
        }
        if let Some(cancel) = self.cancel {
            pdu = pdu.with_cancel_signal(cancel);
        }
        Ok(pdu)
    }
}

impl TypedHeaders for PduBuilder {
    #[inline]
    fn header_store(&self) -> &HeaderStore {
        &self.headers
    }

    #[inline]
    fn header_store_mut(&mut self) -> &mut HeaderStore {
        &mut self.headers
    }
}
