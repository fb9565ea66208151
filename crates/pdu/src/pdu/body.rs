//! Body acquisition: filling a buffer of `Content-Length` bytes from a possibly slow stream.
//!
//! [`BodyAccumulator`] holds the state of one acquisition and knows nothing about IO. The
//! blocking ([`acquire_body`]) and async ([`acquire_body_async`]) drivers feed it from a
//! [`std::io::Read`] or a [`tokio::io::AsyncRead`] with the same rules:
//!
//! * the target length reached: [`BodyState::Complete`]
//! * EOF or a read timeout before that: [`BodyState::Truncated`], the bytes read so far are kept
//!   and no error is reported
//! * any other IO error: [`BodyError::Io`]

use std::cmp;
use std::io::{self, ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{error, trace, warn};

use crate::config::PduConfig;
use crate::error::BodyError;

/// Progress of a message body.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum BodyState {
    /// Nothing has been read yet
    #[default]
    Unread,
    Reading,
    /// Exactly `Content-Length` bytes are available
    Complete,
    /// The body does not match `Content-Length`, e.g. the stream ended or timed out early
    Truncated,
    /// The transport failed mid-body; the stream is dropped and the body is unusable
    Failed,
}

impl BodyState {
    #[inline]
    pub fn is_complete(self) -> bool {
        self == BodyState::Complete
    }

    /// Whether acquisition has finished, successfully or not.
    #[inline]
    pub fn is_finished(self) -> bool {
        matches!(self, BodyState::Complete | BodyState::Truncated | BodyState::Failed)
    }
}

/// The result of a finished acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredBody {
    pub bytes: Bytes,
    pub state: BodyState,
}

/// Accumulates body bytes up to a target length.
#[derive(Debug)]
pub struct BodyAccumulator {
    target: usize,
    buf: BytesMut,
    state: BodyState,
    scratch_size: usize,
}

impl BodyAccumulator {
    pub fn new(content_length: u64, config: &PduConfig) -> Self {
        let target = usize::try_from(content_length).unwrap_or(usize::MAX);
        let state = if target == 0 { BodyState::Complete } else { BodyState::Unread };
        let scratch_size = cmp::min(config.effective_receive_buffer_size(), target);

        Self { target, buf: BytesMut::new(), state, scratch_size }
    }

    #[inline]
    pub fn state(&self) -> BodyState {
        self.state
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.target - self.buf.len()
    }

    /// Size of the scratch buffer a driver should read into.
    #[inline]
    pub fn scratch_size(&self) -> usize {
        self.scratch_size
    }

    /// Copies at most `remaining()` bytes of `chunk`. Returns the number of bytes taken.
    pub fn accept(&mut self, chunk: &[u8]) -> usize {
        if self.state.is_finished() {
            return 0;
        }

        let len = cmp::min(chunk.len(), self.remaining());
        self.buf.extend_from_slice(&chunk[..len]);
        self.state = if self.remaining() == 0 { BodyState::Complete } else { BodyState::Reading };
        len
    }

    /// Stops an unfinished acquisition, keeping the bytes read so far.
    pub fn truncate(&mut self) {
        if !self.state.is_finished() {
            self.state = BodyState::Truncated;
        }
    }

    pub fn finish(self) -> AcquiredBody {
        AcquiredBody { bytes: self.buf.freeze(), state: self.state }
    }
}

#[cfg(windows)]
const RAW_TIMEOUT_CODES: &[i32] = &[10060];
#[cfg(target_os = "linux")]
const RAW_TIMEOUT_CODES: &[i32] = &[110];
#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
const RAW_TIMEOUT_CODES: &[i32] = &[60];
#[cfg(not(any(windows, target_os = "linux", target_os = "macos", target_os = "ios", target_os = "freebsd")))]
const RAW_TIMEOUT_CODES: &[i32] = &[];

/// Whether `e` is a transport read timeout rather than a real failure.
pub fn is_receive_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
        || e.raw_os_error().is_some_and(|code| RAW_TIMEOUT_CODES.contains(&code))
}

fn check_cancelled(cancel: Option<&AtomicBool>) -> Result<(), BodyError> {
    if cancel.is_some_and(|cancel| cancel.load(Ordering::Acquire)) {
        return Err(BodyError::Cancelled);
    }
    Ok(())
}

fn log_truncated(acc: &BodyAccumulator, reason: &str) {
    warn!(received = acc.buf.len(), expected = acc.target, reason, "body truncated");
}

/// Reads a body of `content_length` bytes from a blocking reader.
pub fn acquire_body<R: Read + ?Sized>(
    reader: &mut R,
    content_length: u64,
    config: &PduConfig,
    cancel: Option<&AtomicBool>,
) -> Result<AcquiredBody, BodyError> {
    check_cancelled(cancel)?;

    let mut acc = BodyAccumulator::new(content_length, config);
    let mut scratch = vec![0u8; acc.scratch_size()];
    let idle_wait = config.read_idle_wait();

    while !acc.state().is_finished() {
        let want = cmp::min(scratch.len(), acc.remaining());
        match reader.read(&mut scratch[..want]) {
            Ok(0) => {
                log_truncated(&acc, "eof");
                acc.truncate();
            }
            Ok(read) => {
                let taken = acc.accept(&scratch[..read]);
                trace!(read, taken, remaining = acc.remaining(), "read body bytes");
                if !acc.state().is_finished() && !idle_wait.is_zero() {
                    thread::sleep(idle_wait);
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if is_receive_timeout(&e) => {
                log_truncated(&acc, "receive timeout");
                acc.truncate();
            }
            Err(e) => {
                error!(cause = %e, received = acc.buf.len(), "failed to read body");
                return Err(BodyError::io(e));
            }
        }
    }

    Ok(acc.finish())
}

/// Reads a body of `content_length` bytes from an async reader.
///
/// A read that does not finish within [`PduConfig::receive_timeout`] truncates the body.
pub async fn acquire_body_async<R: AsyncRead + Unpin + ?Sized>(
    reader: &mut R,
    content_length: u64,
    config: &PduConfig,
    cancel: Option<&AtomicBool>,
) -> Result<AcquiredBody, BodyError> {
    check_cancelled(cancel)?;

    let mut acc = BodyAccumulator::new(content_length, config);
    let mut scratch = vec![0u8; acc.scratch_size()];
    let idle_wait = config.read_idle_wait();
    let receive_timeout = config.receive_timeout();

    while !acc.state().is_finished() {
        let want = cmp::min(scratch.len(), acc.remaining());
        let read = reader.read(&mut scratch[..want]);
        let result = match receive_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, read).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::from(ErrorKind::TimedOut)),
            },
            None => read.await,
        };

        match result {
            Ok(0) => {
                log_truncated(&acc, "eof");
                acc.truncate();
            }
            Ok(read) => {
                let taken = acc.accept(&scratch[..read]);
                trace!(read, taken, remaining = acc.remaining(), "read body bytes");
                if !acc.state().is_finished() && !idle_wait.is_zero() {
                    tokio::time::sleep(idle_wait).await;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if is_receive_timeout(&e) => {
                log_truncated(&acc, "receive timeout");
                acc.truncate();
            }
            Err(e) => {
                error!(cause = %e, received = acc.buf.len(), "failed to read body");
                return Err(BodyError::io(e));
            }
        }
    }

    Ok(acc.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tokio::io::ReadBuf;

    /// Replays a script of read results.
    struct ScriptedReader {
        script: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ScriptedReader {
        fn new(script: Vec<io::Result<Vec<u8>>>) -> Self {
            Self { script: script.into() }
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.script.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(mut chunk)) => {
                    let len = cmp::min(buf.len(), chunk.len());
                    buf[..len].copy_from_slice(&chunk[..len]);
                    if len < chunk.len() {
                        self.script.push_front(Ok(chunk.split_off(len)));
                    }
                    Ok(len)
                }
            }
        }
    }

    impl AsyncRead for ScriptedReader {
        fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            let mut scratch = vec![0u8; buf.remaining()];
            let read = Read::read(this, &mut scratch)?;
            buf.put_slice(&scratch[..read]);
            Poll::Ready(Ok(()))
        }
    }

    /// Never yields a byte.
    struct PendingReader;

    impl AsyncRead for PendingReader {
        fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            Poll::Pending
        }
    }

    fn config() -> PduConfig {
        PduConfig::default().with_read_idle_wait(Duration::ZERO)
    }

    #[test]
    fn zero_length_is_complete() {
        let mut reader = ScriptedReader::new(vec![Ok(b"ignored".to_vec())]);
        let body = acquire_body(&mut reader, 0, &config(), None).unwrap();
        assert_eq!(body.state, BodyState::Complete);
        assert!(body.bytes.is_empty());
        assert_eq!(reader.script.len(), 1);
    }

    #[test]
    fn partial_reads_complete() {
        let mut reader = ScriptedReader::new(vec![Ok(b"hello ".to_vec()), Ok(b"wor".to_vec()), Ok(b"ld".to_vec())]);
        let body = acquire_body(&mut reader, 11, &config().with_read_idle_wait(Duration::from_millis(1)), None).unwrap();
        assert_eq!(body.state, BodyState::Complete);
        assert_eq!(&body.bytes[..], b"hello world");
    }

    #[test]
    fn never_reads_past_content_length() {
        let mut reader = ScriptedReader::new(vec![Ok(b"0123456789next message".to_vec())]);
        let body = acquire_body(&mut reader, 10, &config(), None).unwrap();
        assert_eq!(&body.bytes[..], b"0123456789");
        assert_eq!(reader.script.pop_front().unwrap().unwrap(), b"next message".to_vec());
    }

    #[test]
    fn small_scratch_buffer() {
        let mut reader = ScriptedReader::new(vec![Ok(vec![7u8; 100])]);
        let body = acquire_body(&mut reader, 100, &config().with_receive_buffer_size(16), None).unwrap();
        assert_eq!(body.state, BodyState::Complete);
        assert_eq!(body.bytes.len(), 100);
    }

    #[test]
    fn timeout_truncates() {
        let mut reader = ScriptedReader::new(vec![
            Ok(vec![1u8; 40]),
            Err(io::Error::from(ErrorKind::TimedOut)),
            Ok(vec![2u8; 60]),
        ]);
        let body = acquire_body(&mut reader, 100, &config(), None).unwrap();
        assert_eq!(body.state, BodyState::Truncated);
        assert_eq!(body.bytes.len(), 40);
        assert!(!body.state.is_complete());
    }

    #[test]
    fn eof_truncates() {
        let mut reader = ScriptedReader::new(vec![Ok(b"short".to_vec())]);
        let body = acquire_body(&mut reader, 10, &config(), None).unwrap();
        assert_eq!(body.state, BodyState::Truncated);
        assert_eq!(&body.bytes[..], b"short");
    }

    #[test]
    fn interrupted_is_retried() {
        let mut reader = ScriptedReader::new(vec![Err(io::Error::from(ErrorKind::Interrupted)), Ok(b"abc".to_vec())]);
        let body = acquire_body(&mut reader, 3, &config(), None).unwrap();
        assert_eq!(body.state, BodyState::Complete);
    }

    #[test]
    fn fatal_error_propagates() {
        let mut reader = ScriptedReader::new(vec![Ok(b"ab".to_vec()), Err(io::Error::from(ErrorKind::ConnectionReset))]);
        let err = acquire_body(&mut reader, 10, &config(), None).unwrap_err();
        assert!(matches!(err, BodyError::Io { ref source } if source.kind() == ErrorKind::ConnectionReset));
    }

    #[test]
    fn cancelled_before_start() {
        let cancel = AtomicBool::new(true);
        let mut reader = ScriptedReader::new(vec![Ok(b"abc".to_vec())]);
        assert!(matches!(acquire_body(&mut reader, 3, &config(), Some(&cancel)), Err(BodyError::Cancelled)));
    }

    #[test]
    fn receive_timeout_classification() {
        assert!(is_receive_timeout(&io::Error::from(ErrorKind::TimedOut)));
        assert!(is_receive_timeout(&io::Error::from(ErrorKind::WouldBlock)));
        assert!(!is_receive_timeout(&io::Error::from(ErrorKind::BrokenPipe)));
        #[cfg(target_os = "linux")]
        assert!(is_receive_timeout(&io::Error::from_raw_os_error(110)));
        #[cfg(target_os = "macos")]
        assert!(is_receive_timeout(&io::Error::from_raw_os_error(60)));
        #[cfg(windows)]
        assert!(is_receive_timeout(&io::Error::from_raw_os_error(10060)));
    }

    #[test]
    fn accumulator_caps_input() {
        let mut acc = BodyAccumulator::new(4, &config());
        assert_eq!(acc.state(), BodyState::Unread);
        assert_eq!(acc.scratch_size(), 4);
        assert_eq!(acc.accept(b"ab"), 2);
        assert_eq!(acc.state(), BodyState::Reading);
        assert_eq!(acc.accept(b"cdef"), 2);
        assert_eq!(acc.state(), BodyState::Complete);
        assert_eq!(acc.accept(b"gh"), 0);
        acc.truncate();
        assert_eq!(acc.finish(), AcquiredBody { bytes: Bytes::from_static(b"abcd"), state: BodyState::Complete });
    }

    #[tokio::test]
    async fn async_partial_reads_complete() {
        let mut reader = ScriptedReader::new(vec![Ok(b"hello ".to_vec()), Ok(b"world".to_vec())]);
        let body = acquire_body_async(&mut reader, 11, &config(), None).await.unwrap();
        assert_eq!(body.state, BodyState::Complete);
        assert_eq!(&body.bytes[..], b"hello world");
    }

    #[tokio::test]
    async fn async_receive_timeout_truncates() {
        let config = config().with_receive_timeout(Some(Duration::from_millis(20)));
        let body = acquire_body_async(&mut PendingReader, 10, &config, None).await.unwrap();
        assert_eq!(body.state, BodyState::Truncated);
        assert!(body.bytes.is_empty());
    }

    #[tokio::test]
    async fn async_fatal_error_propagates() {
        let mut reader = ScriptedReader::new(vec![Err(io::Error::from(ErrorKind::ConnectionAborted))]);
        let result = acquire_body_async(&mut reader, 10, &config(), None).await;
        assert!(matches!(result, Err(BodyError::Io { .. })));
    }
}
