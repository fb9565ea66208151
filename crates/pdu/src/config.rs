//! Tunables for body acquisition.
//!
//! [`PduConfig`] deserializes with defaults for every field, so the owning server can embed it
//! in its own configuration file:
//!
//! ```
//! # use micro_pdu::config::PduConfig;
//! let config: PduConfig = serde_json::from_str(r#"{ "receive_timeout_ms": 500 }"#).unwrap();
//! assert_eq!(config.effective_receive_buffer_size(), 8 * 1024 * 1024);
//! ```

use std::time::Duration;

use serde::Deserialize;

/// Default size of the scratch buffer used while reading a body: 8 MiB.
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// Largest accepted scratch buffer size: 1 GiB.
pub const MAX_RECEIVE_BUFFER_SIZE: usize = 1024 * 1024 * 1024;

const DEFAULT_READ_IDLE_WAIT_MS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PduConfig {
    /// Requested scratch buffer size; see [`PduConfig::effective_receive_buffer_size`]
    pub body_receive_buffer_size: usize,
    /// Pause between productive reads that did not complete the body
    pub read_idle_wait_ms: u64,
    /// Read timeout of the async driver; `None` waits as long as the transport does
    pub receive_timeout_ms: Option<u64>,
}

impl Default for PduConfig {
    fn default() -> Self {
        Self {
            body_receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
            read_idle_wait_ms: DEFAULT_READ_IDLE_WAIT_MS,
            receive_timeout_ms: None,
        }
    }
}

impl PduConfig {
    /// The configured buffer size, or the default when it is zero or above the 1 GiB cap.
    pub fn effective_receive_buffer_size(&self) -> usize {
        match self.body_receive_buffer_size {
            0 => DEFAULT_RECEIVE_BUFFER_SIZE,
            size if size > MAX_RECEIVE_BUFFER_SIZE => DEFAULT_RECEIVE_BUFFER_SIZE,
            size => size,
        }
    }

    #[inline]
    pub fn read_idle_wait(&self) -> Duration {
        Duration::from_millis(self.read_idle_wait_ms)
    }

    #[inline]
    pub fn receive_timeout(&self) -> Option<Duration> {
        self.receive_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_receive_buffer_size(mut self, size: usize) -> Self {
        self.body_receive_buffer_size = size;
        self
    }

    pub fn with_read_idle_wait(mut self, wait: Duration) -> Self {
        self.read_idle_wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receive_timeout_ms = timeout.map(|timeout| u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }
}
