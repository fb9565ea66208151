//! Parsing of a raw header block into a start line and a [`HeaderStore`].
//!
//! The parser is deliberately lenient about field lines: a line without a colon is kept with an
//! empty value, and obs-fold continuation lines are joined to the previous field. It is strict
//! only where the message would otherwise be unusable: an empty block, a broken start line, and
//! a missing or invalid `Host` on requests.

use tracing::trace;

use super::HeaderStore;
use super::catalog;
use crate::error::ParseError;
use crate::host::Host;
use crate::pdu::{PduKind, StartLine};
use crate::utils::ensure;

/// A parsed header block: the start line and the fields that follow it.
#[derive(Debug, Clone)]
pub struct HeaderBlock {
    pub start_line: StartLine,
    pub headers: HeaderStore,
}

/// Parses a header block with CRLF or LF line endings.
///
/// Leading blank lines are skipped and parsing stops at the first blank line after the start
/// line, so a block followed by body bytes is accepted as well.
pub fn try_parse_header(text: &str, kind: PduKind) -> Result<HeaderBlock, ParseError> {
    ensure!(!text.trim().is_empty(), ParseError::EmptyHeader);

    let mut lines = text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));
    let first = lines.by_ref().find(|line| !line.trim().is_empty()).ok_or(ParseError::EmptyHeader)?;
    let start_line = StartLine::parse(first, kind)?;

    let mut headers = HeaderStore::new();
    let mut last_name: Option<&str> = None;
    let mut host_lines = 0usize;
    for line in lines {
        if line.is_empty() {
            break;
        }

        if line.starts_with([' ', '\t']) {
            match last_name {
                Some(name) => headers.continue_line(name, line.trim()),
                None => trace!(line, "skip continuation line without a field"),
            }
            continue;
        }

        let (name, value) = line.split_once(':').unwrap_or((line, ""));
        let name = name.trim();
        if name.is_empty() {
            trace!(line, "skip field line without a name");
            continue;
        }

        if name.eq_ignore_ascii_case(catalog::HOST.name()) {
            host_lines += 1;
        }
        headers.append(name, value.trim());
        last_name = Some(name);
    }

    if kind == PduKind::Request {
        ensure!(host_lines <= 1, ParseError::invalid_host("repeated Host field"));
        let host: Host = headers.get_text(catalog::HOST.name()).ok_or(ParseError::MissingHost)?.parse()?;
        headers.insert(catalog::HOST.name(), host);
    }

    trace!(start_line = %start_line, header_count = headers.len(), "parsed header block");
    Ok(HeaderBlock { start_line, headers })
}
