//! A typed model of HTTP/1.x protocol data units
//!
//! This crate turns a raw header block into a typed, mutable message and back. It sits below a
//! connection layer: the connection reads the header block and hands over the transport, this
//! crate parses the fields, negotiates content and reads the body.
//!
//! # Features
//!
//! - Lenient header block parsing with mandatory `Host` validation for requests
//! - A catalog of well-known header fields with typed, memoized accessors
//! - Content types with a process-wide registry and `Accept` negotiation
//! - Status codes with fallback parsing
//! - Cookies with crumb values
//! - Body acquisition that tolerates slow or timing-out transports, blocking or async
//! - A builder that derives `Content-Length` before the message is sent
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use micro_pdu::content_type::{AcceptList, ContentType};
//! use micro_pdu::pdu::{Pdu, PduBuilder, TypedHeaders};
//! use micro_pdu::status::StatusCode;
//!
//! let raw = "POST /echo HTTP/1.1\r\nHost: example.com\r\nAccept: application/json, text/*;q=0.5\r\nContent-Length: 5\r\n\r\n";
//! let mut request = Pdu::parse_request(raw).with_stream(Cursor::new(b"hello".to_vec()));
//! assert!(request.is_valid());
//!
//! let body = request.body().unwrap().clone();
//! let offered = [ContentType::plain_text(), ContentType::json()];
//! let accept = request.accept().unwrap_or_default();
//! let content_type = accept.negotiate(&offered).cloned().unwrap_or_else(ContentType::octet_stream);
//!
//! let mut response = PduBuilder::response(StatusCode::OK);
//! response.set_content_type(content_type);
//! response.set_content(body);
//! let mut response = response.build().unwrap();
//!
//! assert_eq!(
//!     &response.entire_pdu().unwrap()[..],
//!     b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 5\r\n\r\nhello"
//! );
//! ```

pub mod config;
pub mod content_type;
pub mod cookie;
pub mod error;
pub mod header;
pub mod host;
pub mod path;
pub mod pdu;
pub mod status;
pub mod version;

mod utils;
