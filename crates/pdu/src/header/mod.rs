//! Header fields: the catalog of well-known fields, typed values, the per-message store and the
//! header block parser.
//!
//! # Example
//!
//! ```
//! use micro_pdu::header::{catalog, try_parse_header};
//! use micro_pdu::pdu::PduKind;
//!
//! let mut block = try_parse_header("GET / HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\n", PduKind::Request).unwrap();
//! assert_eq!(block.headers.get_typed::<u64>("content-length"), Some(5));
//! assert!(block.headers.get_by_descriptor(&catalog::HOST).is_some());
//! ```

pub mod catalog;
mod parser;
mod store;
mod value;

pub use catalog::{FieldClass, HeaderFieldDescriptor, PathSemantic, ValueType};
pub use parser::{HeaderBlock, try_parse_header};
pub use store::HeaderStore;
pub use value::{HeaderType, HeaderValue};
