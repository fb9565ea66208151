//! Request and response messages.
//!
//! A [`Pdu`] is the parsed or built message; a [`PduBuilder`] accumulates one. Both expose their
//! header fields through [`TypedHeaders`].

mod body;
mod builder;
mod message;
mod start_line;
mod typed;

pub use body::{AcquiredBody, BodyAccumulator, BodyState, acquire_body, acquire_body_async, is_receive_timeout};
pub use builder::{ContentStream, PduBuilder, ReadSeek};
pub use message::Pdu;
pub use start_line::{PduKind, StartLine};
pub use typed::TypedHeaders;
