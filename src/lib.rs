//! Dynamic-value marshaling for the DBus wire format.
//!
//! The crate converts between a dynamic [`Value`] tree and marshaled
//! DBus message bodies, synthesizing type signatures for containers as
//! it goes, and wraps the conversion pair in a blocking method-call
//! agent:
//!
//! - [`de::from_message`] decodes a marshaled body into a [`Value`].
//! - [`ser::to_message`] encodes a slice of [`Value`] arguments into a
//!   marshaled body, using [`sig::synthesize`] for container element
//!   signatures.
//! - [`call::call`] runs one record-addressed method call over any
//!   [`call::Transport`].
//! - [`Agent`] holds a [`bus::Connection`] and exposes the dotted-path
//!   verb surface on top of it.
//!
//! Messages are little-endian only, matching what the built-in
//! connection sends.

mod align;

pub mod agent;
pub mod bus;
pub mod call;
pub mod de;
pub mod error;
pub mod message;
pub mod ser;
pub mod sig;
pub mod value;

pub use agent::Agent;
pub use error::{Error, Result};
pub use message::Message;
pub use value::{TypeDesc, Value};
