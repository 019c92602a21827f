//! The transport capability the host plugs in.
//!
//! # Design
//! The core never opens a connection. A `Transport` takes a resolved
//! `RequestDescriptor` and reports what happened as a sequence of events:
//! the response head, zero or more body chunks, then exactly one terminal
//! `End` or `Error`. Redirects, TLS, compression and pooling all live behind
//! this trait.

use bytes::Bytes;

use crate::error::TransportError;
use crate::http::{RequestDescriptor, ResponseHead};

/// One step of a response as delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Head(ResponseHead),
    Data(Bytes),
    End,
    Error(TransportError),
}

/// Executes request descriptors.
///
/// `dispatch` must emit every event for the request before returning.
/// Events after the first `End` or `Error` are ignored by the drain.
pub trait Transport: Send + Sync {
    fn dispatch(&self, request: &RequestDescriptor, events: &mut dyn FnMut(TransportEvent));
}
