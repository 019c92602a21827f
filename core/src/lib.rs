//! Request-configuration resolver and response normalizer.
//!
//! # Overview
//! Merges layered client defaults with per-call overrides into one fully
//! qualified `RequestDescriptor`, and turns a drained response into either a
//! pass-through reply (raw client) or a decoded-object reply with
//! status-derived errors (JSON client). The network round-trip is delegated
//! to a host-supplied `Transport` (host-does-IO pattern).
//!
//! # Design
//! - `OptionSet` layers are immutable values; `merge` always returns a new one.
//! - `resolve` is pure: same profile and call in, identical descriptor out.
//! - The drain buffers the whole body and keeps only the first terminal
//!   event, so every call completes exactly once.
//! - Decode failures degrade to `{}`; only configuration, transport and
//!   (JSON mode) HTTP status failures are reported as errors.
//! - There is no global client. The host builds one with `Client::new` and
//!   passes it around.

pub mod client;
pub mod drain;
pub mod encode;
pub mod error;
pub mod http;
pub mod normalize;
pub mod options;
pub mod resolve;
pub mod transport;

pub use client::{Client, JsonClient};
pub use encode::{BodyKind, TypeMap};
pub use error::{ConfigError, Error, HttpStatusError, Result, TransportError};
pub use http::{HttpMethod, HttpResponse, Payload, RequestDescriptor, ResponseHead};
pub use normalize::{JsonReply, RawReply};
pub use options::{Auth, Body, Encoding, Headers, OptionSet, TextEncoding};
pub use resolve::{Call, DecodeMode, Profile, Target};
pub use transport::{Transport, TransportEvent};
