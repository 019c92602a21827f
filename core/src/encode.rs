//! Request body classification and encoding.

use bytes::Bytes;
use serde_json::Value;

use crate::error::ConfigError;
use crate::options::{Body, Headers};
use crate::resolve::DecodeMode;

/// Semantic container type of a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Text,
    Binary,
    Empty,
    Structured,
}

impl BodyKind {
    pub fn of(body: Option<&Body>) -> BodyKind {
        match body {
            None | Some(Body::Structured(Value::Null)) => BodyKind::Empty,
            Some(Body::Text(_)) => BodyKind::Text,
            Some(Body::Binary(_)) => BodyKind::Binary,
            Some(Body::Structured(_)) => BodyKind::Structured,
        }
    }
}

/// Content types per body kind, plus the body sent when there is none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMap {
    pub text: &'static str,
    pub binary: &'static str,
    pub empty: &'static str,
    pub structured: &'static str,
    pub empty_placeholder: &'static str,
}

impl TypeMap {
    pub const RAW: TypeMap = TypeMap {
        text: "text/plain",
        binary: "application/octet-stream",
        empty: "text/plain",
        structured: "application/json",
        empty_placeholder: "",
    };

    /// JSON servers reject an empty body, so "no body" is sent as `{}`.
    pub const JSON: TypeMap = TypeMap {
        text: "application/json",
        binary: "application/bson",
        empty: "application/json",
        structured: "application/json",
        empty_placeholder: "{}",
    };

    pub fn for_mode(mode: DecodeMode) -> TypeMap {
        match mode {
            DecodeMode::Raw => TypeMap::RAW,
            DecodeMode::Json => TypeMap::JSON,
        }
    }

    pub fn content_type(&self, kind: BodyKind) -> &'static str {
        match kind {
            BodyKind::Text => self.text,
            BodyKind::Binary => self.binary,
            BodyKind::Empty => self.empty,
            BodyKind::Structured => self.structured,
        }
    }
}

/// Encode a call-supplied body, injecting a Content-Type unless one is set.
pub fn encode_body(
    headers: &mut Headers,
    body: Option<&Body>,
    type_map: &TypeMap,
) -> Result<Bytes, ConfigError> {
    let kind = BodyKind::of(body);
    let encoded = match body {
        Some(Body::Text(s)) => Bytes::from(s.clone()),
        Some(Body::Binary(b)) => b.clone(),
        Some(Body::Structured(v)) if kind == BodyKind::Structured => {
            Bytes::from(serde_json::to_vec(v)?)
        }
        _ => Bytes::from_static(type_map.empty_placeholder.as_bytes()),
    };
    if !headers.contains("content-type") {
        headers.set("Content-Type", type_map.content_type(kind));
    }
    Ok(encoded)
}

/// Bytes for a body placed directly on the options, sent as-is with no
/// Content-Type inference. Structured values are written as JSON text.
pub fn pre_serialized(body: &Body) -> Result<Bytes, ConfigError> {
    Ok(match body {
        Body::Text(s) => Bytes::from(s.clone()),
        Body::Binary(b) => b.clone(),
        Body::Structured(v) => Bytes::from(serde_json::to_vec(v)?),
    })
}
