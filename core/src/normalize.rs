//! Response normalizer: drained response in, caller-facing reply out.
//!
//! # Design
//! Raw mode hands back the bytes, or a string when the request named a text
//! encoding, and reports only transport errors. JSON mode always produces a
//! decoded value chosen by content type, exposes the body text on the
//! response, and turns statuses >= 400 into an `HttpStatusError`. Body
//! decode failures never become errors; they fall back to `{}`.

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::{Error, HttpStatusError, Result, TransportError};
use crate::http::{HttpResponse, Payload, RequestDescriptor};
use crate::options::Encoding;

/// Result of a raw-mode call: `(error, response, body)`.
#[derive(Debug)]
pub struct RawReply {
    pub error: Option<Error>,
    pub response: Option<HttpResponse>,
    pub body: Option<Payload>,
}

impl RawReply {
    pub fn failed(error: impl Into<Error>) -> Self {
        Self {
            error: Some(error.into()),
            response: None,
            body: None,
        }
    }

    pub fn into_result(self) -> Result<(HttpResponse, Payload)> {
        match (self.error, self.response, self.body) {
            (Some(err), _, _) => Err(err),
            (None, Some(response), Some(body)) => Ok((response, body)),
            _ => Err(TransportError::Incomplete.into()),
        }
    }
}

/// Result of a JSON-mode call: `(error, request, response, object)`.
///
/// A status error still carries the response and decoded object; transport
/// and configuration errors carry neither.
#[derive(Debug)]
pub struct JsonReply {
    pub error: Option<Error>,
    pub request: Option<RequestDescriptor>,
    pub response: Option<HttpResponse>,
    pub object: Option<Value>,
}

impl JsonReply {
    pub fn failed(request: Option<RequestDescriptor>, error: impl Into<Error>) -> Self {
        Self {
            error: Some(error.into()),
            request,
            response: None,
            object: None,
        }
    }

    pub fn into_result(self) -> Result<(HttpResponse, Value)> {
        match (self.error, self.response, self.object) {
            (Some(err), _, _) => Err(err),
            (None, Some(response), Some(object)) => Ok((response, object)),
            _ => Err(TransportError::Incomplete.into()),
        }
    }
}

/// Raw mode: the response keeps the drained bytes as its `body`; the returned
/// body is decoded only when `encoding` names a text encoding.
pub fn normalize_raw(
    outcome: std::result::Result<HttpResponse, TransportError>,
    encoding: Option<Encoding>,
) -> RawReply {
    let mut response = match outcome {
        Ok(response) => response,
        Err(err) => return RawReply::failed(err),
    };
    let bytes = drained_bytes(&response.body);
    let body = match encoding {
        Some(Encoding::Text(text)) => Payload::Text(text.decode(&bytes)),
        _ => Payload::Bytes(bytes.clone()),
    };
    response.body = Payload::Bytes(bytes);
    RawReply {
        error: None,
        response: Some(response),
        body: Some(body),
    }
}

/// JSON mode: decode by content type, expose the body text on the response
/// and synthesize a status error for >= 400.
pub fn normalize_json(
    request: RequestDescriptor,
    outcome: std::result::Result<HttpResponse, TransportError>,
) -> JsonReply {
    let mut response = match outcome {
        Ok(response) => response,
        Err(err) => return JsonReply::failed(Some(request), err),
    };

    let bytes = drained_bytes(&response.body);
    let object = decode_object(response.content_type(), &bytes);
    let text = String::from_utf8_lossy(&bytes).into_owned();

    let error = if response.status >= 400 {
        tracing::debug!(status = response.status, url = %request.url, "http status error");
        Some(Error::Status(HttpStatusError::new(
            response.status,
            object.clone(),
            text.clone(),
        )))
    } else {
        None
    };

    response.body = Payload::Text(text);
    JsonReply {
        error,
        request: Some(request),
        response: Some(response),
        object: Some(object),
    }
}

/// Decode a response body by media type. Matching is case-sensitive.
pub fn decode_object(content_type: Option<&str>, bytes: &[u8]) -> Value {
    match content_type {
        Some("application/bson") | Some("application/octet-stream") => decode_bson(bytes),
        Some("application/json") | None => decode_json(bytes),
        Some(other) => {
            tracing::trace!(content_type = other, "not decoding body");
            empty_object()
        }
    }
}

fn decode_json(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return empty_object();
    }
    serde_json::from_slice(bytes).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "undecodable json body, using {{}}");
        empty_object()
    })
}

fn decode_bson(bytes: &[u8]) -> Value {
    match bson::from_slice::<bson::Document>(bytes) {
        Ok(doc) => bson::Bson::Document(doc).into_relaxed_extjson(),
        Err(e) => {
            tracing::debug!(error = %e, "undecodable bson body, using {{}}");
            empty_object()
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn drained_bytes(payload: &Payload) -> Bytes {
    match payload {
        Payload::Bytes(b) => b.clone(),
        Payload::Text(s) => Bytes::from(s.clone()),
    }
}
