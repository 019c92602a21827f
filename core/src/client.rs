//! Client handles: the raw client and the JSON client.
//!
//! # Design
//! A client is a `Profile` plus a shared transport. Calls resolve against
//! the profile, hand the descriptor to the transport, drain the response and
//! normalize it, then invoke the completion handler exactly once. Every
//! failure, including a configuration error found before any I/O, arrives
//! through that handler. Deriving a client (`defaults`,
//! `create_json_client`) clones the profile and layers on top of it; the
//! parent is never touched.

use std::fmt;
use std::sync::Arc;

use crate::drain;
use crate::error::ConfigError;
use crate::http::{HttpMethod, RequestDescriptor};
use crate::normalize::{normalize_json, normalize_raw, JsonReply, RawReply};
use crate::options::{Auth, OptionSet};
use crate::resolve::{resolve, Call, DecodeMode, Profile};
use crate::transport::Transport;

/// Pass-through client: replies carry the response and its raw or
/// text-decoded body. HTTP error statuses are not errors.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    profile: Profile,
}

impl Client {
    /// The application's default client. Construct once and share it.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_transport(Arc::new(transport))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            profile: Profile::new(DecodeMode::Raw),
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Derived client with `options` layered over this client's baseline.
    pub fn defaults(&self, options: &OptionSet) -> Client {
        Client {
            transport: Arc::clone(&self.transport),
            profile: self.profile.derive(options),
        }
    }

    /// Derived JSON client inheriting this client's baseline options.
    pub fn create_json_client(&self, options: &OptionSet) -> Result<JsonClient, ConfigError> {
        Ok(JsonClient {
            transport: Arc::clone(&self.transport),
            profile: self.profile.derive_json(options)?,
        })
    }

    /// Resolve without sending.
    pub fn prepare(&self, method: HttpMethod, call: &Call) -> Result<RequestDescriptor, ConfigError> {
        resolve(&self.profile, method, call)
    }

    /// Resolve, send and normalize one call.
    pub fn execute(&self, method: HttpMethod, call: impl Into<Call>) -> RawReply {
        let request = match self.prepare(method, &call.into()) {
            Ok(request) => request,
            Err(err) => return RawReply::failed(err),
        };
        let outcome = drain::collect(self.transport.as_ref(), &request);
        normalize_raw(outcome, request.encoding)
    }

    pub fn request(&self, method: HttpMethod, call: impl Into<Call>, done: impl FnOnce(RawReply)) {
        done(self.execute(method, call))
    }

    pub fn get(&self, call: impl Into<Call>, done: impl FnOnce(RawReply)) {
        self.request(HttpMethod::Get, call, done)
    }

    pub fn head(&self, call: impl Into<Call>, done: impl FnOnce(RawReply)) {
        self.request(HttpMethod::Head, call, done)
    }

    pub fn post(&self, call: impl Into<Call>, done: impl FnOnce(RawReply)) {
        self.request(HttpMethod::Post, call, done)
    }

    pub fn put(&self, call: impl Into<Call>, done: impl FnOnce(RawReply)) {
        self.request(HttpMethod::Put, call, done)
    }

    pub fn patch(&self, call: impl Into<Call>, done: impl FnOnce(RawReply)) {
        self.request(HttpMethod::Patch, call, done)
    }

    pub fn delete(&self, call: impl Into<Call>, done: impl FnOnce(RawReply)) {
        self.request(HttpMethod::Delete, call, done)
    }

    /// Dispatch by method name (any case, `del` allowed).
    pub fn call(&self, method: &str, call: impl Into<Call>, done: impl FnOnce(RawReply)) {
        match method.parse() {
            Ok(method) => self.request(method, call, done),
            Err(err) => done(RawReply::failed(err)),
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").field("profile", &self.profile).finish()
    }
}

/// JSON-oriented client: every reply carries a decoded value, and statuses
/// >= 400 are reported as `Error::Status`.
#[derive(Clone)]
pub struct JsonClient {
    transport: Arc<dyn Transport>,
    profile: Profile,
}

impl JsonClient {
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Further derived JSON client; this one is left unchanged.
    pub fn create_json_client(&self, options: &OptionSet) -> Result<JsonClient, ConfigError> {
        Ok(JsonClient {
            transport: Arc::clone(&self.transport),
            profile: self.profile.derive_json(options)?,
        })
    }

    /// Set basic auth credentials on this client's baseline.
    pub fn basic_auth(&mut self, username: impl Into<String>, password: impl Into<String>) -> &mut Self {
        self.profile.options.auth = Some(Auth::new(username, password));
        self
    }

    pub fn prepare(&self, method: HttpMethod, call: &Call) -> Result<RequestDescriptor, ConfigError> {
        resolve(&self.profile, method, call)
    }

    pub fn execute(&self, method: HttpMethod, call: impl Into<Call>) -> JsonReply {
        let request = match self.prepare(method, &call.into()) {
            Ok(request) => request,
            Err(err) => return JsonReply::failed(None, err),
        };
        let outcome = drain::collect(self.transport.as_ref(), &request);
        normalize_json(request, outcome)
    }

    pub fn request(&self, method: HttpMethod, call: impl Into<Call>, done: impl FnOnce(JsonReply)) {
        done(self.execute(method, call))
    }

    pub fn get(&self, call: impl Into<Call>, done: impl FnOnce(JsonReply)) {
        self.request(HttpMethod::Get, call, done)
    }

    pub fn head(&self, call: impl Into<Call>, done: impl FnOnce(JsonReply)) {
        self.request(HttpMethod::Head, call, done)
    }

    pub fn post(&self, call: impl Into<Call>, done: impl FnOnce(JsonReply)) {
        self.request(HttpMethod::Post, call, done)
    }

    pub fn put(&self, call: impl Into<Call>, done: impl FnOnce(JsonReply)) {
        self.request(HttpMethod::Put, call, done)
    }

    pub fn patch(&self, call: impl Into<Call>, done: impl FnOnce(JsonReply)) {
        self.request(HttpMethod::Patch, call, done)
    }

    pub fn delete(&self, call: impl Into<Call>, done: impl FnOnce(JsonReply)) {
        self.request(HttpMethod::Delete, call, done)
    }

    pub fn call(&self, method: &str, call: impl Into<Call>, done: impl FnOnce(JsonReply)) {
        match method.parse() {
            Ok(method) => self.request(method, call, done),
            Err(err) => done(JsonReply::failed(None, err)),
        }
    }
}

impl fmt::Debug for JsonClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonClient").field("profile", &self.profile).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use bytes::Bytes;
    use serde_json::json;

    use crate::error::{Error, TransportError};
    use crate::http::{Payload, ResponseHead};
    use crate::options::{Encoding, TextEncoding};
    use crate::transport::TransportEvent;

    const BASE: &str = "http://localhost:1337";

    /// Replays a fixed event script and records every request it sees.
    struct ScriptedTransport {
        events: Vec<TransportEvent>,
        seen: Mutex<Vec<RequestDescriptor>>,
    }

    impl ScriptedTransport {
        fn new(events: Vec<TransportEvent>) -> Arc<Self> {
            Arc::new(Self {
                events,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn ok(status: u16, content_type: &str, body: &'static [u8]) -> Arc<Self> {
            Self::new(vec![
                TransportEvent::Head(ResponseHead::new(status).header("Content-Type", content_type)),
                TransportEvent::Data(Bytes::from_static(body)),
                TransportEvent::End,
            ])
        }

        fn seen(&self) -> Vec<RequestDescriptor> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn dispatch(&self, request: &RequestDescriptor, events: &mut dyn FnMut(TransportEvent)) {
            self.seen.lock().unwrap().push(request.clone());
            for event in &self.events {
                events(event.clone());
            }
        }
    }

    #[test]
    fn verbs_send_their_method() {
        let transport = ScriptedTransport::ok(200, "text/plain", b"ok");
        let client = Client::with_transport(transport.clone());

        client.get(BASE, |_| {});
        client.head(BASE, |_| {});
        client.post(BASE, |_| {});
        client.put(BASE, |_| {});
        client.patch(BASE, |_| {});
        client.delete(BASE, |_| {});

        let methods: Vec<_> = transport.seen().iter().map(|r| r.method).collect();
        assert_eq!(
            methods,
            vec![
                HttpMethod::Get,
                HttpMethod::Head,
                HttpMethod::Post,
                HttpMethod::Put,
                HttpMethod::Patch,
                HttpMethod::Delete
            ]
        );
    }

    #[test]
    fn raw_client_returns_bytes_by_default() {
        let client = Client::with_transport(ScriptedTransport::ok(200, "text/plain", b"hello"));
        let mut calls = 0;
        client.post(BASE, |reply| {
            calls += 1;
            let (response, body) = reply.into_result().unwrap();
            assert_eq!(response.status, 200);
            assert_eq!(body, Payload::Bytes(Bytes::from_static(b"hello")));
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn raw_client_returns_string_when_encoding_named() {
        let client = Client::with_transport(ScriptedTransport::ok(200, "text/plain", b"hello"))
            .defaults(&OptionSet::new().encoding(Encoding::Text(TextEncoding::Utf8)));
        client.get(BASE, |reply| {
            let (_, body) = reply.into_result().unwrap();
            assert_eq!(body.as_text(), Some("hello"));
        });
    }

    #[test]
    fn raw_client_does_not_error_on_status() {
        let client = Client::with_transport(ScriptedTransport::ok(500, "application/json", b"{}"));
        client.get(BASE, |reply| {
            assert!(reply.error.is_none());
            assert_eq!(reply.response.unwrap().status, 500);
        });
    }

    #[test]
    fn config_error_reaches_handler_without_io() {
        let transport = ScriptedTransport::ok(200, "text/plain", b"");
        let client = Client::with_transport(transport.clone());
        let mut got = None;
        client.get("/relative", |reply| got = reply.error);
        assert!(matches!(got, Some(Error::Config(ConfigError::UnresolvableBase { .. }))));
        assert!(transport.seen().is_empty());
    }

    #[test]
    fn call_dispatches_by_name() {
        let transport = ScriptedTransport::ok(200, "text/plain", b"");
        let client = Client::with_transport(transport.clone());
        client.call("PATCH", BASE, |reply| assert!(reply.error.is_none()));
        client.call("del", BASE, |reply| assert!(reply.error.is_none()));
        assert_eq!(transport.seen()[0].method, HttpMethod::Patch);
        assert_eq!(transport.seen()[1].method, HttpMethod::Delete);

        client.call("brew", BASE, |reply| {
            assert!(matches!(
                reply.error,
                Some(Error::Config(ConfigError::UnknownMethod(_)))
            ));
        });
        assert_eq!(transport.seen().len(), 2);
    }

    #[test]
    fn defaults_does_not_touch_parent() {
        let parent = Client::with_transport(ScriptedTransport::ok(200, "text/plain", b""));
        let child = parent.defaults(&OptionSet::new().url(BASE).header("X-Child", "1"));
        assert!(parent.profile().base_url.is_none());
        assert!(!parent.profile().options.headers.contains("X-Child"));
        assert_eq!(child.profile().base_url.as_deref(), Some(BASE));
    }

    #[test]
    fn stream_error_reported_once() {
        let transport = ScriptedTransport::new(vec![
            TransportEvent::Head(ResponseHead::new(200)),
            TransportEvent::Error(TransportError::Stream("reset".into())),
            TransportEvent::End,
        ]);
        let client = Client::with_transport(transport);
        let mut calls = 0;
        client.get(BASE, |reply| {
            calls += 1;
            assert!(reply.error.unwrap().is_transport());
            assert!(reply.response.is_none());
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn json_client_hoists_status_errors() {
        let root = Client::with_transport(ScriptedTransport::ok(404, "application/json", br#"{"x":1}"#));
        let json = root.create_json_client(&OptionSet::new().url(BASE)).unwrap();
        json.post(Call::to("/jsonError").body(json!({})), |reply| {
            let err = reply.error.unwrap();
            assert_eq!(err.status_code(), Some(404));
            assert!(reply.request.is_some());
            assert_eq!(reply.object, Some(json!({ "x": 1 })));
            assert_eq!(reply.response.unwrap().body.as_text(), Some(r#"{"x":1}"#));
        });
    }

    #[test]
    fn json_client_rejects_unqualified_base() {
        let root = Client::with_transport(ScriptedTransport::ok(200, "text/plain", b""));
        let err = root
            .create_json_client(&OptionSet::new().base_url("not-a-url"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::BaseUrlNotQualified(_)));
    }

    #[test]
    fn json_client_sends_empty_object_for_no_body() {
        let transport = ScriptedTransport::ok(200, "application/json", b"{}");
        let root = Client::with_transport(transport.clone());
        let json = root.create_json_client(&OptionSet::new().url(BASE)).unwrap();
        json.get(Call::new(), |_| {});

        let sent = &transport.seen()[0];
        assert_eq!(&sent.body[..], b"{}");
        assert_eq!(sent.headers.get("content-type"), Some("application/json"));
        assert_eq!(sent.encoding, Some(Encoding::Raw));
    }

    #[test]
    fn basic_auth_applies_to_later_calls_only_on_that_client() {
        let transport = ScriptedTransport::ok(200, "application/json", b"{}");
        let root = Client::with_transport(transport.clone());
        let mut json = root.create_json_client(&OptionSet::new().url(BASE)).unwrap();
        let sibling = json.clone();

        json.basic_auth("test", "secret");
        json.post("/", |_| {});
        sibling.post("/", |_| {});

        let seen = transport.seen();
        assert_eq!(seen[0].authorization().as_deref(), Some("Basic dGVzdDpzZWNyZXQ="));
        assert!(seen[1].auth.is_none());
    }

    #[test]
    fn json_client_inherits_parent_defaults() {
        let transport = ScriptedTransport::ok(200, "application/json", b"{}");
        let parent = Client::with_transport(transport.clone())
            .defaults(&OptionSet::new().header("X-Parent", "p"));
        let json = parent.create_json_client(&OptionSet::new().url(BASE)).unwrap();
        let nested = json
            .create_json_client(&OptionSet::new().header("X-Nested", "n"))
            .unwrap();
        nested.get(Call::new(), |_| {});

        let sent = &transport.seen()[0];
        assert_eq!(sent.url, BASE);
        assert_eq!(sent.headers.get("X-Parent"), Some("p"));
        assert_eq!(sent.headers.get("X-Nested"), Some("n"));
    }
}
