//! Layered request options.
//!
//! # Design
//! An `OptionSet` is one layer of request configuration. Layers are combined
//! with `merge`, which returns a new value where every field set in the upper
//! layer wins; nothing is merged in place. Headers merge per name, ignoring
//! case when matching but keeping the name exactly as the winning layer
//! spelled it. Keys the resolver does not interpret are kept in `extra` and
//! forwarded to the transport untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ConfigError;

/// Ordered header list with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, String>")]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace a header. A replaced entry keeps its position but
    /// takes the new spelling of the name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(entry) => *entry = (name, value),
            None => self.0.push((name, value)),
        }
    }

    /// New header list with `over` applied on top of `self`.
    pub fn merged(&self, over: &Headers) -> Headers {
        let mut out = self.clone();
        for (name, value) in &over.0 {
            out.set(name.clone(), value.clone());
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, String>> for Headers {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map.into_iter().collect())
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (n, v) in iter {
            headers.set(n, v);
        }
        headers
    }
}

/// A call-supplied request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Binary(Bytes),
    /// Any structured value; serialized as JSON. `Null` counts as no body.
    Structured(Value),
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<Vec<u8>> for Body {
    fn from(b: Vec<u8>) -> Self {
        Body::Binary(Bytes::from(b))
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body::Binary(b)
    }
}

impl From<Value> for Body {
    fn from(v: Value) -> Self {
        Body::Structured(v)
    }
}

impl<'de> Deserialize<'de> for Body {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Body::Text(s),
            other => Body::Structured(other),
        })
    }
}

/// Named text encodings a response body can be decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Ascii,
    Latin1,
    Hex,
    Base64,
    Utf16Le,
}

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin1",
            TextEncoding::Hex => "hex",
            TextEncoding::Base64 => "base64",
            TextEncoding::Utf16Le => "utf16le",
        }
    }

    /// Decode bytes to text. Invalid sequences are replaced, never rejected.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Ascii => bytes.iter().map(|b| (b & 0x7f) as char).collect(),
            TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            TextEncoding::Hex => bytes.iter().map(|b| format!("{b:02x}")).collect(),
            TextEncoding::Base64 => base64::engine::general_purpose::STANDARD.encode(bytes),
            TextEncoding::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
        }
    }
}

impl FromStr for TextEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            "ascii" => Ok(TextEncoding::Ascii),
            "latin1" | "binary" => Ok(TextEncoding::Latin1),
            "hex" => Ok(TextEncoding::Hex),
            "base64" => Ok(TextEncoding::Base64),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Ok(TextEncoding::Utf16Le),
            _ => Err(ConfigError::UnknownEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoding hint for the final response body.
///
/// `Raw` asks for the drained bytes untouched; `Text` asks for a string.
/// An unset hint (`None` on the option set) leaves the choice to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Raw,
    Text(TextEncoding),
}

impl Encoding {
    pub fn named(name: &str) -> Result<Self, ConfigError> {
        name.parse().map(Encoding::Text)
    }
}

/// Credentials for request-level basic authentication.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Auth {
    #[serde(alias = "user")]
    pub username: String,
    #[serde(alias = "pass", default)]
    pub password: String,
}

impl Auth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// `Authorization` header value for these credentials.
    pub fn header_value(&self) -> String {
        let credentials = format!("{}:{}", self.username, self.password);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials)
        )
    }
}

/// One layer of request configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSet {
    pub url: Option<String>,
    pub uri: Option<String>,
    pub path: Option<String>,
    pub base_url: Option<String>,
    pub host: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub protocol: Option<String>,
    #[serde(default)]
    pub headers: Headers,
    pub body: Option<Body>,
    #[serde(default, deserialize_with = "deserialize_encoding")]
    pub encoding: Option<Encoding>,
    pub auth: Option<Auth>,
    /// Transport passthrough (timeouts, proxy, compression flags, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// `null` means raw bytes; a string names a text encoding.
fn deserialize_encoding<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Encoding>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(Some(Encoding::Raw)),
        Some(name) => Encoding::named(&name)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(Auth::new(username, password));
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// New option set with `over` layered on top of `self`.
    pub fn merge(&self, over: &OptionSet) -> OptionSet {
        let mut extra = self.extra.clone();
        extra.extend(over.extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        OptionSet {
            url: over.url.clone().or_else(|| self.url.clone()),
            uri: over.uri.clone().or_else(|| self.uri.clone()),
            path: over.path.clone().or_else(|| self.path.clone()),
            base_url: over.base_url.clone().or_else(|| self.base_url.clone()),
            host: over.host.clone().or_else(|| self.host.clone()),
            hostname: over.hostname.clone().or_else(|| self.hostname.clone()),
            port: over.port.or(self.port),
            protocol: over.protocol.clone().or_else(|| self.protocol.clone()),
            headers: self.headers.merged(&over.headers),
            body: over.body.clone().or_else(|| self.body.clone()),
            encoding: over.encoding.or(self.encoding),
            auth: over.auth.clone().or_else(|| self.auth.clone()),
            extra,
        }
    }

    /// Split out the destination a derived client should treat as its base
    /// URL (`baseUrl`, else `url`, else `uri`), removing all three keys.
    pub fn take_base_url(mut self) -> (OptionSet, Option<String>) {
        let base_url = self
            .base_url
            .take()
            .or_else(|| self.url.take())
            .or_else(|| self.uri.take());
        self.url = None;
        self.uri = None;
        (self, base_url)
    }
}
