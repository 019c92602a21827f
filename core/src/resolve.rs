//! Configuration resolver: layered options in, one request descriptor out.
//!
//! # Design
//! A `Profile` is what a client carries: its baseline option layer, the base
//! URL it inherited, and the decoding mode. `resolve` layers a `Call` on top
//! of a profile (baseline, then the call target, then the call options) and
//! collapses the many ways of naming a destination into a single absolute
//! URL. It performs no I/O and never mutates its inputs.

use crate::encode::{encode_body, pre_serialized, BodyKind, TypeMap};
use crate::error::ConfigError;
use crate::http::{HttpMethod, RequestDescriptor};
use crate::options::{Body, Encoding, OptionSet};

/// How a client turns a drained response into a caller-facing result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Pass-through bytes or text; errors only from the transport.
    Raw,
    /// Always decode to a mapping; statuses >= 400 become errors.
    Json,
}

/// The configuration a client resolves calls against.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub options: OptionSet,
    pub base_url: Option<String>,
    pub mode: DecodeMode,
}

impl Profile {
    pub fn new(mode: DecodeMode) -> Self {
        Self {
            options: OptionSet::new(),
            base_url: None,
            mode,
        }
    }

    /// Profile in the same mode with `overrides` layered on the baseline.
    ///
    /// The overrides' `baseUrl` (else `url`, else `uri`) becomes the new base
    /// URL; without one the parent's base URL is inherited.
    pub fn derive(&self, overrides: &OptionSet) -> Profile {
        let (options, base_url) = overrides.clone().take_base_url();
        Profile {
            options: self.options.merge(&options),
            base_url: non_empty(base_url).or_else(|| self.base_url.clone()),
            mode: self.mode,
        }
    }

    /// JSON-mode profile derived from this one. Responses default to raw
    /// bytes unless a layer names an encoding, and the base URL must carry
    /// a scheme.
    pub fn derive_json(&self, overrides: &OptionSet) -> Result<Profile, ConfigError> {
        let raw_default = Profile {
            options: OptionSet::new().encoding(Encoding::Raw).merge(&self.options),
            base_url: self.base_url.clone(),
            mode: DecodeMode::Json,
        };
        let profile = raw_default.derive(overrides);
        if let Some(base) = &profile.base_url {
            if !base.contains("://") {
                return Err(ConfigError::BaseUrlNotQualified(base.clone()));
            }
        }
        Ok(profile)
    }
}

/// Where a call is aimed.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Target {
    /// Use whatever the client's options and base URL name.
    #[default]
    None,
    Url(String),
    /// An option layer standing in for the URL argument.
    Options(OptionSet),
}

/// Everything a single call supplies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Call {
    pub target: Target,
    pub body: Option<Body>,
    pub options: OptionSet,
}

impl Call {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to(url: impl Into<String>) -> Self {
        Self {
            target: Target::Url(url.into()),
            ..Self::default()
        }
    }

    pub fn with(options: OptionSet) -> Self {
        Self {
            target: Target::Options(options),
            ..Self::default()
        }
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn options(mut self, options: OptionSet) -> Self {
        self.options = options;
        self
    }
}

impl From<&str> for Call {
    fn from(url: &str) -> Self {
        Call::to(url)
    }
}

impl From<String> for Call {
    fn from(url: String) -> Self {
        Call::to(url)
    }
}

impl From<OptionSet> for Call {
    fn from(options: OptionSet) -> Self {
        Call::with(options)
    }
}

/// Build the request descriptor for `call` against `profile`.
pub fn resolve(
    profile: &Profile,
    method: HttpMethod,
    call: &Call,
) -> Result<RequestDescriptor, ConfigError> {
    let target = match &call.target {
        Target::None => OptionSet::new(),
        Target::Url(url) => OptionSet::new().url(url.clone()),
        Target::Options(options) => options.clone(),
    };
    let merged = profile.options.merge(&target).merge(&call.options);

    let url = resolve_url(&merged, profile.base_url.as_deref())?;

    let mut headers = merged.headers.clone();
    let call_body = call
        .body
        .as_ref()
        .filter(|b| BodyKind::of(Some(b)) != BodyKind::Empty);
    let body = match (call_body, &merged.body) {
        (None, Some(pre)) => pre_serialized(pre)?,
        (body, _) => encode_body(&mut headers, body, &TypeMap::for_mode(profile.mode))?,
    };

    let encoding = match (merged.encoding, profile.mode) {
        (None, DecodeMode::Raw) => Some(Encoding::Raw),
        (encoding, _) => encoding,
    };

    tracing::debug!(%method, %url, ?encoding, body_len = body.len(), "resolved request");

    Ok(RequestDescriptor {
        method,
        url,
        headers,
        body,
        encoding,
        auth: merged.auth,
        extra: merged.extra,
    })
}

/// Collapse `url`/`uri`/`path`/`baseUrl` and the inherited base URL into one
/// absolute URL.
fn resolve_url(options: &OptionSet, inherited: Option<&str>) -> Result<String, ConfigError> {
    let inherited = inherited.filter(|s| !s.is_empty());
    let candidate = [&options.url, &options.uri, &options.path, &options.base_url]
        .into_iter()
        .filter_map(|s| s.as_deref())
        .chain(inherited)
        .find(|s| !s.is_empty())
        .ok_or(ConfigError::MissingTarget)?;

    let resolved = if candidate.starts_with('/') {
        let base = options
            .base_url
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| inherited.map(str::to_string))
            .or_else(|| synthesize_base(options))
            .ok_or_else(|| ConfigError::UnresolvableBase {
                path: candidate.to_string(),
            })?;
        format!("{}{candidate}", base.trim_end_matches('/'))
    } else {
        candidate.to_string()
    };

    url::Url::parse(&resolved).map_err(|source| ConfigError::InvalidUrl {
        url: resolved.clone(),
        source,
    })?;
    Ok(resolved)
}

/// Base URL from `protocol` + `host`/`hostname` + `port`.
///
/// `host` wins over `hostname`. A `host` that already names a port keeps it
/// and `port` is ignored; `hostname` always takes `port` when given.
fn synthesize_base(options: &OptionSet) -> Option<String> {
    let protocol = options.protocol.as_deref().unwrap_or("http:");
    let protocol = protocol.trim_end_matches(':');

    let authority = match (&options.host, &options.hostname, options.port) {
        (Some(host), _, Some(port)) if !host.contains(':') => format!("{host}:{port}"),
        (Some(host), _, _) => host.clone(),
        (None, Some(hostname), Some(port)) => format!("{hostname}:{port}"),
        (None, Some(hostname), None) => hostname.clone(),
        (None, None, _) => return None,
    };
    Some(format!("{protocol}://{authority}"))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}
