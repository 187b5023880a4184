//! Destination resolution.
//!
//! # Responsibilities
//! - Extract the destination from the path suffix or the query parameter
//! - Percent-decode and repair collapsed scheme slashes
//! - Reject anything that is not an absolute http(s) URL
//!
//! # Design Decisions
//! - One mode per deployment; path mode never looks at `?url=`
//! - In path mode the raw query string is appended unchanged
//! - The validated string is kept as given, not re-serialized

use std::fmt;

use axum::http::Uri;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::config::{DestinationConfig, DestinationMode};
use crate::error::ProxyError;

/// An absolute `http://` or `https://` URL the request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationUrl(String);

impl DestinationUrl {
    /// Repair and validate a decoded destination string.
    pub fn parse(raw: &str) -> Result<Self, ProxyError> {
        if raw.is_empty() {
            return Err(ProxyError::InvalidDestination("missing destination URL".into()));
        }

        let repaired = repair_scheme(raw);
        if !has_prefix_ignore_case(&repaired, "http://") && !has_prefix_ignore_case(&repaired, "https://") {
            return Err(ProxyError::InvalidDestination(format!(
                "`{}` must start with http:// or https://",
                repaired
            )));
        }

        match Url::parse(&repaired) {
            Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(Self(repaired)),
            Ok(_) => Err(ProxyError::InvalidDestination(format!("`{}` has no host", repaired))),
            Err(e) => Err(ProxyError::InvalidDestination(format!(
                "`{}` is not a valid URL: {}",
                repaired, e
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reads the destination from an inbound URI according to the configured mode.
#[derive(Debug, Clone)]
pub struct DestinationResolver {
    mode: DestinationMode,
    /// Path prefix without its trailing slash; empty for the root.
    prefix: String,
    query_param: String,
}

impl DestinationResolver {
    pub fn new(config: &DestinationConfig) -> Self {
        Self {
            mode: config.mode,
            prefix: config.path_prefix.trim_end_matches('/').to_string(),
            query_param: config.query_param.clone(),
        }
    }

    /// Resolve the destination of an inbound request.
    pub fn resolve(&self, uri: &Uri) -> Result<DestinationUrl, ProxyError> {
        let raw = match self.mode {
            DestinationMode::Path => self.from_path(uri)?,
            DestinationMode::Query => self.from_query(uri),
        };

        DestinationUrl::parse(&raw).map_err(|e| match e {
            ProxyError::InvalidDestination(reason) => {
                ProxyError::InvalidDestination(format!("{}. {}", reason, self.usage()))
            }
            other => other,
        })
    }

    fn from_path(&self, uri: &Uri) -> Result<String, ProxyError> {
        let path = uri.path();
        let rest = match path.strip_prefix(self.prefix.as_str()) {
            Some("") => "",
            Some(rest) => match rest.strip_prefix('/') {
                Some(rest) => rest,
                None => return Err(self.outside_prefix()),
            },
            None => return Err(self.outside_prefix()),
        };

        let mut decoded = percent_decode_str(rest)
            .decode_utf8()
            .map_err(|_| ProxyError::InvalidDestination("destination is not valid UTF-8".into()))?
            .into_owned();

        if let Some(query) = uri.query() {
            decoded.push(if decoded.contains('?') { '&' } else { '?' });
            decoded.push_str(query);
        }

        Ok(decoded)
    }

    fn from_query(&self, uri: &Uri) -> String {
        uri.query()
            .and_then(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .find(|(key, _)| key == self.query_param.as_str())
                    .map(|(_, value)| value.into_owned())
            })
            .unwrap_or_default()
    }

    fn outside_prefix(&self) -> ProxyError {
        ProxyError::InvalidDestination(format!("path is outside `{}/`. {}", self.prefix, self.usage()))
    }

    fn usage(&self) -> String {
        match self.mode {
            DestinationMode::Path => format!("Expected format: {}/http(s)://example.com", self.prefix),
            DestinationMode::Query => format!("Expected format: ?{}=http(s)://example.com", self.query_param),
        }
    }
}

/// Restore `scheme://` when a decoder or front server collapsed it to `scheme:/`.
fn repair_scheme(raw: &str) -> String {
    for scheme in ["http:", "https:"] {
        if has_prefix_ignore_case(raw, scheme) {
            let rest = &raw[scheme.len()..];
            if rest.starts_with('/') && !rest.starts_with("//") {
                return format!("{}/{}", &raw[..scheme.len()], rest);
            }
        }
    }
    raw.to_string()
}

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_resolver(prefix: &str) -> DestinationResolver {
        DestinationResolver::new(&DestinationConfig {
            mode: DestinationMode::Path,
            path_prefix: prefix.to_string(),
            query_param: "url".to_string(),
        })
    }

    fn query_resolver() -> DestinationResolver {
        DestinationResolver::new(&DestinationConfig {
            mode: DestinationMode::Query,
            path_prefix: "/api/proxy".to_string(),
            query_param: "url".to_string(),
        })
    }

    fn resolve(resolver: &DestinationResolver, uri: &str) -> Result<String, ProxyError> {
        resolver
            .resolve(&uri.parse::<Uri>().unwrap())
            .map(|d| d.as_str().to_string())
    }

    #[test]
    fn test_path_mode_keeps_query() {
        let resolver = path_resolver("/");
        assert_eq!(
            resolve(&resolver, "/https://example.test/a?b=1").unwrap(),
            "https://example.test/a?b=1"
        );
    }

    #[test]
    fn test_path_mode_decodes_encoded_destination() {
        let resolver = path_resolver("/");
        assert_eq!(
            resolve(&resolver, "/https%3A%2F%2Fexample.test%2Fa%3Fb%3D1").unwrap(),
            "https://example.test/a?b=1"
        );
    }

    #[test]
    fn test_path_mode_with_prefix() {
        let resolver = path_resolver("/proxy/");
        assert_eq!(
            resolve(&resolver, "/proxy/http://example.test/x").unwrap(),
            "http://example.test/x"
        );
        assert!(matches!(
            resolve(&resolver, "/proxyhttp://example.test/x"),
            Err(ProxyError::InvalidDestination(_))
        ));
        assert!(matches!(
            resolve(&resolver, "/other/http://example.test/x"),
            Err(ProxyError::InvalidDestination(_))
        ));
    }

    #[test]
    fn test_path_mode_ignores_url_param() {
        let resolver = path_resolver("/");
        assert!(matches!(
            resolve(&resolver, "/?url=https://example.test/"),
            Err(ProxyError::InvalidDestination(_))
        ));
    }

    #[test]
    fn test_scheme_repair() {
        let resolver = path_resolver("/");
        assert_eq!(
            resolve(&resolver, "/https:/example.test/a").unwrap(),
            "https://example.test/a"
        );
        assert_eq!(
            resolve(&resolver, "/http:/example.test").unwrap(),
            "http://example.test"
        );
        assert_eq!(repair_scheme("HTTPS:/example.test"), "HTTPS://example.test");
        assert_eq!(repair_scheme("https://example.test"), "https://example.test");
    }

    #[test]
    fn test_query_mode() {
        let resolver = query_resolver();
        assert_eq!(
            resolve(&resolver, "/api/proxy?url=https%3A%2F%2Fexample.test%2Fa%3Fb%3D1").unwrap(),
            "https://example.test/a?b=1"
        );
        assert_eq!(
            resolve(&resolver, "/api/proxy?other=1&url=http://example.test/").unwrap(),
            "http://example.test/"
        );
    }

    #[test]
    fn test_rejects_invalid_destinations() {
        let resolver = path_resolver("/");
        for uri in ["/", "/ftp://x", "/example.test", "/http://", "/httpx://example.test"] {
            assert!(
                matches!(resolve(&resolver, uri), Err(ProxyError::InvalidDestination(_))),
                "expected {} to be rejected",
                uri
            );
        }

        let resolver = query_resolver();
        for uri in ["/api/proxy", "/api/proxy?url=", "/api/proxy?url=ftp://x"] {
            assert!(
                matches!(resolve(&resolver, uri), Err(ProxyError::InvalidDestination(_))),
                "expected {} to be rejected",
                uri
            );
        }
    }

    #[test]
    fn test_error_message_includes_usage() {
        let err = resolve(&path_resolver("/"), "/ftp://x").unwrap_err();
        assert!(err.to_string().contains("Expected format: /http(s)://example.com"));
    }
}
