use std::fmt;

use url::Url;

use crate::error::{Result, TransportError};

/// A serialized tuple origin, e.g. `https://store.example:8443`.
///
/// Comparison is exact string equality on the ASCII serialization, which is
/// what browsers report in `MessageEvent.origin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(String);

impl Origin {
    /// Derive the origin of an absolute URL.
    pub fn from_url(url: &Url) -> Result<Self> {
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(TransportError::OpaqueOrigin(url.to_string()));
        }
        Ok(Self(origin.ascii_serialization()))
    }

    /// Parse a URL (or a bare origin string) and derive its origin.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input).map_err(|source| TransportError::InvalidUrl {
            url: input.to_string(),
            source,
        })?;
        Self::from_url(&url)
    }

    /// Check an origin reported by the platform against this one.
    pub fn matches(&self, reported: &str) -> bool {
        self.0 == reported
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Origin {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Origin {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_drops_path_query_and_default_port() {
        let origin = Origin::parse("https://store.example:443/p/1?x=2#frag").unwrap();
        assert_eq!(origin, "https://store.example");
    }

    #[test]
    fn origin_keeps_explicit_port() {
        let origin = Origin::parse("http://localhost:3000/embed").unwrap();
        assert_eq!(origin.as_str(), "http://localhost:3000");
    }

    #[test]
    fn matches_is_exact() {
        let origin = Origin::parse("https://store.example").unwrap();
        assert!(origin.matches("https://store.example"));
        assert!(!origin.matches("https://store.example.evil.test"));
        assert!(!origin.matches("http://store.example"));
    }

    #[test]
    fn opaque_origin_is_rejected() {
        assert!(matches!(
            Origin::parse("data:text/html,hi"),
            Err(TransportError::OpaqueOrigin(_))
        ));
    }

    #[test]
    fn relative_url_is_rejected() {
        assert!(matches!(
            Origin::parse("/store"),
            Err(TransportError::InvalidUrl { .. })
        ));
    }
}
