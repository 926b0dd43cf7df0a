//! Origin derivation.
//!
//! The trusted origin of a client is never stored. It is recomputed from the
//! frame's *current* location every time a message is sent or received,
//! because the embedded content may navigate at any time.

use std::fmt;

use url::Url;

/// Serialized web origin (`scheme://host[:port]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(String);

impl Origin {
    /// Origin of `location`, resolved against `base` when relative.
    ///
    /// `None` when the origin cannot be determined: `about:blank`, `data:`
    /// and every other non-http(s) scheme, or an unparsable location.
    pub fn of(location: &str, base: Option<&Url>) -> Option<Self> {
        let parsed = match base {
            Some(base) => base.join(location),
            None => Url::parse(location),
        };
        let url = parsed.ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        let origin = url.origin();
        origin.is_tuple().then(|| Self(origin.ascii_serialization()))
    }

    /// Serialized origin, as found in `MessageEvent.origin`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether an event origin string equals this origin.
    pub fn matches(&self, event_origin: &str) -> bool {
        self.0 == event_origin
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_origins_drop_path_and_default_port() {
        let origin = Origin::of("https://apps.example:443/orders/#/7", None).unwrap();
        assert_eq!(origin.as_str(), "https://apps.example");

        let origin = Origin::of("http://localhost:8080/a?b=c", None).unwrap();
        assert_eq!(origin.as_str(), "http://localhost:8080");
    }

    #[test]
    fn blank_and_opaque_locations_have_no_origin() {
        assert_eq!(Origin::of("about:blank", None), None);
        assert_eq!(Origin::of("data:text/html,hi", None), None);
        assert_eq!(Origin::of("javascript:void(0)", None), None);
        assert_eq!(Origin::of("file:///tmp/x.html", None), None);
        assert_eq!(Origin::of("not a url", None), None);
    }

    #[test]
    fn relative_locations_use_the_base() {
        let base = Url::parse("https://host.example/shell/").unwrap();
        let origin = Origin::of("/client/#/", Some(&base)).unwrap();
        assert_eq!(origin.as_str(), "https://host.example");
    }

    #[test]
    fn matching_is_exact() {
        let origin = Origin::of("https://apps.example/", None).unwrap();
        assert!(origin.matches("https://apps.example"));
        assert!(!origin.matches("https://apps.example.evil"));
        assert!(!origin.matches("http://apps.example"));
    }
}
