//! Built-in request matchers

use hyper::Uri;

use super::Matcher;
use crate::interaction::Request;

/// Matches on HTTP method, ignoring case
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodMatcher;

impl Matcher for MethodMatcher {
    fn matches(&self, live: &Request, recorded: &Request) -> bool {
        live.method.eq_ignore_ascii_case(&recorded.method)
    }
}

/// Matches on the full URI; query parameter order is ignored
#[derive(Debug, Clone, Copy, Default)]
pub struct UriMatcher;

impl Matcher for UriMatcher {
    fn matches(&self, live: &Request, recorded: &Request) -> bool {
        match (UriParts::parse(&live.uri), UriParts::parse(&recorded.uri)) {
            (Some(a), Some(b)) => a == b,
            _ => live.uri.trim() == recorded.uri.trim(),
        }
    }
}

/// Matches on host and port
#[derive(Debug, Clone, Copy, Default)]
pub struct HostMatcher;

impl Matcher for HostMatcher {
    fn matches(&self, live: &Request, recorded: &Request) -> bool {
        match (UriParts::parse(&live.uri), UriParts::parse(&recorded.uri)) {
            (Some(a), Some(b)) => a.host == b.host && a.port == b.port,
            _ => false,
        }
    }
}

/// Matches on URI path
#[derive(Debug, Clone, Copy, Default)]
pub struct PathMatcher;

impl Matcher for PathMatcher {
    fn matches(&self, live: &Request, recorded: &Request) -> bool {
        match (UriParts::parse(&live.uri), UriParts::parse(&recorded.uri)) {
            (Some(a), Some(b)) => a.path == b.path,
            _ => false,
        }
    }
}

/// Matches on decoded query parameters, in any order
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryMatcher;

impl Matcher for QueryMatcher {
    fn matches(&self, live: &Request, recorded: &Request) -> bool {
        match (UriParts::parse(&live.uri), UriParts::parse(&recorded.uri)) {
            (Some(a), Some(b)) => a.query == b.query,
            _ => false,
        }
    }
}

/// Matches when both requests carry exactly the same headers
///
/// Names compare case-insensitively, values are trimmed, order is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadersMatcher;

impl Matcher for HeadersMatcher {
    fn matches(&self, live: &Request, recorded: &Request) -> bool {
        live.headers.normalized() == recorded.headers.normalized()
    }
}

/// Matches when every recorded header is present on the live request
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadersSubsetMatcher;

impl Matcher for HeadersSubsetMatcher {
    fn matches(&self, live: &Request, recorded: &Request) -> bool {
        let live_headers = live.headers.normalized();
        recorded
            .headers
            .normalized()
            .iter()
            .all(|pair| live_headers.contains(pair))
    }
}

/// Matches on exact body bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyMatcher;

impl Matcher for BodyMatcher {
    fn matches(&self, live: &Request, recorded: &Request) -> bool {
        live.body.as_bytes() == recorded.body.as_bytes()
    }
}

/// Comparable pieces of a URI
#[derive(Debug, PartialEq, Eq)]
struct UriParts {
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    path: String,
    query: Vec<(String, String)>,
}

impl UriParts {
    fn parse(raw: &str) -> Option<Self> {
        let uri: Uri = raw.trim().parse().ok()?;

        Some(Self {
            scheme: uri.scheme_str().map(str::to_lowercase),
            host: uri.host().map(str::to_lowercase),
            port: uri.port_u16(),
            path: uri.path().to_string(),
            query: parse_query(uri.query().unwrap_or_default()),
        })
    }
}

/// Split and decode a query string into sorted pairs
fn parse_query(query: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = query
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            (decode(key), decode(value))
        })
        .collect();
    pairs.sort();
    pairs
}

fn decode(component: &str) -> String {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced).map_or(spaced.clone(), |decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_ignores_case() {
        assert!(MethodMatcher.matches(&Request::new("get", "http://a/"), &Request::get("http://a/")));
        assert!(!MethodMatcher.matches(&Request::new("PUT", "http://a/"), &Request::get("http://a/")));
    }

    #[test]
    fn test_uri_ignores_query_order_and_host_case() {
        let live = Request::get("https://Example.test/search?b=2&a=1");
        let recorded = Request::get("https://example.test/search?a=1&b=2");
        assert!(UriMatcher.matches(&live, &recorded));
    }

    #[test]
    fn test_uri_differs_on_path_scheme_or_port() {
        let recorded = Request::get("https://example.test/a");
        assert!(!UriMatcher.matches(&Request::get("https://example.test/b"), &recorded));
        assert!(!UriMatcher.matches(&Request::get("http://example.test/a"), &recorded));
        assert!(!UriMatcher.matches(&Request::get("https://example.test:8443/a"), &recorded));
    }

    #[test]
    fn test_uri_falls_back_to_string_comparison() {
        let recorded = Request::get("not a uri");
        assert!(UriMatcher.matches(&Request::get(" not a uri "), &recorded));
        assert!(!UriMatcher.matches(&Request::get("still not a uri"), &recorded));
    }

    #[test]
    fn test_host_and_path() {
        let recorded = Request::get("https://example.test/a?x=1");
        let live = Request::get("https://example.test/b?x=2");
        assert!(HostMatcher.matches(&live, &recorded));
        assert!(!PathMatcher.matches(&live, &recorded));
        assert!(PathMatcher.matches(&Request::get("https://other.test/a"), &recorded));
    }

    #[test]
    fn test_query_decodes_values() {
        let live = Request::get("http://a/?q=hello%20world&tag=x+y");
        let recorded = Request::get("http://a/?tag=x%20y&q=hello+world");
        assert!(QueryMatcher.matches(&live, &recorded));
        assert!(!QueryMatcher.matches(&Request::get("http://a/?q=hello"), &recorded));
    }

    #[test]
    fn test_headers_exact_vs_subset() {
        let recorded = Request::get("http://a/").with_header("Accept", "application/json");
        let live = Request::get("http://a/")
            .with_header("accept", "application/json")
            .with_header("User-Agent", "tests");

        assert!(!HeadersMatcher.matches(&live, &recorded));
        assert!(HeadersSubsetMatcher.matches(&live, &recorded));
        assert!(!HeadersSubsetMatcher.matches(&recorded, &live));

        let same = Request::get("http://a/").with_header("ACCEPT", " application/json ");
        assert!(HeadersMatcher.matches(&same, &recorded));
    }

    #[test]
    fn test_body_compares_bytes_across_representations() {
        let live = Request::post("http://a/", b"payload".to_vec());
        let recorded = Request::post("http://a/", "payload");
        assert!(BodyMatcher.matches(&live, &recorded));
        assert!(!BodyMatcher.matches(&Request::post("http://a/", "other"), &recorded));
    }

    #[test]
    fn test_parse_query_without_values() {
        assert_eq!(
            parse_query("flag&&k=v"),
            vec![
                ("flag".to_string(), String::new()),
                ("k".to_string(), "v".to_string())
            ]
        );
    }
}
