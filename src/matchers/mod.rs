//! Request matchers
//!
//! A matcher is a named predicate deciding whether a live request corresponds
//! to a recorded one. A cassette combines its configured matchers with AND.

mod builtin;

pub use builtin::{
    BodyMatcher, HeadersMatcher, HeadersSubsetMatcher, HostMatcher, MethodMatcher, PathMatcher,
    QueryMatcher, UriMatcher,
};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::interaction::Request;
use crate::{Result, TapedeckError};

/// Decides whether a live request matches a recorded request
pub trait Matcher: Send + Sync {
    /// Compare `live` against `recorded`
    fn matches(&self, live: &Request, recorded: &Request) -> bool;
}

impl<F> Matcher for F
where
    F: Fn(&Request, &Request) -> bool + Send + Sync,
{
    fn matches(&self, live: &Request, recorded: &Request) -> bool {
        self(live, recorded)
    }
}

/// Name to matcher lookup table
///
/// [`Default`] registers the built-in matchers: `method`, `uri`, `host`,
/// `path`, `query`, `headers`, `headers_subset` and `body`.
#[derive(Clone)]
pub struct MatcherRegistry {
    matchers: BTreeMap<String, Arc<dyn Matcher>>,
}

impl MatcherRegistry {
    /// Registry with no matchers at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            matchers: BTreeMap::new(),
        }
    }

    /// Register (or replace) a matcher under `name`
    pub fn register(&mut self, name: impl Into<String>, matcher: impl Matcher + 'static) {
        self.matchers.insert(name.into(), Arc::new(matcher));
    }

    /// Look up a matcher
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Matcher>> {
        self.matchers.get(name).cloned()
    }

    /// Whether a matcher is registered under `name`
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.matchers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.matchers.keys().map(String::as_str)
    }

    /// Resolve an ordered list of names into a matcher set
    ///
    /// # Errors
    ///
    /// Returns error if any name is not registered
    pub fn resolve(&self, names: &[String]) -> Result<MatcherSet> {
        let matchers = names
            .iter()
            .map(|name| {
                self.get(name)
                    .map(|matcher| (name.clone(), matcher))
                    .ok_or_else(|| TapedeckError::UnknownMatcher(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(MatcherSet { matchers })
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("method", MethodMatcher);
        registry.register("uri", UriMatcher);
        registry.register("host", HostMatcher);
        registry.register("path", PathMatcher);
        registry.register("query", QueryMatcher);
        registry.register("headers", HeadersMatcher);
        registry.register("headers_subset", HeadersSubsetMatcher);
        registry.register("body", BodyMatcher);
        registry
    }
}

impl fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Ordered matchers combined with logical AND
#[derive(Clone)]
pub struct MatcherSet {
    matchers: Vec<(String, Arc<dyn Matcher>)>,
}

impl MatcherSet {
    /// True when every matcher accepts the pair
    #[must_use]
    pub fn matches(&self, live: &Request, recorded: &Request) -> bool {
        self.matchers
            .iter()
            .all(|(_, matcher)| matcher.matches(live, recorded))
    }

    /// Matcher names in order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.matchers.iter().map(|(name, _)| name.clone()).collect()
    }
}

impl fmt::Debug for MatcherSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.matchers.iter().map(|(name, _)| name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_default_registry_has_builtins() {
        let registry = MatcherRegistry::default();
        for name in ["method", "uri", "host", "path", "query", "headers", "headers_subset", "body"] {
            assert!(registry.contains(name), "missing builtin matcher {name}");
        }
        assert!(!registry.contains("digest"));
    }

    #[test]
    fn test_resolve_unknown_matcher() {
        let registry = MatcherRegistry::default();
        let err = registry.resolve(&names(&["method", "digest"])).unwrap_err();
        assert!(matches!(err, TapedeckError::UnknownMatcher(name) if name == "digest"));
    }

    #[test]
    fn test_set_is_logical_and() {
        let registry = MatcherRegistry::default();
        let set = registry.resolve(&names(&["method", "uri"])).unwrap();

        let recorded = Request::get("https://example.test/a");
        assert!(set.matches(&Request::get("https://example.test/a"), &recorded));
        assert!(!set.matches(&Request::post("https://example.test/a", ""), &recorded));
        assert!(!set.matches(&Request::get("https://example.test/b"), &recorded));
    }

    #[test]
    fn test_empty_set_matches_everything() {
        let set = MatcherRegistry::default().resolve(&[]).unwrap();
        assert!(set.matches(&Request::get("http://a/"), &Request::post("http://b/", "x")));
    }

    #[test]
    fn test_register_closure_matcher() {
        let mut registry = MatcherRegistry::default();
        registry.register("same_length", |live: &Request, recorded: &Request| {
            live.uri.len() == recorded.uri.len()
        });

        let set = registry.resolve(&names(&["same_length"])).unwrap();
        assert!(set.matches(&Request::get("http://a/1"), &Request::get("http://b/2")));
        assert_eq!(set.names(), vec!["same_length"]);
    }
}
