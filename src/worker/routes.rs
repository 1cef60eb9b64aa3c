//! Declarative route table for the cache worker.
//!
//! The table is an ordered list of (matcher, strategy) pairs, built once at
//! worker install time and immutable afterwards. Resolution is first match
//! wins, in registration order.

use std::sync::LazyLock;

use regex::Regex;

/// Cache key of the application shell document served to navigations.
pub const SHELL_DOCUMENT: &str = "/index.html";

/// Static clock-face image; identical bytes are expected indefinitely, so it
/// is served cache-first.
pub const CLOCK_FACE_URL: &str = "https://tycho.usno.navy.mil/images/usnoseal.gif";

/// Live time-service endpoint, proxied through cors-anywhere. Freshness
/// matters more than availability, so it is served network-first.
static TIME_SERVICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)http://cors-anywhere\.herokuapp\.com/http://tycho\.usno\.navy\.mil/cgi-bin/time\.pl")
        .expect("valid regex")
});

pub fn time_service_pattern() -> Regex {
    TIME_SERVICE_RE.clone()
}

/// A request as seen by the worker's fetch handler.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub is_navigation: bool,
}

impl FetchRequest {
    /// A full-page navigation request.
    pub fn navigation(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_navigation: true,
        }
    }

    /// A subresource or API request.
    pub fn resource(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_navigation: false,
        }
    }
}

/// How a matched request is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve from cache only; a miss is an error. Used for precached assets.
    CacheOnly,
    /// Try the network, fall back to cache on failure.
    NetworkFirst,
    /// Serve from cache, fall back to the network on a miss.
    CacheFirst,
}

#[derive(Debug, Clone)]
pub enum Matcher {
    /// Any full-page navigation request.
    Navigation,
    /// Exact URL match.
    Exact(String),
    /// Regular-expression match anywhere in the URL.
    Pattern(Regex),
}

impl Matcher {
    pub fn matches(&self, request: &FetchRequest) -> bool {
        match self {
            Matcher::Navigation => request.is_navigation,
            Matcher::Exact(url) => request.url == *url,
            Matcher::Pattern(pattern) => pattern.is_match(&request.url),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    matcher: Matcher,
    strategy: Strategy,
    /// Cache key served instead of the request URL (navigation fallback).
    serve_from: Option<String>,
}

impl Route {
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The cache key this route serves `request` from.
    pub fn cache_key<'a>(&'a self, request: &'a FetchRequest) -> &'a str {
        self.serve_from.as_deref().unwrap_or(&request.url)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct cache-served route for a precached asset.
    pub fn register_precache_route(&mut self, url: impl Into<String>) {
        self.routes.push(Route {
            matcher: Matcher::Exact(url.into()),
            strategy: Strategy::CacheOnly,
            serve_from: None,
        });
    }

    /// Catch-all navigation route serving the cached shell document.
    pub fn register_navigation_route(&mut self, document: impl Into<String>) {
        self.routes.push(Route {
            matcher: Matcher::Navigation,
            strategy: Strategy::CacheOnly,
            serve_from: Some(document.into()),
        });
    }

    /// Pattern-matched route bound to a strategy.
    pub fn register_route(&mut self, matcher: Matcher, strategy: Strategy) {
        self.routes.push(Route {
            matcher,
            strategy,
            serve_from: None,
        });
    }

    /// Resolve `request` against the table; first matching route wins.
    pub fn resolve(&self, request: &FetchRequest) -> Option<&Route> {
        self.routes.iter().find(|route| route.matcher.matches(request))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }
}

/// The shell's fixed route table: precache routes first (manifest entries and
/// the shell document), then the navigation fallback, then the external
/// strategy routes.
pub fn default_table(precache: &[String]) -> RouteTable {
    let mut table = RouteTable::new();
    for url in precache {
        table.register_precache_route(url.clone());
    }
    table.register_precache_route(SHELL_DOCUMENT);
    table.register_navigation_route(SHELL_DOCUMENT);
    table.register_route(Matcher::Pattern(time_service_pattern()), Strategy::NetworkFirst);
    table.register_route(
        Matcher::Exact(CLOCK_FACE_URL.to_string()),
        Strategy::CacheFirst,
    );
    table
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TIME_SERVICE_URL: &str =
        "http://cors-anywhere.herokuapp.com/http://tycho.usno.navy.mil/cgi-bin/time.pl";

    #[test]
    fn test_first_match_wins() {
        let mut table = RouteTable::new();
        table.register_route(Matcher::Exact("/a".to_string()), Strategy::NetworkFirst);
        table.register_route(Matcher::Exact("/a".to_string()), Strategy::CacheFirst);

        let route = table.resolve(&FetchRequest::resource("/a")).unwrap();
        assert_eq!(route.strategy(), Strategy::NetworkFirst);
    }

    #[test]
    fn test_navigation_route_is_catch_all_for_navigations() {
        let table = default_table(&[]);

        for path in ["/", "/settings", "/clock/12", "/deep/nested/route"] {
            let request = FetchRequest::navigation(path);
            let route = table.resolve(&request).unwrap();
            assert_eq!(route.strategy(), Strategy::CacheOnly);
            assert_eq!(route.cache_key(&request), SHELL_DOCUMENT);
        }
    }

    #[test]
    fn test_navigation_route_ignores_resources() {
        let table = default_table(&[]);
        assert!(table
            .resolve(&FetchRequest::resource("https://example.com/data.json"))
            .is_none());
    }

    #[test]
    fn test_time_service_matches_network_first() {
        let table = default_table(&[]);
        let route = table
            .resolve(&FetchRequest::resource(TIME_SERVICE_URL))
            .unwrap();
        assert_eq!(route.strategy(), Strategy::NetworkFirst);
    }

    #[test]
    fn test_time_service_pattern_is_case_insensitive() {
        let upper = TIME_SERVICE_URL.to_uppercase();
        assert!(time_service_pattern().is_match(&upper));
    }

    #[test]
    fn test_clock_face_matches_cache_first() {
        let table = default_table(&[]);
        let route = table
            .resolve(&FetchRequest::resource(CLOCK_FACE_URL))
            .unwrap();
        assert_eq!(route.strategy(), Strategy::CacheFirst);
    }

    #[test]
    fn test_precache_entries_come_first() {
        let manifest = vec!["/app.js".to_string()];
        let table = default_table(&manifest);

        let request = FetchRequest::resource("/app.js");
        let route = table.resolve(&request).unwrap();
        assert_eq!(route.strategy(), Strategy::CacheOnly);
        assert_eq!(route.cache_key(&request), "/app.js");

        // manifest + shell document + navigation + two external routes
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_shell_document_served_directly() {
        let table = default_table(&[]);
        let request = FetchRequest::resource(SHELL_DOCUMENT);
        let route = table.resolve(&request).unwrap();
        assert_eq!(route.strategy(), Strategy::CacheOnly);
    }
}
