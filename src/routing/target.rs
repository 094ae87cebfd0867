//! Upstream URL construction.
//!
//! # Responsibilities
//! - Parse the inbound query into an ordered multimap
//! - Drop the routing parameter from the forwarded query
//! - Join the base address, `api/` namespace and encoded segments
//!
//! # Design Decisions
//! - Segments are escaped with the URI component set: everything except
//!   ASCII alphanumerics and `-_.!~*'()`, so `/`, `?` and `:@&=+$,;` stay
//!   inside their segment

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::{form_urlencoded, Url};

use crate::routing::endpoint::{Endpoint, Route};

/// Namespace prefixed to every non-root upstream path.
const UPSTREAM_NAMESPACE: &str = "api";

/// Characters escaped in a forwarded path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Query parameters in arrival order.
///
/// Keys keep their first-appearance order; repeated keys collect their
/// values in the order they arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    /// Parse a raw (still encoded) query string.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut params = Self::default();
        if let Some(raw) = raw {
            for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
                params.append(key.into_owned(), value.into_owned());
            }
        }
        params
    }

    pub fn append(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Remove a key and all its values.
    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattened `(key, value)` pairs, repeated keys expanded in order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }
}

/// The fixed upstream base address.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    base: Url,
    display: String,
}

impl UpstreamTarget {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base_url)?,
            display: base_url.to_string(),
        })
    }

    /// The base address exactly as configured.
    pub fn base(&self) -> &str {
        &self.display
    }

    /// Build the upstream URL for an accepted route.
    pub fn url_for(&self, route: &Route, query: &QueryParams, routing_param: &str) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);

        let mut path = self.base.path().trim_end_matches('/').to_string();
        path.push('/');
        if route.endpoint != Endpoint::Root {
            path.push_str(UPSTREAM_NAMESPACE);
            for segment in &route.segments {
                path.push('/');
                path.extend(utf8_percent_encode(segment, SEGMENT));
            }
        }
        url.set_path(&path);

        let mut forwarded = query.clone();
        forwarded.remove(routing_param);
        if !forwarded.is_empty() {
            url.query_pairs_mut().extend_pairs(forwarded.pairs());
        }

        url
    }
}
