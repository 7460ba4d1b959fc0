//! Admin gate helpers
//!
//! Timing-safe secret comparison and the visible page address that carries
//! the `admin` token.

use url::Url;

/// Query parameter that carries the admin token
pub const ADMIN_PARAM: &str = "admin";

/// Timing-safe string equality.
///
/// Runs over the longer of the two inputs, so neither the position of the
/// first differing byte nor a length mismatch shortens the loop.
pub fn timing_safe_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let len = a.len().max(b.len());
    let mut out = (a.len() ^ b.len()) as u64;
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        out |= u64::from(x ^ y);
    }
    out == 0
}

/// The address shown in the visitor's location bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAddress {
    url: Url,
    rewritten: bool,
}

impl PageAddress {
    /// Parse an absolute page URL
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        Ok(Self::from_url(Url::parse(raw)?))
    }

    /// Resolve a request target (`/path?query`) against the public base URL
    pub fn from_request(base: &Url, target: &str) -> Result<Self, url::ParseError> {
        Ok(Self::from_url(base.join(target)?))
    }

    pub fn from_url(url: Url) -> Self {
        Self {
            url,
            rewritten: false,
        }
    }

    /// Admin token from the query string, if present and non-empty
    pub fn admin_token(&self) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == ADMIN_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }

    /// Remove every `admin` pair from the query, keeping the rest
    pub fn strip_admin_token(&mut self) {
        let kept: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(key, _)| key != ADMIN_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            self.url.set_query(None);
        } else {
            self.url.query_pairs_mut().clear().extend_pairs(kept);
        }
        self.rewritten = true;
    }

    /// Whether the address changed since it was loaded
    pub fn was_rewritten(&self) -> bool {
        self.rewritten
    }

    /// Path and query, suitable for `history.replaceState`
    pub fn visible(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}
