//! Per-site HTTP header overrides.
//!
//! Some platforms refuse the engine's default client. A [`HeaderPolicy`] maps
//! URL patterns to the headers sent for matching URLs; the first matching rule
//! wins and unmatched URLs get no extra headers.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Header name/value pairs sent with engine requests.
pub type HeaderSet = BTreeMap<String, String>;

/// Desktop Chrome user agent accepted by short-form video platforms.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

/// One URL pattern and the headers it triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderRule {
    /// Regular expression matched anywhere in the URL.
    pub pattern: String,
    pub headers: HeaderSet,
}

impl HeaderRule {
    pub fn new(pattern: impl Into<String>, headers: HeaderSet) -> Self {
        Self {
            pattern: pattern.into(),
            headers,
        }
    }
}

/// The built-in rule table.
pub fn default_header_rules() -> Vec<HeaderRule> {
    vec![HeaderRule::new(
        r"tiktok\.com",
        HeaderSet::from([
            ("User-Agent".to_string(), DESKTOP_USER_AGENT.to_string()),
            ("Referer".to_string(), "https://www.tiktok.com/".to_string()),
        ]),
    )]
}

/// Returned when a rule pattern does not compile.
#[derive(Debug, Error)]
#[error("Invalid header rule pattern '{pattern}': {reason}")]
pub struct InvalidHeaderRule {
    pub pattern: String,
    pub reason: String,
}

/// Compiled rule table.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    rules: Vec<(Regex, HeaderSet)>,
}

impl HeaderPolicy {
    /// Compiles the given rules, keeping their order.
    pub fn new(rules: &[HeaderRule]) -> Result<Self, InvalidHeaderRule> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (re, rule.headers.clone()))
                    .map_err(|e| InvalidHeaderRule {
                        pattern: rule.pattern.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Policy with the built-in rules.
    pub fn with_defaults() -> Self {
        Self::new(&default_header_rules()).expect("built-in header rules compile")
    }

    /// Policy that never adds headers.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Headers for `url`, empty when no rule matches.
    pub fn resolve(&self, url: &str) -> HeaderSet {
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(url))
            .map(|(_, headers)| headers.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}
