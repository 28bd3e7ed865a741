//! Response types for the sales endpoints.

use std::time::Duration;

use bon::Builder;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::types::{Map, Value};

/// `RateLimit-Remaining`: number of calls left in the current rate-limit window.
pub const RATE_LIMIT_REMAINING: &str = "ratelimit-remaining";
/// `RateLimit-Reset`: number of seconds until the rate-limit window resets.
pub const RATE_LIMIT_RESET: &str = "ratelimit-reset";

/// One element of a page's `items` array. Records are kept as free-form JSON objects since
/// the shape differs per endpoint.
pub type SaleRecord = Map<String, Value>;

/// One page of a sales endpoint.
#[non_exhaustive]
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SalesPage {
    #[serde(default)]
    pub items: Vec<SaleRecord>,
    #[serde(default)]
    pub page_info: PageInfo,
    /// Parsed from the response headers, not the body.
    #[serde(skip)]
    pub rate_limit: RateLimit,
}

impl SalesPage {
    /// The continuation token, ignoring an empty string.
    #[must_use]
    pub fn next_page_token(&self) -> Option<&str> {
        self.page_info
            .next_page_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

/// Pagination metadata from the `page_info` object.
#[serde_as]
#[non_exhaustive]
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq, Builder)]
#[serde(default)]
pub struct PageInfo {
    pub next_page_token: Option<String>,
    pub prev_page_token: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub total_results: Option<u64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub results_per_page: Option<u64>,
}

/// Rate-limit quota reported by a response.
///
/// A header that is missing or not an integer is `None`, which never triggers a pause.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub remaining: Option<u64>,
    pub reset_secs: Option<u64>,
}

impl RateLimit {
    #[must_use]
    pub fn new(remaining: Option<u64>, reset_secs: Option<u64>) -> Self {
        Self {
            remaining,
            reset_secs,
        }
    }

    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
        };

        Self {
            remaining: read(RATE_LIMIT_REMAINING),
            reset_secs: read(RATE_LIMIT_RESET),
        }
    }

    /// How long to wait before the next call: `reset + padding` once the remaining quota is
    /// at or below `threshold`.
    #[must_use]
    pub fn pause(&self, threshold: u64, padding: Duration) -> Option<Duration> {
        let remaining = self.remaining?;
        if remaining > threshold {
            return None;
        }

        Some(Duration::from_secs(self.reset_secs.unwrap_or_default()).saturating_add(padding))
    }
}
