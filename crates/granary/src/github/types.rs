//! GitHub API data types.
//!
//! Extraction hands payloads through as raw JSON, so the only typed
//! responses here are the rate-limit structures backing the `limits`
//! command.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single rate limit resource entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResource {
    /// Maximum requests allowed per period.
    pub limit: usize,
    /// Requests used in the current period.
    pub used: usize,
    /// Remaining requests in the current period.
    pub remaining: usize,
    /// Unix timestamp when the rate limit resets.
    pub reset: u64,
}

impl RateLimitResource {
    /// Get the reset time as a DateTime.
    #[must_use]
    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.reset as i64, 0).unwrap_or_else(Utc::now)
    }
}

/// Rate limit resources reported by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResources {
    /// Core API rate limit (non-search REST endpoints).
    pub core: RateLimitResource,
    /// Search API rate limit.
    #[serde(default)]
    pub search: Option<RateLimitResource>,
    /// GraphQL API rate limit.
    #[serde(default)]
    pub graphql: Option<RateLimitResource>,
}

/// Full `rate_limit` endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitOverview {
    pub resources: RateLimitResources,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_rate_limit_response() {
        let payload = serde_json::json!({
            "resources": {
                "core": {"limit": 5000, "used": 240, "remaining": 4760, "reset": 1_700_000_000},
                "search": {"limit": 30, "used": 0, "remaining": 30, "reset": 1_700_000_060},
                "graphql": {"limit": 5000, "used": 0, "remaining": 5000, "reset": 1_700_000_000},
            },
            "rate": {"limit": 5000, "used": 240, "remaining": 4760, "reset": 1_700_000_000},
        });

        let overview: RateLimitOverview = serde_json::from_value(payload).unwrap();
        assert_eq!(overview.resources.core.remaining, 4760);
        assert_eq!(overview.resources.search.unwrap().limit, 30);
        assert!(overview.resources.graphql.is_some());
    }

    #[test]
    fn missing_optional_resources_default_to_none() {
        let payload = serde_json::json!({
            "resources": {
                "core": {"limit": 60, "used": 0, "remaining": 60, "reset": 1_700_000_000},
            },
        });

        let overview: RateLimitOverview = serde_json::from_value(payload).unwrap();
        assert!(overview.resources.search.is_none());
        assert!(overview.resources.graphql.is_none());
    }

    #[test]
    fn reset_at_converts_the_epoch() {
        let resource = RateLimitResource {
            limit: 5000,
            used: 0,
            remaining: 5000,
            reset: 1_700_000_000,
        };
        assert_eq!(resource.reset_at().timestamp(), 1_700_000_000);
    }
}
