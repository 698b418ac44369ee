//! GitHub REST API client.
//!
//! One paginated fetch loop serves every endpoint we extract from. The loop
//! follows `Link: <...>; rel="next"` headers until they stop, waits out
//! rate-limit windows, and hands back raw `serde_json::Value` records in
//! the order the API returned them.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use url::Url;

use crate::github::error::{FetchError, Result};
use crate::github::policy::RateLimitPolicy;
use crate::github::types::RateLimitOverview;
use crate::http::{HttpHeaders, HttpRequest, HttpTransport, QueryPairs, ReqwestTransport};

/// Public GitHub REST API base. Overridable for GitHub Enterprise or tests.
pub const API_BASE: &str = "https://api.github.com/";

/// Default media type for REST v3 responses.
pub const ACCEPT_JSON: &str = "application/vnd.github.v3+json";

/// Stargazer media type that includes the `starred_at` timestamp.
pub const ACCEPT_STAR_JSON: &str = "application/vnd.github.v3.star+json";

const USER_AGENT: &str = "granary";

/// Connection settings for [`GitHubClient`].
#[derive(Clone)]
pub struct GitHubConfig {
    /// Personal access token sent as `Authorization: token <value>`.
    pub token: String,
    /// API base URL, always with a trailing slash so endpoint joins work.
    pub api_base: String,
    /// User-Agent header value. GitHub rejects requests without one.
    pub user_agent: String,
}

impl GitHubConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: API_BASE.to_string(),
            user_agent: USER_AGENT.to_string(),
        }
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        let mut base = api_base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        self.api_base = base;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Client for the GitHub REST API.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    config: GitHubConfig,
    policy: RateLimitPolicy,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish()
    }
}

impl GitHubClient {
    /// Create a client backed by a real HTTP transport.
    pub fn new(config: GitHubConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::default()))
    }

    /// Create a client with a custom transport (used by tests).
    pub fn with_transport(config: GitHubConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            config,
            policy: RateLimitPolicy::default(),
        }
    }

    /// Replace the rate-limit policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    fn request_headers(&self, accept: &str) -> HttpHeaders {
        vec![
            ("Accept".to_string(), accept.to_string()),
            ("User-Agent".to_string(), self.config.user_agent.clone()),
            ("Authorization".to_string(), format!("token {}", self.config.token)),
        ]
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<String> {
        let base = Url::parse(&self.config.api_base)?;
        Ok(base.join(endpoint)?.into())
    }

    /// Fetch every page of `endpoint`, following `rel="next"` links.
    ///
    /// `query` is sent with the first request only. Next-page URLs from the
    /// Link header already embed their own query strings, so re-applying the
    /// caller's parameters would corrupt them.
    ///
    /// Responses are handled as follows:
    /// - 401 fails immediately with [`FetchError::Auth`].
    /// - 403 with `X-RateLimit-Remaining: 0` sleeps until the window resets,
    ///   then retries the same request. The default policy retries forever;
    ///   a bounded policy fails with [`FetchError::RateLimited`] once its
    ///   wait budget is spent.
    /// - Any other non-2xx status fails with [`FetchError::Api`].
    ///
    /// A JSON array body extends the result set in order; any other JSON
    /// value is appended as a single record.
    pub async fn get_paginated(
        &self,
        endpoint: &str,
        query: &[(String, String)],
        accept: &str,
    ) -> Result<Vec<Value>> {
        let headers = self.request_headers(accept);
        let mut query: QueryPairs = query.to_vec();
        let mut records: Vec<Value> = Vec::new();
        let mut current = Some(self.endpoint_url(endpoint)?);
        let mut waits: u32 = 0;

        while let Some(url) = current.take() {
            let request = HttpRequest {
                url: url.clone(),
                query: query.clone(),
                headers: headers.clone(),
            };
            let response = self.transport.send(request).await?;

            if response.status == 401 {
                let body = String::from_utf8_lossy(&response.body).into_owned();
                let message = if body.is_empty() {
                    "credentials rejected".to_string()
                } else {
                    body
                };
                return Err(FetchError::Auth(message));
            }

            if response.status == 403 && response.header("x-ratelimit-remaining") == Some("0") {
                let reset_epoch = response
                    .header("x-ratelimit-reset")
                    .and_then(|value| value.parse::<i64>().ok())
                    .unwrap_or(0);

                if let Some(max_waits) = self.policy.max_waits() {
                    if waits >= max_waits {
                        return Err(FetchError::RateLimited {
                            reset_at: reset_datetime(reset_epoch),
                        });
                    }
                }
                waits += 1;

                let wait = self.policy.wait_duration(reset_epoch);
                tracing::info!(
                    url = %url,
                    seconds = wait.as_secs(),
                    "rate limit exhausted, sleeping until the window resets"
                );
                tokio::time::sleep(wait).await;
                // Retry the same URL with the same query parameters.
                current = Some(url);
                continue;
            }

            if !(200..300).contains(&response.status) {
                return Err(FetchError::Api {
                    status: response.status,
                    message: String::from_utf8_lossy(&response.body).into_owned(),
                });
            }

            let page: Value = serde_json::from_slice(&response.body)?;
            match page {
                Value::Array(items) => records.extend(items),
                other => records.push(other),
            }

            current = response.header("link").and_then(next_page_url);
            query.clear();
        }

        Ok(records)
    }

    /// Current rate-limit usage across API resources.
    pub async fn get_rate_limits(&self) -> Result<RateLimitOverview> {
        let records = self.get_paginated("rate_limit", &[], ACCEPT_JSON).await?;
        let payload = records.into_iter().next().ok_or_else(|| FetchError::Api {
            status: 200,
            message: "empty rate_limit response".to_string(),
        })?;
        Ok(serde_json::from_value(payload)?)
    }
}

/// Extract the `rel="next"` URL from a Link header.
///
/// Returns `None` when the header has no usable next link, which ends
/// pagination. Malformed headers are never an error.
#[must_use]
pub fn next_page_url(link_header: &str) -> Option<String> {
    for part in link_header.split(',') {
        let part = part.trim();

        let mut url = None;
        let mut rel = None;

        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(rel_value) = segment.strip_prefix("rel=") {
                rel = Some(rel_value.trim_matches('"'));
            }
        }

        if let (Some(url), Some("next")) = (url, rel) {
            if !url.is_empty() {
                return Some(url.to_string());
            }
        }
    }

    None
}

fn reset_datetime(reset_epoch: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(reset_epoch, 0).unwrap_or_else(Utc::now)
}
