//! Endpoint extractors: thin wrappers that point the paginated fetch loop
//! at each API surface we warehouse.

use std::fmt;

use serde_json::Value;

use super::client::{ACCEPT_JSON, ACCEPT_STAR_JSON, GitHubClient};
use super::error::Result;

/// Page size requested from list endpoints. The API caps pages at 100.
const PER_PAGE: &str = "100";

/// Whether an owner is an organization or a user account.
///
/// The repos endpoint lives under a different path for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnerKind {
    #[default]
    Org,
    User,
}

/// State filter for issues and pull requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFilter {
    Open,
    Closed,
    #[default]
    All,
}

impl StateFilter {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
            StateFilter::All => "all",
        }
    }
}

impl fmt::Display for StateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn base_query() -> Vec<(String, String)> {
    vec![("per_page".to_string(), PER_PAGE.to_string())]
}

/// List every repository owned by an organization or user.
pub async fn list_repos(
    client: &GitHubClient,
    owner: &str,
    kind: OwnerKind,
) -> Result<Vec<Value>> {
    let endpoint = match kind {
        OwnerKind::Org => format!("orgs/{owner}/repos"),
        OwnerKind::User => format!("users/{owner}/repos"),
    };
    client.get_paginated(&endpoint, &base_query(), ACCEPT_JSON).await
}

/// List commits on the default branch, optionally only those since an
/// ISO 8601 timestamp.
pub async fn list_commits(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
    since: Option<&str>,
) -> Result<Vec<Value>> {
    let mut query = base_query();
    if let Some(since) = since {
        query.push(("since".to_string(), since.to_string()));
    }
    client
        .get_paginated(&format!("repos/{owner}/{repo}/commits"), &query, ACCEPT_JSON)
        .await
}

/// List issues. The state filter is always sent; `since` only when given.
pub async fn list_issues(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
    state: StateFilter,
    since: Option<&str>,
) -> Result<Vec<Value>> {
    let mut query = base_query();
    query.push(("state".to_string(), state.as_str().to_string()));
    if let Some(since) = since {
        query.push(("since".to_string(), since.to_string()));
    }
    client
        .get_paginated(&format!("repos/{owner}/{repo}/issues"), &query, ACCEPT_JSON)
        .await
}

/// List pull requests matching the state filter.
pub async fn list_pull_requests(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
    state: StateFilter,
) -> Result<Vec<Value>> {
    let mut query = base_query();
    query.push(("state".to_string(), state.as_str().to_string()));
    client
        .get_paginated(&format!("repos/{owner}/{repo}/pulls"), &query, ACCEPT_JSON)
        .await
}

/// List recent repository events. The API keeps roughly 90 days of history.
pub async fn list_events(client: &GitHubClient, owner: &str, repo: &str) -> Result<Vec<Value>> {
    client
        .get_paginated(&format!("repos/{owner}/{repo}/events"), &base_query(), ACCEPT_JSON)
        .await
}

/// List stargazers with their `starred_at` timestamps.
///
/// Uses the star media type; the default media type omits the timestamp.
pub async fn list_stargazers(client: &GitHubClient, owner: &str, repo: &str) -> Result<Vec<Value>> {
    client
        .get_paginated(
            &format!("repos/{owner}/{repo}/stargazers"),
            &base_query(),
            ACCEPT_STAR_JSON,
        )
        .await
}

/// List contributors with their commit counts.
pub async fn list_contributors(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
) -> Result<Vec<Value>> {
    client
        .get_paginated(
            &format!("repos/{owner}/{repo}/contributors"),
            &base_query(),
            ACCEPT_JSON,
        )
        .await
}
