//! GitHub API extraction.
//!
//! This module provides the authenticated, paginated, rate-limit-aware
//! fetch loop and the endpoint extractors built on top of it. Payloads
//! stay as raw JSON; the warehouse stores them verbatim.
//!
//! # Module Structure
//!
//! - [`error`] - Error types for fetch operations
//! - [`policy`] - Rate-limit wait policy with an injectable clock
//! - [`client`] - The client and its paginated fetch loop
//! - [`types`] - Typed rate-limit payloads
//! - [`extract`] - Per-endpoint extractors
//!
//! # Extracting
//!
//! ```ignore
//! use granary::github::{GitHubClient, GitHubConfig, extract};
//!
//! let client = GitHubClient::new(GitHubConfig::new(token));
//! let repos = extract::list_repos(&client, "acme", Default::default()).await?;
//! ```

mod client;
mod error;
pub mod extract;
mod policy;
mod types;

pub use client::{
    ACCEPT_JSON, ACCEPT_STAR_JSON, API_BASE, GitHubClient, GitHubConfig, next_page_url,
};
pub use error::{FetchError, Result};
pub use extract::{OwnerKind, StateFilter};
pub use policy::RateLimitPolicy;
pub use types::{RateLimitOverview, RateLimitResource, RateLimitResources};
