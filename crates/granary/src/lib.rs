//! Granary - a GitHub-to-Postgres warehouse loader.
//!
//! This library extracts raw payloads from the GitHub REST API and appends
//! them to per-endpoint `raw_*` tables in a Postgres warehouse. Everything
//! rides on one paginated, rate-limit-aware fetch loop; endpoint wrappers
//! only choose the path, query, and media type.
//!
//! # Example
//!
//! ```ignore
//! use granary::{connect, Endpoint, EtlPipeline, GitHubClient, GitHubConfig, RunPlan, Warehouse};
//!
//! let client = GitHubClient::new(GitHubConfig::new(token));
//! let warehouse = Warehouse::new(connect(&database_url).await?);
//!
//! let plan = RunPlan::new("acme")
//!     .with_repo("widget")
//!     .with_endpoints(Endpoint::ALL);
//! let summary = EtlPipeline::new(client, warehouse).run(&plan, None).await?;
//! println!("loaded {} rows", summary.total_rows);
//! ```

pub mod github;
pub mod http;
pub mod pipeline;
pub mod transform;
pub mod warehouse;

pub use github::{FetchError, GitHubClient, GitHubConfig, OwnerKind, RateLimitPolicy, StateFilter};
pub use pipeline::{
    Endpoint, EtlPipeline, EtlProgress, PipelineError, ProgressCallback, RunPlan, RunSummary,
};
pub use warehouse::{LoadError, RawTableStat, Warehouse, connect};
