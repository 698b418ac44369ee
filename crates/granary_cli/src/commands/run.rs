//! The run command: extract endpoints and load them into the warehouse.

use clap::ValueEnum;

use granary::{
    Endpoint, EtlPipeline, EtlProgress, GitHubClient, GitHubConfig, OwnerKind, ProgressCallback,
    RunPlan, StateFilter, Warehouse, connect,
};

use crate::config::Config;

/// Endpoint selection on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum EndpointArg {
    Repos,
    Commits,
    Issues,
    PullRequests,
    Events,
    Stargazers,
    Contributors,
}

impl From<EndpointArg> for Endpoint {
    fn from(arg: EndpointArg) -> Self {
        match arg {
            EndpointArg::Repos => Endpoint::Repos,
            EndpointArg::Commits => Endpoint::Commits,
            EndpointArg::Issues => Endpoint::Issues,
            EndpointArg::PullRequests => Endpoint::PullRequests,
            EndpointArg::Events => Endpoint::Events,
            EndpointArg::Stargazers => Endpoint::Stargazers,
            EndpointArg::Contributors => Endpoint::Contributors,
        }
    }
}

/// Issue and pull request state filter.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum StateArg {
    Open,
    Closed,
    #[default]
    All,
}

impl From<StateArg> for StateFilter {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Open => StateFilter::Open,
            StateArg::Closed => StateFilter::Closed,
            StateArg::All => StateFilter::All,
        }
    }
}

/// Arguments for the run command.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RunArgs {
    /// Organization or user that owns the data
    #[arg(short, long)]
    pub owner: String,

    /// Treat the owner as a user account rather than an organization
    #[arg(long)]
    pub user: bool,

    /// Repository for repo-scoped endpoints (commits, issues, ...)
    #[arg(short, long)]
    pub repo: Option<String>,

    /// Endpoints to extract (default: every endpoint when --repo is given,
    /// otherwise just repos)
    #[arg(short, long, value_enum, value_delimiter = ',')]
    pub endpoints: Vec<EndpointArg>,

    /// Only fetch commits and issues updated since this ISO 8601 timestamp
    #[arg(long)]
    pub since: Option<String>,

    /// State filter for issues and pull requests
    #[arg(long, value_enum, default_value_t = StateArg::All)]
    pub state: StateArg,
}

pub(crate) async fn handle_run(
    args: RunArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = config.github_token()?;
    let database_url = config.warehouse_url()?;

    let mut github = GitHubConfig::new(token);
    if let Some(api_base) = config.api_base() {
        github = github.with_api_base(api_base);
    }
    let client = GitHubClient::new(github);
    let warehouse = Warehouse::new(connect(&database_url).await?);

    let endpoints = select_endpoints(&args.endpoints, args.repo.is_some());
    let mut plan = RunPlan::new(args.owner)
        .with_endpoints(endpoints)
        .with_state(args.state.into());
    if args.user {
        plan = plan.with_owner_kind(OwnerKind::User);
    }
    if let Some(repo) = args.repo {
        plan = plan.with_repo(repo);
    }
    if let Some(since) = args.since {
        plan = plan.with_since(since);
    }

    let on_progress = progress_logger();
    let summary = EtlPipeline::new(client, warehouse)
        .run(&plan, Some(&on_progress))
        .await?;

    println!(
        "Loaded {} rows across {} endpoint(s)",
        summary.total_rows,
        summary.per_endpoint.len()
    );
    for (endpoint, rows) in &summary.per_endpoint {
        println!("  {:<14} {:>8} rows -> {}", endpoint.as_str(), rows, endpoint.table());
    }

    Ok(())
}

/// Pick which endpoints to run when none are named explicitly: everything
/// for a repository, just the repo listing for a bare owner.
fn select_endpoints(explicit: &[EndpointArg], has_repo: bool) -> Vec<Endpoint> {
    if !explicit.is_empty() {
        explicit.iter().map(|&arg| Endpoint::from(arg)).collect()
    } else if has_repo {
        Endpoint::ALL.to_vec()
    } else {
        vec![Endpoint::Repos]
    }
}

/// Progress callback that reports pipeline events through tracing.
fn progress_logger() -> ProgressCallback {
    Box::new(|event| match event {
        EtlProgress::EndpointStarted { endpoint } => {
            tracing::info!(%endpoint, "extracting");
        }
        EtlProgress::Extracted { endpoint, records } => {
            tracing::info!(%endpoint, records, "extracted");
        }
        EtlProgress::Loaded { endpoint, table, rows } => {
            tracing::info!(%endpoint, table, rows, "loaded");
        }
        EtlProgress::RunComplete { endpoints, total_rows } => {
            tracing::info!(endpoints, total_rows, "run complete");
        }
        _ => {}
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_endpoints_win_over_defaults() {
        let endpoints = select_endpoints(&[EndpointArg::Commits, EndpointArg::Issues], true);
        assert_eq!(endpoints, vec![Endpoint::Commits, Endpoint::Issues]);
    }

    #[test]
    fn a_repo_defaults_to_every_endpoint() {
        assert_eq!(select_endpoints(&[], true), Endpoint::ALL.to_vec());
    }

    #[test]
    fn a_bare_owner_defaults_to_the_repo_listing() {
        assert_eq!(select_endpoints(&[], false), vec![Endpoint::Repos]);
    }

    #[test]
    fn every_endpoint_arg_maps_to_a_pipeline_endpoint() {
        let args = [
            EndpointArg::Repos,
            EndpointArg::Commits,
            EndpointArg::Issues,
            EndpointArg::PullRequests,
            EndpointArg::Events,
            EndpointArg::Stargazers,
            EndpointArg::Contributors,
        ];
        let mapped: Vec<Endpoint> = args.iter().map(|&arg| arg.into()).collect();
        assert_eq!(mapped, Endpoint::ALL.to_vec());
    }

    #[test]
    fn state_args_map_onto_state_filters() {
        assert_eq!(StateFilter::from(StateArg::Open), StateFilter::Open);
        assert_eq!(StateFilter::from(StateArg::Closed), StateFilter::Closed);
        assert_eq!(StateFilter::from(StateArg::All), StateFilter::All);
        assert_eq!(StateFilter::from(StateArg::default()), StateFilter::All);
    }
}
