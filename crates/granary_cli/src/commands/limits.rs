//! The limits command: remaining GitHub API quota.

use clap::ValueEnum;

use granary::github::{RateLimitResource, RateLimitResources};
use granary::{GitHubClient, GitHubConfig};

use crate::config::Config;

/// Output format for tabular commands.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

pub(crate) async fn handle_limits(
    config: &Config,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = config.github_token()?;
    let mut github = GitHubConfig::new(token);
    if let Some(api_base) = config.api_base() {
        github = github.with_api_base(api_base);
    }

    let client = GitHubClient::new(github);
    let overview = client.get_rate_limits().await?;
    let items = rate_limits_to_display(&overview.resources);
    print_many(items, output);

    Ok(())
}

/// Rate limit information for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct RateLimitDisplay {
    #[tabled(rename = "Resource")]
    #[serde(rename = "resource")]
    pub resource: String,
    #[tabled(rename = "Limit")]
    pub limit: String,
    #[tabled(rename = "Used")]
    pub used: String,
    #[tabled(rename = "Remaining")]
    pub remaining: String,
    #[tabled(rename = "Usage %")]
    pub usage_percent: String,
    #[tabled(rename = "Resets At")]
    pub reset_at: String,
    #[tabled(rename = "Resets In")]
    pub reset_in: String,
}

impl RateLimitDisplay {
    fn from_resource(name: &str, resource: &RateLimitResource) -> Self {
        let usage_percent = if resource.limit > 0 {
            (resource.used as f64 / resource.limit as f64) * 100.0
        } else {
            0.0
        };
        let now = chrono::Utc::now();
        let reset_at = resource.reset_at();
        let reset_duration = reset_at.signed_duration_since(now);
        let reset_in = if reset_duration.num_seconds() > 0 {
            format_duration(reset_duration)
        } else {
            "now".to_string()
        };

        Self {
            resource: name.to_string(),
            limit: resource.limit.to_string(),
            used: resource.used.to_string(),
            remaining: resource.remaining.to_string(),
            usage_percent: format!("{:.1}%", usage_percent),
            reset_at: reset_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            reset_in,
        }
    }
}

fn rate_limits_to_display(resources: &RateLimitResources) -> Vec<RateLimitDisplay> {
    let mut items = vec![RateLimitDisplay::from_resource("core", &resources.core)];
    if let Some(ref search) = resources.search {
        items.push(RateLimitDisplay::from_resource("search", search));
    }
    if let Some(ref graphql) = resources.graphql {
        items.push(RateLimitDisplay::from_resource("graphql", graphql));
    }
    items
}

fn print_many(items: Vec<RateLimitDisplay>, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let mut table = tabled::Table::new(items);
            table.with(tabled::settings::Style::rounded());
            println!("{}", table);
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&items) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Failed to serialize rate limits: {}", e),
        },
    }
}

/// Format a duration in a human-readable way.
fn format_duration(duration: chrono::Duration) -> String {
    let total_secs = duration.num_seconds();
    if total_secs < 60 {
        format!("{}s", total_secs)
    } else if total_secs < 3600 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    } else {
        let hours = total_secs / 3600;
        let mins = (total_secs % 3600) / 60;
        if mins > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}h", hours)
        }
    }
}
