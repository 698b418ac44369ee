//! Sequential ETL runs: extract each endpoint, pass it through the
//! transform stage, and load it into its `raw_*` table.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::github::extract::{self, OwnerKind, StateFilter};
use crate::github::{FetchError, GitHubClient};
use crate::transform;
use crate::warehouse::{LoadError, Warehouse};

/// An API surface the pipeline can warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Repos,
    Commits,
    Issues,
    PullRequests,
    Events,
    Stargazers,
    Contributors,
}

impl Endpoint {
    /// Every endpoint, in default run order.
    pub const ALL: [Endpoint; 7] = [
        Endpoint::Repos,
        Endpoint::Commits,
        Endpoint::Issues,
        Endpoint::PullRequests,
        Endpoint::Events,
        Endpoint::Stargazers,
        Endpoint::Contributors,
    ];

    /// Warehouse table this endpoint lands in.
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Endpoint::Repos => "raw_repos",
            Endpoint::Commits => "raw_commits",
            Endpoint::Issues => "raw_issues",
            Endpoint::PullRequests => "raw_pull_requests",
            Endpoint::Events => "raw_events",
            Endpoint::Stargazers => "raw_stargazers",
            Endpoint::Contributors => "raw_contributors",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::Repos => "repos",
            Endpoint::Commits => "commits",
            Endpoint::Issues => "issues",
            Endpoint::PullRequests => "pull_requests",
            Endpoint::Events => "events",
            Endpoint::Stargazers => "stargazers",
            Endpoint::Contributors => "contributors",
        }
    }

    /// True for endpoints scoped to a single repository. Only the repos
    /// listing is owner-scoped.
    #[must_use]
    pub fn requires_repo(self) -> bool {
        !matches!(self, Endpoint::Repos)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one pipeline run should extract.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub owner: String,
    pub owner_kind: OwnerKind,
    pub repo: Option<String>,
    pub endpoints: Vec<Endpoint>,
    pub since: Option<String>,
    pub state: StateFilter,
}

impl RunPlan {
    /// Plan that extracts the owner's repository list only.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            owner_kind: OwnerKind::default(),
            repo: None,
            endpoints: vec![Endpoint::Repos],
            since: None,
            state: StateFilter::default(),
        }
    }

    #[must_use]
    pub fn with_owner_kind(mut self, owner_kind: OwnerKind) -> Self {
        self.owner_kind = owner_kind;
        self
    }

    #[must_use]
    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: impl Into<Vec<Endpoint>>) -> Self {
        self.endpoints = endpoints.into();
        self
    }

    #[must_use]
    pub fn with_since(mut self, since: impl Into<String>) -> Self {
        self.since = Some(since.into());
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: StateFilter) -> Self {
        self.state = state;
        self
    }
}

/// Progress events emitted during a run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum EtlProgress {
    EndpointStarted {
        endpoint: Endpoint,
    },
    Extracted {
        endpoint: Endpoint,
        records: usize,
    },
    Loaded {
        endpoint: Endpoint,
        table: &'static str,
        rows: u64,
    },
    RunComplete {
        endpoints: usize,
        total_rows: u64,
    },
}

/// Callback for receiving progress events.
pub type ProgressCallback = Box<dyn Fn(EtlProgress) + Send + Sync>;

/// Emit a progress event if a callback is present.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: EtlProgress) {
    if let Some(callback) = on_progress {
        callback(event);
    }
}

/// Errors from a pipeline run, tagged with the endpoint or table involved.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("extraction failed for {endpoint}: {source}")]
    Fetch {
        endpoint: Endpoint,
        #[source]
        source: FetchError,
    },

    #[error("load failed for {table}: {source}")]
    Load {
        table: &'static str,
        #[source]
        source: LoadError,
    },

    #[error("endpoint {0} needs a repository in the plan")]
    MissingRepo(Endpoint),
}

/// Totals from a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total_rows: u64,
    pub per_endpoint: Vec<(Endpoint, u64)>,
}

/// Extract-transform-load runner over one client and one warehouse.
///
/// Endpoints run sequentially in plan order. A failure on any endpoint
/// aborts the run; rows already loaded for earlier endpoints stay loaded.
pub struct EtlPipeline {
    client: GitHubClient,
    warehouse: Warehouse,
}

impl EtlPipeline {
    pub fn new(client: GitHubClient, warehouse: Warehouse) -> Self {
        Self { client, warehouse }
    }

    pub async fn run(
        &self,
        plan: &RunPlan,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<RunSummary, PipelineError> {
        // Validate up front so nothing is fetched for a plan that cannot run.
        for endpoint in &plan.endpoints {
            if endpoint.requires_repo() && plan.repo.is_none() {
                return Err(PipelineError::MissingRepo(*endpoint));
            }
        }

        let mut summary = RunSummary::default();
        for &endpoint in &plan.endpoints {
            emit(on_progress, EtlProgress::EndpointStarted { endpoint });

            let records = self
                .extract(endpoint, plan)
                .await
                .map_err(|source| PipelineError::Fetch { endpoint, source })?;
            emit(
                on_progress,
                EtlProgress::Extracted {
                    endpoint,
                    records: records.len(),
                },
            );

            let records = transform::passthrough(records);
            let table = endpoint.table();
            let rows = self
                .warehouse
                .load_raw(table, &records)
                .await
                .map_err(|source| PipelineError::Load { table, source })?;
            emit(on_progress, EtlProgress::Loaded { endpoint, table, rows });

            summary.total_rows += rows;
            summary.per_endpoint.push((endpoint, rows));
        }

        emit(
            on_progress,
            EtlProgress::RunComplete {
                endpoints: summary.per_endpoint.len(),
                total_rows: summary.total_rows,
            },
        );
        Ok(summary)
    }

    async fn extract(&self, endpoint: Endpoint, plan: &RunPlan) -> Result<Vec<Value>, FetchError> {
        let owner = plan.owner.as_str();
        // Presence was validated in run(); default keeps this total.
        let repo = plan.repo.as_deref().unwrap_or_default();

        match endpoint {
            Endpoint::Repos => extract::list_repos(&self.client, owner, plan.owner_kind).await,
            Endpoint::Commits => {
                extract::list_commits(&self.client, owner, repo, plan.since.as_deref()).await
            }
            Endpoint::Issues => {
                extract::list_issues(&self.client, owner, repo, plan.state, plan.since.as_deref())
                    .await
            }
            Endpoint::PullRequests => {
                extract::list_pull_requests(&self.client, owner, repo, plan.state).await
            }
            Endpoint::Events => extract::list_events(&self.client, owner, repo).await,
            Endpoint::Stargazers => extract::list_stargazers(&self.client, owner, repo).await,
            Endpoint::Contributors => extract::list_contributors(&self.client, owner, repo).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::GitHubConfig;
    use crate::http::{HttpResponse, MockTransport};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::{Arc, Mutex};

    const BASE: &str = "https://api.example.test";

    fn client(transport: Arc<MockTransport>) -> GitHubClient {
        GitHubClient::with_transport(
            GitHubConfig::new("test-token").with_api_base(BASE),
            transport,
        )
    }

    fn ok_page(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn exec_ok(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            rows_affected,
            last_insert_id: 0,
        }
    }

    fn recording_callback() -> (ProgressCallback, Arc<Mutex<Vec<EtlProgress>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| sink.lock().unwrap().push(event));
        (callback, events)
    }

    #[tokio::test]
    async fn run_extracts_loads_and_reports_progress() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(
            format!("{BASE}/orgs/acme/repos"),
            ok_page(r#"[{"id":1},{"id":2}]"#),
        );
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec_ok(0), exec_ok(1), exec_ok(1)])
            .into_connection();

        let pipeline = EtlPipeline::new(client(Arc::clone(&transport)), Warehouse::new(db));
        let (callback, events) = recording_callback();

        let summary = pipeline
            .run(&RunPlan::new("acme"), Some(&callback))
            .await
            .expect("run should succeed");

        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.per_endpoint, vec![(Endpoint::Repos, 2)]);

        let events = events.lock().unwrap();
        assert!(matches!(
            events[0],
            EtlProgress::EndpointStarted {
                endpoint: Endpoint::Repos
            }
        ));
        assert!(matches!(events[1], EtlProgress::Extracted { records: 2, .. }));
        assert!(matches!(
            events[2],
            EtlProgress::Loaded {
                table: "raw_repos",
                rows: 2,
                ..
            }
        ));
        assert!(matches!(
            events[3],
            EtlProgress::RunComplete {
                endpoints: 1,
                total_rows: 2
            }
        ));
    }

    #[tokio::test]
    async fn run_covers_endpoints_in_plan_order() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(
            format!("{BASE}/orgs/acme/repos"),
            ok_page(r#"[{"id":1}]"#),
        );
        transport.push_response(
            format!("{BASE}/repos/acme/widget/stargazers"),
            ok_page(r#"[{"starred_at":"2024-01-01T00:00:00Z"}]"#),
        );
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec_ok(0), exec_ok(1), exec_ok(0), exec_ok(1)])
            .into_connection();

        let plan = RunPlan::new("acme")
            .with_repo("widget")
            .with_endpoints([Endpoint::Repos, Endpoint::Stargazers]);
        let summary = EtlPipeline::new(client(Arc::clone(&transport)), Warehouse::new(db))
            .run(&plan, None)
            .await
            .expect("run should succeed");

        assert_eq!(
            summary.per_endpoint,
            vec![(Endpoint::Repos, 1), (Endpoint::Stargazers, 1)]
        );
    }

    #[tokio::test]
    async fn repo_scoped_endpoints_need_a_repo_before_anything_runs() {
        let transport = Arc::new(MockTransport::new());
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let plan = RunPlan::new("acme").with_endpoints([Endpoint::Commits]);
        let err = EtlPipeline::new(client(Arc::clone(&transport)), Warehouse::new(db))
            .run(&plan, None)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::MissingRepo(Endpoint::Commits)));
        assert!(
            transport.requests().is_empty(),
            "validation must run before any request"
        );
    }

    #[tokio::test]
    async fn fetch_failures_abort_the_run_with_the_endpoint_named() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(
            format!("{BASE}/orgs/acme/repos"),
            HttpResponse {
                status: 500,
                headers: Vec::new(),
                body: b"boom".to_vec(),
            },
        );
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = EtlPipeline::new(client(Arc::clone(&transport)), Warehouse::new(db))
            .run(&RunPlan::new("acme"), None)
            .await
            .unwrap_err();

        match err {
            PipelineError::Fetch { endpoint, .. } => assert_eq!(endpoint, Endpoint::Repos),
            other => panic!("expected Fetch error, got {other}"),
        }
    }

    #[test]
    fn every_endpoint_has_a_raw_table() {
        for endpoint in Endpoint::ALL {
            let table = endpoint.table();
            assert!(table.starts_with("raw_"), "{endpoint} lands in {table}");
            assert_eq!(table, format!("raw_{}", endpoint.as_str()));
        }
    }
}
