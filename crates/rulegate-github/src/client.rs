//! GitHub REST client
//!
//! Implements the discovery port over the REST API and exposes the ruleset
//! write calls used by `rulegate apply`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use rulegate_core::{
    CheckApp, CheckRunEntry, CommitStatusEntry, PullRequest, PullRequestState, RemoteResult,
    RepositoryApi,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::GithubConfig;
use crate::error::GithubError;
use crate::repository::Repository;
use crate::Result;

pub const API_VERSION: &str = "2022-11-28";

/// Closed pull requests scanned per page when looking for merged ones.
const MERGED_PAGE_SIZE: u32 = 20;
const MERGED_MAX_PAGES: u32 = 5;
const LIST_PAGE_SIZE: u32 = 100;
/// Upper bound on pages read from a commit's check runs or statuses.
const COMMIT_MAX_PAGES: u32 = 10;

// ── Wire shapes ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RepoWire {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct CommitWire {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullWire {
    number: u64,
    state: String,
    head: HeadWire,
    merged_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct HeadWire {
    #[serde(default)]
    sha: String,
    #[serde(rename = "ref")]
    ref_name: Option<String>,
}

impl From<PullWire> for PullRequest {
    fn from(wire: PullWire) -> Self {
        PullRequest {
            number: wire.number,
            head_sha: wire.head.sha,
            head_ref: wire.head.ref_name,
            state: if wire.state == "open" {
                PullRequestState::Open
            } else {
                PullRequestState::Closed
            },
            merged_at: wire.merged_at,
            updated_at: wire.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CheckRunsWire {
    total_count: Option<usize>,
    #[serde(default)]
    check_runs: Vec<CheckRunWire>,
}

#[derive(Debug, Deserialize)]
struct CheckRunWire {
    name: Option<String>,
    app: Option<AppWire>,
}

#[derive(Debug, Deserialize)]
struct AppWire {
    id: i64,
    slug: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CombinedStatusWire {
    total_count: Option<usize>,
    #[serde(default)]
    statuses: Vec<StatusWire>,
}

#[derive(Debug, Deserialize)]
struct StatusWire {
    context: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWire {
    message: String,
}

// ── Client ──────────────────────────────────────────────────────────────

/// REST client bound to one repository.
pub struct GithubClient {
    repo: Repository,
    api_base: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl GithubClient {
    pub fn new(repo: Repository, config: GithubConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let api_base = config
            .api_url
            .unwrap_or_else(|| repo.api_base())
            .trim_end_matches('/')
            .to_string();

        debug!(repo = %repo, api = %api_base, "created GitHub client");
        Ok(GithubClient {
            repo,
            api_base,
            token: config.token,
            http,
        })
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// URL of a repository endpoint from raw path segments.
    ///
    /// Each segment is percent-encoded, so a ref like `fix#12` stays in the
    /// path. Split multi-level refs on `/` before passing them.
    fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Result<Url> {
        let invalid = || GithubError::InvalidApiUrl(self.api_base.clone());
        let mut url = Url::parse(&self.api_base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["repos", self.repo.owner.as_str(), self.repo.name.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        let message = serde_json::from_str::<ErrorWire>(&body)
            .map(|e| e.message)
            .unwrap_or_else(|_| body.chars().take(200).collect());
        debug!(%status, what, "GitHub API request failed");
        Err(match status {
            StatusCode::NOT_FOUND => GithubError::NotFound(format!("{what}: {message}")),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GithubError::Unauthorized {
                status: status.as_u16(),
                message,
            },
            _ => GithubError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T> {
        let builder = self.request(Method::GET, url).query(query);
        self.send(builder, what).await
    }

    /// `commits/{reference}` followed by `tail`.
    fn commit_endpoint(&self, reference: &str, tail: Option<&str>) -> Result<Url> {
        self.endpoint(
            std::iter::once("commits")
                .chain(reference.split('/'))
                .chain(tail),
        )
    }

    pub async fn fetch_default_branch(&self) -> Result<String> {
        let repo: RepoWire = self.get(self.endpoint([])?, &[], "repository").await?;
        Ok(repo.default_branch)
    }

    pub async fn fetch_commit_sha(&self, reference: &str) -> Result<String> {
        let url = self.commit_endpoint(reference, None)?;
        let commit: CommitWire = self.get(url, &[], &format!("ref {reference}")).await?;
        Ok(commit.sha)
    }

    pub async fn fetch_pull_request(&self, number: u64) -> Result<PullRequest> {
        let url = self.endpoint(["pulls", number.to_string().as_str()])?;
        let pr: PullWire = self
            .get(url, &[], &format!("pull request #{number}"))
            .await?;
        Ok(pr.into())
    }

    /// Open pull requests, most recently updated first.
    pub async fn fetch_open_pull_requests(&self) -> Result<Vec<PullRequest>> {
        let query = [
            ("state", "open".to_string()),
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
            ("per_page", LIST_PAGE_SIZE.to_string()),
        ];
        let prs: Vec<PullWire> = self
            .get(self.endpoint(["pulls"])?, &query, "open pull requests")
            .await?;
        Ok(prs.into_iter().map(Into::into).collect())
    }

    /// Merged pull requests among the most recently updated closed ones,
    /// most recently merged first. Scans at most five pages of twenty.
    pub async fn fetch_merged_pull_requests(&self) -> Result<Vec<PullRequest>> {
        let mut merged = Vec::new();
        for page in 1..=MERGED_MAX_PAGES {
            let query = [
                ("state", "closed".to_string()),
                ("sort", "updated".to_string()),
                ("direction", "desc".to_string()),
                ("per_page", MERGED_PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ];
            let prs: Vec<PullWire> = self
                .get(self.endpoint(["pulls"])?, &query, "closed pull requests")
                .await?;
            let len = prs.len();
            merged.extend(
                prs.into_iter()
                    .filter(|pr| pr.merged_at.is_some())
                    .map(PullRequest::from),
            );
            if !merged.is_empty() || len < MERGED_PAGE_SIZE as usize {
                break;
            }
        }
        merged.sort_by(|a, b| b.merged_at.cmp(&a.merged_at));
        Ok(merged)
    }

    /// Every check run on `sha`, following pages until a short one.
    pub async fn fetch_check_runs(&self, sha: &str) -> Result<Vec<CheckRunEntry>> {
        let mut entries = Vec::new();
        for page in 1..=COMMIT_MAX_PAGES {
            let query = [
                ("per_page", LIST_PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ];
            let url = self.commit_endpoint(sha, Some("check-runs"))?;
            let runs: CheckRunsWire = self.get(url, &query, "check runs").await?;
            let len = runs.check_runs.len();
            entries.extend(runs.check_runs.into_iter().map(|run| CheckRunEntry {
                name: run.name.unwrap_or_default(),
                app: run.app.map(|app| CheckApp {
                    id: app.id,
                    slug: app.slug,
                    name: app.name,
                }),
            }));
            if last_page(len, entries.len(), runs.total_count) {
                return Ok(entries);
            }
        }
        warn!(sha, read = entries.len(), "check runs truncated at page limit");
        Ok(entries)
    }

    /// Every commit status on `sha`, following pages until a short one.
    pub async fn fetch_commit_statuses(&self, sha: &str) -> Result<Vec<CommitStatusEntry>> {
        let mut entries = Vec::new();
        for page in 1..=COMMIT_MAX_PAGES {
            let query = [
                ("per_page", LIST_PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ];
            let url = self.commit_endpoint(sha, Some("status"))?;
            let combined: CombinedStatusWire = self.get(url, &query, "commit statuses").await?;
            let len = combined.statuses.len();
            entries.extend(combined.statuses.into_iter().map(|status| CommitStatusEntry {
                context: status.context.unwrap_or_default(),
                state: status.state,
            }));
            if last_page(len, entries.len(), combined.total_count) {
                return Ok(entries);
            }
        }
        warn!(sha, read = entries.len(), "commit statuses truncated at page limit");
        Ok(entries)
    }

    pub async fn create_ruleset(&self, payload: &Value) -> Result<Value> {
        info!(repo = %self.repo, "creating ruleset");
        let builder = self
            .request(Method::POST, self.endpoint(["rulesets"])?)
            .json(payload);
        self.send(builder, "rulesets").await
    }

    pub async fn update_ruleset(&self, id: u64, payload: &Value) -> Result<Value> {
        info!(repo = %self.repo, id, "updating ruleset");
        let builder = self
            .request(Method::PUT, self.endpoint(["rulesets", id.to_string().as_str()])?)
            .json(payload);
        self.send(builder, &format!("ruleset {id}")).await
    }
}

/// A page shorter than requested, or reaching `total_count`, ends a listing.
fn last_page(page_len: usize, read: usize, total_count: Option<usize>) -> bool {
    page_len < LIST_PAGE_SIZE as usize || total_count.is_some_and(|total| read >= total)
}

#[async_trait]
impl RepositoryApi for GithubClient {
    async fn default_branch(&self) -> RemoteResult<String> {
        Ok(self.fetch_default_branch().await?)
    }

    async fn resolve_ref(&self, reference: &str) -> RemoteResult<String> {
        Ok(self.fetch_commit_sha(reference).await?)
    }

    async fn pull_request(&self, number: u64) -> RemoteResult<PullRequest> {
        Ok(self.fetch_pull_request(number).await?)
    }

    async fn list_open_pull_requests(&self) -> RemoteResult<Vec<PullRequest>> {
        Ok(self.fetch_open_pull_requests().await?)
    }

    async fn list_merged_pull_requests(&self) -> RemoteResult<Vec<PullRequest>> {
        Ok(self.fetch_merged_pull_requests().await?)
    }

    async fn list_check_runs(&self, sha: &str) -> RemoteResult<Vec<CheckRunEntry>> {
        Ok(self.fetch_check_runs(sha).await?)
    }

    async fn list_commit_statuses(&self, sha: &str) -> RemoteResult<Vec<CommitStatusEntry>> {
        Ok(self.fetch_commit_statuses(sha).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(api_url: Option<&str>) -> GithubClient {
        let config = match api_url {
            Some(url) => GithubConfig::new(url),
            None => GithubConfig {
                api_url: None,
                ..GithubConfig::new("unused")
            },
        };
        GithubClient::new(Repository::new("octo", "widgets"), config).unwrap()
    }

    #[test]
    fn test_api_base_derived_from_repository() {
        assert_eq!(client(None).api_base(), "https://api.github.com");
        assert_eq!(
            client(Some("http://127.0.0.1:9/")).api_base(),
            "http://127.0.0.1:9"
        );
    }

    #[test]
    fn test_endpoint_urls() {
        let client = client(None);
        assert_eq!(
            client.commit_endpoint("abc", Some("check-runs")).unwrap().as_str(),
            "https://api.github.com/repos/octo/widgets/commits/abc/check-runs"
        );
        assert_eq!(
            client.endpoint([]).unwrap().as_str(),
            "https://api.github.com/repos/octo/widgets"
        );
    }

    #[test]
    fn test_commit_endpoint_encodes_ref_segments() {
        let client = client(Some("https://ghe.example.com/api/v3"));
        assert_eq!(
            client.commit_endpoint("fix#12", None).unwrap().as_str(),
            "https://ghe.example.com/api/v3/repos/octo/widgets/commits/fix%2312"
        );
        assert_eq!(
            client.commit_endpoint("release/1.x?", None).unwrap().as_str(),
            "https://ghe.example.com/api/v3/repos/octo/widgets/commits/release/1.x%3F"
        );
    }

    #[test]
    fn test_last_page() {
        assert!(last_page(3, 3, None));
        assert!(!last_page(100, 100, None));
        assert!(!last_page(100, 100, Some(101)));
        assert!(last_page(100, 200, Some(200)));
    }

    #[test]
    fn test_unusable_api_url() {
        let client = client(Some("not a url"));
        assert!(matches!(
            client.endpoint(["pulls"]),
            Err(GithubError::InvalidApiUrl(_))
        ));
    }

    #[test]
    fn test_pull_wire_conversion() {
        let wire: PullWire = serde_json::from_value(json!({
            "number": 238,
            "state": "closed",
            "head": {"sha": "abc", "ref": "feature/x"},
            "merged_at": "2026-04-01T10:00:00Z",
            "updated_at": "2026-04-01T10:05:00Z",
            "title": "ignored"
        }))
        .unwrap();
        let pr = PullRequest::from(wire);
        assert_eq!(pr.number, 238);
        assert_eq!(pr.head_ref.as_deref(), Some("feature/x"));
        assert!(pr.is_merged());
    }

    #[test]
    fn test_check_run_wire_tolerates_missing_fields() {
        let wire: CheckRunsWire = serde_json::from_value(json!({
            "total_count": 2,
            "check_runs": [
                {"name": "build", "app": {"id": 15368, "slug": "github-actions", "name": "GitHub Actions"}},
                {"name": "external", "app": null}
            ]
        }))
        .unwrap();
        assert_eq!(wire.check_runs.len(), 2);
        assert!(wire.check_runs[1].app.is_none());

        let empty: CombinedStatusWire = serde_json::from_value(json!({"state": "pending"})).unwrap();
        assert!(empty.statuses.is_empty());
    }
}
