//! GitHub HTTP client.
//!
//! Wraps the GitHub REST API v3 and implements the [`IssueHost`] port.
//! Transient failures of idempotent requests are retried through the shared
//! [`RetryPolicy`]; creating requests are only resent when the host provably
//! rejected them. The request budget reported by the `x-ratelimit-*`
//! response headers is kept so the throttler can pace callers without an
//! extra round trip.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    GitHubConfig, HostComment, IssueRecord, IssueState, Label, QuotaSnapshot,
};
use crate::domain::ports::IssueHost;
use crate::infrastructure::retry::RetryPolicy;

use super::models::{
    GitHubComment, GitHubCommentRequest, GitHubCreateIssueRequest, GitHubIssue,
    GitHubIssueUpdateRequest, GitHubLabel, GitHubRateLimitResponse,
};

/// Largest page size accepted by the GitHub list endpoints.
const MAX_PAGE_SIZE: usize = 100;

/// Settings for a [`GitHubClient`].
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    pub token: String,
    pub api_url: String,
    pub timeout: Duration,
    pub page_size: usize,
    pub retry: RetryPolicy,
}

impl GitHubClientConfig {
    pub fn new(token: impl Into<String>, github: &GitHubConfig, retry: RetryPolicy) -> Self {
        Self {
            token: token.into(),
            api_url: github.api_url.clone(),
            timeout: Duration::from_secs(github.timeout_secs),
            page_size: MAX_PAGE_SIZE,
            retry,
        }
    }
}

/// HTTP client for the GitHub REST API v3.
#[derive(Debug)]
pub struct GitHubClient {
    http: Client,
    /// GitHub personal access token or fine-grained token.
    token: String,
    api_url: Url,
    page_size: usize,
    retry: RetryPolicy,
    /// Budget reported by the most recent response.
    quota: Mutex<Option<QuotaSnapshot>>,
}

impl GitHubClient {
    pub fn new(config: GitHubClientConfig) -> DomainResult<Self> {
        let api_url = Url::parse(&config.api_url).map_err(|e| {
            DomainError::ValidationFailed(format!("Invalid GitHub API URL '{}': {e}", config.api_url))
        })?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::host_transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            token: config.token,
            api_url,
            page_size: config.page_size.clamp(1, MAX_PAGE_SIZE),
            retry: config.retry,
            quota: Mutex::new(None),
        })
    }

    /// Build an authorized request.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", "bts-github-sync")
    }

    fn endpoint(&self, segments: &[&str]) -> DomainResult<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                DomainError::ValidationFailed(format!(
                    "GitHub API URL cannot be a base: {}",
                    self.api_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send an idempotent request, retrying transient failures.
    ///
    /// `build` is invoked once per attempt.
    async fn send<F>(&self, operation: &str, build: F) -> DomainResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        self.send_with(operation, DomainError::is_transient, build)
            .await
    }

    /// Send a request creating a resource.
    ///
    /// A timeout or server error may arrive after the host applied the
    /// write, so only failures that prove it did not are retried.
    async fn send_create<F>(&self, operation: &str, build: F) -> DomainResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        self.send_with(operation, DomainError::is_resend_safe, build)
            .await
    }

    async fn send_with<F>(
        &self,
        operation: &str,
        retryable: fn(&DomainError) -> bool,
        build: F,
    ) -> DomainResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        self.retry
            .execute_when(
                || {
                    let request = build();
                    async move {
                        let resp = request.send().await.map_err(|e| {
                            let message = format!("GitHub {operation} request failed: {e}");
                            if e.is_connect() {
                                DomainError::HostUnreachable(message)
                            } else {
                                DomainError::host_transport(message)
                            }
                        })?;
                        self.observe_quota(resp.headers());

                        let status = resp.status();
                        if status.is_success() {
                            return Ok(resp);
                        }

                        let rate_limited = is_rate_limited(status, resp.headers());
                        let body = resp.text().await.unwrap_or_default();
                        Err(DomainError::HostFailed {
                            status: Some(status.as_u16()),
                            message: format!("GitHub {operation} returned {status}: {body}"),
                            rate_limited,
                        })
                    }
                },
                retryable,
            )
            .await
    }

    async fn decode<T: DeserializeOwned>(operation: &str, resp: Response) -> DomainResult<T> {
        resp.json::<T>().await.map_err(|e| {
            DomainError::SerializationError(format!("GitHub {operation} parse failed: {e}"))
        })
    }

    /// Fetch every page of a list endpoint.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        operation: &str,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> DomainResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1_u32;

        loop {
            let mut url = self.endpoint(segments)?;
            url.query_pairs_mut()
                .extend_pairs(query)
                .append_pair("per_page", &self.page_size.to_string())
                .append_pair("page", &page.to_string());

            let resp = self
                .send(operation, || self.request(Method::GET, url.clone()))
                .await?;
            let batch: Vec<T> = Self::decode(operation, resp).await?;
            let fetched = batch.len();
            items.extend(batch);

            if fetched < self.page_size {
                return Ok(items);
            }
            page += 1;
        }
    }

    fn observe_quota(&self, headers: &HeaderMap) {
        let remaining = header_u32(headers, "x-ratelimit-remaining");
        let limit = header_u32(headers, "x-ratelimit-limit");
        if let (Some(remaining), Some(total)) = (remaining, limit) {
            if let Ok(mut quota) = self.quota.lock() {
                *quota = Some(QuotaSnapshot::new(remaining, total));
            }
        }
    }

    fn cached_quota(&self) -> Option<QuotaSnapshot> {
        self.quota.lock().ok().and_then(|q| *q)
    }
}

fn split_repository(repository: &str) -> DomainResult<(&str, &str)> {
    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => Err(DomainError::ValidationFailed(format!(
            "Repository must be of the form owner/name, got '{repository}'"
        ))),
    }
}

fn header_u32(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// GitHub signals both primary and secondary rate limits with 403 or 429.
fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    status == StatusCode::FORBIDDEN
        && (header_u32(headers, "x-ratelimit-remaining") == Some(0)
            || headers.contains_key("retry-after"))
}

#[async_trait]
impl IssueHost for GitHubClient {
    async fn list_issues(&self, repository: &str) -> DomainResult<Vec<IssueRecord>> {
        let (owner, name) = split_repository(repository)?;
        let issues: Vec<GitHubIssue> = self
            .get_paginated(
                "list_issues",
                &["repos", owner, name, "issues"],
                &[("state", "all")],
            )
            .await?;

        Ok(issues
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(IssueRecord::from)
            .collect())
    }

    async fn get_label(&self, repository: &str, name: &str) -> DomainResult<Label> {
        let (owner, repo) = split_repository(repository)?;
        let url = self.endpoint(&["repos", owner, repo, "labels", name])?;

        match self
            .send("get_label", || self.request(Method::GET, url.clone()))
            .await
        {
            Ok(resp) => {
                let label: GitHubLabel = Self::decode("get_label", resp).await?;
                Ok(Label { name: label.name })
            }
            Err(DomainError::HostFailed {
                status: Some(404), ..
            }) => Err(DomainError::LabelNotFound {
                repository: repository.to_string(),
                label: name.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    async fn create_issue(
        &self,
        repository: &str,
        title: &str,
        labels: &[String],
    ) -> DomainResult<IssueRecord> {
        let (owner, name) = split_repository(repository)?;
        let url = self.endpoint(&["repos", owner, name, "issues"])?;
        let body = GitHubCreateIssueRequest {
            title: title.to_string(),
            labels: labels.to_vec(),
        };

        let resp = self
            .send_create("create_issue", || {
                self.request(Method::POST, url.clone()).json(&body)
            })
            .await?;
        let issue: GitHubIssue = Self::decode("create_issue", resp).await?;
        Ok(issue.into())
    }

    async fn list_comments(
        &self,
        repository: &str,
        issue_number: u64,
    ) -> DomainResult<Vec<HostComment>> {
        let (owner, name) = split_repository(repository)?;
        let number = issue_number.to_string();
        let comments: Vec<GitHubComment> = self
            .get_paginated(
                "list_comments",
                &["repos", owner, name, "issues", &number, "comments"],
                &[],
            )
            .await?;
        Ok(comments.into_iter().map(HostComment::from).collect())
    }

    async fn create_comment(
        &self,
        repository: &str,
        issue_number: u64,
        body: &str,
    ) -> DomainResult<()> {
        let (owner, name) = split_repository(repository)?;
        let number = issue_number.to_string();
        let url = self.endpoint(&["repos", owner, name, "issues", &number, "comments"])?;
        let body = GitHubCommentRequest {
            body: body.to_string(),
        };

        self.send_create("create_comment", || {
            self.request(Method::POST, url.clone()).json(&body)
        })
        .await?;
        Ok(())
    }

    async fn edit_issue_state(
        &self,
        repository: &str,
        issue_number: u64,
        state: IssueState,
    ) -> DomainResult<()> {
        let (owner, name) = split_repository(repository)?;
        let number = issue_number.to_string();
        let url = self.endpoint(&["repos", owner, name, "issues", &number])?;
        let body = GitHubIssueUpdateRequest {
            state: state.as_str().to_string(),
        };

        self.send("edit_issue_state", || {
            self.request(Method::PATCH, url.clone()).json(&body)
        })
        .await?;
        Ok(())
    }

    async fn remaining_quota(&self) -> DomainResult<QuotaSnapshot> {
        if let Some(quota) = self.cached_quota() {
            return Ok(quota);
        }

        let url = self.endpoint(&["rate_limit"])?;
        let quota = match self
            .send("rate_limit", || self.request(Method::GET, url.clone()))
            .await
        {
            Ok(resp) => {
                let limits: GitHubRateLimitResponse = Self::decode("rate_limit", resp).await?;
                let core = limits.resources.core;
                QuotaSnapshot::new(core.remaining, core.limit)
            }
            // GitHub Enterprise with rate limiting disabled.
            Err(DomainError::HostFailed {
                status: Some(404), ..
            }) => {
                tracing::debug!("Host does not report a rate limit, assuming none");
                QuotaSnapshot::unlimited()
            }
            Err(e) => return Err(e),
        };

        if let Ok(mut cached) = self.quota.lock() {
            *cached = Some(quota);
        }
        Ok(quota)
    }
}
