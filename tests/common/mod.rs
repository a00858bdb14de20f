//! Common test utilities for integration tests
//!
//! In-memory implementations of the tracker and host ports, plus a sleeper
//! that records instead of waiting.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use bts_sync::domain::models::{
    HostComment, IssueRecord, IssueState, Label, QuotaSnapshot, ThrottleConfig,
};
use bts_sync::domain::ports::{BugTracker, IssueHost, NoopCache, RawBugStatus, RawLogEntry};
use bts_sync::services::{BugSource, Reconciler, Sleeper, SyncOptions, Throttler};
use bts_sync::{DomainError, DomainResult};

/// Every call the fake host received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    ListIssues(String),
    GetLabel(String, String),
    CreateIssue {
        repository: String,
        title: String,
        labels: Vec<String>,
    },
    ListComments(String, u64),
    CreateComment(String, u64, String),
    EditState(String, u64, IssueState),
}

impl HostCall {
    pub const fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateIssue { .. } | Self::CreateComment(..) | Self::EditState(..)
        )
    }
}

#[derive(Default)]
struct HostState {
    labels: HashSet<(String, String)>,
    issues: HashMap<String, Vec<IssueRecord>>,
    comments: HashMap<(String, u64), Vec<HostComment>>,
    failing_repositories: HashSet<String>,
    calls: Vec<HostCall>,
    next_comment_id: u64,
    quota: Option<QuotaSnapshot>,
}

/// In-memory GitHub.
#[derive(Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_label(&self, repository: &str, label: &str) {
        self.state
            .lock()
            .unwrap()
            .labels
            .insert((repository.to_string(), label.to_string()));
    }

    pub fn add_issue(&self, repository: &str, number: u64, title: &str, labels: &[&str], state: IssueState) {
        self.state
            .lock()
            .unwrap()
            .issues
            .entry(repository.to_string())
            .or_default()
            .push(IssueRecord {
                number,
                title: title.to_string(),
                labels: labels.iter().map(|l| (*l).to_string()).collect(),
                state,
            });
    }

    pub fn add_comment(&self, repository: &str, issue: u64, body: &str) {
        let mut state = self.state.lock().unwrap();
        state.next_comment_id += 1;
        let id = state.next_comment_id;
        state
            .comments
            .entry((repository.to_string(), issue))
            .or_default()
            .push(HostComment {
                id,
                body: body.to_string(),
            });
    }

    /// Make every call against `repository` fail with a server error.
    pub fn fail_repository(&self, repository: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_repositories
            .insert(repository.to_string());
    }

    pub fn set_quota(&self, remaining: u32, total: u32) {
        self.state.lock().unwrap().quota = Some(QuotaSnapshot::new(remaining, total));
    }

    pub fn issues(&self, repository: &str) -> Vec<IssueRecord> {
        self.state
            .lock()
            .unwrap()
            .issues
            .get(repository)
            .cloned()
            .unwrap_or_default()
    }

    pub fn comments(&self, repository: &str, issue: u64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .comments
            .get(&(repository.to_string(), issue))
            .map(|c| c.iter().map(|c| c.body.clone()).collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<HostCall> {
        self.calls().into_iter().filter(HostCall::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn record(&self, repository: &str, call: HostCall) -> DomainResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failing_repositories.contains(repository) {
            return Err(DomainError::HostFailed {
                status: Some(500),
                message: "Internal Server Error".to_string(),
                rate_limited: false,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IssueHost for FakeHost {
    async fn list_issues(&self, repository: &str) -> DomainResult<Vec<IssueRecord>> {
        self.record(repository, HostCall::ListIssues(repository.to_string()))?;
        Ok(self.issues(repository))
    }

    async fn get_label(&self, repository: &str, name: &str) -> DomainResult<Label> {
        self.record(
            repository,
            HostCall::GetLabel(repository.to_string(), name.to_string()),
        )?;
        let state = self.state.lock().unwrap();
        if state
            .labels
            .contains(&(repository.to_string(), name.to_string()))
        {
            Ok(Label {
                name: name.to_string(),
            })
        } else {
            Err(DomainError::LabelNotFound {
                repository: repository.to_string(),
                label: name.to_string(),
            })
        }
    }

    async fn create_issue(
        &self,
        repository: &str,
        title: &str,
        labels: &[String],
    ) -> DomainResult<IssueRecord> {
        self.record(
            repository,
            HostCall::CreateIssue {
                repository: repository.to_string(),
                title: title.to_string(),
                labels: labels.to_vec(),
            },
        )?;

        let mut state = self.state.lock().unwrap();
        let issues = state.issues.entry(repository.to_string()).or_default();
        let number = issues.iter().map(|i| i.number).max().unwrap_or(0) + 1;
        let issue = IssueRecord {
            number,
            title: title.to_string(),
            labels: labels.to_vec(),
            state: IssueState::Open,
        };
        issues.push(issue.clone());
        Ok(issue)
    }

    async fn list_comments(
        &self,
        repository: &str,
        issue_number: u64,
    ) -> DomainResult<Vec<HostComment>> {
        self.record(
            repository,
            HostCall::ListComments(repository.to_string(), issue_number),
        )?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .comments
            .get(&(repository.to_string(), issue_number))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_comment(
        &self,
        repository: &str,
        issue_number: u64,
        body: &str,
    ) -> DomainResult<()> {
        self.record(
            repository,
            HostCall::CreateComment(repository.to_string(), issue_number, body.to_string()),
        )?;
        self.add_comment(repository, issue_number, body);
        Ok(())
    }

    async fn edit_issue_state(
        &self,
        repository: &str,
        issue_number: u64,
        state: IssueState,
    ) -> DomainResult<()> {
        self.record(
            repository,
            HostCall::EditState(repository.to_string(), issue_number, state),
        )?;
        let mut host = self.state.lock().unwrap();
        if let Some(issue) = host
            .issues
            .get_mut(repository)
            .and_then(|issues| issues.iter_mut().find(|i| i.number == issue_number))
        {
            issue.state = state;
        }
        Ok(())
    }

    async fn remaining_quota(&self) -> DomainResult<QuotaSnapshot> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .quota
            .unwrap_or(QuotaSnapshot::new(5000, 5000)))
    }
}

#[derive(Default)]
struct TrackerState {
    packages: HashMap<String, Vec<u64>>,
    statuses: HashMap<u64, RawBugStatus>,
    logs: HashMap<u64, Vec<RawLogEntry>>,
    failing_logs: HashSet<u64>,
}

/// In-memory Debian BTS.
#[derive(Default)]
pub struct FakeTracker {
    state: Mutex<TrackerState>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// File an open bug against `package`.
    pub fn add_bug(&self, package: &str, bug_id: u64, subject: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .packages
            .entry(package.to_string())
            .or_default()
            .push(bug_id);
        state.statuses.insert(
            bug_id,
            RawBugStatus {
                bug_num: bug_id,
                subject: subject.to_string(),
                done: String::new(),
                pending: "pending".to_string(),
                archived: false,
            },
        );
    }

    /// List a bug number the tracker has no status for.
    pub fn add_unknown_bug(&self, package: &str, bug_id: u64) {
        self.state
            .lock()
            .unwrap()
            .packages
            .entry(package.to_string())
            .or_default()
            .push(bug_id);
    }

    pub fn resolve(&self, bug_id: u64, done_by: &str) {
        if let Some(status) = self.state.lock().unwrap().statuses.get_mut(&bug_id) {
            status.done = done_by.to_string();
            status.pending = "done".to_string();
        }
    }

    pub fn reopen(&self, bug_id: u64) {
        if let Some(status) = self.state.lock().unwrap().statuses.get_mut(&bug_id) {
            status.done.clear();
            status.pending = "pending".to_string();
        }
    }

    /// Append a mail to the bug log.
    pub fn add_message(&self, bug_id: u64, msg_id: &str, author: &str, body: &str) {
        self.add_raw_entry(
            bug_id,
            &format!("From: {author}\nMessage-ID: {msg_id}\nSubject: Re: bug #{bug_id}"),
            body,
        );
    }

    /// Make fetching the log of `bug_id` fail.
    pub fn fail_bug_log(&self, bug_id: u64) {
        self.state.lock().unwrap().failing_logs.insert(bug_id);
    }

    pub fn add_raw_entry(&self, bug_id: u64, header: &str, body: &str) {
        self.state
            .lock()
            .unwrap()
            .logs
            .entry(bug_id)
            .or_default()
            .push(RawLogEntry {
                header: header.to_string(),
                body: body.to_string(),
            });
    }
}

#[async_trait]
impl BugTracker for FakeTracker {
    async fn list_open_bug_ids(&self, package: &str) -> DomainResult<Vec<u64>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .packages
            .get(package)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_status(&self, bug_id: u64) -> DomainResult<Option<RawBugStatus>> {
        Ok(self.state.lock().unwrap().statuses.get(&bug_id).cloned())
    }

    async fn get_bug_log(&self, bug_id: u64) -> DomainResult<Vec<RawLogEntry>> {
        let state = self.state.lock().unwrap();
        if state.failing_logs.contains(&bug_id) {
            return Err(DomainError::TrackerFailed(format!(
                "get_bug_log({bug_id}) timed out"
            )));
        }
        Ok(state
            .logs
            .get(&bug_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct LogBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    /// Route this thread's events at INFO and above into the buffer until
    /// the guard is dropped.
    pub fn capture(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Reconciler over the fakes, with an uncached bug source and no real sleeps.
pub fn reconciler(
    tracker: &Arc<FakeTracker>,
    host: &Arc<FakeHost>,
    options: SyncOptions,
) -> Reconciler {
    reconciler_with_sleeper(tracker, host, options, Arc::new(RecordingSleeper::default()))
}

pub fn reconciler_with_sleeper(
    tracker: &Arc<FakeTracker>,
    host: &Arc<FakeHost>,
    options: SyncOptions,
    sleeper: Arc<RecordingSleeper>,
) -> Reconciler {
    let bugs = BugSource::new(
        Arc::clone(tracker) as Arc<dyn BugTracker>,
        Arc::new(NoopCache),
        Duration::from_secs(60),
    );
    Reconciler::new(
        bugs,
        Arc::clone(host) as Arc<dyn IssueHost>,
        Throttler::with_sleeper(ThrottleConfig::default(), sleeper),
        options,
    )
}

pub fn dry_run() -> SyncOptions {
    SyncOptions {
        dry_run: true,
        ..SyncOptions::default()
    }
}
