//! Debbugs SOAP client.
//!
//! Talks to the Debian bug tracker's SOAP endpoint and implements the
//! [`BugTracker`] port. Every failure is reported as a tracker error so the
//! reconciler can skip the affected bug.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::DebbugsConfig;
use crate::domain::ports::{BugTracker, RawBugStatus, RawLogEntry};

use super::soap::{build_envelope, parse_document, response_value, SoapArg, XmlNode};

/// HTTP client for the Debbugs SOAP interface.
#[derive(Debug, Clone)]
pub struct DebbugsClient {
    http: Client,
    soap_url: String,
}

impl DebbugsClient {
    pub fn new(config: &DebbugsConfig) -> DomainResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::TrackerFailed(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            soap_url: config.soap_url.clone(),
        })
    }

    /// Invoke `method` and return the parsed response document.
    async fn call(&self, method: &str, args: &[(&str, SoapArg<'_>)]) -> DomainResult<XmlNode> {
        let envelope = build_envelope(method, args);
        tracing::trace!(method, "Calling Debbugs SOAP method");

        let resp = self
            .http
            .post(&self.soap_url)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", "\"Debbugs/SOAP\"")
            .header("User-Agent", "bts-github-sync")
            .body(envelope)
            .send()
            .await
            .map_err(|e| DomainError::TrackerFailed(format!("Debbugs {method} request failed: {e}")))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            DomainError::TrackerFailed(format!("Debbugs {method} response unreadable: {e}"))
        })?;

        match parse_document(&body) {
            Ok(document) => {
                // Faults arrive with a 500 status; surface their message.
                response_value(&document, method)?;
                if !status.is_success() {
                    return Err(DomainError::TrackerFailed(format!(
                        "Debbugs {method} returned {status}"
                    )));
                }
                Ok(document)
            }
            Err(_) if !status.is_success() => Err(DomainError::TrackerFailed(format!(
                "Debbugs {method} returned {status}"
            ))),
            Err(e) => Err(e),
        }
    }
}

fn field(node: &XmlNode, name: &str) -> DomainResult<String> {
    match node.child(name) {
        Some(child) if !child.is_nil() => child.value(),
        _ => Ok(String::new()),
    }
}

fn parse_bug_number(raw: &str) -> DomainResult<u64> {
    raw.trim()
        .parse()
        .map_err(|_| DomainError::ParseFailed(format!("Invalid bug number '{}'", raw.trim())))
}

fn status_from_value(bug_id: u64, value: &XmlNode) -> DomainResult<RawBugStatus> {
    let bug_num = match field(value, "bug_num")?.trim() {
        "" => bug_id,
        raw => parse_bug_number(raw)?,
    };
    let archived = matches!(field(value, "archived")?.trim(), "1" | "true");

    Ok(RawBugStatus {
        bug_num,
        subject: field(value, "subject")?,
        done: field(value, "done")?,
        pending: field(value, "pending")?,
        archived,
    })
}

#[async_trait]
impl BugTracker for DebbugsClient {
    async fn list_open_bug_ids(&self, package: &str) -> DomainResult<Vec<u64>> {
        let document = self
            .call(
                "get_bugs",
                &[(
                    "query",
                    SoapArg::StrArray(&["package", package, "archive", "0"]),
                )],
            )
            .await?;

        let Some(array) = response_value(&document, "get_bugs")? else {
            return Ok(Vec::new());
        };
        array
            .children
            .iter()
            .map(|item| parse_bug_number(&item.value()?))
            .collect()
    }

    async fn get_status(&self, bug_id: u64) -> DomainResult<Option<RawBugStatus>> {
        let document = self
            .call("get_status", &[("bugs", SoapArg::IntArray(&[bug_id]))])
            .await?;

        let Some(map) = response_value(&document, "get_status")? else {
            return Ok(None);
        };

        // The status map is keyed by bug number.
        let wanted = bug_id.to_string();
        let entry = map
            .children
            .iter()
            .find(|item| {
                item.child("key")
                    .is_some_and(|k| k.text.trim() == wanted)
            })
            .or_else(|| map.children.first());

        let Some(value) = entry.and_then(|item| item.child("value")) else {
            return Ok(None);
        };
        status_from_value(bug_id, value).map(Some)
    }

    async fn get_bug_log(&self, bug_id: u64) -> DomainResult<Vec<RawLogEntry>> {
        let document = self
            .call("get_bug_log", &[("bugnumber", SoapArg::Int(bug_id))])
            .await?;

        let Some(array) = response_value(&document, "get_bug_log")? else {
            return Ok(Vec::new());
        };
        array
            .children
            .iter()
            .map(|item| {
                Ok(RawLogEntry {
                    header: field(item, "header")?,
                    body: field(item, "body")?,
                })
            })
            .collect()
    }
}
