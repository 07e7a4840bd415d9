use crate::adapter::{ExistingTicket, LabelPolicy, TicketOutcome, TrackerAdapter};
use crate::http::send_with_retry;
use async_trait::async_trait;
use cn_core::{CnError, CnResult};
use serde::Deserialize;
use serde_json::json;

const API_BASE: &str = "https://api.github.com";

pub struct GitHubAdapter {
    client: reqwest::Client,
    owner: String,
    repo: String,
    token: String,
    label_policy: LabelPolicy,
}

impl GitHubAdapter {
    /// Reads the token from `GITHUB_TOKEN`. Returns `InvalidArgument` if it
    /// is unset — credentials are never accepted as a parameter.
    pub fn from_env(owner: &str, repo: &str, label_policy: LabelPolicy) -> CnResult<Self> {
        let token = std::env::var("GITHUB_TOKEN").map_err(|_| CnError::InvalidArgument {
            field: "GITHUB_TOKEN".to_string(),
            message: "environment variable is not set".to_string(),
        })?;

        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent("compliance-navigator")
                .build()
                .map_err(|e| CnError::Internal {
                    message: format!("failed to build http client: {e}"),
                })?,
            owner: owner.to_string(),
            repo: repo.to_string(),
            token,
            label_policy,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{API_BASE}{path}"))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    number: u64,
    html_url: String,
    state: String,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LabelResponse {
    name: String,
}

#[async_trait]
impl TrackerAdapter for GitHubAdapter {
    async fn search_by_marker(&self, dedupe_query: &str) -> CnResult<Option<ExistingTicket>> {
        let q = format!("repo:{}/{} in:body \"{}\"", self.owner, self.repo, dedupe_query);
        let request = self
            .request(reqwest::Method::GET, "/search/issues")
            .query(&[("q", q.as_str())])
            .build()
            .map_err(|e| CnError::Internal {
                message: format!("failed to build search request: {e}"),
            })?;

        let response = send_with_retry(&self.client, request, "github").await?;
        let body: SearchResponse = response.json().await.map_err(|e| CnError::ScannerError {
            scanner: "github".to_string(),
            reason: format!("malformed search response: {e}"),
        })?;

        let hit = body
            .items
            .into_iter()
            .find(|item| item.body.as_deref().map(|b| b.contains(dedupe_query)).unwrap_or(false));

        Ok(hit.map(|item| ExistingTicket {
            id: item.number.to_string(),
            url: item.html_url,
            is_open: item.state == "open",
        }))
    }

    async fn reopen(&self, id: &str) -> CnResult<()> {
        let path = format!("/repos/{}/{}/issues/{}", self.owner, self.repo, id);
        let request = self
            .request(reqwest::Method::PATCH, &path)
            .json(&json!({"state": "open"}))
            .build()
            .map_err(|e| CnError::Internal {
                message: format!("failed to build reopen request: {e}"),
            })?;
        send_with_retry(&self.client, request, "github").await?;
        Ok(())
    }

    async fn ensure_labels(&self, labels: &[String]) -> CnResult<()> {
        match self.label_policy {
            LabelPolicy::RequireExisting => {
                let path = format!("/repos/{}/{}/labels", self.owner, self.repo);
                let request = self
                    .request(reqwest::Method::GET, &path)
                    .build()
                    .map_err(|e| CnError::Internal {
                        message: format!("failed to build label list request: {e}"),
                    })?;
                let response = send_with_retry(&self.client, request, "github").await?;
                let existing: Vec<LabelResponse> = response.json().await.map_err(|e| CnError::ScannerError {
                    scanner: "github".to_string(),
                    reason: format!("malformed label list response: {e}"),
                })?;
                let existing_names: std::collections::HashSet<&str> =
                    existing.iter().map(|l| l.name.as_str()).collect();

                for label in labels {
                    if !existing_names.contains(label.as_str()) {
                        tracing::warn!(
                            label = %label,
                            owner = %self.owner,
                            repo = %self.repo,
                            "label policy is require-existing and this label does not exist on the tracker; the ticket will still be filed with it"
                        );
                    }
                }
                Ok(())
            }
            LabelPolicy::CreateIfMissing => {
                for label in labels {
                    let path = format!("/repos/{}/{}/labels/{}", self.owner, self.repo, label);
                    let check = self
                        .request(reqwest::Method::GET, &path)
                        .build()
                        .map_err(|e| CnError::Internal {
                            message: format!("failed to build label check request: {e}"),
                        })?;
                    let response = send_with_retry(&self.client, check, "github").await?;
                    if response.status() == reqwest::StatusCode::NOT_FOUND {
                        let create = self
                            .request(reqwest::Method::POST, &format!("/repos/{}/{}/labels", self.owner, self.repo))
                            .json(&json!({"name": label, "color": "ededed"}))
                            .build()
                            .map_err(|e| CnError::Internal {
                                message: format!("failed to build label create request: {e}"),
                            })?;
                        send_with_retry(&self.client, create, "github").await?;
                    }
                    // Paced: one label operation at a time, no concurrent creation.
                }
                Ok(())
            }
        }
    }

    async fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> CnResult<TicketOutcome> {
        let path = format!("/repos/{}/{}/issues", self.owner, self.repo);
        let request = self
            .request(reqwest::Method::POST, &path)
            .json(&json!({"title": title, "body": body, "labels": labels}))
            .build()
            .map_err(|e| CnError::Internal {
                message: format!("failed to build create-issue request: {e}"),
            })?;

        let response = send_with_retry(&self.client, request, "github").await?;
        let created: SearchItem = response.json().await.map_err(|e| CnError::ScannerError {
            scanner: "github".to_string(),
            reason: format!("malformed create-issue response: {e}"),
        })?;

        Ok(TicketOutcome::Created {
            id: created.number.to_string(),
            url: created.html_url,
        })
    }
}
