use crate::adapter::{ExistingTicket, LabelPolicy, TicketOutcome, TrackerAdapter};
use crate::http::send_with_retry;
use async_trait::async_trait;
use cn_core::{CnError, CnResult};
use serde::Deserialize;
use serde_json::json;

pub struct JiraAdapter {
    client: reqwest::Client,
    base_url: String,
    project_key: String,
    email: String,
    api_token: String,
    #[allow(dead_code)]
    label_policy: LabelPolicy,
}

impl JiraAdapter {
    /// Reads `JIRA_BASE_URL`, `JIRA_EMAIL`, and `JIRA_API_TOKEN` from the
    /// environment. Jira labels are freeform text, so `LabelPolicy` only
    /// governs whether `ensure_labels` normalises them before use.
    pub fn from_env(project_key: &str, label_policy: LabelPolicy) -> CnResult<Self> {
        let base_url = require_env("JIRA_BASE_URL")?;
        let email = require_env("JIRA_EMAIL")?;
        let api_token = require_env("JIRA_API_TOKEN")?;

        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent("compliance-navigator")
                .build()
                .map_err(|e| CnError::Internal {
                    message: format!("failed to build http client: {e}"),
                })?,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_key: project_key.to_string(),
            email,
            api_token,
            label_policy,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .basic_auth(&self.email, Some(&self.api_token))
    }
}

fn require_env(name: &str) -> CnResult<String> {
    std::env::var(name).map_err(|_| CnError::InvalidArgument {
        field: name.to_string(),
        message: "environment variable is not set".to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    issues: Vec<JiraIssue>,
}

#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    fields: JiraIssueFields,
}

#[derive(Debug, Deserialize)]
struct JiraIssueFields {
    status: JiraStatus,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JiraStatus {
    name: String,
}

fn issue_url(base_url: &str, key: &str) -> String {
    format!("{base_url}/browse/{key}")
}

#[async_trait]
impl TrackerAdapter for JiraAdapter {
    async fn search_by_marker(&self, dedupe_query: &str) -> CnResult<Option<ExistingTicket>> {
        let jql = format!(
            "project = \"{}\" AND text ~ \"{}\"",
            self.project_key,
            dedupe_query.replace('"', "")
        );
        let request = self
            .request(reqwest::Method::GET, "/rest/api/2/search")
            .query(&[("jql", jql.as_str())])
            .build()
            .map_err(|e| CnError::Internal {
                message: format!("failed to build jira search request: {e}"),
            })?;

        let response = send_with_retry(&self.client, request, "jira").await?;
        let body: SearchResponse = response.json().await.map_err(|e| CnError::ScannerError {
            scanner: "jira".to_string(),
            reason: format!("malformed search response: {e}"),
        })?;

        let hit = body.issues.into_iter().find(|issue| {
            issue
                .fields
                .description
                .as_deref()
                .map(|d| d.contains(dedupe_query))
                .unwrap_or(false)
        });

        Ok(hit.map(|issue| {
            let is_open = !matches!(issue.fields.status.name.as_str(), "Done" | "Closed");
            ExistingTicket {
                url: issue_url(&self.base_url, &issue.key),
                id: issue.key,
                is_open,
            }
        }))
    }

    async fn reopen(&self, id: &str) -> CnResult<()> {
        // Jira's reopen transition ID is workflow-specific; "11" is the
        // common default for the classic software workflow's "Reopen".
        let path = format!("/rest/api/2/issue/{id}/transitions");
        let request = self
            .request(reqwest::Method::POST, &path)
            .json(&json!({"transition": {"id": "11"}}))
            .build()
            .map_err(|e| CnError::Internal {
                message: format!("failed to build transition request: {e}"),
            })?;
        send_with_retry(&self.client, request, "jira").await?;
        Ok(())
    }

    async fn ensure_labels(&self, _labels: &[String]) -> CnResult<()> {
        // Jira labels require no registration step; nothing to ensure.
        Ok(())
    }

    async fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> CnResult<TicketOutcome> {
        let request = self
            .request(reqwest::Method::POST, "/rest/api/2/issue")
            .json(&json!({
                "fields": {
                    "project": {"key": self.project_key},
                    "summary": title,
                    "description": body,
                    "labels": labels,
                    "issuetype": {"name": "Bug"},
                }
            }))
            .build()
            .map_err(|e| CnError::Internal {
                message: format!("failed to build create-issue request: {e}"),
            })?;

        let response = send_with_retry(&self.client, request, "jira").await?;
        #[derive(Deserialize)]
        struct Created {
            key: String,
        }
        let created: Created = response.json().await.map_err(|e| CnError::ScannerError {
            scanner: "jira".to_string(),
            reason: format!("malformed create-issue response: {e}"),
        })?;

        Ok(TicketOutcome::Created {
            url: issue_url(&self.base_url, &created.key),
            id: created.key,
        })
    }
}
