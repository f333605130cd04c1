// crates/core/src/desktop_client.rs

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::openai_client::preview;

/// Abstract remote-desktop automation service.
///
/// The service receives a free-text instruction, drives a cloud-hosted desktop
/// to carry it out, and answers with free text. There is no structured success
/// signal: an `Err` means the transport failed, anything else is "done".
pub trait RemoteDesktop: Send + Sync {
    fn prompt(&self, instruction: &str) -> Result<String>;

    /// Ask about the desktop's current state. Wrappers must not answer this
    /// from a cache.
    fn query(&self, question: &str) -> Result<String> {
        self.prompt(question)
    }
}

impl<T: RemoteDesktop + ?Sized> RemoteDesktop for std::sync::Arc<T> {
    fn prompt(&self, instruction: &str) -> Result<String> {
        (**self).prompt(instruction)
    }

    fn query(&self, question: &str) -> Result<String> {
        (**self).query(question)
    }
}

const DEFAULT_BASE_URL: &str = "https://api.orgo.ai/v1";

/// HTTP client for an Orgo cloud computer.
///
/// Expects the following environment variables:
///
/// - ORGO_API_KEY
///     bearer token for the automation service
///
/// - ORGO_BASE_URL (optional)
///     default: "https://api.orgo.ai/v1"
///
/// - ANTHROPIC_API_KEY (optional)
///     forwarded with each prompt for the model that drives the desktop
pub struct OrgoClient {
    client: Client,
    url: String,
    api_key: String,
    model_api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct PromptRequest<'a> {
    instruction: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PromptResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl OrgoClient {
    pub fn new(
        base_url: &str,
        project_id: &str,
        api_key: &str,
        model_api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let url = format!(
            "{}/projects/{}/prompt",
            base_url.trim_end_matches('/'),
            urlencoding::encode(project_id)
        );

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            client,
            url,
            api_key: api_key.to_string(),
            model_api_key,
        })
    }

    /// Construct from environment variables for the given project.
    pub fn from_env(project_id: &str, timeout: Option<Duration>) -> Result<Self> {
        let api_key = std::env::var("ORGO_API_KEY").context("ORGO_API_KEY not set")?;
        let base_url =
            std::env::var("ORGO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model_api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        Self::new(&base_url, project_id, &api_key, model_api_key, timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RemoteDesktop for OrgoClient {
    fn prompt(&self, instruction: &str) -> Result<String> {
        let body = PromptRequest {
            instruction,
            model_api_key: self.model_api_key.as_deref(),
        };

        tracing::debug!(url = %self.url, chars = instruction.len(), "sending desktop instruction");

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .context("failed to send remote desktop request")?;

        let status = resp.status();
        let text_body = resp
            .text()
            .context("failed to read remote desktop response body")?;

        if !status.is_success() {
            anyhow::bail!(
                "remote desktop request failed: HTTP {} - {}",
                status,
                preview(&text_body, 500)
            );
        }

        Ok(extract_result_text(&text_body))
    }
}

/// Pull the free-text result out of a response body.
///
/// JSON bodies carrying `result`, `output` or `message` yield that string;
/// anything else is returned as-is.
pub fn extract_result_text(body: &str) -> String {
    match serde_json::from_str::<PromptResponse>(body) {
        Ok(parsed) => parsed
            .result
            .or(parsed.output)
            .or(parsed.message)
            .unwrap_or_else(|| body.trim().to_string()),
        Err(_) => body.trim().to_string(),
    }
}

/// A project visible to an Orgo API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
}

/// List the projects the API key can see, so the user can pick one during setup.
pub fn list_projects(
    base_url: &str,
    api_key: &str,
    timeout: Option<Duration>,
) -> Result<Vec<ProjectSummary>> {
    let url = format!("{}/projects", base_url.trim_end_matches('/'));

    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().context("failed to build HTTP client")?;

    tracing::debug!(url = %url, "listing remote desktop projects");

    let resp = client
        .get(&url)
        .bearer_auth(api_key)
        .send()
        .context("failed to send project list request")?;

    let status = resp.status();
    let text_body = resp
        .text()
        .context("failed to read project list response body")?;

    if !status.is_success() {
        anyhow::bail!(
            "project list request failed: HTTP {} - {}",
            status,
            preview(&text_body, 500)
        );
    }

    parse_project_list(&text_body)
}

/// Same as [`list_projects`], reading `ORGO_API_KEY` and `ORGO_BASE_URL`.
pub fn list_projects_from_env(timeout: Option<Duration>) -> Result<Vec<ProjectSummary>> {
    let api_key = std::env::var("ORGO_API_KEY").context("ORGO_API_KEY not set")?;
    let base_url =
        std::env::var("ORGO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    list_projects(&base_url, &api_key, timeout)
}

/// Accepts a bare array or an object wrapping it in `data` or `projects`.
/// Entries use `id` or `project_id`, and `name` or `title`; entries without
/// an id are skipped.
pub fn parse_project_list(body: &str) -> Result<Vec<ProjectSummary>> {
    let value: serde_json::Value =
        serde_json::from_str(body).context("project list is not valid JSON")?;

    let entries = match &value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => match map.get("data").or_else(|| map.get("projects")) {
            Some(serde_json::Value::Array(items)) => items,
            _ => anyhow::bail!("project list has no `data` or `projects` array"),
        },
        _ => anyhow::bail!("unexpected project list shape"),
    };

    let text = |entry: &serde_json::Value, keys: &[&str]| {
        keys.iter()
            .filter_map(|k| entry.get(*k))
            .find_map(|v| match v {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    };

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let id = text(entry, &["id", "project_id"])?;
            let name = text(entry, &["name", "title"]).unwrap_or_else(|| "Unnamed".to_string());
            Some(ProjectSummary { id, name })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_is_url_encoded() {
        let client = OrgoClient::new("https://api.example/v1/", "computer a/b", "k", None, None)
            .unwrap();
        assert_eq!(
            client.url(),
            "https://api.example/v1/projects/computer%20a%2Fb/prompt"
        );
    }

    #[test]
    fn result_field_is_preferred() {
        let body = r#"{"result": "Event created", "message": "ignored"}"#;
        assert_eq!(extract_result_text(body), "Event created");
    }

    #[test]
    fn output_used_when_result_missing() {
        assert_eq!(extract_result_text(r#"{"output": "done"}"#), "done");
    }

    #[test]
    fn plain_text_bodies_pass_through() {
        assert_eq!(extract_result_text("  all good \n"), "all good");
    }

    #[test]
    fn json_without_known_fields_returns_body() {
        assert_eq!(extract_result_text(r#"{"status":"ok"}"#), r#"{"status":"ok"}"#);
    }

    #[test]
    fn project_lists_come_in_several_shapes() {
        let wrapped = r#"{"data": [
            {"id": "computer-1", "name": "Calendar box"},
            {"project_id": "computer-2", "title": "Spare"},
            {"name": "no id here"},
            {"id": 42}
        ]}"#;
        let projects = parse_project_list(wrapped).unwrap();
        assert_eq!(
            projects,
            vec![
                ProjectSummary {
                    id: "computer-1".into(),
                    name: "Calendar box".into()
                },
                ProjectSummary {
                    id: "computer-2".into(),
                    name: "Spare".into()
                },
                ProjectSummary {
                    id: "42".into(),
                    name: "Unnamed".into()
                },
            ]
        );

        let bare = parse_project_list(r#"[{"id": "a", "name": "A"}]"#).unwrap();
        assert_eq!(bare.len(), 1);

        assert!(parse_project_list(r#"{"error": "unauthorized"}"#).is_err());
        assert!(parse_project_list("<html>").is_err());
    }
}
