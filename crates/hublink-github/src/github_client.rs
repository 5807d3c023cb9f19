//! Authenticated GitHub REST client.
//!
//! One instance per invocation, bound to the invoking user's stored token.
//! A non-2xx response is a hard failure surfacing the status and a truncated
//! body; failed calls are reported once and abandoned, never retried.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::github_types::{GithubHook, GithubIssue, GithubRepo};

pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Fixed page size for repository and issue listings.
pub const GITHUB_PAGE_SIZE: u32 = 5;

#[derive(Clone)]
pub struct GithubApiClient {
    http: reqwest::Client,
    api_base: String,
}

impl GithubApiClient {
    pub fn new(api_base: &str, token: &str, request_timeout_ms: u64) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("Hublink-github-bridge"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        let mut auth_value = reqwest::header::HeaderValue::from_str(&auth_header)
            .context("invalid github authorization header")?;
        auth_value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create github api client")?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// GET `/users/{username}/repos`, one fixed-size page.
    pub async fn list_user_repos(&self, username: &str, page: u32) -> Result<Vec<GithubRepo>> {
        self.request_json("list user repos", || {
            self.http
                .get(format!("{}/users/{}/repos", self.api_base, username))
                .query(&[
                    ("page", page.max(1).to_string().as_str()),
                    ("per_page", GITHUB_PAGE_SIZE.to_string().as_str()),
                ])
        })
        .await
    }

    /// GET `/repos/{owner}/{repo}/issues`, one fixed-size page.
    pub async fn list_repo_issues(
        &self,
        owner: &str,
        repo: &str,
        page: u32,
    ) -> Result<Vec<GithubIssue>> {
        self.request_json("list repo issues", || {
            self.http
                .get(format!("{}/repos/{}/{}/issues", self.api_base, owner, repo))
                .query(&[
                    ("page", page.max(1).to_string().as_str()),
                    ("per_page", GITHUB_PAGE_SIZE.to_string().as_str()),
                ])
        })
        .await
    }

    /// GET `/repos/{owner}/{repo}/issues/{number}`.
    pub async fn fetch_issue(&self, owner: &str, repo: &str, number: u64) -> Result<GithubIssue> {
        self.request_json("fetch issue", || {
            self.http.get(format!(
                "{}/repos/{}/{}/issues/{}",
                self.api_base, owner, repo, number
            ))
        })
        .await
    }

    /// POST `/repos/{owner}/{repo}/issues`.
    pub async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
    ) -> Result<GithubIssue> {
        let payload = json!({ "title": title, "body": body });
        self.request_json("create issue", || {
            self.http
                .post(format!("{}/repos/{}/{}/issues", self.api_base, owner, repo))
                .json(&payload)
        })
        .await
    }

    /// POST `/repos/{owner}/{repo}/hooks`, registering the bridge's webhook
    /// callback for the given event kinds.
    pub async fn create_webhook(
        &self,
        owner: &str,
        repo: &str,
        callback_url: &str,
        events: &[String],
        secret: Option<&str>,
    ) -> Result<GithubHook> {
        let mut config = json!({
            "url": callback_url,
            "content_type": "json",
        });
        if let Some(secret) = secret {
            config["secret"] = json!(secret);
        }
        let payload = json!({
            "active": true,
            "events": events,
            "config": config,
        });
        self.request_json("create webhook", || {
            self.http
                .post(format!("{}/repos/{}/{}/hooks", self.api_base, owner, repo))
                .json(&payload)
        })
        .await
    }

    async fn request_json<T, F>(&self, operation: &str, request_builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> reqwest::RequestBuilder,
    {
        let response = request_builder()
            .send()
            .await
            .with_context(|| format!("github api {operation} request failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "github api {operation} failed with status {}: {}",
                status.as_u16(),
                truncate_for_error(&body, 800)
            );
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("failed to decode github {operation}"))
    }
}

fn truncate_for_error(raw: &str, max_chars: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut truncated = trimmed.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::{GithubApiClient, GITHUB_PAGE_SIZE};

    fn test_client(base_url: &str) -> GithubApiClient {
        GithubApiClient::new(base_url, "ghp_test", 3_000).expect("client")
    }

    #[tokio::test]
    async fn functional_list_user_repos_passes_page_and_fixed_page_size() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/users/alice/repos")
                .query_param("page", "2")
                .query_param("per_page", GITHUB_PAGE_SIZE.to_string())
                .header("authorization", "Bearer ghp_test");
            then.status(200).json_body(json!([
                {"full_name": "alice/first", "html_url": "https://github.com/alice/first"},
                {"full_name": "alice/second", "html_url": "https://github.com/alice/second"}
            ]));
        });

        let repos = test_client(&server.base_url())
            .list_user_repos("alice", 2)
            .await
            .expect("list repos");
        mock.assert();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].full_name, "alice/first");
    }

    #[tokio::test]
    async fn functional_fetch_issue_decodes_issue_fields() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/o/r/issues/7");
            then.status(200).json_body(json!({
                "number": 7,
                "title": "Broken build",
                "user": {"login": "bob", "html_url": "https://github.com/bob"},
                "state": "open",
                "created_at": "2024-05-01T10:00:00Z",
                "repository_url": "https://api.github.com/repos/o/r",
                "url": "https://api.github.com/repos/o/r/issues/7",
                "body": "see https://example.com/shot.png",
                "html_url": "https://github.com/o/r/issues/7"
            }));
        });

        let issue = test_client(&server.base_url())
            .fetch_issue("o", "r", 7)
            .await
            .expect("fetch issue");
        assert_eq!(issue.number, 7);
        assert_eq!(issue.user.login, "bob");
        assert_eq!(issue.state, "open");
    }

    #[tokio::test]
    async fn functional_create_webhook_sends_hook_registration_payload() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/o/r/hooks")
                .body_includes("\"active\":true")
                .body_includes("\"content_type\":\"json\"")
                .body_includes("https://bridge.example/webhook");
            then.status(201)
                .json_body(json!({"id": 99, "active": true, "events": ["issues", "issue_comment"]}));
        });

        let hook = test_client(&server.base_url())
            .create_webhook(
                "o",
                "r",
                "https://bridge.example/webhook",
                &["issues".to_string(), "issue_comment".to_string()],
                None,
            )
            .await
            .expect("create webhook");
        mock.assert();
        assert_eq!(hook.id, 99);
    }

    #[tokio::test]
    async fn regression_non_2xx_is_a_hard_failure_with_status_and_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/repos/o/r/hooks");
            then.status(404).body("{\"message\":\"Not Found\"}");
        });

        let error = test_client(&server.base_url())
            .create_webhook("o", "r", "https://bridge.example/webhook", &[], None)
            .await
            .expect_err("should fail");
        let rendered = error.to_string();
        assert!(rendered.contains("status 404"));
        assert!(rendered.contains("Not Found"));
    }
}
