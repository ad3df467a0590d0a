//! Authenticated GitHub API client.

use chrono::{Duration, Utc};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info};
use yottaci_config::TaskData;

use crate::auth::{AppAuth, InstallationToken};
use crate::error::GithubError;

/// Commit status states the orchestrator posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusState {
    Pending,
    Success,
    Failure,
}

impl StatusState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Minutes after minting when a cached token is considered near expiry.
/// Installation tokens live for 60 minutes.
const TOKEN_REFRESH_AFTER_MINS: i64 = 50;

fn is_fresh(token: &InstallationToken) -> bool {
    Utc::now() - token.minted_at < Duration::minutes(TOKEN_REFRESH_AFTER_MINS)
}

/// API client holding app credentials and a cached installation token.
///
/// Every call goes through [`GithubClient::token`], which re-mints the
/// installation token when the cached one is stale. This covers both the
/// multi-hour build gap and a slow startup without any call-site-specific
/// refresh logic.
pub struct GithubClient {
    http: reqwest::Client,
    auth: AppAuth,
    cached: Mutex<Option<InstallationToken>>,
}

impl GithubClient {
    pub fn new(http: reqwest::Client, auth: AppAuth) -> Self {
        Self {
            http,
            auth,
            cached: Mutex::new(None),
        }
    }

    /// Build the client from the task document's credential fields.
    pub fn from_task(http: reqwest::Client, task: &TaskData) -> Result<Self, GithubError> {
        let auth = AppAuth::new(
            &task.github_issuer_id,
            &task.githubapp_pkey,
            task.gh.installation.id,
        )?;
        Ok(Self::new(http, auth))
    }

    async fn token(&self) -> Result<String, GithubError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if is_fresh(token) {
                return Ok(token.token.clone());
            }
            debug!("installation token near expiry, re-minting");
        }
        let minted = self.auth.mint(&self.http).await?;
        let token = minted.token.clone();
        *cached = Some(minted);
        Ok(token)
    }

    /// Post a commit status against `sha`.
    pub async fn create_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        state: StatusState,
        target_url: &str,
        description: &str,
        context: &str,
    ) -> Result<(), GithubError> {
        let token = self.token().await?;
        info!(state = state.as_str(), context, "posting commit status");
        let response = self
            .http
            .post(format!(
                "{}/repos/{owner}/{repo}/statuses/{sha}",
                self.auth.api_base()
            ))
            .header("Authorization", format!("token {token}"))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "yottaci")
            .json(&json!({
                "state": state.as_str(),
                "target_url": target_url,
                "description": description,
                "context": context,
            }))
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 201 {
            return Err(GithubError::Api {
                operation: "create status",
                status,
            });
        }
        Ok(())
    }

    /// Fetch the raw text of a file from a repository at a ref.
    pub async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<String, GithubError> {
        let token = self.token().await?;
        let response = self
            .http
            .get(format!(
                "{}/repos/{owner}/{repo}/contents/{path}",
                self.auth.api_base()
            ))
            .query(&[("ref", git_ref)])
            .header("Authorization", format!("token {token}"))
            .header("Accept", "application/vnd.github.raw+json")
            .header("User-Agent", "yottaci")
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(GithubError::Api {
                operation: "fetch file",
                status,
            });
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_states_serialize_to_provider_values() {
        assert_eq!(StatusState::Pending.as_str(), "pending");
        assert_eq!(StatusState::Success.as_str(), "success");
        assert_eq!(StatusState::Failure.as_str(), "failure");
    }

    #[test]
    fn freshly_minted_token_is_fresh() {
        let token = InstallationToken {
            token: "t".to_string(),
            minted_at: Utc::now(),
        };
        assert!(is_fresh(&token));
    }

    #[test]
    fn hour_old_token_needs_refresh() {
        let token = InstallationToken {
            token: "t".to_string(),
            minted_at: Utc::now() - Duration::minutes(61),
        };
        assert!(!is_fresh(&token));

        let near_expiry = InstallationToken {
            token: "t".to_string(),
            minted_at: Utc::now() - Duration::minutes(TOKEN_REFRESH_AFTER_MINS),
        };
        assert!(!is_fresh(&near_expiry));
    }
}
