//! The status-reporting contract the orchestration engine depends on.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::{GithubClient, StatusState};
use crate::error::GithubError;

/// Posts run status against one commit.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn create_status(
        &self,
        state: StatusState,
        target_url: &str,
        description: &str,
        context: &str,
    ) -> Result<(), GithubError>;
}

/// [`StatusReporter`] bound to the task's commit.
pub struct CommitStatusReporter {
    client: Arc<GithubClient>,
    owner: String,
    repo: String,
    sha: String,
}

impl CommitStatusReporter {
    pub fn new(client: Arc<GithubClient>, owner: &str, repo: &str, sha: &str) -> Self {
        Self {
            client,
            owner: owner.to_string(),
            repo: repo.to_string(),
            sha: sha.to_string(),
        }
    }
}

#[async_trait]
impl StatusReporter for CommitStatusReporter {
    async fn create_status(
        &self,
        state: StatusState,
        target_url: &str,
        description: &str,
        context: &str,
    ) -> Result<(), GithubError> {
        self.client
            .create_status(
                &self.owner,
                &self.repo,
                &self.sha,
                state,
                target_url,
                description,
                context,
            )
            .await
    }
}
