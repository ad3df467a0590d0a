//! Production wiring: task document to a running pipeline.
//!
//! Provider auth and configuration resolution happen before any status can
//! be posted; failures here abort the process visibly with no status and no
//! queue message. Everything after hands off to the orchestrator, which owns
//! failure reporting.

use std::sync::Arc;

use anyhow::Context as _;
use tracing::info;
use yottaci_config::{BuildConfig, BuildTask, ConfigDocument, Layout, TaskData};
use yottaci_engine::{Orchestrator, OrchestratorConfig, RunContext};
use yottaci_github::{CommitStatusReporter, GithubClient};
use yottaci_storage::{AppendBlobClient, QueueClient, RESULT_QUEUE, StorageCredentials};

use crate::cli::RunArgs;

/// Repository path of the multi-document configuration file.
const CONFIG_PATH: &str = ".yottaci.yml";

/// Run one build task to completion.
pub async fn run_task(args: RunArgs) -> anyhow::Result<()> {
    let task_data = TaskData::load(args.taskdata.as_str())
        .with_context(|| format!("loading task document from {}", args.taskdata))?;
    let run_id = task_data.run_id();
    info!(run_id = %run_id, repo = %task_data.gh.repository.clone_url, "starting run");

    let http = reqwest::Client::builder()
        .user_agent("yottaci")
        .build()
        .context("building HTTP client")?;

    // Fatal before any commit status exists: auth and config resolution.
    let github = Arc::new(
        GithubClient::from_task(http.clone(), &task_data).context("provider authentication")?,
    );
    let config_owner = config_owner(&task_data);
    let yaml = github
        .fetch_file(
            config_owner,
            &task_data.gh.repository.name,
            CONFIG_PATH,
            &task_data.gh.git_ref,
        )
        .await
        .with_context(|| format!("fetching {CONFIG_PATH}"))?;
    let document = ConfigDocument::select(&yaml, task_data.config_num)
        .context("resolving build configuration")?;
    let config = BuildConfig::resolve(&document, task_data.config_num);
    let task = BuildTask::resolve(&task_data, &document);

    // The run's append-only log blob, created up front so the pending status
    // can link to it.
    let credentials = StorageCredentials::new(
        &task_data.storage_account_name,
        &task_data.storage_account_key,
    )
    .context("storage credentials")?;
    let log = AppendBlobClient::new(http.clone(), credentials, &run_id);
    log.create().await.context("creating log blob")?;

    let queue = QueueClient::from_connection_string(
        http.clone(),
        &task_data.queue_connection_string,
        RESULT_QUEUE,
    )
    .context("result queue credentials")?;

    let reporter = Arc::new(CommitStatusReporter::new(
        github,
        &task_data.gh.repository.owner.login,
        &task_data.gh.repository.name,
        &task_data.gh.sha,
    ));

    let ctx = RunContext::new(task_data, task, config, Arc::new(log), Arc::new(queue));
    let layout = Layout::new(args.fileshare, args.workdir);
    let mut orchestrator = Orchestrator::new(ctx, reporter, OrchestratorConfig::new(layout));
    orchestrator.run().await?;
    Ok(())
}

/// Pull requests read the configuration from the contributor's fork; pushes
/// read it from the subject repository itself.
fn config_owner(task: &TaskData) -> &str {
    task.gh
        .pull_request
        .as_ref()
        .map(|pr| pr.head.repo.owner.login.as_str())
        .unwrap_or(task.gh.repository.owner.login.as_str())
}
