//! The pipeline state machine.

use std::sync::Arc;

use camino::Utf8PathBuf;
use tracing::{error, info, warn};
use yottaci_config::{Layout, build_repos};
use yottaci_gitcache::RepoCache;
use yottaci_github::{StatusReporter, StatusState};
use yottaci_runner::ProcessRunner;
use yottaci_statecache::StateCache;
use yottaci_workspace::{Workspace, default_build_script, layer_commands};

use crate::context::RunContext;
use crate::diagnostics::{copy_diagnostics, default_diagnostic_logs};
use crate::error::PipelineError;
use crate::state::RunState;

/// Final outcome a run finalizes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    fn build_result(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Orchestrator knobs beyond the run context.
///
/// `build_script` overrides the rendered bitbake script; tests use it to
/// substitute a controlled command. `diagnostic_logs` are the system logs
/// captured on failure.
pub struct OrchestratorConfig {
    pub layout: Layout,
    pub build_script: Option<String>,
    pub diagnostic_logs: Vec<Utf8PathBuf>,
}

impl OrchestratorConfig {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            build_script: None,
            diagnostic_logs: default_diagnostic_logs(),
        }
    }
}

/// Drives one build from `Pending` to a terminal state.
pub struct Orchestrator {
    ctx: RunContext,
    reporter: Arc<dyn StatusReporter>,
    config: OrchestratorConfig,
    state: RunState,
    attempted_build: bool,
}

impl Orchestrator {
    pub fn new(
        ctx: RunContext,
        reporter: Arc<dyn StatusReporter>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            ctx,
            reporter,
            config,
            state: RunState::Pending,
            attempted_build: false,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run the pipeline to a terminal state.
    ///
    /// Both branches share one finalize sequence (save state, report,
    /// enqueue); the failure branch additionally captures diagnostics and
    /// treats save/report as best-effort so a broken collaborator cannot
    /// block the result message.
    pub async fn run(&mut self) -> Result<(), PipelineError> {
        match self.execute().await {
            Ok(()) => match self.finalize(Outcome::Success).await {
                Ok(()) => Ok(()),
                Err(err) => {
                    error!(error = %err, "success finalization failed, recording failure");
                    self.finalize_failure_best_effort().await;
                    Err(err)
                }
            },
            Err(err) => {
                error!(error = %err, state = %self.state, "pipeline step failed");
                self.finalize_failure_best_effort().await;
                Err(err)
            }
        }
    }

    async fn finalize_failure_best_effort(&mut self) {
        if let Err(err) = self.finalize(Outcome::Failure).await {
            warn!(error = %err, "failure finalization incomplete");
        }
    }

    /// The forward path: everything up to and including the build step.
    async fn execute(&mut self) -> Result<(), PipelineError> {
        let runner = ProcessRunner::new(self.ctx.log.clone());
        let repos = build_repos(&self.ctx.task, &self.ctx.config);
        let layout = self.config.layout.clone();

        // Observers see progress before any heavy work starts.
        self.transition(RunState::Pending);
        self.reporter
            .create_status(
                StatusState::Pending,
                &self.ctx.log.url(),
                "Build started",
                &self.ctx.config.name,
            )
            .await?;

        self.transition(RunState::CacheSyncing);
        let cache = RepoCache::new(layout.repos_dir(), layout.cache_lock_path());
        cache.sync(&runner, &repos).await?;

        self.transition(RunState::WorkspaceAssembling);
        let workspace = Workspace::new(layout.workspace_dir());
        workspace
            .assemble(
                &runner,
                &self.ctx.task,
                &self.ctx.config,
                &cache,
                &repos,
                &layout.downloads_dir(),
            )
            .await?;

        self.transition(RunState::StateRestoring);
        let state_cache = StateCache::new(layout.bb_cache_dir());
        state_cache.restore(&self.ctx.config, workspace.dir())?;

        self.transition(RunState::Building);
        self.attempted_build = true;
        let script = match &self.config.build_script {
            Some(script) => script.clone(),
            None => default_build_script(
                &self.ctx.config,
                &layer_commands(&self.ctx.task),
                &self.ctx.task.target,
            ),
        };
        let code = runner.run_script(&script, workspace.dir()).await?;
        if code != 0 {
            return Err(PipelineError::BuildFailed(code));
        }
        Ok(())
    }

    /// Shared terminal sequence: save state, report status, capture
    /// diagnostics (failure only), enqueue the single result message.
    async fn finalize(&mut self, outcome: Outcome) -> Result<(), PipelineError> {
        let best_effort = outcome == Outcome::Failure;
        let layout = self.config.layout.clone();

        // State is only worth saving once a build actually ran; a state
        // directory left over from an unrelated cause is not a signal.
        if self.attempted_build {
            self.transition(RunState::StateSaving);
            let state_dir = Workspace::new(layout.workspace_dir()).state_dir();
            match StateCache::new(layout.bb_cache_dir()).save(&self.ctx.config, &state_dir) {
                Ok(()) => {}
                Err(err) if best_effort => {
                    warn!(error = %err, "state save failed on failure path, continuing");
                }
                Err(err) => return Err(err.into()),
            }
        }

        self.transition(RunState::Reporting);
        let (status, description) = match outcome {
            Outcome::Success => (StatusState::Success, "Target has been built successfully"),
            Outcome::Failure => (StatusState::Failure, "Build failed"),
        };
        match self
            .reporter
            .create_status(
                status,
                &self.ctx.log.url(),
                description,
                &self.ctx.config.name,
            )
            .await
        {
            Ok(()) => {}
            Err(err) if best_effort => {
                warn!(error = %err, "failure status could not be posted, continuing");
            }
            Err(err) => return Err(err.into()),
        }

        if outcome == Outcome::Failure {
            copy_diagnostics(
                &self.config.diagnostic_logs,
                &layout.run_log_dir(&self.ctx.run_id),
            );
        }

        let message = self.ctx.task_data.result_message(outcome.build_result())?;
        self.ctx.queue.enqueue(&message).await?;

        self.transition(match outcome {
            Outcome::Success => RunState::Succeeded,
            Outcome::Failure => RunState::Failed,
        });
        Ok(())
    }

    fn transition(&mut self, state: RunState) {
        self.state = state;
        info!(run_id = %self.ctx.run_id, state = %state, "pipeline state");
    }
}
