use std::fmt;

/// Pipeline states, in execution order. `Succeeded` and `Failed` are
/// terminal; both trigger exactly one result-queue message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    CacheSyncing,
    WorkspaceAssembling,
    StateRestoring,
    Building,
    StateSaving,
    Reporting,
    Succeeded,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::CacheSyncing => "cache-syncing",
            Self::WorkspaceAssembling => "workspace-assembling",
            Self::StateRestoring => "state-restoring",
            Self::Building => "building",
            Self::StateSaving => "state-saving",
            Self::Reporting => "reporting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
