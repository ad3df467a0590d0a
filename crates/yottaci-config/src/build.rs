//! Build configuration resolution.
//!
//! The configuration file is a multi-document YAML stored in the subject
//! repository; the task's `config_num` selects the active document
//! (1-indexed). [`BuildConfig`] and [`BuildTask`] are derived once and
//! read-only thereafter.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::task::TaskData;

/// One dependency repository declared by the configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DependencySpec {
    pub url: String,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    /// Sub-layer paths inside the repository to register as build layers.
    /// Absent means the repository root is itself the layer.
    #[serde(default)]
    pub layers: Option<Vec<String>>,
}

/// One document of the configuration file, as stored in the repository.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub configuration_name: Option<String>,
    /// Free-form text appended to the generated `auto.conf`.
    #[serde(default)]
    pub localconf: Option<String>,
    pub bitbake_target: String,
    /// Platform repository overrides; the stock openembedded remotes when
    /// absent. Forked platforms set these.
    #[serde(default)]
    pub oecore_url: Option<String>,
    #[serde(default)]
    pub bitbake_url: Option<String>,
    #[serde(default)]
    pub oecore_ref: Option<String>,
    #[serde(default)]
    pub bitbake_ref: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
}

impl ConfigDocument {
    /// Select document `config_num` (1-indexed) from a multi-document YAML
    /// text.
    pub fn select(yaml: &str, config_num: u32) -> Result<Self, ConfigError> {
        let mut documents = Vec::new();
        for document in serde_yaml::Deserializer::from_str(yaml) {
            documents.push(Self::deserialize(document)?);
        }
        let index = config_num
            .checked_sub(1)
            .ok_or(ConfigError::DocumentIndex {
                requested: config_num,
                available: documents.len(),
            })?;
        let available = documents.len();
        documents
            .into_iter()
            .nth(index as usize)
            .ok_or(ConfigError::DocumentIndex {
                requested: config_num,
                available,
            })
    }
}

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Configured name, or `configuration<N>` when the document has none.
    /// Used as the status context and the state-archive key.
    pub name: String,
    pub localconf: String,
    pub target: String,
    pub oecore_url: String,
    pub bitbake_url: String,
    pub oecore_ref: String,
    pub bitbake_ref: String,
}

impl BuildConfig {
    pub fn resolve(document: &ConfigDocument, config_num: u32) -> Self {
        Self {
            name: document
                .configuration_name
                .clone()
                .unwrap_or_else(|| format!("configuration{config_num}")),
            localconf: document.localconf.clone().unwrap_or_default(),
            target: document.bitbake_target.clone(),
            oecore_url: document
                .oecore_url
                .clone()
                .unwrap_or_else(|| crate::repo::OECORE_URL.to_string()),
            bitbake_url: document
                .bitbake_url
                .clone()
                .unwrap_or_else(|| crate::repo::BITBAKE_URL.to_string()),
            oecore_ref: document
                .oecore_ref
                .clone()
                .unwrap_or_else(|| "master".to_string()),
            bitbake_ref: document
                .bitbake_ref
                .clone()
                .unwrap_or_else(|| "master".to_string()),
        }
    }
}

/// Immutable description of one build, combining the task document with the
/// fetched configuration.
#[derive(Debug, Clone)]
pub struct BuildTask {
    /// Subject repository clone URL.
    pub repo_url: String,
    pub owner: String,
    pub repo_name: String,
    /// Exact commit the build is pinned to.
    pub sha: String,
    pub git_ref: String,
    pub pull_request: bool,
    /// Contributor fork URL for pull-request builds.
    pub contributor_url: Option<String>,
    pub dependencies: Vec<DependencySpec>,
    pub target: String,
    pub config_num: u32,
}

impl BuildTask {
    pub fn resolve(task: &TaskData, document: &ConfigDocument) -> Self {
        Self {
            repo_url: task.gh.repository.clone_url.clone(),
            owner: task.gh.repository.owner.login.clone(),
            repo_name: task.gh.repository.name.clone(),
            sha: task.gh.sha.clone(),
            git_ref: task.gh.git_ref.clone(),
            pull_request: task.is_pull_request(),
            contributor_url: task.gh.clone_url.clone(),
            dependencies: document.dependencies.clone(),
            target: document.bitbake_target.clone(),
            config_num: task.config_num,
        }
    }
}
