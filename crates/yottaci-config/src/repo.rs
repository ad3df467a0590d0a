//! Repository descriptors and mirror directory naming.

use crate::build::{BuildConfig, BuildTask};

/// Clone URL of the openembedded-core platform repository.
pub const OECORE_URL: &str = "git://git.openembedded.org/openembedded-core";
/// Clone URL of the bitbake repository.
pub const BITBAKE_URL: &str = "git://git.openembedded.org/bitbake";

/// One repository participating in a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoDescriptor {
    /// Local directory name, derived from the URL. The same remote always
    /// maps to the same mirror directory.
    pub dir_name: String,
    pub url: String,
    /// Ref to check out after cloning, when pinned.
    pub git_ref: Option<String>,
    /// Sub-layer paths to register as build layers.
    pub layers: Option<Vec<String>>,
}

impl RepoDescriptor {
    pub fn new(url: &str, git_ref: Option<String>, layers: Option<Vec<String>>) -> Self {
        Self {
            dir_name: repo_dir_name(url),
            url: url.to_string(),
            git_ref,
            layers,
        }
    }
}

/// Derive the local directory name for a repository URL.
///
/// Host and path segments are joined with `.`, empty segments dropped, so
/// `git://git.openembedded.org/openembedded-core` becomes
/// `git.openembedded.org.openembedded-core`. Pure function of the URL.
pub fn repo_dir_name(url: &str) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    // Drop userinfo and port from the authority, keeping the bare host.
    let host = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);
    let host = host.split_once(':').map_or(host, |(host, _)| host);

    let mut segments = vec![host.to_ascii_lowercase()];
    segments.extend(path.split('/').filter(|s| !s.is_empty()).map(String::from));
    segments.retain(|s| !s.is_empty());
    segments.join(".")
}

/// All repositories participating in a build, in clone order: the core
/// platform repositories, each declared dependency, then the subject
/// repository last.
pub fn build_repos(task: &BuildTask, config: &BuildConfig) -> Vec<RepoDescriptor> {
    let mut repos = vec![
        RepoDescriptor::new(&config.oecore_url, Some(config.oecore_ref.clone()), None),
        RepoDescriptor::new(&config.bitbake_url, Some(config.bitbake_ref.clone()), None),
    ];
    for dep in &task.dependencies {
        repos.push(RepoDescriptor::new(
            &dep.url,
            dep.git_ref.clone(),
            dep.layers.clone(),
        ));
    }
    // The subject is pinned to the task's exact commit during workspace
    // assembly, not here.
    repos.push(RepoDescriptor::new(&task.repo_url, None, None));
    repos
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn dir_name_joins_host_and_path() {
        assert_eq!(
            repo_dir_name("git://git.openembedded.org/openembedded-core"),
            "git.openembedded.org.openembedded-core"
        );
        assert_eq!(
            repo_dir_name("https://github.com/acme/meta-widget.git"),
            "github.com.acme.meta-widget.git"
        );
    }

    #[test]
    fn dir_name_drops_empty_segments() {
        assert_eq!(
            repo_dir_name("https://github.com//acme//meta-widget/"),
            "github.com.acme.meta-widget"
        );
    }

    #[test]
    fn dir_name_ignores_userinfo_and_port() {
        assert_eq!(
            repo_dir_name("ssh://git@example.com:2222/pub/repo"),
            "example.com.pub.repo"
        );
    }

    #[test]
    fn dir_name_lowercases_host_only() {
        assert_eq!(
            repo_dir_name("https://GitHub.com/Acme/Meta-Widget"),
            "github.com.Acme.Meta-Widget"
        );
    }

    #[test]
    fn differing_host_path_pairs_do_not_collide() {
        let a = repo_dir_name("https://github.com/acme/meta-a");
        let b = repo_dir_name("https://github.com/acme/meta-b");
        let c = repo_dir_name("https://gitlab.com/acme/meta-a");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn build_repos_orders_core_deps_subject() {
        use crate::build::{BuildConfig, BuildTask, DependencySpec};

        let task = BuildTask {
            repo_url: "https://github.com/acme/meta-widget.git".to_string(),
            owner: "acme".to_string(),
            repo_name: "meta-widget".to_string(),
            sha: "deadbeef".to_string(),
            git_ref: "refs/heads/main".to_string(),
            pull_request: false,
            contributor_url: None,
            dependencies: vec![DependencySpec {
                url: "https://github.com/acme/meta-widget-bsp.git".to_string(),
                git_ref: Some("v1".to_string()),
                layers: None,
            }],
            target: "core-image-minimal".to_string(),
            config_num: 1,
        };
        let config = BuildConfig {
            name: "configuration1".to_string(),
            localconf: String::new(),
            target: "core-image-minimal".to_string(),
            oecore_url: OECORE_URL.to_string(),
            bitbake_url: BITBAKE_URL.to_string(),
            oecore_ref: "kirkstone".to_string(),
            bitbake_ref: "master".to_string(),
        };

        let repos = build_repos(&task, &config);
        assert_eq!(repos.len(), 4);
        assert_eq!(repos[0].url, OECORE_URL);
        assert_eq!(repos[0].git_ref.as_deref(), Some("kirkstone"));
        assert_eq!(repos[1].url, BITBAKE_URL);
        assert_eq!(repos[2].git_ref.as_deref(), Some("v1"));
        assert_eq!(repos[3].url, task.repo_url);
        assert_eq!(repos[3].git_ref, None);
    }

    proptest! {
        #[test]
        fn dir_name_is_deterministic(host in "[a-z][a-z0-9.-]{0,20}", path in "[a-zA-Z0-9_/.-]{0,40}") {
            let url = format!("https://{host}/{path}");
            prop_assert_eq!(repo_dir_name(&url), repo_dir_name(&url));
        }

        #[test]
        fn dir_name_never_contains_separators(host in "[a-z][a-z0-9.-]{0,20}", path in "[a-zA-Z0-9_/.-]{0,40}") {
            let url = format!("https://{host}/{path}");
            prop_assert!(!repo_dir_name(&url).contains('/'));
        }
    }
}
