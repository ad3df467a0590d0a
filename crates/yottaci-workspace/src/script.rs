//! Layer registration and build script rendering.

use yottaci_config::{BuildConfig, BuildTask, repo_dir_name};

/// Ordered layer-registration commands for a build.
///
/// Layer precedence in bitbake is order-sensitive: dependencies register in
/// declaration order (each named sub-layer, or the repository root when none
/// are declared), and the subject repository registers last.
pub fn layer_commands(task: &BuildTask) -> Vec<String> {
    let mut commands = Vec::new();
    for dep in &task.dependencies {
        let dir = repo_dir_name(&dep.url);
        match &dep.layers {
            Some(layers) if !layers.is_empty() => {
                for layer in layers {
                    commands.push(format!("bitbake-layers add-layer ../{dir}/{layer}"));
                }
            }
            _ => commands.push(format!("bitbake-layers add-layer ../{dir}")),
        }
    }
    commands.push(format!(
        "bitbake-layers add-layer ../{}",
        repo_dir_name(&task.repo_url)
    ));
    commands
}

/// The build script run from the workspace root: source the build
/// environment, register layers in order, build the target.
pub fn default_build_script(config: &BuildConfig, layer_cmds: &[String], target: &str) -> String {
    format!(
        "source {oecore}/oe-init-build-env build {bitbake}\n{layers}\nbitbake {target}\n",
        oecore = repo_dir_name(&config.oecore_url),
        bitbake = repo_dir_name(&config.bitbake_url),
        layers = layer_cmds.join("\n"),
    )
}
