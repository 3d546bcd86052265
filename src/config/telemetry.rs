use tracing::{debug, info};

use super::{LauncherConfig, CONFIG_ENV_KEY};

pub fn log_env_source(path: &std::path::Path, from_env: bool) {
    if from_env {
        info!(
            target: "embedme::config",
            path = %path.display(),
            "Loading configuration using EMBEDME_CONFIG_PATH environment variable"
        );
    } else {
        debug!(
            target: "embedme::config",
            path = %path.display(),
            env = CONFIG_ENV_KEY,
            "EMBEDME_CONFIG_PATH not set; using the per-user config file if present"
        );
    }
}

pub fn log_loaded(config: &LauncherConfig) {
    debug!(
        target: "embedme::config",
        path = %config.source_path.display(),
        venv_path = %config.venv.path.display(),
        package_spec = %config.package.spec,
        required_version = config.package.required_version.as_deref().unwrap_or(""),
        tool_module = %config.tool.module,
        variant_marker = %config.tool.variant_marker,
        assume_yes = config.prompt.assume_yes,
        "Configuration loaded successfully"
    );
}
