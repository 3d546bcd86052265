//! Load and validate launcher configuration.
use std::{
    collections::HashMap,
    env,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::error;

use crate::lib::{errors::ConfigError, paths};

pub mod package;
pub mod prompt;
pub mod telemetry;
pub mod venv;

pub use package::{
    parse_package_section, parse_tool_section, PackageSection, RawPackageSection, RawToolSection,
    ToolSection, DEFAULT_PACKAGE_SPEC, DEFAULT_TOOL_MODULE, DEFAULT_VARIANT_MARKER,
};
pub use prompt::{parse_prompt_section, PromptSection, RawPromptSection};
pub use venv::{parse_venv_section, RawVenvSection, VenvSection, DEFAULT_BASE_PYTHONS};

pub const CONFIG_ENV_KEY: &str = "EMBEDME_CONFIG_PATH";
/// Prefix for per-key overrides such as `EMBEDME_VENV__PATH`.
const ENV_OVERRIDE_PREFIX: &str = "EMBEDME";
const ENV_OVERRIDE_SEPARATOR: &str = "__";
const DEFAULT_CONFIG_DIR: &[&str] = &[".config", "embedme"];
const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Top-level configuration container.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub venv: VenvSection,
    pub package: PackageSection,
    pub tool: ToolSection,
    pub prompt: PromptSection,
    pub source_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawLauncherConfig {
    venv: Option<RawVenvSection>,
    package: Option<RawPackageSection>,
    tool: Option<RawToolSection>,
    prompt: Option<RawPromptSection>,
}

impl LauncherConfig {
    /// Prefer `EMBEDME_CONFIG_PATH` if set; otherwise read the per-user file when it exists.
    pub fn load_from_env_or_default() -> Result<Self, ConfigError> {
        let (path, from_env) = match env::var(CONFIG_ENV_KEY) {
            Ok(value) if !value.trim().is_empty() => (PathBuf::from(value), true),
            _ => (default_config_path(), false),
        };

        telemetry::log_env_source(&path, from_env);
        Self::load_sources(path, from_env, None)
    }

    /// Load configuration from a file that must exist.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        Self::load_sources(path, true, None)
    }

    /// Load configuration with explicit values standing in for the process environment.
    pub fn load_with_env(
        path: PathBuf,
        required: bool,
        env_overrides: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        Self::load_sources(path, required, Some(env_overrides))
    }

    fn load_sources(
        path: PathBuf,
        required: bool,
        env_overrides: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let file = config::File::from(path.clone())
            .format(config::FileFormat::Toml)
            .required(required);
        let environment = config::Environment::with_prefix(ENV_OVERRIDE_PREFIX)
            .prefix_separator("_")
            .separator(ENV_OVERRIDE_SEPARATOR)
            .source(env_overrides);

        let builder = config::Config::builder()
            .add_source(file)
            .add_source(environment);
        let document = builder.build().map_err(|err| {
            let error = ConfigError::from_read_error(path.clone(), err);
            error!(
                target: "embedme::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        let raw: RawLauncherConfig = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: "embedme::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let config = Self::from_raw(raw, path.clone()).map_err(|err| {
            error!(
                target: "embedme::config",
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        telemetry::log_loaded(&config);
        Ok(config)
    }

    fn from_raw(raw: RawLauncherConfig, path: PathBuf) -> Result<Self, ConfigError> {
        let venv = parse_venv_section(raw.venv, &path)?;
        let package = parse_package_section(raw.package, &path)?;
        let tool = parse_tool_section(raw.tool, &path)?;
        let prompt = parse_prompt_section(raw.prompt);

        Ok(Self {
            venv,
            package,
            tool,
            prompt,
            source_path: path,
        })
    }
}

fn default_config_path() -> PathBuf {
    match paths::resolve_home_dir() {
        Ok(home) => DEFAULT_CONFIG_DIR
            .iter()
            .fold(home, |acc, part| acc.join(part))
            .join(DEFAULT_CONFIG_FILE),
        Err(_) => Path::new(DEFAULT_CONFIG_FILE).to_path_buf(),
    }
}
