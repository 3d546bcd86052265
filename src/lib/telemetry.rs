//! Telemetry initialization and bootstrap state events.

use std::{ffi::OsString, path::Path};

use anyhow::Result;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the launcher-specific log filter.
pub const LOG_ENV_KEY: &str = "EMBEDME_LOG";
/// Filter applied when neither `EMBEDME_LOG` nor `RUST_LOG` is set.
const DEFAULT_FILTER: &str = "warn";

/// Initialize `tracing` and route logs to stderr.
///
/// Stdout belongs to the wrapped tool, so nothing is ever written there.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_env(LOG_ENV_KEY)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Bootstrap state machine positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Unverified,
    Verified,
    NeedsCreate,
    Creating,
    Installing,
    Relaunch,
    Delegated,
}

impl BootstrapState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BootstrapState::Unverified => "unverified",
            BootstrapState::Verified => "verified",
            BootstrapState::NeedsCreate => "needs_create",
            BootstrapState::Creating => "creating",
            BootstrapState::Installing => "installing",
            BootstrapState::Relaunch => "relaunch",
            BootstrapState::Delegated => "delegated",
        }
    }
}

/// Emit a state transition to `tracing`.
pub fn emit_transition(from: BootstrapState, to: BootstrapState) {
    debug!(
        target: "embedme::bootstrap",
        from = from.as_str(),
        to = to.as_str(),
        "Bootstrap state changed"
    );
}

/// Payload describing how this process was launched.
#[derive(Debug)]
pub struct LaunchContextTelemetry<'a> {
    pub venv_path: &'a Path,
    pub active_venv: Option<&'a Path>,
    pub relaunched: bool,
    pub config_path: &'a Path,
    pub forwarded_args: &'a [OsString],
}

/// Emit the launch context to `tracing`.
pub fn emit_launch_context(telemetry: &LaunchContextTelemetry<'_>) {
    info!(
        target: "embedme::bootstrap",
        venv_path = %telemetry.venv_path.display(),
        active_venv = %telemetry
            .active_venv
            .map(|path| path.display().to_string())
            .unwrap_or_default(),
        relaunched = telemetry.relaunched,
        config_path = %telemetry.config_path.display(),
        forwarded_args = ?telemetry.forwarded_args,
        "Starting EmbedMe bootstrap"
    );
}
