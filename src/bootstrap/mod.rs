//! Bootstrap launcher: make sure the EmbedMe venv is active, then hand over to the wrapped tool.
mod delegate;
mod environment;
mod exit;
mod host;
mod launcher;
mod prompt;

use std::process::ExitCode;

use crate::{cli::LaunchProfile, config::LauncherConfig};

pub use delegate::{read_shim_report, DelegateOutcome, ShimReport, FAILURE_EXIT_CODE};
pub use environment::{assess, Activation, ActivationMissing, EnvironmentStatus, RuntimeReport};
pub use exit::LaunchExit;
pub use host::{RuntimeHost, SystemRuntimeHost};
pub use launcher::{Launcher, INSTALL_STEP, VENV_STEP};
pub use prompt::{is_affirmative, read_confirmation, CREATE_VENV_QUESTION};

/// Run the bootstrap sequence against the real system.
pub fn run(config: &LauncherConfig, profile: &LaunchProfile) -> Result<ExitCode, LaunchExit> {
    let host = SystemRuntimeHost;
    Launcher::new(&host, config, profile)
        .run()
        .map(ExitCode::from)
        .map_err(LaunchExit::from_error)
}
