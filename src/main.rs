//! Entry point for the EmbedMe launcher.
use std::process::ExitCode;

use embedme::{
    bootstrap::{self, LaunchExit},
    cli::LauncherArgs,
    config::LauncherConfig,
    lib::telemetry,
};

fn main() -> ExitCode {
    match launch() {
        Ok(code) => code,
        Err(exit) => exit.report(),
    }
}

fn launch() -> Result<ExitCode, LaunchExit> {
    telemetry::init_tracing().map_err(LaunchExit::from_error)?;
    let profile = LauncherArgs::parse_profile();
    let config = LauncherConfig::load_from_env_or_default().map_err(LaunchExit::from_error)?;
    bootstrap::run(&config, &profile)
}
