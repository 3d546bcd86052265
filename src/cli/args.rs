//! CLI argument definitions and `LaunchProfile` construction.
use std::{env, ffi::OsString};

use clap::Parser;

use super::{LaunchProfile, DEFAULT_PROGRAM_NAME};

/// Command-line arguments.
///
/// The launcher owns no flags: everything, including `--help` and
/// `--version`, belongs to the wrapped tool.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "embedme",
    about = "EmbedMe launcher for ESPHome",
    long_about = None,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct LauncherArgs {
    /// Arguments forwarded verbatim to ESPHome.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    pub forwarded: Vec<OsString>,
}

impl LauncherArgs {
    /// Parse the process command line and capture the environment it was launched in.
    pub fn parse_profile() -> LaunchProfile {
        let mut raw = env::args_os();
        let program_name = raw
            .next()
            .unwrap_or_else(|| OsString::from(DEFAULT_PROGRAM_NAME));
        let forwarded = Self::forwarded_from(program_name.clone(), raw.collect());
        LaunchProfile::from_env(program_name, forwarded)
    }

    /// Parse `raw` (argv without the program name) into the forwarded list.
    ///
    /// clap swallows a leading `--` as its own escape; it belongs to the
    /// wrapped tool, so it is put back.
    pub fn forwarded_from(program_name: OsString, raw: Vec<OsString>) -> Vec<OsString> {
        let leading_escape = raw.first().is_some_and(|arg| arg == "--");
        let mut forwarded = Self::parse_from(std::iter::once(program_name).chain(raw)).forwarded;
        if leading_escape {
            forwarded.insert(0, OsString::from("--"));
        }
        forwarded
    }
}
