//! LaunchProfile and process environment capture.
use std::{env, ffi::OsString, path::PathBuf};

/// Marks a process that was already relaunched inside the EmbedMe venv.
pub const RELAUNCH_ENV: &str = "EMBEDME_RELAUNCHED";
/// Active virtual environment marker exported by `activate` scripts.
pub const VIRTUAL_ENV: &str = "VIRTUAL_ENV";
pub const SEARCH_PATH_ENV: &str = "PATH";

/// Resolved launch profile.
#[derive(Debug, Clone)]
pub struct LaunchProfile {
    pub program_name: OsString,
    pub forwarded: Vec<OsString>,
    pub active_venv: Option<PathBuf>,
    pub search_path: Option<OsString>,
    pub relaunched: bool,
}

impl LaunchProfile {
    /// Capture the venv marker, search path and relaunch marker of this process.
    pub fn from_env(program_name: OsString, forwarded: Vec<OsString>) -> Self {
        Self {
            program_name,
            forwarded,
            active_venv: env::var_os(VIRTUAL_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
            search_path: env::var_os(SEARCH_PATH_ENV),
            relaunched: is_relaunch_marker(env::var_os(RELAUNCH_ENV)),
        }
    }
}

fn is_relaunch_marker(value: Option<OsString>) -> bool {
    matches!(value, Some(value) if !value.is_empty() && value != "0")
}
