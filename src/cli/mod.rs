//! CLI entrypoint module structure.

pub mod args;
pub mod profile;

pub use args::LauncherArgs;
pub use profile::{LaunchProfile, RELAUNCH_ENV, SEARCH_PATH_ENV, VIRTUAL_ENV};

/// argv[0] used when the platform provides none.
pub const DEFAULT_PROGRAM_NAME: &str = "embedme";
