//! Interpreter reports and the decision whether the current runtime is usable.
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{config::LauncherConfig, lib::errors::BootstrapError};

/// Facts printed by the interpreter probe.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RuntimeReport {
    pub prefix: PathBuf,
    pub base_prefix: PathBuf,
    pub tool_present: bool,
    pub variant_present: bool,
    #[serde(default)]
    pub tool_version: Option<String>,
}

impl RuntimeReport {
    /// Parse the last non-empty stdout line of the probe.
    pub fn from_probe_output(stdout: &str) -> Result<Self, BootstrapError> {
        let line = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| BootstrapError::Probe {
                message: "probe printed nothing".into(),
            })?;
        serde_json::from_str(line).map_err(|err| BootstrapError::Probe {
            message: format!("{err}: {line}"),
        })
    }

    /// True when the interpreter runs inside a virtual environment.
    pub fn in_venv(&self) -> bool {
        self.prefix != self.base_prefix
    }
}

/// Result of `check_environment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentStatus {
    /// The interpreter can run the wrapped tool.
    Verified { interpreter: PathBuf },
    /// A venv is active but holds a conflicting installation of the tool.
    Mismatch { prefix: PathBuf },
    /// No venv is active and the tool variant is not importable.
    OutsideVenv,
    /// No interpreter could be found at all.
    NoInterpreter,
    /// The interpreter exists but the probe could not run or was unreadable.
    ProbeFailed,
}

/// Decide whether a probed interpreter is usable.
///
/// The variant marker is authoritative unless `package.required_version`
/// is configured, in which case the installed distribution must match it.
pub fn assess(
    interpreter: &Path,
    report: &RuntimeReport,
    config: &LauncherConfig,
) -> EnvironmentStatus {
    let version_ok = match &config.package.required_version {
        Some(required) => report.tool_version.as_deref() == Some(required.as_str()),
        None => true,
    };

    if report.variant_present && version_ok {
        return EnvironmentStatus::Verified {
            interpreter: interpreter.to_path_buf(),
        };
    }

    if report.in_venv() {
        if report.tool_present {
            return EnvironmentStatus::Mismatch {
                prefix: report.prefix.clone(),
            };
        }
        return EnvironmentStatus::Verified {
            interpreter: interpreter.to_path_buf(),
        };
    }

    EnvironmentStatus::OutsideVenv
}

/// Why `activate_environment` could not relaunch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationMissing {
    NoDirectory,
    NoInterpreter,
}

impl ActivationMissing {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActivationMissing::NoDirectory => "venv directory does not exist",
            ActivationMissing::NoInterpreter => "venv has no executable interpreter",
        }
    }
}

/// Result of `activate_environment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The relaunched process finished with this exit code (non-Unix, or test hosts).
    Relaunched(u8),
    Missing(ActivationMissing),
}
