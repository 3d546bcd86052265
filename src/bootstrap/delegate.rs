//! Outcome of running the wrapped tool and its mapping to an exit code.
use std::{fs, io, path::Path};

use serde::Deserialize;
use tracing::warn;

use crate::lib::errors::BootstrapError;

/// Exit code for bootstrap failures, domain errors and interrupts.
pub const FAILURE_EXIT_CODE: u8 = 1;

/// Side-channel message written by the delegate shim.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShimReport {
    DomainError { message: String },
    Interrupted,
}

/// How the wrapped tool finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegateOutcome {
    Completed(i32),
    DomainError(String),
    Interrupted,
    /// Killed by a signal other than `SIGINT`.
    Terminated,
}

impl DelegateOutcome {
    pub fn from_parts(code: Option<i32>, interrupted: bool, report: Option<ShimReport>) -> Self {
        match report {
            Some(ShimReport::DomainError { message }) => return Self::DomainError(message),
            Some(ShimReport::Interrupted) => return Self::Interrupted,
            None => {}
        }
        if interrupted {
            return Self::Interrupted;
        }
        match code {
            Some(code) => Self::Completed(code),
            None => Self::Terminated,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Completed(code) => u8::try_from(*code).unwrap_or(FAILURE_EXIT_CODE),
            Self::DomainError(_) | Self::Interrupted | Self::Terminated => FAILURE_EXIT_CODE,
        }
    }
}

/// Read the shim report if the shim wrote one.
pub fn read_shim_report(path: &Path) -> Result<Option<ShimReport>, BootstrapError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(BootstrapError::ReportChannel { source }),
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str(&content) {
        Ok(report) => Ok(Some(report)),
        Err(err) => {
            warn!(
                target: "embedme::delegate",
                path = %path.display(),
                reason = %err,
                "Ignoring unreadable delegate report"
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn completed_code_is_propagated() {
        assert_eq!(DelegateOutcome::from_parts(Some(3), false, None).exit_code(), 3);
        assert_eq!(DelegateOutcome::from_parts(Some(0), false, None).exit_code(), 0);
        assert_eq!(DelegateOutcome::from_parts(Some(-1), false, None).exit_code(), 1);
        assert_eq!(DelegateOutcome::from_parts(Some(300), false, None).exit_code(), 1);
    }

    #[test]
    fn report_takes_precedence_over_status() {
        let outcome = DelegateOutcome::from_parts(
            Some(1),
            false,
            Some(ShimReport::DomainError {
                message: "Invalid YAML".into(),
            }),
        );
        assert_eq!(outcome, DelegateOutcome::DomainError("Invalid YAML".into()));
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(
            DelegateOutcome::from_parts(None, true, None),
            DelegateOutcome::Interrupted
        );
        assert_eq!(
            DelegateOutcome::from_parts(None, false, None),
            DelegateOutcome::Terminated
        );
    }

    #[test]
    fn shim_report_file_is_parsed() {
        let temp = tempdir().expect("can create temporary directory");
        let path = temp.path().join("report.json");
        assert_eq!(read_shim_report(&path).expect("missing is fine"), None);

        fs::write(&path, r#"{"kind": "domain_error", "message": "boom"}"#).expect("write");
        assert_eq!(
            read_shim_report(&path).expect("valid report"),
            Some(ShimReport::DomainError {
                message: "boom".into()
            })
        );

        fs::write(&path, r#"{"kind": "interrupted"}"#).expect("write");
        assert_eq!(
            read_shim_report(&path).expect("valid report"),
            Some(ShimReport::Interrupted)
        );

        fs::write(&path, "not json").expect("write");
        assert_eq!(read_shim_report(&path).expect("garbage is ignored"), None);
    }
}
