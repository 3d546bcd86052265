//! The bootstrap sequence: check, activate, create, delegate.
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use tracing::{error, info, warn};

use crate::{
    cli::LaunchProfile,
    config::LauncherConfig,
    lib::{
        errors::BootstrapError,
        paths,
        python::{self, DelegateRequest, ProbeRequest},
        telemetry::{self, BootstrapState, LaunchContextTelemetry},
    },
};

use super::{
    delegate::DelegateOutcome,
    environment::{assess, Activation, ActivationMissing, EnvironmentStatus},
    host::RuntimeHost,
    prompt::CREATE_VENV_QUESTION,
};

pub const VENV_STEP: &str = "python -m venv";
pub const INSTALL_STEP: &str = "pip install";
const REPORT_FILE_NAME: &str = "delegate-report.json";

/// Drives one process through the bootstrap states.
pub struct Launcher<'a, H: RuntimeHost> {
    host: &'a H,
    config: &'a LauncherConfig,
    profile: &'a LaunchProfile,
    state: BootstrapState,
}

impl<'a, H: RuntimeHost> Launcher<'a, H> {
    pub fn new(host: &'a H, config: &'a LauncherConfig, profile: &'a LaunchProfile) -> Self {
        Self {
            host,
            config,
            profile,
            state: BootstrapState::Unverified,
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Run the whole sequence and return the process exit code.
    pub fn run(&mut self) -> Result<u8, BootstrapError> {
        telemetry::emit_launch_context(&LaunchContextTelemetry {
            venv_path: &self.config.venv.path,
            active_venv: self.profile.active_venv.as_deref(),
            relaunched: self.profile.relaunched,
            config_path: &self.config.source_path,
            forwarded_args: &self.profile.forwarded,
        });

        if let EnvironmentStatus::Verified { interpreter } = self.check_environment()? {
            self.transition(BootstrapState::Verified);
            return self.delegate(&interpreter);
        }

        if self.profile.relaunched {
            return Err(BootstrapError::StillUnverified {
                path: self.config.venv.path.clone(),
            });
        }

        if let Activation::Relaunched(code) = self.activate_environment()? {
            return Ok(code);
        }

        self.transition(BootstrapState::NeedsCreate);
        self.create_environment()?;

        match self.activate_environment()? {
            Activation::Relaunched(code) => Ok(code),
            Activation::Missing(_) => Err(BootstrapError::ActivationUnavailable {
                path: self.config.venv.path.clone(),
            }),
        }
    }

    /// Probe the interpreter this process would delegate to.
    pub fn check_environment(&self) -> Result<EnvironmentStatus, BootstrapError> {
        let Some(interpreter) = self.current_interpreter() else {
            warn!(
                target: "embedme::bootstrap",
                "No Python interpreter found; EmbedMe should be run in a venv"
            );
            return Ok(EnvironmentStatus::NoInterpreter);
        };

        let tool = &self.config.tool;
        let probed = self.host.probe(
            &interpreter,
            ProbeRequest {
                module: &tool.module,
                variant_marker: &tool.variant_marker,
                distribution: &self.config.package.distribution,
            },
        );
        let report = match probed {
            Ok(report) => report,
            Err(
                err @ (BootstrapError::CommandFailed { .. }
                | BootstrapError::Probe { .. }
                | BootstrapError::Spawn { .. }),
            ) => {
                warn!(
                    target: "embedme::bootstrap",
                    interpreter = %interpreter.display(),
                    "Interpreter is not usable: {err}"
                );
                return Ok(EnvironmentStatus::ProbeFailed);
            }
            Err(err) => return Err(err),
        };
        let status = assess(&interpreter, &report, self.config);

        match &status {
            EnvironmentStatus::Mismatch { prefix } => error!(
                target: "embedme::bootstrap",
                prefix = %prefix.display(),
                installed_version = report.tool_version.as_deref().unwrap_or("unknown"),
                "{}",
                BootstrapError::EnvironmentMismatch {
                    prefix: prefix.clone(),
                    module: tool.module.clone(),
                }
            ),
            EnvironmentStatus::OutsideVenv => warn!(
                target: "embedme::bootstrap",
                interpreter = %interpreter.display(),
                "EmbedMe should be run in a venv (virtual environment)"
            ),
            EnvironmentStatus::Verified { .. }
            | EnvironmentStatus::NoInterpreter
            | EnvironmentStatus::ProbeFailed => {}
        }
        Ok(status)
    }

    /// Relaunch inside the EmbedMe venv if it holds an executable interpreter.
    pub fn activate_environment(&mut self) -> Result<Activation, BootstrapError> {
        let config = self.config;
        let venv = &config.venv.path;
        if !venv.is_dir() {
            return Ok(self.activation_missing(ActivationMissing::NoDirectory));
        }
        if !self.host.is_executable(&paths::venv_interpreter(venv)) {
            return Ok(self.activation_missing(ActivationMissing::NoInterpreter));
        }

        info!(
            target: "embedme::bootstrap",
            path = %venv.display(),
            "Activating EmbedMe venv"
        );
        let search_path = self.search_path_with(venv)?;
        self.transition(BootstrapState::Relaunch);
        let code = self.host.relaunch(venv, &search_path, self.profile)?;
        Ok(Activation::Relaunched(code))
    }

    /// Ask for confirmation, build the venv, activate it here and install the package.
    pub fn create_environment(&mut self) -> Result<(), BootstrapError> {
        let config = self.config;
        let venv = &config.venv.path;
        info!(
            target: "embedme::bootstrap",
            path = %venv.display(),
            "EmbedMe requires a venv to run, a custom venv can be created"
        );

        let accepted = if config.prompt.assume_yes {
            info!(
                target: "embedme::bootstrap",
                "prompt.assume_yes is set; creating the venv without asking"
            );
            true
        } else {
            self.host.confirm(CREATE_VENV_QUESTION)?
        };
        if !accepted {
            return Err(BootstrapError::CreationDeclined { path: venv.clone() });
        }

        self.transition(BootstrapState::Creating);
        let base_python = self.base_interpreter()?;
        self.host.run_step(
            VENV_STEP,
            python::build_venv_command(&base_python, venv, config.venv.symlinks),
        )?;
        info!(
            target: "embedme::bootstrap",
            path = %venv.display(),
            package = %config.package.spec,
            "EmbedMe venv created, now installing the EmbedMe version of the tool"
        );

        let search_path = self.search_path_with(venv)?;
        self.host.export_activation(venv, &search_path);

        self.transition(BootstrapState::Installing);
        self.host.run_step(
            INSTALL_STEP,
            python::build_pip_install_command(
                &paths::venv_interpreter(venv),
                &config.package.spec,
            ),
        )
    }

    /// Run the wrapped tool and map its outcome to an exit code.
    pub fn delegate(&mut self, interpreter: &Path) -> Result<u8, BootstrapError> {
        let report_dir = tempfile::Builder::new()
            .prefix("embedme-")
            .tempdir()
            .map_err(|source| BootstrapError::ReportChannel { source })?;
        let report_file = report_dir.path().join(REPORT_FILE_NAME);

        let tool = &self.config.tool;
        let command = python::build_delegate_command(
            interpreter,
            DelegateRequest {
                entry_module: &tool.entry_module,
                entry_function: &tool.entry_function,
                error_module: &tool.error_module,
                error_class: &tool.error_class,
                program_name: &self.profile.program_name,
                args: &self.profile.forwarded,
                report_file: &report_file,
            },
        );

        self.transition(BootstrapState::Delegated);
        let outcome = self.host.delegate(command, &report_file)?;
        if let DelegateOutcome::DomainError(message) = &outcome {
            error!(target: "embedme::delegate", "{message}");
        }
        Ok(outcome.exit_code())
    }

    fn current_interpreter(&self) -> Option<PathBuf> {
        if let Some(active) = &self.profile.active_venv {
            let interpreter = paths::venv_interpreter(active);
            if self.host.is_executable(&interpreter) {
                return Some(interpreter);
            }
            warn!(
                target: "embedme::bootstrap",
                venv = %active.display(),
                "VIRTUAL_ENV is set but has no executable interpreter"
            );
        }
        self.find_base_interpreter()
    }

    fn find_base_interpreter(&self) -> Option<PathBuf> {
        self.config
            .venv
            .base_python_candidates()
            .iter()
            .find_map(|candidate| self.host.find_interpreter(candidate))
    }

    fn base_interpreter(&self) -> Result<PathBuf, BootstrapError> {
        self.find_base_interpreter()
            .ok_or_else(|| BootstrapError::InterpreterNotFound {
                candidates: self
                    .config
                    .venv
                    .base_python_candidates()
                    .iter()
                    .map(|candidate| candidate.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    fn search_path_with(&self, venv: &Path) -> Result<OsString, BootstrapError> {
        let bin_dir = paths::venv_bin_dir(venv);
        paths::prepend_search_path(&bin_dir, self.profile.search_path.as_ref()).map_err(|err| {
            BootstrapError::SearchPath {
                path: bin_dir.clone(),
                message: err.to_string(),
            }
        })
    }

    fn activation_missing(&self, reason: ActivationMissing) -> Activation {
        info!(
            target: "embedme::bootstrap",
            path = %self.config.venv.path.display(),
            reason = reason.as_str(),
            "EmbedMe venv is not available for activation"
        );
        Activation::Missing(reason)
    }

    fn transition(&mut self, next: BootstrapState) {
        telemetry::emit_transition(self.state, next);
        self.state = next;
    }
}
