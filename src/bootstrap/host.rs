use std::{
    env,
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    cli::{LaunchProfile, RELAUNCH_ENV, SEARCH_PATH_ENV, VIRTUAL_ENV},
    lib::{
        errors::BootstrapError,
        paths,
        python::{self, ProbeRequest},
        signals::{self, InterruptGuard},
    },
};

use super::{
    delegate::{read_shim_report, DelegateOutcome},
    environment::RuntimeReport,
    prompt,
};

/// Characters of probe output kept in error messages.
const PROBE_EXCERPT_LIMIT: usize = 2000;

/// Abstraction over the process, filesystem and terminal side effects of the bootstrap.
pub trait RuntimeHost {
    /// Resolve an interpreter name or path to an executable file.
    fn find_interpreter(&self, candidate: &Path) -> Option<PathBuf>;
    fn is_executable(&self, path: &Path) -> bool {
        paths::is_executable_file(path)
    }
    fn probe(
        &self,
        interpreter: &Path,
        request: ProbeRequest<'_>,
    ) -> Result<RuntimeReport, BootstrapError>;
    fn confirm(&self, question: &str) -> Result<bool, BootstrapError>;
    /// Run a setup subprocess to completion; a non-zero exit is an error.
    fn run_step(&self, step: &'static str, command: Command) -> Result<(), BootstrapError>;
    /// Mark `venv` active in this process's environment.
    fn export_activation(&self, venv: &Path, search_path: &OsStr);
    /// Re-run this launcher inside `venv`. Does not return on success where `exec` exists.
    fn relaunch(
        &self,
        venv: &Path,
        search_path: &OsStr,
        profile: &LaunchProfile,
    ) -> Result<u8, BootstrapError>;
    fn delegate(
        &self,
        command: Command,
        report_file: &Path,
    ) -> Result<DelegateOutcome, BootstrapError>;
}

/// Host that operates against the real process and filesystem.
pub struct SystemRuntimeHost;

impl RuntimeHost for SystemRuntimeHost {
    fn find_interpreter(&self, candidate: &Path) -> Option<PathBuf> {
        if candidate.components().count() > 1 || candidate.is_absolute() {
            return paths::is_executable_file(candidate).then(|| candidate.to_path_buf());
        }
        which::which(candidate).ok()
    }

    fn probe(
        &self,
        interpreter: &Path,
        request: ProbeRequest<'_>,
    ) -> Result<RuntimeReport, BootstrapError> {
        let output = python::build_probe_command(interpreter, request)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| BootstrapError::spawn(interpreter, err))?;
        if !output.status.success() {
            return Err(BootstrapError::CommandFailed {
                step: "interpreter probe",
                exit_code: output.status.code(),
                message: python::collect_log_excerpt(
                    &output.stdout,
                    &output.stderr,
                    PROBE_EXCERPT_LIMIT,
                ),
            });
        }
        RuntimeReport::from_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    fn confirm(&self, question: &str) -> Result<bool, BootstrapError> {
        let _guard = InterruptGuard::exit_on_interrupt();
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stderr();
        prompt::read_confirmation(question, &mut input, &mut output)
            .map_err(|source| BootstrapError::Prompt { source })
    }

    fn run_step(&self, step: &'static str, mut command: Command) -> Result<(), BootstrapError> {
        let status = command
            .stdin(Stdio::null())
            .status()
            .map_err(|err| BootstrapError::spawn(command.get_program(), err))?;
        if status.success() {
            return Ok(());
        }
        Err(BootstrapError::CommandFailed {
            step,
            exit_code: status.code(),
            message: "see the output above".into(),
        })
    }

    fn export_activation(&self, venv: &Path, search_path: &OsStr) {
        env::set_var(VIRTUAL_ENV, venv);
        env::set_var(SEARCH_PATH_ENV, search_path);
    }

    fn relaunch(
        &self,
        venv: &Path,
        search_path: &OsStr,
        profile: &LaunchProfile,
    ) -> Result<u8, BootstrapError> {
        let relaunch_error = |source| BootstrapError::Relaunch {
            path: venv.to_path_buf(),
            source,
        };
        let launcher = env::current_exe().map_err(relaunch_error)?;
        let mut command = Command::new(launcher);
        command
            .args(&profile.forwarded)
            .env(VIRTUAL_ENV, venv)
            .env(SEARCH_PATH_ENV, search_path)
            .env(RELAUNCH_ENV, "1");

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt as _;
            command.arg0(&profile.program_name);
            let err = command.exec();
            return Err(relaunch_error(err));
        }
        #[cfg(not(unix))]
        {
            let status = command.status().map_err(relaunch_error)?;
            return Ok(status
                .code()
                .and_then(|code| u8::try_from(code).ok())
                .unwrap_or(super::delegate::FAILURE_EXIT_CODE));
        }
    }

    fn delegate(
        &self,
        mut command: Command,
        report_file: &Path,
    ) -> Result<DelegateOutcome, BootstrapError> {
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt as _;
            unsafe {
                command.pre_exec(|| {
                    signals::restore_default_interrupt();
                    Ok(())
                });
            }
        }

        let status = {
            let _guard = InterruptGuard::ignore();
            command
                .status()
                .map_err(|err| BootstrapError::spawn(command.get_program(), err))?
        };
        let report = read_shim_report(report_file)?;
        Ok(DelegateOutcome::from_parts(
            status.code(),
            signals::terminated_by_interrupt(&status),
            report,
        ))
    }
}
