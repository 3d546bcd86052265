use std::{io, path::PathBuf};

use config::ConfigError as ConfigLoaderError;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to build (read) the configuration sources.
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize the merged sources into a struct.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Required value is missing and has no default.
    #[error("Configuration file {path} is missing `{field}`")]
    MissingField { path: PathBuf, field: &'static str },
    /// Field failed validation.
    #[error("Configuration file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

/// Failures that end the bootstrap sequence with exit code 1.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(
        "The active virtual environment {prefix} has a different `{module}` installed; \
         run EmbedMe from a venv with the EmbedMe build of {module}"
    )]
    EnvironmentMismatch { prefix: PathBuf, module: String },
    #[error("No Python interpreter found (tried {candidates})")]
    InterpreterNotFound { candidates: String },
    #[error("Creation of the EmbedMe venv in {path} was declined")]
    CreationDeclined { path: PathBuf },
    #[error("Failed to read the answer from standard input: {source}")]
    Prompt {
        #[source]
        source: io::Error,
    },
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{step} exited abnormally (exit={exit_code:?}): {message}")]
    CommandFailed {
        step: &'static str,
        exit_code: Option<i32>,
        message: String,
    },
    #[error("Interpreter probe returned an unreadable report: {message}")]
    Probe { message: String },
    #[error("The EmbedMe venv in {path} has no usable interpreter after creation")]
    ActivationUnavailable { path: PathBuf },
    #[error("Failed to relaunch inside the EmbedMe venv {path}: {source}")]
    Relaunch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Relaunched inside {path} but the environment is still not usable")]
    StillUnverified { path: PathBuf },
    #[error("Cannot place {path} on PATH: {message}")]
    SearchPath { path: PathBuf, message: String },
    #[error("Failed to prepare the delegate report channel: {source}")]
    ReportChannel {
        #[source]
        source: io::Error,
    },
}

impl BootstrapError {
    /// Helper for spawn failures of a named program.
    pub fn spawn(program: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}
