//! Shared helpers for building Python interpreter commands.

use std::{
    ffi::{OsStr, OsString},
    path::Path,
    process::Command,
};

use crate::cli::RELAUNCH_ENV;

/// Environment variable through which the delegate shim reports its outcome.
pub const REPORT_FILE_ENV: &str = "EMBEDME_REPORT_FILE";

/// Prints a JSON description of the interpreter and the importable tool modules.
///
/// Arguments: tool module, variant marker module, distribution name.
pub const PROBE_SCRIPT: &str = r#"
import importlib.util, json, sys

def has(name):
    try:
        return importlib.util.find_spec(name) is not None
    except Exception:
        return False

module, marker, distribution = sys.argv[1:4]
version = None
try:
    from importlib.metadata import PackageNotFoundError, version as dist_version
    try:
        version = dist_version(distribution)
    except PackageNotFoundError:
        pass
except ImportError:
    pass

print(json.dumps({
    "prefix": sys.prefix,
    "base_prefix": getattr(sys, "base_prefix", sys.prefix),
    "tool_present": has(module),
    "variant_present": has(module) and has(marker),
    "tool_version": version,
}))
"#;

/// Runs the wrapped tool's entry point and reports domain errors and interrupts.
///
/// Arguments: entry module, entry function, error module, error class,
/// program name, then the forwarded command line.
pub const DELEGATE_SHIM: &str = r#"
import importlib, json, os, sys

def report(payload):
    with open(os.environ["EMBEDME_REPORT_FILE"], "w", encoding="utf-8") as handle:
        json.dump(payload, handle)

entry_module, entry_function, error_module, error_class, program = sys.argv[1:6]
run = getattr(importlib.import_module(entry_module), entry_function)
error = getattr(importlib.import_module(error_module), error_class)
try:
    code = run([program, *sys.argv[6:]])
except error as exc:
    report({"kind": "domain_error", "message": str(exc)})
    sys.exit(1)
except KeyboardInterrupt:
    report({"kind": "interrupted"})
    sys.exit(1)
sys.exit(code)
"#;

pub struct ProbeRequest<'a> {
    pub module: &'a str,
    pub variant_marker: &'a str,
    pub distribution: &'a str,
}

pub struct DelegateRequest<'a> {
    pub entry_module: &'a str,
    pub entry_function: &'a str,
    pub error_module: &'a str,
    pub error_class: &'a str,
    pub program_name: &'a OsStr,
    pub args: &'a [OsString],
    pub report_file: &'a Path,
}

/// Build the interpreter probe command.
pub fn build_probe_command(interpreter: &Path, request: ProbeRequest<'_>) -> Command {
    let mut command = Command::new(interpreter);
    command
        .arg("-c")
        .arg(PROBE_SCRIPT)
        .arg(request.module)
        .arg(request.variant_marker)
        .arg(request.distribution);
    command
}

/// Build `python -m venv` for a new environment.
///
/// pip stays enabled and an existing directory is never cleared.
pub fn build_venv_command(base_python: &Path, venv: &Path, symlinks: bool) -> Command {
    let mut command = Command::new(base_python);
    command.arg("-m").arg("venv");
    if symlinks && cfg!(unix) {
        command.arg("--symlinks");
    }
    command.arg(venv);
    command
}

/// Build `python -m pip install <spec>` against a venv interpreter.
pub fn build_pip_install_command(venv_python: &Path, package_spec: &str) -> Command {
    let mut command = Command::new(venv_python);
    command
        .arg("-m")
        .arg("pip")
        .arg("install")
        .arg(package_spec);
    command
}

/// Build the delegate shim invocation.
pub fn build_delegate_command(interpreter: &Path, request: DelegateRequest<'_>) -> Command {
    let mut command = Command::new(interpreter);
    command
        .env(REPORT_FILE_ENV, request.report_file)
        .env_remove(RELAUNCH_ENV);
    command
        .arg("-c")
        .arg(DELEGATE_SHIM)
        .arg(request.entry_module)
        .arg(request.entry_function)
        .arg(request.error_module)
        .arg(request.error_class)
        .arg(request.program_name)
        .args(request.args);
    command
}

/// Merge stdout/stderr and take at most `limit` characters from the end.
pub fn collect_log_excerpt(stdout: &[u8], stderr: &[u8], limit: usize) -> String {
    let mut combined = Vec::with_capacity(stdout.len() + stderr.len());
    combined.extend_from_slice(stdout);
    combined.extend_from_slice(stderr);
    let text = String::from_utf8_lossy(&combined);
    let text = text.trim_end();
    if text.chars().count() <= limit {
        return text.to_string();
    }
    text.chars()
        .rev()
        .take(limit)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect()
}
