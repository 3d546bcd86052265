use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::{Context, Result};
use tempfile::TempDir;

pub const BINARY_PATH: &str = env!("CARGO_BIN_EXE_embedme");

pub fn fixture(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

/// Probe output as printed by the interpreter probe.
pub fn probe_json(in_venv: bool, tool_present: bool, variant_present: bool) -> String {
    let prefix = if in_venv { "/venvs/active" } else { "/usr" };
    format!(
        r#"{{"prefix": "{prefix}", "base_prefix": "/usr", "tool_present": {tool_present}, "variant_present": {variant_present}, "tool_version": null}}"#
    )
}

/// Scratch directory with a config file, a mock base interpreter and a call log.
pub struct Sandbox {
    temp: TempDir,
}

impl Sandbox {
    pub fn new() -> Result<Self> {
        let sandbox = Self {
            temp: tempfile::tempdir().context("failed to create sandbox")?,
        };
        sandbox.install_interpreter(&sandbox.base_python())?;
        let config = format!(
            "[venv]\npath = \"{}\"\nbase_python = \"{}\"\n",
            sandbox.embedme_venv().display(),
            sandbox.base_python().display()
        );
        fs::write(sandbox.config_path(), config).context("failed to write config")?;
        Ok(sandbox)
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn base_python(&self) -> PathBuf {
        self.root().join("system/bin/python3")
    }

    pub fn embedme_venv(&self) -> PathBuf {
        self.root().join("embedme-venv")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("config.toml")
    }

    pub fn log_path(&self) -> PathBuf {
        self.root().join("python-calls.log")
    }

    /// Copy the mock interpreter to `path` and make it executable.
    pub fn install_interpreter(&self, path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::copy(fixture("tests/fixtures/mock-python.sh"), path)
            .with_context(|| format!("failed to install mock python at {}", path.display()))?;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("failed to chmod {}", path.display()))?;
        Ok(())
    }

    /// Launcher command isolated from the caller's venv and config.
    pub fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(BINARY_PATH);
        command
            .args(args)
            .env_remove("VIRTUAL_ENV")
            .env_remove("EMBEDME_RELAUNCHED")
            .env_remove("RUST_LOG")
            .env("EMBEDME_LOG", "warn")
            .env("EMBEDME_CONFIG_PATH", self.config_path())
            .env("MOCK_PYTHON_LOG", self.log_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    pub fn log_lines(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
