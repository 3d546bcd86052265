use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::lib::{errors::ConfigError, paths};

/// Location of the EmbedMe venv relative to the home directory.
pub const DEFAULT_VENV_DIR: &[&str] = &[".embedme", "venv"];
/// Interpreters tried, in order, when `venv.base_python` is unset.
pub const DEFAULT_BASE_PYTHONS: &[&str] = &["python3", "python"];

/// Virtual environment settings.
#[derive(Debug, Clone)]
pub struct VenvSection {
    pub path: PathBuf,
    pub base_python: Option<PathBuf>,
    pub symlinks: bool,
}

impl VenvSection {
    /// Interpreter names or paths used to build the venv, in lookup order.
    pub fn base_python_candidates(&self) -> Vec<PathBuf> {
        match &self.base_python {
            Some(explicit) => vec![explicit.clone()],
            None => DEFAULT_BASE_PYTHONS.iter().map(PathBuf::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawVenvSection {
    pub path: Option<PathBuf>,
    pub base_python: Option<PathBuf>,
    pub symlinks: Option<bool>,
}

pub fn parse_venv_section(
    raw: Option<RawVenvSection>,
    path: &Path,
) -> Result<VenvSection, ConfigError> {
    let venv_raw = raw.unwrap_or_default();

    let venv_path = match venv_raw.path {
        Some(explicit) => explicit,
        None => default_venv_path().ok_or(ConfigError::MissingField {
            path: path.to_path_buf(),
            field: "venv.path",
        })?,
    };
    validate_venv_path(path, &venv_path)?;

    if let Some(base_python) = &venv_raw.base_python {
        validate_base_python(path, base_python)?;
    }

    Ok(VenvSection {
        path: venv_path,
        base_python: venv_raw.base_python,
        symlinks: venv_raw.symlinks.unwrap_or(true),
    })
}

fn default_venv_path() -> Option<PathBuf> {
    let home = paths::resolve_home_dir().ok()?;
    Some(DEFAULT_VENV_DIR.iter().fold(home, |acc, part| acc.join(part)))
}

fn validate_venv_path(path: &Path, venv_path: &Path) -> Result<(), ConfigError> {
    if paths::is_nonempty_absolute(venv_path) {
        return Ok(());
    }

    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field: "venv.path",
        message: format!("Only absolute paths are allowed: {}", venv_path.display()),
    })
}

fn validate_base_python(path: &Path, base_python: &Path) -> Result<(), ConfigError> {
    if !base_python.as_os_str().is_empty() {
        return Ok(());
    }

    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field: "venv.base_python",
        message: "Set an interpreter name or path, or remove the key".into(),
    })
}
