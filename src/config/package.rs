use std::path::Path;

use serde::Deserialize;

use crate::lib::errors::ConfigError;

pub const DEFAULT_PACKAGE_SPEC: &str = "esphome-embedme";
pub const DEFAULT_DISTRIBUTION: &str = "esphome";
pub const DEFAULT_TOOL_MODULE: &str = "esphome";
pub const DEFAULT_VARIANT_MARKER: &str = "esphome.embedme";
pub const DEFAULT_ENTRY_MODULE: &str = "esphome.__main__";
pub const DEFAULT_ENTRY_FUNCTION: &str = "run_esphome";
pub const DEFAULT_ERROR_MODULE: &str = "esphome.core";
pub const DEFAULT_ERROR_CLASS: &str = "EsphomeError";

/// Package installed into the venv and the version it must report.
#[derive(Debug, Clone)]
pub struct PackageSection {
    pub spec: String,
    pub distribution: String,
    pub required_version: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawPackageSection {
    pub spec: Option<String>,
    pub distribution: Option<String>,
    pub required_version: Option<String>,
}

/// Python names of the wrapped tool.
#[derive(Debug, Clone)]
pub struct ToolSection {
    pub module: String,
    pub variant_marker: String,
    pub entry_module: String,
    pub entry_function: String,
    pub error_module: String,
    pub error_class: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawToolSection {
    pub module: Option<String>,
    pub variant_marker: Option<String>,
    pub entry_module: Option<String>,
    pub entry_function: Option<String>,
    pub error_module: Option<String>,
    pub error_class: Option<String>,
}

pub fn parse_package_section(
    raw: Option<RawPackageSection>,
    path: &Path,
) -> Result<PackageSection, ConfigError> {
    let package_raw = raw.unwrap_or_default();

    let spec = package_raw
        .spec
        .unwrap_or_else(|| DEFAULT_PACKAGE_SPEC.to_string());
    validate_not_blank(path, "package.spec", &spec)?;

    let distribution = package_raw
        .distribution
        .unwrap_or_else(|| DEFAULT_DISTRIBUTION.to_string());
    validate_not_blank(path, "package.distribution", &distribution)?;

    let required_version = package_raw
        .required_version
        .map(|version| version.trim().to_string())
        .filter(|version| !version.is_empty());

    Ok(PackageSection {
        spec: spec.trim().to_string(),
        distribution: distribution.trim().to_string(),
        required_version,
    })
}

pub fn parse_tool_section(
    raw: Option<RawToolSection>,
    path: &Path,
) -> Result<ToolSection, ConfigError> {
    let tool_raw = raw.unwrap_or_default();
    let pick = |value: Option<String>, default: &str, field: &'static str| {
        let value = value.unwrap_or_else(|| default.to_string());
        validate_dotted_name(path, field, &value)?;
        Ok::<_, ConfigError>(value)
    };

    let module = pick(tool_raw.module, DEFAULT_TOOL_MODULE, "tool.module")?;
    let variant_marker = pick(
        tool_raw.variant_marker,
        DEFAULT_VARIANT_MARKER,
        "tool.variant_marker",
    )?;
    if !variant_marker.starts_with(&format!("{module}.")) {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "tool.variant_marker",
            message: format!("Must be a submodule of `{module}`"),
        });
    }

    Ok(ToolSection {
        module,
        variant_marker,
        entry_module: pick(
            tool_raw.entry_module,
            DEFAULT_ENTRY_MODULE,
            "tool.entry_module",
        )?,
        entry_function: pick(
            tool_raw.entry_function,
            DEFAULT_ENTRY_FUNCTION,
            "tool.entry_function",
        )?,
        error_module: pick(
            tool_raw.error_module,
            DEFAULT_ERROR_MODULE,
            "tool.error_module",
        )?,
        error_class: pick(tool_raw.error_class, DEFAULT_ERROR_CLASS, "tool.error_class")?,
    })
}

fn validate_not_blank(path: &Path, field: &'static str, value: &str) -> Result<(), ConfigError> {
    if !value.trim().is_empty() {
        return Ok(());
    }

    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field,
        message: "Value must not be empty".into(),
    })
}

/// Accepts `name` or `package.module` style Python identifiers.
fn validate_dotted_name(path: &Path, field: &'static str, value: &str) -> Result<(), ConfigError> {
    let valid = !value.is_empty()
        && value.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(first) if first == '_' || first.is_ascii_alphabetic())
                && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        });
    if valid {
        return Ok(());
    }

    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field,
        message: format!("`{value}` is not a Python module or attribute name"),
    })
}
