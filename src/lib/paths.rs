//! Path helpers for virtual environment layout and executable lookup.

use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Environment variable name for user home directory.
const HOME_ENV: &str = "HOME";
/// Fallback home variable on Windows.
const USERPROFILE_ENV: &str = "USERPROFILE";

/// Returns true if the path is non-empty and absolute.
pub fn is_nonempty_absolute(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_absolute()
}

/// Resolve the current user's home directory from the environment.
pub fn resolve_home_dir() -> Result<PathBuf, &'static str> {
    resolve_home_dir_from(env::var_os(HOME_ENV), env::var_os(USERPROFILE_ENV))
}

fn resolve_home_dir_from(
    home: Option<OsString>,
    user_profile: Option<OsString>,
) -> Result<PathBuf, &'static str> {
    home.filter(|value| !value.is_empty())
        .or(user_profile.filter(|value| !value.is_empty()))
        .map(PathBuf::from)
        .ok_or("HOME and USERPROFILE are both unset")
}

/// Directory holding a venv's executables.
pub fn venv_bin_dir(venv: &Path) -> PathBuf {
    #[cfg(windows)]
    return venv.join("Scripts");
    #[cfg(not(windows))]
    return venv.join("bin");
}

/// Interpreter location inside a venv.
pub fn venv_interpreter(venv: &Path) -> PathBuf {
    #[cfg(windows)]
    return venv_bin_dir(venv).join("python.exe");
    #[cfg(not(windows))]
    return venv_bin_dir(venv).join("python");
}

/// Build a `PATH` value with `dir` placed first.
pub fn prepend_search_path(dir: &Path, current: Option<&OsString>) -> Result<OsString, env::JoinPathsError> {
    let mut entries = vec![dir.to_path_buf()];
    if let Some(current) = current {
        entries.extend(env::split_paths(current).filter(|entry| entry != dir));
    }
    env::join_paths(entries)
}

/// Returns true if `path` is a regular file the current user may execute.
#[cfg(unix)]
pub fn is_executable_file(path: &Path) -> bool {
    use std::{ffi::CString, os::unix::ffi::OsStrExt};

    if !path.is_file() {
        return false;
    }
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    unsafe { libc::access(c_path.as_ptr(), libc::X_OK) == 0 }
}

#[cfg(not(unix))]
pub fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}
