use std::{io::Write, process::Stdio};

use anyhow::{Context, Result};

use crate::common::{probe_json, Sandbox};

const QUESTION: &str = "Do you want to create a venv(y/n)?";

#[test]
fn verified_runtime_propagates_tool_exit_code() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let active = sandbox.root().join("active-venv");
    sandbox.install_interpreter(&active.join("bin/python"))?;

    let output = sandbox
        .command(&["run", "kitchen.yaml"])
        .env("VIRTUAL_ENV", &active)
        .env("MOCK_PROBE_JSON", probe_json(true, true, true))
        .env("MOCK_TOOL_EXIT", "3")
        .output()
        .context("failed to run launcher")?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(3), "stderr: {stderr}");
    assert_eq!(sandbox.log_lines(), ["probe", "delegate run kitchen.yaml"]);
    assert!(!stderr.contains(QUESTION), "no prompt expected: {stderr}");
    assert!(!sandbox.embedme_venv().exists());
    Ok(())
}

#[test]
fn launcher_flags_are_forwarded() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let active = sandbox.root().join("active-venv");
    sandbox.install_interpreter(&active.join("bin/python"))?;

    let output = sandbox
        .command(&["--help", "--version"])
        .env("VIRTUAL_ENV", &active)
        .env("MOCK_PROBE_JSON", probe_json(true, true, true))
        .output()
        .context("failed to run launcher")?;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(sandbox.log_lines(), ["probe", "delegate --help --version"]);
    Ok(())
}

#[test]
fn domain_error_exits_one_and_is_logged_once() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let active = sandbox.root().join("active-venv");
    sandbox.install_interpreter(&active.join("bin/python"))?;
    let message = "Invalid YAML syntax at line 3";

    let output = sandbox
        .command(&["config", "broken.yaml"])
        .env("VIRTUAL_ENV", &active)
        .env("MOCK_PROBE_JSON", probe_json(true, true, true))
        .env("MOCK_TOOL_ERROR", message)
        .output()
        .context("failed to run launcher")?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "stderr: {stderr}");
    assert_eq!(stderr.matches(message).count(), 1, "stderr: {stderr}");
    Ok(())
}

#[test]
fn declined_prompt_exits_one_without_installing() -> Result<()> {
    let sandbox = Sandbox::new()?;

    let output = sandbox
        .command(&["run", "kitchen.yaml"])
        .env("MOCK_PROBE_JSON", probe_json(false, false, false))
        .output()
        .context("failed to run launcher")?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "stderr: {stderr}");
    assert_eq!(stderr.matches(QUESTION).count(), 1, "stderr: {stderr}");
    assert!(stderr.contains("declined"), "stderr: {stderr}");
    assert_eq!(sandbox.log_lines(), ["probe"]);
    assert!(!sandbox.embedme_venv().exists());
    Ok(())
}

#[test]
fn accepted_prompt_creates_installs_and_relaunches() -> Result<()> {
    let sandbox = Sandbox::new()?;

    let mut child = sandbox
        .command(&["run", "kitchen.yaml"])
        .stdin(Stdio::piped())
        .env("MOCK_PROBE_JSON", probe_json(false, false, false))
        .env("MOCK_PROBE_VENV_JSON", probe_json(true, true, true))
        .env("MOCK_TOOL_EXIT", "5")
        .spawn()
        .context("failed to spawn launcher")?;
    child
        .stdin
        .take()
        .context("launcher stdin")?
        .write_all(b"y\n")
        .context("failed to answer the prompt")?;
    let output = child.wait_with_output().context("launcher did not finish")?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(5), "stderr: {stderr}");
    assert_eq!(
        sandbox.log_lines(),
        [
            "probe".to_string(),
            format!("venv --symlinks {}", sandbox.embedme_venv().display()),
            "pip install esphome-embedme".to_string(),
            "probe".to_string(),
            "delegate run kitchen.yaml".to_string(),
        ]
    );
    assert!(sandbox.embedme_venv().join("bin/python").exists());
    Ok(())
}

#[test]
fn installer_failure_is_fatal() -> Result<()> {
    let sandbox = Sandbox::new()?;

    let output = sandbox
        .command(&["run", "kitchen.yaml"])
        .env("EMBEDME_PROMPT__ASSUME_YES", "true")
        .env("MOCK_PROBE_JSON", probe_json(false, false, false))
        .env("MOCK_PIP_EXIT", "2")
        .output()
        .context("failed to run launcher")?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "stderr: {stderr}");
    assert!(stderr.contains("pip install exited abnormally"), "stderr: {stderr}");
    assert!(!stderr.contains(QUESTION), "assume_yes must skip the prompt: {stderr}");
    let lines = sandbox.log_lines();
    assert_eq!(lines.last().map(String::as_str), Some("pip install esphome-embedme"));
    assert!(!lines.iter().any(|line| line.starts_with("delegate")));
    Ok(())
}

#[test]
fn mismatched_embedme_venv_stops_after_one_relaunch() -> Result<()> {
    let sandbox = Sandbox::new()?;
    sandbox.install_interpreter(&sandbox.embedme_venv().join("bin/python"))?;

    let output = sandbox
        .command(&["run", "kitchen.yaml"])
        .env("MOCK_PROBE_JSON", probe_json(false, false, false))
        .env("MOCK_PROBE_VENV_JSON", probe_json(true, true, false))
        .output()
        .context("failed to run launcher")?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "stderr: {stderr}");
    assert!(stderr.contains("still not usable"), "stderr: {stderr}");
    assert!(!stderr.contains(QUESTION), "stderr: {stderr}");
    assert_eq!(sandbox.log_lines(), ["probe", "probe"]);
    Ok(())
}

#[test]
fn broken_active_interpreter_falls_through_to_activation() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let sandbox = Sandbox::new()?;
    sandbox.install_interpreter(&sandbox.embedme_venv().join("bin/python"))?;
    let broken = sandbox.root().join("broken-venv");
    let broken_python = broken.join("bin/python");
    std::fs::create_dir_all(broken.join("bin")).context("failed to create broken venv")?;
    std::fs::write(&broken_python, "#!/bin/sh\nexit 1\n").context("failed to write python")?;
    std::fs::set_permissions(&broken_python, std::fs::Permissions::from_mode(0o755))
        .context("failed to chmod python")?;

    let output = sandbox
        .command(&["--", "run", "kitchen.yaml"])
        .env("VIRTUAL_ENV", &broken)
        .env("MOCK_PROBE_VENV_JSON", probe_json(true, true, true))
        .env("MOCK_TOOL_EXIT", "4")
        .output()
        .context("failed to run launcher")?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(4), "stderr: {stderr}");
    assert!(!stderr.contains(QUESTION), "stderr: {stderr}");
    assert_eq!(sandbox.log_lines(), ["probe", "delegate -- run kitchen.yaml"]);
    Ok(())
}

#[test]
fn invalid_config_file_is_reported() -> Result<()> {
    let sandbox = Sandbox::new()?;
    std::fs::write(sandbox.config_path(), "[venv]\npath = \"relative/venv\"\n")
        .context("failed to rewrite config")?;

    let output = sandbox
        .command(&["run"])
        .output()
        .context("failed to run launcher")?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "stderr: {stderr}");
    assert!(stderr.contains("venv.path"), "stderr: {stderr}");
    assert!(sandbox.log_lines().is_empty());
    Ok(())
}
