//! Tests for the `labsched init` command

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn labsched_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_labsched"))
}

#[test]
fn init_writes_default_config() {
    let dir = tempdir().unwrap();

    let output = Command::new(labsched_binary())
        .current_dir(dir.path())
        .arg("init")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Created: labsched.toml"));

    let content = fs::read_to_string(dir.path().join("labsched.toml")).unwrap();
    assert!(content.contains("target_building"));
    assert!(content.contains("first_hour = 6"));
    assert!(content.contains("[labs]"));
    assert!(content.contains("LABORATORIO GEIO CAP(25)"));
}

#[test]
fn init_config_is_loadable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("conf").with_extension("toml");

    let output = Command::new(labsched_binary())
        .arg("init")
        .arg(&path)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let content = fs::read_to_string(&path).unwrap();
    let config = labsched_core::Config::from_toml_str(&content).unwrap();
    assert_eq!(config, labsched_core::Config::default());
}

#[test]
fn init_refuses_overwrite() {
    let dir = tempdir().unwrap();
    let existing = dir.path().join("labsched.toml");
    fs::write(&existing, "# existing").unwrap();

    let output = Command::new(labsched_binary())
        .arg("init")
        .arg(&existing)
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already exists"), "Should say file already exists");
    assert_eq!(fs::read_to_string(&existing).unwrap(), "# existing");
}

#[test]
fn init_force_overwrites() {
    let dir = tempdir().unwrap();
    let existing = dir.path().join("labsched.toml");
    fs::write(&existing, "# existing").unwrap();

    let output = Command::new(labsched_binary())
        .arg("init")
        .arg(&existing)
        .arg("--force")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(fs::read_to_string(&existing).unwrap().contains("[labs]"));
}
