use std::{path::Path, process::Command};

fn frenzy() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_frenzy"));
    let _ = command.current_dir(env!("CARGO_MANIFEST_DIR"));
    command
}

#[test]
fn bundled_arena_runs_to_completion() {
    let config = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/arena.toml");
    let output = frenzy()
        .arg("--config")
        .arg(&config)
        .args(["--ticks", "200", "--seed", "7"])
        .output()
        .expect("failed to run frenzy");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ticks simulated:   200"), "{stdout}");
    assert!(stdout.contains("player: "), "{stdout}");
}

#[test]
fn missing_config_fails_with_context() {
    let output = frenzy()
        .args(["--config", "does/not/exist.toml", "--ticks", "1"])
        .output()
        .expect("failed to run frenzy");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read arena config"), "{stderr}");
}

#[test]
fn zero_level_is_rejected() {
    let output = frenzy()
        .args(["--level", "0"])
        .output()
        .expect("failed to run frenzy");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("player level must be positive"));
}
