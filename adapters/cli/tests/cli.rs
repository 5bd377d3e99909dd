use std::process::Command;

#[test]
fn headless_run_prints_a_summary() {
    let output = Command::new(env!("CARGO_BIN_EXE_gridfort"))
        .args(["--seconds", "5", "--seed", "7"])
        .output()
        .expect("failed to launch the gridfort binary");

    assert!(output.status.success(), "gridfort should exit cleanly");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("core standing after 5s"), "unexpected summary: {stdout}");
}

#[test]
fn snapshot_file_resumes_the_run() {
    let path = std::env::temp_dir().join(format!("gridfort-cli-{}.json", std::process::id()));
    let first = Command::new(env!("CARGO_BIN_EXE_gridfort"))
        .args(["--seconds", "3", "--snapshot"])
        .arg(&path)
        .status()
        .expect("failed to launch the gridfort binary");
    assert!(first.success());

    let resumed = Command::new(env!("CARGO_BIN_EXE_gridfort"))
        .args(["--seconds", "2", "--resume"])
        .arg(&path)
        .output()
        .expect("failed to launch the gridfort binary");
    let _ = std::fs::remove_file(&path);

    assert!(resumed.status.success());
    let stdout = String::from_utf8_lossy(&resumed.stdout);
    assert!(stdout.contains("core standing after 5s"), "unexpected summary: {stdout}");
}
