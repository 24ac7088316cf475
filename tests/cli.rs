use assert_cmd::Command;

#[test]
fn help_mentions_race_and_practice_flags() {
    let mut cmd = Command::cargo_bin("keyrace").unwrap();
    let assert = cmd.arg("--help").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(out.contains("--race"));
    assert!(out.contains("--history"));
    assert!(out.contains("--bot-wpm"));
}

#[test]
fn refuses_to_run_tui_without_a_tty() {
    let mut cmd = Command::cargo_bin("keyrace").unwrap();
    let assert = cmd.assert().failure();
    let err = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(err.contains("tty"));
}
