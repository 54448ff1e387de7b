//! Daemon lifecycle specs: start/stop/status and the single-instance guard.

use crate::prelude::*;
use serial_test::serial;

#[test]
#[serial]
fn start_status_stop_round_trip() {
    let project = Project::empty();

    // Not running yet
    let stdout = project.hk().args(&["daemon", "status"]).fails_with(1);
    assert!(stdout.contains("NOT RUNNING"), "{stdout}");

    {
        let _daemon = project.daemon();
        let stdout = project.hk().args(&["daemon", "status"]).passes();
        assert!(stdout.contains("RUNNING"), "{stdout}");
        assert!(stdout.contains("pid:"), "{stdout}");
    }

    // Guard dropped; daemon stopped again
    let stdout = project.hk().args(&["daemon", "status"]).fails_with(1);
    assert!(stdout.contains("NOT RUNNING"), "{stdout}");
}

#[test]
#[serial]
fn second_start_reports_already_running_with_exit_3() {
    let project = Project::empty();
    let _daemon = project.daemon();

    let stdout = project.hk().args(&["daemon", "start"]).fails_with(3);
    assert!(stdout.contains("already running"), "{stdout}");
}

#[test]
#[serial]
fn stop_when_not_running_exits_zero() {
    let project = Project::empty();
    let stdout = project.hk().args(&["daemon", "stop"]).passes();
    assert!(stdout.contains("not running"), "{stdout}");
}

#[test]
#[serial]
fn runtime_files_live_under_the_daemon_root() {
    let project = Project::empty();
    let _daemon = project.daemon();

    let untracked = project.path().join(".claude/hooks-daemon/untracked");
    let entries: Vec<String> = std::fs::read_dir(&untracked)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();

    assert!(entries.iter().any(|n| n.ends_with(".sock")), "{entries:?}");
    assert!(entries.iter().any(|n| n.ends_with(".pid")), "{entries:?}");
}

#[test]
#[serial]
fn stop_removes_socket_and_pid_files() {
    let project = Project::empty();
    {
        let _daemon = project.daemon();
    }

    let untracked = project.path().join(".claude/hooks-daemon/untracked");
    let leftover: Vec<String> = std::fs::read_dir(&untracked)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".sock") || n.ends_with(".pid"))
        .collect();
    assert!(leftover.is_empty(), "{leftover:?}");
}

#[test]
#[serial]
fn two_projects_get_independent_daemons() {
    let first = Project::empty();
    let second = Project::empty();
    // Explicit opt-out beats the in-container auto-enable of the
    // process-table guard; the two daemons must coexist.
    first.config("daemon: { enforce_single_daemon_process: false }\n");
    second.config("daemon: { enforce_single_daemon_process: false }\n");

    let _first_daemon = first.daemon();
    let _second_daemon = second.daemon();

    assert!(first.hk().args(&["daemon", "status"]).passes().contains("RUNNING"));
    assert!(second.hk().args(&["daemon", "status"]).passes().contains("RUNNING"));

    // Stopping one leaves the other untouched
    first.hk().args(&["daemon", "stop"]).passes();
    first.hk().args(&["daemon", "status"]).fails_with(1);
    assert!(second.hk().args(&["daemon", "status"]).passes().contains("RUNNING"));
}

#[test]
#[serial]
fn hkd_rejects_unknown_arguments() {
    let output = std::process::Command::new(hkd_binary())
        .arg("--frobnicate")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn hkd_version_prints_without_a_project() {
    let output = std::process::Command::new(hkd_binary())
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("hkd "));
}
