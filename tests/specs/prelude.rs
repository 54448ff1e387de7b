//! Test helpers for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

// Aggressive timeouts for fast tests.
const HK_TIMEOUT_CONNECT_MS: &str = "3000";
const HK_TIMEOUT_EXIT_MS: &str = "1000";
const HK_TIMEOUT_IPC_MS: &str = "1000";
const HK_TIMEOUT_EVENT_MS: &str = "3000";
const HK_CONNECT_POLL_MS: &str = "10";

/// Returns the path to a workspace binary.
///
/// Falls back to resolving relative to the test binary itself when
/// CARGO_MANIFEST_DIR is stale (e.g. a shared target directory).
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

pub fn hk_binary() -> PathBuf {
    binary_path("hk")
}

pub fn hkd_binary() -> PathBuf {
    binary_path("hkd")
}

/// A scratch project with a `.claude/` marker directory.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
        Project { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the project root, creating parents.
    pub fn file(&self, rel: &str, content: &str) {
        let path = self.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// Write an executable script relative to the project root.
    pub fn executable(&self, rel: &str, content: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = self.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }

    pub fn config(&self, yaml: &str) {
        self.file(".claude/hooks-daemon.yaml", yaml);
    }

    /// CLI builder rooted at this project.
    pub fn hk(&self) -> CliBuilder {
        CliBuilder::new().pwd(self.path())
    }

    /// Start a daemon for this project, stopping it again on drop.
    pub fn daemon(&self) -> DaemonGuard {
        let output = self.hk().args(&["daemon", "start"]).run();
        assert!(
            output.status.success(),
            "daemon start failed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        DaemonGuard {
            root: self.path().to_path_buf(),
        }
    }
}

/// Stops the project's daemon when dropped, even on panic.
pub struct DaemonGuard {
    root: PathBuf,
}

impl Drop for DaemonGuard {
    fn drop(&mut self) {
        let _ = CliBuilder::new()
            .pwd(&self.root)
            .args(&["daemon", "stop"])
            .run();
    }
}

/// High-level CLI builder for fluent assertions.
pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
    stdin: Option<String>,
}

impl CliBuilder {
    pub fn new() -> Self {
        CliBuilder {
            args: Vec::new(),
            dir: None,
            envs: vec![
                (
                    "HK_DAEMON_BINARY".into(),
                    hkd_binary().to_string_lossy().into(),
                ),
                ("HK_TIMEOUT_CONNECT_MS".into(), HK_TIMEOUT_CONNECT_MS.into()),
                ("HK_TIMEOUT_EXIT_MS".into(), HK_TIMEOUT_EXIT_MS.into()),
                ("HK_TIMEOUT_IPC_MS".into(), HK_TIMEOUT_IPC_MS.into()),
                ("HK_TIMEOUT_EVENT_MS".into(), HK_TIMEOUT_EVENT_MS.into()),
                ("HK_CONNECT_POLL_MS".into(), HK_CONNECT_POLL_MS.into()),
            ],
            stdin: None,
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn stdin(mut self, input: &str) -> Self {
        self.stdin = Some(input.to_string());
        self
    }

    /// Run the command and collect its output.
    pub fn run(self) -> Output {
        let mut cmd = Command::new(hk_binary());
        cmd.args(&self.args);
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        if let Some(input) = &self.stdin {
            cmd.stdin(Stdio::piped());
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
            let mut child = cmd.spawn().unwrap();
            child
                .stdin
                .take()
                .unwrap()
                .write_all(input.as_bytes())
                .unwrap();
            child.wait_with_output().unwrap()
        } else {
            cmd.stdin(Stdio::null());
            cmd.output().unwrap()
        }
    }

    /// Run, assert success, return stdout.
    pub fn passes(self) -> String {
        let output = self.run();
        assert!(
            output.status.success(),
            "expected success\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Run, assert the given exit code, return stdout.
    pub fn fails_with(self, code: i32) -> String {
        let output = self.run();
        assert_eq!(
            output.status.code(),
            Some(code),
            "stdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }
}

impl Default for CliBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward one event through `hk forward`, returning parsed stdout JSON.
pub fn forward_event(project: &Project, event_type: &str, payload: &str) -> serde_json::Value {
    let stdout = project
        .hk()
        .args(&["forward", event_type])
        .stdin(payload)
        .passes();
    serde_json::from_str(stdout.trim()).unwrap_or_else(|e| {
        panic!("forwarder stdout was not JSON: {e}\nstdout: {stdout:?}");
    })
}
