// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path and project-root resolution.
//!
//! All five daemon paths are derived from one signal (the caller's working
//! directory), resolved once at startup and frozen thereafter. Two daemons
//! whose project roots differ get disjoint socket/PID/log paths, which is
//! what keeps worktree daemons from colliding with the main checkout's.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Portable ceiling for `sun_path` on the platforms we run on.
pub const SOCKET_PATH_MAX: usize = 108;

/// Name of the per-project marker directory.
const MARKER_DIR: &str = ".claude";
/// Directory under the project root that holds the daemon installation.
const INSTALL_DIR: &str = "hooks-daemon";
/// Subdirectory of the daemon root holding runtime files (gitignored).
const UNTRACKED_DIR: &str = "untracked";
/// Config file name, committed under the marker directory.
const CONFIG_FILE: &str = "hooks-daemon.yaml";

#[derive(Debug, Error)]
pub enum PathError {
    #[error("no {MARKER_DIR}/ directory found in {0} or any ancestor")]
    NoProjectRoot(PathBuf),

    #[error(
        "nested installation: {child} lives inside the daemon root {parent}; \
         refusing to start a second daemon there"
    )]
    NestedInstallation { child: PathBuf, parent: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The five paths the daemon owns, plus the roots they derive from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonPaths {
    pub project_root: PathBuf,
    pub daemon_root: PathBuf,
    pub socket_path: PathBuf,
    pub pid_path: PathBuf,
    pub log_path: PathBuf,
    pub config_path: PathBuf,
}

impl DaemonPaths {
    /// Resolve all paths from a working directory.
    ///
    /// `self_install` comes from the project config and collapses the daemon
    /// root onto the project root (used when this repository *is* the daemon
    /// checkout rather than a consumer of it).
    pub fn resolve(cwd: &Path, self_install: bool) -> Result<Self, PathError> {
        let env_root = std::env::var_os("DAEMON_ROOT_DIR").map(PathBuf::from);

        // With an explicit root override the project walk is best-effort:
        // the override is the isolation mechanism, the project root only
        // locates the config file.
        let project_root = match (find_project_root(cwd), env_root.is_some()) {
            (Ok(root), _) => root,
            (Err(_), true) => cwd.to_path_buf(),
            (Err(e), false) => return Err(e),
        };

        reject_nested(&project_root)?;

        let daemon_root = match env_root {
            Some(root) => root,
            None if self_install => project_root.clone(),
            None => project_root.join(MARKER_DIR).join(INSTALL_DIR),
        };

        let runtime = daemon_root.join(UNTRACKED_DIR);
        let host = host_id();
        let pid_path = runtime.join(format!("daemon-{host}.pid"));
        let log_path = runtime.join(format!("daemon-{host}.log"));
        let socket_path = resolve_socket_path(&runtime, &host, &project_root);

        Ok(DaemonPaths {
            config_path: config_path(&project_root),
            project_root,
            daemon_root,
            socket_path,
            pid_path,
            log_path,
        })
    }
}

/// Committed config file location for a project root.
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(MARKER_DIR).join(CONFIG_FILE)
}

/// Walk up from `cwd` to the nearest ancestor containing a `.claude/`
/// directory.
pub fn find_project_root(cwd: &Path) -> Result<PathBuf, PathError> {
    let mut dir = Some(cwd);
    while let Some(d) = dir {
        if d.join(MARKER_DIR).is_dir() {
            return Ok(d.to_path_buf());
        }
        dir = d.parent();
    }
    Err(PathError::NoProjectRoot(cwd.to_path_buf()))
}

/// Refuse project roots that sit inside another project's daemon root.
///
/// A checkout under `…/.claude/hooks-daemon/…` means someone installed a
/// project inside the installation directory of another one; starting a
/// daemon there would nest runtime trees and shadow the outer daemon.
fn reject_nested(project_root: &Path) -> Result<(), PathError> {
    for dir in project_root.ancestors().skip(1) {
        let is_install = dir.file_name().is_some_and(|n| n == INSTALL_DIR)
            && dir
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|n| n == MARKER_DIR);
        if is_install {
            return Err(PathError::NestedInstallation {
                child: project_root.to_path_buf(),
                parent: dir.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Socket path, with override and over-length fallback handling.
///
/// `HOOKS_SOCKET_PATH` wins outright. Otherwise the primary path lives next
/// to the PID file; if it exceeds the `sun_path` ceiling the socket (and
/// only the socket) falls back to a short, project-stable location.
fn resolve_socket_path(runtime: &Path, host: &str, project_root: &Path) -> PathBuf {
    if let Some(path) = std::env::var_os("HOOKS_SOCKET_PATH") {
        return PathBuf::from(path);
    }

    let primary = runtime.join(format!("daemon-{host}.sock"));
    if primary.as_os_str().len() <= SOCKET_PATH_MAX {
        return primary;
    }

    let name = format!("hooks-daemon-{}.sock", project_hash(project_root));
    for base in fallback_dirs() {
        let candidate = base.join(&name);
        if candidate.as_os_str().len() <= SOCKET_PATH_MAX {
            return candidate;
        }
    }
    PathBuf::from("/tmp").join(name)
}

/// Fallback bases, most specific first.
fn fallback_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(xdg) = std::env::var_os("XDG_RUNTIME_DIR") {
        dirs.push(PathBuf::from(xdg));
    }
    let uid = nix::unistd::Uid::current();
    let run_user = PathBuf::from(format!("/run/user/{uid}"));
    if run_user.is_dir() {
        dirs.push(run_user);
    }
    dirs.push(PathBuf::from("/tmp"));
    dirs
}

/// Short stable host discriminator for runtime file names.
///
/// Distinct project roots already keep daemons apart; the host id only
/// disambiguates shared filesystems (e.g. a home directory mounted on
/// several machines).
fn host_id() -> String {
    let hostname = nix::unistd::gethostname()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string());
    short_hash(hostname.as_bytes(), 8)
}

/// Stable per-project hash used by the socket fallback names.
fn project_hash(project_root: &Path) -> String {
    short_hash(project_root.as_os_str().as_encoded_bytes(), 12)
}

fn short_hash(input: &[u8], len: usize) -> String {
    let digest = Sha256::digest(input);
    let mut out = String::with_capacity(len);
    for byte in digest.iter() {
        if out.len() >= len {
            break;
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out.truncate(len);
    out
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
