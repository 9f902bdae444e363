//! Thin boundary around the `git` executable
//!
//! Repository metadata is fetched through the [`Git`] trait so tests can
//! substitute canned output for real subprocess calls. [`NativeGit`] is the
//! production implementation, spawning `git` with a working directory and
//! mapping well-known failure modes to typed errors.

use std::path::Path;
use std::process::Command;

use crate::error::GitContextError;

/// Captured result of a git invocation
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub stdout: String,
    pub exit_code: i32,
}

/// Abstraction over running git commands in a repository
pub trait Git {
    /// Run `git <args>` in `cwd`, treating any exit code in `ok_codes` as
    /// success
    fn run_with_ok_codes(
        &self,
        cwd: &Path,
        args: &[&str],
        ok_codes: &[i32],
    ) -> Result<GitOutput, GitContextError>;

    /// Run `git <args>` in `cwd`, expecting exit code 0
    fn run(&self, cwd: &Path, args: &[&str]) -> Result<String, GitContextError> {
        Ok(self.run_with_ok_codes(cwd, args, &[0])?.stdout)
    }
}

/// Runs the real `git` binary
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeGit;

impl Git for NativeGit {
    fn run_with_ok_codes(
        &self,
        cwd: &Path,
        args: &[&str],
        ok_codes: &[i32],
    ) -> Result<GitOutput, GitContextError> {
        tracing::debug!(?args, cwd = %cwd.display(), "executing git");
        let output = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    GitContextError::GitNotInstalled
                } else {
                    GitContextError::io_error(cwd, err)
                }
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        if ok_codes.contains(&exit_code) {
            return Ok(GitOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                exit_code,
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        Err(map_git_failure(cwd, args, &stderr))
    }
}

/// Translate a failed git invocation into a typed error based on its stderr
fn map_git_failure(cwd: &Path, args: &[&str], stderr: &str) -> GitContextError {
    let lowered = stderr.to_lowercase();
    if lowered.contains("not a git repository") {
        return GitContextError::NotARepository {
            path: cwd.display().to_string(),
        };
    }
    // A fresh repository has no HEAD to resolve yet
    if lowered.contains("does not have any commits yet")
        || lowered.contains("ambiguous argument 'head'")
    {
        return GitContextError::NoCommits;
    }
    GitContextError::ExitCode {
        command: format!("git {}", args.join(" ")),
        stderr: stderr.trim().to_string(),
    }
}
