//! Running engine processes.

use std::path::Path;
use std::process::Stdio;

use podlaunch_common::LaunchResult;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout};

use crate::platform::Temporaries;

/// Where a child stream goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioMode {
    /// Share the caller's stream.
    #[default]
    Inherit,
    /// Create a pipe readable or writable through the guard.
    Piped,
    /// Discard.
    Null,
}

impl From<StdioMode> for Stdio {
    fn from(mode: StdioMode) -> Self {
        match mode {
            StdioMode::Inherit => Self::inherit(),
            StdioMode::Piped => Self::piped(),
            StdioMode::Null => Self::null(),
        }
    }
}

/// Per-run process options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Child stdin.
    pub stdin: StdioMode,
    /// Child stdout.
    pub stdout: StdioMode,
    /// Child stderr.
    pub stderr: StdioMode,
    /// Environment for the engine process. Replaces the inherited environment
    /// when set.
    pub runtime_env: Option<Vec<(String, String)>>,
    /// Engine `--log-level`.
    pub log_level: Option<String>,
}

impl RunOptions {
    /// Inherit all streams and the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set stdin.
    #[must_use]
    pub const fn with_stdin(mut self, mode: StdioMode) -> Self {
        self.stdin = mode;
        self
    }

    /// Set stdout.
    #[must_use]
    pub const fn with_stdout(mut self, mode: StdioMode) -> Self {
        self.stdout = mode;
        self
    }

    /// Set stderr.
    #[must_use]
    pub const fn with_stderr(mut self, mode: StdioMode) -> Self {
        self.stderr = mode;
        self
    }

    /// Run the engine with exactly these environment variables.
    #[must_use]
    pub fn with_runtime_env<I, K, V>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.runtime_env = Some(env.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Pass `--log-level` to the engine.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }
}

/// A launched container.
///
/// Owns the engine process and any staged copies. Dropping the guard releases
/// both, the process first.
#[derive(Debug)]
pub struct RunningContainer {
    child: Child,
    command: Vec<String>,
    temporaries: Temporaries,
}

impl RunningContainer {
    pub(crate) fn new(child: Child, command: Vec<String>, temporaries: Temporaries) -> Self {
        Self {
            child,
            command,
            temporaries,
        }
    }

    /// OS process id, until the process has been waited on.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// The command line that was spawned.
    #[must_use]
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Piped stdin, if requested.
    pub fn stdin(&mut self) -> Option<&mut ChildStdin> {
        self.child.stdin.as_mut()
    }

    /// Piped stdout, if requested.
    pub fn stdout(&mut self) -> Option<&mut ChildStdout> {
        self.child.stdout.as_mut()
    }

    /// Piped stderr, if requested.
    pub fn stderr(&mut self) -> Option<&mut ChildStderr> {
        self.child.stderr.as_mut()
    }

    /// Take ownership of stdin. Dropping it closes the pipe.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    /// Take ownership of stdout.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take ownership of stderr.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Wait for the engine to exit and return its exit code.
    ///
    /// A process ended by a signal reports `-1`.
    ///
    /// # Errors
    ///
    /// Fails if waiting on the process fails.
    pub async fn wait(&mut self) -> LaunchResult<i32> {
        // Closing stdin first lets an interactive container see EOF.
        drop(self.child.stdin.take());
        let status = self.child.wait().await?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Kill the engine process and wait for it.
    ///
    /// # Errors
    ///
    /// Fails if the process cannot be signalled.
    pub async fn kill(&mut self) -> LaunchResult<()> {
        self.child.kill().await?;
        Ok(())
    }

    /// Staged copies this run refers to.
    #[must_use]
    pub fn staged_paths(&self) -> Vec<&Path> {
        self.temporaries
            .profile()
            .into_iter()
            .chain(self.temporaries.mounts_dir())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_builder() {
        let options = RunOptions::new()
            .with_stdin(StdioMode::Piped)
            .with_stderr(StdioMode::Null)
            .with_runtime_env([("PATH", "/usr/bin")])
            .with_log_level("warn");
        assert_eq!(options.stdin, StdioMode::Piped);
        assert_eq!(options.stdout, StdioMode::Inherit);
        assert_eq!(options.stderr, StdioMode::Null);
        assert_eq!(
            options.runtime_env,
            Some(vec![("PATH".to_string(), "/usr/bin".to_string())])
        );
        assert_eq!(options.log_level.as_deref(), Some("warn"));
    }
}
