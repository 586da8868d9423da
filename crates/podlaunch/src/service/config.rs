//! Service configuration.

use std::path::{Path, PathBuf};

use podlaunch_common::LaunchPaths;

/// Default number of stderr bytes kept from a failed pull.
pub const DEFAULT_STDERR_LIMIT: usize = 64 * 1024;

/// Configuration for [`ContainersService`](super::ContainersService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Engine executable.
    pub executable: PathBuf,
    /// Bytes of pull stderr kept for error reports; the rest is discarded.
    pub stderr_limit: usize,
    /// Directory for staged copies.
    pub staging_dir: PathBuf,
    /// Engine `--log-level` applied when a run does not set one.
    pub log_level: Option<String>,
    /// Kill the engine process when its guard is dropped.
    pub kill_on_drop: bool,
}

impl ServiceConfig {
    /// Configuration from environment defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::from_paths(&LaunchPaths::default())
    }

    /// Configuration using the given paths.
    #[must_use]
    pub fn from_paths(paths: &LaunchPaths) -> Self {
        Self {
            executable: paths.engine.clone(),
            stderr_limit: DEFAULT_STDERR_LIMIT,
            staging_dir: paths.staging_root(),
            log_level: None,
            kill_on_drop: true,
        }
    }

    /// Use a different engine executable.
    #[must_use]
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Keep at most `limit` bytes of pull stderr.
    #[must_use]
    pub const fn with_stderr_limit(mut self, limit: usize) -> Self {
        self.stderr_limit = limit;
        self
    }

    /// Stage copies under `dir`.
    #[must_use]
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    /// Default engine log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Whether dropping a running container kills it.
    #[must_use]
    pub const fn with_kill_on_drop(mut self, kill: bool) -> Self {
        self.kill_on_drop = kill;
        self
    }

    /// Directory for staged copies.
    #[must_use]
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}
