//! Security options.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Security settings forwarded to the engine as `--security-opt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityOptions {
    /// Prevent the container process from gaining privileges.
    #[serde(default)]
    pub no_new_privileges: bool,
    /// Path to a seccomp profile on the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seccomp: Option<PathBuf>,
}

impl SecurityOptions {
    /// Options with nothing set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `no-new-privileges`.
    #[must_use]
    pub fn with_no_new_privileges(mut self, enabled: bool) -> Self {
        self.no_new_privileges = enabled;
        self
    }

    /// Use the seccomp profile at `path`.
    #[must_use]
    pub fn with_seccomp(mut self, path: impl Into<PathBuf>) -> Self {
        self.seccomp = Some(path.into());
        self
    }
}
