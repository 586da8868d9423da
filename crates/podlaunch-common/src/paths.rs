//! Default locations used by podlaunch.

use std::path::PathBuf;

use once_cell::sync::Lazy;

/// Default container engine executable.
pub const DEFAULT_ENGINE: &str = "podman";

/// Container engine executable (`PODLAUNCH_ENGINE`, default: podman).
pub static PODLAUNCH_ENGINE: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var_os("PODLAUNCH_ENGINE")
        .filter(|value| !value.is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_ENGINE), PathBuf::from)
});

/// Root directory for staged copies (`PODLAUNCH_STAGING_DIR`).
///
/// `None` means the system temporary directory.
pub static PODLAUNCH_STAGING_DIR: Lazy<Option<PathBuf>> = Lazy::new(|| {
    std::env::var_os("PODLAUNCH_STAGING_DIR")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
});

/// Locations podlaunch reads from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPaths {
    /// Container engine executable.
    pub engine: PathBuf,
    /// Where staged files and trees are created.
    pub staging: Option<PathBuf>,
}

impl LaunchPaths {
    /// Create paths with default locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific engine executable.
    #[must_use]
    pub fn with_engine(mut self, engine: impl Into<PathBuf>) -> Self {
        self.engine = engine.into();
        self
    }

    /// Stage copies under `root` instead of the system temporary directory.
    #[must_use]
    pub fn with_staging(mut self, root: impl Into<PathBuf>) -> Self {
        self.staging = Some(root.into());
        self
    }

    /// Directory staged copies are created in.
    #[must_use]
    pub fn staging_root(&self) -> PathBuf {
        self.staging.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for LaunchPaths {
    fn default() -> Self {
        Self {
            engine: PODLAUNCH_ENGINE.clone(),
            staging: PODLAUNCH_STAGING_DIR.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_engine() {
        let paths = LaunchPaths::new().with_engine("/usr/local/bin/podman");
        assert_eq!(paths.engine, PathBuf::from("/usr/local/bin/podman"));
    }

    #[test]
    fn custom_staging_root() {
        let paths = LaunchPaths::new().with_staging("/var/tmp/podlaunch");
        assert_eq!(paths.staging_root(), PathBuf::from("/var/tmp/podlaunch"));
    }

    #[test]
    fn staging_defaults_to_temp_dir() {
        let paths = LaunchPaths {
            engine: PathBuf::from(DEFAULT_ENGINE),
            staging: None,
        };
        assert_eq!(paths.staging_root(), std::env::temp_dir());
    }
}
