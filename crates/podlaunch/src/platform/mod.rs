//! Host platform handling.
//!
//! On POSIX hosts the engine sees the same filesystem as the caller. On
//! Windows the engine runs inside a WSL virtual machine, so paths must be
//! translated and files on network shares copied before launch.

mod stager;
mod windows_path;

pub use stager::{MountStager, Staged, StagedMounts, StagedProfile, Temporaries};
pub use windows_path::{Prefix, WindowsPath, is_network_path, to_wsl_path};

/// How containers are prepared for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    /// Containers are passed through unchanged.
    #[default]
    Posix,
    /// Containers are staged for an engine running inside WSL.
    Windows,
}

impl Platform {
    /// The platform this process runs on.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(windows) { Self::Windows } else { Self::Posix }
    }

    /// Whether containers must be staged before launch.
    #[must_use]
    pub const fn needs_staging(self) -> bool {
        matches!(self, Self::Windows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_platform() {
        #[cfg(windows)]
        assert_eq!(Platform::host(), Platform::Windows);
        #[cfg(not(windows))]
        assert_eq!(Platform::host(), Platform::Posix);
        assert!(Platform::Windows.needs_staging());
        assert!(!Platform::Posix.needs_staging());
    }
}
