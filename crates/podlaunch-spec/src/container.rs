//! Container description.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::environ::Environ;
use crate::mount::Mount;
use crate::security::SecurityOptions;

/// A container to run through the engine.
///
/// Values are plain data. Platform staging builds a modified copy and leaves
/// the caller's value untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Image reference.
    pub image: String,

    /// Command and arguments, passed verbatim.
    pub command: Vec<String>,

    /// Keep stdin open.
    #[serde(default)]
    pub interactive: bool,

    /// Allocate a pseudo-TTY.
    #[serde(default)]
    pub tty: bool,

    /// Remove the container when it exits.
    #[serde(default)]
    pub remove: bool,

    /// Environment variables, one `--env` each.
    #[serde(default, skip_serializing_if = "Environ::is_empty")]
    pub environ: Environ,

    /// Working directory inside the container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,

    /// Mounts, in engine argument order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<Mount>,

    /// User to run as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Group to run as. Only used together with `user`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Network to attach to (`none`, `host`, a named network).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    /// Timeout in seconds, enforced by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Security options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_options: Option<SecurityOptions>,
}

impl Container {
    /// Run `command` in `image` with everything else unset.
    #[must_use]
    pub fn new<I, S>(image: impl Into<String>, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            image: image.into(),
            command: command.into_iter().map(Into::into).collect(),
            interactive: false,
            tty: false,
            remove: false,
            environ: Environ::new(),
            work_dir: None,
            mounts: Vec::new(),
            user: None,
            group: None,
            network: None,
            timeout: None,
            security_options: None,
        }
    }

    /// Keep stdin open.
    #[must_use]
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// Allocate a pseudo-TTY.
    #[must_use]
    pub fn tty(mut self) -> Self {
        self.tty = true;
        self
    }

    /// Remove the container on exit.
    #[must_use]
    pub fn remove(mut self) -> Self {
        self.remove = true;
        self
    }

    /// Set an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environ.insert(key, value);
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }

    /// Append a mount.
    #[must_use]
    pub fn with_mount(mut self, mount: impl Into<Mount>) -> Self {
        self.mounts.push(mount.into());
        self
    }

    /// Run as `user`.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Run with group `group` (requires a user).
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Attach to `network`.
    #[must_use]
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    /// Engine side timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Set security options.
    #[must_use]
    pub fn with_security_options(mut self, options: SecurityOptions) -> Self {
        self.security_options = Some(options);
        self
    }

    /// Seccomp profile path, if any.
    #[must_use]
    pub fn seccomp_profile(&self) -> Option<&std::path::Path> {
        self.security_options
            .as_ref()
            .and_then(|options| options.seccomp.as_deref())
    }
}
