//! Mount name generation.
//!
//! Mount names key the annotations consumed by OCI hooks. The command builder
//! names mounts by their position (`mount-0`, `mount-1`, ...), which is only
//! unique within one invocation; callers that need names unique across
//! invocations generate them with [`MountName::generate`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a mount within a container invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MountName(String);

impl MountName {
    /// Prefix of positional mount names.
    pub const INDEX_PREFIX: &'static str = "mount-";

    /// Name for the mount at `index` in a container's mount list.
    #[must_use]
    pub fn indexed(index: usize) -> Self {
        Self(format!("{}{index}", Self::INDEX_PREFIX))
    }

    /// Generate a random unique name.
    ///
    /// The name is the 32-character hex encoding of a UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4();
        Self(hex::encode(uuid.as_bytes()))
    }

    /// Wrap a caller supplied name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MountName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MountName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
