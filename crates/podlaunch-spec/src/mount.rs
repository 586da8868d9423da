//! Mount descriptions.
//!
//! A [`Mount`] makes storage visible inside the container in one of three
//! forms: a host path ([`BindMount`]), an engine managed named volume
//! ([`VolumeMount`]) or the filesystem of another image ([`ImageMount`]).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use podlaunch_common::{LaunchError, LaunchResult};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A mount attached to a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Mount {
    /// Host path bind mount.
    Bind(BindMount),
    /// Named volume.
    Volume(VolumeMount),
    /// Image backed data volume.
    Image(ImageMount),
}

/// Kind of a [`Mount`], as written in the engine's `type=` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MountKind {
    /// `type=bind`
    Bind,
    /// `type=volume`
    Volume,
    /// `type=image`
    Image,
}

impl MountKind {
    /// Engine spelling of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bind => "bind",
            Self::Volume => "volume",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for MountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MountKind {
    type Err = LaunchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bind" => Ok(Self::Bind),
            "volume" => Ok(Self::Volume),
            "image" => Ok(Self::Image),
            other => Err(LaunchError::UnknownMountType {
                kind: other.to_string(),
            }),
        }
    }
}

/// Bind mount of a host path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindMount {
    /// Host path.
    pub source: PathBuf,
    /// Path inside the container.
    pub target: PathBuf,
    /// Mount read-only.
    #[serde(default)]
    pub readonly: bool,
    /// Fix up ownership of the source for the container user.
    #[serde(default = "default_true")]
    pub chown: bool,
    /// SELinux relabeling mode (`shared`, `private`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relabel: Option<String>,
    /// Mount propagation mode (`rslave`, `rshared`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_propagation: Option<String>,
}

impl BindMount {
    /// Bind `source` to `target`.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>, readonly: bool) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            readonly,
            chown: true,
            relabel: None,
            bind_propagation: None,
        }
    }

    /// Set whether ownership is fixed up.
    #[must_use]
    pub fn with_chown(mut self, chown: bool) -> Self {
        self.chown = chown;
        self
    }

    /// Set the relabeling mode.
    #[must_use]
    pub fn with_relabel(mut self, relabel: impl Into<String>) -> Self {
        self.relabel = Some(relabel.into());
        self
    }

    /// Set the propagation mode.
    #[must_use]
    pub fn with_bind_propagation(mut self, propagation: impl Into<String>) -> Self {
        self.bind_propagation = Some(propagation.into());
        self
    }
}

/// Engine managed named volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    /// Path inside the container.
    pub target: PathBuf,
    /// Mount read-only.
    #[serde(default)]
    pub readonly: bool,
    /// Fix up ownership for the container user.
    #[serde(default = "default_true")]
    pub chown: bool,
}

impl VolumeMount {
    /// Volume mounted at `target`.
    #[must_use]
    pub fn new(target: impl Into<PathBuf>, readonly: bool) -> Self {
        Self {
            target: target.into(),
            readonly,
            chown: true,
        }
    }

    /// Set whether ownership is fixed up.
    #[must_use]
    pub fn with_chown(mut self, chown: bool) -> Self {
        self.chown = chown;
        self
    }
}

/// Another image's filesystem mounted as a data volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMount {
    /// Image reference.
    pub source: String,
    /// Path inside the container.
    pub target: PathBuf,
    /// Mount writable.
    #[serde(default)]
    pub read_write: bool,
    /// OCI hook settings attached to this mount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<ImageMountHooks>,
}

impl ImageMount {
    /// Mount image `source` read-only at `target`.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            read_write: false,
            hooks: None,
        }
    }

    /// Set whether the mount is writable.
    #[must_use]
    pub fn with_read_write(mut self, read_write: bool) -> Self {
        self.read_write = read_write;
        self
    }

    /// Attach hook settings.
    #[must_use]
    pub fn with_hooks(mut self, hooks: ImageMountHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }
}

/// Settings for the archive-overlay and mount-chown OCI hooks.
///
/// The hooks read container annotations keyed by mount name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMountHooks {
    /// Archive the overlay upper directory to this host path on exit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_to: Option<PathBuf>,
    /// Marker file written after a successful archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_success: Option<PathBuf>,
    /// Archive method (`tar.gz`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_method: Option<String>,
    /// Owner of the archived tar entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_tar_content_owner: Option<String>,
    /// `uid:gid` to chown the mount point to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Chown policy (`recursive`, `root-only`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chown_policy: Option<String>,
    /// Permission bits for the mount point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
}

impl Mount {
    /// Path inside the container.
    #[must_use]
    pub fn target(&self) -> &Path {
        match self {
            Self::Bind(mount) => &mount.target,
            Self::Volume(mount) => &mount.target,
            Self::Image(mount) => &mount.target,
        }
    }

    /// Kind of this mount.
    #[must_use]
    pub const fn kind(&self) -> MountKind {
        match self {
            Self::Bind(_) => MountKind::Bind,
            Self::Volume(_) => MountKind::Volume,
            Self::Image(_) => MountKind::Image,
        }
    }

    /// Build a mount from engine style `key=value` options.
    ///
    /// Accepts the keys the command builder emits for each kind. Hook settings
    /// travel as annotations and cannot be expressed here.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::UnknownMountType`] for an unsupported `type` and
    /// [`LaunchError::InvalidMount`] for missing, unknown or malformed keys.
    pub fn from_options<K, V>(options: &[(K, V)]) -> LaunchResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = MountOptions::new(options);
        let kind: MountKind = options.required("type")?.parse()?;
        let mount = match kind {
            MountKind::Bind => Self::Bind(BindMount {
                source: options.required("source")?.into(),
                target: options.required("target")?.into(),
                chown: options.flag("chown", true)?,
                readonly: options.flag("readonly", false)?,
                relabel: options.optional("relabel").map(str::to_string),
                bind_propagation: options.optional("bind-propagation").map(str::to_string),
            }),
            MountKind::Volume => Self::Volume(VolumeMount {
                target: options.required("target")?.into(),
                chown: options.flag("chown", true)?,
                readonly: options.flag("readonly", false)?,
            }),
            MountKind::Image => Self::Image(ImageMount {
                source: options.required("source")?.to_string(),
                target: options.required("target")?.into(),
                read_write: options.flag("rw", false)?,
                hooks: None,
            }),
        };
        options.finish()?;
        Ok(mount)
    }
}

impl From<BindMount> for Mount {
    fn from(mount: BindMount) -> Self {
        Self::Bind(mount)
    }
}

impl From<VolumeMount> for Mount {
    fn from(mount: VolumeMount) -> Self {
        Self::Volume(mount)
    }
}

impl From<ImageMount> for Mount {
    fn from(mount: ImageMount) -> Self {
        Self::Image(mount)
    }
}

/// Tracks which options a mount parser has consumed.
struct MountOptions<'a> {
    entries: Vec<(&'a str, &'a str, bool)>,
}

impl<'a> MountOptions<'a> {
    fn new<K: AsRef<str>, V: AsRef<str>>(options: &'a [(K, V)]) -> Self {
        Self {
            entries: options
                .iter()
                .map(|(k, v)| (k.as_ref(), v.as_ref(), false))
                .collect(),
        }
    }

    fn optional(&mut self, key: &str) -> Option<&'a str> {
        // Later duplicates win, as they do for the engine.
        let mut value = None;
        for entry in self.entries.iter_mut().filter(|(k, _, _)| *k == key) {
            entry.2 = true;
            value = Some(entry.1);
        }
        value
    }

    fn required(&mut self, key: &str) -> LaunchResult<&'a str> {
        self.optional(key).ok_or_else(|| LaunchError::InvalidMount {
            message: format!("missing '{key}'"),
        })
    }

    fn flag(&mut self, key: &str, default: bool) -> LaunchResult<bool> {
        match self.optional(key) {
            None => Ok(default),
            Some("true") => Ok(true),
            Some("false") => Ok(false),
            Some(other) => Err(LaunchError::InvalidMount {
                message: format!("'{key}' must be true or false, got '{other}'"),
            }),
        }
    }

    fn finish(self) -> LaunchResult<()> {
        match self.entries.iter().find(|(_, _, used)| !used) {
            Some((key, _, _)) => Err(LaunchError::InvalidMount {
                message: format!("unsupported key '{key}'"),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_defaults() {
        let mount = BindMount::new("/src", "/dst", true);
        assert!(mount.chown);
        assert!(mount.relabel.is_none());
        assert!(mount.bind_propagation.is_none());
    }

    #[test]
    fn target_of_each_kind() {
        let mounts: [Mount; 3] = [
            BindMount::new("/a", "/bind", false).into(),
            VolumeMount::new("/volume", false).into(),
            ImageMount::new("alpine", "/image").into(),
        ];
        let targets: Vec<_> = mounts.iter().map(Mount::target).collect();
        assert_eq!(
            targets,
            [Path::new("/bind"), Path::new("/volume"), Path::new("/image")]
        );
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = Mount::from_options(&[("type", "tmpfs"), ("target", "/tmp")]).unwrap_err();
        assert!(matches!(err, LaunchError::UnknownMountType { kind } if kind == "tmpfs"));
    }

    #[test]
    fn bind_from_options() {
        let mount = Mount::from_options(&[
            ("type", "bind"),
            ("source", "/var/tmp/artifacts"),
            ("target", "/artifacts"),
            ("chown", "false"),
            ("readonly", "true"),
            ("bind-propagation", "rslave"),
        ])
        .unwrap();
        assert_eq!(
            mount,
            Mount::Bind(
                BindMount::new("/var/tmp/artifacts", "/artifacts", true)
                    .with_chown(false)
                    .with_bind_propagation("rslave")
            )
        );
    }

    #[test]
    fn missing_target_is_invalid() {
        let err = Mount::from_options(&[("type", "volume")]).unwrap_err();
        assert!(matches!(err, LaunchError::InvalidMount { .. }));
    }

    #[test]
    fn unsupported_key_is_invalid() {
        let err = Mount::from_options(&[("type", "volume"), ("target", "/v"), ("size", "1g")])
            .unwrap_err();
        assert!(matches!(err, LaunchError::InvalidMount { message } if message.contains("size")));
    }

    #[test]
    fn serde_uses_type_tag() {
        let json = r#"{"type": "image", "source": "alpine:3.18.2", "target": "/data"}"#;
        let mount: Mount = serde_json::from_str(json).unwrap();
        assert_eq!(mount, Mount::Image(ImageMount::new("alpine:3.18.2", "/data")));

        let json = r#"{"type": "volume", "target": "/cache"}"#;
        let mount: Mount = serde_json::from_str(json).unwrap();
        assert_eq!(mount, Mount::Volume(VolumeMount::new("/cache", false)));
    }
}
