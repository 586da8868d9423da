//! Podman command builder.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use podlaunch_common::{LaunchPaths, MountName};
use podlaunch_spec::{BindMount, Container, ImageMount, Mount, SecurityOptions, VolumeMount};

use super::ContainerProvider;
use super::args::{env_args, mount_args};
use super::hooks::{image_mount_hook_args, wants_annotations};

fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

fn path_text(path: &Path) -> Cow<'_, str> {
    path.to_string_lossy()
}

/// Builds Podman command lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Podman {
    executable: PathBuf,
}

impl Podman {
    /// Podman from `PODLAUNCH_ENGINE`, or `podman` on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_executable(LaunchPaths::default().engine)
    }

    /// Podman at a specific path.
    #[must_use]
    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// `--mount` for an image mount, followed by its hook annotations.
    #[must_use]
    pub fn make_image_mount(&self, mount: &ImageMount, name: Option<&MountName>) -> Vec<String> {
        let params = [
            ("type", Cow::Borrowed("image")),
            ("source", Cow::Borrowed(mount.source.as_str())),
            ("target", path_text(&mount.target)),
            ("rw", Cow::Borrowed(bool_text(mount.read_write))),
        ];
        let mut args = mount_args(&params).to_vec();

        if mount.hooks.as_ref().is_some_and(wants_annotations) {
            let name = name.cloned().unwrap_or_else(MountName::generate);
            args.extend(image_mount_hook_args(mount, &name));
        }
        args
    }

    /// `--mount` for a bind mount.
    ///
    /// `chown` and `readonly` are always spelled out; `relabel` and
    /// `bind-propagation` follow only when set.
    #[must_use]
    pub fn make_bind_mount(&self, mount: &BindMount) -> Vec<String> {
        let mut params = vec![
            ("type", Cow::Borrowed("bind")),
            ("source", path_text(&mount.source)),
            ("target", path_text(&mount.target)),
            ("chown", Cow::Borrowed(bool_text(mount.chown))),
            ("readonly", Cow::Borrowed(bool_text(mount.readonly))),
        ];
        if let Some(relabel) = &mount.relabel {
            params.push(("relabel", Cow::Borrowed(relabel.as_str())));
        }
        if let Some(propagation) = &mount.bind_propagation {
            params.push(("bind-propagation", Cow::Borrowed(propagation.as_str())));
        }
        mount_args(&params).to_vec()
    }

    /// `--mount` for a named volume.
    #[must_use]
    pub fn make_volume_mount(&self, mount: &VolumeMount) -> Vec<String> {
        let mut params = vec![
            ("type", Cow::Borrowed("volume")),
            ("target", path_text(&mount.target)),
            ("chown", Cow::Borrowed(bool_text(mount.chown))),
        ];
        // Podman treats any value of the readonly key as read-only, so the key
        // is left out entirely for writable volumes.
        // ref: https://github.com/containers/podman/issues/18995
        if mount.readonly {
            params.push(("readonly", Cow::Borrowed("true")));
        }
        mount_args(&params).to_vec()
    }

    /// Arguments for any mount.
    ///
    /// `name` keys hook annotations; without one a random name is generated
    /// when a hook needs it.
    #[must_use]
    pub fn make_mount(&self, mount: &Mount, name: Option<&MountName>) -> Vec<String> {
        match mount {
            Mount::Image(mount) => self.make_image_mount(mount, name),
            Mount::Bind(mount) => self.make_bind_mount(mount),
            Mount::Volume(mount) => self.make_volume_mount(mount),
        }
    }

    /// `--security-opt` arguments.
    #[must_use]
    pub fn make_security_options(&self, options: &SecurityOptions) -> Vec<String> {
        let mut args = Vec::new();
        if options.no_new_privileges {
            args.extend(["--security-opt".to_string(), "no-new-privileges:true".to_string()]);
        }
        if let Some(seccomp) = &options.seccomp {
            args.extend([
                "--security-opt".to_string(),
                format!("seccomp={}", path_text(seccomp)),
            ]);
        }
        args
    }
}

impl Default for Podman {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerProvider for Podman {
    fn executable(&self) -> &Path {
        &self.executable
    }

    fn build_command(&self, container: &Container, log_level: Option<&str>) -> Vec<String> {
        let mut args = vec![path_text(&self.executable).into_owned()];
        if let Some(level) = log_level {
            args.extend(["--log-level".to_string(), level.to_string()]);
        }
        args.push("run".to_string());

        if container.interactive {
            args.push("--interactive".to_string());
        }
        if container.tty {
            args.push("--tty".to_string());
        }
        if container.remove {
            args.push("--rm".to_string());
        }
        if let Some(timeout) = container.timeout {
            args.extend(["--timeout".to_string(), timeout.to_string()]);
        }

        args.extend(env_args(container.environ.iter()));

        if let Some(user) = &container.user {
            let user_group = match &container.group {
                Some(group) => format!("{user}:{group}"),
                None => user.clone(),
            };
            args.extend(["--user".to_string(), user_group]);
        }
        if let Some(work_dir) = &container.work_dir {
            args.extend(["--workdir".to_string(), path_text(work_dir).into_owned()]);
        }
        if let Some(network) = &container.network {
            args.extend(["--network".to_string(), network.clone()]);
        }
        if let Some(options) = &container.security_options {
            args.extend(self.make_security_options(options));
        }

        for (index, mount) in container.mounts.iter().enumerate() {
            args.extend(self.make_mount(mount, Some(&MountName::indexed(index))));
        }

        args.push(container.image.clone());
        args.extend(container.command.iter().cloned());
        args
    }
}
