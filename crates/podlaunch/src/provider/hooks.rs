//! Annotations for the image-mount OCI hooks.
//!
//! The archive-overlay hook archives an image mount's overlay upper directory
//! when the container exits; the mount-chown hook changes ownership and mode
//! of the mount point before the container starts. Both find their settings
//! in annotations keyed by mount name.

use podlaunch_common::MountName;
use podlaunch_spec::{ImageMount, ImageMountHooks};

use super::args::annotation_args;

/// Annotation prefix read by the archive-overlay hook.
pub const ARCHIVE_HOOK_PREFIX: &str = "com.launchplatform.oci-hooks.archive-overlay.";
/// Annotation prefix read by the mount-chown hook.
pub const CHOWN_HOOK_PREFIX: &str = "com.launchplatform.oci-hooks.mount-chown.";

/// Annotations for the archive-overlay hook, if `archive_to` is set.
#[must_use]
pub fn archive_overlay_annotations(
    mount: &ImageMount,
    hooks: &ImageMountHooks,
    name: &MountName,
) -> Vec<(String, String)> {
    let Some(archive_to) = &hooks.archive_to else {
        return Vec::new();
    };
    let key = |suffix: &str| format!("{ARCHIVE_HOOK_PREFIX}{name}.{suffix}");

    let mut annotations = vec![
        (key("mount-point"), mount.target.display().to_string()),
        (key("archive-to"), archive_to.display().to_string()),
    ];
    if let Some(success) = &hooks.archive_success {
        annotations.push((key("success"), success.display().to_string()));
    }
    if let Some(method) = &hooks.archive_method {
        annotations.push((key("method"), method.clone()));
    }
    if let Some(owner) = &hooks.archive_tar_content_owner {
        annotations.push((key("tar-content-owner"), owner.clone()));
    }
    annotations
}

/// Annotations for the mount-chown hook, if an owner or mode is set.
#[must_use]
pub fn mount_chown_annotations(
    mount: &ImageMount,
    hooks: &ImageMountHooks,
    name: &MountName,
) -> Vec<(String, String)> {
    if hooks.owner.is_none() && hooks.mode.is_none() {
        return Vec::new();
    }
    let key = |suffix: &str| format!("{CHOWN_HOOK_PREFIX}{name}.{suffix}");

    let mut annotations = vec![(key("path"), mount.target.display().to_string())];
    if let Some(owner) = &hooks.owner {
        annotations.push((key("owner"), owner.clone()));
    }
    if let Some(policy) = &hooks.chown_policy {
        annotations.push((key("policy"), policy.clone()));
    }
    if let Some(mode) = hooks.mode {
        annotations.push((key("mode"), format!("{mode:o}")));
    }
    annotations
}

/// Whether any hook would emit annotations for these settings.
#[must_use]
pub fn wants_annotations(hooks: &ImageMountHooks) -> bool {
    hooks.archive_to.is_some() || hooks.owner.is_some() || hooks.mode.is_some()
}

/// `--annotation` arguments for all hooks of an image mount.
#[must_use]
pub fn image_mount_hook_args(mount: &ImageMount, name: &MountName) -> Vec<String> {
    let Some(hooks) = &mount.hooks else {
        return Vec::new();
    };
    let mut annotations = archive_overlay_annotations(mount, hooks, name);
    annotations.extend(mount_chown_annotations(mount, hooks, name));
    annotation_args(annotations.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}
