//! Staging of profiles and mounts the engine cannot reach.
//!
//! Under Windows a project may live inside WSL, so a seccomp profile path can
//! look like `\\wsl$\Ubuntu-18.04\home\user\project\seccomp\git.json`. The
//! Podman machine cannot read network shares, so such files are copied to the
//! native filesystem first and handed to Podman by their WSL path
//! (containers/podman#14494). Read-only bind mounts on network shares are
//! copied the same way. Writable mounts are never redirected: writes must land
//! on the real source.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use podlaunch_common::{LaunchResult, MountName};
use podlaunch_spec::{BindMount, Container, Mount};
use tempfile::{NamedTempFile, TempDir};

use super::windows_path::{is_network_path, to_wsl_path};

/// Copies network-addressed inputs somewhere the engine can read them.
#[derive(Debug, Clone)]
pub struct MountStager {
    root: PathBuf,
    is_network: fn(&Path) -> bool,
}

/// A seccomp profile after staging.
#[derive(Debug)]
pub struct StagedProfile {
    path: Option<PathBuf>,
    file: Option<NamedTempFile>,
}

impl StagedProfile {
    /// Path to hand to the engine; the input path if nothing was copied.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether a temporary copy was made.
    #[must_use]
    pub const fn is_copied(&self) -> bool {
        self.file.is_some()
    }
}

/// Mounts after staging.
#[derive(Debug)]
pub struct StagedMounts {
    mounts: Vec<Mount>,
    dir: Option<TempDir>,
}

impl StagedMounts {
    /// The mounts, with staged sources rewritten.
    #[must_use]
    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    /// Directory holding the copies, if any mount was copied.
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }
}

/// Temporary copies owned by one run. Dropping this removes them.
#[derive(Debug, Default)]
pub struct Temporaries {
    profile: Option<NamedTempFile>,
    mounts: Option<TempDir>,
}

impl Temporaries {
    /// Path of the copied seccomp profile.
    #[must_use]
    pub fn profile(&self) -> Option<&Path> {
        self.profile.as_ref().map(NamedTempFile::path)
    }

    /// Directory holding copied mount trees.
    #[must_use]
    pub fn mounts_dir(&self) -> Option<&Path> {
        self.mounts.as_ref().map(TempDir::path)
    }

    /// Whether nothing was copied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.profile.is_none() && self.mounts.is_none()
    }
}

impl Drop for Temporaries {
    fn drop(&mut self) {
        if !self.is_empty() {
            tracing::debug!(
                profile = ?self.profile(),
                mounts = ?self.mounts_dir(),
                "Removing staged copies"
            );
        }
    }
}

/// A container rewritten for the engine, plus the copies it refers to.
#[derive(Debug)]
pub struct Staged {
    /// The rewritten container.
    pub container: Container,
    /// Copies the container refers to.
    pub temporaries: Temporaries,
}

impl MountStager {
    /// Stage copies under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            is_network: is_network_path,
        }
    }

    /// Replace how sources are classified as network-addressed.
    ///
    /// Useful when a share is also reachable through a local mount point.
    #[must_use]
    pub fn with_network_predicate(mut self, is_network: fn(&Path) -> bool) -> Self {
        self.is_network = is_network;
        self
    }

    /// Directory copies are created in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy a network-addressed profile to a temporary file.
    ///
    /// Anything else is returned untouched and nothing is created.
    ///
    /// # Errors
    ///
    /// Fails if the profile cannot be read or the copy cannot be written.
    pub fn stage_profile(&self, profile: Option<&Path>) -> LaunchResult<StagedProfile> {
        let Some(source) = profile.filter(|path| (self.is_network)(path)) else {
            return Ok(StagedProfile {
                path: profile.map(Path::to_path_buf),
                file: None,
            });
        };

        let mut source_file = File::open(source)?;
        let mut temp_file = tempfile::Builder::new()
            .prefix("podlaunch-profile-")
            .suffix(".json")
            .tempfile_in(&self.root)?;
        tracing::debug!(
            from = %source.display(),
            to = %temp_file.path().display(),
            "Make a temp copy of seccomp profile on the native filesystem"
        );
        io::copy(&mut source_file, &mut temp_file)?;
        temp_file.flush()?;

        Ok(StagedProfile {
            path: Some(temp_file.path().to_path_buf()),
            file: Some(temp_file),
        })
    }

    /// Copy read-only bind mounts on network shares into one temporary
    /// directory, as `mount-<index>`.
    ///
    /// Other mounts pass through unchanged. The directory is only created if
    /// some mount needs it.
    ///
    /// # Errors
    ///
    /// Fails if a source tree cannot be read or copied.
    pub fn stage_readonly_mounts(&self, mounts: &[Mount]) -> LaunchResult<StagedMounts> {
        let mut dir: Option<TempDir> = None;
        let mut staged = Vec::with_capacity(mounts.len());

        for (index, mount) in mounts.iter().enumerate() {
            let Mount::Bind(bind) = mount else {
                staged.push(mount.clone());
                continue;
            };
            if !bind.readonly || !(self.is_network)(&bind.source) {
                staged.push(mount.clone());
                continue;
            }

            let temp_dir = match dir.take() {
                Some(temp_dir) => temp_dir,
                None => tempfile::Builder::new()
                    .prefix("podlaunch-mounts-")
                    .tempdir_in(&self.root)?,
            };
            let new_source = temp_dir.path().join(MountName::indexed(index).as_str());
            tracing::info!(
                from = %bind.source.display(),
                to = %new_source.display(),
                "Copy readonly UNC mount"
            );
            copy_tree(&bind.source, &new_source)?;
            dir = Some(temp_dir);

            staged.push(Mount::Bind(BindMount {
                source: new_source,
                ..bind.clone()
            }));
        }

        Ok(StagedMounts {
            mounts: staged,
            dir,
        })
    }

    /// Build the container the engine will see.
    ///
    /// Only `security_options.seccomp` and `mounts` differ from the input:
    /// the profile is staged if needed and translated to its WSL path, read
    /// only network mounts are staged, and image mount hook paths are
    /// translated to WSL paths.
    ///
    /// # Errors
    ///
    /// Fails if copying fails or a path cannot be translated.
    pub fn stage(&self, container: &Container) -> LaunchResult<Staged> {
        let mut staged = container.clone();

        let profile = self.stage_profile(container.seccomp_profile())?;
        if let (Some(options), Some(path)) = (staged.security_options.as_mut(), profile.path()) {
            options.seccomp = Some(PathBuf::from(to_wsl_path(path)?));
        }

        let StagedMounts { mounts, dir } = self.stage_readonly_mounts(&container.mounts)?;
        staged.mounts = mounts
            .into_iter()
            .map(translate_hook_paths)
            .collect::<LaunchResult<_>>()?;

        Ok(Staged {
            container: staged,
            temporaries: Temporaries {
                profile: profile.file,
                mounts: dir,
            },
        })
    }
}

/// Rewrite image mount hook output paths for the hook running inside WSL.
fn translate_hook_paths(mount: Mount) -> LaunchResult<Mount> {
    match mount {
        Mount::Image(mut image) => {
            if let Some(hooks) = image.hooks.as_mut() {
                if let Some(archive_to) = &hooks.archive_to {
                    hooks.archive_to = Some(to_wsl_path(archive_to)?.into());
                }
                if let Some(success) = &hooks.archive_success {
                    hooks.archive_success = Some(to_wsl_path(success)?.into());
                }
            }
            Ok(Mount::Image(image))
        }
        other => Ok(other),
    }
}

/// Recursively copy `source` to `dest`, following symlinks.
///
/// A file source is copied to `dest` itself.
fn copy_tree(source: &Path, dest: &Path) -> LaunchResult<()> {
    if fs::metadata(source)?.is_file() {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, dest)?;
        return Ok(());
    }
    for entry in walkdir::WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use podlaunch_spec::{SecurityOptions, VolumeMount};

    /// Any path containing "share" counts as remote.
    fn contains_share(path: &Path) -> bool {
        path.to_string_lossy().contains("share")
    }

    #[test]
    fn local_profile_is_untouched() {
        let root = tempfile::tempdir().unwrap();
        let stager = MountStager::new(root.path());

        let profile = stager
            .stage_profile(Some(Path::new("/etc/podlaunch/git.json")))
            .unwrap();
        assert!(!profile.is_copied());
        assert_eq!(profile.path(), Some(Path::new("/etc/podlaunch/git.json")));
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);

        assert!(stager.stage_profile(None).unwrap().path().is_none());
    }

    #[test]
    fn network_profile_is_copied() {
        let share = tempfile::Builder::new().prefix("share").tempdir().unwrap();
        let source = share.path().join("git.json");
        fs::write(&source, br#"{"defaultAction": "SCMP_ACT_ERRNO"}"#).unwrap();

        let root = tempfile::tempdir().unwrap();
        let stager = MountStager::new(root.path()).with_network_predicate(contains_share);
        let profile = stager.stage_profile(Some(&source)).unwrap();

        assert!(profile.is_copied());
        let copy = profile.path().unwrap().to_path_buf();
        assert!(copy.starts_with(root.path()));
        assert_eq!(copy.extension().unwrap(), "json");
        assert_eq!(fs::read(&copy).unwrap(), fs::read(&source).unwrap());

        drop(profile);
        assert!(!copy.exists());
    }

    #[test]
    fn only_readonly_network_binds_are_staged() {
        let share = tempfile::Builder::new().prefix("share").tempdir().unwrap();
        fs::write(share.path().join("a.txt"), "hello").unwrap();

        let root = tempfile::tempdir().unwrap();
        let stager = MountStager::new(root.path()).with_network_predicate(contains_share);
        let mounts = vec![
            Mount::from(VolumeMount::new("/cache", true)),
            Mount::from(BindMount::new(share.path(), "/rw", false)),
            Mount::from(BindMount::new(share.path(), "/ro", true)),
            Mount::from(BindMount::new("/var/tmp/local", "/local", true)),
        ];

        let staged = stager.stage_readonly_mounts(&mounts).unwrap();
        let dir = staged.dir().unwrap().to_path_buf();

        assert_eq!(staged.mounts()[0], mounts[0]);
        assert_eq!(staged.mounts()[1], mounts[1]);
        assert_eq!(staged.mounts()[3], mounts[3]);
        let Mount::Bind(copied) = &staged.mounts()[2] else {
            panic!("expected a bind mount");
        };
        assert_eq!(copied.source, dir.join("mount-2"));
        assert!(copied.readonly);
        assert_eq!(fs::read_to_string(copied.source.join("a.txt")).unwrap(), "hello");

        drop(staged);
        assert!(!dir.exists());
    }

    #[test]
    fn readonly_network_file_is_staged() {
        let share = tempfile::Builder::new().prefix("share").tempdir().unwrap();
        let source = share.path().join("config.toml");
        fs::write(&source, "name = \"app\"\n").unwrap();

        let root = tempfile::tempdir().unwrap();
        let stager = MountStager::new(root.path()).with_network_predicate(contains_share);
        let mounts = vec![Mount::from(BindMount::new(&source, "/etc/app.toml", true))];

        let staged = stager.stage_readonly_mounts(&mounts).unwrap();
        let Mount::Bind(copied) = &staged.mounts()[0] else {
            panic!("expected a bind mount");
        };
        assert_eq!(copied.source, staged.dir().unwrap().join("mount-0"));
        assert!(copied.source.is_file());
        assert_eq!(fs::read(&copied.source).unwrap(), fs::read(&source).unwrap());
    }

    #[test]
    fn nothing_to_stage_creates_nothing() {
        let root = tempfile::tempdir().unwrap();
        let stager = MountStager::new(root.path());
        let mounts = vec![Mount::from(BindMount::new("/srv/data", "/data", true))];

        let staged = stager.stage_readonly_mounts(&mounts).unwrap();
        assert!(staged.dir().is_none());
        assert_eq!(staged.mounts(), mounts.as_slice());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn stage_leaves_input_untouched() {
        let root = tempfile::tempdir().unwrap();
        let stager = MountStager::new(root.path());
        let container = Container::new("alpine", ["true"])
            .with_env("A", "1")
            .with_security_options(SecurityOptions::new().with_seccomp(r"C:\profiles\git.json"))
            .with_mount(BindMount::new(r"C:\src", "/src", true));
        let before = container.clone();

        let staged = stager.stage(&container).unwrap();
        assert_eq!(container, before);
        assert!(staged.temporaries.is_empty());
        assert_eq!(
            staged.container.seccomp_profile(),
            Some(Path::new("/mnt/c/profiles/git.json"))
        );
        assert_eq!(staged.container.mounts, before.mounts);
        assert_eq!(staged.container.environ, before.environ);
    }

    #[test]
    fn hook_archive_paths_are_translated() {
        use podlaunch_spec::{ImageMount, ImageMountHooks};

        let root = tempfile::tempdir().unwrap();
        let stager = MountStager::new(root.path());
        let container = Container::new("alpine", ["true"]).with_mount(
            ImageMount::new("data", "/data").with_hooks(ImageMountHooks {
                archive_to: Some(r"C:\archives\data.tar.gz".into()),
                archive_success: Some(r"\\wsl$\Ubuntu\tmp\data.ok".into()),
                ..ImageMountHooks::default()
            }),
        );

        let staged = stager.stage(&container).unwrap();
        let Mount::Image(image) = &staged.container.mounts[0] else {
            panic!("expected an image mount");
        };
        let hooks = image.hooks.as_ref().unwrap();
        assert_eq!(
            hooks.archive_to.as_deref(),
            Some(Path::new("/mnt/c/archives/data.tar.gz"))
        );
        assert_eq!(hooks.archive_success.as_deref(), Some(Path::new("/tmp/data.ok")));
    }
}
