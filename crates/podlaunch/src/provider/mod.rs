//! Container engine command synthesis.
//!
//! This module handles:
//! - Flag encoding (`--mount`, `--env`, `--annotation`)
//! - The `run` command line for a [`Container`]
//! - Image inspect and pull command lines
//! - OCI hook annotations for image mounts

pub mod args;
mod credentials;
pub mod hooks;
mod podman;

use std::path::Path;

use podlaunch_spec::Container;

pub use credentials::{REDACTED, RegistryCredentials};
pub use podman::Podman;

/// Something that knows how to spell container engine commands.
pub trait ContainerProvider: Send + Sync {
    /// Engine executable.
    fn executable(&self) -> &Path;

    /// Full argument vector, executable first, for running `container`.
    fn build_command(&self, container: &Container, log_level: Option<&str>) -> Vec<String>;

    /// `<exe> image inspect <image>`.
    fn inspect_image_command(&self, image: &str) -> Vec<String> {
        vec![
            self.executable().to_string_lossy().into_owned(),
            "image".to_string(),
            "inspect".to_string(),
            image.to_string(),
        ]
    }

    /// `<exe> pull [--creds user:pass] <image>`.
    fn pull_command(&self, image: &str, credentials: Option<&RegistryCredentials>) -> Vec<String> {
        self.pull_command_with(image, credentials.map(RegistryCredentials::to_creds_arg))
    }

    /// The pull command as it may be logged, with credentials replaced.
    fn redacted_pull_command(
        &self,
        image: &str,
        credentials: Option<&RegistryCredentials>,
    ) -> Vec<String> {
        self.pull_command_with(image, credentials.map(|_| REDACTED.to_string()))
    }

    /// Pull command with an already rendered `--creds` value.
    #[doc(hidden)]
    fn pull_command_with(&self, image: &str, creds: Option<String>) -> Vec<String> {
        let mut args = vec![
            self.executable().to_string_lossy().into_owned(),
            "pull".to_string(),
        ];
        if let Some(creds) = creds {
            args.extend(["--creds".to_string(), creds]);
        }
        args.push(image.to_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inspect_command() {
        let podman = Podman::with_executable("/usr/bin/podman");
        assert_eq!(
            podman.inspect_image_command("alpine"),
            ["/usr/bin/podman", "image", "inspect", "alpine"]
        );
    }

    #[test]
    fn pull_command_hides_credentials_only_in_log_form() {
        let podman = Podman::with_executable("podman");
        let creds = RegistryCredentials::new("robot", "hunter2");

        assert_eq!(
            podman.pull_command("ghcr.io/org/img:1", Some(&creds)),
            ["podman", "pull", "--creds", "robot:hunter2", "ghcr.io/org/img:1"]
        );
        assert_eq!(
            podman.redacted_pull_command("ghcr.io/org/img:1", Some(&creds)),
            ["podman", "pull", "--creds", "<REDACTED>", "ghcr.io/org/img:1"]
        );
        assert_eq!(
            podman.pull_command("alpine", None),
            ["podman", "pull", "alpine"]
        );
    }
}
