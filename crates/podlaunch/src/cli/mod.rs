//! CLI command definitions and handlers.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use podlaunch_common::LaunchPaths;
use podlaunch_spec::{Container, Mount, SecurityOptions};

use crate::platform::Platform;
use crate::provider::args::{parse_mount_options, shell_join};
use crate::provider::{ContainerProvider, Podman, RegistryCredentials};
use crate::service::{ContainersService, RunOptions, ServiceConfig};

/// podlaunch - run containers through Podman
#[derive(Parser)]
#[command(name = "podlaunch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Container engine executable
    #[arg(long, global = true, env = "PODLAUNCH_ENGINE", default_value = "podman")]
    pub engine: PathBuf,

    /// Directory for staged copies of network-share files
    #[arg(long, global = true, env = "PODLAUNCH_STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// podlaunch commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run a container and wait for it to exit
    Run {
        /// Container to run.
        #[command(flatten)]
        container: ContainerArgs,

        /// Pull the image even if it is present
        #[arg(long)]
        pull: bool,

        /// Do not check for or pull the image
        #[arg(long, conflicts_with = "pull")]
        no_pull: bool,

        /// Registry credentials as user:password
        #[arg(long, env = "PODLAUNCH_CREDS", hide_env_values = true, value_parser = parse_credentials)]
        creds: Option<RegistryCredentials>,

        /// Engine log level
        #[arg(long)]
        log_level: Option<String>,
    },

    /// Make an image available locally
    Pull {
        /// Image reference
        image: String,

        /// Pull even if the image is present
        #[arg(long)]
        always: bool,

        /// Registry credentials as user:password
        #[arg(long, env = "PODLAUNCH_CREDS", hide_env_values = true, value_parser = parse_credentials)]
        creds: Option<RegistryCredentials>,
    },

    /// Print the engine command for a container without running it
    Command {
        /// Container to describe.
        #[command(flatten)]
        container: ContainerArgs,

        /// Engine log level
        #[arg(long)]
        log_level: Option<String>,

        /// Print the arguments as a JSON array
        #[arg(long)]
        json: bool,
    },
}

/// A container given by a file, flags, or both.
#[derive(Args, Debug, Clone, Default)]
pub struct ContainerArgs {
    /// Container file (JSON, or YAML for any other extension)
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Keep stdin open
    #[arg(short, long)]
    pub interactive: bool,

    /// Allocate a pseudo-TTY
    #[arg(short, long)]
    pub tty: bool,

    /// Remove the container when it exits
    #[arg(long)]
    pub rm: bool,

    /// Engine-side timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Environment variable as KEY=VALUE (repeatable)
    #[arg(short, long = "env", value_parser = parse_env)]
    pub env: Vec<(String, String)>,

    /// User to run as
    #[arg(short, long)]
    pub user: Option<String>,

    /// Group to run as (with --user)
    #[arg(long)]
    pub group: Option<String>,

    /// Working directory inside the container
    #[arg(short, long)]
    pub workdir: Option<PathBuf>,

    /// Network to attach to
    #[arg(long)]
    pub network: Option<String>,

    /// Set no-new-privileges
    #[arg(long)]
    pub no_new_privileges: bool,

    /// Seccomp profile path
    #[arg(long)]
    pub seccomp: Option<PathBuf>,

    /// Mount as type=...,key=value,... (repeatable)
    #[arg(long = "mount")]
    pub mounts: Vec<String>,

    /// Image reference (overrides the container file)
    pub image: Option<String>,

    /// Command and arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl ContainerArgs {
    /// Build the container: container file first, then flags on top.
    ///
    /// # Errors
    ///
    /// Fails if the container file cannot be read, a mount is malformed, or no
    /// image is given.
    pub fn to_container(&self) -> Result<Container> {
        let mut container = match &self.file {
            Some(path) => load_container(path)?,
            None => {
                let image = self
                    .image
                    .clone()
                    .ok_or_else(|| eyre!("an image or a --file is required"))?;
                Container::new(image, Vec::<String>::new())
            }
        };

        if let Some(image) = &self.image {
            container.image.clone_from(image);
        }
        if !self.command.is_empty() {
            container.command.clone_from(&self.command);
        }
        container.interactive |= self.interactive;
        container.tty |= self.tty;
        container.remove |= self.rm;
        if self.timeout.is_some() {
            container.timeout = self.timeout;
        }
        container.environ.extend(self.env.iter().cloned());
        if self.user.is_some() {
            container.user.clone_from(&self.user);
        }
        if self.group.is_some() {
            container.group.clone_from(&self.group);
        }
        if self.workdir.is_some() {
            container.work_dir.clone_from(&self.workdir);
        }
        if self.network.is_some() {
            container.network.clone_from(&self.network);
        }
        if self.no_new_privileges || self.seccomp.is_some() {
            let options = container
                .security_options
                .get_or_insert_with(SecurityOptions::default);
            options.no_new_privileges |= self.no_new_privileges;
            if self.seccomp.is_some() {
                options.seccomp.clone_from(&self.seccomp);
            }
        }
        for mount in &self.mounts {
            let options = parse_mount_options(mount)?;
            container.mounts.push(Mount::from_options(&options)?);
        }
        Ok(container)
    }
}

/// Read a container file.
///
/// `.json` files are JSON; anything else is read as YAML.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed.
pub fn load_container(path: &Path) -> Result<Container> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    let container = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&text)?
    } else {
        serde_yaml::from_str(&text)?
    };
    Ok(container)
}

fn parse_env(value: &str) -> std::result::Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{value}'")),
    }
}

fn parse_credentials(value: &str) -> std::result::Result<RegistryCredentials, String> {
    RegistryCredentials::parse(value).ok_or_else(|| "expected user:password".to_string())
}

impl Cli {
    /// Service configured from global flags.
    #[must_use]
    pub fn service_config(&self) -> ServiceConfig {
        let mut paths = LaunchPaths::new().with_engine(self.engine.clone());
        if let Some(dir) = &self.staging_dir {
            paths = paths.with_staging(dir.clone());
        }
        ServiceConfig::from_paths(&paths)
    }

    /// Run the command. Returns the process exit code.
    ///
    /// # Errors
    ///
    /// Fails if the command could not be carried out.
    pub async fn execute(self) -> Result<i32> {
        let config = self.service_config();

        match self.command {
            Commands::Run {
                container,
                pull,
                no_pull,
                creds,
                log_level,
            } => {
                let container = container.to_container()?;
                let service = ContainersService::new(config);
                if !no_pull {
                    service
                        .load_image(&container.image, pull, creds.as_ref())
                        .await?;
                }

                let mut options = RunOptions::new();
                if let Some(level) = log_level {
                    options = options.with_log_level(level);
                }
                let mut running = service.run(&container, options).await?;
                let code = running.wait().await?;
                tracing::debug!(code, "Container exited");
                Ok(code)
            }

            Commands::Pull {
                image,
                always,
                creds,
            } => {
                let service = ContainersService::new(config);
                service.load_image(&image, always, creds.as_ref()).await?;
                println!("Image {image} is available");
                Ok(0)
            }

            Commands::Command {
                container,
                log_level,
                json,
            } => {
                let container = container.to_container()?;
                if Platform::host().needs_staging() {
                    tracing::warn!("Printed command does not include staged copies");
                }
                let podman = Podman::with_executable(config.executable);
                let command = podman.build_command(&container, log_level.as_deref());
                if json {
                    println!("{}", serde_json::to_string(&command)?);
                } else {
                    println!("{}", shell_join(&command));
                }
                Ok(0)
            }
        }
    }
}
