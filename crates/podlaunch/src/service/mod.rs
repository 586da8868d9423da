//! Container execution service.
//!
//! [`ContainersService`] makes images available and launches containers
//! through the engine CLI. The platform chosen at construction decides
//! whether containers are staged for a WSL-hosted engine first.

mod config;
mod image;
mod process;

use std::io;
use std::process::Stdio;

use podlaunch_common::{LaunchError, LaunchResult};
use podlaunch_spec::Container;

use crate::platform::{MountStager, Platform, Temporaries};
use crate::provider::args::shell_join;
use crate::provider::{ContainerProvider, Podman};

pub use config::{DEFAULT_STDERR_LIMIT, ServiceConfig};
pub use process::{RunOptions, RunningContainer, StdioMode};

/// Launches containers through a [`ContainerProvider`].
pub struct ContainersService {
    provider: Box<dyn ContainerProvider>,
    config: ServiceConfig,
    platform: Platform,
    stager: MountStager,
}

impl std::fmt::Debug for ContainersService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainersService")
            .field("executable", &self.provider.executable())
            .field("config", &self.config)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl ContainersService {
    /// Podman service for the host platform.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        Self::for_platform(config, Platform::host())
    }

    /// Podman service for an explicit platform.
    #[must_use]
    pub fn for_platform(config: ServiceConfig, platform: Platform) -> Self {
        Self {
            provider: Box::new(Podman::with_executable(config.executable.clone())),
            stager: MountStager::new(config.staging_dir()),
            config,
            platform,
        }
    }

    /// Use a different command provider.
    #[must_use]
    pub fn with_provider(mut self, provider: impl ContainerProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    /// Use a different stager.
    #[must_use]
    pub fn with_stager(mut self, stager: MountStager) -> Self {
        self.stager = stager;
        self
    }

    /// The command provider.
    #[must_use]
    pub fn provider(&self) -> &dyn ContainerProvider {
        self.provider.as_ref()
    }

    /// Service configuration.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Platform containers are prepared for.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// The command line `run` would spawn for `container`, after staging.
    ///
    /// The returned [`Temporaries`] must outlive any use of the command.
    ///
    /// # Errors
    ///
    /// Fails if staging fails.
    pub async fn prepare_command(
        &self,
        container: &Container,
        log_level: Option<&str>,
    ) -> LaunchResult<(Vec<String>, Temporaries)> {
        let (container, temporaries) = self.prepare(container).await?;
        let log_level = log_level.or(self.config.log_level.as_deref());
        Ok((self.provider.build_command(&container, log_level), temporaries))
    }

    /// Launch `container`.
    ///
    /// The returned guard owns the engine process and any staged copies.
    /// Waiting on the process and interpreting its exit code is up to the
    /// caller.
    ///
    /// # Errors
    ///
    /// Fails if staging fails or the engine cannot be spawned. Staged copies
    /// are removed before the error is returned.
    pub async fn run(
        &self,
        container: &Container,
        options: RunOptions,
    ) -> LaunchResult<RunningContainer> {
        let (command, temporaries) = self
            .prepare_command(container, options.log_level.as_deref())
            .await?;
        tracing::info!(
            command = %shell_join(&command),
            runtime_env = ?options
                .runtime_env
                .as_ref()
                .map(|env| env.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>()),
            "Run container"
        );

        let mut process = self.command(&command)?;
        process
            .stdin(Stdio::from(options.stdin))
            .stdout(Stdio::from(options.stdout))
            .stderr(Stdio::from(options.stderr))
            .kill_on_drop(self.config.kill_on_drop);
        if let Some(env) = &options.runtime_env {
            process.env_clear().envs(env.iter().map(|(k, v)| (k, v)));
        }

        let child = process.spawn().map_err(|source| self.spawn_error(source))?;
        tracing::debug!(pid = ?child.id(), "Container process started");
        Ok(RunningContainer::new(child, command, temporaries))
    }

    async fn prepare(&self, container: &Container) -> LaunchResult<(Container, Temporaries)> {
        if !self.platform.needs_staging() {
            return Ok((container.clone(), Temporaries::default()));
        }
        let stager = self.stager.clone();
        let container = container.clone();
        let staged = tokio::task::spawn_blocking(move || stager.stage(&container))
            .await
            .map_err(io::Error::other)??;
        Ok((staged.container, staged.temporaries))
    }

    fn command(&self, args: &[String]) -> LaunchResult<tokio::process::Command> {
        let (program, rest) = args.split_first().ok_or_else(|| LaunchError::Config {
            message: "empty engine command".to_string(),
        })?;
        let mut command = tokio::process::Command::new(program);
        command.args(rest);
        Ok(command)
    }

    fn spawn_error(&self, source: io::Error) -> LaunchError {
        LaunchError::Spawn {
            executable: self.provider.executable().display().to_string(),
            source,
        }
    }
}

/// Service for the host platform using environment defaults.
#[must_use]
pub fn make_containers_service() -> ContainersService {
    ContainersService::new(ServiceConfig::default())
}
