//! # podlaunch
//!
//! Runs OCI containers through an external container engine CLI (Podman).
//!
//! ## Features
//!
//! - **Command synthesis**: a [`Container`](podlaunch_spec::Container)
//!   description becomes a deterministic `podman run` argument vector
//! - **Image loading**: inspect, then pull with redacted credentials
//! - **WSL staging**: on Windows, files on network shares are copied where the
//!   Podman machine can read them and paths are translated
//! - **Scoped processes**: a running container owns its staged copies
//!
//! ## Usage
//!
//! ```no_run
//! use podlaunch::service::{RunOptions, make_containers_service};
//! use podlaunch_spec::{BindMount, Container};
//!
//! # async fn example() -> podlaunch_common::LaunchResult<()> {
//! let container = Container::new("alpine", ["ls", "/src"])
//!     .remove()
//!     .with_mount(BindMount::new("/home/me/project", "/src", true));
//!
//! let service = make_containers_service();
//! service.load_image(&container.image, false, None).await?;
//!
//! let mut running = service.run(&container, RunOptions::new()).await?;
//! let exit_code = running.wait().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod platform;
pub mod provider;
pub mod service;

pub use platform::Platform;
pub use provider::{ContainerProvider, Podman, RegistryCredentials};
pub use service::{ContainersService, RunOptions, RunningContainer, make_containers_service};
