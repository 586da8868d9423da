//! # podlaunch-spec
//!
//! Types describing a container to launch through a container engine.
//!
//! This crate provides Rust types for:
//! - Mounts (bind, named volume, image backed)
//! - Security options
//! - The container description consumed by the command builder

#![warn(missing_docs)]

pub mod container;
pub mod environ;
pub mod mount;
pub mod security;

pub use container::Container;
pub use environ::Environ;
pub use mount::{BindMount, ImageMount, ImageMountHooks, Mount, MountKind, VolumeMount};
pub use security::SecurityOptions;
