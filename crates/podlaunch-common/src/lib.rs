//! # podlaunch-common
//!
//! Shared utilities and types for podlaunch.
//!
//! This crate provides common functionality used across all podlaunch crates:
//! - The workspace-wide error type
//! - Mount name generation
//! - Environment-driven default locations

#![warn(missing_docs)]

pub mod error;
pub mod id;
pub mod paths;

pub use error::{LaunchError, LaunchResult};
pub use id::MountName;
pub use paths::LaunchPaths;
