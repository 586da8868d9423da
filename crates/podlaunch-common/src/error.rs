//! Common error types for podlaunch.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`LaunchError`].
pub type LaunchResult<T> = Result<T, LaunchError>;

/// Errors raised while preparing or launching a container.
#[derive(Error, Diagnostic, Debug)]
pub enum LaunchError {
    /// Mount kind is not one the engine understands.
    #[error("Unknown mount type: {kind}")]
    #[diagnostic(
        code(podlaunch::mount::unknown_type),
        help("Supported mount types are 'bind', 'volume' and 'image'")
    )]
    UnknownMountType {
        /// The mount type that was given.
        kind: String,
    },

    /// Malformed mount description.
    #[error("Invalid mount: {message}")]
    #[diagnostic(
        code(podlaunch::mount::invalid),
        help("Mounts are written as comma separated key=value pairs, e.g. type=bind,source=/src,target=/dst")
    )]
    InvalidMount {
        /// What is wrong with the mount.
        message: String,
    },

    /// Pulling an image failed.
    #[error("Failed to load image {image} with code {code}: {stderr}")]
    #[diagnostic(code(podlaunch::image::pull_failed))]
    ImagePull {
        /// The image reference.
        image: String,
        /// Exit code of the pull command.
        code: i32,
        /// Captured standard error of the pull command.
        stderr: String,
    },

    /// A path could not be translated for the engine's execution context.
    #[error("Invalid path {path}: {reason}")]
    #[diagnostic(code(podlaunch::path::invalid))]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The engine executable could not be started.
    #[error("Failed to spawn {executable}: {source}")]
    #[diagnostic(
        code(podlaunch::spawn),
        help("Check that the container engine is installed and on PATH, or set PODLAUNCH_ENGINE")
    )]
    Spawn {
        /// The executable that was invoked.
        executable: String,
        /// The underlying OS error.
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(podlaunch::io))]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(podlaunch::serialization))]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(podlaunch::config))]
    Config {
        /// The error message.
        message: String,
    },
}

impl From<serde_json::Error> for LaunchError {
    fn from(err: serde_json::Error) -> Self {
        LaunchError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for LaunchError {
    fn from(err: serde_yaml::Error) -> Self {
        LaunchError::Serialization(err.to_string())
    }
}
