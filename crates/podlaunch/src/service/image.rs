//! Making images available before launch.

use std::process::Stdio;

use podlaunch_common::{LaunchError, LaunchResult};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::ContainersService;
use crate::provider::RegistryCredentials;
use crate::provider::args::shell_join;

impl ContainersService {
    /// Make sure `image` is present locally.
    ///
    /// Unless `always_pull` is set the engine is first asked to inspect the
    /// image; only a failed inspect leads to a pull.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::ImagePull`] when the pull exits non-zero, with
    /// the captured start of its stderr.
    pub async fn load_image(
        &self,
        image: &str,
        always_pull: bool,
        credentials: Option<&RegistryCredentials>,
    ) -> LaunchResult<()> {
        if !always_pull {
            let command = self.provider.inspect_image_command(image);
            tracing::debug!(command = %shell_join(&command), "Running image inspect command");
            let status = self
                .command(&command)?
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .map_err(|source| self.spawn_error(source))?;
            if status.success() {
                return Ok(());
            }
            tracing::debug!(image, "Image not found, pulling now");
        }

        let log_command = self.provider.redacted_pull_command(image, credentials);
        tracing::debug!(image, command = %shell_join(&log_command), "Pulling image");

        let command = self.provider.pull_command(image, credentials);
        let mut child = self
            .command(&command)?
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| self.spawn_error(source))?;

        let stderr = match child.stderr.take() {
            Some(stderr) => read_bounded(stderr, self.config.stderr_limit).await?,
            None => Vec::new(),
        };
        let status = child.wait().await?;
        if status.success() {
            tracing::info!(image, "Image loaded");
            return Ok(());
        }

        let code = status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        tracing::error!(image, code, stderr = %stderr, "Failed to load image");
        Err(LaunchError::ImagePull {
            image: image.to_string(),
            code,
            stderr,
        })
    }
}

/// Read at most `limit` bytes, then drain and discard the rest so the writer
/// never blocks on a full pipe.
async fn read_bounded<R>(mut reader: R, limit: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    (&mut reader)
        .take(u64::try_from(limit).unwrap_or(u64::MAX))
        .read_to_end(&mut buf)
        .await?;
    tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_read_keeps_prefix() {
        let data = vec![b'x'; 10_000];
        let kept = read_bounded(data.as_slice(), 128).await.unwrap();
        assert_eq!(kept.len(), 128);

        let kept = read_bounded(&b"short"[..], 128).await.unwrap();
        assert_eq!(kept, b"short");
    }
}
