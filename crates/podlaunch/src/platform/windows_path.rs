//! Windows path parsing and WSL path translation.
//!
//! Podman on Windows runs inside a WSL virtual machine. Native drive paths are
//! visible there under `/mnt/<drive>`, files inside a WSL distribution are
//! visible at their Linux path, and other network shares are not visible at
//! all. Parsing is done on strings so the rules hold on every host.

use std::fmt;
use std::path::Path;

use podlaunch_common::{LaunchError, LaunchResult};

/// Share hosts that expose WSL distributions to Windows.
const WSL_SHARE_HOSTS: &[&str] = &["wsl$", "wsl.localhost"];

fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Prefix of a Windows path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prefix {
    /// No drive, e.g. `\temp\x` or `relative\x`.
    None,
    /// Drive letter, e.g. `C:`.
    Disk(char),
    /// Network share, e.g. `\\server\share`.
    Unc {
        /// Server name.
        server: String,
        /// Share name.
        share: String,
    },
}

/// A parsed Windows path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowsPath {
    prefix: Prefix,
    rooted: bool,
    components: Vec<String>,
}

impl WindowsPath {
    /// Parse `path`, accepting both `\` and `/` as separators.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::InvalidPath`] for empty paths, embedded NUL
    /// bytes, incomplete UNC prefixes and unsupported device prefixes.
    pub fn parse(path: &str) -> LaunchResult<Self> {
        let invalid = |reason: &str| LaunchError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.is_empty() {
            return Err(invalid("empty path"));
        }
        if path.contains('\0') {
            return Err(invalid("path contains a NUL byte"));
        }

        let chars: Vec<char> = path.chars().collect();
        let (prefix, rest) = if chars.len() >= 2 && is_separator(chars[0]) && is_separator(chars[1])
        {
            Self::parse_double_separator(&path[2..]).map_err(invalid)?
        } else if chars.len() >= 2 && chars[0].is_ascii_alphabetic() && chars[1] == ':' {
            (Prefix::Disk(chars[0].to_ascii_uppercase()), &path[2..])
        } else {
            (Prefix::None, path)
        };

        let rooted = rest.starts_with(is_separator) || matches!(prefix, Prefix::Unc { .. });
        let components = rest
            .split(is_separator)
            .filter(|part| !part.is_empty() && *part != ".")
            .map(str::to_string)
            .collect();

        Ok(Self {
            prefix,
            rooted,
            components,
        })
    }

    /// Parse what follows a leading `\\`: a UNC share or a `\\?\` / `\\.\`
    /// device prefix.
    fn parse_double_separator(rest: &str) -> Result<(Prefix, &str), &'static str> {
        let mut parts = rest.splitn(2, is_separator);
        let first = parts.next().unwrap_or_default();
        let tail = parts.next().unwrap_or_default();

        if first == "?" || first == "." {
            let mut inner = tail.splitn(2, is_separator);
            let head = inner.next().unwrap_or_default();
            let after = inner.next().unwrap_or_default();
            let bytes = head.as_bytes();
            if bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
                let drive = char::from(bytes[0]).to_ascii_uppercase();
                return Ok((Prefix::Disk(drive), &tail[2..]));
            }
            if head.eq_ignore_ascii_case("UNC") {
                return Self::parse_share(after);
            }
            return Err("unsupported device path prefix");
        }
        Self::parse_share(rest)
    }

    fn parse_share(rest: &str) -> Result<(Prefix, &str), &'static str> {
        let mut parts = rest.splitn(3, is_separator);
        let server = parts.next().unwrap_or_default();
        let share = parts.next().unwrap_or_default();
        if server.is_empty() || share.is_empty() {
            return Err("incomplete UNC share, expected \\\\server\\share");
        }
        let consumed = server.len() + 1 + share.len();
        Ok((
            Prefix::Unc {
                server: server.to_string(),
                share: share.to_string(),
            },
            &rest[consumed..],
        ))
    }

    /// The path prefix.
    #[must_use]
    pub const fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// Path components after the prefix and root.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Whether the path names a resource on a network share.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self.prefix, Prefix::Unc { .. })
    }

    /// Whether the path lives on a share exported by a WSL distribution.
    #[must_use]
    pub fn is_wsl_share(&self) -> bool {
        match &self.prefix {
            Prefix::Unc { server, .. } => WSL_SHARE_HOSTS
                .iter()
                .any(|host| server.eq_ignore_ascii_case(host)),
            _ => false,
        }
    }

    /// The path as seen from inside WSL.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::InvalidPath`] for network shares other than the
    /// WSL distribution shares; those are not reachable from the VM.
    pub fn to_wsl(&self) -> LaunchResult<String> {
        let joined = self.components.join("/");
        match &self.prefix {
            Prefix::Disk(drive) => {
                let mut path = format!("/mnt/{}", drive.to_ascii_lowercase());
                if !joined.is_empty() {
                    path.push('/');
                    path.push_str(&joined);
                }
                Ok(path)
            }
            Prefix::Unc { .. } if self.is_wsl_share() => Ok(format!("/{joined}")),
            Prefix::Unc { .. } => Err(LaunchError::InvalidPath {
                path: self.to_string(),
                reason: "network share is not reachable from WSL".to_string(),
            }),
            Prefix::None if self.rooted => Ok(format!("/{joined}")),
            Prefix::None => Ok(joined),
        }
    }
}

impl fmt::Display for WindowsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Prefix::None => {}
            Prefix::Disk(drive) => write!(f, "{drive}:")?,
            Prefix::Unc { server, share } => write!(f, r"\\{server}\{share}")?,
        }
        if self.rooted {
            f.write_str("\\")?;
        }
        f.write_str(&self.components.join("\\"))
    }
}

/// Whether `path` is on a network share.
///
/// Paths that do not parse are not network paths.
#[must_use]
pub fn is_network_path(path: &Path) -> bool {
    WindowsPath::parse(&path.to_string_lossy()).is_ok_and(|path| path.is_network())
}

/// Translate a Windows path to the path WSL sees.
///
/// `C:\x\y` becomes `/mnt/c/x/y`; `\\wsl$\<distro>\home\u` becomes
/// `/home/u`; paths without a drive keep their components with `/`
/// separators.
///
/// # Errors
///
/// Returns [`LaunchError::InvalidPath`] if the path is not a Windows path
/// WSL can reach.
pub fn to_wsl_path(path: &Path) -> LaunchResult<String> {
    let text = path.to_str().ok_or_else(|| LaunchError::InvalidPath {
        path: path.to_string_lossy().into_owned(),
        reason: "path is not valid unicode".to_string(),
    })?;
    WindowsPath::parse(text)?.to_wsl()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_letter_maps_to_mnt() {
        assert_eq!(
            to_wsl_path(Path::new(r"C:\Users\u\profile.json")).unwrap(),
            "/mnt/c/Users/u/profile.json"
        );
        assert_eq!(to_wsl_path(Path::new("d:/data")).unwrap(), "/mnt/d/data");
        assert_eq!(to_wsl_path(Path::new(r"E:\")).unwrap(), "/mnt/e");
    }

    #[test]
    fn wsl_share_drops_prefix() {
        assert_eq!(
            to_wsl_path(Path::new(r"\\wsl$\Ubuntu\home\user\profile.json")).unwrap(),
            "/home/user/profile.json"
        );
        assert_eq!(
            to_wsl_path(Path::new(r"\\wsl.localhost\Ubuntu-18.04\home\u")).unwrap(),
            "/home/u"
        );
    }

    #[test]
    fn no_drive_becomes_posix() {
        assert_eq!(to_wsl_path(Path::new(r"\tmp\x.json")).unwrap(), "/tmp/x.json");
        assert_eq!(to_wsl_path(Path::new("/tmp/x.json")).unwrap(), "/tmp/x.json");
        assert_eq!(to_wsl_path(Path::new(r"rel\x")).unwrap(), "rel/x");
    }

    #[test]
    fn other_shares_are_rejected() {
        let err = to_wsl_path(Path::new(r"\\fileserver\projects\seccomp.json")).unwrap_err();
        assert!(matches!(err, LaunchError::InvalidPath { .. }));
    }

    #[test]
    fn malformed_paths_are_rejected() {
        assert!(WindowsPath::parse("").is_err());
        assert!(WindowsPath::parse(r"\\server").is_err());
        assert!(WindowsPath::parse(r"\\?\GLOBALROOT\x").is_err());
    }

    #[test]
    fn verbatim_prefixes() {
        let path = WindowsPath::parse(r"\\?\C:\work\x").unwrap();
        assert_eq!(path.prefix(), &Prefix::Disk('C'));
        assert_eq!(path.to_wsl().unwrap(), "/mnt/c/work/x");

        let path = WindowsPath::parse(r"\\?\UNC\wsl$\Ubuntu\etc").unwrap();
        assert!(path.is_network());
        assert_eq!(path.to_wsl().unwrap(), "/etc");
    }

    #[test]
    fn network_classification() {
        assert!(is_network_path(Path::new(r"\\wsl$\Ubuntu\home")));
        assert!(is_network_path(Path::new("//server/share/x")));
        assert!(!is_network_path(Path::new(r"C:\Users")));
        assert!(!is_network_path(Path::new("/var/tmp")));
        assert!(!is_network_path(Path::new(r"\\server")));
        assert!(!is_network_path(Path::new(r"\\?\C:\work\x")));
        assert!(!is_network_path(Path::new(r"\\.\D:\data")));
        assert!(is_network_path(Path::new(r"\\?\UNC\server\share\x")));
    }

    #[test]
    fn display_round_trips_shape() {
        let path = WindowsPath::parse(r"\\wsl$\Ubuntu\home\u").unwrap();
        assert_eq!(path.to_string(), r"\\wsl$\Ubuntu\home\u");
    }
}
