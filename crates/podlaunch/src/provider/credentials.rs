//! Registry credentials for image pulls.

use std::fmt;

/// Text shown in place of credentials in logs.
pub const REDACTED: &str = "<REDACTED>";

/// Username and password for a registry.
///
/// `Debug` and `Display` never reveal the password.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    username: String,
    password: String,
}

impl RegistryCredentials {
    /// Create credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse `user:password`. The password may contain `:`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let (username, password) = value.split_once(':')?;
        Some(Self::new(username, password))
    }

    /// Username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The `user:password` value passed to `--creds`.
    #[must_use]
    pub fn to_creds_arg(&self) -> String {
        format!("{}:{}", self.username, self.password)
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}

impl fmt::Display for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creds_arg() {
        let creds = RegistryCredentials::new("robot", "s3cr:et");
        assert_eq!(creds.to_creds_arg(), "robot:s3cr:et");
    }

    #[test]
    fn parse_splits_on_first_colon() {
        let creds = RegistryCredentials::parse("robot:s3cr:et").unwrap();
        assert_eq!(creds.username(), "robot");
        assert_eq!(creds.to_creds_arg(), "robot:s3cr:et");
        assert!(RegistryCredentials::parse("no-separator").is_none());
    }

    #[test]
    fn password_never_formatted() {
        let creds = RegistryCredentials::new("robot", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
        assert_eq!(creds.to_string(), REDACTED);
    }
}
