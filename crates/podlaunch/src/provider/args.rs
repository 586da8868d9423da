//! Engine flag encoding.
//!
//! Everything here produces argument vectors for direct process execution.
//! Nothing is shell-escaped; [`shell_join`] exists only to render a vector for
//! humans in log lines.

use podlaunch_common::{LaunchError, LaunchResult};

/// `--mount` flag.
pub const MOUNT_FLAG: &str = "--mount";
/// `--env` flag.
pub const ENV_FLAG: &str = "--env";
/// `--annotation` flag.
pub const ANNOTATION_FLAG: &str = "--annotation";

/// Join options into `k1=v1,k2=v2,...` keeping their order.
pub fn make_mount<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k.as_ref(), v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// `["--mount", "k1=v1,..."]`.
pub fn mount_args<K, V>(params: &[(K, V)]) -> [String; 2]
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    [MOUNT_FLAG.to_string(), make_mount(params)]
}

/// One `flag k=v` pair per entry, flattened, in iteration order.
pub fn key_value_args<'a, I>(flag: &str, entries: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    entries
        .into_iter()
        .flat_map(|(k, v)| [flag.to_string(), format!("{k}={v}")])
        .collect()
}

/// `--env k=v` for each entry.
pub fn env_args<'a, I>(environ: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    key_value_args(ENV_FLAG, environ)
}

/// `--annotation k=v` for each entry.
pub fn annotation_args<'a, I>(annotations: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    key_value_args(ANNOTATION_FLAG, annotations)
}

/// Split a `k1=v1,k2=v2` mount string back into its pairs.
///
/// Values may contain `=`; only the first one separates key from value.
///
/// # Errors
///
/// Returns [`LaunchError::InvalidMount`] if an item has no `=` or an empty key.
pub fn parse_mount_options(options: &str) -> LaunchResult<Vec<(String, String)>> {
    options
        .split(',')
        .map(|item| match item.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(LaunchError::InvalidMount {
                message: format!("expected key=value, got '{item}'"),
            }),
        })
        .collect()
}

/// Quote a single word for a POSIX shell.
pub fn shell_quote(word: &str) -> String {
    const SAFE: &[char] = &['@', '%', '+', '=', ':', ',', '.', '/', '-', '_'];

    if word.is_empty() {
        return "''".to_string();
    }
    if word
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || SAFE.contains(&c))
    {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r#"'"'"'"#))
}

/// Render an argument vector as a shell command line, for logs.
pub fn shell_join<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| shell_quote(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_keeps_order() {
        let args = mount_args(&[("type", "volume"), ("target", "/cache"), ("chown", "true")]);
        assert_eq!(args, ["--mount", "type=volume,target=/cache,chown=true"]);
    }

    #[test]
    fn env_pairs() {
        let args = env_args([("ENV_VAR0", "VAL0"), ("ENV_VAR1", "VAL1")]);
        assert_eq!(
            args,
            ["--env", "ENV_VAR0=VAL0", "--env", "ENV_VAR1=VAL1"]
        );
    }

    #[test]
    fn annotation_pairs() {
        let args = annotation_args([("a.b", "1")]);
        assert_eq!(args, ["--annotation", "a.b=1"]);
    }

    #[test]
    fn empty_mappings_produce_nothing() {
        assert!(env_args(std::iter::empty::<(&str, &str)>()).is_empty());
    }

    #[test]
    fn parse_keeps_equals_in_values() {
        let parsed = parse_mount_options("type=image,source=repo/img:tag,target=/d=x").unwrap();
        assert_eq!(parsed[2], ("target".to_string(), "/d=x".to_string()));
    }

    #[test]
    fn parse_rejects_bare_words() {
        assert!(parse_mount_options("type=bind,readonly").is_err());
        assert!(parse_mount_options("=x").is_err());
    }

    #[test]
    fn shell_quoting() {
        assert_eq!(shell_quote("podman"), "podman");
        assert_eq!(shell_quote("type=bind,source=/a"), "type=bind,source=/a");
        assert_eq!(shell_quote("touch /data/new && ls"), "'touch /data/new && ls'");
        assert_eq!(shell_quote("it's"), r#"'it'"'"'s'"#);
        assert_eq!(shell_quote(""), "''");
        assert_eq!(
            shell_join(&["sh", "-c", "echo hi"]),
            "sh -c 'echo hi'"
        );
    }
}
