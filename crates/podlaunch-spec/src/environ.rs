//! Insertion-ordered environment variables.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Environment variables passed to a container, in insertion order.
///
/// Setting a variable that is already present replaces its value without
/// moving it. Serialized as a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environ(Vec<(String, String)>);

impl Environ {
    /// Create an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if let Some((_, existing)) = self.0.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(existing, value));
        }
        self.0.push((key, value));
        None
    }

    /// Value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no variables are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environ {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut environ = Self::new();
        environ.extend(iter);
        environ
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Environ {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for Environ {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for Environ {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct EnvironVisitor;

impl<'de> Visitor<'de> for EnvironVisitor {
    type Value = Environ;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of environment variable names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut environ = Environ::new();
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            environ.insert(key, value);
        }
        Ok(environ)
    }
}

impl<'de> Deserialize<'de> for Environ {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EnvironVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let environ: Environ = [("ZED", "1"), ("ALPHA", "2"), ("MID", "3")]
            .into_iter()
            .collect();
        let keys: Vec<_> = environ.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["ZED", "ALPHA", "MID"]);
    }

    #[test]
    fn replacing_keeps_position() {
        let mut environ = Environ::new();
        environ.insert("A", "1");
        environ.insert("B", "2");
        assert_eq!(environ.insert("A", "3"), Some("1".to_string()));
        assert_eq!(environ.iter().collect::<Vec<_>>(), [("A", "3"), ("B", "2")]);
    }

    #[test]
    fn deserializes_map_in_document_order() {
        let environ: Environ = serde_json::from_str(r#"{"Z": "z", "A": "a"}"#).unwrap();
        assert_eq!(environ.iter().collect::<Vec<_>>(), [("Z", "z"), ("A", "a")]);
        assert_eq!(
            serde_json::to_string(&environ).unwrap(),
            r#"{"Z":"z","A":"a"}"#
        );
    }
}
