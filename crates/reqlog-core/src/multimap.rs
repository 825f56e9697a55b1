//! Insertion-ordered multimap used for headers, query params and form data

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered `key -> [values]` map.
///
/// Keys keep the order of their first insertion; values keep insertion
/// order per key. Serializes as a JSON object of string arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiValueMap {
    entries: Vec<(String, Vec<String>)>,
}

impl MultiValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `key`
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Append every value of `other`
    pub fn add_all(&mut self, other: &MultiValueMap) {
        for (key, value) in other.iter() {
            self.add(key, value);
        }
    }

    pub fn get_first(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate `(key, value)` pairs in order, one pair per value
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Iterate `(key, values)` groups in key order
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `{key:[v1, v2]}{key2:[v]}` rendering used in summary lines
    pub fn to_log_string(&self) -> String {
        self.groups()
            .map(|(k, vs)| format!("{{{}:[{}]}}", k, vs.join(", ")))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MultiValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = MultiValueMap::new();
        for (k, v) in iter {
            map.add(k, v);
        }
        map
    }
}

impl Serialize for MultiValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, values) in &self.entries {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}
