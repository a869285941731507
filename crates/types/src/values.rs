use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Raw values as submitted by a client, keyed by field name.
///
/// Every key may carry several values in submission order, which is how
/// multi-select inputs arrive. Single-valued lookups read the first value.
/// Deserializes from a map whose values are strings or lists of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubmittedValues {
    values: HashMap<String, Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for SubmittedValues {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = HashMap::<String, OneOrMany>::deserialize(deserializer)?;
        let values = raw
            .into_iter()
            .map(|(name, value)| match value {
                OneOrMany::One(value) => (name, vec![value]),
                OneOrMany::Many(values) => (name, values),
            })
            .collect();
        Ok(Self { values })
    }
}

impl SubmittedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` to the values submitted for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    /// Builder-style [`SubmittedValues::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SubmittedValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut submitted = SubmittedValues::new();
        for (name, value) in iter {
            submitted.insert(name, value);
        }
        submitted
    }
}

/// One display string per schema field, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedValues {
    entries: Vec<(String, String)>,
}

impl NormalizedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing an earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The value for `name`, or an empty string when absent.
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NormalizedValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut normalized = NormalizedValues::new();
        for (name, value) in iter {
            normalized.insert(name, value);
        }
        normalized
    }
}
