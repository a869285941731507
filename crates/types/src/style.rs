use crate::color::Color;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub const KEY_COMPANY_NAME: &str = "company_name";
pub const KEY_PRIMARY_COLOR: &str = "primary_color";
pub const KEY_BRAND_COLOR: &str = "brand_color";
pub const KEY_TEXT_COLOR: &str = "text_color";
pub const KEY_FOOTER_TEXT: &str = "footer_text";

/// Process-wide presentation parameters applied to every document.
///
/// The mapping is flat: scalar values are kept as strings, nested values are
/// dropped. Absence of a key is never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StyleConfig {
    entries: BTreeMap<String, String>,
}

impl StyleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn company_name(&self) -> Option<&str> {
        self.get(KEY_COMPANY_NAME)
    }

    pub fn footer_text(&self) -> Option<&str> {
        self.get(KEY_FOOTER_TEXT)
    }

    /// Title colour: `primary_color`, then `brand_color`.
    pub fn title_color(&self) -> Option<Color> {
        self.color(KEY_PRIMARY_COLOR)
            .or_else(|| self.color(KEY_BRAND_COLOR))
    }

    pub fn text_color(&self) -> Option<Color> {
        self.color(KEY_TEXT_COLOR)
    }

    fn color(&self, key: &str) -> Option<Color> {
        let raw = self.get(key)?;
        match Color::parse_hex(raw) {
            Ok(color) => Some(color),
            Err(e) => {
                log::debug!("Ignoring style key '{}': {}", key, e);
                None
            }
        }
    }
}

impl<'de> Deserialize<'de> for StyleConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Scalar {
            Str(String),
            Int(i64),
            Float(f64),
            Bool(bool),
            Nested(serde::de::IgnoredAny),
        }

        let raw = Option::<BTreeMap<String, Scalar>>::deserialize(deserializer)?;
        let entries = raw
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    Scalar::Str(s) => s,
                    Scalar::Int(i) => i.to_string(),
                    Scalar::Float(f) => f.to_string(),
                    Scalar::Bool(b) => b.to_string(),
                    Scalar::Nested(_) => return None,
                };
                Some((key, value))
            })
            .collect();
        Ok(StyleConfig { entries })
    }
}
