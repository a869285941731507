//! Declarative form definitions.
//!
//! A [`FormSchema`] is parsed once from a definition file and never mutated
//! afterwards; the catalog that owns it is replaced as a whole on reload.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Title used when neither the PDF overrides nor the schema provide one.
pub const FALLBACK_TITLE: &str = "Form";

/// The `default` policy keyword that resolves to the current date.
pub const DEFAULT_TODAY: &str = "today";

/// The closed set of field kinds a form can declare.
///
/// Unknown type strings are preserved in [`FieldKind::Other`] and treated as
/// plain text everywhere, so newer definitions keep working with older builds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    #[default]
    Text,
    Date,
    Select,
    /// Inline-encoded image data; `image` is accepted as an alias.
    Signature,
    Other(String),
}

impl FieldKind {
    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Date => "date",
            FieldKind::Select => "select",
            FieldKind::Signature => "signature",
            FieldKind::Other(name) => name,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, FieldKind::Signature)
    }
}

impl From<String> for FieldKind {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "" => FieldKind::Text,
            "date" => FieldKind::Date,
            "select" => FieldKind::Select,
            "signature" | "image" => FieldKind::Signature,
            _ => FieldKind::Other(value),
        }
    }
}

impl From<&str> for FieldKind {
    fn from(value: &str) -> Self {
        FieldKind::from(value.to_string())
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One input declared by a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: FieldKind,
    /// Only meaningful for `select` fields.
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub in_filename: bool,
    /// Choices offered by `select` fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Rendered width in millimetres for image fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: impl Into<FieldKind>) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind: kind.into(),
            multiple: false,
            default: None,
            in_filename: false,
            options: Vec::new(),
            width: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn in_filename(mut self) -> Self {
        self.in_filename = true;
        self
    }

    pub fn with_width(mut self, width_mm: f32) -> Self {
        self.width = Some(width_mm);
        self
    }

    /// The label shown to users, falling back to the field name.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn is_multi_select(&self) -> bool {
        self.kind == FieldKind::Select && self.multiple
    }

    /// Resolves the `default` policy against `today`.
    ///
    /// `today` only has meaning for date fields; every other default string is
    /// returned verbatim.
    pub fn resolve_default(&self, today: NaiveDate) -> Option<String> {
        let default = self.default.as_deref()?;
        if self.kind == FieldKind::Date && default.eq_ignore_ascii_case(DEFAULT_TODAY) {
            Some(today.format("%Y-%m-%d").to_string())
        } else {
            Some(default.to_string())
        }
    }
}

fn is_positive(width: f32) -> bool {
    width.is_finite() && width > 0.0
}

/// A single entry of the legacy `pdf.fields` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfFieldOverride {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
}

/// Legacy `pdf:` section that overrides the document title and block list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<PdfFieldOverride>,
}

/// A field as the renderer sees it, after applying any PDF overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub width: Option<f32>,
}

/// A form definition loaded from one schema file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    /// Filled from the file stem by the loader when the file omits it.
    #[serde(default, rename = "form_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default, rename = "pdf_template", skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<PdfOverrides>,
}

impl FormSchema {
    pub fn new(id: impl Into<String>, title: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            fields,
            template: None,
            pdf: None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields whose values make up the permanent filename, in declared order.
    pub fn filename_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.in_filename)
    }

    /// Checks the structural invariants the serde model cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("form id is empty".to_string());
        }
        let mut seen = HashSet::new();
        for (index, field) in self.fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(format!("field #{} has an empty name", index + 1));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(format!("field '{}' is declared more than once", field.name));
            }
            if let Some(width) = field.width.filter(|w| !is_positive(*w)) {
                return Err(format!("field '{}' has non-positive width {}", field.name, width));
            }
        }
        if let Some(pdf) = &self.pdf
            && let Some(entry) = pdf.fields.iter().find(|f| f.field.trim().is_empty())
        {
            return Err(format!(
                "pdf field with label '{}' has no field reference",
                entry.label.as_deref().unwrap_or_default()
            ));
        }
        if let Some(pdf) = &self.pdf
            && let Some(entry) = pdf.fields.iter().find(|f| f.width.is_some_and(|w| !is_positive(w)))
        {
            return Err(format!("pdf field '{}' has a non-positive width", entry.field));
        }
        Ok(())
    }

    /// Document title: `pdf.title`, then `title`, then [`FALLBACK_TITLE`].
    pub fn document_title(&self) -> &str {
        self.pdf
            .as_ref()
            .and_then(|pdf| pdf.title.as_deref())
            .filter(|t| !t.trim().is_empty())
            .or_else(|| Some(self.title.as_str()).filter(|t| !t.trim().is_empty()))
            .unwrap_or(FALLBACK_TITLE)
    }

    /// The ordered block list for rendering.
    ///
    /// A non-empty `pdf.fields` section replaces the declared fields; widths
    /// missing from an override entry are taken from the matching field.
    pub fn render_fields(&self) -> Vec<RenderField> {
        match self.pdf.as_ref().filter(|pdf| !pdf.fields.is_empty()) {
            Some(pdf) => pdf
                .fields
                .iter()
                .map(|entry| RenderField {
                    name: entry.field.clone(),
                    label: entry.label.clone().unwrap_or_else(|| entry.field.clone()),
                    kind: entry.kind.clone(),
                    width: entry
                        .width
                        .or_else(|| self.field(&entry.field).and_then(|f| f.width)),
                })
                .collect(),
            None => self
                .fields
                .iter()
                .map(|field| RenderField {
                    name: field.name.clone(),
                    label: field.display_label().to_string(),
                    kind: field.kind.clone(),
                    width: field.width,
                })
                .collect(),
        }
    }
}

/// The `(id, title)` pair shown in form listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSummary {
    pub id: String,
    pub title: String,
}

impl From<&FormSchema> for FormSummary {
    fn from(schema: &FormSchema) -> Self {
        Self {
            id: schema.id.clone(),
            title: schema.title.clone(),
        }
    }
}
