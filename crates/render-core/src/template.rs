//! Page templates: the static formatting a schema's `pdf_template` names.
//!
//! Templates are small JSON documents kept in a templates directory:
//!
//! ```json
//! { "size": "A4", "margins": { "top": 20, "right": 15, "bottom": 20, "left": 15 },
//!   "titleSize": 16, "bodySize": 12, "lineHeight": 10 }
//! ```

use crate::error::RenderError;
use serde::{Deserialize, Deserializer, Serialize, de};
use std::path::{Component, Path, PathBuf};

/// Template used when a schema names none.
pub const DEFAULT_TEMPLATE: &str = "default.json";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    /// Width and height in millimetres.
    Custom { width: f32, height: f32 },
}

impl PageSize {
    fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            "legal" => Ok(PageSize::Legal),
            other => Err(format!("Unknown page size: {}", other)),
        }
    }

    /// `(width, height)` in millimetres.
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match *self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
            PageSize::Custom { width, height } => (width, height),
        }
    }
}

impl<'de> Deserialize<'de> for PageSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum PageSizeDef {
            Str(String),
            Map { width: f32, height: f32 },
        }

        match PageSizeDef::deserialize(deserializer)? {
            PageSizeDef::Str(s) => Self::parse(&s).map_err(de::Error::custom),
            PageSizeDef::Map { width, height } => Ok(PageSize::Custom { width, height }),
        }
    }
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub fn all(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::all(10.0)
    }
}

/// Static formatting applied to every document rendered with a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageTemplate {
    pub size: PageSize,
    pub margins: Margins,
    /// Points.
    pub title_size: f32,
    /// Points.
    pub header_size: f32,
    /// Points.
    pub body_size: f32,
    /// Points.
    pub footer_size: f32,
    /// Height of one text line in millimetres.
    pub line_height: f32,
    /// Vertical gap after the title, in millimetres.
    pub title_spacing: f32,
    pub separator: String,
    /// Width of image blocks without an explicit width, in millimetres.
    pub default_image_width: f32,
    pub show_footer: bool,
}

impl Default for PageTemplate {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margins: Margins::all(10.0),
            title_size: 16.0,
            header_size: 10.0,
            body_size: 12.0,
            footer_size: 8.0,
            line_height: 10.0,
            title_spacing: 10.0,
            separator: ": ".to_string(),
            default_image_width: 80.0,
            show_footer: true,
        }
    }
}

impl PageTemplate {
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        let template: PageTemplate =
            serde_json::from_str(json).map_err(|e| RenderError::Template(e.to_string()))?;
        template.validate()?;
        Ok(template)
    }

    fn validate(&self) -> Result<(), RenderError> {
        let (width, height) = self.size.dimensions_mm();
        if width <= self.margins.left + self.margins.right
            || height <= self.margins.top + self.margins.bottom
        {
            return Err(RenderError::Template(
                "margins leave no printable area".to_string(),
            ));
        }
        if self.line_height <= 0.0 || self.body_size <= 0.0 || self.title_size <= 0.0 {
            return Err(RenderError::Template(
                "font sizes and line height must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Printable width in millimetres.
    pub fn content_width(&self) -> f32 {
        self.size.dimensions_mm().0 - self.margins.left - self.margins.right
    }
}

/// Resolves template references against a directory.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    dir: Option<PathBuf>,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// A store without a directory; every lookup yields the built-in template.
    pub fn builtin() -> Self {
        Self { dir: None }
    }

    /// Returns `None` for references that would escape the directory.
    fn path_for(&self, reference: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let relative = Path::new(reference);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        let mut path = dir.join(relative);
        if path.extension().is_none() {
            path.set_extension("json");
        }
        Some(path)
    }

    fn read(&self, reference: &str) -> Result<Option<PageTemplate>, RenderError> {
        let Some(path) = self.path_for(reference) else {
            log::warn!("Rejected template reference '{}'", reference);
            return Ok(None);
        };
        if !path.is_file() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        PageTemplate::from_json(&json)
            .map(Some)
            .map_err(|e| RenderError::Template(format!("{}: {}", path.display(), e)))
    }

    /// Resolves `reference`, falling back to [`DEFAULT_TEMPLATE`] and then to
    /// the built-in template. Only an existing but invalid file is an error.
    pub fn resolve(&self, reference: Option<&str>) -> Result<PageTemplate, RenderError> {
        let requested = reference.filter(|r| !r.trim().is_empty());
        if let Some(name) = requested {
            if let Some(template) = self.read(name)? {
                return Ok(template);
            }
            log::warn!("PDF template '{}' not found, using {}", name, DEFAULT_TEMPLATE);
        }
        if let Some(template) = self.read(DEFAULT_TEMPLATE)? {
            return Ok(template);
        }
        log::debug!("No {} template available, using built-in layout", DEFAULT_TEMPLATE);
        Ok(PageTemplate::default())
    }
}
