use crate::error::RenderError;
use crate::payload::{DecodedImage, decode_payload};
use crate::template::PageTemplate;
use chrono::NaiveDate;
use formpress_types::{Color, FormSchema, NormalizedValues, StyleConfig};

/// One rendered unit of a document, in field order.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A single `label: value` line.
    Line { text: String },
    /// A label line followed by an embedded image, if one was submitted.
    Image {
        field: String,
        label: String,
        image: Option<DecodedImage>,
        width_mm: f32,
    },
}

/// Everything a backend needs to draw one document.
///
/// Building the plan decodes all inline images up front, so a malformed
/// payload fails before any output is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPlan {
    pub header: Option<String>,
    pub title: String,
    pub blocks: Vec<Block>,
    pub footer: Option<String>,
    pub title_color: Color,
    pub text_color: Color,
}

impl DocumentPlan {
    pub fn build(
        schema: &FormSchema,
        values: &NormalizedValues,
        style: &StyleConfig,
        template: &PageTemplate,
        today: NaiveDate,
    ) -> Result<Self, RenderError> {
        let mut blocks = Vec::new();
        for field in schema.render_fields() {
            let value = values.get_or_empty(&field.name);
            if field.kind.is_image() {
                let image = match value.trim() {
                    "" => None,
                    payload => Some(decode_payload(&field.name, payload)?),
                };
                blocks.push(Block::Image {
                    label: format!("{}:", field.label),
                    width_mm: field.width.unwrap_or(template.default_image_width),
                    field: field.name,
                    image,
                });
            } else {
                blocks.push(Block::Line {
                    text: format!("{}{}{}", field.label, template.separator, value),
                });
            }
        }

        let footer = template.show_footer.then(|| {
            let generated = format!("{}", today.format("%d.%m.%Y"));
            match style.footer_text() {
                Some(text) => format!("{} | {}", text, generated),
                None => generated,
            }
        });

        Ok(Self {
            header: style.company_name().map(str::to_string),
            title: schema.document_title().to_string(),
            blocks,
            footer,
            title_color: style.title_color().unwrap_or(Color::BLACK),
            text_color: style.text_color().unwrap_or(Color::BLACK),
        })
    }

    /// Number of blocks carrying decoded image data.
    pub fn image_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Image { image: Some(_), .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formpress_types::FieldSpec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    fn schema() -> FormSchema {
        FormSchema::new(
            "handover",
            "Handover",
            vec![
                FieldSpec::new("user", "text").with_label("User"),
                FieldSpec::new("rating", "stars"),
                FieldSpec::new("signature", "signature").with_width(50.0),
            ],
        )
    }

    #[test]
    fn builds_one_block_per_field() {
        let values: NormalizedValues = [("user", "Max"), ("signature", "data:x;base64,aGk=")]
            .into_iter()
            .collect();
        let plan = DocumentPlan::build(
            &schema(),
            &values,
            &StyleConfig::new().with("company_name", "ACME"),
            &PageTemplate::default(),
            today(),
        )
        .unwrap();

        assert_eq!(plan.header.as_deref(), Some("ACME"));
        assert_eq!(plan.title, "Handover");
        assert_eq!(plan.blocks[0], Block::Line { text: "User: Max".to_string() });
        // unknown kinds render as text
        assert_eq!(plan.blocks[1], Block::Line { text: "rating: ".to_string() });
        match &plan.blocks[2] {
            Block::Image { label, image, width_mm, .. } => {
                assert_eq!(label, "signature:");
                assert_eq!(image.as_ref().unwrap().bytes, b"hi");
                assert_eq!(*width_mm, 50.0);
            }
            other => panic!("expected image block, got {other:?}"),
        }
        assert_eq!(plan.footer.as_deref(), Some("31.01.2024"));
        assert_eq!(plan.image_count(), 1);
    }

    #[test]
    fn empty_signature_renders_label_only() {
        let plan = DocumentPlan::build(
            &schema(),
            &NormalizedValues::new(),
            &StyleConfig::new(),
            &PageTemplate::default(),
            today(),
        )
        .unwrap();
        assert_eq!(plan.image_count(), 0);
        assert_eq!(plan.header, None);
    }

    #[test]
    fn malformed_signature_fails_the_plan() {
        let values: NormalizedValues = [("signature", "no-separator")].into_iter().collect();
        let err = DocumentPlan::build(
            &schema(),
            &values,
            &StyleConfig::new(),
            &PageTemplate::default(),
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::MalformedPayload { .. }));
    }

    #[test]
    fn footer_combines_style_text_and_date() {
        let template = PageTemplate::default();
        let style = StyleConfig::new().with("footer_text", "Internal");
        let plan =
            DocumentPlan::build(&schema(), &NormalizedValues::new(), &style, &template, today())
                .unwrap();
        assert_eq!(plan.footer.as_deref(), Some("Internal | 31.01.2024"));

        let quiet = PageTemplate {
            show_footer: false,
            ..PageTemplate::default()
        };
        let plan =
            DocumentPlan::build(&schema(), &NormalizedValues::new(), &style, &quiet, today())
                .unwrap();
        assert_eq!(plan.footer, None);
    }
}
