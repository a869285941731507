use formpress_render_core::{Block, DecodedImage, DocumentPlan, DocumentRenderer, PageTemplate, RenderError};
use formpress_types::Color;
use printpdf::font::ParsedFont;
use printpdf::image::RawImage;
use printpdf::matrix::TextMatrix;
use printpdf::ops::Op;
use printpdf::text::TextItem;
use printpdf::xobject::{XObject, XObjectTransform};
use printpdf::{FontId, Mm, PdfDocument, PdfPage, PdfSaveOptions, Pt, Rgb, XObjectId};

/// Average Helvetica glyph advance as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;
/// Distance from the top of a text line to its baseline, as a fraction of the font size.
const BASELINE_RATIO: f32 = 0.8;

/// Helvetica faces with Latin-1 coverage, embedded so umlauts and other
/// non-ASCII input keep their glyphs.
static REGULAR_TTF: &[u8] = include_bytes!("../assets/fonts/Helvetica.ttf");
static BOLD_TTF: &[u8] = include_bytes!("../assets/fonts/Helvetica-Bold.ttf");

fn mm_to_pt(mm: f32) -> f32 {
    Mm(mm).into_pt().0
}

fn pt_to_mm(pt: f32) -> f32 {
    pt / mm_to_pt(1.0)
}

fn to_pdf_color(c: Color) -> printpdf::color::Color {
    let (r, g, b) = c.to_unit_rgb();
    printpdf::color::Color::Rgb(Rgb::new(r, g, b, None))
}

/// Approximate rendered width of `text` in points.
fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_WIDTH
}

/// Greedy word wrap against an approximate line width.
///
/// Explicit newlines always break; words longer than a line are split.
fn wrap_text(text: &str, size: f32, max_width_pt: f32) -> Vec<String> {
    let max_chars = ((max_width_pt / (size * AVG_GLYPH_WIDTH)).floor() as usize).max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ') {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let word: String = word.into_iter().collect();
            let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
            if !current.is_empty() && needed > max_chars {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        lines.push(current);
    }
    lines
}

#[derive(Debug, Clone, Copy)]
enum Face {
    Regular,
    Bold,
}

struct Fonts {
    regular: FontId,
    bold: FontId,
}

impl Fonts {
    fn embed(document: &mut PdfDocument) -> Result<Self, RenderError> {
        Ok(Self {
            regular: embed_font(document, REGULAR_TTF, "Helvetica")?,
            bold: embed_font(document, BOLD_TTF, "Helvetica-Bold")?,
        })
    }

    fn get(&self, face: Face) -> FontId {
        match face {
            Face::Regular => self.regular.clone(),
            Face::Bold => self.bold.clone(),
        }
    }
}

fn embed_font(document: &mut PdfDocument, bytes: &[u8], name: &str) -> Result<FontId, RenderError> {
    let mut warnings = Vec::new();
    let font = ParsedFont::from_bytes(bytes, 0, &mut warnings)
        .ok_or_else(|| RenderError::Pdf(format!("failed to parse built-in font {name}")))?;
    Ok(document.add_font(&font))
}

/// Draws a [`DocumentPlan`] with embedded Helvetica faces.
#[derive(Debug, Clone, Default)]
pub struct PrintpdfRenderer;

impl PrintpdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for PrintpdfRenderer {
    fn render(&self, plan: &DocumentPlan, template: &PageTemplate) -> Result<Vec<u8>, RenderError> {
        let mut document = PdfDocument::new(&plan.title);
        let fonts = Fonts::embed(&mut document)?;
        let mut layout = PageLayouter::new(&mut document, template, fonts);

        if let Some(header) = &plan.header {
            layout.text_line(header, template.header_size, Face::Regular, plan.text_color, false);
        }
        layout.text_line(&plan.title, template.title_size, Face::Bold, plan.title_color, true);
        layout.advance(template.title_spacing);

        for block in &plan.blocks {
            match block {
                Block::Line { text } => layout.wrapped_text(text, plan.text_color),
                Block::Image { field, label, image, width_mm } => {
                    layout.wrapped_text(label, plan.text_color);
                    if let Some(image) = image {
                        layout.image(field, image, *width_mm)?;
                    }
                }
            }
        }

        let pages = layout.finish(plan.footer.as_deref(), plan.text_color);
        log::debug!("Rendered '{}' into {} page(s)", plan.title, pages.len());
        document.pages.extend(pages);

        let mut buffer = Vec::new();
        let mut warnings = Vec::new();
        document.save_writer(&mut buffer, &PdfSaveOptions::default(), &mut warnings);
        if buffer.is_empty() {
            return Err(RenderError::Pdf("PDF writer produced no output".to_string()));
        }
        Ok(buffer)
    }

    fn name(&self) -> &'static str {
        "PrintpdfRenderer"
    }
}

/// Top-down flow layout over as many pages as the content needs.
struct PageLayouter<'a> {
    document: &'a mut PdfDocument,
    template: &'a PageTemplate,
    fonts: Fonts,
    page_width: f32,
    page_height: f32,
    finished: Vec<Vec<Op>>,
    ops: Vec<Op>,
    /// Distance of the next block from the top edge, in millimetres.
    cursor: f32,
}

impl<'a> PageLayouter<'a> {
    fn new(document: &'a mut PdfDocument, template: &'a PageTemplate, fonts: Fonts) -> Self {
        let (page_width, page_height) = template.size.dimensions_mm();
        Self {
            document,
            template,
            fonts,
            page_width,
            page_height,
            finished: Vec::new(),
            ops: Vec::new(),
            cursor: template.margins.top,
        }
    }

    /// Lowest y (from top) content may reach; the footer lives below it.
    fn content_bottom(&self) -> f32 {
        let footer = if self.template.show_footer {
            pt_to_mm(self.template.footer_size) * 2.0
        } else {
            0.0
        };
        self.page_height - self.template.margins.bottom - footer
    }

    fn at_page_top(&self) -> bool {
        self.cursor <= self.template.margins.top
    }

    fn new_page(&mut self) {
        self.finished.push(std::mem::take(&mut self.ops));
        self.cursor = self.template.margins.top;
    }

    fn ensure_space(&mut self, height: f32) {
        if self.cursor + height > self.content_bottom() && !self.at_page_top() {
            self.new_page();
        }
    }

    fn advance(&mut self, mm: f32) {
        self.cursor += mm;
    }

    fn draw_text(&mut self, text: &str, x_mm: f32, top_mm: f32, size: f32, face: Face, color: Color) {
        let font = self.fonts.get(face);
        let baseline = mm_to_pt(self.page_height - top_mm) - size * BASELINE_RATIO;
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetFillColor { col: to_pdf_color(color) });
        self.ops.push(Op::SetFontSize { size: Pt(size), font: font.clone() });
        self.ops.push(Op::SetTextMatrix {
            matrix: TextMatrix::Translate(Pt(mm_to_pt(x_mm)), Pt(baseline)),
        });
        self.ops.push(Op::WriteText {
            items: vec![TextItem::Text(text.to_string())],
            font,
        });
        self.ops.push(Op::EndTextSection);
    }

    fn text_line(&mut self, text: &str, size: f32, face: Face, color: Color, centered: bool) {
        let height = self.template.line_height.max(pt_to_mm(size) * 1.2);
        self.ensure_space(height);
        let x = if centered {
            let width = pt_to_mm(approx_text_width(text, size));
            self.template.margins.left + ((self.template.content_width() - width) / 2.0).max(0.0)
        } else {
            self.template.margins.left
        };
        self.draw_text(text, x, self.cursor, size, face, color);
        self.advance(height);
    }

    fn wrapped_text(&mut self, text: &str, color: Color) {
        let size = self.template.body_size;
        for line in wrap_text(text, size, mm_to_pt(self.template.content_width())) {
            self.text_line(&line, size, Face::Regular, color, false);
        }
    }

    fn image(&mut self, field: &str, image: &DecodedImage, width_mm: f32) -> Result<(), RenderError> {
        let mut warnings = Vec::new();
        let raw = RawImage::decode_from_bytes(&image.bytes, &mut warnings).map_err(|e| RenderError::Image {
            field: field.to_string(),
            reason: e.to_string(),
        })?;
        let (px_w, px_h) = (raw.width as f32, raw.height as f32);
        if px_w <= 0.0 || px_h <= 0.0 {
            return Err(RenderError::Image {
                field: field.to_string(),
                reason: "image has no pixels".to_string(),
            });
        }

        let max_height = self.content_bottom() - self.template.margins.top;
        let requested = if width_mm.is_finite() && width_mm > 0.0 {
            width_mm
        } else {
            log::warn!("Image '{}' has width {}mm, using the content width", field, width_mm);
            self.template.content_width()
        };
        let mut width = requested.min(self.template.content_width());
        let mut height = width * px_h / px_w;
        if height > max_height {
            width *= max_height / height;
            height = max_height;
        }
        self.ensure_space(height);

        let xobj_id = XObjectId::new();
        self.document
            .resources
            .xobjects
            .map
            .insert(xobj_id.clone(), XObject::Image(raw));

        let bottom = mm_to_pt(self.page_height - (self.cursor + height));
        let transform = XObjectTransform {
            translate_x: Some(Pt(mm_to_pt(self.template.margins.left))),
            translate_y: Some(Pt(bottom)),
            scale_x: Some(mm_to_pt(width) / px_w),
            scale_y: Some(mm_to_pt(height) / px_h),
            rotate: None,
            dpi: Some(72.0),
        };
        self.ops.push(Op::UseXobject { id: xobj_id, transform });
        self.advance(height + self.template.line_height / 2.0);
        Ok(())
    }

    /// Closes the last page and stamps the footer onto every page.
    fn finish(mut self, footer: Option<&str>, color: Color) -> Vec<PdfPage> {
        self.finished.push(std::mem::take(&mut self.ops));
        let total = self.finished.len();
        let pages = std::mem::take(&mut self.finished);

        pages
            .into_iter()
            .enumerate()
            .map(|(index, ops)| {
                self.ops = ops;
                if let Some(footer) = footer {
                    let size = self.template.footer_size;
                    let top = self.page_height - self.template.margins.bottom - pt_to_mm(size);
                    self.draw_text(footer, self.template.margins.left, top, size, Face::Regular, color);

                    let counter = format!("{} / {}", index + 1, total);
                    let x = self.page_width
                        - self.template.margins.right
                        - pt_to_mm(approx_text_width(&counter, size));
                    self.draw_text(&counter, x, top, size, Face::Regular, color);
                }
                PdfPage::new(
                    Mm(self.page_width),
                    Mm(self.page_height),
                    std::mem::take(&mut self.ops),
                )
            })
            .collect()
    }
}
