use lopdf::{Document as LopdfDocument, Encoding, Object};

fn push_strings(encoding: Option<&Encoding>, object: &Object, out: &mut String) {
    match object {
        Object::String(bytes, _) => match encoding.map(|e| LopdfDocument::decode_text(e, bytes)) {
            Some(Ok(decoded)) => out.push_str(&decoded),
            _ => out.push_str(&String::from_utf8_lossy(bytes)),
        },
        Object::Array(items) => items.iter().for_each(|item| push_strings(encoding, item, out)),
        _ => {}
    }
}

/// Text shown by `Tj`/`TJ`/`'`/`"` operators, page by page, decoded through
/// the font selected by the preceding `Tf`.
pub fn extract_text(doc: &LopdfDocument) -> String {
    let mut text = String::new();
    for page_id in doc.get_pages().values() {
        let Ok(content) = doc.get_and_decode_page_content(*page_id) else {
            continue;
        };
        let fonts = doc.get_page_fonts(*page_id).unwrap_or_default();
        let mut encoding = None;
        for op in &content.operations {
            match op.operator.as_str() {
                "Tf" => {
                    encoding = op
                        .operands
                        .first()
                        .and_then(|name| name.as_name().ok())
                        .and_then(|name| fonts.get(name))
                        .and_then(|font| font.get_font_encoding(doc).ok());
                }
                "Tj" | "TJ" | "\'" | "\"" => {
                    op.operands
                        .iter()
                        .for_each(|operand| push_strings(encoding.as_ref(), operand, &mut text));
                    text.push('\n');
                }
                _ => {}
            }
        }
    }
    text
}

/// Number of image XObjects in the file.
pub fn count_images(doc: &LopdfDocument) -> usize {
    doc.objects
        .values()
        .filter(|object| match object {
            Object::Stream(stream) => stream
                .dict
                .get(b"Subtype")
                .and_then(Object::as_name)
                .is_ok_and(|name| name == b"Image"),
            _ => false,
        })
        .count()
}

pub fn assert_contains_line(text: &str, expected: &str) {
    assert!(
        text.lines().any(|line| line.trim() == expected.trim()),
        "expected a line '{}' in:\n{}",
        expected,
        text
    );
}
