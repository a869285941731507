//! Inline image payloads of the form `<header>,<base64 body>`, as produced by
//! a canvas `toDataURL()` call (`data:image/png;base64,iVBOR...`).

use crate::error::RenderError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Decoded bytes of an inline image payload.
///
/// The buffer lives only as long as the document plan that owns it; it is
/// released when the plan is dropped, whether or not rendering succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Media type from the header, e.g. `image/png`.
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Splits a payload on its first comma into `(header, body)`.
pub fn split_payload(payload: &str) -> Option<(&str, &str)> {
    payload.split_once(',')
}

fn media_type(header: &str) -> Option<String> {
    let rest = header.trim().strip_prefix("data:")?;
    let media = rest.split(';').next()?.trim();
    (!media.is_empty()).then(|| media.to_ascii_lowercase())
}

/// Decodes the payload submitted for `field`.
///
/// Fails when the comma separator is missing, the body is not valid base64,
/// or the body decodes to nothing.
pub fn decode_payload(field: &str, payload: &str) -> Result<DecodedImage, RenderError> {
    let (header, body) = split_payload(payload)
        .ok_or_else(|| RenderError::malformed(field, "missing ',' between header and body"))?;

    let body: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64
        .decode(body.as_bytes())
        .map_err(|e| RenderError::malformed(field, format!("invalid base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(RenderError::malformed(field, "payload body is empty"));
    }

    Ok(DecodedImage {
        media_type: media_type(header),
        bytes,
    })
}
