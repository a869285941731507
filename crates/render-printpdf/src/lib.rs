//! PDF renderer for form documents using printpdf.
//!
//! Text is drawn with Helvetica faces compiled into the crate and embedded
//! (subset) into every document, so Latin-1 input keeps its glyphs. Pages
//! break automatically when a form outgrows one page.

mod renderer;

pub use renderer::PrintpdfRenderer;
