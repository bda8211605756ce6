use lopdf::Document as LopdfDocument;
use std::collections::BTreeSet;

/// Concatenated content streams of all pages.
///
/// Text is drawn with WinAnsiEncoding literal strings, so ASCII runs can be matched as
/// `(text)` directly.
pub fn content_text(doc: &LopdfDocument) -> String {
    let mut text = String::new();
    for page_id in doc.get_pages().values() {
        if let Ok(content) = doc.get_page_content(*page_id) {
            text.push_str(&String::from_utf8_lossy(&content));
            text.push('\n');
        }
    }
    text
}

/// BaseFont names of every font dictionary in the file.
pub fn extract_font_names(doc: &LopdfDocument) -> BTreeSet<String> {
    doc.objects
        .values()
        .filter_map(|obj| obj.as_dict().ok())
        .filter(|dict| matches!(dict.get(b"Type").and_then(|t| t.as_name()), Ok(b"Font")))
        .filter_map(|dict| dict.get(b"BaseFont").and_then(|f| f.as_name()).ok())
        .map(|name| String::from_utf8_lossy(name).to_string())
        .collect()
}

/// Assert that a text run with exactly this content is drawn somewhere in the PDF
#[macro_export]
macro_rules! assert_pdf_shows {
    ($pdf:expr, $text:expr) => {
        let content = $crate::common::pdf_assertions::content_text(&$pdf.doc);
        let needle = format!("({})", $text);
        assert!(
            content.contains(&needle),
            "PDF should show '{}', but content was:\n{}",
            $text,
            content
        );
    };
}

/// Assert that no text run has this content
#[macro_export]
macro_rules! assert_pdf_not_shows {
    ($pdf:expr, $text:expr) => {
        let content = $crate::common::pdf_assertions::content_text(&$pdf.doc);
        let needle = format!("({})", $text);
        assert!(
            !content.contains(&needle),
            "PDF should NOT show '{}', but it was found in:\n{}",
            $text,
            content
        );
    };
}

/// Assert the number of pages in a PDF
#[macro_export]
macro_rules! assert_pdf_page_count {
    ($pdf:expr, $count:expr) => {
        assert_eq!(
            $pdf.page_count(),
            $count,
            "Expected {} pages, got {}",
            $count,
            $pdf.page_count()
        );
    };
}
