// PDF text extraction for uploaded documents.
// Parsing itself is delegated to `pdf-extract`; this module only enforces page rules.

use thiserror::Error;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF-";
// Readers accept the header anywhere in the first kilobyte.
const HEADER_SCAN_LIMIT: usize = 1024;

#[derive(Error, Debug)]
pub enum DocumentParseError {
    #[error("the uploaded file is not a PDF document")]
    NotPdf,

    #[error("failed to parse PDF: {0}")]
    Malformed(String),

    #[error("the PDF document has no pages")]
    NoPages,

    #[error("page {page} has no extractable text")]
    EmptyPage { page: usize },
}

/// Text of one uploaded document, pages concatenated in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentText {
    text: String,
    page_count: usize,
}

impl DocumentText {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Returns true if the `%PDF-` signature appears within the first kilobyte.
pub fn is_pdf(head: &[u8]) -> bool {
    let limit = head.len().min(HEADER_SCAN_LIMIT);
    head[..limit]
        .windows(PDF_MAGIC.len())
        .any(|window| window == PDF_MAGIC)
}

/// Extracts the text of a PDF stored fully in memory.
pub fn extract_document_text(bytes: &[u8]) -> Result<DocumentText, DocumentParseError> {
    if !is_pdf(bytes) {
        return Err(DocumentParseError::NotPdf);
    }

    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| DocumentParseError::Malformed(e.to_string()))?;

    join_pages(pages)
}

/// Same as [`extract_document_text`], but on the blocking pool.
/// A panic inside the parser surfaces as [`DocumentParseError::Malformed`].
pub async fn extract_document_text_blocking(
    bytes: Vec<u8>,
) -> Result<DocumentText, DocumentParseError> {
    tokio::task::spawn_blocking(move || extract_document_text(&bytes))
        .await
        .map_err(|e| DocumentParseError::Malformed(format!("PDF parser aborted: {}", e)))?
}

/// Concatenates per-page text with no separator.
/// Every page must contribute some non-whitespace text.
pub fn join_pages(pages: Vec<String>) -> Result<DocumentText, DocumentParseError> {
    if pages.is_empty() {
        return Err(DocumentParseError::NoPages);
    }

    let page_count = pages.len();
    let mut text = String::with_capacity(pages.iter().map(String::len).sum());

    for (index, page) in pages.iter().enumerate() {
        if page.trim().is_empty() {
            return Err(DocumentParseError::EmptyPage { page: index + 1 });
        }
        debug!("Page {} yielded {} bytes of text", index + 1, page.len());
        text.push_str(page);
    }

    Ok(DocumentText { text, page_count })
}

#[cfg(test)]
pub(crate) fn document_from_pages(pages: &[&str]) -> DocumentText {
    join_pages(pages.iter().map(|p| p.to_string()).collect()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes a minimal uncompressed PDF with one Helvetica text line per page.
    fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let font_id = 3 + pages.len() * 2;
        let kids: Vec<String> = (0..pages.len())
            .map(|i| format!("{} 0 R", 3 + i * 2))
            .collect();

        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                pages.len()
            ),
        ];
        for (i, text) in pages.iter().enumerate() {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R /Resources << /Font << /F1 {} 0 R >> >> >>",
                4 + i * 2,
                font_id
            ));
            let stream = format!("BT /F1 24 Tf 72 700 Td ({}) Tj ET", text);
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                stream.len(),
                stream
            ));
        }
        objects.push(
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        );

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_offset = out.len();
        let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            tail.push_str(&format!("{:010} 00000 n \n", offset));
        }
        tail.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        ));
        out.extend_from_slice(tail.as_bytes());
        out
    }

    #[test]
    fn detects_pdf_signature() {
        assert!(is_pdf(b"%PDF-1.7\n"));
        assert!(is_pdf(b"\x00\x00junk%PDF-1.4"));
        assert!(!is_pdf(b"<html></html>"));
        assert!(!is_pdf(b""));
    }

    #[test]
    fn ignores_signature_past_first_kilobyte() {
        let mut bytes = vec![b' '; HEADER_SCAN_LIMIT];
        bytes.extend_from_slice(b"%PDF-1.4");
        assert!(!is_pdf(&bytes));
    }

    #[test]
    fn joins_pages_without_separator() {
        let doc = join_pages(vec!["ABC".into(), "DEF".into(), "GHI".into()]).unwrap();
        assert_eq!(doc.text(), "ABCDEFGHI");
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.char_count(), 9);
    }

    #[test]
    fn rejects_document_without_pages() {
        assert!(matches!(join_pages(Vec::new()), Err(DocumentParseError::NoPages)));
    }

    #[test]
    fn rejects_page_without_text() {
        let err = join_pages(vec!["first".into(), " \n ".into(), "third".into()]).unwrap_err();
        assert!(matches!(err, DocumentParseError::EmptyPage { page: 2 }));
        assert_eq!(err.to_string(), "page 2 has no extractable text");
    }

    #[test]
    fn rejects_non_pdf_bytes() {
        let err = extract_document_text(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, DocumentParseError::NotPdf));
    }

    #[tokio::test]
    async fn rejects_truncated_pdf() {
        let err = extract_document_text_blocking(b"%PDF-1.4\n1 0 obj\n<<".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentParseError::Malformed(_)));
    }

    #[tokio::test]
    async fn extracts_pages_in_document_order() {
        let bytes = build_pdf(&["Alpha page", "Omega page"]);
        let doc = extract_document_text_blocking(bytes).await.unwrap();

        assert_eq!(doc.page_count(), 2);
        let first = doc.text().find("Alpha page").expect("first page text");
        let second = doc.text().find("Omega page").expect("second page text");
        assert!(first < second);
    }
}
