// src/document.rs

use lopdf::{Dictionary, Document};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// What kind of file the quote arrived as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
    Text,
}

impl DocumentKind {
    /// From an explicit MIME type such as `application/pdf` or `image/png`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        match mime.as_str() {
            "application/pdf" => Some(DocumentKind::Pdf),
            "image/jpeg" | "image/jpg" | "image/png" => Some(DocumentKind::Image),
            m if m.starts_with("text/") => Some(DocumentKind::Text),
            _ => None,
        }
    }

    /// Sniff the `%PDF` header, then fall back to the file extension.
    pub fn detect(path: &Path, bytes: &[u8]) -> Self {
        if bytes.starts_with(b"%PDF") {
            return DocumentKind::Pdf;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => DocumentKind::Pdf,
            Some("jpg" | "jpeg" | "png") => DocumentKind::Image,
            _ => DocumentKind::Text,
        }
    }
}

/// Plain text of one uploaded quote. Lives for a single analysis.
#[derive(Debug, Clone)]
pub struct QuoteDocument {
    kind: DocumentKind,
    text: String,
}

impl QuoteDocument {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            kind: DocumentKind::Text,
            text: text.into(),
        }
    }

    /// Build the document text from raw file bytes.
    ///
    /// Images and scanned PDFs have no text layer; `ocr_text` is whatever an
    /// external OCR engine produced for them. Without it the text is empty and
    /// extraction falls back to defaults.
    pub fn from_bytes(bytes: &[u8], kind: DocumentKind, ocr_text: Option<String>) -> Self {
        let text = match kind {
            DocumentKind::Text => String::from_utf8_lossy(bytes).into_owned(),
            DocumentKind::Image => ocr_or_empty(ocr_text, "Image quote"),
            DocumentKind::Pdf => match extract_text_from_pdf(bytes) {
                PdfContent::Text(text) => text,
                PdfContent::ScannedImage => ocr_or_empty(ocr_text, "Scanned PDF"),
                PdfContent::Error(e) => {
                    warn!(error = %e, "Unreadable PDF, continuing with empty text");
                    ocr_text.unwrap_or_default()
                }
            },
        };
        Self { kind, text }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

fn ocr_or_empty(ocr_text: Option<String>, what: &str) -> String {
    match ocr_text {
        Some(text) => {
            info!(chars = text.len(), "{what}: using supplied OCR text");
            text
        }
        None => {
            warn!("{what} has no text layer and no OCR text was supplied");
            String::new()
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("got {ocr} OCR text files for {files} quotes, pass one per quote in the same order")]
pub struct OcrPairingError {
    pub files: usize,
    pub ocr: usize,
}

/// Sidecar OCR output looked up next to a quote: `devis.jpg` -> `devis.jpg.ocr.txt`.
pub fn ocr_sidecar(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".ocr.txt");
    PathBuf::from(name)
}

/// OCR text file for each quote, by position.
///
/// Explicit files must match the quotes one to one. With none given, each
/// quote uses its sidecar if one exists, so OCR text never leaks from one
/// quote into another.
pub fn pair_ocr_sources(
    files: &[PathBuf],
    ocr_files: &[PathBuf],
) -> Result<Vec<Option<PathBuf>>, OcrPairingError> {
    if ocr_files.is_empty() {
        return Ok(files
            .iter()
            .map(|f| Some(ocr_sidecar(f)).filter(|s| s.is_file()))
            .collect());
    }
    if ocr_files.len() != files.len() {
        return Err(OcrPairingError {
            files: files.len(),
            ocr: ocr_files.len(),
        });
    }
    Ok(ocr_files.iter().cloned().map(Some).collect())
}

/// Result of attempting to extract text from a PDF.
#[derive(Debug)]
pub enum PdfContent {
    /// The PDF contains extractable text.
    Text(String),
    /// The PDF appears to be scanned / image-only, needs OCR.
    ScannedImage,
    /// Something went wrong during extraction.
    Error(String),
}

/// Minimum number of non-whitespace characters we expect from a
/// "real" text PDF. Below this threshold we treat it as scanned.
const MIN_TEXT_CHARS: usize = 30;

/// Share of image-only pages above which the whole PDF counts as scanned.
const SCANNED_PAGE_RATIO: f64 = 0.8;

/// Takes raw PDF bytes and returns `PdfContent`.
pub fn extract_text_from_pdf(pdf_bytes: &[u8]) -> PdfContent {
    let doc = match Document::load_mem(pdf_bytes) {
        Ok(d) => d,
        Err(e) => return PdfContent::Error(format!("Failed to parse PDF: {e}")),
    };

    if looks_like_scanned(&doc) {
        info!("PDF structural check: likely scanned / image-only");
        return PdfContent::ScannedImage;
    }

    match pdf_extract::extract_text_from_mem(pdf_bytes) {
        Ok(text) => {
            let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
            if meaningful < MIN_TEXT_CHARS {
                info!(chars = meaningful, "Extracted text too short, treating as scanned");
                PdfContent::ScannedImage
            } else {
                info!(chars = meaningful, "Text extracted successfully");
                PdfContent::Text(text)
            }
        }
        Err(e) => {
            warn!(error = %e, "pdf-extract failed, may be scanned or corrupted");
            PdfContent::ScannedImage
        }
    }
}

/// A page with XObject images but no Font resources is almost certainly a scan.
fn looks_like_scanned(doc: &Document) -> bool {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return false;
    }

    let image_only_pages = pages
        .values()
        .filter_map(|id| doc.get_object(*id).ok())
        .filter_map(|obj| obj.as_dict().ok())
        .filter(|page| {
            let has_fonts = resource_entry_count(doc, page, b"Font") > 0;
            let has_images = resource_entry_count(doc, page, b"XObject") > 0;
            has_images && !has_fonts
        })
        .count();

    let ratio = image_only_pages as f64 / pages.len() as f64;
    info!(
        total_pages = pages.len(),
        image_only = image_only_pages,
        ratio = format!("{ratio:.2}"),
        "Scanned-page analysis"
    );

    ratio >= SCANNED_PAGE_RATIO
}

/// Number of entries in `page.Resources.<key>`, following references.
fn resource_entry_count(doc: &Document, page: &Dictionary, key: &[u8]) -> usize {
    page.get(b"Resources")
        .ok()
        .and_then(|r| doc.dereference(r).ok())
        .and_then(|(_, resolved)| resolved.as_dict().ok())
        .and_then(|res| res.get(key).ok())
        .and_then(|entry| doc.dereference(entry).ok())
        .and_then(|(_, resolved)| resolved.as_dict().ok())
        .map_or(0, |dict| dict.len())
}
