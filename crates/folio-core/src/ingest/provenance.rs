//! Lightweight "who sent this" extraction. First match wins:
//! filename prefix, then office document core properties, then the PDF
//! `/Author` entry, else unknown.

use crate::error::Error;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const PDF_SCAN_BYTES: u64 = 64 * 1024;
const CORE_PROPERTIES_ENTRY: &str = "docProps/core.xml";
const OFFICE_EXTENSIONS: &[&str] = &["docx", "docm", "dotx", "xlsx", "xlsm", "xltx", "pptx", "pptm", "potx"];

lazy_static! {
    static ref FILENAME_SENDER: Regex =
        Regex::new(r"^\s*(\p{L}[\p{L} .']{0,38}[\p{L}.])\s*-\s*\S").unwrap();
    static ref DC_CREATOR: Regex =
        Regex::new(r"<dc:creator[^>]*>\s*([^<]*?)\s*</dc:creator>").unwrap();
    static ref LAST_MODIFIED_BY: Regex =
        Regex::new(r"<cp:lastModifiedBy[^>]*>\s*([^<]*?)\s*</cp:lastModifiedBy>").unwrap();
    static ref PDF_AUTHOR: regex::bytes::Regex =
        regex::bytes::Regex::new(r"(?s-u)/Author\s*\(((?:[^()\\]|\\.)*)\)").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceSource {
    Filename,
    DocumentMetadata,
    PdfMetadata,
    None,
}

impl ProvenanceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvenanceSource::Filename => "filename",
            ProvenanceSource::DocumentMetadata => "document_metadata",
            ProvenanceSource::PdfMetadata => "pdf_metadata",
            ProvenanceSource::None => "none",
        }
    }
}

impl fmt::Display for ProvenanceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub sender: String,
    pub source: ProvenanceSource,
}

impl Provenance {
    pub fn unknown() -> Self {
        Self {
            sender: "unknown".to_string(),
            source: ProvenanceSource::None,
        }
    }

    fn found(sender: String, source: ProvenanceSource) -> Self {
        Self { sender, source }
    }
}

pub fn extract_provenance(path: &Path) -> Provenance {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if let Some(sender) = sender_from_file_name(&file_name) {
        return Provenance::found(sender, ProvenanceSource::Filename);
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if OFFICE_EXTENSIONS.contains(&extension.as_str()) {
        match sender_from_office_document(path) {
            Ok(Some(sender)) => return Provenance::found(sender, ProvenanceSource::DocumentMetadata),
            Ok(None) => {}
            Err(e) => debug!("No core properties in {}: {}", path.display(), e),
        }
    }

    if extension == "pdf" {
        match sender_from_pdf(path) {
            Ok(Some(sender)) => return Provenance::found(sender, ProvenanceSource::PdfMetadata),
            Ok(None) => {}
            Err(e) => debug!("Could not scan {} for an author: {}", path.display(), e),
        }
    }

    Provenance::unknown()
}

/// `Alice Smith - Q3 report.pdf` -> `Alice Smith`. The prefix must start
/// with a letter and hold only letters, spaces, dots and apostrophes.
pub fn sender_from_file_name(file_name: &str) -> Option<String> {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())?;
    FILENAME_SENDER
        .captures(&stem)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| s.chars().count() >= 2)
}

/// Creator, else last-modified-by, from `docProps/core.xml` of an OOXML
/// container.
pub fn sender_from_office_document(path: &Path) -> Result<Option<String>, Error> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;
    let mut xml = String::new();
    archive.by_name(CORE_PROPERTIES_ENTRY)?.read_to_string(&mut xml)?;
    Ok(sender_from_core_properties(&xml))
}

pub fn sender_from_core_properties(xml: &str) -> Option<String> {
    [&*DC_CREATOR, &*LAST_MODIFIED_BY].iter().find_map(|re| {
        re.captures(xml)
            .and_then(|c| c.get(1))
            .map(|m| unescape_xml(m.as_str()))
            .filter(|s| !s.is_empty())
    })
}

/// Scan the first 64 KiB of a PDF for an `/Author (...)` entry.
pub fn sender_from_pdf(path: &Path) -> std::io::Result<Option<String>> {
    let mut head = Vec::new();
    File::open(path)?.take(PDF_SCAN_BYTES).read_to_end(&mut head)?;
    Ok(sender_from_pdf_bytes(&head))
}

pub fn sender_from_pdf_bytes(head: &[u8]) -> Option<String> {
    let raw = PDF_AUTHOR.captures(head)?.get(1)?.as_bytes().to_vec();
    let unescaped = unescape_pdf_literal(&raw);
    let text = if unescaped.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = unescaped[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(&unescaped).into_owned()
    };
    let text = text.trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn unescape_pdf_literal(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter();
    while let Some(&b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match bytes.next() {
            Some(b'n') => out.push(b'\n'),
            Some(b'r') => out.push(b'\r'),
            Some(b't') => out.push(b'\t'),
            Some(&other) => out.push(other),
            None => {}
        }
    }
    out
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
