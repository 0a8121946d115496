//! Document readers: raw text from a file, dispatched by extension.
//!
//! | Extension | Reader |
//! |-----------|--------|
//! | `.txt`, `.md` | UTF-8 text, as-is |
//! | `.pdf` | `pdf-extract` |
//! | `.docx` | `word/document.xml` runs, one line per paragraph |
//! | `.pptx` | slide text, one line per paragraph, slides in order |
//! | `.xlsx` | cell values, one line per sheet |
//!
//! Anything else is [`ReadError::UnsupportedFormat`]. Readers never panic on
//! malformed input; they return an error and the ingestion loop skips the file.

use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;

/// Maximum decompressed bytes to read from a single ZIP entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
/// Maximum sheets to read from a workbook.
const XLSX_MAX_SHEETS: usize = 100;
/// Maximum cell values to read per sheet.
const XLSX_MAX_CELLS_PER_SHEET: usize = 100_000;

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("unsupported file type: '{extension}'")]
    UnsupportedFormat { extension: String },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("OOXML extraction failed: {0}")]
    Ooxml(String),
}

/// Formats the readers understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Pdf,
    Docx,
    Pptx,
    Xlsx,
}

impl DocumentFormat {
    /// Pick a format from the (case-insensitive) file extension.
    pub fn from_path(path: &Path) -> Result<Self, ReadError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "txt" | "md" => Ok(Self::PlainText),
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "pptx" => Ok(Self::Pptx),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(ReadError::UnsupportedFormat { extension }),
        }
    }
}

/// Read a document and return its raw text.
pub fn read_document(path: &Path) -> Result<String, ReadError> {
    let format = DocumentFormat::from_path(path)?;
    let io_err = |source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    };

    match format {
        DocumentFormat::PlainText => std::fs::read_to_string(path).map_err(io_err),
        _ => {
            let bytes = std::fs::read(path).map_err(io_err)?;
            extract_text(&bytes, format)
        }
    }
}

/// Extract text from in-memory document bytes.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, ReadError> {
    match format {
        DocumentFormat::PlainText => String::from_utf8(bytes.to_vec()).map_err(|e| ReadError::Io {
            path: PathBuf::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        }),
        DocumentFormat::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ReadError::Pdf(e.to_string()))
        }
        DocumentFormat::Docx => {
            let mut archive = open_zip(bytes)?;
            let xml = read_zip_entry(&mut archive, "word/document.xml")?
                .ok_or_else(|| ReadError::Ooxml("word/document.xml not found".to_string()))?;
            paragraph_text(&xml)
        }
        DocumentFormat::Pptx => {
            let mut archive = open_zip(bytes)?;
            let slides = numbered_entries(&archive, "ppt/slides/slide");
            let mut pages = Vec::with_capacity(slides.len());
            for name in slides {
                if let Some(xml) = read_zip_entry(&mut archive, &name)? {
                    pages.push(paragraph_text(&xml)?);
                }
            }
            Ok(pages.join("\n"))
        }
        DocumentFormat::Xlsx => {
            let mut archive = open_zip(bytes)?;
            let shared = match read_zip_entry(&mut archive, "xl/sharedStrings.xml")? {
                Some(xml) => shared_strings(&xml)?,
                None => Vec::new(),
            };
            let sheets = numbered_entries(&archive, "xl/worksheets/sheet");
            let mut lines = Vec::new();
            for name in sheets.into_iter().take(XLSX_MAX_SHEETS) {
                if let Some(xml) = read_zip_entry(&mut archive, &name)? {
                    lines.push(sheet_cells(&xml, &shared)?.join(" "));
                }
            }
            Ok(lines.join("\n"))
        }
    }
}

type ZipReader<'a> = zip::ZipArchive<std::io::Cursor<&'a [u8]>>;

fn open_zip(bytes: &[u8]) -> Result<ZipReader<'_>, ReadError> {
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| ReadError::Ooxml(e.to_string()))
}

/// Read a ZIP entry with a size cap; `Ok(None)` if the entry is absent.
fn read_zip_entry(archive: &mut ZipReader<'_>, name: &str) -> Result<Option<Vec<u8>>, ReadError> {
    let entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ReadError::Ooxml(e.to_string())),
    };
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| ReadError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ReadError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, MAX_XML_ENTRY_BYTES
        )));
    }
    Ok(Some(out))
}

/// Entries named `<prefix><n>.xml`, sorted by `n`.
fn numbered_entries(archive: &ZipReader<'_>, prefix: &str) -> Vec<String> {
    let mut names: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let n = name.strip_prefix(prefix)?.strip_suffix(".xml")?.parse().ok()?;
            Some((n, name.to_string()))
        })
        .collect();
    names.sort();
    names.into_iter().map(|(_, name)| name).collect()
}

/// Text of every `<*:t>` run, with a newline after each `<*:p>` paragraph.
/// Works for both WordprocessingML and DrawingML.
fn paragraph_text(xml: &[u8]) -> Result<String, ReadError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(|e| ReadError::Ooxml(e.to_string()))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ReadError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n"))
}

/// Shared string table of a workbook; rich-text runs are concatenated.
fn shared_strings(xml: &[u8]) -> Result<Vec<String>, ReadError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(|e| ReadError::Ooxml(e.to_string()))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => strings.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ReadError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Cell values of one worksheet in document order. Shared-string cells are
/// resolved; inline strings and numbers are taken as written.
fn sheet_cells(xml: &[u8], shared: &[String]) -> Result<Vec<String>, ReadError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut cells = Vec::new();
    let mut shared_cell = false;
    let mut in_value = false;

    while cells.len() < XLSX_MAX_CELLS_PER_SHEET {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"c" => {
                    shared_cell = e.attributes().flatten().any(|a| {
                        a.key.local_name().as_ref() == b"t" && a.value.as_ref() == b"s"
                    });
                }
                b"v" | b"t" => in_value = true,
                _ => {}
            },
            Ok(Event::Text(te)) if in_value => {
                let raw = te.unescape().map_err(|e| ReadError::Ooxml(e.to_string()))?;
                let value = raw.trim();
                if shared_cell {
                    if let Some(s) = value.parse::<usize>().ok().and_then(|i| shared.get(i)) {
                        cells.push(s.clone());
                    }
                } else if !value.is_empty() {
                    cells.push(value.to_string());
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => shared_cell = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ReadError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(cells)
}
