use lopdf::content::Content;
use lopdf::{Document as LoDocument, Object as LoObject, ObjectId};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfInspectErrorCode {
    PdfParseFailed,
    PdfEncryptedUnsupported,
    PdfEmptyOrNoPages,
    PdfIoError,
}

impl PdfInspectErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfInspectErrorCode::PdfParseFailed => "PDF_PARSE_FAILED",
            PdfInspectErrorCode::PdfEncryptedUnsupported => "PDF_ENCRYPTED_UNSUPPORTED",
            PdfInspectErrorCode::PdfEmptyOrNoPages => "PDF_EMPTY_OR_NO_PAGES",
            PdfInspectErrorCode::PdfIoError => "PDF_IO_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInspectError {
    pub code: PdfInspectErrorCode,
    pub message: String,
}

impl std::fmt::Display for PdfInspectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for PdfInspectError {}

/// Text shown on one page, one entry per `Tj` in content-stream order, plus
/// the names of the form fields whose widgets sit on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageText {
    pub strings: Vec<String>,
    pub field_names: Vec<String>,
}

impl PageText {
    pub fn contains(&self, needle: &str) -> bool {
        self.strings.iter().any(|s| s.contains(needle))
    }

    pub fn count(&self, exact: &str) -> usize {
        self.strings.iter().filter(|s| s.as_str() == exact).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInspectReport {
    pub pdf_version: String,
    pub page_count: usize,
    pub file_size_bytes: usize,
    pub title: Option<String>,
    pub pages: Vec<PageText>,
}

impl PdfInspectReport {
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|page| page.field_names.iter().map(String::as_str))
    }
}

pub fn inspect_pdf_bytes(bytes: &[u8]) -> Result<PdfInspectReport, PdfInspectError> {
    let pdf = LoDocument::load_mem(bytes).map_err(|err| PdfInspectError {
        code: PdfInspectErrorCode::PdfParseFailed,
        message: err.to_string(),
    })?;
    if pdf.is_encrypted() {
        return Err(PdfInspectError {
            code: PdfInspectErrorCode::PdfEncryptedUnsupported,
            message: "encrypted pdf files are not supported".to_string(),
        });
    }

    let page_ids = pdf.get_pages();
    if page_ids.is_empty() {
        return Err(PdfInspectError {
            code: PdfInspectErrorCode::PdfEmptyOrNoPages,
            message: "pdf has no pages".to_string(),
        });
    }
    let mut pages = Vec::with_capacity(page_ids.len());
    for (number, page_id) in &page_ids {
        pages.push(page_text(&pdf, *page_id).map_err(|message| PdfInspectError {
            code: PdfInspectErrorCode::PdfParseFailed,
            message: format!("page {number}: {message}"),
        })?);
    }

    Ok(PdfInspectReport {
        pdf_version: pdf.version.clone(),
        page_count: page_ids.len(),
        file_size_bytes: bytes.len(),
        title: document_title(&pdf),
        pages,
    })
}

pub fn inspect_pdf_path(path: &Path) -> Result<PdfInspectReport, PdfInspectError> {
    let data = std::fs::read(path).map_err(|err| PdfInspectError {
        code: PdfInspectErrorCode::PdfIoError,
        message: err.to_string(),
    })?;
    inspect_pdf_bytes(&data)
}

fn resolve<'a>(pdf: &'a LoDocument, object: &'a LoObject) -> Option<&'a LoObject> {
    match object {
        LoObject::Reference(id) => pdf.get_object(*id).ok(),
        other => Some(other),
    }
}

fn page_text(pdf: &LoDocument, page_id: ObjectId) -> Result<PageText, String> {
    let raw = pdf.get_page_content(page_id).map_err(|err| err.to_string())?;
    let content = Content::decode(&raw).map_err(|err| err.to_string())?;
    let mut strings = Vec::new();
    for operation in &content.operations {
        if operation.operator != "Tj" {
            continue;
        }
        if let Some(LoObject::String(bytes, _)) = operation.operands.first() {
            strings.push(decode_winansi(bytes));
        }
    }

    let mut field_names = Vec::new();
    let page = pdf.get_dictionary(page_id).map_err(|err| err.to_string())?;
    if let Some(LoObject::Array(annots)) = page.get(b"Annots").ok().and_then(|a| resolve(pdf, a)) {
        for annot in annots {
            let Some(LoObject::Dictionary(widget)) = resolve(pdf, annot) else {
                continue;
            };
            if let Ok(LoObject::String(name, _)) = widget.get(b"T") {
                field_names.push(decode_winansi(name));
            }
        }
    }
    Ok(PageText {
        strings,
        field_names,
    })
}

fn document_title(pdf: &LoDocument) -> Option<String> {
    let info = pdf.trailer.get(b"Info").ok()?;
    let LoObject::Dictionary(info) = resolve(pdf, info)? else {
        return None;
    };
    match info.get(b"Title").ok()? {
        LoObject::String(bytes, _) => Some(decode_winansi(bytes)),
        _ => None,
    }
}

fn decode_winansi(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x80 => '\u{20AC}',
            0x85 => '\u{2026}',
            0x91 => '\u{2018}',
            0x92 => '\u{2019}',
            0x93 => '\u{201C}',
            0x94 => '\u{201D}',
            0x95 => '\u{2022}',
            0x96 => '\u{2013}',
            0x97 => '\u{2014}',
            0x99 => '\u{2122}',
            0x80..=0x9F => '?',
            _ => b as char,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream as LoStream, dictionary};
    use std::io::Write;

    fn make_single_page_pdf_bytes(text: &str) -> Vec<u8> {
        let mut doc = LoDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = format!("BT /F1 18 Tf 72 720 Td ({}) Tj ET", text).into_bytes();
        let content_id = doc.add_object(LoStream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        };
        doc.objects.insert(pages_id, LoObject::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut out = Vec::new();
        doc.save_to(&mut out).expect("save");
        out
    }

    #[test]
    fn inspect_pdf_bytes_reads_page_count_and_text() {
        let bytes = make_single_page_pdf_bytes("HELLO");
        let report = inspect_pdf_bytes(&bytes).expect("inspect");
        assert_eq!(report.page_count, 1);
        assert_eq!(report.file_size_bytes, bytes.len());
        assert!(!report.pdf_version.is_empty());
        assert_eq!(report.pages[0].strings, vec!["HELLO".to_string()]);
        assert_eq!(report.pages[0].count("HELLO"), 1);
        assert_eq!(report.title, None);
    }

    #[test]
    fn report_carries_only_readable_document_facts() {
        let bytes = make_single_page_pdf_bytes("FIELDS");
        // Encrypted input is an error, so the report has no encryption flag.
        let PdfInspectReport {
            pdf_version,
            page_count,
            file_size_bytes,
            title,
            pages,
        } = inspect_pdf_bytes(&bytes).expect("inspect");
        assert!(!pdf_version.is_empty());
        assert_eq!((page_count, pages.len()), (1, 1));
        assert_eq!(file_size_bytes, bytes.len());
        assert!(title.is_none());
    }

    #[test]
    fn inspect_pdf_bytes_rejects_malformed_data() {
        let err = inspect_pdf_bytes(b"not a pdf").expect_err("invalid");
        assert_eq!(err.code, PdfInspectErrorCode::PdfParseFailed);
    }

    #[test]
    fn inspect_pdf_path_reports_io_error_for_missing_file() {
        let missing = std::env::temp_dir().join(format!(
            "folio_pdfinspect_missing_{}_{}.pdf",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        let err = inspect_pdf_path(&missing).expect_err("missing");
        assert_eq!(err.code, PdfInspectErrorCode::PdfIoError);
    }

    #[test]
    fn inspect_pdf_path_matches_bytes_report() {
        let bytes = make_single_page_pdf_bytes("PATH");
        let temp_dir = std::env::temp_dir().join(format!(
            "folio_pdfinspect_path_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&temp_dir).expect("mkdir");
        let path = temp_dir.join("one.pdf");
        let mut f = std::fs::File::create(&path).expect("create");
        f.write_all(&bytes).expect("write");

        let from_path = inspect_pdf_path(&path).expect("inspect path");
        let from_bytes = inspect_pdf_bytes(&bytes).expect("inspect bytes");
        assert_eq!(from_path, from_bytes);
        let _ = std::fs::remove_dir_all(&temp_dir);
    }

    #[test]
    fn winansi_bytes_decode_back_to_unicode() {
        assert_eq!(decode_winansi(b"caf\xe9 \x96 x"), "café \u{2013} x");
    }
}
