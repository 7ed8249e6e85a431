use crate::assets::{ImageAsset, ImageRegistry};
use crate::canvas::{Command, Document, Page};
use crate::error::FolioError;
use crate::font::{self, HELVETICA};
use crate::types::{Color, Pt, Size};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const INFO_ID: usize = 3;
const FIELD_APPEARANCE: &str = "/Helv 0 Tf 0 g";

#[derive(Debug, Clone, Default)]
pub struct PdfOptions {
    pub title: Option<String>,
}

struct ObjectTable {
    // Index 0 is object 1. Reserved slots stay empty until filled.
    bodies: Vec<String>,
}

impl ObjectTable {
    fn with_reserved(count: usize) -> Self {
        Self {
            bodies: vec![String::new(); count],
        }
    }

    fn push(&mut self, body: String) -> usize {
        self.bodies.push(body);
        self.bodies.len()
    }

    fn set(&mut self, id: usize, body: String) {
        if let Some(slot) = self.bodies.get_mut(id - 1) {
            *slot = body;
        }
    }

    fn next_id(&self) -> usize {
        self.bodies.len() + 1
    }
}

struct FontResource {
    resource: String,
    id: usize,
}

struct ImageResource {
    resource: String,
    id: usize,
}

/// Serialises a finished document. Text uses the standard Type1 fonts with
/// WinAnsi encoding; `TextField` commands become AcroForm widgets.
pub fn document_to_pdf(
    document: &Document,
    images: &ImageRegistry,
    options: &PdfOptions,
) -> Result<Vec<u8>, FolioError> {
    check_unique_field_names(document)?;

    let mut objects = ObjectTable::with_reserved(3);

    let mut fonts: BTreeMap<String, FontResource> = BTreeMap::new();
    for (index, name) in collect_font_names(document).into_iter().enumerate() {
        if !font::is_base14_name(&name) {
            return Err(FolioError::AssetMissing(format!(
                "font {name} is not one of the standard PDF fonts"
            )));
        }
        let id = objects.push(font_object(&name));
        fonts.insert(
            name,
            FontResource {
                resource: format!("F{}", index + 1),
                id,
            },
        );
    }

    let mut image_map: BTreeMap<String, ImageResource> = BTreeMap::new();
    for (index, resource_id) in collect_image_ids(document).into_iter().enumerate() {
        let image = images.get(&resource_id).ok_or_else(|| {
            FolioError::AssetMissing(format!("image resource {resource_id} was never registered"))
        })?;
        let smask_id = image
            .alpha
            .as_ref()
            .map(|alpha| objects.push(image_smask_object(image, alpha)));
        let id = objects.push(image_object(image, smask_id));
        image_map.insert(
            resource_id,
            ImageResource {
                resource: format!("Im{}", index + 1),
                id,
            },
        );
    }

    let mut field_ids = Vec::new();
    let mut page_ids = Vec::new();
    for page in &document.pages {
        let content = render_page(page, document.page_size.height, &fonts, &image_map);
        let content_id = objects.push(stream_object(&content));
        let page_id = objects.next_id();
        // Reserve the page slot so its widgets can point back at it.
        objects.push(String::new());
        let mut annots = Vec::new();
        for cmd in &page.commands {
            if let Command::TextField {
                name,
                x,
                y,
                width,
                height,
                default_value,
            } = cmd
            {
                let bottom = document.page_size.height - *y - *height;
                let widget = format!(
                    "<< /Type /Annot /Subtype /Widget /FT /Tx /T ({}) /V ({}) /DV ({}) /Rect [{} {} {} {}] /F 4 /P {} 0 R /DA ({}) /MK << /BC [0 0 0] >> /Border [0 0 1] >>",
                    encode_winansi_pdf_string(name),
                    encode_winansi_pdf_string(default_value),
                    encode_winansi_pdf_string(default_value),
                    fmt_pt(*x),
                    fmt_pt(bottom),
                    fmt_pt(*x + *width),
                    fmt_pt(bottom + *height),
                    page_id,
                    FIELD_APPEARANCE
                );
                let id = objects.push(widget);
                annots.push(id);
                field_ids.push(id);
            }
        }
        objects.set(
            page_id,
            page_object(document.page_size, content_id, &fonts, &image_map, &annots),
        );
        page_ids.push(page_id);
    }

    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    objects.set(
        PAGES_ID,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_ids.len()
        ),
    );

    let acroform = if field_ids.is_empty() {
        String::new()
    } else {
        let form_font = objects.push(font_object(HELVETICA));
        let fields = field_ids
            .iter()
            .map(|id| format!("{id} 0 R"))
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            " /AcroForm << /Fields [{}] /NeedAppearances true /DR << /Font << /Helv {} 0 R >> >> /DA ({}) >>",
            fields, form_font, FIELD_APPEARANCE
        )
    };
    objects.set(
        CATALOG_ID,
        format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R{acroform} >>"),
    );
    objects.set(INFO_ID, info_object(options.title.as_deref()));

    Ok(build_pdf(&objects.bodies))
}

fn check_unique_field_names(document: &Document) -> Result<(), FolioError> {
    let mut seen = BTreeSet::new();
    for page in &document.pages {
        for name in page.text_fields() {
            if !seen.insert(name) {
                return Err(FolioError::InvalidConfiguration(format!(
                    "form field {name} is defined more than once"
                )));
            }
        }
    }
    Ok(())
}

fn collect_font_names(document: &Document) -> Vec<String> {
    let mut names = BTreeSet::new();
    for page in &document.pages {
        let mut current = HELVETICA.to_string();
        let mut stack: Vec<String> = Vec::new();
        for cmd in &page.commands {
            match cmd {
                Command::SaveState => stack.push(current.clone()),
                Command::RestoreState => {
                    if let Some(previous) = stack.pop() {
                        current = previous;
                    }
                }
                Command::SetFontName(name) => current = name.clone(),
                Command::DrawString { .. } => {
                    names.insert(current.clone());
                }
                _ => {}
            }
        }
    }
    names.into_iter().collect()
}

fn collect_image_ids(document: &Document) -> Vec<String> {
    let mut ids = BTreeSet::new();
    for page in &document.pages {
        for cmd in &page.commands {
            if let Command::DrawImage { resource_id, .. } = cmd {
                ids.insert(resource_id.clone());
            }
        }
    }
    ids.into_iter().collect()
}

#[derive(Clone)]
struct TextState {
    font_name: String,
    font_size: Pt,
}

fn render_page(
    page: &Page,
    page_height: Pt,
    fonts: &BTreeMap<String, FontResource>,
    images: &BTreeMap<String, ImageResource>,
) -> String {
    let mut out = String::new();
    let mut state = TextState {
        font_name: HELVETICA.to_string(),
        font_size: Pt::from_f32(12.0),
    };
    let mut stack: Vec<TextState> = Vec::new();

    for cmd in &page.commands {
        match cmd {
            Command::SaveState => {
                stack.push(state.clone());
                out.push_str("q\n");
            }
            Command::RestoreState => {
                if let Some(previous) = stack.pop() {
                    state = previous;
                }
                out.push_str("Q\n");
            }
            Command::Meta { .. } | Command::TextField { .. } => {}
            Command::SetFillColor(color) => {
                out.push_str(&format!("{} rg\n", color_components(*color)));
            }
            Command::SetStrokeColor(color) => {
                out.push_str(&format!("{} RG\n", color_components(*color)));
            }
            Command::SetLineWidth(width) => {
                out.push_str(&format!("{} w\n", fmt_pt(*width)));
            }
            Command::SetFontName(name) => state.font_name = name.clone(),
            Command::SetFontSize(size) => state.font_size = *size,
            Command::MoveTo { x, y } => {
                out.push_str(&format!("{} {} m\n", fmt_pt(*x), fmt_pt(page_height - *y)));
            }
            Command::LineTo { x, y } => {
                out.push_str(&format!("{} {} l\n", fmt_pt(*x), fmt_pt(page_height - *y)));
            }
            Command::Stroke => out.push_str("S\n"),
            Command::DrawString { x, y, text } => {
                let Some(font) = fonts.get(&state.font_name) else {
                    continue;
                };
                out.push_str("BT\n");
                out.push_str(&format!(
                    "/{} {} Tf\n",
                    font.resource,
                    fmt_pt(state.font_size)
                ));
                out.push_str(&format!(
                    "{} {} Td\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - state.font_size)
                ));
                out.push_str(&format!("({}) Tj\nET\n", encode_winansi_pdf_string(text)));
            }
            Command::DrawRect {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re\nS\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::DrawImage {
                x,
                y,
                width,
                height,
                resource_id,
            } => {
                if let Some(image) = images.get(resource_id) {
                    out.push_str(&format!(
                        "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
                        fmt_pt(*width),
                        fmt_pt(*height),
                        fmt_pt(*x),
                        fmt_pt(page_height - *y - *height),
                        image.resource
                    ));
                }
            }
        }
    }
    out
}

fn page_object(
    page_size: Size,
    content_id: usize,
    fonts: &BTreeMap<String, FontResource>,
    images: &BTreeMap<String, ImageResource>,
    annots: &[usize],
) -> String {
    let font_entries = fonts
        .values()
        .map(|font| format!("/{} {} 0 R", font.resource, font.id))
        .collect::<Vec<_>>()
        .join(" ");
    let image_entries = images
        .values()
        .map(|image| format!("/{} {} 0 R", image.resource, image.id))
        .collect::<Vec<_>>()
        .join(" ");
    let annots = if annots.is_empty() {
        String::new()
    } else {
        format!(
            " /Annots [{}]",
            annots
                .iter()
                .map(|id| format!("{id} 0 R"))
                .collect::<Vec<_>>()
                .join(" ")
        )
    };
    format!(
        "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources << /Font << {} >> /XObject << {} >> >> /Contents {} 0 R{} >>",
        PAGES_ID,
        fmt_pt(page_size.width),
        fmt_pt(page_size.height),
        font_entries,
        image_entries,
        content_id,
        annots
    )
}

fn font_object(name: &str) -> String {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{name} /Encoding /WinAnsiEncoding >>")
}

fn image_object(image: &ImageAsset, smask_id: Option<usize>) -> String {
    let stream_data = encode_stream_data(&image.data);
    let smask = smask_id
        .map(|id| format!(" /SMask {id} 0 R"))
        .unwrap_or_default();
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent 8 /Length {} /Filter [/ASCIIHexDecode {}]{} >>\nstream\n{}\nendstream",
        image.width_px,
        image.height_px,
        image.color_space,
        stream_data.len(),
        image.filter,
        smask,
        stream_data
    )
}

fn image_smask_object(image: &ImageAsset, alpha: &[u8]) -> String {
    let stream_data = encode_stream_data(alpha);
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceGray /BitsPerComponent 8 /Length {} /Filter [/ASCIIHexDecode /FlateDecode] >>\nstream\n{}\nendstream",
        image.width_px,
        image.height_px,
        stream_data.len(),
        stream_data
    )
}

fn encode_stream_data(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2 + data.len() / 32 + 1);
    for (index, byte) in data.iter().enumerate() {
        use std::fmt::Write;
        let _ = write!(&mut out, "{byte:02X}");
        if index % 32 == 31 {
            out.push('\n');
        }
    }
    out.push('>');
    out
}

fn stream_object(content: &str) -> String {
    format!(
        "<< /Length {} >>\nstream\n{}\nendstream",
        content.len(),
        content
    )
}

fn info_object(title: Option<&str>) -> String {
    let mut entries = vec!["/Producer (folio)".to_string()];
    if let Some(title) = title {
        entries.push(format!("/Title ({})", encode_winansi_pdf_string(title)));
    }
    format!("<< {} >>", entries.join(" "))
}

fn build_pdf(objects: &[String]) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.7\n");
    out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    let mut hasher = Sha256::new();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, obj) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        out.extend_from_slice(obj.as_bytes());
        out.extend_from_slice(b"\nendobj\n");
        hasher.update(obj.as_bytes());
    }
    let digest = hasher.finalize();
    let file_id: String = digest[..16].iter().map(|b| format!("{b:02X}")).collect();

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    let trailer = format!(
        "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R /ID [<{}> <{}>] >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        CATALOG_ID,
        INFO_ID,
        file_id,
        file_id,
        xref_start
    );
    out.extend_from_slice(trailer.as_bytes());
    out
}

fn encode_winansi_pdf_string(input: &str) -> String {
    let mut out = String::new();
    for ch in input.chars() {
        let byte = match ch {
            '\u{0000}'..='\u{007F}' => ch as u8,
            '\u{00A0}'..='\u{00FF}' => ch as u8,
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            _ => b'?',
        };
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if !(0x20..0x7f).contains(&b) => out.push_str(&format!("\\{b:03o}")),
            b => out.push(b as char),
        }
    }
    out
}

fn color_components(color: Color) -> String {
    format!("{} {} {}", fmt(color.r), fmt(color.g), fmt(color.b))
}

fn fmt(value: f32) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    format_milli((value.clamp(0.0, 1.0) as f64 * 1000.0).round() as i64)
}

fn format_milli(milli: i64) -> String {
    if milli == 0 {
        return "0".to_string();
    }
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.abs();
    let int_part = abs / 1000;
    let frac_part = abs % 1000;
    if frac_part == 0 {
        format!("{sign}{int_part}")
    } else {
        let mut s = format!("{sign}{int_part}.{frac_part:03}");
        while s.ends_with('0') {
            s.pop();
        }
        s
    }
}

fn fmt_pt(value: Pt) -> String {
    format_milli(value.to_milli_i64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;

    fn one_page(draw: impl FnOnce(&mut Canvas)) -> Document {
        let mut canvas = Canvas::new(Size::a4());
        draw(&mut canvas);
        canvas.finish()
    }

    fn pdf_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn flips_y_and_places_baseline_below_the_text_top() {
        let doc = one_page(|canvas| {
            canvas.set_font(HELVETICA, Pt::from_f32(10.0));
            canvas.draw_string(Pt::from_f32(36.0), Pt::from_f32(100.0), "Hello (world)");
        });
        let bytes = document_to_pdf(&doc, &ImageRegistry::default(), &PdfOptions::default())
            .expect("pdf");
        let text = pdf_text(&bytes);
        assert!(text.starts_with("%PDF-1.7"));
        assert!(text.contains("/F1 10 Tf\n36 731.89 Td\n(Hello \\(world\\)) Tj"));
        assert!(text.contains("/BaseFont /Helvetica /Encoding /WinAnsiEncoding"));
    }

    #[test]
    fn text_fields_become_acroform_widgets() {
        let doc = one_page(|canvas| {
            canvas.text_field("textfield_SignOperator", Pt::from_f32(26.0), Pt::from_f32(100.0), Pt::from_f32(280.0), Pt::from_f32(30.0), "");
        });
        let bytes = document_to_pdf(&doc, &ImageRegistry::default(), &PdfOptions::default())
            .expect("pdf");
        let text = pdf_text(&bytes);
        assert!(text.contains("/FT /Tx /T (textfield_SignOperator)"));
        assert!(text.contains("/Rect [26 711.89 306 741.89]"));
        assert!(text.contains("/AcroForm << /Fields ["));
        assert!(text.contains("/NeedAppearances true"));
    }

    #[test]
    fn duplicate_field_names_are_rejected() {
        let doc = one_page(|canvas| {
            for _ in 0..2 {
                canvas.text_field("textfield_DateOperator", Pt::ZERO, Pt::ZERO, Pt::from_f32(10.0), Pt::from_f32(10.0), "");
            }
        });
        assert!(matches!(
            document_to_pdf(&doc, &ImageRegistry::default(), &PdfOptions::default()),
            Err(FolioError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn unregistered_images_are_missing_assets() {
        let doc = one_page(|canvas| {
            canvas.draw_image(Pt::ZERO, Pt::ZERO, Pt::from_f32(10.0), Pt::from_f32(10.0), "logo");
        });
        assert!(matches!(
            document_to_pdf(&doc, &ImageRegistry::default(), &PdfOptions::default()),
            Err(FolioError::AssetMissing(_))
        ));
    }

    #[test]
    fn non_standard_fonts_are_missing_assets() {
        let doc = one_page(|canvas| {
            canvas.set_font("Arial", Pt::from_f32(10.0));
            canvas.draw_string(Pt::ZERO, Pt::ZERO, "x");
        });
        assert!(matches!(
            document_to_pdf(&doc, &ImageRegistry::default(), &PdfOptions::default()),
            Err(FolioError::AssetMissing(_))
        ));
    }

    #[test]
    fn identical_documents_get_identical_ids() {
        let build = || {
            let doc = one_page(|canvas| canvas.draw_string(Pt::ZERO, Pt::ZERO, "same"));
            let options = PdfOptions {
                title: Some("Report".to_string()),
            };
            document_to_pdf(&doc, &ImageRegistry::default(), &options).expect("pdf")
        };
        let first = build();
        assert_eq!(first, build());
        assert!(pdf_text(&first).contains("/Title (Report)"));
    }

    #[test]
    fn winansi_encoding_escapes_non_ascii() {
        assert_eq!(encode_winansi_pdf_string("café"), "caf\\351");
        assert_eq!(encode_winansi_pdf_string("a\u{2265}b"), "a?b");
    }
}
