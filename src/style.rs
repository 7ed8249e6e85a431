use crate::error::FolioError;
use crate::flowable::{TextAlign, VerticalAlign};
use crate::font::{self, HELVETICA, HELVETICA_BOLD};
use crate::types::{Color, Pt};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

pub const STYLE_NORMAL: &str = "Normal";
pub const STYLE_BODY_TEXT: &str = "BodyText";
pub const STYLE_HEADING2: &str = "Heading2";

#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphStyle {
    pub name: String,
    pub font_name: String,
    pub bold_font_name: String,
    pub font_size: Pt,
    pub leading: Pt,
    pub color: Color,
    pub align: TextAlign,
    pub space_before: Pt,
    pub space_after: Pt,
}

impl ParagraphStyle {
    pub fn new(name: impl Into<String>, font_name: &str, font_size: f32) -> Self {
        let font_size = Pt::from_f32(font_size);
        Self {
            name: name.into(),
            font_name: font_name.to_string(),
            bold_font_name: font::bold_variant(font_name).to_string(),
            font_size,
            leading: font::default_leading(font_size),
            color: Color::BLACK,
            align: TextAlign::Left,
            space_before: Pt::ZERO,
            space_after: Pt::ZERO,
        }
    }

    pub fn with_leading(mut self, leading: f32) -> Self {
        self.leading = Pt::from_f32(leading);
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn with_spacing(mut self, before: f32, after: f32) -> Self {
        self.space_before = Pt::from_f32(before);
        self.space_after = Pt::from_f32(after);
        self
    }
}

/// Named paragraph styles. Built once, never mutated afterwards; share it
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct StyleSheet {
    styles: BTreeMap<String, ParagraphStyle>,
}

impl StyleSheet {
    pub fn empty() -> Self {
        Self {
            styles: BTreeMap::new(),
        }
    }

    /// Normal (Helvetica 10/12, 5pt before), centred BodyText for table
    /// cells, and a bold 14pt Heading2 for section titles.
    pub fn sample() -> Self {
        Self::empty()
            .with_style(
                ParagraphStyle::new(STYLE_NORMAL, HELVETICA, 10.0)
                    .with_leading(12.0)
                    .with_spacing(5.0, 0.0),
            )
            .with_style(
                ParagraphStyle::new(STYLE_BODY_TEXT, HELVETICA, 10.0)
                    .with_leading(12.0)
                    .with_align(TextAlign::Center)
                    .with_spacing(6.0, 0.0),
            )
            .with_style(
                ParagraphStyle::new(STYLE_HEADING2, HELVETICA_BOLD, 14.0)
                    .with_leading(18.0)
                    .with_spacing(12.0, 6.0),
            )
    }

    pub fn shared() -> Arc<StyleSheet> {
        static SHARED: OnceLock<Arc<StyleSheet>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(StyleSheet::sample())).clone()
    }

    pub fn with_style(mut self, style: ParagraphStyle) -> Self {
        self.styles.insert(style.name.clone(), style);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParagraphStyle> {
        self.styles.get(name)
    }

    /// Every face a style names must be one of the standard PDF fonts; there
    /// is no font embedding.
    pub fn check_fonts(&self) -> Result<(), FolioError> {
        for style in self.styles.values() {
            for face in [&style.font_name, &style.bold_font_name] {
                if !font::is_base14_name(face) {
                    return Err(FolioError::AssetMissing(format!(
                        "font {face} (style {}) is not one of the standard PDF fonts",
                        style.name
                    )));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn resolve(&self, name: &str) -> ParagraphStyle {
        self.get(name)
            .cloned()
            .unwrap_or_else(|| ParagraphStyle::new(name, HELVETICA, 10.0).with_leading(12.0))
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::sample()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub width: Pt,
    pub color: Color,
}

impl Rule {
    pub fn new(width: f32, color: Color) -> Self {
        Self {
            width: Pt::from_f32(width),
            color,
        }
    }
}

/// Rule set applied uniformly to every cell of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStyle {
    pub valign: VerticalAlign,
    pub inner_grid: Option<Rule>,
    pub header_rule: Option<Rule>,
    pub outline: Option<Rule>,
    pub padding: Pt,
}

impl TableStyle {
    /// Light inner grid, heavier rule under the header row, 1pt padding.
    pub fn grid() -> Self {
        Self {
            valign: VerticalAlign::Middle,
            inner_grid: Some(Rule::new(0.25, Color::LIGHT_GREY)),
            header_rule: Some(Rule::new(1.0, Color::BLACK)),
            outline: Some(Rule::new(1.0, Color::LIGHT_GREY)),
            padding: Pt::from_f32(1.0),
        }
    }

    /// Vertically centred cells without any rules.
    pub fn plain() -> Self {
        Self {
            valign: VerticalAlign::Middle,
            inner_grid: None,
            header_rule: None,
            outline: None,
            padding: Pt::from_f32(3.0),
        }
    }
}
