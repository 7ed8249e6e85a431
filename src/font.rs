use crate::types::Pt;

pub const HELVETICA: &str = "Helvetica";
pub const HELVETICA_BOLD: &str = "Helvetica-Bold";

// Advance widths in 1/1000 em for printable ASCII (0x20..=0x7E), from the
// standard base-14 AFM files.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // A-Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333,
    500, 278, 556, 500, 722, 500, 500, 500, // a-z
    334, 260, 334, 584, // {..~
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    333, 333, 584, 584, 584, 611, 975, // :..@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // A-Z
    333, 278, 333, 584, 556, 333, // [..`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389,
    556, 333, 611, 556, 778, 556, 556, 500, // a-z
    389, 280, 389, 584, // {..~
];

const FALLBACK_WIDTH: u16 = 556;

/// Base-14 font names the writer can reference without embedding.
pub(crate) fn is_base14_name(name: &str) -> bool {
    matches!(
        name,
        "Courier"
            | "Courier-Bold"
            | "Courier-Oblique"
            | "Courier-BoldOblique"
            | "Helvetica"
            | "Helvetica-Bold"
            | "Helvetica-Oblique"
            | "Helvetica-BoldOblique"
            | "Times-Roman"
            | "Times-Bold"
            | "Times-Italic"
            | "Times-BoldItalic"
            | "Symbol"
            | "ZapfDingbats"
    )
}

pub(crate) fn bold_variant(name: &str) -> &'static str {
    match name {
        "Times-Roman" | "Times-Bold" => "Times-Bold",
        "Courier" | "Courier-Bold" => "Courier-Bold",
        _ => HELVETICA_BOLD,
    }
}

fn char_width_1000(font_name: &str, ch: char) -> u16 {
    if font_name.starts_with("Courier") {
        return 600;
    }
    let table = if font_name.contains("Bold") {
        &HELVETICA_BOLD_WIDTHS
    } else {
        &HELVETICA_WIDTHS
    };
    let code = ch as u32;
    if (0x20..=0x7E).contains(&code) {
        table[(code - 0x20) as usize]
    } else {
        FALLBACK_WIDTH
    }
}

pub(crate) fn measure_text_width(font_name: &str, font_size: Pt, text: &str) -> Pt {
    let units: i64 = text
        .chars()
        .map(|ch| char_width_1000(font_name, ch) as i64)
        .sum();
    let milli = font_size.to_milli_i64() as i128 * units as i128 / 1000;
    Pt::from_milli_i64(milli as i64)
}

pub(crate) fn default_leading(font_size: Pt) -> Pt {
    font_size.mul_ratio(6, 5)
}
