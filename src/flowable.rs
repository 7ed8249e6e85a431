use crate::canvas::Canvas;
use crate::font;
use crate::style::ParagraphStyle;
use crate::types::{Pt, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakInside {
    Auto,
    Avoid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pagination {
    pub break_inside: BreakInside,
    pub orphans: usize,
    pub widows: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            break_inside: BreakInside::Auto,
            orphans: 2,
            widows: 2,
        }
    }
}

impl Pagination {
    pub fn avoid() -> Self {
        Self {
            break_inside: BreakInside::Avoid,
            ..Self::default()
        }
    }

    fn resolved_orphans(self) -> usize {
        self.orphans.max(1)
    }

    fn resolved_widows(self) -> usize {
        self.widows.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

/// A unit of content the frame can measure, split across pages and draw.
/// Coordinates are top-left based; `y` grows downwards.
pub trait Flowable: FlowableClone + Send + Sync {
    fn wrap(&self, avail_width: Pt, avail_height: Pt) -> Size;
    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)>;
    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, avail_height: Pt);

    // Skipped by the frame at the top of a page.
    fn space_before(&self) -> Pt {
        Pt::ZERO
    }

    fn space_after(&self) -> Pt {
        Pt::ZERO
    }

    fn pagination(&self) -> Pagination {
        Pagination::default()
    }

    fn debug_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

pub trait FlowableClone {
    fn clone_box(&self) -> Box<dyn Flowable>;
}

impl<T> FlowableClone for T
where
    T: 'static + Flowable + Clone,
{
    fn clone_box(&self) -> Box<dyn Flowable> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Flowable> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word {
        text: String,
        bold: bool,
        // Whitespace preceded the word in the source text.
        spaced: bool,
    },
    Newline,
}

#[derive(Debug, Clone, PartialEq)]
struct Segment {
    text: String,
    bold: bool,
    offset: Pt,
}

#[derive(Debug, Clone, PartialEq)]
struct Line {
    segments: Vec<Segment>,
    width: Pt,
}

impl Line {
    fn empty() -> Self {
        Self {
            segments: Vec::new(),
            width: Pt::ZERO,
        }
    }
}

/// Styled, wrapping text. Soft breaks on whitespace, hard breaks on `\n`,
/// and words wider than the line fall back to character breaks.
#[derive(Debug, Clone)]
pub struct Paragraph {
    runs: Vec<TextRun>,
    style: ParagraphStyle,
    pagination: Pagination,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, style: ParagraphStyle) -> Self {
        Self::with_runs(vec![TextRun::plain(text)], style)
    }

    pub fn with_runs(runs: Vec<TextRun>, style: ParagraphStyle) -> Self {
        Self {
            runs,
            style,
            pagination: Pagination::default(),
        }
    }

    /// `label` in the style's bold face followed by `value`.
    pub fn labelled(label: &str, value: &str, style: ParagraphStyle) -> Self {
        Self::with_runs(
            vec![
                TextRun::bold(format!("{label}:")),
                TextRun::plain(format!(" {value}")),
            ],
            style,
        )
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn style(&self) -> &ParagraphStyle {
        &self.style
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn line_count(&self, avail_width: Pt) -> usize {
        self.layout_lines(avail_width).len()
    }

    fn font_for(&self, bold: bool) -> &str {
        if bold {
            &self.style.bold_font_name
        } else {
            &self.style.font_name
        }
    }

    fn measure(&self, text: &str, bold: bool) -> Pt {
        font::measure_text_width(self.font_for(bold), self.style.font_size, text)
    }

    fn tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        for run in &self.runs {
            for (line_idx, part) in run.text.split('\n').enumerate() {
                if line_idx > 0 {
                    tokens.push(Token::Newline);
                }
                let mut spaced = part.starts_with(char::is_whitespace);
                for word in part.split_whitespace() {
                    tokens.push(Token::Word {
                        text: word.to_string(),
                        bold: run.bold,
                        spaced,
                    });
                    spaced = true;
                }
            }
        }
        tokens
    }

    fn layout_lines(&self, avail_width: Pt) -> Vec<Line> {
        let space = self.measure(" ", false);
        let mut lines = Vec::new();
        let mut line = Line::empty();
        for token in self.tokens() {
            let (text, bold, spaced) = match token {
                Token::Newline => {
                    lines.push(std::mem::replace(&mut line, Line::empty()));
                    continue;
                }
                Token::Word { text, bold, spaced } => (text, bold, spaced),
            };
            let word_width = self.measure(&text, bold);
            let gap = if spaced && !line.segments.is_empty() {
                space
            } else {
                Pt::ZERO
            };
            if !line.segments.is_empty() && line.width + gap + word_width > avail_width {
                lines.push(std::mem::replace(&mut line, Line::empty()));
            }
            if line.segments.is_empty() && word_width > avail_width {
                let pieces = split_long_word_by_width(self, &text, bold, avail_width);
                let last = pieces.len().saturating_sub(1);
                for (idx, piece) in pieces.into_iter().enumerate() {
                    let width = self.measure(&piece, bold);
                    push_segment(&mut line, piece, bold, Pt::ZERO, width);
                    if idx < last {
                        lines.push(std::mem::replace(&mut line, Line::empty()));
                    }
                }
                continue;
            }
            let gap = if line.segments.is_empty() { Pt::ZERO } else { gap };
            push_segment(&mut line, text, bold, gap, word_width);
        }
        if !line.segments.is_empty() || lines.is_empty() {
            lines.push(line);
        }
        lines
    }

    fn rebuild_from_lines(&self, lines: &[Line], pagination: Pagination) -> Paragraph {
        let mut runs: Vec<TextRun> = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            if idx > 0 && line.segments.is_empty() {
                match runs.last_mut() {
                    Some(last) => last.text.push('\n'),
                    None => runs.push(TextRun::plain("\n")),
                }
                continue;
            }
            for (seg_idx, segment) in line.segments.iter().enumerate() {
                let mut text = segment.text.clone();
                if idx > 0 && seg_idx == 0 {
                    text.insert(0, '\n');
                }
                match runs.last_mut() {
                    Some(last) if last.bold == segment.bold => last.text.push_str(&text),
                    _ => runs.push(TextRun {
                        text,
                        bold: segment.bold,
                    }),
                }
            }
        }
        // A trailing newline alone is not a line; a blank last line needs two.
        if lines.len() > 1 && lines.last().is_some_and(|line| line.segments.is_empty()) {
            if let Some(last) = runs.last_mut() {
                last.text.push('\n');
            }
        }
        Paragraph {
            runs,
            style: self.style.clone(),
            pagination,
        }
    }
}

fn push_segment(line: &mut Line, text: String, bold: bool, gap: Pt, width: Pt) {
    let offset = line.width + gap;
    match line.segments.last_mut() {
        Some(last) if last.bold == bold => {
            if gap > Pt::ZERO {
                last.text.push(' ');
            }
            last.text.push_str(&text);
        }
        _ => {
            let text = if gap > Pt::ZERO {
                format!(" {text}")
            } else {
                text
            };
            line.segments.push(Segment {
                text,
                bold,
                offset: line.width,
            });
        }
    }
    line.width = offset + width;
}

fn split_long_word_by_width(
    paragraph: &Paragraph,
    word: &str,
    bold: bool,
    max_width: Pt,
) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_width = Pt::ZERO;
    for ch in word.chars() {
        let w = paragraph.measure(ch.encode_utf8(&mut [0u8; 4]), bold);
        let mut next_width = current_width + w;
        if !current.is_empty() && next_width > max_width {
            parts.push(std::mem::take(&mut current));
            next_width = w;
        }
        current.push(ch);
        current_width = next_width;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    if parts.is_empty() {
        parts.push(String::new());
    }
    parts
}

impl Flowable for Paragraph {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        let lines = self.layout_lines(avail_width);
        let height = self.style.leading * (lines.len() as i32);
        let width = lines
            .iter()
            .fold(Pt::ZERO, |acc, line| acc.max(line.width))
            .min(avail_width);
        Size { width, height }
    }

    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        if self.pagination.break_inside == BreakInside::Avoid {
            return None;
        }
        let lines = self.layout_lines(avail_width);
        let lh = self.style.leading.to_milli_i64();
        let ah = avail_height.to_milli_i64();
        if lh <= 0 || ah <= 0 {
            return None;
        }
        let max_lines = (ah / lh) as usize;
        let total_lines = lines.len();
        if max_lines == 0 || max_lines >= total_lines {
            return None;
        }
        let mut split_at = max_lines;
        if total_lines - split_at < self.pagination.resolved_widows() {
            split_at = total_lines.saturating_sub(self.pagination.resolved_widows());
        }
        if split_at < self.pagination.resolved_orphans() || split_at == 0 {
            return None;
        }
        let first = self.rebuild_from_lines(&lines[..split_at], self.pagination);
        let second = self.rebuild_from_lines(&lines[split_at..], self.pagination);
        Some((Box::new(first), Box::new(second)))
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        let lines = self.layout_lines(avail_width);
        canvas.set_fill_color(self.style.color);
        canvas.set_font_size(self.style.font_size);
        let mut cursor_y = y;
        for line in &lines {
            let offset = match self.style.align {
                TextAlign::Left => Pt::ZERO,
                TextAlign::Center => (avail_width - line.width).max(Pt::ZERO).mul_ratio(1, 2),
                TextAlign::Right => (avail_width - line.width).max(Pt::ZERO),
            };
            for segment in &line.segments {
                canvas.set_font_name(self.font_for(segment.bold));
                canvas.draw_string(x + offset + segment.offset, cursor_y, segment.text.clone());
            }
            cursor_y += self.style.leading;
        }
    }

    fn space_before(&self) -> Pt {
        self.style.space_before
    }

    fn space_after(&self) -> Pt {
        self.style.space_after
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }

    fn debug_name(&self) -> &'static str {
        "Paragraph"
    }
}

#[derive(Debug, Clone)]
pub struct Spacer {
    height: Pt,
}

impl Spacer {
    pub fn new(height: f32) -> Self {
        Self::new_pt(Pt::from_f32(height))
    }

    pub fn new_pt(height: Pt) -> Self {
        Self { height }
    }

    pub fn inches(height: f32) -> Self {
        Self::new_pt(Pt::from_inches(height))
    }

    pub fn height(&self) -> Pt {
        self.height
    }
}

impl Flowable for Spacer {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: avail_width,
            height: self.height.max(Pt::ZERO),
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, _canvas: &mut Canvas, _x: Pt, _y: Pt, _avail_width: Pt, _avail_height: Pt) {}

    fn debug_name(&self) -> &'static str {
        "Spacer"
    }
}
