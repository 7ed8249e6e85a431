use crate::canvas::Canvas;
use crate::error::FolioError;
use crate::flowable::{Flowable, Pagination, Paragraph, VerticalAlign};
use crate::record::{Record, title_case};
use crate::style::{STYLE_BODY_TEXT, STYLE_NORMAL, StyleSheet, TableStyle};
use crate::types::{Orientation, Pt, Size};
use std::ops::Range;
use std::str::FromStr;
use std::sync::Arc;

/// Fixed proportions of the five audit columns.
pub const AUDIT_COLUMN_PERCENTS: [f32; 5] = [15.0, 15.0, 10.0, 20.0, 40.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnWidth {
    /// Share of the width left over after absolute columns.
    Percent(f32),
    Absolute(Pt),
    /// Splits whatever is left after absolute and percentage columns.
    Auto,
}

impl ColumnWidth {
    pub fn points(value: f32) -> Self {
        ColumnWidth::Absolute(Pt::from_f32(value))
    }
}

impl From<f32> for ColumnWidth {
    fn from(value: f32) -> Self {
        ColumnWidth::points(value)
    }
}

impl FromStr for ColumnWidth {
    type Err = FolioError;

    /// Accepts `"20%"`, `"40"`, `"40pt"`, and `"*"` or an empty string for auto.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(ColumnWidth::Auto);
        }
        let invalid = || FolioError::InvalidConfiguration(format!("bad column width {raw:?}"));
        if let Some(percent) = trimmed.strip_suffix('%') {
            let value: f32 = percent.trim().parse().map_err(|_| invalid())?;
            if !value.is_finite() || value < 0.0 {
                return Err(invalid());
            }
            return Ok(ColumnWidth::Percent(value));
        }
        let number = trimmed.strip_suffix("pt").unwrap_or(trimmed).trim();
        let value: f32 = number.parse().map_err(|_| invalid())?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid());
        }
        Ok(ColumnWidth::points(value))
    }
}

pub fn parse_column_widths<S: AsRef<str>>(raw: &[S]) -> Result<Vec<ColumnWidth>, FolioError> {
    raw.iter().map(|value| value.as_ref().parse()).collect()
}

/// Absolute widths pass through. Percentages divide the space the absolute
/// columns leave, scaled so that a total above 100% still fits. Auto columns
/// share what remains equally.
pub fn resolve_column_widths(specs: &[ColumnWidth], avail_width: Pt) -> Vec<Pt> {
    let absolute: Pt = specs
        .iter()
        .filter_map(|spec| match spec {
            ColumnWidth::Absolute(width) => Some(*width),
            _ => None,
        })
        .sum();
    let free = (avail_width - absolute).max(Pt::ZERO);
    let percent_total: f32 = specs
        .iter()
        .filter_map(|spec| match spec {
            ColumnWidth::Percent(value) => Some(*value),
            _ => None,
        })
        .sum();
    let scale = percent_total.max(100.0);
    let mut remaining = free;
    let mut widths: Vec<Option<Pt>> = specs
        .iter()
        .map(|spec| match spec {
            ColumnWidth::Absolute(width) => Some(*width),
            ColumnWidth::Percent(value) => {
                let width = free * (*value / scale);
                remaining = remaining - width;
                Some(width)
            }
            ColumnWidth::Auto => None,
        })
        .collect();
    let auto_count = widths.iter().filter(|width| width.is_none()).count();
    if auto_count > 0 {
        let share = remaining.max(Pt::ZERO) / auto_count as i32;
        for width in widths.iter_mut().filter(|width| width.is_none()) {
            *width = Some(share);
        }
    }
    widths.into_iter().map(|width| width.unwrap_or(Pt::ZERO)).collect()
}

/// Column order of a record table: the field order of the first record.
/// Later records never add or reorder columns.
pub fn infer_columns(records: &[Record]) -> Result<Vec<String>, FolioError> {
    let first = records.first().ok_or_else(|| {
        FolioError::EmptyInput("cannot infer columns from zero records".to_string())
    })?;
    Ok(first.keys().map(str::to_string).collect())
}

/// One row of display strings per record, in `columns` order. Missing fields
/// become empty cells.
pub fn render_rows(columns: &[String], records: &[Record]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| {
                    record
                        .get(column)
                        .map(|value| value.to_string())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}

/// Chunks `items` into rows of `size`, padding the last row with `fill`.
pub fn grouper<T: Clone>(items: Vec<T>, size: usize, fill: T) -> Vec<Vec<T>> {
    if size == 0 {
        return Vec::new();
    }
    let mut rows = Vec::with_capacity(items.len().div_ceil(size));
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        let mut row: Vec<T> = iter.by_ref().take(size).collect();
        row.resize(size, fill.clone());
        rows.push(row);
    }
    rows
}

pub enum TableInput {
    Records(Vec<Record>),
    /// Pre-shaped rows; the first row is the header and is used verbatim.
    Rows(Vec<Vec<String>>),
}

impl From<Vec<Record>> for TableInput {
    fn from(records: Vec<Record>) -> Self {
        TableInput::Records(records)
    }
}

impl From<Vec<Vec<String>>> for TableInput {
    fn from(rows: Vec<Vec<String>>) -> Self {
        TableInput::Rows(rows)
    }
}

// Data-table headers put every word on its own line.
fn data_header_label(column: &str) -> String {
    title_case(column).replace(' ', "\n")
}

fn check_widths(
    table: &str,
    columns: usize,
    widths: Option<&[ColumnWidth]>,
) -> Result<Vec<ColumnWidth>, FolioError> {
    match widths {
        Some(widths) if widths.len() != columns => Err(FolioError::ColumnMismatch {
            table: table.to_string(),
            expected: columns,
            actual: widths.len(),
        }),
        Some(widths) => Ok(widths.to_vec()),
        None => Ok(vec![ColumnWidth::Auto; columns]),
    }
}

fn cells(texts: Vec<String>, styles: &StyleSheet, style_name: &str) -> Vec<Paragraph> {
    let style = styles.resolve(style_name);
    texts
        .into_iter()
        .map(|text| Paragraph::new(text, style.clone()))
        .collect()
}

/// Free-form data grid. Needs at least one record (or row) to establish its
/// columns. `col_order` selects record keys; row input already carries its
/// header, so an order alongside rows is rejected.
pub fn data_table(
    input: &TableInput,
    col_widths: Option<&[ColumnWidth]>,
    col_order: Option<&[String]>,
    styles: &StyleSheet,
) -> Result<TableFlowable, FolioError> {
    let (header, body) = match input {
        TableInput::Records(records) => {
            if records.is_empty() {
                return Err(FolioError::EmptyInput(
                    "data table requires at least one record".to_string(),
                ));
            }
            let columns = match col_order {
                Some(order) => order.to_vec(),
                None => infer_columns(records)?,
            };
            let header: Vec<String> = columns.iter().map(|c| data_header_label(c)).collect();
            (header, render_rows(&columns, records))
        }
        TableInput::Rows(_) if col_order.is_some() => {
            return Err(FolioError::InvalidConfiguration(
                "column order applies to record input, not header rows".to_string(),
            ));
        }
        TableInput::Rows(rows) => {
            let Some((header, body)) = rows.split_first() else {
                return Err(FolioError::EmptyInput(
                    "data table requires a header row".to_string(),
                ));
            };
            let mut shaped = Vec::with_capacity(body.len());
            for row in body {
                if row.len() > header.len() {
                    return Err(FolioError::ColumnMismatch {
                        table: "data".to_string(),
                        expected: header.len(),
                        actual: row.len(),
                    });
                }
                let mut row = row.clone();
                row.resize(header.len(), String::new());
                shaped.push(row);
            }
            (header.clone(), shaped)
        }
    };
    let widths = check_widths("data", header.len(), col_widths)?;
    let header_row = cells(header, styles, STYLE_BODY_TEXT);
    let body_rows = body
        .into_iter()
        .map(|row| cells(row, styles, STYLE_BODY_TEXT))
        .collect();
    Ok(TableFlowable::new("data", body_rows, widths, TableStyle::grid())
        .with_header(vec![header_row])
        .repeat_header(true))
}

/// Audit log grid with fixed 15/15/10/20/40% columns. `Ok(None)` when there
/// is nothing to show.
pub fn audit_table(
    records: &[Record],
    col_order: Option<&[String]>,
    styles: &StyleSheet,
) -> Result<Option<TableFlowable>, FolioError> {
    if records.is_empty() {
        return Ok(None);
    }
    let columns = match col_order {
        Some(order) => order.to_vec(),
        None => infer_columns(records)?,
    };
    let widths: Vec<ColumnWidth> = AUDIT_COLUMN_PERCENTS
        .iter()
        .map(|percent| ColumnWidth::Percent(*percent))
        .collect();
    let widths = check_widths("audit", columns.len(), Some(&widths))?;
    let header = columns.iter().map(|c| title_case(c)).collect();
    let header_row = cells(header, styles, STYLE_BODY_TEXT);
    let body_rows = render_rows(&columns, records)
        .into_iter()
        .map(|row| cells(row, styles, STYLE_BODY_TEXT))
        .collect();
    Ok(Some(
        TableFlowable::new("audit", body_rows, widths, TableStyle::grid())
            .with_header(vec![header_row])
            .repeat_header(true),
    ))
}

/// Column count of the summary grid for a page orientation.
pub fn summary_columns(orientation: Orientation) -> usize {
    match orientation {
        Orientation::Portrait => 2,
        Orientation::Landscape => 3,
    }
}

/// "Label: value" cells, filled left to right. A blank cell at position 2
/// keeps the first row clear of the logo in the top-right corner.
pub fn summary_table(
    summary: &Record,
    orientation: Orientation,
    styles: &StyleSheet,
) -> TableFlowable {
    let normal = styles.resolve(STYLE_NORMAL);
    let mut entries: Vec<Paragraph> = summary
        .iter()
        .map(|(label, value)| Paragraph::labelled(label, &value.to_string(), normal.clone()))
        .collect();
    if !entries.is_empty() {
        entries.insert(entries.len().min(2), Paragraph::new("", normal.clone()));
    }
    let columns = summary_columns(orientation);
    let rows = grouper(entries, columns, Paragraph::new("", normal));
    TableFlowable::new(
        "summary",
        rows,
        vec![ColumnWidth::Auto; columns],
        TableStyle::plain(),
    )
}

#[derive(Debug)]
struct TableData {
    name: String,
    header_rows: Vec<Vec<Paragraph>>,
    body_rows: Vec<Vec<Paragraph>>,
    col_widths: Vec<ColumnWidth>,
    style: TableStyle,
}

impl TableData {
    fn row_height(&self, row: &[Paragraph], widths: &[Pt]) -> Pt {
        let pad = self.style.padding;
        row.iter()
            .zip(widths)
            .map(|(cell, width)| {
                let inner = (*width - pad * 2).max(Pt::ZERO);
                cell.wrap(inner, Pt::ZERO).height + pad * 2
            })
            .fold(pad * 2, Pt::max)
    }

    fn header_height(&self, widths: &[Pt]) -> Pt {
        self.header_rows
            .iter()
            .map(|row| self.row_height(row, widths))
            .sum()
    }
}

/// A grid of paragraphs. Splits between body rows; the second half carries
/// the header again when `repeat_header` is set.
#[derive(Debug, Clone)]
pub struct TableFlowable {
    data: Arc<TableData>,
    body_range: Range<usize>,
    include_header: bool,
    repeat_header: bool,
    pagination: Pagination,
}

impl TableFlowable {
    pub fn new(
        name: impl Into<String>,
        rows: Vec<Vec<Paragraph>>,
        col_widths: Vec<ColumnWidth>,
        style: TableStyle,
    ) -> Self {
        let len = rows.len();
        Self {
            data: Arc::new(TableData {
                name: name.into(),
                header_rows: Vec::new(),
                body_rows: rows,
                col_widths,
                style,
            }),
            body_range: 0..len,
            include_header: true,
            repeat_header: false,
            pagination: Pagination::default(),
        }
    }

    pub fn with_header(mut self, header_rows: Vec<Vec<Paragraph>>) -> Self {
        match Arc::get_mut(&mut self.data) {
            Some(data) => data.header_rows = header_rows,
            None => {
                self.data = Arc::new(TableData {
                    name: self.data.name.clone(),
                    header_rows,
                    body_rows: self.data.body_rows.clone(),
                    col_widths: self.data.col_widths.clone(),
                    style: self.data.style.clone(),
                })
            }
        }
        self
    }

    pub fn repeat_header(mut self, repeat: bool) -> Self {
        self.repeat_header = repeat;
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn column_count(&self) -> usize {
        self.data.col_widths.len()
    }

    pub fn column_widths(&self) -> &[ColumnWidth] {
        &self.data.col_widths
    }

    pub fn header_labels(&self) -> Vec<String> {
        self.data
            .header_rows
            .first()
            .map(|row| row.iter().map(Paragraph::plain_text).collect())
            .unwrap_or_default()
    }

    pub fn has_header(&self) -> bool {
        self.include_header && !self.data.header_rows.is_empty()
    }

    pub fn body_row_count(&self) -> usize {
        self.body_range.len()
    }

    pub fn body_texts(&self) -> Vec<Vec<String>> {
        self.data.body_rows[self.body_range.clone()]
            .iter()
            .map(|row| row.iter().map(Paragraph::plain_text).collect())
            .collect()
    }

    fn visible_rows(&self) -> impl Iterator<Item = &Vec<Paragraph>> {
        let header: &[Vec<Paragraph>] = if self.include_header {
            &self.data.header_rows
        } else {
            &[]
        };
        header
            .iter()
            .chain(self.data.body_rows[self.body_range.clone()].iter())
    }

    fn draw_rules(&self, canvas: &mut Canvas, x: Pt, y: Pt, widths: &[Pt], heights: &[Pt]) {
        let style = &self.data.style;
        let table_width: Pt = widths.iter().sum();
        let table_height: Pt = heights.iter().sum();
        canvas.save_state();
        if let Some(rule) = style.inner_grid {
            canvas.set_stroke_color(rule.color);
            canvas.set_line_width(rule.width);
            let mut cx = x;
            for width in widths.iter().take(widths.len().saturating_sub(1)) {
                cx += *width;
                canvas.line(cx, y, cx, y + table_height);
            }
            let mut cy = y;
            for height in heights.iter().take(heights.len().saturating_sub(1)) {
                cy += *height;
                canvas.line(x, cy, x + table_width, cy);
            }
        }
        let header_count = if self.include_header {
            self.data.header_rows.len()
        } else {
            0
        };
        if let (Some(rule), true) = (style.header_rule, header_count > 0) {
            canvas.set_stroke_color(rule.color);
            canvas.set_line_width(rule.width);
            let cy = y + heights.iter().take(header_count).copied().sum::<Pt>();
            canvas.line(x, cy, x + table_width, cy);
        }
        if let Some(rule) = style.outline {
            canvas.set_stroke_color(rule.color);
            canvas.set_line_width(rule.width);
            canvas.draw_rect(x, y, table_width, table_height);
        }
        canvas.restore_state();
    }
}

impl Flowable for TableFlowable {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        let widths = resolve_column_widths(&self.data.col_widths, avail_width);
        let height = self
            .visible_rows()
            .map(|row| self.data.row_height(row, &widths))
            .sum();
        Size {
            width: widths.iter().sum(),
            height,
        }
    }

    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        let widths = resolve_column_widths(&self.data.col_widths, avail_width);
        let header_height = if self.include_header {
            self.data.header_height(&widths)
        } else {
            Pt::ZERO
        };
        let available = avail_height - header_height;
        if available <= Pt::ZERO {
            return None;
        }
        let start = self.body_range.start;
        let end = self.body_range.end;
        let mut used = Pt::ZERO;
        let mut split_at = start;
        for row in &self.data.body_rows[start..end] {
            let row_height = self.data.row_height(row, &widths);
            if used + row_height > available {
                break;
            }
            used += row_height;
            split_at += 1;
        }
        if split_at == start || split_at >= end {
            return None;
        }
        let first = TableFlowable {
            data: self.data.clone(),
            body_range: start..split_at,
            include_header: self.include_header,
            repeat_header: self.repeat_header,
            pagination: self.pagination,
        };
        let second = TableFlowable {
            data: self.data.clone(),
            body_range: split_at..end,
            include_header: self.repeat_header,
            repeat_header: self.repeat_header,
            pagination: self.pagination,
        };
        Some((Box::new(first), Box::new(second)))
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        let widths = resolve_column_widths(&self.data.col_widths, avail_width);
        let table_width: Pt = widths.iter().sum();
        // Narrower tables are centred in the frame.
        let x = x + (avail_width - table_width).max(Pt::ZERO).mul_ratio(1, 2);
        let pad = self.data.style.padding;
        let mut heights = Vec::new();
        let mut cursor_y = y;
        for row in self.visible_rows() {
            let row_height = self.data.row_height(row, &widths);
            let mut cursor_x = x;
            for (cell, width) in row.iter().zip(&widths) {
                let inner = (*width - pad * 2).max(Pt::ZERO);
                let cell_height = cell.wrap(inner, Pt::ZERO).height;
                let slack = (row_height - pad * 2 - cell_height).max(Pt::ZERO);
                let offset = match self.data.style.valign {
                    VerticalAlign::Top => Pt::ZERO,
                    VerticalAlign::Middle => slack.mul_ratio(1, 2),
                    VerticalAlign::Bottom => slack,
                };
                cell.draw(canvas, cursor_x + pad, cursor_y + pad + offset, inner, cell_height);
                cursor_x += *width;
            }
            heights.push(row_height);
            cursor_y += row_height;
        }
        if !heights.is_empty() {
            self.draw_rules(canvas, x, y, &widths, &heights);
        }
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }

    fn debug_name(&self) -> &'static str {
        "Table"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;

    fn milli(widths: &[Pt]) -> Vec<i64> {
        widths.iter().map(|w| w.to_milli_i64()).collect()
    }

    fn dispenser(label: &str, reagent: &str) -> Record {
        Record::new()
            .with("Label", label)
            .with("Reagent", reagent)
            .with("Pass/ Fail", "Pass")
    }

    fn audit(label: &str) -> Record {
        Record::new()
            .with("label", label)
            .with("reason", "Rename Dispenser")
            .with("user", "venturf2")
            .with("date", "2019-12-09")
            .with("description", "Dispenser renamed")
    }

    #[test]
    fn parses_width_strings() {
        assert_eq!("20%".parse::<ColumnWidth>().ok(), Some(ColumnWidth::Percent(20.0)));
        assert_eq!("40".parse::<ColumnWidth>().ok(), Some(ColumnWidth::points(40.0)));
        assert_eq!(" 12.5pt ".parse::<ColumnWidth>().ok(), Some(ColumnWidth::points(12.5)));
        assert_eq!("*".parse::<ColumnWidth>().ok(), Some(ColumnWidth::Auto));
        assert!(matches!(
            "wide".parse::<ColumnWidth>(),
            Err(FolioError::InvalidConfiguration(_))
        ));
        assert!("-5%".parse::<ColumnWidth>().is_err());
    }

    #[test]
    fn percentages_share_space_left_by_absolute_columns() {
        let specs = [
            ColumnWidth::points(100.0),
            ColumnWidth::Percent(50.0),
            ColumnWidth::Percent(50.0),
        ];
        let widths = resolve_column_widths(&specs, Pt::from_f32(500.0));
        assert_eq!(milli(&widths), vec![100_000, 200_000, 200_000]);
    }

    #[test]
    fn oversubscribed_percentages_are_scaled_down() {
        let specs = [ColumnWidth::Percent(100.0), ColumnWidth::Percent(100.0)];
        let widths = resolve_column_widths(&specs, Pt::from_f32(200.0));
        assert_eq!(milli(&widths), vec![100_000, 100_000]);
    }

    #[test]
    fn auto_columns_split_the_remainder() {
        let specs = [ColumnWidth::Percent(25.0), ColumnWidth::Auto, ColumnWidth::Auto];
        let widths = resolve_column_widths(&specs, Pt::from_f32(400.0));
        assert_eq!(milli(&widths), vec![100_000, 150_000, 150_000]);
    }

    #[test]
    fn infer_columns_uses_first_record_order() {
        let records = vec![
            dispenser("A", "water"),
            Record::new().with("Extra", 1).with("Label", "B"),
        ];
        let columns = infer_columns(&records).expect("columns");
        assert_eq!(columns, vec!["Label", "Reagent", "Pass/ Fail"]);
        let rows = render_rows(&columns, &records);
        assert_eq!(rows[1], vec!["B".to_string(), String::new(), String::new()]);
        assert!(matches!(infer_columns(&[]), Err(FolioError::EmptyInput(_))));
    }

    #[test]
    fn grouper_pads_the_last_row() {
        let rows = grouper(vec!['A', 'B', 'C', 'D', 'E', 'F', 'G'], 3, 'x');
        assert_eq!(
            rows,
            vec![vec!['A', 'B', 'C'], vec!['D', 'E', 'F'], vec!['G', 'x', 'x']]
        );
        assert!(grouper(Vec::<char>::new(), 3, 'x').is_empty());
    }

    #[test]
    fn data_table_titles_and_breaks_headers() {
        let styles = StyleSheet::sample();
        let input = TableInput::Records(vec![dispenser("A", "water"), dispenser("B", "oil")]);
        let table = data_table(&input, None, None, &styles).expect("table");
        assert_eq!(table.header_labels(), vec!["Label", "Reagent", "Pass/\nFail"]);
        assert_eq!(table.body_row_count(), 2);
        let again = data_table(&input, None, None, &styles).expect("table");
        assert_eq!(table.header_labels(), again.header_labels());
    }

    #[test]
    fn data_table_honours_explicit_order() {
        let styles = StyleSheet::sample();
        let input = TableInput::Records(vec![dispenser("A", "water")]);
        let order = vec!["Reagent".to_string(), "Label".to_string()];
        let table = data_table(&input, None, Some(&order), &styles).expect("table");
        assert_eq!(table.body_texts(), vec![vec!["water", "A"]]);
    }

    #[test]
    fn data_table_rejects_empty_and_mismatched_input() {
        let styles = StyleSheet::sample();
        let empty = TableInput::Records(Vec::new());
        assert!(matches!(
            data_table(&empty, None, None, &styles),
            Err(FolioError::EmptyInput(_))
        ));
        let input = TableInput::Records(vec![dispenser("A", "water")]);
        let widths = [ColumnWidth::Percent(50.0), ColumnWidth::Percent(50.0)];
        match data_table(&input, Some(&widths), None, &styles) {
            Err(FolioError::ColumnMismatch {
                expected, actual, ..
            }) => assert_eq!((expected, actual), (3, 2)),
            other => panic!("expected column mismatch, got {other:?}"),
        }
    }

    #[test]
    fn row_input_uses_the_first_row_as_header() {
        let styles = StyleSheet::sample();
        let rows = vec![
            vec!["Dispenser Label".to_string(), "Volume".to_string()],
            vec!["A".to_string()],
        ];
        let table = data_table(&TableInput::Rows(rows), None, None, &styles).expect("table");
        assert_eq!(table.header_labels(), vec!["Dispenser Label", "Volume"]);
        assert_eq!(table.body_texts(), vec![vec!["A", ""]]);
    }

    #[test]
    fn row_input_refuses_a_column_order() {
        let styles = StyleSheet::sample();
        let rows = vec![
            vec!["Label".to_string(), "Volume".to_string()],
            vec!["A".to_string(), "1".to_string()],
        ];
        let order = vec!["Volume".to_string(), "Label".to_string()];
        let result = data_table(&TableInput::Rows(rows), None, Some(&order), &styles);
        assert!(matches!(result, Err(FolioError::InvalidConfiguration(_))));
    }

    #[test]
    fn audit_table_is_omitted_when_empty() {
        let styles = StyleSheet::sample();
        assert!(audit_table(&[], None, &styles).expect("no error").is_none());
        let table = audit_table(&[audit("S2SL7S4")], None, &styles)
            .expect("no error")
            .expect("table");
        assert_eq!(
            table.header_labels(),
            vec!["Label", "Reason", "User", "Date", "Description"]
        );
        assert_eq!(table.column_widths()[4], ColumnWidth::Percent(40.0));
    }

    #[test]
    fn audit_table_requires_five_columns() {
        let styles = StyleSheet::sample();
        let short = Record::new().with("label", "x").with("reason", "y");
        assert!(matches!(
            audit_table(&[short], None, &styles),
            Err(FolioError::ColumnMismatch { expected: 2, actual: 5, .. })
        ));
    }

    #[test]
    fn summary_grid_inserts_blank_cell() {
        let styles = StyleSheet::sample();
        let summary = Record::new().with("Report Name", "X").with("Total", 3);
        let portrait = summary_table(&summary, Orientation::Portrait, &styles);
        assert_eq!(
            portrait.body_texts(),
            vec![vec!["Report Name: X", "Total: 3"], vec!["", ""]]
        );
        let landscape = summary_table(&summary, Orientation::Landscape, &styles);
        assert_eq!(landscape.column_count(), 3);
        assert_eq!(landscape.body_row_count(), 1);
        let empty = summary_table(&Record::new(), Orientation::Portrait, &styles);
        assert_eq!(empty.body_row_count(), 0);
        assert_eq!(empty.wrap(Pt::from_f32(500.0), Pt::from_f32(500.0)).height, Pt::ZERO);
    }

    #[test]
    fn split_repeats_the_header() {
        let styles = StyleSheet::sample();
        let records: Vec<Record> = (0..40).map(|i| dispenser(&format!("D{i}"), "water")).collect();
        let table = data_table(&TableInput::Records(records), None, None, &styles).expect("table");
        let width = Pt::from_f32(400.0);
        let (first, second) = table.split(width, Pt::from_f32(200.0)).expect("split");
        let first_h = first.wrap(width, Pt::from_f32(200.0)).height;
        assert!(first_h <= Pt::from_f32(200.0));
        let mut canvas = Canvas::new(Size::a4());
        second.draw(&mut canvas, Pt::ZERO, Pt::ZERO, width, Pt::from_f32(800.0));
        let doc = canvas.finish();
        let texts: Vec<&str> = doc.pages[0]
            .commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::DrawString { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts.first().copied(), Some("Label"));
    }

    #[test]
    fn split_refuses_when_no_body_row_fits() {
        let styles = StyleSheet::sample();
        let records: Vec<Record> = (0..3).map(|i| dispenser(&format!("D{i}"), "water")).collect();
        let table = data_table(&TableInput::Records(records), None, None, &styles).expect("table");
        assert!(table.split(Pt::from_f32(400.0), Pt::from_f32(20.0)).is_none());
    }
}
