use crate::assets::{LogoSource, load_logo};
use crate::debug::DebugLogger;
use crate::error::FolioError;
use crate::flowable::{Flowable, Paragraph, Spacer};
use crate::metrics::DocumentMetrics;
use crate::record::Record;
use crate::render::{PageDecorations, TwoPassRenderer};
use crate::signature::{SignatureBlock, SignatureGeometry};
use crate::style::{STYLE_HEADING2, StyleSheet};
use crate::table::{ColumnWidth, TableFlowable, TableInput, audit_table, data_table, summary_table};
use crate::types::{Margins, Orientation, Rect, Size};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_DATA_HEADING: &str = "Dispenser Details";
pub const DEFAULT_AUDIT_HEADING: &str = "Audits and Exclusions";
pub const SIGNATURE_ROLES: [&str; 2] = ["Operator", "Reviewer"];

const SPACER_BEFORE_SIGNATURES: f32 = 0.05;
const SPACER_BETWEEN_SIGNATURES: f32 = 0.27;

/// One renderable unit of the report body.
#[derive(Debug, Clone)]
pub enum FlowElement {
    Paragraph(Paragraph),
    Table(TableFlowable),
    Spacer(Spacer),
    Signature(SignatureBlock),
}

impl FlowElement {
    pub fn kind(&self) -> &'static str {
        match self {
            FlowElement::Paragraph(_) => "paragraph",
            FlowElement::Table(_) => "table",
            FlowElement::Spacer(_) => "spacer",
            FlowElement::Signature(_) => "signature",
        }
    }

    pub fn as_table(&self) -> Option<&TableFlowable> {
        match self {
            FlowElement::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_signature(&self) -> Option<&SignatureBlock> {
        match self {
            FlowElement::Signature(block) => Some(block),
            _ => None,
        }
    }

    fn into_flowable(self) -> Box<dyn Flowable> {
        match self {
            FlowElement::Paragraph(p) => Box::new(p),
            FlowElement::Table(t) => Box::new(t),
            FlowElement::Spacer(s) => Box::new(s),
            FlowElement::Signature(s) => Box::new(s),
        }
    }
}

/// Append-only sequence of flow elements. Nothing already appended is ever
/// handed out mutably.
#[derive(Debug, Clone, Default)]
pub struct FlowComposition {
    elements: Vec<FlowElement>,
}

impl FlowComposition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: FlowElement) {
        self.elements.push(element);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlowElement> {
        self.elements.iter()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableFlowable> {
        self.elements.iter().filter_map(FlowElement::as_table)
    }

    pub fn signatures(&self) -> impl Iterator<Item = &SignatureBlock> {
        self.elements.iter().filter_map(FlowElement::as_signature)
    }

    fn extend(&mut self, elements: Vec<FlowElement>) {
        self.elements.extend(elements);
    }

    fn into_story(self) -> Vec<Box<dyn Flowable>> {
        self.elements
            .into_iter()
            .map(FlowElement::into_flowable)
            .collect()
    }
}

pub struct ReportBuilder {
    title: String,
    orientation: Orientation,
    margins: Margins,
    logo: LogoSource,
    generation_date: Option<NaiveDate>,
    styles: Arc<StyleSheet>,
    data_heading: String,
    audit_heading: String,
    debug_path: Option<PathBuf>,
}

impl ReportBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            orientation: Orientation::Portrait,
            margins: Margins::report_default(),
            logo: LogoSource::default(),
            generation_date: None,
            styles: StyleSheet::shared(),
            data_heading: DEFAULT_DATA_HEADING.to_string(),
            audit_heading: DEFAULT_AUDIT_HEADING.to_string(),
            debug_path: None,
        }
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn landscape(self) -> Self {
        self.orientation(Orientation::Landscape)
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Replaces the built-in mark drawn in the top-right logo slot.
    pub fn logo(mut self, source: LogoSource) -> Self {
        self.logo = source;
        self
    }

    pub fn logo_path(self, path: impl Into<PathBuf>) -> Self {
        self.logo(LogoSource::Path(path.into()))
    }

    /// Pins the "Document Generated" date. Without it the local date is read
    /// once when rendering starts.
    pub fn generation_date(mut self, date: NaiveDate) -> Self {
        self.generation_date = Some(date);
        self
    }

    pub fn styles(mut self, styles: Arc<StyleSheet>) -> Self {
        self.styles = styles;
        self
    }

    pub fn data_heading(mut self, heading: impl Into<String>) -> Self {
        self.data_heading = heading.into();
        self
    }

    pub fn audit_heading(mut self, heading: impl Into<String>) -> Self {
        self.audit_heading = heading.into();
        self
    }

    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    /// Checks the page geometry and the style fonts, then opens the debug
    /// log when one was requested.
    pub fn build(self) -> Result<Report, FolioError> {
        self.styles.check_fonts()?;
        let page_size = Size::a4_oriented(self.orientation);
        let frame = self.margins.content_rect(page_size);
        if frame.width.to_milli_i64() <= 0 || frame.height.to_milli_i64() <= 0 {
            return Err(FolioError::InvalidConfiguration(format!(
                "margins leave no room on a {:.2}x{:.2}pt page",
                page_size.width.to_f32(),
                page_size.height.to_f32()
            )));
        }
        let debug = if let Some(path) = self.debug_path {
            Some(Arc::new(DebugLogger::new(path)?))
        } else {
            None
        };
        Ok(Report {
            title: self.title,
            orientation: self.orientation,
            page_size,
            margins: self.margins,
            logo: self.logo,
            generation_date: self.generation_date,
            styles: self.styles,
            data_heading: self.data_heading,
            audit_heading: self.audit_heading,
            composition: FlowComposition::new(),
            debug,
        })
    }

    /// Builds the report and composes the standard section sequence in one go.
    pub fn compose(
        self,
        summary: &Record,
        data: &TableInput,
        audit: &[Record],
        col_widths: Option<&[ColumnWidth]>,
    ) -> Result<Report, FolioError> {
        let mut report = self.build()?;
        report.create_report(summary, data, audit, col_widths)?;
        Ok(report)
    }
}

/// A composed, not yet rendered report. Rendering consumes it.
pub struct Report {
    title: String,
    orientation: Orientation,
    page_size: Size,
    margins: Margins,
    logo: LogoSource,
    generation_date: Option<NaiveDate>,
    styles: Arc<StyleSheet>,
    data_heading: String,
    audit_heading: String,
    composition: FlowComposition,
    debug: Option<Arc<DebugLogger>>,
}

impl Report {
    pub fn builder(title: impl Into<String>) -> ReportBuilder {
        ReportBuilder::new(title)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn frame_rect(&self) -> Rect {
        self.margins.content_rect(self.page_size)
    }

    pub fn composition(&self) -> &FlowComposition {
        &self.composition
    }

    fn summary_element(&self, summary: &Record) -> FlowElement {
        FlowElement::Table(summary_table(summary, self.orientation, &self.styles))
    }

    fn heading(&self, text: &str) -> FlowElement {
        FlowElement::Paragraph(Paragraph::new(
            text,
            self.styles.resolve(STYLE_HEADING2),
        ))
    }

    fn data_elements(
        &self,
        input: &TableInput,
        col_widths: Option<&[ColumnWidth]>,
        col_order: Option<&[String]>,
    ) -> Result<Vec<FlowElement>, FolioError> {
        let table = data_table(input, col_widths, col_order, &self.styles)?;
        Ok(vec![
            self.heading(&self.data_heading),
            FlowElement::Table(table),
        ])
    }

    fn audit_elements(
        &self,
        records: &[Record],
        col_order: Option<&[String]>,
    ) -> Result<Vec<FlowElement>, FolioError> {
        Ok(match audit_table(records, col_order, &self.styles)? {
            Some(table) => vec![self.heading(&self.audit_heading), FlowElement::Table(table)],
            None => Vec::new(),
        })
    }

    fn signature_element(&self, role: &str) -> Result<FlowElement, FolioError> {
        if self.composition.signatures().any(|block| block.role() == role) {
            return Err(FolioError::InvalidConfiguration(format!(
                "a signature block for {role} already exists"
            )));
        }
        let geometry = SignatureGeometry::fitted(self.frame_rect().width);
        Ok(FlowElement::Signature(SignatureBlock::new(role, geometry)?))
    }

    pub fn add_summary(&mut self, summary: &Record) {
        let element = self.summary_element(summary);
        self.composition.push(element);
    }

    pub fn add_data_table(
        &mut self,
        input: &TableInput,
        col_widths: Option<&[ColumnWidth]>,
        col_order: Option<&[String]>,
    ) -> Result<(), FolioError> {
        let elements = self.data_elements(input, col_widths, col_order)?;
        self.composition.extend(elements);
        Ok(())
    }

    /// Returns whether anything was added; an empty audit list adds neither
    /// the heading nor the table.
    pub fn add_audit_table(
        &mut self,
        records: &[Record],
        col_order: Option<&[String]>,
    ) -> Result<bool, FolioError> {
        let elements = self.audit_elements(records, col_order)?;
        let added = !elements.is_empty();
        self.composition.extend(elements);
        Ok(added)
    }

    pub fn add_spacer(&mut self, inches: f32) {
        self.composition.push(FlowElement::Spacer(Spacer::inches(inches)));
    }

    pub fn add_paragraph(&mut self, text: impl Into<String>, style_name: &str) {
        let style = self.styles.resolve(style_name);
        self.composition
            .push(FlowElement::Paragraph(Paragraph::new(text, style)));
    }

    pub fn add_signature(&mut self, role: &str) -> Result<(), FolioError> {
        let element = self.signature_element(role)?;
        self.composition.push(element);
        Ok(())
    }

    /// Summary, data table, audit table (when there is any), then the
    /// Operator and Reviewer signature blocks. Nothing is appended unless
    /// every section builds.
    pub fn create_report(
        &mut self,
        summary: &Record,
        data: &TableInput,
        audit: &[Record],
        col_widths: Option<&[ColumnWidth]>,
    ) -> Result<(), FolioError> {
        let mut elements = vec![self.summary_element(summary)];
        elements.extend(self.data_elements(data, col_widths, None)?);
        elements.extend(self.audit_elements(audit, None)?);
        let [operator, reviewer] = SIGNATURE_ROLES;
        elements.push(FlowElement::Spacer(Spacer::inches(SPACER_BEFORE_SIGNATURES)));
        elements.push(self.signature_element(operator)?);
        elements.push(FlowElement::Spacer(Spacer::inches(SPACER_BETWEEN_SIGNATURES)));
        elements.push(self.signature_element(reviewer)?);
        self.composition.extend(elements);
        Ok(())
    }

    fn into_renderer(self) -> Result<(TwoPassRenderer, FlowComposition, Option<Arc<DebugLogger>>), FolioError> {
        let logo = load_logo(&self.logo)?;
        let generated_on = self
            .generation_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let decorations = PageDecorations {
            title: self.title,
            logo,
            generated_on,
        };
        let renderer = TwoPassRenderer::new(self.page_size, self.margins, decorations)
            .with_debug(self.debug.clone());
        Ok((renderer, self.composition, self.debug))
    }

    pub fn render_with_metrics(self) -> Result<(Vec<u8>, DocumentMetrics), FolioError> {
        let (renderer, composition, debug) = self.into_renderer()?;
        let result = renderer.render_to_bytes(composition.into_story());
        finish_debug(debug.as_deref(), "render_to_bytes");
        result
    }

    pub fn render_to_bytes(self) -> Result<Vec<u8>, FolioError> {
        self.render_with_metrics().map(|(bytes, _)| bytes)
    }

    /// Writes the PDF to `path`. On any failure the path is left untouched.
    pub fn render(self, path: impl AsRef<Path>) -> Result<DocumentMetrics, FolioError> {
        let (renderer, composition, debug) = self.into_renderer()?;
        let result = renderer.render_to_file(composition.into_story(), path.as_ref());
        finish_debug(debug.as_deref(), "render");
        result
    }
}

fn finish_debug(debug: Option<&DebugLogger>, context: &str) {
    if let Some(logger) = debug {
        logger.summary(context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{ParagraphStyle, STYLE_NORMAL};

    fn record(fields: &[(&str, &str)]) -> Record {
        fields
            .iter()
            .map(|(k, v)| (*k, *v))
            .collect()
    }

    fn data() -> TableInput {
        TableInput::Records(vec![
            record(&[("label", "A"), ("stress", "Purple"), ("reagent", "water")]),
            record(&[("label", "B"), ("stress", "Control"), ("reagent", "oil")]),
        ])
    }

    fn audit() -> Vec<Record> {
        vec![record(&[
            ("label", "A"),
            ("reason", "Prime"),
            ("user", "op"),
            ("date", "2019-12-09"),
            ("description", "excluded"),
        ])]
    }

    fn kinds(report: &Report) -> Vec<&'static str> {
        report.composition().iter().map(FlowElement::kind).collect()
    }

    #[test]
    fn sections_are_composed_in_fixed_order() {
        let summary = Record::new().with("Report Name", "X").with("Total", 3);
        let report = ReportBuilder::new("T")
            .compose(&summary, &data(), &audit(), None)
            .expect("compose");
        assert_eq!(
            kinds(&report),
            vec![
                "table",
                "paragraph",
                "table",
                "paragraph",
                "table",
                "spacer",
                "signature",
                "spacer",
                "signature"
            ]
        );
    }

    #[test]
    fn empty_audit_omits_heading_and_table() {
        let report = ReportBuilder::new("T")
            .compose(&Record::new(), &data(), &[], None)
            .expect("compose");
        assert_eq!(report.composition().tables().count(), 2);
        assert!(report
            .composition()
            .tables()
            .all(|table| table.name() != "audit"));
        assert_eq!(
            kinds(&report),
            vec!["table", "paragraph", "table", "spacer", "signature", "spacer", "signature"]
        );
    }

    #[test]
    fn empty_data_fails_and_leaves_composition_untouched() {
        let mut report = ReportBuilder::new("T").build().expect("build");
        let err = report
            .create_report(&Record::new(), &TableInput::Records(Vec::new()), &audit(), None)
            .expect_err("empty data");
        assert!(matches!(err, FolioError::EmptyInput(_)));
        assert!(report.composition().is_empty());
    }

    #[test]
    fn width_count_mismatch_is_reported() {
        let widths = vec![ColumnWidth::Percent(50.0), ColumnWidth::Percent(50.0)];
        let err = ReportBuilder::new("T")
            .compose(&Record::new(), &data(), &[], Some(&widths))
            .err()
            .expect("mismatch");
        assert!(matches!(
            err,
            FolioError::ColumnMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn signature_fields_never_collide_across_roles() {
        let report = ReportBuilder::new("T")
            .compose(&Record::new(), &data(), &[], None)
            .expect("compose");
        let blocks: Vec<_> = report.composition().signatures().collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].role(), "Operator");
        assert_eq!(blocks[1].role(), "Reviewer");
        for name in blocks[0].field_names() {
            assert!(!blocks[1].field_names().contains(&name));
        }
    }

    #[test]
    fn repeated_role_is_rejected() {
        let mut report = ReportBuilder::new("T").build().expect("build");
        report.add_signature("Operator").expect("first");
        assert!(matches!(
            report.add_signature("Operator"),
            Err(FolioError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn signatures_fit_the_frame_in_both_orientations() {
        for orientation in [Orientation::Portrait, Orientation::Landscape] {
            let mut report = ReportBuilder::new("T")
                .orientation(orientation)
                .build()
                .expect("build");
            report.add_signature("Operator").expect("signature");
            let block = report.composition().signatures().next().expect("block");
            assert!(block.geometry().extent() <= report.frame_rect().width);
        }
    }

    #[test]
    fn zero_area_margins_are_rejected() {
        let inch = crate::types::Pt::from_inches(6.0);
        let margins = Margins {
            top: inch,
            right: inch,
            bottom: inch,
            left: inch,
        };
        assert!(matches!(
            ReportBuilder::new("T").margins(margins).build(),
            Err(FolioError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn missing_logo_aborts_render() {
        let report = ReportBuilder::new("T")
            .logo_path("/nonexistent/folio/logo.png")
            .build()
            .expect("build");
        assert!(matches!(
            report.render_to_bytes(),
            Err(FolioError::AssetMissing(_))
        ));
    }

    #[test]
    fn default_report_draws_the_builtin_logo_on_every_page() {
        let rows: Vec<Record> = (0..120)
            .map(|i| record(&[("label", &format!("row {i}")), ("value", "x")]))
            .collect();
        let (bytes, metrics) = ReportBuilder::new("T")
            .compose(&Record::new(), &TableInput::Records(rows), &[], None)
            .expect("compose")
            .render_with_metrics()
            .expect("render");
        assert!(metrics.page_count() > 1);
        let draws = String::from_utf8_lossy(&bytes).matches(" Do\n").count();
        assert_eq!(draws, metrics.page_count());
    }

    #[test]
    fn unknown_style_font_is_a_missing_asset_before_layout() {
        let styles = StyleSheet::sample().with_style(ParagraphStyle::new(STYLE_NORMAL, "Arial", 10.0));
        let result = ReportBuilder::new("T").styles(Arc::new(styles)).build();
        match result {
            Err(FolioError::AssetMissing(message)) => assert!(message.contains("Arial")),
            Err(other) => panic!("expected a missing font, got {other:?}"),
            Ok(_) => panic!("expected a missing font"),
        }
    }

    #[test]
    fn custom_paragraphs_use_the_sheet() {
        let mut report = ReportBuilder::new("T").build().expect("build");
        report.add_paragraph("hello", STYLE_NORMAL);
        report.add_spacer(0.1);
        assert_eq!(kinds(&report), vec!["paragraph", "spacer"]);
    }

    #[test]
    fn debug_log_records_breaks_and_finalized_pages() {
        let path = std::env::temp_dir().join(format!(
            "folio_report_debug_{}_{}.jsonl",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        let rows: Vec<Record> = (0..120)
            .map(|i| record(&[("label", &format!("row {i}")), ("value", "x")]))
            .collect();
        let report = ReportBuilder::new("T")
            .debug_log(&path)
            .generation_date(NaiveDate::from_ymd_opt(2020, 1, 2).expect("date"))
            .compose(&Record::new(), &TableInput::Records(rows), &[], None)
            .expect("compose");
        let (_, metrics) = report.render_with_metrics().expect("render");
        assert!(metrics.page_count() > 1);
        let log = std::fs::read_to_string(&path).expect("log");
        assert!(log.contains("\"type\":\"layout.page_break\""));
        assert_eq!(
            log.matches("\"type\":\"render.page_finalized\"").count(),
            metrics.page_count()
        );
        assert!(log.contains(&format!("\"render.pages\":{}", metrics.page_count())));
        let _ = std::fs::remove_file(&path);
    }
}
