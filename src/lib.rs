mod assets;
mod canvas;
mod debug;
mod doc_context;
mod doc_template;
mod error;
mod flowable;
mod font;
mod frame;
mod metrics;
mod page_template;
mod pdf;
mod pdfinspect;
mod record;
mod render;
mod report;
mod signature;
mod style;
mod table;
mod types;

pub use assets::{ImageAsset, ImageRegistry, LogoSource, decode_image_bytes, load_logo};
pub use canvas::{Canvas, Command, Document, Page, PageState};
pub use doc_context::DocContext;
pub use doc_template::{DocTemplate, LayoutOutcome};
pub use error::FolioError;
pub use flowable::{
    BreakInside, Flowable, Pagination, Paragraph, Spacer, TextAlign, TextRun, VerticalAlign,
};
pub use frame::{AddResult, Frame};
pub use metrics::{DocumentMetrics, PageMetrics};
pub use page_template::{OnPageCallback, PageTemplate};
pub use pdf::{PdfOptions, document_to_pdf};
pub use pdfinspect::{
    PageText, PdfInspectError, PdfInspectErrorCode, PdfInspectReport, inspect_pdf_bytes,
    inspect_pdf_path,
};
pub use record::{CellValue, Record, title_case};
pub use render::{
    LOGO_RESOURCE_ID, PageDecorations, RenderOutput, TwoPassRenderer, generated_label,
    page_number_label,
};
pub use report::{
    DEFAULT_AUDIT_HEADING, DEFAULT_DATA_HEADING, FlowComposition, FlowElement, Report,
    ReportBuilder, SIGNATURE_ROLES,
};
pub use signature::{SignatureBlock, SignatureGeometry};
pub use style::{
    ParagraphStyle, Rule, STYLE_BODY_TEXT, STYLE_HEADING2, STYLE_NORMAL, StyleSheet, TableStyle,
};
pub use table::{
    AUDIT_COLUMN_PERCENTS, ColumnWidth, TableFlowable, TableInput, audit_table, data_table,
    infer_columns, parse_column_widths, render_rows, resolve_column_widths, summary_columns,
    summary_table,
};
pub use types::{Color, Margins, Orientation, Pt, Rect, Size};
