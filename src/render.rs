use crate::assets::{ImageAsset, ImageRegistry};
use crate::canvas::{Canvas, Document};
use crate::debug::DebugLogger;
use crate::doc_context::DocContext;
use crate::doc_template::{DocTemplate, LayoutOutcome};
use crate::error::FolioError;
use crate::flowable::Flowable;
use crate::font::{self, HELVETICA};
use crate::metrics::DocumentMetrics;
use crate::page_template::PageTemplate;
use crate::pdf::{self, PdfOptions};
use crate::types::{Margins, Pt, Rect, Size};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

pub const LOGO_RESOURCE_ID: &str = "logo";
pub const REPORT_TEMPLATE_NAME: &str = "report";

const HEADER_FONT_SIZE: f32 = 16.0;
const FOOTER_FONT_SIZE: f32 = 12.0;

pub fn page_number_label(page: usize, total: usize) -> String {
    format!("Page {page} of {total}")
}

pub fn generated_label(date: NaiveDate) -> String {
    format!("Document Generated: {}", date.format("%d-%b-%Y"))
}

/// Page-relative decorations. `generated_on` is fixed for the whole render.
#[derive(Debug, Clone)]
pub struct PageDecorations {
    pub title: String,
    pub logo: ImageAsset,
    pub generated_on: NaiveDate,
}

pub struct RenderOutput {
    pub document: Document,
    pub images: ImageRegistry,
    pub metrics: DocumentMetrics,
}

/// Lays the story out once with pages parked as [`crate::PageState`]s, then
/// replays every parked page with the total page count in hand.
pub struct TwoPassRenderer {
    page_size: Size,
    margins: Margins,
    decorations: PageDecorations,
    debug: Option<Arc<DebugLogger>>,
}

impl TwoPassRenderer {
    pub fn new(page_size: Size, margins: Margins, decorations: PageDecorations) -> Self {
        Self {
            page_size,
            margins,
            decorations,
            debug: None,
        }
    }

    pub(crate) fn with_debug(mut self, debug: Option<Arc<DebugLogger>>) -> Self {
        self.debug = debug;
        self
    }

    pub fn frame_rect(&self) -> Rect {
        self.margins.content_rect(self.page_size)
    }

    /// Single-frame template whose page callback draws the running header.
    /// The header does not depend on the page count, so it is drawn in pass 1.
    pub fn page_template(&self) -> PageTemplate {
        let title = self.decorations.title.clone();
        PageTemplate::new(REPORT_TEMPLATE_NAME, self.page_size, self.margins)
            .set_on_page(move |canvas, ctx| draw_running_header(canvas, ctx, &title))
    }

    pub fn render(&self, story: Vec<Box<dyn Flowable>>) -> Result<RenderOutput, FolioError> {
        let mut doc = DocTemplate::new(self.page_template()).with_debug(self.debug.clone());
        for flowable in story {
            doc.add_flowable(flowable);
        }
        let LayoutOutcome { states, mut metrics } = doc.layout()?;

        let started = Instant::now();
        let total = states.len();
        let mut canvas = Canvas::new(self.page_size);
        for (index, state) in states.into_iter().enumerate() {
            let page_number = index + 1;
            canvas.restore_page_state(state);
            self.decorate(&mut canvas, page_number, total);
            canvas.finalize_page();
            if let Some(logger) = self.debug.as_deref() {
                logger.page_finalized(page_number, total);
            }
        }
        debug_assert_eq!(canvas.finalized_page_count(), total);
        metrics.decorate_ms = started.elapsed().as_secs_f64() * 1000.0;

        let mut images = ImageRegistry::default();
        images.insert(LOGO_RESOURCE_ID, self.decorations.logo.clone());
        Ok(RenderOutput {
            document: canvas.finish(),
            images,
            metrics,
        })
    }

    pub fn render_to_bytes(
        &self,
        story: Vec<Box<dyn Flowable>>,
    ) -> Result<(Vec<u8>, DocumentMetrics), FolioError> {
        let RenderOutput {
            document,
            images,
            mut metrics,
        } = self.render(story)?;
        let options = PdfOptions {
            title: Some(self.decorations.title.clone()),
        };
        let bytes = pdf::document_to_pdf(&document, &images, &options)?;
        metrics.total_bytes = bytes.len();
        Ok((bytes, metrics))
    }

    /// Renders fully in memory and only then touches `path`; a failed render
    /// leaves no file behind.
    pub fn render_to_file(
        &self,
        story: Vec<Box<dyn Flowable>>,
        path: &Path,
    ) -> Result<DocumentMetrics, FolioError> {
        let (bytes, metrics) = self.render_to_bytes(story)?;
        write_atomic(path, &bytes)?;
        if let Some(logger) = self.debug.as_deref() {
            logger.output(path, bytes.len());
        }
        Ok(metrics)
    }

    fn decorate(&self, canvas: &mut Canvas, page_number: usize, total: usize) {
        let width = self.page_size.width;
        let height = self.page_size.height;
        canvas.save_state();

        let slot = Rect {
            x: width - Pt::from_inches(2.5),
            y: Pt::from_inches(0.1),
            width: Pt::from_inches(2.0),
            height: Pt::from_inches(0.5),
        };
        let placed = self.decorations.logo.fit_centered(slot);
        canvas.draw_image(
            placed.x,
            placed.y,
            placed.width,
            placed.height,
            LOGO_RESOURCE_ID,
        );

        let size = Pt::from_f32(FOOTER_FONT_SIZE);
        canvas.set_font(HELVETICA, size);
        // Baseline 0.3in above the bottom edge; draw_string takes the line top.
        let top = height - Pt::from_inches(0.3) - size;

        let label = page_number_label(page_number, total);
        let label_width = font::measure_text_width(HELVETICA, size, &label);
        canvas.draw_string(width.mul_ratio(15, 16) - label_width, top, label);
        canvas.draw_string(
            width.mul_ratio(1, 16),
            top,
            generated_label(self.decorations.generated_on),
        );
        canvas.restore_state();
    }
}

fn draw_running_header(canvas: &mut Canvas, ctx: &DocContext, title: &str) {
    let size = Pt::from_f32(HEADER_FONT_SIZE);
    canvas.save_state();
    canvas.set_font(HELVETICA, size);
    canvas.draw_string(
        ctx.page_size.width.mul_ratio(1, 16),
        Pt::from_inches(0.35) - size,
        title,
    );
    canvas.restore_state();
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    path.with_file_name(format!(".{name}.{}.{stamp}.tmp", std::process::id()))
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), FolioError> {
    let tmp = temp_sibling(path);
    let result = std::fs::write(&tmp, bytes).and_then(|_| std::fs::rename(&tmp, path));
    if let Err(err) = result {
        let _ = std::fs::remove_file(&tmp);
        return Err(FolioError::Io(err));
    }
    Ok(())
}
