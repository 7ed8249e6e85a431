use crate::canvas::{Canvas, PageState};
use crate::debug::{BreakReason, DebugLogger};
use crate::doc_context::DocContext;
use crate::error::FolioError;
use crate::flowable::Flowable;
use crate::frame::{AddResult, Frame};
use crate::metrics::{DocumentMetrics, PageMetrics};
use crate::page_template::PageTemplate;
use crate::types::Pt;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

/// Result of the layout pass: one parked page state per physical page, in
/// page order, plus per-page metrics.
pub struct LayoutOutcome {
    pub states: Vec<PageState>,
    pub metrics: DocumentMetrics,
}

/// Flows a story through one page template. Pages are captured, not
/// finalized; the caller decides what happens to them once the page count
/// is known.
pub struct DocTemplate {
    template: PageTemplate,
    story: Vec<Box<dyn Flowable>>,
    debug: Option<Arc<DebugLogger>>,
}

struct PageCursor<'a> {
    template: &'a PageTemplate,
    debug: Option<&'a DebugLogger>,
    canvas: Canvas,
    page_number: usize,
    frame: Frame,
    placed_on_page: bool,
    page_flowables: usize,
    metrics: DocumentMetrics,
}

impl<'a> PageCursor<'a> {
    fn start(template: &'a PageTemplate, debug: Option<&'a DebugLogger>) -> Self {
        let mut cursor = Self {
            template,
            debug,
            canvas: Canvas::capturing(template.page_size),
            page_number: 1,
            frame: template.new_frame(),
            placed_on_page: false,
            page_flowables: 0,
            metrics: DocumentMetrics::default(),
        };
        cursor.begin_page();
        cursor
    }

    fn begin_page(&mut self) {
        self.frame = self.template.new_frame();
        self.placed_on_page = false;
        if let Some(callback) = self.template.on_page() {
            let context =
                DocContext::new(self.page_number, &self.template.name, self.template.page_size);
            callback(&mut self.canvas, &context);
        }
        self.canvas.meta("page_template", self.template.name.clone());
    }

    fn finish_page(&mut self) {
        let command_count = self.canvas.current_command_count();
        self.metrics.pages.push(PageMetrics {
            page_number: self.page_number,
            command_count,
            flowable_count: self.page_flowables,
        });
        self.canvas.show_page();
        self.page_flowables = 0;
        if let Some(logger) = self.debug {
            logger.page_captured(self.page_number, command_count);
        }
    }

    fn next_page(&mut self, reason: BreakReason, flowable_name: &str) {
        if let Some(logger) = self.debug {
            logger.page_break(reason, self.page_number, flowable_name);
        }
        self.finish_page();
        self.page_number += 1;
        self.begin_page();
    }
}

impl DocTemplate {
    pub fn new(template: PageTemplate) -> Self {
        Self {
            template,
            story: Vec::new(),
            debug: None,
        }
    }

    pub(crate) fn with_debug(mut self, debug: Option<Arc<DebugLogger>>) -> Self {
        self.debug = debug;
        self
    }

    pub fn add_flowable(&mut self, flowable: Box<dyn Flowable>) {
        self.story.push(flowable);
    }

    /// Lays out the story. Fails without producing any page when a flowable
    /// cannot be placed even on an empty page.
    pub fn layout(self) -> Result<LayoutOutcome, FolioError> {
        let started = Instant::now();
        let frame_rect = self.template.frame_rect();
        let mut page = PageCursor::start(&self.template, self.debug.as_deref());
        let mut story: VecDeque<Box<dyn Flowable>> = self.story.into_iter().collect();

        while let Some(flowable) = story.pop_front() {
            let mut current = flowable;
            loop {
                let name = current.debug_name();
                let exhausted = page.frame.remaining_height() <= Pt::ZERO;
                match page.frame.add(current, &mut page.canvas)? {
                    AddResult::Placed => {
                        page.placed_on_page = true;
                        page.page_flowables += 1;
                        break;
                    }
                    AddResult::Split(remaining) => {
                        page.placed_on_page = true;
                        page.page_flowables += 1;
                        current = remaining;
                        page.next_page(BreakReason::FlowableSplit, name);
                    }
                    AddResult::Overflow(remaining) => {
                        if !page.placed_on_page {
                            let size = remaining.wrap(frame_rect.width, frame_rect.height);
                            return Err(FolioError::LayoutOverflow(format!(
                                "{} needs {:.2}x{:.2}pt but an empty frame offers {:.2}x{:.2}pt",
                                name,
                                size.width.to_f32(),
                                size.height.to_f32(),
                                frame_rect.width.to_f32(),
                                frame_rect.height.to_f32()
                            )));
                        }
                        current = remaining;
                        let reason = if exhausted {
                            BreakReason::FrameExhausted
                        } else {
                            BreakReason::FrameOverflow
                        };
                        page.next_page(reason, name);
                    }
                }
            }
        }

        // The last page always holds the last placed flowable; an empty
        // story still produces one page.
        if page.placed_on_page || page.canvas.saved_state_count() == 0 {
            page.finish_page();
        }
        let mut metrics = page.metrics;
        metrics.layout_ms = started.elapsed().as_secs_f64() * 1000.0;
        Ok(LayoutOutcome {
            states: page.canvas.take_saved_states(),
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;
    use crate::flowable::{Paragraph, Spacer};
    use crate::style::{STYLE_NORMAL, StyleSheet};
    use crate::types::{Margins, Pt, Size};

    fn template() -> PageTemplate {
        PageTemplate::new("report", Size::a4(), Margins::report_default())
            .set_on_page(|canvas, ctx| {
                canvas.draw_string(Pt::ZERO, Pt::ZERO, format!("header {}", ctx.page_number));
            })
    }

    #[test]
    fn empty_story_yields_one_page() {
        let outcome = DocTemplate::new(template()).layout().expect("layout");
        assert_eq!(outcome.states.len(), 1);
        assert_eq!(outcome.metrics.page_count(), 1);
    }

    #[test]
    fn tall_story_is_captured_page_by_page() {
        let mut doc = DocTemplate::new(template());
        for _ in 0..5 {
            doc.add_flowable(Box::new(Spacer::new(300.0)));
        }
        let outcome = doc.layout().expect("layout");
        // 748.29pt per frame holds two 300pt spacers.
        assert_eq!(outcome.states.len(), 3);
        let headers: Vec<String> = outcome
            .states
            .iter()
            .filter_map(|state| {
                state.commands.iter().find_map(|cmd| match cmd {
                    Command::DrawString { text, .. } => Some(text.clone()),
                    _ => None,
                })
            })
            .collect();
        assert_eq!(headers, vec!["header 1", "header 2", "header 3"]);
    }

    #[test]
    fn long_paragraph_splits_across_pages() {
        let style = StyleSheet::sample().resolve(STYLE_NORMAL);
        let text = (0..100).map(|i| format!("row {i}")).collect::<Vec<_>>().join("\n");
        let mut doc = DocTemplate::new(template());
        doc.add_flowable(Box::new(Paragraph::new(text, style)));
        let outcome = doc.layout().expect("layout");
        assert_eq!(outcome.states.len(), 2);
        assert_eq!(outcome.metrics.pages[1].flowable_count, 1);
    }

    #[test]
    fn unplaceable_flowable_aborts_layout() {
        let mut doc = DocTemplate::new(template());
        doc.add_flowable(Box::new(Spacer::new(2000.0)));
        assert!(matches!(doc.layout(), Err(FolioError::LayoutOverflow(_))));
    }

    #[test]
    fn page_breaks_are_traced_with_their_reason() {
        let path = std::env::temp_dir().join(format!(
            "folio_layout_trace_{}_{}.jsonl",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        let logger = Arc::new(DebugLogger::new(&path).expect("trace"));
        let style = StyleSheet::sample().resolve(STYLE_NORMAL);
        let text = (0..80).map(|i| format!("row {i}")).collect::<Vec<_>>().join("\n");
        let mut doc = DocTemplate::new(template()).with_debug(Some(logger.clone()));
        doc.add_flowable(Box::new(Spacer::new(400.0)));
        doc.add_flowable(Box::new(Spacer::new(400.0)));
        doc.add_flowable(Box::new(Paragraph::new(text, style)));
        let outcome = doc.layout().expect("layout");
        logger.summary("layout");
        let trace = std::fs::read_to_string(&path).expect("read trace");
        let _ = std::fs::remove_file(&path);
        assert!(trace.contains("\"reason\":\"frame_overflow\",\"from_page\":1,\"to_page\":2"));
        assert!(trace.contains("\"reason\":\"flowable_split\""));
        assert_eq!(
            trace.matches("\"type\":\"layout.page_captured\"").count(),
            outcome.states.len()
        );
    }
}
