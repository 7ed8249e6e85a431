use crate::canvas::Canvas;
use crate::doc_context::DocContext;
use crate::frame::Frame;
use crate::types::{Margins, Rect, Size};
use std::sync::Arc;

/// Runs at the start of every page, before any flowable is placed.
pub type OnPageCallback = Arc<dyn Fn(&mut Canvas, &DocContext) + Send + Sync>;

/// Page geometry shared by every page of a report: one content frame inside
/// the margins plus an optional start-of-page callback.
#[derive(Clone)]
pub struct PageTemplate {
    pub name: String,
    pub page_size: Size,
    frame: Rect,
    on_page: Option<OnPageCallback>,
}

impl PageTemplate {
    pub fn new(name: impl Into<String>, page_size: Size, margins: Margins) -> Self {
        Self {
            name: name.into(),
            page_size,
            frame: margins.content_rect(page_size),
            on_page: None,
        }
    }

    pub fn set_on_page<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut Canvas, &DocContext) + Send + Sync + 'static,
    {
        self.on_page = Some(Arc::new(callback));
        self
    }

    pub fn on_page(&self) -> Option<&OnPageCallback> {
        self.on_page.as_ref()
    }

    pub fn frame_rect(&self) -> Rect {
        self.frame
    }

    /// An empty frame for a fresh page.
    pub(crate) fn new_frame(&self) -> Frame {
        Frame::new(self.frame)
    }
}
