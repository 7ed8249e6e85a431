use crate::types::Size;

/// What a page callback knows about the page being started. The total page
/// count is deliberately absent: it does not exist until layout finishes.
#[derive(Debug, Clone)]
pub struct DocContext {
    pub page_number: usize,
    pub template_name: String,
    pub page_size: Size,
}

impl DocContext {
    pub fn new(page_number: usize, template_name: impl Into<String>, page_size: Size) -> Self {
        Self {
            page_number,
            template_name: template_name.into(),
            page_size,
        }
    }
}
