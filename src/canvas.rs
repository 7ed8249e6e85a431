use crate::font::HELVETICA;
use crate::types::{Color, Pt, Size};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SaveState,
    RestoreState,
    // Non-rendered metadata used for page-aware reporting. Ignored by the PDF writer.
    Meta {
        key: String,
        value: String,
    },
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    SetFontName(String),
    SetFontSize(Pt),
    MoveTo {
        x: Pt,
        y: Pt,
    },
    LineTo {
        x: Pt,
        y: Pt,
    },
    Stroke,
    // `y` is the top of the text line; the writer places the baseline one
    // font size below it.
    DrawString {
        x: Pt,
        y: Pt,
        text: String,
    },
    DrawRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    DrawImage {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: String,
    },
    TextField {
        name: String,
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        default_value: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub commands: Vec<Command>,
}

impl Page {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn text_fields(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|cmd| match cmd {
            Command::TextField { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
}

/// Everything needed to resume drawing on a page after layout has moved on:
/// the page's command buffer, where the pen was, and the active font.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub commands: Vec<Command>,
    pub cursor: (Pt, Pt),
    pub font_name: String,
    pub font_size: Pt,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    font_size: Pt,
    font_name: String,
}

impl GraphicsState {
    fn initial() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_f32(1.0),
            font_size: Pt::from_f32(12.0),
            font_name: HELVETICA.to_string(),
        }
    }
}

/// Command-recording canvas. In capture mode `show_page` parks the page as a
/// [`PageState`] instead of finalizing it; the renderer later restores each
/// state, draws on it and calls [`Canvas::finalize_page`].
pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    current: Page,
    state_stack: Vec<GraphicsState>,
    current_state: GraphicsState,
    cursor: (Pt, Pt),
    capture: bool,
    saved_states: Vec<PageState>,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            current: Page::new(),
            state_stack: Vec::new(),
            current_state: GraphicsState::initial(),
            cursor: (Pt::ZERO, Pt::ZERO),
            capture: false,
            saved_states: Vec::new(),
        }
    }

    pub fn capturing(page_size: Size) -> Self {
        let mut canvas = Self::new(page_size);
        canvas.capture = true;
        canvas
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn save_state(&mut self) {
        self.state_stack.push(self.current_state.clone());
        self.current.commands.push(Command::SaveState);
    }

    pub fn restore_state(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.current_state = state;
            self.current.commands.push(Command::RestoreState);
        }
    }

    pub fn meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.current.commands.push(Command::Meta {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.current_state.fill_color == color {
            return;
        }
        self.current_state.fill_color = color;
        self.current.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.current_state.stroke_color == color {
            return;
        }
        self.current_state.stroke_color = color;
        self.current.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: Pt) {
        let width = width.max(Pt::ZERO);
        if self.current_state.line_width == width {
            return;
        }
        self.current_state.line_width = width;
        self.current.commands.push(Command::SetLineWidth(width));
    }

    pub fn set_font_name(&mut self, name: &str) {
        if self.current_state.font_name == name {
            return;
        }
        self.current_state.font_name = name.to_string();
        self.current
            .commands
            .push(Command::SetFontName(self.current_state.font_name.clone()));
    }

    pub fn set_font_size(&mut self, size: Pt) {
        if self.current_state.font_size == size {
            return;
        }
        self.current_state.font_size = size;
        self.current.commands.push(Command::SetFontSize(size));
    }

    pub fn set_font(&mut self, name: &str, size: Pt) {
        self.set_font_name(name);
        self.set_font_size(size);
    }

    pub fn font_name(&self) -> &str {
        &self.current_state.font_name
    }

    pub fn font_size(&self) -> Pt {
        self.current_state.font_size
    }

    pub fn move_to(&mut self, x: Pt, y: Pt) {
        self.cursor = (x, y);
        self.current.commands.push(Command::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: Pt, y: Pt) {
        self.cursor = (x, y);
        self.current.commands.push(Command::LineTo { x, y });
    }

    pub fn stroke(&mut self) {
        self.current.commands.push(Command::Stroke);
    }

    pub fn line(&mut self, x1: Pt, y1: Pt, x2: Pt, y2: Pt) {
        self.move_to(x1, y1);
        self.line_to(x2, y2);
        self.stroke();
    }

    pub fn draw_string(&mut self, x: Pt, y: Pt, text: impl Into<String>) {
        self.cursor = (x, y);
        self.current.commands.push(Command::DrawString {
            x,
            y,
            text: text.into(),
        });
    }

    pub fn draw_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.current.commands.push(Command::DrawRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn draw_image(
        &mut self,
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: impl Into<String>,
    ) {
        self.current.commands.push(Command::DrawImage {
            x,
            y,
            width,
            height,
            resource_id: resource_id.into(),
        });
    }

    pub fn text_field(
        &mut self,
        name: impl Into<String>,
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        default_value: impl Into<String>,
    ) {
        self.current.commands.push(Command::TextField {
            name: name.into(),
            x,
            y,
            width,
            height,
            default_value: default_value.into(),
        });
    }

    pub fn show_page(&mut self) {
        let current = std::mem::replace(&mut self.current, Page::new());
        if self.capture {
            self.saved_states.push(PageState {
                commands: current.commands,
                cursor: self.cursor,
                font_name: self.current_state.font_name.clone(),
                font_size: self.current_state.font_size,
            });
        } else {
            self.pages.push(current);
        }
        self.reset_graphics_state();
    }

    pub fn saved_state_count(&self) -> usize {
        self.saved_states.len()
    }

    /// Hands the captured pages over to the caller and leaves capture mode.
    pub fn take_saved_states(&mut self) -> Vec<PageState> {
        self.capture = false;
        std::mem::take(&mut self.saved_states)
    }

    /// Makes `state` the current page again so further drawing appends to it.
    pub fn restore_page_state(&mut self, state: PageState) {
        self.reset_graphics_state();
        self.current = Page {
            commands: state.commands,
        };
        self.cursor = state.cursor;
        self.current_state.font_name = state.font_name;
        self.current_state.font_size = state.font_size;
    }

    pub fn finalize_page(&mut self) {
        let current = std::mem::replace(&mut self.current, Page::new());
        self.pages.push(current);
        self.reset_graphics_state();
    }

    pub fn finalized_page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_command_count(&self) -> usize {
        self.current.commands.len()
    }

    pub fn is_current_empty(&self) -> bool {
        self.current.commands.is_empty()
    }

    pub fn finish(mut self) -> Document {
        if !self.current.commands.is_empty() || self.pages.is_empty() {
            self.finalize_page();
        }
        Document {
            page_size: self.page_size,
            pages: self.pages,
        }
    }

    fn reset_graphics_state(&mut self) {
        self.state_stack.clear();
        self.current_state = GraphicsState::initial();
        self.cursor = (Pt::ZERO, Pt::ZERO);
    }
}
