use crate::canvas::Canvas;
use crate::error::FolioError;
use crate::flowable::{BreakInside, Flowable};
use crate::types::{Pt, Rect};

// Slack for widths that only exceed the frame through milli-point rounding.
const WIDTH_TOLERANCE_MILLI: i64 = 10;

pub enum AddResult {
    Placed,
    Split(Box<dyn Flowable>),
    Overflow(Box<dyn Flowable>),
}

pub struct Frame {
    rect: Rect,
    cursor_y: Pt,
}

impl Frame {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            cursor_y: Pt::ZERO,
        }
    }

    pub fn remaining_height(&self) -> Pt {
        (self.rect.height - self.cursor_y).max(Pt::ZERO)
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn is_empty(&self) -> bool {
        self.cursor_y <= Pt::ZERO
    }

    /// Places as much of `flowable` as fits. Content wider than the frame can
    /// never be placed on any page and is rejected outright.
    pub fn add(
        &mut self,
        flowable: Box<dyn Flowable>,
        canvas: &mut Canvas,
    ) -> Result<AddResult, FolioError> {
        let avail_width = self.rect.width;
        let gap = if self.is_empty() {
            Pt::ZERO
        } else {
            flowable.space_before()
        };
        let avail_height = self.remaining_height() - gap;
        if avail_height <= Pt::ZERO {
            return Ok(AddResult::Overflow(flowable));
        }

        let size = flowable.wrap(avail_width, avail_height);
        if size.width.to_milli_i64() > avail_width.to_milli_i64() + WIDTH_TOLERANCE_MILLI {
            return Err(FolioError::LayoutOverflow(format!(
                "{} is {:.2}pt wide but the frame is {:.2}pt",
                flowable.debug_name(),
                size.width.to_f32(),
                avail_width.to_f32()
            )));
        }

        if flowable.pagination().break_inside == BreakInside::Avoid
            && size.height > avail_height
            && !self.is_empty()
        {
            return Ok(AddResult::Overflow(flowable));
        }

        let top = self.rect.y + self.cursor_y + gap;
        if size.height <= avail_height {
            flowable.draw(canvas, self.rect.x, top, avail_width, avail_height);
            self.cursor_y += gap + size.height + flowable.space_after();
            return Ok(AddResult::Placed);
        }

        if let Some((first, second)) = flowable.split(avail_width, avail_height) {
            let first_size = first.wrap(avail_width, avail_height);
            if first_size.height > Pt::ZERO && first_size.height <= avail_height {
                first.draw(canvas, self.rect.x, top, avail_width, avail_height);
                self.cursor_y += gap + first_size.height;
                return Ok(AddResult::Split(second));
            }
        }

        Ok(AddResult::Overflow(flowable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowable::{Paragraph, Spacer};
    use crate::style::{STYLE_NORMAL, StyleSheet};
    use crate::types::Size;

    fn frame(width: f32, height: f32) -> Frame {
        Frame::new(Rect {
            x: Pt::from_f32(36.0),
            y: Pt::from_f32(36.0),
            width: Pt::from_f32(width),
            height: Pt::from_f32(height),
        })
    }

    #[test]
    fn space_before_is_skipped_at_the_top() {
        let style = StyleSheet::sample().resolve(STYLE_NORMAL);
        let mut frame = frame(200.0, 100.0);
        let mut canvas = Canvas::new(Size::a4());
        let first = Box::new(Paragraph::new("one", style.clone()));
        assert!(matches!(frame.add(first, &mut canvas), Ok(AddResult::Placed)));
        assert_eq!(frame.remaining_height(), Pt::from_f32(88.0));
        let second = Box::new(Paragraph::new("two", style));
        assert!(matches!(frame.add(second, &mut canvas), Ok(AddResult::Placed)));
        assert_eq!(frame.remaining_height(), Pt::from_f32(71.0));
    }

    #[test]
    fn tall_content_overflows_to_the_next_frame() {
        let mut frame = frame(200.0, 100.0);
        let mut canvas = Canvas::new(Size::a4());
        let spacer = Box::new(Spacer::new(60.0));
        assert!(matches!(frame.add(spacer.clone(), &mut canvas), Ok(AddResult::Placed)));
        assert!(matches!(frame.add(spacer, &mut canvas), Ok(AddResult::Overflow(_))));
    }

    #[test]
    fn wide_content_is_a_layout_error() {
        let mut frame = frame(100.0, 100.0);
        let mut canvas = Canvas::new(Size::a4());
        let block = crate::signature::SignatureBlock::new(
            "Operator",
            crate::signature::SignatureGeometry::default(),
        )
        .expect("block");
        assert!(matches!(
            frame.add(Box::new(block), &mut canvas),
            Err(FolioError::LayoutOverflow(_))
        ));
    }
}
