use crate::canvas::Canvas;
use crate::error::FolioError;
use crate::flowable::{Flowable, Pagination};
use crate::font::HELVETICA;
use crate::types::{Pt, Size};

const LABEL_FONT_SIZE: f32 = 12.0;
const LABEL_GAP: f32 = 5.0;
const FIELD_GAP: f32 = 5.0;
const DATE_EXTRA: f32 = 70.0;
const PRINT_OFFSET: f32 = 80.0;
const MAX_BOX_WIDTH: f32 = 280.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignatureGeometry {
    /// Horizontal offset of the signature box from the frame's left edge.
    pub origin_x: Pt,
    pub box_width: Pt,
    pub box_height: Pt,
}

impl Default for SignatureGeometry {
    fn default() -> Self {
        Self {
            origin_x: Pt::from_f32(-10.0),
            box_width: Pt::from_f32(MAX_BOX_WIDTH),
            box_height: Pt::from_f32(30.0),
        }
    }
}

impl SignatureGeometry {
    /// Default geometry with the box width reduced, in whole points, until
    /// all three boxes fit in `frame_width`.
    pub fn fitted(frame_width: Pt) -> Self {
        let base = Self::default();
        let room = frame_width - base.origin_x - Pt::from_f32(PRINT_OFFSET);
        let whole = (room.to_milli_i64() * 2 / 5).div_euclid(1000).max(1);
        Self {
            box_width: Pt::from_f32(whole as f32).min(base.box_width),
            ..base
        }
    }

    fn date_x(&self) -> Pt {
        self.origin_x + self.box_width + Pt::from_f32(FIELD_GAP)
    }

    fn date_width(&self) -> Pt {
        self.box_width.mul_ratio(1, 2) + Pt::from_f32(DATE_EXTRA)
    }

    fn print_x(&self) -> Pt {
        self.origin_x + self.box_width.mul_ratio(3, 2) + Pt::from_f32(PRINT_OFFSET)
    }

    /// Right edge of the print-name box relative to the frame.
    pub fn extent(&self) -> Pt {
        self.print_x() + self.box_width
    }

    /// Label line, gap and box.
    pub fn height(&self) -> Pt {
        Pt::from_f32(LABEL_FONT_SIZE + LABEL_GAP) + self.box_height
    }
}

/// Signature, date and printed-name boxes for one role. Each box is backed
/// by an empty editable text field named after the role.
#[derive(Debug, Clone)]
pub struct SignatureBlock {
    role: String,
    geometry: SignatureGeometry,
}

impl SignatureBlock {
    pub fn new(role: impl Into<String>, geometry: SignatureGeometry) -> Result<Self, FolioError> {
        let role = role.into();
        if role.trim().is_empty() {
            return Err(FolioError::InvalidConfiguration(
                "signature role must not be empty".to_string(),
            ));
        }
        if geometry.box_width <= Pt::ZERO || geometry.box_height <= Pt::ZERO {
            return Err(FolioError::InvalidConfiguration(format!(
                "signature boxes for {role} need a positive size"
            )));
        }
        Ok(Self { role, geometry })
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn geometry(&self) -> SignatureGeometry {
        self.geometry
    }

    pub fn field_names(&self) -> [String; 3] {
        [
            format!("textfield_Sign{}", self.role),
            format!("textfield_Date{}", self.role),
            format!("textfield_Print{}", self.role),
        ]
    }
}

impl Flowable for SignatureBlock {
    fn wrap(&self, _avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: self.geometry.extent(),
            height: self.geometry.height(),
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, _avail_width: Pt, _avail_height: Pt) {
        let g = self.geometry;
        let box_y = y + Pt::from_f32(LABEL_FONT_SIZE + LABEL_GAP);
        let [sign, date, print] = self.field_names();
        let boxes = [
            (format!("{} Signature", self.role), g.origin_x, g.box_width, sign),
            ("Date (DD-MMM-YYYY)".to_string(), g.date_x(), g.date_width(), date),
            ("Print Name".to_string(), g.print_x(), g.box_width, print),
        ];
        canvas.save_state();
        canvas.set_font(HELVETICA, Pt::from_f32(LABEL_FONT_SIZE));
        for (label, dx, width, field) in boxes {
            canvas.draw_string(x + dx, y, label);
            canvas.draw_rect(x + dx, box_y, width, g.box_height);
            canvas.text_field(field, x + dx, box_y, width, g.box_height, "");
        }
        canvas.restore_state();
    }

    fn pagination(&self) -> Pagination {
        Pagination::avoid()
    }

    fn debug_name(&self) -> &'static str {
        "SignatureBlock"
    }
}
