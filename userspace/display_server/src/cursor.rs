use crate::compositor::Damage;
use crate::consts::{CURSOR_FILL_COLOR, CURSOR_OUTLINE_COLOR};
use crate::frame_buffer::FrameBuffer;
use crate::rect::Rectangle;
use display_api_types::window::CursorShape;
use embedded_graphics::Pixel;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::Point;
use embedded_graphics::pixelcolor::Rgb888;

// Sprites are one u16 per row, bit 15 = leftmost column.
//
// mask:  bit = 1 -> opaque pixel
// image: bit = 1 -> white fill, bit = 0 -> black outline (only where mask = 1)

/// A cursor bitmap and the pixel that sits exactly on the pointer position.
pub struct Glyph {
    pub width: u32,
    pub height: u32,
    pub hot_x: i32,
    pub hot_y: i32,
    mask: &'static [u16],
    image: &'static [u16],
}

#[rustfmt::skip]
static ARROW: Glyph = Glyph {
    width: 14,
    height: 20,
    hot_x: 0,
    hot_y: 0,
    mask: &[
        0x8000, 0xC000, 0xE000, 0xF000, 0xF800, 0xFC00, 0xFE00, 0xFF00,
        0xFF80, 0xFFC0, 0xFFE0, 0xFFF0, 0xFFF8, 0xFFFC, 0xFF00, 0xF780,
        0xE780, 0xC3C0, 0x03C0, 0x0180,
    ],
    image: &[
        0x0000, 0x0000, 0x4000, 0x6000, 0x7000, 0x7800, 0x7C00, 0x7E00,
        0x7F00, 0x7F80, 0x7FC0, 0x7FE0, 0x7FF0, 0x7E00, 0x7600, 0x6300,
        0x4300, 0x0180, 0x0180, 0x0000,
    ],
};

// <-> for the left and right window edges.
#[rustfmt::skip]
static HORIZONTAL: Glyph = Glyph {
    width: 15,
    height: 7,
    hot_x: 7,
    hot_y: 3,
    mask: &[0x2008, 0x600C, 0xFFFE, 0xFFFE, 0xFFFE, 0x600C, 0x2008],
    image: &[0x0000, 0x2008, 0x0000, 0x7FFC, 0x0000, 0x2008, 0x0000],
};

#[rustfmt::skip]
static VERTICAL: Glyph = Glyph {
    width: 7,
    height: 15,
    hot_x: 3,
    hot_y: 7,
    mask: &[
        0x1000, 0x3800, 0x7C00, 0xFE00, 0x3800, 0x3800, 0x3800, 0x3800,
        0x3800, 0x3800, 0x3800, 0xFE00, 0x7C00, 0x3800, 0x1000,
    ],
    image: &[
        0x0000, 0x1000, 0x1000, 0x1000, 0x1000, 0x1000, 0x1000, 0x1000,
        0x1000, 0x1000, 0x1000, 0x1000, 0x1000, 0x1000, 0x0000,
    ],
};

#[rustfmt::skip]
static DIAGONAL_DOWN: Glyph = Glyph {
    width: 11,
    height: 11,
    hot_x: 5,
    hot_y: 5,
    mask: &[
        0xF800, 0xF000, 0xE000, 0xD000, 0x8800, 0x0400, 0x0220, 0x0160,
        0x00E0, 0x01E0, 0x03E0,
    ],
    image: &[0; 11],
};

#[rustfmt::skip]
static DIAGONAL_UP: Glyph = Glyph {
    width: 11,
    height: 11,
    hot_x: 5,
    hot_y: 5,
    mask: &[
        0x03E0, 0x01E0, 0x00E0, 0x0160, 0x0220, 0x0400, 0x8800, 0xD000,
        0xE000, 0xF000, 0xF800,
    ],
    image: &[0; 11],
};

impl Glyph {
    pub fn for_shape(shape: CursorShape) -> &'static Glyph {
        match shape {
            CursorShape::Default => &ARROW,
            CursorShape::ResizeLeft | CursorShape::ResizeRight => &HORIZONTAL,
            CursorShape::ResizeVertical => &VERTICAL,
            CursorShape::ResizeBottomRight => &DIAGONAL_DOWN,
            CursorShape::ResizeBottomLeft => &DIAGONAL_UP,
        }
    }

    /// Screen area covered when the hot spot is at `position`.
    pub fn footprint(&self, position: Point) -> Rectangle {
        Rectangle::new(
            position.x - self.hot_x,
            position.y - self.hot_y,
            self.width,
            self.height,
        )
    }

    fn pixels(&self, position: Point) -> impl Iterator<Item = Pixel<Rgb888>> + '_ {
        let origin = Point::new(position.x - self.hot_x, position.y - self.hot_y);
        self.mask
            .iter()
            .zip(self.image)
            .enumerate()
            .flat_map(move |(row, (&mask, &image))| {
                (0..self.width).filter_map(move |col| {
                    let bit = 0x8000u16 >> col;
                    if mask & bit == 0 {
                        return None;
                    }
                    let color = if image & bit != 0 {
                        CURSOR_FILL_COLOR
                    } else {
                        CURSOR_OUTLINE_COLOR
                    };
                    Some(Pixel(origin + Point::new(col as i32, row as i32), color))
                })
            })
    }
}

/// The software cursor drawn straight into the output buffer.
///
/// While visible, `backup` holds the pixels under the glyph (clipped to the
/// screen) so they can be put back when the cursor moves or hides.
pub struct CursorOverlay {
    position: Point,
    shape: CursorShape,
    backup: Option<(Rectangle, FrameBuffer)>,
}

impl CursorOverlay {
    /// A hidden cursor at `position`; call `show` once the screen is painted.
    pub fn new(position: Point) -> Self {
        Self {
            position,
            shape: CursorShape::Default,
            backup: None,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn shape(&self) -> CursorShape {
        self.shape
    }

    pub fn is_visible(&self) -> bool {
        self.backup.is_some()
    }

    pub fn footprint(&self) -> Rectangle {
        Glyph::for_shape(self.shape).footprint(self.position)
    }

    /// Move the hot spot (clamped to the screen) and switch shape.
    /// Nothing is restored or recaptured unless one of them changed.
    pub fn move_to(
        &mut self,
        output: &mut FrameBuffer,
        x: i32,
        y: i32,
        shape: CursorShape,
        damage: &mut Damage,
    ) {
        let position = clamp_point(output, x, y);
        if position == self.position && shape == self.shape {
            if self.is_visible() {
                self.draw(output, damage);
            }
            return;
        }
        let was_visible = self.is_visible();
        self.hide(output, damage);
        self.position = position;
        self.shape = shape;
        if was_visible {
            self.show(output, damage);
        }
    }

    /// Pixels under the cursor were just repainted: take them into the backing
    /// store and put the glyph back on top.
    pub fn on_screen_update(&mut self, output: &mut FrameBuffer, updated: Rectangle, damage: &mut Damage) {
        let Some((area, backup)) = &mut self.backup else {
            return;
        };
        let overlap = area.intersection(&updated);
        if overlap.is_empty() {
            return;
        }
        backup.blit(output, overlap, overlap.x - area.x, overlap.y - area.y);
        self.draw(output, damage);
    }

    /// Put the saved pixels back and stop drawing the cursor.
    pub fn hide(&mut self, output: &mut FrameBuffer, damage: &mut Damage) {
        if let Some((area, backup)) = self.backup.take() {
            output.blit(&backup, backup.bounds(), area.x, area.y);
            damage.add(area);
        }
    }

    /// Save what is under the glyph and draw it. No-op when already visible.
    pub fn show(&mut self, output: &mut FrameBuffer, damage: &mut Damage) {
        if self.is_visible() {
            return;
        }
        let area = self.footprint().intersection(&output.bounds());
        if area.is_empty() {
            return;
        }
        match output.capture(area) {
            Ok(backup) => {
                self.backup = Some((area, backup));
                self.draw(output, damage);
            }
            Err(err) => log::warn!("cursor backing store: {err}"),
        }
    }

    /// Forget the backing store without restoring it; the output it belonged
    /// to is gone. The position is pulled back onto the new screen.
    pub fn reset(&mut self, output: &FrameBuffer) {
        self.backup = None;
        self.shape = CursorShape::Default;
        self.position = clamp_point(output, self.position.x, self.position.y);
    }

    fn draw(&self, output: &mut FrameBuffer, damage: &mut Damage) {
        let glyph = Glyph::for_shape(self.shape);
        let Ok(()) = output.draw_iter(glyph.pixels(self.position));
        damage.add(self.footprint().intersection(&output.bounds()));
    }
}

fn clamp_point(output: &FrameBuffer, x: i32, y: i32) -> Point {
    let max_x = output.width().saturating_sub(1) as i32;
    let max_y = output.height().saturating_sub(1) as i32;
    Point::new(x.clamp(0, max_x), y.clamp(0, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use display_api_types::graphics::PixelFormat;

    fn screen() -> FrameBuffer {
        let mut fb = FrameBuffer::new(64, 48, PixelFormat::XRGB8888).unwrap();
        for y in 0..48 {
            for x in 0..64 {
                fb.set_pixel(x, y, (y * 64 + x) as u32 + 0x100);
            }
        }
        fb
    }

    #[test]
    fn glyph_tables_match_their_size() {
        for shape in [
            CursorShape::Default,
            CursorShape::ResizeLeft,
            CursorShape::ResizeBottomRight,
            CursorShape::ResizeVertical,
            CursorShape::ResizeBottomLeft,
            CursorShape::ResizeRight,
        ] {
            let glyph = Glyph::for_shape(shape);
            assert_eq!(glyph.mask.len(), glyph.height as usize, "{shape:?}");
            assert_eq!(glyph.image.len(), glyph.height as usize, "{shape:?}");
            let spare = u16::MAX >> glyph.width;
            assert!(glyph.mask.iter().all(|row| row & spare == 0), "{shape:?}");
        }
    }

    #[test]
    fn moving_restores_the_old_spot() {
        let original = screen();
        let mut fb = screen();
        let mut damage = Damage::default();
        let mut cursor = CursorOverlay::new(Point::new(10, 10));
        cursor.show(&mut fb, &mut damage);
        assert_ne!(fb.as_bytes(), original.as_bytes());
        // Hot spot of the arrow is its black tip.
        assert_eq!(fb.pixel(10, 10), Some(0));

        cursor.move_to(&mut fb, 40, 20, CursorShape::Default, &mut damage);
        assert_eq!(fb.pixel(10, 10), original.pixel(10, 10));
        assert_eq!(fb.pixel(11, 12), original.pixel(11, 12));
        assert_eq!(fb.pixel(40, 20), Some(0));

        cursor.hide(&mut fb, &mut damage);
        assert_eq!(fb.as_bytes(), original.as_bytes());
    }

    #[test]
    fn repeated_moves_to_the_same_spot_change_nothing() {
        let mut fb = screen();
        let mut damage = Damage::default();
        let mut cursor = CursorOverlay::new(Point::new(0, 0));
        cursor.show(&mut fb, &mut damage);
        cursor.move_to(&mut fb, 5, 6, CursorShape::Default, &mut damage);
        let screen_once = fb.as_bytes().to_vec();
        let backup_once = cursor.backup.as_ref().unwrap().1.as_bytes().to_vec();

        cursor.move_to(&mut fb, 5, 6, CursorShape::Default, &mut damage);
        cursor.move_to(&mut fb, 5, 6, CursorShape::Default, &mut damage);
        assert_eq!(fb.as_bytes(), &screen_once[..]);
        assert_eq!(cursor.backup.as_ref().unwrap().1.as_bytes(), &backup_once[..]);
    }

    #[test]
    fn repaints_under_the_cursor_survive_the_next_move() {
        let mut fb = screen();
        let mut damage = Damage::default();
        let mut cursor = CursorOverlay::new(Point::new(20, 20));
        cursor.show(&mut fb, &mut damage);

        let repaint = Rectangle::new(18, 18, 10, 10);
        fb.fill(repaint, 0x77);
        cursor.on_screen_update(&mut fb, repaint, &mut damage);
        assert_eq!(fb.pixel(20, 20), Some(0), "glyph redrawn on top");

        cursor.move_to(&mut fb, 50, 40, CursorShape::Default, &mut damage);
        assert_eq!(fb.pixel(20, 20), Some(0x77));
        assert_eq!(fb.pixel(21, 22), Some(0x77));
    }

    #[test]
    fn position_is_clamped_and_glyph_clipped() {
        let original = screen();
        let mut fb = screen();
        let mut damage = Damage::default();
        let mut cursor = CursorOverlay::new(Point::new(0, 0));
        cursor.show(&mut fb, &mut damage);
        cursor.move_to(&mut fb, 500, -7, CursorShape::ResizeVertical, &mut damage);
        assert_eq!(cursor.position(), Point::new(63, 0));
        let (area, _) = cursor.backup.as_ref().unwrap();
        assert_eq!(*area, Rectangle::new(60, 0, 4, 8));

        cursor.hide(&mut fb, &mut damage);
        assert_eq!(fb.as_bytes(), original.as_bytes());
    }

    #[test]
    fn shape_change_recaptures() {
        let mut fb = screen();
        let mut damage = Damage::default();
        let mut cursor = CursorOverlay::new(Point::new(30, 30));
        cursor.show(&mut fb, &mut damage);
        cursor.move_to(&mut fb, 30, 30, CursorShape::ResizeLeft, &mut damage);
        assert_eq!(cursor.footprint(), Rectangle::new(23, 27, 15, 7));
        assert_eq!(cursor.backup.as_ref().unwrap().0, Rectangle::new(23, 27, 15, 7));
        // Arrow pixels outside the new glyph are gone.
        assert_eq!(fb.pixel(30, 40), screen().pixel(30, 40));
    }

    #[test]
    fn reset_drops_the_backing_store() {
        let mut fb = screen();
        let mut damage = Damage::default();
        let mut cursor = CursorOverlay::new(Point::new(60, 40));
        cursor.show(&mut fb, &mut damage);
        let small = FrameBuffer::new(16, 16, PixelFormat::XRGB8888).unwrap();
        cursor.reset(&small);
        assert!(!cursor.is_visible());
        assert_eq!(cursor.position(), Point::new(15, 15));
        assert_eq!(cursor.shape(), CursorShape::Default);
    }
}
