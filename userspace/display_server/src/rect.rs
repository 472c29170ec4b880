use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::primitives::Rectangle as EgRectangle;

/// Screen- or window-space rectangle in whole pixels.
///
/// "Empty" means zero width or zero height; the position of an empty
/// rectangle carries no meaning and `intersection` returns `Rectangle::EMPTY`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Pieces of a subtraction, at most one per side.
pub type Pieces = heapless::Vec<Rectangle, 4>;

impl Rectangle {
    pub const EMPTY: Self = Self::new(0, 0, 0, 0);

    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning the half-open ranges `x0..x1`, `y0..y1`.
    fn from_edges(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        if x0 >= x1 || y0 >= y1 {
            return Self::EMPTY;
        }
        Self::new(x0, y0, x1.abs_diff(x0), y1.abs_diff(y0))
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn end_x(&self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    pub fn end_y(&self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.end_x() && y >= self.y && y < self.end_y()
    }

    pub fn intersects(&self, other: &Rectangle) -> bool {
        !self.intersection(other).is_empty()
    }

    pub fn intersection(&self, other: &Rectangle) -> Rectangle {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        Self::from_edges(
            self.x.max(other.x),
            self.y.max(other.y),
            self.end_x().min(other.end_x()),
            self.end_y().min(other.end_y()),
        )
    }

    /// The parts of `self` not covered by `other`, as disjoint pieces in the
    /// order top strip, bottom strip, then the left and right strips beside
    /// the covered band. `self` comes back whole when the two are disjoint,
    /// and nothing comes back iff `other` covers `self`.
    pub fn subtraction(&self, other: &Rectangle) -> Pieces {
        let mut pieces = Pieces::new();
        let inter = self.intersection(other);
        if inter.is_empty() {
            if !self.is_empty() {
                let _ = pieces.push(*self);
            }
            return pieces;
        }
        let candidates = [
            Self::from_edges(self.x, self.y, self.end_x(), inter.y),
            Self::from_edges(self.x, inter.end_y(), self.end_x(), self.end_y()),
            Self::from_edges(self.x, inter.y, inter.x, inter.end_y()),
            Self::from_edges(inter.end_x(), inter.y, self.end_x(), inter.end_y()),
        ];
        for piece in candidates.into_iter().filter(|r| !r.is_empty()) {
            // At most four candidates, so this never overflows.
            let _ = pieces.push(piece);
        }
        pieces
    }

    /// Fit the rectangle onto a `screen_w` × `screen_h` screen.
    ///
    /// A negative origin shrinks the rectangle instead of moving it, but only
    /// while the overhang fits inside the size (`-x > width` is rejected).
    /// Returns `None` when nothing remains on screen.
    pub fn clamp_to_bounds(&self, screen_w: u32, screen_h: u32) -> Option<Rectangle> {
        let (x, width) = clamp_axis(self.x, self.width)?;
        let (y, height) = clamp_axis(self.y, self.height)?;
        if x >= screen_w || y >= screen_h {
            return None;
        }
        let width = width.min(screen_w - x);
        let height = height.min(screen_h - y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(Rectangle::new(x as i32, y as i32, width, height))
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rectangle {
        Rectangle::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }
}

fn clamp_axis(pos: i32, len: u32) -> Option<(u32, u32)> {
    if pos >= 0 {
        return Some((pos as u32, len));
    }
    let overhang = pos.unsigned_abs();
    if overhang > len {
        return None;
    }
    Some((0, len - overhang))
}

impl From<Rectangle> for EgRectangle {
    fn from(r: Rectangle) -> Self {
        EgRectangle::new(Point::new(r.x, r.y), Size::new(r.width, r.height))
    }
}

impl From<EgRectangle> for Rectangle {
    fn from(r: EgRectangle) -> Self {
        Rectangle::new(r.top_left.x, r.top_left.y, r.size.width, r.size.height)
    }
}
