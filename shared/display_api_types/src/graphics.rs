/// Bit layout of one pixel: total depth plus the size and position of each colour field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    pub bits_per_pixel: u8,
    pub red_mask_size: u8,
    pub red_mask_shift: u8,
    pub green_mask_size: u8,
    pub green_mask_shift: u8,
    pub blue_mask_size: u8,
    pub blue_mask_shift: u8,
}

impl PixelFormat {
    pub const RGB565: Self = Self::new(16, (5, 11), (6, 5), (5, 0));
    pub const RGB888: Self = Self::new(24, (8, 16), (8, 8), (8, 0));
    pub const XRGB8888: Self = Self::new(32, (8, 16), (8, 8), (8, 0));

    const fn new(bits_per_pixel: u8, red: (u8, u8), green: (u8, u8), blue: (u8, u8)) -> Self {
        Self {
            bits_per_pixel,
            red_mask_size: red.0,
            red_mask_shift: red.1,
            green_mask_size: green.0,
            green_mask_shift: green.1,
            blue_mask_size: blue.0,
            blue_mask_shift: blue.1,
        }
    }

    /// The common layout for a colour depth, if there is one.
    pub fn for_bpp(bits_per_pixel: u8) -> Option<Self> {
        match bits_per_pixel {
            16 => Some(Self::RGB565),
            24 => Some(Self::RGB888),
            32 => Some(Self::XRGB8888),
            _ => None,
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        (self.bits_per_pixel as usize).div_ceil(8)
    }

    /// Encode an RGB888 colour into a raw pixel value using the mask info.
    /// Channels wider than the field keep their most significant bits.
    pub fn build_pixel(&self, r: u8, g: u8, b: u8) -> u32 {
        fn field(value: u8, size: u8, shift: u8) -> u32 {
            let value = if size >= 8 {
                value as u32
            } else {
                (value as u32) >> (8 - size)
            };
            value << shift
        }
        field(r, self.red_mask_size, self.red_mask_shift)
            | field(g, self.green_mask_size, self.green_mask_shift)
            | field(b, self.blue_mask_size, self.blue_mask_shift)
    }
}

/// Output geometry and pixel encoding of the active video mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScreenMode {
    pub id: u16,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl ScreenMode {
    pub fn bits_per_pixel(&self) -> u8 {
        self.format.bits_per_pixel
    }
}

/// Bounding box of modified screen pixels that need to be flushed by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl DirtyRect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    /// Grow to the bounding box of both rects.
    pub fn include(&mut self, other: DirtyRect) {
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        self.x = self.x.min(other.x);
        self.y = self.y.min(other.y);
        self.w = right - self.x;
        self.h = bottom - self.y;
    }
}
