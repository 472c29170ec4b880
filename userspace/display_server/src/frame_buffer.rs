use crate::error::{Result, WinMngError};
use crate::rect::Rectangle;
use core::convert::Infallible;
use display_api_types::graphics::PixelFormat;
use embedded_graphics::Pixel;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

/// Owned pixel memory: the screen output or one window's backing store.
///
/// Pixels are `bytes_per_pixel` little-endian bytes, rows are packed
/// (`stride = width * bytes_per_pixel`). All block operations clip against
/// the buffers involved, so callers never deal with raw offsets.
pub struct FrameBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Allocate a zeroed buffer. Fails instead of aborting when the size is unreasonable.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(format.bytes_per_pixel()))
            .ok_or(WinMngError::BufferAllocFailed)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| WinMngError::BufferAllocFailed)?;
        data.resize(len, 0);
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    pub fn stride(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(0, 0, self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Byte offset of an in-bounds pixel.
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride() + x as usize * self.bytes_per_pixel()
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        if !self.bounds().contains(x, y) {
            return None;
        }
        let bpp = self.bytes_per_pixel();
        let start = self.offset(x as u32, y as u32);
        let mut raw = [0u8; 4];
        raw[..bpp].copy_from_slice(&self.data[start..start + bpp]);
        Some(u32::from_le_bytes(raw))
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, raw: u32) {
        if !self.bounds().contains(x, y) {
            return;
        }
        let bpp = self.bytes_per_pixel();
        let start = self.offset(x as u32, y as u32);
        self.data[start..start + bpp].copy_from_slice(&raw.to_le_bytes()[..bpp]);
    }

    /// Fill `rect` (clipped to the buffer) with one raw pixel value.
    pub fn fill(&mut self, rect: Rectangle, raw: u32) {
        let area = rect.intersection(&self.bounds());
        if area.is_empty() {
            return;
        }
        let bpp = self.bytes_per_pixel();
        let pattern = raw.to_le_bytes();
        let row_len = area.width as usize * bpp;
        for row in 0..area.height {
            let start = self.offset(area.x as u32, area.y as u32 + row);
            self.data[start..start + row_len]
                .chunks_exact_mut(bpp)
                .for_each(|px| px.copy_from_slice(&pattern[..bpp]));
        }
    }

    /// Copy `src_rect` of `src` so its top-left lands on `(dst_x, dst_y)`.
    ///
    /// Clipped against both buffers; each side steps rows by its own stride.
    /// Buffers of different pixel formats are never mixed.
    pub fn blit(&mut self, src: &FrameBuffer, src_rect: Rectangle, dst_x: i32, dst_y: i32) {
        if src.format != self.format {
            log::warn!(
                "blit between {}bpp and {}bpp buffers skipped",
                src.format.bits_per_pixel,
                self.format.bits_per_pixel
            );
            return;
        }
        let clipped_src = src_rect.intersection(&src.bounds());
        if clipped_src.is_empty() {
            return;
        }
        let target = Rectangle::new(
            dst_x.saturating_add(clipped_src.x - src_rect.x),
            dst_y.saturating_add(clipped_src.y - src_rect.y),
            clipped_src.width,
            clipped_src.height,
        );
        let dst = target.intersection(&self.bounds());
        if dst.is_empty() {
            return;
        }
        let sx = (clipped_src.x + (dst.x - target.x)) as u32;
        let sy = (clipped_src.y + (dst.y - target.y)) as u32;
        let row_len = dst.width as usize * self.bytes_per_pixel();
        for row in 0..dst.height {
            let s = src.offset(sx, sy + row);
            let d = self.offset(dst.x as u32, dst.y as u32 + row);
            self.data[d..d + row_len].copy_from_slice(&src.data[s..s + row_len]);
        }
    }

    /// Copy `rect` (clipped to this buffer) out into a new buffer of its size.
    pub fn capture(&self, rect: Rectangle) -> Result<FrameBuffer> {
        let area = rect.intersection(&self.bounds());
        let mut out = FrameBuffer::new(area.width, area.height, self.format)?;
        out.blit(self, area, 0, 0);
        Ok(out)
    }

    /// Copy `rect` of `self` into `backup`, which is already sized for it.
    pub fn capture_into(&self, rect: Rectangle, backup: &mut FrameBuffer) {
        backup.blit(self, rect, 0, 0);
    }

    pub fn encode(&self, color: Rgb888) -> u32 {
        self.format.build_pixel(color.r(), color.g(), color.b())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounds();
        for Pixel(point, color) in pixels {
            if bounds.contains(point.x, point.y) {
                let raw = self.encode(color);
                self.set_pixel(point.x, point.y, raw);
            }
        }
        Ok(())
    }

    fn fill_solid(
        &mut self,
        area: &embedded_graphics::primitives::Rectangle,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let raw = self.encode(color);
        self.fill((*area).into(), raw);
        Ok(())
    }
}
