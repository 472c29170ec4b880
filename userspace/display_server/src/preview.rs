use crate::compositor::Damage;
use crate::error::Result;
use crate::frame_buffer::FrameBuffer;
use crate::rect::Rectangle;

struct Strip {
    /// On-screen area, already clipped.
    area: Rectangle,
    backup: FrameBuffer,
}

/// The hollow outline shown while a window is dragged or resized.
///
/// Each of the four border strips keeps the pixels it covers, so removing
/// the outline puts the screen back exactly as it was.
#[derive(Default)]
pub struct PreviewOverlay {
    rect: Rectangle,
    thickness: u32,
    color: u32,
    strips: [Option<Strip>; 4],
}

/// Border strips of `rect` in the order top, right, bottom, left.
///
/// Top and bottom span the full width, left and right fill the band between
/// them; thickness is cut down so strips never overlap on small rectangles.
pub fn border_strips(rect: Rectangle, thickness: u32) -> [Rectangle; 4] {
    let top_h = thickness.min(rect.height);
    let bottom_h = thickness.min(rect.height - top_h);
    let band_h = rect.height - top_h - bottom_h;
    let left_w = thickness.min(rect.width);
    let right_w = thickness.min(rect.width - left_w);
    let band_y = rect.y.saturating_add_unsigned(top_h);
    [
        Rectangle::new(rect.x, rect.y, rect.width, top_h),
        Rectangle::new(
            rect.end_x().saturating_sub_unsigned(right_w),
            band_y,
            right_w,
            band_h,
        ),
        Rectangle::new(
            rect.x,
            rect.end_y().saturating_sub_unsigned(bottom_h),
            rect.width,
            bottom_h,
        ),
        Rectangle::new(rect.x, band_y, left_w, band_h),
    ]
}

impl PreviewOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.thickness > 0
    }

    pub fn rect(&self) -> Rectangle {
        self.rect
    }

    /// Replace the outline. Thickness 0 only removes the current one.
    pub fn set(
        &mut self,
        output: &mut FrameBuffer,
        rect: Rectangle,
        thickness: u32,
        color: u32,
        damage: &mut Damage,
    ) -> Result<()> {
        self.restore(output, damage);
        if thickness == 0 {
            self.reset();
            return Ok(());
        }

        // All backing stores are taken before any strip is drawn.
        let screen = output.bounds();
        let mut previous = core::mem::take(&mut self.strips);
        let mut strips: [Option<Strip>; 4] = Default::default();
        for ((slot, old), area) in strips
            .iter_mut()
            .zip(previous.iter_mut())
            .zip(border_strips(rect, thickness))
        {
            let area = area.intersection(&screen);
            if area.is_empty() {
                continue;
            }
            let backup = match old.take() {
                Some(mut strip)
                    if strip.backup.width() == area.width && strip.backup.height() == area.height =>
                {
                    output.capture_into(area, &mut strip.backup);
                    strip.backup
                }
                _ => match output.capture(area) {
                    Ok(backup) => backup,
                    Err(err) => {
                        self.reset();
                        return Err(err);
                    }
                },
            };
            *slot = Some(Strip { area, backup });
        }
        for strip in strips.iter().flatten() {
            output.fill(strip.area, color);
            damage.add(strip.area);
        }
        self.rect = rect;
        self.thickness = thickness;
        self.color = color;
        self.strips = strips;
        Ok(())
    }

    /// `changed` was just repainted underneath: adopt the new pixels into the
    /// backing stores and draw the outline over them again.
    pub fn update_rect(&mut self, output: &mut FrameBuffer, changed: Rectangle, damage: &mut Damage) {
        if !self.is_active() {
            return;
        }
        for strip in self.strips.iter_mut().flatten() {
            let overlap = strip.area.intersection(&changed);
            if overlap.is_empty() {
                continue;
            }
            strip.backup.blit(
                output,
                overlap,
                overlap.x - strip.area.x,
                overlap.y - strip.area.y,
            );
            output.fill(overlap, self.color);
            damage.add(overlap);
        }
    }

    /// Drop the outline without touching the screen; used when the output it
    /// was drawn on has been replaced.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn restore(&mut self, output: &mut FrameBuffer, damage: &mut Damage) {
        if !self.is_active() {
            return;
        }
        for strip in self.strips.iter().flatten() {
            output.blit(&strip.backup, strip.backup.bounds(), strip.area.x, strip.area.y);
            damage.add(strip.area);
        }
    }
}
