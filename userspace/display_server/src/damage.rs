//! Occlusion splitting: turn one dirty rectangle into the disjoint regions
//! that have to be redrawn, each tagged with the window visible there.

use crate::rect::Rectangle;
use crate::window::Window;
use display_api_types::window::WindowId;

/// Where a damage region takes its pixels from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionOwner {
    Window(WindowId),
    Background,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WinRect {
    pub rect: Rectangle,
    pub owner: RegionOwner,
}

/// Split `rect` against every ready window at or above `min_z`, in table order.
///
/// `owner` is the window the update comes from (or `None` for exposed screen
/// area, with `min_z = -1`). Windows with equal z are ordered by table index,
/// the later slot being on top.
pub fn repaint_regions(
    windows: &[Option<Window>],
    rect: Rectangle,
    owner: Option<&Window>,
    min_z: i32,
) -> Vec<WinRect> {
    let mut out = Vec::with_capacity(windows.len());
    if !rect.is_empty() {
        collect(windows, 0, rect, owner.map(|w| w.id), min_z, &mut out);
    }
    out
}

fn collect(
    windows: &[Option<Window>],
    start: usize,
    rect: Rectangle,
    owner: Option<WindowId>,
    min_z: i32,
    out: &mut Vec<WinRect>,
) {
    for (index, w) in windows
        .iter()
        .enumerate()
        .skip(start)
        .filter_map(|(i, slot)| slot.as_ref().map(|w| (i, w)))
    {
        if Some(w.id) == owner || !w.ready || w.z < min_z {
            continue;
        }
        let covered = w.rect.intersection(&rect);
        if covered.is_empty() {
            continue;
        }
        // Whatever is above `w` is resolved inside `covered`; `w` is the fallback.
        collect(windows, index + 1, covered, Some(w.id), w.z, out);
        for piece in rect.subtraction(&w.rect) {
            collect(windows, index + 1, piece, owner, min_z, out);
        }
        return;
    }
    out.push(WinRect {
        rect,
        owner: owner.map_or(RegionOwner::Background, RegionOwner::Window),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::WINDOW_COUNT;
    use crate::frame_buffer::FrameBuffer;
    use display_api_types::graphics::PixelFormat;
    use display_api_types::window::{WindowStyle, WindowTitle};

    fn window(id: WindowId, rect: Rectangle, z: i32) -> Window {
        Window {
            id,
            rect,
            z,
            owner: 1,
            style: WindowStyle::Default,
            title_bar_height: 0,
            title: WindowTitle::new(),
            ready: true,
            buffer: FrameBuffer::new(rect.width, rect.height, PixelFormat::RGB888).unwrap(),
            channel: None,
        }
    }

    fn table(windows: Vec<Window>) -> Vec<Option<Window>> {
        let mut slots: Vec<Option<Window>> = (0..WINDOW_COUNT).map(|_| None).collect();
        for w in windows {
            let id = w.id as usize;
            slots[id] = Some(w);
        }
        slots
    }

    /// The window a viewer sees at (x, y): highest z, later slot on ties.
    fn visible_at(windows: &[Option<Window>], x: i32, y: i32) -> RegionOwner {
        let mut best: Option<&Window> = None;
        for w in windows.iter().flatten() {
            if w.ready && w.contains(x, y) && best.is_none_or(|b| w.z >= b.z) {
                best = Some(w);
            }
        }
        best.map_or(RegionOwner::Background, |w| RegionOwner::Window(w.id))
    }

    fn assert_exact_cover(regions: &[WinRect], dirty: Rectangle, windows: &[Option<Window>]) {
        let area: u64 = regions.iter().map(|r| r.rect.area()).sum();
        assert_eq!(area, dirty.area(), "regions {regions:?}");
        for y in dirty.y..dirty.end_y() {
            for x in dirty.x..dirty.end_x() {
                let hits: Vec<&WinRect> = regions.iter().filter(|r| r.rect.contains(x, y)).collect();
                assert_eq!(hits.len(), 1, "({x},{y}) covered {} times", hits.len());
                assert_eq!(hits[0].owner, visible_at(windows, x, y), "owner at ({x},{y})");
            }
        }
    }

    #[test]
    fn two_overlapping_windows() {
        let windows = table(vec![
            window(0, Rectangle::new(0, 0, 100, 100), 1),
            window(1, Rectangle::new(50, 50, 100, 100), 2),
        ]);
        let dirty = Rectangle::new(0, 0, 100, 100);
        let regions = repaint_regions(&windows, dirty, None, -1);

        let for_b: Vec<_> = regions
            .iter()
            .filter(|r| r.owner == RegionOwner::Window(1))
            .collect();
        assert_eq!(for_b.len(), 1);
        assert_eq!(for_b[0].rect, Rectangle::new(50, 50, 50, 50));

        let for_a: Vec<_> = regions
            .iter()
            .filter(|r| r.owner == RegionOwner::Window(0))
            .map(|r| r.rect)
            .collect();
        assert!(for_a.len() <= 2);
        assert_eq!(
            for_a,
            vec![Rectangle::new(0, 0, 100, 50), Rectangle::new(0, 50, 50, 50)]
        );
        assert_exact_cover(&regions, dirty, &windows);
    }

    #[test]
    fn nothing_overlapping_is_background() {
        let windows = table(vec![window(3, Rectangle::new(200, 200, 10, 10), 1)]);
        let dirty = Rectangle::new(0, 0, 20, 20);
        assert_eq!(
            repaint_regions(&windows, dirty, None, -1),
            vec![WinRect {
                rect: dirty,
                owner: RegionOwner::Background
            }]
        );
    }

    #[test]
    fn unready_windows_are_transparent() {
        let mut hidden = window(1, Rectangle::new(0, 0, 50, 50), 2);
        hidden.ready = false;
        let windows = table(vec![window(0, Rectangle::new(0, 0, 50, 50), 1), hidden]);
        let regions = repaint_regions(&windows, Rectangle::new(0, 0, 50, 50), None, -1);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].owner, RegionOwner::Window(0));
    }

    #[test]
    fn update_from_owner_skips_windows_below() {
        let windows = table(vec![
            window(0, Rectangle::new(0, 0, 40, 40), 2),
            window(1, Rectangle::new(10, 10, 40, 40), 1),
            window(2, Rectangle::new(30, 0, 40, 40), 3),
        ]);
        let owner = windows[0].as_ref().unwrap();
        let dirty = Rectangle::new(0, 0, 40, 40);
        let regions = repaint_regions(&windows, dirty, Some(owner), owner.z);
        for r in &regions {
            assert_ne!(r.owner, RegionOwner::Window(1));
            assert_ne!(r.owner, RegionOwner::Background);
        }
        let top: u64 = regions
            .iter()
            .filter(|r| r.owner == RegionOwner::Window(2))
            .map(|r| r.rect.area())
            .sum();
        assert_eq!(top, 10 * 40);
        assert_exact_cover(&regions, dirty, &windows);
    }

    #[test]
    fn equal_z_resolves_to_later_slot() {
        let windows = table(vec![
            window(0, Rectangle::new(0, 0, 10, 10), 1),
            window(1, Rectangle::new(0, 0, 10, 10), 1),
        ]);
        let regions = repaint_regions(&windows, Rectangle::new(0, 0, 10, 10), None, -1);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].owner, RegionOwner::Window(1));
    }

    #[test]
    fn random_stacks_are_covered_exactly_once() {
        // xorshift, so failures are reproducible
        let mut seed = 0x2545_F491_4F6C_DD1Du64;
        let mut next = move |bound: u32| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed % bound as u64) as u32
        };
        for _ in 0..40 {
            let count = 1 + next(8);
            let mut windows = Vec::new();
            for id in 0..count {
                let rect = Rectangle::new(
                    next(50) as i32,
                    next(50) as i32,
                    1 + next(40),
                    1 + next(40),
                );
                let mut w = window(id * 3 % WINDOW_COUNT as u32, rect, 1 + next(6) as i32);
                w.ready = next(5) != 0;
                windows.push(w);
            }
            let windows = table(windows);
            let dirty = Rectangle::new(
                next(40) as i32,
                next(40) as i32,
                1 + next(50),
                1 + next(50),
            );
            let regions = repaint_regions(&windows, dirty, None, -1);
            assert_exact_cover(&regions, dirty, &windows);
        }
    }

    #[test]
    fn empty_dirty_rect_yields_nothing() {
        let windows = table(vec![window(0, Rectangle::new(0, 0, 10, 10), 1)]);
        assert!(repaint_regions(&windows, Rectangle::new(5, 5, 0, 3), None, -1).is_empty());
    }
}
