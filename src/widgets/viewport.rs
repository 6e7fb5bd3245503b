//! Scroll geometry of the terminal list.
//!
//! Lengths are kept in abstract units so the load thresholds keep the same
//! meaning regardless of cell size: one row is [`UNITS_PER_ROW`] units and
//! one column is [`UNITS_PER_COL`] units.

use ratatui::layout::Rect;

use crate::axis::Axis;
use crate::scroll::{Extent, ScrollBehavior, ScrollTarget};
use crate::sequence::ItemId;

pub const UNITS_PER_ROW: u32 = 16;
pub const UNITS_PER_COL: u32 = 8;
/// Distance of a single line scroll: two rows or four columns.
pub const SCROLL_STEP: i64 = 32;

/// Size of one list slot and the gap after it, along the layout axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGeometry {
    pub size: u32,
    pub gap: u32,
}

impl SlotGeometry {
    pub fn pitch(&self) -> u32 {
        self.size + self.gap
    }
}

pub const VERTICAL_SLOT: SlotGeometry = SlotGeometry { size: 64, gap: 16 };
pub const HORIZONTAL_SLOT: SlotGeometry = SlotGeometry { size: 128, gap: 16 };

fn slot_geometry(axis: Axis) -> SlotGeometry {
    match axis {
        Axis::Vertical => VERTICAL_SLOT,
        Axis::Horizontal => HORIZONTAL_SLOT,
    }
}

fn units_per_cell(axis: Axis) -> u32 {
    match axis {
        Axis::Vertical => UNITS_PER_ROW,
        Axis::Horizontal => UNITS_PER_COL,
    }
}

fn idx(axis: Axis) -> usize {
    match axis {
        Axis::Vertical => 0,
        Axis::Horizontal => 1,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Animation {
    axis: Axis,
    from: u32,
    to: u32,
    frame: u32,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    layout_axis: Axis,
    items: u32,
    trailing_slots: u32,
    visible: [u32; 2],
    position: [u32; 2],
    animation: Option<Animation>,
    animation_frames: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(6)
    }
}

impl Viewport {
    pub fn new(animation_frames: u32) -> Self {
        Self {
            layout_axis: Axis::Vertical,
            items: 1,
            trailing_slots: 0,
            visible: [0, 0],
            position: [0, 0],
            animation: None,
            animation_frames: animation_frames.max(1),
        }
    }

    /// Set the visible window from the list area size in cells.
    pub fn set_visible_cells(&mut self, width: u16, height: u16) {
        self.visible[idx(Axis::Vertical)] = height as u32 * UNITS_PER_ROW;
        self.visible[idx(Axis::Horizontal)] = width as u32 * UNITS_PER_COL;
        self.clamp();
    }

    /// Lay out `items` slots plus `trailing_slots` (placeholder, finished marker) along `axis`.
    pub fn set_content(&mut self, axis: Axis, items: u32, trailing_slots: u32) {
        self.layout_axis = axis;
        self.items = items;
        self.trailing_slots = trailing_slots;
        self.clamp();
    }

    pub fn slot_count(&self) -> u32 {
        self.items + self.trailing_slots
    }

    pub fn content_len(&self, axis: Axis) -> u32 {
        if axis != self.layout_axis {
            // cross axis never overflows
            return self.visible[idx(axis)];
        }
        let slots = self.slot_count();
        if slots == 0 {
            return 0;
        }
        let geometry = slot_geometry(axis);
        slots * geometry.pitch() - geometry.gap
    }

    pub fn max_position(&self, axis: Axis) -> u32 {
        self.content_len(axis)
            .saturating_sub(self.visible[idx(axis)])
    }

    fn clamp(&mut self) {
        for axis in [Axis::Vertical, Axis::Horizontal] {
            let max = self.max_position(axis);
            let pos = &mut self.position[idx(axis)];
            *pos = (*pos).min(max);
        }
        if let Some(axis) = self.animation.map(|a| a.axis) {
            let max = self.max_position(axis);
            if let Some(animation) = self.animation.as_mut() {
                animation.to = animation.to.min(max);
            }
        }
    }

    fn set_position(&mut self, axis: Axis, offset: u32) -> bool {
        let clamped = offset.min(self.max_position(axis));
        let pos = &mut self.position[idx(axis)];
        let changed = *pos != clamped;
        *pos = clamped;
        changed
    }

    /// Scroll by a signed number of units, cancelling any animation. Returns whether it moved.
    pub fn scroll_by(&mut self, axis: Axis, delta: i64) -> bool {
        self.animation = None;
        let target = (self.position[idx(axis)] as i64 + delta).max(0);
        self.set_position(axis, target.min(u32::MAX as i64) as u32)
    }

    /// The visible window along `axis`, less one cell.
    pub fn page(&self, axis: Axis) -> i64 {
        (self.visible[idx(axis)].saturating_sub(units_per_cell(axis))).max(units_per_cell(axis))
            as i64
    }

    pub fn scroll_to_start(&mut self, axis: Axis) -> bool {
        self.animation = None;
        self.set_position(axis, 0)
    }

    pub fn scroll_to_end(&mut self, axis: Axis) -> bool {
        self.animation = None;
        self.set_position(axis, u32::MAX)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Advance a smooth scroll by one frame. Returns whether the position moved.
    pub fn tick(&mut self) -> bool {
        let Some(mut animation) = self.animation else {
            return false;
        };
        animation.frame += 1;
        let frames = self.animation_frames;
        let offset = if animation.frame >= frames {
            self.animation = None;
            animation.to
        } else {
            self.animation = Some(animation);
            let from = animation.from as i64;
            let span = animation.to as i64 - from;
            (from + span * animation.frame as i64 / frames as i64) as u32
        };
        self.set_position(animation.axis, offset)
    }

    /// Offset of slot `index` from the content start along the layout axis.
    pub fn slot_offset(&self, index: u32) -> u32 {
        index * slot_geometry(self.layout_axis).pitch()
    }

    /// Cell rectangles of the slots that intersect `area`, clipped to it.
    pub fn visible_slots(&self, area: Rect) -> Vec<(u32, Rect)> {
        let axis = self.layout_axis;
        let geometry = slot_geometry(axis);
        let unit = units_per_cell(axis) as i64;
        let position = self.position[idx(axis)] as i64;
        let span = match axis {
            Axis::Vertical => area.height as i64,
            Axis::Horizontal => area.width as i64,
        };

        let mut slots = Vec::new();
        for index in 0..self.slot_count() {
            let start = self.slot_offset(index) as i64 - position;
            let end = start + geometry.size as i64;
            let first = start.div_euclid(unit).max(0);
            let last = (end + unit - 1).div_euclid(unit).min(span);
            if last <= 0 {
                continue;
            }
            if first >= span {
                break;
            }
            if last <= first {
                continue;
            }
            let rect = match axis {
                Axis::Vertical => Rect::new(
                    area.x,
                    area.y + first as u16,
                    area.width,
                    (last - first) as u16,
                ),
                Axis::Horizontal => Rect::new(
                    area.x + first as u16,
                    area.y,
                    (last - first) as u16,
                    area.height,
                ),
            };
            slots.push((index, rect));
        }
        slots
    }
}

impl ScrollTarget for Viewport {
    fn extent(&self, axis: Axis) -> Extent {
        Extent {
            total: self.content_len(axis),
            visible: self.visible[idx(axis)],
        }
    }

    fn position(&self, axis: Axis) -> u32 {
        self.position[idx(axis)]
    }

    fn scroll_to(&mut self, axis: Axis, offset: u32, behavior: ScrollBehavior) {
        match behavior {
            ScrollBehavior::Instant => {
                self.animation = None;
                self.set_position(axis, offset);
            }
            ScrollBehavior::Smooth => {
                self.animation = Some(Animation {
                    axis,
                    from: self.position[idx(axis)],
                    to: offset.min(self.max_position(axis)),
                    frame: 0,
                });
            }
        }
    }

    fn offset_of(&self, item: ItemId, axis: Axis) -> Option<u32> {
        if item == 0 || item > self.items {
            return None;
        }
        if axis != self.layout_axis {
            return Some(0);
        }
        Some(self.slot_offset(item - 1))
    }
}
