#![allow(dead_code)]

use std::time::Duration;

use scrollbox::{
    Axis, AxisPolicy, Extent, ItemId, LoadEvent, LoadOutcome, ScrollBehavior, ScrollBox,
    ScrollBoxSettings, ScrollTarget, SimulatedSource, Threshold,
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Length of one laid out item along the layout axis.
pub const ITEM_LEN: u32 = 80;
pub const VISIBLE: u32 = 300;

/// A scroll container with fixed size items laid out along one axis.
///
/// Smooth scrolls land immediately and are recorded; user scrolls are not.
#[derive(Debug)]
pub struct ScriptedTarget {
    pub items: u32,
    pub layout_axis: Axis,
    pub position: [u32; 2],
    pub scrolls: Vec<(Axis, u32, ScrollBehavior)>,
}

fn idx(axis: Axis) -> usize {
    match axis {
        Axis::Vertical => 0,
        Axis::Horizontal => 1,
    }
}

impl ScriptedTarget {
    pub fn new() -> Self {
        Self {
            items: 1,
            layout_axis: Axis::Vertical,
            position: [0, 0],
            scrolls: Vec::new(),
        }
    }

    pub fn lay_out(&mut self, items: usize, axis: Axis) {
        self.items = items as u32;
        self.layout_axis = axis;
    }

    fn max_position(&self, axis: Axis) -> u32 {
        let extent = self.extent(axis);
        extent.total.saturating_sub(extent.visible)
    }

    /// Scroll to the very end, as a user would.
    pub fn scroll_to_end(&mut self, axis: Axis) {
        self.position[idx(axis)] = self.max_position(axis);
    }

    pub fn scroll_to_start(&mut self, axis: Axis) {
        self.position[idx(axis)] = 0;
    }

    pub fn checkpoint_scrolls(&self) -> Vec<(Axis, u32)> {
        self.scrolls
            .iter()
            .filter(|(_, _, behavior)| *behavior == ScrollBehavior::Smooth)
            .map(|(axis, offset, _)| (*axis, *offset))
            .collect()
    }
}

impl ScrollTarget for ScriptedTarget {
    fn extent(&self, axis: Axis) -> Extent {
        let total = if axis == self.layout_axis {
            self.items * ITEM_LEN
        } else {
            VISIBLE
        };
        Extent {
            total,
            visible: VISIBLE,
        }
    }

    fn position(&self, axis: Axis) -> u32 {
        self.position[idx(axis)]
    }

    fn scroll_to(&mut self, axis: Axis, offset: u32, behavior: ScrollBehavior) {
        self.scrolls.push((axis, offset, behavior));
        self.position[idx(axis)] = offset.min(self.max_position(axis));
    }

    fn offset_of(&self, item: ItemId, axis: Axis) -> Option<u32> {
        if item == 0 || item > self.items {
            return None;
        }
        if axis != self.layout_axis {
            return Some(0);
        }
        Some((item - 1) * ITEM_LEN)
    }
}

/// A scroll box, its container and the channel its loads report back on.
pub struct Harness {
    pub scroll_box: ScrollBox<SimulatedSource>,
    pub target: ScriptedTarget,
    pub tx: UnboundedSender<LoadEvent>,
    pub rx: UnboundedReceiver<LoadEvent>,
}

pub fn settings(finish: u32, lower: u32, upper: u32) -> ScrollBoxSettings {
    ScrollBoxSettings {
        finish: Threshold::Value(finish),
        axis: AxisPolicy::new(Threshold::Value(lower), Threshold::Value(upper)),
        ..Default::default()
    }
}

impl Harness {
    pub fn new(settings: ScrollBoxSettings) -> Self {
        Self::with_source(settings, SimulatedSource::new(Duration::from_millis(10)))
    }

    pub fn with_source(settings: ScrollBoxSettings, source: SimulatedSource) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            scroll_box: ScrollBox::new(settings, source),
            target: ScriptedTarget::new(),
            tx,
            rx,
        }
    }

    pub fn len(&self) -> usize {
        self.scroll_box.sequence().len()
    }

    /// Wait for the in-flight load, apply it, lay out again and run the settle pass.
    pub async fn finish_load(&mut self) -> LoadOutcome {
        let event = self.rx.recv().await.expect("load event");
        let outcome = self.scroll_box.complete_load(event);
        self.target
            .lay_out(self.len(), self.scroll_box.axis());
        self.scroll_box.after_render(&mut self.target, &self.tx);
        outcome
    }

    /// Scroll to the end of the active axis and deliver the scroll event.
    pub fn scroll_to_end(&mut self) -> bool {
        let axis = self.scroll_box.axis();
        self.target.scroll_to_end(axis);
        self.scroll_box.on_scroll(&self.target, &self.tx)
    }

    /// One user driven load: scroll to the end, then wait for the item.
    ///
    /// A short list is still being filled by the settle pass, so there may
    /// already be a load in flight.
    pub async fn step(&mut self) -> LoadOutcome {
        if !self.scroll_box.is_loading() {
            assert!(self.scroll_to_end(), "scrolling to the end should load");
        }
        self.finish_load().await
    }
}
