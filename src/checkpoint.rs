use tracing::info;

use crate::axis::Axis;
use crate::scroll::{near_end, ScrollBehavior, ScrollTarget};
use crate::sequence::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckpointState {
    #[default]
    NotFired,
    Fired,
}

/// One-shot auto-scroll target. Once fired it stays fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    value: Option<ItemId>,
    state: CheckpointState,
}

impl Checkpoint {
    pub fn new(value: Option<ItemId>) -> Self {
        Self {
            value,
            state: CheckpointState::NotFired,
        }
    }

    pub fn value(&self) -> Option<ItemId> {
        self.value
    }

    pub fn state(&self) -> CheckpointState {
        self.state
    }

    pub fn has_fired(&self) -> bool {
        self.state == CheckpointState::Fired
    }

    fn is_due(&self, newest: ItemId) -> bool {
        self.state == CheckpointState::NotFired && self.value == Some(newest)
    }
}

/// What a settle pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettleReport {
    /// Item and axis the container was auto-scrolled to.
    pub auto_scrolled: Option<(ItemId, Axis)>,
    /// The container was already at its end before any auto-scroll.
    pub at_end: bool,
    /// A load was started because of `at_end`.
    pub load_started: bool,
}

/// Post-render pass: one-shot checkpoint scrolls and the tight end-of-content check.
#[derive(Debug, Clone)]
pub struct CheckpointTrigger {
    lower: Checkpoint,
    upper: Checkpoint,
    proximity: u32,
}

impl CheckpointTrigger {
    pub fn new(lower: Option<ItemId>, upper: Option<ItemId>, proximity: u32) -> Self {
        Self {
            lower: Checkpoint::new(lower),
            upper: Checkpoint::new(upper),
            proximity,
        }
    }

    pub fn lower(&self) -> &Checkpoint {
        &self.lower
    }

    pub fn upper(&self) -> &Checkpoint {
        &self.upper
    }

    pub fn settle<T: ScrollTarget + ?Sized>(
        &mut self,
        target: &mut T,
        newest: ItemId,
        axis: Axis,
    ) -> SettleReport {
        // geometry is read before the auto-scroll starts moving the container
        let at_end = near_end(target, axis, self.proximity);

        let mut auto_scrolled = None;
        for checkpoint in [&mut self.lower, &mut self.upper] {
            if !checkpoint.is_due(newest) {
                continue;
            }
            // not laid out yet: stay armed for the next pass
            let Some(offset) = target.offset_of(newest, axis) else {
                continue;
            };
            target.scroll_to(axis, offset, ScrollBehavior::Smooth);
            checkpoint.state = CheckpointState::Fired;
            info!(item = newest, %axis, offset, "scrolled to checkpoint");
            auto_scrolled = Some((newest, axis));
        }

        SettleReport {
            auto_scrolled,
            at_end,
            load_started: false,
        }
    }
}
