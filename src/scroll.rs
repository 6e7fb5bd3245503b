use tracing::debug;

use crate::axis::Axis;
use crate::sequence::ItemId;

/// Scrolled content length and visible window length along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub total: u32,
    pub visible: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

/// The scroll container the list lives in.
///
/// All lengths are in the container's own units.
pub trait ScrollTarget {
    fn extent(&self, axis: Axis) -> Extent;
    fn position(&self, axis: Axis) -> u32;
    fn scroll_to(&mut self, axis: Axis, offset: u32, behavior: ScrollBehavior);
    /// Offset of `item` from the start of the content, if it has been laid out.
    fn offset_of(&self, item: ItemId, axis: Axis) -> Option<u32>;
}

/// Whether the visible window ends within `proximity` units of the content end.
pub fn near_end<T: ScrollTarget + ?Sized>(target: &T, axis: Axis, proximity: u32) -> bool {
    let extent = target.extent(axis);
    let reach = target.position(axis).saturating_add(extent.visible);
    reach >= extent.total.saturating_sub(proximity)
}

/// Scroll listener state captured when it was attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub id: u64,
    pub axis: Axis,
    pub loading: bool,
}

/// Watches scroll events and decides whether they should trigger a load.
///
/// At most one subscription is attached. It is replaced whenever the axis or
/// the loading state changes, and events that arrive while detached are ignored.
#[derive(Debug)]
pub struct ScrollMonitor {
    proximity: u32,
    subscription: Option<Subscription>,
    next_id: u64,
}

impl ScrollMonitor {
    pub fn new(proximity: u32) -> Self {
        Self {
            proximity,
            subscription: None,
            next_id: 1,
        }
    }

    pub fn proximity(&self) -> u32 {
        self.proximity
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }

    /// Detach the current listener, if any, and attach one for `axis`/`loading`.
    pub fn resubscribe(&mut self, axis: Axis, loading: bool) -> Subscription {
        if let Some(old) = self.detach() {
            debug!(id = old.id, "scroll listener detached");
        }
        let subscription = Subscription {
            id: self.next_id,
            axis,
            loading,
        };
        self.next_id += 1;
        self.subscription = Some(subscription);
        debug!(id = subscription.id, %axis, loading, "scroll listener attached");
        subscription
    }

    pub fn detach(&mut self) -> Option<Subscription> {
        self.subscription.take()
    }

    /// Whether a scroll event on `target` should request a load.
    pub fn wants_load<T: ScrollTarget + ?Sized>(&self, target: &T, finished: bool) -> bool {
        let Some(subscription) = self.subscription else {
            return false;
        };
        if subscription.loading {
            return false;
        }
        near_end(target, subscription.axis, self.proximity) && !finished
    }
}
