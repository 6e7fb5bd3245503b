//! The scroll box state machine.
//!
//! [`ScrollBox`] owns the sequence, the loader, the scroll listener and the
//! checkpoints, and is driven by three entry points: [`ScrollBox::on_scroll`]
//! for scroll events, [`ScrollBox::complete_load`] when a fetch comes back and
//! [`ScrollBox::after_render`] once a frame has been drawn.

use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::axis::{Axis, AxisPolicy, Threshold};
use crate::checkpoint::{CheckpointTrigger, SettleReport};
use crate::loader::{ItemSource, LoadController, LoadEvent, LoadOutcome};
use crate::scroll::{ScrollMonitor, ScrollTarget, Subscription};
use crate::sequence::{ItemId, Sequence};

/// Resolved thresholds, read once when the scroll box is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollBoxSettings {
    pub finish: Threshold,
    pub axis: AxisPolicy,
    /// Distance from the end that makes a scroll event load more.
    pub load_proximity: u32,
    /// Distance from the end that makes a settled frame load more.
    pub settle_proximity: u32,
}

impl Default for ScrollBoxSettings {
    fn default() -> Self {
        Self {
            finish: Threshold::Value(50),
            axis: AxisPolicy::default(),
            load_proximity: 100,
            settle_proximity: 5,
        }
    }
}

/// Everything a view needs to draw the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollBoxView<'a> {
    pub sequence: &'a [ItemId],
    pub loading: bool,
    pub finished: bool,
    pub axis: Axis,
    pub newest: ItemId,
}

pub struct ScrollBox<S> {
    sequence: Sequence,
    policy: AxisPolicy,
    loader: LoadController<S>,
    monitor: ScrollMonitor,
    checkpoints: CheckpointTrigger,
}

impl<S: ItemSource> ScrollBox<S> {
    pub fn new(settings: ScrollBoxSettings, source: S) -> Self {
        let ScrollBoxSettings {
            finish,
            axis,
            load_proximity,
            settle_proximity,
        } = settings;
        let checkpoints = CheckpointTrigger::new(
            axis.lower_checkpoint(),
            axis.upper_checkpoint(),
            settle_proximity,
        );
        let mut scroll_box = Self {
            sequence: Sequence::new(),
            policy: axis,
            loader: LoadController::new(source, finish),
            monitor: ScrollMonitor::new(load_proximity),
            checkpoints,
        };
        scroll_box.on_axis_or_loading_changed();
        scroll_box
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn axis(&self) -> Axis {
        self.policy.axis_for(self.sequence.last())
    }

    pub fn is_horizontal(&self) -> bool {
        self.axis().is_horizontal()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    pub fn is_finished(&self) -> bool {
        self.loader.is_finished()
    }

    pub fn loader(&self) -> &LoadController<S> {
        &self.loader
    }

    pub fn checkpoints(&self) -> &CheckpointTrigger {
        &self.checkpoints
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        self.monitor.subscription()
    }

    pub fn view(&self) -> ScrollBoxView<'_> {
        ScrollBoxView {
            sequence: self.sequence.as_slice(),
            loading: self.is_loading(),
            finished: self.is_finished(),
            axis: self.axis(),
            newest: self.sequence.last(),
        }
    }

    /// Reattach the scroll listener with the current axis and loading state.
    pub fn on_axis_or_loading_changed(&mut self) {
        let axis = self.axis();
        let loading = self.is_loading();
        self.monitor.resubscribe(axis, loading);
    }

    /// Start a load if none is in flight and the list is not finished.
    pub fn request_load<E>(&mut self, events: &UnboundedSender<E>) -> bool
    where
        E: From<LoadEvent> + Send + 'static,
    {
        let started = self.loader.request_load(events);
        if started {
            self.on_axis_or_loading_changed();
        }
        started
    }

    /// Handle a scroll event from the container. Returns whether a load was started.
    pub fn on_scroll<T, E>(&mut self, target: &T, events: &UnboundedSender<E>) -> bool
    where
        T: ScrollTarget + ?Sized,
        E: From<LoadEvent> + Send + 'static,
    {
        if self.monitor.wants_load(target, self.is_finished()) {
            self.request_load(events)
        } else {
            false
        }
    }

    pub fn complete_load(&mut self, event: LoadEvent) -> LoadOutcome {
        let before = self.axis();
        let outcome = self.loader.complete(&mut self.sequence, event);
        let after = self.axis();
        if before != after {
            info!(newest = self.sequence.last(), from = %before, to = %after, "axis changed");
        }
        self.on_axis_or_loading_changed();
        outcome
    }

    /// Run the checkpoint scrolls and the end-of-content check for a settled frame.
    ///
    /// Skipped while a load is in flight; the next completed load settles again.
    pub fn after_render<T, E>(&mut self, target: &mut T, events: &UnboundedSender<E>) -> SettleReport
    where
        T: ScrollTarget + ?Sized,
        E: From<LoadEvent> + Send + 'static,
    {
        if self.is_loading() {
            return SettleReport::default();
        }
        let axis = self.axis();
        let mut report = self.checkpoints.settle(target, self.sequence.last(), axis);
        if report.at_end {
            report.load_started = self.request_load(events);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SimulatedSource;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_new_scroll_box() {
        let sb = ScrollBox::new(ScrollBoxSettings::default(), SimulatedSource::default());
        let view = sb.view();
        assert_eq!(view.sequence, &[1]);
        assert!(!view.loading);
        assert!(!view.finished);
        assert_eq!(view.axis, Axis::Vertical);
        assert_eq!(view.newest, 1);

        let sub = sb.subscription().expect("listener attached on construction");
        assert_eq!(sub.axis, Axis::Vertical);
        assert!(!sub.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_load_resubscribes() {
        let (tx, mut rx) = unbounded_channel::<LoadEvent>();
        let mut sb = ScrollBox::new(ScrollBoxSettings::default(), SimulatedSource::default());
        let first = *sb.subscription().unwrap();

        assert!(sb.request_load(&tx));
        let loading = *sb.subscription().unwrap();
        assert!(loading.loading);
        assert_ne!(loading.id, first.id);

        let event = rx.recv().await.unwrap();
        assert_eq!(sb.complete_load(event), LoadOutcome::Appended(2));
        let settled = *sb.subscription().unwrap();
        assert!(!settled.loading);
        assert_ne!(settled.id, loading.id);
    }

    #[test]
    fn test_checkpoints_follow_axis_policy() {
        let settings = ScrollBoxSettings {
            axis: AxisPolicy::new(Threshold::Value(5), Threshold::Value(8)),
            ..Default::default()
        };
        let sb = ScrollBox::new(settings, SimulatedSource::default());
        assert_eq!(sb.checkpoints().lower().value(), Some(4));
        assert_eq!(sb.checkpoints().upper().value(), Some(9));
    }
}
