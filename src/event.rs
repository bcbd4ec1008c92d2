//! # Change events
//! Every mutation of the document finishes by dispatching a typed
//! [`AnimationEvent`] through the document's [`EventHub`]. Dispatch is
//! synchronous and in-process: registered observers run on the calling thread
//! before the mutating call returns, and the same event is queued for hosts
//! that prefer to poll once per tick instead.
//!
//! The hub handle is `Rc`-based and deliberately `!Send`; the document and
//! everything observing it live on one thread.

use crate::cel::CelId;
use crate::frame::FrameId;
use crate::geom::{Size, Vec2};
use crate::timed_frame::TimedFrameId;

/// A change that external collaborators (timeline UI, canvas, persistence)
/// may need to react to. Emitted after the document state is fully updated.
#[derive(Clone, PartialEq, Debug, strum::AsRefStr)]
pub enum AnimationEvent {
    // Cel pool
    CelRenamed {
        cel: CelId,
        from: String,
        to: String,
    },
    CelResized {
        cel: CelId,
        size: Size,
    },
    CelActivated(CelId),
    CelDeactivated(CelId),
    CelDestroyed {
        cel: CelId,
        name: String,
    },
    // Frame staging
    CelStaged {
        frame: FrameId,
        index: usize,
    },
    CelUnstaged {
        frame: FrameId,
        index: usize,
    },
    CelRestacked {
        frame: FrameId,
        from: usize,
        to: usize,
    },
    CelMoved {
        frame: FrameId,
        index: usize,
        pos: Vec2,
    },
    FrameActivated(FrameId),
    FrameDeactivated(FrameId),
    // Frame pool
    FrameRenamed {
        frame: FrameId,
        from: String,
        to: String,
    },
    FrameDestroyed {
        frame: FrameId,
        name: String,
    },
    // Exposure sheet
    FrameScheduled {
        seq: u32,
    },
    FrameUnscheduled {
        seq: u32,
    },
    FrameShifted {
        from_seq: u32,
        to_seq: u32,
    },
    /// One entry's starting tick moved. A renumbering pass emits one of
    /// these per entry that actually changed, then [`Self::SeqNumsChanged`].
    SeqNumChanged {
        entry: TimedFrameId,
        seq: u32,
    },
    SeqNumsChanged,
    SeqLengthChanged(u32),
    HoldChanged {
        seq: u32,
        hold: u32,
    },
    FpsChanged(u32),
    // Aggregate
    FrameSizeChanged(Size),
    AnimationRenamed {
        from: String,
        to: String,
    },
    ResourceDirChanged(std::path::PathBuf),
}

type Callback = Box<dyn FnMut(&AnimationEvent)>;

#[derive(Default)]
struct HubInner {
    observers: Vec<Callback>,
    queue: Vec<AnimationEvent>,
}

/// Shared handle to one document's event dispatch. Cloning is cheap; every
/// part of a document carries a handle to the same hub.
#[derive(Clone, Default)]
pub struct EventHub {
    inner: std::rc::Rc<std::cell::RefCell<HubInner>>,
}

impl EventHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Register an observer, called synchronously for every event from now
    /// on. Observers must not mutate the document they observe; react by
    /// flagging and act after the mutating call returns, or use [`Self::poll`].
    pub fn subscribe(&self, observer: impl FnMut(&AnimationEvent) + 'static) {
        self.inner.borrow_mut().observers.push(Box::new(observer));
    }
    /// Dispatch to observers, then queue for polling hosts.
    pub fn emit(&self, event: AnimationEvent) {
        log::trace!("event {}", event.as_ref());
        // The observer list is moved out for the duration of dispatch so a
        // callback touching the hub does not hit a double borrow.
        let mut observers = std::mem::take(&mut self.inner.borrow_mut().observers);
        for observer in &mut observers {
            observer(&event);
        }
        let mut inner = self.inner.borrow_mut();
        let added_during_dispatch = std::mem::replace(&mut inner.observers, observers);
        inner.observers.extend(added_during_dispatch);
        inner.queue.push(event);
    }
    /// Take every event queued since the last poll, oldest first.
    #[must_use]
    pub fn poll(&self) -> Vec<AnimationEvent> {
        std::mem::take(&mut self.inner.borrow_mut().queue)
    }
    /// Number of events waiting in the poll queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventHub")
            .field("observers", &inner.observers.len())
            .field("queued", &inner.queue.len())
            .finish()
    }
}
