//! # Timed frames
//! A timed frame schedules one frame on the timeline: a 1-based starting
//! tick (`seq_num`) and a duration in ticks (`hold`). The entry owns the
//! closed tick range `[seq_num, seq_num + hold - 1]`. Sequence numbers are
//! assigned and kept contiguous by the owning [`crate::xsheet::XSheet`];
//! only the hold is free for callers to change, through the sheet.
//!
//! The frame itself is held weakly by id. Within the frame's back-reference
//! set the entry registers on construction and unregisters on release, so a
//! frame knows when its last timeline placement disappears.

use crate::frame::{Frame, FrameId};
use crate::id::PegId;
use crate::library::frames::FrameLibrary;

pub type TimedFrameId = PegId<TimedFrame>;

#[derive(Debug)]
pub struct TimedFrame {
    id: TimedFrameId,
    frame: Option<FrameId>,
    seq_num: u32,
    hold: u32,
}

impl TimedFrame {
    /// Schedule `frame` for `hold` ticks, starting unplaced at tick 1. A hold
    /// of 0 is clamped to 1 with a warning; a stale frame id yields an entry
    /// placing nothing.
    #[must_use]
    pub fn new(frames: &mut FrameLibrary, frame: FrameId, hold: u32) -> Self {
        let id = TimedFrameId::next();
        let frame = match frames.get_mut(frame) {
            Some(frame) => {
                frame.register_timed(id);
                Some(frame.id())
            }
            None => {
                log::warn!("timed entry for unknown {frame}, placing nothing");
                None
            }
        };
        if hold == 0 {
            log::warn!("hold must be at least 1, clamping");
        }
        Self {
            id,
            frame,
            seq_num: 1,
            hold: hold.max(1),
        }
    }
    /// Drop this entry, removing it from its frame's back-reference set.
    /// Call when an unscheduled entry will not be rescheduled.
    pub fn release(self, frames: &mut FrameLibrary) {
        if let Some(frame) = self.frame {
            if let Some(frame) = frames.get_mut(frame) {
                frame.unregister_timed(self.id);
            }
        }
    }

    #[must_use]
    pub fn id(&self) -> TimedFrameId {
        self.id
    }
    #[must_use]
    pub fn frame_id(&self) -> Option<FrameId> {
        self.frame
    }
    /// Resolve the scheduled frame. `None` when the frame has since been
    /// destroyed.
    #[must_use]
    pub fn frame<'lib>(&self, frames: &'lib FrameLibrary) -> Option<&'lib Frame> {
        frames.get(self.frame?)
    }
    #[must_use]
    pub fn has_frame(&self, frames: &FrameLibrary) -> bool {
        self.frame(frames).is_some()
    }
    #[must_use]
    pub fn seq_num(&self) -> u32 {
        self.seq_num
    }
    #[must_use]
    pub fn hold(&self) -> u32 {
        self.hold
    }
    /// The last tick this entry owns.
    #[must_use]
    pub fn last_seq(&self) -> u32 {
        self.seq_num + self.hold - 1
    }
    /// Whether tick `n` falls inside this entry's range.
    #[must_use]
    pub fn has_seq_num(&self, n: u32) -> bool {
        n >= self.seq_num && n <= self.last_seq()
    }
    /// Every tick this entry owns, in order.
    #[must_use]
    pub fn seq_nums(&self) -> std::ops::RangeInclusive<u32> {
        self.seq_num..=self.last_seq()
    }

    /// Returns whether the value changed; zero is rejected with a warning.
    pub(crate) fn set_seq_num(&mut self, seq_num: u32) -> bool {
        if seq_num == 0 {
            log::warn!("sequence numbers start at 1, ignoring 0");
            return false;
        }
        if seq_num == self.seq_num {
            return false;
        }
        self.seq_num = seq_num;
        true
    }
    /// Returns whether the value changed; zero is rejected with a warning.
    /// The sheet renumbers everything after this entry when it changes.
    pub(crate) fn set_hold(&mut self, hold: u32) -> bool {
        if hold == 0 {
            log::warn!("hold must be at least 1, ignoring 0");
            return false;
        }
        if hold == self.hold {
            return false;
        }
        self.hold = hold;
        true
    }
    /// The scheduled frame is going away; place nothing from now on.
    pub(crate) fn clear_frame(&mut self) {
        self.frame = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::EventHub;

    fn fixture() -> (FrameLibrary, FrameId) {
        let mut frames = FrameLibrary::new(EventHub::new());
        let id = frames.create("key");
        (frames, id)
    }

    #[test]
    fn owns_its_tick_range() {
        let (mut frames, frame) = fixture();
        let mut entry = TimedFrame::new(&mut frames, frame, 3);
        assert!(entry.set_seq_num(4));
        assert_eq!(entry.last_seq(), 6);
        assert_eq!(entry.seq_nums().collect::<Vec<_>>(), vec![4, 5, 6]);
        assert!(entry.has_seq_num(4));
        assert!(entry.has_seq_num(6));
        assert!(!entry.has_seq_num(3));
        assert!(!entry.has_seq_num(7));
        entry.release(&mut frames);
    }
    #[test]
    fn zero_values_rejected() {
        let (mut frames, frame) = fixture();
        let mut entry = TimedFrame::new(&mut frames, frame, 0);
        assert_eq!(entry.hold(), 1, "zero hold clamps at construction");
        assert!(!entry.set_hold(0));
        assert!(!entry.set_seq_num(0));
        assert_eq!(entry.seq_num(), 1);
        assert!(entry.set_hold(5));
        assert!(!entry.set_hold(5), "same value is a no-op");
        entry.release(&mut frames);
    }
    #[test]
    fn registers_and_releases_on_frame() {
        let (mut frames, frame) = fixture();
        let entry = TimedFrame::new(&mut frames, frame, 1);
        let second = TimedFrame::new(&mut frames, frame, 2);
        assert_eq!(frames.get(frame).unwrap().timed_frames().len(), 2);
        assert!(frames.get(frame).unwrap().is_scheduled());

        entry.release(&mut frames);
        assert_eq!(
            frames.get(frame).unwrap().timed_frames(),
            &[second.id()]
        );
        second.release(&mut frames);
        assert!(!frames.get(frame).unwrap().is_scheduled());
    }
    #[test]
    fn resolves_frame_weakly() {
        let (mut frames, frame) = fixture();
        let entry = TimedFrame::new(&mut frames, frame, 1);
        assert!(entry.has_frame(&frames));
        assert_eq!(entry.frame(&frames).unwrap().name(), "key");

        frames.destroy(frame);
        assert!(!entry.has_frame(&frames));
        entry.release(&mut frames);
    }
}
