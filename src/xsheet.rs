//! # Exposure sheet
//! The sheet is the timeline: an ordered run of [`TimedFrame`] entries whose
//! tick ranges tile `[1, seq_length]` with no gaps or overlaps. All
//! renumbering funnels through [`XSheet::recompute_from`]: the entry at the
//! given list index is taken as correct and every entry after it is assigned
//! the next free tick, so insert, removal, reorder and hold changes all keep
//! the tiling by fixing one slot and recomputing the tail.
//!
//! The sheet carries a single track. Every operation addresses entries by a
//! tick they own rather than a list index, matching how a timeline view
//! talks about them.

use crate::event::{AnimationEvent, EventHub};
use crate::timed_frame::TimedFrame;

/// Display rate fallback, frames per second.
pub const DEFAULT_FPS: u32 = 24;

/// A place on the timeline for insertions and removals. `End` is the
/// append/last sentinel; `At(n)` addresses the entry owning tick `n`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SeqSlot {
    End,
    At(u32),
}

#[derive(Debug)]
pub struct XSheet {
    entries: Vec<TimedFrame>,
    seq_length: u32,
    fps: u32,
    events: EventHub,
}

impl XSheet {
    pub(crate) fn new(events: EventHub) -> Self {
        Self {
            entries: Vec::new(),
            seq_length: 0,
            fps: DEFAULT_FPS,
            events,
        }
    }

    /// Entries in timeline order.
    #[must_use]
    pub fn frames(&self) -> &[TimedFrame] {
        &self.entries
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// Total timeline length in ticks, the sum of every hold.
    #[must_use]
    pub fn seq_length(&self) -> u32 {
        self.seq_length
    }
    #[must_use]
    pub fn fps(&self) -> u32 {
        self.fps
    }
    pub fn set_fps(&mut self, fps: u32) -> bool {
        if fps == 0 {
            log::warn!("fps must be at least 1, ignoring 0");
            return false;
        }
        if fps == self.fps {
            return false;
        }
        self.fps = fps;
        self.events.emit(AnimationEvent::FpsChanged(fps));
        true
    }

    /// The entry owning tick `n`, if any.
    #[must_use]
    pub fn frame_at_seq(&self, n: u32) -> Option<&TimedFrame> {
        self.entries.iter().find(|entry| entry.has_seq_num(n))
    }
    fn index_at_seq(&self, n: u32) -> Option<usize> {
        self.entries.iter().position(|entry| entry.has_seq_num(n))
    }

    /// The entry showing right before the one owning tick `at`. With `wrap`,
    /// the timeline is treated as a loop, except that the only entry of a
    /// one-entry sheet never wraps to itself.
    #[must_use]
    pub fn before(&self, at: u32, wrap: bool) -> Option<&TimedFrame> {
        let entry = self.frame_at_seq(at)?;
        let prev = entry.seq_num() - 1;
        if prev >= 1 {
            self.frame_at_seq(prev)
        } else if wrap && self.entries.len() > 1 {
            self.entries.last()
        } else {
            None
        }
    }
    /// The entry showing right after the one owning tick `at`. Wrapping as
    /// in [`Self::before`].
    #[must_use]
    pub fn after(&self, at: u32, wrap: bool) -> Option<&TimedFrame> {
        let entry = self.frame_at_seq(at)?;
        match self.frame_at_seq(entry.last_seq() + 1) {
            Some(next) => Some(next),
            None if wrap && self.entries.len() > 1 => self.entries.first(),
            None => None,
        }
    }

    /// Schedule an entry. `End` (or any tick past the current length)
    /// appends; a tick inside the timeline inserts before the entry owning
    /// it, the newcomer claiming that entry's starting tick and pushing
    /// everything after forward by its hold. Tick 0 is invalid; the entry is
    /// handed back untouched.
    pub fn add_frame(&mut self, mut entry: TimedFrame, at: SeqSlot) -> Result<(), TimedFrame> {
        let index = match at {
            SeqSlot::At(0) => {
                log::warn!("cannot schedule at tick 0");
                return Err(entry);
            }
            SeqSlot::End => None,
            SeqSlot::At(n) if n > self.seq_length => None,
            SeqSlot::At(n) => self.index_at_seq(n),
        };
        let index = match index {
            None => {
                entry.set_seq_num(self.seq_length + 1);
                self.entries.push(entry);
                self.entries.len() - 1
            }
            Some(index) => {
                entry.set_seq_num(self.entries[index].seq_num());
                self.entries.insert(index, entry);
                index
            }
        };
        self.recompute_from(index);
        self.events.emit(AnimationEvent::FrameScheduled {
            seq: self.entries[index].seq_num(),
        });
        self.events
            .emit(AnimationEvent::SeqLengthChanged(self.seq_length));
        Ok(())
    }

    /// Unschedule the entry owning the given tick and hand it back. An empty
    /// sheet or a tick outside `[1, seq_length]` rejects. Removing the last
    /// entry renumbers nothing; removing from the middle lets the successor
    /// adopt the vacated starting tick and renumbers from there.
    pub fn remove_frame(&mut self, at: SeqSlot) -> Option<TimedFrame> {
        if self.entries.is_empty() {
            log::warn!("cannot remove from an empty sheet");
            return None;
        }
        let index = match at {
            SeqSlot::End => self.entries.len() - 1,
            SeqSlot::At(n) if n < 1 || n > self.seq_length => {
                log::warn!("no entry at tick {n} to remove");
                return None;
            }
            // In range of a non-empty sheet, the scan always lands.
            SeqSlot::At(n) => self.index_at_seq(n)?,
        };
        let removed;
        if index == self.entries.len() - 1 {
            removed = self.entries.pop()?;
            self.seq_length = self.entries.last().map_or(0, TimedFrame::last_seq);
        } else {
            removed = self.entries.remove(index);
            if self.entries[index].set_seq_num(removed.seq_num()) {
                self.events.emit(AnimationEvent::SeqNumChanged {
                    entry: self.entries[index].id(),
                    seq: removed.seq_num(),
                });
            }
            self.recompute_from(index);
        }
        self.events.emit(AnimationEvent::FrameUnscheduled {
            seq: removed.seq_num(),
        });
        self.events
            .emit(AnimationEvent::SeqLengthChanged(self.seq_length));
        Some(removed)
    }

    /// Reorder: the entry owning tick `at` moves to the list slot of the
    /// entry owning tick `to`. Whichever of the two former slots is nearer
    /// the front adopts the starting tick that was displaced there, then the
    /// tail is renumbered. Both ticks must be inside `[1, seq_length]`.
    pub fn move_frame(&mut self, at: u32, to: u32) -> bool {
        if at < 1 || at > self.seq_length || to < 1 || to > self.seq_length {
            log::warn!("move {at} -> {to} outside [1, {}]", self.seq_length);
            return false;
        }
        let (Some(index_at), Some(index_to)) = (self.index_at_seq(at), self.index_at_seq(to))
        else {
            return false;
        };
        if index_at == index_to {
            return false;
        }
        // Starting ticks before the splice; the pivot slot claims one of
        // them depending on the move direction.
        let seq_at = self.entries[index_at].seq_num();
        let seq_to = self.entries[index_to].seq_num();

        let moved = self.entries.remove(index_at);
        self.entries.insert(index_to, moved);

        let pivot = index_at.min(index_to);
        let displaced = if pivot == index_at { seq_at } else { seq_to };
        if self.entries[pivot].set_seq_num(displaced) {
            self.events.emit(AnimationEvent::SeqNumChanged {
                entry: self.entries[pivot].id(),
                seq: displaced,
            });
        }
        self.recompute_from(pivot);
        self.events.emit(AnimationEvent::FrameShifted {
            from_seq: at,
            to_seq: to,
        });
        true
    }

    /// Change the hold of the entry owning tick `at`, renumbering everything
    /// after it. Zero holds and unknown ticks are rejected.
    pub fn set_hold(&mut self, at: u32, hold: u32) -> bool {
        let Some(index) = self.index_at_seq(at) else {
            log::warn!("no entry at tick {at} to hold");
            return false;
        };
        if !self.entries[index].set_hold(hold) {
            return false;
        }
        self.events.emit(AnimationEvent::HoldChanged {
            seq: self.entries[index].seq_num(),
            hold,
        });
        self.recompute_from(index);
        self.events
            .emit(AnimationEvent::SeqLengthChanged(self.seq_length));
        true
    }

    /// Renumber every entry after `index`, taking `index`'s own starting
    /// tick as already correct, and refresh the total length.
    fn recompute_from(&mut self, index: usize) {
        let Some(first) = self.entries.get(index) else {
            return;
        };
        let events = &self.events;
        let mut next = first.seq_num() + first.hold();
        for entry in &mut self.entries[index + 1..] {
            if entry.set_seq_num(next) {
                events.emit(AnimationEvent::SeqNumChanged {
                    entry: entry.id(),
                    seq: next,
                });
            }
            next += entry.hold();
        }
        self.seq_length = next - 1;
        events.emit(AnimationEvent::SeqNumsChanged);
    }

    /// Detach every entry scheduling `frame`; they stay on the timeline but
    /// place nothing. Destroy-frame cascade.
    pub(crate) fn clear_entries_of(&mut self, frame: crate::frame::FrameId) {
        for entry in &mut self.entries {
            if entry.frame_id() == Some(frame) {
                entry.clear_frame();
            }
        }
    }
}
