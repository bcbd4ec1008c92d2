//! # Frames
//! A frame is one drawing: an ordered stack of cel placements, index 0 on
//! top. The z value of every placement is derived from the stack, `count -
//! index`, and is rebuilt after any structural change. Frames are pooled and
//! uniquely named by the [`crate::library::frames::FrameLibrary`]; the
//! exposure sheet schedules them through
//! [`crate::timed_frame::TimedFrame`] entries, which register themselves
//! here so a frame knows whether it is still placed anywhere.
//!
//! Activating a frame activates every cel it stages (loading file-backed
//! pixels); placements whose cel has been destroyed are skipped.

use crate::cel::CelId;
use crate::cel_ref::CelRef;
use crate::event::{AnimationEvent, EventHub};
use crate::geom::{Size, Vec2};
use crate::id::PegId;
use crate::library::cels::CelLibrary;
use crate::name::NameFlags;
use crate::raster;
use crate::timed_frame::TimedFrameId;

pub type FrameId = PegId<Frame>;

/// A slot in a frame's stack. `Top` is index 0, `Bottom` the far end.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Layer {
    Top,
    Bottom,
    At(usize),
}

impl Layer {
    /// Insertion point in a stack of `len` entries. Past-the-end requests
    /// append, the way the bottom sentinel does.
    fn insert_index(self, len: usize) -> usize {
        match self {
            Self::Top => 0,
            Self::Bottom => len,
            Self::At(index) => index.min(len),
        }
    }
    /// Index of an existing entry, if the slot names one.
    fn item_index(self, len: usize) -> Option<usize> {
        match self {
            _ if len == 0 => None,
            Self::Top => Some(0),
            Self::Bottom => Some(len - 1),
            Self::At(index) => (index < len).then_some(index),
        }
    }
}

#[derive(Debug)]
pub struct Frame {
    id: FrameId,
    name: String,
    name_flags: NameFlags,
    active: bool,
    refs: Vec<CelRef>,
    /// Timeline entries currently placing this frame.
    timed: smallvec::SmallVec<[TimedFrameId; 2]>,
    events: EventHub,
}

impl Frame {
    pub(crate) fn new(name: String, name_flags: NameFlags, events: EventHub) -> Self {
        Self {
            id: FrameId::next(),
            name,
            name_flags,
            active: false,
            refs: Vec::new(),
            timed: smallvec::SmallVec::new(),
            events,
        }
    }

    #[must_use]
    pub fn id(&self) -> FrameId {
        self.id
    }
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[must_use]
    pub fn name_flags(&self) -> NameFlags {
        self.name_flags
    }
    #[must_use]
    pub fn active(&self) -> bool {
        self.active
    }
    #[must_use]
    pub fn cels(&self) -> &[CelRef] {
        &self.refs
    }
    #[must_use]
    pub fn cel_at(&self, index: usize) -> Option<&CelRef> {
        self.refs.get(index)
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
    /// Timeline entries placing this frame.
    #[must_use]
    pub fn timed_frames(&self) -> &[TimedFrameId] {
        &self.timed
    }
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        !self.timed.is_empty()
    }

    /// Stage a placement. The ref's frame link is claimed here; if this frame
    /// is active the placed cel comes up active too.
    pub fn add_cel(&mut self, cels: &mut CelLibrary, mut cel_ref: CelRef, at: Layer) {
        let index = at.insert_index(self.refs.len());
        cel_ref.set_frame(Some(self.id));
        self.refs.insert(index, cel_ref);
        self.rebuild_z(0);
        if self.active {
            if let Some(cel) = self.refs[index].cel_id() {
                cels.activate(cel);
            }
        }
        self.events.emit(AnimationEvent::CelStaged {
            frame: self.id,
            index,
        });
    }
    /// Unstage and hand the placement back. The caller restages it elsewhere
    /// or releases it; the staged cel is not deactivated here since other
    /// placements may still want it.
    pub fn remove_cel(&mut self, at: Layer) -> Option<CelRef> {
        let Some(index) = at.item_index(self.refs.len()) else {
            log::warn!("frame '{}': no cel at {at:?} to remove", self.name);
            return None;
        };
        let mut removed = self.refs.remove(index);
        removed.set_frame(None);
        self.rebuild_z(0);
        self.events.emit(AnimationEvent::CelUnstaged {
            frame: self.id,
            index,
        });
        Some(removed)
    }
    /// Restack a placement. Z values are rebuilt from the shallower of the
    /// two slots; everything above keeps its height.
    pub fn move_cel(&mut self, from: Layer, to: Layer) -> bool {
        let len = self.refs.len();
        let (Some(from), Some(to)) = (from.item_index(len), to.item_index(len)) else {
            log::warn!("frame '{}': restack {from:?} -> {to:?} out of range", self.name);
            return false;
        };
        if from == to {
            return false;
        }
        let moved = self.refs.remove(from);
        self.refs.insert(to, moved);
        self.rebuild_z(from.min(to));
        self.events.emit(AnimationEvent::CelRestacked {
            frame: self.id,
            from,
            to,
        });
        true
    }
    /// Reposition a staged placement.
    pub fn set_cel_pos(&mut self, at: usize, pos: Vec2) -> bool {
        let Some(cel_ref) = self.refs.get_mut(at) else {
            log::warn!("frame '{}': no cel at index {at}", self.name);
            return false;
        };
        if !cel_ref.set_pos(pos) {
            return false;
        }
        self.events.emit(AnimationEvent::CelMoved {
            frame: self.id,
            index: at,
            pos,
        });
        true
    }
    /// Relative [`Self::set_cel_pos`].
    pub fn move_cel_by(&mut self, at: usize, dx: f32, dy: f32) -> bool {
        let Some(cel_ref) = self.refs.get(at) else {
            log::warn!("frame '{}': no cel at index {at}", self.name);
            return false;
        };
        self.set_cel_pos(at, cel_ref.pos().offset(dx, dy))
    }
    pub fn set_cel_show_info(&mut self, at: usize, show: bool) -> bool {
        match self.refs.get_mut(at) {
            Some(cel_ref) => cel_ref.set_show_info(show),
            None => false,
        }
    }

    /// Bring every staged cel up. Placements whose cel is gone are skipped.
    pub fn activate(&mut self, cels: &mut CelLibrary) -> bool {
        if self.active {
            return false;
        }
        for cel_ref in &self.refs {
            if let Some(cel) = cel_ref.cel_id() {
                cels.activate(cel);
            }
        }
        self.active = true;
        self.events.emit(AnimationEvent::FrameActivated(self.id));
        true
    }
    pub fn deactivate(&mut self, cels: &mut CelLibrary) -> bool {
        if !self.active {
            return false;
        }
        for cel_ref in &self.refs {
            if let Some(cel) = cel_ref.cel_id() {
                cels.deactivate(cel);
            }
        }
        self.active = false;
        self.events.emit(AnimationEvent::FrameDeactivated(self.id));
        true
    }

    /// Composite the drawing onto a blank canvas of the animation's frame
    /// size, bottom placement first. Pure query, fresh image every call.
    #[must_use]
    pub fn render(&self, cels: &CelLibrary, frame_size: Size) -> raster::RgbaImage {
        let mut canvas = raster::blank(frame_size);
        for cel_ref in self.refs.iter().rev() {
            if let Some(cel) = cel_ref.cel(cels) {
                raster::composite(&mut canvas, &cel.image(cels.resource_dir()), cel_ref.pos());
            }
        }
        canvas
    }

    /// Persist every staged cel's in-memory pixels. Failures are logged per
    /// cel; the sweep continues.
    pub fn save_cels(&self, cels: &CelLibrary) {
        for cel_ref in &self.refs {
            if let Some(cel) = cel_ref.cel_id() {
                if let Err(err) = cels.save(cel) {
                    log::error!("frame '{}': {err}", self.name);
                }
            }
        }
    }
    /// Flag (or unflag) every staged cel's backing file for deletion.
    pub fn mark_cels_removed(&self, cels: &mut CelLibrary, should_delete: bool) {
        for cel_ref in &self.refs {
            if let Some(cel) = cel_ref.cel_id() {
                cels.mark_removed(cel, should_delete);
            }
        }
    }

    fn rebuild_z(&mut self, from: usize) {
        let len = self.refs.len();
        for (index, cel_ref) in self.refs.iter_mut().enumerate().skip(from) {
            cel_ref.set_z((len - index) as f32);
        }
    }

    pub(crate) fn set_name(&mut self, name: String, name_flags: NameFlags) {
        self.name = name;
        self.name_flags = name_flags;
    }
    pub(crate) fn register_timed(&mut self, id: TimedFrameId) {
        self.timed.push(id);
    }
    pub(crate) fn unregister_timed(&mut self, id: TimedFrameId) {
        if let Some(found) = self.timed.iter().position(|t| *t == id) {
            self.timed.swap_remove(found);
        }
    }
    /// Destroy-cel cascade: forget a cel that is going away.
    pub(crate) fn clear_refs_to(&mut self, cel: CelId) {
        for cel_ref in &mut self.refs {
            if cel_ref.cel_id() == Some(cel) {
                cel_ref.clear_cel();
            }
        }
    }
    /// Destroy-frame cascade: surrender all placements for releasing.
    pub(crate) fn take_refs(&mut self) -> Vec<CelRef> {
        for cel_ref in &mut self.refs {
            cel_ref.set_frame(None);
        }
        std::mem::take(&mut self.refs)
    }
}
