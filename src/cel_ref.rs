//! # Cel placements
//! A [`CelRef`] puts one cel somewhere inside one frame: a position, a
//! stacking-derived z value, and a display flag. Many refs may point at the
//! same cel. The ref holds the cel weakly by id; if the cel is destroyed
//! while the ref lingers, the ref simply reads as empty and drawing code
//! skips it.
//!
//! A ref belongs to at most one frame at a time. The frame link is written
//! only by [`crate::frame::Frame`] staging operations so the frame's list and
//! the link can never disagree; before staging (and after removal) a ref
//! floats free and is owned by whoever holds the value.

use crate::cel::{Cel, CelId};
use crate::frame::FrameId;
use crate::geom::Vec2;
use crate::id::PegId;
use crate::library::cels::CelLibrary;

pub type CelRefId = PegId<CelRef>;

#[derive(Debug)]
pub struct CelRef {
    id: CelRefId,
    cel: Option<CelId>,
    frame: Option<FrameId>,
    pos: Vec2,
    z: f32,
    show_info: bool,
}

impl CelRef {
    /// A placement of `cel`, registered in the cel's back-reference set.
    /// A stale id is tolerated: the ref starts out empty, with a warning.
    #[must_use]
    pub fn new(cels: &mut CelLibrary, cel: CelId) -> Self {
        let id = CelRefId::next();
        let cel = match cels.get_mut(cel) {
            Some(cel) => {
                cel.register_ref(id);
                Some(cel.id())
            }
            None => {
                log::warn!("placement of unknown {cel}, starting empty");
                None
            }
        };
        Self {
            id,
            cel,
            frame: None,
            pos: Vec2::ZERO,
            z: 0.0,
            show_info: false,
        }
    }
    /// A placement of nothing. Occupies a layer slot, draws nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: CelRefId::next(),
            cel: None,
            frame: None,
            pos: Vec2::ZERO,
            z: 0.0,
            show_info: false,
        }
    }
    /// Second placement of the same cel at the same spot, not yet staged.
    #[must_use]
    pub fn duplicate(&self, cels: &mut CelLibrary) -> Self {
        let mut twin = match self.cel {
            Some(cel) => Self::new(cels, cel),
            None => Self::empty(),
        };
        twin.pos = self.pos;
        twin.show_info = self.show_info;
        twin
    }
    /// Drop this placement, removing it from its cel's back-reference set.
    /// Call when a removed ref will not be restaged.
    pub fn release(self, cels: &mut CelLibrary) {
        if let Some(cel) = self.cel {
            if let Some(cel) = cels.get_mut(cel) {
                cel.unregister_ref(self.id);
            }
        }
    }

    #[must_use]
    pub fn id(&self) -> CelRefId {
        self.id
    }
    #[must_use]
    pub fn cel_id(&self) -> Option<CelId> {
        self.cel
    }
    /// Resolve the referenced cel. `None` when the ref is empty or the cel
    /// has since been destroyed.
    #[must_use]
    pub fn cel<'lib>(&self, cels: &'lib CelLibrary) -> Option<&'lib Cel> {
        cels.get(self.cel?)
    }
    #[must_use]
    pub fn has_cel(&self, cels: &CelLibrary) -> bool {
        self.cel(cels).is_some()
    }
    #[must_use]
    pub fn frame_id(&self) -> Option<FrameId> {
        self.frame
    }
    #[must_use]
    pub fn has_frame(&self) -> bool {
        self.frame.is_some()
    }
    #[must_use]
    pub fn pos(&self) -> Vec2 {
        self.pos
    }
    /// Stacking height inside the owning frame, highest on top. Maintained by
    /// the frame; meaningless while detached.
    #[must_use]
    pub fn z(&self) -> f32 {
        self.z
    }
    #[must_use]
    pub fn show_info(&self) -> bool {
        self.show_info
    }

    /// Returns whether the value changed. Staged refs are repositioned
    /// through the owning frame, which emits the move event.
    pub fn set_pos(&mut self, pos: Vec2) -> bool {
        if pos == self.pos {
            return false;
        }
        self.pos = pos;
        true
    }
    /// Relative [`Self::set_pos`].
    pub fn move_by(&mut self, dx: f32, dy: f32) -> bool {
        self.set_pos(self.pos.offset(dx, dy))
    }
    pub fn set_show_info(&mut self, show: bool) -> bool {
        if show == self.show_info {
            return false;
        }
        self.show_info = show;
        true
    }

    pub(crate) fn set_z(&mut self, z: f32) -> bool {
        if (z - self.z).abs() < f32::EPSILON {
            return false;
        }
        self.z = z;
        true
    }
    pub(crate) fn set_frame(&mut self, frame: Option<FrameId>) {
        self.frame = frame;
    }
    /// The referenced cel is going away; forget it without touching its
    /// back-reference set.
    pub(crate) fn clear_cel(&mut self) {
        self.cel = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geom::Size;
    use crate::library::cels::CelLibrary;

    fn library() -> CelLibrary {
        CelLibrary::new(crate::event::EventHub::new(), std::env::temp_dir())
    }

    #[test]
    fn construction_registers_exactly_once() {
        let mut cels = library();
        let cel = cels.create_stub("ink", Size::MIN);

        let a = CelRef::new(&mut cels, cel);
        assert_eq!(cels.get(cel).unwrap().cel_refs(), &[a.id()]);

        let b = a.duplicate(&mut cels);
        assert_eq!(cels.get(cel).unwrap().cel_refs().len(), 2);

        a.release(&mut cels);
        assert_eq!(cels.get(cel).unwrap().cel_refs(), &[b.id()]);
        b.release(&mut cels);
        assert!(!cels.get(cel).unwrap().is_referenced());
    }
    #[test]
    fn empty_ref_is_inert() {
        let cels = library();
        let empty = CelRef::empty();
        assert!(!empty.has_cel(&cels));
        assert!(empty.cel(&cels).is_none());
        assert!(!empty.has_frame());
    }
    #[test]
    fn position_mutators_detect_noops() {
        let mut r = CelRef::empty();
        assert!(r.set_pos(Vec2::new(2.0, 3.0)));
        assert!(!r.set_pos(Vec2::new(2.0, 3.0)));
        assert!(r.move_by(0.5, 0.0));
        assert!(!r.move_by(0.0, 0.0));
        assert_eq!(r.pos(), Vec2::new(2.5, 3.0));

        assert!(r.set_show_info(true));
        assert!(!r.set_show_info(true));
    }
    #[test]
    fn duplicate_copies_placement_state() {
        let mut cels = library();
        let cel = cels.create_stub("ink", Size::MIN);
        let mut a = CelRef::new(&mut cels, cel);
        a.set_pos(Vec2::new(8.0, -1.0));
        a.set_show_info(true);

        let b = a.duplicate(&mut cels);
        assert_eq!(b.cel_id(), Some(cel));
        assert_eq!(b.pos(), a.pos());
        assert!(b.show_info());
        assert!(!b.has_frame());
        assert_ne!(b.id(), a.id());
    }
}
