//! # Frame pool
//! Owns every frame of one document and the name index over them. Frames
//! have no backing files of their own, so rename here is a pure index swap;
//! deep copies go through the cel pool to duplicate the staged artwork.

use crate::cel_ref::CelRef;
use crate::event::{AnimationEvent, EventHub};
use crate::frame::{Frame, FrameId, Layer};
use crate::library::cels::CelLibrary;
use crate::name::{self, NameFlags, Reserved};

/// Name prefix for generated frame names.
pub const NAME_PREFIX: &str = "frame";

#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("no frame {0}")]
    NotFound(FrameId),
}

#[derive(Debug)]
pub struct FrameLibrary {
    frames: hashbrown::HashMap<FrameId, Frame>,
    names: hashbrown::HashMap<String, FrameId>,
    events: EventHub,
}

impl FrameLibrary {
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
    #[must_use]
    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(&id)
    }
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Frame> {
        self.frames.get(self.names.get(name)?)
    }
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<FrameId> {
        self.names.get(name).copied()
    }
    #[must_use]
    pub fn is_taken(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }
    /// All frames, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.values()
    }
    /// All frames ordered by name, for stable enumeration.
    #[must_use]
    pub fn sorted_by_name(&self) -> Vec<&Frame> {
        let mut frames: Vec<_> = self.frames.values().collect();
        frames.sort_by_key(|frame| frame.name());
        frames
    }

    /// Create an empty frame. The requested name may be rewritten to keep
    /// the pool collision-free.
    pub fn create(&mut self, name: &str) -> FrameId {
        let (name, flags) = self.reserve(name);
        let frame = Frame::new(name.clone(), flags, self.events.clone());
        let id = frame.id();
        self.names.insert(name, id);
        self.frames.insert(id, frame);
        id
    }

    /// Rename, keeping the index in step. Returns false when the request
    /// resolves to the current name.
    pub fn rename(&mut self, id: FrameId, requested: &str) -> Result<bool, FrameError> {
        let Some(frame) = self.frames.get(&id) else {
            return Err(FrameError::NotFound(id));
        };
        let reserved = name::reserve(requested, Some(frame.name()), NAME_PREFIX, |candidate| {
            self.names.contains_key(candidate)
        });
        let Reserved::Fresh { name, flags } = reserved else {
            return Ok(false);
        };
        let old = frame.name().to_owned();
        self.names.remove(&old);
        self.names.insert(name.clone(), id);
        if let Some(frame) = self.frames.get_mut(&id) {
            frame.set_name(name.clone(), flags);
        }
        self.events.emit(AnimationEvent::FrameRenamed {
            frame: id,
            from: old,
            to: name,
        });
        Ok(true)
    }

    /// Deep copy: a fresh frame holding copies of every staged cel, in the
    /// same stacking order and at the same positions. Nothing is shared with
    /// the source. Placements whose cel is gone, or whose cel cannot be
    /// duplicated on disk, are logged and left out. The copy starts inactive
    /// and unscheduled.
    pub fn copy_frame(
        &mut self,
        cels: &mut CelLibrary,
        id: FrameId,
        requested: &str,
    ) -> Result<FrameId, FrameError> {
        let Some(source) = self.frames.get(&id) else {
            return Err(FrameError::NotFound(id));
        };
        let requested = if requested == source.name()
            && source.name_flags().contains(NameFlags::SUFFIXED)
        {
            name::without_suffix(requested)
        } else {
            requested
        };
        let source_name = source.name().to_owned();
        let placements: Vec<_> = source
            .cels()
            .iter()
            .map(|cel_ref| (cel_ref.cel_id(), cel_ref.pos(), cel_ref.show_info()))
            .collect();

        let copy = self.create(requested);
        // Bottom up so each placement stacked on top lands in source order.
        for (cel, pos, show_info) in placements.into_iter().rev() {
            let Some(cel) = cel else {
                log::debug!("copy of frame '{source_name}' skips an empty placement");
                continue;
            };
            let cel_name = match cels.get(cel) {
                Some(cel) => cel.name().to_owned(),
                None => {
                    log::debug!("copy of frame '{source_name}' skips dead {cel}");
                    continue;
                }
            };
            let copied_cel = match cels.copy(cel, &cel_name) {
                Ok(copied) => copied,
                Err(err) => {
                    log::error!("copy of frame '{source_name}' drops '{cel_name}': {err}");
                    continue;
                }
            };
            let mut cel_ref = CelRef::new(cels, copied_cel);
            cel_ref.set_pos(pos);
            cel_ref.set_show_info(show_info);
            if let Some(frame) = self.frames.get_mut(&copy) {
                frame.add_cel(cels, cel_ref, Layer::Top);
            }
        }
        Ok(copy)
    }

    fn reserve(&self, requested: &str) -> (String, NameFlags) {
        match name::reserve(requested, None, NAME_PREFIX, |candidate| {
            self.names.contains_key(candidate)
        }) {
            // Unreachable for fresh entries (no current name to match).
            Reserved::Unchanged => (String::new(), NameFlags::empty()),
            Reserved::Fresh { name, flags } => (name, flags),
        }
    }
}

/// Writer surface for the owning document.
impl FrameLibrary {
    pub(crate) fn new(events: EventHub) -> Self {
        Self {
            frames: hashbrown::HashMap::new(),
            names: hashbrown::HashMap::new(),
            events,
        }
    }
    pub(crate) fn get_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(&id)
    }
    /// Destroy-cel cascade walks every frame to detach placements.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Frame> {
        self.frames.values_mut()
    }
    /// Drop the record. The document-level destroy detaches placements and
    /// timeline entries first; a frame destroyed here with either still
    /// attached leaves those handles dangling.
    pub(crate) fn destroy(&mut self, id: FrameId) -> bool {
        let Some(frame) = self.frames.remove(&id) else {
            log::warn!("destroy skipped, {id} is gone");
            return false;
        };
        self.names.remove(frame.name());
        self.events.emit(AnimationEvent::FrameDestroyed {
            frame: id,
            name: frame.name().to_owned(),
        });
        true
    }
}
