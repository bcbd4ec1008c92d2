//! # Cel pool
//! Owns every cel of one document and the name index over them. The pool
//! also owns the resource directory path, since it is the authority on where
//! file-backed cels keep their PNGs; rename and destroy keep the files in
//! step with the records.

use crate::cel::{Cel, CelId};
use crate::event::{AnimationEvent, EventHub};
use crate::geom::Size;
use crate::name::{self, NameFlags, Reserved};
use crate::raster::{self, RasterError};

/// Name prefix for generated cel names.
pub const NAME_PREFIX: &str = "cel";

#[derive(thiserror::Error, Debug)]
pub enum CelError {
    #[error("no cel {0}")]
    NotFound(CelId),
    #[error(transparent)]
    Io(#[from] RasterError),
}

#[derive(Debug)]
pub struct CelLibrary {
    cels: hashbrown::HashMap<CelId, Cel>,
    names: hashbrown::HashMap<String, CelId>,
    resource_dir: std::path::PathBuf,
    events: EventHub,
}

impl CelLibrary {
    #[must_use]
    pub fn len(&self) -> usize {
        self.cels.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cels.is_empty()
    }
    #[must_use]
    pub fn get(&self, id: CelId) -> Option<&Cel> {
        self.cels.get(&id)
    }
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Cel> {
        self.cels.get(self.names.get(name)?)
    }
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<CelId> {
        self.names.get(name).copied()
    }
    #[must_use]
    pub fn is_taken(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }
    /// All cels, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Cel> {
        self.cels.values()
    }
    /// All cels ordered by name, for stable enumeration.
    #[must_use]
    pub fn sorted_by_name(&self) -> Vec<&Cel> {
        let mut cels: Vec<_> = self.cels.values().collect();
        cels.sort_by_key(|cel| cel.name());
        cels
    }
    /// Base path under which file-backed cels resolve `<name>.png`.
    #[must_use]
    pub fn resource_dir(&self) -> &std::path::Path {
        &self.resource_dir
    }

    /// Create a blank stub cel. The requested name may be rewritten to keep
    /// the pool collision-free.
    pub fn create_stub(&mut self, name: &str, size: Size) -> CelId {
        let (name, flags) = self.reserve(name);
        let cel = Cel::stub(name.clone(), flags, size);
        let id = cel.id();
        self.names.insert(name, id);
        self.cels.insert(id, cel);
        id
    }
    /// Create a file-backed cel with a fresh blank PNG on disk.
    pub fn create_png(&mut self, name: &str, size: Size) -> Result<CelId, CelError> {
        let (name, flags) = self.reserve(name);
        let cel = Cel::png_blank(name.clone(), flags, size, &self.resource_dir)?;
        let id = cel.id();
        self.names.insert(name, id);
        self.cels.insert(id, cel);
        Ok(id)
    }
    /// Adopt `<name>.png` already in the resource directory; the cel takes
    /// the file's dimensions. Document-loading path.
    pub fn adopt_png(&mut self, name: &str) -> Result<CelId, CelError> {
        let (name, flags) = self.reserve(name);
        let cel = Cel::png_from_file(name.clone(), flags, &self.resource_dir)?;
        let id = cel.id();
        self.names.insert(name, id);
        self.cels.insert(id, cel);
        Ok(id)
    }

    /// Rename, keeping the index and any backing file in step. Returns false
    /// when the request resolves to the current name. If moving the backing
    /// file fails nothing changes.
    pub fn rename(&mut self, id: CelId, requested: &str) -> Result<bool, CelError> {
        let Some(cel) = self.cels.get(&id) else {
            return Err(CelError::NotFound(id));
        };
        let reserved = name::reserve(requested, Some(cel.name()), NAME_PREFIX, |candidate| {
            self.names.contains_key(candidate)
        });
        let Reserved::Fresh { name, flags } = reserved else {
            return Ok(false);
        };
        let old = cel.name().to_owned();
        if cel.is_file_backed() {
            let from = cel.png_path(&self.resource_dir);
            let to = self.resource_dir.join(format!("{name}.png"));
            if let Err(err) = raster::rename_file(&from, &to) {
                log::error!("cel '{old}' keeps its name: {err}");
                return Err(err.into());
            }
        }
        self.names.remove(&old);
        self.names.insert(name.clone(), id);
        if let Some(cel) = self.cels.get_mut(&id) {
            cel.set_name(name.clone(), flags);
        }
        self.events.emit(AnimationEvent::CelRenamed {
            cel: id,
            from: old,
            to: name,
        });
        Ok(true)
    }

    /// Independent copy: same extent and pixels under a freshly reserved
    /// name, no inbound placements, inactive. Copying a suffixed cel under
    /// its own name re-reserves from the unsuffixed stem instead of
    /// stacking suffixes.
    pub fn copy(&mut self, id: CelId, requested: &str) -> Result<CelId, CelError> {
        let Some(source) = self.cels.get(&id) else {
            return Err(CelError::NotFound(id));
        };
        let requested = if requested == source.name()
            && source.name_flags().contains(NameFlags::SUFFIXED)
        {
            name::without_suffix(requested)
        } else {
            requested
        };
        let (name, flags) = self.reserve(requested);
        let copy = match source.is_file_backed() {
            false => Cel::stub(name.clone(), flags, source.size()),
            true => Cel::png_copy_of(name.clone(), flags, source, &self.resource_dir)?,
        };
        let id = copy.id();
        self.names.insert(name, id);
        self.cels.insert(id, copy);
        Ok(id)
    }

    /// Bring a cel up, loading file-backed pixels. Unknown ids are skipped;
    /// activation cascades hit placements whose cel is long gone.
    pub fn activate(&mut self, id: CelId) -> bool {
        let Some(cel) = self.cels.get_mut(&id) else {
            log::debug!("activate skipped, {id} is gone");
            return false;
        };
        if !cel.activate(&self.resource_dir) {
            return false;
        }
        self.events.emit(AnimationEvent::CelActivated(id));
        true
    }
    pub fn deactivate(&mut self, id: CelId) -> bool {
        let Some(cel) = self.cels.get_mut(&id) else {
            log::debug!("deactivate skipped, {id} is gone");
            return false;
        };
        if !cel.deactivate(&self.resource_dir) {
            return false;
        }
        self.events.emit(AnimationEvent::CelDeactivated(id));
        true
    }
    /// Persist a cel's in-memory pixels without deactivating it.
    pub fn save(&self, id: CelId) -> Result<(), CelError> {
        let Some(cel) = self.cels.get(&id) else {
            return Err(CelError::NotFound(id));
        };
        Ok(cel.save(&self.resource_dir)?)
    }
    /// The cel's current pixels; see [`Cel::image`].
    #[must_use]
    pub fn image_of(&self, id: CelId) -> Option<raster::RgbaImage> {
        Some(self.cels.get(&id)?.image(&self.resource_dir))
    }

    /// Change extent, keeping previous content at the top-left.
    pub fn resize(&mut self, id: CelId, size: Size) -> bool {
        self.resize_with_offset(id, (0, 0), size)
    }
    /// Change extent, placing previous content at `(x, y)` of the new canvas.
    pub fn resize_with_offset(&mut self, id: CelId, offset: (i32, i32), size: Size) -> bool {
        let Some(cel) = self.cels.get_mut(&id) else {
            log::warn!("resize skipped, {id} is gone");
            return false;
        };
        if !cel.resize(offset, size, &self.resource_dir) {
            return false;
        }
        let size = cel.size();
        self.events
            .emit(AnimationEvent::CelResized { cel: id, size });
        true
    }

    /// Flag (or unflag) the backing file for deletion when the cel is
    /// destroyed.
    pub fn mark_removed(&mut self, id: CelId, should_delete: bool) -> bool {
        let Some(cel) = self.cels.get_mut(&id) else {
            log::warn!("mark skipped, {id} is gone");
            return false;
        };
        cel.remove(should_delete);
        true
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
impl CelLibrary {
    pub(crate) fn new(events: EventHub, resource_dir: std::path::PathBuf) -> Self {
        Self {
            cels: hashbrown::HashMap::new(),
            names: hashbrown::HashMap::new(),
            resource_dir,
            events,
        }
    }
    pub(crate) fn get_mut(&mut self, id: CelId) -> Option<&mut Cel> {
        self.cels.get_mut(&id)
    }
    pub(crate) fn set_resource_dir(&mut self, resource_dir: std::path::PathBuf) {
        self.resource_dir = resource_dir;
    }
    /// Drop the record, deactivating first; a marked backing file is deleted
    /// now. Placements pointing here are left to the caller to detach.
    pub(crate) fn destroy(&mut self, id: CelId) -> bool {
        let Some(mut cel) = self.cels.remove(&id) else {
            log::warn!("destroy skipped, {id} is gone");
            return false;
        };
        self.names.remove(cel.name());
        cel.destroy_resources(&self.resource_dir);
        self.events.emit(AnimationEvent::CelDestroyed {
            cel: id,
            name: cel.name().to_owned(),
        });
        true
    }
}

impl Drop for CelLibrary {
    /// Closing the document: unmarked active cels persist their pixels,
    /// marked cels lose their files.
    fn drop(&mut self) {
        for cel in self.cels.values_mut() {
            cel.destroy_resources(&self.resource_dir);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::name::SUFFIX_LEN;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pegbar_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
    fn library() -> (CelLibrary, EventHub) {
        let hub = EventHub::new();
        (CelLibrary::new(hub.clone(), std::env::temp_dir()), hub)
    }

    #[test]
    fn names_stay_unique() {
        let (mut cels, _hub) = library();
        let first = cels.create_stub("sky", Size::MIN);
        let second = cels.create_stub("sky", Size::MIN);

        let second_name = cels.get(second).unwrap().name().to_owned();
        assert_ne!(second_name, "sky");
        assert!(second_name.starts_with("sky-"));
        assert_eq!(second_name.len(), "sky-".len() + SUFFIX_LEN);
        assert_eq!(
            cels.get(second).unwrap().name_flags(),
            NameFlags::SUFFIXED
        );
        assert_eq!(cels.id_of("sky"), Some(first));
        assert_eq!(cels.id_of(&second_name), Some(second));
        assert_eq!(cels.len(), 2);
    }
    #[test]
    fn empty_request_generates_name() {
        let (mut cels, _hub) = library();
        let id = cels.create_stub("", Size::MIN);
        let cel = cels.get(id).unwrap();
        assert!(cel.name().starts_with("cel-"));
        assert_eq!(
            cel.name_flags(),
            NameFlags::RANDOM | NameFlags::SUFFIXED
        );
        // The fallback token behaves identically.
        let id = cels.create_stub("cel", Size::MIN);
        assert!(cels.get(id).unwrap().name().starts_with("cel-"));
    }
    #[test]
    fn rename_swaps_the_index_atomically() {
        let (mut cels, hub) = library();
        let id = cels.create_stub("sky", Size::MIN);
        assert!(cels.rename(id, "sea").unwrap());

        assert_eq!(cels.id_of("sea"), Some(id));
        assert_eq!(cels.id_of("sky"), None);
        assert!(hub.poll().iter().any(|e| matches!(
            e,
            AnimationEvent::CelRenamed { from, to, .. } if from == "sky" && to == "sea"
        )));

        // Re-requesting the current name reports unchanged.
        assert!(!cels.rename(id, "sea").unwrap());
        // Renaming into a taken name suffixes.
        let other = cels.create_stub("sun", Size::MIN);
        assert!(cels.rename(other, "sea").unwrap());
        assert!(cels.get(other).unwrap().name().starts_with("sea-"));
    }
    #[test]
    fn rename_missing_is_an_error() {
        let (mut cels, _hub) = library();
        let id = cels.create_stub("sky", Size::MIN);
        cels.destroy(id);
        assert!(matches!(
            cels.rename(id, "sea"),
            Err(CelError::NotFound(_))
        ));
    }
    #[test]
    fn rename_moves_the_backing_file() {
        let dir = temp_dir("cels_rename");
        let hub = EventHub::new();
        let mut cels = CelLibrary::new(hub, dir.clone());
        let id = cels.create_png("ink", Size::MIN).unwrap();
        assert!(dir.join("ink.png").exists());

        assert!(cels.rename(id, "brush").unwrap());
        assert!(!dir.join("ink.png").exists());
        assert!(dir.join("brush.png").exists());
        std::fs::remove_dir_all(dir).unwrap();
    }
    #[test]
    fn failed_file_move_keeps_everything() {
        let dir = temp_dir("cels_rename_fail");
        let hub = EventHub::new();
        let mut cels = CelLibrary::new(hub, dir.clone());
        let id = cels.create_png("ink", Size::MIN).unwrap();
        // Sabotage: the backing file vanishes behind the pool's back.
        std::fs::remove_file(dir.join("ink.png")).unwrap();

        assert!(matches!(
            cels.rename(id, "brush"),
            Err(CelError::Io(_))
        ));
        assert_eq!(cels.get(id).unwrap().name(), "ink");
        assert_eq!(cels.id_of("ink"), Some(id));
        assert_eq!(cels.id_of("brush"), None);
        std::fs::remove_dir_all(dir).unwrap();
    }
    #[test]
    fn destroy_retires_the_name() {
        let (mut cels, hub) = library();
        let id = cels.create_stub("sky", Size::MIN);
        assert!(cels.destroy(id));
        assert!(cels.get(id).is_none());
        assert!(!cels.is_taken("sky"));
        assert!(!cels.destroy(id), "second destroy rejects");
        assert!(hub
            .poll()
            .iter()
            .any(|e| matches!(e, AnimationEvent::CelDestroyed { .. })));

        // The retired name is free for newcomers; the id is not reused.
        let next = cels.create_stub("sky", Size::MIN);
        assert_ne!(next, id);
        assert_eq!(cels.get(next).unwrap().name(), "sky");
    }
    #[test]
    fn destroy_deletes_marked_files() {
        let dir = temp_dir("cels_destroy");
        let hub = EventHub::new();
        let mut cels = CelLibrary::new(hub, dir.clone());
        let keep = cels.create_png("keep", Size::MIN).unwrap();
        let lose = cels.create_png("lose", Size::MIN).unwrap();
        cels.mark_removed(lose, true);

        cels.destroy(keep);
        cels.destroy(lose);
        assert!(dir.join("keep.png").exists());
        assert!(!dir.join("lose.png").exists());
        std::fs::remove_dir_all(dir).unwrap();
    }
    #[test]
    fn copies_share_nothing() {
        let dir = temp_dir("cels_copy");
        let hub = EventHub::new();
        let mut cels = CelLibrary::new(hub, dir.clone());
        let source = cels.create_png("ink", Size::new(3, 2)).unwrap();
        let copy = cels.copy(source, "ink").unwrap();

        let copy_name = cels.get(copy).unwrap().name().to_owned();
        assert!(copy_name.starts_with("ink-"));
        assert!(dir.join(format!("{copy_name}.png")).exists());
        assert_eq!(cels.get(copy).unwrap().size(), Size::new(3, 2));
        assert!(!cels.get(copy).unwrap().is_referenced());
        assert!(!cels.get(copy).unwrap().active());
        std::fs::remove_dir_all(dir).unwrap();
    }
    #[test]
    fn copying_a_suffixed_cel_does_not_stack_suffixes() {
        let (mut cels, _hub) = library();
        let _first = cels.create_stub("sky", Size::MIN);
        let second = cels.create_stub("sky", Size::MIN);
        let second_name = cels.get(second).unwrap().name().to_owned();

        let copy = cels.copy(second, &second_name).unwrap();
        let copy_name = cels.get(copy).unwrap().name().to_owned();
        // Stem "sky" is taken, so the copy is "sky-" + one suffix, not two.
        assert_eq!(copy_name.len(), "sky-".len() + SUFFIX_LEN);
        assert_ne!(copy_name, second_name);
    }
    #[test]
    fn activation_roundtrip_emits() {
        let dir = temp_dir("cels_activate");
        let hub = EventHub::new();
        let mut cels = CelLibrary::new(hub.clone(), dir.clone());
        let id = cels.create_png("ink", Size::MIN).unwrap();

        assert!(cels.activate(id));
        assert!(!cels.activate(id), "idempotent");
        assert!(cels.deactivate(id));
        let events = hub.poll();
        assert!(events.contains(&AnimationEvent::CelActivated(id)));
        assert!(events.contains(&AnimationEvent::CelDeactivated(id)));
        std::fs::remove_dir_all(dir).unwrap();
    }
    #[test]
    fn resize_reports_once() {
        let (mut cels, hub) = library();
        let id = cels.create_stub("sky", Size::new(2, 2));
        assert!(cels.resize(id, Size::new(5, 4)));
        assert!(!cels.resize(id, Size::new(5, 4)));
        let resizes = hub
            .poll()
            .into_iter()
            .filter(|e| matches!(e, AnimationEvent::CelResized { .. }))
            .count();
        assert_eq!(resizes, 1);
    }
}
