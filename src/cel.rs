//! # Cels
//! A cel is one named, reusable visual unit: a sheet of pixels that frames
//! place any number of times. The base kind is a blank stub; the file-backed
//! kind owns `<resource dir>/<name>.png` on disk and only holds pixels in
//! memory while active. Names are unique per document and managed by the
//! [`crate::library::cels::CelLibrary`], which is the only way to create,
//! rename, copy, or destroy one.
//!
//! Memory/disk duality: an active file-backed cel holds its image in memory
//! (edits accumulate there); deactivating persists the image and releases it.
//! A cel never sits inactive while holding pixels.

use crate::cel_ref::CelRefId;
use crate::geom::Size;
use crate::id::PegId;
use crate::name::NameFlags;
use crate::raster;

pub type CelId = PegId<Cel>;

/// What backs a cel's pixels.
#[derive(Debug, strum::AsRefStr)]
pub enum CelKind {
    /// Nothing; the cel reads as a blank canvas. Placeholder drawings.
    #[strum(serialize = "stub")]
    Stub,
    /// A PNG file in the document's resource directory.
    #[strum(serialize = "png")]
    Png(PngCel),
}

/// File-backed state. The image is `Some` exactly while the cel is active.
pub struct PngCel {
    pixmap: Option<raster::RgbaImage>,
    /// Deferred deletion: the backing file is removed when the cel is
    /// destroyed, never before.
    delete_file: bool,
}

impl std::fmt::Debug for PngCel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PngCel")
            .field("loaded", &self.pixmap.is_some())
            .field("delete_file", &self.delete_file)
            .finish()
    }
}

#[derive(Debug)]
pub struct Cel {
    id: CelId,
    name: String,
    name_flags: NameFlags,
    size: Size,
    active: bool,
    /// Placements currently pointing at this cel, across all frames and
    /// detached refs. Almost always exactly one.
    refs: smallvec::SmallVec<[CelRefId; 2]>,
    kind: CelKind,
}

impl Cel {
    /// A stub cel. Name must already be reserved by the library.
    pub(crate) fn stub(name: String, name_flags: NameFlags, size: Size) -> Self {
        Self {
            id: CelId::next(),
            name,
            name_flags,
            size,
            active: false,
            refs: smallvec::SmallVec::new(),
            kind: CelKind::Stub,
        }
    }
    /// A file-backed cel with no pixels yet: writes a blank transparent PNG
    /// at its path so the file exists from the moment the name is reserved.
    pub(crate) fn png_blank(
        name: String,
        name_flags: NameFlags,
        size: Size,
        resource_dir: &std::path::Path,
    ) -> Result<Self, raster::RasterError> {
        let cel = Self {
            id: CelId::next(),
            name,
            name_flags,
            size,
            active: false,
            refs: smallvec::SmallVec::new(),
            kind: CelKind::Png(PngCel {
                pixmap: None,
                delete_file: false,
            }),
        };
        raster::write_blank_png(&cel.png_path(resource_dir), size)?;
        Ok(cel)
    }
    /// Adopt an existing PNG; the extent comes from the decoded file.
    /// Used when a document is reopened.
    pub(crate) fn png_from_file(
        name: String,
        name_flags: NameFlags,
        resource_dir: &std::path::Path,
    ) -> Result<Self, raster::RasterError> {
        let mut cel = Self {
            id: CelId::next(),
            name,
            name_flags,
            size: Size::MIN,
            active: false,
            refs: smallvec::SmallVec::new(),
            kind: CelKind::Png(PngCel {
                pixmap: None,
                delete_file: false,
            }),
        };
        let image = raster::load_png(&cel.png_path(resource_dir))?;
        cel.size = Size::new(image.width(), image.height());
        Ok(cel)
    }
    /// A file-backed duplicate of `source`: same extent, same pixels written
    /// under the new name, same deletion mark. Starts inactive with no
    /// placements.
    pub(crate) fn png_copy_of(
        name: String,
        name_flags: NameFlags,
        source: &Cel,
        resource_dir: &std::path::Path,
    ) -> Result<Self, raster::RasterError> {
        let delete_file = match &source.kind {
            CelKind::Stub => false,
            CelKind::Png(png) => png.delete_file,
        };
        let cel = Self {
            id: CelId::next(),
            name,
            name_flags,
            size: source.size,
            active: false,
            refs: smallvec::SmallVec::new(),
            kind: CelKind::Png(PngCel {
                pixmap: None,
                delete_file,
            }),
        };
        raster::save_png(&source.image(resource_dir), &cel.png_path(resource_dir))?;
        Ok(cel)
    }

    #[must_use]
    pub fn id(&self) -> CelId {
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
    pub fn size(&self) -> Size {
        self.size
    }
    #[must_use]
    pub fn width(&self) -> u32 {
        self.size.width()
    }
    #[must_use]
    pub fn height(&self) -> u32 {
        self.size.height()
    }
    #[must_use]
    pub fn active(&self) -> bool {
        self.active
    }
    #[must_use]
    pub fn kind(&self) -> &CelKind {
        &self.kind
    }
    /// Persistence type tag: `"stub"` or `"png"`.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            CelKind::Stub => "stub",
            CelKind::Png(_) => "png",
        }
    }
    #[must_use]
    pub fn is_file_backed(&self) -> bool {
        matches!(self.kind, CelKind::Png(_))
    }
    /// Every placement currently using this cel.
    #[must_use]
    pub fn cel_refs(&self) -> &[CelRefId] {
        &self.refs
    }
    #[must_use]
    pub fn is_referenced(&self) -> bool {
        !self.refs.is_empty()
    }
    /// Whether the backing file is flagged for deletion at destruction.
    #[must_use]
    pub fn to_be_removed(&self) -> bool {
        match &self.kind {
            CelKind::Stub => false,
            CelKind::Png(png) => png.delete_file,
        }
    }
    /// Filenames under the resource directory this cel depends on. Empty for
    /// stubs. Hosts use this to migrate files when the directory changes.
    #[must_use]
    pub fn file_resources(&self) -> Vec<String> {
        match self.kind {
            CelKind::Stub => Vec::new(),
            CelKind::Png(_) => vec![format!("{}.png", self.name)],
        }
    }
    pub(crate) fn png_path(&self, resource_dir: &std::path::Path) -> std::path::PathBuf {
        resource_dir.join(format!("{}.png", self.name))
    }

    /// The cel's current pixels, as a fresh owned canvas. A stub is blank; an
    /// inactive file-backed cel reads its file transiently (no state change);
    /// an unreadable file degrades to blank so drawing code stays total.
    #[must_use]
    pub fn image(&self, resource_dir: &std::path::Path) -> raster::RgbaImage {
        match &self.kind {
            CelKind::Stub => raster::blank(self.size),
            CelKind::Png(png) => match &png.pixmap {
                Some(pixmap) => pixmap.clone(),
                None => match raster::load_png(&self.png_path(resource_dir)) {
                    Ok(image) => image,
                    Err(err) => {
                        log::warn!("cel '{}': transient read failed: {err}", self.name);
                        raster::blank(self.size)
                    }
                },
            },
        }
    }

    /// Flag (or unflag) the backing file for deletion when this cel is
    /// destroyed. Meaningless for stubs.
    pub fn remove(&mut self, should_delete: bool) {
        match &mut self.kind {
            CelKind::Stub => {}
            CelKind::Png(png) => png.delete_file = should_delete,
        }
    }

    // Mutations below are reached through the owning library or the staging
    // cascade, which emit the matching events.

    /// Returns whether a transition happened. For the file-backed kind the
    /// image is loaded first; a failed load is reported and the cel comes up
    /// active but blank.
    pub(crate) fn activate(&mut self, resource_dir: &std::path::Path) -> bool {
        if self.active {
            return false;
        }
        let path = self.png_path(resource_dir);
        if let CelKind::Png(png) = &mut self.kind {
            if png.pixmap.is_none() {
                match raster::load_png(&path) {
                    Ok(image) => png.pixmap = Some(image),
                    Err(err) => log::error!("cel '{}': load failed: {err}", self.name),
                }
            }
        }
        self.active = true;
        log::debug!("cel '{}' activated", self.name);
        true
    }
    /// Returns whether a transition happened. The file-backed kind persists
    /// its image first; if that write fails the cel stays active (and keeps
    /// its pixels) so nothing is lost silently.
    pub(crate) fn deactivate(&mut self, resource_dir: &std::path::Path) -> bool {
        if !self.active {
            return false;
        }
        let path = self.png_path(resource_dir);
        if let CelKind::Png(png) = &mut self.kind {
            if let Some(pixmap) = &png.pixmap {
                if let Err(err) = raster::save_png(pixmap, &path) {
                    log::error!("cel '{}': save failed, staying active: {err}", self.name);
                    return false;
                }
                png.pixmap = None;
            }
        }
        self.active = false;
        log::debug!("cel '{}' deactivated", self.name);
        true
    }
    /// Persist in-memory pixels without deactivating. No-op when inactive or
    /// not file-backed.
    pub(crate) fn save(&self, resource_dir: &std::path::Path) -> Result<(), raster::RasterError> {
        if let CelKind::Png(png) = &self.kind {
            if let Some(pixmap) = &png.pixmap {
                raster::save_png(pixmap, &self.png_path(resource_dir))?;
            }
        }
        Ok(())
    }

    /// Change extent, placing the previous content at `(x, y)` of the new
    /// canvas. No-op (returns false) when the extent is unchanged or, for an
    /// inactive file-backed cel, when rewriting the file fails.
    pub(crate) fn resize(
        &mut self,
        offset: (i32, i32),
        size: Size,
        resource_dir: &std::path::Path,
    ) -> bool {
        if size == self.size {
            return false;
        }
        let at = crate::geom::Vec2::new(offset.0 as f32, offset.1 as f32);
        match &mut self.kind {
            CelKind::Stub => {}
            CelKind::Png(png) => match &png.pixmap {
                Some(old) => {
                    let mut canvas = raster::blank(size);
                    raster::composite(&mut canvas, old, at);
                    png.pixmap = Some(canvas);
                }
                None => {
                    let path = self.png_path(resource_dir);
                    let old = match raster::load_png(&path) {
                        Ok(image) => image,
                        Err(err) => {
                            log::warn!("cel '{}': resize reads blank: {err}", self.name);
                            raster::blank(self.size)
                        }
                    };
                    let mut canvas = raster::blank(size);
                    raster::composite(&mut canvas, &old, at);
                    if let Err(err) = raster::save_png(&canvas, &path) {
                        log::error!("cel '{}': resize not applied: {err}", self.name);
                        return false;
                    }
                }
            },
        }
        self.size = size;
        true
    }

    pub(crate) fn set_name(&mut self, name: String, name_flags: NameFlags) {
        self.name = name;
        self.name_flags = name_flags;
    }
    pub(crate) fn register_ref(&mut self, id: CelRefId) {
        self.refs.push(id);
    }
    pub(crate) fn unregister_ref(&mut self, id: CelRefId) {
        if let Some(found) = self.refs.iter().position(|r| *r == id) {
            self.refs.swap_remove(found);
        }
    }
    /// Release disk state ahead of record removal: marked cels lose their
    /// file, unmarked active cels persist their pixels. Memory is dropped
    /// either way.
    pub(crate) fn destroy_resources(&mut self, resource_dir: &std::path::Path) {
        self.active = false;
        let path = self.png_path(resource_dir);
        if let CelKind::Png(png) = &mut self.kind {
            if png.delete_file {
                png.pixmap = None;
                if let Err(err) = raster::remove_file(&path) {
                    log::warn!("cel '{}': backing file not deleted: {err}", self.name);
                }
            } else if let Some(pixmap) = png.pixmap.take() {
                if let Err(err) = raster::save_png(&pixmap, &path) {
                    log::error!("cel '{}': final save failed: {err}", self.name);
                }
            }
        }
    }
}
