//! # Animation document
//! The aggregate root of one open document. It owns the exposure sheet, the
//! cel and frame pools, the frame pixel extent, the document timestamps and
//! the event hub they all share.
//!
//! Mutation flows through this type. The pools and the sheet keep their own
//! invariants, but anything that spans two of them (staging a cel into a
//! frame, scheduling a frame on the sheet, the destroy cascades) needs
//! borrows of both sides at once, and that seam lives here. Routing every
//! change through the document also keeps the modification timestamp honest:
//! an operation that changed something bumps [`Animation::updated`].
//!
//! Queries go straight to the owned structures via [`Animation::cels`],
//! [`Animation::frames`] and [`Animation::xsheet`].

use std::path::{Path, PathBuf};

use crate::cel::CelId;
use crate::cel_ref::CelRef;
use crate::event::{AnimationEvent, EventHub};
use crate::frame::{FrameId, Layer};
use crate::geom::{Size, Vec2};
use crate::library::cels::{CelError, CelLibrary};
use crate::library::frames::{FrameError, FrameLibrary};
use crate::raster::{RasterError, RgbaImage};
use crate::timed_frame::TimedFrame;
use crate::xsheet::{SeqSlot, XSheet};

#[derive(thiserror::Error, Debug)]
pub enum AnimationError {
    #[error("resource directory {} does not exist", .0.display())]
    MissingResourceDir(PathBuf),
    #[error("resource path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error(transparent)]
    Io(#[from] RasterError),
}

fn checked_dir(dir: PathBuf) -> Result<PathBuf, AnimationError> {
    if !dir.exists() {
        return Err(AnimationError::MissingResourceDir(dir));
    }
    if !dir.is_dir() {
        return Err(AnimationError::NotADirectory(dir));
    }
    Ok(dir)
}

#[derive(Debug)]
pub struct Animation {
    name: String,
    frame_size: Size,
    created: chrono::DateTime<chrono::Utc>,
    updated: chrono::DateTime<chrono::Utc>,
    xsheet: XSheet,
    cels: CelLibrary,
    frames: FrameLibrary,
    events: EventHub,
}

impl Animation {
    /// A fresh document. The resource directory must already exist; file
    /// backed cels will read and write `<dir>/<name>.png`.
    pub fn new(name: &str, frame_size: Size, resource_dir: PathBuf) -> Result<Self, AnimationError> {
        let resource_dir = checked_dir(resource_dir)?;
        let events = EventHub::new();
        let now = chrono::Utc::now();
        Ok(Self {
            name: name.to_owned(),
            frame_size,
            created: now,
            updated: now,
            xsheet: XSheet::new(events.clone()),
            cels: CelLibrary::new(events.clone(), resource_dir),
            frames: FrameLibrary::new(events.clone()),
            events,
        })
    }
    /// A document being rebuilt from persisted attributes, keeping its
    /// original timestamps (Unix seconds). Out-of-range stamps fall back to
    /// now. Content is rebuilt through the ordinary creation calls
    /// afterwards, resolving cross-references by name.
    pub fn reopened(
        name: &str,
        frame_size: Size,
        resource_dir: PathBuf,
        created: i64,
        updated: i64,
    ) -> Result<Self, AnimationError> {
        let mut animation = Self::new(name, frame_size, resource_dir)?;
        animation.created =
            chrono::DateTime::from_timestamp(created, 0).unwrap_or_else(chrono::Utc::now);
        animation.updated =
            chrono::DateTime::from_timestamp(updated, 0).unwrap_or_else(chrono::Utc::now);
        Ok(animation)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[must_use]
    pub fn frame_size(&self) -> Size {
        self.frame_size
    }
    #[must_use]
    pub fn created(&self) -> chrono::DateTime<chrono::Utc> {
        self.created
    }
    #[must_use]
    pub fn updated(&self) -> chrono::DateTime<chrono::Utc> {
        self.updated
    }
    #[must_use]
    pub fn created_unix(&self) -> i64 {
        self.created.timestamp()
    }
    #[must_use]
    pub fn updated_unix(&self) -> i64 {
        self.updated.timestamp()
    }
    /// A document is empty iff nothing is scheduled on its sheet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.xsheet.is_empty()
    }
    #[must_use]
    pub fn resource_dir(&self) -> &Path {
        self.cels.resource_dir()
    }
    #[must_use]
    pub fn cels(&self) -> &CelLibrary {
        &self.cels
    }
    #[must_use]
    pub fn frames(&self) -> &FrameLibrary {
        &self.frames
    }
    #[must_use]
    pub fn xsheet(&self) -> &XSheet {
        &self.xsheet
    }
    /// The hub all document events flow through. Subscribe or poll here.
    #[must_use]
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Mark the document modified now.
    pub fn touch(&mut self) {
        self.updated = chrono::Utc::now();
    }
    fn touched(&mut self, changed: bool) -> bool {
        if changed {
            self.touch();
        }
        changed
    }

    pub fn set_name(&mut self, name: &str) -> bool {
        if name == self.name {
            return false;
        }
        let from = std::mem::replace(&mut self.name, name.to_owned());
        self.events.emit(AnimationEvent::AnimationRenamed {
            from,
            to: self.name.clone(),
        });
        self.touch();
        true
    }
    pub fn set_frame_size(&mut self, size: Size) -> bool {
        if size == self.frame_size {
            return false;
        }
        self.frame_size = size;
        self.events.emit(AnimationEvent::FrameSizeChanged(size));
        self.touch();
        true
    }
    pub fn set_fps(&mut self, fps: u32) -> bool {
        let changed = self.xsheet.set_fps(fps);
        self.touched(changed)
    }
    /// Point file-backed cels at another directory. The new directory must
    /// exist; nothing is moved, the host migrates files beforehand with
    /// [`Self::copy_resources_to`] and each cel's
    /// [`crate::cel::Cel::file_resources`].
    pub fn set_resource_dir(&mut self, dir: PathBuf) -> Result<(), AnimationError> {
        let dir = checked_dir(dir)?;
        if dir.as_path() == self.cels.resource_dir() {
            return Ok(());
        }
        self.cels.set_resource_dir(dir.clone());
        self.events.emit(AnimationEvent::ResourceDirChanged(dir));
        self.touch();
        Ok(())
    }
    /// Copy every cel's backing files into `dir` (host save-as flows). Cels
    /// holding unsaved pixels are persisted first so the copies are current.
    /// Stops at the first file that fails.
    pub fn copy_resources_to(&self, dir: &Path) -> Result<(), AnimationError> {
        let dir = checked_dir(dir.to_owned())?;
        for cel in self.cels.iter() {
            cel.save(self.cels.resource_dir())?;
            for file in cel.file_resources() {
                crate::raster::copy_file(
                    &self.cels.resource_dir().join(&file),
                    &dir.join(&file),
                )?;
            }
        }
        Ok(())
    }
}

/// Cel pool commands.
impl Animation {
    pub fn create_stub_cel(&mut self, name: &str, size: Size) -> CelId {
        let id = self.cels.create_stub(name, size);
        self.touch();
        id
    }
    pub fn create_png_cel(&mut self, name: &str, size: Size) -> Result<CelId, CelError> {
        let id = self.cels.create_png(name, size)?;
        self.touch();
        Ok(id)
    }
    pub fn adopt_png_cel(&mut self, name: &str) -> Result<CelId, CelError> {
        let id = self.cels.adopt_png(name)?;
        self.touch();
        Ok(id)
    }
    pub fn rename_cel(&mut self, cel: CelId, name: &str) -> Result<bool, CelError> {
        let renamed = self.cels.rename(cel, name)?;
        Ok(self.touched(renamed))
    }
    pub fn copy_cel(&mut self, cel: CelId, name: &str) -> Result<CelId, CelError> {
        let copy = self.cels.copy(cel, name)?;
        self.touch();
        Ok(copy)
    }
    pub fn resize_cel(&mut self, cel: CelId, size: Size) -> bool {
        let resized = self.cels.resize(cel, size);
        self.touched(resized)
    }
    pub fn resize_cel_with_offset(&mut self, cel: CelId, offset: (i32, i32), size: Size) -> bool {
        let resized = self.cels.resize_with_offset(cel, offset, size);
        self.touched(resized)
    }
    /// Activation moves pixels in and out of memory without changing the
    /// document, so neither direction touches the modification stamp.
    pub fn activate_cel(&mut self, cel: CelId) -> bool {
        self.cels.activate(cel)
    }
    pub fn deactivate_cel(&mut self, cel: CelId) -> bool {
        self.cels.deactivate(cel)
    }
    pub fn mark_cel_removed(&mut self, cel: CelId, should_delete: bool) -> bool {
        let marked = self.cels.mark_removed(cel, should_delete);
        self.touched(marked)
    }
    /// Destroy a cel. Every placement pointing at it, staged anywhere, is
    /// detached first and stays behind as an empty layer; a backing file
    /// flagged for deletion is deleted now.
    pub fn destroy_cel(&mut self, cel: CelId) -> bool {
        if self.cels.get(cel).is_none() {
            log::warn!("destroy skipped, {cel} is gone");
            return false;
        }
        for frame in self.frames.iter_mut() {
            frame.clear_refs_to(cel);
        }
        self.cels.destroy(cel);
        self.touch();
        true
    }
}

/// Frame pool commands.
impl Animation {
    pub fn create_frame(&mut self, name: &str) -> FrameId {
        let id = self.frames.create(name);
        self.touch();
        id
    }
    pub fn rename_frame(&mut self, frame: FrameId, name: &str) -> Result<bool, FrameError> {
        let renamed = self.frames.rename(frame, name)?;
        Ok(self.touched(renamed))
    }
    pub fn copy_frame(&mut self, frame: FrameId, name: &str) -> Result<FrameId, FrameError> {
        let copy = self.frames.copy_frame(&mut self.cels, frame, name)?;
        self.touch();
        Ok(copy)
    }
    pub fn activate_frame(&mut self, frame: FrameId) -> bool {
        let Some(frame) = self.frames.get_mut(frame) else {
            log::warn!("activate skipped, {frame} is gone");
            return false;
        };
        frame.activate(&mut self.cels)
    }
    pub fn deactivate_frame(&mut self, frame: FrameId) -> bool {
        let Some(frame) = self.frames.get_mut(frame) else {
            log::warn!("deactivate skipped, {frame} is gone");
            return false;
        };
        frame.deactivate(&mut self.cels)
    }
    /// Composite a frame's drawing at the document's frame size.
    #[must_use]
    pub fn render_frame(&self, frame: FrameId) -> Option<RgbaImage> {
        Some(self.frames.get(frame)?.render(&self.cels, self.frame_size))
    }
    /// Persist every cel staged in a frame, logging per-cel failures.
    pub fn save_frame_cels(&self, frame: FrameId) {
        if let Some(frame) = self.frames.get(frame) {
            frame.save_cels(&self.cels);
        }
    }
    /// Flag every cel staged in a frame for file deletion (or clear it).
    pub fn mark_frame_cels_removed(&mut self, frame: FrameId, should_delete: bool) -> bool {
        let Some(frame) = self.frames.get(frame) else {
            log::warn!("mark skipped, {frame} is gone");
            return false;
        };
        frame.mark_cels_removed(&mut self.cels, should_delete);
        self.touch();
        true
    }
    /// Destroy a frame. It is deactivated, its placements are released from
    /// their cels, and timeline entries scheduling it are emptied in place;
    /// the sheet keeps their ticks.
    pub fn destroy_frame(&mut self, frame: FrameId) -> bool {
        if self.frames.get(frame).is_none() {
            log::warn!("destroy skipped, {frame} is gone");
            return false;
        }
        self.deactivate_frame(frame);
        if let Some(frame) = self.frames.get_mut(frame) {
            for cel_ref in frame.take_refs() {
                cel_ref.release(&mut self.cels);
            }
        }
        self.xsheet.clear_entries_of(frame);
        self.frames.destroy(frame);
        self.touch();
        true
    }
}

/// Staging and timeline commands.
impl Animation {
    /// Stage a cel into a frame at the given layer. An active frame brings
    /// the cel up immediately.
    pub fn stage_cel(&mut self, frame: FrameId, cel: CelId, at: Layer) -> bool {
        if self.cels.get(cel).is_none() {
            log::warn!("stage skipped, {cel} is gone");
            return false;
        }
        let Some(frame) = self.frames.get_mut(frame) else {
            log::warn!("stage skipped, {frame} is gone");
            return false;
        };
        let cel_ref = CelRef::new(&mut self.cels, cel);
        frame.add_cel(&mut self.cels, cel_ref, at);
        self.touch();
        true
    }
    /// Unstage the placement at the given layer and release it. The cel
    /// itself stays in the pool.
    pub fn unstage_cel(&mut self, frame: FrameId, at: Layer) -> bool {
        let Some(frame) = self.frames.get_mut(frame) else {
            log::warn!("unstage skipped, {frame} is gone");
            return false;
        };
        let Some(removed) = frame.remove_cel(at) else {
            return false;
        };
        removed.release(&mut self.cels);
        self.touch();
        true
    }
    pub fn restack_cel(&mut self, frame: FrameId, from: Layer, to: Layer) -> bool {
        let Some(frame) = self.frames.get_mut(frame) else {
            log::warn!("restack skipped, {frame} is gone");
            return false;
        };
        let moved = frame.move_cel(from, to);
        self.touched(moved)
    }
    pub fn set_cel_pos(&mut self, frame: FrameId, at: usize, pos: Vec2) -> bool {
        let Some(frame) = self.frames.get_mut(frame) else {
            return false;
        };
        let moved = frame.set_cel_pos(at, pos);
        self.touched(moved)
    }
    pub fn move_cel_by(&mut self, frame: FrameId, at: usize, dx: f32, dy: f32) -> bool {
        let Some(frame) = self.frames.get_mut(frame) else {
            return false;
        };
        let moved = frame.move_cel_by(at, dx, dy);
        self.touched(moved)
    }
    pub fn set_cel_show_info(&mut self, frame: FrameId, at: usize, show: bool) -> bool {
        let Some(frame) = self.frames.get_mut(frame) else {
            return false;
        };
        let changed = frame.set_cel_show_info(at, show);
        self.touched(changed)
    }

    /// Schedule a frame on the sheet, held for `hold` ticks, at the given
    /// slot. Registers the timeline entry with the frame.
    pub fn schedule_frame(&mut self, frame: FrameId, hold: u32, at: SeqSlot) -> bool {
        if self.frames.get(frame).is_none() {
            log::warn!("schedule skipped, {frame} is gone");
            return false;
        }
        let entry = TimedFrame::new(&mut self.frames, frame, hold);
        match self.xsheet.add_frame(entry, at) {
            Ok(()) => {
                self.touch();
                true
            }
            Err(entry) => {
                entry.release(&mut self.frames);
                false
            }
        }
    }
    /// Unschedule the entry owning the given slot, returning the frame it
    /// placed (when that frame still exists). The frame itself stays in the
    /// pool.
    pub fn unschedule_frame(&mut self, at: SeqSlot) -> Option<FrameId> {
        let entry = self.xsheet.remove_frame(at)?;
        let frame = entry.frame_id();
        entry.release(&mut self.frames);
        self.touch();
        frame
    }
    pub fn move_scheduled_frame(&mut self, at: u32, to: u32) -> bool {
        let moved = self.xsheet.move_frame(at, to);
        self.touched(moved)
    }
    pub fn set_hold(&mut self, at: u32, hold: u32) -> bool {
        let changed = self.xsheet.set_hold(at, hold);
        self.touched(changed)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
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
    fn document(dir: &Path) -> Animation {
        Animation::new("walk", Size::new(8, 6), dir.to_owned()).unwrap()
    }

    #[test]
    fn resource_dir_must_be_a_directory() {
        let missing = std::env::temp_dir().join("pegbar_definitely_not_here");
        assert!(matches!(
            Animation::new("walk", Size::MIN, missing),
            Err(AnimationError::MissingResourceDir(_))
        ));

        let dir = temp_dir("not_a_dir");
        let file = dir.join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            Animation::new("walk", Size::MIN, file),
            Err(AnimationError::NotADirectory(_))
        ));
        std::fs::remove_dir_all(dir).unwrap();
    }
    #[test]
    fn fresh_document_is_empty() {
        let dir = temp_dir("fresh");
        let animation = document(&dir);
        assert_eq!(animation.name(), "walk");
        assert_eq!(animation.frame_size(), Size::new(8, 6));
        assert_eq!(animation.xsheet().fps(), crate::xsheet::DEFAULT_FPS);
        assert!(animation.is_empty());
        assert!(animation.cels().is_empty());
        assert!(animation.frames().is_empty());
        assert_eq!(animation.resource_dir(), dir.as_path());
        std::fs::remove_dir_all(dir).unwrap();
    }
    #[test]
    fn reopened_documents_keep_their_stamps() {
        let dir = temp_dir("stamps");
        let mut animation =
            Animation::reopened("walk", Size::MIN, dir.clone(), 1_000_000, 2_000_000).unwrap();
        assert_eq!(animation.created_unix(), 1_000_000);
        assert_eq!(animation.updated_unix(), 2_000_000);

        assert!(animation.set_fps(12));
        assert!(animation.updated_unix() > 2_000_000, "mutation touches");
        assert_eq!(animation.created_unix(), 1_000_000);

        // Rejected mutations do not touch.
        let updated = animation.updated();
        assert!(!animation.set_fps(12));
        assert!(!animation.set_frame_size(Size::MIN));
        assert!(!animation.set_name("walk"));
        assert_eq!(animation.updated(), updated);
        std::fs::remove_dir_all(dir).unwrap();
    }
    #[test]
    fn document_settings_notify() {
        let dir = temp_dir("settings");
        let mut animation = document(&dir);
        let hub = animation.events().clone();

        assert!(animation.set_name("run"));
        assert!(animation.set_frame_size(Size::new(16, 9)));
        assert!(animation.set_fps(12));
        let other = temp_dir("settings_other");
        animation.set_resource_dir(other.clone()).unwrap();

        let events = hub.poll();
        assert!(events.iter().any(|e| matches!(
            e,
            AnimationEvent::AnimationRenamed { from, to } if from == "walk" && to == "run"
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, AnimationEvent::FrameSizeChanged(s) if *s == Size::new(16, 9))));
        assert!(events
            .iter()
            .any(|e| matches!(e, AnimationEvent::FpsChanged(12))));
        assert!(events
            .iter()
            .any(|e| matches!(e, AnimationEvent::ResourceDirChanged(p) if *p == other)));
        assert_eq!(animation.resource_dir(), other.as_path());
        std::fs::remove_dir_all(dir).unwrap();
        std::fs::remove_dir_all(other).unwrap();
    }
    #[test]
    fn staging_and_scheduling_fill_the_document() {
        let dir = temp_dir("build");
        let mut animation = document(&dir);
        let ink = animation.create_stub_cel("ink", Size::MIN);
        let paint = animation.create_stub_cel("paint", Size::MIN);
        let key = animation.create_frame("key");

        assert!(animation.stage_cel(key, ink, Layer::Top));
        assert!(animation.stage_cel(key, paint, Layer::Top));
        assert_eq!(animation.frames().get(key).unwrap().len(), 2);

        assert!(animation.schedule_frame(key, 3, SeqSlot::End));
        assert!(animation.schedule_frame(key, 2, SeqSlot::End));
        assert!(!animation.is_empty());
        assert_eq!(animation.xsheet().seq_length(), 5);
        assert_eq!(animation.frames().get(key).unwrap().timed_frames().len(), 2);

        let rendered = animation.render_frame(key).unwrap();
        assert_eq!(rendered.width(), 8);
        assert_eq!(rendered.height(), 6);

        assert_eq!(animation.unschedule_frame(SeqSlot::At(4)), Some(key));
        assert_eq!(animation.xsheet().seq_length(), 3);
        assert_eq!(animation.frames().get(key).unwrap().timed_frames().len(), 1);
        std::fs::remove_dir_all(dir).unwrap();
    }
    #[test]
    fn scheduling_a_dead_frame_rejects() {
        let dir = temp_dir("dead_schedule");
        let mut animation = document(&dir);
        let key = animation.create_frame("key");
        animation.destroy_frame(key);
        assert!(!animation.schedule_frame(key, 2, SeqSlot::End));
        assert!(animation.is_empty());

        // A rejected slot hands the registration back too.
        let other = animation.create_frame("other");
        assert!(!animation.schedule_frame(other, 2, SeqSlot::At(0)));
        assert!(!animation.frames().get(other).unwrap().is_scheduled());
        std::fs::remove_dir_all(dir).unwrap();
    }
    #[test]
    fn destroying_a_cel_detaches_its_placements() {
        let dir = temp_dir("destroy_cel");
        let mut animation = document(&dir);
        let ink = animation.create_stub_cel("ink", Size::MIN);
        let key = animation.create_frame("key");
        let extreme = animation.create_frame("extreme");
        assert!(animation.stage_cel(key, ink, Layer::Top));
        assert!(animation.stage_cel(extreme, ink, Layer::Top));

        assert!(animation.destroy_cel(ink));
        assert!(animation.cels().get(ink).is_none());
        for frame in [key, extreme] {
            let frame = animation.frames().get(frame).unwrap();
            assert_eq!(frame.len(), 1, "placement stays as an empty layer");
            assert!(!frame.cels()[0].has_cel(animation.cels()));
        }
        // The empty placement renders to nothing rather than breaking.
        assert!(animation.render_frame(key).is_some());
        std::fs::remove_dir_all(dir).unwrap();
    }
    #[test]
    fn destroying_a_frame_detaches_schedule_and_cels() {
        let dir = temp_dir("destroy_frame");
        let mut animation = document(&dir);
        let ink = animation.create_stub_cel("ink", Size::MIN);
        let key = animation.create_frame("key");
        assert!(animation.stage_cel(key, ink, Layer::Top));
        assert!(animation.schedule_frame(key, 3, SeqSlot::End));
        assert!(animation.activate_frame(key));
        assert!(animation.cels().get(ink).unwrap().active());

        assert!(animation.destroy_frame(key));
        assert!(animation.frames().get(key).is_none());
        // The cel came down and lost its placement, but survives.
        let ink = animation.cels().get(ink).unwrap();
        assert!(!ink.active());
        assert!(!ink.is_referenced());
        // The timeline entry stays, now placing nothing.
        assert_eq!(animation.xsheet().len(), 1);
        assert_eq!(animation.xsheet().frames()[0].frame_id(), None);
        assert_eq!(animation.xsheet().seq_length(), 3);
        std::fs::remove_dir_all(dir).unwrap();
    }
    #[test]
    fn copy_resources_carries_the_files() {
        let dir = temp_dir("copy_src");
        let target = temp_dir("copy_target");
        let mut animation = document(&dir);
        animation.create_png_cel("ink", Size::MIN).unwrap();
        animation.create_png_cel("paint", Size::MIN).unwrap();
        animation.create_stub_cel("empty", Size::MIN);

        animation.copy_resources_to(&target).unwrap();
        assert!(target.join("ink.png").exists());
        assert!(target.join("paint.png").exists());

        let missing = std::env::temp_dir().join("pegbar_definitely_not_here");
        assert!(animation.copy_resources_to(&missing).is_err());
        std::fs::remove_dir_all(dir).unwrap();
        std::fs::remove_dir_all(target).unwrap();
    }
    #[test]
    fn staging_commands_reach_the_frame() {
        let dir = temp_dir("staging");
        let mut animation = document(&dir);
        let a = animation.create_stub_cel("a", Size::MIN);
        let b = animation.create_stub_cel("b", Size::MIN);
        let key = animation.create_frame("key");
        assert!(animation.stage_cel(key, a, Layer::Top));
        assert!(animation.stage_cel(key, b, Layer::Top));

        assert!(animation.set_cel_pos(key, 0, Vec2::new(2.0, 1.0)));
        assert!(animation.move_cel_by(key, 0, 1.0, 0.0));
        assert!(animation.set_cel_show_info(key, 0, true));
        assert!(animation.restack_cel(key, Layer::Top, Layer::Bottom));

        let frame = animation.frames().get(key).unwrap();
        assert_eq!(frame.cels()[0].cel_id(), Some(a));
        assert_eq!(frame.cels()[1].pos(), Vec2::new(3.0, 1.0));

        assert!(animation.unstage_cel(key, Layer::Bottom));
        assert_eq!(animation.frames().get(key).unwrap().len(), 1);
        assert!(!animation.cels().get(b).unwrap().is_referenced());
        std::fs::remove_dir_all(dir).unwrap();
    }
}
