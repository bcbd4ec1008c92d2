//! Document model for a 2D cel animation tool: uniquely named pools of
//! reusable cels and frames, layered placements inside each frame, and an
//! exposure sheet mapping held frames onto a contiguous tick timeline.
//! Hosts (GUI, persistence, export) drive it through [`animation::Animation`]
//! and observe changes through [`event::EventHub`].

pub mod animation;
pub mod cel;
pub mod cel_ref;
pub mod event;
pub mod frame;
pub mod geom;
pub mod id;
pub mod library;
pub mod name;
pub mod raster;
pub mod timed_frame;
pub mod xsheet;
