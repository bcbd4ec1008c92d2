//! # Libraries
//! The two uniqueness-enforcing pools of a document. Each owns its objects
//! outright, keyed by id, with a name index on the side; everything else in
//! the document refers to pooled objects weakly by id and resolves through
//! the pool. Names are minted through [`crate::name::reserve`] so no two
//! live entries in one pool ever share one, and renames swap the index
//! atomically.
//!
//! Creation, rename, copy and destruction go through the pool; the pooled
//! object's own setters are crate-internal.

pub mod cels;
pub mod frames;
