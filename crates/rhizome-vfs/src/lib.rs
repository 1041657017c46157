//! Virtual-filesystem layer for the Rhizome record store.
//!
//! A [`StoreFs`] owns a base directory with three trees:
//!
//! - `objects/` — one JSON envelope per record, keyed by id
//! - `files/` — one JSON metadata document per stored payload, keyed by file id
//! - `data/` — raw payload bytes or text, keyed by the relative path recorded
//!   in the owning file metadata
//!
//! The layer is deliberately dumb: it lists, reads, and writes documents and
//! payloads, creates missing parent directories on write, and reports missing
//! reads as [`VfsError::NotFound`]. It never interprets record contents.

pub mod error;
pub mod fs;

pub use error::{VfsError, VfsResult};
pub use fs::{StoreFs, Tree};
