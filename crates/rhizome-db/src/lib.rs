//! Persistent object-graph store for plant-phenotyping records.
//!
//! A [`Database`] is rooted at one directory and holds two kinds of things:
//! records (farms, zones, scans, analyses, ...) stored as JSON envelopes, and
//! file records pointing at binary or JSON payloads under the data tree.
//! Opening a store loads everything and runs one restore pass that turns the
//! flat id references back into a live graph of shared handles.
//!
//! # Key Types
//!
//! - [`Database`] — open, lookup, select, store, and the file surface.
//! - [`Entity`] — the contract every record implements.
//! - [`AnyEntity`] — closed enum over all record kinds.
//! - [`Factory`] — classname-driven record construction.
//! - [`FileRecord`] — metadata for one stored payload.
//!
//! # Ownership
//!
//! The database index is the only strong owner of records. Every edge between
//! records is weak: forward references are [`Id`]-backed links, reverse
//! collections are rebuilt on restore and never serialized. Dropping the
//! database drops the graph.

mod database;
mod entity;
mod error;
mod factory;
mod files;
mod link;
mod model;
mod props;
mod state;
mod values;

pub use database::Database;
pub use entity::{AnyEntity, Entity, EntityCore, WeakEntity};
pub use error::{DbError, DbResult};
pub use factory::Factory;
pub use files::FileRecord;
pub use link::{Link, LinkSet, Shared};
pub use model::{
    Analysis, BiologicalMaterial, Camera, DataStream, Farm, Note, Observable, ObservationUnit,
    Person, Scan, ScanningDevice, Task, Unit, Zone,
};
pub use state::State;
pub use values::{ObservedVariable, Parameters, Sample, ScanPath, SoftwareModule};

pub use rhizome_types::{Envelope, Id, Properties};
pub use rhizome_vfs::VfsError;
