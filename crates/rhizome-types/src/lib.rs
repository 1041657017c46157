//! Foundation types for the Rhizome record store.
//!
//! This crate provides the identifier, envelope, and property-map types used
//! throughout the Rhizome system. Every other Rhizome crate depends on
//! `rhizome-types`.
//!
//! # Key Types
//!
//! - [`Id`] — Opaque record identifier (random lowercase-alphanumeric string)
//! - [`Envelope`] — The on-disk JSON wrapper `{id, classname, value}` around a
//!   serialized record
//! - [`Properties`] — Untyped string-keyed property map, the currency of
//!   parse/serialize

pub mod envelope;
pub mod error;
pub mod id;

pub use envelope::Envelope;
pub use error::TypeError;
pub use id::Id;

/// Untyped string-keyed property map. Records are parsed from and serialized
/// to this shape; unknown keys are ignored, never preserved.
pub type Properties = serde_json::Map<String, serde_json::Value>;
