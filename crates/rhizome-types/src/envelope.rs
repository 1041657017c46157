use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::Id;

/// The on-disk JSON wrapper around a serialized record.
///
/// Every record in the object tree is stored as one envelope per file, keyed
/// by id: `objects/<id>.json`. The `classname` tag drives factory dispatch on
/// load; `value` holds the record's own serialized fields as a flat, acyclic
/// property map — relationships appear as id strings, never as nested live
/// records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The record's identifier; must match the id inside `value`.
    pub id: Id,
    /// Type discriminator used to pick a constructor on load.
    pub classname: String,
    /// The record's serialized fields.
    pub value: Value,
}

impl Envelope {
    /// Wrap a serialized record.
    pub fn new(id: Id, classname: impl Into<String>, value: Value) -> Self {
        Self {
            id,
            classname: classname.into(),
            value,
        }
    }
}
