//! Polymorphic record construction.
//!
//! The factory maps classnames to constructors through a static registry —
//! plain data, no reflection. Every record it builds is bound to the database
//! the factory belongs to, so a record can always reach its store through its
//! core.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rhizome_types::Properties;
use serde_json::Value;
use tracing::debug;

use crate::database::Database;
use crate::entity::{AnyEntity, EntityCore};
use crate::error::{DbError, DbResult};
use crate::model::{
    Analysis, BiologicalMaterial, Camera, DataStream, Farm, Note, ObservationUnit, Person, Scan,
    ScanningDevice, Zone,
};

type Constructor = fn(EntityCore) -> AnyEntity;

macro_rules! constructor {
    ($fn_name:ident, $variant:ident, $ty:ident) => {
        fn $fn_name(core: EntityCore) -> AnyEntity {
            AnyEntity::$variant(Rc::new(RefCell::new($ty::with_core(core))))
        }
    };
}

constructor!(new_person, Person, Person);
constructor!(new_camera, Camera, Camera);
constructor!(new_scanning_device, ScanningDevice, ScanningDevice);
constructor!(new_biological_material, BiologicalMaterial, BiologicalMaterial);
constructor!(new_farm, Farm, Farm);
constructor!(new_zone, Zone, Zone);
constructor!(new_observation_unit, ObservationUnit, ObservationUnit);
constructor!(new_scan, Scan, Scan);
constructor!(new_analysis, Analysis, Analysis);
constructor!(new_datastream, DataStream, DataStream);
constructor!(new_note, Note, Note);

/// Classname to constructor, one entry per storable record kind. Embedded
/// value objects are built by their holders and have no entry here.
const REGISTRY: &[(&str, Constructor)] = &[
    ("Person", new_person),
    ("Camera", new_camera),
    ("ScanningDevice", new_scanning_device),
    ("BiologicalMaterial", new_biological_material),
    ("Farm", new_farm),
    ("Zone", new_zone),
    ("ObservationUnit", new_observation_unit),
    ("Scan", new_scan),
    ("Analysis", new_analysis),
    ("DataStream", new_datastream),
    ("Note", new_note),
];

/// Builds records bound to one database.
pub struct Factory {
    db: Weak<Database>,
}

impl Factory {
    pub(crate) fn new(db: Weak<Database>) -> Self {
        Self { db }
    }

    /// Construct and parse a record of the given class.
    ///
    /// If the property map carries an `id`, the record adopts it (hydration);
    /// otherwise the freshly generated id stands. The record is not stored
    /// and not indexed until the database stores it.
    pub fn create(&self, classname: &str, props: &Properties) -> DbResult<AnyEntity> {
        let constructor = REGISTRY
            .iter()
            .find(|(name, _)| *name == classname)
            .map(|(_, constructor)| constructor)
            .ok_or_else(|| DbError::UnknownClass(classname.to_string()))?;
        let entity = constructor(EntityCore::new(self.db.clone()));
        entity.parse(props)?;
        debug!(classname, id = %entity.id(), "record constructed");
        Ok(entity)
    }

    /// Construct a record per element of a JSON array, in order.
    pub fn create_list(&self, classname: &str, items: &[Value]) -> DbResult<Vec<AnyEntity>> {
        items
            .iter()
            .map(|item| {
                let props = item.as_object().ok_or_else(|| DbError::InvalidField {
                    key: classname.to_string(),
                    expected: "array of objects",
                })?;
                self.create(classname, props)
            })
            .collect()
    }

    /// Whether a classname has a registered constructor.
    pub fn knows(&self, classname: &str) -> bool {
        REGISTRY.iter().any(|(name, _)| *name == classname)
    }
}
