//! The record contract and the closed set of record kinds.
//!
//! Every stored record implements [`Entity`]: parse from and serialize to an
//! untyped property map, restore live references after a bulk load, and clone
//! into a detached copy. [`AnyEntity`] is the closed enum over all record
//! kinds; the database index and every polymorphic code path dispatch through
//! it rather than through trait objects.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rhizome_types::{Id, Properties};

use crate::database::Database;
use crate::error::{DbError, DbResult};
pub use crate::link::Shared;
use crate::model::{
    Analysis, BiologicalMaterial, Camera, DataStream, Farm, Note, ObservationUnit, Person, Scan,
    ScanningDevice, Zone,
};

/// Bookkeeping shared by every record: identity, database binding, and the
/// modified flag.
#[derive(Debug)]
pub struct EntityCore {
    id: Id,
    db: Weak<Database>,
    modified: bool,
}

impl EntityCore {
    /// A fresh core with a generated id, marked modified.
    pub(crate) fn new(db: Weak<Database>) -> Self {
        Self {
            id: Id::generate(),
            db,
            modified: true,
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    /// The database this record is bound to.
    pub fn database(&self) -> DbResult<Rc<Database>> {
        self.db.upgrade().ok_or(DbError::UnboundEntity)
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.modified = false;
    }

    /// Adopt the id carried in a property map, if any. An absent or empty
    /// `id` property means the generated id stands.
    pub(crate) fn take_id(&mut self, props: &Properties) -> DbResult<()> {
        let Some(value) = props.get("id") else {
            return Ok(());
        };
        let s = value.as_str().ok_or_else(|| DbError::InvalidField {
            key: "id".to_string(),
            expected: "string",
        })?;
        if !s.is_empty() {
            self.id = Id::parse(s).map_err(|_| DbError::InvalidField {
                key: "id".to_string(),
                expected: "non-empty string",
            })?;
        }
        Ok(())
    }

    /// Core for a detached copy: fresh id, same binding, marked modified.
    pub(crate) fn detached(&self) -> Self {
        Self {
            id: Id::generate(),
            db: self.db.clone(),
            modified: true,
        }
    }
}

/// The contract every stored record implements.
pub trait Entity {
    /// Type discriminator written into the record's envelope.
    const CLASSNAME: &'static str;

    fn core(&self) -> &EntityCore;
    fn core_mut(&mut self) -> &mut EntityCore;

    /// Populate the record from a property map. Unknown keys are ignored;
    /// missing required keys fail with [`DbError::MissingField`].
    fn parse(&mut self, props: &Properties) -> DbResult<()>;

    /// The record's fields as a flat, acyclic property map. References
    /// appear as id strings, never as nested live records.
    fn serialize(&self) -> Properties;

    /// Rewire live references after a load. `this` is the shared handle the
    /// index holds for this record; implementations may downgrade it into
    /// other records' reverse collections but must not borrow it.
    fn restore(&mut self, db: &Database, this: &Shared<Self>) -> DbResult<()>
    where
        Self: Sized,
    {
        let _ = (db, this);
        Ok(())
    }

    /// Sub-entities written along with this record on a recursive store.
    fn owned_children(&self) -> Vec<AnyEntity> {
        Vec::new()
    }

    /// A detached copy: fresh id, cleared references, marked modified, not
    /// registered in any index.
    fn clone_detached(&self) -> Self
    where
        Self: Sized;

    fn id(&self) -> &Id {
        self.core().id()
    }

    fn classname(&self) -> &'static str
    where
        Self: Sized,
    {
        Self::CLASSNAME
    }
}

/// Shared handle to a record of any kind.
///
/// Cloning an `AnyEntity` clones the handle, not the record.
#[derive(Clone, Debug)]
pub enum AnyEntity {
    Person(Shared<Person>),
    Camera(Shared<Camera>),
    ScanningDevice(Shared<ScanningDevice>),
    BiologicalMaterial(Shared<BiologicalMaterial>),
    Farm(Shared<Farm>),
    Zone(Shared<Zone>),
    ObservationUnit(Shared<ObservationUnit>),
    Scan(Shared<Scan>),
    Analysis(Shared<Analysis>),
    DataStream(Shared<DataStream>),
    Note(Shared<Note>),
}

/// Run `$body` with `$handle` bound to the variant's shared handle.
macro_rules! dispatch {
    ($any:expr, $handle:ident => $body:expr) => {
        match $any {
            AnyEntity::Person($handle) => $body,
            AnyEntity::Camera($handle) => $body,
            AnyEntity::ScanningDevice($handle) => $body,
            AnyEntity::BiologicalMaterial($handle) => $body,
            AnyEntity::Farm($handle) => $body,
            AnyEntity::Zone($handle) => $body,
            AnyEntity::ObservationUnit($handle) => $body,
            AnyEntity::Scan($handle) => $body,
            AnyEntity::Analysis($handle) => $body,
            AnyEntity::DataStream($handle) => $body,
            AnyEntity::Note($handle) => $body,
        }
    };
}

/// Like `dispatch!`, but rewraps the result in the same variant.
macro_rules! dispatch_rewrap {
    ($any:expr, $handle:ident => $body:expr) => {
        match $any {
            AnyEntity::Person($handle) => AnyEntity::Person($body),
            AnyEntity::Camera($handle) => AnyEntity::Camera($body),
            AnyEntity::ScanningDevice($handle) => AnyEntity::ScanningDevice($body),
            AnyEntity::BiologicalMaterial($handle) => AnyEntity::BiologicalMaterial($body),
            AnyEntity::Farm($handle) => AnyEntity::Farm($body),
            AnyEntity::Zone($handle) => AnyEntity::Zone($body),
            AnyEntity::ObservationUnit($handle) => AnyEntity::ObservationUnit($body),
            AnyEntity::Scan($handle) => AnyEntity::Scan($body),
            AnyEntity::Analysis($handle) => AnyEntity::Analysis($body),
            AnyEntity::DataStream($handle) => AnyEntity::DataStream($body),
            AnyEntity::Note($handle) => AnyEntity::Note($body),
        }
    };
}

/// Generate a typed accessor for one variant.
macro_rules! accessor {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        pub fn $fn_name(&self) -> Option<&Shared<$ty>> {
            match self {
                AnyEntity::$variant(handle) => Some(handle),
                _ => None,
            }
        }
    };
}

impl AnyEntity {
    pub fn id(&self) -> Id {
        dispatch!(self, h => h.borrow().core().id().clone())
    }

    pub fn classname(&self) -> &'static str {
        dispatch!(self, h => h.borrow().classname())
    }

    pub fn serialize(&self) -> Properties {
        dispatch!(self, h => h.borrow().serialize())
    }

    pub(crate) fn parse(&self, props: &Properties) -> DbResult<()> {
        dispatch!(self, h => h.borrow_mut().parse(props))
    }

    pub(crate) fn restore(&self, db: &Database) -> DbResult<()> {
        dispatch!(self, h => h.borrow_mut().restore(db, h))
    }

    pub fn owned_children(&self) -> Vec<AnyEntity> {
        dispatch!(self, h => h.borrow().owned_children())
    }

    /// Persist this record through the database it was constructed by.
    /// Fails with [`DbError::UnboundEntity`] when the binding is gone.
    pub fn store(&self, recursive: bool) -> DbResult<()> {
        let db = dispatch!(self, h => h.borrow().core().database())?;
        db.store(self, recursive)
    }

    pub fn is_modified(&self) -> bool {
        dispatch!(self, h => h.borrow().core().is_modified())
    }

    pub(crate) fn mark_clean(&self) {
        dispatch!(self, h => h.borrow_mut().core_mut().mark_clean())
    }

    /// A detached copy of the underlying record, wrapped in a fresh handle.
    pub fn clone_detached(&self) -> AnyEntity {
        dispatch_rewrap!(self, h => Rc::new(RefCell::new(h.borrow().clone_detached())))
    }

    pub fn downgrade(&self) -> WeakEntity {
        match self {
            AnyEntity::Person(h) => WeakEntity::Person(Rc::downgrade(h)),
            AnyEntity::Camera(h) => WeakEntity::Camera(Rc::downgrade(h)),
            AnyEntity::ScanningDevice(h) => WeakEntity::ScanningDevice(Rc::downgrade(h)),
            AnyEntity::BiologicalMaterial(h) => WeakEntity::BiologicalMaterial(Rc::downgrade(h)),
            AnyEntity::Farm(h) => WeakEntity::Farm(Rc::downgrade(h)),
            AnyEntity::Zone(h) => WeakEntity::Zone(Rc::downgrade(h)),
            AnyEntity::ObservationUnit(h) => WeakEntity::ObservationUnit(Rc::downgrade(h)),
            AnyEntity::Scan(h) => WeakEntity::Scan(Rc::downgrade(h)),
            AnyEntity::Analysis(h) => WeakEntity::Analysis(Rc::downgrade(h)),
            AnyEntity::DataStream(h) => WeakEntity::DataStream(Rc::downgrade(h)),
            AnyEntity::Note(h) => WeakEntity::Note(Rc::downgrade(h)),
        }
    }

    accessor!(as_person, Person, Person);
    accessor!(as_camera, Camera, Camera);
    accessor!(as_scanning_device, ScanningDevice, ScanningDevice);
    accessor!(as_biological_material, BiologicalMaterial, BiologicalMaterial);
    accessor!(as_farm, Farm, Farm);
    accessor!(as_zone, Zone, Zone);
    accessor!(as_observation_unit, ObservationUnit, ObservationUnit);
    accessor!(as_scan, Scan, Scan);
    accessor!(as_analysis, Analysis, Analysis);
    accessor!(as_datastream, DataStream, DataStream);
    accessor!(as_note, Note, Note);
}

/// Weak mirror of [`AnyEntity`], used for polymorphic references that must
/// not keep a record alive.
#[derive(Clone, Debug)]
pub enum WeakEntity {
    Person(Weak<RefCell<Person>>),
    Camera(Weak<RefCell<Camera>>),
    ScanningDevice(Weak<RefCell<ScanningDevice>>),
    BiologicalMaterial(Weak<RefCell<BiologicalMaterial>>),
    Farm(Weak<RefCell<Farm>>),
    Zone(Weak<RefCell<Zone>>),
    ObservationUnit(Weak<RefCell<ObservationUnit>>),
    Scan(Weak<RefCell<Scan>>),
    Analysis(Weak<RefCell<Analysis>>),
    DataStream(Weak<RefCell<DataStream>>),
    Note(Weak<RefCell<Note>>),
}

impl WeakEntity {
    pub fn upgrade(&self) -> Option<AnyEntity> {
        match self {
            WeakEntity::Person(w) => w.upgrade().map(AnyEntity::Person),
            WeakEntity::Camera(w) => w.upgrade().map(AnyEntity::Camera),
            WeakEntity::ScanningDevice(w) => w.upgrade().map(AnyEntity::ScanningDevice),
            WeakEntity::BiologicalMaterial(w) => w.upgrade().map(AnyEntity::BiologicalMaterial),
            WeakEntity::Farm(w) => w.upgrade().map(AnyEntity::Farm),
            WeakEntity::Zone(w) => w.upgrade().map(AnyEntity::Zone),
            WeakEntity::ObservationUnit(w) => w.upgrade().map(AnyEntity::ObservationUnit),
            WeakEntity::Scan(w) => w.upgrade().map(AnyEntity::Scan),
            WeakEntity::Analysis(w) => w.upgrade().map(AnyEntity::Analysis),
            WeakEntity::DataStream(w) => w.upgrade().map(AnyEntity::DataStream),
            WeakEntity::Note(w) => w.upgrade().map(AnyEntity::Note),
        }
    }
}
