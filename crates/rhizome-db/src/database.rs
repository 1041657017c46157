//! The record store: bulk load, two-phase restore, lookup, select, store,
//! and the file/payload surface.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use rhizome_types::{Envelope, Id, Properties};
use rhizome_vfs::{StoreFs, Tree};
use serde_json::Value;
use tracing::{debug, info};

use crate::entity::{AnyEntity, Shared};
use crate::error::{DbError, DbResult};
use crate::factory::Factory;
use crate::files::FileRecord;
use crate::model::{Camera, Farm, ObservationUnit, Person, Scan, ScanningDevice, Zone};

/// In-memory record index, keyed by id, preserving insertion order.
#[derive(Default)]
struct Index {
    order: Vec<Id>,
    map: HashMap<Id, AnyEntity>,
}

impl Index {
    fn get(&self, id: &Id) -> Option<AnyEntity> {
        self.map.get(id).cloned()
    }

    fn upsert(&mut self, entity: AnyEntity) {
        let id = entity.id();
        if self.map.insert(id.clone(), entity).is_none() {
            self.order.push(id);
        }
    }

    fn in_order(&self) -> Vec<AnyEntity> {
        self.order
            .iter()
            .filter_map(|id| self.map.get(id).cloned())
            .collect()
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// In-memory file-record index, same shape as [`Index`].
#[derive(Default)]
struct FileIndex {
    order: Vec<Id>,
    map: HashMap<Id, FileRecord>,
}

impl FileIndex {
    fn get(&self, id: &Id) -> Option<FileRecord> {
        self.map.get(id).cloned()
    }

    fn upsert(&mut self, record: FileRecord) {
        let id = record.id.clone();
        if self.map.insert(id.clone(), record).is_none() {
            self.order.push(id);
        }
    }

    fn in_order(&self) -> Vec<FileRecord> {
        self.order
            .iter()
            .filter_map(|id| self.map.get(id).cloned())
            .collect()
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// A store of phenotyping records rooted at one directory.
///
/// Opening a database loads every file record and every envelope, then runs a
/// single restore pass that rewires the live graph: forward references are
/// bound to their targets and reverse collections rebuilt. The index holds
/// the only strong handle to each record; everything else in the graph is
/// weak.
pub struct Database {
    fs: StoreFs,
    factory: Factory,
    index: RefCell<Index>,
    files: RefCell<FileIndex>,
}

macro_rules! typed_resolver {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        pub(crate) fn $fn_name(&self, id: &Id) -> DbResult<Shared<$ty>> {
            match self.resolve(id)? {
                AnyEntity::$variant(handle) => Ok(handle),
                _ => Err(DbError::UnresolvedReference { id: id.clone() }),
            }
        }
    };
}

impl Database {
    /// Open (or create) the store at `root` and load everything in it.
    ///
    /// A failure while loading or restoring aborts the open; a database is
    /// never handed out half-restored.
    pub fn open(root: impl AsRef<Path>) -> DbResult<Rc<Self>> {
        let fs = StoreFs::open(root.as_ref())?;
        let db = Rc::new_cyclic(|weak| Database {
            fs,
            factory: Factory::new(weak.clone()),
            index: RefCell::new(Index::default()),
            files: RefCell::new(FileIndex::default()),
        });
        db.load_files()?;
        db.load_objects()?;
        db.restore_all()?;
        info!(
            objects = db.index.borrow().len(),
            files = db.files.borrow().len(),
            "store opened"
        );
        Ok(db)
    }

    /// The factory that builds records bound to this database.
    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    /// Find a record by id, loading it from disk on demand. A record loaded
    /// this way is restored immediately.
    pub fn lookup(&self, id: &Id) -> DbResult<Option<AnyEntity>> {
        if let Some(entity) = self.index.borrow().get(id) {
            return Ok(Some(entity));
        }
        if !self.fs.document_exists(Tree::Objects, id.as_str()) {
            return Ok(None);
        }
        let entity = self.load_envelope(id.as_str())?;
        entity.restore(self)?;
        Ok(Some(entity))
    }

    /// Like [`lookup`](Self::lookup), but a missing record is an error.
    pub fn require(&self, id: &Id) -> DbResult<AnyEntity> {
        self.lookup(id)?
            .ok_or_else(|| DbError::NotFound { id: id.clone() })
    }

    /// All records of one class, in insertion order.
    pub fn select(&self, classname: &str) -> Vec<AnyEntity> {
        self.index
            .borrow()
            .in_order()
            .into_iter()
            .filter(|entity| entity.classname() == classname)
            .collect()
    }

    /// Records of one class whose serialized property `key` equals `value`,
    /// in insertion order.
    pub fn select_where(&self, classname: &str, key: &str, value: &Value) -> Vec<AnyEntity> {
        self.index
            .borrow()
            .in_order()
            .into_iter()
            .filter(|entity| {
                entity.classname() == classname && entity.serialize().get(key) == Some(value)
            })
            .collect()
    }

    /// Write a record's envelope and register it in the index. With
    /// `recursive`, its owned sub-entities are stored after it; each record
    /// is written independently, with no cross-file atomicity.
    pub fn store(&self, entity: &AnyEntity, recursive: bool) -> DbResult<()> {
        let id = entity.id();
        let envelope = Envelope::new(
            id.clone(),
            entity.classname(),
            Value::Object(entity.serialize()),
        );
        self.fs
            .write_document(Tree::Objects, id.as_str(), &serde_json::to_value(&envelope)?)?;
        self.index.borrow_mut().upsert(entity.clone());
        entity.mark_clean();
        debug!(id = %id, classname = entity.classname(), "record stored");
        if recursive {
            for child in entity.owned_children() {
                self.store(&child, true)?;
            }
        }
        Ok(())
    }

    /// Resolve a reference: the record must exist.
    pub(crate) fn resolve(&self, id: &Id) -> DbResult<AnyEntity> {
        self.lookup(id)?
            .ok_or_else(|| DbError::UnresolvedReference { id: id.clone() })
    }

    typed_resolver!(resolve_person, Person, Person);
    typed_resolver!(resolve_camera, Camera, Camera);
    typed_resolver!(resolve_scanning_device, ScanningDevice, ScanningDevice);
    typed_resolver!(resolve_farm, Farm, Farm);
    typed_resolver!(resolve_zone, Zone, Zone);
    typed_resolver!(resolve_observation_unit, ObservationUnit, ObservationUnit);
    typed_resolver!(resolve_scan, Scan, Scan);

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    /// Create and persist a file record. Only the metadata is written; the
    /// payload is stored separately through `file_store_*`.
    pub fn new_file(
        &self,
        owner: &Id,
        source_name: &str,
        source_id: &Id,
        short_name: &str,
        path: &str,
        mimetype: &str,
    ) -> DbResult<FileRecord> {
        let record = FileRecord::new(owner, source_name, source_id, short_name, path, mimetype);
        self.fs.write_document(
            Tree::Files,
            record.id.as_str(),
            &serde_json::to_value(&record)?,
        )?;
        self.files.borrow_mut().upsert(record.clone());
        debug!(id = %record.id, path = %record.path, "file record created");
        Ok(record)
    }

    /// Find a file record by id, loading it from disk on demand like
    /// [`lookup`](Self::lookup) does for entities.
    pub fn get_file(&self, id: &Id) -> DbResult<Option<FileRecord>> {
        if let Some(record) = self.files.borrow().get(id) {
            return Ok(Some(record));
        }
        if !self.fs.document_exists(Tree::Files, id.as_str()) {
            return Ok(None);
        }
        Ok(Some(self.load_file_record(id.as_str())?))
    }

    /// File records matching the filter, in insertion order. All-`None`
    /// selects everything.
    pub fn select_files(
        &self,
        source_name: Option<&str>,
        source_id: Option<&Id>,
        short_name: Option<&str>,
    ) -> Vec<FileRecord> {
        self.files
            .borrow()
            .in_order()
            .into_iter()
            .filter(|record| record.matches(source_name, source_id, short_name))
            .collect()
    }

    pub fn file_store_bytes(&self, file: &FileRecord, data: &[u8]) -> DbResult<()> {
        self.fs.write_payload(&file.path, data)?;
        Ok(())
    }

    pub fn file_store_text(&self, file: &FileRecord, text: &str) -> DbResult<()> {
        self.fs.write_payload_text(&file.path, text)?;
        Ok(())
    }

    pub fn file_store_json(&self, file: &FileRecord, value: &Value) -> DbResult<()> {
        self.file_store_text(file, &serde_json::to_string_pretty(value)?)
    }

    pub fn file_read_bytes(&self, file: &FileRecord) -> DbResult<Vec<u8>> {
        Ok(self.fs.read_payload(&file.path)?)
    }

    pub fn file_read_text(&self, file: &FileRecord) -> DbResult<String> {
        Ok(self.fs.read_payload_text(&file.path)?)
    }

    pub fn file_read_json(&self, file: &FileRecord) -> DbResult<Value> {
        Ok(serde_json::from_str(&self.file_read_text(file)?)?)
    }

    /// Conventional payload location for a farm-level file such as a photo.
    pub fn farm_filepath(&self, farm_id: &Id, name: &str, ext: &str) -> String {
        format!("farms/{farm_id}/{name}.{ext}")
    }

    /// Conventional payload location for a datastream's values file.
    pub fn datastream_filepath(&self, datastream_id: &Id) -> String {
        format!("datastreams/{datastream_id}/values.json")
    }

    /// Conventional payload location for an analysis output file.
    pub fn analysis_filepath(
        &self,
        short_name: &str,
        analysis_id: &Id,
        name: &str,
        ext: &str,
    ) -> String {
        format!("{short_name}/{analysis_id}/{name}.{ext}")
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    fn load_files(&self) -> DbResult<()> {
        let mut names = self.fs.list(Tree::Files)?;
        names.sort();
        for name in names {
            self.load_file_record(&name)?;
        }
        Ok(())
    }

    fn load_file_record(&self, name: &str) -> DbResult<FileRecord> {
        let doc = self.fs.read_document(Tree::Files, name)?;
        let record: FileRecord = serde_json::from_value(doc)?;
        if record.id.as_str() != name {
            return Err(DbError::CorruptRecord(format!(
                "file record '{name}' carries id '{}'",
                record.id
            )));
        }
        self.files.borrow_mut().upsert(record.clone());
        Ok(record)
    }

    fn load_objects(&self) -> DbResult<()> {
        let mut names = self.fs.list(Tree::Objects)?;
        names.sort();
        for name in names {
            self.load_envelope(&name)?;
        }
        Ok(())
    }

    /// Read one envelope, construct its record through the factory, and
    /// register it. Restore is the caller's responsibility.
    fn load_envelope(&self, name: &str) -> DbResult<AnyEntity> {
        let doc = self.fs.read_document(Tree::Objects, name)?;
        let envelope: Envelope = serde_json::from_value(doc)?;
        if envelope.id.as_str() != name {
            return Err(DbError::CorruptRecord(format!(
                "envelope '{name}' carries id '{}'",
                envelope.id
            )));
        }
        let Value::Object(props) = envelope.value else {
            return Err(DbError::CorruptRecord(format!(
                "envelope '{name}' does not hold an object"
            )));
        };
        let entity = self.factory.create(&envelope.classname, &props)?;
        if entity.id() != envelope.id {
            return Err(DbError::CorruptRecord(format!(
                "record in envelope '{name}' carries id '{}'",
                entity.id()
            )));
        }
        debug!(id = %envelope.id, classname = %envelope.classname, "record loaded");
        self.index.borrow_mut().upsert(entity.clone());
        Ok(entity)
    }

    fn restore_all(&self) -> DbResult<()> {
        // Collect first: restore may look up records, which borrows the index.
        let entities = self.index.borrow().in_order();
        for entity in &entities {
            entity.restore(self)?;
        }
        debug!(count = entities.len(), "graph restored");
        Ok(())
    }
}
