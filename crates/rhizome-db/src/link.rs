//! References between records in the live graph.
//!
//! On disk, relationships are plain id strings; in memory they become weak
//! pointers so the database index stays the only owner of every record. A
//! [`Link`] pairs the durable id with the transient pointer; a [`LinkSet`]
//! is an id-deduplicating, insertion-ordered collection of links used both
//! for forward id-list properties and for the reverse collections rebuilt
//! during restore.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rhizome_types::Id;

use crate::error::DbResult;

/// Shared handle to a record in the live graph.
pub type Shared<T> = Rc<RefCell<T>>;

/// One reference to another record: the id survives serialization, the weak
/// pointer is rebuilt on restore.
#[derive(Debug)]
pub struct Link<T> {
    id: Id,
    target: Weak<RefCell<T>>,
}

impl<T> Link<T> {
    /// A link that knows its target's id but is not yet wired to it.
    pub fn dangling(id: Id) -> Self {
        Self {
            id,
            target: Weak::new(),
        }
    }

    /// A link wired to a live record.
    pub fn to(id: Id, target: &Shared<T>) -> Self {
        Self {
            id,
            target: Rc::downgrade(target),
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Point the link at a live record, keeping the id.
    pub fn bind(&mut self, target: &Shared<T>) {
        self.target = Rc::downgrade(target);
    }

    /// The live record, if it is still held by the index.
    pub fn upgrade(&self) -> Option<Shared<T>> {
        self.target.upgrade()
    }
}

impl<T> Clone for Link<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            target: self.target.clone(),
        }
    }
}

/// Insertion-ordered set of links, deduplicated by id.
///
/// Inserting an id that is already present rebinds the pointer but never adds
/// a second entry, which makes the `add_*` and restore paths idempotent.
#[derive(Debug)]
pub struct LinkSet<T> {
    links: Vec<Link<T>>,
}

impl<T> LinkSet<T> {
    pub fn new() -> Self {
        Self { links: Vec::new() }
    }

    /// Record an id without a live target. Returns false if already present.
    pub fn insert_id(&mut self, id: Id) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.links.push(Link::dangling(id));
        true
    }

    /// Insert a wired link. If the id is already present, the existing entry
    /// is rebound and no new entry is added.
    pub fn insert(&mut self, id: Id, target: &Shared<T>) -> bool {
        if let Some(link) = self.links.iter_mut().find(|link| *link.id() == id) {
            link.bind(target);
            return false;
        }
        self.links.push(Link::to(id, target));
        true
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.links.iter().any(|link| link.id() == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &Id> {
        self.links.iter().map(Link::id)
    }

    /// The live records, in insertion order, skipping any the index no longer
    /// holds.
    pub fn entities(&self) -> Vec<Shared<T>> {
        self.links.iter().filter_map(Link::upgrade).collect()
    }

    /// Rebind every link through a resolver, failing on the first id that
    /// does not resolve.
    pub fn resolve_with<F>(&mut self, mut resolve: F) -> DbResult<()>
    where
        F: FnMut(&Id) -> DbResult<Shared<T>>,
    {
        for link in &mut self.links {
            let target = resolve(link.id())?;
            link.bind(&target);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn clear(&mut self) {
        self.links.clear();
    }
}

impl<T> Default for LinkSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for LinkSet<T> {
    fn clone(&self) -> Self {
        Self {
            links: self.links.clone(),
        }
    }
}
