use chrono::{DateTime, FixedOffset};
use rhizome_types::{Id, Properties};

use crate::database::Database;
use crate::entity::{AnyEntity, Entity, EntityCore, Shared, WeakEntity};
use crate::error::DbResult;
use crate::link::Link;
use crate::model::Person;
use crate::props;

/// A free-text annotation attached to any record.
///
/// The context reference is polymorphic: it may point at a record of any
/// kind. Notes are found by selecting on their `context` property; no record
/// keeps a reverse collection of its notes.
#[derive(Debug)]
pub struct Note {
    core: EntityCore,
    context_id: Option<Id>,
    context: Option<WeakEntity>,
    author: Option<Link<Person>>,
    date: DateTime<FixedOffset>,
    /// Note kind, stored under the `type` key.
    kind: String,
    text: String,
}

impl Note {
    pub(crate) fn with_core(core: EntityCore) -> Self {
        Self {
            core,
            context_id: None,
            context: None,
            author: None,
            date: DateTime::UNIX_EPOCH.into(),
            kind: "note".to_string(),
            text: String::new(),
        }
    }

    pub fn context_id(&self) -> Option<&Id> {
        self.context_id.as_ref()
    }

    /// The live record this note annotates, of whatever kind.
    pub fn context(&self) -> Option<AnyEntity> {
        self.context.as_ref().and_then(WeakEntity::upgrade)
    }

    pub fn author(&self) -> Option<Shared<Person>> {
        self.author.as_ref().and_then(Link::upgrade)
    }

    pub fn author_id(&self) -> Option<&Id> {
        self.author.as_ref().map(Link::id)
    }

    pub fn date(&self) -> DateTime<FixedOffset> {
        self.date
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.core.mark_modified();
    }
}

impl Entity for Note {
    const CLASSNAME: &'static str = "Note";

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn parse(&mut self, props: &Properties) -> DbResult<()> {
        self.core.take_id(props)?;
        self.context_id = props::optional_id(props, "context")?;
        self.context = None;
        self.author = props::optional_id(props, "author")?.map(Link::dangling);
        self.date = props::require_date(props, "date")?;
        self.kind = {
            let kind = props::optional_str(props, "type")?;
            if kind.is_empty() {
                "note".to_string()
            } else {
                kind
            }
        };
        self.text = props::require_str(props, "text")?;
        Ok(())
    }

    fn serialize(&self) -> Properties {
        let mut out = Properties::new();
        props::put_id(&mut out, "id", self.core.id());
        props::put_opt_id(&mut out, "context", self.context_id.as_ref());
        props::put_opt_id(&mut out, "author", self.author.as_ref().map(Link::id));
        props::put_str(&mut out, "date", &self.date.to_rfc3339());
        props::put_str(&mut out, "type", &self.kind);
        props::put_str(&mut out, "text", &self.text);
        out
    }

    fn restore(&mut self, db: &Database, _this: &Shared<Self>) -> DbResult<()> {
        if let Some(context_id) = &self.context_id {
            let target = db.resolve(context_id)?;
            self.context = Some(target.downgrade());
        }
        if let Some(link) = &mut self.author {
            let person = db.resolve_person(link.id())?;
            link.bind(&person);
        }
        Ok(())
    }

    fn clone_detached(&self) -> Self {
        Self {
            core: self.core.detached(),
            context_id: None,
            context: None,
            author: None,
            date: self.date,
            kind: self.kind.clone(),
            text: self.text.clone(),
        }
    }
}
