//! Time series of observations attached to an observation unit.

use chrono::{DateTime, FixedOffset};
use rhizome_types::{Id, Properties};
use serde_json::Value;
use tracing::warn;

use crate::database::Database;
use crate::entity::{Entity, EntityCore, Shared};
use crate::error::{DbError, DbResult};
use crate::link::Link;
use crate::model::ObservationUnit;
use crate::props;

/// What a datastream measures, e.g. air temperature.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Observable {
    pub name: String,
    pub uri: String,
}

impl Observable {
    pub fn from_props(props: &Properties) -> DbResult<Self> {
        Ok(Self {
            name: props::require_str(props, "name")?,
            uri: props::require_str(props, "uri")?,
        })
    }

    pub fn to_props(&self) -> Properties {
        let mut out = Properties::new();
        props::put_str(&mut out, "name", &self.name);
        props::put_str(&mut out, "uri", &self.uri);
        out
    }
}

/// The unit the datastream's values are expressed in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Unit {
    pub name: String,
    pub uri: String,
}

impl Unit {
    pub fn from_props(props: &Properties) -> DbResult<Self> {
        Ok(Self {
            name: props::require_str(props, "name")?,
            uri: props::require_str(props, "uri")?,
        })
    }

    pub fn to_props(&self) -> Properties {
        let mut out = Properties::new();
        props::put_str(&mut out, "name", &self.name);
        props::put_str(&mut out, "uri", &self.uri);
        out
    }
}

/// A series of dated measurements stored as one JSON payload file.
#[derive(Debug)]
pub struct DataStream {
    core: EntityCore,
    observation_unit: Option<Link<ObservationUnit>>,
    /// File record holding the values payload.
    file: Option<Id>,
    observable: Observable,
    unit: Unit,
}

impl DataStream {
    pub(crate) fn with_core(core: EntityCore) -> Self {
        Self {
            core,
            observation_unit: None,
            file: None,
            observable: Observable::default(),
            unit: Unit::default(),
        }
    }

    pub fn observation_unit_id(&self) -> Option<&Id> {
        self.observation_unit.as_ref().map(Link::id)
    }

    pub fn observation_unit(&self) -> Option<Shared<ObservationUnit>> {
        self.observation_unit.as_ref().and_then(Link::upgrade)
    }

    pub fn file_id(&self) -> Option<&Id> {
        self.file.as_ref()
    }

    pub fn set_file(&mut self, id: Id) {
        self.file = Some(id);
        self.core.mark_modified();
    }

    pub fn observable(&self) -> &Observable {
        &self.observable
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// All measurement points, read from the values payload.
    pub fn values(&self) -> DbResult<Vec<Value>> {
        let db = self.core.database()?;
        let file_id = self.file.as_ref().ok_or_else(|| DbError::NoDataFile {
            id: self.core.id().clone(),
        })?;
        let file = db.get_file(file_id)?.ok_or_else(|| DbError::NotFound {
            id: file_id.clone(),
        })?;
        let payload = db.file_read_json(&file)?;
        match payload {
            Value::Array(points) => Ok(points),
            _ => Err(DbError::CorruptRecord(format!(
                "datastream payload {} is not an array",
                file.path
            ))),
        }
    }

    /// Measurement points whose `date` falls within `[start, end]`. Points
    /// without a parsable date are skipped.
    pub fn select_range(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> DbResult<Vec<Value>> {
        let points = self.values()?;
        let mut selected = Vec::new();
        for point in points {
            let Some(date) = point
                .get("date")
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            else {
                warn!(datastream = %self.core.id(), "skipping point without a valid date");
                continue;
            };
            if date >= start && date <= end {
                selected.push(point);
            }
        }
        Ok(selected)
    }
}

impl Entity for DataStream {
    const CLASSNAME: &'static str = "DataStream";

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn parse(&mut self, props: &Properties) -> DbResult<()> {
        self.core.take_id(props)?;
        self.observation_unit = props::optional_id(props, "observation_unit")?.map(Link::dangling);
        self.file = props::optional_id(props, "file")?;
        self.observable = Observable::from_props(props::require_object(props, "observable")?)?;
        self.unit = Unit::from_props(props::require_object(props, "unit")?)?;
        Ok(())
    }

    fn serialize(&self) -> Properties {
        let mut out = Properties::new();
        props::put_id(&mut out, "id", self.core.id());
        props::put_opt_id(
            &mut out,
            "observation_unit",
            self.observation_unit.as_ref().map(Link::id),
        );
        props::put_opt_id(&mut out, "file", self.file.as_ref());
        props::put_value(&mut out, "observable", Value::Object(self.observable.to_props()));
        props::put_value(&mut out, "unit", Value::Object(self.unit.to_props()));
        out
    }

    fn restore(&mut self, db: &Database, this: &Shared<Self>) -> DbResult<()> {
        if let Some(link) = &mut self.observation_unit {
            let unit = db.resolve_observation_unit(link.id())?;
            link.bind(&unit);
            unit.borrow_mut()
                .attach_datastream(self.core.id().clone(), this);
        }
        if let Some(file_id) = &self.file {
            if db.get_file(file_id)?.is_none() {
                return Err(DbError::UnresolvedReference {
                    id: file_id.clone(),
                });
            }
        }
        Ok(())
    }

    fn clone_detached(&self) -> Self {
        Self {
            core: self.core.detached(),
            observation_unit: None,
            file: None,
            observable: self.observable.clone(),
            unit: self.unit.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use serde_json::json;
    use std::rc::Weak;

    fn datastream_props() -> Properties {
        json!({
            "observation_unit": "unit01",
            "file": "",
            "observable": { "name": "air temperature", "uri": "http://purl.obolibrary.org/obo/ENVO_09200001" },
            "unit": { "name": "degree Celsius", "uri": "http://purl.obolibrary.org/obo/UO_0000027" },
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn roundtrip() {
        let mut stream = DataStream::with_core(EntityCore::new(Weak::new()));
        stream.parse(&datastream_props()).unwrap();
        assert!(stream.file_id().is_none());
        assert_eq!(stream.observable().name, "air temperature");

        let out = stream.serialize();
        assert_eq!(out["file"], json!(""));
        let mut reparsed = DataStream::with_core(EntityCore::new(Weak::new()));
        reparsed.parse(&out).unwrap();
        assert_eq!(reparsed.serialize(), out);
    }

    #[test]
    fn observable_is_required() {
        let mut props = datastream_props();
        props.remove("observable");
        let mut stream = DataStream::with_core(EntityCore::new(Weak::new()));
        assert!(matches!(
            stream.parse(&props),
            Err(DbError::MissingField { key }) if key == "observable"
        ));
    }

    #[test]
    fn values_without_a_file_fail() {
        let mut stream = DataStream::with_core(EntityCore::new(Weak::new()));
        stream.parse(&datastream_props()).unwrap();
        // unbound core fails before the file check
        assert!(matches!(stream.values(), Err(DbError::UnboundEntity)));
    }
}
