use chrono::{DateTime, FixedOffset};
use rhizome_types::{Id, Properties};
use serde_json::Value;

use crate::database::Database;
use crate::entity::{Entity, EntityCore, Shared};
use crate::error::DbResult;
use crate::files::FileRecord;
use crate::link::{Link, LinkSet};
use crate::model::{Analysis, Camera, ObservationUnit, Person, ScanningDevice, Zone};
use crate::props;
use crate::values::ScanPath;

/// One imaging session over a zone or an observation unit.
#[derive(Debug)]
pub struct Scan {
    core: EntityCore,
    zone: Option<Link<Zone>>,
    observation_unit: Option<Link<ObservationUnit>>,
    date: DateTime<FixedOffset>,
    people: LinkSet<Person>,
    camera: Option<Link<Camera>>,
    scanning_device: Option<Link<ScanningDevice>>,
    scan_path: Option<ScanPath>,
    factor_values: Properties,
    analyses: LinkSet<Analysis>,
}

impl Scan {
    pub(crate) fn with_core(core: EntityCore) -> Self {
        Self {
            core,
            zone: None,
            observation_unit: None,
            date: DateTime::UNIX_EPOCH.into(),
            people: LinkSet::new(),
            camera: None,
            scanning_device: None,
            scan_path: None,
            factor_values: Properties::new(),
            analyses: LinkSet::new(),
        }
    }

    pub fn date(&self) -> DateTime<FixedOffset> {
        self.date
    }

    pub fn zone_id(&self) -> Option<&Id> {
        self.zone.as_ref().map(Link::id)
    }

    pub fn zone(&self) -> Option<Shared<Zone>> {
        self.zone.as_ref().and_then(Link::upgrade)
    }

    pub fn observation_unit_id(&self) -> Option<&Id> {
        self.observation_unit.as_ref().map(Link::id)
    }

    pub fn observation_unit(&self) -> Option<Shared<ObservationUnit>> {
        self.observation_unit.as_ref().and_then(Link::upgrade)
    }

    pub fn people(&self) -> Vec<Shared<Person>> {
        self.people.entities()
    }

    pub fn camera(&self) -> Option<Shared<Camera>> {
        self.camera.as_ref().and_then(Link::upgrade)
    }

    pub fn scanning_device(&self) -> Option<Shared<ScanningDevice>> {
        self.scanning_device.as_ref().and_then(Link::upgrade)
    }

    pub fn scan_path(&self) -> Option<&ScanPath> {
        self.scan_path.as_ref()
    }

    pub fn factor_values(&self) -> &Properties {
        &self.factor_values
    }

    pub fn set_factor_value(&mut self, key: &str, value: Value) {
        self.factor_values.insert(key.to_string(), value);
        self.core.mark_modified();
    }

    pub fn analyses(&self) -> Vec<Shared<Analysis>> {
        self.analyses.entities()
    }

    pub(crate) fn attach_analysis(&mut self, id: Id, analysis: &Shared<Analysis>) {
        self.analyses.insert(id, analysis);
    }

    /// The image files this scan produced.
    pub fn images(&self) -> DbResult<Vec<FileRecord>> {
        let db = self.core.database()?;
        Ok(db.select_files(Some("scan"), Some(self.core.id()), None))
    }
}

impl Entity for Scan {
    const CLASSNAME: &'static str = "Scan";

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn parse(&mut self, props: &Properties) -> DbResult<()> {
        self.core.take_id(props)?;
        self.zone = props::optional_id(props, "zone")?.map(Link::dangling);
        self.observation_unit = props::optional_id(props, "observation_unit")?.map(Link::dangling);
        self.date = props::require_date(props, "date")?;
        self.people.clear();
        for id in props::id_list(props, "people")? {
            self.people.insert_id(id);
        }
        self.camera = props::optional_id(props, "camera")?.map(Link::dangling);
        self.scanning_device = props::optional_id(props, "scanning_device")?.map(Link::dangling);
        self.scan_path = props::optional_object(props, "scan_path")?
            .map(ScanPath::from_props)
            .transpose()?;
        self.factor_values = props::optional_map(props, "factor_values")?;
        self.analyses.clear();
        Ok(())
    }

    fn serialize(&self) -> Properties {
        let mut out = Properties::new();
        props::put_id(&mut out, "id", self.core.id());
        props::put_opt_id(&mut out, "zone", self.zone.as_ref().map(Link::id));
        props::put_opt_id(
            &mut out,
            "observation_unit",
            self.observation_unit.as_ref().map(Link::id),
        );
        props::put_str(&mut out, "date", &self.date.to_rfc3339());
        props::put_id_list(&mut out, "people", self.people.ids());
        props::put_opt_id(&mut out, "camera", self.camera.as_ref().map(Link::id));
        props::put_opt_id(
            &mut out,
            "scanning_device",
            self.scanning_device.as_ref().map(Link::id),
        );
        if let Some(path) = &self.scan_path {
            props::put_value(&mut out, "scan_path", Value::Object(path.to_props()));
        }
        props::put_value(
            &mut out,
            "factor_values",
            Value::Object(self.factor_values.clone()),
        );
        out
    }

    fn restore(&mut self, db: &Database, this: &Shared<Self>) -> DbResult<()> {
        if let Some(link) = &mut self.zone {
            let zone = db.resolve_zone(link.id())?;
            link.bind(&zone);
            zone.borrow_mut().attach_scan(self.core.id().clone(), this);
        }
        if let Some(link) = &mut self.observation_unit {
            let unit = db.resolve_observation_unit(link.id())?;
            link.bind(&unit);
            unit.borrow_mut().attach_scan(self.core.id().clone(), this);
        }
        self.people.resolve_with(|id| db.resolve_person(id))?;
        if let Some(link) = &mut self.camera {
            let camera = db.resolve_camera(link.id())?;
            link.bind(&camera);
        }
        if let Some(link) = &mut self.scanning_device {
            let device = db.resolve_scanning_device(link.id())?;
            link.bind(&device);
        }
        Ok(())
    }

    fn clone_detached(&self) -> Self {
        Self {
            core: self.core.detached(),
            zone: None,
            observation_unit: None,
            date: self.date,
            people: LinkSet::new(),
            camera: None,
            scanning_device: None,
            scan_path: self.scan_path.clone(),
            factor_values: self.factor_values.clone(),
            analyses: LinkSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use serde_json::json;
    use std::rc::Weak;

    fn scan_props() -> Properties {
        json!({
            "zone": "zone01",
            "observation_unit": "unit01",
            "date": "2019-04-16T10:30:00+02:00",
            "people": ["p1"],
            "camera": "cam01",
            "scanning_device": "dev01",
            "scan_path": {
                "short_name": "circular",
                "type": "circle",
                "parameters": {},
            },
            "factor_values": {},
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn roundtrip() {
        let mut scan = Scan::with_core(EntityCore::new(Weak::new()));
        scan.parse(&scan_props()).unwrap();
        assert_eq!(scan.date().to_rfc3339(), "2019-04-16T10:30:00+02:00");
        assert_eq!(scan.zone_id().unwrap().as_str(), "zone01");

        let out = scan.serialize();
        let mut reparsed = Scan::with_core(EntityCore::new(Weak::new()));
        reparsed.parse(&out).unwrap();
        assert_eq!(reparsed.serialize(), out);
    }

    #[test]
    fn date_is_required_and_validated() {
        let mut props = scan_props();
        props.remove("date");
        let mut scan = Scan::with_core(EntityCore::new(Weak::new()));
        assert!(matches!(
            scan.parse(&props),
            Err(DbError::MissingField { key }) if key == "date"
        ));

        let mut props = scan_props();
        props.insert("date".to_string(), json!("last tuesday"));
        let mut scan = Scan::with_core(EntityCore::new(Weak::new()));
        assert!(matches!(
            scan.parse(&props),
            Err(DbError::InvalidField { key, .. }) if key == "date"
        ));
    }

    #[test]
    fn absent_scan_path_is_omitted_on_serialize() {
        let mut props = scan_props();
        props.remove("scan_path");
        let mut scan = Scan::with_core(EntityCore::new(Weak::new()));
        scan.parse(&props).unwrap();
        assert!(scan.scan_path().is_none());
        assert!(!scan.serialize().contains_key("scan_path"));
    }

    #[test]
    fn clone_detached_keeps_payload_but_not_references() {
        let mut scan = Scan::with_core(EntityCore::new(Weak::new()));
        scan.parse(&scan_props()).unwrap();
        let copy = scan.clone_detached();
        assert!(copy.zone_id().is_none());
        assert!(copy.observation_unit_id().is_none());
        assert!(copy.scan_path().is_some());
        assert_eq!(copy.serialize()["people"], json!([]));
    }
}
