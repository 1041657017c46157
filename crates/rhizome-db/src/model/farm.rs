use rhizome_types::{Id, Properties};

use crate::database::Database;
use crate::entity::{AnyEntity, Entity, EntityCore, Shared};
use crate::error::DbResult;
use crate::link::LinkSet;
use crate::model::{Camera, ObservationUnit, Person, ScanningDevice, Zone};
use crate::props;

/// A farm: the root of one site's record graph.
///
/// People, cameras, and scanning devices are forward references serialized as
/// id lists. Zones and observation units are reverse collections: each child
/// carries the farm's id and pushes itself back in during restore, so they
/// are never written into the farm's own record.
#[derive(Debug)]
pub struct Farm {
    core: EntityCore,
    short_name: String,
    name: String,
    description: String,
    license: String,
    people: LinkSet<Person>,
    cameras: LinkSet<Camera>,
    scanning_devices: LinkSet<ScanningDevice>,
    zones: LinkSet<Zone>,
    observation_units: LinkSet<ObservationUnit>,
}

impl Farm {
    pub(crate) fn with_core(core: EntityCore) -> Self {
        Self {
            core,
            short_name: String::new(),
            name: String::new(),
            description: String::new(),
            license: String::new(),
            people: LinkSet::new(),
            cameras: LinkSet::new(),
            scanning_devices: LinkSet::new(),
            zones: LinkSet::new(),
            observation_units: LinkSet::new(),
        }
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn license(&self) -> &str {
        &self.license
    }

    pub fn people(&self) -> Vec<Shared<Person>> {
        self.people.entities()
    }

    pub fn cameras(&self) -> Vec<Shared<Camera>> {
        self.cameras.entities()
    }

    pub fn scanning_devices(&self) -> Vec<Shared<ScanningDevice>> {
        self.scanning_devices.entities()
    }

    pub fn zones(&self) -> Vec<Shared<Zone>> {
        self.zones.entities()
    }

    pub fn observation_units(&self) -> Vec<Shared<ObservationUnit>> {
        self.observation_units.entities()
    }

    pub fn get_zone(&self, id_or_short_name: &str) -> Option<Shared<Zone>> {
        self.zones.entities().into_iter().find(|zone| {
            let zone = zone.borrow();
            zone.id().as_str() == id_or_short_name || zone.short_name() == id_or_short_name
        })
    }

    pub fn get_observation_unit(&self, id_or_short_name: &str) -> Option<Shared<ObservationUnit>> {
        self.observation_units.entities().into_iter().find(|unit| {
            let unit = unit.borrow();
            unit.id().as_str() == id_or_short_name || unit.short_name() == id_or_short_name
        })
    }

    /// Store the person, reference it from this farm, and re-persist the farm
    /// record. Adding the same person twice is a no-op for the reference
    /// list.
    pub fn add_person(
        this: &Shared<Farm>,
        person: &Shared<Person>,
        db: &Database,
    ) -> DbResult<()> {
        db.store(&AnyEntity::Person(person.clone()), false)?;
        let id = person.borrow().id().clone();
        {
            let mut farm = this.borrow_mut();
            farm.people.insert(id, person);
            farm.core.mark_modified();
        }
        db.store(&AnyEntity::Farm(this.clone()), false)
    }

    pub fn add_camera(
        this: &Shared<Farm>,
        camera: &Shared<Camera>,
        db: &Database,
    ) -> DbResult<()> {
        db.store(&AnyEntity::Camera(camera.clone()), false)?;
        let id = camera.borrow().id().clone();
        {
            let mut farm = this.borrow_mut();
            farm.cameras.insert(id, camera);
            farm.core.mark_modified();
        }
        db.store(&AnyEntity::Farm(this.clone()), false)
    }

    pub fn add_scanning_device(
        this: &Shared<Farm>,
        device: &Shared<ScanningDevice>,
        db: &Database,
    ) -> DbResult<()> {
        db.store(&AnyEntity::ScanningDevice(device.clone()), false)?;
        let id = device.borrow().id().clone();
        {
            let mut farm = this.borrow_mut();
            farm.scanning_devices.insert(id, device);
            farm.core.mark_modified();
        }
        db.store(&AnyEntity::Farm(this.clone()), false)
    }

    pub(crate) fn attach_zone(&mut self, id: Id, zone: &Shared<Zone>) {
        self.zones.insert(id, zone);
    }

    pub(crate) fn attach_observation_unit(&mut self, id: Id, unit: &Shared<ObservationUnit>) {
        self.observation_units.insert(id, unit);
    }
}

impl Entity for Farm {
    const CLASSNAME: &'static str = "Farm";

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn parse(&mut self, props: &Properties) -> DbResult<()> {
        self.core.take_id(props)?;
        self.short_name = props::require_str(props, "short_name")?;
        self.name = props::require_str(props, "name")?;
        self.description = props::optional_str(props, "description")?;
        self.license = props::optional_str(props, "license")?;
        self.people.clear();
        for id in props::id_list(props, "people")? {
            self.people.insert_id(id);
        }
        self.cameras.clear();
        for id in props::id_list(props, "cameras")? {
            self.cameras.insert_id(id);
        }
        self.scanning_devices.clear();
        for id in props::id_list(props, "scanning_devices")? {
            self.scanning_devices.insert_id(id);
        }
        self.zones.clear();
        self.observation_units.clear();
        Ok(())
    }

    fn serialize(&self) -> Properties {
        let mut out = Properties::new();
        props::put_id(&mut out, "id", self.core.id());
        props::put_str(&mut out, "short_name", &self.short_name);
        props::put_str(&mut out, "name", &self.name);
        props::put_str(&mut out, "description", &self.description);
        props::put_str(&mut out, "license", &self.license);
        props::put_id_list(&mut out, "people", self.people.ids());
        props::put_id_list(&mut out, "cameras", self.cameras.ids());
        props::put_id_list(&mut out, "scanning_devices", self.scanning_devices.ids());
        out
    }

    fn restore(&mut self, db: &Database, _this: &Shared<Self>) -> DbResult<()> {
        self.people.resolve_with(|id| db.resolve_person(id))?;
        self.cameras.resolve_with(|id| db.resolve_camera(id))?;
        self.scanning_devices
            .resolve_with(|id| db.resolve_scanning_device(id))?;
        Ok(())
    }

    fn owned_children(&self) -> Vec<AnyEntity> {
        let mut children: Vec<AnyEntity> = self
            .zones
            .entities()
            .into_iter()
            .map(AnyEntity::Zone)
            .collect();
        children.extend(
            self.observation_units
                .entities()
                .into_iter()
                .map(AnyEntity::ObservationUnit),
        );
        children
    }

    fn clone_detached(&self) -> Self {
        Self {
            core: self.core.detached(),
            short_name: self.short_name.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            license: self.license.clone(),
            people: LinkSet::new(),
            cameras: LinkSet::new(),
            scanning_devices: LinkSet::new(),
            zones: LinkSet::new(),
            observation_units: LinkSet::new(),
        }
    }
}
