use rhizome_types::{Id, Properties};
use serde_json::Value;

use crate::database::Database;
use crate::entity::{AnyEntity, Entity, EntityCore, Shared};
use crate::error::DbResult;
use crate::link::{Link, LinkSet};
use crate::model::{Analysis, DataStream, Scan};
use crate::props;
use crate::values::ScanPath;

/// A cultivated area within a farm.
///
/// The zone record stores only its farm reference and scan paths; the scans,
/// analyses, and datastreams pointing at it are rebuilt as reverse
/// collections during restore and written along with it on a recursive store.
#[derive(Debug)]
pub struct Zone {
    core: EntityCore,
    farm: Option<Link<crate::model::Farm>>,
    short_name: String,
    scan_paths: Vec<ScanPath>,
    scans: LinkSet<Scan>,
    analyses: LinkSet<Analysis>,
    datastreams: LinkSet<DataStream>,
}

impl Zone {
    pub(crate) fn with_core(core: EntityCore) -> Self {
        Self {
            core,
            farm: None,
            short_name: String::new(),
            scan_paths: Vec::new(),
            scans: LinkSet::new(),
            analyses: LinkSet::new(),
            datastreams: LinkSet::new(),
        }
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn farm_id(&self) -> Option<&Id> {
        self.farm.as_ref().map(Link::id)
    }

    pub fn farm(&self) -> Option<Shared<crate::model::Farm>> {
        self.farm.as_ref().and_then(Link::upgrade)
    }

    pub fn scan_paths(&self) -> &[ScanPath] {
        &self.scan_paths
    }

    pub fn add_scan_path(&mut self, path: ScanPath) {
        self.scan_paths.push(path);
        self.core.mark_modified();
    }

    pub fn get_scan_path(&self, short_name: &str) -> Option<&ScanPath> {
        self.scan_paths
            .iter()
            .find(|path| path.short_name == short_name)
    }

    pub fn scans(&self) -> Vec<Shared<Scan>> {
        self.scans.entities()
    }

    pub fn analyses(&self) -> Vec<Shared<Analysis>> {
        self.analyses.entities()
    }

    pub fn datastreams(&self) -> Vec<Shared<DataStream>> {
        self.datastreams.entities()
    }

    pub(crate) fn attach_scan(&mut self, id: Id, scan: &Shared<Scan>) {
        self.scans.insert(id, scan);
    }

    pub(crate) fn attach_analysis(&mut self, id: Id, analysis: &Shared<Analysis>) {
        self.analyses.insert(id, analysis);
    }

    pub(crate) fn attach_datastream(&mut self, id: Id, datastream: &Shared<DataStream>) {
        self.datastreams.insert(id, datastream);
    }
}

impl Entity for Zone {
    const CLASSNAME: &'static str = "Zone";

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn parse(&mut self, props: &Properties) -> DbResult<()> {
        self.core.take_id(props)?;
        self.farm = props::optional_id(props, "farm")?.map(Link::dangling);
        self.short_name = props::require_str(props, "short_name")?;
        self.scan_paths = props::object_list(props, "scan_paths")?
            .into_iter()
            .map(ScanPath::from_props)
            .collect::<DbResult<_>>()?;
        self.scans.clear();
        self.analyses.clear();
        self.datastreams.clear();
        Ok(())
    }

    fn serialize(&self) -> Properties {
        let mut out = Properties::new();
        props::put_id(&mut out, "id", self.core.id());
        props::put_opt_id(&mut out, "farm", self.farm.as_ref().map(Link::id));
        props::put_str(&mut out, "short_name", &self.short_name);
        let paths = self
            .scan_paths
            .iter()
            .map(|path| Value::Object(path.to_props()))
            .collect();
        props::put_value(&mut out, "scan_paths", Value::Array(paths));
        out
    }

    fn restore(&mut self, db: &Database, this: &Shared<Self>) -> DbResult<()> {
        if let Some(link) = &mut self.farm {
            let farm = db.resolve_farm(link.id())?;
            link.bind(&farm);
            farm.borrow_mut().attach_zone(self.core.id().clone(), this);
        }
        Ok(())
    }

    fn owned_children(&self) -> Vec<AnyEntity> {
        let mut children: Vec<AnyEntity> = self
            .scans
            .entities()
            .into_iter()
            .map(AnyEntity::Scan)
            .collect();
        children.extend(self.analyses.entities().into_iter().map(AnyEntity::Analysis));
        children.extend(
            self.datastreams
                .entities()
                .into_iter()
                .map(AnyEntity::DataStream),
        );
        children
    }

    fn clone_detached(&self) -> Self {
        Self {
            core: self.core.detached(),
            farm: None,
            short_name: self.short_name.clone(),
            scan_paths: self.scan_paths.clone(),
            scans: LinkSet::new(),
            analyses: LinkSet::new(),
            datastreams: LinkSet::new(),
        }
    }
}
