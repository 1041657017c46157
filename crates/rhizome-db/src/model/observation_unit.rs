use rhizome_types::{Id, Properties};
use serde_json::Value;

use crate::database::Database;
use crate::entity::{AnyEntity, Entity, EntityCore, Shared};
use crate::error::DbResult;
use crate::link::{Link, LinkSet};
use crate::model::{Analysis, DataStream, Farm, Scan};
use crate::props;
use crate::values::Sample;

/// The thing being observed: a crop, a bed, a single plant.
///
/// The `context` property holds the id of the farm the unit belongs to;
/// restore resolves it and pushes the unit into the farm's reverse
/// collection.
#[derive(Debug)]
pub struct ObservationUnit {
    core: EntityCore,
    context: Option<Link<Farm>>,
    /// Unit kind, stored under the `type` key.
    kind: String,
    short_name: String,
    spatial_distribution: String,
    factor_values: Properties,
    samples: Vec<Sample>,
    description_file: Option<Id>,
    scans: LinkSet<Scan>,
    analyses: LinkSet<Analysis>,
    datastreams: LinkSet<DataStream>,
}

impl ObservationUnit {
    pub(crate) fn with_core(core: EntityCore) -> Self {
        Self {
            core,
            context: None,
            kind: String::new(),
            short_name: String::new(),
            spatial_distribution: String::new(),
            factor_values: Properties::new(),
            samples: Vec::new(),
            description_file: None,
            scans: LinkSet::new(),
            analyses: LinkSet::new(),
            datastreams: LinkSet::new(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn spatial_distribution(&self) -> &str {
        &self.spatial_distribution
    }

    pub fn context_id(&self) -> Option<&Id> {
        self.context.as_ref().map(Link::id)
    }

    pub fn context(&self) -> Option<Shared<Farm>> {
        self.context.as_ref().and_then(Link::upgrade)
    }

    pub fn factor_values(&self) -> &Properties {
        &self.factor_values
    }

    pub fn set_factor_value(&mut self, key: &str, value: Value) {
        self.factor_values.insert(key.to_string(), value);
        self.core.mark_modified();
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn description_file(&self) -> Option<&Id> {
        self.description_file.as_ref()
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

impl Entity for ObservationUnit {
    const CLASSNAME: &'static str = "ObservationUnit";

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn parse(&mut self, props: &Properties) -> DbResult<()> {
        self.core.take_id(props)?;
        self.context = props::optional_id(props, "context")?.map(Link::dangling);
        self.kind = props::require_str(props, "type")?;
        self.short_name = props::optional_str(props, "short_name")?;
        self.spatial_distribution = props::optional_str(props, "spatial_distribution")?;
        self.factor_values = props::optional_map(props, "factor_values")?;
        self.samples = props::object_list(props, "samples")?
            .into_iter()
            .map(Sample::from_props)
            .collect::<DbResult<_>>()?;
        self.description_file = props::optional_id(props, "description_file")?;
        self.scans.clear();
        self.analyses.clear();
        self.datastreams.clear();
        Ok(())
    }

    fn serialize(&self) -> Properties {
        let mut out = Properties::new();
        props::put_id(&mut out, "id", self.core.id());
        props::put_opt_id(&mut out, "context", self.context.as_ref().map(Link::id));
        props::put_str(&mut out, "type", &self.kind);
        props::put_str(&mut out, "short_name", &self.short_name);
        props::put_str(&mut out, "spatial_distribution", &self.spatial_distribution);
        props::put_value(
            &mut out,
            "factor_values",
            Value::Object(self.factor_values.clone()),
        );
        let samples = self
            .samples
            .iter()
            .map(|sample| Value::Object(sample.to_props()))
            .collect();
        props::put_value(&mut out, "samples", Value::Array(samples));
        props::put_opt_id(&mut out, "description_file", self.description_file.as_ref());
        out
    }

    fn restore(&mut self, db: &Database, this: &Shared<Self>) -> DbResult<()> {
        if let Some(link) = &mut self.context {
            let farm = db.resolve_farm(link.id())?;
            link.bind(&farm);
            farm.borrow_mut()
                .attach_observation_unit(self.core.id().clone(), this);
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
            context: None,
            kind: self.kind.clone(),
            short_name: self.short_name.clone(),
            spatial_distribution: self.spatial_distribution.clone(),
            factor_values: self.factor_values.clone(),
            samples: self.samples.clone(),
            description_file: None,
            scans: LinkSet::new(),
            analyses: LinkSet::new(),
            datastreams: LinkSet::new(),
        }
    }
}
