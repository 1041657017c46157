//! Analyses and their processing tasks.

use rhizome_types::{Id, Properties};
use serde_json::Value;

use crate::database::Database;
use crate::entity::{Entity, EntityCore, Shared};
use crate::error::DbResult;
use crate::files::FileRecord;
use crate::link::Link;
use crate::model::{ObservationUnit, Scan, Zone};
use crate::props;
use crate::state::State;
use crate::values::{ObservedVariable, Parameters, SoftwareModule};

/// One processing step inside an analysis. Tasks are embedded in their
/// analysis record and have no envelope of their own.
#[derive(Clone, Debug)]
pub struct Task {
    pub id: Id,
    pub short_name: String,
    pub software_module: SoftwareModule,
    pub parameters: Parameters,
    pub state: State,
    /// Ids of the file records consumed and produced by this task.
    pub input_files: Vec<Id>,
    pub output_files: Vec<Id>,
    pub log_file: Option<Id>,
}

impl Task {
    pub fn from_props(props: &Properties) -> DbResult<Self> {
        let state = parse_state(props)?;
        Ok(Self {
            id: props::optional_id(props, "id")?.unwrap_or_else(Id::generate),
            short_name: props::require_str(props, "short_name")?,
            software_module: SoftwareModule::from_props(props::require_object(
                props,
                "software_module",
            )?)?,
            parameters: Parameters::from_props(&props::optional_map(props, "parameters")?),
            state,
            input_files: props::id_list(props, "input_files")?,
            output_files: props::id_list(props, "output_files")?,
            log_file: props::optional_id(props, "log_file")?,
        })
    }

    pub fn to_props(&self) -> Properties {
        let mut out = Properties::new();
        props::put_id(&mut out, "id", &self.id);
        props::put_str(&mut out, "short_name", &self.short_name);
        props::put_value(
            &mut out,
            "software_module",
            Value::Object(self.software_module.to_props()),
        );
        props::put_value(&mut out, "parameters", Value::Object(self.parameters.to_props()));
        props::put_str(&mut out, "state", self.state.as_str());
        props::put_id_list(&mut out, "input_files", self.input_files.iter());
        props::put_id_list(&mut out, "output_files", self.output_files.iter());
        props::put_opt_id(&mut out, "log_file", self.log_file.as_ref());
        out
    }

    pub fn add_input_file(&mut self, id: Id) {
        self.input_files.push(id);
    }

    pub fn add_output_file(&mut self, id: Id) {
        self.output_files.push(id);
    }

    /// A re-runnable copy: fresh id, reset to `Defined`, inputs and log
    /// cleared, outputs kept as the template for the next run.
    pub fn clone_reset(&self) -> Self {
        Self {
            id: Id::generate(),
            short_name: self.short_name.clone(),
            software_module: self.software_module.clone(),
            parameters: self.parameters.clone(),
            state: State::Defined,
            input_files: Vec::new(),
            output_files: self.output_files.clone(),
            log_file: None,
        }
    }
}

/// An absent or empty `state` property reads as `Defined`.
fn parse_state(props: &Properties) -> DbResult<State> {
    let s = props::optional_str(props, "state")?;
    if s.is_empty() {
        Ok(State::Defined)
    } else {
        s.parse()
    }
}

/// A data-processing pipeline applied to scans or datastreams.
#[derive(Debug)]
pub struct Analysis {
    core: EntityCore,
    zone: Option<Link<Zone>>,
    scan: Option<Link<Scan>>,
    observation_unit: Option<Link<ObservationUnit>>,
    short_name: String,
    name: String,
    description: String,
    state: State,
    observed_variables: Vec<ObservedVariable>,
    tasks: Vec<Task>,
}

impl Analysis {
    pub(crate) fn with_core(core: EntityCore) -> Self {
        Self {
            core,
            zone: None,
            scan: None,
            observation_unit: None,
            short_name: String::new(),
            name: String::new(),
            description: String::new(),
            state: State::Defined,
            observed_variables: Vec::new(),
            tasks: Vec::new(),
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

    pub fn state(&self) -> State {
        self.state
    }

    pub fn set_state(&mut self, state: State) {
        self.state = state;
        self.core.mark_modified();
    }

    pub fn zone_id(&self) -> Option<&Id> {
        self.zone.as_ref().map(Link::id)
    }

    pub fn zone(&self) -> Option<Shared<Zone>> {
        self.zone.as_ref().and_then(Link::upgrade)
    }

    pub fn scan_id(&self) -> Option<&Id> {
        self.scan.as_ref().map(Link::id)
    }

    pub fn scan(&self) -> Option<Shared<Scan>> {
        self.scan.as_ref().and_then(Link::upgrade)
    }

    pub fn observation_unit(&self) -> Option<Shared<ObservationUnit>> {
        self.observation_unit.as_ref().and_then(Link::upgrade)
    }

    pub fn observed_variables(&self) -> &[ObservedVariable] {
        &self.observed_variables
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
        self.core.mark_modified();
    }

    pub fn get_task(&self, id_or_short_name: &str) -> Option<&Task> {
        self.tasks
            .iter()
            .find(|task| task.id.as_str() == id_or_short_name)
            .or_else(|| {
                self.tasks
                    .iter()
                    .find(|task| task.short_name == id_or_short_name)
            })
    }

    pub fn get_task_mut(&mut self, id_or_short_name: &str) -> Option<&mut Task> {
        self.core.mark_modified();
        let by_id = self
            .tasks
            .iter()
            .position(|task| task.id.as_str() == id_or_short_name);
        let index = by_id.or_else(|| {
            self.tasks
                .iter()
                .position(|task| task.short_name == id_or_short_name)
        })?;
        self.tasks.get_mut(index)
    }

    /// The results file this analysis produced, if stored yet.
    pub fn results_file(&self) -> DbResult<Option<FileRecord>> {
        let db = self.core.database()?;
        Ok(db
            .select_files(
                Some(&self.short_name),
                Some(self.core.id()),
                Some("results"),
            )
            .into_iter()
            .next())
    }
}

impl Entity for Analysis {
    const CLASSNAME: &'static str = "Analysis";

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn parse(&mut self, props: &Properties) -> DbResult<()> {
        self.core.take_id(props)?;
        self.zone = props::optional_id(props, "zone")?.map(Link::dangling);
        self.scan = props::optional_id(props, "scan")?.map(Link::dangling);
        self.observation_unit = props::optional_id(props, "observation_unit")?.map(Link::dangling);
        self.short_name = props::require_str(props, "short_name")?;
        self.name = props::optional_str(props, "name")?;
        self.description = props::optional_str(props, "description")?;
        self.state = parse_state(props)?;
        self.observed_variables = props::object_list(props, "observed_variables")?
            .into_iter()
            .map(ObservedVariable::from_props)
            .collect::<DbResult<_>>()?;
        self.tasks = props::object_list(props, "tasks")?
            .into_iter()
            .map(Task::from_props)
            .collect::<DbResult<_>>()?;
        Ok(())
    }

    fn serialize(&self) -> Properties {
        let mut out = Properties::new();
        props::put_id(&mut out, "id", self.core.id());
        props::put_opt_id(&mut out, "zone", self.zone.as_ref().map(Link::id));
        props::put_opt_id(&mut out, "scan", self.scan.as_ref().map(Link::id));
        props::put_opt_id(
            &mut out,
            "observation_unit",
            self.observation_unit.as_ref().map(Link::id),
        );
        props::put_str(&mut out, "short_name", &self.short_name);
        props::put_str(&mut out, "name", &self.name);
        props::put_str(&mut out, "description", &self.description);
        props::put_str(&mut out, "state", self.state.as_str());
        let variables = self
            .observed_variables
            .iter()
            .map(|variable| Value::Object(variable.to_props()))
            .collect();
        props::put_value(&mut out, "observed_variables", Value::Array(variables));
        let tasks = self
            .tasks
            .iter()
            .map(|task| Value::Object(task.to_props()))
            .collect();
        props::put_value(&mut out, "tasks", Value::Array(tasks));
        out
    }

    fn restore(&mut self, db: &Database, this: &Shared<Self>) -> DbResult<()> {
        if let Some(link) = &mut self.zone {
            let zone = db.resolve_zone(link.id())?;
            link.bind(&zone);
            zone.borrow_mut()
                .attach_analysis(self.core.id().clone(), this);
        }
        if let Some(link) = &mut self.scan {
            let scan = db.resolve_scan(link.id())?;
            link.bind(&scan);
            scan.borrow_mut()
                .attach_analysis(self.core.id().clone(), this);
        }
        if let Some(link) = &mut self.observation_unit {
            let unit = db.resolve_observation_unit(link.id())?;
            link.bind(&unit);
            unit.borrow_mut()
                .attach_analysis(self.core.id().clone(), this);
        }
        Ok(())
    }

    fn clone_detached(&self) -> Self {
        Self {
            core: self.core.detached(),
            zone: None,
            scan: None,
            observation_unit: None,
            short_name: self.short_name.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            state: State::Defined,
            observed_variables: self.observed_variables.clone(),
            tasks: self.tasks.iter().map(Task::clone_reset).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use serde_json::json;
    use std::rc::Weak;

    fn analysis_props() -> Properties {
        json!({
            "zone": "zone01",
            "scan": "scan01",
            "observation_unit": "",
            "short_name": "stitching",
            "name": "Image stitching",
            "description": "",
            "state": "Finished",
            "observed_variables": [
                {
                    "id": "ov1",
                    "name": "plant height",
                    "trait": "height",
                    "scale": "cm",
                    "time_scale": "",
                }
            ],
            "tasks": [
                {
                    "id": "task0001",
                    "short_name": "stitch",
                    "software_module": {
                        "id": "romi.stitching",
                        "version": "0.3",
                        "repository": "",
                        "branch": "",
                    },
                    "parameters": { "overlap": 0.6 },
                    "state": "Finished",
                    "input_files": ["f1", "f2"],
                    "output_files": ["f3"],
                    "log_file": "",
                }
            ],
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn roundtrip() {
        let mut analysis = Analysis::with_core(EntityCore::new(Weak::new()));
        analysis.parse(&analysis_props()).unwrap();
        assert_eq!(analysis.state(), State::Finished);
        assert_eq!(analysis.tasks().len(), 1);

        let out = analysis.serialize();
        assert_eq!(out["state"], json!("Finished"));
        let mut reparsed = Analysis::with_core(EntityCore::new(Weak::new()));
        reparsed.parse(&out).unwrap();
        assert_eq!(reparsed.serialize(), out);
    }

    #[test]
    fn short_name_is_required() {
        let mut props = analysis_props();
        props.remove("short_name");
        let mut analysis = Analysis::with_core(EntityCore::new(Weak::new()));
        assert!(matches!(
            analysis.parse(&props),
            Err(DbError::MissingField { key }) if key == "short_name"
        ));
    }

    #[test]
    fn tasks_require_short_name_and_software_module() {
        for key in ["short_name", "software_module"] {
            let mut props = analysis_props();
            props.get_mut("tasks").unwrap()[0]
                .as_object_mut()
                .unwrap()
                .remove(key);
            let mut analysis = Analysis::with_core(EntityCore::new(Weak::new()));
            assert!(matches!(
                analysis.parse(&props),
                Err(DbError::MissingField { key: k }) if k == key
            ));
        }
    }

    #[test]
    fn rejects_invalid_state() {
        let mut props = analysis_props();
        props.insert("state".to_string(), json!("Paused"));
        let mut analysis = Analysis::with_core(EntityCore::new(Weak::new()));
        assert!(matches!(
            analysis.parse(&props),
            Err(DbError::InvalidState(s)) if s == "Paused"
        ));
    }

    #[test]
    fn absent_state_defaults_to_defined() {
        let mut props = analysis_props();
        props.remove("state");
        let mut analysis = Analysis::with_core(EntityCore::new(Weak::new()));
        analysis.parse(&props).unwrap();
        assert_eq!(analysis.state(), State::Defined);
    }

    #[test]
    fn task_lookup_by_id_or_short_name() {
        let mut analysis = Analysis::with_core(EntityCore::new(Weak::new()));
        analysis.parse(&analysis_props()).unwrap();
        assert!(analysis.get_task("task0001").is_some());
        assert!(analysis.get_task("stitch").is_some());
        assert!(analysis.get_task("segment").is_none());
    }

    #[test]
    fn clone_detached_resets_state_and_tasks() {
        let mut analysis = Analysis::with_core(EntityCore::new(Weak::new()));
        analysis.parse(&analysis_props()).unwrap();
        let copy = analysis.clone_detached();
        assert_eq!(copy.state(), State::Defined);
        assert!(copy.zone_id().is_none());
        let task = &copy.tasks()[0];
        assert_eq!(task.state, State::Defined);
        assert!(task.input_files.is_empty());
        assert_eq!(task.output_files.len(), 1);
        assert_ne!(task.id, analysis.tasks()[0].id);
    }
}
