//! Embedded value objects.
//!
//! These types have no identity in the store and no envelope of their own;
//! they are constructed eagerly by their holding record during parse and
//! serialized inline into its property map.

use rhizome_types::Properties;
use serde_json::Value;

use crate::error::DbResult;
use crate::props;

/// A piece of software involved in producing data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SoftwareModule {
    pub id: String,
    pub version: String,
    pub repository: String,
    pub branch: String,
}

impl SoftwareModule {
    pub fn from_props(props: &Properties) -> DbResult<Self> {
        Ok(Self {
            id: props::require_str(props, "id")?,
            version: props::require_str(props, "version")?,
            repository: props::optional_str(props, "repository")?,
            branch: props::optional_str(props, "branch")?,
        })
    }

    pub fn to_props(&self) -> Properties {
        let mut out = Properties::new();
        props::put_str(&mut out, "id", &self.id);
        props::put_str(&mut out, "version", &self.version);
        props::put_str(&mut out, "repository", &self.repository);
        props::put_str(&mut out, "branch", &self.branch);
        out
    }
}

/// Free-form configuration bag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameters {
    values: Properties,
}

impl Parameters {
    pub fn from_props(props: &Properties) -> Self {
        Self {
            values: props.clone(),
        }
    }

    pub fn to_props(&self) -> Properties {
        self.values.clone()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Trajectory description for a scanning device.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanPath {
    pub short_name: String,
    /// Path kind, stored under the `type` key.
    pub kind: String,
    pub parameters: Parameters,
}

impl ScanPath {
    pub fn from_props(props: &Properties) -> DbResult<Self> {
        Ok(Self {
            short_name: props::require_str(props, "short_name")?,
            kind: props::require_str(props, "type")?,
            parameters: Parameters::from_props(props::require_object(props, "parameters")?),
        })
    }

    pub fn to_props(&self) -> Properties {
        let mut out = Properties::new();
        props::put_str(&mut out, "short_name", &self.short_name);
        props::put_str(&mut out, "type", &self.kind);
        props::put_value(&mut out, "parameters", Value::Object(self.parameters.to_props()));
        out
    }
}

/// Plant material sampled within an observation unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sample {
    pub id: String,
    pub short_name: String,
    pub description: String,
    pub development_stage: String,
    pub anatomical_entity: String,
}

impl Sample {
    pub fn from_props(props: &Properties) -> DbResult<Self> {
        Ok(Self {
            id: props::require_str(props, "id")?,
            short_name: props::require_str(props, "short_name")?,
            description: props::optional_str(props, "description")?,
            development_stage: props::optional_str(props, "development_stage")?,
            anatomical_entity: props::optional_str(props, "anatomical_entity")?,
        })
    }

    pub fn to_props(&self) -> Properties {
        let mut out = Properties::new();
        props::put_str(&mut out, "id", &self.id);
        props::put_str(&mut out, "short_name", &self.short_name);
        props::put_str(&mut out, "description", &self.description);
        props::put_str(&mut out, "development_stage", &self.development_stage);
        props::put_str(&mut out, "anatomical_entity", &self.anatomical_entity);
        out
    }
}

/// A variable an analysis observes, with its trait and scales.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObservedVariable {
    pub id: String,
    pub name: String,
    pub trait_name: String,
    pub scale: String,
    pub time_scale: String,
}

impl ObservedVariable {
    pub fn from_props(props: &Properties) -> DbResult<Self> {
        Ok(Self {
            id: props::require_str(props, "id")?,
            name: props::require_str(props, "name")?,
            trait_name: props::optional_str(props, "trait")?,
            scale: props::optional_str(props, "scale")?,
            time_scale: props::optional_str(props, "time_scale")?,
        })
    }

    pub fn to_props(&self) -> Properties {
        let mut out = Properties::new();
        props::put_str(&mut out, "id", &self.id);
        props::put_str(&mut out, "name", &self.name);
        props::put_str(&mut out, "trait", &self.trait_name);
        props::put_str(&mut out, "scale", &self.scale);
        props::put_str(&mut out, "time_scale", &self.time_scale);
        out
    }
}
