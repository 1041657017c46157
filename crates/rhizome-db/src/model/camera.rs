//! Imaging hardware: cameras and the devices that move them.

use rhizome_types::Properties;
use serde_json::Value;

use crate::entity::{Entity, EntityCore};
use crate::error::DbResult;
use crate::props;
use crate::values::{Parameters, SoftwareModule};

#[derive(Debug)]
pub struct Camera {
    core: EntityCore,
    short_name: String,
    name: String,
    description: String,
    lens: String,
    software_module: SoftwareModule,
    parameters: Parameters,
}

impl Camera {
    pub(crate) fn with_core(core: EntityCore) -> Self {
        Self {
            core,
            short_name: String::new(),
            name: String::new(),
            description: String::new(),
            lens: String::new(),
            software_module: SoftwareModule::default(),
            parameters: Parameters::default(),
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

    pub fn lens(&self) -> &str {
        &self.lens
    }

    pub fn software_module(&self) -> &SoftwareModule {
        &self.software_module
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn set_parameter(&mut self, key: &str, value: Value) {
        self.parameters.set(key, value);
        self.core.mark_modified();
    }
}

impl Entity for Camera {
    const CLASSNAME: &'static str = "Camera";

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
        self.lens = props::optional_str(props, "lens")?;
        self.software_module =
            SoftwareModule::from_props(props::require_object(props, "software_module")?)?;
        self.parameters = Parameters::from_props(&props::optional_map(props, "parameters")?);
        Ok(())
    }

    fn serialize(&self) -> Properties {
        let mut out = Properties::new();
        props::put_id(&mut out, "id", self.core.id());
        props::put_str(&mut out, "short_name", &self.short_name);
        props::put_str(&mut out, "name", &self.name);
        props::put_str(&mut out, "description", &self.description);
        props::put_str(&mut out, "lens", &self.lens);
        props::put_value(
            &mut out,
            "software_module",
            Value::Object(self.software_module.to_props()),
        );
        props::put_value(&mut out, "parameters", Value::Object(self.parameters.to_props()));
        out
    }

    fn clone_detached(&self) -> Self {
        Self {
            core: self.core.detached(),
            short_name: self.short_name.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            lens: self.lens.clone(),
            software_module: self.software_module.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

/// Apparatus that positions a camera during a scan, e.g. a rail or arm.
#[derive(Debug)]
pub struct ScanningDevice {
    core: EntityCore,
    short_name: String,
    name: String,
    description: String,
    software_module: SoftwareModule,
    parameters: Parameters,
}

impl ScanningDevice {
    pub(crate) fn with_core(core: EntityCore) -> Self {
        Self {
            core,
            short_name: String::new(),
            name: String::new(),
            description: String::new(),
            software_module: SoftwareModule::default(),
            parameters: Parameters::default(),
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

    pub fn software_module(&self) -> &SoftwareModule {
        &self.software_module
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}

impl Entity for ScanningDevice {
    const CLASSNAME: &'static str = "ScanningDevice";

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
        self.software_module =
            SoftwareModule::from_props(props::require_object(props, "software_module")?)?;
        self.parameters = Parameters::from_props(&props::optional_map(props, "parameters")?);
        Ok(())
    }

    fn serialize(&self) -> Properties {
        let mut out = Properties::new();
        props::put_id(&mut out, "id", self.core.id());
        props::put_str(&mut out, "short_name", &self.short_name);
        props::put_str(&mut out, "name", &self.name);
        props::put_str(&mut out, "description", &self.description);
        props::put_value(
            &mut out,
            "software_module",
            Value::Object(self.software_module.to_props()),
        );
        props::put_value(&mut out, "parameters", Value::Object(self.parameters.to_props()));
        out
    }

    fn clone_detached(&self) -> Self {
        Self {
            core: self.core.detached(),
            short_name: self.short_name.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            software_module: self.software_module.clone(),
            parameters: self.parameters.clone(),
        }
    }
}
