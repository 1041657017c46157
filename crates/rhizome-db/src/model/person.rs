use rhizome_types::Properties;

use crate::entity::{Entity, EntityCore};
use crate::error::DbResult;
use crate::props;

/// Someone involved in running a farm or producing its data.
#[derive(Debug)]
pub struct Person {
    core: EntityCore,
    short_name: String,
    name: String,
    email: String,
    affiliation: String,
    role: String,
}

impl Person {
    pub(crate) fn with_core(core: EntityCore) -> Self {
        Self {
            core,
            short_name: String::new(),
            name: String::new(),
            email: String::new(),
            affiliation: String::new(),
            role: String::new(),
        }
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn affiliation(&self) -> &str {
        &self.affiliation
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = email.to_string();
        self.core.mark_modified();
    }

    pub fn set_affiliation(&mut self, affiliation: &str) {
        self.affiliation = affiliation.to_string();
        self.core.mark_modified();
    }

    pub fn set_role(&mut self, role: &str) {
        self.role = role.to_string();
        self.core.mark_modified();
    }
}

impl Entity for Person {
    const CLASSNAME: &'static str = "Person";

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
        self.email = props::require_str(props, "email")?;
        self.affiliation = props::require_str(props, "affiliation")?;
        self.role = props::require_str(props, "role")?;
        Ok(())
    }

    fn serialize(&self) -> Properties {
        let mut out = Properties::new();
        props::put_id(&mut out, "id", self.core.id());
        props::put_str(&mut out, "short_name", &self.short_name);
        props::put_str(&mut out, "name", &self.name);
        props::put_str(&mut out, "email", &self.email);
        props::put_str(&mut out, "affiliation", &self.affiliation);
        props::put_str(&mut out, "role", &self.role);
        out
    }

    fn clone_detached(&self) -> Self {
        Self {
            core: self.core.detached(),
            short_name: self.short_name.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            affiliation: self.affiliation.clone(),
            role: self.role.clone(),
        }
    }
}
