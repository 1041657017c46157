use rhizome_types::Properties;

use crate::entity::{Entity, EntityCore};
use crate::error::DbResult;
use crate::props;

/// Taxonomic description of the plant material under observation.
#[derive(Debug)]
pub struct BiologicalMaterial {
    core: EntityCore,
    short_name: String,
    description: String,
    genus: String,
    species: String,
    intraspecific_name: String,
    source_id: String,
    source_doi: String,
}

impl BiologicalMaterial {
    pub(crate) fn with_core(core: EntityCore) -> Self {
        Self {
            core,
            short_name: String::new(),
            description: String::new(),
            genus: String::new(),
            species: String::new(),
            intraspecific_name: String::new(),
            source_id: String::new(),
            source_doi: String::new(),
        }
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn genus(&self) -> &str {
        &self.genus
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn intraspecific_name(&self) -> &str {
        &self.intraspecific_name
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn source_doi(&self) -> &str {
        &self.source_doi
    }
}

impl Entity for BiologicalMaterial {
    const CLASSNAME: &'static str = "BiologicalMaterial";

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn parse(&mut self, props: &Properties) -> DbResult<()> {
        self.core.take_id(props)?;
        self.short_name = props::require_str(props, "short_name")?;
        self.description = props::optional_str(props, "description")?;
        self.genus = props::require_str(props, "genus")?;
        self.species = props::require_str(props, "species")?;
        self.intraspecific_name = props::optional_str(props, "intraspecific_name")?;
        self.source_id = props::optional_str(props, "source_id")?;
        self.source_doi = props::optional_str(props, "source_doi")?;
        Ok(())
    }

    fn serialize(&self) -> Properties {
        let mut out = Properties::new();
        props::put_id(&mut out, "id", self.core.id());
        props::put_str(&mut out, "short_name", &self.short_name);
        props::put_str(&mut out, "description", &self.description);
        props::put_str(&mut out, "genus", &self.genus);
        props::put_str(&mut out, "species", &self.species);
        props::put_str(&mut out, "intraspecific_name", &self.intraspecific_name);
        props::put_str(&mut out, "source_id", &self.source_id);
        props::put_str(&mut out, "source_doi", &self.source_doi);
        out
    }

    fn clone_detached(&self) -> Self {
        Self {
            core: self.core.detached(),
            short_name: self.short_name.clone(),
            description: self.description.clone(),
            genus: self.genus.clone(),
            species: self.species.clone(),
            intraspecific_name: self.intraspecific_name.clone(),
            source_id: self.source_id.clone(),
            source_doi: self.source_doi.clone(),
        }
    }
}
