//! The concrete record types of the phenotyping data model.

mod analysis;
mod biological_material;
mod camera;
mod datastream;
mod farm;
mod note;
mod observation_unit;
mod person;
mod scan;
mod zone;

pub use analysis::{Analysis, Task};
pub use biological_material::BiologicalMaterial;
pub use camera::{Camera, ScanningDevice};
pub use datastream::{DataStream, Observable, Unit};
pub use farm::Farm;
pub use note::Note;
pub use observation_unit::ObservationUnit;
pub use person::Person;
pub use scan::Scan;
pub use zone::Zone;
