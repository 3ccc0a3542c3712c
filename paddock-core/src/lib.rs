pub mod entity_location;
pub mod entrant;
pub mod error;
pub mod hook;
pub mod infraction;
pub mod lap_ledger;
pub mod results;
pub mod severity;
mod settings;
pub mod telemetry;
pub mod track;

pub use error::{PaddockError, Result};
pub use settings::{Settings, GLOBAL_CONFIG};
