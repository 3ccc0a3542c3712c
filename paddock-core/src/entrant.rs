use serde::{Deserialize, Serialize};
use std::fmt;

pub use uuid::Uuid;

use crate::entity_location::EntityLocation;
use crate::telemetry::TelemetrySample;

// Slot in the race director's flat entrant table
pub type EntrantID = usize;

// Opaque identity the collision layer attaches to every checkpoint report
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransponderID(pub Uuid);

impl TransponderID {
    pub fn new() -> Self {
        TransponderID(Uuid::new_v4())
    }
}

impl fmt::Display for TransponderID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DriverProfile {
    pub name: String,
}

impl DriverProfile {
    pub fn new(name: &str) -> Self {
        DriverProfile {
            name: name.to_string(),
        }
    }
}

/// The car as seen by race control. Forces, rendering and input all live
/// behind this trait; race control only moves the car to the grid and reads
/// its telemetry when a checkpoint report arrives.
pub trait Car: Send {
    fn setup_for_driver(&mut self, _driver: &DriverProfile) {}

    fn place_on_grid(&mut self, slot: &EntityLocation);

    fn telemetry(&self) -> TelemetrySample;
}

pub struct RaceEntrant {
    pub driver: DriverProfile,
    pub car: Box<dyn Car>,
}

impl RaceEntrant {
    pub fn new(driver: DriverProfile, car: Box<dyn Car>) -> Self {
        RaceEntrant { driver, car }
    }
}
