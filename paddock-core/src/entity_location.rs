use glam::DVec3;
use serde::{Deserialize, Serialize};

// Where a car sits and which way it faces; used for starting grid slots
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
pub struct EntityLocation {
    pub position: DVec3,
    #[serde(default = "default_steer_direction")]
    pub unit_steer_direction: DVec3, // should be a normalized vector
}

fn default_steer_direction() -> DVec3 {
    DVec3::Z
}

impl EntityLocation {
    pub fn new(position: DVec3, steer_direction: DVec3) -> Self {
        EntityLocation {
            position,
            unit_steer_direction: steer_direction.normalize_or_zero(),
        }
    }
}
