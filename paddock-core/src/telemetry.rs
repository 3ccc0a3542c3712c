use glam::DVec3;
use serde::{Deserialize, Serialize};

pub type Seconds = f64;

// What the physics layer knows about a car at the moment it is asked.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct TelemetrySample {
    pub time: Seconds,
    pub position: DVec3,
    pub speed: f64,        // m/s
    pub acceleration: f64, // m/s^2, magnitude only
}

impl TelemetrySample {
    pub fn at_rest(time: Seconds, position: DVec3) -> Self {
        TelemetrySample {
            time,
            position,
            speed: 0.0,
            acceleration: 0.0,
        }
    }
}
