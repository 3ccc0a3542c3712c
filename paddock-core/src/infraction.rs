use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::severity::Severity;
use crate::telemetry::{Seconds, TelemetrySample};
use crate::track::{checkpoint_points, CheckpointIndex, CheckpointPoints};

// One per checkpoint report, stamped with the car's telemetry at that moment.
// Despite the name, on-track crossings produce one too.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct InfractionRecord {
    pub checkpoint: CheckpointPoints,
    pub time: Seconds,
    pub position: DVec3,
    pub speed: f64,
    pub acceleration: f64,
    pub severity: Severity,
}

impl InfractionRecord {
    pub fn new(checkpoint: CheckpointIndex, sample: &TelemetrySample, severity: Severity) -> Self {
        InfractionRecord {
            checkpoint: checkpoint_points(checkpoint),
            time: sample.time,
            position: sample.position,
            speed: sample.speed,
            acceleration: sample.acceleration,
            severity,
        }
    }
}
