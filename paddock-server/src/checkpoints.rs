use paddock_core::entrant::TransponderID;
use paddock_core::severity::Severity;
use paddock_core::track::CheckpointIndex;

// What the collision layer hands race control whenever a transponder
// overlaps one of a checkpoint's trigger regions
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CheckpointReport {
    pub checkpoint: CheckpointIndex,
    pub transponder: TransponderID,
    pub severity: Severity,
}

pub trait CheckpointSensor {
    fn checkpoint(&self) -> CheckpointIndex;
    fn severity(&self) -> Severity;

    fn report(&self, transponder: TransponderID) -> CheckpointReport {
        CheckpointReport {
            checkpoint: self.checkpoint(),
            transponder,
            severity: self.severity(),
        }
    }
}

// Spans the racing surface; crossing it is a clean pass
#[derive(Clone, Copy, Debug)]
pub struct OnTrackSensor {
    pub checkpoint: CheckpointIndex,
}

impl CheckpointSensor for OnTrackSensor {
    fn checkpoint(&self) -> CheckpointIndex {
        self.checkpoint
    }

    fn severity(&self) -> Severity {
        Severity::OnTrack
    }
}

// Sits beside the track (run-off, kerbs, the inside of a corner) and reports
// with the severity it was placed with
#[derive(Clone, Copy, Debug)]
pub struct OffTrackSensor {
    pub checkpoint: CheckpointIndex,
    pub severity: Severity,
}

impl CheckpointSensor for OffTrackSensor {
    fn checkpoint(&self) -> CheckpointIndex {
        self.checkpoint
    }

    fn severity(&self) -> Severity {
        self.severity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensors_report_their_severity() {
        let transponder = TransponderID::new();
        let on_track = OnTrackSensor { checkpoint: 3 }.report(transponder);
        let apex = OffTrackSensor {
            checkpoint: 3,
            severity: Severity::InCornerApex,
        }
        .report(transponder);

        assert_eq!(on_track.severity, Severity::OnTrack);
        assert_eq!(apex.severity, Severity::InCornerApex);
        assert_eq!(apex.checkpoint, 3);
        assert_eq!(apex.transponder, transponder);
    }
}
