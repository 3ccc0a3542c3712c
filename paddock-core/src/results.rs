use serde::{Deserialize, Serialize};

use crate::entrant::EntrantID;
use crate::lap_ledger::{LapNumber, LapTime};
use crate::severity::Severity;
use crate::telemetry::Seconds;

pub type Placement = u8;

const MPS_TO_KMH: f64 = 3.6;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LapReport {
    pub driver: String,
    pub lap: LapNumber,
    pub lap_time: LapTime,
}

// Summary of one punishable off-track excursion, handed to whatever applies
// penalties. Speeds are in m/s.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PenaltyReport {
    pub entrant: EntrantID,
    pub infraction_count: usize,
    pub worst_severity: Severity,
    pub duration: Seconds,
    pub distance: f64,
    pub average_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
}

impl PenaltyReport {
    pub fn average_speed_kmh(&self) -> f64 {
        self.average_speed * MPS_TO_KMH
    }

    pub fn min_speed_kmh(&self) -> f64 {
        self.min_speed * MPS_TO_KMH
    }

    pub fn max_speed_kmh(&self) -> f64 {
        self.max_speed * MPS_TO_KMH
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PenaltyNotice {
    pub driver: String,
    pub lap: LapNumber,
    pub report: PenaltyReport,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Standing {
    pub driver: String,
    pub position: Placement,
    pub laps: LapNumber,
    pub total_time: Option<Seconds>,
    pub fastest_lap: Option<Seconds>,
    pub theoretical_fastest_lap: Option<Seconds>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_conversion() {
        let report = PenaltyReport {
            entrant: 0,
            infraction_count: 2,
            worst_severity: Severity::InCorner,
            duration: 2.0,
            distance: 50.0,
            average_speed: 25.0,
            min_speed: 10.0,
            max_speed: 40.0,
        };

        assert!((report.average_speed_kmh() - 90.0).abs() < 1e-9);
        assert!((report.min_speed_kmh() - 36.0).abs() < 1e-9);
        assert!((report.max_speed_kmh() - 144.0).abs() < 1e-9);
    }
}
