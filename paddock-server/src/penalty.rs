use std::collections::{HashMap, HashSet};
use tracing::debug;

use paddock_core::entrant::EntrantID;
use paddock_core::infraction::InfractionRecord;
use paddock_core::results::PenaltyReport;
use paddock_core::severity::Severity;
use paddock_core::track::CheckpointPoints;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvestigationState<'a> {
    Clear,
    UnderInvestigation(&'a [InfractionRecord]),
}

/// Collects a run of off-track reports per driver and, once the driver is
/// back on track, decides whether the excursion skipped a checkpoint badly
/// enough to be punished.
pub struct PenaltyInvestigator {
    investigation_trigger: Severity,
    penalty_threshold: Severity,
    investigations: HashMap<EntrantID, Vec<InfractionRecord>>,
}

impl PenaltyInvestigator {
    pub fn new(investigation_trigger: Severity, penalty_threshold: Severity) -> Self {
        PenaltyInvestigator {
            investigation_trigger,
            penalty_threshold,
            investigations: HashMap::new(),
        }
    }

    pub fn state(&self, entrant: EntrantID) -> InvestigationState {
        match self.investigations.get(&entrant) {
            Some(pending) => InvestigationState::UnderInvestigation(pending),
            None => InvestigationState::Clear,
        }
    }

    pub fn is_investigating(&self, entrant: EntrantID) -> bool {
        self.investigations.contains_key(&entrant)
    }

    pub fn clear(&mut self, entrant: EntrantID) {
        if let Some(pending) = self.investigations.remove(&entrant) {
            debug!(
                "dropping open investigation of entrant {} with {} pending reports",
                entrant,
                pending.len()
            );
        }
    }

    /// Feeds one checkpoint report through the entrant's investigation.
    /// `passed` is the set of checkpoints the entrant crossed on track this
    /// lap, including the one being reported when it was on track.
    pub fn report(
        &mut self,
        entrant: EntrantID,
        infraction: InfractionRecord,
        passed: &HashSet<CheckpointPoints>,
    ) -> Option<PenaltyReport> {
        if !self.investigations.contains_key(&entrant) {
            if infraction.severity.is_on_track() || infraction.severity < self.investigation_trigger {
                return None;
            }

            if passed.contains(&infraction.checkpoint) {
                // touched the off-track sensor of a checkpoint already crossed properly
                return None;
            }

            debug!(
                "entrant {} under investigation at checkpoint {} ({})",
                entrant, infraction.checkpoint, infraction.severity
            );
            self.investigations.insert(entrant, vec![infraction]);
            return None;
        }

        if infraction.severity.is_on_track() {
            let pending = self.investigations.remove(&entrant)?;
            return self.resolve(entrant, pending, Some(&infraction), passed);
        }

        if passed.contains(&infraction.checkpoint) {
            return None;
        }

        if let Some(pending) = self.investigations.get_mut(&entrant) {
            pending.push(infraction);
        }
        None
    }

    /// Judges whatever is still pending when the entrant's lap is closed,
    /// using only the pending samples. `passed` is the closed lap's set.
    pub fn close(
        &mut self,
        entrant: EntrantID,
        passed: &HashSet<CheckpointPoints>,
    ) -> Option<PenaltyReport> {
        let pending = self.investigations.remove(&entrant)?;
        debug!(
            "closing investigation of entrant {} at the end of the lap",
            entrant
        );
        self.resolve(entrant, pending, None, passed)
    }

    fn resolve(
        &self,
        entrant: EntrantID,
        mut pending: Vec<InfractionRecord>,
        resolving: Option<&InfractionRecord>,
        passed: &HashSet<CheckpointPoints>,
    ) -> Option<PenaltyReport> {
        // brief excursions next to checkpoints that were still crossed on track
        pending.retain(|infraction| !passed.contains(&infraction.checkpoint));
        if pending.is_empty() {
            debug!("entrant {} cleared, no checkpoint was skipped", entrant);
            return None;
        }

        let infraction_count = pending.len();
        let mut samples = pending;
        samples.extend(resolving.copied());

        let worst_severity = samples
            .iter()
            .map(|sample| sample.severity)
            .max()
            .unwrap_or(Severity::OnTrack);
        if worst_severity <= self.penalty_threshold {
            debug!(
                "entrant {} excursion ({}) below penalty threshold",
                entrant, worst_severity
            );
            return None;
        }

        let first = samples.first()?;
        let last = samples.last()?;
        let duration = last.time - first.time;
        let distance: f64 = samples
            .windows(2)
            .map(|pair| pair[0].position.distance(pair[1].position))
            .sum();

        let min_speed = samples.iter().map(|s| s.speed).fold(f64::INFINITY, f64::min);
        let max_speed = samples.iter().map(|s| s.speed).fold(f64::NEG_INFINITY, f64::max);
        let average_speed = if duration > 0.0 {
            distance / duration
        } else {
            samples.iter().map(|s| s.speed).sum::<f64>() / samples.len() as f64
        };

        Some(PenaltyReport {
            entrant,
            infraction_count,
            worst_severity,
            duration,
            distance,
            average_speed,
            min_speed,
            max_speed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use paddock_core::telemetry::TelemetrySample;
    use paddock_core::track::CheckpointIndex;

    fn record(
        index: CheckpointIndex,
        time: f64,
        x: f64,
        speed: f64,
        severity: Severity,
    ) -> InfractionRecord {
        let sample = TelemetrySample {
            time,
            position: DVec3::new(x, 0.0, 0.0),
            speed,
            acceleration: 0.0,
        };
        InfractionRecord::new(index, &sample, severity)
    }

    fn passed(points: &[CheckpointPoints]) -> HashSet<CheckpointPoints> {
        points.iter().copied().collect()
    }

    fn get_investigator() -> PenaltyInvestigator {
        PenaltyInvestigator::new(Severity::OffTrack, Severity::OffTrack)
    }

    #[test]
    fn test_on_track_report_while_clear_does_nothing() {
        let mut investigator = get_investigator();
        let report = investigator.report(0, record(0, 1.0, 0.0, 30.0, Severity::OnTrack), &passed(&[1]));

        assert_eq!(report, None);
        assert_eq!(investigator.state(0), InvestigationState::Clear);
    }

    #[test]
    fn test_already_passed_checkpoint_is_false_alarm() {
        let mut investigator = get_investigator();
        // checkpoint 2 (points 3) was crossed on track a moment ago
        let report = investigator.report(
            0,
            record(2, 5.0, 0.0, 30.0, Severity::InCornerApex),
            &passed(&[1, 2, 3]),
        );

        assert_eq!(report, None);
        assert!(!investigator.is_investigating(0));
    }

    #[test]
    fn test_investigation_is_per_entrant() {
        let mut investigator = get_investigator();
        investigator.report(1, record(2, 5.0, 0.0, 30.0, Severity::InCorner), &passed(&[1, 2]));

        assert!(investigator.is_investigating(1));
        assert!(!investigator.is_investigating(0));
    }

    #[test]
    fn test_skipped_checkpoint_is_punished() {
        let mut investigator = get_investigator();
        let on_lap = passed(&[1, 2]);

        investigator.report(0, record(2, 10.0, 0.0, 40.0, Severity::InCorner), &on_lap);
        investigator.report(0, record(2, 11.0, 30.0, 20.0, Severity::InCornerApex), &on_lap);
        match investigator.state(0) {
            InvestigationState::UnderInvestigation(pending) => assert_eq!(pending.len(), 2),
            InvestigationState::Clear => panic!("expected an open investigation"),
        }

        // back on track at checkpoint 3, checkpoint 2 was never crossed on track
        let report = investigator
            .report(0, record(3, 12.0, 70.0, 30.0, Severity::OnTrack), &passed(&[1, 2, 4]))
            .expect("excursion should be punished");

        assert_eq!(report.infraction_count, 2);
        assert_eq!(report.worst_severity, Severity::InCornerApex);
        assert!((report.duration - 2.0).abs() < 1e-9);
        assert!((report.distance - 70.0).abs() < 1e-9);
        assert!((report.average_speed - 35.0).abs() < 1e-9);
        assert_eq!(report.min_speed, 20.0);
        assert_eq!(report.max_speed, 40.0);
        assert_eq!(investigator.state(0), InvestigationState::Clear);
    }

    #[test]
    fn test_minor_excursion_is_cleared_without_penalty() {
        let mut investigator = get_investigator();

        investigator.report(0, record(2, 10.0, 0.0, 40.0, Severity::OffTrack), &passed(&[1, 2]));
        assert!(investigator.is_investigating(0));

        let report = investigator.report(0, record(3, 12.0, 50.0, 30.0, Severity::OnTrack), &passed(&[1, 2, 4]));
        assert_eq!(report, None);
        assert!(!investigator.is_investigating(0));
    }

    #[test]
    fn test_checkpoint_crossed_after_all_is_forgiven() {
        let mut investigator = get_investigator();

        investigator.report(0, record(2, 10.0, 0.0, 40.0, Severity::InCornerApex), &passed(&[1, 2]));
        // the car rejoined and crossed checkpoint 2 on track, that report resolves
        let report = investigator.report(0, record(2, 11.0, 5.0, 35.0, Severity::OnTrack), &passed(&[1, 2, 3]));

        assert_eq!(report, None);
        assert!(!investigator.is_investigating(0));
    }

    #[test]
    fn test_reports_for_passed_checkpoints_are_not_evidence() {
        let mut investigator = get_investigator();
        let on_lap = passed(&[1, 2]);

        investigator.report(0, record(2, 10.0, 0.0, 40.0, Severity::InCornerApex), &on_lap);
        investigator.report(0, record(1, 10.5, 5.0, 40.0, Severity::InCornerApex), &on_lap);

        match investigator.state(0) {
            InvestigationState::UnderInvestigation(pending) => assert_eq!(pending.len(), 1),
            InvestigationState::Clear => panic!("expected an open investigation"),
        }
    }

    #[test]
    fn test_trigger_severity_is_configurable() {
        let mut investigator = PenaltyInvestigator::new(Severity::InCornerApex, Severity::OffTrack);

        investigator.report(0, record(2, 10.0, 0.0, 40.0, Severity::InCorner), &passed(&[1, 2]));
        assert!(!investigator.is_investigating(0));

        investigator.report(0, record(2, 10.2, 0.0, 40.0, Severity::InCornerApex), &passed(&[1, 2]));
        assert!(investigator.is_investigating(0));

        investigator.clear(0);
        assert!(!investigator.is_investigating(0));
    }

    #[test]
    fn test_closing_lap_judges_pending_samples() {
        let mut investigator = get_investigator();
        let on_lap = passed(&[1, 2, 3]);

        // cut across the finish line, the lap is closed before any on-track report
        investigator.report(0, record(3, 4.0, 40.0, 25.0, Severity::InCornerApex), &on_lap);
        let report = investigator
            .close(0, &on_lap)
            .expect("finish line cut should be punished");

        assert_eq!(report.infraction_count, 1);
        assert_eq!(report.worst_severity, Severity::InCornerApex);
        assert_eq!(report.duration, 0.0);
        assert_eq!(report.distance, 0.0);
        assert!((report.average_speed - 25.0).abs() < 1e-9);
        assert!(!investigator.is_investigating(0));

        assert_eq!(investigator.close(0, &on_lap), None);
    }

    #[test]
    fn test_closing_lap_below_threshold_clears() {
        let mut investigator = get_investigator();

        investigator.report(0, record(3, 4.0, 40.0, 25.0, Severity::OffTrack), &passed(&[1, 2, 3]));
        assert_eq!(investigator.close(0, &passed(&[1, 2, 3])), None);
        assert!(!investigator.is_investigating(0));
    }

    #[test]
    fn test_single_sample_excursion_uses_mean_speed() {
        let mut investigator = get_investigator();

        investigator.report(0, record(2, 10.0, 0.0, 40.0, Severity::InCorner), &passed(&[1, 2]));
        let report = investigator
            .report(0, record(3, 10.0, 0.0, 20.0, Severity::OnTrack), &passed(&[1, 2, 4]))
            .unwrap();

        assert_eq!(report.duration, 0.0);
        assert!((report.average_speed - 30.0).abs() < 1e-9);
    }
}
