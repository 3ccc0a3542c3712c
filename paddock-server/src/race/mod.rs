use std::collections::{BTreeSet, HashMap};
use tracing::{debug, error, info, warn};

use paddock_core::entrant::{EntrantID, RaceEntrant, TransponderID};
use paddock_core::error::{PaddockError, Result};
use paddock_core::hook::{HookManager, RaceEvent};
use paddock_core::infraction::InfractionRecord;
use paddock_core::lap_ledger::{LapLedger, LapNumber};
use paddock_core::results::{LapReport, PenaltyNotice, PenaltyReport, Placement, Standing};
use paddock_core::severity::Severity;
use paddock_core::telemetry::Seconds;
use paddock_core::track::{CheckpointIndex, Track, VariantID};
use paddock_core::Settings;

use crate::checkpoints::CheckpointReport;
use crate::penalty::PenaltyInvestigator;
use crate::progress::{self, EntrantProgress};

pub use self::phase::RacePhase;

mod phase;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaceRules {
    pub investigation_trigger: Severity,
    pub penalty_threshold: Severity,
}

impl RaceRules {
    pub fn from_settings(settings: &Settings) -> Self {
        RaceRules {
            investigation_trigger: settings.investigation_trigger,
            penalty_threshold: settings.penalty_threshold,
        }
    }
}

impl Default for RaceRules {
    fn default() -> Self {
        RaceRules {
            investigation_trigger: Severity::InCornerApex,
            penalty_threshold: Severity::OffTrack,
        }
    }
}

struct EntrantSlot {
    entrant: RaceEntrant,
    transponder: TransponderID,
    ledger: LapLedger,
    progress: EntrantProgress,
}

/// Race control. Owns the active track, one lap ledger per entrant and the
/// penalty investigator, and turns checkpoint reports into laps, penalties
/// and the final result.
pub struct RaceDirector {
    rules: RaceRules,
    phase: RacePhase,
    track: Option<Track>,
    lap_count: LapNumber,

    entrants: Vec<EntrantSlot>,
    transponder_lookup: HashMap<TransponderID, EntrantID>,
    active: BTreeSet<EntrantID>,
    finished: Vec<EntrantID>,

    // checkpoints of the active variant whose reports are accepted
    subscriptions: Vec<CheckpointIndex>,
    investigator: PenaltyInvestigator,
    hooks: HookManager,
}

impl RaceDirector {
    pub fn new(rules: RaceRules) -> Self {
        RaceDirector {
            rules,
            phase: RacePhase::Unconfigured,
            track: None,
            lap_count: 0,
            entrants: Vec::new(),
            transponder_lookup: HashMap::new(),
            active: BTreeSet::new(),
            finished: Vec::new(),
            subscriptions: Vec::new(),
            investigator: PenaltyInvestigator::new(
                rules.investigation_trigger,
                rules.penalty_threshold,
            ),
            hooks: HookManager::new(),
        }
    }

    /// Activates the variant, puts every car on its grid slot and hands out
    /// one transponder per entrant, in grid order. A `lap_count` of 0 never
    /// finishes the race.
    pub fn setup_race(
        &mut self,
        mut track: Track,
        variant_id: VariantID,
        lap_count: LapNumber,
        entrants: Vec<RaceEntrant>,
    ) -> Result<Vec<TransponderID>> {
        if let Err(e) = track.initialize_variant(variant_id) {
            error!("race setup aborted: {}", e);
            self.phase = RacePhase::Unconfigured;
            self.track = None;
            return Err(e);
        }

        self.subscriptions = track.checkpoints().iter().map(|c| c.index).collect();
        self.entrants.clear();
        self.transponder_lookup.clear();
        self.active.clear();
        self.finished.clear();
        self.investigator = PenaltyInvestigator::new(
            self.rules.investigation_trigger,
            self.rules.penalty_threshold,
        );

        let mut transponders = Vec::with_capacity(entrants.len());
        for (grid_index, mut entrant) in entrants.into_iter().enumerate() {
            entrant.car.setup_for_driver(&entrant.driver);

            match track.grid_slot(grid_index + 1) {
                Some(slot) => entrant.car.place_on_grid(slot),
                None => warn!(
                    "no grid slot {} on {} for {}, car left where it is",
                    grid_index + 1,
                    track.name,
                    entrant.driver.name
                ),
            }

            let transponder = TransponderID::new();
            let id = self.entrants.len();
            self.transponder_lookup.insert(transponder, id);
            self.active.insert(id);
            self.entrants.push(EntrantSlot {
                entrant,
                transponder,
                ledger: LapLedger::new(),
                progress: EntrantProgress::PreRace,
            });
            transponders.push(transponder);
        }

        info!(
            "race set up on {} variant {}: {} entrants, {} laps",
            track.name,
            variant_id,
            self.entrants.len(),
            lap_count
        );

        self.lap_count = lap_count;
        self.track = Some(track);
        self.phase = RacePhase::OnGrid;
        Ok(transponders)
    }

    pub fn start_race(&mut self, now: Seconds) -> Result<()> {
        match self.phase {
            RacePhase::Unconfigured => return Err(PaddockError::RaceNotConfigured),
            RacePhase::OnGrid => {}
            RacePhase::Racing | RacePhase::Finished => return Err(PaddockError::RaceAlreadyStarted),
        }

        for slot in self.entrants.iter_mut() {
            slot.ledger.start_race_timer(now);
            slot.ledger.start_lap_timer(now);
            slot.progress = EntrantProgress::racing(&slot.ledger);
        }

        self.phase = RacePhase::Racing;
        info!("race started at {:.3}s with {} entrants", now, self.entrants.len());
        self.hooks.call(&RaceEvent::RaceStarted);

        if self.active.is_empty() {
            self.end_race();
        }
        Ok(())
    }

    pub fn on_checkpoint_report(&mut self, report: CheckpointReport) {
        match self.process_checkpoint_report(&report) {
            Ok(()) => {}
            Err(e @ PaddockError::RaceNotRunning) | Err(e @ PaddockError::EntrantNotRacing(_)) => {
                debug!("ignoring report for checkpoint {}: {}", report.checkpoint, e);
            }
            Err(e) => error!("dropping report for checkpoint {}: {}", report.checkpoint, e),
        }
    }

    fn process_checkpoint_report(&mut self, report: &CheckpointReport) -> Result<()> {
        if !self.phase.accepts_reports() {
            return Err(PaddockError::RaceNotRunning);
        }

        let id = *self
            .transponder_lookup
            .get(&report.transponder)
            .ok_or(PaddockError::UnknownTransponder(report.transponder))?;

        if !self.subscriptions.contains(&report.checkpoint) {
            return Err(PaddockError::UnknownCheckpoint(report.checkpoint));
        }

        let track = self.track.as_ref().ok_or(PaddockError::RaceNotConfigured)?;
        let checkpoint = *track
            .checkpoint(report.checkpoint)
            .ok_or(PaddockError::UnknownCheckpoint(report.checkpoint))?;

        let slot = &mut self.entrants[id];
        if !slot.progress.is_racing() {
            return Err(PaddockError::EntrantNotRacing(report.transponder));
        }
        let driver = slot.entrant.driver.name.clone();

        let sample = slot.entrant.car.telemetry();
        let record = InfractionRecord::new(checkpoint.index, &sample, report.severity);
        slot.ledger.checkpoint_passed(checkpoint.index, &record);

        if let Some(sector) = track.sector_index_for(checkpoint.index) {
            slot.ledger.add_sector_time(sector, sample.time);
        }

        let lap = slot.ledger.current_lap();
        if !report.severity.is_on_track() || self.investigator.is_investigating(id) {
            if let Some(penalty) =
                self.investigator
                    .report(id, record, slot.ledger.passed_checkpoints())
            {
                publish_penalty(&mut self.hooks, &driver, lap, penalty);
            }
        }

        let completed = if checkpoint.finish_line {
            let passed = slot.ledger.passed_checkpoints().clone();
            let completed = slot.ledger.try_complete_lap(track.checkpoint_count(), sample.time);
            // an excursion still open when the lap closes is judged on that lap
            if completed.is_some() {
                if let Some(penalty) = self.investigator.close(id, &passed) {
                    publish_penalty(&mut self.hooks, &driver, lap, penalty);
                }
            }
            completed
        } else {
            None
        };
        slot.progress = EntrantProgress::racing(&slot.ledger);

        let completed = match completed {
            Some(completed) => completed,
            None => return Ok(()),
        };

        if let Some(lap_time) = slot.ledger.previous_lap_time() {
            info!(
                "{} lap {}: {:.3}s{}",
                driver,
                completed,
                lap_time.time,
                if lap_time.valid { "" } else { " (invalid)" }
            );
            self.hooks.call(&RaceEvent::LapCompleted(LapReport {
                driver: driver.clone(),
                lap: completed,
                lap_time,
            }));
        }

        if self.lap_count == 0 || completed != self.lap_count {
            return Ok(());
        }

        // car has finished the race
        slot.ledger.stop_race_timer(sample.time);
        self.finished.push(id);
        let position = Placement::try_from(self.finished.len()).unwrap_or(Placement::MAX);
        slot.progress = EntrantProgress::Finished { position };
        self.active.remove(&id);

        info!("{} finished in P{}", driver, position);
        self.hooks.call(&RaceEvent::EntrantFinished { driver, position });

        if self.active.is_empty() {
            self.end_race();
        }
        Ok(())
    }

    fn end_race(&mut self) {
        self.phase = RacePhase::Finished;
        let standings = self.standings();

        info!("race over");
        for standing in &standings {
            info!(
                "P{} {}: total {:?}, fastest {:?}, theoretical {:?}",
                standing.position,
                standing.driver,
                standing.total_time,
                standing.fastest_lap,
                standing.theoretical_fastest_lap
            );
        }

        self.hooks.call(&RaceEvent::RaceEnded(standings));
    }

    /// Marks the lap in progress as invalid; it is still closed normally at
    /// the finish line.
    pub fn invalidate_lap(&mut self, transponder: TransponderID) -> Result<()> {
        let id = self
            .entrant_id(transponder)
            .ok_or(PaddockError::UnknownTransponder(transponder))?;
        self.entrants[id].ledger.invalidate_lap();
        Ok(())
    }

    // Finishers in finish order
    pub fn standings(&self) -> Vec<Standing> {
        self.finished
            .iter()
            .enumerate()
            .map(|(index, &id)| {
                let slot = &self.entrants[id];
                let position = Placement::try_from(index + 1).unwrap_or(Placement::MAX);
                progress::standing(&slot.entrant.driver.name, position, &slot.ledger)
            })
            .collect()
    }

    // Everybody, leader first
    pub fn live_order(&self) -> Vec<(String, EntrantProgress)> {
        let mut order: Vec<(String, EntrantProgress)> = self
            .entrants
            .iter()
            .map(|slot| (slot.entrant.driver.name.clone(), slot.progress))
            .collect();
        order.sort_by(|(_, a), (_, b)| a.cmp(b));
        order
    }

    pub fn entrant_id(&self, transponder: TransponderID) -> Option<EntrantID> {
        self.transponder_lookup.get(&transponder).copied()
    }

    pub fn transponder(&self, entrant: EntrantID) -> Option<TransponderID> {
        self.entrants.get(entrant).map(|slot| slot.transponder)
    }

    pub fn ledger(&self, transponder: TransponderID) -> Option<&LapLedger> {
        let id = self.entrant_id(transponder)?;
        Some(&self.entrants[id].ledger)
    }

    pub fn investigator(&self) -> &PenaltyInvestigator {
        &self.investigator
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    pub fn lap_count(&self) -> LapNumber {
        self.lap_count
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn active_entrants(&self) -> usize {
        self.active.len()
    }

    pub fn hooks_mut(&mut self) -> &mut HookManager {
        &mut self.hooks
    }

    // Detaches every observer; the results stay readable
    pub fn teardown(&mut self) {
        debug!("detaching {} race observers", self.hooks.len());
        self.hooks.clear();
    }
}

fn publish_penalty(hooks: &mut HookManager, driver: &str, lap: LapNumber, penalty: PenaltyReport) {
    warn!(
        driver = %driver,
        lap,
        infractions = penalty.infraction_count,
        worst = %penalty.worst_severity,
        duration_s = penalty.duration,
        distance_m = penalty.distance,
        avg_kmh = penalty.average_speed_kmh(),
        min_kmh = penalty.min_speed_kmh(),
        max_kmh = penalty.max_speed_kmh(),
        "track limits penalty"
    );
    hooks.call(&RaceEvent::PenaltyIssued(PenaltyNotice {
        driver: driver.to_string(),
        lap,
        report: penalty,
    }));
}
