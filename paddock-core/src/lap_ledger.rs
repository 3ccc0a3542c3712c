use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::infraction::InfractionRecord;
use crate::telemetry::Seconds;
use crate::track::{checkpoint_points, CheckpointIndex, CheckpointPoints, SectorOrdinal};

pub type LapNumber = u32;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct LapTime {
    pub time: Seconds,
    pub valid: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LapStatus {
    // a checkpoint was never reached, on or off track
    Incomplete,
    Valid,
    // every checkpoint was reached but at least one only off track, or the
    // lap was invalidated by hand
    Invalid,
}

impl LapStatus {
    pub fn is_complete(self) -> bool {
        self != LapStatus::Incomplete
    }

    pub fn is_valid(self) -> bool {
        self == LapStatus::Valid
    }
}

// Every point in 1..=checkpoint_count has been collected. Points are distinct
// and bounded, so this is the same as the sum reaching n(n+1)/2.
fn covers_all(points: &HashSet<CheckpointPoints>, checkpoint_count: usize) -> bool {
    checkpoint_count > 0 && (1..=checkpoint_count).all(|p| points.contains(&p))
}

/// Everything race control knows about one entrant's laps: which checkpoints
/// were crossed on track this lap, what was crossed off track, sector splits
/// and the closed lap records.
#[derive(Clone, Debug, Default)]
pub struct LapLedger {
    current_lap: LapNumber,
    latest_checkpoint: Option<CheckpointPoints>,
    passed_checkpoints: HashSet<CheckpointPoints>,
    sector_times_by_lap: BTreeMap<LapNumber, BTreeMap<SectorOrdinal, Seconds>>,
    infractions_by_lap: BTreeMap<LapNumber, Vec<InfractionRecord>>,
    lap_times: BTreeMap<LapNumber, LapTime>,

    race_start_time: Option<Seconds>,
    race_end_time: Option<Seconds>,
    current_lap_start_time: Seconds,
    previous_sector_time: Seconds,
    current_lap_invalid: bool,
}

impl LapLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_race_timer(&mut self, start_time: Seconds) {
        self.race_start_time = Some(start_time);
        self.previous_sector_time = start_time;
    }

    pub fn start_lap_timer(&mut self, start_time: Seconds) {
        self.current_lap_start_time = start_time;
    }

    pub fn stop_race_timer(&mut self, end_time: Seconds) {
        self.race_end_time = Some(end_time);
    }

    pub fn total_race_time(&self) -> Option<Seconds> {
        Some(self.race_end_time? - self.race_start_time?)
    }

    pub fn invalidate_lap(&mut self) {
        self.current_lap_invalid = true;
    }

    pub fn current_lap(&self) -> LapNumber {
        self.current_lap
    }

    pub fn latest_checkpoint(&self) -> Option<CheckpointPoints> {
        self.latest_checkpoint
    }

    pub fn passed_checkpoints(&self) -> &HashSet<CheckpointPoints> {
        &self.passed_checkpoints
    }

    pub fn checkpoint_passed(&mut self, index: CheckpointIndex, infraction: &InfractionRecord) {
        if infraction.severity.is_on_track() {
            let points = checkpoint_points(index);
            self.latest_checkpoint = Some(points);
            self.passed_checkpoints.insert(points);
            return;
        }

        self.infractions_by_lap
            .entry(self.current_lap)
            .or_default()
            .push(*infraction);
    }

    /// Records the split for `sector` if it is the next one that may be
    /// recorded this lap. Returns whether anything was recorded.
    pub fn add_sector_time(&mut self, sector: SectorOrdinal, time: Seconds) -> bool {
        let recorded = self.sector_times_by_lap.get(&self.current_lap);
        let has_split = |ordinal: SectorOrdinal| recorded.map_or(false, |s| s.contains_key(&ordinal));

        if sector != 1 && !has_split(1) {
            // e.g. running through the finish line before the first sector
            debug!("ignoring sector #{} crossed before sector #1", sector);
            return false;
        }

        if has_split(sector) {
            return false;
        }

        let sector_time = time - self.previous_sector_time;
        self.sector_times_by_lap
            .entry(self.current_lap)
            .or_default()
            .insert(sector, sector_time);
        self.previous_sector_time = time;

        debug!("sector #{}: {:.3}s", sector, sector_time);
        true
    }

    pub fn lap_status(&self, checkpoint_count: usize) -> LapStatus {
        if covers_all(&self.passed_checkpoints, checkpoint_count) {
            // completed on road, unless the car got completely off track somewhere
            return if self.current_lap_invalid {
                LapStatus::Invalid
            } else {
                LapStatus::Valid
            };
        }

        // not complete on road and nothing crossed off track: shortcut
        let infractions = match self.infractions_by_lap.get(&self.current_lap) {
            Some(infractions) => infractions,
            None => return LapStatus::Incomplete,
        };

        let mut reached = self.passed_checkpoints.clone();
        reached.extend(infractions.iter().map(|infraction| infraction.checkpoint));

        if covers_all(&reached, checkpoint_count) {
            LapStatus::Invalid
        } else {
            LapStatus::Incomplete
        }
    }

    /// Closes the current lap if every checkpoint has been reached. Returns
    /// the number of laps completed so far.
    pub fn try_complete_lap(
        &mut self,
        checkpoint_count: usize,
        lap_end_time: Seconds,
    ) -> Option<LapNumber> {
        let status = self.lap_status(checkpoint_count);
        if !status.is_complete() {
            return None;
        }

        self.lap_times.insert(
            self.current_lap,
            LapTime {
                time: lap_end_time - self.current_lap_start_time,
                valid: status.is_valid(),
            },
        );
        self.current_lap += 1;
        self.start_lap_timer(lap_end_time);
        self.passed_checkpoints.clear();
        self.current_lap_invalid = false;

        Some(self.current_lap)
    }

    pub fn lap_times(&self) -> &BTreeMap<LapNumber, LapTime> {
        &self.lap_times
    }

    pub fn lap_time(&self, lap: LapNumber) -> Option<LapTime> {
        self.lap_times.get(&lap).copied()
    }

    pub fn previous_lap_time(&self) -> Option<LapTime> {
        let previous = self.current_lap.checked_sub(1)?;
        self.lap_time(previous)
    }

    pub fn sector_times(&self, lap: LapNumber) -> Option<&BTreeMap<SectorOrdinal, Seconds>> {
        self.sector_times_by_lap.get(&lap)
    }

    pub fn infractions(&self, lap: LapNumber) -> &[InfractionRecord] {
        self.infractions_by_lap
            .get(&lap)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total_infractions(&self) -> usize {
        self.infractions_by_lap.values().map(Vec::len).sum()
    }

    /// `None` when no lap has been completed cleanly.
    pub fn fastest_lap(&self) -> Option<Seconds> {
        self.lap_times
            .values()
            .filter(|lap| lap.valid)
            .map(|lap| lap.time)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn fastest_sectors(&self) -> BTreeMap<SectorOrdinal, Seconds> {
        let mut fastest: BTreeMap<SectorOrdinal, Seconds> = BTreeMap::new();

        for (lap, sectors) in &self.sector_times_by_lap {
            if !self.lap_times.get(lap).map_or(false, |l| l.valid) {
                continue;
            }

            for (&sector, &time) in sectors {
                fastest
                    .entry(sector)
                    .and_modify(|best| *best = best.min(time))
                    .or_insert(time);
            }
        }

        fastest
    }

    pub fn theoretical_fastest_lap(&self) -> Option<Seconds> {
        let sectors = self.fastest_sectors();
        if sectors.is_empty() {
            return None;
        }

        Some(sectors.values().sum())
    }
}
