use serde::Deserialize;
use std::collections::VecDeque;
use std::fs;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use glam::DVec3;
use paddock_core::entity_location::EntityLocation;
use paddock_core::entrant::{Car, DriverProfile, RaceEntrant, TransponderID};
use paddock_core::error::{PaddockError, Result};
use paddock_core::lap_ledger::LapNumber;
use paddock_core::severity::Severity;
use paddock_core::telemetry::{Seconds, TelemetrySample};
use paddock_core::track::{CheckpointIndex, Track, VariantID};
use paddock_core::Settings;

use crate::checkpoints::{CheckpointSensor, OffTrackSensor, OnTrackSensor};
use crate::race::{RaceDirector, RacePhase, RaceRules};

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedSensor {
    #[default]
    OnTrack,
    OffTrack(Severity),
}

impl ScriptedSensor {
    fn at(self, checkpoint: CheckpointIndex) -> Box<dyn CheckpointSensor> {
        match self {
            ScriptedSensor::OnTrack => Box::new(OnTrackSensor { checkpoint }),
            ScriptedSensor::OffTrack(severity) => Box::new(OffTrackSensor {
                checkpoint,
                severity,
            }),
        }
    }
}

// One recorded sensor overlap together with the car's telemetry at that time
#[derive(Deserialize, Clone, Debug)]
pub struct ScriptedCrossing {
    pub time: Seconds,
    pub car: usize,
    pub checkpoint: CheckpointIndex,
    #[serde(default)]
    pub sensor: ScriptedSensor,
    #[serde(default)]
    pub position: DVec3,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub acceleration: f64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SessionScript {
    pub variant: VariantID,
    #[serde(default)]
    pub lap_count: Option<LapNumber>,
    #[serde(default)]
    pub start_time: Seconds,
    pub drivers: Vec<String>,
    pub crossings: Vec<ScriptedCrossing>,
}

impl SessionScript {
    pub fn load(path: &str) -> Result<SessionScript> {
        let contents = fs::read_to_string(path).map_err(|source| PaddockError::Io {
            path: path.to_string(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| PaddockError::Yaml {
            path: path.to_string(),
            source,
        })
    }
}

// Stands in for the physics layer: its telemetry is whatever the script says
// the car was doing at the last crossing
struct ScriptedCar {
    telemetry: Arc<Mutex<TelemetrySample>>,
}

impl Car for ScriptedCar {
    fn place_on_grid(&mut self, slot: &EntityLocation) {
        if let Ok(mut telemetry) = self.telemetry.lock() {
            telemetry.position = slot.position;
        }
    }

    fn telemetry(&self) -> TelemetrySample {
        match self.telemetry.lock() {
            Ok(telemetry) => *telemetry,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Feeds a recorded session through race control one crossing at a time,
/// in time order.
pub struct ReplayServer {
    director: RaceDirector,
    cars: Vec<Arc<Mutex<TelemetrySample>>>,
    transponders: Vec<TransponderID>,
    incoming_crossings: VecDeque<ScriptedCrossing>,
    start_time: Seconds,
    tick: Option<Duration>,
}

impl ReplayServer {
    pub fn new(mut track: Track, script: SessionScript, settings: &Settings) -> Result<ReplayServer> {
        let mut variant = script.variant;
        if !track.has_variant(variant) {
            if let Some(first) = track.first_variant_id() {
                warn!(
                    "session asks for variant {} which {} does not define, using {}",
                    variant, track.name, first
                );
                variant = first;
            }
        }
        // make sure the fallback is usable before handing the track over
        track.initialize_variant(variant)?;

        let mut cars = Vec::new();
        let entrants: Vec<RaceEntrant> = script
            .drivers
            .iter()
            .map(|name| {
                let telemetry = Arc::new(Mutex::new(TelemetrySample::at_rest(
                    script.start_time,
                    DVec3::ZERO,
                )));
                cars.push(telemetry.clone());
                RaceEntrant::new(DriverProfile::new(name), Box::new(ScriptedCar { telemetry }))
            })
            .collect();

        let mut director = RaceDirector::new(RaceRules::from_settings(settings));
        let lap_count = script.lap_count.unwrap_or(settings.lap_count);
        let transponders = director.setup_race(track, variant, lap_count, entrants)?;

        let mut crossings = script.crossings;
        crossings.sort_by(|a, b| a.time.total_cmp(&b.time));

        Ok(ReplayServer {
            director,
            cars,
            transponders,
            incoming_crossings: crossings.into(),
            start_time: script.start_time,
            tick: if settings.realtime_replay {
                Some(Duration::from_millis(settings.server_tick_ms))
            } else {
                None
            },
        })
    }

    pub fn director(&self) -> &RaceDirector {
        &self.director
    }

    pub fn director_mut(&mut self) -> &mut RaceDirector {
        &mut self.director
    }

    pub fn start_loop(&mut self) -> Result<()> {
        self.director.start_race(self.start_time)?;

        while let Some(crossing) = self.incoming_crossings.pop_front() {
            let tick_start = Instant::now();
            self.dispatch(crossing);

            if self.director.phase() == RacePhase::Finished {
                break;
            }

            // wait until server tick time has elapsed
            if let Some(tick) = self.tick {
                thread::sleep(tick.saturating_sub(tick_start.elapsed()));
            }
        }

        if !self.incoming_crossings.is_empty() {
            info!(
                "race ended with {} crossings left unplayed",
                self.incoming_crossings.len()
            );
        }
        Ok(())
    }

    fn dispatch(&mut self, crossing: ScriptedCrossing) {
        let (car, transponder) = match (self.cars.get(crossing.car), self.transponders.get(crossing.car)) {
            (Some(car), Some(transponder)) => (car, *transponder),
            _ => {
                error!("crossing at {:.3}s references unknown car {}", crossing.time, crossing.car);
                return;
            }
        };

        if let Ok(mut telemetry) = car.lock() {
            *telemetry = TelemetrySample {
                time: crossing.time,
                position: crossing.position,
                speed: crossing.speed,
                acceleration: crossing.acceleration,
            };
        }

        let report = crossing.sensor.at(crossing.checkpoint).report(transponder);
        self.director.on_checkpoint_report(report);
    }
}
