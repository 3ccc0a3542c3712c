use std::cmp::Ordering;

use paddock_core::lap_ledger::{LapLedger, LapNumber};
use paddock_core::results::{Placement, Standing};
use paddock_core::track::CheckpointPoints;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EntrantProgress {
    PreRace,
    Racing {
        laps: LapNumber,
        checkpoint: CheckpointPoints,
    },
    Finished {
        position: Placement,
    },
}

impl EntrantProgress {
    pub fn racing(ledger: &LapLedger) -> Self {
        EntrantProgress::Racing {
            laps: ledger.current_lap(),
            checkpoint: ledger.latest_checkpoint().unwrap_or(0),
        }
    }

    pub fn is_racing(&self) -> bool {
        matches!(self, EntrantProgress::Racing { .. })
    }

    // Less means further ahead in the race
    pub fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (EntrantProgress::PreRace, EntrantProgress::PreRace) => Ordering::Equal,
            (EntrantProgress::PreRace, _) => Ordering::Greater,
            (_, EntrantProgress::PreRace) => Ordering::Less,
            (
                EntrantProgress::Racing { laps, checkpoint },
                EntrantProgress::Racing {
                    laps: other_laps,
                    checkpoint: other_checkpoint,
                },
            ) => {
                if laps != other_laps {
                    laps.cmp(other_laps).reverse()
                } else {
                    checkpoint.cmp(other_checkpoint).reverse()
                }
            }
            (EntrantProgress::Finished { .. }, EntrantProgress::Racing { .. }) => Ordering::Less,
            (EntrantProgress::Racing { .. }, EntrantProgress::Finished { .. }) => Ordering::Greater,
            (
                EntrantProgress::Finished { position },
                EntrantProgress::Finished {
                    position: other_position,
                },
            ) => position.cmp(other_position),
        }
    }
}

pub fn standing(driver: &str, position: Placement, ledger: &LapLedger) -> Standing {
    Standing {
        driver: driver.to_string(),
        position,
        laps: ledger.current_lap(),
        total_time: ledger.total_race_time(),
        fastest_lap: ledger.fastest_lap(),
        theoretical_fastest_lap: ledger.theoretical_fastest_lap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_ordering() {
        let mut order = vec![
            EntrantProgress::PreRace,
            EntrantProgress::Racing { laps: 1, checkpoint: 2 },
            EntrantProgress::Finished { position: 2 },
            EntrantProgress::Racing { laps: 2, checkpoint: 1 },
            EntrantProgress::Racing { laps: 1, checkpoint: 4 },
            EntrantProgress::Finished { position: 1 },
        ];
        order.sort_by(|a, b| a.cmp(b));

        assert_eq!(
            order,
            vec![
                EntrantProgress::Finished { position: 1 },
                EntrantProgress::Finished { position: 2 },
                EntrantProgress::Racing { laps: 2, checkpoint: 1 },
                EntrantProgress::Racing { laps: 1, checkpoint: 4 },
                EntrantProgress::Racing { laps: 1, checkpoint: 2 },
                EntrantProgress::PreRace,
            ]
        );
    }
}
