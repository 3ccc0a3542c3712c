#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RacePhase {
    // No track variant active yet, or the last setup attempt failed; nothing
    // can be started from here
    Unconfigured,
    // Cars sit on their grid slots with fresh ledgers, timers not running
    OnGrid,
    // Checkpoint reports are being turned into laps and penalties
    Racing,
    // Every entrant has completed the configured lap count; standings are final
    Finished,
}

impl RacePhase {
    pub fn accepts_reports(self) -> bool {
        self == RacePhase::Racing
    }
}
