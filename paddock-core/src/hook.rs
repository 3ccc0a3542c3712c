use std::collections::HashMap;
use std::vec::Vec;

use crate::results::{LapReport, PenaltyNotice, Placement, Standing};

#[derive(Debug, Clone, PartialEq)]
pub enum RaceEvent {
    RaceStarted,
    LapCompleted(LapReport),
    PenaltyIssued(PenaltyNotice),
    EntrantFinished { driver: String, position: Placement },
    RaceEnded(Vec<Standing>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RaceEventKind {
    RaceStarted,
    LapCompleted,
    PenaltyIssued,
    EntrantFinished,
    RaceEnded,
}

impl RaceEventKind {
    pub const ALL: [RaceEventKind; 5] = [
        RaceEventKind::RaceStarted,
        RaceEventKind::LapCompleted,
        RaceEventKind::PenaltyIssued,
        RaceEventKind::EntrantFinished,
        RaceEventKind::RaceEnded,
    ];
}

impl RaceEvent {
    pub fn kind(&self) -> RaceEventKind {
        match self {
            RaceEvent::RaceStarted => RaceEventKind::RaceStarted,
            RaceEvent::LapCompleted(_) => RaceEventKind::LapCompleted,
            RaceEvent::PenaltyIssued(_) => RaceEventKind::PenaltyIssued,
            RaceEvent::EntrantFinished { .. } => RaceEventKind::EntrantFinished,
            RaceEvent::RaceEnded(_) => RaceEventKind::RaceEnded,
        }
    }
}

pub type HookID = u64;

type HookFn = Box<dyn FnMut(&RaceEvent) + Send>;

// Owns every race event subscriber; they stay attached until removed or the
// manager is cleared at race teardown.
#[derive(Default)]
pub struct HookManager {
    stored_funcs: HashMap<RaceEventKind, Vec<(HookID, HookFn)>>,
    next_id: HookID,
}

impl HookManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, kind: RaceEventKind, f: F) -> HookID
    where
        F: FnMut(&RaceEvent) + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;

        self.stored_funcs
            .entry(kind)
            .or_insert_with(Vec::new)
            .push((id, Box::new(f)));
        id
    }

    pub fn remove(&mut self, id: HookID) -> bool {
        let mut removed = false;
        for watchers in self.stored_funcs.values_mut() {
            let before = watchers.len();
            watchers.retain(|(watcher_id, _)| *watcher_id != id);
            removed |= watchers.len() != before;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.stored_funcs.clear();
    }

    pub fn len(&self) -> usize {
        self.stored_funcs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn call(&mut self, event: &RaceEvent) {
        if let Some(watchers) = self.stored_funcs.get_mut(&event.kind()) {
            for (_, f) in watchers.iter_mut() {
                f(event);
            }
        }
    }
}
