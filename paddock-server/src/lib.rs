pub mod checkpoints;
pub mod penalty;
pub mod progress;
pub mod race;
pub mod replay;
