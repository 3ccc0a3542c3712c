use thiserror::Error;

use crate::entrant::TransponderID;
use crate::track::{CheckpointIndex, VariantID};

#[derive(Debug, Error)]
pub enum PaddockError {
    #[error("unknown track variant {0}")]
    UnknownTrackVariant(VariantID),

    #[error("track variant {0} has no checkpoints")]
    EmptyTrackVariant(VariantID),

    #[error("no track variant has been initialized")]
    NoActiveVariant,

    #[error("no lap ledger registered for transponder {0}")]
    UnknownTransponder(TransponderID),

    #[error("checkpoint {0} is not part of the active track variant")]
    UnknownCheckpoint(CheckpointIndex),

    #[error("race has not been set up")]
    RaceNotConfigured,

    #[error("race has already been started")]
    RaceAlreadyStarted,

    #[error("race is not running")]
    RaceNotRunning,

    #[error("entrant behind transponder {0} is no longer racing")]
    EntrantNotRacing(TransponderID),

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type Result<T> = std::result::Result<T, PaddockError>;
