use config::{Config, ConfigError, File};
use lazy_static::lazy_static;
use serde::Deserialize;

use crate::severity::Severity;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub server_tick_ms: u64,
    pub realtime_replay: bool,
    pub track_file: String,
    pub session_file: String,
    // 0 leaves the race open; nobody ever finishes
    pub lap_count: u32,
    // smallest off-track severity that opens an investigation
    pub investigation_trigger: Severity,
    // an excursion is only punished when its worst severity is above this
    pub penalty_threshold: Severity,
}

impl Settings {
    pub fn new() -> Result<Settings, ConfigError> {
        Settings::from_file("config.yaml")
    }

    pub fn from_file(path: &str) -> Result<Settings, ConfigError> {
        let config = Config::builder()
            .set_default("server_tick_ms", 30)?
            .set_default("realtime_replay", false)?
            .set_default("track_file", "track.yaml")?
            .set_default("session_file", "session.yaml")?
            .set_default("lap_count", 3)?
            .set_default("investigation_trigger", "InCornerApex")?
            .set_default("penalty_threshold", "OffTrack")?
            .add_source(File::with_name(path).required(false))
            .build()?;

        config.try_deserialize()
    }
}

lazy_static! {
    pub static ref GLOBAL_CONFIG: Settings = Settings::new().expect("failed to read config file");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let settings = Settings::from_file("this-file-does-not-exist.yaml").unwrap();

        assert_eq!(settings.server_tick_ms, 30);
        assert_eq!(settings.lap_count, 3);
        assert!(!settings.realtime_replay);
        assert_eq!(settings.investigation_trigger, Severity::InCornerApex);
        assert_eq!(settings.penalty_threshold, Severity::OffTrack);
    }
}
