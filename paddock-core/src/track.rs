use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use tracing::{info, warn};

use crate::entity_location::EntityLocation;
use crate::error::{PaddockError, Result};

pub type VariantID = u32;
pub type CheckpointIndex = usize;
// index + 1, what the lap ledger collects per lap
pub type CheckpointPoints = usize;
// 1-based, in crossing order
pub type SectorOrdinal = usize;

pub fn checkpoint_points(index: CheckpointIndex) -> CheckpointPoints {
    index + 1
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CheckpointConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector_boundary: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TrackVariant {
    pub id: VariantID,
    pub name: String,
    #[serde(default)]
    pub obstacle_groups: Vec<String>,
    #[serde(default)]
    pub starting_grid: Vec<EntityLocation>,
    pub checkpoints: Vec<CheckpointConfig>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TrackConfig {
    pub name: String,
    pub variants: Vec<TrackVariant>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    pub index: CheckpointIndex,
    pub sector_boundary: bool,
    pub finish_line: bool,
}

impl Checkpoint {
    pub fn points(&self) -> CheckpointPoints {
        checkpoint_points(self.index)
    }
}

pub struct Track {
    pub name: String,
    variants: HashMap<VariantID, TrackVariant>,
    // declaration order, for picking a fallback variant
    variant_order: Vec<VariantID>,
    current_variant: Option<VariantID>,
    checkpoints: Vec<Checkpoint>,
    sector_lookup: HashMap<CheckpointIndex, SectorOrdinal>,
    active_obstacle_groups: Vec<String>,
}

impl Track {
    pub fn new(name: &str, variants: Vec<TrackVariant>) -> Track {
        let mut lookup = HashMap::new();
        let mut variant_order = Vec::new();

        for variant in variants {
            if lookup.contains_key(&variant.id) {
                warn!(
                    "track variant id conflict: {}, \"{}\" is unavailable",
                    variant.id, variant.name
                );
                continue;
            }

            variant_order.push(variant.id);
            lookup.insert(variant.id, variant);
        }

        Track {
            name: name.to_string(),
            variants: lookup,
            variant_order,
            current_variant: None,
            checkpoints: Vec::new(),
            sector_lookup: HashMap::new(),
            active_obstacle_groups: Vec::new(),
        }
    }

    pub fn from_config(config: TrackConfig) -> Track {
        Track::new(&config.name, config.variants)
    }

    pub fn load(path: &str) -> Result<Track> {
        let contents = fs::read_to_string(path).map_err(|source| PaddockError::Io {
            path: path.to_string(),
            source,
        })?;
        let config: TrackConfig =
            serde_yaml::from_str(&contents).map_err(|source| PaddockError::Yaml {
                path: path.to_string(),
                source,
            })?;

        Ok(Track::from_config(config))
    }

    pub fn initialize_variant(&mut self, variant_id: VariantID) -> Result<()> {
        if self.current_variant == Some(variant_id) {
            return Ok(());
        }

        let variant = match self.variants.get(&variant_id) {
            Some(variant) => variant,
            None => {
                warn!("track variant {} is not defined on {}", variant_id, self.name);
                return Err(PaddockError::UnknownTrackVariant(variant_id));
            }
        };

        if variant.checkpoints.is_empty() {
            warn!("track variant {} has no checkpoints", variant_id);
            return Err(PaddockError::EmptyTrackVariant(variant_id));
        }

        let last = variant.checkpoints.len() - 1;
        let checkpoints: Vec<Checkpoint> = variant
            .checkpoints
            .iter()
            .enumerate()
            .map(|(index, config)| Checkpoint {
                index,
                sector_boundary: config.sector_boundary,
                finish_line: index == last,
            })
            .collect();

        let mut sector_lookup = HashMap::new();
        let mut ordinal = 0;
        for checkpoint in checkpoints
            .iter()
            .filter(|c| c.sector_boundary || c.finish_line)
        {
            ordinal += 1;
            sector_lookup.insert(checkpoint.index, ordinal);
        }

        self.active_obstacle_groups = variant.obstacle_groups.clone();
        self.checkpoints = checkpoints;
        self.sector_lookup = sector_lookup;
        self.current_variant = Some(variant_id);

        info!(
            "{}: variant {} \"{}\" active with {} checkpoints over {} sectors",
            self.name,
            variant_id,
            variant.name,
            self.checkpoints.len(),
            self.sector_lookup.len()
        );
        Ok(())
    }

    pub fn current_variant(&self) -> Option<&TrackVariant> {
        self.current_variant.and_then(|id| self.variants.get(&id))
    }

    pub fn current_variant_id(&self) -> Option<VariantID> {
        self.current_variant
    }

    pub fn first_variant_id(&self) -> Option<VariantID> {
        self.variant_order.first().copied()
    }

    pub fn has_variant(&self, variant_id: VariantID) -> bool {
        self.variants.contains_key(&variant_id)
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn checkpoint(&self, index: CheckpointIndex) -> Option<&Checkpoint> {
        self.checkpoints.get(index)
    }

    pub fn is_finish_line(&self, index: CheckpointIndex) -> bool {
        self.checkpoint(index).map_or(false, |c| c.finish_line)
    }

    /// Returns the checkpoint after `current`, and whether getting there
    /// crosses into the next lap.
    pub fn next_checkpoint(&self, current: CheckpointIndex) -> Option<(CheckpointIndex, bool)> {
        if current + 1 < self.checkpoints.len() {
            return Some((current + 1, false));
        }

        if self.checkpoints.is_empty() {
            return None;
        }

        Some((0, true))
    }

    pub fn sector_index_for(&self, index: CheckpointIndex) -> Option<SectorOrdinal> {
        self.sector_lookup.get(&index).copied()
    }

    pub fn sector_count(&self) -> usize {
        self.sector_lookup.len()
    }

    // grid positions are 1-based, pole is 1
    pub fn grid_slot(&self, grid_position: usize) -> Option<&EntityLocation> {
        if grid_position < 1 {
            return None;
        }

        self.current_variant()?
            .starting_grid
            .get(grid_position - 1)
    }

    pub fn active_obstacle_groups(&self) -> &[String] {
        &self.active_obstacle_groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn checkpoint(sector_boundary: bool) -> CheckpointConfig {
        CheckpointConfig {
            name: None,
            sector_boundary,
        }
    }

    fn get_two_variant_track() -> Track {
        Track::new(
            "test ring",
            vec![
                TrackVariant {
                    id: 1,
                    name: "full".to_string(),
                    obstacle_groups: vec!["outer barriers".to_string()],
                    starting_grid: vec![
                        EntityLocation::new(DVec3::new(0.0, 0.0, -5.0), DVec3::Z),
                        EntityLocation::new(DVec3::new(2.0, 0.0, -8.0), DVec3::Z),
                    ],
                    checkpoints: vec![
                        checkpoint(false),
                        checkpoint(true),
                        checkpoint(false),
                        checkpoint(true),
                        checkpoint(false),
                    ],
                },
                TrackVariant {
                    id: 2,
                    name: "short".to_string(),
                    obstacle_groups: vec!["chicane".to_string()],
                    starting_grid: vec![],
                    checkpoints: vec![checkpoint(false), checkpoint(false)],
                },
                TrackVariant {
                    id: 2,
                    name: "duplicate".to_string(),
                    obstacle_groups: vec![],
                    starting_grid: vec![],
                    checkpoints: vec![checkpoint(false)],
                },
            ],
        )
    }

    #[test]
    fn test_duplicate_variant_is_skipped() {
        let mut track = get_two_variant_track();
        track.initialize_variant(2).unwrap();

        assert_eq!(track.current_variant().unwrap().name, "short");
        assert_eq!(track.checkpoint_count(), 2);
    }

    #[test]
    fn test_sector_ordinals_follow_crossing_order() {
        let mut track = get_two_variant_track();
        track.initialize_variant(1).unwrap();

        assert_eq!(track.sector_index_for(0), None);
        assert_eq!(track.sector_index_for(1), Some(1));
        assert_eq!(track.sector_index_for(2), None);
        assert_eq!(track.sector_index_for(3), Some(2));
        // finish line always closes the last sector
        assert_eq!(track.sector_index_for(4), Some(3));
        assert!(track.is_finish_line(4));
        assert!(!track.is_finish_line(3));
        assert_eq!(track.sector_count(), 3);
    }

    #[test]
    fn test_next_checkpoint_wraps_at_finish() {
        let mut track = get_two_variant_track();
        track.initialize_variant(1).unwrap();

        assert_eq!(track.next_checkpoint(0), Some((1, false)));
        assert_eq!(track.next_checkpoint(3), Some((4, false)));
        assert_eq!(track.next_checkpoint(4), Some((0, true)));
    }

    #[test]
    fn test_unknown_variant_keeps_previous() {
        let mut track = get_two_variant_track();
        track.initialize_variant(1).unwrap();

        let result = track.initialize_variant(42);
        assert!(matches!(result, Err(PaddockError::UnknownTrackVariant(42))));
        assert_eq!(track.current_variant_id(), Some(1));
        assert_eq!(track.checkpoint_count(), 5);
        assert_eq!(track.active_obstacle_groups(), ["outer barriers".to_string()]);
    }

    #[test]
    fn test_reinitializing_active_variant_is_noop() {
        let mut track = get_two_variant_track();
        track.initialize_variant(1).unwrap();
        track.initialize_variant(1).unwrap();

        assert_eq!(track.current_variant_id(), Some(1));
        assert_eq!(track.checkpoint_count(), 5);
    }

    #[test]
    fn test_switching_variant_swaps_obstacles() {
        let mut track = get_two_variant_track();
        track.initialize_variant(1).unwrap();
        track.initialize_variant(2).unwrap();

        assert_eq!(track.active_obstacle_groups(), ["chicane".to_string()]);
        assert_eq!(track.sector_index_for(1), Some(1));
        assert_eq!(track.sector_index_for(3), None);
    }

    #[test]
    fn test_grid_slots_are_one_based() {
        let mut track = get_two_variant_track();
        assert!(track.grid_slot(1).is_none());

        track.initialize_variant(1).unwrap();
        assert!(track.grid_slot(0).is_none());
        assert_eq!(
            track.grid_slot(2).unwrap().position,
            DVec3::new(2.0, 0.0, -8.0)
        );
        assert!(track.grid_slot(3).is_none());
    }

    #[test]
    fn test_load_from_yaml() {
        let yaml = r#"
name: harbour
variants:
  - id: 7
    name: night
    starting_grid:
      - position: [0.0, 0.0, 1.0]
    checkpoints:
      - {}
      - sector_boundary: true
      - name: finish
"#;
        let config: TrackConfig = serde_yaml::from_str(yaml).unwrap();
        let mut track = Track::from_config(config);
        track.initialize_variant(7).unwrap();

        assert_eq!(track.first_variant_id(), Some(7));
        assert_eq!(track.checkpoint_count(), 3);
        assert_eq!(track.sector_index_for(2), Some(2));
        assert_eq!(track.grid_slot(1).unwrap().unit_steer_direction, DVec3::Z);
    }
}
