//! Kitchen Layout Definitions
//!
//! Raw TOML structures and the validated layout built from them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collision::{CollisionMap, Footprint, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationKind {
    Pantry,
    Chopping,
    Cooking,
    PlateDispenser,
    Serving,
}

impl StationKind {
    /// Interaction priority. A player in reach of several stations always
    /// resolves to the earliest one here.
    pub const PRIORITY: [StationKind; 5] = [
        StationKind::Pantry,
        StationKind::Chopping,
        StationKind::Cooking,
        StationKind::PlateDispenser,
        StationKind::Serving,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StationKind::Pantry => "pantry",
            StationKind::Chopping => "chopping",
            StationKind::Cooking => "cooking",
            StationKind::PlateDispenser => "plate_dispenser",
            StationKind::Serving => "serving",
        }
    }

    fn index(&self) -> usize {
        match self {
            StationKind::Pantry => 0,
            StationKind::Chopping => 1,
            StationKind::Cooking => 2,
            StationKind::PlateDispenser => 3,
            StationKind::Serving => 4,
        }
    }

    /// Stations that work on an adjacent counter.
    pub fn uses_counter(&self) -> bool {
        matches!(self, StationKind::Chopping | StationKind::Cooking)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("layout '{layout}' is missing a {} station", kind.as_str())]
    MissingStation { layout: String, kind: StationKind },
    #[error("layout '{layout}' has more than one {} station", kind.as_str())]
    DuplicateStation { layout: String, kind: StationKind },
    #[error("layout '{0}' has no counters")]
    NoCounters(String),
    #[error("layout '{layout}': {} station refers to counter {index}, but only {count} exist", kind.as_str())]
    CounterOutOfRange {
        layout: String,
        kind: StationKind,
        index: usize,
        count: usize,
    },
    #[error("layout '{layout}': chopping and cooking stations share counter {index}")]
    SharedCounter { layout: String, index: usize },
    #[error("layout '{0}': spawn point is blocked or outside the kitchen")]
    SpawnBlocked(String),
    #[error("layout '{0}': bounds and element sizes must be positive")]
    InvalidSize(String),
}

// ============================================================================
// Raw TOML Structures
// ============================================================================

fn default_bounds() -> f32 {
    9.5
}

fn default_station_size() -> f32 {
    1.0
}

fn default_counter_size() -> f32 {
    0.8
}

/// Raw station entry from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawStation {
    pub kind: StationKind,
    pub x: f32,
    pub y: f32,
    /// Counter index the station works on (chopping and cooking only)
    pub counter: Option<usize>,
}

/// Raw counter entry from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawCounter {
    pub x: f32,
    pub y: f32,
}

/// Raw layout definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawLayoutDefinition {
    pub display_name: Option<String>,
    #[serde(default = "default_bounds")]
    pub bounds: f32,
    #[serde(default = "default_station_size")]
    pub station_size: f32,
    #[serde(default = "default_counter_size")]
    pub counter_size: f32,
    #[serde(default)]
    pub spawn: Position,
    #[serde(default)]
    pub stations: Vec<RawStation>,
    #[serde(default)]
    pub counters: Vec<RawCounter>,
}

// ============================================================================
// Resolved Structures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct StationDef {
    pub kind: StationKind,
    pub position: Position,
    /// Counter worked on by chopping/cooking stations
    pub counter: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CounterDef {
    pub position: Position,
}

/// A validated kitchen: exactly one station of each kind, at least one
/// counter, and a spawn point inside the bounds. Immutable once built.
#[derive(Debug, Clone)]
pub struct KitchenLayout {
    pub id: String,
    pub display_name: String,
    pub half_extent: f32,
    pub station_size: f32,
    pub counter_size: f32,
    pub spawn: Position,
    /// Indexed in [`StationKind::PRIORITY`] order
    stations: Vec<StationDef>,
    pub counters: Vec<CounterDef>,
}

impl KitchenLayout {
    /// Create a validated KitchenLayout from raw TOML data
    pub fn from_raw(id: &str, raw: &RawLayoutDefinition) -> Result<Self, LayoutError> {
        if raw.bounds <= 0.0 || raw.station_size <= 0.0 || raw.counter_size <= 0.0 {
            return Err(LayoutError::InvalidSize(id.to_string()));
        }
        if raw.counters.is_empty() {
            return Err(LayoutError::NoCounters(id.to_string()));
        }

        let counters: Vec<CounterDef> = raw
            .counters
            .iter()
            .map(|c| CounterDef {
                position: Position::new(c.x, c.y),
            })
            .collect();

        let mut stations = Vec::with_capacity(StationKind::PRIORITY.len());
        for kind in StationKind::PRIORITY {
            let mut matching = raw.stations.iter().filter(|s| s.kind == kind);
            let station = matching.next().ok_or_else(|| LayoutError::MissingStation {
                layout: id.to_string(),
                kind,
            })?;
            if matching.next().is_some() {
                return Err(LayoutError::DuplicateStation {
                    layout: id.to_string(),
                    kind,
                });
            }

            let position = Position::new(station.x, station.y);
            let counter = if kind.uses_counter() {
                let index = match station.counter {
                    Some(index) => index,
                    None => nearest_counter(&counters, &position),
                };
                if index >= counters.len() {
                    return Err(LayoutError::CounterOutOfRange {
                        layout: id.to_string(),
                        kind,
                        index,
                        count: counters.len(),
                    });
                }
                Some(index)
            } else {
                None
            };

            stations.push(StationDef {
                kind,
                position,
                counter,
            });
        }

        let chopping = stations[StationKind::Chopping.index()].counter;
        if chopping.is_some() && chopping == stations[StationKind::Cooking.index()].counter {
            return Err(LayoutError::SharedCounter {
                layout: id.to_string(),
                index: chopping.unwrap_or_default(),
            });
        }

        let layout = Self {
            id: id.to_string(),
            display_name: raw
                .display_name
                .clone()
                .unwrap_or_else(|| id.replace('_', " ")),
            half_extent: raw.bounds,
            station_size: raw.station_size,
            counter_size: raw.counter_size,
            spawn: raw.spawn,
            stations,
            counters,
        };

        // The spawn point itself must be free; the player's full footprint is
        // checked once the player size is known.
        if layout.collision_map(0.0).collides(layout.spawn) {
            return Err(LayoutError::SpawnBlocked(id.to_string()));
        }

        Ok(layout)
    }

    /// The built-in kitchen: ingredients and prep on the left, plates and serving on the right.
    pub fn classic() -> Self {
        let station = |kind, x, y, counter| RawStation { kind, x, y, counter };
        let counter = |x, y| RawCounter { x, y };

        let raw = RawLayoutDefinition {
            display_name: Some("Classic Kitchen".to_string()),
            bounds: default_bounds(),
            station_size: default_station_size(),
            counter_size: default_counter_size(),
            spawn: Position::new(0.0, -1.5),
            stations: vec![
                station(StationKind::Pantry, -4.0, 3.0, None),
                station(StationKind::Chopping, -4.0, 0.0, Some(0)),
                station(StationKind::Cooking, -4.0, -3.0, Some(1)),
                station(StationKind::PlateDispenser, 4.0, 3.0, None),
                station(StationKind::Serving, 4.0, -3.0, None),
            ],
            counters: vec![
                counter(-2.5, 0.0),
                counter(-2.5, -3.0),
                counter(0.0, 3.0),
                counter(0.0, 0.0),
                counter(0.0, -3.0),
                counter(4.0, 0.0),
            ],
        };

        Self::from_raw("classic", &raw).expect("built-in classic layout is valid")
    }

    pub fn station(&self, kind: StationKind) -> &StationDef {
        &self.stations[kind.index()]
    }

    /// Stations in interaction priority order.
    pub fn stations(&self) -> &[StationDef] {
        &self.stations
    }

    /// Counter index a chopping/cooking station works on.
    pub fn processing_counter(&self, kind: StationKind) -> Option<usize> {
        self.station(kind).counter
    }

    pub fn collision_map(&self, player_size: f32) -> CollisionMap {
        let obstacles = self
            .stations
            .iter()
            .map(|s| Footprint::new(s.position, self.station_size))
            .chain(
                self.counters
                    .iter()
                    .map(|c| Footprint::new(c.position, self.counter_size)),
            )
            .collect();
        CollisionMap::new(obstacles, self.half_extent, player_size)
    }
}

/// Nearest counter to `position`, ties broken by list order.
fn nearest_counter(counters: &[CounterDef], position: &Position) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (index, counter) in counters.iter().enumerate() {
        let distance = counter.position.distance(position);
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(toml_str: &str) -> HashMap<String, RawLayoutDefinition> {
        toml::from_str(toml_str).unwrap()
    }

    const MINIMAL: &str = r#"
        [tiny]
        spawn = { x = 0.0, y = -2.0 }

        [[tiny.stations]]
        kind = "pantry"
        x = -3.0
        y = 3.0

        [[tiny.stations]]
        kind = "chopping"
        x = -3.0
        y = 0.0

        [[tiny.stations]]
        kind = "cooking"
        x = 3.0
        y = 0.0

        [[tiny.stations]]
        kind = "plate_dispenser"
        x = 3.0
        y = 3.0

        [[tiny.stations]]
        kind = "serving"
        x = 0.0
        y = 3.0

        [[tiny.counters]]
        x = -1.5
        y = 0.0

        [[tiny.counters]]
        x = 1.5
        y = 0.0
    "#;

    #[test]
    fn test_parse_layout_with_defaults() {
        let parsed = parse(MINIMAL);
        let layout = KitchenLayout::from_raw("tiny", &parsed["tiny"]).unwrap();

        assert_eq!(layout.display_name, "tiny");
        assert_eq!(layout.half_extent, 9.5);
        assert_eq!(layout.station_size, 1.0);
        assert_eq!(layout.counter_size, 0.8);
        assert_eq!(layout.counters.len(), 2);

        // Adjacent counters resolved by distance
        assert_eq!(layout.processing_counter(StationKind::Chopping), Some(0));
        assert_eq!(layout.processing_counter(StationKind::Cooking), Some(1));
        assert_eq!(layout.processing_counter(StationKind::Pantry), None);

        let kinds: Vec<StationKind> = layout.stations().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, StationKind::PRIORITY.to_vec());
    }

    #[test]
    fn test_missing_and_duplicate_stations() {
        let mut raw = parse(MINIMAL).remove("tiny").unwrap();
        let serving = raw.stations.pop().unwrap();
        assert_eq!(
            KitchenLayout::from_raw("tiny", &raw).unwrap_err(),
            LayoutError::MissingStation {
                layout: "tiny".into(),
                kind: StationKind::Serving
            }
        );

        raw.stations.push(serving.clone());
        raw.stations.push(serving);
        assert!(matches!(
            KitchenLayout::from_raw("tiny", &raw),
            Err(LayoutError::DuplicateStation { kind: StationKind::Serving, .. })
        ));
    }

    #[test]
    fn test_counter_validation() {
        let mut raw = parse(MINIMAL).remove("tiny").unwrap();
        raw.stations[1].counter = Some(5);
        assert!(matches!(
            KitchenLayout::from_raw("tiny", &raw),
            Err(LayoutError::CounterOutOfRange { index: 5, count: 2, .. })
        ));

        raw.stations[1].counter = Some(1);
        assert_eq!(
            KitchenLayout::from_raw("tiny", &raw).unwrap_err(),
            LayoutError::SharedCounter {
                layout: "tiny".into(),
                index: 1
            }
        );

        raw.counters.clear();
        assert_eq!(
            KitchenLayout::from_raw("tiny", &raw).unwrap_err(),
            LayoutError::NoCounters("tiny".into())
        );
    }

    #[test]
    fn test_spawn_inside_obstacle_rejected() {
        let mut raw = parse(MINIMAL).remove("tiny").unwrap();
        raw.spawn = Position::new(-1.5, 0.1);
        assert_eq!(
            KitchenLayout::from_raw("tiny", &raw).unwrap_err(),
            LayoutError::SpawnBlocked("tiny".into())
        );
    }

    #[test]
    fn test_classic_layout() {
        let layout = KitchenLayout::classic();
        assert_eq!(layout.id, "classic");
        assert_eq!(layout.counters.len(), 6);
        assert_eq!(
            layout.station(StationKind::Pantry).position,
            Position::new(-4.0, 3.0)
        );
        assert_eq!(layout.processing_counter(StationKind::Chopping), Some(0));
        assert_eq!(layout.processing_counter(StationKind::Cooking), Some(1));
        assert!(!layout.collision_map(0.6).collides(layout.spawn));
    }
}
