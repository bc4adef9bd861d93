//! Scenario snapshots, the serialized form of a battlefield.
//!
//! This module contains:
//! - `UnitSnapshot` and `HexSnapshot`: plain data mirroring live state
//! - `ScenarioSnapshot`: a complete battlefield ready to load or save
//! - `ScenarioError`: what can go wrong with scenario data
//! - `skirmish`: a random scenario generator for quick games
//!
//! Snapshots carry no ids and no back-references, just values.
//! Loading one through [`Battlefield::apply_scenario`] re-registers every
//! unit and rebuilds all links, so a restored battlefield is fully live even
//! though the snapshot never was.
//!
//! [`Battlefield::apply_scenario`]: crate::battlefield::Battlefield::apply_scenario

use crate::battlefield::Battlefield;
use crate::hex::{Facing, Hex, Road, Terrain};
use crate::player::{CountryId, Player, PlayerId, Side};
use crate::unit::{EquipmentId, Transport, Unit, DEFAULT_STRENGTH};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing or validating scenario data
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The JSON text could not be parsed into a snapshot
    #[error("invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Rows or columns of zero cannot hold a battle
    #[error("scenario dimensions {rows}x{cols} are not usable")]
    InvalidDimensions { rows: u32, cols: u32 },

    /// The hex list does not fill the declared grid
    #[error("scenario lists {actual} hexes but a {rows}x{cols} grid needs {expected}")]
    HexCountMismatch {
        rows: u32,
        cols: u32,
        expected: usize,
        actual: usize,
    },

    /// A scenario with units needs at least one player to own them
    #[error("scenario declares no players")]
    NoPlayers,

    /// Player ids double as list positions and must line up
    #[error("player at position {index} carries id {id}")]
    PlayerIdMismatch { index: usize, id: PlayerId },
}

/// Serialized form of one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSnapshot {
    /// Owning player id
    pub owner: PlayerId,
    /// Equipment id
    pub equipment: EquipmentId,
    /// Transport, if the unit has one
    pub transport: Option<Transport>,
    /// Whether the unit starts mounted
    pub mounted: bool,
    /// Strength points
    pub strength: u32,
    /// Ammunition
    pub ammo: u32,
    /// Fuel
    pub fuel: u32,
    /// Direction the unit faces
    pub facing: Facing,
    /// Whether the unit has already moved this turn
    pub moved: bool,
    /// Whether the unit has already attacked this turn
    pub fired: bool,
    /// Whether the unit has already resupplied this turn
    pub resupplied: bool,
}

impl Default for UnitSnapshot {
    fn default() -> Self {
        Self {
            owner: 0,
            equipment: 0,
            transport: None,
            mounted: false,
            strength: DEFAULT_STRENGTH,
            ammo: 0,
            fuel: 0,
            facing: Facing::default(),
            moved: false,
            fired: false,
            resupplied: false,
        }
    }
}

impl UnitSnapshot {
    /// Snapshot of a fresh unit with the given owner and equipment
    pub fn new(owner: PlayerId, equipment: EquipmentId) -> Self {
        Self {
            owner,
            equipment,
            ..Self::default()
        }
    }

    /// Capture the persistable state of a live unit
    pub fn capture(unit: &Unit) -> Self {
        Self {
            owner: unit.owner,
            equipment: unit.equipment,
            transport: unit.transport.clone(),
            mounted: unit.mounted,
            strength: unit.strength,
            ammo: unit.ammo,
            fuel: unit.fuel,
            facing: unit.facing,
            moved: unit.moved,
            fired: unit.fired,
            resupplied: unit.resupplied,
        }
    }

    /// Build an unregistered live unit from this snapshot
    pub fn to_unit(&self) -> Unit {
        let mut unit = Unit::new(self.owner, self.equipment);
        unit.transport = self.transport.clone();
        unit.mounted = self.mounted;
        unit.strength = self.strength;
        unit.ammo = self.ammo;
        unit.fuel = self.fuel;
        unit.facing = self.facing;
        unit.moved = self.moved;
        unit.fired = self.fired;
        unit.resupplied = self.resupplied;
        unit
    }
}

/// Serialized form of one hex
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexSnapshot {
    /// Ground cover
    pub terrain: Terrain,
    /// Road through the hex
    pub road: Road,
    /// Controlling player
    pub owner: Option<PlayerId>,
    /// Country flag drawn on the hex
    pub flag: Option<CountryId>,
    /// Whether units can resupply here
    pub is_supply: bool,
    /// Whether units may deploy here
    pub is_deployment: bool,
    /// Victory objective marker
    pub victory_side: Option<Side>,
    /// Display name
    pub name: String,
    /// Ground unit standing here
    pub unit: Option<UnitSnapshot>,
    /// Air unit flying here
    pub air_unit: Option<UnitSnapshot>,
}

impl HexSnapshot {
    /// Capture a hex together with its resolved occupants
    pub fn capture(hex: &Hex, ground: Option<&Unit>, air: Option<&Unit>) -> Self {
        Self {
            terrain: hex.terrain,
            road: hex.road,
            owner: hex.owner,
            flag: hex.flag,
            is_supply: hex.is_supply,
            is_deployment: hex.is_deployment,
            victory_side: hex.victory_side,
            name: hex.name.clone(),
            unit: ground.map(UnitSnapshot::capture),
            air_unit: air.map(UnitSnapshot::capture),
        }
    }
}

/// A complete serialized battlefield
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSnapshot {
    /// Scenario title
    pub name: String,
    /// Longer description shown in scenario pickers
    #[serde(default)]
    pub description: String,
    /// Background image the grid is drawn over
    #[serde(default)]
    pub terrain_image: String,
    /// Grid rows
    pub rows: u32,
    /// Grid columns
    pub cols: u32,
    /// Game turn the scenario starts on
    #[serde(default)]
    pub turn: u32,
    /// Side holding the move when the scenario starts
    #[serde(default)]
    pub current_side: Side,
    /// Players in id order
    pub players: Vec<Player>,
    /// Victory hexes each side still has to capture.
    ///
    /// Authoritative: loading trusts these figures over a recount of the
    /// victory markers, so partially fought battles restore exactly.
    #[serde(default)]
    pub victory_pending: [u32; 2],
    /// Hexes in row-major order, `rows * cols` entries
    pub hexes: Vec<HexSnapshot>,
}

impl ScenarioSnapshot {
    /// Parse a snapshot from JSON text.
    ///
    /// Parsing does not validate; call [`validate`](Self::validate) or load
    /// the snapshot through a battlefield to check its shape.
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ScenarioError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that the snapshot describes a loadable battlefield
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ScenarioError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        let expected = (self.rows * self.cols) as usize;
        if self.hexes.len() != expected {
            return Err(ScenarioError::HexCountMismatch {
                rows: self.rows,
                cols: self.cols,
                expected,
                actual: self.hexes.len(),
            });
        }
        if self.players.is_empty() {
            return Err(ScenarioError::NoPlayers);
        }
        for (index, player) in self.players.iter().enumerate() {
            if player.id as usize != index {
                return Err(ScenarioError::PlayerIdMismatch {
                    index,
                    id: player.id,
                });
            }
        }
        Ok(())
    }

    /// Capture the complete state of a live battlefield
    pub fn capture(field: &Battlefield) -> Self {
        let grid = field.grid();
        let hexes = grid
            .cells()
            .map(|cell| {
                let hex = grid.hex(cell);
                let ground = hex.ground_unit().and_then(|id| field.get_unit(id));
                let air = hex.air_unit().and_then(|id| field.get_unit(id));
                HexSnapshot::capture(hex, ground, air)
            })
            .collect();

        Self {
            name: field.name.clone(),
            description: field.description.clone(),
            terrain_image: field.terrain_image.clone(),
            rows: grid.rows(),
            cols: grid.cols(),
            turn: field.turn(),
            current_side: field.current_side(),
            players: field.players().to_vec(),
            victory_pending: field.victory_pending(),
            hexes,
        }
    }

    /// Generate a random two-player skirmish
    pub fn skirmish(rows: u32, cols: u32) -> Self {
        Self::skirmish_with_rng(rows, cols, &mut rand::thread_rng())
    }

    /// Generate a random two-player skirmish with a specific RNG.
    ///
    /// The same RNG state always produces the same scenario, so seeded
    /// skirmishes are reproducible.
    ///
    /// Panics if the grid is smaller than 5x5.
    pub fn skirmish_with_rng<R: Rng>(rows: u32, cols: u32, rng: &mut R) -> Self {
        assert!(rows >= 5 && cols >= 5, "skirmish needs at least a 5x5 grid");

        const TOWNS: [&str; 8] = [
            "Adlerberg",
            "Weidenau",
            "Kesselbach",
            "Marienfeld",
            "Gorodok",
            "Lesnoye",
            "Kamenka",
            "Ostrova",
        ];

        let axis = Player::new(0, Side::Axis, 0);
        let allies = Player::new(1, Side::Allies, 8);
        let mut town = 0usize;

        let mut hexes = Vec::with_capacity((rows * cols) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let mut hex = HexSnapshot::default();
                hex.terrain = match rng.gen_range(0..100) {
                    0..=54 => Terrain::Clear,
                    55..=69 => Terrain::Forest,
                    70..=79 => Terrain::Hill,
                    80..=85 => Terrain::Rough,
                    86..=91 => Terrain::Swamp,
                    92..=95 => Terrain::Mountain,
                    _ => {
                        hex.name = TOWNS[town % TOWNS.len()].to_string();
                        town += 1;
                        Terrain::City
                    }
                };
                // One road crossing the middle keeps the sides connected
                // whatever the terrain roll produced.
                if row == rows / 2 {
                    hex.road = Road::Road;
                }
                if col == 0 {
                    hex.owner = Some(0);
                    hex.is_deployment = true;
                    hex.is_supply = true;
                } else if col == cols - 1 {
                    hex.owner = Some(1);
                    hex.is_deployment = true;
                    hex.is_supply = true;
                }
                hexes.push(hex);
            }
        }

        let index = |row: u32, col: u32| (row * cols + col) as usize;
        let mut objective = |hexes: &mut Vec<HexSnapshot>, row: u32, col: u32, owner: PlayerId, side: Side| {
            let country = if owner == 0 { axis.country } else { allies.country };
            let hex = &mut hexes[index(row, col)];
            hex.terrain = Terrain::City;
            hex.owner = Some(owner);
            hex.flag = Some(country);
            hex.victory_side = Some(side);
            if hex.name.is_empty() {
                hex.name = TOWNS[town % TOWNS.len()].to_string();
                town += 1;
            }
        };

        // Each side has to take two towns deep in enemy territory.
        objective(&mut hexes, rows / 4, cols - 2, 1, Side::Axis);
        objective(&mut hexes, (3 * rows) / 4, cols - 2, 1, Side::Axis);
        objective(&mut hexes, rows / 4, 1, 0, Side::Allies);
        objective(&mut hexes, (3 * rows) / 4, 1, 0, Side::Allies);

        let roster = [
            (crate::rules::equipment::RIFLE_INFANTRY, 10, 0),
            (crate::rules::equipment::LIGHT_TANK, 8, 60),
            (crate::rules::equipment::FIELD_ARTILLERY, 6, 0),
        ];
        for side in Side::ALL {
            let (owner, col, facing) = match side {
                Side::Axis => (0, 0, Facing::East),
                Side::Allies => (1, cols - 1, Facing::West),
            };
            for (slot, (equipment, ammo, fuel)) in roster.iter().enumerate() {
                let row = (rows * (slot as u32 + 1)) / (roster.len() as u32 + 1);
                let mut unit = UnitSnapshot::new(owner, *equipment);
                unit.ammo = *ammo;
                unit.fuel = *fuel;
                unit.facing = facing;
                hexes[index(row, col)].unit = Some(unit);
            }
        }

        Self {
            name: format!("Skirmish {}x{}", rows, cols),
            description: "Randomly generated meeting engagement".to_string(),
            terrain_image: String::new(),
            rows,
            cols,
            turn: 0,
            current_side: Side::Axis,
            players: vec![axis, allies],
            victory_pending: [2, 2],
            hexes,
        }
    }
}
