//! Hex cells and the terrain grid vocabulary.
//!
//! This module contains:
//! - `Cell`: (row, col) index of a hex on the battlefield grid
//! - `Facing`: the six directions a unit can point
//! - `Terrain` and `Road`: what a hex is made of
//! - `Hex`: one grid cell with ownership, markers and unit slots
//!
//! The grid uses offset coordinates (odd rows shifted east) because scenario
//! files address hexes by row and column. Axial coordinates are derived on
//! demand for distance math.

use crate::player::{CountryId, PlayerId, Side};
use crate::scenario::HexSnapshot;
use crate::unit::UnitId;
use serde::{Deserialize, Serialize};

/// Direction a unit faces, named by the six edges of a pointy-top hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Top-right edge
    NorthEast,
    /// Right edge
    #[default]
    East,
    /// Bottom-right edge
    SouthEast,
    /// Bottom-left edge
    SouthWest,
    /// Left edge
    West,
    /// Top-left edge
    NorthWest,
}

impl Facing {
    /// All facings in clockwise order starting from NorthEast
    pub const ALL: [Facing; 6] = [
        Facing::NorthEast,
        Facing::East,
        Facing::SouthEast,
        Facing::SouthWest,
        Facing::West,
        Facing::NorthWest,
    ];

    /// The facing pointing the opposite way
    pub fn opposite(&self) -> Facing {
        match self {
            Facing::NorthEast => Facing::SouthWest,
            Facing::East => Facing::West,
            Facing::SouthEast => Facing::NorthWest,
            Facing::SouthWest => Facing::NorthEast,
            Facing::West => Facing::East,
            Facing::NorthWest => Facing::SouthEast,
        }
    }
}

/// Grid position of a hex.
///
/// Rows grow southward and columns grow eastward. Odd rows are drawn shifted
/// half a hex to the east (odd-r layout), which the neighbor tables below
/// account for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Cell {
    /// Row index (increases going south)
    pub row: i32,
    /// Column index (increases going east)
    pub col: i32,
}

impl Cell {
    /// Create a new cell index
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// The six neighboring cells in clockwise order starting from NorthEast
    pub fn neighbors(&self) -> [Cell; 6] {
        Facing::ALL.map(|f| self.neighbor(f))
    }

    /// The neighboring cell in a specific direction
    pub fn neighbor(&self, facing: Facing) -> Cell {
        // Offsets differ between even and odd rows in the odd-r layout.
        let odd = self.row & 1 == 1;
        let (dr, dc) = match (facing, odd) {
            (Facing::NorthEast, false) => (-1, 0),
            (Facing::NorthEast, true) => (-1, 1),
            (Facing::East, _) => (0, 1),
            (Facing::SouthEast, false) => (1, 0),
            (Facing::SouthEast, true) => (1, 1),
            (Facing::SouthWest, false) => (1, -1),
            (Facing::SouthWest, true) => (1, 0),
            (Facing::West, _) => (0, -1),
            (Facing::NorthWest, false) => (-1, -1),
            (Facing::NorthWest, true) => (-1, 0),
        };
        Cell::new(self.row + dr, self.col + dc)
    }

    /// Convert to axial coordinates (q, r) for distance math
    pub fn to_axial(&self) -> (i32, i32) {
        let q = self.col - (self.row - (self.row & 1)) / 2;
        (q, self.row)
    }

    /// Distance to another cell (in hex steps)
    pub fn distance_to(&self, other: &Cell) -> u32 {
        let (q1, r1) = self.to_axial();
        let (q2, r2) = other.to_axial();
        let dq = (q1 - q2).abs();
        let dr = (r1 - r2).abs();
        let ds = ((-q1 - r1) - (-q2 - r2)).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Convert to pixel coordinates (center of hex).
    /// Uses pointy-top orientation with the given hex size (radius).
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let offset = if self.row & 1 == 1 { 0.5 } else { 0.0 };
        let x = hex_size * 3.0_f64.sqrt() * (self.col as f64 + offset);
        let y = hex_size * 1.5 * self.row as f64;
        (x, y)
    }
}

/// Ground cover of a hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Clear,
    City,
    Airfield,
    Forest,
    Bocage,
    Hill,
    Mountain,
    Sand,
    Swamp,
    Ocean,
    River,
    Fortification,
    Port,
    Stream,
    Escarpment,
    Rough,
}

/// Road running through a hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Road {
    /// No road
    #[default]
    None,
    /// Dirt or paved road
    Road,
    /// Railroad track
    Rail,
}

/// One cell of the battlefield grid.
///
/// A hex can hold at most one ground unit and one air unit at the same time.
/// The slots store unit ids; the unit registry on the battlefield owns the
/// units themselves and each placed unit records the cell it stands on, so
/// the link can always be walked in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hex {
    cell: Cell,
    /// Ground cover
    pub terrain: Terrain,
    /// Road through this hex, if any
    pub road: Road,
    /// Player currently controlling this hex
    pub owner: Option<PlayerId>,
    /// Country flag drawn on this hex, if any
    pub flag: Option<CountryId>,
    /// Whether units can resupply here
    pub is_supply: bool,
    /// Whether units may be initially deployed here
    pub is_deployment: bool,
    /// Marks this hex as a victory objective the given side must capture
    pub victory_side: Option<Side>,
    /// Display name (towns, objectives)
    pub name: String,
    ground_unit: Option<UnitId>,
    air_unit: Option<UnitId>,
}

impl Hex {
    /// Create an empty clear hex at the given cell
    pub fn new(cell: Cell) -> Self {
        Self {
            cell,
            terrain: Terrain::default(),
            road: Road::default(),
            owner: None,
            flag: None,
            is_supply: false,
            is_deployment: false,
            victory_side: None,
            name: String::new(),
            ground_unit: None,
            air_unit: None,
        }
    }

    /// The cell this hex sits on
    pub fn cell(&self) -> Cell {
        self.cell
    }

    /// Id of the ground unit standing here, if any
    pub fn ground_unit(&self) -> Option<UnitId> {
        self.ground_unit
    }

    /// Id of the air unit flying here, if any
    pub fn air_unit(&self) -> Option<UnitId> {
        self.air_unit
    }

    /// Whether no unit of either kind occupies this hex
    pub fn is_empty(&self) -> bool {
        self.ground_unit.is_none() && self.air_unit.is_none()
    }

    /// Get the occupant of this hex.
    ///
    /// Prefers the air slot when `prefer_air` is set and it is occupied,
    /// otherwise falls back to whichever slot holds a unit.
    pub fn get_unit(&self, prefer_air: bool) -> Option<UnitId> {
        if prefer_air {
            self.air_unit.or(self.ground_unit)
        } else {
            self.ground_unit.or(self.air_unit)
        }
    }

    /// Get the occupant an attacker could engage.
    ///
    /// Same slot preference as [`get_unit`](Self::get_unit), but each
    /// candidate is filtered through the supplied predicate so a hex holding
    /// only untargetable units yields `None`.
    pub fn get_attackable_unit(
        &self,
        prefer_air: bool,
        can_attack: impl Fn(UnitId) -> bool,
    ) -> Option<UnitId> {
        let candidates = if prefer_air {
            [self.air_unit, self.ground_unit]
        } else {
            [self.ground_unit, self.air_unit]
        };
        candidates
            .into_iter()
            .flatten()
            .find(|id| can_attack(*id))
    }

    /// Put a unit id into the matching slot.
    ///
    /// Returns the id of a different unit that was displaced from the slot,
    /// so the caller can repair its back-reference.
    pub(crate) fn set_unit(&mut self, id: UnitId, is_air: bool) -> Option<UnitId> {
        let slot = if is_air {
            &mut self.air_unit
        } else {
            &mut self.ground_unit
        };
        let previous = slot.replace(id);
        previous.filter(|prev| *prev != id)
    }

    /// Clear the matching slot, but only if it actually holds the given id
    pub(crate) fn del_unit(&mut self, id: UnitId, is_air: bool) {
        let slot = if is_air {
            &mut self.air_unit
        } else {
            &mut self.ground_unit
        };
        if *slot == Some(id) {
            *slot = None;
        }
    }

    /// Overwrite terrain and markers from a scenario snapshot.
    ///
    /// Unit slots are untouched here; the battlefield links snapshot units
    /// separately so ids and back-references stay consistent.
    pub(crate) fn apply_snapshot(&mut self, snapshot: &HexSnapshot) {
        self.terrain = snapshot.terrain;
        self.road = snapshot.road;
        self.owner = snapshot.owner;
        self.flag = snapshot.flag;
        self.is_supply = snapshot.is_supply;
        self.is_deployment = snapshot.is_deployment;
        self.victory_side = snapshot.victory_side;
        self.name = snapshot.name.clone();
    }
}
