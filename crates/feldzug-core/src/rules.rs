//! The rules seam between the battlefield and a game system.
//!
//! This module contains:
//! - `RulesProvider`: the trait the battlefield consults for every numeric
//!   or tactical judgement (ranges, combat results, facing, supply values)
//! - `CombatResult` and `Supplies`: value types those judgements return
//! - `StandardRules`: a deterministic built-in provider driven by an
//!   equipment catalog
//!
//! The battlefield never computes a number itself. It owns the state and the
//! sequencing of operations; everything quantitative is delegated here so a
//! different game system can swap in its own provider.

use crate::grid::Grid;
use crate::hex::{Cell, Facing, Hex, Road, Terrain};
use crate::unit::{find_unit, EquipmentId, Unit, DEFAULT_STRENGTH};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

/// Broad classification of what a unit is, deciding which hex slot it uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitClass {
    /// Occupies the ground slot of a hex
    Ground,
    /// Occupies the air slot of a hex
    Air,
}

/// Outcome of one attack, computed before any state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatResult {
    /// Strength points the defender loses
    pub kills: u32,
    /// Strength points the attacker loses to return fire
    pub losses: u32,
    /// Whether the defender is able to shoot back
    pub defender_can_fire: bool,
}

/// Ammunition and fuel granted by a resupply action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Supplies {
    /// Ammunition points
    pub ammo: u32,
    /// Fuel points
    pub fuel: u32,
}

/// Game system queried by the battlefield.
///
/// Implementations must be pure queries: they read the grid and the unit
/// registry but never mutate anything. The battlefield applies their answers.
/// The `units` slice is the registry backing the unit ids stored in hex
/// slots; [`find_unit`] resolves an id against it.
pub trait RulesProvider {
    /// Whether this unit flies and therefore uses the air slot of a hex
    fn is_air(&self, unit: &Unit) -> bool;

    /// Whether `attacker` could engage `defender`.
    ///
    /// With `None` as defender this is a capability probe: could the unit
    /// attack anything at all right now.
    fn can_attack(&self, attacker: &Unit, defender: Option<&Unit>) -> bool;

    /// Cells the unit could end a move on, starting from `from`
    fn move_range(&self, grid: &Grid, units: &[Unit], unit: &Unit, from: Cell) -> Vec<Cell>;

    /// Cells holding at least one target the unit could attack from `from`
    fn attack_range(&self, grid: &Grid, units: &[Unit], unit: &Unit, from: Cell) -> Vec<Cell>;

    /// Casualties of an exchange between attacker and defender.
    ///
    /// Both figures are computed from the strengths at the moment of the
    /// call; the exchange itself is simultaneous.
    fn attack_results(&self, grid: &Grid, attacker: &Unit, defender: &Unit) -> CombatResult;

    /// Facing a unit at `from` takes when oriented toward `to`
    fn direction(&self, from: Cell, to: Cell) -> Facing;

    /// Distance between two cells in movement terms
    fn distance(&self, from: Cell, to: Cell) -> u32;

    /// Path from `from` to `to` through the given candidate cells.
    ///
    /// Returns the cells visited in order including both endpoints, or an
    /// empty vector when no path through the candidates exists.
    fn shortest_path(&self, from: Cell, to: Cell, candidates: &[Cell]) -> Vec<Cell>;

    /// Supplies a resupply action would grant the unit where it stands
    fn resupply_value(&self, grid: &Grid, unit: &Unit) -> Supplies;

    /// Strength points a reinforce action would grant the unit
    fn reinforce_value(&self, grid: &Grid, unit: &Unit) -> u32;
}

/// Performance figures for one equipment entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentStats {
    /// Display name
    pub name: String,
    /// Ground or air
    pub class: UnitClass,
    /// Movement points per turn
    pub movement: u32,
    /// Attack reach in hexes, zero for units that cannot shoot
    pub fire_range: u32,
    /// Attack rating
    pub attack: u32,
    /// Defense rating
    pub defense: u32,
    /// Ammunition capacity
    pub max_ammo: u32,
    /// Fuel capacity, zero for units that march on foot
    pub max_fuel: u32,
    /// Whether ground units are valid targets
    pub targets_ground: bool,
    /// Whether air units are valid targets
    pub targets_air: bool,
}

/// Equipment table keyed by equipment id
pub type EquipmentCatalog = HashMap<EquipmentId, EquipmentStats>;

/// Equipment ids in the built-in catalog
pub mod equipment {
    use crate::unit::EquipmentId;

    pub const RIFLE_INFANTRY: EquipmentId = 10;
    pub const ENGINEERS: EquipmentId = 11;
    pub const LIGHT_TANK: EquipmentId = 20;
    pub const MEDIUM_TANK: EquipmentId = 21;
    pub const FIELD_ARTILLERY: EquipmentId = 30;
    pub const ANTI_AIR: EquipmentId = 31;
    pub const TRUCK: EquipmentId = 40;
    pub const FIGHTER: EquipmentId = 50;
    pub const TACTICAL_BOMBER: EquipmentId = 51;
}

/// Built-in rules provider.
///
/// Deterministic: the same state always produces the same combat result,
/// so replays stay consistent. All numbers come from the equipment catalog
/// and the terrain tables below.
#[derive(Debug, Clone)]
pub struct StandardRules {
    catalog: EquipmentCatalog,
    fallback: EquipmentStats,
}

impl StandardRules {
    /// Create rules backed by the built-in equipment catalog
    pub fn new() -> Self {
        Self::with_catalog(default_catalog())
    }

    /// Create rules backed by a custom equipment catalog
    pub fn with_catalog(catalog: EquipmentCatalog) -> Self {
        Self {
            catalog,
            fallback: fallback_stats(),
        }
    }

    /// Add or replace one catalog entry
    pub fn add_equipment(&mut self, id: EquipmentId, stats: EquipmentStats) {
        self.catalog.insert(id, stats);
    }

    /// Stats for an equipment id, falling back to a generic entry for ids
    /// missing from the catalog
    pub fn equipment_stats(&self, equipment: EquipmentId) -> &EquipmentStats {
        self.catalog.get(&equipment).unwrap_or(&self.fallback)
    }

    /// Stats the unit currently travels with.
    ///
    /// A mounted unit moves with its transport's performance, everything
    /// else uses the unit's own equipment.
    pub fn effective_stats(&self, unit: &Unit) -> &EquipmentStats {
        match (&unit.transport, unit.mounted) {
            (Some(transport), true) => self.equipment_stats(transport.equipment),
            _ => self.equipment_stats(unit.equipment),
        }
    }

    /// Cost to enter a hex, `None` when the hex is impassable
    fn entry_cost(&self, hex: &Hex, air: bool) -> Option<u32> {
        if air {
            return Some(1);
        }
        if hex.road != Road::None {
            return Some(1);
        }
        terrain_cost(hex.terrain)
    }

    /// Whether a hex blocks the moving unit from passing through
    fn blocked_by_enemy(&self, unit: &Unit, hex: &Hex, units: &[Unit], air: bool) -> bool {
        let slot = if air { hex.air_unit() } else { hex.ground_unit() };
        match slot.and_then(|id| find_unit(units, id)) {
            Some(occupant) => occupant.side() != unit.side(),
            None => false,
        }
    }
}

impl Default for StandardRules {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesProvider for StandardRules {
    fn is_air(&self, unit: &Unit) -> bool {
        self.equipment_stats(unit.equipment).class == UnitClass::Air
    }

    fn can_attack(&self, attacker: &Unit, defender: Option<&Unit>) -> bool {
        if attacker.mounted {
            return false;
        }
        let stats = self.equipment_stats(attacker.equipment);
        if stats.attack == 0 {
            return false;
        }
        let Some(defender) = defender else {
            return stats.targets_ground || stats.targets_air;
        };
        if defender.destroyed() {
            return false;
        }
        match (attacker.side(), defender.side()) {
            (Some(a), Some(d)) if a != d => {}
            _ => return false,
        }
        match self.equipment_stats(defender.equipment).class {
            UnitClass::Ground => stats.targets_ground,
            UnitClass::Air => stats.targets_air,
        }
    }

    fn move_range(&self, grid: &Grid, units: &[Unit], unit: &Unit, from: Cell) -> Vec<Cell> {
        let stats = self.effective_stats(unit);
        let budget = if stats.max_fuel > 0 {
            stats.movement.min(unit.fuel)
        } else {
            stats.movement
        };
        if budget == 0 {
            return Vec::new();
        }
        let air = self.is_air(unit);

        // Cheapest cost to reach each cell within the budget.
        let mut best: HashMap<Cell, u32> = HashMap::from([(from, 0)]);
        let mut frontier = BinaryHeap::from([Reverse((0u32, from))]);
        while let Some(Reverse((cost, cell))) = frontier.pop() {
            if cost > best.get(&cell).copied().unwrap_or(u32::MAX) {
                continue;
            }
            for next in cell.neighbors() {
                let Some(hex) = grid.get_hex(next) else {
                    continue;
                };
                let Some(step) = self.entry_cost(hex, air) else {
                    continue;
                };
                let total = cost + step;
                if total > budget {
                    continue;
                }
                if self.blocked_by_enemy(unit, hex, units, air) {
                    continue;
                }
                if total < best.get(&next).copied().unwrap_or(u32::MAX) {
                    best.insert(next, total);
                    frontier.push(Reverse((total, next)));
                }
            }
        }

        // A reachable cell already holding a unit in this layer can be
        // passed through but not ended on.
        let mut cells: Vec<Cell> = best
            .into_keys()
            .filter(|cell| *cell != from)
            .filter(|cell| {
                let hex = grid.hex(*cell);
                let slot = if air { hex.air_unit() } else { hex.ground_unit() };
                slot.is_none()
            })
            .collect();
        cells.sort_unstable();
        cells
    }

    fn attack_range(&self, grid: &Grid, units: &[Unit], unit: &Unit, from: Cell) -> Vec<Cell> {
        if unit.ammo == 0 || unit.mounted {
            return Vec::new();
        }
        let range = self.equipment_stats(unit.equipment).fire_range;
        if range == 0 {
            return Vec::new();
        }
        let mut cells = Vec::new();
        for cell in grid.cells() {
            if cell == from || from.distance_to(&cell) > range {
                continue;
            }
            let target = grid.hex(cell).get_attackable_unit(false, |id| {
                find_unit(units, id)
                    .map(|defender| self.can_attack(unit, Some(defender)))
                    .unwrap_or(false)
            });
            if target.is_some() {
                cells.push(cell);
            }
        }
        cells
    }

    fn attack_results(&self, grid: &Grid, attacker: &Unit, defender: &Unit) -> CombatResult {
        let atk_stats = self.equipment_stats(attacker.equipment);
        let def_stats = self.equipment_stats(defender.equipment);
        let def_cover = hex_cover(grid, defender.cell());
        let atk_cover = hex_cover(grid, attacker.cell());

        let kills = if attacker.ammo == 0 {
            0
        } else {
            casualties(attacker.strength, atk_stats.attack, def_stats.defense + def_cover)
        };

        let reach = match (defender.cell(), attacker.cell()) {
            (Some(d), Some(a)) => d.distance_to(&a),
            _ => u32::MAX,
        };
        let defender_can_fire = self.can_attack(defender, Some(attacker))
            && defender.ammo > 0
            && reach <= def_stats.fire_range;
        let losses = if defender_can_fire {
            casualties(defender.strength, def_stats.attack, atk_stats.defense + atk_cover)
        } else {
            0
        };

        CombatResult {
            kills,
            losses,
            defender_can_fire,
        }
    }

    fn direction(&self, from: Cell, to: Cell) -> Facing {
        if from == to {
            return Facing::default();
        }
        let (x1, y1) = from.to_pixel(1.0);
        let (x2, y2) = to.to_pixel(1.0);
        // Screen coordinates, y grows southward. Six 60 degree arcs centered
        // on the edge directions of a pointy-top hex.
        let angle = (y2 - y1).atan2(x2 - x1).to_degrees();
        if angle > -30.0 && angle <= 30.0 {
            Facing::East
        } else if angle > 30.0 && angle <= 90.0 {
            Facing::SouthEast
        } else if angle > 90.0 && angle <= 150.0 {
            Facing::SouthWest
        } else if angle > -90.0 && angle <= -30.0 {
            Facing::NorthEast
        } else if angle > -150.0 && angle <= -90.0 {
            Facing::NorthWest
        } else {
            Facing::West
        }
    }

    fn distance(&self, from: Cell, to: Cell) -> u32 {
        from.distance_to(&to)
    }

    fn shortest_path(&self, from: Cell, to: Cell, candidates: &[Cell]) -> Vec<Cell> {
        if from == to {
            return vec![from];
        }
        let allowed: HashSet<Cell> = candidates.iter().copied().chain([from, to]).collect();
        let mut parent: HashMap<Cell, Cell> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        'search: while let Some(cell) = queue.pop_front() {
            for next in cell.neighbors() {
                if next == from || !allowed.contains(&next) || parent.contains_key(&next) {
                    continue;
                }
                parent.insert(next, cell);
                if next == to {
                    break 'search;
                }
                queue.push_back(next);
            }
        }

        if !parent.contains_key(&to) {
            return Vec::new();
        }
        let mut path = vec![to];
        let mut cursor = to;
        while let Some(prev) = parent.get(&cursor) {
            path.push(*prev);
            cursor = *prev;
        }
        path.reverse();
        path
    }

    fn resupply_value(&self, grid: &Grid, unit: &Unit) -> Supplies {
        let stats = self.equipment_stats(unit.equipment);
        let ammo = stats.max_ammo.saturating_sub(unit.ammo);
        let fuel = stats.max_fuel.saturating_sub(unit.fuel);
        // Full rations on a supply hex, half rations in the field.
        match unit.cell().and_then(|cell| grid.get_hex(cell)) {
            Some(hex) if hex.is_supply => Supplies { ammo, fuel },
            _ => Supplies {
                ammo: ammo / 2,
                fuel: fuel / 2,
            },
        }
    }

    fn reinforce_value(&self, grid: &Grid, unit: &Unit) -> u32 {
        let deficit = DEFAULT_STRENGTH.saturating_sub(unit.strength);
        // Replacements flow freely on a supply hex, slowly in the field.
        match unit.cell().and_then(|cell| grid.get_hex(cell)) {
            Some(hex) if hex.is_supply => deficit,
            _ => deficit.min(2),
        }
    }
}

/// Casualties one side inflicts in an exchange.
///
/// Strength scales the attack rating up, defense scales it down. Any shot
/// that connects at all costs the target at least one strength point.
fn casualties(strength: u32, attack: u32, defense: u32) -> u32 {
    if strength == 0 || attack == 0 {
        return 0;
    }
    let power = strength * attack;
    let shield = (defense + 1) * 10;
    ((power + shield / 2) / shield).max(1)
}

fn hex_cover(grid: &Grid, cell: Option<Cell>) -> u32 {
    cell.and_then(|c| grid.get_hex(c))
        .map(|hex| terrain_cover(hex.terrain))
        .unwrap_or(0)
}

/// Movement points to enter a terrain type, `None` for impassable ground
fn terrain_cost(terrain: Terrain) -> Option<u32> {
    match terrain {
        Terrain::Clear | Terrain::City | Terrain::Airfield | Terrain::Port => Some(1),
        Terrain::Fortification => Some(1),
        Terrain::Forest | Terrain::Bocage | Terrain::Hill | Terrain::Sand => Some(2),
        Terrain::Stream | Terrain::Rough => Some(2),
        Terrain::Mountain | Terrain::Swamp => Some(3),
        Terrain::Ocean | Terrain::River | Terrain::Escarpment => None,
    }
}

/// Defense bonus granted to a unit standing in a terrain type
fn terrain_cover(terrain: Terrain) -> u32 {
    match terrain {
        Terrain::City => 4,
        Terrain::Fortification => 6,
        Terrain::Forest => 2,
        Terrain::Bocage => 3,
        Terrain::Hill => 2,
        Terrain::Mountain => 4,
        Terrain::Rough => 1,
        _ => 0,
    }
}

fn fallback_stats() -> EquipmentStats {
    EquipmentStats {
        name: "Unknown Equipment".to_string(),
        class: UnitClass::Ground,
        movement: 3,
        fire_range: 1,
        attack: 4,
        defense: 4,
        max_ammo: 6,
        max_fuel: 0,
        targets_ground: true,
        targets_air: false,
    }
}

/// The built-in equipment catalog
pub fn default_catalog() -> EquipmentCatalog {
    let mut catalog = EquipmentCatalog::new();

    catalog.insert(
        equipment::RIFLE_INFANTRY,
        EquipmentStats {
            name: "Rifle Infantry".to_string(),
            class: UnitClass::Ground,
            movement: 3,
            fire_range: 1,
            attack: 4,
            defense: 4,
            max_ammo: 10,
            max_fuel: 0,
            targets_ground: true,
            targets_air: false,
        },
    );
    catalog.insert(
        equipment::ENGINEERS,
        EquipmentStats {
            name: "Engineers".to_string(),
            class: UnitClass::Ground,
            movement: 3,
            fire_range: 1,
            attack: 6,
            defense: 5,
            max_ammo: 8,
            max_fuel: 0,
            targets_ground: true,
            targets_air: false,
        },
    );
    catalog.insert(
        equipment::LIGHT_TANK,
        EquipmentStats {
            name: "Light Tank".to_string(),
            class: UnitClass::Ground,
            movement: 6,
            fire_range: 1,
            attack: 8,
            defense: 6,
            max_ammo: 8,
            max_fuel: 60,
            targets_ground: true,
            targets_air: false,
        },
    );
    catalog.insert(
        equipment::MEDIUM_TANK,
        EquipmentStats {
            name: "Medium Tank".to_string(),
            class: UnitClass::Ground,
            movement: 5,
            fire_range: 1,
            attack: 11,
            defense: 8,
            max_ammo: 8,
            max_fuel: 50,
            targets_ground: true,
            targets_air: false,
        },
    );
    catalog.insert(
        equipment::FIELD_ARTILLERY,
        EquipmentStats {
            name: "Field Artillery".to_string(),
            class: UnitClass::Ground,
            movement: 1,
            fire_range: 3,
            attack: 10,
            defense: 3,
            max_ammo: 6,
            max_fuel: 0,
            targets_ground: true,
            targets_air: false,
        },
    );
    catalog.insert(
        equipment::ANTI_AIR,
        EquipmentStats {
            name: "Anti-Air".to_string(),
            class: UnitClass::Ground,
            movement: 4,
            fire_range: 1,
            attack: 6,
            defense: 5,
            max_ammo: 8,
            max_fuel: 40,
            targets_ground: true,
            targets_air: true,
        },
    );
    catalog.insert(
        equipment::TRUCK,
        EquipmentStats {
            name: "Truck".to_string(),
            class: UnitClass::Ground,
            movement: 8,
            fire_range: 0,
            attack: 0,
            defense: 2,
            max_ammo: 0,
            max_fuel: 80,
            targets_ground: false,
            targets_air: false,
        },
    );
    catalog.insert(
        equipment::FIGHTER,
        EquipmentStats {
            name: "Fighter".to_string(),
            class: UnitClass::Air,
            movement: 9,
            fire_range: 1,
            attack: 8,
            defense: 7,
            max_ammo: 6,
            max_fuel: 60,
            targets_ground: true,
            targets_air: true,
        },
    );
    catalog.insert(
        equipment::TACTICAL_BOMBER,
        EquipmentStats {
            name: "Tactical Bomber".to_string(),
            class: UnitClass::Air,
            movement: 7,
            fire_range: 1,
            attack: 12,
            defense: 5,
            max_ammo: 4,
            max_fuel: 70,
            targets_ground: true,
            targets_air: false,
        },
    );

    catalog
}
