//! The battlefield, the authoritative state of a running battle.
//!
//! This module contains the `Battlefield` struct and every state-changing
//! operation of the engine: loading scenarios, placing and moving units,
//! resolving attacks, tracking victory hexes and rotating turns.
//!
//! The battlefield owns the grid, the unit registry and the player list. It
//! never invents a number: anything quantitative (ranges, casualties,
//! distances, supply values) is asked of the [`RulesProvider`] it was
//! created with. Drivers issue operations and render the state; the
//! battlefield keeps it consistent.
//!
//! Operations are tolerant of driver mistakes. An id that resolves to
//! nothing or an action that makes no sense in the current state is a silent
//! no-op, so a confused driver cannot corrupt the battle. The one hard error
//! is indexing a cell outside the grid in a state-changing operation, which
//! panics, as coordinates that far gone mean the caller's state is already
//! corrupt.

use crate::grid::Grid;
use crate::hex::{Cell, Hex};
use crate::player::{CountryId, Player, PlayerId, Side};
use crate::rules::{CombatResult, RulesProvider, StandardRules};
use crate::scenario::{HexSnapshot, ScenarioError, ScenarioSnapshot};
use crate::unit::{find_unit, find_unit_mut, EquipmentId, Unit, UnitId};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Authoritative state of one battle
pub struct Battlefield {
    grid: Grid,
    /// Scenario title
    pub name: String,
    /// Scenario description
    pub description: String,
    /// Background image the grid is drawn over
    pub terrain_image: String,
    turn: u32,
    current_side: Side,
    selected: Option<UnitId>,
    move_selection: Vec<Cell>,
    attack_selection: Vec<Cell>,
    victory_pending: [u32; 2],
    units: Vec<Unit>,
    players: Vec<Player>,
    next_unit_id: UnitId,
    icon_cache: HashMap<EquipmentId, String>,
    rules: Box<dyn RulesProvider>,
}

impl Battlefield {
    /// Create an empty battlefield driven by the given rules provider
    pub fn new(rules: Box<dyn RulesProvider>) -> Self {
        Self {
            grid: Grid::new(0, 0),
            name: String::new(),
            description: String::new(),
            terrain_image: String::new(),
            turn: 0,
            current_side: Side::Axis,
            selected: None,
            move_selection: Vec::new(),
            attack_selection: Vec::new(),
            victory_pending: [0, 0],
            units: Vec::new(),
            players: Vec::new(),
            next_unit_id: 0,
            icon_cache: HashMap::new(),
            rules,
        }
    }

    /// Create an empty battlefield driven by the built-in rules
    pub fn standard() -> Self {
        Self::new(Box::new(StandardRules::new()))
    }

    // ==================== Setup & Loading ====================

    /// Replace the grid with a fresh one of empty clear hexes.
    ///
    /// Clears the unit registry, the selection state, the icon cache and
    /// the victory counters along with the old grid, because everything in
    /// them refers to cells that no longer exist. The unit id counter is
    /// not reset: ids stay unique across the whole life of the battlefield.
    pub fn allocate(&mut self, rows: u32, cols: u32) {
        self.grid = Grid::new(rows, cols);
        self.units.clear();
        self.icon_cache.clear();
        self.clear_selection();
        self.victory_pending = [0, 0];
    }

    /// Add a player. Players are expected in id order.
    pub fn add_player(&mut self, player: Player) {
        self.players.push(player);
    }

    /// Register a unit without placing it on the grid.
    ///
    /// Assigns the next unique id, caches the icons for the unit and its
    /// transport, and resolves the declared owner to a player. An owner id
    /// that matches no player falls back to player 0 so scenarios with gaps
    /// in their rosters still load.
    pub fn add_unit(&mut self, mut unit: Unit) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id += 1;
        unit.assign_id(id);

        self.icon_cache.insert(unit.equipment, unit.icon());
        if let Some(transport) = &unit.transport {
            self.icon_cache.insert(transport.equipment, transport.icon());
        }

        let resolved = if (unit.owner as usize) < self.players.len() {
            unit.owner
        } else {
            0
        };
        if resolved != unit.owner {
            warn!(
                "unit {} owner {} is not a player, assigning to player 0",
                id, unit.owner
            );
        }
        if let Some(player) = self.players.get(resolved as usize) {
            unit.bind_player(resolved, player.side);
        }

        self.units.push(unit);
        id
    }

    /// Register a unit and place it on a cell.
    ///
    /// Panics if the cell is off the grid.
    pub fn deploy_unit(&mut self, unit: Unit, cell: Cell) -> UnitId {
        let id = self.add_unit(unit);
        self.link_unit(id, cell);
        id
    }

    /// Overwrite one hex from a snapshot.
    ///
    /// Copies the terrain and markers, grows the victory counter if the
    /// snapshot marks an objective, and registers and places any units the
    /// snapshot carries. Occupants already standing on the hex stay unless
    /// the snapshot brings a unit for their slot.
    ///
    /// Panics if the cell is off the grid.
    pub fn set_hex(&mut self, row: i32, col: i32, snapshot: &HexSnapshot) {
        let cell = Cell::new(row, col);
        self.grid.hex_mut(cell).apply_snapshot(snapshot);

        if let Some(side) = snapshot.victory_side {
            self.victory_pending[side.index()] += 1;
        }
        if let Some(unit) = &snapshot.unit {
            let id = self.add_unit(unit.to_unit());
            self.link_unit(id, cell);
        }
        if let Some(unit) = &snapshot.air_unit {
            let id = self.add_unit(unit.to_unit());
            self.link_unit(id, cell);
        }
    }

    /// Load a complete scenario, replacing players and battlefield state
    pub fn apply_scenario(&mut self, snapshot: &ScenarioSnapshot) -> Result<(), ScenarioError> {
        snapshot.validate()?;
        self.players = snapshot.players.clone();
        self.current_side = snapshot.current_side;
        self.restore(snapshot);
        info!(
            "loaded scenario '{}': {}x{}, {} players, {} units",
            self.name,
            self.grid.rows(),
            self.grid.cols(),
            self.players.len(),
            self.units.len()
        );
        Ok(())
    }

    /// Make this battlefield a deep copy of another one.
    ///
    /// Runs through a snapshot, so it is exactly a capture followed by a
    /// restore: units are re-registered and receive fresh ids here. The
    /// player list and the side to move are not copied; they belong to the
    /// session, not the map.
    pub fn copy_from(&mut self, source: &Battlefield) {
        let snapshot = ScenarioSnapshot::capture(source);
        self.restore(&snapshot);
    }

    /// Rebuild grid, units and victory counters from a snapshot
    fn restore(&mut self, snapshot: &ScenarioSnapshot) {
        self.name = snapshot.name.clone();
        self.description = snapshot.description.clone();
        self.terrain_image = snapshot.terrain_image.clone();
        self.turn = snapshot.turn;

        self.allocate(snapshot.rows, snapshot.cols);
        for (index, hex) in snapshot.hexes.iter().enumerate() {
            let row = (index as u32 / snapshot.cols) as i32;
            let col = (index as u32 % snapshot.cols) as i32;
            self.set_hex(row, col, hex);
        }

        // The snapshot's own figures beat the recount set_hex accumulated,
        // so a battle saved mid-fight restores its true totals. A snapshot
        // that never tracked counters leaves the recount standing.
        if snapshot.victory_pending != [0, 0] {
            self.victory_pending = snapshot.victory_pending;
        }
    }

    // ==================== Queries ====================

    /// Number of grid rows
    pub fn rows(&self) -> u32 {
        self.grid.rows()
    }

    /// Number of grid columns
    pub fn cols(&self) -> u32 {
        self.grid.cols()
    }

    /// The hex grid
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The hex at a cell. Panics if the cell is off the grid.
    pub fn hex(&self, cell: Cell) -> &Hex {
        self.grid.hex(cell)
    }

    /// Current game turn
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Side currently moving
    pub fn current_side(&self) -> Side {
        self.current_side
    }

    /// All players in id order
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Player by id, falling back to player 0 for unknown ids
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize).or_else(|| self.players.first())
    }

    /// Countries of all players in player order
    pub fn countries(&self) -> Vec<CountryId> {
        self.players.iter().map(|player| player.country).collect()
    }

    /// All live units
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Unit by id
    pub fn get_unit(&self, id: UnitId) -> Option<&Unit> {
        find_unit(&self.units, id)
    }

    /// Unit standing on a cell, preferring the requested layer.
    /// Off-grid cells simply hold nothing.
    pub fn unit_at(&self, cell: Cell, prefer_air: bool) -> Option<&Unit> {
        let id = self.grid.get_hex(cell)?.get_unit(prefer_air)?;
        self.get_unit(id)
    }

    /// Unit on a cell that the given attacker could engage
    pub fn attackable_unit_at(
        &self,
        cell: Cell,
        attacker: UnitId,
        prefer_air: bool,
    ) -> Option<&Unit> {
        let attacking = self.get_unit(attacker)?;
        let id = self.grid.get_hex(cell)?.get_attackable_unit(prefer_air, |target| {
            find_unit(&self.units, target)
                .map(|defender| self.rules.can_attack(attacking, Some(defender)))
                .unwrap_or(false)
        })?;
        self.get_unit(id)
    }

    /// Victory hexes each side still has to capture
    pub fn victory_pending(&self) -> [u32; 2] {
        self.victory_pending
    }

    /// Icon paths for every equipment id seen on this battlefield
    pub fn unit_icons(&self) -> &HashMap<EquipmentId, String> {
        &self.icon_cache
    }

    /// Currently selected unit, if any
    pub fn selected_unit(&self) -> Option<UnitId> {
        self.selected
    }

    /// Cells the selected unit may move to
    pub fn move_selection(&self) -> &[Cell] {
        &self.move_selection
    }

    /// Cells the selected unit may attack
    pub fn attack_selection(&self) -> &[Cell] {
        &self.attack_selection
    }

    /// Whether a cell is highlighted as a move destination
    pub fn is_move_target(&self, cell: Cell) -> bool {
        self.move_selection.contains(&cell)
    }

    /// Whether a cell is highlighted as an attack target
    pub fn is_attack_target(&self, cell: Cell) -> bool {
        self.attack_selection.contains(&cell)
    }

    /// Text summary of players and victory standing, for console dumps
    pub fn dump_map(&self) -> String {
        let mut out = String::new();
        for player in &self.players {
            out.push_str(&format!(
                "Player: {} Side: {:?} Country: {}\n",
                player.id,
                player.side,
                player.country_name()
            ));
        }
        out.push_str(&format!(
            "Victory hexes pending for Axis: {} Allies: {}\n",
            self.victory_pending[0], self.victory_pending[1]
        ));
        out
    }

    // ==================== Selection ====================

    /// Select a unit as the current unit.
    ///
    /// Only units of the side currently moving can be selected. Selecting
    /// computes the unit's move and attack highlights, skipping whichever
    /// the unit has already used up this turn. Returns whether the
    /// selection took effect.
    pub fn select_unit(&mut self, id: UnitId) -> bool {
        let (moved, fired) = match find_unit(&self.units, id) {
            Some(unit) if unit.side() == Some(self.current_side) => (unit.moved, unit.fired),
            _ => return false,
        };

        self.clear_selection();
        self.selected = Some(id);
        if !moved {
            self.set_move_range(id);
        }
        if !fired {
            self.set_attack_range(id);
        }
        true
    }

    /// Drop the current unit and all highlights
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.move_selection.clear();
        self.attack_selection.clear();
    }

    /// Recompute the move highlights for a unit
    pub fn set_move_range(&mut self, id: UnitId) {
        self.move_selection.clear();
        let Some(unit) = find_unit(&self.units, id) else {
            return;
        };
        let Some(from) = unit.cell() else {
            return;
        };
        self.move_selection = self.rules.move_range(&self.grid, &self.units, unit, from);
    }

    /// Recompute the attack highlights for a unit
    pub fn set_attack_range(&mut self, id: UnitId) {
        self.attack_selection.clear();
        let Some(unit) = find_unit(&self.units, id) else {
            return;
        };
        let Some(from) = unit.cell() else {
            return;
        };
        self.attack_selection = self.rules.attack_range(&self.grid, &self.units, unit, from);
    }

    // ==================== Movement & Combat ====================

    /// Move a unit to a destination cell.
    ///
    /// Pays the fuel cost, transfers hex ownership, repaints an existing
    /// flag to the mover's country and settles victory accounting when the
    /// destination is an objective. Returns the winning side if this
    /// capture decided the battle.
    ///
    /// Panics if the destination is off the grid.
    pub fn move_unit(&mut self, id: UnitId, destination: Cell) -> Option<Side> {
        let Some(unit) = find_unit(&self.units, id) else {
            return None;
        };
        let Some(source) = unit.cell() else {
            return None;
        };
        let owner = unit.owner;
        let (side, country) = match unit.player().and_then(|p| self.players.get(p as usize)) {
            Some(player) => (player.side, player.country),
            None => return None,
        };

        let mut win = None;

        // A hex that flies any flag gets repainted to the mover's country.
        {
            let destination_hex = self.grid.hex_mut(destination);
            if destination_hex.flag.is_some() {
                destination_hex.flag = Some(country);
            }
        }

        // Victory accounting runs against the owner recorded before the
        // move; the previous holder's side is who has to take it back.
        let (victory_marked, previous_owner) = {
            let destination_hex = self.grid.hex(destination);
            (destination_hex.victory_side.is_some(), destination_hex.owner)
        };
        if victory_marked {
            let enemy = self
                .get_player(previous_owner.unwrap_or(0))
                .map(|player| player.side)
                .unwrap_or_else(|| side.opponent());
            if self.update_victory_sides(side, enemy) {
                win = Some(side);
            }
        }

        let cost = self.rules.distance(source, destination);
        let facing = self.rules.direction(source, destination);
        if let Some(unit) = find_unit_mut(&mut self.units, id) {
            unit.travel(cost);
        }
        self.unlink_unit(id, source);
        self.link_unit(id, destination);
        self.grid.hex_mut(destination).owner = Some(owner);
        if let Some(unit) = find_unit_mut(&mut self.units, id) {
            unit.facing = facing;
        }

        let path = self
            .rules
            .shortest_path(source, destination, &self.move_selection);
        debug!(
            "unit {} moved ({},{}) -> ({},{}) via {} hexes",
            id,
            source.row,
            source.col,
            destination.row,
            destination.col,
            path.len()
        );

        self.move_selection.clear();
        self.set_attack_range(id);
        win
    }

    /// Resolve an attack between two units.
    ///
    /// The exchange is simultaneous: both casualty figures come from the
    /// strengths at the moment the attack starts, and a defender that is
    /// destroyed still deals its return fire. Support fire costs a shot
    /// but not the attacker's turn, and draws no return fire. Destroyed
    /// units leave the grid and the registry before this returns.
    pub fn attack_unit(
        &mut self,
        attacker: UnitId,
        defender: UnitId,
        support_fire: bool,
    ) -> Option<CombatResult> {
        let (attacker_cell, defender_cell, result, attacker_facing) = {
            let attacking = find_unit(&self.units, attacker)?;
            let defending = find_unit(&self.units, defender)?;
            let a = attacking.cell()?;
            let d = defending.cell()?;
            let result = self.rules.attack_results(&self.grid, attacking, defending);
            (a, d, result, self.rules.direction(a, d))
        };
        debug!(
            "unit {} at ({},{}) attacking unit {} at ({},{})",
            attacker,
            attacker_cell.row,
            attacker_cell.col,
            defender,
            defender_cell.row,
            defender_cell.col
        );

        if let Some(attacking) = find_unit_mut(&mut self.units, attacker) {
            attacking.facing = attacker_facing;
            attacking.fire(!support_fire);
        }
        if let Some(defending) = find_unit_mut(&mut self.units, defender) {
            // The defender turns to meet the attack.
            defending.facing = attacker_facing.opposite();
            defending.hit(result.kills);
        }
        if result.defender_can_fire && !support_fire {
            if let Some(defending) = find_unit_mut(&mut self.units, defender) {
                defending.fire(false);
            }
            if let Some(attacking) = find_unit_mut(&mut self.units, attacker) {
                attacking.hit(result.losses);
            }
        }

        let attacker_destroyed = find_unit(&self.units, attacker)
            .map(|unit| unit.destroyed())
            .unwrap_or(false);
        if attacker_destroyed {
            self.unlink_unit(attacker, attacker_cell);
        }
        let defender_destroyed = find_unit(&self.units, defender)
            .map(|unit| unit.destroyed())
            .unwrap_or(false);
        if defender_destroyed {
            self.unlink_unit(defender, defender_cell);
        }
        if attacker_destroyed || defender_destroyed {
            self.units.retain(|unit| !unit.destroyed());
        }

        if !support_fire {
            self.attack_selection.clear();
        }
        Some(result)
    }

    /// Move one victory hex from `side`'s pending count to the enemy's.
    ///
    /// Returns true when `side` has no objectives left to take. A side
    /// whose count is already zero has already won; the call reports that
    /// again without touching the counters.
    fn update_victory_sides(&mut self, side: Side, enemy: Side) -> bool {
        if self.victory_pending[side.index()] == 0 {
            info!("side {:?} already holds every victory hex", side);
            return true;
        }
        self.victory_pending[side.index()] -= 1;
        self.victory_pending[enemy.index()] += 1;
        info!(
            "victory hexes pending: {:?} {} / {:?} {}",
            side,
            self.victory_pending[side.index()],
            enemy,
            self.victory_pending[enemy.index()]
        );
        if self.victory_pending[side.index()] == 0 {
            info!("side {:?} wins", side);
            return true;
        }
        false
    }

    // ==================== Unit Support Actions ====================

    /// Resupply a unit with whatever the rules grant where it stands.
    /// Resupplying ends the unit's turn.
    pub fn resupply_unit(&mut self, id: UnitId) {
        let supplies = match find_unit(&self.units, id) {
            Some(unit) => self.rules.resupply_value(&self.grid, unit),
            None => return,
        };
        if let Some(unit) = find_unit_mut(&mut self.units, id) {
            unit.resupply(supplies.ammo, supplies.fuel);
        }
        self.attack_selection.clear();
        self.move_selection.clear();
    }

    /// Reinforce a unit with replacement strength.
    /// Reinforcing ends the unit's turn.
    pub fn reinforce_unit(&mut self, id: UnitId) {
        let strength = match find_unit(&self.units, id) {
            Some(unit) => self.rules.reinforce_value(&self.grid, unit),
            None => return,
        };
        if let Some(unit) = find_unit_mut(&mut self.units, id) {
            unit.reinforce(strength);
        }
        self.attack_selection.clear();
        self.move_selection.clear();
    }

    /// Mount a unit onto its transport and reselect it so the highlights
    /// reflect the transport's movement
    pub fn mount_unit(&mut self, id: UnitId) {
        match find_unit_mut(&mut self.units, id) {
            Some(unit) => unit.mount(),
            None => return,
        }
        self.move_selection.clear();
        self.attack_selection.clear();
        self.select_unit(id);
    }

    /// Dismount a unit from its transport and reselect it
    pub fn unmount_unit(&mut self, id: UnitId) {
        if find_unit(&self.units, id).is_none() {
            return;
        }
        self.move_selection.clear();
        self.attack_selection.clear();
        if let Some(unit) = find_unit_mut(&mut self.units, id) {
            unit.unmount();
        }
        self.select_unit(id);
    }

    /// Switch a unit to new equipment and cache its icon
    pub fn upgrade_unit(&mut self, id: UnitId, equipment: EquipmentId) {
        let icon = match find_unit_mut(&mut self.units, id) {
            Some(unit) => {
                unit.equipment = equipment;
                unit.icon()
            }
            None => return,
        };
        self.icon_cache.insert(equipment, icon);
    }

    // ==================== Turn Management ====================

    /// Hand the battle to the other side.
    ///
    /// Stamps the turn on every player of the side that just finished,
    /// then flips the active side. When control returns to the first side
    /// the game turn advances and every unit's action flags reset.
    pub fn end_turn(&mut self) {
        self.clear_selection();

        let side = self.current_side;
        let turn = self.turn;
        for player in self.players.iter_mut().filter(|p| p.side == side) {
            player.played_turn = Some(turn);
        }

        self.current_side = side.opponent();
        debug!("side to play: {:?}", self.current_side);
        if self.current_side == Side::Axis {
            self.turn += 1;
            for unit in &mut self.units {
                unit.reset_turn_flags();
            }
        }
    }

    // ==================== Internal Linking ====================

    /// Place a registered unit on a cell, fixing both sides of the link.
    ///
    /// The rules decide which slot the unit belongs in. If the slot was
    /// already taken the previous occupant is pushed off the grid and the
    /// displacement logged; snapshot data that double-books a slot is the
    /// only way that happens.
    fn link_unit(&mut self, id: UnitId, cell: Cell) {
        let Some(unit) = find_unit(&self.units, id) else {
            return;
        };
        let air = self.rules.is_air(unit);

        if let Some(displaced) = self.grid.hex_mut(cell).set_unit(id, air) {
            warn!(
                "unit {} displaced unit {} at ({},{})",
                id, displaced, cell.row, cell.col
            );
            if let Some(previous) = find_unit_mut(&mut self.units, displaced) {
                previous.set_cell(None);
            }
        }
        if let Some(unit) = find_unit_mut(&mut self.units, id) {
            unit.set_cell(Some(cell));
        }
    }

    /// Take a registered unit off a cell, fixing both sides of the link
    fn unlink_unit(&mut self, id: UnitId, cell: Cell) {
        let Some(unit) = find_unit(&self.units, id) else {
            return;
        };
        let air = self.rules.is_air(unit);
        self.grid.hex_mut(cell).del_unit(id, air);
        if let Some(unit) = find_unit_mut(&mut self.units, id) {
            unit.set_cell(None);
        }
    }
}

impl fmt::Debug for Battlefield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Battlefield")
            .field("name", &self.name)
            .field("rows", &self.grid.rows())
            .field("cols", &self.grid.cols())
            .field("turn", &self.turn)
            .field("current_side", &self.current_side)
            .field("players", &self.players.len())
            .field("units", &self.units.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::equipment;
    use crate::scenario::UnitSnapshot;

    fn two_player_field(rows: u32, cols: u32) -> Battlefield {
        let mut field = Battlefield::standard();
        field.add_player(Player::new(0, Side::Axis, 0));
        field.add_player(Player::new(1, Side::Allies, 8));
        field.allocate(rows, cols);
        field
    }

    fn infantry(owner: PlayerId) -> Unit {
        let mut unit = Unit::new(owner, equipment::RIFLE_INFANTRY);
        unit.ammo = 10;
        unit
    }

    #[test]
    fn test_add_unit_assigns_increasing_ids() {
        let mut field = two_player_field(3, 3);
        let first = field.add_unit(infantry(0));
        let second = field.add_unit(infantry(1));
        assert!(second > first);

        // Reallocation empties the registry but never recycles ids
        field.allocate(3, 3);
        assert!(field.units().is_empty());
        let third = field.add_unit(infantry(0));
        assert!(third > second);
    }

    #[test]
    fn test_add_unit_resolves_owner_with_fallback() {
        let mut field = two_player_field(3, 3);
        let id = field.add_unit(infantry(1));
        let unit = field.get_unit(id).unwrap();
        assert_eq!(unit.player(), Some(1));
        assert_eq!(unit.side(), Some(Side::Allies));

        // Owner 9 matches no player and lands on player 0
        let id = field.add_unit(infantry(9));
        let unit = field.get_unit(id).unwrap();
        assert_eq!(unit.player(), Some(0));
        assert_eq!(unit.side(), Some(Side::Axis));
        assert_eq!(unit.owner, 9, "the declared owner is kept as written");
    }

    #[test]
    fn test_add_unit_caches_icons() {
        let mut field = two_player_field(3, 3);
        field.add_unit(infantry(0));
        assert!(field.unit_icons().contains_key(&equipment::RIFLE_INFANTRY));
    }

    #[test]
    fn test_deploy_links_both_directions() {
        let mut field = two_player_field(3, 3);
        let cell = Cell::new(1, 1);
        let id = field.deploy_unit(infantry(0), cell);

        assert_eq!(field.hex(cell).ground_unit(), Some(id));
        assert_eq!(field.get_unit(id).unwrap().cell(), Some(cell));
    }

    #[test]
    fn test_deploy_displacement_pushes_previous_off_grid() {
        let mut field = two_player_field(3, 3);
        let cell = Cell::new(1, 1);
        let first = field.deploy_unit(infantry(0), cell);
        let second = field.deploy_unit(infantry(0), cell);

        assert_eq!(field.hex(cell).ground_unit(), Some(second));
        assert_eq!(field.get_unit(first).unwrap().cell(), None);
    }

    #[test]
    fn test_air_and_ground_share_a_hex() {
        let mut field = two_player_field(3, 3);
        let cell = Cell::new(1, 1);
        let ground = field.deploy_unit(infantry(0), cell);
        let air = field.deploy_unit(Unit::new(0, equipment::FIGHTER), cell);

        assert_eq!(field.hex(cell).ground_unit(), Some(ground));
        assert_eq!(field.hex(cell).air_unit(), Some(air));
    }

    #[test]
    fn test_set_hex_counts_victory_marks() {
        let mut field = two_player_field(3, 3);
        let snapshot = HexSnapshot {
            victory_side: Some(Side::Allies),
            owner: Some(0),
            ..HexSnapshot::default()
        };
        field.set_hex(0, 0, &snapshot);
        assert_eq!(field.victory_pending(), [0, 1]);
    }

    #[test]
    fn test_set_hex_spawns_units() {
        let mut field = two_player_field(3, 3);
        let snapshot = HexSnapshot {
            unit: Some(UnitSnapshot::new(1, equipment::LIGHT_TANK)),
            air_unit: Some(UnitSnapshot::new(1, equipment::FIGHTER)),
            ..HexSnapshot::default()
        };
        field.set_hex(2, 2, &snapshot);

        let cell = Cell::new(2, 2);
        assert!(field.hex(cell).ground_unit().is_some());
        assert!(field.hex(cell).air_unit().is_some());
        assert_eq!(field.units().len(), 2);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_set_hex_off_grid_panics() {
        let mut field = two_player_field(2, 2);
        field.set_hex(5, 5, &HexSnapshot::default());
    }

    #[test]
    fn test_unit_queries_tolerate_any_cell() {
        let mut field = two_player_field(3, 3);
        let axis = field.deploy_unit(infantry(0), Cell::new(0, 0));
        field.deploy_unit(infantry(0), Cell::new(1, 1));
        let enemy = field.deploy_unit(infantry(1), Cell::new(2, 2));

        assert_eq!(field.unit_at(Cell::new(0, 0), false).map(|u| u.id()), Some(axis));
        assert!(field.unit_at(Cell::new(9, 9), false).is_none());

        // Friendly units are never attackable, enemies are
        assert!(field.attackable_unit_at(Cell::new(1, 1), axis, false).is_none());
        assert_eq!(
            field
                .attackable_unit_at(Cell::new(2, 2), axis, false)
                .map(|u| u.id()),
            Some(enemy)
        );
    }

    #[test]
    fn test_get_player_fallback() {
        let field = two_player_field(2, 2);
        assert_eq!(field.get_player(1).unwrap().id, 1);
        assert_eq!(field.get_player(77).unwrap().id, 0);
        assert!(Battlefield::standard().get_player(0).is_none());
    }

    #[test]
    fn test_select_only_current_side() {
        let mut field = two_player_field(3, 3);
        let axis = field.deploy_unit(infantry(0), Cell::new(0, 0));
        let allies = field.deploy_unit(infantry(1), Cell::new(2, 2));

        assert!(field.select_unit(axis));
        assert_eq!(field.selected_unit(), Some(axis));
        assert!(!field.move_selection().is_empty());

        // The other side cannot be selected and the old selection stays
        assert!(!field.select_unit(allies));
        assert_eq!(field.selected_unit(), Some(axis));
    }

    #[test]
    fn test_select_skips_used_up_ranges() {
        let mut field = two_player_field(3, 3);
        let id = field.deploy_unit(infantry(0), Cell::new(1, 1));
        field.deploy_unit(infantry(1), Cell::new(1, 2));

        assert!(field.select_unit(id));
        assert!(!field.move_selection().is_empty());
        assert!(!field.attack_selection().is_empty());

        field.move_unit(id, Cell::new(2, 2));
        assert!(field.select_unit(id));
        assert!(
            field.move_selection().is_empty(),
            "a moved unit gets no move highlights"
        );
        assert!(!field.attack_selection().is_empty());
    }

    #[test]
    fn test_move_repaints_existing_flag_only() {
        let mut field = two_player_field(3, 3);
        let id = field.deploy_unit(infantry(0), Cell::new(0, 0));

        let flagged = HexSnapshot {
            flag: Some(8),
            ..HexSnapshot::default()
        };
        field.set_hex(0, 1, &flagged);

        field.move_unit(id, Cell::new(0, 1));
        assert_eq!(field.hex(Cell::new(0, 1)).flag, Some(0));

        // A bare hex stays bare
        field.move_unit(id, Cell::new(0, 2));
        assert_eq!(field.hex(Cell::new(0, 2)).flag, None);
    }

    #[test]
    fn test_move_transfers_ownership_and_pays_fuel() {
        let mut field = two_player_field(3, 3);
        let mut tank = Unit::new(0, equipment::LIGHT_TANK);
        tank.ammo = 8;
        tank.fuel = 60;
        let id = field.deploy_unit(tank, Cell::new(0, 0));

        field.move_unit(id, Cell::new(0, 2));
        let unit = field.get_unit(id).unwrap();
        assert_eq!(unit.cell(), Some(Cell::new(0, 2)));
        assert_eq!(unit.fuel, 58);
        assert!(unit.moved);
        assert_eq!(field.hex(Cell::new(0, 2)).owner, Some(0));
        assert_eq!(field.hex(Cell::new(0, 0)).ground_unit(), None);
    }

    #[test]
    fn test_move_unknown_unit_is_noop() {
        let mut field = two_player_field(3, 3);
        assert_eq!(field.move_unit(42, Cell::new(1, 1)), None);
    }

    #[test]
    fn test_copy_from_reassigns_ids_and_keeps_players() {
        let mut source = two_player_field(3, 3);
        source.name = "Source".to_string();
        source.deploy_unit(infantry(0), Cell::new(1, 1));

        let mut target = Battlefield::standard();
        target.add_player(Player::new(0, Side::Axis, 1));
        target.copy_from(&source);

        assert_eq!(target.name, "Source");
        assert_eq!(target.units().len(), 1);
        // The copy keeps its own player roster
        assert_eq!(target.players().len(), 1);
        assert_eq!(target.players()[0].country, 1);
        assert_eq!(
            target.hex(Cell::new(1, 1)).ground_unit(),
            Some(target.units()[0].id())
        );
    }

    #[test]
    fn test_copy_preserves_victory_figures() {
        let mut source = two_player_field(2, 2);
        let marked = HexSnapshot {
            victory_side: Some(Side::Axis),
            ..HexSnapshot::default()
        };
        source.set_hex(0, 0, &marked);
        assert_eq!(source.victory_pending(), [1, 0]);

        let mut target = two_player_field(2, 2);
        target.copy_from(&source);
        assert_eq!(target.victory_pending(), [1, 0]);
    }

    #[test]
    fn test_apply_scenario_recounts_missing_figures() {
        // A handwritten scenario that never tracked counters still gets
        // correct totals from its victory marks.
        let json = r#"{
            "name": "Recount",
            "rows": 2,
            "cols": 2,
            "players": [
                {"id": 0, "side": "Axis", "country": 0, "prestige": 0, "played_turn": null},
                {"id": 1, "side": "Allies", "country": 8, "prestige": 0, "played_turn": null}
            ],
            "hexes": [
                {"victory_side": "Axis"},
                {},
                {},
                {}
            ]
        }"#;
        let snapshot = ScenarioSnapshot::from_json(json).unwrap();
        let mut field = Battlefield::standard();
        field.apply_scenario(&snapshot).unwrap();
        assert_eq!(field.victory_pending(), [1, 0]);
    }

    #[test]
    fn test_end_turn_rotation() {
        let mut field = two_player_field(3, 3);
        let id = field.deploy_unit(infantry(0), Cell::new(0, 0));
        field.move_unit(id, Cell::new(0, 1));
        assert!(field.get_unit(id).unwrap().moved);

        field.end_turn();
        assert_eq!(field.current_side(), Side::Allies);
        assert_eq!(field.turn(), 0);
        assert_eq!(field.get_player(0).unwrap().played_turn, Some(0));
        assert_eq!(field.get_player(1).unwrap().played_turn, None);
        assert!(
            field.get_unit(id).unwrap().moved,
            "flags only reset when the full turn wraps"
        );

        field.end_turn();
        assert_eq!(field.current_side(), Side::Axis);
        assert_eq!(field.turn(), 1);
        assert!(!field.get_unit(id).unwrap().moved);
        assert_eq!(field.get_player(1).unwrap().played_turn, Some(0));
    }

    #[test]
    fn test_upgrade_unit_swaps_equipment_and_icon() {
        let mut field = two_player_field(3, 3);
        let id = field.deploy_unit(infantry(0), Cell::new(0, 0));

        field.upgrade_unit(id, equipment::MEDIUM_TANK);
        assert_eq!(field.get_unit(id).unwrap().equipment, equipment::MEDIUM_TANK);
        assert!(field.unit_icons().contains_key(&equipment::MEDIUM_TANK));

        // Unknown ids change nothing
        field.upgrade_unit(999, equipment::TRUCK);
        assert!(!field.unit_icons().contains_key(&equipment::TRUCK));
    }

    #[test]
    fn test_dump_map_lists_players_and_victory() {
        let field = two_player_field(2, 2);
        let dump = field.dump_map();
        assert!(dump.contains("Player: 0"));
        assert!(dump.contains("Germany"));
        assert!(dump.contains("Victory hexes pending"));
    }
}
