//! Combat units and their lifecycle.
//!
//! This module contains:
//! - `Unit`: a live unit registered on a battlefield
//! - `Transport`: organic transport a unit can mount
//! - `find_unit`: id lookup into a unit registry slice
//!
//! A `Unit` carries two kinds of state. The pub fields (equipment, strength,
//! supplies, turn flags) are plain data that scenarios and drivers may write
//! freely. The private fields (id, resolved player, side, cell) are links the
//! battlefield maintains when the unit is registered and placed, and only
//! change through battlefield operations.

use crate::hex::{Cell, Facing};
use crate::player::{PlayerId, Side};
use serde::{Deserialize, Serialize};

/// Unit id, assigned by the battlefield at registration
pub type UnitId = u32;

/// Equipment id, an index into a rules provider's equipment catalog
pub type EquipmentId = u16;

/// Strength points of a freshly raised unit
pub const DEFAULT_STRENGTH: u32 = 10;

/// Organic transport attached to a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transport {
    /// Equipment the transport uses while the unit is mounted
    pub equipment: EquipmentId,
    /// Display name
    pub name: String,
}

impl Transport {
    /// Create a transport
    pub fn new(equipment: EquipmentId, name: impl Into<String>) -> Self {
        Self {
            equipment,
            name: name.into(),
        }
    }

    /// Icon path for this transport's equipment
    pub fn icon(&self) -> String {
        icon_path(self.equipment)
    }
}

/// A live unit on the battlefield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    player: Option<PlayerId>,
    side: Option<Side>,
    cell: Option<Cell>,
    destroyed: bool,
    /// Owning player id as declared by the scenario
    pub owner: PlayerId,
    /// Equipment this unit fights with
    pub equipment: EquipmentId,
    /// Transport the unit can mount, if it has one
    pub transport: Option<Transport>,
    /// Whether the unit is currently riding its transport
    pub mounted: bool,
    /// Strength points, the unit is destroyed at zero
    pub strength: u32,
    /// Ammunition remaining
    pub ammo: u32,
    /// Fuel remaining
    pub fuel: u32,
    /// Direction the unit points
    pub facing: Facing,
    /// Whether the unit has moved this turn
    pub moved: bool,
    /// Whether the unit has attacked this turn
    pub fired: bool,
    /// Whether the unit has resupplied this turn
    pub resupplied: bool,
}

impl Unit {
    /// Create a fresh unit at full strength with empty supplies.
    ///
    /// Supplies start at zero because capacity is a rules question; scenario
    /// data or a resupply action fills them in.
    pub fn new(owner: PlayerId, equipment: EquipmentId) -> Self {
        Self {
            id: 0,
            player: None,
            side: None,
            cell: None,
            destroyed: false,
            owner,
            equipment,
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

    /// Unique id, meaningful once the unit is registered on a battlefield
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Resolved owning player, set at registration
    pub fn player(&self) -> Option<PlayerId> {
        self.player
    }

    /// Side the unit fights on, set at registration
    pub fn side(&self) -> Option<Side> {
        self.side
    }

    /// Cell the unit stands on, `None` while off the grid
    pub fn cell(&self) -> Option<Cell> {
        self.cell
    }

    /// Whether the unit has been destroyed
    pub fn destroyed(&self) -> bool {
        self.destroyed
    }

    /// Icon path for this unit's current equipment
    pub fn icon(&self) -> String {
        icon_path(self.equipment)
    }

    pub(crate) fn assign_id(&mut self, id: UnitId) {
        self.id = id;
    }

    pub(crate) fn bind_player(&mut self, player: PlayerId, side: Side) {
        self.player = Some(player);
        self.side = Some(side);
    }

    pub(crate) fn set_cell(&mut self, cell: Option<Cell>) {
        self.cell = cell;
    }

    /// Pay the fuel cost of a move and mark the unit as moved
    pub(crate) fn travel(&mut self, cost: u32) {
        self.fuel = self.fuel.saturating_sub(cost);
        self.moved = true;
    }

    /// Spend a shot. A full attack also ends the unit's firing for the turn,
    /// support fire does not.
    pub(crate) fn fire(&mut self, full_attack: bool) {
        self.ammo = self.ammo.saturating_sub(1);
        if full_attack {
            self.fired = true;
        }
    }

    /// Take casualties, destroying the unit when strength reaches zero
    pub(crate) fn hit(&mut self, kills: u32) {
        self.strength = self.strength.saturating_sub(kills);
        if self.strength == 0 {
            self.destroyed = true;
        }
    }

    /// Receive supplies. Resupplying consumes the unit's whole turn.
    pub(crate) fn resupply(&mut self, ammo: u32, fuel: u32) {
        self.ammo += ammo;
        self.fuel += fuel;
        self.resupplied = true;
        self.moved = true;
        self.fired = true;
    }

    /// Receive replacement strength. Reinforcing consumes the unit's turn.
    pub(crate) fn reinforce(&mut self, strength: u32) {
        self.strength += strength;
        self.moved = true;
        self.fired = true;
    }

    /// Mount the transport, if the unit has one
    pub(crate) fn mount(&mut self) {
        if self.transport.is_some() {
            self.mounted = true;
        }
    }

    /// Dismount from the transport
    pub(crate) fn unmount(&mut self) {
        self.mounted = false;
    }

    /// Clear the per-turn action flags at the start of a new game turn
    pub(crate) fn reset_turn_flags(&mut self) {
        self.moved = false;
        self.fired = false;
        self.resupplied = false;
    }
}

/// Find a unit by id in a registry slice
pub fn find_unit(units: &[Unit], id: UnitId) -> Option<&Unit> {
    units.iter().find(|unit| unit.id == id)
}

/// Mutable id lookup into a registry slice
pub(crate) fn find_unit_mut(units: &mut [Unit], id: UnitId) -> Option<&mut Unit> {
    units.iter_mut().find(|unit| unit.id == id)
}

fn icon_path(equipment: EquipmentId) -> String {
    format!("units/{:04}.png", equipment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_spends_fuel_and_marks_moved() {
        let mut unit = Unit::new(0, 10);
        unit.fuel = 5;

        unit.travel(3);
        assert_eq!(unit.fuel, 2);
        assert!(unit.moved);

        // Fuel bottoms out at zero
        unit.travel(10);
        assert_eq!(unit.fuel, 0);
    }

    #[test]
    fn test_fire_full_vs_support() {
        let mut unit = Unit::new(0, 10);
        unit.ammo = 2;

        unit.fire(false);
        assert_eq!(unit.ammo, 1);
        assert!(!unit.fired, "support fire leaves the turn available");

        unit.fire(true);
        assert_eq!(unit.ammo, 0);
        assert!(unit.fired);
    }

    #[test]
    fn test_hit_destroys_at_zero_strength() {
        let mut unit = Unit::new(0, 10);
        unit.hit(4);
        assert_eq!(unit.strength, 6);
        assert!(!unit.destroyed());

        unit.hit(9);
        assert_eq!(unit.strength, 0);
        assert!(unit.destroyed());
    }

    #[test]
    fn test_resupply_consumes_turn() {
        let mut unit = Unit::new(0, 10);
        unit.resupply(4, 12);
        assert_eq!(unit.ammo, 4);
        assert_eq!(unit.fuel, 12);
        assert!(unit.moved && unit.fired && unit.resupplied);
    }

    #[test]
    fn test_mount_without_transport_is_noop() {
        let mut unit = Unit::new(0, 10);
        unit.mount();
        assert!(!unit.mounted);

        unit.transport = Some(Transport::new(40, "Opel Blitz"));
        unit.mount();
        assert!(unit.mounted);

        unit.unmount();
        assert!(!unit.mounted);
    }

    #[test]
    fn test_reset_turn_flags() {
        let mut unit = Unit::new(0, 10);
        unit.ammo = 1;
        unit.travel(0);
        unit.fire(true);
        unit.reset_turn_flags();
        assert!(!unit.moved && !unit.fired && !unit.resupplied);
    }

    #[test]
    fn test_find_unit() {
        let mut a = Unit::new(0, 10);
        a.assign_id(3);
        let mut b = Unit::new(1, 20);
        b.assign_id(7);
        let units = vec![a, b];

        assert_eq!(find_unit(&units, 7).map(|u| u.owner), Some(1));
        assert!(find_unit(&units, 99).is_none());
    }
}
