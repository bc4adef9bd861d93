//! Players and the sides they fight on.
//!
//! This module contains:
//! - `Side`: the two opposing sides of a battle
//! - `Player`: one participant with country, prestige and turn record
//! - `countries`: the country roster scenarios refer to by id
//!
//! Several players can share a side, so turn order rotates over sides, not
//! players. A full game turn has elapsed once both sides have acted.

use serde::{Deserialize, Serialize};

/// Player id, an index into the battlefield's player list
pub type PlayerId = u8;

/// Country id, an index into the [`countries`] roster
pub type CountryId = u8;

/// One of the two opposing sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    /// Side 0, moves first each turn
    #[default]
    Axis,
    /// Side 1
    Allies,
}

impl Side {
    /// Both sides in play order
    pub const ALL: [Side; 2] = [Side::Axis, Side::Allies];

    /// Index for side-keyed tables such as victory counters
    pub fn index(&self) -> usize {
        match self {
            Side::Axis => 0,
            Side::Allies => 1,
        }
    }

    /// The side fighting against this one
    pub fn opponent(&self) -> Side {
        match self {
            Side::Axis => Side::Allies,
            Side::Allies => Side::Axis,
        }
    }
}

/// Country roster.
///
/// Scenario files store countries as plain indices into this list, matching
/// the flag and unit icon sheets.
pub mod countries {
    use super::CountryId;

    /// Country names in flag sheet order
    pub const NAMES: [&str; 18] = [
        "Germany",
        "Italy",
        "Hungary",
        "Romania",
        "Bulgaria",
        "Finland",
        "United States",
        "United Kingdom",
        "Soviet Union",
        "France",
        "Poland",
        "Belgium",
        "Netherlands",
        "Norway",
        "Greece",
        "Yugoslavia",
        "Canada",
        "Australia",
    ];

    /// Name for a country id, or "Unknown" for ids off the roster
    pub fn name(id: CountryId) -> &'static str {
        NAMES.get(id as usize).copied().unwrap_or("Unknown")
    }
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player id, equal to this player's position in the battlefield list
    pub id: PlayerId,
    /// Side this player fights on
    pub side: Side,
    /// Country the player commands
    pub country: CountryId,
    /// Prestige points available for reinforcements and upgrades
    pub prestige: i32,
    /// Last turn number on which this player finished acting
    pub played_turn: Option<u32>,
}

impl Player {
    /// Create a new player with no prestige and no turns played
    pub fn new(id: PlayerId, side: Side, country: CountryId) -> Self {
        Self {
            id,
            side,
            country,
            prestige: 0,
            played_turn: None,
        }
    }

    /// Name of the player's country
    pub fn country_name(&self) -> &'static str {
        countries::name(self.country)
    }
}
