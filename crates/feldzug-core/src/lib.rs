//! Feldzug - a turn-based hex wargame engine
//!
//! This crate provides the battlefield state engine for Feldzug, including:
//! - Hex coordinate system and terrain grid
//! - Unit registry with movement, combat and supply state
//! - Player and side bookkeeping with victory hex accounting
//! - Scenario snapshots for loading, saving and deep-copying battles
//!
//! # Architecture
//!
//! The engine is the single authority over battle state. Drivers (a CLI, a
//! renderer, an AI) issue operations against a [`Battlefield`] and read the
//! state back; they never mutate hexes or units directly. Everything
//! quantitative comes through the [`RulesProvider`] contract, so rule sets
//! can be swapped without touching the engine.
//!
//! # Modules
//!
//! - [`hex`]: Coordinate system, facings and the hex cell itself
//! - [`grid`]: Rectangular storage for the hex grid
//! - [`player`]: Players, sides and countries
//! - [`unit`]: Live units and their registry
//! - [`rules`]: The rules contract and the built-in standard rules
//! - [`scenario`]: Serialized battlefields, loading and generation
//! - [`battlefield`]: The authoritative battle state and its operations

pub mod battlefield;
pub mod grid;
pub mod hex;
pub mod player;
pub mod rules;
pub mod scenario;
pub mod unit;

// Re-export commonly used types
pub use battlefield::Battlefield;
pub use grid::Grid;
pub use hex::{Cell, Facing, Hex, Road, Terrain};
pub use player::{CountryId, Player, PlayerId, Side};
pub use rules::{
    CombatResult, EquipmentCatalog, EquipmentStats, RulesProvider, StandardRules, Supplies,
    UnitClass,
};
pub use scenario::{HexSnapshot, ScenarioError, ScenarioSnapshot, UnitSnapshot};
pub use unit::{EquipmentId, Transport, Unit, UnitId};
