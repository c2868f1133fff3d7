//! # Skirmish Core
//!
//! Deterministic simulation core for a small real-time strategy game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond optional data-file loading
//! - No randomness
//! - No floating-point math (uses fixed-point)
//!
//! Players own a resource ledger and a set of world entities. Entities are
//! one record with optional capability modules: units and workers move,
//! workers build, structures are built and train units. A stateless
//! command router turns pointer input into operations each tick.
//!
//! ## Crate Structure
//!
//! - [`math`] - Fixed-point math utilities
//! - [`economy`] - Resource ledgers and rates
//! - [`templates`] - Named entity templates
//! - [`entity`] - Entity records and storage
//! - [`movement`], [`construction`], [`production`] - Capability modules
//! - [`simulation`] - Core simulation loop and entity/player operations
//! - [`input`] - Command router
//! - [`view`] - Presentation snapshots

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod components;
pub mod config;
pub mod construction;
pub mod economy;
pub mod entity;
pub mod error;
pub mod input;
pub mod math;
pub mod movement;
pub mod player;
pub mod production;
pub mod simulation;
pub mod templates;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::SimConfig;
    pub use crate::construction::{Assister, ConstructProgress, Constructible, ConstructionPhase};
    pub use crate::economy::{ResourceKind, ResourceLedger, ResourceRates, ResourceReadout};
    pub use crate::entity::Entity;
    pub use crate::error::{GameError, Result};
    pub use crate::input::{dispatch_input, CursorHint, Hit, HitTarget, InputFrame, Picker};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::movement::{MoveState, Movable};
    pub use crate::player::{Player, PlayerId};
    pub use crate::production::Producer;
    pub use crate::simulation::{Simulation, TickEvents};
    pub use crate::templates::{EntityTemplate, TemplateCatalog, TemplateKind};
    pub use crate::view::{EntityView, PlayerView, StructureView};
}
