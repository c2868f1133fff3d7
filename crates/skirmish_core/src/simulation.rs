//! Core simulation loop.
//!
//! The simulation owns every player and entity and runs all game logic
//! deterministically at a fixed tick rate. Entity and player operations
//! are inert when issued in the wrong state: they return `false` or
//! `None` and leave the world untouched.
//!
//! # Determinism
//!
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - No randomness
//! - Consistent iteration order (sorted entity IDs)
//! - Same inputs always produce same outputs
//!
//! # Example
//!
//! ```
//! use skirmish_core::math::{Fixed, Vec2Fixed};
//! use skirmish_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new();
//! let player = sim.add_player("alice", true);
//! let tank = sim
//!     .spawn_entity("Tank", Some(player), Vec2Fixed::ZERO, Fixed::ZERO)
//!     .unwrap();
//!
//! sim.start_move(tank, Vec2Fixed::from_ints(10, 0));
//! for _ in 0..40 {
//!     sim.tick();
//! }
//! assert_eq!(sim.entity(tank).unwrap().position, Vec2Fixed::from_ints(10, 0));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::components::{EntityId, Material, Viewport};
use crate::config::SimConfig;
use crate::construction::{ConstructProgress, Constructible};
use crate::economy::{apply_rates, ResourceKind, ResourceRates};
use crate::entity::{Entity, EntityStorage};
use crate::error::{GameError, Result};
use crate::input::{CursorHint, Hit, HitTarget};
use crate::math::{Fixed, Vec2Fixed};
use crate::movement::{advance_movement, MoveStep};
use crate::player::{PendingPlacement, Player, PlayerId};
use crate::production::spawn_point_for;
use crate::templates::TemplateCatalog;

/// Events generated during a simulation tick.
///
/// These events can be used by the presentation layer to trigger effects,
/// sounds, animations, etc.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Entities spawned since the previous tick.
    pub spawned: Vec<EntityId>,
    /// Structures that finished construction.
    pub construction_completed: Vec<EntityId>,
    /// Mobile entities that reached their destination.
    pub arrived: Vec<EntityId>,
}

/// The core game simulation.
///
/// # System Execution Order
///
/// Each tick, systems run in this order:
/// 1. **Economy** - Apply production/consumption rates to ledgers
/// 2. **Production** - Advance build queues of complete structures
/// 3. **Assist** - Idle workers feed hit points into their structure
/// 4. **Movement** - Rotate, then translate, mobile entities
/// 5. **Players** - Refresh readouts, rates and placement feedback
///
/// Input is dispatched after the tick, see [`crate::input`].
#[derive(Debug, Clone)]
pub struct Simulation {
    /// Current simulation tick.
    tick: u64,
    config: SimConfig,
    catalog: TemplateCatalog,
    players: Vec<Player>,
    /// All entities in the simulation.
    entities: EntityStorage,
    /// Events raised since the last tick returned.
    events: TickEvents,
}

impl Simulation {
    /// Create a simulation with the default config and standard templates.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SimConfig::default(), TemplateCatalog::standard())
    }

    /// Create a simulation from loaded data.
    #[must_use]
    pub fn with_config(config: SimConfig, catalog: TemplateCatalog) -> Self {
        Self {
            tick: 0,
            config,
            catalog,
            players: Vec::new(),
            entities: EntityStorage::new(),
            events: TickEvents::default(),
        }
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Simulation constants.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Template lookup.
    #[must_use]
    pub const fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Get a reference to the entity storage.
    #[must_use]
    pub const fn entities(&self) -> &EntityStorage {
        &self.entities
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// All players in join order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Get a player by ID.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.index())
    }

    /// Get a mutable reference to a player by ID.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id.index())
    }

    /// Add a player with the configured starting resources.
    pub fn add_player(&mut self, username: impl Into<String>, is_human: bool) -> PlayerId {
        let id = PlayerId::new(u32::try_from(self.players.len()).unwrap_or(u32::MAX));
        let mut player = Player::new(id, username, is_human);
        for start in &self.config.starting_resources {
            player.increment_capacity(start.kind, start.capacity);
            player.add_resource(start.kind, Fixed::from_num(start.amount));
        }
        player.refresh(ResourceRates::new(), ResourceRates::new());
        tracing::info!("Player {:?} '{}' joined", id, player.username);
        self.players.push(player);
        id
    }

    /// Spawn a built entity from a template.
    ///
    /// Structures get their spawn point immediately and owned entities
    /// grant their template capacity to the owner.
    pub fn spawn_entity(
        &mut self,
        template: &str,
        owner: Option<PlayerId>,
        position: Vec2Fixed,
        heading: Fixed,
    ) -> Option<EntityId> {
        let Some(definition) = self.catalog.get(template) else {
            tracing::warn!("Template '{}' not found, nothing spawned", template);
            return None;
        };
        let mut entity = Entity::from_template(definition, position, heading);
        entity.owner = owner;
        if let Some(producer) = entity.producer.as_mut() {
            let clearance = Fixed::from_num(self.config.spawn_clearance);
            producer.set_spawn_point(spawn_point_for(position, heading, entity.extent, clearance));
        }

        let id = self.entities.insert(entity);
        self.grant_capacity(id);
        self.events.spawned.push(id);
        tracing::info!("Spawned {} {} for {:?}", template, id, owner);
        Some(id)
    }

    /// Remove an entity, clearing every reference players hold to it.
    ///
    /// Removing a worker that requested a pending placement also removes
    /// the preview.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        let mut orphaned = Vec::new();
        for player in &mut self.players {
            if player.selected == Some(id) {
                player.selected = None;
            }
            if let Some(placement) = player.placement {
                if placement.structure == id || placement.worker == id {
                    player.placement = None;
                    orphaned.push(placement.structure);
                }
            }
        }
        for structure in orphaned {
            self.entities.remove(structure);
        }
        Some(entity)
    }

    /// Topmost collidable entity whose footprint covers `point`.
    #[must_use]
    pub fn entity_at(&self, point: Vec2Fixed) -> Option<EntityId> {
        self.entities
            .iter_sorted()
            .filter(|e| e.collidable && e.bounds().contains_ground(point))
            .last()
            .map(|e| e.id)
    }

    // ---- world entity operations ----

    /// Set an entity's selection flag, recording `viewport` when selected.
    pub fn set_selection(&mut self, entity: EntityId, selected: bool, viewport: Viewport) -> bool {
        match self.entities.get_mut(entity) {
            Some(e) => {
                e.set_selection(selected, viewport);
                true
            }
            None => false,
        }
    }

    /// Make `entity` the player's selection, deselecting the previous one.
    pub fn select(&mut self, player: PlayerId, entity: EntityId) -> bool {
        let Some(viewport) = self.player(player).map(|p| p.viewport) else {
            return false;
        };
        if !self.entities.contains(entity) {
            return false;
        }
        self.deselect(player);
        self.set_selection(entity, true, viewport);
        if let Some(p) = self.player_mut(player) {
            p.selected = Some(entity);
        }
        true
    }

    /// Clear the player's selection.
    ///
    /// The entity stays flagged while another player still holds it.
    pub fn deselect(&mut self, player: PlayerId) -> bool {
        let Some(previous) = self.player_mut(player).and_then(|p| p.selected.take()) else {
            return false;
        };
        if self.players.iter().any(|p| p.selected == Some(previous)) {
            return true;
        }
        if let Some(e) = self.entities.get_mut(previous) {
            let viewport = e.viewport();
            e.set_selection(false, viewport);
        }
        true
    }

    /// Handle a click forwarded to `entity` by the command router.
    ///
    /// The base behavior moves the selection to a different clicked entity.
    /// Workers clicking a structure under construction resume building it
    /// instead. Mobile entities then move to a clicked terrain point and
    /// producers set their rally point while rally mode is active.
    pub fn mouse_click(&mut self, entity: EntityId, hit: &Hit, acting: PlayerId) -> bool {
        let Some(clicked) = self.entities.get(entity) else {
            return false;
        };
        let has_assister = clicked.assister.is_some();
        let has_movable = clicked.movable.is_some();
        let has_producer = clicked.producer.is_some();

        if has_assister && self.worker_mouse_click(entity, hit, acting) {
            return true;
        }
        let mut handled = self.base_mouse_click(entity, hit, acting);
        if has_movable {
            handled |= self.mobile_mouse_click(entity, hit, acting);
        }
        if has_producer {
            handled |= self.structure_mouse_click(entity, hit, acting);
        }
        handled
    }

    fn base_mouse_click(&mut self, entity: EntityId, hit: &Hit, acting: PlayerId) -> bool {
        let selected = self.entities.get(entity).is_some_and(Entity::is_selected);
        let HitTarget::Entity(other) = hit.target else {
            return false;
        };
        if !selected || other == entity || !self.entities.contains(other) {
            return false;
        }
        self.select(acting, other)
    }

    fn mobile_mouse_click(&mut self, entity: EntityId, hit: &Hit, acting: PlayerId) -> bool {
        if !self.commands_selected(entity, acting) {
            return false;
        }
        match (hit.target, hit.point) {
            (HitTarget::Terrain, Some(point)) => self.start_move(entity, point),
            _ => false,
        }
    }

    fn structure_mouse_click(&mut self, entity: EntityId, hit: &Hit, acting: PlayerId) -> bool {
        if !self.commands_selected(entity, acting) {
            return false;
        }
        let rally_mode = self.player(acting).is_some_and(|p| p.rally_mode);
        match (hit.target, hit.point) {
            (HitTarget::Terrain, Some(point)) if rally_mode => self.set_rally_point(entity, point),
            _ => false,
        }
    }

    fn worker_mouse_click(&mut self, entity: EntityId, hit: &Hit, acting: PlayerId) -> bool {
        if !self.commands_selected(entity, acting) {
            return false;
        }
        let HitTarget::Entity(structure) = hit.target else {
            return false;
        };
        if !self.entities.get(structure).is_some_and(Entity::needs_building) {
            return false;
        }
        self.set_building(entity, structure)
    }

    /// Whether `acting` is a human player who owns `entity` and has it selected.
    fn commands_selected(&self, entity: EntityId, acting: PlayerId) -> bool {
        let human = self.player(acting).is_some_and(|p| p.is_human);
        human
            && self
                .entities
                .get(entity)
                .is_some_and(|e| e.is_selected() && e.is_owned_by(acting))
    }

    /// Cursor hint for hovering `hover` while `entity` is selected.
    ///
    /// Later module overrides replace the base hint.
    #[must_use]
    pub fn set_hover_state(
        &self,
        entity: EntityId,
        hover: HitTarget,
        acting: PlayerId,
    ) -> Option<CursorHint> {
        if !self.commands_selected(entity, acting) {
            return None;
        }
        let e = self.entities.get(entity)?;
        let rally_mode = self.player(acting).is_some_and(|p| p.rally_mode);

        let mut hint = match hover {
            HitTarget::Entity(_) => Some(CursorHint::Select),
            HitTarget::Terrain => None,
        };
        if e.movable.is_some() && hover == HitTarget::Terrain {
            hint = Some(CursorHint::Move);
        }
        if e.producer.is_some() && hover == HitTarget::Terrain && rally_mode {
            hint = Some(CursorHint::RallyPoint);
        }
        hint
    }

    /// Perform one of the entity's advertised actions.
    ///
    /// Producers queue the named unit; workers start placing the named
    /// structure ahead of themselves.
    pub fn perform_action(&mut self, entity: EntityId, action: &str) -> bool {
        let Some(e) = self.entities.get(entity) else {
            return false;
        };
        if !e.offers_action(action) {
            tracing::debug!(entity, action, "Action not offered");
            return false;
        }
        if e.producer.is_some() {
            return self.create_unit(entity, action);
        }
        if e.assister.is_some() {
            let Some(owner) = e.owner else {
                return false;
            };
            if self.player(owner).is_some_and(Player::is_finding_placement) {
                tracing::debug!(entity, action, "Owner is already placing a structure");
                return false;
            }
            let offset = Fixed::from_num(self.config.placement_offset);
            let point = e.position + e.forward().scale(offset);
            let viewport = e.viewport();
            return self
                .create_building(owner, action, point, entity, viewport)
                .is_some();
        }
        false
    }

    /// Check ownership by identity.
    #[must_use]
    pub fn is_owned_by(&self, entity: EntityId, player: PlayerId) -> bool {
        self.entities
            .get(entity)
            .is_some_and(|e| e.is_owned_by(player))
    }

    /// Queue a unit at a complete, owned producer.
    pub fn create_unit(&mut self, entity: EntityId, template: &str) -> bool {
        let Some(e) = self.entities.get_mut(entity) else {
            return false;
        };
        if e.owner.is_none() || !e.offers_action(template) {
            tracing::debug!(entity, template, "Production order declined");
            return false;
        }
        let Some(producer) = e.producer.as_mut() else {
            return false;
        };
        producer.enqueue(template);
        tracing::debug!(entity, template, queued = producer.len(), "Production queued");
        true
    }

    /// Give a mobile entity a new destination, replacing any current order.
    ///
    /// Workers abandon the structure they were assisting.
    pub fn start_move(&mut self, entity: EntityId, destination: Vec2Fixed) -> bool {
        let Some(e) = self.entities.get_mut(entity) else {
            return false;
        };
        let (position, heading) = (e.position, e.heading);
        let Some(movable) = e.movable.as_mut() else {
            return false;
        };
        movable.start_move(position, heading, destination);
        if let Some(assister) = e.assister.as_mut() {
            assister.stop();
        }
        true
    }

    /// Send a worker to assist `structure`.
    pub fn set_building(&mut self, worker: EntityId, structure: EntityId) -> bool {
        let Some(target) = self.entities.get(structure).map(|s| s.position) else {
            return false;
        };
        if !self.entities.get(worker).is_some_and(|w| w.assister.is_some()) {
            return false;
        }
        self.start_move(worker, target);
        if let Some(assister) = self.entities.get_mut(worker).and_then(|w| w.assister.as_mut()) {
            assister.assign(structure);
        }
        tracing::debug!(worker, structure, "Worker assigned to structure");
        true
    }

    /// Put a structure into its building phase at zero hit points.
    pub fn start_structure_construction(&mut self, structure: EntityId) -> bool {
        let clearance = Fixed::from_num(self.config.spawn_clearance);
        let Some(e) = self.entities.get_mut(structure) else {
            return false;
        };
        let Some(constructible) = e.constructible.as_mut() else {
            return false;
        };
        if !constructible.begin(&mut e.health) {
            return false;
        }
        e.calculate_bounds();
        e.material = Material::Construction;
        let spawn = spawn_point_for(e.position, e.heading, e.extent, clearance);
        if let Some(producer) = e.producer.as_mut() {
            producer.set_spawn_point(spawn);
        }
        true
    }

    /// Feed hit points into a structure under construction.
    pub fn construct(&mut self, structure: EntityId, amount: u32) -> ConstructProgress {
        let Some(e) = self.entities.get_mut(structure) else {
            return ConstructProgress::Ignored;
        };
        let Some(constructible) = e.constructible.as_mut() else {
            return ConstructProgress::Ignored;
        };
        let progress = constructible.construct(&mut e.health, amount);
        if progress == ConstructProgress::Completed {
            e.material = Material::Standard;
            tracing::info!("Construction of {} {} complete", e.template, structure);
            self.grant_capacity(structure);
            self.events.construction_completed.push(structure);
        }
        progress
    }

    /// Set a producer's rally point while its human owner has it selected.
    pub fn set_rally_point(&mut self, entity: EntityId, point: Vec2Fixed) -> bool {
        let owner_human = self
            .entities
            .get(entity)
            .and_then(|e| e.owner)
            .and_then(|owner| self.player(owner))
            .is_some_and(|p| p.is_human);
        let Some(e) = self.entities.get_mut(entity) else {
            return false;
        };
        if !owner_human || !e.is_selected() {
            return false;
        }
        match e.producer.as_mut() {
            Some(producer) if producer.has_spawn_point() => {
                producer.set_rally_point(point);
                true
            }
            _ => false,
        }
    }

    /// Sell a placed structure: credit the owner, deselect and remove it.
    pub fn sell(&mut self, entity: EntityId) -> bool {
        let Some(e) = self.entities.get(entity) else {
            return false;
        };
        if e.constructible.is_none() || e.is_placing() {
            return false;
        }
        let (owner, value, selected) = (e.owner, e.sell_value, e.is_selected());
        let kind = self.config.sell_resource;
        if let Some(player) = owner.and_then(|o| self.players.get_mut(o.index())) {
            player.add_resource(kind, Fixed::from_num(value));
        }
        if selected {
            self.set_selection(entity, false, Viewport::default());
        }
        self.despawn(entity);
        tracing::info!("Sold {} for {} {}", entity, value, kind.display_name());
        true
    }

    // ---- player operations ----

    /// Start placing a structure preview for `player` at `point`.
    pub fn create_building(
        &mut self,
        player: PlayerId,
        template: &str,
        point: Vec2Fixed,
        creator: EntityId,
        viewport: Viewport,
    ) -> Option<EntityId> {
        if self.player(player)?.is_finding_placement() {
            return None;
        }
        let Some(definition) = self.catalog.get(template).filter(|t| t.kind.is_structure())
        else {
            tracing::warn!("Structure template '{}' not found", template);
            return None;
        };

        let mut preview = Entity::from_template(definition, point, Fixed::ZERO).with_owner(player);
        preview.constructible = Some(Constructible::placing());
        preview.collidable = false;
        preview.material = Material::Placement { valid: false };
        preview.set_viewport(viewport);
        let structure = self.entities.insert(preview);

        if let Some(p) = self.player_mut(player) {
            p.placement = Some(PendingPlacement {
                structure,
                worker: creator,
            });
        }
        self.refresh_placement(player);
        tracing::info!("{:?} placing {} {}", player, template, structure);
        Some(structure)
    }

    /// Whether the pending preview overlaps no other entity.
    ///
    /// Each of the preview's eight bounding corners is dropped onto the
    /// ground and tested against every collidable entity's bounds. An
    /// obstacle lying wholly between corners is not detected.
    #[must_use]
    pub fn can_place_building(&self, player: PlayerId) -> bool {
        let Some(placement) = self.player(player).and_then(Player::placement) else {
            return false;
        };
        let Some(preview) = self.entities.get(placement.structure) else {
            return false;
        };
        let corners = preview.bounds().corners();
        !corners.iter().any(|corner| {
            let ground = corner.ground();
            self.entities.iter_sorted().any(|other| {
                other.id != placement.structure
                    && other.collidable
                    && other.bounds().contains_ground(ground)
            })
        })
    }

    /// Move the pending preview to `point`.
    pub fn find_building_location(&mut self, player: PlayerId, point: Vec2Fixed) -> bool {
        let Some(placement) = self.player(player).and_then(Player::placement) else {
            return false;
        };
        let Some(preview) = self.entities.get_mut(placement.structure) else {
            return false;
        };
        preview.position = point;
        preview.calculate_bounds();
        self.refresh_placement(player);
        true
    }

    /// Confirm the pending preview if it can be placed.
    ///
    /// The structure becomes solid, enters its building phase and the
    /// requesting worker is sent to build it.
    pub fn start_construction(&mut self, player: PlayerId) -> bool {
        let Some(placement) = self.player(player).and_then(Player::placement) else {
            return false;
        };
        if !self.can_place_building(player) {
            tracing::debug!(?player, "Placement blocked");
            return false;
        }
        if let Some(p) = self.player_mut(player) {
            p.placement = None;
        }
        if let Some(e) = self.entities.get_mut(placement.structure) {
            e.collidable = true;
        }
        self.set_building(placement.worker, placement.structure);
        self.start_structure_construction(placement.structure);
        self.events.spawned.push(placement.structure);
        tracing::info!("{:?} started construction of {}", player, placement.structure);
        true
    }

    /// Discard the pending preview.
    pub fn cancel_building_placement(&mut self, player: PlayerId) -> bool {
        let Some(placement) = self.player_mut(player).and_then(|p| p.placement.take()) else {
            return false;
        };
        self.entities.remove(placement.structure);
        tracing::info!("{:?} cancelled placement of {}", player, placement.structure);
        true
    }

    /// Spawn a mobile entity for `player`, sending it on to `rally_point`
    /// when that differs from `spawn_point`.
    pub fn add_unit(
        &mut self,
        player: PlayerId,
        template: &str,
        spawn_point: Vec2Fixed,
        rally_point: Vec2Fixed,
        heading: Fixed,
        creator: Option<EntityId>,
    ) -> Option<EntityId> {
        if self.player(player).is_none() {
            return None;
        }
        if !self.catalog.get(template).is_some_and(|t| t.kind.is_mobile()) {
            tracing::warn!("Unit template '{}' not found", template);
            return None;
        }
        let id = self.spawn_entity(template, Some(player), spawn_point, heading)?;
        if spawn_point != rally_point {
            self.start_move(id, rally_point);
        }
        tracing::debug!(unit = id, ?creator, "Unit added");
        Some(id)
    }

    // ---- tick ----

    /// Advance the simulation by one configured tick.
    pub fn tick(&mut self) -> TickEvents {
        let delta = self.config.tick_delta();
        self.tick_with_delta(delta)
    }

    /// Advance the simulation by `delta` seconds.
    ///
    /// Returns the events raised since the previous tick, including those
    /// raised by operations issued between ticks.
    pub fn tick_with_delta(&mut self, delta: Fixed) -> TickEvents {
        // Get sorted entity IDs for deterministic processing
        let entity_ids = self.entities.sorted_ids();

        self.run_economy_system(&entity_ids, delta);
        self.run_production_system(&entity_ids, delta);
        self.run_assist_system(&entity_ids, delta);
        self.run_movement_system(&entity_ids, delta);
        self.refresh_players();

        self.tick += 1;

        #[cfg(feature = "debug-validation")]
        {
            let checked = self.check_invariants();
            if let Err(err) = &checked {
                tracing::error!(tick = self.tick, %err, "Invariant violated");
            }
            debug_assert!(checked.is_ok(), "invariant violated at tick {}", self.tick);
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        std::mem::take(&mut self.events)
    }

    fn run_economy_system(&mut self, entity_ids: &[EntityId], delta: Fixed) {
        for &id in entity_ids {
            let Some(e) = self.entities.get(id) else {
                continue;
            };
            if !e.is_operational() {
                continue;
            }
            let Some(player) = e.owner.and_then(|o| self.players.get_mut(o.index())) else {
                continue;
            };
            apply_rates(&mut player.ledger, &e.production, &e.consumption, delta);
        }
    }

    fn run_production_system(&mut self, entity_ids: &[EntityId], delta: Fixed) {
        let build_speed = self.config.build_speed();
        for &id in entity_ids {
            let Some(e) = self.entities.get_mut(id) else {
                continue;
            };
            if !e.is_operational() {
                continue;
            }
            let (owner, position, heading) = (e.owner, e.position, e.heading);
            let Some(producer) = e.producer.as_mut() else {
                continue;
            };
            let Some(owner) = owner else {
                debug_assert!(producer.is_empty(), "unowned producer {id} has orders");
                continue;
            };
            let Some(template) = producer.advance(delta, build_speed) else {
                continue;
            };
            let spawn = producer.spawn_point().unwrap_or(position);
            let rally = producer.rally_point().unwrap_or(spawn);

            if self
                .add_unit(owner, &template, spawn, rally, heading, Some(id))
                .is_none()
            {
                tracing::warn!("Dropped order for '{}' at {}", template, id);
            }
        }
    }

    fn run_assist_system(&mut self, entity_ids: &[EntityId], delta: Fixed) {
        for &id in entity_ids {
            let Some(e) = self.entities.get(id) else {
                continue;
            };
            let Some(assister) = e.assister else {
                continue;
            };
            if !assister.is_assisting() || e.movable.is_some_and(|m| !m.is_idle()) {
                continue;
            }

            let target = assister.target();
            let building = target
                .and_then(|t| self.entities.get(t))
                .is_some_and(Entity::needs_building);
            let Some(assister) = self.entities.get_mut(id).and_then(|e| e.assister.as_mut()) else {
                continue;
            };
            let (Some(target), true) = (target, building) else {
                assister.stop();
                continue;
            };

            let amount = assister.accumulate(delta);
            if amount > 0 && self.construct(target, amount) == ConstructProgress::Completed {
                if let Some(assister) = self.entities.get_mut(id).and_then(|e| e.assister.as_mut()) {
                    assister.stop();
                }
            }
        }
    }

    fn run_movement_system(&mut self, entity_ids: &[EntityId], delta: Fixed) {
        for &id in entity_ids {
            let Some(e) = self.entities.get_mut(id) else {
                continue;
            };
            let Some(movable) = e.movable.as_mut() else {
                continue;
            };
            let step = advance_movement(movable, &mut e.position, &mut e.heading, delta);
            if step != MoveStep::Unchanged {
                e.calculate_bounds();
            }
            if step == MoveStep::Arrived {
                self.events.arrived.push(id);
            }
        }
    }

    fn refresh_players(&mut self) {
        let mut rates = vec![(ResourceRates::new(), ResourceRates::new()); self.players.len()];
        for e in self.entities.iter_sorted() {
            if !e.is_operational() {
                continue;
            }
            if let Some((production, consumption)) = e.owner.and_then(|o| rates.get_mut(o.index())) {
                production.accumulate(&e.production);
                consumption.accumulate(&e.consumption);
            }
        }

        for (player, (production, consumption)) in self.players.iter_mut().zip(rates) {
            player.refresh(production, consumption);
        }

        let placing: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.is_finding_placement())
            .map(|p| p.id)
            .collect();
        for player in placing {
            self.refresh_placement(player);
        }
    }

    /// Recompute the preview's bounds and tint it by placement validity.
    fn refresh_placement(&mut self, player: PlayerId) {
        let Some(placement) = self.player(player).and_then(Player::placement) else {
            return;
        };
        if let Some(preview) = self.entities.get_mut(placement.structure) {
            preview.calculate_bounds();
        }
        let valid = self.can_place_building(player);
        if let Some(preview) = self.entities.get_mut(placement.structure) {
            preview.material = Material::Placement { valid };
        }
    }

    fn grant_capacity(&mut self, id: EntityId) {
        let Some(e) = self.entities.get(id) else {
            return;
        };
        let Some(player) = e.owner.and_then(|o| self.players.get_mut(o.index())) else {
            return;
        };
        for grant in &e.capacity {
            player.increment_capacity(grant.kind, grant.amount);
        }
    }

    /// Verify the cross-entity invariants of the world.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] describing the first violation:
    /// a ledger outside `[0, capacity]`, hit points above maximum, a
    /// dangling or inconsistent selection, a stale placement, or an
    /// unowned producer holding orders.
    pub fn check_invariants(&self) -> Result<()> {
        for player in &self.players {
            for kind in ResourceKind::ALL {
                let amount = player.ledger.amount(kind);
                let capacity = Fixed::from_num(player.ledger.capacity(kind));
                if amount < Fixed::ZERO || amount > capacity {
                    return Err(GameError::InvalidState(format!(
                        "{:?} holds {} {} over capacity {}",
                        player.id,
                        amount,
                        kind.display_name(),
                        capacity
                    )));
                }
            }
            if let Some(id) = player.selected {
                if !self.entities.get(id).is_some_and(Entity::is_selected) {
                    return Err(GameError::InvalidState(format!(
                        "{:?} selection {} is missing or unflagged",
                        player.id, id
                    )));
                }
            }
            if let Some(placement) = player.placement {
                if !self
                    .entities
                    .get(placement.structure)
                    .is_some_and(Entity::is_placing)
                {
                    return Err(GameError::InvalidState(format!(
                        "{:?} placement {} is not a preview",
                        player.id, placement.structure
                    )));
                }
            }
        }

        let flagged = self.entities.iter_sorted().filter(|e| e.is_selected()).count();
        let held = self.players.iter().filter(|p| p.selected.is_some()).count();
        if flagged > held {
            return Err(GameError::InvalidState(format!(
                "{flagged} entities flagged selected, {held} held by players"
            )));
        }

        for e in self.entities.iter_sorted() {
            if e.health.current > e.health.max {
                return Err(GameError::InvalidState(format!(
                    "entity {} has {} of {} hit points",
                    e.id, e.health.current, e.health.max
                )));
            }
            if e.owner.is_none() && e.producer.as_ref().is_some_and(|p| !p.is_empty()) {
                return Err(GameError::InvalidState(format!(
                    "unowned producer {} has orders",
                    e.id
                )));
            }
        }
        Ok(())
    }

    /// Compute a hash of the simulation state for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        self.players.len().hash(&mut hasher);
        for player in &self.players {
            for kind in ResourceKind::ALL {
                player.ledger.amount(kind).to_bits().hash(&mut hasher);
                player.ledger.capacity(kind).hash(&mut hasher);
            }
            player.selected.hash(&mut hasher);
            player.placement.hash(&mut hasher);
        }

        // Hash entities in deterministic order
        self.entities.len().hash(&mut hasher);
        for e in self.entities.iter_sorted() {
            e.id.hash(&mut hasher);
            e.owner.hash(&mut hasher);
            e.position.hash(&mut hasher);
            e.heading.to_bits().hash(&mut hasher);
            e.health.current.hash(&mut hasher);
            e.material.hash(&mut hasher);
            e.is_selected().hash(&mut hasher);

            if let Some(ref movable) = e.movable {
                movable.state().hash(&mut hasher);
                movable.destination().hash(&mut hasher);
            }
            if let Some(ref constructible) = e.constructible {
                constructible.phase().hash(&mut hasher);
            }
            if let Some(ref producer) = e.producer {
                producer.queue_values().hash(&mut hasher);
                producer.progress().to_bits().hash(&mut hasher);
                producer.rally_point().hash(&mut hasher);
            }
            if let Some(ref assister) = e.assister {
                assister.target().hash(&mut hasher);
                assister.is_assisting().hash(&mut hasher);
                assister.amount_built().to_bits().hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec2(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    #[test]
    fn test_simulation_new() {
        let sim = Simulation::new();
        assert_eq!(sim.get_tick(), 0);
        assert!(sim.entities().is_empty());
        assert!(sim.players().is_empty());
    }

    #[test]
    fn test_add_player_applies_starting_resources() {
        let mut sim = Simulation::new();
        let a = sim.add_player("a", true);
        let b = sim.add_player("b", false);
        assert_eq!((a.index(), b.index()), (0, 1));

        let ledger = &sim.player(b).unwrap().ledger;
        assert_eq!(ledger.capacity(ResourceKind::Metal), 500);
        assert_eq!(ledger.amount(ResourceKind::Metal), Fixed::ZERO);
    }

    #[test]
    fn test_spawn_entity() {
        let mut sim = Simulation::new();
        let player = sim.add_player("a", true);
        let id = sim
            .spawn_entity("Tank", Some(player), vec2(10, 20), Fixed::ZERO)
            .unwrap();

        let tank = sim.entity(id).unwrap();
        assert_eq!(tank.position, vec2(10, 20));
        assert!(tank.is_owned_by(player));
        assert!(sim.spawn_entity("Zeppelin", None, vec2(0, 0), Fixed::ZERO).is_none());
    }

    #[test]
    fn test_despawn_clears_selection() {
        let mut sim = Simulation::new();
        let player = sim.add_player("a", true);
        let id = sim.spawn_entity("Tank", Some(player), vec2(0, 0), Fixed::ZERO).unwrap();
        sim.select(player, id);

        assert!(sim.despawn(id).is_some());
        assert_eq!(sim.player(player).unwrap().selected(), None);
        assert!(sim.despawn(id).is_none());
    }

    #[test]
    fn test_shared_selection_survives_one_deselect() {
        let mut sim = Simulation::new();
        let human = sim.add_player("human", true);
        let bot = sim.add_player("bot", false);
        let tank = sim.spawn_entity("Tank", Some(bot), vec2(0, 0), Fixed::ZERO).unwrap();

        assert!(sim.select(bot, tank));
        assert!(sim.select(human, tank));
        assert!(sim.deselect(human));
        assert_eq!(sim.player(bot).unwrap().selected(), Some(tank));
        assert!(sim.entity(tank).unwrap().is_selected());
        assert!(sim.check_invariants().is_ok());

        assert!(sim.deselect(bot));
        assert!(!sim.entity(tank).unwrap().is_selected());
        assert!(sim.check_invariants().is_ok());
    }

    #[test]
    fn test_tick_increments_and_drains_events() {
        let mut sim = Simulation::new();
        let id = sim.spawn_entity("Tank", None, vec2(0, 0), Fixed::ZERO).unwrap();

        let events = sim.tick();
        assert_eq!(sim.get_tick(), 1);
        assert_eq!(events.spawned, vec![id]);
        assert_eq!(sim.tick(), TickEvents::default());
    }

    #[test]
    fn test_entity_at_prefers_latest() {
        let mut sim = Simulation::new();
        let below = sim.spawn_entity("WarFactory", None, vec2(0, 0), Fixed::ZERO).unwrap();
        let above = sim.spawn_entity("Tank", None, vec2(0, 0), Fixed::ZERO).unwrap();

        assert_eq!(sim.entity_at(vec2(0, 0)), Some(above));
        assert_eq!(sim.entity_at(vec2(4, 4)), Some(below));
        assert_eq!(sim.entity_at(vec2(40, 40)), None);
    }

    #[test]
    fn test_perform_action_needs_owner_for_workers() {
        let mut sim = Simulation::new();
        let worker = sim.spawn_entity("Worker", None, vec2(0, 0), Fixed::ZERO).unwrap();
        assert!(!sim.perform_action(worker, "PowerPlant"));
        assert_eq!(sim.entities().len(), 1);
    }

    #[test]
    fn test_add_unit_rejects_structures() {
        let mut sim = Simulation::new();
        let player = sim.add_player("a", true);
        let spot = vec2(0, 0);
        assert!(sim
            .add_unit(player, "WarFactory", spot, spot, Fixed::ZERO, None)
            .is_none());

        let tank = sim
            .add_unit(player, "Tank", spot, vec2(5, 0), Fixed::ZERO, None)
            .unwrap();
        assert!(sim.entity(tank).unwrap().movable.unwrap().is_rotating());
    }

    #[test]
    fn test_check_invariants_catches_stale_selection() {
        let mut sim = Simulation::new();
        let player = sim.add_player("a", true);
        let id = sim.spawn_entity("Tank", Some(player), vec2(0, 0), Fixed::ZERO).unwrap();
        sim.select(player, id);
        assert!(sim.check_invariants().is_ok());

        sim.entity_mut(id)
            .unwrap()
            .set_selection(false, Viewport::default());
        assert!(matches!(
            sim.check_invariants(),
            Err(GameError::InvalidState(_))
        ));
    }

    #[test]
    fn test_deterministic_hash() {
        let build = || {
            let mut sim = Simulation::new();
            let player = sim.add_player("a", true);
            let factory = sim
                .spawn_entity("WarFactory", Some(player), vec2(0, 0), Fixed::ZERO)
                .unwrap();
            sim.create_unit(factory, "Tank");
            let tank = sim.spawn_entity("Tank", Some(player), vec2(-20, 7), Fixed::ZERO).unwrap();
            sim.start_move(tank, vec2(31, -12));
            sim
        };

        let mut a = build();
        let mut b = build();
        for _ in 0..300 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.state_hash(), b.state_hash());
        assert_eq!(a.entities().len(), 3);
    }
}
