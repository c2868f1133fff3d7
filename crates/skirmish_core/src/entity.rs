//! Entity records and storage.
//!
//! Every world entity shares one record. What it can do is decided by the
//! optional capability modules it carries: a [`Movable`] drives, an
//! [`Assister`] builds, a [`Constructible`] is built and a [`Producer`]
//! trains. Templates decide which modules an instance gets.

use std::collections::HashMap;

use crate::components::{EntityId, Health, Material, Viewport};
use crate::construction::{Assister, Constructible};
use crate::economy::{ResourceRate, ResourceRates};
use crate::math::{Bounds, Fixed, Vec2Fixed, Vec3Fixed};
use crate::movement::Movable;
use crate::player::PlayerId;
use crate::production::Producer;
use crate::templates::{EntityTemplate, TemplateKind};

/// An ownable, selectable world entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Unique identifier for this entity.
    pub id: EntityId,
    /// Template this entity was made from.
    pub template: String,
    /// Name shown to players.
    pub display_name: String,
    /// Capability set of the template.
    pub kind: TemplateKind,
    /// Hit points.
    pub health: Health,
    /// Owning player.
    pub owner: Option<PlayerId>,
    /// Ground position of the centre.
    pub position: Vec2Fixed,
    /// Facing in radians.
    pub heading: Fixed,
    /// Half sizes in the entity's own frame.
    pub extent: Vec3Fixed,
    /// How the entity is drawn.
    pub material: Material,
    /// Whether hit tests and placement checks see this entity.
    pub collidable: bool,
    /// Credit when sold.
    pub sell_value: i32,
    /// Resources produced per second while operational.
    pub production: ResourceRates,
    /// Resources consumed per second while operational.
    pub consumption: ResourceRates,
    /// Capacity granted to the owner once operational.
    pub capacity: Vec<ResourceRate>,
    /// Movement capability.
    pub movable: Option<Movable>,
    /// Construction capability.
    pub constructible: Option<Constructible>,
    /// Production capability.
    pub producer: Option<Producer>,
    /// Construction-assist capability.
    pub assister: Option<Assister>,
    actions: Vec<String>,
    bounds: Bounds,
    selected: bool,
    viewport: Viewport,
}

impl Entity {
    /// Instantiate a built, unowned entity from a template.
    #[must_use]
    pub fn from_template(template: &EntityTemplate, position: Vec2Fixed, heading: Fixed) -> Self {
        let (movable, assister, constructible, producer) = match template.kind {
            TemplateKind::Unit => (
                Some(Movable::new(template.speed, template.rotate_speed)),
                None,
                None,
                None,
            ),
            TemplateKind::Worker => (
                Some(Movable::new(template.speed, template.rotate_speed)),
                Some(Assister::new(template.build_speed)),
                None,
                None,
            ),
            TemplateKind::Structure => (
                None,
                None,
                Some(Constructible::complete()),
                (!template.actions.is_empty()).then(|| Producer::new(template.build_threshold)),
            ),
        };

        let extent = template.extent.to_vec3();
        Self {
            id: 0,
            template: template.name.clone(),
            display_name: template.display_name.clone(),
            kind: template.kind,
            health: Health::new(template.max_hit_points),
            owner: None,
            position,
            heading,
            extent,
            material: Material::Standard,
            collidable: true,
            sell_value: template.sell_value,
            production: ResourceRates::from_rates(&template.production),
            consumption: ResourceRates::from_rates(&template.consumption),
            capacity: template.capacity.clone(),
            movable,
            constructible,
            producer,
            assister,
            actions: template.actions.clone(),
            bounds: Bounds::enclosing(position, heading, extent),
            selected: false,
            viewport: Viewport::default(),
        }
    }

    /// Builder method to set the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Check ownership by identity.
    #[must_use]
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }

    /// Recompute the bounding volume from position, heading and extent.
    pub fn calculate_bounds(&mut self) {
        self.bounds = Bounds::enclosing(self.position, self.heading, self.extent);
    }

    /// Bounding volume as of the last recompute.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Set the selection flag, recording `viewport` when becoming selected.
    pub fn set_selection(&mut self, selected: bool, viewport: Viewport) {
        self.selected = selected;
        if selected {
            self.viewport = viewport;
        }
    }

    /// Check if selected.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    /// Viewport recorded at the last selection.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Record the playing area without changing selection.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Actions currently offered. Empty while not operational.
    #[must_use]
    pub fn available_actions(&self) -> &[String] {
        if self.is_operational() {
            &self.actions
        } else {
            &[]
        }
    }

    /// Check if an action id is currently offered.
    #[must_use]
    pub fn offers_action(&self, action: &str) -> bool {
        self.available_actions().iter().any(|a| a == action)
    }

    /// Check if built. Entities without a construction module always are.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        self.constructible.map_or(true, |c| c.is_complete())
    }

    /// Check if placed and waiting for workers.
    #[must_use]
    pub fn needs_building(&self) -> bool {
        self.constructible.is_some_and(|c| c.needs_building())
    }

    /// Check if still a placement preview.
    #[must_use]
    pub fn is_placing(&self) -> bool {
        self.constructible.is_some_and(|c| c.is_placing())
    }

    /// Unit vector along the facing.
    #[must_use]
    pub fn forward(&self) -> Vec2Fixed {
        Vec2Fixed::from_heading(self.heading)
    }
}

/// Storage for all entities in the simulation.
///
/// Uses a `HashMap` for O(1) entity lookup by ID, with deterministic
/// iteration via sorted keys when processing systems.
#[derive(Debug, Clone)]
pub struct EntityStorage {
    /// Map of entity ID to entity data.
    entities: HashMap<EntityId, Entity>,
    /// Next entity ID to assign.
    next_id: EntityId,
}

impl EntityStorage {
    /// Create empty entity storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new entity and return its ID.
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        entity.id = id;
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity by ID.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Get the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get sorted entity IDs for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over entities in ascending ID order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.sorted_ids()
            .into_iter()
            .filter_map(move |id| self.entities.get(&id))
    }
}

impl Default for EntityStorage {
    fn default() -> Self {
        Self::new()
    }
}
