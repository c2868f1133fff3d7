//! Read-only snapshots for the presentation layer.

use crate::components::{EntityId, Material, Viewport};
use crate::economy::{ResourceKind, ResourceReadout};
use crate::math::{Bounds, Fixed, Vec2Fixed};
use crate::movement::MoveState;
use crate::player::PlayerId;
use crate::simulation::Simulation;

/// What a HUD needs to know about a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerView {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub username: String,
    /// Whether input comes from a person.
    pub is_human: bool,
    /// Current/limit pairs per kind.
    pub resources: Vec<ResourceReadout>,
    /// Production per second per kind.
    pub production: Vec<(ResourceKind, Fixed)>,
    /// Consumption per second per kind.
    pub consumption: Vec<(ResourceKind, Fixed)>,
    /// Selected entity.
    pub selected: Option<EntityId>,
    /// Whether a structure preview follows the cursor.
    pub finding_placement: bool,
}

/// What a renderer needs to know about an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityView {
    /// Entity identifier.
    pub id: EntityId,
    /// Template name.
    pub template: String,
    /// Name shown to players.
    pub display_name: String,
    /// Owning player.
    pub owner: Option<PlayerId>,
    /// Current hit points.
    pub hit_points: u32,
    /// Maximum hit points.
    pub max_hit_points: u32,
    /// Whether selected.
    pub selected: bool,
    /// Box for the selection outline.
    pub bounds: Bounds,
    /// Playing area recorded at selection.
    pub viewport: Viewport,
    /// Actions for the command menu.
    pub actions: Vec<String>,
    /// Whether waiting for workers.
    pub needs_building: bool,
    /// Material to draw with.
    pub material: Material,
    /// Move phase of mobile entities.
    pub move_state: Option<MoveState>,
    /// Producer details.
    pub structure: Option<StructureView>,
}

/// Production details of a producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureView {
    /// Queued orders, head first.
    pub queue: Vec<String>,
    /// Completion of the head order in `[0, 1]`.
    pub build_percentage: Fixed,
    /// Whether a spawn point exists.
    pub has_spawn_point: bool,
    /// Where produced entities appear.
    pub spawn_point: Option<Vec2Fixed>,
    /// Where produced entities are sent.
    pub rally_point: Option<Vec2Fixed>,
    /// Where to draw the rally flag; only while a human owner has the
    /// structure selected.
    pub rally_flag: Option<Vec2Fixed>,
}

impl Simulation {
    /// Snapshot a player for the HUD.
    #[must_use]
    pub fn player_view(&self, id: PlayerId) -> Option<PlayerView> {
        let player = self.player(id)?;
        Some(PlayerView {
            id,
            username: player.username.clone(),
            is_human: player.is_human,
            resources: player.readouts().to_vec(),
            production: player.production_rates().iter().collect(),
            consumption: player.consumption_rates().iter().collect(),
            selected: player.selected(),
            finding_placement: player.is_finding_placement(),
        })
    }

    /// Snapshot an entity for rendering.
    #[must_use]
    pub fn entity_view(&self, id: EntityId) -> Option<EntityView> {
        let entity = self.entity(id)?;
        let owner_human = entity
            .owner
            .and_then(|owner| self.player(owner))
            .is_some_and(|p| p.is_human);

        let structure = entity.producer.as_ref().map(|producer| StructureView {
            queue: producer.queue_values(),
            build_percentage: producer.build_percentage(),
            has_spawn_point: producer.has_spawn_point(),
            spawn_point: producer.spawn_point(),
            rally_point: producer.rally_point(),
            rally_flag: producer
                .rally_point()
                .filter(|_| owner_human && entity.is_selected() && producer.has_spawn_point()),
        });

        Some(EntityView {
            id,
            template: entity.template.clone(),
            display_name: entity.display_name.clone(),
            owner: entity.owner,
            hit_points: entity.health.current,
            max_hit_points: entity.health.max,
            selected: entity.is_selected(),
            bounds: entity.bounds(),
            viewport: entity.viewport(),
            actions: entity.available_actions().to_vec(),
            needs_building: entity.needs_building(),
            material: entity.material,
            move_state: entity.movable.map(|m| m.state()),
            structure,
        })
    }

    /// Snapshot the player's selected entity.
    #[must_use]
    pub fn selected_view(&self, player: PlayerId) -> Option<EntityView> {
        self.player(player)
            .and_then(|p| p.selected())
            .and_then(|id| self.entity_view(id))
    }
}
