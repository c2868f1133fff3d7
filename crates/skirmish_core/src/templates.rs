//! Named entity templates.
//!
//! Structures spawn units and workers place structures by template name.
//! Templates are plain data, loadable from RON, and validated so every
//! action id a template advertises resolves to a spawnable template.
//!
//! # Example RON
//!
//! ```ron
//! [
//!     EntityTemplate(
//!         name: "PowerPlant",
//!         display_name: "Power Plant",
//!         kind: Structure,
//!         max_hit_points: 200,
//!         sell_value: 100,
//!         extent: (x: 3, y: 3, z: 2),
//!         production: [(kind: Energy, amount: 5)],
//!         capacity: [(kind: Energy, amount: 500)],
//!     ),
//! ]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::economy::{ResourceKind, ResourceRate};
use crate::error::{GameError, Result};
use crate::math::Vec3Fixed;

/// Which capability modules an instantiated template carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateKind {
    /// Mobile entity.
    Unit,
    /// Mobile entity that places and assists structures.
    Worker,
    /// Constructible entity, optionally producing units.
    Structure,
}

impl TemplateKind {
    /// Check if instances can move.
    #[must_use]
    pub const fn is_mobile(&self) -> bool {
        matches!(self, Self::Unit | Self::Worker)
    }

    /// Check if instances are structures.
    #[must_use]
    pub const fn is_structure(&self) -> bool {
        matches!(self, Self::Structure)
    }
}

/// Half sizes of an entity's visual extent, in whole world units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    /// Half width along the facing.
    pub x: i32,
    /// Half depth across the facing.
    pub y: i32,
    /// Half height.
    pub z: i32,
}

impl Extent {
    /// Create an extent.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// As a fixed-point vector.
    #[must_use]
    pub fn to_vec3(self) -> Vec3Fixed {
        Vec3Fixed::from_ints(self.x, self.y, self.z)
    }
}

/// Spawnable entity definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTemplate {
    /// Stable identifier used for lookup and spawning.
    pub name: String,
    /// Name shown to players.
    pub display_name: String,
    /// Capability set.
    pub kind: TemplateKind,
    /// Maximum hit points.
    pub max_hit_points: u32,
    /// Credit when sold.
    #[serde(default)]
    pub sell_value: i32,
    /// Visual extent used for bounds.
    pub extent: Extent,
    /// Travel speed in units per second (mobile only).
    #[serde(default)]
    pub speed: i32,
    /// Turn speed in degrees per second (mobile only).
    #[serde(default)]
    pub rotate_speed: i32,
    /// Hit points contributed per second while assisting (workers only).
    #[serde(default)]
    pub build_speed: i32,
    /// Production progress needed per queued order (structures only).
    #[serde(default)]
    pub build_threshold: i32,
    /// Action identifiers, in menu order.
    #[serde(default)]
    pub actions: Vec<String>,
    /// Resources produced per second while operational.
    #[serde(default)]
    pub production: Vec<ResourceRate>,
    /// Resources consumed per second while operational.
    #[serde(default)]
    pub consumption: Vec<ResourceRate>,
    /// Capacity granted to the owner once operational.
    #[serde(default)]
    pub capacity: Vec<ResourceRate>,
}

impl EntityTemplate {
    /// Create a template with no speeds, actions or rates.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: TemplateKind,
        max_hit_points: u32,
        extent: Extent,
    ) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            kind,
            max_hit_points,
            sell_value: 0,
            extent,
            speed: 0,
            rotate_speed: 0,
            build_speed: 0,
            build_threshold: 0,
            actions: Vec::new(),
            production: Vec::new(),
            consumption: Vec::new(),
            capacity: Vec::new(),
        }
    }

    /// Builder method to set the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Builder method to set travel and turn speeds.
    #[must_use]
    pub fn with_speed(mut self, speed: i32, rotate_speed: i32) -> Self {
        self.speed = speed;
        self.rotate_speed = rotate_speed;
        self
    }

    /// Builder method to set the assist rate.
    #[must_use]
    pub fn with_build_speed(mut self, build_speed: i32) -> Self {
        self.build_speed = build_speed;
        self
    }

    /// Builder method to set the production threshold.
    #[must_use]
    pub fn with_build_threshold(mut self, build_threshold: i32) -> Self {
        self.build_threshold = build_threshold;
        self
    }

    /// Builder method to set the sell value.
    #[must_use]
    pub fn with_sell_value(mut self, sell_value: i32) -> Self {
        self.sell_value = sell_value;
        self
    }

    /// Builder method to set the action list.
    #[must_use]
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to add a produced resource.
    #[must_use]
    pub fn with_production(mut self, kind: ResourceKind, amount: i32) -> Self {
        self.production.push(ResourceRate { kind, amount });
        self
    }

    /// Builder method to add a consumed resource.
    #[must_use]
    pub fn with_consumption(mut self, kind: ResourceKind, amount: i32) -> Self {
        self.consumption.push(ResourceRate { kind, amount });
        self
    }

    /// Builder method to add granted capacity.
    #[must_use]
    pub fn with_capacity(mut self, kind: ResourceKind, amount: i32) -> Self {
        self.capacity.push(ResourceRate { kind, amount });
        self
    }
}

/// Lookup table of templates by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, EntityTemplate>,
}

impl TemplateCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in templates: `Worker`, `Tank`, `WarFactory`, `PowerPlant`.
    #[must_use]
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        catalog.register(
            EntityTemplate::new("Worker", TemplateKind::Worker, 50, Extent::new(1, 1, 1))
                .with_speed(8, 360)
                .with_build_speed(20)
                .with_actions(["WarFactory", "PowerPlant"]),
        );
        catalog.register(
            EntityTemplate::new("Tank", TemplateKind::Unit, 150, Extent::new(2, 1, 1))
                .with_speed(10, 180),
        );
        catalog.register(
            EntityTemplate::new("WarFactory", TemplateKind::Structure, 400, Extent::new(5, 5, 3))
                .with_display_name("War Factory")
                .with_build_threshold(10)
                .with_sell_value(150)
                .with_actions(["Tank", "Worker"])
                .with_consumption(ResourceKind::Energy, 2),
        );
        catalog.register(
            EntityTemplate::new("PowerPlant", TemplateKind::Structure, 200, Extent::new(3, 3, 2))
                .with_display_name("Power Plant")
                .with_sell_value(100)
                .with_production(ResourceKind::Energy, 5)
                .with_capacity(ResourceKind::Energy, 500),
        );
        catalog
    }

    /// Register a template, replacing any with the same name.
    pub fn register(&mut self, template: EntityTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Get a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EntityTemplate> {
        self.templates.get(name)
    }

    /// Check if a template exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterate templates in name order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityTemplate> {
        self.templates.values()
    }

    /// Check internal consistency.
    ///
    /// Worker actions must name structures, structure actions must name
    /// mobile templates, mobile templates must be able to move and
    /// producing structures need a positive threshold.
    pub fn validate(&self) -> Result<()> {
        for template in self.templates.values() {
            if template.max_hit_points == 0 {
                return Err(GameError::InvalidState(format!(
                    "template '{}' has no hit points",
                    template.name
                )));
            }
            if template.kind.is_mobile() && (template.speed <= 0 || template.rotate_speed <= 0) {
                return Err(GameError::InvalidState(format!(
                    "mobile template '{}' needs positive speed and rotate_speed",
                    template.name
                )));
            }
            if template.kind.is_structure()
                && !template.actions.is_empty()
                && template.build_threshold <= 0
            {
                return Err(GameError::InvalidState(format!(
                    "producing structure '{}' needs a positive build_threshold",
                    template.name
                )));
            }

            for action in &template.actions {
                let target = self
                    .get(action)
                    .ok_or_else(|| GameError::UnknownTemplate(action.clone()))?;
                let fits = match template.kind {
                    TemplateKind::Worker => target.kind.is_structure(),
                    TemplateKind::Structure => target.kind.is_mobile(),
                    TemplateKind::Unit => false,
                };
                if !fits {
                    return Err(GameError::InvalidState(format!(
                        "template '{}' cannot use action '{}'",
                        template.name, action
                    )));
                }
            }
        }
        Ok(())
    }

    /// Parse and validate a catalog from a RON list of templates.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        Self::from_source("<inline>", source)
    }

    /// Load and validate a catalog from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GameError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_source(&path.display().to_string(), &contents)
    }

    fn from_source(origin: &str, source: &str) -> Result<Self> {
        let templates: Vec<EntityTemplate> =
            ron::from_str(source).map_err(|e| GameError::parse(origin, &e))?;
        let mut catalog = Self::new();
        for template in templates {
            catalog.register(template);
        }
        catalog.validate()?;
        Ok(catalog)
    }
}
