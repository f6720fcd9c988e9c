//! A small headless scene: a sun with orbiting planets, a physics system
//! moving anything with a velocity and a render system reporting world
//! positions.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;
use phage_core::Transform2;
use phage_ecs::script::{NativeScript, UPDATE};
use phage_ecs::{
    Component, EcsError, EntityBuilder, EntityFilter, EntityId, EntitySystem, FieldValue, Parent,
    Scene, SimpleEntityFilter, TagList,
};
use tracing::{debug, info};

/// Linear and angular velocity of an entity.
#[derive(Debug, Clone, Default)]
pub struct CVelocity {
    pub linear: Vec2,
    pub angular: f32,
}

impl CVelocity {
    pub const NAME: &'static str = "velocity";
    pub const LINEAR: &'static str = "linear_velocity";
    pub const ANGULAR: &'static str = "angular_velocity";

    /// Create a velocity component.
    pub fn new(linear: Vec2, angular: f32) -> Self {
        Self { linear, angular }
    }
}

impl Component for CVelocity {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn identifiers(&self) -> Vec<String> {
        vec![Self::LINEAR.to_string(), Self::ANGULAR.to_string()]
    }

    fn get(&self, identifier: &str) -> phage_ecs::Result<FieldValue> {
        match identifier {
            Self::LINEAR => Ok(self.linear.into()),
            Self::ANGULAR => Ok(self.angular.into()),
            _ => Err(EcsError::unknown_field(Self::NAME, identifier)),
        }
    }

    fn set(&mut self, identifier: &str, value: FieldValue) -> phage_ecs::Result<()> {
        match identifier {
            Self::LINEAR => self.linear = value.expect_vec2(identifier)?,
            Self::ANGULAR => self.angular = value.expect_float(identifier)?,
            _ => return Err(EcsError::unknown_field(Self::NAME, identifier)),
        }
        Ok(())
    }
}

/// Integrates velocities into local transforms.
pub struct PhysicsSystem {
    filter: SimpleEntityFilter,
}

impl PhysicsSystem {
    /// Create a physics system for every entity with a velocity.
    pub fn new() -> Self {
        Self {
            filter: SimpleEntityFilter::new([CVelocity::NAME], TagList::new(), false),
        }
    }
}

impl EntitySystem for PhysicsSystem {
    fn name(&self) -> &str {
        "physics"
    }

    fn update_filter(&self) -> &dyn EntityFilter {
        &self.filter
    }

    fn event_filter(&self) -> &dyn EntityFilter {
        &self.filter
    }

    fn entity_added(&mut self, entity: EntityId, _parent: Parent, scene: &mut Scene) -> phage_ecs::Result<()> {
        debug!(entity = %entity, name = scene.entity(entity)?.name(), "body added");
        Ok(())
    }

    fn update_entity(&mut self, entity: EntityId, scene: &mut Scene, dt: f32) -> phage_ecs::Result<()> {
        let entity = scene.entity_mut(entity)?;
        let velocity = entity.components().component::<CVelocity>(CVelocity::NAME)?.clone();
        let transform = entity.transform();
        entity.set_transform(
            transform
                .translated(velocity.linear * dt)
                .rotated(velocity.angular * dt),
        );
        Ok(())
    }
}

/// Reports the world position of every visible entity.
pub struct RenderSystem {
    filter: SimpleEntityFilter,
    frames: Rc<Cell<u64>>,
}

impl RenderSystem {
    /// Create a render system counting frames into `frames`.
    pub fn new(frames: Rc<Cell<u64>>) -> phage_ecs::Result<Self> {
        Ok(Self {
            filter: SimpleEntityFilter::with_tags(Vec::<String>::new(), &["visible"], false)?,
            frames,
        })
    }
}

impl EntitySystem for RenderSystem {
    fn name(&self) -> &str {
        "render"
    }

    fn update_filter(&self) -> &dyn EntityFilter {
        &self.filter
    }

    fn event_filter(&self) -> &dyn EntityFilter {
        &self.filter
    }

    fn scene_changed(&mut self, old: Option<&str>, scene: &mut Scene) -> phage_ecs::Result<()> {
        let visible = scene.entities_by_filter(&self.filter).len();
        info!(from = ?old, to = scene.name(), visible, "render target changed");
        Ok(())
    }

    fn update_entity(&mut self, entity: EntityId, scene: &mut Scene, _dt: f32) -> phage_ecs::Result<()> {
        let world = scene.world_transform(entity)?;
        tracing::trace!(
            name = scene.entity(entity)?.name(),
            x = world.translation.x,
            y = world.translation.y,
            "draw"
        );
        Ok(())
    }

    fn post_update(&mut self, _scene: &mut Scene) -> phage_ecs::Result<()> {
        self.frames.set(self.frames.get() + 1);
        Ok(())
    }
}

/// A planet orbiting its parent at `distance`, turning at `speed` rad/s.
fn planet(distance: f32, speed: f32) -> phage_ecs::Result<EntityBuilder> {
    EntityBuilder::new()
        .with_transform(Transform2::from_translation(Vec2::new(distance, 0.0)))
        .with_tags(TagList::from_tags(["visible"])?)
        .with_prototype(CVelocity::new(Vec2::ZERO, speed))
}

/// Fill `scene` with a sun, two planets and a moon.
pub fn populate(scene: &mut Scene) -> phage_ecs::Result<()> {
    let sun = scene.create_entity_from(
        "sun",
        Parent::Scene,
        &EntityBuilder::new()
            .with_tags(TagList::from_tags(["visible"])?)
            .with_prototype(CVelocity::new(Vec2::ZERO, 0.1))?,
    )?;

    let earth = planet(10.0, 1.0)?.with_child("moon", planet(2.0, 4.0)?)?;
    scene.create_entity_from("earth", Parent::Entity(sun), &earth)?;
    scene.create_entity_from("mars", Parent::Entity(sun), &planet(15.0, 0.5)?)?;

    let comet = scene.create_named_entity("comet", Parent::Scene)?;
    scene.add_component(comet, Box::new(CVelocity::new(Vec2::new(-3.0, 1.0), 0.0)))?;
    scene.set_transform(comet, Transform2::from_translation(Vec2::new(40.0, -10.0)))?;
    scene.add_script(
        comet,
        NativeScript::new("comet_tail")
            .with_fn(UPDATE, |call| {
                let id = call.entity();
                let scene = call.scene()?;
                let ticks = scene
                    .get_field(id, "ticks")
                    .ok()
                    .and_then(|v| v.as_int())
                    .unwrap_or(0);
                scene.set_field(id, "ticks", (ticks + 1).into())?;
                Ok(None)
            })
            .into_handle(),
    )?;
    Ok(())
}
