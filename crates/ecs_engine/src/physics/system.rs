//! Physics system: integration with swept unit-box collision
//!
//! Every entity with a [`Transform`] is an obstacle occupying the unit box at
//! its position. Each dynamic entity sweeps the segment it would travel this
//! step against every other obstacle, stops at the nearest hit and bounces.

use super::aabb::{Aabb, SweepHit};
use crate::config::PhysicsConfig;
use crate::ecs::components::{Physics, Transform};
use crate::ecs::{ComponentMask, Entity, System, World, PHYSICS_PRIORITY};
use crate::foundation::math::{utils, Vec3};

/// Lowest bounce factor applied at a contact
pub const MIN_BOUNCE: f32 = 0.1;

/// Highest bounce factor applied at a contact
pub const MAX_BOUNCE: f32 = 0.9;

/// Integrates motion and resolves collisions for `Transform + Physics` entities
#[derive(Debug)]
pub struct PhysicsSystem {
    config: PhysicsConfig,
    movers: Vec<Entity>,
    obstacles: Vec<Entity>,
    collisions: usize,
}

impl PhysicsSystem {
    /// Create a physics system with the given tuning
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            movers: Vec::new(),
            obstacles: Vec::new(),
            collisions: 0,
        }
    }

    /// Active tuning
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Number of contacts resolved in the last update
    pub fn collisions_last_update(&self) -> usize {
        self.collisions
    }

    /// Nearest obstacle hit along `origin .. origin + delta`
    ///
    /// Ties keep the obstacle that came first in query order.
    fn nearest_hit(&self, world: &World, mover: Entity, origin: &Vec3, delta: &Vec3) -> Option<(Entity, SweepHit)> {
        let mut nearest: Option<(Entity, SweepHit)> = None;

        for &obstacle in &self.obstacles {
            if obstacle == mover {
                continue;
            }
            let Some(transform) = world.get_component::<Transform>(obstacle) else {
                continue;
            };

            let hit = Aabb::unit_at(transform.position).sweep(
                origin,
                delta,
                self.config.parallel_axis_policy,
                self.config.slab_epsilon,
            );
            if let Some(hit) = hit {
                if nearest.map_or(true, |(_, best)| hit.t_entry < best.t_entry) {
                    nearest = Some((obstacle, hit));
                }
            }
        }

        nearest
    }

    /// Advance one entity by `delta_time`, returning whether it collided
    fn step(&self, world: &World, entity: Entity, transform: &mut Transform, physics: &mut Physics, delta_time: f32) -> bool {
        let origin = transform.position;
        let delta = physics.velocity * delta_time;

        match self.nearest_hit(world, entity, &origin, &delta) {
            Some((other, hit)) => {
                let n = hit.normal;
                transform.position = origin + delta * hit.t_entry.max(0.0) + n * self.config.contact_epsilon;

                let bounce = utils::clamp(self.config.bounce_factor, MIN_BOUNCE, MAX_BOUNCE);
                let v = physics.velocity;
                physics.velocity = (v - n * (2.0 * v.dot(&n))) * bounce;

                if physics.velocity.norm() < self.config.rest_speed {
                    physics.velocity = Vec3::zeros();
                    physics.is_static = true;
                    log::debug!("{} came to rest on {}", entity, other);
                } else {
                    log::trace!("{} bounced off {} at t={:.3}", entity, other, hit.t_entry);
                }
                true
            }
            None => {
                transform.position = origin + delta;
                physics.velocity += physics.acceleration * delta_time;
                // Accumulates: a free-falling body accelerates ever harder
                physics.acceleration.y -= self.config.gravity * delta_time;
                false
            }
        }
    }
}

impl System for PhysicsSystem {
    fn name(&self) -> &'static str {
        "PhysicsSystem"
    }

    fn priority(&self) -> i32 {
        PHYSICS_PRIORITY
    }

    fn update(&mut self, world: &mut World, delta_time: f32) {
        self.movers = world.entities_with(ComponentMask::TRANSFORM | ComponentMask::PHYSICS);
        self.obstacles = world.entities_with(ComponentMask::TRANSFORM);
        self.collisions = 0;

        let movers = std::mem::take(&mut self.movers);
        for &entity in &movers {
            let components = (
                world.get_component::<Transform>(entity).copied(),
                world.get_component::<Physics>(entity).copied(),
            );
            let (Some(mut transform), Some(mut physics)) = components else {
                debug_assert!(false, "{} matched the physics query without its components", entity);
                continue;
            };
            if physics.is_static {
                continue;
            }

            if self.step(world, entity, &mut transform, &mut physics, delta_time) {
                self.collisions += 1;
            }

            if let Some(slot) = world.get_component_mut::<Transform>(entity) {
                *slot = transform;
            }
            if let Some(slot) = world.get_component_mut::<Physics>(entity) {
                *slot = physics;
            }
        }
        self.movers = movers;

        log::debug!(
            "Physics: {} movers, {} obstacles, {} contacts",
            self.movers.len(),
            self.obstacles.len(),
            self.collisions
        );
    }
}
