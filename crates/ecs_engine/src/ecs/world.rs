//! ECS World implementation
//!
//! The [`World`] is the registry facade: it owns the entity directory and
//! every component store and keeps the two consistent. Each call that adds
//! or removes a component updates the store and the presence bit together.

use super::error::EcsError;
use super::storage::ComponentStores;
use super::{Component, ComponentMask, Entity, EntityDirectory};

/// ECS World containing all entities and components
#[derive(Debug, Default)]
pub struct World {
    entities: EntityDirectory,
    stores: ComponentStores,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new entity
    pub fn create_entity(&mut self) -> Entity {
        self.entities.create()
    }

    /// Destroy an entity and every component it owns
    ///
    /// Destroying a dead or stale handle is a logged no-op and returns `false`.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            log::warn!("Ignoring destroy of {}: entity is not alive", entity);
            return false;
        }

        self.stores.remove_all(entity);
        self.entities.destroy(entity)
    }

    /// Whether `entity` is live with a matching generation
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities
    pub fn live_count(&self) -> usize {
        self.entities.live_count()
    }

    /// Add a component to an entity
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<(), EcsError> {
        if !self.entities.is_alive(entity) {
            let error = EcsError::EntityNotAlive(entity);
            log::warn!("add_component: {}", error);
            return Err(error);
        }

        if T::store_mut(&mut self.stores).insert(entity, component).is_err() {
            let error = EcsError::DuplicateComponent { entity, kind: T::KIND };
            log::warn!("add_component: {}", error);
            return Err(error);
        }

        self.entities.insert_mask(entity, T::KIND.mask());
        Ok(())
    }

    /// Remove a component from an entity, returning it
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<T, EcsError> {
        match T::store_mut(&mut self.stores).remove(entity) {
            Some(component) => {
                self.entities.remove_mask(entity, T::KIND.mask());
                Ok(component)
            }
            None => {
                let error = if self.entities.is_alive(entity) {
                    EcsError::MissingComponent { entity, kind: T::KIND }
                } else {
                    EcsError::EntityNotAlive(entity)
                };
                log::warn!("remove_component: {}", error);
                Err(error)
            }
        }
    }

    /// Get a component from an entity
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        T::store(&self.stores).get(entity)
    }

    /// Get a mutable component from an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        T::store_mut(&mut self.stores).get_mut(entity)
    }

    /// Whether `entity` owns a `T`
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.entities.mask(entity).contains(T::KIND.mask())
    }

    /// Component presence mask of `entity` (empty for stale handles)
    pub fn component_mask(&self, entity: Entity) -> ComponentMask {
        self.entities.mask(entity)
    }

    /// Every live entity whose mask is a superset of `mask`
    ///
    /// Linear in the live population. Order is ascending slot index, so it
    /// is stable for as long as no entity is created or destroyed.
    pub fn entities_with(&self, mask: ComponentMask) -> Vec<Entity> {
        self.entities.matching(mask)
    }

    /// Iterate every `(entity, &T)` pair in storage order
    pub fn query<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        T::store(&self.stores).iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Ai, LightSource, Physics, Transform};
    use crate::ecs::ComponentKind;
    use crate::foundation::math::Vec3;

    /// Store membership for every kind, read straight from the stores
    fn stored_mask(world: &World, entity: Entity) -> ComponentMask {
        let mut mask = ComponentMask::empty();
        if world.stores.renderables.contains(entity) {
            mask |= ComponentMask::RENDERABLE;
        }
        if world.stores.transforms.contains(entity) {
            mask |= ComponentMask::TRANSFORM;
        }
        if world.stores.physics.contains(entity) {
            mask |= ComponentMask::PHYSICS;
        }
        if world.stores.lights.contains(entity) {
            mask |= ComponentMask::LIGHT_SOURCE;
        }
        if world.stores.ais.contains(entity) {
            mask |= ComponentMask::AI;
        }
        mask
    }

    #[test]
    fn test_add_get_remove_component() {
        let mut world = World::new();
        let entity = world.create_entity();

        world.add_component(entity, Transform::from_position(Vec3::new(1.0, 2.0, 3.0))).unwrap();
        assert!(world.has_component::<Transform>(entity));
        assert_eq!(world.component_mask(entity), ComponentMask::TRANSFORM);
        assert_eq!(world.get_component::<Transform>(entity).unwrap().position.y, 2.0);

        world.get_component_mut::<Transform>(entity).unwrap().position.y = 5.0;
        let removed = world.remove_component::<Transform>(entity).unwrap();
        assert_eq!(removed.position.y, 5.0);
        assert!(!world.has_component::<Transform>(entity));
        assert!(world.get_component::<Transform>(entity).is_none());
    }

    #[test]
    fn test_duplicate_add_is_rejected_without_change() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.add_component(entity, Physics::with_velocity(Vec3::new(1.0, 0.0, 0.0))).unwrap();

        let result = world.add_component(entity, Physics::fixed());
        assert_eq!(
            result,
            Err(EcsError::DuplicateComponent { entity, kind: ComponentKind::Physics })
        );
        assert!(!world.get_component::<Physics>(entity).unwrap().is_static);
    }

    #[test]
    fn test_remove_missing_component_is_reported() {
        let mut world = World::new();
        let entity = world.create_entity();

        assert_eq!(
            world.remove_component::<LightSource>(entity),
            Err(EcsError::MissingComponent { entity, kind: ComponentKind::LightSource })
        );
        assert_eq!(world.component_mask(entity), ComponentMask::empty());
    }

    #[test]
    fn test_dead_entity_cannot_gain_components() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.destroy_entity(entity);

        assert_eq!(
            world.add_component(entity, Transform::identity()),
            Err(EcsError::EntityNotAlive(entity))
        );
        assert_eq!(
            world.remove_component::<Transform>(entity),
            Err(EcsError::EntityNotAlive(entity))
        );
    }

    #[test]
    fn test_destroy_cascades_and_stale_handle_sees_nothing() {
        let mut world = World::new();
        let old = world.create_entity();
        world.add_component(old, Transform::identity()).unwrap();
        world.add_component(old, Ai::default()).unwrap();

        assert!(world.destroy_entity(old));
        assert!(!world.destroy_entity(old));
        assert!(world.get_component::<Transform>(old).is_none());
        assert_eq!(stored_mask(&world, old), ComponentMask::empty());

        let new = world.create_entity();
        assert_eq!(new.index(), old.index());
        assert_eq!(world.component_mask(new), ComponentMask::empty());
        assert!(world.get_component::<Ai>(new).is_none());
        assert!(world.query::<Transform>().next().is_none());
    }

    #[test]
    fn test_entities_with_mask_superset() {
        let mut world = World::new();
        let both = world.create_entity();
        let transform_only = world.create_entity();
        let physics_only = world.create_entity();
        let bare = world.create_entity();

        world.add_component(both, Transform::identity()).unwrap();
        world.add_component(both, Physics::default()).unwrap();
        world.add_component(transform_only, Transform::identity()).unwrap();
        world.add_component(physics_only, Physics::default()).unwrap();

        let required = ComponentMask::TRANSFORM | ComponentMask::PHYSICS;
        assert_eq!(world.entities_with(required), vec![both]);
        assert_eq!(world.entities_with(ComponentMask::TRANSFORM), vec![both, transform_only]);
        assert_eq!(
            world.entities_with(ComponentMask::empty()),
            vec![both, transform_only, physics_only, bare]
        );
        assert!(world.entities_with(ComponentMask::from_bits_retain(1 << 20)).is_empty());

        world.destroy_entity(both);
        assert!(world.entities_with(required).is_empty());
    }

    #[test]
    fn test_mask_matches_stores_under_random_operations() {
        let mut world = World::new();
        let mut handles: Vec<Entity> = Vec::new();
        // Small LCG keeps the sequence deterministic
        let mut seed: u32 = 0x2545_F491;
        let mut next = move || {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            seed >> 8
        };

        for _ in 0..2_000 {
            let roll = next() % 8;
            if roll == 0 || handles.is_empty() {
                handles.push(world.create_entity());
                continue;
            }
            let entity = handles[(next() as usize) % handles.len()];
            // Results are ignored on purpose: rejected operations must also keep the invariant
            match roll {
                1 => drop(world.add_component(entity, Transform::identity())),
                2 => drop(world.add_component(entity, Physics::default())),
                3 => drop(world.add_component(entity, LightSource::default())),
                4 => drop(world.remove_component::<Transform>(entity)),
                5 => drop(world.remove_component::<Physics>(entity)),
                6 => drop(world.remove_component::<LightSource>(entity)),
                _ => {
                    world.destroy_entity(entity);
                }
            }

            for &handle in &handles {
                assert_eq!(world.component_mask(handle), stored_mask(&world, handle));
            }
        }
    }
}
