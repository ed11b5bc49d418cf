//! Per-frame instance batching
//!
//! Renderable entities are grouped by mesh in first-appearance order. Each
//! group becomes one or more [`RenderBatch`]es: a batch holds the per-instance
//! records for one instanced draw plus the de-duplicated list of textures
//! those instances index into. A group spills into a further batch for the
//! same mesh when it would exceed the texture-slot or instance limits.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use super::resources::{MeshKey, TextureKey};
use crate::ecs::components::{Renderable, Transform};
use crate::ecs::{ComponentMask, Entity, World};
use crate::foundation::math::Mat4;

/// Per-instance vertex attributes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// World matrix (`T * S * R`), column-major
    pub model: [[f32; 4]; 4],
    /// Slot in the batch's texture array
    pub texture_index: u32,
    /// Mirror reflection strength
    pub reflectivity: f32,
    /// Specular exponent
    pub shininess: u32,
    /// Keeps the record a multiple of 16 bytes
    pub _padding: u32,
}

impl InstanceData {
    /// Build an instance record
    pub fn new(model: &Mat4, texture_index: u32, reflectivity: f32, shininess: u32) -> Self {
        Self {
            model: (*model).into(),
            texture_index,
            reflectivity,
            shininess,
            _padding: 0,
        }
    }

    /// The world matrix as a matrix
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from(self.model)
    }
}

/// Limits one batch must respect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    /// Unique textures per batch
    pub max_texture_slots: usize,
    /// Instances per batch
    pub max_instances: usize,
}

/// Everything needed for one draw of one mesh
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBatch {
    /// Shared geometry
    pub mesh: MeshKey,
    /// Unique textures in first-seen order; `texture_index` points in here
    pub textures: Vec<TextureKey>,
    /// One record per entity
    pub instances: Vec<InstanceData>,
    /// Source entity of each instance record
    pub entities: Vec<Entity>,
}

impl RenderBatch {
    fn new(mesh: MeshKey) -> Self {
        Self {
            mesh,
            textures: Vec::new(),
            instances: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// Texture slot for `texture`, if it already has one
    fn slot_of(&self, texture: TextureKey) -> Option<usize> {
        self.textures.iter().position(|&t| t == texture)
    }
}

/// Group every `Renderable + Transform` entity into batches
///
/// Limits below 1 are treated as 1.
pub fn build_batches(world: &World, limits: BatchLimits) -> Vec<RenderBatch> {
    let entities = world.entities_with(ComponentMask::RENDERABLE | ComponentMask::TRANSFORM);

    let mut group_index: HashMap<MeshKey, usize> = HashMap::new();
    let mut groups: Vec<(MeshKey, Vec<(Entity, Renderable, Transform)>)> = Vec::new();

    for entity in entities {
        let (Some(renderable), Some(transform)) = (
            world.get_component::<Renderable>(entity),
            world.get_component::<Transform>(entity),
        ) else {
            debug_assert!(false, "{} matched the render query without its components", entity);
            continue;
        };

        let index = *group_index.entry(renderable.mesh).or_insert_with(|| {
            groups.push((renderable.mesh, Vec::new()));
            groups.len() - 1
        });
        groups[index].1.push((entity, *renderable, *transform));
    }

    // Zero limits would never admit an instance
    let max_instances = limits.max_instances.max(1);
    let max_texture_slots = limits.max_texture_slots.max(1);

    let mut batches = Vec::new();
    for (mesh, members) in groups {
        let mut batch = RenderBatch::new(mesh);

        for (entity, renderable, transform) in members {
            let slot = match batch.slot_of(renderable.texture) {
                Some(slot) if batch.instances.len() < max_instances => slot,
                _ => {
                    let full = batch.instances.len() >= max_instances || batch.textures.len() >= max_texture_slots;
                    if full && !batch.instances.is_empty() {
                        batches.push(std::mem::replace(&mut batch, RenderBatch::new(mesh)));
                    }
                    batch.slot_of(renderable.texture).unwrap_or_else(|| {
                        batch.textures.push(renderable.texture);
                        batch.textures.len() - 1
                    })
                }
            };

            batch.instances.push(InstanceData::new(
                &transform.to_matrix(),
                slot as u32,
                renderable.reflectivity,
                renderable.shininess,
            ));
            batch.entities.push(entity);
        }

        if !batch.instances.is_empty() {
            batches.push(batch);
        }
    }

    log::trace!("Built {} batches", batches.len());
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use slotmap::SlotMap;

    const ROOMY: BatchLimits = BatchLimits { max_texture_slots: 16, max_instances: 1024 };

    struct Keys {
        meshes: SlotMap<MeshKey, ()>,
        textures: SlotMap<TextureKey, ()>,
    }

    impl Keys {
        fn new() -> Self {
            Self { meshes: SlotMap::with_key(), textures: SlotMap::with_key() }
        }
        fn mesh(&mut self) -> MeshKey {
            self.meshes.insert(())
        }
        fn texture(&mut self) -> TextureKey {
            self.textures.insert(())
        }
    }

    fn spawn(world: &mut World, mesh: MeshKey, texture: TextureKey, x: f32) -> Entity {
        let entity = world.create_entity();
        world.add_component(entity, Transform::from_position(Vec3::new(x, 0.0, 0.0))).unwrap();
        world.add_component(entity, Renderable::new(mesh, texture)).unwrap();
        entity
    }

    #[test]
    fn test_shared_texture_gets_one_slot() {
        let mut keys = Keys::new();
        let (cube, wood, stone) = (keys.mesh(), keys.texture(), keys.texture());
        let mut world = World::new();
        spawn(&mut world, cube, wood, 0.0);
        spawn(&mut world, cube, stone, 1.0);
        spawn(&mut world, cube, wood, 2.0);

        let batches = build_batches(&world, ROOMY);

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].textures, vec![wood, stone]);
        let slots: Vec<u32> = batches[0].instances.iter().map(|i| i.texture_index).collect();
        assert_eq!(slots, vec![0, 1, 0]);
    }

    #[test]
    fn test_groups_follow_first_appearance() {
        let mut keys = Keys::new();
        let (cube, sphere, tex) = (keys.mesh(), keys.mesh(), keys.texture());
        let mut world = World::new();
        let a = spawn(&mut world, sphere, tex, 0.0);
        let b = spawn(&mut world, cube, tex, 1.0);
        let c = spawn(&mut world, sphere, tex, 2.0);

        let batches = build_batches(&world, ROOMY);

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].mesh, sphere);
        assert_eq!(batches[0].entities, vec![a, c]);
        assert_eq!(batches[1].mesh, cube);
        assert_eq!(batches[1].entities, vec![b]);
    }

    #[test]
    fn test_texture_limit_spills_into_new_batch() {
        let mut keys = Keys::new();
        let cube = keys.mesh();
        let textures: Vec<TextureKey> = (0..3).map(|_| keys.texture()).collect();
        let mut world = World::new();
        for (i, &texture) in textures.iter().enumerate() {
            spawn(&mut world, cube, texture, i as f32);
        }
        // Reuses a slot that only exists in the first batch
        spawn(&mut world, cube, textures[0], 9.0);

        let limits = BatchLimits { max_texture_slots: 2, max_instances: 1024 };
        let batches = build_batches(&world, limits);

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].textures, vec![textures[0], textures[1]]);
        assert_eq!(batches[1].textures, vec![textures[2], textures[0]]);
        for batch in &batches {
            assert!(batch.textures.len() <= limits.max_texture_slots);
            assert!(batch.instances.iter().all(|i| (i.texture_index as usize) < batch.textures.len()));
        }
    }

    #[test]
    fn test_instance_limit_spills_into_new_batch() {
        let mut keys = Keys::new();
        let (cube, tex) = (keys.mesh(), keys.texture());
        let mut world = World::new();
        for i in 0..5 {
            spawn(&mut world, cube, tex, i as f32);
        }

        let batches = build_batches(&world, BatchLimits { max_texture_slots: 16, max_instances: 2 });

        let sizes: Vec<usize> = batches.iter().map(|b| b.instances.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(batches.iter().all(|b| b.mesh == cube && b.textures == vec![tex]));
    }

    #[test]
    fn test_instance_record_carries_world_matrix_and_material() {
        let mut keys = Keys::new();
        let (cube, tex) = (keys.mesh(), keys.texture());
        let mut world = World::new();
        let entity = world.create_entity();
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0)).with_uniform_scale(2.0);
        world.add_component(entity, transform).unwrap();
        world.add_component(entity, Renderable::new(cube, tex).with_material(0.25, 64)).unwrap();

        let batches = build_batches(&world, ROOMY);
        let instance = batches[0].instances[0];

        assert_eq!(instance.model_matrix(), transform.to_matrix());
        assert_eq!(instance.reflectivity, 0.25);
        assert_eq!(instance.shininess, 64);
        assert_eq!(std::mem::size_of::<InstanceData>(), 80);
    }

    #[test]
    fn test_zero_limits_still_batch_one_instance_each() {
        let mut keys = Keys::new();
        let (cube, wood, stone) = (keys.mesh(), keys.texture(), keys.texture());
        let mut world = World::new();
        spawn(&mut world, cube, wood, 0.0);
        spawn(&mut world, cube, stone, 1.0);

        let batches = build_batches(&world, BatchLimits { max_texture_slots: 16, max_instances: 0 });
        let sizes: Vec<usize> = batches.iter().map(|b| b.instances.len()).collect();
        assert_eq!(sizes, vec![1, 1]);

        let batches = build_batches(&world, BatchLimits { max_texture_slots: 0, max_instances: 16 });
        let sizes: Vec<usize> = batches.iter().map(|b| b.instances.len()).collect();
        assert_eq!(sizes, vec![1, 1]);
        assert!(batches.iter().all(|b| b.textures.len() == 1));
    }

    #[test]
    fn test_empty_world_has_no_batches() {
        assert!(build_batches(&World::new(), ROOMY).is_empty());
    }
}
