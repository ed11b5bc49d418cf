//! Nearest-light selection
//!
//! The shading stage takes a fixed number of point lights. Each frame the
//! lights closest to the camera are picked and the rest are dropped outright,
//! so a light crossing the cut pops in or out rather than fading.

use super::backend::LightData;
use crate::ecs::components::{LightSource, Transform};
use crate::ecs::{ComponentMask, Entity, World};
use crate::foundation::math::Vec3;

/// A light chosen for this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedLight {
    /// Owning entity
    pub entity: Entity,
    /// Distance to the camera
    pub distance: f32,
    /// Shader-ready light record
    pub data: LightData,
}

impl SelectedLight {
    fn new(entity: Entity, transform: &Transform, light: &LightSource, camera_position: &Vec3) -> Self {
        let position = transform.position;
        Self {
            entity,
            distance: (position - camera_position).norm(),
            data: LightData {
                position: [position.x, position.y, position.z],
                intensity: light.intensity,
                color: [light.color.x, light.color.y, light.color.z],
                constant: light.constant,
                linear: light.linear,
                quadratic: light.quadratic,
                _padding: [0.0; 2],
            },
        }
    }
}

/// Stable in-place insertion sort by ascending distance
fn sort_by_distance(lights: &mut [SelectedLight]) {
    for i in 1..lights.len() {
        let mut j = i;
        while j > 0 && lights[j - 1].distance > lights[j].distance {
            lights.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// The `max_lights` lights nearest to `camera_position`, nearest first
///
/// Equal distances keep query order.
pub fn nearest_lights(world: &World, camera_position: &Vec3, max_lights: usize) -> Vec<SelectedLight> {
    let mut lights: Vec<SelectedLight> = world
        .entities_with(ComponentMask::LIGHT_SOURCE | ComponentMask::TRANSFORM)
        .into_iter()
        .filter_map(|entity| {
            let transform = world.get_component::<Transform>(entity)?;
            let light = world.get_component::<LightSource>(entity)?;
            Some(SelectedLight::new(entity, transform, light, camera_position))
        })
        .collect();

    sort_by_distance(&mut lights);
    if lights.len() > max_lights {
        log::trace!("Dropping {} distant lights", lights.len() - max_lights);
        lights.truncate(max_lights);
    }
    lights
}
