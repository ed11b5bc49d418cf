//! Render system: batches renderables and drives the graphics backend
//!
//! Each frame the system builds mesh batches, picks the nearest lights and
//! submits one draw per batch. A batch with a single instance goes through
//! the single-draw shader. Larger batches use the texture-array instanced
//! shader. A batch whose resources cannot be resolved is skipped and the
//! rest of the frame still renders.

use std::cell::RefCell;
use std::rc::Rc;

use super::backend::{GpuMesh, GraphicsBackend, LightData};
use super::batching::{build_batches, BatchLimits, RenderBatch};
use super::camera::Camera;
use super::lighting::nearest_lights;
use super::resources::{GraphicsContext, ResourceKind};
use super::RenderError;
use crate::config::RenderConfig;
use crate::ecs::components::Renderable;
use crate::ecs::{System, World, RENDER_PRIORITY};
use crate::foundation::math::{Mat4, Vec3};

/// Uniform holding the full model-view-projection matrix (single path)
pub const UNIFORM_FULL_TRANSFORM: &str = "matFullTransform";
/// Uniform holding projection times view (instanced path)
pub const UNIFORM_CAMERA: &str = "matCamera";
/// Uniform holding the ambient light color
pub const UNIFORM_AMBIENT_COLOR: &str = "ambientColor";
/// Uniform holding the ambient light intensity
pub const UNIFORM_AMBIENT_INTENSITY: &str = "ambientIntensity";
/// Uniform holding the camera's world position
pub const UNIFORM_CAMERA_POSITION: &str = "cameraPosition";

/// What the last frame submitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Batches built
    pub batches: usize,
    /// Draw calls issued
    pub draw_calls: usize,
    /// Instances drawn
    pub instances: usize,
    /// Lights bound
    pub lights: usize,
    /// Batches dropped because a resource was missing
    pub skipped_batches: usize,
}

/// Camera values captured once per frame
struct FrameView {
    camera_matrix: Mat4,
    camera_position: Vec3,
}

/// Draws every `Renderable + Transform` entity through a [`GraphicsBackend`]
pub struct RenderSystem<B: GraphicsBackend> {
    config: RenderConfig,
    context: Rc<RefCell<GraphicsContext<B>>>,
    camera: Rc<RefCell<Camera>>,
    stats: FrameStats,
}

impl<B: GraphicsBackend> RenderSystem<B> {
    /// Create a render system drawing through `context` from `camera`
    ///
    /// An invalid config is logged and its zero limits are treated as 1.
    pub fn new(config: RenderConfig, context: Rc<RefCell<GraphicsContext<B>>>, camera: Rc<RefCell<Camera>>) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("Render config rejected, clamping limits: {}", e);
        }
        Self {
            config,
            context,
            camera,
            stats: FrameStats::default(),
        }
    }

    /// Statistics for the most recent frame
    pub fn last_frame_stats(&self) -> FrameStats {
        self.stats
    }

    fn limits(&self) -> BatchLimits {
        BatchLimits {
            max_texture_slots: self.config.max_texture_slots,
            max_instances: self.config.max_instances_per_batch,
        }
    }

    fn resolve_mesh(context: &mut GraphicsContext<B>, batch: &RenderBatch) -> Result<GpuMesh, RenderError> {
        context
            .resources
            .resolve_mesh(batch.mesh)
            .ok_or(RenderError::MissingResource(ResourceKind::Mesh))
    }

    fn draw_single(&self, context: &mut GraphicsContext<B>, batch: &RenderBatch, view: &FrameView) -> Result<(), RenderError> {
        let mesh = Self::resolve_mesh(context, batch)?;
        let shader_key = context.load_shader(&self.config.single_shader)?;
        let shader = context
            .resources
            .resolve_shader(shader_key)
            .ok_or(RenderError::MissingResource(ResourceKind::Shader))?;
        let texture = batch
            .textures
            .first()
            .and_then(|&key| context.resources.resolve_texture(key))
            .ok_or(RenderError::MissingResource(ResourceKind::Texture))?;
        let model = batch.instances[0].model_matrix();

        let backend = &mut context.backend;
        backend.use_shader(shader);
        backend.bind_vao(mesh);
        backend.bind_texture(texture);
        backend.bind_matrix(UNIFORM_FULL_TRANSFORM, &(view.camera_matrix * model));
        backend.draw_single(mesh)
    }

    fn draw_instanced(
        &self,
        context: &mut GraphicsContext<B>,
        batch: &RenderBatch,
        view: &FrameView,
        lights: &[LightData],
    ) -> Result<(), RenderError> {
        let mesh = Self::resolve_mesh(context, batch)?;
        let shader_key = context.load_shader(&self.config.instanced_shader)?;
        let shader = context
            .resources
            .resolve_shader(shader_key)
            .ok_or(RenderError::MissingResource(ResourceKind::Shader))?;
        let textures = batch
            .textures
            .iter()
            .map(|&key| context.resources.resolve_texture(key))
            .collect::<Option<Vec<_>>>()
            .ok_or(RenderError::MissingResource(ResourceKind::Texture))?;

        let backend = &mut context.backend;
        backend.use_shader(shader);
        backend.bind_vao(mesh);
        backend.bind_texture_array(&textures);
        backend.bind_matrix(UNIFORM_CAMERA, &view.camera_matrix);
        backend.bind_vector(UNIFORM_AMBIENT_COLOR, &Vec3::from(self.config.ambient_color));
        backend.bind_float(UNIFORM_AMBIENT_INTENSITY, self.config.ambient_intensity);
        backend.bind_vector(UNIFORM_CAMERA_POSITION, &view.camera_position);
        backend.bind_lights(lights);
        backend.draw_instances(mesh, &batch.instances)
    }
}

impl<B: GraphicsBackend> System for RenderSystem<B> {
    fn name(&self) -> &'static str {
        "RenderSystem"
    }

    fn priority(&self) -> i32 {
        RENDER_PRIORITY
    }

    fn update(&mut self, world: &mut World, _delta_time: f32) {
        let view = {
            let camera = self.camera.borrow();
            FrameView {
                camera_matrix: camera.view_projection_matrix(),
                camera_position: camera.position,
            }
        };

        let batches = build_batches(world, self.limits());
        let lights: Vec<LightData> = nearest_lights(world, &view.camera_position, self.config.max_lights)
            .into_iter()
            .map(|light| light.data)
            .collect();

        let context = Rc::clone(&self.context);
        let mut context = context.borrow_mut();
        context.resources.advance_frame();

        let mut stats = FrameStats {
            batches: batches.len(),
            lights: lights.len(),
            ..FrameStats::default()
        };

        if let Err(e) = context.backend.begin_frame(self.config.clear_color) {
            log::error!("Failed to begin frame: {}", e);
            self.stats = stats;
            return;
        }

        for batch in &batches {
            let result = if batch.instances.len() == 1 {
                self.draw_single(&mut context, batch, &view)
            } else {
                self.draw_instanced(&mut context, batch, &view, &lights)
            };

            match result {
                Ok(()) => {
                    stats.draw_calls += 1;
                    stats.instances += batch.instances.len();
                }
                Err(e) => {
                    log::warn!("Skipping batch of {} instances: {}", batch.instances.len(), e);
                    stats.skipped_batches += 1;
                }
            }
        }

        if let Err(e) = context.backend.present() {
            log::error!("Failed to present frame: {}", e);
        }

        // Held resources survive the sweep even when nothing drew them
        for (_, renderable) in world.query::<Renderable>() {
            context.resources.mark_used(renderable.mesh, renderable.texture);
        }
        context.sweep_unused(self.config.resource_idle_frames);

        log::debug!(
            "Rendered {} batches ({} instances, {} lights, {} skipped)",
            stats.draw_calls,
            stats.instances,
            stats.lights,
            stats.skipped_batches
        );
        self.stats = stats;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{LightSource, Transform};
    use crate::render::backend::{HeadlessBackend, RenderCommand};
    use crate::render::resources::{MeshKey, TextureKey};

    struct Fixture {
        world: World,
        context: Rc<RefCell<GraphicsContext<HeadlessBackend>>>,
        system: RenderSystem<HeadlessBackend>,
    }

    impl Fixture {
        fn new(backend: HeadlessBackend, config: RenderConfig) -> Self {
            let context = Rc::new(RefCell::new(GraphicsContext::new(backend)));
            let camera = Rc::new(RefCell::new(Camera::default()));
            let system = RenderSystem::new(config, Rc::clone(&context), camera);
            Self { world: World::new(), context, system }
        }

        fn keys(&self, mesh: &str, texture: &str) -> (MeshKey, TextureKey) {
            let mut context = self.context.borrow_mut();
            (context.load_mesh(mesh).unwrap(), context.load_texture(texture).unwrap())
        }

        fn spawn(&mut self, mesh: MeshKey, texture: TextureKey, x: f32) {
            let entity = self.world.create_entity();
            self.world.add_component(entity, Transform::from_position(Vec3::new(x, 0.0, 0.0))).unwrap();
            self.world.add_component(entity, Renderable::new(mesh, texture)).unwrap();
        }

        fn frame(&mut self) -> Vec<RenderCommand> {
            self.context.borrow_mut().backend.take_commands();
            self.system.update(&mut self.world, 0.016);
            self.context.borrow_mut().backend.take_commands()
        }
    }

    fn is_draw(command: &RenderCommand) -> bool {
        matches!(command, RenderCommand::DrawSingle(_) | RenderCommand::DrawInstances(..))
    }

    #[test]
    fn test_single_instance_uses_single_path() {
        let mut fixture = Fixture::new(HeadlessBackend::new(), RenderConfig::default());
        let (cube, wood) = fixture.keys("cube.obj", "wood.png");
        fixture.spawn(cube, wood, 0.0);

        let commands = fixture.frame();

        assert_eq!(commands.first(), Some(&RenderCommand::BeginFrame));
        assert_eq!(commands.last(), Some(&RenderCommand::Present));
        assert!(commands.contains(&RenderCommand::LoadShader(RenderConfig::default().single_shader)));
        assert!(commands.contains(&RenderCommand::BindMatrix(UNIFORM_FULL_TRANSFORM.to_string())));
        assert!(commands.iter().any(|c| matches!(c, RenderCommand::BindTexture(_))));
        assert!(commands.iter().any(|c| matches!(c, RenderCommand::DrawSingle(_))));
        assert_eq!(fixture.system.last_frame_stats().draw_calls, 1);
    }

    #[test]
    fn test_group_draws_instanced_with_deduplicated_textures() {
        let mut fixture = Fixture::new(HeadlessBackend::new(), RenderConfig::default());
        let (cube, wood) = fixture.keys("cube.obj", "wood.png");
        let (_, stone) = fixture.keys("cube.obj", "stone.png");
        fixture.spawn(cube, wood, 0.0);
        fixture.spawn(cube, stone, 1.0);
        fixture.spawn(cube, wood, 2.0);

        let commands = fixture.frame();

        let arrays: Vec<&Vec<_>> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::BindTextureArray(textures) => Some(textures),
                _ => None,
            })
            .collect();
        assert_eq!(arrays.len(), 1);
        assert_eq!(arrays[0].len(), 2);

        let draws: Vec<&RenderCommand> = commands.iter().filter(|c| is_draw(c)).collect();
        assert_eq!(draws.len(), 1);
        assert!(matches!(draws[0], RenderCommand::DrawInstances(_, instances) if instances.len() == 3));
        assert!(commands.contains(&RenderCommand::BindMatrix(UNIFORM_CAMERA.to_string())));
    }

    #[test]
    fn test_instanced_path_binds_nearest_lights() {
        let config = RenderConfig { max_lights: 2, ..RenderConfig::default() };
        let mut fixture = Fixture::new(HeadlessBackend::new(), config);
        let (cube, wood) = fixture.keys("cube.obj", "wood.png");
        fixture.spawn(cube, wood, 0.0);
        fixture.spawn(cube, wood, 1.0);
        for z in [40.0, 10.0, 20.0] {
            let light = fixture.world.create_entity();
            fixture.world.add_component(light, Transform::from_position(Vec3::new(0.0, 0.0, z))).unwrap();
            fixture.world.add_component(light, LightSource::default()).unwrap();
        }

        let commands = fixture.frame();

        let bound = commands.iter().find_map(|c| match c {
            RenderCommand::BindLights(lights) => Some(lights.clone()),
            _ => None,
        });
        let bound = bound.unwrap();
        assert_eq!(bound.len(), 2);
        assert_eq!(bound[0].position[2], 10.0);
        assert_eq!(bound[1].position[2], 20.0);
    }

    #[test]
    fn test_unresolvable_batch_is_skipped_and_frame_completes() {
        let mut fixture = Fixture::new(HeadlessBackend::new(), RenderConfig::default());
        let (cube, wood) = fixture.keys("cube.obj", "wood.png");
        let (sphere, _) = fixture.keys("sphere.obj", "wood.png");
        fixture.spawn(cube, wood, 0.0);
        fixture.spawn(sphere, wood, 1.0);

        // Sweep everything so the cube key goes stale, then reload only the sphere
        {
            let mut context = fixture.context.borrow_mut();
            for _ in 0..3 {
                context.resources.advance_frame();
            }
            context.sweep_unused(0);
        }
        let (fresh_sphere, fresh_wood) = fixture.keys("sphere.obj", "wood.png");
        let entity = fixture.world.create_entity();
        fixture.world.add_component(entity, Transform::identity()).unwrap();
        fixture.world.add_component(entity, Renderable::new(fresh_sphere, fresh_wood)).unwrap();

        let commands = fixture.frame();

        let stats = fixture.system.last_frame_stats();
        assert_eq!(stats.batches, 3);
        assert_eq!(stats.skipped_batches, 2);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(commands.iter().filter(|c| is_draw(c)).count(), 1);
        assert_eq!(commands.last(), Some(&RenderCommand::Present));
    }

    #[test]
    fn test_failing_shader_skips_batches() {
        let mut backend = HeadlessBackend::new();
        backend.fail_on(RenderConfig::default().instanced_shader);
        let mut fixture = Fixture::new(backend, RenderConfig::default());
        let (cube, wood) = fixture.keys("cube.obj", "wood.png");
        fixture.spawn(cube, wood, 0.0);
        fixture.spawn(cube, wood, 1.0);

        let commands = fixture.frame();

        assert_eq!(fixture.system.last_frame_stats().skipped_batches, 1);
        assert!(!commands.iter().any(is_draw));
        assert_eq!(commands, vec![RenderCommand::BeginFrame, RenderCommand::Present]);
    }

    #[test]
    fn test_held_resources_outlive_idle_frames() {
        let config = RenderConfig { resource_idle_frames: 2, ..RenderConfig::default() };
        let mut fixture = Fixture::new(HeadlessBackend::new(), config);
        let (cube, wood) = fixture.keys("cube.obj", "wood.png");
        let entity = fixture.world.create_entity();
        fixture.world.add_component(entity, Renderable::new(cube, wood)).unwrap();

        for _ in 0..5 {
            fixture.frame();
        }
        assert_eq!(fixture.context.borrow().resources.counts(), (1, 1, 0));

        fixture.world.add_component(entity, Transform::identity()).unwrap();
        let commands = fixture.frame();

        let stats = fixture.system.last_frame_stats();
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.skipped_batches, 0);
        assert!(!commands.iter().any(|c| matches!(c, RenderCommand::LoadMesh(_) | RenderCommand::LoadTexture(_))));
    }

    #[test]
    fn test_failing_batch_keeps_its_textures_cached() {
        let mut backend = HeadlessBackend::new();
        backend.fail_on(RenderConfig::default().instanced_shader);
        let config = RenderConfig { resource_idle_frames: 1, ..RenderConfig::default() };
        let mut fixture = Fixture::new(backend, config);
        let (cube, wood) = fixture.keys("cube.obj", "wood.png");
        fixture.spawn(cube, wood, 0.0);
        fixture.spawn(cube, wood, 1.0);

        for _ in 0..4 {
            fixture.frame();
        }

        assert_eq!(fixture.system.last_frame_stats().skipped_batches, 1);
        let mut context = fixture.context.borrow_mut();
        assert!(context.resources.resolve_texture(wood).is_some());
        assert!(context.resources.resolve_mesh(cube).is_some());
    }

    #[test]
    fn test_unreferenced_resources_are_swept() {
        let config = RenderConfig { resource_idle_frames: 2, ..RenderConfig::default() };
        let mut fixture = Fixture::new(HeadlessBackend::new(), config);
        let (cube, wood) = fixture.keys("cube.obj", "wood.png");
        fixture.keys("sphere.obj", "stone.png");
        fixture.spawn(cube, wood, 0.0);

        for _ in 0..4 {
            fixture.frame();
        }

        let counts = fixture.context.borrow().resources.counts();
        assert_eq!(counts, (1, 1, 1));
    }

    #[test]
    fn test_zero_instance_limit_draws_each_entity_alone() {
        let config = RenderConfig { max_instances_per_batch: 0, ..RenderConfig::default() };
        let mut fixture = Fixture::new(HeadlessBackend::new(), config);
        let (cube, wood) = fixture.keys("cube.obj", "wood.png");
        fixture.spawn(cube, wood, 0.0);
        fixture.spawn(cube, wood, 1.0);

        let commands = fixture.frame();

        let stats = fixture.system.last_frame_stats();
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.skipped_batches, 0);
        assert_eq!(commands.iter().filter(|c| matches!(c, RenderCommand::DrawSingle(_))).count(), 2);
        assert!(!commands.iter().any(|c| matches!(c, RenderCommand::DrawInstances(..))));
    }

    #[test]
    fn test_empty_world_still_presents() {
        let mut fixture = Fixture::new(HeadlessBackend::new(), RenderConfig::default());
        let commands = fixture.frame();
        assert_eq!(commands, vec![RenderCommand::BeginFrame, RenderCommand::Present]);
        assert_eq!(fixture.context.borrow().backend.frames_presented(), 1);
    }
}
