//! Headless sandbox
//!
//! Builds a small scene (a floor of tiles, falling crates and a ring of
//! lights), feeds a scripted sequence of input events through the scheduler
//! and runs frames against the recording backend until the scene quits or
//! the frame cap is reached.
//!
//! Usage: `sandbox [config.toml|config.ron] [max_frames]`

use std::cell::RefCell;
use std::rc::Rc;

use ecs_engine::prelude::*;
use ecs_engine::render::{MeshKey, TextureKey};
use thiserror::Error;

const FRAME_TIME: f32 = 1.0 / 60.0;
const DEFAULT_MAX_FRAMES: u32 = 600;
const FLOOR_HALF_EXTENT: i32 = 4;
const LIGHT_COUNT: usize = 12;

#[derive(Error, Debug)]
enum SandboxError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("invalid frame count '{0}'")]
    FrameCount(String),
}

impl From<ecs_engine::config::ConfigError> for SandboxError {
    fn from(e: ecs_engine::config::ConfigError) -> Self {
        Self::Engine(e.into())
    }
}

impl From<ecs_engine::ecs::EcsError> for SandboxError {
    fn from(e: ecs_engine::ecs::EcsError) -> Self {
        Self::Engine(e.into())
    }
}

impl From<ecs_engine::ecs::SchedulerError> for SandboxError {
    fn from(e: ecs_engine::ecs::SchedulerError) -> Self {
        Self::Engine(e.into())
    }
}

impl From<ecs_engine::render::RenderError> for SandboxError {
    fn from(e: ecs_engine::render::RenderError) -> Self {
        Self::Engine(e.into())
    }
}

struct Assets {
    cube: MeshKey,
    floor: MeshKey,
    textures: Vec<TextureKey>,
}

struct SandboxApp {
    world: World,
    scheduler: SystemScheduler,
    context: Rc<RefCell<GraphicsContext<HeadlessBackend>>>,
    crates: Vec<Entity>,
    script: Vec<(u32, Event)>,
    max_frames: u32,
}

impl SandboxApp {
    fn new(config: EngineConfig, max_frames: u32) -> Result<Self, SandboxError> {
        config.validate()?;

        let context = Rc::new(RefCell::new(GraphicsContext::new(HeadlessBackend::new())));
        let camera = Rc::new(RefCell::new(Camera::from_config(&config.camera)));
        let assets = Self::load_assets(&context)?;

        let builder_context = Rc::clone(&context);
        let mut scheduler = SystemScheduler::new().with_state_builder(move |state, set: &mut SystemSet| {
            if state != GameState::InGame {
                return Ok(());
            }
            set.register_system(InputSystem::new(config.input.clone(), Rc::clone(&camera)))?;
            set.register_system(PhysicsSystem::new(config.physics.clone()))?;
            set.register_system(RenderSystem::new(
                config.render.clone(),
                Rc::clone(&builder_context),
                Rc::clone(&camera),
            ))
        });
        scheduler.set_state(GameState::InGame)?;

        let mut world = World::new();
        Self::build_floor(&mut world, &assets)?;
        let crates = Self::drop_crates(&mut world, &assets)?;
        Self::place_lights(&mut world)?;
        log::info!("Scene ready: {} entities", world.live_count());

        Ok(Self {
            world,
            scheduler,
            context,
            crates,
            script: Self::input_script(max_frames),
            max_frames,
        })
    }

    fn load_assets(context: &Rc<RefCell<GraphicsContext<HeadlessBackend>>>) -> Result<Assets, SandboxError> {
        let mut context = context.borrow_mut();
        let cube = context.load_mesh("meshes/cube.obj")?;
        let floor = context.load_mesh("meshes/tile.obj")?;
        let textures = ["textures/crate.png", "textures/metal.png", "textures/grass.png"]
            .iter()
            .map(|id| context.load_texture(id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Assets { cube, floor, textures })
    }

    fn build_floor(world: &mut World, assets: &Assets) -> Result<(), SandboxError> {
        let grass = assets.textures[2];
        for x in -FLOOR_HALF_EXTENT..FLOOR_HALF_EXTENT {
            for z in -FLOOR_HALF_EXTENT..FLOOR_HALF_EXTENT {
                let tile = world.create_entity();
                world.add_component(tile, Transform::from_position(Vec3::new(x as f32, 0.0, z as f32)))?;
                world.add_component(tile, Renderable::new(assets.floor, grass))?;
            }
        }
        Ok(())
    }

    fn drop_crates(world: &mut World, assets: &Assets) -> Result<Vec<Entity>, SandboxError> {
        let spawns = [
            (Vec3::new(0.5, 6.0, 0.5), Vec3::zeros()),
            (Vec3::new(-2.5, 8.0, 1.5), Vec3::new(0.5, 0.0, 0.0)),
            (Vec3::new(2.25, 5.0, -2.5), Vec3::new(0.0, 2.0, 0.0)),
            (Vec3::new(-1.5, 10.0, -1.5), Vec3::new(0.0, 0.0, 0.25)),
        ];

        let mut crates = Vec::with_capacity(spawns.len());
        for (i, (position, velocity)) in spawns.into_iter().enumerate() {
            let texture = assets.textures[i % 2];
            let spin = Quat::from_axis_angle(&Vec3::y_axis(), 0.4 * i as f32);
            let entity = world.create_entity();
            world.add_component(entity, Transform::from_parts(position, spin, Vec3::repeat(0.5)))?;
            world.add_component(entity, Physics::with_velocity(velocity))?;
            world.add_component(entity, Renderable::new(assets.cube, texture).with_material(0.2, 64))?;
            crates.push(entity);
        }
        Ok(crates)
    }

    fn place_lights(world: &mut World) -> Result<(), SandboxError> {
        for i in 0..LIGHT_COUNT {
            let angle = i as f32 / LIGHT_COUNT as f32 * std::f32::consts::TAU;
            let radius = 3.0 + i as f32;
            let light = world.create_entity();
            world.add_component(
                light,
                Transform::from_position(Vec3::new(radius * angle.cos(), 4.0, radius * angle.sin())),
            )?;
            let color = Vec3::new(1.0, 0.9 - 0.05 * i as f32, 0.8);
            // Outer ring reaches further
            let source = if radius > 8.0 {
                LightSource::new(color, 1.0).with_attenuation(1.0, 0.045, 0.0075)
            } else {
                LightSource::new(color, 1.0)
            };
            world.add_component(light, source)?;
        }
        Ok(())
    }

    /// Look around, fly forward for half a second, then press escape
    fn input_script(max_frames: u32) -> Vec<(u32, Event)> {
        let quit_frame = max_frames.saturating_sub(1).min(120);
        vec![
            (2, Event::mouse_motion(-15.0, 5.0)),
            (10, Event::key_down(KeyCode::W)),
            (10, Event::key_down(KeyCode::LeftCtrl)),
            (40, Event::key_up(KeyCode::W)),
            (40, Event::key_up(KeyCode::LeftCtrl)),
            (quit_frame, Event::key_down(KeyCode::Escape)),
        ]
    }

    fn run(&mut self) -> u32 {
        let mut frame = 0;
        while frame < self.max_frames && self.scheduler.state() != GameState::Quit {
            for (_, event) in self.script.iter().filter(|(at, _)| *at == frame) {
                self.scheduler.publish(*event);
            }
            self.scheduler.run_frame(&mut self.world, FRAME_TIME);
            frame += 1;
        }
        frame
    }

    fn log_summary(&self, frames: u32) {
        let context = self.context.borrow();
        let (meshes, textures, shaders) = context.resources.counts();
        log::info!("Ran {} frames, final state {:?}", frames, self.scheduler.state());
        log::info!(
            "Backend presented {} frames, {} live resources ({} meshes, {} textures, {} shaders)",
            context.backend.frames_presented(),
            context.backend.live_resources(),
            meshes,
            textures,
            shaders
        );

        for &entity in &self.crates {
            let position = self.world.get_component::<Transform>(entity).map(|t| t.position);
            let resting = self.world.get_component::<Physics>(entity).is_some_and(|p| p.is_static);
            if let Some(p) = position {
                log::info!(
                    "Crate {} at ({:.2}, {:.2}, {:.2}){}",
                    entity,
                    p.x,
                    p.y,
                    p.z,
                    if resting { " at rest" } else { "" }
                );
            }
        }
    }
}

fn parse_args() -> Result<(EngineConfig, u32), SandboxError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load_from_file(&path)?,
        None => EngineConfig::default(),
    };
    let max_frames = match args.next() {
        Some(text) => text.parse().map_err(|_| SandboxError::FrameCount(text))?,
        None => DEFAULT_MAX_FRAMES,
    };
    Ok((config, max_frames))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    ecs_engine::foundation::logging::init();
    log::info!("Starting headless sandbox");

    let (config, max_frames) = parse_args()?;
    let mut app = SandboxApp::new(config, max_frames)?;
    let frames = app.run();
    app.log_summary(frames);

    Ok(())
}
