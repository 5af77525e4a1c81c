//! Castle demo application
//!
//! Builds one of the demo scenes and drives the frame loop against the
//! simulated device: animate, upload the dirty constants into the current
//! frame resource, record the layered draw list, submit and present.
//!
//! Usage: `castle_demo [config.toml | config.ron] [castle | billboards]`

mod error;
mod scenes;

use std::path::Path;
use std::time::Duration;

use frame_engine::core::config::{ApplicationConfig, Config};
use frame_engine::foundation::logging;
use frame_engine::foundation::math::{constants::QUARTER_PI, Vec3};
use frame_engine::foundation::time::{Stopwatch, Timer};
use frame_engine::render::{FrameRenderer, FrameStats, SimulatedDevice};
use frame_engine::scene::{scroll_material, try_move, Camera, CameraMove, Waves, WATER_SCROLL};
use rand::Rng;

use crate::error::AppError;
use crate::scenes::{DemoScene, SceneKind};

/// Seconds between random wave disturbances
const DISTURB_INTERVAL: f32 = 0.25;

/// Log a frame summary this often
const REPORT_INTERVAL: u64 = 120;

/// Camera walk, repeated: each move is held for the given seconds
const WALK: [(CameraMove, f32); 4] = [
    (CameraMove::Forward, 3.0),
    (CameraMove::Right, 1.5),
    (CameraMove::Back, 3.0),
    (CameraMove::Left, 1.5),
];

/// Random disturbance site and magnitude, kept five cells clear of the edges
fn random_disturbance<R: Rng>(rng: &mut R, waves: &Waves) -> (usize, usize, f32) {
    let row = rng.gen_range(6..=waves.row_count() - 5);
    let col = rng.gen_range(6..=waves.column_count() - 5);
    (row, col, rng.gen_range(0.1..0.3))
}

/// Move of the walk at `total_time` seconds
fn walk_step(total_time: f32) -> CameraMove {
    let cycle: f32 = WALK.iter().map(|&(_, seconds)| seconds).sum();
    let mut t = total_time.rem_euclid(cycle);
    for (movement, seconds) in WALK {
        if t < seconds {
            return movement;
        }
        t -= seconds;
    }
    WALK[0].0
}

/// The frame loop and everything it animates
struct CastleApp {
    renderer: FrameRenderer<SimulatedDevice>,
    demo: DemoScene,
    camera: Camera,
    timer: Timer,
    fixed_step: Option<Duration>,
    frame_limit: Option<u64>,
    last_disturb: f32,
    blocked_moves: u64,
}

impl CastleApp {
    fn new(config: &ApplicationConfig, kind: SceneKind) -> Result<Self, AppError> {
        log::info!("Creating simulated device...");
        let mut device = SimulatedDevice::new(&config.renderer, &config.simulation)?;

        let demo = DemoScene::build(kind, &mut device, config.renderer.frame_resource_count)?;
        let renderer = FrameRenderer::new(device, &demo.scene, config.renderer.clone(), demo.waves.vertex_count())?;

        let (width, height) = config.renderer.viewport;
        let mut camera = Camera::new(
            Vec3::new(0.0, 30.0, -155.0),
            QUARTER_PI,
            width as f32 / height as f32,
            1.0,
            1000.0,
        );
        camera.look_at(Vec3::new(0.0, 10.0, 0.0));

        Ok(Self {
            renderer,
            demo,
            camera,
            timer: Timer::new(),
            fixed_step: config.engine.fixed_step_ms.map(Duration::from_millis),
            frame_limit: config.engine.frame_limit,
            last_disturb: 0.0,
            blocked_moves: 0,
        })
    }

    fn run(&mut self) -> Result<(), AppError> {
        log::info!("Starting frame loop (frame limit: {:?})", self.frame_limit);
        let mut stopwatch = Stopwatch::start_new();
        let mut stalls = 0u64;

        while self.frame_limit.map_or(true, |limit| self.timer.frame_count() < limit) {
            match self.fixed_step {
                Some(step) => self.timer.tick(step),
                None => self.timer.update(),
            }

            self.animate()?;
            let stats = self.render_frame()?;
            if stats.stalled {
                stalls += 1;
            }
            if stats.frame_index % REPORT_INTERVAL == 0 {
                log::info!(
                    "Frame {} (slot {}, reset {}x): {} draws, {} pipeline changes, {} object / {} material writes",
                    stats.frame_index,
                    stats.slot_index,
                    stats.allocator_resets,
                    stats.draw_calls,
                    stats.pipeline_changes,
                    stats.object_writes,
                    stats.material_writes
                );
            }
        }

        self.renderer.flush()?;
        stopwatch.stop();
        log::info!(
            "Rendered {} frames in {:.2?} ({} CPU stalls, {} presents, {} blocked camera moves)",
            self.timer.frame_count(),
            stopwatch.elapsed(),
            stalls,
            self.renderer.device().present_count(),
            self.blocked_moves
        );
        log::info!("Camera finished at {:?}", self.camera.position());
        Ok(())
    }

    fn animate(&mut self) -> Result<(), AppError> {
        let dt = self.timer.delta_time();
        let total = self.timer.total_time();
        let scene = &mut self.demo.scene;

        scroll_material(scene, self.demo.water, WATER_SCROLL, dt)?;
        for spin in &self.demo.spins {
            spin.apply(scene, total)?;
        }

        if !try_move(scene, &mut self.camera, walk_step(total), dt) {
            self.blocked_moves += 1;
        }

        let waves = &mut self.demo.waves;
        if total - self.last_disturb >= DISTURB_INTERVAL {
            self.last_disturb += DISTURB_INTERVAL;

            let (row, col, magnitude) = random_disturbance(&mut rand::thread_rng(), waves);
            waves.disturb(row, col, magnitude)?;
            log::trace!("Disturbed waves at ({}, {}) by {:.2}", row, col, magnitude);
        }
        waves.update(dt);
        Ok(())
    }

    fn render_frame(&mut self) -> Result<FrameStats, AppError> {
        let pass = self
            .camera
            .pass_constants(self.renderer.config().viewport, &self.timer)
            .with_ambient(self.demo.ambient)
            .with_lights(&self.demo.lights);
        let vertices = self.demo.waves.vertices();

        Ok(self.renderer.render_frame(&mut self.demo.scene, &pass, &vertices)?)
    }
}

fn parse_args() -> Result<(ApplicationConfig, SceneKind), AppError> {
    let mut config = ApplicationConfig::default();
    let mut kind = SceneKind::Castle;

    for arg in std::env::args().skip(1) {
        if Path::new(&arg).extension().is_some() {
            config = ApplicationConfig::load_from_file(&arg)?;
        } else {
            kind = arg.parse()?;
        }
    }

    config.validate()?;
    Ok((config, kind))
}

fn main() -> Result<(), AppError> {
    let (config, kind) = parse_args()?;
    logging::init_with_level(&config.engine.log_level);
    log::info!("Starting castle demo ({:?} scene)", kind);

    let result = CastleApp::new(&config, kind).and_then(|mut app| app.run());
    match &result {
        Ok(()) => log::info!("Castle demo finished successfully"),
        Err(AppError::Render(e)) if e.is_device_lost() => log::error!("GPU device lost: {}", e),
        Err(e) => log::error!("Application error: {}", e),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_disturbance_covers_inclusive_interior_range() {
        let mut waves = Waves::new(14, 12, 1.0, 0.03, 4.0, 0.2);
        let mut rng = StdRng::seed_from_u64(7);
        let (mut rows, mut cols) = (Vec::new(), Vec::new());

        for _ in 0..200 {
            let (row, col, magnitude) = random_disturbance(&mut rng, &waves);
            assert!((6..=9).contains(&row), "row {}", row);
            assert!((6..=7).contains(&col), "col {}", col);
            assert!((0.1..0.3).contains(&magnitude));
            waves.disturb(row, col, magnitude).unwrap();
            rows.push(row);
            cols.push(col);
        }

        // Both ends of each range are reachable
        assert!(rows.contains(&6) && rows.contains(&9));
        assert!(cols.contains(&6) && cols.contains(&7));
    }

    #[test]
    fn test_walk_cycles_through_moves() {
        assert_eq!(walk_step(0.0), CameraMove::Forward);
        assert_eq!(walk_step(3.2), CameraMove::Right);
        assert_eq!(walk_step(5.0), CameraMove::Back);
        assert_eq!(walk_step(8.0), CameraMove::Left);
        assert_eq!(walk_step(9.1), CameraMove::Forward);
    }
}
