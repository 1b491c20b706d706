//! Entry point: build a demo arm, bind it to a headless scene and sweep its
//! first joint.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use corelib::DVec3;
use corelib::animate::Ramp;
use corelib::camera::ORTHOGRAPHIC_FOV;
use corelib::chain::Chain;
use corelib::link::DhField;
use parking_lot::Mutex;
use platform::{CancelToken, SystemClock};
use renderer::{DrawBackend, FrameBinding, FrameStyle, LinkView, SceneRecorder, Shared, shared};

mod robots;

use robots::Robot;

fn parse_robot_arg() -> Robot {
    // Accept: --robot=planar|ur5
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix("--robot=") {
            return match val.parse() {
                Ok(robot) => robot,
                Err(e) => {
                    log::warn!("{e}, falling back to planar.");
                    Robot::Planar
                }
            };
        }
    }
    Robot::Planar
}

fn parse_value_arg<T: std::str::FromStr>(prefix: &str, default: T) -> T {
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix(prefix) {
            match val.parse() {
                Ok(v) => return v,
                Err(_) => log::warn!("Bad value '{val}' for {prefix}, using default."),
            }
        }
    }
    default
}

fn parse_worker_arg() -> bool {
    std::env::args().any(|arg| arg == "--worker")
}

/// Frame and link visuals for every frame of the chain.
fn bind_scene(chain: &mut Chain, scene: &Shared<SceneRecorder>) -> Result<()> {
    let binding = FrameBinding::new(Arc::clone(scene));
    for link in chain.links() {
        binding.set_style(link.frame(), FrameStyle::default().with_scale(link.scale()));
    }
    chain.subscribe_frames(Box::new(binding));
    for index in 0..chain.len() {
        chain.subscribe_link(index, Box::new(LinkView::new(Arc::clone(scene))))?;
    }
    Ok(())
}

fn end_effector(chain: &Chain) -> Result<DVec3> {
    Ok(chain
        .tree()
        .world_translation(chain.end_effector(), DVec3::ZERO)?)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let robot = parse_robot_arg();
    let sweep_deg = parse_value_arg("--sweep-deg=", 90.0);
    let steps = parse_value_arg("--steps=", 90u32);
    let duration = Duration::from_millis(parse_value_arg("--duration-ms=", 0u64));
    let fov_deg = parse_value_arg("--fov-deg=", ORTHOGRAPHIC_FOV.to_degrees());
    let worker = parse_worker_arg();
    log::info!(
        "Starting dhframes. Robot: {robot:?}, sweep={sweep_deg}°, steps={steps}, duration={duration:?}, fov={fov_deg}°, worker={worker}"
    );

    let mut chain = robot.build().context("building robot")?;
    let scene = shared(SceneRecorder::new());
    bind_scene(&mut chain, &scene)?;
    let camera = robot.camera(&chain, f64::to_radians(fov_deg))?;
    scene.lock().set_camera(&camera);
    log::info!("End effector at {:?}", end_effector(&chain)?);

    let ramp = Ramp::new(DhField::Q, sweep_deg, duration, steps);
    let report = if worker {
        let chain = Arc::new(Mutex::new(chain));
        let handle = platform::spawn_ramp(Arc::clone(&chain), 0, ramp, CancelToken::new())?;
        let report = handle
            .join()
            .map_err(|_| anyhow::anyhow!("ramp worker panicked"))??;
        log::info!("End effector at {:?}", end_effector(&chain.lock())?);
        report
    } else {
        let report = platform::run_ramp(&mut chain, 0, &ramp, &SystemClock::new(), &CancelToken::new())?;
        log::info!("End effector at {:?}", end_effector(&chain)?);
        report
    };
    log::info!(
        "Sweep done: {} steps in {:?}, joint 1 at {}",
        report.applied,
        report.elapsed,
        report.final_value
    );

    let scene = scene.lock();
    log::info!(
        "Scene: {} nodes, {} primitives, {} bytes of link geometry",
        scene.node_count(),
        scene.primitive_count(),
        scene.vertex_bytes().len()
    );
    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
