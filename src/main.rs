use anyhow::Result;

mod animation;
mod assets;
mod camera;
mod config;
mod demo;
mod engine;
mod frame_loop;
mod markers;
mod model;
mod rendering;
mod scene_graph;
mod scroll;
mod viewport;
mod window;

use config::PresentationConfig;

fn main() -> Result<()> {
    pretty_env_logger::init();

    let config = PresentationConfig::from_environment()?;
    pollster::block_on(window::run(config))?;

    Ok(())
}
