use anyhow::Result;
use clap::Parser;
use scene_loop::{app, cli::Cli, config::AppConfig};
use winit::event_loop::EventLoop;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::resolve(&cli)?;

    if let Some(frames) = cli.headless {
        return app::run_headless(&config, frames, cli.snapshot.as_deref());
    }

    let event_loop = EventLoop::new()?;
    let mut app = app::App::new(config);

    log::info!("Controls: drag to orbit, wheel to zoom, Escape to quit");
    event_loop.run_app(&mut app)?;

    Ok(())
}
