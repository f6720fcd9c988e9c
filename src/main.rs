//! Phage - headless demo host for the Phage scene engine
//!
//! Loads settings, builds a small solar-system scene and drives it for a
//! fixed number of frames.
//!
//! Usage: `phage [settings.toml] [--init]`. With `--init` the default
//! settings are written to the given (or default) path and the program exits.

mod demo;
mod settings;

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use phage_assets::{FolderLocator, Resource, ResourceLocator};
use phage_game::Game;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::demo::{PhysicsSystem, RenderSystem};
use crate::settings::Settings;

fn main() -> Result<()> {
    let mut path = None;
    let mut init = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--init" => init = true,
            _ => path = Some(PathBuf::from(arg)),
        }
    }

    if init {
        let path = path
            .or_else(Settings::default_path)
            .context("Could not determine where to write settings")?;
        return Settings::default().save(&path);
    }

    let settings = Settings::load(path.as_deref());

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("Invalid log filter")?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    info!("Starting {}...", settings.game.title);
    run(&settings)
}

fn run(settings: &Settings) -> Result<()> {
    let mut game = Game::new(settings.game.clone());

    if let Some(dir) = &settings.assets_dir {
        let locator: Rc<dyn ResourceLocator> = Rc::new(FolderLocator::new(dir));
        let readme = Resource::new("README.txt", locator);
        if readme.exists() {
            game.assets_mut()
                .load::<String>("readme", readme, &[])
                .context("Failed to load README.txt")?;
        }
    }

    let frames = Rc::new(Cell::new(0));
    game.add_system(PhysicsSystem::new())?;
    game.add_system(RenderSystem::new(frames.clone())?)?;

    let scene_name = settings.game.initial_scene.clone();
    let scene = game
        .create_scene(&scene_name)
        .context("Failed to create the initial scene")?;
    demo::populate(scene).context("Failed to populate the scene")?;

    game.start().context("Failed to start the game")?;
    let mut steps = 0;
    for _ in 0..settings.frames {
        steps += game.advance(settings.frame_delta)?;
    }

    if let Some(scene) = game.scenes().current() {
        let moon = scene.find("sun.earth.moon")?;
        let world = scene.world_transform(moon)?;
        info!(
            x = world.translation.x,
            y = world.translation.y,
            "moon position"
        );
        let comet = scene.find("comet")?;
        info!(ticks = ?scene.get_field(comet, "ticks")?, "comet script ran");
        info!("\n{}", scene.dump_tree());
    }
    game.scenes().dump();
    game.stop()?;

    info!(
        host_frames = settings.frames,
        steps,
        rendered = frames.get(),
        assets = game.assets().len(),
        "Demo finished"
    );
    Ok(())
}
