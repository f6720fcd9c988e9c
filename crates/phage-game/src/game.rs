use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use phage_assets::AssetManager;
use phage_core::GameTime;
use phage_ecs::{EcsError, EntitySystem, Scene, SystemHandle, SystemSchedule};
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::scene_manager::SceneManager;

/// Owns the scenes, the system schedule and the assets, and drives frames.
///
/// Each frame runs every system in schedule order against the current
/// scene (`update`, then `update_entity` per matching entity, then
/// `post_update`), then the scene's scripts. Notifications raised by a call
/// are delivered right after it returns.
pub struct Game {
    config: GameConfig,
    scenes: SceneManager,
    systems: Rc<RefCell<SystemSchedule>>,
    assets: AssetManager,
    time: GameTime,
    running: bool,
}

impl Game {
    /// Create a stopped game with no scenes or systems.
    pub fn new(config: GameConfig) -> Self {
        info!(title = %config.title, "game created");
        Self {
            time: GameTime::new(config.time.clone()),
            config,
            scenes: SceneManager::new(),
            systems: Rc::new(RefCell::new(SystemSchedule::new())),
            assets: AssetManager::with_default_loaders(),
            running: false,
        }
    }

    /// The configuration this game was created with.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// All scenes of this game.
    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    /// Mutable access to the scenes.
    pub fn scenes_mut(&mut self) -> &mut SceneManager {
        &mut self.scenes
    }

    /// Loaded assets.
    pub fn assets(&self) -> &AssetManager {
        &self.assets
    }

    /// Mutable access to the assets, for loading.
    pub fn assets_mut(&mut self) -> &mut AssetManager {
        &mut self.assets
    }

    /// Frame time.
    pub fn time(&self) -> &GameTime {
        &self.time
    }

    /// Mutable access to frame time, for pausing or scaling.
    pub fn time_mut(&mut self) -> &mut GameTime {
        &mut self.time
    }

    /// Whether `start` has run and `stop` has not.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Create an empty scene wired to this game's systems.
    pub fn create_scene(&mut self, name: &str) -> Result<&mut Scene> {
        if self.scenes.has_scene(name) {
            return Err(GameError::DuplicateScene(name.to_string()));
        }
        let mut scene = Scene::new(name, self.config.title.clone());
        scene.attach_systems(self.systems.clone());
        self.scenes.add_scene(scene)?;
        self.scenes.scene_mut(name)
    }

    /// Append a system to the schedule. `GameConfig::system_order` is
    /// applied on top at start.
    pub fn add_system<S: EntitySystem + 'static>(&mut self, system: S) -> Result<SystemHandle> {
        Ok(self.schedule_mut()?.add_system(system)?)
    }

    /// Remove a system by name.
    pub fn remove_system(&mut self, name: &str) -> Result<SystemHandle> {
        Ok(self.schedule_mut()?.remove_system(name)?)
    }

    /// System names in the order they run.
    pub fn system_names(&self) -> Vec<String> {
        self.systems.borrow().names()
    }

    fn schedule_mut(&self) -> Result<RefMut<'_, SystemSchedule>> {
        self.systems
            .try_borrow_mut()
            .map_err(|_| EcsError::state("system schedule is in use").into())
    }

    /// Apply the configured system order and load the initial scene.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Err(GameError::AlreadyRunning);
        }
        self.schedule_mut()?.apply_order(&self.config.system_order)?;
        let initial = self.config.initial_scene.clone();
        self.running = true;
        if let Err(err) = self.set_current_scene(&initial) {
            self.running = false;
            return Err(err);
        }
        info!(scene = %initial, systems = ?self.system_names(), "game started");
        Ok(())
    }

    /// Switch scenes: systems resynchronize through `scene_changed`, then
    /// the new scene's scripts get `onSceneLoad`.
    pub fn set_current_scene(&mut self, name: &str) -> Result<()> {
        let old = self.scenes.set_current(name)?;
        let systems = self.systems.borrow().snapshot();
        let scene = self
            .scenes
            .current_mut()
            .ok_or(GameError::NoCurrentScene)?;
        for (system_name, system) in &systems {
            scene
                .deferred(|s| running(system)?.scene_changed(old.as_deref(), s))
                .map_err(|e| GameError::system(system_name, e))?;
        }
        scene.on_scene_load()?;
        Ok(())
    }

    /// Feed a raw frame delta and run one update per due fixed step.
    /// Returns the number of steps run.
    pub fn advance(&mut self, raw_delta: f32) -> Result<u32> {
        if !self.running {
            return Err(GameError::NotRunning);
        }
        self.time.update(raw_delta);
        let steps = self.time.fixed_steps();
        let dt = self.time.config.fixed_timestep;
        for _ in 0..steps {
            self.update(dt)?;
        }
        Ok(steps)
    }

    /// Run one frame of `dt` seconds on the current scene.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        if !self.running {
            return Err(GameError::NotRunning);
        }
        let systems = self.systems.borrow().snapshot();
        let scene = self
            .scenes
            .current_mut()
            .ok_or(GameError::NoCurrentScene)?;

        for (name, system) in &systems {
            run_system(scene, system, dt).map_err(|e| GameError::system(name, e))?;
        }
        scene.update_scripts(dt)?;

        if let Some(next) = scene.take_requested_scene() {
            debug!(scene = %next, "scene change requested");
            self.set_current_scene(&next)?;
        }
        Ok(())
    }

    /// Run the scripts' `exit` on the current scene and stop.
    pub fn stop(&mut self) -> Result<()> {
        if !self.running {
            return Err(GameError::NotRunning);
        }
        self.running = false;
        if let Some(scene) = self.scenes.current_mut() {
            scene.exit_scripts()?;
        }
        info!(frames = self.time.frame_count, "game stopped");
        Ok(())
    }
}

fn running(system: &SystemHandle) -> phage_ecs::Result<RefMut<'_, dyn EntitySystem + 'static>> {
    system
        .try_borrow_mut()
        .map_err(|_| EcsError::state("system is already running"))
}

/// One system's slice of a frame. An error stops the rest of its
/// per-entity loop.
fn run_system(scene: &mut Scene, system: &SystemHandle, dt: f32) -> phage_ecs::Result<()> {
    scene.deferred(|s| running(system)?.update(s, dt))?;

    let targets = {
        let system = system
            .try_borrow()
            .map_err(|_| EcsError::state("system is already running"))?;
        scene.entities_by_filter(system.update_filter())
    };
    for entity in targets {
        if !scene.contains(entity) {
            continue;
        }
        scene.deferred(|s| running(system)?.update_entity(entity, s, dt))?;
    }

    scene.deferred(|s| running(system)?.post_update(s))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use glam::Vec2;
    use phage_ecs::script::{NativeScript, EXIT, SCENE_LOAD, UPDATE};
    use phage_ecs::{EntityFilter, EntityId, Parent, SimpleEntityFilter};
    use phage_core::TimeConfig;

    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Probe {
        name: &'static str,
        filter: SimpleEntityFilter,
        log: Log,
    }

    impl Probe {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                filter: SimpleEntityFilter::with_tags(Vec::<String>::new(), &["moving"], false)
                    .unwrap(),
                log: log.clone(),
            }
        }
    }

    impl EntitySystem for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn update_filter(&self) -> &dyn EntityFilter {
            &self.filter
        }

        fn event_filter(&self) -> &dyn EntityFilter {
            &self.filter
        }

        fn scene_changed(&mut self, old: Option<&str>, scene: &mut Scene) -> phage_ecs::Result<()> {
            self.log.borrow_mut().push(format!(
                "{}: {} -> {}",
                self.name,
                old.unwrap_or("-"),
                scene.name()
            ));
            Ok(())
        }

        fn update(&mut self, _scene: &mut Scene, _dt: f32) -> phage_ecs::Result<()> {
            self.log.borrow_mut().push(format!("{}: update", self.name));
            Ok(())
        }

        fn update_entity(&mut self, entity: EntityId, scene: &mut Scene, dt: f32) -> phage_ecs::Result<()> {
            scene
                .entity_mut(entity)?
                .components_mut()
                .transform_mut()
                .translate(Vec2::new(dt, 0.0));
            Ok(())
        }
    }

    fn game() -> Game {
        let config = GameConfig {
            system_order: vec!["physics".to_string(), "render".to_string()],
            time: TimeConfig {
                fixed_timestep: 0.25,
                max_delta_time: 1.0,
                ..TimeConfig::default()
            },
            ..GameConfig::default()
        };
        let mut game = Game::new(config);
        game.create_scene("main").unwrap();
        game.create_scene("menu").unwrap();
        game
    }

    #[test]
    fn configured_order_wins() {
        let log: Log = Rc::default();
        let mut game = game();
        game.add_system(Probe::new("render", &log)).unwrap();
        game.add_system(Probe::new("audio", &log)).unwrap();
        game.add_system(Probe::new("physics", &log)).unwrap();
        game.start().unwrap();
        assert_eq!(game.system_names(), vec!["physics", "render", "audio"]);

        log.borrow_mut().clear();
        game.update(0.1).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["physics: update", "render: update", "audio: update"]
        );
    }

    #[test]
    fn unknown_system_in_order_fails_start() {
        let mut game = game();
        let log: Log = Rc::default();
        game.add_system(Probe::new("physics", &log)).unwrap();
        assert!(game.start().is_err());
        assert!(!game.is_running());
    }

    #[test]
    fn frames_need_a_running_game() {
        let mut game = game();
        assert!(matches!(game.update(0.1), Err(GameError::NotRunning)));
        assert!(matches!(game.advance(0.1), Err(GameError::NotRunning)));
        assert!(matches!(game.stop(), Err(GameError::NotRunning)));
    }

    #[test]
    fn systems_update_matching_entities() {
        let log: Log = Rc::default();
        let mut game = game();
        game.add_system(Probe::new("physics", &log)).unwrap();
        game.add_system(Probe::new("render", &log)).unwrap();
        let scene = game.scenes_mut().scene_mut("main").unwrap();
        let mover = scene.create_named_entity("mover", Parent::Scene).unwrap();
        scene.add_tag(mover, "moving").unwrap();
        let rock = scene.create_named_entity("rock", Parent::Scene).unwrap();

        game.start().unwrap();
        assert_eq!(game.advance(0.5).unwrap(), 2);

        let scene = game.scenes().current().unwrap();
        // two systems, two steps of 0.25
        assert!((scene.entity(mover).unwrap().transform().translation.x - 1.0).abs() < 1e-5);
        assert_eq!(scene.entity(rock).unwrap().transform().translation, Vec2::ZERO);
        assert_eq!(game.time().frame_count, 2);
    }

    #[test]
    fn scene_changes_reach_systems_and_scripts() {
        let log: Log = Rc::default();
        let mut game = game();
        game.add_system(Probe::new("physics", &log)).unwrap();
        game.add_system(Probe::new("render", &log)).unwrap();

        let loads = Rc::new(Cell::new(0));
        let counter = loads.clone();
        let menu = game.scenes_mut().scene_mut("menu").unwrap();
        let title = menu.create_named_entity("title", Parent::Scene).unwrap();
        menu.add_script(
            title,
            NativeScript::new("title")
                .with_fn(SCENE_LOAD, move |_| {
                    counter.set(counter.get() + 1);
                    Ok(None)
                })
                .into_handle(),
        )
        .unwrap();

        let main = game.scenes_mut().scene_mut("main").unwrap();
        let door = main.create_named_entity("door", Parent::Scene).unwrap();
        main.add_script(
            door,
            NativeScript::new("door")
                .with_fn(UPDATE, |call| {
                    call.scene()?.request_scene("menu");
                    Ok(None)
                })
                .into_handle(),
        )
        .unwrap();

        game.start().unwrap();
        assert_eq!(loads.get(), 0);
        game.update(0.1).unwrap();

        assert_eq!(game.scenes().current_name(), Some("menu"));
        assert!(!game.scenes().scene("main").unwrap().is_active());
        assert_eq!(loads.get(), 1);
        let changes: Vec<String> = log
            .borrow()
            .iter()
            .filter(|l| l.contains("->"))
            .cloned()
            .collect();
        assert_eq!(
            changes,
            vec![
                "physics: - -> main",
                "render: - -> main",
                "physics: main -> menu",
                "render: main -> menu",
            ]
        );
    }

    #[test]
    fn stop_runs_exit_scripts() {
        let exited = Rc::new(Cell::new(false));
        let flag = exited.clone();
        let mut game = Game::new(GameConfig::default());
        let scene = game.create_scene("main").unwrap();
        let e = scene.create_entity(Parent::Scene).unwrap();
        scene
            .add_script(
                e,
                NativeScript::new("bye")
                    .with_fn(EXIT, move |_| {
                        flag.set(true);
                        Ok(None)
                    })
                    .into_handle(),
            )
            .unwrap();
        game.start().unwrap();
        assert!(matches!(game.start(), Err(GameError::AlreadyRunning)));
        game.stop().unwrap();
        assert!(exited.get());
        assert!(!game.is_running());
    }

    #[test]
    fn failing_system_is_named() {
        struct Broken;

        impl EntitySystem for Broken {
            fn name(&self) -> &str {
                "broken"
            }

            fn update_filter(&self) -> &dyn EntityFilter {
                &phage_ecs::NoEntities
            }

            fn event_filter(&self) -> &dyn EntityFilter {
                &phage_ecs::NoEntities
            }

            fn update(&mut self, _scene: &mut Scene, _dt: f32) -> phage_ecs::Result<()> {
                Err(EcsError::state("boom"))
            }
        }

        let mut game = Game::new(GameConfig::default());
        game.create_scene("main").unwrap();
        game.add_system(Broken).unwrap();
        game.start().unwrap();
        match game.update(0.1) {
            Err(GameError::System { system, .. }) => assert_eq!(system, "broken"),
            other => panic!("expected a system error, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_scene_names_fail() {
        let mut game = game();
        assert!(matches!(
            game.create_scene("main"),
            Err(GameError::DuplicateScene(_))
        ));
        assert!(game.scenes().scene("main").unwrap().systems().is_some());
    }
}
