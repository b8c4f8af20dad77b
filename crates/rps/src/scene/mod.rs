//! Headless rock-paper-scissors scene
//!
//! Renders to a [`LineSink`] instead of a canvas. Everything the flow asks
//! for is a line of text plus, where the game has one, a sound effect.

pub mod prompt;
pub mod round_animation;
pub mod score;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gamelab_domain::GameError;
use gamelab_engine::audio::PlayOptions;
use gamelab_engine::events::{EventSurface, LocalEmitter};
use gamelab_engine::infrastructure::log_error;
use gamelab_engine::view::{AnimationHandle, Scene, SceneRegistries};
use serde_json::{Map, Value};

use crate::audio::{end_game_sound, register_game_sounds, GameSound, CLICK, FLASH};
use crate::output::LineSink;
use crate::session::PLAYER_WINS;

pub use prompt::MovePrompt;
pub use round_animation::RoundAnimation;
pub use score::{ScoreHud, Scoreboard};

pub struct RpsScene {
    surface: Rc<LocalEmitter>,
    registries: SceneRegistries,
    sink: Rc<dyn LineSink>,
    sound: Rc<RefCell<GameSound>>,
    round_animation: AnimationHandle,
    scoreboard: Scoreboard,
    scale: Cell<f64>,
}

impl RpsScene {
    pub fn new(sink: Rc<dyn LineSink>, sound: GameSound) -> Self {
        let round_animation: AnimationHandle =
            Rc::new(RefCell::new(RoundAnimation::new(Rc::clone(&sink))));
        Self {
            surface: Rc::new(LocalEmitter::new()),
            registries: SceneRegistries::new(),
            sink,
            sound: Rc::new(RefCell::new(sound)),
            round_animation,
            scoreboard: Scoreboard::new(),
            scale: Cell::new(1.0),
        }
    }

    /// Build the HUD, animations and game objects and load the sounds.
    pub fn create(&self) -> Result<(), GameError> {
        let scale = self.scale.get();
        let animation = Rc::clone(&self.round_animation);
        self.registries.with_animations(|animations| {
            animation.borrow_mut().create();
            animations.register_animation(animation);
        })?;
        self.registries.with_hud(|hud| {
            hud.add_component(Box::new(ScoreHud::new(
                Rc::clone(&self.sink),
                self.scoreboard.clone(),
            )));
            hud.create(scale);
        })?;
        self.registries.with_objects(|objects| {
            objects.add_object(Box::new(MovePrompt::new(Rc::clone(&self.sink))));
            objects.create(&[]);
        })?;

        let mut sound = self
            .sound
            .try_borrow_mut()
            .map_err(|_| GameError::initialization("sound service is busy"))?;
        register_game_sounds(&mut sound)?;
        tracing::debug!(scale, "Scene created");
        Ok(())
    }

    pub fn sound(&self) -> Rc<RefCell<GameSound>> {
        Rc::clone(&self.sound)
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn surface(&self) -> &LocalEmitter {
        &self.surface
    }

    pub fn scale(&self) -> f64 {
        self.scale.get()
    }

    pub fn write_line(&self, line: &str) {
        self.sink.write_line(line);
    }

    pub fn show_invalid_move(&self, raw: &str) {
        self.sink
            .write_line(&format!("  '{raw}' is not a move. Try rock, paper or scissors."));
    }

    fn play(&self, key: &str) {
        let outcome = match self.sound.try_borrow_mut() {
            Ok(mut sound) => sound.play(key, PlayOptions::default()).map(|_| ()),
            Err(_) => Err(GameError::audio("sound service is busy", Some(key))),
        };
        if let Err(err) = outcome {
            log_error(&err);
        }
    }

    fn refresh_hud(&self) {
        if let Err(err) = self.registries.with_hud(|hud| hud.show()) {
            log_error(&err);
        }
    }

    fn with_prompt(&self, show: bool) {
        let outcome = self.registries.with_objects(|objects| {
            if show {
                objects.show();
            } else {
                objects.hide();
            }
        });
        if let Err(err) = outcome {
            log_error(&err);
        }
    }
}

fn score_field(data: &Map<String, Value>, key: &str) -> u32 {
    data.get(key)
        .and_then(Value::as_u64)
        .and_then(|score| u32::try_from(score).ok())
        .unwrap_or(0)
}

impl Scene for RpsScene {
    fn event_surface(&self) -> Option<Rc<dyn EventSurface>> {
        let surface: Rc<dyn EventSurface> = self.surface.clone();
        Some(surface)
    }

    fn show_start_screen(&self) {
        self.sink.write_line("=== Rock Paper Scissors ===");
        self.sink.write_line("Press Enter to start, 'quit' to leave.");
    }

    fn init_hud(&self, data: &Value) {
        let empty = Map::new();
        let data = data.as_object().unwrap_or(&empty);
        self.scoreboard.set(
            score_field(data, "playerScore"),
            score_field(data, "opponentScore"),
        );
        if let Some(best_of) = data.get("bestOf").and_then(Value::as_u64) {
            self.sink.write_line(&format!(
                "Best of {best_of}: first to {} wins.",
                best_of.div_ceil(2)
            ));
        }
        self.refresh_hud();
    }

    fn show_start_game(&self, _timescale: Option<f64>) {
        self.play(CLICK);
        self.sink.write_line("Game on!");
    }

    fn show_round(&self, round_number: u32, _timescale: Option<f64>) {
        self.sink.write_line(&format!("--- Round {round_number} ---"));
        self.with_prompt(true);
    }

    fn show_round_result(&self, data: &Map<String, Value>) {
        self.with_prompt(false);
        let animation = Rc::clone(&self.round_animation);
        let args = [Value::Object(data.clone())];
        if let Err(err) = self
            .registries
            .with_animations(|animations| animations.show(&animation, &args))
        {
            log_error(&err);
        }
        self.play(FLASH);

        self.scoreboard.set(
            score_field(data, "playerScore"),
            score_field(data, "opponentScore"),
        );
        self.refresh_hud();
    }

    fn show_end_game(&self, result: &Value, _timescale: Option<f64>) {
        if let Err(err) = self.registries.with_animations(|animations| animations.reset()) {
            log_error(&err);
        }
        let text = match result {
            Value::String(text) => text.clone(),
            Value::Null => "Game over".to_string(),
            other => other.to_string(),
        };
        self.play(end_game_sound(text == PLAYER_WINS));
        self.sink.write_line(&format!("*** {text} ***"));
        self.sink.write_line("Play again? (y/n)");
    }

    fn restart_game(&self) {
        self.scoreboard.reset();
        if let Err(err) = self.registries.with_objects(|objects| objects.reset()) {
            log_error(&err);
        }
        self.sink.write_line("Restarting...");
    }

    fn on_resize(&self, scale: f64, width: u32, height: u32) {
        self.scale.set(scale);
        tracing::debug!(scale, width, height, "Scene resized");
    }

    fn teardown(&self) -> Result<(), GameError> {
        let registries = self.registries.teardown();
        match self.sound.try_borrow_mut() {
            Ok(mut sound) => sound.cleanup(),
            Err(_) => log_error(&GameError::cleanup("sound service", "service is busy")),
        }
        registries
    }
}
