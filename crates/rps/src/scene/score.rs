//! Score HUD

use std::cell::Cell;
use std::rc::Rc;

use gamelab_engine::view::{Capability, HudComponent};

use crate::output::LineSink;

/// Scores shared between the scene and the HUD component that renders them.
#[derive(Debug, Clone, Default)]
pub struct Scoreboard {
    scores: Rc<Cell<(u32, u32)>>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, player: u32, opponent: u32) {
        self.scores.set((player, opponent));
    }

    pub fn get(&self) -> (u32, u32) {
        self.scores.get()
    }

    pub fn reset(&self) {
        self.scores.set((0, 0));
    }
}

pub struct ScoreHud {
    sink: Rc<dyn LineSink>,
    board: Scoreboard,
    visible: bool,
}

impl ScoreHud {
    pub fn new(sink: Rc<dyn LineSink>, board: Scoreboard) -> Self {
        Self {
            sink,
            board,
            visible: false,
        }
    }
}

impl HudComponent for ScoreHud {
    fn name(&self) -> &str {
        "score"
    }

    fn supports(&self, capability: Capability) -> bool {
        matches!(
            capability,
            Capability::Create | Capability::Show | Capability::Hide
        )
    }

    fn create(&mut self, _scale: f64) {
        self.visible = false;
    }

    /// Render the current scores. Showing again re-renders.
    fn show(&mut self) {
        self.visible = true;
        let (player, opponent) = self.board.get();
        self.sink
            .write_line(&format!("  Score  You {player} : {opponent} Opponent"));
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Transcript;

    #[test]
    fn test_show_renders_shared_scores() {
        let transcript = Transcript::new();
        let board = Scoreboard::new();
        let mut hud = ScoreHud::new(Rc::new(transcript.clone()), board.clone());
        hud.create(1.0);

        board.set(2, 1);
        hud.show();

        assert_eq!(transcript.lines(), vec!["  Score  You 2 : 1 Opponent"]);
    }

    #[test]
    fn test_destroy_is_not_supported() {
        let hud = ScoreHud::new(Rc::new(Transcript::new()), Scoreboard::new());
        assert!(!hud.supports(Capability::Destroy));
    }
}
