//! Card reveal for a resolved round.

use std::rc::Rc;

use gamelab_domain::GameError;
use gamelab_engine::view::{Capability, GameAnimation};
use serde_json::Value;

use crate::moves::Winner;
use crate::output::LineSink;
use crate::session::RoundOutcome;

pub struct RoundAnimation {
    sink: Rc<dyn LineSink>,
    created: bool,
    visible: bool,
}

impl RoundAnimation {
    pub fn new(sink: Rc<dyn LineSink>) -> Self {
        Self {
            sink,
            created: false,
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl GameAnimation for RoundAnimation {
    fn create(&mut self) {
        self.created = true;
        self.visible = false;
    }

    /// Expects the round outcome as its first argument.
    fn show(&mut self, args: &[Value]) {
        if !self.created {
            tracing::warn!("Round animation shown before create");
            return;
        }
        self.visible = true;

        let Some(outcome) = args
            .first()
            .and_then(|value| serde_json::from_value::<RoundOutcome>(value.clone()).ok())
        else {
            tracing::debug!("Round animation shown without a round outcome");
            return;
        };

        self.sink.write_line(&format!(
            "  You: {:<8}  vs  Opponent: {}",
            outcome.player_move.as_str(),
            outcome.opponent_move
        ));
        let verdict = match outcome.round_winner {
            Winner::Player => "you take the round",
            Winner::Opponent => "the opponent takes the round",
            Winner::Tie => "a tie, play it again",
        };
        self.sink
            .write_line(&format!("  Round {}: {verdict}", outcome.round_number));
    }

    fn reset(&mut self) {
        self.visible = false;
    }

    fn supports(&self, capability: Capability) -> bool {
        matches!(
            capability,
            Capability::Create | Capability::Show | Capability::Reset | Capability::Destroy
        )
    }

    fn destroy(&mut self) -> Result<(), GameError> {
        self.created = false;
        self.visible = false;
        Ok(())
    }
}
