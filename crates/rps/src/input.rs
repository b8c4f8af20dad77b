//! Maps terminal input onto game events for the current phase.

use gamelab_domain::{GameError, GameEvent, Phase};
use gamelab_engine::host::GameHost;
use serde_json::json;

use crate::factory::RpsFactory;
use crate::hooks::PLAYER_MOVE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Continue,
    Quit,
}

/// Act on one line of input.
pub fn handle_input(host: &GameHost<RpsFactory>, line: &str) -> Result<InputOutcome, GameError> {
    let command = line.trim().to_ascii_lowercase();
    match command.as_str() {
        "quit" | "q" | "exit" => return Ok(InputOutcome::Quit),
        "sound" | "music" => {
            toggle(host, &command)?;
            return Ok(InputOutcome::Continue);
        }
        _ => {}
    }

    let Some(flow) = host.flow() else {
        return Err(GameError::state("game has not finished setup", None));
    };
    let phase = flow.current_phase()?;
    match phase {
        Phase::Init => host.emit(GameEvent::GameStarted.kind().as_str(), &[])?,
        Phase::Round => host.emit(PLAYER_MOVE, &[json!(command)])?,
        Phase::End => match command.as_str() {
            "y" | "yes" | "" => host.emit(GameEvent::GameRestarted.kind().as_str(), &[])?,
            "n" | "no" => return Ok(InputOutcome::Quit),
            _ => flow.hooks().scene().write_line("Play again? (y/n)"),
        },
        other => tracing::debug!(phase = %other, input = %command, "Input ignored in this phase"),
    }
    Ok(InputOutcome::Continue)
}

fn toggle(host: &GameHost<RpsFactory>, which: &str) -> Result<(), GameError> {
    let Some(scene) = host.scene() else {
        return Err(GameError::state("game has not finished setup", None));
    };
    let sound = scene.sound();
    let mut sound = sound
        .try_borrow_mut()
        .map_err(|_| GameError::audio("sound service is busy", None))?;
    let enabled = if which == "music" {
        sound.toggle_music()?
    } else {
        sound.toggle_sound()?
    };
    let state = if enabled { "on" } else { "off" };
    scene.write_line(&format!("  {which} {state}"));
    Ok(())
}

