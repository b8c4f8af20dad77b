//! Move prompt shown while a round waits for the player.

use std::rc::Rc;

use gamelab_engine::view::{Capability, GameObject};
use serde_json::Value;

use crate::output::LineSink;

pub struct MovePrompt {
    sink: Rc<dyn LineSink>,
    text: String,
    visible: bool,
}

impl MovePrompt {
    pub fn new(sink: Rc<dyn LineSink>) -> Self {
        Self {
            sink,
            text: String::new(),
            visible: false,
        }
    }
}

impl GameObject for MovePrompt {
    fn name(&self) -> &str {
        "move-prompt"
    }

    fn supports(&self, capability: Capability) -> bool {
        matches!(
            capability,
            Capability::Create | Capability::Show | Capability::Hide | Capability::Reset
        )
    }

    /// An optional string argument overrides the prompt text.
    fn create(&mut self, args: &[Value]) {
        self.text = args
            .first()
            .and_then(Value::as_str)
            .unwrap_or("Your move: [r]ock, [p]aper or [s]cissors")
            .to_string();
    }

    fn show(&mut self) {
        if self.visible {
            return;
        }
        self.visible = true;
        self.sink.write_line(&format!("  {}", self.text));
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn reset(&mut self) {
        self.visible = false;
    }
}
