use crate::model::game_state::GameState;
use crate::model::turn_result::TurnReport;

pub enum EngineCommand {
    Turn {
        choice: String,
        free_text: Option<String>,
    },

    /// Throw the session away and start a new one. `None` keeps the token name.
    Reset { token_name: Option<String> },

    Snapshot,
    Shutdown,
}

#[derive(Debug)]
pub enum EngineResponse {
    /// Generator call in flight; render this and accept no input.
    Pending(GameState),

    TurnApplied(TurnReport),

    Snapshot(GameState),
}
