use serde::{Deserialize, Serialize};

use crate::model::game_state::GameState;
use crate::model::generation::GenerationResponse;

/// What the validator had to do to a candidate payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Repair {
    /// Payload was within bounds as received.
    Clean,
    /// Well-formed payload with out-of-range fields that were corrected.
    Corrected { fixes: Vec<String> },
    /// Payload unusable; the fixed apology payload was substituted.
    Sentinel { reason: String },
}

/// Validator output: a payload that is always safe to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTurn {
    pub response: GenerationResponse,
    pub repair: Repair,
}

impl NormalizedTurn {
    pub fn is_sentinel(&self) -> bool {
        matches!(self.repair, Repair::Sentinel { .. })
    }
}

/// How a call to the turn controller was resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Generator answered and the payload was applied.
    Applied { repair: Repair },
    /// Generator failed; state carries the apology and recovery options.
    Degraded { reason: String },
    /// Input broke a caller precondition; the generator was not called.
    Rejected { reason: String },
    /// Session already over; state returned untouched.
    Ignored,
    /// Start choice on a finished session: a brand-new session replaced it.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub state: GameState,
    pub outcome: TurnOutcome,
}

impl TurnReport {
    pub fn is_applied(&self) -> bool {
        matches!(self.outcome, TurnOutcome::Applied { .. })
    }
}
