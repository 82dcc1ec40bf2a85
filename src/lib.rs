//! Turn engine for a memecoin launch story: a player picks a move, an
//! untrusted narrative generator proposes the next beat, and the engine
//! validates it, moves the price and decides when the run is over.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;

pub use engine::apply_turn::{TurnController, START_CHOICE};
pub use engine::llm_client::NarrativeGenerator;
pub use model::game_state::GameState;
pub use model::scene::{Mood, Scene};
pub use model::turn_result::{TurnOutcome, TurnReport};
