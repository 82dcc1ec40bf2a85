pub mod game_state;
pub mod generation;
pub mod scene;
pub mod turn_result;
