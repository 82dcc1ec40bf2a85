use serde::{Deserialize, Serialize};

use crate::model::scene::Scene;

/// Number of chart points handed to the generator.
pub const CONTEXT_HISTORY_POINTS: usize = 5;

/// Context handed to the narrative generator for one turn.
/// Built from the pre-turn state; the generator never sees the state itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub token_name: String,
    pub price: f64,
    pub scene: Scene,
    pub launch_price: f64,
    pub recent_prices: Vec<f64>,

    /// The turn number the generator is producing content for.
    pub turn_count: u32,

    pub prior_choice: Option<String>,
    pub choice: String,
    pub free_text: Option<String>,

    /// True for the start pseudo-choice that opens a session.
    pub is_start: bool,
}

impl GenerationRequest {
    pub fn recent_prices_formatted(&self) -> String {
        self.recent_prices
            .iter()
            .map(|p| format!("{:.4}", p))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A candidate turn after validation. Every field is within bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub msg: String,
    pub price: f64,
    pub scene: Scene,
    pub options: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_prices_use_four_decimals() {
        let req = GenerationRequest {
            token_name: "PEPE".into(),
            price: 0.02,
            scene: Scene::Club,
            launch_price: 0.01,
            recent_prices: vec![0.01, 0.015, 0.02],
            turn_count: 2,
            prior_choice: None,
            choice: "Shill Harder".into(),
            free_text: None,
            is_start: false,
        };
        assert_eq!(req.recent_prices_formatted(), "0.0100, 0.0150, 0.0200");
    }
}
