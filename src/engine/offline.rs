use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;

use crate::engine::llm_client::NarrativeGenerator;
use crate::error::GeneratorError;
use crate::model::generation::GenerationRequest;
use crate::model::scene::Scene;

const PUMP_LINES: [&str; 4] = [
    "You did it boss, \"{}\" sent us parabolic! Degens are aping in. What's the play? 🚀",
    "\"{}\" worked! CT is calling you a genius. What now, ser?",
    "Whales loved \"{}\". Chart looks like a rocket. What's next, boss?",
    "\"{}\" went viral, Telegram is melting. What's the play? 🔥",
];

const DUMP_LINES: [&str; 4] = [
    "\"{}\" backfired, an influencer called us a scam. Chart is bleeding. What now? 💀",
    "Bro \"{}\" triggered a flash loan attack. We're down bad. What's the play?",
    "\"{}\"? The dev wallet got doxxed mid-move. Panic selling everywhere. Now what?",
    "Ser, \"{}\" got ratio'd by No Kwon. Price nuked. What's the play?",
];

const OPTIONS: [&str; 12] = [
    "Shill Harder",
    "Deploy LP",
    "Bribe SEC Anon",
    "Fake Github Hack",
    "Rug Half Funds",
    "Host Miami Yacht",
    "DM Elon Bullish",
    "Mint Bag NFTs",
    "Blame Bots",
    "Cope Harder",
    "Stake Ponzi Style",
    "FOMO Marketing Push",
];

/// Offline stand-in for a real model: rolls a random price swing and stitches
/// a message together. Seeded, so a given seed replays the same session.
pub struct OfflineGenerator {
    rng: Mutex<StdRng>,
}

impl OfflineGenerator {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl NarrativeGenerator for OfflineGenerator {
    fn generate(&self, req: &GenerationRequest) -> Result<String, GeneratorError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| GeneratorError::Transport("offline generator poisoned".into()))?;

        let options: Vec<&str> = OPTIONS.choose_multiple(&mut *rng, 3).copied().collect();

        if req.is_start {
            let payload = json!({
                "msg": format!("GM boss, ${} just went live! Bags packed. What's the play? 🚀", req.token_name),
                "price": req.launch_price,
                "scene": Scene::Office.as_str(),
                "options": options,
            });
            return Ok(payload.to_string());
        }

        let pump = rng.gen_bool(0.5);
        let factor = if pump {
            rng.gen_range(1.2..6.0)
        } else {
            rng.gen_range(0.05..0.8)
        };
        let price = req.price * factor;
        let ratio = if req.launch_price > 0.0 {
            price / req.launch_price
        } else {
            1.0
        };

        let scene = if req.turn_count >= 11 {
            if ratio >= 10.0 {
                Scene::Moon
            } else if ratio <= 0.5 {
                Scene::Void
            } else {
                Scene::Prison
            }
        } else if ratio >= 10.0 {
            Scene::Moon
        } else if ratio >= 5.0 {
            Scene::Yacht
        } else if ratio >= 1.5 {
            Scene::Club
        } else {
            Scene::Office
        };

        let action = req.free_text.as_deref().unwrap_or(&req.choice);
        let lines = if pump { &PUMP_LINES } else { &DUMP_LINES };
        let template = lines.choose(&mut *rng).copied().unwrap_or(PUMP_LINES[0]);
        let msg = template.replacen("{}", action, 1);

        let payload = json!({
            "msg": msg,
            "price": price,
            "scene": scene.as_str(),
            "options": options,
        });
        Ok(payload.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::turn_decode::decode_turn;
    use crate::model::game_state::GameState;
    use crate::model::turn_result::Repair;

    fn request(turn: u32) -> GenerationRequest {
        GenerationRequest {
            token_name: "PEPE".into(),
            price: 0.02,
            scene: Scene::Club,
            launch_price: 0.01,
            recent_prices: vec![0.01, 0.02],
            turn_count: turn,
            prior_choice: None,
            choice: "Shill Harder".into(),
            free_text: None,
            is_start: false,
        }
    }

    #[test]
    fn same_seed_same_story() {
        let a = OfflineGenerator::seeded(42);
        let b = OfflineGenerator::seeded(42);
        for turn in 1..5 {
            assert_eq!(a.generate(&request(turn)).unwrap(), b.generate(&request(turn)).unwrap());
        }
    }

    #[test]
    fn output_decodes_without_sentinel() {
        let generator = OfflineGenerator::seeded(3);
        let pre = GameState::new("PEPE", 0.01);
        for turn in 1..12 {
            let raw = generator.generate(&request(turn)).unwrap();
            let decoded = decode_turn(&raw, &pre);
            assert!(!matches!(decoded.repair, Repair::Sentinel { .. }), "{}", raw);
        }
    }

    #[test]
    fn final_turn_lands_in_an_ending_scene() {
        let generator = OfflineGenerator::seeded(9);
        let raw = generator.generate(&request(11)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let scene = value["scene"].as_str().unwrap();
        assert!(["moon", "void", "prison"].contains(&scene));
    }
}
