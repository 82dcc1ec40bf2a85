use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::engine::economics::sanitize_price;
use crate::model::game_state::GameState;
use crate::model::scene::Mood;

/// Launch prices a fresh session can start at.
pub const CURATED_LAUNCH_PRICES: [f64; 6] = [0.0042, 0.0069, 0.0100, 0.0137, 0.0420, 0.0777];

/// Opening lines shown before the first real turn. `$USERNAME` becomes the token.
const INTRO_MESSAGES: [&str; 4] = [
    "GM boss, $USERNAME is ready to deploy. LFG! 🚀",
    "$USERNAME contract deployed. Ready to rug... erm, I mean MOON! 🔥",
    "Chads and degens ready to ape, boss. $USERNAME to the moon? 💎",
    "Website's up, Discord's pumpin'. $USERNAME token locked and loaded! 👾",
];

/// Picks the launch price (and intro line) for a new session.
pub trait LaunchPriceSeed: Send {
    fn launch_price(&mut self) -> f64;

    fn intro_index(&mut self, _count: usize) -> usize {
        0
    }
}

/// Random pick from a curated price list.
pub struct CuratedLaunchPrices {
    rng: StdRng,
    prices: Vec<f64>,
}

impl CuratedLaunchPrices {
    pub fn new(prices: Vec<f64>) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            prices,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            prices: CURATED_LAUNCH_PRICES.to_vec(),
        }
    }
}

impl Default for CuratedLaunchPrices {
    fn default() -> Self {
        Self::new(CURATED_LAUNCH_PRICES.to_vec())
    }
}

impl LaunchPriceSeed for CuratedLaunchPrices {
    fn launch_price(&mut self) -> f64 {
        self.prices
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(CURATED_LAUNCH_PRICES[2])
    }

    fn intro_index(&mut self, count: usize) -> usize {
        if count == 0 {
            0
        } else {
            self.rng.gen_range(0..count)
        }
    }
}

/// Always the same price and intro. Handy for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedLaunchPrice(pub f64);

impl LaunchPriceSeed for FixedLaunchPrice {
    fn launch_price(&mut self) -> f64 {
        self.0
    }
}

/// The option that kicks the session off.
pub fn launch_option(token_name: &str) -> String {
    format!("Launch ${} token", token_name)
}

/// Builds a brand-new session. Never derived from an old state.
pub fn new_session(token_name: &str, seed: &mut dyn LaunchPriceSeed) -> GameState {
    let raw = seed.launch_price();
    let launch_price = match sanitize_price(raw) {
        p if p > 0.0 => p,
        _ => {
            log::warn!("Launch price seed produced {}, using {}", raw, CURATED_LAUNCH_PRICES[2]);
            CURATED_LAUNCH_PRICES[2]
        }
    };

    let intro = INTRO_MESSAGES[seed.intro_index(INTRO_MESSAGES.len()) % INTRO_MESSAGES.len()];

    let mut state = GameState::new(token_name, launch_price);
    state.current_message = intro.replace("$USERNAME", &format!("${}", token_name));
    state.current_options = vec![launch_option(token_name)];
    state.mood = Mood::Talk;

    log::info!("New session for ${} at launch price ${:.4}", token_name, launch_price);
    state
}
