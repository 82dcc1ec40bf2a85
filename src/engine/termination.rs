use serde::{Deserialize, Serialize};

pub use crate::model::game_state::EndingCause;
use crate::model::game_state::GameState;
use crate::model::scene::{Mood, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Ended,
}

impl SessionStatus {
    pub fn of(state: &GameState) -> Self {
        if state.game_over {
            SessionStatus::Ended
        } else {
            SessionStatus::Active
        }
    }
}

/// Decision that a session is over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ending {
    pub cause: EndingCause,

    /// Scene the session ends in.
    pub scene: Scene,

    /// True when the turn cap overrode the generator's own scene choice.
    pub forced: bool,
}

/// Deterministic backstop deciding when a session is over, independent of
/// whatever the generator thinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationPolicy {
    /// Turn at which an ending is forced.
    pub turn_cap: u32,

    /// A moon scene ends the game once price reaches this multiple of launch.
    pub moon_multiple: f64,

    /// Forced endings at or above this multiple of launch go to the moon.
    pub forced_moon_multiple: f64,

    /// Forced endings at or below this multiple of launch go to the void.
    pub forced_void_multiple: f64,
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self {
            turn_cap: 12,
            moon_multiple: 10.0,
            forced_moon_multiple: 10.0,
            forced_void_multiple: 0.5,
        }
    }
}

impl TerminationPolicy {
    /// Checks the rules in priority order, first match wins.
    /// `None` means the session stays active.
    pub fn evaluate(&self, scene: Scene, price: f64, launch_price: f64, turn_count: u32) -> Option<Ending> {
        let at_cap = turn_count >= self.turn_cap;

        if scene == Scene::Void || price <= 0.0 {
            return Some(Ending {
                cause: EndingCause::Annihilation,
                scene,
                forced: false,
            });
        }

        if scene == Scene::Prison {
            return Some(Ending {
                cause: EndingCause::Legal,
                scene,
                forced: false,
            });
        }

        if scene == Scene::Moon && (price >= launch_price * self.moon_multiple || at_cap) {
            return Some(Ending {
                cause: EndingCause::Moon,
                scene,
                forced: false,
            });
        }

        if !at_cap {
            return None;
        }

        let (cause, scene) = if price >= launch_price * self.forced_moon_multiple {
            (EndingCause::Moon, Scene::Moon)
        } else if price <= launch_price * self.forced_void_multiple {
            (EndingCause::Annihilation, Scene::Void)
        } else {
            (EndingCause::Legal, Scene::Prison)
        };

        Some(Ending {
            cause,
            scene,
            forced: true,
        })
    }

    /// Freezes `state` into its final form. After this the controller never
    /// touches price, scene, turn count or end message again.
    pub fn conclude(&self, state: &mut GameState, ending: &Ending) {
        let token = &state.token_name;
        let turns = state.turn_count;

        let (message, option) = if ending.forced {
            match ending.cause {
                EndingCause::Moon => (
                    format!("After an epic {turns}-turn run, ${token} moons! The degens made you their king! 🚀"),
                    "Cash Out",
                ),
                EndingCause::Annihilation => (
                    format!("After {turns} wild turns, ${token} crashed and burned. Total annihilation! 💀"),
                    "Try Again?",
                ),
                EndingCause::Legal => (
                    format!("Turn {turns}: SEC kicks down the door! Your {turns}-turn ${token} journey ends in cuffs. 🚔"),
                    "Serve Time",
                ),
            }
        } else {
            let fallback = match ending.cause {
                EndingCause::Annihilation => "Total annihilation. Bravo. 💀".to_string(),
                EndingCause::Legal => "Orange looks good on you 😂 SEC says hi.".to_string(),
                EndingCause::Moon => format!("${token} hit the stratosphere! You're rich, anon! 🌕"),
            };
            let message = if state.current_message.trim().is_empty() {
                fallback
            } else {
                state.current_message.clone()
            };
            let option = match ending.cause {
                EndingCause::Annihilation => "Play Again?",
                EndingCause::Legal => "Restart Simulation",
                EndingCause::Moon => "Cash Out",
            };
            (message, option)
        };

        log::info!(
            "Session for ${} ended on turn {}: {:?} in {} (forced: {})",
            state.token_name,
            turns,
            ending.cause,
            ending.scene,
            ending.forced
        );

        state.game_over = true;
        state.current_scene = ending.scene;
        state.end_message = message;
        state.ending = Some(ending.cause);
        state.current_options = vec![option.to_string()];
        state.mood = match ending.cause {
            EndingCause::Moon => Mood::Talk,
            EndingCause::Annihilation | EndingCause::Legal => Mood::Panic,
        };
    }
}
