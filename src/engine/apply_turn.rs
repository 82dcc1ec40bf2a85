use crate::engine::economics::{apply_price, sanitize_price};
use crate::engine::launch::{launch_option, new_session, CuratedLaunchPrices, LaunchPriceSeed};
use crate::engine::llm_client::NarrativeGenerator;
use crate::engine::termination::TerminationPolicy;
use crate::engine::turn_decode::decode_turn;
use crate::error::TurnInputError;
use crate::model::game_state::{GameState, PriceHistory};
use crate::model::generation::{GenerationRequest, CONTEXT_HISTORY_POINTS};
use crate::model::scene::Mood;
use crate::model::turn_result::{TurnOutcome, TurnReport};

/// Pseudo-choice that opens a session (and resets a finished one).
pub const START_CHOICE: &str = "GAME_START";

pub const MAX_FREE_TEXT_CHARS: usize = 140;

pub const TRANSPORT_APOLOGY: &str = "Reply Guy is napping... 😴 Try again in a bit.";
pub const TRANSPORT_RECOVERY_OPTIONS: [&str; 2] = ["Retry", "Try different move"];

const TOO_LONG_MESSAGE: &str = "Too many words, boss. Keep it under 140 chars. 🤐";
const EMPTY_CHOICE_MESSAGE: &str = "Say something, boss. 🤐";

/// `GAME_START` itself, or the "Launch $X token" option from the intro screen.
pub fn is_start_choice(choice: &str, token_name: &str) -> bool {
    choice == START_CHOICE || choice == launch_option(token_name)
}

/// True until the first turn has landed on the chart. Only then does the
/// start choice open the session; later it is an ordinary move.
pub fn awaiting_launch(state: &GameState) -> bool {
    state.turn_count == 0 && state.price_history.len() <= 1
}

/// Preconditions the caller is expected to enforce before a turn.
pub fn validate_turn_input(choice: &str, free_text: Option<&str>) -> Result<(), TurnInputError> {
    if choice.trim().is_empty() {
        return Err(TurnInputError::EmptyChoice);
    }
    if let Some(text) = free_text {
        let len = text.chars().count();
        if len > MAX_FREE_TEXT_CHARS {
            return Err(TurnInputError::FreeTextTooLong {
                len,
                max: MAX_FREE_TEXT_CHARS,
            });
        }
    }
    Ok(())
}

/// What the front-end shows while the generator is working: no message,
/// no options, idle sprite. Withholding options is what keeps a second turn
/// from being submitted.
pub fn pending_view(state: &GameState) -> GameState {
    let mut pending = state.clone();
    pending.current_message.clear();
    pending.current_options.clear();
    pending.mood = Mood::Idle;
    pending
}

/// Runs one turn: context, generator call, validation, economics, termination.
pub struct TurnController<G> {
    generator: G,
    policy: TerminationPolicy,
    seed: Box<dyn LaunchPriceSeed>,
}

impl<G: NarrativeGenerator> TurnController<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            policy: TerminationPolicy::default(),
            seed: Box::new(CuratedLaunchPrices::default()),
        }
    }

    pub fn with_policy(mut self, policy: TerminationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: impl LaunchPriceSeed + 'static) -> Self {
        self.seed = Box::new(seed);
        self
    }

    pub fn policy(&self) -> &TerminationPolicy {
        &self.policy
    }

    /// A brand-new session with a freshly seeded launch price.
    pub fn new_session(&mut self, token_name: &str) -> GameState {
        new_session(token_name, self.seed.as_mut())
    }

    /// Brings a snapshot from outside the engine back within bounds: prices
    /// rounded and floored at zero, and an active session that should already
    /// be over (past the cap, zero price, terminal scene) concluded.
    pub fn admit_snapshot(&self, mut state: GameState) -> GameState {
        state.price = sanitize_price(state.price);
        state.launch_price = sanitize_price(state.launch_price);
        let points: Vec<f64> = state.price_history.iter().map(|p| sanitize_price(*p)).collect();
        state.price_history = PriceHistory::from(points);
        if state.price_history.is_empty() {
            state.price_history.push(state.price);
        }

        if !state.game_over {
            if let Some(ending) = self.policy.evaluate(
                state.current_scene,
                state.price,
                state.baseline_price(),
                state.turn_count,
            ) {
                log::warn!(
                    "Snapshot for ${} was still active on turn {}, concluding it",
                    state.token_name,
                    state.turn_count
                );
                self.policy.conclude(&mut state, &ending);
            }
        }
        state
    }

    /// Advances `state` by one turn. Never panics and never returns an error:
    /// every failure ends up as a renderable state in the report.
    pub fn apply_turn(&mut self, state: &GameState, choice: &str, free_text: Option<&str>) -> TurnReport {
        let start_choice = is_start_choice(choice, &state.token_name);

        if state.game_over {
            if !start_choice {
                log::debug!("Ignoring {:?}: session is over", choice);
                return TurnReport {
                    state: state.clone(),
                    outcome: TurnOutcome::Ignored,
                };
            }
            return TurnReport {
                state: self.new_session(&state.token_name),
                outcome: TurnOutcome::Reset,
            };
        }

        if let Err(e) = validate_turn_input(choice, free_text) {
            log::warn!("Rejected turn input: {}", e);
            let mut rejected = state.clone();
            rejected.current_message = match e {
                TurnInputError::EmptyChoice => EMPTY_CHOICE_MESSAGE,
                TurnInputError::FreeTextTooLong { .. } => TOO_LONG_MESSAGE,
            }
            .to_string();
            rejected.mood = Mood::Panic;
            return TurnReport {
                state: rejected,
                outcome: TurnOutcome::Rejected {
                    reason: e.to_string(),
                },
            };
        }

        let is_start = start_choice && awaiting_launch(state);
        let turn_count = if is_start {
            state.turn_count
        } else {
            state.turn_count.saturating_add(1)
        };
        let req = build_request(state, choice, free_text, turn_count, is_start);

        let raw = match self.generator.generate(&req) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Generator failed on turn {}: {}", turn_count, e);
                return TurnReport {
                    state: degraded(state, is_start),
                    outcome: TurnOutcome::Degraded {
                        reason: e.to_string(),
                    },
                };
            }
        };

        let normalized = decode_turn(&raw, state);
        let response = &normalized.response;

        let mut next = state.clone();
        next.turn_count = turn_count;
        apply_price(&mut next, response.price);
        next.current_scene = response.scene;
        next.current_message = personalize(&response.msg, &state.token_name);
        next.current_options = response.options.clone();
        next.mood = if normalized.is_sentinel() {
            Mood::Panic
        } else {
            Mood::Talk
        };
        next.last_choice = if is_start { None } else { Some(choice.to_string()) };

        if let Some(ending) = self.policy.evaluate(
            next.current_scene,
            next.price,
            next.baseline_price(),
            next.turn_count,
        ) {
            self.policy.conclude(&mut next, &ending);
        }

        log::info!(
            "Turn {} applied: {:?} -> ${:.4} in {}",
            next.turn_count,
            choice,
            next.price,
            next.current_scene
        );

        TurnReport {
            state: next,
            outcome: TurnOutcome::Applied {
                repair: normalized.repair,
            },
        }
    }
}

fn build_request(
    state: &GameState,
    choice: &str,
    free_text: Option<&str>,
    turn_count: u32,
    is_start: bool,
) -> GenerationRequest {
    GenerationRequest {
        token_name: state.token_name.clone(),
        price: state.price,
        scene: state.current_scene,
        launch_price: state.baseline_price(),
        recent_prices: state.price_history.last_n(CONTEXT_HISTORY_POINTS),
        turn_count,
        prior_choice: state.last_choice.clone(),
        choice: if is_start {
            START_CHOICE.to_string()
        } else {
            choice.to_string()
        },
        free_text: free_text.map(str::to_string),
        is_start,
    }
}

/// Pre-turn state with an apology. Price, scene, turn count and end message
/// are left exactly as they were. A failed launch keeps the launch option so
/// the retry is still the start turn.
fn degraded(state: &GameState, is_start: bool) -> GameState {
    let mut next = state.clone();
    next.current_message = TRANSPORT_APOLOGY.to_string();
    next.current_options = if is_start {
        vec![launch_option(&state.token_name)]
    } else {
        TRANSPORT_RECOVERY_OPTIONS.iter().map(|o| o.to_string()).collect()
    };
    next.mood = Mood::Panic;
    next
}

fn personalize(msg: &str, token_name: &str) -> String {
    let tag = format!("${}", token_name);
    msg.replace("$USERNAME", &tag).replace("$TOKEN", &tag)
}
