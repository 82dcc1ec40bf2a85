use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::apply_turn::TurnController;
use crate::engine::llm_client::NarrativeGenerator;
use crate::model::game_state::GameState;
use crate::model::scene::{Mood, Scene};
use crate::model::turn_result::TurnOutcome;

const SERVER_APOLOGY: &str = "Server took an L, boss. Try again? 🔩";
const SERVER_RECOVERY_OPTIONS: [&str; 2] = ["Retry", "Refresh Page"];

/// Body of a turn request from a client that keeps the state itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub choice: String,
    #[serde(default)]
    pub free_text: Option<String>,
    pub state: GameState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Ok,
    Degraded,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub status: TurnStatus,
    pub state: GameState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Client snapshots are untrusted, so they go through `admit_snapshot` before
/// the controller sees them.
pub fn handle_turn_request<G: NarrativeGenerator>(
    controller: &mut TurnController<G>,
    req: TurnRequest,
) -> TurnResponse {
    let state = controller.admit_snapshot(req.state);
    let report = controller.apply_turn(&state, &req.choice, req.free_text.as_deref());

    let (status, error) = match report.outcome {
        TurnOutcome::Applied { .. } | TurnOutcome::Ignored | TurnOutcome::Reset => (TurnStatus::Ok, None),
        TurnOutcome::Degraded { reason } => (TurnStatus::Degraded, Some(reason)),
        TurnOutcome::Rejected { reason } => (TurnStatus::Rejected, Some(reason)),
    };

    TurnResponse {
        status,
        state: report.state,
        error,
    }
}

/// Raw-body variant. Whatever arrives, the caller gets a renderable state:
/// if the body is unusable, the last known price and scene are dug out of it
/// where possible.
pub fn handle_turn_json<G: NarrativeGenerator>(controller: &mut TurnController<G>, body: &str) -> TurnResponse {
    match serde_json::from_str::<TurnRequest>(body) {
        Ok(req) => handle_turn_request(controller, req),
        Err(e) => {
            log::error!("Unusable turn request: {}", e);
            TurnResponse {
                status: TurnStatus::Rejected,
                state: salvage_state(body),
                error: Some(format!("Missing current state or player choice: {}", e)),
            }
        }
    }
}

fn salvage_state(body: &str) -> GameState {
    let value: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let state = &value["state"];

    let price = state["price"]
        .as_f64()
        .filter(|p| p.is_finite() && *p >= 0.0)
        .unwrap_or(0.0);
    let scene = state["currentScene"]
        .as_str()
        .and_then(Scene::parse)
        .unwrap_or(Scene::Office);
    let token_name = state["tokenName"].as_str().unwrap_or("TOKEN");

    let mut salvaged = GameState::new(token_name, price);
    if let Some(launch) = state["launchPrice"].as_f64().filter(|p| p.is_finite() && *p > 0.0) {
        salvaged.launch_price = launch;
    }
    salvaged.current_scene = scene;
    salvaged.current_message = SERVER_APOLOGY.to_string();
    salvaged.current_options = SERVER_RECOVERY_OPTIONS.iter().map(|o| o.to_string()).collect();
    salvaged.mood = Mood::Panic;
    salvaged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::launch::FixedLaunchPrice;
    use crate::engine::offline::OfflineGenerator;
    use crate::error::GeneratorError;
    use crate::model::game_state::EndingCause;
    use crate::model::generation::GenerationRequest;

    struct Unreachable;

    impl NarrativeGenerator for Unreachable {
        fn generate(&self, _req: &GenerationRequest) -> Result<String, GeneratorError> {
            Err(GeneratorError::Timeout)
        }
    }

    fn stalled_controller() -> TurnController<Unreachable> {
        TurnController::new(Unreachable).with_seed(FixedLaunchPrice(0.01))
    }

    fn controller() -> TurnController<OfflineGenerator> {
        TurnController::new(OfflineGenerator::seeded(11)).with_seed(FixedLaunchPrice(0.01))
    }

    #[test]
    fn json_round_trip_through_handler() {
        let mut c = controller();
        let state = c.new_session("PEPE");
        let body = serde_json::json!({
            "choice": "GAME_START",
            "state": state,
        })
        .to_string();

        let resp = handle_turn_json(&mut c, &body);
        assert_eq!(resp.status, TurnStatus::Ok);
        assert!(resp.error.is_none());
        assert_eq!(resp.state.turn_count, 0);
    }

    #[test]
    fn oversized_free_text_is_rejected() {
        let mut c = controller();
        let state = c.new_session("PEPE");
        let resp = handle_turn_request(
            &mut c,
            TurnRequest {
                choice: "Write your own".into(),
                free_text: Some("x".repeat(200)),
                state: state.clone(),
            },
        );
        assert_eq!(resp.status, TurnStatus::Rejected);
        assert_eq!(resp.state.price, state.price);
        assert_eq!(resp.state.turn_count, 0);
    }

    #[test]
    fn broken_body_salvages_price_and_scene() {
        let mut c = controller();
        let body = r#"{"state":{"price":0.4242,"currentScene":"yacht","tokenName":"PEPE"}}"#;
        let resp = handle_turn_json(&mut c, body);
        assert_eq!(resp.status, TurnStatus::Rejected);
        assert_eq!(resp.state.price, 0.4242);
        assert_eq!(resp.state.current_scene, Scene::Yacht);
        assert_eq!(resp.state.current_options, vec!["Retry", "Refresh Page"]);

        let resp = handle_turn_json(&mut c, "not even json");
        assert_eq!(resp.state.price, 0.0);
        assert_eq!(resp.state.current_scene, Scene::Office);
    }

    #[test]
    fn negative_snapshot_price_is_floored_and_overdue_session_ends() {
        let mut c = stalled_controller();
        let mut state = GameState::new("PEPE", 0.01);
        state.price = -3.0;
        state.turn_count = 14;

        let resp = handle_turn_request(
            &mut c,
            TurnRequest {
                choice: "Shill Harder".into(),
                free_text: None,
                state,
            },
        );
        assert_eq!(resp.status, TurnStatus::Ok);
        assert_eq!(resp.state.price, 0.0);
        assert_eq!(resp.state.turn_count, 14);
        assert!(resp.state.game_over);
        assert_eq!(resp.state.ending, Some(EndingCause::Annihilation));
    }

    #[test]
    fn snapshot_past_the_cap_is_concluded_before_the_turn() {
        let mut c = stalled_controller();
        let mut state = GameState::new("PEPE", 0.01);
        state.price = 0.05;
        state.turn_count = 12;
        state.current_scene = Scene::Club;

        let resp = handle_turn_request(
            &mut c,
            TurnRequest {
                choice: "Rug Now".into(),
                free_text: None,
                state,
            },
        );
        assert!(resp.state.game_over);
        assert_eq!(resp.state.current_scene, Scene::Prison);
        assert_eq!(resp.state.ending, Some(EndingCause::Legal));
        assert_eq!(resp.state.current_options, vec!["Serve Time"]);
    }

    #[test]
    fn max_turn_count_snapshot_does_not_panic() {
        let mut c = stalled_controller();
        let mut state = serde_json::to_value(GameState::new("PEPE", 0.01)).unwrap();
        state["turnCount"] = serde_json::json!(u32::MAX);
        state["gameOver"] = serde_json::json!(false);
        let body = serde_json::json!({ "choice": "Shill Harder", "state": state }).to_string();

        let resp = handle_turn_json(&mut c, &body);
        assert_eq!(resp.status, TurnStatus::Ok);
        assert_eq!(resp.state.turn_count, u32::MAX);
        assert!(resp.state.game_over);
    }

    #[test]
    fn clean_snapshot_is_admitted_unchanged() {
        let c = controller();
        let mut state = GameState::new("PEPE", 0.0137);
        state.turn_count = 3;
        state.price = 0.0421;
        state.current_scene = Scene::Yacht;
        assert_eq!(c.admit_snapshot(state.clone()), state);
    }
}
