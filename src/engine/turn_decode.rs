use serde_json::{Map, Value};

use crate::engine::economics::sanitize_price;
use crate::model::game_state::GameState;
use crate::model::generation::GenerationResponse;
use crate::model::scene::Scene;
use crate::model::turn_result::{NormalizedTurn, Repair};

pub const MAX_MSG_CHARS: usize = 120;
pub const MAX_OPTION_CHARS: usize = 25;
pub const MAX_OPTIONS: usize = 3;

/// Message used whenever the payload could not be understood at all.
pub const SENTINEL_MESSAGE: &str = "AI is confused, boss. Try again? 😵‍💫";

/// Options installed alongside the sentinel message.
pub const RECOVERY_OPTIONS: [&str; 2] = ["Retry", "Ask for help"];

/// Stand-in for an empty `msg`.
pub const PLACEHOLDER_MESSAGE: &str = "Reply Guy is speechless, boss. What's the play?";

/// Options synthesized when none of the proposed ones survive.
pub const DEFAULT_OPTIONS: [&str; 2] = ["Shill Harder", "Touch Grass"];

/// Decode raw generator text into a payload that is safe to apply.
///
/// Never fails: anything that is not an object with the four required
/// fields of the right type becomes the sentinel payload built from `pre`.
/// Repairs are deterministic, the same input always yields the same output.
pub fn decode_turn(raw: &str, pre: &GameState) -> NormalizedTurn {
    let body = strip_code_fence(raw);

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Generator output is not JSON ({}): {:?}", e, raw);
            return sentinel(pre, format!("invalid JSON: {}", e));
        }
    };

    let Value::Object(fields) = value else {
        log::warn!("Generator output is not a JSON object: {:?}", raw);
        return sentinel(pre, "payload must be a JSON object".to_string());
    };

    match normalize_fields(&fields, pre) {
        Ok(turn) => turn,
        Err(reason) => {
            log::warn!("Generator payload rejected: {}", reason);
            sentinel(pre, reason)
        }
    }
}

/// The fixed apology payload. Price and scene stay where they were.
pub fn sentinel(pre: &GameState, reason: String) -> NormalizedTurn {
    NormalizedTurn {
        response: GenerationResponse {
            msg: SENTINEL_MESSAGE.to_string(),
            price: pre.price,
            scene: pre.current_scene,
            options: RECOVERY_OPTIONS.iter().map(|o| o.to_string()).collect(),
        },
        repair: Repair::Sentinel { reason },
    }
}

fn normalize_fields(fields: &Map<String, Value>, pre: &GameState) -> Result<NormalizedTurn, String> {
    let raw_msg = fields
        .get("msg")
        .and_then(Value::as_str)
        .ok_or("missing or non-string `msg`")?;
    let raw_price = fields
        .get("price")
        .and_then(coerce_price)
        .ok_or("missing or non-numeric `price`")?;
    let raw_scene = fields
        .get("scene")
        .and_then(Value::as_str)
        .ok_or("missing or non-string `scene`")?;
    let raw_options = fields
        .get("options")
        .and_then(Value::as_array)
        .ok_or("missing or non-array `options`")?;

    let mut fixes = Vec::new();

    let msg = normalize_msg(raw_msg, &mut fixes);

    let price = sanitize_price(raw_price);
    if raw_price < 0.0 {
        fixes.push(format!("price {} clamped to 0", raw_price));
    }

    let scene = match Scene::parse(raw_scene) {
        Some(scene) => scene,
        None => {
            fixes.push(format!(
                "unknown scene {:?}, kept {}",
                raw_scene, pre.current_scene
            ));
            pre.current_scene
        }
    };

    let options = normalize_options(raw_options, &mut fixes);

    let repair = if fixes.is_empty() {
        Repair::Clean
    } else {
        log::warn!("Corrected generator payload: {}", fixes.join("; "));
        Repair::Corrected { fixes }
    };

    Ok(NormalizedTurn {
        response: GenerationResponse {
            msg,
            price,
            scene,
            options,
        },
        repair,
    })
}

fn coerce_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    price.is_finite().then_some(price)
}

fn normalize_msg(raw: &str, fixes: &mut Vec<String>) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        fixes.push("empty msg replaced".to_string());
        return PLACEHOLDER_MESSAGE.to_string();
    }
    if trimmed.chars().count() > MAX_MSG_CHARS {
        fixes.push(format!("msg truncated to {} chars", MAX_MSG_CHARS));
    }
    truncate_chars(trimmed, MAX_MSG_CHARS)
}

fn normalize_options(raw: &[Value], fixes: &mut Vec<String>) -> Vec<String> {
    let usable: Vec<&str> = raw
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .collect();

    if usable.len() != raw.len() {
        fixes.push(format!("dropped {} empty or non-string options", raw.len() - usable.len()));
    }
    if usable.len() > MAX_OPTIONS {
        fixes.push(format!("kept first {} of {} options", MAX_OPTIONS, usable.len()));
    }

    let options: Vec<String> = usable
        .into_iter()
        .take(MAX_OPTIONS)
        .map(|o| truncate_chars(o, MAX_OPTION_CHARS))
        .collect();

    if options.is_empty() {
        fixes.push("no usable options, installed defaults".to_string());
        return DEFAULT_OPTIONS.iter().map(|o| o.to_string()).collect();
    }
    options
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Models like to wrap JSON in a ```json fence. Peel it off if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pre() -> GameState {
        let mut state = GameState::new("PEPE", 0.01);
        state.current_scene = Scene::Club;
        state.price = 0.05;
        state
    }

    #[test]
    fn clean_payload_passes_through() {
        let raw = r#"{"msg":"We pumped!","price":0.0234,"scene":"yacht","options":["Buy Yacht","Rug Now"]}"#;
        let turn = decode_turn(raw, &pre());
        assert_eq!(turn.repair, Repair::Clean);
        assert_eq!(turn.response.price, 0.0234);
        assert_eq!(turn.response.scene, Scene::Yacht);
        assert_eq!(turn.response.options, vec!["Buy Yacht", "Rug Now"]);
    }

    #[test]
    fn non_json_becomes_sentinel_with_pre_turn_values() {
        let turn = decode_turn("Sure! Here's your next turn, boss.", &pre());
        assert!(turn.is_sentinel());
        assert_eq!(turn.response.msg, SENTINEL_MESSAGE);
        assert_eq!(turn.response.price, 0.05);
        assert_eq!(turn.response.scene, Scene::Club);
        assert_eq!(turn.response.options, vec!["Retry", "Ask for help"]);
    }

    #[test]
    fn mistyped_required_field_becomes_sentinel() {
        let cases = [
            r#"{"price":1,"scene":"club","options":["A"]}"#,
            r#"{"msg":"hi","price":true,"scene":"club","options":["A"]}"#,
            r#"{"msg":"hi","price":1,"scene":7,"options":["A"]}"#,
            r#"{"msg":"hi","price":1,"scene":"club","options":"A"}"#,
            r#"[1,2,3]"#,
        ];
        for raw in cases {
            assert!(decode_turn(raw, &pre()).is_sentinel(), "{}", raw);
        }
    }

    #[test]
    fn negative_price_clamps_to_zero_and_rounds() {
        let raw = r#"{"msg":"rekt","price":-5,"scene":"club","options":["Cope"]}"#;
        let turn = decode_turn(raw, &pre());
        assert_eq!(turn.response.price, 0.0);
        assert!(matches!(turn.repair, Repair::Corrected { .. }));

        let raw = r#"{"msg":"up","price":"1.234567","scene":"club","options":["Cope"]}"#;
        assert_eq!(decode_turn(raw, &pre()).response.price, 1.2346);
    }

    #[test]
    fn huge_price_is_kept_not_zeroed() {
        let raw = r#"{"msg":"parabolic","price":1e305,"scene":"club","options":["Sell"]}"#;
        let turn = decode_turn(raw, &pre());
        assert_eq!(turn.repair, Repair::Clean);
        assert_eq!(turn.response.price, 1e305);
    }

    #[test]
    fn unknown_scene_keeps_pre_turn_scene() {
        let raw = r#"{"msg":"lambo","price":1,"scene":"lambo_dealer","options":["Vroom"]}"#;
        let turn = decode_turn(raw, &pre());
        assert_eq!(turn.response.scene, Scene::Club);
    }

    #[test]
    fn options_are_filtered_truncated_and_capped() {
        let raw = r#"{"msg":"x","price":1,"scene":"club","options":["", 5, "Short", "This option is way too long for a button", "Third", "Fourth"]}"#;
        let turn = decode_turn(raw, &pre());
        assert_eq!(
            turn.response.options,
            vec!["Short", "This option is way too lo", "Third"]
        );
    }

    #[test]
    fn empty_options_get_defaults_and_empty_msg_gets_placeholder() {
        let raw = r#"{"msg":"  ","price":1,"scene":"club","options":[null, ""]}"#;
        let turn = decode_turn(raw, &pre());
        assert_eq!(turn.response.msg, PLACEHOLDER_MESSAGE);
        assert_eq!(turn.response.options, vec!["Shill Harder", "Touch Grass"]);
    }

    #[test]
    fn long_msg_is_truncated_by_chars() {
        let long = "🚀".repeat(200);
        let raw = format!(r#"{{"msg":"{}","price":1,"scene":"club","options":["A"]}}"#, long);
        let turn = decode_turn(&raw, &pre());
        assert_eq!(turn.response.msg.chars().count(), MAX_MSG_CHARS);
    }

    #[test]
    fn fenced_json_is_accepted() {
        let raw = "```json\n{\"msg\":\"gm\",\"price\":0.01,\"scene\":\"office\",\"options\":[\"Deploy LP\"]}\n```";
        let turn = decode_turn(raw, &pre());
        assert_eq!(turn.repair, Repair::Clean);
        assert_eq!(turn.response.scene, Scene::Office);
    }

    #[test]
    fn repair_is_deterministic() {
        let raw = r#"{"msg":"","price":-1.23456,"scene":"mars","options":[1,"",  "A very very very long option name"]}"#;
        assert_eq!(decode_turn(raw, &pre()), decode_turn(raw, &pre()));
        let garbage = "{not json";
        assert_eq!(decode_turn(garbage, &pre()), decode_turn(garbage, &pre()));
    }
}
