use serde::{Deserialize, Serialize};

use crate::engine::termination::TerminationPolicy;

pub const ANTHROPIC_API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Anthropic,
    LmStudio,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub provider: Provider,

    pub anthropic_model: String,
    pub anthropic_url: String,

    /// OpenAI-compatible local server (LM Studio and friends).
    pub lm_studio_url: String,
    pub lm_studio_model: String,

    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,

    pub token_name: String,
    pub turn_cap: u32,
    pub moon_multiple: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Anthropic,
            anthropic_model: "claude-3-opus-20240229".into(),
            anthropic_url: "https://api.anthropic.com/v1/messages".into(),
            lm_studio_url: "http://localhost:1234/v1".into(),
            lm_studio_model: "local-model".into(),
            max_tokens: 300,
            temperature: 0.7,
            timeout_secs: 30,
            token_name: "TOKEN".into(),
            turn_cap: 12,
            moon_multiple: 10.0,
        }
    }
}

impl EngineSettings {
    pub fn termination_policy(&self) -> TerminationPolicy {
        TerminationPolicy {
            turn_cap: self.turn_cap,
            moon_multiple: self.moon_multiple,
            ..TerminationPolicy::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_in_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"provider":"lm_studio","turn_cap":8}"#).unwrap();
        assert_eq!(settings.provider, Provider::LmStudio);
        assert_eq!(settings.turn_cap, 8);
        assert_eq!(settings.max_tokens, 300);
        assert_eq!(settings.termination_policy().turn_cap, 8);
        assert_eq!(settings.termination_policy().forced_void_multiple, 0.5);
    }
}
