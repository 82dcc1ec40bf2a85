#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rug_quest::engine::launch::FixedLaunchPrice;
use rug_quest::error::GeneratorError;
use rug_quest::model::generation::GenerationRequest;
use rug_quest::{NarrativeGenerator, TurnController};

pub const LAUNCH: f64 = 0.01;

/// Replays canned generator replies in order and records every request.
/// Runs dry into transport failures.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    replies: Arc<Mutex<VecDeque<Result<String, GeneratorError>>>>,
    pub requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, raw: impl Into<String>) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(raw.into()));
        self
    }

    pub fn fail(&self, err: GeneratorError) -> &Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl NarrativeGenerator for ScriptedGenerator {
    fn generate(&self, req: &GenerationRequest) -> Result<String, GeneratorError> {
        self.requests.lock().unwrap().push(req.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GeneratorError::Transport("script exhausted".into())))
    }
}

pub fn controller(script: &ScriptedGenerator) -> TurnController<ScriptedGenerator> {
    TurnController::new(script.clone()).with_seed(FixedLaunchPrice(LAUNCH))
}

pub fn payload(msg: &str, price: f64, scene: &str, options: &[&str]) -> String {
    serde_json::json!({
        "msg": msg,
        "price": price,
        "scene": scene,
        "options": options,
    })
    .to_string()
}
