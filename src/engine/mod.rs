pub mod engine;
pub mod protocol;
pub mod apply_turn;
pub mod turn_api;

pub mod economics;
pub mod termination;
pub mod turn_decode;
pub mod launch;

pub mod prompt_builder;
pub mod llm_client;
pub mod offline;
