use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse narrative bucket the story is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scene {
    #[default]
    Office,
    Club,
    Yacht,
    Moon,
    Prison,
    Void,
}

impl Scene {
    pub const ALL: [Scene; 6] = [
        Scene::Office,
        Scene::Club,
        Scene::Yacht,
        Scene::Moon,
        Scene::Prison,
        Scene::Void,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scene::Office => "office",
            Scene::Club => "club",
            Scene::Yacht => "yacht",
            Scene::Moon => "moon",
            Scene::Prison => "prison",
            Scene::Void => "void",
        }
    }

    /// Exact, case-sensitive lookup. Anything else is not a scene.
    pub fn parse(raw: &str) -> Option<Scene> {
        Scene::ALL.into_iter().find(|scene| scene.as_str() == raw)
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the hype-man sprite is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    #[default]
    Idle,
    Talk,
    Panic,
}
