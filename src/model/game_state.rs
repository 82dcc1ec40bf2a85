use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::model::scene::{Mood, Scene};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingCause {
    /// Price hit zero or the story fell into the void.
    Annihilation,
    /// Rug pull, SEC raid, handcuffs.
    Legal,
    /// The win.
    Moon,
}

/// Maximum number of price points kept for the chart.
pub const PRICE_HISTORY_CAPACITY: usize = 15;

/// Sliding window of recent prices, oldest first.
///
/// Deserializing an oversized sequence keeps only the newest
/// `PRICE_HISTORY_CAPACITY` points, so a snapshot coming back from a client
/// can never break the bound.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct PriceHistory {
    points: VecDeque<f64>,
}

impl PriceHistory {
    pub fn starting_at(price: f64) -> Self {
        let mut history = Self::default();
        history.push(price);
        history
    }

    /// Appends a point, evicting the oldest one once over capacity.
    pub fn push(&mut self, price: f64) {
        self.points.push_back(price);
        while self.points.len() > PRICE_HISTORY_CAPACITY {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<f64> {
        self.points.front().copied()
    }

    pub fn latest(&self) -> Option<f64> {
        self.points.back().copied()
    }

    /// The newest `n` points, oldest first.
    pub fn last_n(&self, n: usize) -> Vec<f64> {
        let skip = self.points.len().saturating_sub(n);
        self.points.iter().skip(skip).copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.points.iter()
    }
}

impl From<Vec<f64>> for PriceHistory {
    fn from(points: Vec<f64>) -> Self {
        let mut history = Self::default();
        for price in points {
            history.push(price);
        }
        history
    }
}

impl From<PriceHistory> for Vec<f64> {
    fn from(history: PriceHistory) -> Self {
        history.points.into_iter().collect()
    }
}

/// Everything the front-end needs to render one moment of a session.
///
/// This value doubles as the snapshot exchanged with clients, hence the
/// camelCase wire names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub token_name: String,

    /// Always rounded to 4 decimals and never negative.
    pub price: f64,

    /// Price recorded when the session was created. Ending thresholds are
    /// multiples of this value.
    pub launch_price: f64,

    #[serde(default)]
    pub price_change_percent: f64,

    #[serde(default = "default_true")]
    pub is_price_positive: bool,

    pub price_history: PriceHistory,
    pub current_scene: Scene,
    pub turn_count: u32,
    pub game_over: bool,

    #[serde(default)]
    pub end_message: String,

    #[serde(default)]
    pub ending: Option<EndingCause>,

    #[serde(default)]
    pub last_choice: Option<String>,

    #[serde(default)]
    pub current_message: String,

    #[serde(default)]
    pub current_options: Vec<String>,

    #[serde(default)]
    pub mood: Mood,
}

fn default_true() -> bool {
    true
}

impl GameState {
    /// A fresh, active session sitting in the office at its launch price.
    pub fn new(token_name: impl Into<String>, launch_price: f64) -> Self {
        Self {
            token_name: token_name.into(),
            price: launch_price,
            launch_price,
            price_change_percent: 0.0,
            is_price_positive: true,
            price_history: PriceHistory::starting_at(launch_price),
            current_scene: Scene::Office,
            turn_count: 0,
            game_over: false,
            end_message: String::new(),
            ending: None,
            last_choice: None,
            current_message: String::new(),
            current_options: Vec::new(),
            mood: Mood::Idle,
        }
    }

    /// Launch price to compare against. Snapshots from older clients may
    /// carry a zero launch price, in which case the oldest chart point is used.
    pub fn baseline_price(&self) -> f64 {
        if self.launch_price > 0.0 {
            self.launch_price
        } else {
            self.price_history.first().unwrap_or(self.price)
        }
    }
}
