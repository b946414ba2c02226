//! Passive record of recent shots faced by the keeper

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::ai::decision::DiveDirection;
use crate::scoring::ShotOutcome;

/// One remembered shot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotMemory {
    pub outcome: ShotOutcome,
    pub direction: Option<DiveDirection>,
    pub save_probability: Option<f32>,
}

/// Bounded FIFO of outcomes. Statistics only; decisions never read it.
#[derive(Debug, Clone)]
pub struct KeeperMemory {
    capacity: usize,
    history: VecDeque<ShotMemory>,
}

impl KeeperMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            history: VecDeque::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, entry: ShotMemory) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShotMemory> {
        self.history.iter()
    }

    /// 1 - goals / shots over the window; 1.0 before any shot
    pub fn prediction_accuracy(&self) -> f32 {
        if self.history.is_empty() {
            return 1.0;
        }
        let goals = self.history.iter().filter(|m| m.outcome.is_goal()).count();
        1.0 - goals as f32 / self.history.len() as f32
    }
}
