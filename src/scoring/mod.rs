//! Scoring module - goal detection, shot outcomes and the score tally

mod goal;

pub use goal::*;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Why a shot that was neither scored nor saved ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissReason {
    /// Struck a post
    Post,
    /// Left the field past the exit bound
    OutOfBounds,
    /// Rolled to a stop
    Settled,
    /// Still moving when the flight time limit ran out
    Timeout,
    /// Non-finite state, ball reset to rest
    Degenerate,
}

impl MissReason {
    pub fn name(&self) -> &'static str {
        match self {
            MissReason::Post => "post",
            MissReason::OutOfBounds => "out",
            MissReason::Settled => "settled",
            MissReason::Timeout => "timeout",
            MissReason::Degenerate => "degenerate",
        }
    }
}

/// How a shot ended. Exactly one per shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShotOutcome {
    Goal,
    Save,
    Miss(MissReason),
}

impl ShotOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            ShotOutcome::Goal => "Goal",
            ShotOutcome::Save => "Save",
            ShotOutcome::Miss(_) => "Miss",
        }
    }

    pub fn is_goal(&self) -> bool {
        matches!(self, ShotOutcome::Goal)
    }
}

/// Session tally: goals for the shooter, everything else for the keeper
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub player: u32,
    pub goalkeeper: u32,
}

impl Score {
    pub fn record(&mut self, outcome: ShotOutcome) {
        if outcome.is_goal() {
            self.player += 1;
        } else {
            self.goalkeeper += 1;
        }
    }

    pub fn shots(&self) -> u32 {
        self.player + self.goalkeeper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_tally() {
        let mut score = Score::default();
        score.record(ShotOutcome::Goal);
        score.record(ShotOutcome::Save);
        score.record(ShotOutcome::Miss(MissReason::Post));
        assert_eq!(score.player, 1);
        assert_eq!(score.goalkeeper, 2);
        assert_eq!(score.shots(), 3);
    }
}
