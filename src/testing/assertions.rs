//! Event-sequence and world-state checks for scenario tests

use super::parser::{ExpectedEvent, StateAssertion};
use crate::ai::KeeperStatus;
use crate::events::PenaltyEvent;
use crate::sim::PenaltySim;

/// Error when an assertion fails
#[derive(Debug)]
pub struct AssertionError {
    pub message: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for AssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n    Expected: {}\n    Actual: {}", self.message, self.expected, self.actual)
    }
}

/// Captured event with timing info
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedEvent {
    pub frame: u64,
    pub event_type: String,
    pub detail: Option<String>,
}

impl CapturedEvent {
    /// Session bookkeeping and position samples are not captured
    pub fn from_penalty_event(frame: u64, event: &PenaltyEvent) -> Option<Self> {
        let detail = match event {
            PenaltyEvent::SessionStart { .. } | PenaltyEvent::Config(_) | PenaltyEvent::Tick { .. } => {
                return None;
            }
            PenaltyEvent::Miss { reason, .. } => Some(reason.name().to_string()),
            PenaltyEvent::Collision { kind, .. } => Some(kind.name().to_string()),
            PenaltyEvent::Dive { direction, .. } => Some(direction.name().to_string()),
            PenaltyEvent::DifficultyChange { difficulty } => Some(difficulty.name().to_string()),
            _ => None,
        };
        Some(CapturedEvent {
            frame,
            event_type: event.name().to_string(),
            detail,
        })
    }
}

/// Expected events must appear in order; unrelated events may sit between them
pub fn check_sequence(expected: &[ExpectedEvent], captured: &[CapturedEvent]) -> Result<(), AssertionError> {
    let mut remaining = captured.iter();

    for (i, exp) in expected.iter().enumerate() {
        let matches = |cap: &&CapturedEvent| {
            cap.event_type == exp.event && exp.detail.iter().all(|d| cap.detail.as_ref() == Some(d))
        };
        let Some(cap) = remaining.by_ref().find(matches) else {
            let label = match &exp.detail {
                Some(d) => format!("{} ({})", exp.event, d),
                None => exp.event.clone(),
            };
            let seen: Vec<String> = captured
                .iter()
                .map(|c| format!("{}@{}", c.event_type, c.frame))
                .collect();
            return Err(AssertionError {
                message: format!("Expected event #{} '{}' never matched", i + 1, label),
                expected: label,
                actual: seen.join(", "),
            });
        };

        let min = exp.frame_min.unwrap_or(0);
        let max = exp.frame_max.unwrap_or(u64::MAX);
        if !(min..=max).contains(&cap.frame) {
            return Err(AssertionError {
                message: format!("Event #{} '{}' outside its frame window", i + 1, exp.event),
                expected: match exp.frame_max {
                    Some(max) => format!("frame in {}..={}", min, max),
                    None => format!("frame >= {}", min),
                },
                actual: format!("frame {}", cap.frame),
            });
        }
    }

    Ok(())
}

/// Fail if any forbidden event name was captured
pub fn check_forbidden(forbidden: &[String], captured: &[CapturedEvent]) -> Result<(), AssertionError> {
    for name in forbidden {
        if let Some(cap) = captured.iter().find(|c| &c.event_type == name) {
            return Err(AssertionError {
                message: format!("Forbidden event '{}' occurred", name),
                expected: format!("no '{}' event", name),
                actual: format!("frame {}", cap.frame),
            });
        }
    }
    Ok(())
}

/// World state for assertions
#[derive(Debug, Clone)]
pub struct WorldState {
    pub ball: BallView,
    pub keeper: KeeperView,
    pub score_player: u32,
    pub score_keeper: u32,
    /// Last shot outcome name, "None" before any shot ends
    pub outcome: String,
    pub difficulty: String,
}

#[derive(Debug, Clone)]
pub struct BallView {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub speed: f32,
    pub active: bool,
    pub trajectory: usize,
}

#[derive(Debug, Clone)]
pub struct KeeperView {
    pub position: [f32; 3],
    pub status: KeeperStatus,
}

impl WorldState {
    pub fn from_sim(sim: &PenaltySim) -> Self {
        let ball = sim.ball();
        let keeper = sim.keeper_state();
        let score = sim.score();
        Self {
            ball: BallView {
                position: ball.position.to_array(),
                velocity: ball.velocity.to_array(),
                speed: ball.speed(),
                active: ball.is_active,
                trajectory: ball.trajectory_len(),
            },
            keeper: KeeperView {
                position: keeper.position.to_array(),
                status: keeper.status,
            },
            score_player: score.player,
            score_keeper: score.goalkeeper,
            outcome: sim.last_outcome().map(|o| o.name()).unwrap_or("None").to_string(),
            difficulty: sim.difficulty().name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Comparison {
    AtLeast,
    AtMost,
    NotEqual,
    Equal,
    Above,
    Below,
}

impl Comparison {
    /// Two-character operators first so ">=" never reads as ">"
    const SYMBOLS: [(&'static str, Comparison); 6] = [
        (">=", Comparison::AtLeast),
        ("<=", Comparison::AtMost),
        ("!=", Comparison::NotEqual),
        ("=", Comparison::Equal),
        (">", Comparison::Above),
        ("<", Comparison::Below),
    ];

    fn symbol(self) -> &'static str {
        Self::SYMBOLS
            .iter()
            .find(|(_, c)| *c == self)
            .map_or("?", |(s, _)| s)
    }

    fn numbers(self, actual: f32, expected: f32) -> bool {
        let close = (actual - expected).abs() < FLOAT_TOLERANCE;
        match self {
            Comparison::AtLeast => actual >= expected,
            Comparison::AtMost => actual <= expected,
            Comparison::NotEqual => !close,
            Comparison::Equal => close,
            Comparison::Above => actual > expected,
            Comparison::Below => actual < expected,
        }
    }

    fn text(self, actual: &str, expected: &str) -> Option<bool> {
        match self {
            Comparison::Equal => Some(actual.eq_ignore_ascii_case(expected)),
            Comparison::NotEqual => Some(!actual.eq_ignore_ascii_case(expected)),
            _ => None,
        }
    }
}

const FLOAT_TOLERANCE: f32 = 0.01;

/// `path op value`, split at the first operator in the string
fn split_check(check: &str) -> Option<(&str, Comparison, &str)> {
    check.char_indices().find_map(|(idx, _)| {
        let tail = &check[idx..];
        Comparison::SYMBOLS.iter().find_map(|(symbol, cmp)| {
            tail.strip_prefix(symbol)
                .map(|value| (check[..idx].trim(), *cmp, value.trim()))
        })
    })
}

enum Observed {
    Number(f32),
    Text(String),
}

fn axis(name: &str) -> Option<usize> {
    match name.trim_start_matches('v') {
        "x" => Some(0),
        "y" => Some(1),
        "z" => Some(2),
        _ => None,
    }
}

fn observe(state: &WorldState, path: &str) -> Option<Observed> {
    let (object, property) = path.split_once('.').unwrap_or((path, ""));
    let value = match (object, property) {
        ("ball", "speed") => Observed::Number(state.ball.speed),
        ("ball", "trajectory") => Observed::Number(state.ball.trajectory as f32),
        ("ball", "active") => Observed::Text(state.ball.active.to_string()),
        ("ball", p) if p.starts_with('v') => Observed::Number(state.ball.velocity[axis(p)?]),
        ("ball", p) => Observed::Number(state.ball.position[axis(p)?]),
        ("keeper", "state") => Observed::Text(format!("{:?}", state.keeper.status)),
        ("keeper", p) if !p.starts_with('v') => Observed::Number(state.keeper.position[axis(p)?]),
        ("score", "player") => Observed::Number(state.score_player as f32),
        ("score", "keeper") => Observed::Number(state.score_keeper as f32),
        ("outcome", "") => Observed::Text(state.outcome.clone()),
        ("difficulty", "") => Observed::Text(state.difficulty.clone()),
        _ => return None,
    };
    Some(value)
}

/// Every check of `assertion` must hold for `state`
pub fn check_state(assertion: &StateAssertion, state: &WorldState) -> Result<(), AssertionError> {
    for check in &assertion.checks {
        let (path, cmp, expected) = split_check(check).ok_or_else(|| AssertionError {
            message: format!("Unreadable check: {}", check),
            expected: "'ball.z < -18' style check".to_string(),
            actual: check.clone(),
        })?;

        let observed = observe(state, path).ok_or_else(|| AssertionError {
            message: format!("Unknown check path: {}", path),
            expected: "ball.*, keeper.*, score.*, outcome or difficulty".to_string(),
            actual: path.to_string(),
        })?;

        let (pass, actual) = match observed {
            Observed::Number(actual) => {
                let wanted: f32 = expected.parse().map_err(|_| AssertionError {
                    message: format!("{} needs a number", path),
                    expected: "number".to_string(),
                    actual: expected.to_string(),
                })?;
                (cmp.numbers(actual, wanted), format!("{:.3}", actual))
            }
            Observed::Text(actual) => {
                let pass = cmp.text(&actual, expected.trim_matches('"')).unwrap_or(false);
                (pass, actual)
            }
        };

        if !pass {
            return Err(AssertionError {
                message: format!("Check failed: {}", check),
                expected: format!("{} {} {}", path, cmp.symbol(), expected),
                actual,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(frame: u64, event_type: &str, detail: Option<&str>) -> CapturedEvent {
        CapturedEvent {
            frame,
            event_type: event_type.to_string(),
            detail: detail.map(String::from),
        }
    }

    fn expected(event: &str, detail: Option<&str>, frame_max: Option<u64>) -> ExpectedEvent {
        ExpectedEvent {
            event: event.to_string(),
            detail: detail.map(String::from),
            frame_min: None,
            frame_max,
        }
    }

    #[test]
    fn test_sequence_in_order_with_detail() {
        let events = vec![
            captured(1, "Shot", None),
            captured(9, "Dive", Some("center")),
            captured(30, "Miss", Some("post")),
        ];
        assert!(check_sequence(&[expected("Shot", None, None), expected("Miss", Some("post"), Some(40))], &events).is_ok());
        assert!(check_sequence(&[expected("Miss", Some("out"), None)], &events).is_err());
        assert!(check_sequence(&[expected("Miss", None, Some(20))], &events).is_err());
        // Order matters
        assert!(check_sequence(&[expected("Miss", None, None), expected("Dive", None, None)], &events).is_err());
        assert!(check_forbidden(&["Goal".to_string()], &events).is_ok());
        assert!(check_forbidden(&["Dive".to_string()], &events).is_err());
    }

    #[test]
    fn test_state_checks() {
        let state = WorldState {
            ball: BallView {
                position: [0.0, 0.11, -11.0],
                velocity: [0.0; 3],
                speed: 0.0,
                active: false,
                trajectory: 0,
            },
            keeper: KeeperView {
                position: [0.0, 0.0, -18.0],
                status: KeeperStatus::Idle,
            },
            score_player: 1,
            score_keeper: 0,
            outcome: "Goal".to_string(),
            difficulty: "hard".to_string(),
        };
        let assertion = StateAssertion {
            after_frame: 10,
            checks: vec![
                "ball.z = -11.0".to_string(),
                "ball.active = false".to_string(),
                "keeper.state = Idle".to_string(),
                "score.player >= 1".to_string(),
                "outcome = goal".to_string(),
            ],
        };
        assert!(check_state(&assertion, &state).is_ok());

        let bad = StateAssertion {
            after_frame: 10,
            checks: vec!["keeper.z < -20".to_string()],
        };
        assert!(check_state(&bad, &state).is_err());
        let unknown = StateAssertion {
            after_frame: 10,
            checks: vec!["wind.x = 0".to_string()],
        };
        assert!(check_state(&unknown, &state).is_err());
        let text_order = StateAssertion {
            after_frame: 10,
            checks: vec!["outcome > goal".to_string()],
        };
        assert!(check_state(&text_order, &state).is_err());
    }

    #[test]
    fn test_split_prefers_two_char_operators() {
        assert_eq!(split_check("ball.z >= -3"), Some(("ball.z", Comparison::AtLeast, "-3")));
        assert_eq!(split_check("keeper.state != Diving"), Some(("keeper.state", Comparison::NotEqual, "Diving")));
        assert_eq!(split_check("ball.vz<-5"), Some(("ball.vz", Comparison::Below, "-5")));
        assert_eq!(split_check("ball.z"), None);
    }
}
