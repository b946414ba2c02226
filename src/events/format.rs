//! Compact text format for event serialization
//!
//! Format: `T:NNNNN|CODE|data...`
//! - T:NNNNN = timestamp in milliseconds (5 digits, wraps at 99999)
//! - CODE = 1-2 char event type code
//! - data = pipe-separated values specific to event type
//!
//! Examples:
//! ```text
//! T:00000|DC|hard
//! T:00016|SH|0.0|10.0|1.00|50.0
//! T:00150|KD|center|0.08|1
//! T:00466|CO|keeper|0.0,2.14,-17.3|36.2
//! T:00466|SV|0|1
//! T:00600|MI|post|0|2
//! T:00050|T|3|0.0,0.9,-3.4|0.0,0.0,-18.0|I
//! ```

use super::types::{PenaltyEvent, SessionConfig};
use crate::ai::DiveDirection;
use crate::ball::CollisionKind;
use crate::scoring::MissReason;

/// Format a float with fixed precision (1 decimal)
fn fmt_f1(v: f32) -> String {
    format!("{:.1}", v)
}

/// Format a position triple
fn fmt_pos(pos: (f32, f32, f32)) -> String {
    format!("{:.2},{:.2},{:.2}", pos.0, pos.1, pos.2)
}

/// Serialize an event to compact text format
pub fn serialize_event(time_ms: u32, event: &PenaltyEvent) -> String {
    let ts = format!("T:{:05}", time_ms % 100000);
    let code = event.type_code();

    let data = match event {
        PenaltyEvent::SessionStart {
            session_id,
            timestamp,
        } => format!("{}|{}", session_id, timestamp),
        PenaltyEvent::Config(config) => {
            // Config is compact JSON for easy parsing
            serde_json::to_string(config).unwrap_or_else(|_| "{}".to_string())
        }
        PenaltyEvent::DifficultyChange { difficulty } => difficulty.to_string(),
        PenaltyEvent::Shot {
            horizontal_deg,
            vertical_deg,
            power,
            speed,
        } => format!(
            "{}|{}|{:.2}|{}",
            fmt_f1(*horizontal_deg),
            fmt_f1(*vertical_deg),
            power,
            fmt_f1(*speed)
        ),
        PenaltyEvent::Collision {
            kind,
            point,
            impulse,
        } => format!("{}|{}|{}", kind.name(), fmt_pos(*point), fmt_f1(*impulse)),
        PenaltyEvent::Dive {
            direction,
            probability,
            will_save,
        } => format!(
            "{}|{:.2}|{}",
            direction.name(),
            probability,
            if *will_save { 1 } else { 0 }
        ),
        PenaltyEvent::Goal { player, keeper } | PenaltyEvent::Save { player, keeper } => {
            format!("{}|{}", player, keeper)
        }
        PenaltyEvent::Miss {
            reason,
            player,
            keeper,
        } => format!("{}|{}|{}", reason.name(), player, keeper),
        PenaltyEvent::Reset => String::new(),
        PenaltyEvent::Tick {
            frame,
            ball_pos,
            keeper_pos,
            keeper_state,
        } => format!(
            "{}|{}|{}|{}",
            frame,
            fmt_pos(*ball_pos),
            fmt_pos(*keeper_pos),
            keeper_state
        ),
    };

    format!("{}|{}|{}", ts, code, data)
}

/// Parse a line back into timestamp and event
pub fn parse_event(line: &str) -> Option<(u32, PenaltyEvent)> {
    let parts: Vec<&str> = line.trim_end().split('|').collect();
    if parts.len() < 3 {
        return None;
    }

    let ts_str = parts[0].strip_prefix("T:")?;
    let time_ms: u32 = ts_str.parse().ok()?;

    let code = parts[1];
    let data = &parts[2..];

    let event = match code {
        "SE" if data.len() >= 2 => PenaltyEvent::SessionStart {
            session_id: data[0].to_string(),
            timestamp: data[1].to_string(),
        },
        "CF" if !data.is_empty() => {
            // Rejoin in case the JSON contains |
            let json_str = data.join("|");
            let config: SessionConfig = serde_json::from_str(&json_str).ok()?;
            PenaltyEvent::Config(config)
        }
        "DC" if !data.is_empty() => PenaltyEvent::DifficultyChange {
            difficulty: data[0].parse().ok()?,
        },
        "SH" if data.len() >= 4 => PenaltyEvent::Shot {
            horizontal_deg: data[0].parse().ok()?,
            vertical_deg: data[1].parse().ok()?,
            power: data[2].parse().ok()?,
            speed: data[3].parse().ok()?,
        },
        "CO" if data.len() >= 3 => PenaltyEvent::Collision {
            kind: parse_collision_kind(data[0])?,
            point: parse_pos(data[1])?,
            impulse: data[2].parse().ok()?,
        },
        "KD" if data.len() >= 3 => PenaltyEvent::Dive {
            direction: parse_direction(data[0])?,
            probability: data[1].parse().ok()?,
            will_save: data[2] == "1",
        },
        "G" if data.len() >= 2 => PenaltyEvent::Goal {
            player: data[0].parse().ok()?,
            keeper: data[1].parse().ok()?,
        },
        "SV" if data.len() >= 2 => PenaltyEvent::Save {
            player: data[0].parse().ok()?,
            keeper: data[1].parse().ok()?,
        },
        "MI" if data.len() >= 3 => PenaltyEvent::Miss {
            reason: parse_miss_reason(data[0])?,
            player: data[1].parse().ok()?,
            keeper: data[2].parse().ok()?,
        },
        "RB" => PenaltyEvent::Reset,
        "T" if data.len() >= 4 => PenaltyEvent::Tick {
            frame: data[0].parse().ok()?,
            ball_pos: parse_pos(data[1])?,
            keeper_pos: parse_pos(data[2])?,
            keeper_state: data[3].chars().next()?,
        },
        _ => return None,
    };

    Some((time_ms, event))
}

fn parse_collision_kind(s: &str) -> Option<CollisionKind> {
    [
        CollisionKind::Ground,
        CollisionKind::Boundary,
        CollisionKind::GoalPost,
        CollisionKind::Goalkeeper,
    ]
    .into_iter()
    .find(|k| k.name() == s)
}

fn parse_direction(s: &str) -> Option<DiveDirection> {
    [
        DiveDirection::Left,
        DiveDirection::Right,
        DiveDirection::Center,
        DiveDirection::LeftUp,
        DiveDirection::RightUp,
    ]
    .into_iter()
    .find(|d| d.name() == s)
}

fn parse_miss_reason(s: &str) -> Option<MissReason> {
    [
        MissReason::Post,
        MissReason::OutOfBounds,
        MissReason::Settled,
        MissReason::Timeout,
        MissReason::Degenerate,
    ]
    .into_iter()
    .find(|r| r.name() == s)
}

fn parse_pos(s: &str) -> Option<(f32, f32, f32)> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return None;
    }
    Some((
        parts[0].parse().ok()?,
        parts[1].parse().ok()?,
        parts[2].parse().ok()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;

    #[test]
    fn test_roundtrip_miss() {
        let event = PenaltyEvent::Miss {
            reason: MissReason::OutOfBounds,
            player: 2,
            keeper: 5,
        };
        let line = serialize_event(1500, &event);
        assert_eq!(line, "T:01500|MI|out|2|5");
        let (ts, parsed) = parse_event(&line).unwrap();
        assert_eq!(ts, 1500);
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_roundtrip_collision() {
        let event = PenaltyEvent::Collision {
            kind: CollisionKind::Goalkeeper,
            point: (0.01, 2.14, -17.27),
            impulse: 36.2,
        };
        let line = serialize_event(466, &event);
        assert!(line.contains("|CO|keeper|"));
        let (_, parsed) = parse_event(&line).unwrap();
        if let PenaltyEvent::Collision { kind, point, .. } = parsed {
            assert_eq!(kind, CollisionKind::Goalkeeper);
            assert!((point.2 - -17.27).abs() < 0.01);
        } else {
            panic!("Wrong event type");
        }
    }

    #[test]
    fn test_config_line_parses() {
        let config = SessionConfig {
            difficulty: Difficulty::Hard,
            seed: Some(42),
            ..Default::default()
        };
        let line = serialize_event(0, &PenaltyEvent::Config(config.clone()));
        let (_, parsed) = parse_event(&line).unwrap();
        assert_eq!(parsed, PenaltyEvent::Config(config));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_event("").is_none());
        assert!(parse_event("T:00010|ZZ|1").is_none());
        assert!(parse_event("T:00010|DC|impossible").is_none());
        assert!(parse_event("X:00010|RB|").is_none());
    }
}
