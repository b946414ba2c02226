//! Frame-local queue of penalty events
//!
//! Plugin systems push shot, collision and outcome events as they happen;
//! `write_event_log` takes the whole queue once per frame.

use bevy::prelude::*;

use super::types::PenaltyEvent;

/// An event and the host clock reading (ms) when it was raised
#[derive(Debug, Clone, PartialEq)]
pub struct StampedEvent {
    pub time_ms: u32,
    pub event: PenaltyEvent,
}

#[derive(Resource, Debug, Default)]
pub struct EventBus {
    queue: Vec<StampedEvent>,
    now_ms: u32,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_clock(&mut self, elapsed_secs: f32) {
        self.now_ms = (elapsed_secs.max(0.0) * 1000.0) as u32;
    }

    pub fn emit(&mut self, event: PenaltyEvent) {
        self.queue.push(StampedEvent {
            time_ms: self.now_ms,
            event,
        });
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = PenaltyEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    /// Hand over everything queued so far, oldest first
    pub fn take(&mut self) -> Vec<StampedEvent> {
        std::mem::take(&mut self.queue)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

pub fn sync_event_clock(mut bus: ResMut<EventBus>, time: Res<Time>) {
    bus.set_clock(time.elapsed_secs());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;

    #[test]
    fn test_events_carry_clock_at_emit() {
        let mut bus = EventBus::new();
        bus.emit(PenaltyEvent::Reset);
        bus.set_clock(2.25);
        bus.emit(PenaltyEvent::Goal { player: 1, keeper: 0 });

        let queued = bus.take();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].time_ms, 0);
        assert_eq!(queued[1].time_ms, 2250);
        assert_eq!(queued[1].event, PenaltyEvent::Goal { player: 1, keeper: 0 });
    }

    #[test]
    fn test_take_empties_queue() {
        let mut bus = EventBus::new();
        bus.extend([
            PenaltyEvent::Reset,
            PenaltyEvent::DifficultyChange {
                difficulty: Difficulty::Easy,
            },
        ]);
        assert!(!bus.is_empty());

        assert_eq!(bus.take().len(), 2);
        assert!(bus.is_empty());
        assert!(bus.take().is_empty());
    }

    #[test]
    fn test_negative_clock_clamps() {
        let mut bus = EventBus::new();
        bus.set_clock(-1.0);
        bus.emit(PenaltyEvent::Reset);
        assert_eq!(bus.take()[0].time_ms, 0);
    }
}
