//! Event logging for penalty sessions
//!
//! Provides a compact text format for shots, collisions, dives and outcomes.
//! Used by the interactive host, the scenario runner and batch simulation.

mod bus;
mod emitter;
mod format;
mod logger;
mod types;

pub use bus::{EventBus, StampedEvent, sync_event_clock};
pub use emitter::{EmitterConfig, frame_events, outcome_event, shot_event, tick_event};
pub use format::{parse_event, serialize_event};
pub use logger::{EventBuffer, EventLogConfig, EventLogger};
pub use types::{PenaltyEvent, SessionConfig};
