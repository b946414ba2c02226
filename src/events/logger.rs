//! Event logger for penalty sessions
//!
//! Interactive hosts write `.evlog` files; batch runs collect into an
//! in-memory `EventBuffer`.

use bevy::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::format::serialize_event;
use super::types::PenaltyEvent;

/// Configuration for event logging
#[derive(Resource, Clone)]
pub struct EventLogConfig {
    /// Directory for log files
    pub log_dir: PathBuf,
    pub enabled: bool,
    /// Sample a Tick event every N frames (0 = disabled)
    pub tick_every_frames: u64,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            enabled: true,
            tick_every_frames: 6,
        }
    }
}

/// Writes one `.evlog` per session, one serialized event per line
#[derive(Resource)]
pub struct EventLogger {
    config: EventLogConfig,
    session: Option<OpenSession>,
    last_path: Option<PathBuf>,
    session_id: String,
}

struct OpenSession {
    writer: BufWriter<File>,
    lines: usize,
}

/// `<log_dir>/<timestamp>_<id prefix>.evlog`, created (or truncated) for writing
fn open_log(dir: &Path, timestamp: &str, session_id: &str) -> Result<(PathBuf, File), String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
    let path = dir.join(format!("{}_{}.evlog", timestamp, &session_id[..8]));
    let file = File::create(&path).map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    Ok((path, file))
}

impl EventLogger {
    /// Nothing is opened until `start_session`
    pub fn new(config: EventLogConfig) -> Self {
        Self {
            config,
            session: None,
            last_path: None,
            session_id: String::new(),
        }
    }

    pub fn config(&self) -> &EventLogConfig {
        &self.config
    }

    /// Close any open file and start a new one named after `timestamp`.
    /// The first line is always the SessionStart event.
    pub fn start_session(&mut self, timestamp: &str) {
        self.end_session();
        if !self.config.enabled {
            return;
        }

        self.session_id = Uuid::new_v4().to_string();
        match open_log(&self.config.log_dir, timestamp, &self.session_id) {
            Ok((path, file)) => {
                info!("Event log: {} (session {})", path.display(), &self.session_id[..8]);
                self.last_path = Some(path);
                self.session = Some(OpenSession {
                    writer: BufWriter::new(file),
                    lines: 0,
                });
                let start = PenaltyEvent::SessionStart {
                    session_id: self.session_id.clone(),
                    timestamp: timestamp.to_string(),
                };
                self.log(0, start);
            }
            Err(e) => warn!("{}", e),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// File of the current or most recent session
    pub fn path(&self) -> Option<&PathBuf> {
        self.last_path.as_ref()
    }

    /// Lines written to the open session (0 when closed)
    pub fn lines_written(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.lines)
    }

    pub fn end_session(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if let Err(e) = session.writer.flush() {
            warn!("Failed to flush event log: {}", e);
        }
    }

    pub fn log(&mut self, time_ms: u32, event: PenaltyEvent) {
        let Some(session) = &mut self.session else {
            return;
        };
        match writeln!(session.writer, "{}", serialize_event(time_ms, &event)) {
            Ok(()) => session.lines += 1,
            Err(e) => warn!("Failed to write event: {}", e),
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::new(EventLogConfig::default())
    }
}

/// In-memory event buffer for batch runs (no file I/O)
#[derive(Debug, Default, Clone)]
pub struct EventBuffer {
    events: Vec<(u32, PenaltyEvent)>,
    session_id: String,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session with a fresh UUID
    pub fn start_session(&mut self, timestamp: &str) {
        self.clear();
        self.session_id = Uuid::new_v4().to_string();
        self.log(
            0,
            PenaltyEvent::SessionStart {
                session_id: self.session_id.clone(),
                timestamp: timestamp.to_string(),
            },
        );
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.session_id.clear();
    }

    pub fn log(&mut self, time_ms: u32, event: PenaltyEvent) {
        self.events.push((time_ms, event));
    }

    pub fn log_all(&mut self, time_ms: u32, events: impl IntoIterator<Item = PenaltyEvent>) {
        self.events.extend(events.into_iter().map(|e| (time_ms, e)));
    }

    pub fn events(&self) -> &[(u32, PenaltyEvent)] {
        &self.events
    }

    /// Serialize all events to log text, one line each
    pub fn serialize(&self) -> String {
        self.events
            .iter()
            .map(|(ts, e)| serialize_event(*ts, e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::format::parse_event;

    #[test]
    fn test_buffer_serializes_in_order() {
        let mut buffer = EventBuffer::new();
        buffer.start_session("20260101_120000");
        assert_eq!(buffer.session_id().len(), 36);
        buffer.log_all(
            16,
            [PenaltyEvent::Reset, PenaltyEvent::Goal { player: 1, keeper: 0 }],
        );

        let text = buffer.serialize();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("T:00000|SE|"));
        assert_eq!(parse_event(lines[2]).map(|(_, e)| e), Some(PenaltyEvent::Goal { player: 1, keeper: 0 }));
    }

    #[test]
    fn test_file_logger_writes_lines() {
        let dir = std::env::temp_dir().join(format!("penaltykick_evlog_{}", Uuid::new_v4()));
        let mut logger = EventLogger::new(EventLogConfig {
            log_dir: dir.clone(),
            ..Default::default()
        });
        logger.start_session("20260101_120000");
        assert!(logger.is_active());
        logger.log(250, PenaltyEvent::Reset);
        assert_eq!(logger.lines_written(), 2);
        let path = logger.path().cloned().unwrap();
        logger.end_session();
        assert!(!logger.is_active());
        assert_eq!(logger.path(), Some(&path));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("T:00250|RB|"));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_disabled_logger_stays_closed() {
        let mut logger = EventLogger::new(EventLogConfig {
            enabled: false,
            ..Default::default()
        });
        logger.start_session("x");
        assert!(!logger.is_active());
    }
}
