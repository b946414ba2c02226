//! SQLite database for simulation results
//!
//! Provides persistent storage and querying of simulated shots.
//! Uses WAL mode for concurrent reads during writes.

use rusqlite::{Connection, Result, params};
use std::path::Path;

use crate::events::serialize_event;

use super::metrics::ShotResult;

/// Database wrapper for simulation results
pub struct SimDatabase {
    conn: Connection,
}

impl SimDatabase {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                session_type TEXT NOT NULL,
                seed INTEGER NOT NULL,
                config_json TEXT
            );

            CREATE TABLE IF NOT EXISTS shots (
                id INTEGER PRIMARY KEY,
                session_id TEXT REFERENCES sessions(id),
                shot_index INTEGER NOT NULL,
                difficulty TEXT NOT NULL,
                seed INTEGER NOT NULL,
                horizontal_deg REAL NOT NULL,
                vertical_deg REAL NOT NULL,
                power REAL NOT NULL,
                outcome TEXT NOT NULL,
                miss_reason TEXT,
                ticks INTEGER NOT NULL,
                flight_time REAL NOT NULL,
                end_x REAL NOT NULL,
                end_y REAL NOT NULL,
                end_z REAL NOT NULL,
                dive TEXT,
                save_probability REAL,
                collisions INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_shots_session ON shots(session_id);
            CREATE INDEX IF NOT EXISTS idx_shots_difficulty ON shots(difficulty);

            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY,
                shot_id INTEGER REFERENCES shots(id),
                time_ms INTEGER NOT NULL,
                event_type TEXT NOT NULL,
                data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_shot ON events(shot_id);
            CREATE INDEX IF NOT EXISTS idx_events_type ON events(event_type);
            "#,
        )?;
        Ok(())
    }

    /// Create a new session and return its ID
    pub fn create_session(&self, session_type: &str, seed: u64, config_json: Option<&str>) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO sessions (id, created_at, session_type, seed, config_json) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, created_at, session_type, seed as i64, config_json],
        )?;

        Ok(id)
    }

    /// Insert a shot and its events, returning the shot ID
    pub fn insert_shot(&self, session_id: &str, result: &ShotResult) -> Result<i64> {
        let miss_reason = match result.outcome {
            Some(crate::scoring::ShotOutcome::Miss(reason)) => Some(reason.name()),
            _ => None,
        };
        self.conn.execute(
            r#"INSERT INTO shots
               (session_id, shot_index, difficulty, seed, horizontal_deg, vertical_deg, power,
                outcome, miss_reason, ticks, flight_time, end_x, end_y, end_z,
                dive, save_probability, collisions)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"#,
            params![
                session_id,
                result.index,
                result.difficulty.name(),
                result.seed as i64,
                result.command.horizontal_angle_deg,
                result.command.vertical_angle_deg,
                result.command.power,
                result.outcome_label(),
                miss_reason,
                result.ticks,
                result.flight_time,
                result.end_position[0],
                result.end_position[1],
                result.end_position[2],
                result.keeper_dive.map(|d| d.name()),
                result.save_probability,
                result.collisions,
            ],
        )?;
        let shot_id = self.conn.last_insert_rowid();

        let mut stmt = self
            .conn
            .prepare("INSERT INTO events (shot_id, time_ms, event_type, data) VALUES (?1, ?2, ?3, ?4)")?;
        for (time_ms, event) in &result.events {
            stmt.execute(params![shot_id, time_ms, event.type_code(), serialize_event(*time_ms, event)])?;
        }

        Ok(shot_id)
    }

    /// Insert every shot of a run inside one transaction
    pub fn insert_shots(&self, session_id: &str, results: &[ShotResult]) -> Result<()> {
        self.conn.execute_batch("BEGIN;")?;
        for result in results {
            if let Err(e) = self.insert_shot(session_id, result) {
                self.conn.execute_batch("ROLLBACK;")?;
                return Err(e);
            }
        }
        self.conn.execute_batch("COMMIT;")
    }

    /// Outcome rates per difficulty, optionally limited to one session
    pub fn difficulty_stats(&self, session_id: Option<&str>) -> Result<Vec<DifficultyStats>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT
                difficulty,
                COUNT(*),
                SUM(CASE WHEN outcome = 'Goal' THEN 1 ELSE 0 END),
                SUM(CASE WHEN outcome = 'Save' THEN 1 ELSE 0 END),
                SUM(CASE WHEN outcome = 'Miss' THEN 1 ELSE 0 END),
                COALESCE(AVG(save_probability), 0.0),
                AVG(flight_time)
               FROM shots
               WHERE ?1 IS NULL OR session_id = ?1
               GROUP BY difficulty
               ORDER BY difficulty"#,
        )?;

        let rows = stmt.query_map(params![session_id], |row| {
            Ok(DifficultyStats {
                difficulty: row.get(0)?,
                shots: row.get(1)?,
                goals: row.get(2)?,
                saves: row.get(3)?,
                misses: row.get(4)?,
                avg_save_probability: row.get(5)?,
                avg_flight_time: row.get(6)?,
            })
        })?;

        rows.collect()
    }

    /// Miss counts by reason for one difficulty
    pub fn miss_reasons(&self, difficulty: &str) -> Result<Vec<(String, u32)>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT miss_reason, COUNT(*) FROM shots
               WHERE difficulty = ?1 AND miss_reason IS NOT NULL
               GROUP BY miss_reason ORDER BY COUNT(*) DESC"#,
        )?;
        let rows = stmt.query_map(params![difficulty], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect()
    }

    /// Most recent sessions first
    pub fn sessions(&self, limit: u32) -> Result<Vec<SessionSummary>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT s.id, s.created_at, s.session_type, s.seed, COUNT(sh.id)
               FROM sessions s LEFT JOIN shots sh ON sh.session_id = s.id
               GROUP BY s.id
               ORDER BY s.created_at DESC
               LIMIT ?1"#,
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            let seed: i64 = row.get(3)?;
            Ok(SessionSummary {
                id: row.get(0)?,
                created_at: row.get(1)?,
                session_type: row.get(2)?,
                seed: seed as u64,
                shots: row.get(4)?,
            })
        })?;
        rows.collect()
    }

    pub fn shot_count(&self) -> Result<u64> {
        self.conn.query_row("SELECT COUNT(*) FROM shots", [], |row| row.get(0))
    }

    pub fn session_count(&self) -> Result<u64> {
        self.conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
    }

    /// Raw event lines for a shot, in time order
    pub fn shot_events(&self, shot_id: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM events WHERE shot_id = ?1 ORDER BY time_ms, id")?;
        let rows = stmt.query_map(params![shot_id], |row| row.get(0))?;
        rows.collect()
    }
}

/// Aggregate outcomes for one difficulty
#[derive(Debug, Clone)]
pub struct DifficultyStats {
    pub difficulty: String,
    pub shots: u32,
    pub goals: u32,
    pub saves: u32,
    pub misses: u32,
    pub avg_save_probability: f64,
    pub avg_flight_time: f64,
}

impl DifficultyStats {
    pub fn goal_rate(&self) -> f64 {
        if self.shots == 0 {
            0.0
        } else {
            self.goals as f64 / self.shots as f64
        }
    }

    pub fn save_rate(&self) -> f64 {
        if self.shots == 0 {
            0.0
        } else {
            self.saves as f64 / self.shots as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: String,
    pub session_type: String,
    pub seed: u64,
    pub shots: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::DiveDirection;
    use crate::difficulty::Difficulty;
    use crate::events::PenaltyEvent;
    use crate::scoring::{MissReason, ShotOutcome};
    use crate::shooting::ShotCommand;

    fn sample_result(difficulty: Difficulty, outcome: Option<ShotOutcome>) -> ShotResult {
        ShotResult {
            index: 0,
            difficulty,
            seed: 12345,
            command: ShotCommand::new(2.0, 4.0, 0.9),
            outcome,
            ticks: 36,
            flight_time: 0.6,
            end_position: [0.5, 1.2, -20.4],
            keeper_dive: Some(DiveDirection::Center),
            save_probability: Some(0.4),
            collisions: 0,
            events: vec![
                (0, PenaltyEvent::Reset),
                (
                    600,
                    PenaltyEvent::Goal {
                        player: 1,
                        keeper: 0,
                    },
                ),
            ],
        }
    }

    #[test]
    fn test_create_database() {
        let db = SimDatabase::open_in_memory().unwrap();
        assert_eq!(db.shot_count().unwrap(), 0);
        assert_eq!(db.session_count().unwrap(), 0);
    }

    #[test]
    fn test_insert_shot_with_events() {
        let db = SimDatabase::open_in_memory().unwrap();
        let session_id = db.create_session("batch", 7, None).unwrap();

        let shot_id = db
            .insert_shot(&session_id, &sample_result(Difficulty::Hard, Some(ShotOutcome::Goal)))
            .unwrap();
        assert!(shot_id > 0);
        assert_eq!(db.shot_count().unwrap(), 1);

        let events = db.shot_events(shot_id).unwrap();
        assert_eq!(events, ["T:00000|RB|", "T:00600|G|1|0"]);
    }

    #[test]
    fn test_difficulty_stats() {
        let db = SimDatabase::open_in_memory().unwrap();
        let session_id = db.create_session("sweep", 1, Some("{}")).unwrap();
        let results = vec![
            sample_result(Difficulty::Hard, Some(ShotOutcome::Goal)),
            sample_result(Difficulty::Hard, Some(ShotOutcome::Save)),
            sample_result(Difficulty::Hard, Some(ShotOutcome::Miss(MissReason::Post))),
            sample_result(Difficulty::Easy, Some(ShotOutcome::Goal)),
        ];
        db.insert_shots(&session_id, &results).unwrap();

        let stats = db.difficulty_stats(Some(&session_id)).unwrap();
        assert_eq!(stats.len(), 2);
        let hard = stats.iter().find(|s| s.difficulty == "hard").unwrap();
        assert_eq!(hard.shots, 3);
        assert_eq!(hard.goals, 1);
        assert_eq!(hard.saves, 1);
        assert_eq!(hard.misses, 1);
        assert!((hard.goal_rate() - 1.0 / 3.0).abs() < 1e-9);
        assert!((hard.avg_save_probability - 0.4).abs() < 1e-6);

        assert_eq!(db.miss_reasons("hard").unwrap(), vec![("post".to_string(), 1)]);
        assert!(db.difficulty_stats(Some("missing")).unwrap().is_empty());
        assert_eq!(db.difficulty_stats(None).unwrap().len(), 2);

        let sessions = db.sessions(10).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].shots, 4);
        assert_eq!(sessions[0].session_type, "sweep");
    }
}
