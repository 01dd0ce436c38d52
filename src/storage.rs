use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::events::EventKind;

/// Optional durable cursor store. When configured, the monitoring task
/// survives restarts without re-scanning the lookback window; without it the
/// core stays correct under at-least-once redelivery.
pub struct CursorStore {
    conn: Connection,
}

impl CursorStore {
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self { conn: Connection::open(path)? })
    }

    pub fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cursors (
                kind TEXT PRIMARY KEY,
                height INTEGER NOT NULL
            );",
        )?;
        Ok(())
    }

    pub fn load(&self, kind: EventKind) -> Result<Option<u64>> {
        let height: Option<i64> = self
            .conn
            .query_row(
                "SELECT height FROM cursors WHERE kind = ?1",
                params![kind.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(height.map(|h| h as u64))
    }

    pub fn save(&mut self, kind: EventKind, height: u64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO cursors (kind, height) VALUES (?1, ?2)
             ON CONFLICT(kind) DO UPDATE SET height = ?2",
            params![kind.as_str(), height as i64],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (CursorStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursors.sqlite");
        let mut s = CursorStore::new(path.to_str().unwrap()).unwrap();
        s.init().unwrap();
        (s, dir)
    }

    #[test]
    fn test_load_missing_is_none() {
        let (s, _dir) = store();
        assert_eq!(s.load(EventKind::GuessRevealed).unwrap(), None);
    }

    #[test]
    fn test_save_then_load_round_trips_and_overwrites() {
        let (mut s, _dir) = store();
        s.save(EventKind::GuessCommitted, 100).unwrap();
        assert_eq!(s.load(EventKind::GuessCommitted).unwrap(), Some(100));
        s.save(EventKind::GuessCommitted, 250).unwrap();
        assert_eq!(s.load(EventKind::GuessCommitted).unwrap(), Some(250));
        // Other kinds untouched.
        assert_eq!(s.load(EventKind::JackpotWon).unwrap(), None);
    }

    #[test]
    fn test_cursors_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursors.sqlite");
        {
            let mut s = CursorStore::new(path.to_str().unwrap()).unwrap();
            s.init().unwrap();
            s.save(EventKind::SocialAnnouncement, 77).unwrap();
        }
        let mut reopened = CursorStore::new(path.to_str().unwrap()).unwrap();
        reopened.init().unwrap();
        assert_eq!(reopened.load(EventKind::SocialAnnouncement).unwrap(), Some(77));
    }
}
