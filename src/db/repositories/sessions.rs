use anyhow::{Context, Result};
use chrono::SecondsFormat;
use rusqlite::{params, Row};

use crate::db::{
    helpers::{parse_datetime, parse_uuid, to_i64, to_u32},
    Database,
};
use crate::models::SessionRecord;

fn row_to_record(row: &Row) -> Result<SessionRecord> {
    let id: String = row.get("id")?;
    let started_at: String = row.get("started_at")?;
    let duration_seconds: i64 = row.get("duration_seconds")?;
    let completed: bool = row.get("completed")?;

    Ok(SessionRecord {
        id: parse_uuid(&id, "id")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        duration_seconds: to_u32(duration_seconds, "duration_seconds")?,
        completed,
    })
}

impl Database {
    /// Replaces the stored history with `records`, keeping their order.
    pub fn replace_sessions(&self, records: &[SessionRecord]) -> Result<()> {
        let records = records.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            tx.execute("DELETE FROM sessions", [])
                .context("failed to clear sessions")?;

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO sessions (id, position, started_at, duration_seconds, completed)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for (position, record) in records.iter().enumerate() {
                    stmt.execute(params![
                        record.id.to_string(),
                        to_i64(position as u64)?,
                        record.started_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
                        i64::from(record.duration_seconds),
                        record.completed,
                    ])
                    .with_context(|| format!("failed to insert session {}", record.id))?;
                }
            }

            tx.commit().context("failed to commit session history")?;
            Ok(())
        })
    }

    pub fn list_sessions(&self) -> Result<Vec<SessionRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, started_at, duration_seconds, completed
                 FROM sessions
                 ORDER BY position ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }

            Ok(records)
        })
    }

    pub fn count_sessions(&self) -> Result<usize> {
        self.execute(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
            Ok(usize::try_from(count)?)
        })
    }
}
