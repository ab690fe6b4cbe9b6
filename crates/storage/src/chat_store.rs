// SPDX-License-Identifier: MIT

use crate::error::ChatStoreError;
use crate::migrations;
use crate::retry::with_retry;
use parking_lot::Mutex;
use quorum_core::clock::{format_epoch_ms_rfc3339, parse_rfc3339_to_epoch_ms};
use quorum_core::{ChatMessage, ChatRole, ChatSession, MessageId, NotFound, SessionId};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ChatStoreConfig {
    pub path: PathBuf,
}

/// SQLite-backed chat session/message store: single write connection,
/// read-only connections opened per call (WAL mode allows both to run
/// concurrently).
pub struct ChatStore {
    path: PathBuf,
    writer: Mutex<Connection>,
}

impl ChatStore {
    pub fn open(config: ChatStoreConfig) -> Result<Self, ChatStoreError> {
        let mut conn = Connection::open(&config.path)?;
        configure(&conn)?;
        migrations::run(&mut conn)?;
        Ok(Self { path: config.path, writer: Mutex::new(conn) })
    }

    fn read_conn(&self) -> Result<Connection, ChatStoreError> {
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX)?;
        conn.busy_timeout(Duration::from_secs(1))?;
        Ok(conn)
    }

    pub fn save_session(&self, session: &ChatSession) -> Result<(), ChatStoreError> {
        let conn = self.writer.lock();
        with_retry(|| {
            conn.execute(
                "INSERT INTO chat_sessions (id, title, created_at, updated_at, agent, model, project_root)
                 VALUES (?1,?2,?3,?4,?5,?6,?7)
                 ON CONFLICT(id) DO UPDATE SET
                    title=excluded.title, updated_at=excluded.updated_at,
                    agent=excluded.agent, model=excluded.model, project_root=excluded.project_root",
                params![session.id.as_str(), session.title, format_epoch_ms_rfc3339(session.created_at_epoch_ms), format_epoch_ms_rfc3339(session.updated_at_epoch_ms), session.agent, session.model, session.project_root],
            )
        })?;
        Ok(())
    }

    pub fn load_session(&self, id: &SessionId) -> Result<ChatSession, ChatStoreError> {
        let conn = self.read_conn()?;
        let mut session = with_retry(|| {
            conn.query_row("SELECT id, title, created_at, updated_at, agent, model, project_root FROM chat_sessions WHERE id = ?1", [id.as_str()], row_to_session).optional()
        })?
        .ok_or_else(|| ChatStoreError::NotFound(NotFound::new("chat_session", id.as_str())))?;
        session.message_count = self.count_messages(&conn, id)?;
        Ok(session)
    }

    pub fn list_sessions(&self) -> Result<Vec<ChatSession>, ChatStoreError> {
        let conn = self.read_conn()?;
        let mut stmt = conn.prepare("SELECT id, title, created_at, updated_at, agent, model, project_root FROM chat_sessions")?;
        let rows = stmt.query_map([], row_to_session)?;
        let mut sessions = Vec::new();
        for row in rows {
            match row {
                Ok(mut session) => {
                    session.message_count = self.count_messages(&conn, &session.id)?;
                    sessions.push(session);
                }
                Err(e) => warn!(error = %e, "skipping corrupt chat_sessions row"),
            }
        }
        Ok(sessions)
    }

    /// Cascades to the session's messages via `ON DELETE CASCADE`.
    pub fn delete_session(&self, id: &SessionId) -> Result<(), ChatStoreError> {
        let conn = self.writer.lock();
        with_retry(|| conn.execute("DELETE FROM chat_sessions WHERE id = ?1", [id.as_str()]))?;
        Ok(())
    }

    /// Bumps the owning session's `updated_at` to the message's timestamp in
    /// the same transaction.
    pub fn save_message(&self, message: &ChatMessage) -> Result<(), ChatStoreError> {
        let mut conn = self.writer.lock();
        with_retry(|| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO chat_messages (id, session_id, role, agent, content, timestamp, tokens_in, tokens_out, cost_usd)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
                params![
                    message.id.as_str(),
                    message.session_id.as_str(),
                    role_to_str(message.role),
                    message.agent,
                    message.content,
                    format_epoch_ms_rfc3339(message.timestamp_epoch_ms),
                    message.tokens_in,
                    message.tokens_out,
                    message.cost_usd,
                ],
            )?;
            tx.execute("UPDATE chat_sessions SET updated_at = ?1 WHERE id = ?2", params![format_epoch_ms_rfc3339(message.timestamp_epoch_ms), message.session_id.as_str()])?;
            tx.commit()
        })?;
        Ok(())
    }

    pub fn load_messages(&self, session_id: &SessionId) -> Result<Vec<ChatMessage>, ChatStoreError> {
        let conn = self.read_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, session_id, role, agent, content, timestamp, tokens_in, tokens_out, cost_usd
             FROM chat_messages WHERE session_id = ?1 ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map([session_id.as_str()], row_to_message)?;
        let mut messages = Vec::new();
        for row in rows {
            match row {
                Ok(message) => messages.push(message),
                Err(e) => warn!(error = %e, "skipping corrupt chat_messages row"),
            }
        }
        Ok(messages)
    }

    fn count_messages(&self, conn: &Connection, session_id: &SessionId) -> Result<u32, ChatStoreError> {
        let count: i64 = with_retry(|| conn.query_row("SELECT COUNT(*) FROM chat_messages WHERE session_id = ?1", [session_id.as_str()], |row| row.get(0)))?;
        Ok(count as u32)
    }
}

fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(Duration::from_secs(1))?;
    Ok(())
}

fn role_to_str(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Agent => "agent",
        ChatRole::System => "system",
    }
}

fn role_from_str(s: &str) -> ChatRole {
    match s {
        "agent" => ChatRole::Agent,
        "system" => ChatRole::System,
        _ => ChatRole::User,
    }
}

/// Converts a stored RFC3339Nano column back to epoch-ms, surfacing an
/// unparseable value as the same error shape rusqlite uses for a type
/// mismatch rather than silently defaulting to zero.
fn parse_timestamp_column(idx: usize, s: &str) -> rusqlite::Result<u64> {
    parse_rfc3339_to_epoch_ms(s).ok_or_else(|| {
        let cause = std::io::Error::new(std::io::ErrorKind::InvalidData, format!("not a valid RFC3339 timestamp: {s:?}"));
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(cause))
    })
}

fn row_to_session(row: &Row) -> rusqlite::Result<ChatSession> {
    Ok(ChatSession {
        id: SessionId::from_string(row.get::<_, String>(0)?),
        title: row.get(1)?,
        created_at_epoch_ms: parse_timestamp_column(2, &row.get::<_, String>(2)?)?,
        updated_at_epoch_ms: parse_timestamp_column(3, &row.get::<_, String>(3)?)?,
        agent: row.get(4)?,
        model: row.get(5)?,
        project_root: row.get(6)?,
        message_count: 0,
        messages: Vec::new(),
    })
}

fn row_to_message(row: &Row) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        id: MessageId::from_string(row.get::<_, String>(0)?),
        session_id: SessionId::from_string(row.get::<_, String>(1)?),
        role: role_from_str(&row.get::<_, String>(2)?),
        agent: row.get(3)?,
        content: row.get(4)?,
        timestamp_epoch_ms: parse_timestamp_column(5, &row.get::<_, String>(5)?)?,
        tokens_in: row.get(6)?,
        tokens_out: row.get(7)?,
        cost_usd: row.get(8)?,
    })
}

#[cfg(test)]
#[path = "chat_store_tests.rs"]
mod tests;
