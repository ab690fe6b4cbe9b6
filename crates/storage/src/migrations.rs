// SPDX-License-Identifier: MIT

//! Schema migrations, applied transactionally and recorded in
//! `chat_schema_migrations` so re-opening an up-to-date database is a no-op.

use rusqlite::Connection;

struct Migration {
    version: i64,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: r#"
            -- created_at/updated_at/timestamp are RFC3339Nano UTC strings
            -- (e.g. "2026-08-01T12:00:00.000000000Z"), not epoch integers.
            CREATE TABLE chat_sessions (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                agent TEXT NOT NULL,
                model TEXT NOT NULL,
                project_root TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE chat_messages (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL REFERENCES chat_sessions(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                agent TEXT,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                tokens_in INTEGER NOT NULL DEFAULT 0,
                tokens_out INTEGER NOT NULL DEFAULT 0,
                cost_usd REAL NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_chat_messages_session_timestamp
                ON chat_messages(session_id, timestamp);
        "#,
    },
];

pub fn run(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS chat_schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    for migration in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM chat_schema_migrations WHERE version = ?1)",
            [migration.version],
            |row| row.get(0),
        )?;
        if already_applied {
            continue;
        }
        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute("INSERT INTO chat_schema_migrations (version, applied_at) VALUES (?1, strftime('%s','now'))", [migration.version])?;
        tx.commit()?;
    }
    Ok(())
}
