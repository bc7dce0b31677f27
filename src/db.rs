use crate::types::Turn;
use rusqlite::{params, Connection};
use std::path::PathBuf;

const APP_NAME: &str = "cmdllm";

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub query: String,
    pub command: String,
    pub executed: bool,
    pub succeeded: bool,
}

pub fn get_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("session.db")
}

pub fn open_db() -> Result<Connection, Box<dyn std::error::Error>> {
    let path = get_db_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    init_db(&conn)?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<(), Box<dyn std::error::Error>> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS turns (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            role TEXT,
            content TEXT,
            timestamp INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            query TEXT,
            command TEXT,
            executed INTEGER,
            succeeded INTEGER,
            output_sample TEXT,
            timestamp INTEGER
        )",
        [],
    )?;

    Ok(())
}

/// Context log flushed at session end. Best-effort at the call site.
pub fn flush_turns<'a>(
    conn: &Connection,
    turns: impl Iterator<Item = &'a Turn>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stmt =
        conn.prepare("INSERT INTO turns (role, content, timestamp) VALUES (?1, ?2, ?3)")?;
    for turn in turns {
        stmt.execute(params![turn.role.as_str(), turn.content, turn.timestamp])?;
    }
    Ok(())
}

pub fn save_cycle(
    conn: &Connection,
    query: &str,
    command: &str,
    executed: bool,
    succeeded: bool,
    output_sample: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs() as i64;

    conn.execute(
        "INSERT INTO history (query, command, executed, succeeded, output_sample, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![query, command, executed as i32, succeeded as i32, output_sample, now],
    )?;
    Ok(())
}

pub fn recent_history(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<HistoryEntry>, Box<dyn std::error::Error>> {
    let mut stmt = conn.prepare(
        "SELECT query, command, executed, succeeded FROM history
         ORDER BY id DESC LIMIT ?1",
    )?;

    let entries = stmt
        .query_map(params![limit as i64], |row| {
            Ok(HistoryEntry {
                query: row.get(0)?,
                command: row.get(1)?,
                executed: row.get::<_, i32>(2)? != 0,
                succeeded: row.get::<_, i32>(3)? != 0,
            })
        })?
        .filter_map(|r| r.ok())
        .collect();

    Ok(entries)
}

pub fn clear_log(conn: &Connection) -> Result<(), Box<dyn std::error::Error>> {
    conn.execute("DELETE FROM turns", [])?;
    conn.execute("DELETE FROM history", [])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        conn
    }

    #[test]
    fn turns_flush_and_clear() {
        let conn = test_conn();
        let turns = vec![
            Turn::new(Role::User, "list files"),
            Turn::new(Role::Assistant, "$ ls\n(exit 0)"),
        ];
        flush_turns(&conn, turns.iter()).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM turns", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);

        clear_log(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM turns", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn history_returns_newest_first() {
        let conn = test_conn();
        save_cycle(&conn, "first", "ls", true, true, "").unwrap();
        save_cycle(&conn, "second", "rm x", false, false, "").unwrap();

        let entries = recent_history(&conn, 10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].query, "second");
        assert!(!entries[0].executed);
        assert_eq!(entries[1].query, "first");
        assert!(entries[1].succeeded);
    }

    #[test]
    fn history_limit_is_applied() {
        let conn = test_conn();
        for i in 0..5 {
            save_cycle(&conn, &format!("q{i}"), "cmd", true, true, "").unwrap();
        }
        assert_eq!(recent_history(&conn, 3).unwrap().len(), 3);
    }
}
