use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

pub mod models;
pub mod seed;
use models::*;

/// Thread-safe SQLite handle (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path.
    /// `":memory:"` gives a private in-memory store.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    // ── Teams ────────────────────────────────────────────────────────────────

    #[cfg(test)]
    pub fn insert_team(&self, team: &NewTeam<'_>) -> Result<i64> {
        let conn = self.lock()?;
        insert_team_row(&conn, team)
    }

    pub fn count_teams(&self) -> Result<i64> {
        let conn = self.lock()?;
        let n = conn.query_row("SELECT COUNT(*) FROM teams", [], |r| r.get(0))?;
        Ok(n)
    }

    #[cfg(test)]
    pub fn set_team_active(&self, team_id: i64, is_active: bool) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE teams SET is_active = ?1 WHERE id = ?2",
            params![is_active, team_id],
        )?;
        Ok(())
    }

    // ── Players ──────────────────────────────────────────────────────────────

    #[cfg(test)]
    pub fn insert_player(&self, player: &NewPlayer<'_>) -> Result<i64> {
        let conn = self.lock()?;
        insert_player_row(&conn, player)
    }

    // ── Roster join ──────────────────────────────────────────────────────────

    /// Active teams left-joined to their players, ordered by team then player id.
    pub fn list_active_team_rows(&self) -> Result<Vec<TeamPlayerRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.faceit_team_id,
                    p.id, p.nickname, p.faceit_player_id, p.faceit_nickname
             FROM teams t
             LEFT JOIN players p ON p.team_id = t.id
             WHERE t.is_active = 1
             ORDER BY t.id, p.id",
        )?;
        let rows = stmt
            .query_map([], map_team_player_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

/// Takes a bare connection so callers can run it inside a transaction.
fn insert_team_row(conn: &Connection, team: &NewTeam<'_>) -> Result<i64> {
    conn.execute(
        "INSERT INTO teams (name, is_active, faceit_team_id) VALUES (?1, ?2, ?3)",
        params![team.name, team.is_active, team.faceit_team_id],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_player_row(conn: &Connection, player: &NewPlayer<'_>) -> Result<i64> {
    conn.execute(
        "INSERT INTO players (team_id, nickname, faceit_player_id, faceit_nickname)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            player.team_id,
            player.nickname,
            player.faceit_player_id,
            player.faceit_nickname,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn map_team_player_row(row: &rusqlite::Row) -> rusqlite::Result<TeamPlayerRow> {
    let team_id: i64 = row.get(0)?;
    let player_id: Option<i64> = row.get(3)?;
    let player = match player_id {
        Some(id) => Some(Player {
            id,
            team_id,
            nickname: row.get(4)?,
            faceit_player_id: row.get(5)?,
            faceit_nickname: row.get(6)?,
        }),
        None => None,
    };
    Ok(TeamPlayerRow {
        team_id,
        team_name: row.get(1)?,
        faceit_team_id: row.get(2)?,
        player,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS teams (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT    NOT NULL,
    is_active       INTEGER NOT NULL DEFAULT 1,
    faceit_team_id  TEXT
);

CREATE TABLE IF NOT EXISTS players (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    team_id           INTEGER NOT NULL,
    nickname          TEXT    NOT NULL,
    faceit_player_id  TEXT,
    faceit_nickname   TEXT,
    FOREIGN KEY (team_id) REFERENCES teams(id)
);

CREATE INDEX IF NOT EXISTS idx_players_team ON players(team_id);
CREATE INDEX IF NOT EXISTS idx_players_faceit ON players(faceit_player_id);
"#;
