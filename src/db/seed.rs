//! Initial roster import from a JSON file.
//!
//! ```json
//! { "teams": [
//!     { "name": "Ronin PT", "players": [ { "nickname": "kx", "faceit_player_id": "…" } ] }
//! ] }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use super::models::{NewPlayer, NewTeam};
use super::{insert_player_row, insert_team_row, Database};

#[derive(Debug, Deserialize)]
pub struct RosterSeed {
    pub teams: Vec<SeedTeam>,
}

#[derive(Debug, Deserialize)]
pub struct SeedTeam {
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub faceit_team_id: Option<String>,
    #[serde(default)]
    pub players: Vec<SeedPlayer>,
}

#[derive(Debug, Deserialize)]
pub struct SeedPlayer {
    pub nickname: String,
    #[serde(default)]
    pub faceit_player_id: Option<String>,
    #[serde(default)]
    pub faceit_nickname: Option<String>,
}

fn default_active() -> bool {
    true
}

impl RosterSeed {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read roster seed {}", path))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid roster seed {}", path))
    }
}

impl Database {
    /// Insert the seed roster unless the database already holds teams.
    /// Returns the number of teams inserted. All or nothing: a failed
    /// insert leaves the tables empty.
    pub fn seed_roster(&self, seed: &RosterSeed) -> Result<usize> {
        if self.count_teams()? > 0 {
            return Ok(0);
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for team in &seed.teams {
            let team_id = insert_team_row(
                &tx,
                &NewTeam {
                    name: &team.name,
                    is_active: team.is_active,
                    faceit_team_id: team.faceit_team_id.as_deref(),
                },
            )
            .with_context(|| format!("Failed to seed team '{}'", team.name))?;
            for player in &team.players {
                insert_player_row(
                    &tx,
                    &NewPlayer {
                        team_id,
                        nickname: &player.nickname,
                        faceit_player_id: player.faceit_player_id.as_deref(),
                        faceit_nickname: player.faceit_nickname.as_deref(),
                    },
                )
                .with_context(|| format!("Failed to seed player '{}'", player.nickname))?;
            }
        }
        tx.commit()?;
        for team in &seed.teams {
            info!("Seeded team '{}' ({} players)", team.name, team.players.len());
        }
        Ok(seed.teams.len())
    }
}
