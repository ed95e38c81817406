//! Registered-team aggregates built from the internal store.
//!
//! Recomputed on every call and never cached: roster edits are visible on
//! the next reconcile.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use crate::db::models::{Player, TeamPlayerRow};
use crate::db::Database;

/// An active team with its players and their FACEIT ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredTeam {
    pub id: i64,
    pub name: String,
    pub faceit_team_id: Option<String>,
    pub players: Vec<Player>,
    pub faceit_player_ids: BTreeSet<String>,
}

impl RegisteredTeam {
    pub fn has_faceit_player(&self, player_id: &str) -> bool {
        self.faceit_player_ids.contains(player_id)
    }

    /// True when any of the ids belongs to this team.
    pub fn owns_any<'a>(&self, mut ids: impl Iterator<Item = &'a str>) -> bool {
        ids.any(|id| self.has_faceit_player(id))
    }
}

#[derive(Clone)]
pub struct RosterResolver {
    db: Database,
}

impl RosterResolver {
    pub fn new(db: Database) -> Self {
        RosterResolver { db }
    }

    /// All active teams, ordered by id. A database failure yields an empty list.
    pub fn get_registered_teams(&self) -> Vec<RegisteredTeam> {
        match self.db.list_active_team_rows() {
            Ok(rows) => group_rows(rows),
            Err(e) => {
                warn!("Failed to load registered teams: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Case-insensitive exact name match first, then the first team owning
    /// any of the given FACEIT player ids.
    pub fn is_team_or_player_registered(
        &self,
        team_name: &str,
        faceit_player_ids: &[String],
    ) -> Option<RegisteredTeam> {
        let teams = self.get_registered_teams();
        let wanted = team_name.trim().to_lowercase();
        if let Some(pos) = teams.iter().position(|t| t.name.to_lowercase() == wanted) {
            return teams.into_iter().nth(pos);
        }
        teams
            .into_iter()
            .find(|t| t.owns_any(faceit_player_ids.iter().map(String::as_str)))
    }

    pub fn get_registered_team_by_faceit_id(
        &self,
        faceit_player_id: &str,
    ) -> Option<RegisteredTeam> {
        self.get_registered_teams()
            .into_iter()
            .find(|t| t.has_faceit_player(faceit_player_id))
    }
}

/// Rows arrive ordered by team id, so consecutive rows share a team.
fn group_rows(rows: Vec<TeamPlayerRow>) -> Vec<RegisteredTeam> {
    let mut teams: Vec<RegisteredTeam> = Vec::new();
    for row in rows {
        let starts_new_team = teams.last().map_or(true, |t| t.id != row.team_id);
        if starts_new_team {
            teams.push(RegisteredTeam {
                id: row.team_id,
                name: row.team_name,
                faceit_team_id: row.faceit_team_id,
                players: Vec::new(),
                faceit_player_ids: BTreeSet::new(),
            });
        }
        let Some(team) = teams.last_mut() else {
            continue;
        };
        if let Some(player) = row.player {
            if let Some(id) = player.faceit_player_id.as_deref().filter(|id| !id.is_empty()) {
                team.faceit_player_ids.insert(id.to_string());
            }
            team.players.push(player);
        }
    }
    teams
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{NewPlayer, NewTeam};

    fn seed() -> (Database, i64, i64) {
        let db = Database::open(":memory:").unwrap();
        let ronin = db
            .insert_team(&NewTeam {
                name: "Ronin PT",
                is_active: true,
                faceit_team_id: None,
            })
            .unwrap();
        let lusitanos = db
            .insert_team(&NewTeam {
                name: "Lusitanos",
                is_active: true,
                faceit_team_id: Some("team-lus"),
            })
            .unwrap();
        for (team, nick, faceit) in [
            (ronin, "kami", Some("p1")),
            (ronin, "tora", Some("p2")),
            (ronin, "sub", None),
            (lusitanos, "viriato", Some("p4")),
        ] {
            db.insert_player(&NewPlayer {
                team_id: team,
                nickname: nick,
                faceit_player_id: faceit,
                faceit_nickname: None,
            })
            .unwrap();
        }
        (db, ronin, lusitanos)
    }

    #[test]
    fn test_groups_players_and_skips_missing_faceit_ids() {
        let (db, ronin, _) = seed();
        let teams = RosterResolver::new(db).get_registered_teams();
        assert_eq!(teams.len(), 2);
        let team = &teams[0];
        assert_eq!(team.id, ronin);
        assert_eq!(team.players.len(), 3);
        assert_eq!(
            team.faceit_player_ids.iter().cloned().collect::<Vec<_>>(),
            vec!["p1".to_string(), "p2".to_string()]
        );
    }

    #[test]
    fn test_team_without_players_has_empty_id_set() {
        let (db, _, _) = seed();
        db.insert_team(&NewTeam {
            name: "Academy",
            is_active: true,
            faceit_team_id: None,
        })
        .unwrap();
        let teams = RosterResolver::new(db).get_registered_teams();
        let academy = teams.iter().find(|t| t.name == "Academy").unwrap();
        assert!(academy.players.is_empty());
        assert!(academy.faceit_player_ids.is_empty());
    }

    #[test]
    fn test_repeated_calls_are_equal() {
        let (db, _, _) = seed();
        let resolver = RosterResolver::new(db);
        assert_eq!(resolver.get_registered_teams(), resolver.get_registered_teams());
    }

    #[test]
    fn test_database_failure_degrades_to_empty() {
        let (db, _, _) = seed();
        db.execute_raw("DROP TABLE players;").unwrap();
        assert!(RosterResolver::new(db).get_registered_teams().is_empty());
    }

    #[test]
    fn test_name_match_is_case_insensitive_and_wins() {
        let (db, ronin, _) = seed();
        let resolver = RosterResolver::new(db);
        let team = resolver
            .is_team_or_player_registered("ronin pt", &["p4".to_string()])
            .unwrap();
        assert_eq!(team.id, ronin);
    }

    #[test]
    fn test_falls_back_to_player_intersection() {
        let (db, _, lusitanos) = seed();
        let resolver = RosterResolver::new(db);
        let team = resolver
            .is_team_or_player_registered("unknown squad", &["zz".to_string(), "p4".to_string()])
            .unwrap();
        assert_eq!(team.id, lusitanos);
        assert!(resolver
            .is_team_or_player_registered("unknown squad", &["zz".to_string()])
            .is_none());
    }

    #[test]
    fn test_lookup_by_faceit_id() {
        let (db, ronin, _) = seed();
        let resolver = RosterResolver::new(db);
        assert_eq!(resolver.get_registered_team_by_faceit_id("p2").unwrap().id, ronin);
        assert!(resolver.get_registered_team_by_faceit_id("nobody").is_none());
    }
}
