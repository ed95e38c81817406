use serde::{Deserialize, Serialize};

/// A registered player belonging to a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    /// Owning team id
    pub team_id: i64,
    pub nickname: String,
    /// FACEIT player id (UUID); players without one are never looked up
    pub faceit_player_id: Option<String>,
    pub faceit_nickname: Option<String>,
}

/// One row of the `teams LEFT JOIN players` query.
/// Player columns are `None` for a team with no players.
#[derive(Debug, Clone)]
pub struct TeamPlayerRow {
    pub team_id: i64,
    pub team_name: String,
    pub faceit_team_id: Option<String>,
    pub player: Option<Player>,
}

/// Fields needed to create a team
#[derive(Debug, Clone)]
pub struct NewTeam<'a> {
    pub name: &'a str,
    pub is_active: bool,
    pub faceit_team_id: Option<&'a str>,
}

/// Fields needed to create a player
#[derive(Debug, Clone)]
pub struct NewPlayer<'a> {
    pub team_id: i64,
    pub nickname: &'a str,
    pub faceit_player_id: Option<&'a str>,
    pub faceit_nickname: Option<&'a str>,
}
