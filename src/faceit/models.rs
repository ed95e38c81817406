//! FACEIT Data API v4 payloads.
//!
//! History entries and match-detail records describe the same match with
//! different shapes (`nickname`/`players` vs `name`/`roster`); both decode
//! into [`RawMatch`] and are normalised into [`ProviderMatch`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

pub const GAME_ID: &str = "cs2";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Ready,
    Ongoing,
    Finished,
    Aborted,
    Cancelled,
    #[default]
    Unknown,
}

impl MatchStatus {
    /// Case-insensitive; pre-game FACEIT states collapse into `Ready`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "READY" | "CHECK_IN" | "VOTING" | "CONFIGURING" | "SCHEDULED" => MatchStatus::Ready,
            "ONGOING" => MatchStatus::Ongoing,
            "FINISHED" => MatchStatus::Finished,
            "ABORTED" => MatchStatus::Aborted,
            "CANCELLED" => MatchStatus::Cancelled,
            _ => MatchStatus::Unknown,
        }
    }
}

fn lenient_status<'de, D>(deserializer: D) -> Result<MatchStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().map_or(MatchStatus::Unknown, MatchStatus::parse))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionPlayer {
    pub player_id: String,
    #[serde(default)]
    pub nickname: String,
}

/// One side of a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    #[serde(default, alias = "team_id")]
    pub faction_id: Option<String>,
    /// Display name (`nickname` in history, `name` in match details)
    #[serde(default, alias = "name")]
    pub nickname: String,
    #[serde(default, alias = "roster")]
    pub players: Vec<FactionPlayer>,
}

impl Faction {
    pub fn player_ids(&self) -> impl Iterator<Item = &str> {
        self.players.iter().map(|p| p.player_id.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub faction1: Option<i32>,
    pub faction2: Option<i32>,
}

/// A match as reported by the provider; never persisted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMatch {
    pub match_id: String,
    pub status: MatchStatus,
    pub faction1: Faction,
    pub faction2: Faction,
    pub score: Score,
    /// `"faction1"` or `"faction2"` once decided
    pub winner: Option<String>,
    pub map: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub faceit_url: Option<String>,
    pub competition_name: Option<String>,
}

// ── Wire shapes ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RawMatch {
    match_id: String,
    #[serde(default, deserialize_with = "lenient_status")]
    status: MatchStatus,
    #[serde(default)]
    teams: RawTeams,
    #[serde(default)]
    results: Option<RawResults>,
    #[serde(default)]
    voting: Option<RawVoting>,
    #[serde(default)]
    started_at: Option<i64>,
    #[serde(default)]
    finished_at: Option<i64>,
    #[serde(default)]
    faceit_url: Option<String>,
    #[serde(default)]
    competition_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTeams {
    #[serde(default)]
    faction1: Faction,
    #[serde(default)]
    faction2: Faction,
}

#[derive(Debug, Default, Deserialize)]
struct RawResults {
    #[serde(default)]
    winner: Option<String>,
    #[serde(default)]
    score: Score,
}

#[derive(Debug, Default, Deserialize)]
struct RawVoting {
    #[serde(default)]
    map: Option<RawPick>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPick {
    #[serde(default)]
    pick: Vec<String>,
}

fn timestamp(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.filter(|s| *s > 0)
        .and_then(|s| DateTime::from_timestamp(s, 0))
}

impl From<RawMatch> for ProviderMatch {
    fn from(raw: RawMatch) -> Self {
        let results = raw.results.unwrap_or_default();
        let map = raw
            .voting
            .and_then(|v| v.map)
            .and_then(|m| m.pick.into_iter().next());
        ProviderMatch {
            match_id: raw.match_id,
            status: raw.status,
            faction1: raw.teams.faction1,
            faction2: raw.teams.faction2,
            score: results.score,
            winner: results.winner,
            map,
            started_at: timestamp(raw.started_at),
            finished_at: timestamp(raw.finished_at),
            faceit_url: raw.faceit_url.map(|u| u.replace("{lang}", "en")),
            competition_name: raw.competition_name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawHistoryPage {
    #[serde(default)]
    items: Vec<RawMatch>,
    #[serde(default)]
    start: u32,
    #[serde(default)]
    end: u32,
}

/// A page of a player's match history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchHistoryPage {
    pub items: Vec<ProviderMatch>,
    pub start: u32,
    pub end: u32,
}

impl From<RawHistoryPage> for MatchHistoryPage {
    fn from(raw: RawHistoryPage) -> Self {
        MatchHistoryPage {
            items: raw.items.into_iter().map(ProviderMatch::from).collect(),
            start: raw.start,
            end: raw.end,
        }
    }
}

// ── Profiles and stats ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameProfile {
    #[serde(default)]
    pub skill_level: Option<u32>,
    #[serde(default)]
    pub faceit_elo: Option<u32>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub game_player_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_id: String,
    pub nickname: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub games: HashMap<String, GameProfile>,
    #[serde(default)]
    pub faceit_url: Option<String>,
}

/// Lifetime and per-map stats; segment contents are passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player_id: String,
    pub game_id: String,
    #[serde(default)]
    pub lifetime: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub segments: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    #[serde(default)]
    pub rounds: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_entry_shape() {
        let raw: RawMatch = serde_json::from_value(serde_json::json!({
            "match_id": "1-abc",
            "status": "finished",
            "teams": {
                "faction1": {
                    "team_id": "t1",
                    "nickname": "team_alpha",
                    "players": [{ "player_id": "p1", "nickname": "alpha" }]
                },
                "faction2": {
                    "team_id": "t2",
                    "nickname": "team_bravo",
                    "players": [{ "player_id": "p9", "nickname": "bravo" }]
                }
            },
            "results": { "winner": "faction1", "score": { "faction1": 13, "faction2": 9 } },
            "started_at": 1700000000,
            "finished_at": 1700003600,
            "faceit_url": "https://www.faceit.com/{lang}/cs2/room/1-abc"
        }))
        .unwrap();
        let m = ProviderMatch::from(raw);
        assert_eq!(m.status, MatchStatus::Finished);
        assert_eq!(m.faction1.nickname, "team_alpha");
        assert_eq!(m.faction1.faction_id.as_deref(), Some("t1"));
        assert_eq!(m.score.faction1, Some(13));
        assert_eq!(m.winner.as_deref(), Some("faction1"));
        assert_eq!(
            m.faceit_url.as_deref(),
            Some("https://www.faceit.com/en/cs2/room/1-abc")
        );
        assert!(m.started_at.is_some());
        assert!(m.map.is_none());
    }

    #[test]
    fn test_match_detail_shape() {
        let raw: RawMatch = serde_json::from_value(serde_json::json!({
            "match_id": "1-live",
            "status": "ONGOING",
            "teams": {
                "faction1": {
                    "faction_id": "f1",
                    "name": "team_alpha",
                    "roster": [{ "player_id": "p1", "nickname": "alpha" }]
                },
                "faction2": {
                    "faction_id": "f2",
                    "name": "team_bravo",
                    "roster": []
                }
            },
            "voting": { "map": { "pick": ["de_ancient"] } }
        }))
        .unwrap();
        let m = ProviderMatch::from(raw);
        assert_eq!(m.status, MatchStatus::Ongoing);
        assert_eq!(m.faction1.nickname, "team_alpha");
        assert_eq!(m.faction1.player_ids().collect::<Vec<_>>(), vec!["p1"]);
        assert_eq!(m.map.as_deref(), Some("de_ancient"));
        assert_eq!(m.score, Score::default());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(MatchStatus::parse("finished"), MatchStatus::Finished);
        assert_eq!(MatchStatus::parse("CHECK_IN"), MatchStatus::Ready);
        assert_eq!(MatchStatus::parse("cancelled"), MatchStatus::Cancelled);
        assert_eq!(MatchStatus::parse("weird"), MatchStatus::Unknown);
    }

    #[test]
    fn test_missing_status_is_unknown() {
        let raw: RawMatch = serde_json::from_value(serde_json::json!({ "match_id": "x" })).unwrap();
        assert_eq!(ProviderMatch::from(raw).status, MatchStatus::Unknown);
    }
}
