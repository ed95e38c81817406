//! Placeholder matches used when the provider is unconfigured or the
//! reconcile fails outright. One match per registered team, same shape as a
//! real result so consumers need no special casing.

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;

use super::{FilteredMatchResult, MatchView, OpponentInfo};
use crate::faceit::{Faction, FactionPlayer, MatchStatus, ProviderMatch, Score};
use crate::roster::RegisteredTeam;

pub const SYNTHETIC_PREFIX: &str = "local_";
const SYNTHETIC_MAP: &str = "de_mirage";
const SYNTHETIC_OPPONENT: &str = "Opponent TBD";
const ROUNDS_TO_WIN: i32 = 13;

pub fn generate(teams: &[RegisteredTeam], view: MatchView) -> Vec<FilteredMatchResult> {
    let mut rng = rand::thread_rng();
    let now = Utc::now();

    teams
        .iter()
        .enumerate()
        .map(|(i, team)| {
            let (status, score, winner, started_at, finished_at) = match view {
                MatchView::Live => {
                    let score = Score {
                        faction1: Some(rng.gen_range(0..ROUNDS_TO_WIN)),
                        faction2: Some(rng.gen_range(0..ROUNDS_TO_WIN)),
                    };
                    (MatchStatus::Ongoing, score, None, now - ChronoDuration::minutes(30), None)
                }
                MatchView::History { .. } => {
                    let loser = rng.gen_range(0..ROUNDS_TO_WIN - 1);
                    let we_won = rng.gen_bool(0.5);
                    let score = if we_won {
                        Score { faction1: Some(ROUNDS_TO_WIN), faction2: Some(loser) }
                    } else {
                        Score { faction1: Some(loser), faction2: Some(ROUNDS_TO_WIN) }
                    };
                    let winner = if we_won { "faction1" } else { "faction2" };
                    let started = now - ChronoDuration::hours(i as i64 + 2);
                    (
                        MatchStatus::Finished,
                        score,
                        Some(winner.to_string()),
                        started,
                        Some(started + ChronoDuration::minutes(45)),
                    )
                }
            };

            let match_data = ProviderMatch {
                match_id: format!(
                    "{}{}_{}_{}",
                    SYNTHETIC_PREFIX,
                    view_tag(view),
                    team.id,
                    now.timestamp_millis()
                ),
                status,
                faction1: Faction {
                    faction_id: None,
                    nickname: team.name.clone(),
                    players: team
                        .faceit_player_ids
                        .iter()
                        .map(|id| FactionPlayer {
                            player_id: id.clone(),
                            nickname: String::new(),
                        })
                        .collect(),
                },
                faction2: Faction {
                    faction_id: None,
                    nickname: SYNTHETIC_OPPONENT.to_string(),
                    players: Vec::new(),
                },
                score,
                winner,
                map: Some(SYNTHETIC_MAP.to_string()),
                started_at: Some(started_at),
                finished_at,
                faceit_url: None,
                competition_name: None,
            };

            FilteredMatchResult {
                match_data,
                registered_team: team.clone(),
                opponent_info: OpponentInfo::new(SYNTHETIC_OPPONENT),
            }
        })
        .collect()
}

fn view_tag(view: MatchView) -> &'static str {
    match view {
        MatchView::Live => "live",
        MatchView::History { .. } => "history",
    }
}

pub fn is_synthetic(m: &ProviderMatch) -> bool {
    m.match_id.starts_with(SYNTHETIC_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashSet};

    fn team(id: i64, name: &str) -> RegisteredTeam {
        RegisteredTeam {
            id,
            name: name.to_string(),
            faceit_team_id: None,
            players: Vec::new(),
            faceit_player_ids: BTreeSet::new(),
        }
    }

    #[test]
    fn test_one_result_per_team_with_unique_ids() {
        let teams = vec![team(1, "Ronin PT"), team(2, "Lusitanos")];
        let results = generate(&teams, MatchView::Live);
        assert_eq!(results.len(), 2);
        let ids: HashSet<_> = results.iter().map(|r| r.match_data.match_id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert!(results.iter().all(|r| is_synthetic(&r.match_data)));
        assert_eq!(results[0].match_data.faction1.nickname, "Ronin PT");
        assert_eq!(results[0].match_data.map.as_deref(), Some(SYNTHETIC_MAP));
    }

    #[test]
    fn test_history_scores_have_a_winner() {
        let results = generate(&[team(1, "Ronin PT")], MatchView::History { limit: 10 });
        let m = &results[0].match_data;
        assert_eq!(m.status, MatchStatus::Finished);
        let (a, b) = (m.score.faction1.unwrap(), m.score.faction2.unwrap());
        assert!(a == ROUNDS_TO_WIN || b == ROUNDS_TO_WIN);
        assert_ne!(a, b);
        assert!(m.finished_at.is_some());
    }

    #[test]
    fn test_live_scores_are_plausible() {
        for r in generate(&[team(1, "A"), team(2, "B")], MatchView::Live) {
            let m = &r.match_data;
            assert_eq!(m.status, MatchStatus::Ongoing);
            assert!(m.score.faction1.unwrap() < ROUNDS_TO_WIN);
            assert!(m.winner.is_none());
            assert!(r.opponent_info.temp_data());
        }
    }
}
