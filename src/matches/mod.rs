//! Match reconciliation: provider matches restricted to registered teams.
//!
//! For every registered team with FACEIT ids, every id is looked up at the
//! provider (bounded concurrency, per-lookup timeout). A match is kept when
//! one of its factions belongs to the team, and each match id is emitted at
//! most once per call. Provider failures only drop the affected lookup, and
//! the batch deadline only drops lookups still in flight. An unconfigured
//! provider or a failed reconcile task yields synthetic matches.

pub mod synthetic;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::faceit::{Faction, MatchProvider, ProviderMatch};
use crate::roster::{RegisteredTeam, RosterResolver};

const UNKNOWN_OPPONENT: &str = "Unknown opponent";

/// The non-registered side of a match. Always ephemeral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentInfo {
    pub name: String,
    #[serde(skip_deserializing, default = "ephemeral")]
    temp_data: bool,
}

fn ephemeral() -> bool {
    true
}

impl OpponentInfo {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        OpponentInfo {
            name: if name.trim().is_empty() {
                UNKNOWN_OPPONENT.to_string()
            } else {
                name
            },
            temp_data: ephemeral(),
        }
    }

    pub fn temp_data(&self) -> bool {
        self.temp_data
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredMatchResult {
    #[serde(rename = "match")]
    pub match_data: ProviderMatch,
    pub registered_team: RegisteredTeam,
    pub opponent_info: OpponentInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Faction1,
    Faction2,
}

/// Which faction of `m` belongs to `team`.
///
/// A faction belongs to the team when any one of its listed players carries
/// one of the team's FACEIT ids, so incomplete rosters still match. faction1
/// is checked first: when both factions hold the team's players, faction1 is
/// the team's side and faction2 the opponent.
pub fn attribute_sides(m: &ProviderMatch, team: &RegisteredTeam) -> Option<Side> {
    if team.owns_any(m.faction1.player_ids()) {
        Some(Side::Faction1)
    } else if team.owns_any(m.faction2.player_ids()) {
        Some(Side::Faction2)
    } else {
        None
    }
}

impl FilteredMatchResult {
    /// Pair a provider match with the team owning one of its sides.
    pub fn attribute(m: ProviderMatch, team: &RegisteredTeam) -> Option<Self> {
        let opponent: &Faction = match attribute_sides(&m, team)? {
            Side::Faction1 => &m.faction2,
            Side::Faction2 => &m.faction1,
        };
        let opponent_info = OpponentInfo::new(opponent.nickname.clone());
        Some(FilteredMatchResult {
            match_data: m,
            registered_team: team.clone(),
            opponent_info,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchView {
    Live,
    History { limit: u32 },
}

#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    pub max_concurrent_lookups: usize,
    /// Deadline for one player lookup (a live lookup may issue several requests)
    pub lookup_timeout: Duration,
    /// Deadline for a whole reconcile; lookups still running then are dropped
    pub batch_timeout: Duration,
    pub default_history_limit: u32,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        ReconcileSettings {
            max_concurrent_lookups: 4,
            lookup_timeout: Duration::from_secs(10),
            batch_timeout: Duration::from_secs(120),
            default_history_limit: 10,
        }
    }
}

/// Entry point for filtered match views.
///
/// `provider` is `None` when no FACEIT credential is configured; that is
/// decided once at startup.
#[derive(Clone)]
pub struct MatchReconciler {
    roster: RosterResolver,
    provider: Option<Arc<dyn MatchProvider>>,
    settings: ReconcileSettings,
}

impl MatchReconciler {
    pub fn new(
        roster: RosterResolver,
        provider: Option<Arc<dyn MatchProvider>>,
        settings: ReconcileSettings,
    ) -> Self {
        MatchReconciler {
            roster,
            provider,
            settings,
        }
    }

    pub async fn filtered_live_matches(&self) -> Vec<FilteredMatchResult> {
        self.filtered(MatchView::Live).await
    }

    /// Recent matches; `None` uses the configured default lookback.
    pub async fn filtered_match_history(&self, limit: Option<u32>) -> Vec<FilteredMatchResult> {
        let limit = limit.unwrap_or(self.settings.default_history_limit).max(1);
        self.filtered(MatchView::History { limit }).await
    }

    async fn filtered(&self, view: MatchView) -> Vec<FilteredMatchResult> {
        let teams = self.roster.get_registered_teams();
        if teams.is_empty() {
            return Vec::new();
        }

        let Some(provider) = &self.provider else {
            debug!("No FACEIT credential, serving synthetic {:?} matches", view);
            return synthetic::generate(&teams, view);
        };

        let task = tokio::spawn(reconcile(
            Arc::clone(provider),
            teams.clone(),
            view,
            self.settings.clone(),
        ));
        match task.await {
            Ok(results) => {
                info!(
                    "{} {:?} match(es) for {} registered team(s) via {}",
                    results.len(),
                    view,
                    teams.len(),
                    provider.name()
                );
                results
            }
            Err(e) => {
                warn!("Reconcile task failed ({}), serving synthetic {:?} matches", e, view);
                synthetic::generate(&teams, view)
            }
        }
    }
}

/// Look up every team × player pair and attribute the results.
///
/// Lookups finished before `batch_timeout` are kept; the rest are dropped.
async fn reconcile(
    provider: Arc<dyn MatchProvider>,
    teams: Vec<RegisteredTeam>,
    view: MatchView,
    settings: ReconcileSettings,
) -> Vec<FilteredMatchResult> {
    let lookups: Vec<(usize, String)> = teams
        .iter()
        .enumerate()
        .flat_map(|(idx, team)| team.faceit_player_ids.iter().map(move |id| (idx, id.clone())))
        .collect();
    let total = lookups.len();
    let lookup_timeout = settings.lookup_timeout;

    let deadline = tokio::time::sleep(settings.batch_timeout);
    let mut fetched: Vec<(usize, usize, Vec<ProviderMatch>)> =
        stream::iter(lookups.into_iter().enumerate())
            .map(|(seq, (idx, player_id))| {
                let provider = Arc::clone(&provider);
                async move {
                    let matches =
                        fetch_player_matches(provider.as_ref(), &player_id, view, lookup_timeout)
                            .await;
                    (seq, idx, matches)
                }
            })
            .buffer_unordered(settings.max_concurrent_lookups.max(1))
            .take_until(deadline)
            .collect()
            .await;

    if fetched.len() < total {
        warn!(
            "Reconcile deadline {:?} reached, {} of {} lookup(s) dropped",
            settings.batch_timeout,
            total - fetched.len(),
            total
        );
    }

    // Back to team × player order, so dedup keeps the first occurrence.
    fetched.sort_by_key(|(seq, _, _)| *seq);
    dedup_attributed(
        &teams,
        fetched.into_iter().map(|(_, idx, matches)| (idx, matches)).collect(),
    )
}

/// Attribute every fetched match to its team (by index) and keep the first
/// result per match id.
fn dedup_attributed(
    teams: &[RegisteredTeam],
    fetched: Vec<(usize, Vec<ProviderMatch>)>,
) -> Vec<FilteredMatchResult> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut results = Vec::new();
    for (idx, matches) in fetched {
        let team = &teams[idx];
        for m in matches {
            if seen.contains(&m.match_id) {
                continue;
            }
            if let Some(result) = FilteredMatchResult::attribute(m, team) {
                seen.insert(result.match_data.match_id.clone());
                results.push(result);
            }
        }
    }
    results
}

async fn fetch_player_matches(
    provider: &dyn MatchProvider,
    player_id: &str,
    view: MatchView,
    lookup_timeout: Duration,
) -> Vec<ProviderMatch> {
    let call = async {
        match view {
            MatchView::Live => provider.live_matches(player_id).await,
            MatchView::History { limit } => provider.recent_matches(player_id, limit).await,
        }
    };
    match tokio::time::timeout(lookup_timeout, call).await {
        Ok(Ok(matches)) => matches,
        Ok(Err(e)) => {
            warn!("{} lookup for player {} failed: {}", provider.name(), player_id, e);
            Vec::new()
        }
        Err(_) => {
            warn!(
                "{} lookup for player {} timed out after {:?}",
                provider.name(),
                player_id,
                lookup_timeout
            );
            Vec::new()
        }
    }
}
