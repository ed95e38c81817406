use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::models::{
    MatchHistoryPage, MatchStats, MatchStatus, PlayerProfile, PlayerStats, ProviderMatch,
    RawHistoryPage, RawMatch, GAME_ID,
};
use super::provider::MatchProvider;
use crate::config::MAX_LIVE_LOOKBACK;
use crate::error::ProviderError;

/// Client for the FACEIT Data API v4.
///
/// No retries: a failed call is reported once and the caller decides whether
/// it means "absent".
#[derive(Clone)]
pub struct FaceitClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
    live_lookback: u32,
}

impl FaceitClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid FACEIT API URL: {}", base_url))?;
        Ok(FaceitClient {
            http,
            base_url,
            api_key,
            live_lookback: MAX_LIVE_LOOKBACK,
        })
    }

    /// History entries inspected by live detection, capped at 10.
    pub fn with_live_lookback(mut self, lookback: u32) -> Self {
        self.live_lookback = lookback.clamp(1, MAX_LIVE_LOOKBACK);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or(ProviderError::NotConfigured)
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ProviderError::Decode(format!("base URL cannot hold a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// GET a JSON document; 404 is `Ok(None)`.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, ProviderError> {
        let api_key = self.api_key()?;
        debug!("FACEIT GET {}", url);

        let resp = self
            .http
            .get(url.clone())
            .bearer_auth(api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.bytes().await.map_err(classify)?;
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    // ── Single-entity lookups (errors propagate) ─────────────────────────────

    /// Look up a player by FACEIT nickname.
    pub async fn get_player_by_nickname(
        &self,
        nickname: &str,
    ) -> Result<Option<PlayerProfile>, ProviderError> {
        let url = self.endpoint(&["players"], &[("nickname", nickname.to_string())])?;
        self.get_json(url).await
    }

    pub async fn get_player_stats(
        &self,
        player_id: &str,
        game: &str,
    ) -> Result<Option<PlayerStats>, ProviderError> {
        let url = self.endpoint(&["players", player_id, "stats", game], &[])?;
        self.get_json(url).await
    }

    // ── Best-effort lookups (errors become None) ─────────────────────────────

    pub async fn try_player_match_history(
        &self,
        player_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Option<MatchHistoryPage>, ProviderError> {
        let url = self.endpoint(
            &["players", player_id, "history"],
            &[
                ("game", GAME_ID.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ],
        )?;
        let page: Option<RawHistoryPage> = self.get_json(url).await?;
        Ok(page.map(MatchHistoryPage::from))
    }

    pub async fn get_player_match_history(
        &self,
        player_id: &str,
        limit: u32,
        offset: u32,
    ) -> Option<MatchHistoryPage> {
        best_effort(
            "match history",
            player_id,
            self.try_player_match_history(player_id, limit, offset).await,
        )
    }

    pub async fn try_match_details(
        &self,
        match_id: &str,
    ) -> Result<Option<ProviderMatch>, ProviderError> {
        let url = self.endpoint(&["matches", match_id], &[])?;
        let raw: Option<RawMatch> = self.get_json(url).await?;
        Ok(raw.map(ProviderMatch::from))
    }

    pub async fn get_match_details(&self, match_id: &str) -> Option<ProviderMatch> {
        best_effort("match details", match_id, self.try_match_details(match_id).await)
    }

    pub async fn try_match_stats(
        &self,
        match_id: &str,
    ) -> Result<Option<MatchStats>, ProviderError> {
        let url = self.endpoint(&["matches", match_id, "stats"], &[])?;
        self.get_json(url).await
    }

    pub async fn get_match_stats(&self, match_id: &str) -> Option<MatchStats> {
        best_effort("match stats", match_id, self.try_match_stats(match_id).await)
    }

    /// ONGOING entries among the player's most recent history, each replaced
    /// by its detail record when that lookup succeeds.
    ///
    /// One detail request per ongoing entry, bounded by the lookback size.
    pub async fn try_player_live_matches(
        &self,
        player_id: &str,
    ) -> Result<Vec<ProviderMatch>, ProviderError> {
        let page = self
            .try_player_match_history(player_id, self.live_lookback, 0)
            .await?
            .unwrap_or_default();

        let mut live = Vec::new();
        for entry in page.items {
            if entry.status != MatchStatus::Ongoing {
                continue;
            }
            match self.get_match_details(&entry.match_id).await {
                Some(detail) => live.push(detail),
                None => live.push(entry),
            }
        }
        Ok(live)
    }

    pub async fn get_player_live_matches(&self, player_id: &str) -> Vec<ProviderMatch> {
        best_effort(
            "live matches",
            player_id,
            self.try_player_live_matches(player_id).await.map(Some),
        )
        .unwrap_or_default()
    }
}

#[async_trait]
impl MatchProvider for FaceitClient {
    fn name(&self) -> &str {
        "FACEIT"
    }

    async fn live_matches(&self, player_id: &str) -> Result<Vec<ProviderMatch>, ProviderError> {
        self.try_player_live_matches(player_id).await
    }

    async fn recent_matches(
        &self,
        player_id: &str,
        limit: u32,
    ) -> Result<Vec<ProviderMatch>, ProviderError> {
        Ok(self
            .try_player_match_history(player_id, limit, 0)
            .await?
            .map(|page| page.items)
            .unwrap_or_default())
    }
}

fn classify(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Network(e)
    }
}

fn best_effort<T>(what: &str, id: &str, result: Result<Option<T>, ProviderError>) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("FACEIT {} lookup for {} failed: {}", what, id, e);
            None
        }
    }
}
