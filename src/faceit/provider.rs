use async_trait::async_trait;

use super::models::ProviderMatch;
use crate::error::ProviderError;

/// Source of per-player match data consumed by the reconciliation engine.
#[async_trait]
pub trait MatchProvider: Send + Sync {
    /// Matches currently in progress for the player.
    async fn live_matches(&self, player_id: &str) -> Result<Vec<ProviderMatch>, ProviderError>;

    /// The player's most recent matches, newest first.
    async fn recent_matches(
        &self,
        player_id: &str,
        limit: u32,
    ) -> Result<Vec<ProviderMatch>, ProviderError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

