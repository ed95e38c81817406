use thiserror::Error;

/// Failures surfaced by the FACEIT client.
///
/// A 404 is not represented here: single-entity lookups map it to `Ok(None)`.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key configured.
    #[error("FACEIT API key is not configured")]
    NotConfigured,

    #[error("FACEIT API returned {status} for {url}")]
    Http { status: u16, url: String },

    #[error("FACEIT request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to decode FACEIT response: {0}")]
    Decode(String),

    #[error("FACEIT request timed out")]
    Timeout,
}
