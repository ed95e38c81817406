pub mod client;
pub mod models;
pub mod provider;

pub use client::FaceitClient;
pub use models::{Faction, FactionPlayer, MatchStatus, ProviderMatch, Score};
pub use provider::MatchProvider;
