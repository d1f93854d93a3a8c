//! Store adapter boundary the cache reloads from.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{LivestreamModel, Tag, ThemeModel, UserModel};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("failed to decode column `{column}`: {message}")]
    Decode { column: String, message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Icon image joined with the owning user's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRow {
    pub user_id: i64,
    pub username: String,
    pub image: Vec<u8>,
}

/// One aggregated group: the grouping key and its total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalRow {
    pub key: i64,
    pub total: i64,
}

/// One `livestream_tags` association with the tag name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivestreamTagRow {
    pub livestream_id: i64,
    pub tag_id: i64,
    pub tag_name: String,
}

/// Bulk, read-only queries the cache loader needs. Each call returns every
/// row required to rebuild one entity cache.
///
/// Aggregating sources (`*_totals`) group and sum on the store side and return
/// one row per group.
#[async_trait]
pub trait CacheSource: Send + Sync {
    async fn icons(&self) -> Result<Vec<IconRow>, RepoError>;
    /// Reactions received on each user's livestreams.
    async fn user_reaction_totals(&self) -> Result<Vec<TotalRow>, RepoError>;
    async fn livestream_reaction_totals(&self) -> Result<Vec<TotalRow>, RepoError>;
    /// Tips received on each user's livestreams.
    async fn user_tip_totals(&self) -> Result<Vec<TotalRow>, RepoError>;
    async fn livestream_tip_totals(&self) -> Result<Vec<TotalRow>, RepoError>;
    async fn livestreams(&self) -> Result<Vec<LivestreamModel>, RepoError>;
    async fn themes(&self) -> Result<Vec<ThemeModel>, RepoError>;
    async fn users(&self) -> Result<Vec<UserModel>, RepoError>;
    /// Associations in store order; the cache preserves it per livestream.
    async fn livestream_tags(&self) -> Result<Vec<LivestreamTagRow>, RepoError>;
    async fn tags(&self) -> Result<Vec<Tag>, RepoError>;
    async fn ping(&self) -> Result<(), RepoError>;
}
