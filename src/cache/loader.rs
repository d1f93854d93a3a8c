//! Full-reload protocol for the entity caches.

use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use metrics::{counter, gauge, histogram};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::{
    application::repos::{CacheSource, RepoError, TotalRow},
    domain::entities::Tag,
};

use super::{counter::SyncCounterMap, entities::EntityCaches, icon::IconInterner};

const METRIC_LOAD_MS: &str = "isupipe_cache_load_ms";
const METRIC_LOAD_FAILURES: &str = "isupipe_cache_load_failures_total";
const METRIC_GENERATION: &str = "isupipe_cache_generation";

/// Entities refreshed by a load pass, in the order the pass visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheEntity {
    Icons,
    UserReactions,
    LivestreamReactions,
    UserTips,
    Livestreams,
    Themes,
    Users,
    LivestreamTags,
    Tags,
    LivestreamTips,
}

impl CacheEntity {
    pub const LOAD_ORDER: [CacheEntity; 10] = [
        CacheEntity::Icons,
        CacheEntity::UserReactions,
        CacheEntity::LivestreamReactions,
        CacheEntity::UserTips,
        CacheEntity::Livestreams,
        CacheEntity::Themes,
        CacheEntity::Users,
        CacheEntity::LivestreamTags,
        CacheEntity::Tags,
        CacheEntity::LivestreamTips,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheEntity::Icons => "icons",
            CacheEntity::UserReactions => "user_reactions",
            CacheEntity::LivestreamReactions => "livestream_reactions",
            CacheEntity::UserTips => "user_tips",
            CacheEntity::Livestreams => "livestreams",
            CacheEntity::Themes => "themes",
            CacheEntity::Users => "users",
            CacheEntity::LivestreamTags => "livestream_tags",
            CacheEntity::Tags => "tags",
            CacheEntity::LivestreamTips => "livestream_tips",
        }
    }
}

impl fmt::Display for CacheEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("failed to load `{entity}` cache: {source}")]
pub struct CacheLoadError {
    pub entity: CacheEntity,
    #[source]
    pub source: RepoError,
}

/// Outcome of a successful pass.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub generation: u64,
    pub elapsed: Duration,
    /// Rows fetched per entity, in load order.
    pub rows: Vec<(CacheEntity, usize)>,
}

impl LoadReport {
    pub fn rows_for(&self, entity: CacheEntity) -> usize {
        self.rows
            .iter()
            .find(|(candidate, _)| *candidate == entity)
            .map(|(_, rows)| *rows)
            .unwrap_or(0)
    }
}

/// Rebuilds every entity cache from a [`CacheSource`].
///
/// Each entity is queried first and then swapped in whole, so a reader sees
/// either the previous contents of a cache or the reloaded ones. The first
/// failing query aborts the pass: caches visited earlier hold their new
/// contents, the failing one and every later one keep their old contents.
pub struct CacheLoader {
    caches: Arc<EntityCaches>,
    source: Arc<dyn CacheSource>,
}

impl CacheLoader {
    pub fn new(caches: Arc<EntityCaches>, source: Arc<dyn CacheSource>) -> Self {
        Self { caches, source }
    }

    #[instrument(skip(self))]
    pub async fn load_all(&self) -> Result<LoadReport, CacheLoadError> {
        let started_at = Instant::now();

        let mut rows = Vec::with_capacity(CacheEntity::LOAD_ORDER.len());
        for entity in CacheEntity::LOAD_ORDER {
            match self.load_entity(entity).await {
                Ok(count) => rows.push((entity, count)),
                Err(source) => {
                    let err = CacheLoadError { entity, source };
                    counter!(METRIC_LOAD_FAILURES, "entity" => entity.as_str()).increment(1);
                    histogram!(METRIC_LOAD_MS, "outcome" => "error")
                        .record(started_at.elapsed().as_secs_f64() * 1000.0);
                    error!(
                        target = "isupipe::cache::loader",
                        entity = %entity,
                        error = %err.source,
                        "Cache load aborted"
                    );
                    return Err(err);
                }
            }
        }

        let generation = self.caches.advance_generation();
        let elapsed = started_at.elapsed();
        histogram!(METRIC_LOAD_MS, "outcome" => "ok").record(elapsed.as_secs_f64() * 1000.0);
        gauge!(METRIC_GENERATION).set(generation as f64);

        info!(
            target = "isupipe::cache::loader",
            generation,
            elapsed_ms = elapsed.as_millis() as u64,
            "Cache load complete"
        );

        Ok(LoadReport {
            generation,
            elapsed,
            rows,
        })
    }

    async fn load_entity(&self, entity: CacheEntity) -> Result<usize, RepoError> {
        let caches = &self.caches;
        let count = match entity {
            CacheEntity::Icons => self.load_icons().await?,
            CacheEntity::UserReactions => {
                let rows = self.source.user_reaction_totals().await?;
                replace_totals(&caches.user_total_reactions, rows)
            }
            CacheEntity::LivestreamReactions => {
                let rows = self.source.livestream_reaction_totals().await?;
                replace_totals(&caches.livestream_total_reactions, rows)
            }
            CacheEntity::UserTips => {
                let rows = self.source.user_tip_totals().await?;
                replace_totals(&caches.user_total_tips, rows)
            }
            CacheEntity::LivestreamTips => {
                let rows = self.source.livestream_tip_totals().await?;
                replace_totals(&caches.livestream_total_tips, rows)
            }
            CacheEntity::Livestreams => {
                let rows = self.source.livestreams().await?;
                let count = rows.len();
                caches
                    .livestreams
                    .replace_all(rows.into_iter().map(|livestream| (livestream.id, livestream)));
                count
            }
            CacheEntity::Themes => {
                let rows = self.source.themes().await?;
                let count = rows.len();
                caches
                    .themes
                    .replace_all(rows.into_iter().map(|theme| (theme.user_id, theme)));
                count
            }
            CacheEntity::Users => {
                let rows = self.source.users().await?;
                let count = rows.len();
                caches
                    .users
                    .replace_all(rows.into_iter().map(|user| (user.id, user)));
                count
            }
            CacheEntity::LivestreamTags => {
                let rows = self.source.livestream_tags().await?;
                let count = rows.len();
                caches.livestream_tags.replace_all(rows.into_iter().map(|row| {
                    (
                        row.livestream_id,
                        Tag {
                            id: row.tag_id,
                            name: row.tag_name,
                        },
                    )
                }));
                count
            }
            CacheEntity::Tags => {
                let rows = self.source.tags().await?;
                let count = rows.len();
                caches
                    .tags
                    .replace_all(rows.into_iter().map(|tag| (tag.id, tag)));
                count
            }
        };

        debug!(
            target = "isupipe::cache::loader",
            entity = %entity,
            rows = count,
            "Entity cache reloaded"
        );
        Ok(count)
    }

    async fn load_icons(&self) -> Result<usize, RepoError> {
        let rows = self.source.icons().await?;
        let count = rows.len();

        let mut interner = IconInterner::default();
        let mut by_user = Vec::with_capacity(count);
        let mut by_username = Vec::with_capacity(count);
        for row in rows {
            let icon = interner.intern(row.image);
            by_user.push((row.user_id, Arc::clone(&icon)));
            by_username.push((row.username, icon));
        }

        self.caches.icons_by_user.replace_all_shared(by_user);
        self.caches.icons_by_username.replace_all_shared(by_username);

        debug!(
            target = "isupipe::cache::loader",
            rows = count,
            distinct_images = interner.distinct(),
            "Icons hashed"
        );
        Ok(count)
    }
}

fn replace_totals(target: &SyncCounterMap<i64, i64>, rows: Vec<TotalRow>) -> usize {
    let count = rows.len();
    target.replace_all(rows.into_iter().map(|row| (row.key, row.total)));
    count
}
