//! The set of entity caches served to request handlers.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::domain::entities::{LivestreamModel, Tag, ThemeModel, UserModel};

use super::{counter::SyncCounterMap, icon::Icon, list::SyncListMap, map::SyncMap};

/// One container per cached entity.
///
/// Only [`CacheLoader`](super::CacheLoader) writes to these containers; the
/// public surface is read-only, and every value it hands out is a snapshot
/// as of the last reload.
pub struct EntityCaches {
    pub(crate) icons_by_user: SyncMap<i64, Icon>,
    pub(crate) icons_by_username: SyncMap<String, Icon>,
    pub(crate) users: SyncMap<i64, UserModel>,
    pub(crate) livestreams: SyncMap<i64, LivestreamModel>,
    /// Keyed by the owning user's id.
    pub(crate) themes: SyncMap<i64, ThemeModel>,
    pub(crate) tags: SyncMap<i64, Tag>,
    pub(crate) livestream_tags: SyncListMap<i64, Tag>,
    pub(crate) user_total_reactions: SyncCounterMap<i64, i64>,
    pub(crate) livestream_total_reactions: SyncCounterMap<i64, i64>,
    pub(crate) user_total_tips: SyncCounterMap<i64, i64>,
    pub(crate) livestream_total_tips: SyncCounterMap<i64, i64>,
    generation: AtomicU64,
}

impl Default for EntityCaches {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityCaches {
    pub fn new() -> Self {
        Self {
            icons_by_user: SyncMap::new("icons_by_user"),
            icons_by_username: SyncMap::new("icons_by_username"),
            users: SyncMap::new("users"),
            livestreams: SyncMap::new("livestreams"),
            themes: SyncMap::new("themes"),
            tags: SyncMap::new("tags"),
            livestream_tags: SyncListMap::new("livestream_tags"),
            user_total_reactions: SyncCounterMap::new("user_total_reactions"),
            livestream_total_reactions: SyncCounterMap::new("livestream_total_reactions"),
            user_total_tips: SyncCounterMap::new("user_total_tips"),
            livestream_total_tips: SyncCounterMap::new("livestream_total_tips"),
            generation: AtomicU64::new(0),
        }
    }

    pub fn icon_by_user(&self, user_id: i64) -> Option<Arc<Icon>> {
        self.icons_by_user.get(&user_id)
    }

    pub fn icon_by_username(&self, username: &str) -> Option<Arc<Icon>> {
        self.icons_by_username.get(username)
    }

    pub fn user(&self, user_id: i64) -> Option<Arc<UserModel>> {
        self.users.get(&user_id)
    }

    pub fn livestream(&self, livestream_id: i64) -> Option<Arc<LivestreamModel>> {
        self.livestreams.get(&livestream_id)
    }

    pub fn theme_for_user(&self, user_id: i64) -> Option<Arc<ThemeModel>> {
        self.themes.get(&user_id)
    }

    pub fn tag(&self, tag_id: i64) -> Option<Arc<Tag>> {
        self.tags.get(&tag_id)
    }

    /// Every cached tag ordered by id.
    pub fn all_tags(&self) -> Vec<Arc<Tag>> {
        let mut tags = self.tags.values();
        tags.sort_by_key(|tag| tag.id);
        tags
    }

    /// Tags attached to a livestream, in store order.
    pub fn livestream_tags(&self, livestream_id: i64) -> Vec<Tag> {
        self.livestream_tags.get(&livestream_id)
    }

    pub fn user_total_reactions(&self, user_id: i64) -> i64 {
        self.user_total_reactions.get(&user_id)
    }

    pub fn livestream_total_reactions(&self, livestream_id: i64) -> i64 {
        self.livestream_total_reactions.get(&livestream_id)
    }

    pub fn user_total_tips(&self, user_id: i64) -> i64 {
        self.user_total_tips.get(&user_id)
    }

    pub fn livestream_total_tips(&self, livestream_id: i64) -> i64 {
        self.livestream_total_tips.get(&livestream_id)
    }

    /// Number of fully successful reload passes so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub(crate) fn advance_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Copy of every cache, one container at a time.
    ///
    /// Containers are read independently, so a snapshot taken during a reload
    /// can mix refreshed and stale entities.
    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            icons_by_user: self.icons_by_user.snapshot(),
            icons_by_username: self.icons_by_username.snapshot(),
            users: self.users.snapshot(),
            livestreams: self.livestreams.snapshot(),
            themes: self.themes.snapshot(),
            tags: self.tags.snapshot(),
            livestream_tags: self.livestream_tags.snapshot(),
            user_total_reactions: self.user_total_reactions.snapshot(),
            livestream_total_reactions: self.livestream_total_reactions.snapshot(),
            user_total_tips: self.user_total_tips.snapshot(),
            livestream_total_tips: self.livestream_total_tips.snapshot(),
        }
    }
}

/// Value copy of [`EntityCaches`]; equality compares entry contents.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSnapshot {
    pub icons_by_user: HashMap<i64, Arc<Icon>>,
    pub icons_by_username: HashMap<String, Arc<Icon>>,
    pub users: HashMap<i64, Arc<UserModel>>,
    pub livestreams: HashMap<i64, Arc<LivestreamModel>>,
    pub themes: HashMap<i64, Arc<ThemeModel>>,
    pub tags: HashMap<i64, Arc<Tag>>,
    pub livestream_tags: HashMap<i64, Vec<Tag>>,
    pub user_total_reactions: HashMap<i64, i64>,
    pub livestream_total_reactions: HashMap<i64, i64>,
    pub user_total_tips: HashMap<i64, i64>,
    pub livestream_total_tips: HashMap<i64, i64>,
}
