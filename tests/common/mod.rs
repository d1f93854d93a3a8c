#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use isupipe::{
    application::{
        repos::{CacheSource, IconRow, LivestreamTagRow, RepoError, TotalRow},
        reset::{ResetService, StoreReset, StoreResetError},
    },
    cache::{CacheEntity, CacheLoader, EntityCaches},
    domain::entities::{LivestreamModel, Tag, ThemeModel, UserModel},
};
use tokio::sync::Notify;

/// Rows served by [`FakeSource`]; tests mutate it between loads.
#[derive(Debug, Clone, Default)]
pub struct FakeData {
    pub icons: Vec<IconRow>,
    pub user_reactions: Vec<TotalRow>,
    pub livestream_reactions: Vec<TotalRow>,
    pub user_tips: Vec<TotalRow>,
    pub livestream_tips: Vec<TotalRow>,
    pub livestreams: Vec<LivestreamModel>,
    pub themes: Vec<ThemeModel>,
    pub users: Vec<UserModel>,
    pub livestream_tags: Vec<LivestreamTagRow>,
    pub tags: Vec<Tag>,
}

/// Holds one entity's query open until the test releases it.
#[derive(Clone)]
pub struct Pause {
    pub entity: CacheEntity,
    pub reached: Arc<Notify>,
    pub release: Arc<Notify>,
}

/// In-memory store double that records which queries ran and can be told to
/// fail or stall one entity.
#[derive(Default)]
pub struct FakeSource {
    pub data: Mutex<FakeData>,
    pub fail_on: Mutex<Option<CacheEntity>>,
    pub pause: Mutex<Option<Pause>>,
    pub calls: Mutex<Vec<CacheEntity>>,
}

impl FakeSource {
    pub fn with_data(data: FakeData) -> Arc<Self> {
        Arc::new(Self {
            data: Mutex::new(data),
            ..Default::default()
        })
    }

    pub fn fail_on(&self, entity: CacheEntity) {
        *self.fail_on.lock().expect("fail_on lock") = Some(entity);
    }

    /// Stall the next query for `entity`; `reached` fires once it is in
    /// flight and the query completes after `release` is notified.
    pub fn pause_on(&self, entity: CacheEntity) -> Pause {
        let pause = Pause {
            entity,
            reached: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };
        *self.pause.lock().expect("pause lock") = Some(pause.clone());
        pause
    }

    async fn hold_if_paused(&self, entity: CacheEntity) {
        let pause = {
            let mut slot = self.pause.lock().expect("pause lock");
            slot.take_if(|pause| pause.entity == entity)
        };
        if let Some(pause) = pause {
            pause.reached.notify_one();
            pause.release.notified().await;
        }
    }

    pub fn replace(&self, data: FakeData) {
        *self.data.lock().expect("data lock") = data;
    }

    pub fn calls(&self) -> Vec<CacheEntity> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn serve<T: Clone>(
        &self,
        entity: CacheEntity,
        pick: impl FnOnce(&FakeData) -> &Vec<T>,
    ) -> Result<Vec<T>, RepoError> {
        self.calls.lock().expect("calls lock").push(entity);
        if *self.fail_on.lock().expect("fail_on lock") == Some(entity) {
            return Err(RepoError::Persistence(format!("{entity} query failed")));
        }
        let data = self.data.lock().expect("data lock");
        Ok(pick(&data).clone())
    }
}

#[async_trait]
impl CacheSource for FakeSource {
    async fn icons(&self) -> Result<Vec<IconRow>, RepoError> {
        self.hold_if_paused(CacheEntity::Icons).await;
        self.serve(CacheEntity::Icons, |data| &data.icons)
    }

    async fn user_reaction_totals(&self) -> Result<Vec<TotalRow>, RepoError> {
        self.hold_if_paused(CacheEntity::UserReactions).await;
        self.serve(CacheEntity::UserReactions, |data| &data.user_reactions)
    }

    async fn livestream_reaction_totals(&self) -> Result<Vec<TotalRow>, RepoError> {
        self.hold_if_paused(CacheEntity::LivestreamReactions).await;
        self.serve(CacheEntity::LivestreamReactions, |data| {
            &data.livestream_reactions
        })
    }

    async fn user_tip_totals(&self) -> Result<Vec<TotalRow>, RepoError> {
        self.hold_if_paused(CacheEntity::UserTips).await;
        self.serve(CacheEntity::UserTips, |data| &data.user_tips)
    }

    async fn livestream_tip_totals(&self) -> Result<Vec<TotalRow>, RepoError> {
        self.hold_if_paused(CacheEntity::LivestreamTips).await;
        self.serve(CacheEntity::LivestreamTips, |data| &data.livestream_tips)
    }

    async fn livestreams(&self) -> Result<Vec<LivestreamModel>, RepoError> {
        self.hold_if_paused(CacheEntity::Livestreams).await;
        self.serve(CacheEntity::Livestreams, |data| &data.livestreams)
    }

    async fn themes(&self) -> Result<Vec<ThemeModel>, RepoError> {
        self.hold_if_paused(CacheEntity::Themes).await;
        self.serve(CacheEntity::Themes, |data| &data.themes)
    }

    async fn users(&self) -> Result<Vec<UserModel>, RepoError> {
        self.hold_if_paused(CacheEntity::Users).await;
        self.serve(CacheEntity::Users, |data| &data.users)
    }

    async fn livestream_tags(&self) -> Result<Vec<LivestreamTagRow>, RepoError> {
        self.hold_if_paused(CacheEntity::LivestreamTags).await;
        self.serve(CacheEntity::LivestreamTags, |data| &data.livestream_tags)
    }

    async fn tags(&self) -> Result<Vec<Tag>, RepoError> {
        self.hold_if_paused(CacheEntity::Tags).await;
        self.serve(CacheEntity::Tags, |data| &data.tags)
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Store reset double; counts invocations and optionally fails.
#[derive(Default)]
pub struct FakeReset {
    pub fail: bool,
    pub calls: Mutex<usize>,
}

#[async_trait]
impl StoreReset for FakeReset {
    async fn reset(&self) -> Result<(), StoreResetError> {
        *self.calls.lock().expect("calls lock") += 1;
        if self.fail {
            return Err(StoreResetError::Failed {
                status: "exit status: 1".to_string(),
                output: "init failed".to_string(),
            });
        }
        Ok(())
    }
}

pub fn user(id: i64, name: &str) -> UserModel {
    UserModel {
        id,
        name: name.to_string(),
        display_name: format!("{name} display"),
        description: String::new(),
        password: "$2a$04$hash".to_string(),
    }
}

pub fn livestream(id: i64, user_id: i64) -> LivestreamModel {
    LivestreamModel {
        id,
        user_id,
        title: format!("stream {id}"),
        description: String::new(),
        playlist_url: format!("https://media.example/{id}.m3u8"),
        thumbnail_url: format!("https://media.example/{id}.jpg"),
        start_at: 1_700_000_000,
        end_at: 1_700_003_600,
    }
}

pub fn tag(id: i64, name: &str) -> Tag {
    Tag {
        id,
        name: name.to_string(),
    }
}

pub fn total(key: i64, total: i64) -> TotalRow {
    TotalRow { key, total }
}

pub fn icon(user_id: i64, username: &str, image: &[u8]) -> IconRow {
    IconRow {
        user_id,
        username: username.to_string(),
        image: image.to_vec(),
    }
}

pub fn livestream_tag(livestream_id: i64, tag_id: i64, tag_name: &str) -> LivestreamTagRow {
    LivestreamTagRow {
        livestream_id,
        tag_id,
        tag_name: tag_name.to_string(),
    }
}

/// Three users, two livestreams by user 1 and 2, and a handful of totals.
pub fn sample_data() -> FakeData {
    FakeData {
        icons: vec![icon(1, "alice", b"alice-png"), icon(2, "bob", b"bob-png")],
        user_reactions: vec![total(1, 2), total(2, 5)],
        livestream_reactions: vec![total(10, 2), total(20, 5)],
        user_tips: vec![total(1, 300)],
        livestream_tips: vec![total(10, 300)],
        livestreams: vec![livestream(10, 1), livestream(20, 2)],
        themes: vec![
            ThemeModel {
                id: 1,
                user_id: 1,
                dark_mode: true,
            },
            ThemeModel {
                id: 2,
                user_id: 2,
                dark_mode: false,
            },
        ],
        users: vec![user(1, "alice"), user(2, "bob"), user(3, "carol")],
        livestream_tags: vec![
            livestream_tag(10, 2, "gaming"),
            livestream_tag(10, 1, "music"),
            livestream_tag(20, 1, "music"),
        ],
        tags: vec![tag(1, "music"), tag(2, "gaming")],
    }
}

pub struct Harness {
    pub source: Arc<FakeSource>,
    pub caches: Arc<EntityCaches>,
    pub loader: Arc<CacheLoader>,
}

pub fn harness(data: FakeData) -> Harness {
    let source = FakeSource::with_data(data);
    let caches = Arc::new(EntityCaches::new());
    let loader = Arc::new(CacheLoader::new(caches.clone(), source.clone()));
    Harness {
        source,
        caches,
        loader,
    }
}

pub fn reset_service(harness: &Harness, reset: Arc<FakeReset>) -> Arc<ResetService> {
    Arc::new(ResetService::new(reset, harness.loader.clone()))
}
