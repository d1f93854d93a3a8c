mod common;

use std::sync::Arc;

use common::{
    FakeData, FakeReset, harness, icon, livestream_tag, reset_service, sample_data, tag, total,
    user,
};
use isupipe::{
    application::reset::ResetError,
    cache::{CacheEntity, content_hash},
};

#[tokio::test]
async fn full_load_populates_every_cache() {
    let h = harness(sample_data());

    let report = h.loader.load_all().await.expect("load succeeds");

    assert_eq!(report.generation, 1);
    assert_eq!(h.caches.generation(), 1);

    assert_eq!(h.caches.user(1).expect("alice").name, "alice");
    assert_eq!(h.caches.user(3).expect("carol").name, "carol");
    assert_eq!(h.caches.livestream(20).expect("stream 20").user_id, 2);
    assert!(h.caches.theme_for_user(1).expect("theme").dark_mode);

    assert_eq!(h.caches.user_total_reactions(1), 2);
    assert_eq!(h.caches.user_total_reactions(2), 5);
    // No reactions recorded for carol: the counter reads zero rather than missing.
    assert_eq!(h.caches.user_total_reactions(3), 0);
    assert_eq!(h.caches.user_total_tips(1), 300);
    assert_eq!(h.caches.user_total_tips(2), 0);
    assert_eq!(h.caches.livestream_total_reactions(20), 5);

    let alice_by_id = h.caches.icon_by_user(1).expect("icon by id");
    let alice_by_name = h.caches.icon_by_username("alice").expect("icon by name");
    assert!(Arc::ptr_eq(&alice_by_id, &alice_by_name));
    assert_eq!(alice_by_id.hash(), &content_hash(b"alice-png"));
    assert!(h.caches.icon_by_username("carol").is_none());

    let names: Vec<_> = h
        .caches
        .all_tags()
        .iter()
        .map(|tag| tag.name.clone())
        .collect();
    assert_eq!(names, ["music", "gaming"]);

    for entity in CacheEntity::LOAD_ORDER {
        let expected = match entity {
            CacheEntity::Icons => 2,
            CacheEntity::UserReactions | CacheEntity::LivestreamReactions => 2,
            CacheEntity::UserTips | CacheEntity::LivestreamTips => 1,
            CacheEntity::Livestreams | CacheEntity::Themes | CacheEntity::Tags => 2,
            CacheEntity::Users | CacheEntity::LivestreamTags => 3,
        };
        assert_eq!(report.rows_for(entity), expected, "rows for {entity}");
    }
}

#[tokio::test]
async fn loads_visit_entities_in_fixed_order() {
    let h = harness(sample_data());

    h.loader.load_all().await.expect("load succeeds");

    assert_eq!(h.source.calls(), CacheEntity::LOAD_ORDER.to_vec());
}

#[tokio::test]
async fn livestream_tips_are_loaded() {
    let h = harness(sample_data());

    h.loader.load_all().await.expect("load succeeds");

    assert_eq!(h.caches.livestream_total_tips(10), 300);
    assert_eq!(h.caches.livestream_total_tips(20), 0);
}

#[tokio::test]
async fn repeated_loads_over_unchanged_store_are_idempotent() {
    let h = harness(sample_data());

    h.loader.load_all().await.expect("first load");
    let first = h.caches.snapshot();
    h.loader.load_all().await.expect("second load");
    let second = h.caches.snapshot();

    assert_eq!(first, second);
    assert_eq!(h.caches.generation(), 2);
}

#[tokio::test]
async fn identical_images_share_one_hash() {
    let mut data = sample_data();
    data.icons = vec![
        icon(1, "alice", b"same-bytes"),
        icon(2, "bob", b"same-bytes"),
        icon(3, "carol", b"other-bytes"),
    ];
    let h = harness(data);

    h.loader.load_all().await.expect("load succeeds");

    let alice = h.caches.icon_by_user(1).expect("alice icon");
    let bob = h.caches.icon_by_user(2).expect("bob icon");
    let carol = h.caches.icon_by_user(3).expect("carol icon");
    assert_eq!(alice.hash(), bob.hash());
    assert!(Arc::ptr_eq(&alice, &bob));
    assert_ne!(alice.hash(), carol.hash());
}

#[tokio::test]
async fn reload_replaces_rather_than_merges() {
    let h = harness(sample_data());
    h.loader.load_all().await.expect("first load");

    h.source.replace(FakeData {
        users: vec![user(4, "dave")],
        user_reactions: vec![total(4, 1)],
        tags: vec![tag(9, "news")],
        ..Default::default()
    });
    h.loader.load_all().await.expect("second load");

    assert!(h.caches.user(1).is_none());
    assert_eq!(h.caches.user(4).expect("dave").name, "dave");
    assert_eq!(h.caches.user_total_reactions(1), 0);
    assert_eq!(h.caches.user_total_reactions(4), 1);
    assert!(h.caches.icon_by_username("alice").is_none());
    assert!(h.caches.livestream_tags(10).is_empty());
    assert_eq!(h.caches.all_tags().len(), 1);
}

#[tokio::test]
async fn reloading_a_users_icon_replaces_it_in_both_caches() {
    let h = harness(sample_data());
    h.loader.load_all().await.expect("first load");
    let before = h.caches.snapshot();

    let mut data = sample_data();
    data.icons = vec![icon(1, "alice", b"alice-v2"), icon(2, "bob", b"bob-png")];
    h.source.replace(data);
    h.loader.load_all().await.expect("second load");
    let after = h.caches.snapshot();

    let by_id = h.caches.icon_by_user(1).expect("icon by id");
    let by_name = h.caches.icon_by_username("alice").expect("icon by name");
    assert_eq!(by_id.hash(), &content_hash(b"alice-v2"));
    assert!(Arc::ptr_eq(&by_id, &by_name));
    assert_eq!(after.icons_by_user.len(), before.icons_by_user.len());
    assert_eq!(after.icons_by_username.len(), before.icons_by_username.len());
}

#[tokio::test]
async fn livestream_tags_keep_store_order() {
    let mut data = sample_data();
    data.livestream_tags = vec![
        livestream_tag(10, 3, "c"),
        livestream_tag(10, 1, "a"),
        livestream_tag(10, 2, "b"),
    ];
    let h = harness(data);

    h.loader.load_all().await.expect("load succeeds");

    let ids: Vec<_> = h.caches.livestream_tags(10).iter().map(|tag| tag.id).collect();
    assert_eq!(ids, [3, 1, 2]);
}

#[tokio::test]
async fn failing_entity_aborts_the_pass() {
    let h = harness(sample_data());
    h.source.fail_on(CacheEntity::Themes);

    let err = h.loader.load_all().await.expect_err("themes query fails");

    assert_eq!(err.entity, CacheEntity::Themes);
    assert_eq!(h.caches.generation(), 0);
    // Entities before the failure were refreshed, later ones never queried.
    assert_eq!(h.caches.user_total_reactions(2), 5);
    assert!(h.caches.user(1).is_none());
    assert!(!h.source.calls().contains(&CacheEntity::Users));
}

#[tokio::test]
async fn failed_reload_keeps_previous_contents() {
    let h = harness(sample_data());
    h.loader.load_all().await.expect("first load");

    h.source.fail_on(CacheEntity::Themes);
    h.loader.load_all().await.expect_err("themes query fails");

    assert!(h.caches.theme_for_user(1).expect("theme kept").dark_mode);
    assert_eq!(h.caches.user(1).expect("user kept").name, "alice");
    assert_eq!(h.caches.generation(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn readers_see_previous_contents_while_a_query_is_in_flight() {
    let h = harness(sample_data());
    h.loader.load_all().await.expect("first load");

    h.source.replace(FakeData {
        users: vec![user(4, "dave")],
        ..sample_data()
    });
    let pause = h.source.pause_on(CacheEntity::Users);

    let loader = Arc::clone(&h.loader);
    let reload = tokio::spawn(async move { loader.load_all().await });
    pause.reached.notified().await;

    // The users query is still running: the cache holds the last full load.
    assert_eq!(h.caches.user(1).expect("alice kept").name, "alice");
    assert_eq!(h.caches.user(3).expect("carol kept").name, "carol");
    assert!(h.caches.user(4).is_none());

    pause.release.notify_one();
    reload
        .await
        .expect("reload task")
        .expect("second load succeeds");

    assert!(h.caches.user(1).is_none());
    assert_eq!(h.caches.user(4).expect("dave").name, "dave");
}

#[tokio::test]
async fn reinitialize_resets_store_then_reloads() {
    let h = harness(sample_data());
    let reset = Arc::new(FakeReset::default());
    let service = reset_service(&h, reset.clone());

    let report = service.reinitialize().await.expect("reinitialize succeeds");

    assert_eq!(*reset.calls.lock().expect("calls lock"), 1);
    assert_eq!(report.generation, 1);
    assert_eq!(h.caches.user(2).expect("bob").name, "bob");
}

#[tokio::test]
async fn failed_store_reset_skips_reload() {
    let h = harness(sample_data());
    let reset = Arc::new(FakeReset {
        fail: true,
        ..Default::default()
    });
    let service = reset_service(&h, reset);

    let err = service.reinitialize().await.expect_err("reset fails");

    assert!(matches!(err, ResetError::Store(_)));
    assert!(h.source.calls().is_empty());
    assert_eq!(h.caches.generation(), 0);
}

#[tokio::test]
async fn concurrent_reinitialize_calls_are_serialized() {
    let h = harness(sample_data());
    let service = reset_service(&h, Arc::new(FakeReset::default()));

    let (first, second) = tokio::join!(service.reinitialize(), service.reinitialize());

    let mut generations = [
        first.expect("first call").generation,
        second.expect("second call").generation,
    ];
    generations.sort_unstable();
    assert_eq!(generations, [1, 2]);
    // Each pass ran to completion before the next began.
    let calls = h.source.calls();
    assert_eq!(&calls[..10], &CacheEntity::LOAD_ORDER[..]);
    assert_eq!(&calls[10..], &CacheEntity::LOAD_ORDER[..]);
}
