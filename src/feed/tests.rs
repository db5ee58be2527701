use super::*;
use crate::adapter::tests::{MockCollectionStore, Write};
use crate::error::ErrorKind;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use serde_json::json;
use std::cell::Cell;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn raw(id: &str, secs: i64) -> RawReminder {
    RawReminder::new(
        id,
        json!({ "title": id, "dateTime": { "seconds": secs, "nanoseconds": 0 } }),
    )
}

fn ids(state: &FeedState) -> Vec<String> {
    state.records.iter().map(|r| r.id.clone()).collect()
}

/// 在 LocalPool 上运行的提醒列表，时钟固定
fn setup() -> (LocalPool, MockCollectionStore, ReminderFeed<MockCollectionStore>) {
    let pool = LocalPool::new();
    let spawner = pool.spawner();
    let store = MockCollectionStore::new();
    let feed = ReminderFeed::with_clock(
        store.clone(),
        move |fut| spawner.spawn_local(fut).expect("spawn feed pump"),
        || at(1_000),
    );
    (pool, store, feed)
}

#[test]
fn test_no_session_yields_empty_list_without_subscribing() {
    let (mut pool, store, feed) = setup();
    feed.switch_session(None);
    pool.run_until_stalled();

    let state = feed.state();
    assert!(state.records.is_empty());
    assert!(!state.loading);
    assert_eq!(store.subscribe_count(), 0);
}

#[test]
fn test_snapshot_order_is_preserved() {
    let (mut pool, store, feed) = setup();
    feed.switch_session(Some("u1"));
    assert!(feed.state().loading);

    // 存储按 dateTime 升序投递；本地不再排序
    store.push(0, Ok(vec![raw("t1", 100), raw("t2", 200), raw("t3", 300)]));
    pool.run_until_stalled();
    assert_eq!(ids(&feed.state()), vec!["t1", "t2", "t3"]);
    assert!(!feed.state().loading);

    // 即使投递顺序看起来不对，也原样镜像
    store.push(0, Ok(vec![raw("t3", 300), raw("t1", 100), raw("t2", 200)]));
    pool.run_until_stalled();
    assert_eq!(ids(&feed.state()), vec!["t3", "t1", "t2"]);
}

#[test]
fn test_missing_time_defaults_to_clock() {
    let (mut pool, store, feed) = setup();
    feed.switch_session(Some("u1"));
    store.push(0, Ok(vec![RawReminder::new("r", json!({ "message": "drink water" }))]));
    pool.run_until_stalled();

    let state = feed.state();
    assert_eq!(state.records[0].date_time, at(1_000));
    assert_eq!(state.records[0].label(), "drink water");
}

#[test]
fn test_switch_tears_down_previous_before_subscribing() {
    let (mut pool, store, feed) = setup();
    feed.switch_session(Some("a"));
    pool.run_until_stalled();
    feed.switch_session(Some("b"));
    feed.switch_session(None);

    assert_eq!(
        store.events(),
        vec!["subscribe:a", "teardown:a", "subscribe:b", "teardown:b"]
    );
}

#[test]
fn test_same_session_does_not_resubscribe() {
    let (_pool, store, feed) = setup();
    feed.switch_session(Some("a"));
    feed.switch_session(Some("a"));
    assert_eq!(store.subscribe_count(), 1);
}

#[test]
fn test_late_snapshot_from_previous_user_is_discarded() {
    let (mut pool, store, feed) = setup();
    feed.switch_session(Some("a"));
    pool.run_until_stalled();

    // "a" 的快照已进入通道，但在消费之前会话切换到 "b"
    assert!(store.push(0, Ok(vec![raw("a-secret", 100)])));
    feed.switch_session(Some("b"));
    pool.run_until_stalled();

    let state = feed.state();
    assert!(state.records.is_empty());
    assert!(state.loading);
    assert_eq!(feed.owner().as_deref(), Some("b"));

    // 已退订的通道不再接收
    assert!(!store.push(0, Ok(vec![raw("a-later", 100)])));

    store.push(1, Ok(vec![raw("b-1", 100)]));
    pool.run_until_stalled();
    assert_eq!(ids(&feed.state()), vec!["b-1"]);
}

#[test]
fn test_subscription_error_keeps_last_snapshot() {
    let (mut pool, store, feed) = setup();
    feed.switch_session(Some("u1"));
    store.push(0, Ok(vec![raw("kept", 100)]));
    pool.run_until_stalled();

    store.push(0, Err(MedizapError::permission_denied("Missing or insufficient permissions")));
    pool.run_until_stalled();

    let state = feed.state();
    assert_eq!(ids(&state), vec!["kept"]);
    assert!(!state.loading);
    assert_eq!(state.error.as_ref().map(|e| e.kind), Some(ErrorKind::PermissionDenied));

    // 下一次成功快照清除错误
    store.push(0, Ok(vec![]));
    pool.run_until_stalled();
    assert!(feed.state().error.is_none());
}

#[test]
fn test_listener_sees_every_change() {
    let (mut pool, store, feed) = setup();
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let probe = feed.clone();
    feed.set_listener(move |state| {
        counter.set(counter.get() + 1);
        // 监听中读取状态不会触发借用冲突
        assert_eq!(probe.state(), *state);
    });

    feed.switch_session(Some("u1"));
    store.push(0, Ok(vec![raw("x", 100)]));
    pool.run_until_stalled();
    feed.switch_session(None);

    assert_eq!(calls.get(), 3);
}

#[test]
fn test_writes_without_session_fail_without_remote_call() {
    let (mut pool, store, feed) = setup();
    let err = pool
        .run_until(feed.add(NewReminder::new("t", "m", at(5))))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthenticated);
    assert!(store.writes().is_empty());
}

#[test]
fn test_two_adds_are_independent() {
    let (mut pool, store, feed) = setup();
    feed.switch_session(Some("u1"));
    store.script(Err(MedizapError::network("offline")));

    let first = feed.add(NewReminder::new("first", "", at(10)));
    let second = feed.add(NewReminder::new("second", "", at(20)));
    let (first, second) = pool.run_until(futures::future::join(first, second));

    assert_eq!(first.unwrap_err().kind, ErrorKind::Network);
    assert_eq!(second.unwrap(), "doc-1");
    assert_eq!(store.writes().len(), 2);
    // 写入不会改变本地镜像
    assert!(feed.state().records.is_empty());
}

#[test]
fn test_dismiss_and_remove_proxy_to_store() {
    let (mut pool, store, feed) = setup();
    feed.switch_session(Some("u1"));

    pool.run_until(feed.dismiss("r1")).unwrap();
    pool.run_until(feed.remove("r2")).unwrap();
    pool.run_until(feed.update("r3", ReminderPatch::default())).unwrap();

    assert_eq!(
        store.writes(),
        vec![
            Write::Update("u1".into(), "r1".into(), ReminderPatch::dismiss()),
            Write::Remove("u1".into(), "r2".into()),
        ]
    );
}

#[test]
fn test_dropping_last_handle_unsubscribes() {
    let (mut pool, store, feed) = setup();
    feed.switch_session(Some("u1"));
    pool.run_until_stalled();
    drop(feed);
    pool.run_until_stalled();
    assert_eq!(store.events(), vec!["subscribe:u1", "teardown:u1"]);
}

#[test]
fn test_upcoming_card() {
    let (mut pool, store, feed) = setup();
    feed.switch_session(Some("u1"));
    store.push(
        0,
        Ok(vec![
            raw("past", 500),
            raw("a", 1_100),
            raw("b", 1_200),
            raw("c", 1_300),
            raw("d", 1_400),
        ]),
    );
    pool.run_until_stalled();

    let next: Vec<_> = feed
        .state()
        .upcoming(at(1_000), medizap_shared::UPCOMING_CARD_LIMIT)
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(next, vec!["a", "b", "c"]);
}
