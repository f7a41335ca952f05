//! Integration tests for the bounded cache's eviction behavior

use std::future::Future;
use std::task::{Context, Poll};

use futures::executor::block_on;
use futures::task::noop_waker;
use video_globe::{CacheError, MockSource, VideoCache, VideoId, VideoStream};

fn id(name: &str) -> VideoId {
    VideoId::new(name)
}

/// The end-to-end scenario: capacity 2, A and B loaded, A touched, C loaded.
/// B has the lowest access time and must be the one evicted and disposed.
#[test]
fn test_touch_steers_eviction_to_lru_entry() {
    let source = MockSource::with_catalog(["A", "B", "C"]);
    let cache = VideoCache::new(source.clone(), 2);

    block_on(cache.get_or_create(&id("A"))).unwrap();
    block_on(cache.get_or_create(&id("B"))).unwrap();
    assert_eq!(cache.len(), 2);

    cache.touch(&id("A"));
    block_on(cache.get_or_create(&id("C"))).unwrap();

    assert!(cache.contains(&id("A")));
    assert!(cache.contains(&id("C")));
    assert!(!cache.contains(&id("B")));
    assert_eq!(source.disposed(), vec![id("B")]);
}

#[test]
fn test_capacity_invariant_over_long_sequence() {
    let names: Vec<String> = (0..40).map(|index| format!("v{index}")).collect();
    let source = MockSource::with_catalog(names.iter().map(String::as_str));
    let cache = VideoCache::new(source.clone(), 5);

    for name in &names {
        block_on(cache.get_or_create(&VideoId::new(name.clone()))).unwrap();
        assert!(cache.len() <= 5);
    }

    assert_eq!(cache.len(), 5);
    assert_eq!(source.disposed().len(), 35);
    assert_eq!(cache.metrics().evictions(), 35);
}

#[test]
fn test_fresh_insert_survives_its_own_eviction_pass() {
    let source = MockSource::with_catalog(["a", "b"]);
    let cache = VideoCache::new(source, 1);

    block_on(cache.get_or_create(&id("a"))).unwrap();
    block_on(cache.get_or_create(&id("b"))).unwrap();

    // the just-inserted entry carries the newest access time, so the
    // older entry is the one that goes
    assert!(cache.contains(&id("b")));
    assert!(!cache.contains(&id("a")));
}

#[test]
fn test_eviction_pauses_playback_before_removal() {
    let source = MockSource::with_catalog(["a", "b"]);
    let cache = VideoCache::new(source.clone(), 1);

    let evicted = block_on(cache.get_or_create(&id("a"))).unwrap();
    assert!(cache.play_exclusive(&id("a")));
    assert!(evicted.stream.is_playing());

    block_on(cache.get_or_create(&id("b"))).unwrap();

    assert!(!evicted.stream.is_playing());
    assert_eq!(source.disposed(), vec![id("a")]);
}

#[test]
fn test_evict_all_disposes_each_entry_once() {
    let source = MockSource::with_catalog(["a", "b", "c"]);
    let cache = VideoCache::new(source.clone(), 4);

    for name in ["a", "b", "c"] {
        block_on(cache.get_or_create(&id(name))).unwrap();
    }
    cache.evict_all();
    cache.evict_all();

    assert!(cache.is_empty());
    let mut disposed = source.disposed();
    disposed.sort();
    assert_eq!(disposed, vec![id("a"), id("b"), id("c")]);
}

#[test]
fn test_teardown_with_load_in_flight() {
    let source = MockSource::with_catalog(["a"]);
    source.set_deferred(true);
    let cache = VideoCache::new(source.clone(), 4);
    let video = id("a");
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);

    let mut leader = Box::pin(cache.get_or_create(&video));
    assert!(leader.as_mut().poll(&mut cx).is_pending());
    let mut waiter = Box::pin(cache.get_or_create(&video));
    assert!(waiter.as_mut().poll(&mut cx).is_pending());

    cache.evict_all();

    // teardown dropped the waiter's channel
    match waiter.as_mut().poll(&mut cx) {
        Poll::Ready(Err(CacheError::TornDown)) => {}
        other => panic!("expected TornDown for the waiter, got {other:?}"),
    }

    // the leader's load completes, but the handle is released instead of
    // inserted into the torn-down cache
    match leader.as_mut().poll(&mut cx) {
        Poll::Ready(Err(CacheError::TornDown)) => {}
        other => panic!("expected TornDown for the late leader, got {other:?}"),
    }
    assert!(cache.is_empty());
    assert_eq!(source.disposed(), vec![video.clone()]);
}

#[test]
fn test_drop_releases_cached_resources() {
    let source = MockSource::with_catalog(["a"]);
    {
        let cache = VideoCache::new(source.clone(), 4);
        block_on(cache.get_or_create(&id("a"))).unwrap();
    }
    assert_eq!(source.disposed(), vec![id("a")]);
}
