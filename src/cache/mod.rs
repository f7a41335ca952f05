//! Bounded video caching with LRU eviction and load coalescing
//!
//! This module provides the caching layer for live video streams and their
//! derived textures, holding at most a fixed number of expensive resources
//! at once. Concurrent requests for the same id are coalesced so a video is
//! never opened twice in parallel.

pub mod metrics;

use std::collections::HashMap;

use futures::channel::oneshot;
use parking_lot::Mutex;
use thiserror::Error;

use crate::source::{SourceError, VideoSource, VideoStream};
use crate::VideoId;

// Re-export metrics types
pub use metrics::{CacheMetrics, CacheMetricsHandle};

/// Default number of live video resources held at once
pub const DEFAULT_CAPACITY: usize = 25;

/// Error type for cache operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The source could not open the video; the id stays absent and retryable
    #[error("Failed to load video {id}: {reason}")]
    LoadFailed { id: VideoId, reason: String },

    /// The cache was torn down while this load was in flight
    #[error("Video cache torn down while a load was in flight")]
    TornDown,
}

/// One live video resource: a playable stream plus its renderable texture
///
/// Handles are cheap to clone; clones share the underlying stream and
/// texture state. The cache releases that state exactly once, on eviction
/// or teardown, so a handle must not be held across cache operations that
/// may evict it.
pub struct VideoHandle<S: VideoSource> {
    /// Stable identifier of the video
    pub id: VideoId,
    /// Playable stream opened by the source
    pub stream: S::Stream,
    /// Renderable projection of the stream
    pub texture: S::Texture,
}

impl<S: VideoSource> Clone for VideoHandle<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            stream: self.stream.clone(),
            texture: self.texture.clone(),
        }
    }
}

impl<S: VideoSource> std::fmt::Debug for VideoHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoHandle")
            .field("id", &self.id)
            .field("stream", &self.stream)
            .field("texture", &self.texture)
            .finish()
    }
}

struct CacheEntry<S: VideoSource> {
    handle: VideoHandle<S>,
    /// Logical access time; strictly increases on every access
    last_used: u64,
    /// Tie-break for equal `last_used`: earliest-inserted wins eviction
    insert_seq: u64,
}

type Waiter<S> = oneshot::Sender<Result<VideoHandle<S>, CacheError>>;

struct CacheState<S: VideoSource> {
    entries: HashMap<VideoId, CacheEntry<S>>,
    /// Waiters keyed by id; presence of a key marks an in-flight load
    pending: HashMap<VideoId, Vec<Waiter<S>>>,
    tick: u64,
    seq: u64,
}

impl<S: VideoSource> CacheState<S> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            pending: HashMap::new(),
            tick: 0,
            seq: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

enum Claim<S: VideoSource> {
    Wait(oneshot::Receiver<Result<VideoHandle<S>, CacheError>>),
    Lead,
}

/// Removes the leader's `pending` claim on drop and fails any registered
/// waiters, keeping the id retryable when the leading future is dropped
/// at its suspension point. No-op once `finish_load` has taken the key.
struct LeadGuard<'a, S: VideoSource> {
    cache: &'a VideoCache<S>,
    id: &'a VideoId,
}

impl<S: VideoSource> Drop for LeadGuard<'_, S> {
    fn drop(&mut self) {
        let waiters = {
            let mut state = self.cache.state.lock();
            match state.pending.remove(self.id) {
                Some(waiters) => waiters,
                None => return,
            }
        };
        log::warn!("video {} load abandoned mid-flight", self.id);
        let error = CacheError::LoadFailed {
            id: self.id.clone(),
            reason: "load abandoned before completion".to_string(),
        };
        for tx in waiters {
            let _ = tx.send(Err(error.clone()));
        }
    }
}

/// Manages live video resources with LRU eviction and load coalescing
///
/// Generic over the injected [`VideoSource`] capability. All mutating
/// operations serialize on one internal lock, which is never held across
/// the source's suspension point.
pub struct VideoCache<S: VideoSource> {
    state: Mutex<CacheState<S>>,
    source: S,
    capacity: usize,
    metrics: CacheMetricsHandle,
}

impl<S: VideoSource> VideoCache<S> {
    /// Creates a new cache holding at most `capacity` live videos
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(source: S, capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be positive");
        Self {
            state: Mutex::new(CacheState::new()),
            source,
            capacity,
            metrics: CacheMetricsHandle::new(),
        }
    }

    /// Creates a new cache with the default capacity of 25
    pub fn with_default_capacity(source: S) -> Self {
        Self::new(source, DEFAULT_CAPACITY)
    }

    /// Get a reference to the injected source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The fixed capacity set at construction
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Whether a live entry exists for the given id
    pub fn contains(&self, id: &VideoId) -> bool {
        self.state.lock().entries.contains_key(id)
    }

    /// Get a reference to the metrics handle
    pub fn metrics(&self) -> &CacheMetricsHandle {
        &self.metrics
    }

    /// Gets the handle for `id`, opening the video if necessary
    ///
    /// A cache hit returns immediately without suspending. If a load for
    /// the same id is already in flight the call suspends until that load
    /// resolves and shares its outcome; otherwise this call performs the
    /// load itself and fans the result out to every waiter. On failure the
    /// id remains absent and eligible for retry.
    pub async fn get_or_create(&self, id: &VideoId) -> Result<VideoHandle<S>, CacheError> {
        let claim = {
            let mut state = self.state.lock();
            let now = state.next_tick();
            if let Some(entry) = state.entries.get_mut(id) {
                entry.last_used = now;
                self.metrics.record_hit();
                return Ok(entry.handle.clone());
            }

            if let Some(waiters) = state.pending.get_mut(id) {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Claim::Wait(rx)
            } else {
                state.pending.insert(id.clone(), Vec::new());
                self.metrics.record_miss();
                Claim::Lead
            }
        };

        match claim {
            Claim::Wait(rx) => match rx.await {
                Ok(result) => result,
                Err(_cancelled) => Err(CacheError::TornDown),
            },
            Claim::Lead => {
                // the claim must not outlive this future if it is dropped
                // while suspended in `open`
                let _guard = LeadGuard { cache: self, id };
                let opened = self.source.open(id).await;
                self.finish_load(id, opened)
            }
        }
    }

    /// Bump `id`'s access time so it becomes the least eviction-worthy entry
    ///
    /// No-op when the id is not cached.
    pub fn touch(&self, id: &VideoId) {
        let mut state = self.state.lock();
        let now = state.next_tick();
        if let Some(entry) = state.entries.get_mut(id) {
            entry.last_used = now;
        }
    }

    /// Gets the live handle for `id`, bumping its access time
    pub fn handle(&self, id: &VideoId) -> Option<VideoHandle<S>> {
        let mut state = self.state.lock();
        let now = state.next_tick();
        let entry = state.entries.get_mut(id)?;
        entry.last_used = now;
        Some(entry.handle.clone())
    }

    /// Starts playback on `id` and pauses every other cached stream
    ///
    /// Returns false when the id is not cached (failed load, evicted, or
    /// never requested); callers treat that as "no target". Synchronous,
    /// never suspends.
    pub fn play_exclusive(&self, id: &VideoId) -> bool {
        let mut state = self.state.lock();
        if !state.entries.contains_key(id) {
            return false;
        }
        let now = state.next_tick();
        for (entry_id, entry) in state.entries.iter_mut() {
            if entry_id == id {
                entry.last_used = now;
                entry.handle.stream.play();
            } else {
                entry.handle.stream.pause();
            }
        }
        true
    }

    /// Pauses every cached stream
    pub fn pause_all(&self) {
        let state = self.state.lock();
        for entry in state.entries.values() {
            entry.handle.stream.pause();
        }
    }

    /// Releases every cached resource and abandons pending loads
    ///
    /// Used on session teardown. Waiters on in-flight loads fail with
    /// [`CacheError::TornDown`]; a load that later completes is dropped by
    /// its leader without being inserted.
    pub fn evict_all(&self) {
        let (released, waiters) = {
            let mut state = self.state.lock();
            let released: Vec<_> = state.entries.drain().map(|(_, entry)| entry).collect();
            let waiters: Vec<_> = state.pending.drain().collect();
            (released, waiters)
        };
        for entry in released {
            self.release(entry);
        }
        // Dropping the senders cancels the receivers
        drop(waiters);
    }

    fn finish_load(
        &self,
        id: &VideoId,
        opened: Result<S::Stream, SourceError>,
    ) -> Result<VideoHandle<S>, CacheError> {
        match opened {
            Ok(stream) => {
                let texture = self.source.create_texture(&stream);
                let handle = VideoHandle {
                    id: id.clone(),
                    stream,
                    texture,
                };

                let mut state = self.state.lock();
                // pending key absent means evict_all ran while we were
                // loading; the handle is released instead of inserted
                let Some(waiters) = state.pending.remove(id) else {
                    drop(state);
                    return self.discard_orphan(handle);
                };
                let now = state.next_tick();
                state.seq += 1;
                let seq = state.seq;
                state.entries.insert(
                    id.clone(),
                    CacheEntry {
                        handle: handle.clone(),
                        last_used: now,
                        insert_seq: seq,
                    },
                );
                let released = Self::take_over_capacity(&mut state, self.capacity);
                debug_assert!(state.entries.len() <= self.capacity);
                drop(state);

                for entry in released {
                    self.release(entry);
                }
                self.metrics.record_load();
                for tx in waiters {
                    let _ = tx.send(Ok(handle.clone()));
                }
                Ok(handle)
            }
            Err(source_error) => {
                let waiters = self
                    .state
                    .lock()
                    .pending
                    .remove(id)
                    .unwrap_or_default();
                let error = CacheError::LoadFailed {
                    id: id.clone(),
                    reason: source_error.to_string(),
                };
                self.metrics.record_load_failure();
                log::warn!("video {id} failed to load: {source_error}");
                for tx in waiters {
                    let _ = tx.send(Err(error.clone()));
                }
                Err(error)
            }
        }
    }

    fn discard_orphan(&self, handle: VideoHandle<S>) -> Result<VideoHandle<S>, CacheError> {
        handle.stream.pause();
        self.source.dispose_texture(&handle.texture);
        Err(CacheError::TornDown)
    }

    /// Removes least-recently-used entries until the capacity bound holds
    fn take_over_capacity(state: &mut CacheState<S>, capacity: usize) -> Vec<CacheEntry<S>> {
        let mut released = Vec::new();
        while state.entries.len() > capacity {
            let victim = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.last_used, entry.insert_seq))
                .map(|(victim_id, _)| victim_id.clone());
            let Some(victim) = victim else { break };
            if let Some(entry) = state.entries.remove(&victim) {
                released.push(entry);
            }
        }
        released
    }

    /// Stops playback and disposes the texture, exactly once per entry
    fn release(&self, entry: CacheEntry<S>) {
        entry.handle.stream.pause();
        self.source.dispose_texture(&entry.handle.texture);
        self.metrics.record_eviction();
        log::debug!("evicted video {} from cache", entry.handle.id);
    }
}

impl<S: VideoSource> Drop for VideoCache<S> {
    fn drop(&mut self) {
        self.evict_all();
    }
}
