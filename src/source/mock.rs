//! Mock video source implementation for testing
//!
//! Provides an in-memory source that serves scripted catalogs and
//! failures without requiring a transport or a GPU.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;

use super::{BoxFuture, SourceError, VideoSource, VideoStream};
use crate::VideoId;

/// Counter for generating unique texture IDs
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Default)]
struct MockSourceState {
    catalog: Vec<VideoId>,
    failures: HashMap<VideoId, SourceError>,
    open_counts: HashMap<VideoId, u64>,
    disposed: Vec<VideoId>,
    deferred: bool,
}

/// Mock video source for testing
///
/// Serves streams from an in-memory catalog. Clones share state, so tests
/// can hand the source to a cache and still inspect open counts and the
/// dispose ledger afterwards.
#[derive(Clone, Debug, Default)]
pub struct MockSource {
    state: Arc<Mutex<MockSourceState>>,
}

impl MockSource {
    /// Create a new mock source with an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock source serving the given video ids
    pub fn with_catalog<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<VideoId>,
    {
        let source = Self::new();
        source.state.lock().catalog = ids.into_iter().map(Into::into).collect();
        source
    }

    /// Script a failure for the given id
    ///
    /// Subsequent `open` calls for that id fail with the scripted error
    /// until [`clear_failure`](Self::clear_failure) is called.
    pub fn fail_with(&self, id: impl Into<VideoId>, error: SourceError) {
        self.state.lock().failures.insert(id.into(), error);
    }

    /// Remove a scripted failure so the id loads normally again
    pub fn clear_failure(&self, id: &VideoId) {
        self.state.lock().failures.remove(id);
    }

    /// When enabled, `open` yields to the executor once before resolving
    ///
    /// This widens the suspension window so tests can drive concurrent
    /// requests into the in-flight path of the cache.
    pub fn set_deferred(&self, deferred: bool) {
        self.state.lock().deferred = deferred;
    }

    /// How many times `open` has been invoked for the given id
    pub fn open_count(&self, id: &VideoId) -> u64 {
        *self.state.lock().open_counts.get(id).unwrap_or(&0)
    }

    /// Ids whose textures have been disposed, in dispose order
    pub fn disposed(&self) -> Vec<VideoId> {
        self.state.lock().disposed.clone()
    }
}

/// Mock playable stream backed by a shared playing flag
#[derive(Clone, Debug)]
pub struct MockStream {
    /// The video id this stream plays
    pub id: VideoId,
    playing: Arc<AtomicBool>,
}

impl MockStream {
    fn new(id: VideoId) -> Self {
        Self {
            id,
            playing: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl VideoStream for MockStream {
    fn play(&self) {
        self.playing.store(true, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

/// Mock renderable texture derived from a [`MockStream`]
#[derive(Clone, Debug)]
pub struct MockTexture {
    /// Unique identifier
    pub id: u64,
    /// The video id the texture was derived from
    pub video: VideoId,
}

impl VideoSource for MockSource {
    type Stream = MockStream;
    type Texture = MockTexture;

    fn list(&self) -> BoxFuture<'_, Result<Vec<VideoId>, SourceError>> {
        Box::pin(async move { Ok(self.state.lock().catalog.clone()) })
    }

    fn open(&self, id: &VideoId) -> BoxFuture<'_, Result<Self::Stream, SourceError>> {
        let id = id.clone();
        Box::pin(async move {
            let deferred = {
                let mut state = self.state.lock();
                *state.open_counts.entry(id.clone()).or_insert(0) += 1;
                state.deferred
            };

            if deferred {
                yield_once().await;
            }

            let state = self.state.lock();
            if let Some(error) = state.failures.get(&id) {
                return Err(error.clone());
            }
            if !state.catalog.contains(&id) {
                return Err(SourceError::NotFound(id));
            }
            Ok(MockStream::new(id))
        })
    }

    fn create_texture(&self, stream: &Self::Stream) -> Self::Texture {
        MockTexture {
            id: next_id(),
            video: stream.id.clone(),
        }
    }

    fn dispose_texture(&self, texture: &Self::Texture) {
        self.state.lock().disposed.push(texture.video.clone());
    }
}

/// Future that returns `Pending` exactly once before resolving
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

async fn yield_once() {
    YieldOnce(false).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_open_from_catalog() {
        let source = MockSource::with_catalog(["a", "b"]);
        let stream = block_on(source.open(&VideoId::new("a"))).unwrap();

        assert_eq!(stream.id, VideoId::new("a"));
        assert!(!stream.is_playing());
        assert_eq!(source.open_count(&VideoId::new("a")), 1);
    }

    #[test]
    fn test_open_unknown_id() {
        let source = MockSource::with_catalog(["a"]);
        let result = block_on(source.open(&VideoId::new("missing")));

        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[test]
    fn test_scripted_failure_and_recovery() {
        let source = MockSource::with_catalog(["a"]);
        let id = VideoId::new("a");
        source.fail_with(
            "a",
            SourceError::Io {
                id: id.clone(),
                message: "connection reset".to_string(),
            },
        );

        assert!(block_on(source.open(&id)).is_err());

        source.clear_failure(&id);
        assert!(block_on(source.open(&id)).is_ok());
    }

    #[test]
    fn test_stream_playback_flag() {
        let source = MockSource::with_catalog(["a"]);
        let stream = block_on(source.open(&VideoId::new("a"))).unwrap();

        stream.play();
        assert!(stream.is_playing());
        stream.pause();
        assert!(!stream.is_playing());
    }

    #[test]
    fn test_dispose_ledger() {
        let source = MockSource::with_catalog(["a"]);
        let stream = block_on(source.open(&VideoId::new("a"))).unwrap();
        let texture = source.create_texture(&stream);

        source.dispose_texture(&texture);
        assert_eq!(source.disposed(), vec![VideoId::new("a")]);
    }

    #[test]
    fn test_deferred_open_still_resolves() {
        let source = MockSource::with_catalog(["a"]);
        source.set_deferred(true);

        let stream = block_on(source.open(&VideoId::new("a"))).unwrap();
        assert_eq!(stream.id, VideoId::new("a"));
    }
}
