//! Video source abstraction for backend-agnostic stream loading
//!
//! This module provides traits and implementations for opening playable
//! video streams and deriving renderable textures from them, allowing the
//! globe to work with any transport (HTTP range requests, local files,
//! mocks for testing).

pub mod mock;

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::VideoId;

/// A boxed future that can be sent across threads
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error type for video source operations
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    #[error("Video {0} not found")]
    NotFound(VideoId),

    #[error("I/O failure opening video {id}: {message}")]
    Io { id: VideoId, message: String },

    #[error("Video listing failed: {0}")]
    ListFailed(String),
}

/// A playable video stream handle
///
/// Streams are cheap to clone (clones share the underlying playback state)
/// and stay valid until the source's dispose hook runs for the owning
/// cache entry.
pub trait VideoStream: Clone + Send + Sync + Debug {
    /// Start playback
    fn play(&self);

    /// Pause playback
    fn pause(&self);

    /// Whether the stream is currently playing
    fn is_playing(&self) -> bool;
}

/// Core video source trait for backend-agnostic stream loading
///
/// This trait abstracts the video transport, allowing the cache to work
/// with any backend through associated types.
///
/// # Associated Types
/// - `Stream`: the playable stream type for this backend
/// - `Texture`: the renderable projection of a stream
///
/// # Example
/// ```ignore
/// let source = MockSource::with_catalog(["a", "b"]);
/// let stream = source.open(&VideoId::new("a")).await?;
/// let texture = source.create_texture(&stream);
/// ```
pub trait VideoSource: Send + Sync {
    /// Playable stream type for this backend
    type Stream: VideoStream;

    /// Renderable texture type derived from a stream
    type Texture: Clone + Send + Sync + Debug;

    /// List the available video ids
    fn list(&self) -> BoxFuture<'_, Result<Vec<VideoId>, SourceError>>;

    /// Open a playable stream for the given id
    ///
    /// The returned stream is ready for texture derivation. Opening is the
    /// only suspension point in the whole resource pipeline.
    fn open(&self, id: &VideoId) -> BoxFuture<'_, Result<Self::Stream, SourceError>>;

    /// Derive a renderable texture from an opened stream
    fn create_texture(&self, stream: &Self::Stream) -> Self::Texture;

    /// Release a texture's GPU-adjacent state
    ///
    /// Called exactly once per cached texture, on eviction or teardown.
    fn dispose_texture(&self, texture: &Self::Texture);
}

// Re-export implementations
pub use mock::{MockSource, MockStream, MockTexture};
