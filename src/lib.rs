//! video_globe - bounded video-texture caching and spatial segment
//! assignment for an interactive globe
//!
//! # Features
//! - Bounded LRU cache of live video streams and their textures
//! - In-flight load coalescing (one open per id, ever)
//! - Randomized but session-stable (segment, subsection) assignment
//! - Deterministic (u, v) hit-testing with polar margins
//! - Drag-to-cancel selection and hover preview playback
//! - Debounced idle gate for ambient rotation
//!
//! # Quick Start
//!
//! ```ignore
//! use video_globe::{GlobeConfig, GlobeSession, MockSource};
//!
//! let source = MockSource::with_catalog(["a", "b", "c"]);
//! let mut session = GlobeSession::initialize(source, GlobeConfig::default()).await?;
//! if let Some(event) = session.pointer_move(uv) {
//!     // forward HoverChanged / Selection to the renderer and router
//! }
//! ```

// Core modules
pub mod cache;
pub mod idle;
pub mod interaction;
pub mod session;
pub mod source;
pub mod surface;

// Error types
mod error;
pub use error::{GlobeError, Result};

// Re-export main types from cache
pub use cache::{
    CacheError, CacheMetrics, CacheMetricsHandle, VideoCache, VideoHandle, DEFAULT_CAPACITY,
};

// Re-export source types
pub use source::{
    BoxFuture, MockSource, MockStream, MockTexture, SourceError, VideoSource, VideoStream,
};

// Re-export surface types
pub use surface::{
    CellAddress, CellHit, Segment, SegmentMap, SurfaceLayout, DEFAULT_POLAR_MARGIN,
    DEFAULT_SEGMENTS, DEFAULT_SUBSECTIONS,
};

// Re-export interaction types
pub use interaction::{GlobeEvent, HoverTarget, InteractionController};

// Re-export idle types
pub use idle::{IdleState, IdleTimer, DEFAULT_IDLE_DELAY};

// Re-export session types
pub use session::{GlobeConfig, GlobeSession};

use std::fmt;

/// Opaque stable identifier of one video resource
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoId(String);

impl VideoId {
    /// Create a video id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for VideoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_video_id_display() {
        let id = VideoId::new("abc123");
        assert_eq!(id.to_string(), "abc123");
        assert_eq!(id.as_str(), "abc123");
    }
}
