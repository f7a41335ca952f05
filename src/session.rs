//! Per-session orchestration
//!
//! Wires the cache, segment map, interaction controller, and idle timer
//! together: one [`GlobeSession`] per rendered globe, built once from the
//! source's video listing and torn down with a guaranteed resource release.

use std::time::{Duration, Instant};

use futures::future::join_all;
use glam::Vec2;

use crate::cache::{VideoCache, DEFAULT_CAPACITY};
use crate::error::{GlobeError, Result};
use crate::idle::{IdleTimer, DEFAULT_IDLE_DELAY};
use crate::interaction::{GlobeEvent, HoverTarget, InteractionController};
use crate::source::VideoSource;
use crate::surface::{SegmentMap, SurfaceLayout};

/// Session configuration, fixed at construction
#[derive(Debug, Clone, Copy)]
pub struct GlobeConfig {
    /// Maximum number of live video resources
    pub capacity: usize,
    /// Grid dimensions over the surface
    pub layout: SurfaceLayout,
    /// Delay before ambient rotation resumes
    pub idle_delay: Duration,
    /// Fixed shuffle seed; `None` draws from thread entropy
    pub shuffle_seed: Option<u64>,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            layout: SurfaceLayout::default(),
            idle_delay: DEFAULT_IDLE_DELAY,
            shuffle_seed: None,
        }
    }
}

impl GlobeConfig {
    fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(GlobeError::Config("capacity must be positive".into()));
        }
        if self.layout.segments == 0 || self.layout.subsections == 0 {
            return Err(GlobeError::Config(
                "segment grid dimensions must be positive".into(),
            ));
        }
        if !(0.0..0.5).contains(&self.layout.polar_margin) {
            return Err(GlobeError::Config(
                "polar margin must be in [0, 0.5)".into(),
            ));
        }
        Ok(())
    }
}

/// One interactive globe session
///
/// Owns every mutable piece of state; collaborators receive borrows only.
/// Dropping the session releases all cached streams and textures.
pub struct GlobeSession<S: VideoSource> {
    cache: VideoCache<S>,
    map: SegmentMap,
    controller: InteractionController,
    idle: IdleTimer,
}

impl<S: VideoSource> GlobeSession<S> {
    /// Builds a session: lists videos, fixes the segment assignment, and
    /// eagerly preloads every placed id
    ///
    /// Individual load failures are tolerated: the affected cell renders
    /// as empty and its id stays retryable. Only a failed listing or an
    /// invalid configuration aborts initialization.
    pub async fn initialize(source: S, config: GlobeConfig) -> Result<Self> {
        config.validate()?;
        let ids = source.list().await?;

        let map = match config.shuffle_seed {
            Some(seed) => SegmentMap::with_seed(&ids, config.layout, seed),
            None => SegmentMap::build(&ids, config.layout, &mut rand::thread_rng()),
        };

        let cache = VideoCache::new(source, config.capacity);
        let placed: Vec<_> = map.placed_ids().cloned().collect();
        let results = join_all(placed.iter().map(|id| cache.get_or_create(id))).await;
        let failed = results.iter().filter(|result| result.is_err()).count();
        if failed > 0 {
            log::warn!("{failed} of {} placed videos failed to preload", placed.len());
        }
        log::debug!(
            "globe session ready: {} videos listed, {} placed, {} cached",
            ids.len(),
            placed.len(),
            cache.len()
        );

        Ok(Self {
            cache,
            map,
            controller: InteractionController::new(),
            idle: IdleTimer::new(config.idle_delay),
        })
    }

    /// The video cache backing hover playback
    pub fn cache(&self) -> &VideoCache<S> {
        &self.cache
    }

    /// The fixed segment assignment for this session
    pub fn segment_map(&self) -> &SegmentMap {
        &self.map
    }

    /// The current tooltip target, if any
    pub fn hover_target(&self) -> Option<&HoverTarget> {
        self.controller.hover_target()
    }

    /// Whether ambient rotation is currently enabled
    pub fn ambient_rotation_enabled(&self) -> bool {
        self.idle.is_idle()
    }

    /// Records a pointer press at a surface coordinate
    pub fn pointer_down(&mut self, uv: Vec2) {
        self.controller.pointer_down(uv, &self.map, &self.cache);
    }

    /// Handles pointer movement; may emit a hover change
    pub fn pointer_move(&mut self, uv: Vec2) -> Option<GlobeEvent> {
        self.controller.pointer_move(uv, &self.map, &self.cache)
    }

    /// Handles pointer release; may emit a selection
    pub fn pointer_up(&mut self, uv: Vec2) -> Option<GlobeEvent> {
        self.controller.pointer_up(uv, &self.map, &self.cache)
    }

    /// Signals the start of a camera/orbit interaction
    pub fn interaction_start(&mut self) -> Option<GlobeEvent> {
        self.idle
            .on_interaction_start()
            .map(GlobeEvent::IdleStateChanged)
    }

    /// Signals the end of a camera/orbit interaction
    pub fn interaction_end(&mut self, now: Instant) {
        self.idle.on_interaction_end(now);
    }

    /// Per-frame tick; may emit the return-to-idle transition
    pub fn tick(&mut self, now: Instant) -> Option<GlobeEvent> {
        self.idle.poll(now).map(GlobeEvent::IdleStateChanged)
    }

    /// Tears the session down, releasing every cached stream and texture
    ///
    /// Equivalent to dropping the session; provided for explicit teardown
    /// at navigation boundaries.
    pub fn shutdown(self) {
        self.cache.evict_all();
    }
}
