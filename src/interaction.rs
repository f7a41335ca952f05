//! Pointer interaction against the segment map and cache
//!
//! Orchestrates pointer-down/move/up events: hover preview playback,
//! tooltip targets, and drag-to-cancel selection.

use glam::Vec2;

use crate::cache::VideoCache;
use crate::idle::IdleState;
use crate::source::VideoSource;
use crate::surface::{CellAddress, CellHit, SegmentMap};
use crate::VideoId;

/// The cell currently under the pointer, for tooltip rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverTarget {
    /// 1-based segment id
    pub segment_id: u32,
    /// 0-based subsection index within the segment
    pub subsection: usize,
    /// The video occupying the cell
    pub video: VideoId,
}

impl HoverTarget {
    /// Tooltip text for this target
    pub fn label(&self) -> String {
        format!("Segment {} - Part {}", self.segment_id, self.subsection + 1)
    }
}

/// Events produced for the rest of the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobeEvent {
    /// The user selected a video; consumed externally as a navigation intent
    Selection(VideoId),
    /// The hovered cell changed; `None` clears the tooltip
    HoverChanged(Option<HoverTarget>),
    /// The ambient-motion gate flipped
    IdleStateChanged(IdleState),
}

/// Pointer event state machine
///
/// Holds only transient per-gesture state; the segment map and cache are
/// borrowed per call so they stay owned by the session.
#[derive(Debug, Default)]
pub struct InteractionController {
    pressed: Option<CellAddress>,
    hover: Option<HoverTarget>,
}

impl InteractionController {
    /// Creates a controller with no press or hover in progress
    pub fn new() -> Self {
        Self::default()
    }

    /// The cell recorded at press time, if any
    pub fn pressed_cell(&self) -> Option<CellAddress> {
        self.pressed
    }

    /// The current hover target, if any
    pub fn hover_target(&self) -> Option<&HoverTarget> {
        self.hover.as_ref()
    }

    /// Records a press at the given surface coordinate
    ///
    /// Only a coordinate resolving to an occupied cell whose video is live
    /// in the cache arms a selection; empty cells, margins, and cells whose
    /// load failed record "no target".
    pub fn pointer_down<S: VideoSource>(
        &mut self,
        uv: Vec2,
        map: &SegmentMap,
        cache: &VideoCache<S>,
    ) {
        self.pressed = match map.resolve(uv) {
            Some(CellHit {
                address,
                video: Some(id),
            }) if cache.contains(&id) => Some(address),
            _ => None,
        };
    }

    /// Handles pointer movement, driving hover preview playback
    ///
    /// An occupied cell whose video is live in the cache becomes the hover
    /// target: its stream plays and every other cached stream pauses. Empty
    /// cells, margins, and cells whose load failed pause all playback and
    /// clear the tooltip. Emits `HoverChanged` only when the target
    /// actually changes.
    pub fn pointer_move<S: VideoSource>(
        &mut self,
        uv: Vec2,
        map: &SegmentMap,
        cache: &VideoCache<S>,
    ) -> Option<GlobeEvent> {
        let target = match map.resolve(uv) {
            Some(CellHit {
                address,
                video: Some(id),
            }) => {
                if cache.play_exclusive(&id) {
                    Some(HoverTarget {
                        segment_id: address.segment_id,
                        subsection: address.subsection,
                        video: id,
                    })
                } else {
                    // occupied but not live (load failed or evicted)
                    cache.pause_all();
                    None
                }
            }
            _ => {
                cache.pause_all();
                None
            }
        };

        if target == self.hover {
            return None;
        }
        self.hover = target.clone();
        Some(GlobeEvent::HoverChanged(target))
    }

    /// Handles pointer release, emitting a selection on a clean click
    ///
    /// A selection fires only when the release resolves to the same
    /// occupied cell that was pressed and its video is still live
    /// (drag-to-cancel). The press state is cleared either way.
    pub fn pointer_up<S: VideoSource>(
        &mut self,
        uv: Vec2,
        map: &SegmentMap,
        cache: &VideoCache<S>,
    ) -> Option<GlobeEvent> {
        let pressed = self.pressed.take()?;
        match map.resolve(uv) {
            Some(CellHit {
                address,
                video: Some(id),
            }) if address == pressed && cache.contains(&id) => {
                Some(GlobeEvent::Selection(id))
            }
            _ => None,
        }
    }
}
