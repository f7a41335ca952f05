//! Idle/active interaction timing
//!
//! Tracks whether the user is orbiting the camera and debounces the return
//! to ambient rotation after a fixed delay of inactivity.

use std::time::{Duration, Instant};

/// Default delay before returning to ambient rotation
pub const DEFAULT_IDLE_DELAY: Duration = Duration::from_secs(10);

/// Ambient-motion gating state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    /// The user interacted recently; ambient rotation is suppressed
    Active,
    /// No interaction for the full delay; ambient rotation may run
    Idle,
}

/// Debounced active-to-idle state machine
///
/// Starts `Active`. An interaction-end signal arms a countdown; any
/// interaction-start before the deadline cancels it. Polling past the
/// deadline fires the `Idle` transition exactly once per arming.
#[derive(Debug)]
pub struct IdleTimer {
    state: IdleState,
    deadline: Option<Instant>,
    delay: Duration,
}

impl Default for IdleTimer {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_DELAY)
    }
}

impl IdleTimer {
    /// Creates a timer with the given return-to-idle delay
    pub fn new(delay: Duration) -> Self {
        Self {
            state: IdleState::Active,
            deadline: None,
            delay,
        }
    }

    /// Current state
    pub fn state(&self) -> IdleState {
        self.state
    }

    /// Whether ambient rotation is currently enabled
    pub fn is_idle(&self) -> bool {
        self.state == IdleState::Idle
    }

    /// Signals the start of a camera/orbit interaction
    ///
    /// Cancels any pending countdown. Returns the transition back to
    /// `Active` when the timer was idle, `None` otherwise.
    pub fn on_interaction_start(&mut self) -> Option<IdleState> {
        self.deadline = None;
        if self.state == IdleState::Idle {
            self.state = IdleState::Active;
            Some(IdleState::Active)
        } else {
            None
        }
    }

    /// Signals the end of a camera/orbit interaction, arming the countdown
    pub fn on_interaction_end(&mut self, now: Instant) {
        if self.state == IdleState::Active {
            self.deadline = Some(now + self.delay);
        }
    }

    /// Advances the timer; fires the `Idle` transition once the armed
    /// deadline elapses
    pub fn poll(&mut self, now: Instant) -> Option<IdleState> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.state = IdleState::Idle;
                Some(IdleState::Idle)
            }
            _ => None,
        }
    }
}
