// wayfinder_core/src/session.rs

use nalgebra::Vector3;

use crate::types::SessionId;

/// Progress of the hit-test source request issued when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitTestState {
    #[default]
    Pending,
    Ready,
    /// The session never supplied a source. Spatial anchoring is abandoned.
    Unavailable,
    /// The request was dropped because the session ended.
    Cancelled,
}

/// Everything that lives exactly as long as one AR session.
///
/// Created on session start and torn down on session end; components receive it by
/// reference instead of reaching for ambient mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub id: SessionId,
    /// The zero of the session's local tracking space, expressed in host coordinates.
    pub local_space_origin: Vector3<f64>,
    pub hit_test: HitTestState,
    active: bool,
    render_loop_running: bool,
}

impl SessionContext {
    pub fn new(id: SessionId, local_space_origin: Vector3<f64>) -> Self {
        Self {
            id,
            local_space_origin,
            hit_test: HitTestState::Pending,
            active: true,
            render_loop_running: true,
        }
    }

    /// Interactions and scene mutations are only allowed while this holds.
    pub fn is_active(&self) -> bool {
        self.active && self.render_loop_running
    }

    pub fn render_loop_running(&self) -> bool {
        self.render_loop_running
    }

    /// Stops frame scheduling and cancels the outstanding hit-test request.
    pub fn end(&mut self) {
        self.active = false;
        self.render_loop_running = false;
        if self.hit_test == HitTestState::Pending {
            self.hit_test = HitTestState::Cancelled;
        }
    }
}

/// A deferred action that fires once frame time reaches `due_at_ms`.
#[derive(Debug, Clone, PartialEq)]
struct Timer<T> {
    due_at_ms: f64,
    /// Session the timer belongs to; `None` means it outlives sessions.
    scope: Option<SessionId>,
    payload: T,
}

/// Timers driven by the render loop's frame timestamps instead of wall-clock callbacks.
/// Session-scoped timers are dropped as soon as their session is no longer live.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerQueue<T> {
    timers: Vec<Timer<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self { timers: Vec::new() }
    }
}

impl<T> TimerQueue<T> {
    pub fn schedule(&mut self, now_ms: f64, delay_ms: f64, scope: Option<SessionId>, payload: T) {
        self.timers.push(Timer {
            due_at_ms: now_ms + delay_ms.max(0.0),
            scope,
            payload,
        });
    }

    /// Removes and returns every payload that is due at `now_ms`, in scheduling order.
    /// Timers scoped to a session other than `live_session` are discarded.
    pub fn drain_due(&mut self, now_ms: f64, live_session: Option<SessionId>) -> Vec<T> {
        self.cancel_stale(live_session);
        let mut due = Vec::new();
        let mut pending = Vec::with_capacity(self.timers.len());
        for timer in self.timers.drain(..) {
            if timer.due_at_ms <= now_ms {
                due.push(timer.payload);
            } else {
                pending.push(timer);
            }
        }
        self.timers = pending;
        due
    }

    /// Drops every timer bound to a session other than `live_session`.
    pub fn cancel_stale(&mut self, live_session: Option<SessionId>) {
        self.timers
            .retain(|timer| timer.scope.is_none() || timer.scope == live_session);
    }

    /// Removes every pending timer regardless of due time.
    pub fn drain_all(&mut self) -> Vec<T> {
        self.timers.drain(..).map(|timer| timer.payload).collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
