//! Navigation playback - steps through node ids at a fixed pace.
//!
//! # Frame Model
//! - No callbacks - `update(dt)` returns at most one [`PlaybackEvent`] per frame
//! - The first step fires on the first update, later steps after `step_delay`
//! - A [`PlaybackHandle`] can stop the run; the flag is checked between steps

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::animation::Countdown;

/// Cloneable stop switch for one playback run.
#[derive(Debug, Clone, Default)]
pub struct PlaybackHandle {
    stopped: Arc<AtomicBool>,
}

impl PlaybackHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Focus and flash this node.
    Step { index: usize, node_id: String },
    /// All steps ran and the final delay elapsed.
    Finished,
    /// The handle was stopped before the run completed.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Waiting,
    Done,
}

#[derive(Debug, Clone)]
pub struct NavigationPlayback {
    targets: Vec<String>,
    next: usize,
    step_delay_ms: u64,
    wait: Countdown,
    phase: Phase,
    handle: PlaybackHandle,
}

impl NavigationPlayback {
    pub fn new(targets: Vec<String>, step_delay_ms: u64) -> Self {
        info!(steps = targets.len(), step_delay_ms, "playback started");
        Self {
            targets,
            next: 0,
            step_delay_ms,
            wait: Countdown::from_ms(0),
            phase: Phase::Pending,
            handle: PlaybackHandle::default(),
        }
    }

    pub fn handle(&self) -> PlaybackHandle {
        self.handle.clone()
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Steps already emitted.
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn update(&mut self, dt: f32) -> Option<PlaybackEvent> {
        if self.phase == Phase::Done {
            return None;
        }
        if self.handle.is_stopped() {
            self.phase = Phase::Done;
            debug!(at = self.next, "playback stopped");
            return Some(PlaybackEvent::Stopped);
        }
        if self.phase == Phase::Waiting && !self.wait.tick(dt) {
            return None;
        }

        match self.targets.get(self.next) {
            Some(node_id) => {
                let event = PlaybackEvent::Step {
                    index: self.next,
                    node_id: node_id.clone(),
                };
                self.next += 1;
                self.wait = Countdown::from_ms(self.step_delay_ms);
                self.phase = Phase::Waiting;
                Some(event)
            }
            None => {
                self.phase = Phase::Done;
                info!(steps = self.targets.len(), "playback finished");
                Some(PlaybackEvent::Finished)
            }
        }
    }
}
