//! Chop/cook progress state machine.
//!
//! At most one task runs per kitchen. Progress advances by a fixed delta for
//! every whole processing tick of elapsed time handed to [`Processor::advance`].

use serde::Serialize;
use std::time::Duration;

use crate::config::Tuning;
use crate::item::ProcessingState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessKind {
    Chop,
    Cook,
}

impl ProcessKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessKind::Chop => "chop",
            ProcessKind::Cook => "cook",
        }
    }

    /// State an item must be in before this process applies.
    pub fn input_state(&self) -> ProcessingState {
        match self {
            ProcessKind::Chop => ProcessingState::Raw,
            ProcessKind::Cook => ProcessingState::Chopped,
        }
    }

    pub fn output_state(&self) -> ProcessingState {
        match self {
            ProcessKind::Chop => ProcessingState::Chopped,
            ProcessKind::Cook => ProcessingState::Cooked,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingTask {
    pub kind: ProcessKind,
    pub counter: usize,
    ticks: u32,
    required_ticks: u32,
    delta: f32,
    carry: Duration,
}

impl ProcessingTask {
    /// Progress in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        (self.ticks as f32 * self.delta).min(1.0)
    }

    fn is_complete(&self) -> bool {
        self.ticks >= self.required_ticks
    }
}

/// Returned by [`Processor::advance`] when a task reaches full progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedTask {
    pub kind: ProcessKind,
    pub counter: usize,
}

#[derive(Debug, Clone)]
pub struct Processor {
    tick_period: Duration,
    chop_delta: f32,
    cook_delta: f32,
    active: Option<ProcessingTask>,
}

/// Ticks needed for `delta` per tick to reach 1.0. The bias absorbs f32
/// storage error (0.01 is stored slightly low and would need 101 ticks).
fn ticks_to_finish(delta: f32) -> u32 {
    ((1.0 / delta as f64) - 1e-4).ceil().max(1.0) as u32
}

impl Processor {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            tick_period: tuning.processing_tick(),
            chop_delta: tuning.chop_progress_per_tick,
            cook_delta: tuning.cook_progress_per_tick,
            active: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ProcessingTask> {
        self.active.as_ref()
    }

    /// Start a task. Returns `false`, leaving the running task untouched,
    /// if one is already in progress.
    pub fn start(&mut self, kind: ProcessKind, counter: usize) -> bool {
        if self.active.is_some() {
            return false;
        }

        let delta = match kind {
            ProcessKind::Chop => self.chop_delta,
            ProcessKind::Cook => self.cook_delta,
        };

        self.active = Some(ProcessingTask {
            kind,
            counter,
            ticks: 0,
            required_ticks: ticks_to_finish(delta),
            delta,
            carry: Duration::ZERO,
        });
        true
    }

    /// Feed elapsed time. Completes the task once enough whole ticks have
    /// passed; leftover time is discarded with the task.
    pub fn advance(&mut self, elapsed: Duration) -> Option<CompletedTask> {
        let period = self.tick_period;
        let task = self.active.as_mut()?;

        task.carry += elapsed;
        while task.carry >= period && !task.is_complete() {
            task.carry -= period;
            task.ticks += 1;
        }

        if task.is_complete() {
            let done = CompletedTask {
                kind: task.kind,
                counter: task.counter,
            };
            self.active = None;
            Some(done)
        } else {
            None
        }
    }

    /// Drop the running task if it works on `counter`.
    pub fn abandon_on(&mut self, counter: usize) -> Option<ProcessingTask> {
        if self.active.as_ref().is_some_and(|t| t.counter == counter) {
            self.active.take()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}
