use std::{cell::Cell, rc::Rc};

use crate::render::VisualHandle;

/// Simulated time: the tick counter plus elapsed wall time in milliseconds.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    pub tick: u64,
    pub elapsed_ms: f64,
}

impl FrameClock {
    pub fn reset(&mut self) {
        self.tick = 0;
        self.elapsed_ms = 0.0;
    }

    pub fn advance(&mut self, delta_ms: f64) {
        self.tick += 1;
        self.elapsed_ms = (self.elapsed_ms + delta_ms.max(0.0)).max(0.0);
    }
}

/// Fixed-period timer in simulated milliseconds.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period_ms: f64,
    next_due_ms: f64,
}

impl IntervalTimer {
    pub fn new(period_ms: u64) -> Self {
        let period_ms = period_ms.max(1) as f64;
        Self {
            period_ms,
            next_due_ms: period_ms,
        }
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    /// True when a period has elapsed by `now_ms`. Fires at most once per
    /// call; periods missed during a stall are skipped, not replayed.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        if now_ms < self.next_due_ms {
            return false;
        }
        self.next_due_ms += self.period_ms;
        if self.next_due_ms <= now_ms {
            self.next_due_ms = now_ms + self.period_ms;
        }
        true
    }
}

/// Shared flag that stops a scheduled task from running.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Deferred work executed by the registry at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Removes one trail ghost point from the render surface.
    RemoveVisual(VisualHandle),
}

#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub due_tick: u64,
    pub task: Task,
    pub token: CancellationToken,
}

/// Queue of tasks ordered by due tick, insertion order breaking ties.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Vec<ScheduledTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `task` for `due_tick` and returns a token that can cancel it.
    pub fn schedule(&mut self, due_tick: u64, task: Task) -> CancellationToken {
        let token = CancellationToken::new();
        let index = self.tasks.partition_point(|t| t.due_tick <= due_tick);
        self.tasks.insert(
            index,
            ScheduledTask {
                due_tick,
                task,
                token: token.clone(),
            },
        );
        token
    }

    /// Removes and returns every non-cancelled task due at or before `tick`.
    pub fn drain_due(&mut self, tick: u64) -> Vec<Task> {
        let split = self.tasks.partition_point(|t| t.due_tick <= tick);
        self.tasks
            .drain(..split)
            .filter(|t| !t.token.is_cancelled())
            .map(|t| t.task)
            .collect()
    }

    /// Removes and returns every outstanding task regardless of due tick.
    pub fn drain_all(&mut self) -> Vec<Task> {
        self.tasks
            .drain(..)
            .filter(|t| !t.token.is_cancelled())
            .map(|t| t.task)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.iter().filter(|t| !t.token.is_cancelled()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn next_due(&self) -> Option<u64> {
        self.tasks
            .iter()
            .find(|t| !t.token.is_cancelled())
            .map(|t| t.due_tick)
    }
}
