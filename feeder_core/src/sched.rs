//! Cooperative task scheduler: the firmware ticker/one-shot replacement.
//!
//! Tasks are plain callbacks with microsecond deadlines, executed by the
//! owning context from `run_due`. The scheduler never sleeps itself: the
//! owner decides when to call in, so the same code runs against hardware
//! timers (a thread pacing on `MonotonicClock`) or a simulated clock in
//! tests.

pub type TaskId = u64;

struct Task {
    id: TaskId,
    deadline_us: u64,
    period_us: Option<u64>,
    callback: Box<dyn FnMut() + Send>,
}

#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_id: TaskId,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
        }
    }

    /// Install a callback fired every `period_us`, first at `now + period`.
    pub fn attach_periodic(
        &mut self,
        now_us: u64,
        period_us: u64,
        callback: impl FnMut() + Send + 'static,
    ) -> TaskId {
        let period_us = period_us.max(1);
        self.push(
            now_us.saturating_add(period_us),
            Some(period_us),
            Box::new(callback),
        )
    }

    /// Install a callback fired once after `delay_us`, then removed.
    pub fn attach_oneshot(
        &mut self,
        now_us: u64,
        delay_us: u64,
        callback: impl FnMut() + Send + 'static,
    ) -> TaskId {
        self.push(now_us.saturating_add(delay_us), None, Box::new(callback))
    }

    fn push(
        &mut self,
        deadline_us: u64,
        period_us: Option<u64>,
        callback: Box<dyn FnMut() + Send>,
    ) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            deadline_us,
            period_us,
            callback,
        });
        id
    }

    /// Cancel a task. Unknown ids are a no-op (the task may already have
    /// fired and removed itself).
    pub fn detach(&mut self, id: TaskId) {
        self.tasks.retain(|t| t.id != id);
    }

    /// Run every task due at `now_us`; returns how many fired. Periodic
    /// tasks re-arm strictly past `now_us`: ticks missed while the owner was
    /// away are dropped, not replayed.
    pub fn run_due(&mut self, now_us: u64) -> usize {
        let mut fired = 0;
        let mut i = 0;
        while i < self.tasks.len() {
            if self.tasks[i].deadline_us > now_us {
                i += 1;
                continue;
            }
            (self.tasks[i].callback)();
            fired += 1;
            match self.tasks[i].period_us {
                Some(p) => {
                    let task = &mut self.tasks[i];
                    while task.deadline_us <= now_us {
                        task.deadline_us = task.deadline_us.saturating_add(p);
                    }
                    i += 1;
                }
                // One-shot: remove without advancing; the swapped-in task
                // still gets checked this pass.
                None => {
                    self.tasks.swap_remove(i);
                }
            }
        }
        fired
    }

    /// Earliest pending deadline, if any task is installed.
    pub fn next_deadline_us(&self) -> Option<u64> {
        self.tasks.iter().map(|t| t.deadline_us).min()
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }
}
