//! Operator-input fan-out: raw button edges → debounced logical edges →
//! change-dispatch reactions.
//!
//! One owned context object in place of free-floating globals: the panel
//! owns the scheduler, the per-button debounce guards and the change
//! dispatch cells, and publishes single-writer atomic flags for the control
//! and hardware contexts. Edge methods and `tick()` must be called from the
//! one context that owns the panel; they never block and never call into
//! the compensator.

use crate::debounce::DebounceGuard;
use crate::event::EventVariable;
use crate::sched::{Scheduler, TaskId};
use crate::shared::OperatorInputs;
use crate::util::duration_us;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Panel timing knobs.
#[derive(Debug, Clone)]
pub struct PanelCfg {
    /// Quiet window after an admitted button edge.
    pub debounce: Duration,
    /// Status-LED half period while the loop is hunting.
    pub blink: Duration,
    /// Period of the telemetry status tick.
    pub status: Duration,
}

impl Default for PanelCfg {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(1),
            blink: Duration::from_millis(500),
            status: Duration::from_millis(500),
        }
    }
}

pub struct OperatorPanel {
    cfg: PanelCfg,
    sched: Scheduler,
    motor_guard: DebounceGuard,
    torch_guard: DebounceGuard,
    motor_run: EventVariable<bool>,
    torch_on: EventVariable<bool>,
    steady: EventVariable<bool>,
    led: Arc<AtomicBool>,
    blink_task: Option<TaskId>,
    status_task: Option<TaskId>,
}

impl OperatorPanel {
    pub fn new(cfg: PanelCfg, inputs: Arc<OperatorInputs>) -> Self {
        let led = Arc::new(AtomicBool::new(false));

        let motor_run = {
            let inputs = Arc::clone(&inputs);
            EventVariable::with_callback(false, move |on: &mut bool| {
                inputs.motor_enabled.store(*on, Ordering::Release);
                tracing::info!(enabled = *on, "motor run state changed");
            })
        };
        let torch_on = {
            let inputs = Arc::clone(&inputs);
            EventVariable::with_callback(false, move |on: &mut bool| {
                inputs.torch_demand.store(*on, Ordering::Release);
                tracing::info!(active = *on, "torch state changed");
            })
        };
        let steady = EventVariable::with_callback(false, |steady: &mut bool| {
            tracing::debug!(steady = *steady, "steady signal changed");
        });

        Self {
            motor_guard: DebounceGuard::new(cfg.debounce),
            torch_guard: DebounceGuard::new(cfg.debounce),
            cfg,
            sched: Scheduler::new(),
            motor_run,
            torch_on,
            steady,
            led,
            blink_task: None,
            status_task: None,
        }
    }

    /// Install the hook fired every status period (the diagnostic stream
    /// printer). Replaces any previous hook.
    pub fn attach_status(&mut self, now_us: u64, hook: impl FnMut() + Send + 'static) {
        if let Some(id) = self.status_task.take() {
            self.sched.detach(id);
        }
        let period = duration_us(self.cfg.status);
        self.status_task = Some(self.sched.attach_periodic(now_us, period, hook));
    }

    /// Raw motor-button edge from the input context.
    pub fn motor_button_edge(&mut self, now_us: u64) {
        if !self.motor_guard.admit(&mut self.sched, now_us) {
            return;
        }
        self.motor_run.toggle();
        if self.motor_run.value() {
            // A fresh start is never steady until the loop reports it.
            self.steady.set(false);
        }
        self.reconcile_led(now_us);
    }

    /// Raw torch-button edge. The torch only arms when the motor is enabled
    /// and steady and the torch is currently off; any other press disarms.
    pub fn torch_button_edge(&mut self, now_us: u64) {
        if !self.torch_guard.admit(&mut self.sched, now_us) {
            return;
        }
        let arm = self.motor_run.value() && self.steady.value() && !self.torch_on.value();
        self.torch_on.set(arm);
    }

    /// Steady flag forwarded from the control-loop context.
    pub fn steady_changed(&mut self, steady: bool, now_us: u64) {
        self.steady.set(steady);
        self.reconcile_led(now_us);
    }

    /// Drive scheduler tasks due at `now_us` (debounce disarms, blink ticks,
    /// status ticks). Returns how many fired.
    pub fn tick(&mut self, now_us: u64) -> usize {
        self.sched.run_due(now_us)
    }

    /// LED policy: off when stopped, solid when steady, blinking while the
    /// loop hunts. At most one blink ticker exists at a time.
    fn reconcile_led(&mut self, now_us: u64) {
        if !self.motor_run.value() {
            self.detach_blink();
            self.led.store(false, Ordering::Release);
        } else if self.steady.value() {
            self.detach_blink();
            self.led.store(true, Ordering::Release);
        } else if self.blink_task.is_none() {
            let led = Arc::clone(&self.led);
            let period = duration_us(self.cfg.blink);
            let id = self.sched.attach_periodic(now_us, period, move || {
                led.fetch_xor(true, Ordering::AcqRel);
            });
            self.blink_task = Some(id);
        }
    }

    fn detach_blink(&mut self) {
        if let Some(id) = self.blink_task.take() {
            self.sched.detach(id);
        }
    }

    /// Handle to the published status-LED level.
    pub fn led_level(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.led)
    }

    pub fn motor_running(&self) -> bool {
        self.motor_run.value()
    }

    pub fn torch_active(&self) -> bool {
        self.torch_on.value()
    }

    pub fn is_steady(&self) -> bool {
        self.steady.value()
    }
}
