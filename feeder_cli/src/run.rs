//! Session assembly: config mapping, plant wiring, loop and panel contexts.

use feeder_core::error::{BuildError, Report};
use feeder_core::runner::{self, LoopParams};
use feeder_core::{
    CompensatorCfg, ControlCfg, MotorControl, OperatorInputs, OperatorPanel, PanelCfg, SteadyCfg,
    Telemetry,
};
use feeder_traits::{Clock, MonotonicClock, Switch};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Simulated feed-motor time constant (seconds).
const SIM_PLANT_TAU_S: f32 = 0.25;

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub reference: f32,
    pub duration_ms: Option<u64>,
    pub start_enabled: bool,
    pub torch: bool,
}

/// Final published state of a run, for the summary line / JSON output.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub comp_volt: f32,
    pub speed_volt: f32,
    pub ref_rpm: f32,
    pub steady: bool,
    pub steady_count: u32,
    pub torch_fired: bool,
}

pub fn run_session(
    cfg: &feeder_config::Config,
    opts: RunOptions,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<RunOutcome> {
    if !opts.reference.is_finite() || !(-1.0..=1.0).contains(&opts.reference) {
        return Err(Report::new(BuildError::InvalidConfig(
            "reference must be within [-1, 1]",
        )));
    }

    let gains: CompensatorCfg = (&cfg.gains).into();
    let control: ControlCfg = (&cfg.motor).into();
    let steady_cfg: SteadyCfg = (&cfg.steady).into();
    let panel_cfg: PanelCfg = (&cfg.panel).into();

    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    let epoch = clock.now();

    let (tach, drive) =
        feeder_hardware::sim_pair(cfg.motor.rated_rpm, SIM_PLANT_TAU_S, Arc::clone(&clock));
    let mut ctrl = MotorControl::new(tach, drive, gains, control, steady_cfg)?;

    let inputs = OperatorInputs::new();
    inputs.reference.store(opts.reference);
    let telemetry = Telemetry::new();
    let (steady_tx, steady_rx) = runner::steady_channel();

    let mut panel = OperatorPanel::new(panel_cfg, Arc::clone(&inputs));
    {
        // Diagnostic text stream: the only observable output of the system.
        let telemetry = Arc::clone(&telemetry);
        let inputs = Arc::clone(&inputs);
        panel.attach_status(0, move || {
            tracing::info!(
                comp = telemetry.comp_volt.load(),
                speed = telemetry.speed_volt.load(),
                error = telemetry.error_volt.load(),
                adj_error = telemetry.adj_error_volt.load(),
                ref_rpm = telemetry.ref_rpm.load(),
                steady = telemetry.steady.load(Ordering::Relaxed),
                steady_count = telemetry.steady_count.load(Ordering::Relaxed),
                motor = inputs.motor_enabled.load(Ordering::Relaxed),
                torch = inputs.torch_demand.load(Ordering::Relaxed),
                "status"
            );
        });
    }
    if opts.start_enabled {
        panel.motor_button_edge(clock.micros_since(epoch));
    }

    // Panel context: steady-edge routing, scheduler ticks, solenoid and LED
    // mirroring. Owns the panel for the rest of the session.
    let torch_fired = Arc::new(AtomicBool::new(false));
    let panel_handle = {
        let clock = Arc::clone(&clock);
        let shutdown = Arc::clone(&shutdown);
        let inputs = Arc::clone(&inputs);
        let torch_fired = Arc::clone(&torch_fired);
        let press_torch = opts.torch;
        std::thread::spawn(move || {
            let mut torch_switch = feeder_hardware::SimSwitch::new("torch");
            let mut motor_led = feeder_hardware::SimSwitch::new("motor_led");
            let led_level = panel.led_level();
            let mut torch_pressed = false;
            while !shutdown.load(Ordering::Relaxed) {
                let now_us = clock.micros_since(epoch);
                for steady in steady_rx.try_iter() {
                    panel.steady_changed(steady, now_us);
                }
                if press_torch && !torch_pressed && panel.is_steady() {
                    panel.torch_button_edge(now_us);
                    torch_pressed = true;
                    torch_fired.store(panel.torch_active(), Ordering::Relaxed);
                }
                panel.tick(now_us);
                let _ = torch_switch.set_active(inputs.torch_demand.load(Ordering::Acquire));
                let _ = motor_led.set_active(led_level.load(Ordering::Acquire));
                clock.sleep(Duration::from_millis(5));
            }
        })
    };

    // Duration watchdog raises the same shutdown flag ctrl-c does.
    if let Some(ms) = opts.duration_ms {
        let shutdown = Arc::clone(&shutdown);
        let clock = Arc::clone(&clock);
        std::thread::spawn(move || {
            clock.sleep(Duration::from_millis(ms));
            shutdown.store(true, Ordering::Relaxed);
        });
    }

    let params = LoopParams {
        rate_hz: cfg.control_loop.rate_hz,
    };
    let loop_result = runner::spin(
        &mut ctrl,
        clock.as_ref(),
        params,
        &inputs,
        &telemetry,
        &steady_tx,
        &shutdown,
    );

    shutdown.store(true, Ordering::Relaxed);
    if panel_handle.join().is_err() {
        tracing::warn!("panel thread panicked during shutdown");
    }
    loop_result?;

    Ok(RunOutcome {
        comp_volt: telemetry.comp_volt.load(),
        speed_volt: telemetry.speed_volt.load(),
        ref_rpm: telemetry.ref_rpm.load(),
        steady: telemetry.steady.load(Ordering::Relaxed),
        steady_count: telemetry.steady_count.load(Ordering::Relaxed),
        torch_fired: torch_fired.load(Ordering::Relaxed),
    })
}
