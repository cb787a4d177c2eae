//! Control-loop driver: paces `MotorControl` and publishes state.

use crate::error::Result;
use crate::motor::MotorControl;
use crate::shared::{OperatorInputs, Telemetry};
use crossbeam_channel as xch;
use feeder_traits::{Clock, MotorDrive, Tachometer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Pacing for a control session.
#[derive(Debug, Clone, Copy)]
pub struct LoopParams {
    pub rate_hz: u32,
}

/// Bounded queue carrying steady-flag transitions to the panel context.
pub fn steady_channel() -> (xch::Sender<bool>, xch::Receiver<bool>) {
    xch::bounded(8)
}

/// Drive the controller until `shutdown` is raised.
///
/// Each iteration reads the shared reference and enable flags, runs one
/// control (or stop) cycle, refreshes the telemetry cells and forwards
/// steady transitions into `steady_tx`. Pacing goes through the `Clock`, so
/// the loop is deterministic under `SimClock`; control timing itself is
/// carried by measured sample timestamps, not by the iteration rate.
pub fn spin<T, D>(
    ctrl: &mut MotorControl<T, D>,
    clock: &dyn Clock,
    params: LoopParams,
    inputs: &OperatorInputs,
    telemetry: &Telemetry,
    steady_tx: &xch::Sender<bool>,
    shutdown: &AtomicBool,
) -> Result<()>
where
    T: Tachometer,
    D: MotorDrive,
{
    let period = Duration::from_micros(crate::util::period_us(params.rate_hz));
    let mut prev_steady = false;
    tracing::info!(rate_hz = params.rate_hz, "control loop started");

    while !shutdown.load(Ordering::Relaxed) {
        let steady = if inputs.motor_enabled.load(Ordering::Acquire) {
            ctrl.set_reference(inputs.reference.load());
            ctrl.run()?
        } else {
            ctrl.stop()?
        };

        publish(ctrl, steady, telemetry);

        if steady != prev_steady && steady_tx.try_send(steady).is_err() {
            // Transitions arrive at steady-threshold rate; a full queue
            // means the panel context stalled. Drop and carry on.
            tracing::warn!(steady, "steady queue full; transition dropped");
        }
        prev_steady = steady;

        clock.sleep(period);
    }

    ctrl.halt()?;
    tracing::info!("control loop stopped");
    Ok(())
}

fn publish<T, D>(ctrl: &MotorControl<T, D>, steady: bool, telemetry: &Telemetry)
where
    T: Tachometer,
    D: MotorDrive,
{
    telemetry.comp_volt.store(ctrl.read_comp());
    telemetry.speed_volt.store(ctrl.read_speed());
    telemetry.error_volt.store(ctrl.read_error());
    telemetry.adj_error_volt.store(ctrl.read_adj_error());
    telemetry.ref_rpm.store(ctrl.read_ref_rpm());
    telemetry.steady.store(steady, Ordering::Relaxed);
    telemetry
        .steady_count
        .store(ctrl.steady_count(), Ordering::Relaxed);
}
