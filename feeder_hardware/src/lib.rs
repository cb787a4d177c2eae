//! Hardware backends for the feed-motor controller.
//!
//! The simulated plant is always available and is what the CLI and the
//! end-to-end tests run against; real GPIO lives behind the `hardware`
//! feature. The quadrature-decoder driver is an external collaborator: a
//! hardware build plugs its own `Tachometer` in next to the GPIO drive.

pub mod error;
pub use error::HwError;

#[cfg(feature = "hardware")]
pub mod hw;

use feeder_traits::{Clock, Direction, MotorDrive, SpeedSample, Switch, Tachometer};
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

/// Shared state of the simulated motor plant. Duty and direction are
/// written by the drive half; speed and step time by the tachometer half.
struct PlantState {
    duty_bits: AtomicU32,
    clockwise: AtomicBool,
    rpm_bits: AtomicU32,
    last_step_us: AtomicU64,
}

/// Build a coupled drive/tachometer pair over a first-order motor model:
/// rpm relaxes toward `duty * rated_rpm` with time constant `tau_s`. Sample
/// timestamps come from `clock`, so the plant is deterministic under
/// `SimClock`.
pub fn sim_pair(
    rated_rpm: f32,
    tau_s: f32,
    clock: Arc<dyn Clock + Send + Sync>,
) -> (SimTach, SimDrive) {
    let state = Arc::new(PlantState {
        duty_bits: AtomicU32::new(0.0_f32.to_bits()),
        clockwise: AtomicBool::new(true),
        rpm_bits: AtomicU32::new(0.0_f32.to_bits()),
        last_step_us: AtomicU64::new(0),
    });
    let epoch = clock.now();
    (
        SimTach {
            state: Arc::clone(&state),
            clock,
            epoch,
            rated_rpm,
            tau_s,
        },
        SimDrive { state },
    )
}

/// Drive half of the simulated plant.
pub struct SimDrive {
    state: Arc<PlantState>,
}

impl MotorDrive for SimDrive {
    fn set_duty(&mut self, duty: f32) -> Result<(), Box<dyn Error + Send + Sync>> {
        if !duty.is_finite() || !(0.0..=1.0).contains(&duty) {
            return Err(Box::new(HwError::InvalidDuty(duty)));
        }
        self.state.duty_bits.store(duty.to_bits(), Ordering::Relaxed);
        tracing::trace!(duty, "sim drive duty");
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.state
            .clockwise
            .store(direction == Direction::Clockwise, Ordering::Relaxed);
        tracing::debug!(?direction, "sim drive direction");
        Ok(())
    }
}

/// Tachometer half of the simulated plant. Each query advances the model by
/// the elapsed clock time and stamps the sample; two queries inside the
/// same microsecond return the same timestamp (a stale sample upstream).
pub struct SimTach {
    state: Arc<PlantState>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    rated_rpm: f32,
    tau_s: f32,
}

impl Tachometer for SimTach {
    fn get_speed(&mut self) -> Result<SpeedSample, Box<dyn Error + Send + Sync>> {
        let now_us = self.clock.micros_since(self.epoch);
        let prev_us = self.state.last_step_us.swap(now_us, Ordering::Relaxed);
        let dt_s = now_us.saturating_sub(prev_us) as f32 / 1e6;

        let duty = f32::from_bits(self.state.duty_bits.load(Ordering::Relaxed));
        let rpm = f32::from_bits(self.state.rpm_bits.load(Ordering::Relaxed));
        let target = duty * self.rated_rpm;
        let next = if self.tau_s <= 0.0 {
            target
        } else {
            rpm + (target - rpm) * (1.0 - (-dt_s / self.tau_s).exp())
        };
        self.state.rpm_bits.store(next.to_bits(), Ordering::Relaxed);

        Ok(SpeedSample {
            rpm: f64::from(next),
            timestamp_us: now_us,
        })
    }
}

/// Switch backed by a shared level, with a label for the debug stream.
/// Level changes are logged once per transition.
pub struct SimSwitch {
    label: &'static str,
    level: Arc<AtomicBool>,
}

impl SimSwitch {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            level: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle to the published level.
    pub fn level(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.level)
    }
}

impl Switch for SimSwitch {
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
        let was = self.level.swap(on, Ordering::Relaxed);
        if was != on {
            tracing::debug!(label = self.label, on, "sim switch");
        }
        Ok(())
    }
}
