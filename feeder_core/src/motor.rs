//! Velocity/direction controller with safety-gated reversal.

use crate::compensator::{Compensator, CompensatorCfg};
use crate::error::{BuildError, Report, Result, map_hw_error};
use crate::filter::MovingAverage;
use crate::steady::{SteadyCfg, SteadyStateDetector};
use eyre::WrapErr;
use feeder_traits::{Direction, MotorDrive, SpeedSample, Tachometer};

/// How `stop()` winds the drive down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopPolicy {
    /// Zero the reference and let the compensated path ramp the drive down.
    Track,
    /// Step the compensation voltage down by a fixed amount per accepted
    /// cycle, cutting to zero once measured speed is near standstill.
    Ramp { step_volt: f32 },
}

/// Controller tuning independent of the compensation law.
#[derive(Debug, Clone)]
pub struct ControlCfg {
    /// Speed that maps to 100 on the percent-of-rated scale.
    pub rated_rpm: f32,
    /// Error is saturated to ±this bound before compensation (volt scale).
    pub error_saturation: f32,
    /// Errors inside ±this band snap to zero to stop output hunting.
    pub dead_band: f32,
    pub stop_policy: StopPolicy,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            rated_rpm: 24.0,
            error_saturation: 2.0,
            dead_band: 0.1,
            stop_policy: StopPolicy::Track,
        }
    }
}

/// Closed-loop motor controller.
///
/// `run()`/`stop()` must be invoked from a single periodic context; the call
/// rate may vary since all timing derives from measured elapsed microseconds
/// between accepted tachometer samples, not iteration count.
///
/// Direction handling keeps two values: the requested (`set`) direction,
/// updated instantly, and the driven (`current`) one. The H-bridge pins are
/// re-driven only when they differ AND the compensation voltage is exactly
/// zero; a reversal requested while powered forces the tracking reference to
/// zero so the compensated path unwinds the drive first. This guards the
/// bridge and gearbox against commanded reversal under load.
pub struct MotorControl<T: Tachometer, D: MotorDrive> {
    tach: T,
    drive: D,
    compensator: Compensator,
    steady: SteadyStateDetector,
    control: ControlCfg,
    ref_smoothing: MovingAverage<11>,

    /// Reference magnitude as a fraction of rated speed, [0, 1].
    ref_command: f32,
    set_direction: Direction,
    current_direction: Direction,

    speed_volt: f32,
    error_volt: f32,
    adj_error_volt: f32,
    comp_volt: f32,
    prev_time_us: u64,
}

impl<T: Tachometer, D: MotorDrive> MotorControl<T, D> {
    /// Validate the configuration, take ownership of the hardware seams and
    /// drive the outputs to a known state (duty 0, clockwise).
    pub fn new(
        tach: T,
        drive: D,
        gains: CompensatorCfg,
        control: ControlCfg,
        steady: SteadyCfg,
    ) -> Result<Self> {
        validate(&gains, &control, &steady)?;
        let mut ctrl = Self {
            tach,
            drive,
            compensator: Compensator::new(gains),
            steady: SteadyStateDetector::new(steady),
            control,
            ref_smoothing: MovingAverage::new(),
            ref_command: 0.0,
            set_direction: Direction::Clockwise,
            current_direction: Direction::Clockwise,
            speed_volt: 0.0,
            error_volt: 0.0,
            adj_error_volt: 0.0,
            comp_volt: 0.0,
            prev_time_us: 0,
        };
        ctrl.apply_drive().wrap_err("init duty output")?;
        ctrl.drive
            .set_direction(ctrl.current_direction)
            .map_err(|e| Report::new(map_hw_error(&*e)))
            .wrap_err("init direction output")?;
        Ok(ctrl)
    }

    /// Accept a signed reference command in [-1, 1]; the sign requests a
    /// direction (zero leaves it unchanged), the magnitude is the fraction
    /// of rated speed. Non-finite commands are treated as zero.
    pub fn set_reference(&mut self, command: f32) {
        let command = if command.is_finite() {
            command.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        if command > 0.0 {
            self.set_direction = Direction::Clockwise;
        } else if command < 0.0 {
            self.set_direction = Direction::CounterClockwise;
        }
        self.ref_command = command.abs();
    }

    /// Request a direction directly. Takes effect through the safety gate.
    pub fn request_direction(&mut self, direction: Direction) {
        self.set_direction = direction;
    }

    /// Flip the requested direction.
    pub fn reverse(&mut self) {
        self.set_direction = self.set_direction.reversed();
    }

    /// One control cycle; returns the steady flag.
    ///
    /// A sample whose timestamp is not strictly newer than the previously
    /// accepted one is stale: the output holds, the direction gate still
    /// runs, and the cycle reports not-steady without touching the steady
    /// counter.
    pub fn run(&mut self) -> Result<bool> {
        let smoothed_ref = self.ref_smoothing.add(self.ref_command);
        let sample = self.read_tach()?;
        let effective_ref = self.direction_guard(smoothed_ref)?;

        if sample.timestamp_us <= self.prev_time_us {
            return Ok(false);
        }
        let elapsed_us = sample.timestamp_us - self.prev_time_us;

        self.compute_error(effective_ref);
        let delta = self.compensator.compensate(self.adj_error_volt, elapsed_us);
        self.comp_volt = (self.comp_volt + delta).clamp(0.0, 100.0);
        self.apply_drive()?;
        self.prev_time_us = sample.timestamp_us;
        Ok(self.steady.update(self.comp_volt))
    }

    /// Wind the drive down according to the configured stop policy.
    pub fn stop(&mut self) -> Result<bool> {
        match self.control.stop_policy {
            StopPolicy::Track => {
                self.ref_command = 0.0;
                self.run()
            }
            StopPolicy::Ramp { step_volt } => self.ramp_down(step_volt),
        }
    }

    /// Hard-cut the drive: zero reference, zero compensation, duty 0.
    /// For orderly process shutdown, not part of the control law.
    pub fn halt(&mut self) -> Result<()> {
        self.ref_command = 0.0;
        self.comp_volt = 0.0;
        self.apply_drive()
    }

    fn ramp_down(&mut self, step_volt: f32) -> Result<bool> {
        let sample = self.read_tach()?;
        if sample.timestamp_us > self.prev_time_us {
            if self.speed_volt > 1.0 {
                self.comp_volt = (self.comp_volt - step_volt).max(0.0);
            } else {
                self.comp_volt = 0.0;
            }
            self.apply_drive()?;
            self.prev_time_us = sample.timestamp_us;
            return Ok(self.steady.update(self.comp_volt));
        }
        Ok(false)
    }

    fn read_tach(&mut self) -> Result<SpeedSample> {
        let sample = self
            .tach
            .get_speed()
            .map_err(|e| Report::new(map_hw_error(&*e)))
            .wrap_err("reading tachometer")?;
        if !sample.rpm.is_finite() || sample.rpm < 0.0 {
            return Err(Report::new(crate::error::ControlError::Sensor(format!(
                "invalid speed reading: {} rpm",
                sample.rpm
            ))));
        }
        self.speed_volt = (sample.rpm as f32) * 100.0 / self.control.rated_rpm;
        Ok(sample)
    }

    /// Direction-safety gate. Runs every cycle, stale or fresh.
    fn direction_guard(&mut self, smoothed_ref: f32) -> Result<f32> {
        if self.current_direction == self.set_direction {
            return Ok(smoothed_ref);
        }
        if self.comp_volt == 0.0 {
            self.current_direction = self.set_direction;
            self.drive
                .set_direction(self.current_direction)
                .map_err(|e| Report::new(map_hw_error(&*e)))
                .wrap_err("direction output")?;
            tracing::debug!(direction = ?self.current_direction, "direction latched");
            Ok(smoothed_ref)
        } else {
            // Still powered: hold the reference at zero until the
            // compensated path decays the drive to a full stop.
            Ok(0.0)
        }
    }

    fn compute_error(&mut self, effective_ref: f32) {
        self.error_volt = effective_ref * 100.0 - self.speed_volt;
        let sat = self.control.error_saturation;
        let dead = self.control.dead_band;
        self.adj_error_volt = if self.error_volt > sat {
            sat
        } else if self.error_volt < -sat {
            -sat
        } else if self.error_volt.abs() < dead {
            0.0
        } else {
            self.error_volt
        };
    }

    fn apply_drive(&mut self) -> Result<()> {
        self.drive
            .set_duty(self.comp_volt / 100.0)
            .map_err(|e| Report::new(map_hw_error(&*e)))
            .wrap_err("duty output")
    }

    // Pure read accessors for the telemetry context; no side effects.

    pub fn read_comp(&self) -> f32 {
        self.comp_volt
    }

    pub fn read_speed(&self) -> f32 {
        self.speed_volt
    }

    pub fn read_error(&self) -> f32 {
        self.error_volt
    }

    pub fn read_adj_error(&self) -> f32 {
        self.adj_error_volt
    }

    pub fn read_ref_rpm(&self) -> f32 {
        self.ref_command * self.control.rated_rpm
    }

    pub fn steady_count(&self) -> u32 {
        self.steady.count()
    }

    pub fn is_steady(&self) -> bool {
        self.steady.is_steady()
    }

    pub fn current_direction(&self) -> Direction {
        self.current_direction
    }

    pub fn requested_direction(&self) -> Direction {
        self.set_direction
    }
}

impl<T: Tachometer, D: MotorDrive> core::fmt::Debug for MotorControl<T, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MotorControl")
            .field("comp_volt", &self.comp_volt)
            .field("speed_volt", &self.speed_volt)
            .field("current_direction", &self.current_direction)
            .field("set_direction", &self.set_direction)
            .finish()
    }
}

fn validate(gains: &CompensatorCfg, control: &ControlCfg, steady: &SteadyCfg) -> Result<()> {
    if !gains.kp.is_finite() || !gains.ki.is_finite() {
        return Err(Report::new(BuildError::InvalidConfig(
            "gains must be finite",
        )));
    }
    if !control.rated_rpm.is_finite() || control.rated_rpm <= 0.0 {
        return Err(Report::new(BuildError::InvalidConfig(
            "rated_rpm must be > 0",
        )));
    }
    if !control.error_saturation.is_finite() || control.error_saturation <= 0.0 {
        return Err(Report::new(BuildError::InvalidConfig(
            "error_saturation must be > 0",
        )));
    }
    if !control.dead_band.is_finite()
        || control.dead_band < 0.0
        || control.dead_band >= control.error_saturation
    {
        return Err(Report::new(BuildError::InvalidConfig(
            "dead_band must be in [0, error_saturation)",
        )));
    }
    if let StopPolicy::Ramp { step_volt } = control.stop_policy
        && (!step_volt.is_finite() || step_volt <= 0.0)
    {
        return Err(Report::new(BuildError::InvalidConfig(
            "ramp step must be > 0",
        )));
    }
    if !steady.epsilon.is_finite() || steady.epsilon <= 0.0 {
        return Err(Report::new(BuildError::InvalidConfig(
            "steady epsilon must be > 0",
        )));
    }
    if steady.threshold == 0 {
        return Err(Report::new(BuildError::InvalidConfig(
            "steady threshold must be >= 1",
        )));
    }
    Ok(())
}
