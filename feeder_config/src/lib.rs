#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the feed-motor controller.
//!
//! `Config` and sub-structs are deserialized from TOML and validated. Units
//! are spelled out per field; everything except `[pins]` carries deployed
//! defaults so a minimal config stays short.

use serde::Deserialize;

/// GPIO assignments. Unused by the simulated backend but always present so
/// a config file moves between sim and hardware builds unchanged.
#[derive(Debug, Deserialize)]
pub struct Pins {
    /// H-bridge enable (PWM)
    pub motor_en: u8,
    /// H-bridge IN1
    pub motor_in1: u8,
    /// H-bridge IN2
    pub motor_in2: u8,
    /// Quadrature channel A (consumed by the decoder driver)
    pub encoder_a: u8,
    /// Quadrature channel B
    pub encoder_b: u8,
    /// Motor run/stop button
    pub motor_btn: u8,
    /// Torch button
    pub torch_btn: u8,
    /// Torch solenoid enable
    pub torch_en: u8,
    /// Motor status LED
    pub motor_led: u8,
    /// Torch-on LED
    pub torch_led: Option<u8>,
}

/// Compensation law selector.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Law {
    /// Proportional-integral.
    #[default]
    Pi,
    /// PID with `ki`-scaled integral in the sum.
    Pid,
    /// Historical PID wiring: raw accumulated error in the sum.
    PidLegacy,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Gains {
    pub kp: f32,
    pub ki: f32,
    pub law: Law,
}

impl Default for Gains {
    fn default() -> Self {
        Self {
            kp: 0.16,
            ki: 0.01,
            law: Law::Pi,
        }
    }
}

/// How `stop()` winds the drive down.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StopMode {
    /// Zero reference through the compensated path.
    #[default]
    Track,
    /// Fixed-step voltage decay per accepted cycle.
    Ramp,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Motor {
    /// Speed mapping to 100 on the percent-of-rated scale (RPM)
    pub rated_rpm: f32,
    /// Error saturation bound on the volt scale (deployed: 2.0 or 5.0)
    pub error_saturation: f32,
    /// Dead band on the volt scale (deployed: 0.1 or 0.4)
    pub dead_band: f32,
    pub stop: StopMode,
    /// Voltage decrement per accepted cycle when `stop = "ramp"`
    pub ramp_step_volt: f32,
}

impl Default for Motor {
    fn default() -> Self {
        Self {
            rated_rpm: 24.0,
            error_saturation: 2.0,
            dead_band: 0.1,
            stop: StopMode::Track,
            ramp_step_volt: 1.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Steady {
    /// Max |Δ compensation| per accepted cycle to count as quiet
    pub epsilon: f32,
    /// Consecutive quiet cycles before steady is reported
    pub threshold: u32,
    /// Exclude a rail-pinned output from steady
    pub require_unsaturated: bool,
}

impl Default for Steady {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            threshold: 5,
            require_unsaturated: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoopCfg {
    /// Control-loop invocation rate (Hz); sample timing itself is measured
    pub rate_hz: u32,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self { rate_hz: 100 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Panel {
    /// Debounce quiet window per button (ms)
    pub debounce_ms: u64,
    /// Status-LED blink half period while hunting (ms)
    pub blink_ms: u64,
    /// Telemetry status-tick period (ms)
    pub status_ms: u64,
}

impl Default for Panel {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            blink_ms: 500,
            status_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub gains: Gains,
    #[serde(default)]
    pub motor: Motor,
    #[serde(default)]
    pub steady: Steady,
    #[serde(default, rename = "loop")]
    pub control_loop: LoopCfg,
    #[serde(default)]
    pub panel: Panel,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    /// Range checks over the parsed values. The core re-validates what it
    /// consumes; this catches misconfiguration at load time with file-level
    /// context.
    pub fn validate(&self) -> eyre::Result<()> {
        if !self.gains.kp.is_finite() || !self.gains.ki.is_finite() {
            eyre::bail!("gains.kp and gains.ki must be finite");
        }
        if !self.motor.rated_rpm.is_finite() || self.motor.rated_rpm <= 0.0 {
            eyre::bail!("motor.rated_rpm must be > 0");
        }
        if !self.motor.error_saturation.is_finite() || self.motor.error_saturation <= 0.0 {
            eyre::bail!("motor.error_saturation must be > 0");
        }
        if !self.motor.dead_band.is_finite()
            || self.motor.dead_band < 0.0
            || self.motor.dead_band >= self.motor.error_saturation
        {
            eyre::bail!("motor.dead_band must be in [0, error_saturation)");
        }
        if self.motor.stop == StopMode::Ramp
            && (!self.motor.ramp_step_volt.is_finite() || self.motor.ramp_step_volt <= 0.0)
        {
            eyre::bail!("motor.ramp_step_volt must be > 0 when stop = \"ramp\"");
        }
        if !self.steady.epsilon.is_finite() || self.steady.epsilon <= 0.0 {
            eyre::bail!("steady.epsilon must be > 0");
        }
        if self.steady.threshold == 0 {
            eyre::bail!("steady.threshold must be >= 1");
        }
        if self.control_loop.rate_hz == 0 {
            eyre::bail!("loop.rate_hz must be > 0");
        }
        if self.panel.debounce_ms == 0 {
            eyre::bail!("panel.debounce_ms must be > 0");
        }
        if self.panel.blink_ms == 0 || self.panel.status_ms == 0 {
            eyre::bail!("panel periods must be > 0");
        }
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }
        Ok(())
    }
}
