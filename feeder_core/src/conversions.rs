//! Mappings from the TOML-facing config structs to core configuration.

use crate::compensator::{CompensatorCfg, CompensatorKind};
use crate::motor::{ControlCfg, StopPolicy};
use crate::panel::PanelCfg;
use crate::steady::SteadyCfg;
use std::time::Duration;

impl From<&feeder_config::Gains> for CompensatorCfg {
    fn from(g: &feeder_config::Gains) -> Self {
        Self {
            kp: g.kp,
            ki: g.ki,
            kind: match g.law {
                feeder_config::Law::Pi => CompensatorKind::Pi,
                feeder_config::Law::Pid => CompensatorKind::Pid,
                feeder_config::Law::PidLegacy => CompensatorKind::PidUnscaledIntegral,
            },
        }
    }
}

impl From<&feeder_config::Motor> for ControlCfg {
    fn from(m: &feeder_config::Motor) -> Self {
        Self {
            rated_rpm: m.rated_rpm,
            error_saturation: m.error_saturation,
            dead_band: m.dead_band,
            stop_policy: match m.stop {
                feeder_config::StopMode::Track => StopPolicy::Track,
                feeder_config::StopMode::Ramp => StopPolicy::Ramp {
                    step_volt: m.ramp_step_volt,
                },
            },
        }
    }
}

impl From<&feeder_config::Steady> for SteadyCfg {
    fn from(s: &feeder_config::Steady) -> Self {
        Self {
            epsilon: s.epsilon,
            threshold: s.threshold,
            require_unsaturated: s.require_unsaturated,
        }
    }
}

impl From<&feeder_config::Panel> for PanelCfg {
    fn from(p: &feeder_config::Panel) -> Self {
        Self {
            debounce: Duration::from_millis(p.debounce_ms),
            blink: Duration::from_millis(p.blink_ms),
            status: Duration::from_millis(p.status_ms),
        }
    }
}
