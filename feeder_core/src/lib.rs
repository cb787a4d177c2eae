#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core control logic for the wire-feed motor (hardware-agnostic).
//!
//! All hardware interactions go through the `feeder_traits::Tachometer`,
//! `feeder_traits::MotorDrive` and `feeder_traits::Switch` seams.
//!
//! ## Architecture
//!
//! - **Filtering**: fixed-window moving average (`filter` module)
//! - **Compensation**: configurable PI/PID law (`compensator`)
//! - **Control**: velocity tracking with safety-gated direction reversal
//!   (`motor`)
//! - **Steady detection**: consecutive sub-epsilon output runs (`steady`)
//! - **Input dispatch**: change-dispatch cells, debounce guards and the
//!   cooperative scheduler behind the operator panel (`event`, `debounce`,
//!   `sched`, `panel`)
//! - **Publishing**: lock-free single-writer cells (`shared`) consumed by the
//!   control loop driver (`runner`)
//!
//! The control path allocates nothing per cycle; all controller and
//! compensator state is fixed-size.

pub mod compensator;
pub mod conversions;
pub mod debounce;
pub mod error;
pub mod event;
pub mod filter;
pub mod mocks;
pub mod motor;
pub mod panel;
pub mod runner;
pub mod sched;
pub mod shared;
pub mod steady;
pub mod util;

pub use compensator::{Compensator, CompensatorCfg, CompensatorKind};
pub use error::{BuildError, ControlError, Result};
pub use event::EventVariable;
pub use filter::MovingAverage;
pub use motor::{ControlCfg, MotorControl, StopPolicy};
pub use panel::{OperatorPanel, PanelCfg};
pub use shared::{OperatorInputs, SharedF32, Telemetry};
pub use steady::{SteadyCfg, SteadyStateDetector};
