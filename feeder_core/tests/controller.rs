use feeder_core::mocks::{FaultyTach, ScriptedTach, SpyDrive};
use feeder_core::{
    BuildError, CompensatorCfg, CompensatorKind, ControlCfg, ControlError, MotorControl,
    SteadyCfg, StopPolicy,
};
use feeder_traits::{Direction, SpeedSample};
use rstest::rstest;

const CYCLE_US: u64 = 100_000;

fn p_only(kp: f32) -> CompensatorCfg {
    CompensatorCfg {
        kp,
        ki: 0.0,
        kind: CompensatorKind::Pi,
    }
}

fn loose_steady() -> SteadyCfg {
    SteadyCfg {
        epsilon: 0.01,
        threshold: 5,
        require_unsaturated: true,
    }
}

/// Constant-speed tachometer: `cycles` fresh samples at 12 rpm (50% of the
/// default 24 rpm rating), then stale repeats.
fn half_speed_tach(cycles: usize) -> ScriptedTach {
    ScriptedTach::ramp(&vec![12.0; cycles], CYCLE_US, CYCLE_US)
}

fn controller(
    tach: ScriptedTach,
    drive: SpyDrive,
    gains: CompensatorCfg,
    control: ControlCfg,
) -> MotorControl<ScriptedTach, SpyDrive> {
    MotorControl::new(tach, drive, gains, control, loose_steady()).expect("build controller")
}

#[test]
fn reversal_under_power_waits_for_zero_compensation() {
    let drive = SpyDrive::new();
    let spy = drive.clone();
    // kp = 1 with ±2 saturation gives clean ±2.0 voltage steps per cycle.
    let mut ctrl = controller(
        half_speed_tach(30),
        drive,
        p_only(1.0),
        ControlCfg::default(),
    );

    // Build up drive: ref 60% vs speed 50% -> error saturates at +2.
    ctrl.set_reference(0.6);
    for _ in 0..3 {
        ctrl.run().expect("run");
    }
    assert!((ctrl.read_comp() - 6.0).abs() < 1e-4);
    assert_eq!(spy.direction_writes(), vec![Direction::Clockwise]);

    // Request reversal while powered: outputs must not be re-driven, and
    // the tracking reference is forced to zero so the drive unwinds.
    ctrl.set_reference(-0.6);
    assert_eq!(ctrl.requested_direction(), Direction::CounterClockwise);
    for expected in [4.0_f32, 2.0, 0.0] {
        ctrl.run().expect("run");
        assert!((ctrl.read_comp() - expected).abs() < 1e-4);
        assert_eq!(
            ctrl.current_direction(),
            Direction::Clockwise,
            "direction must hold until compensation reaches zero"
        );
        assert_eq!(spy.direction_writes().len(), 1);
    }

    // Voltage is exactly zero: the next cycle latches and resumes tracking.
    ctrl.run().expect("run");
    assert_eq!(ctrl.current_direction(), Direction::CounterClockwise);
    assert_eq!(
        spy.direction_writes(),
        vec![Direction::Clockwise, Direction::CounterClockwise]
    );
    assert!(ctrl.read_comp() > 0.0, "tracking resumes after the latch");
}

#[test]
fn stale_samples_hold_the_output_for_a_cycle() {
    let drive = SpyDrive::new();
    let spy = drive.clone();
    let tach = ScriptedTach::new([
        SpeedSample { rpm: 12.0, timestamp_us: 100_000 },
        // Same timestamp: no new information.
        SpeedSample { rpm: 13.0, timestamp_us: 100_000 },
        SpeedSample { rpm: 12.0, timestamp_us: 200_000 },
    ]);
    let mut ctrl = controller(tach, drive, p_only(1.0), ControlCfg::default());
    ctrl.set_reference(0.6);

    assert!(!ctrl.run().expect("fresh"));
    let comp_after_fresh = ctrl.read_comp();
    let duty_writes = spy.log().duties.len();

    assert!(!ctrl.run().expect("stale"));
    assert_eq!(ctrl.read_comp(), comp_after_fresh, "output holds when stale");
    assert_eq!(spy.log().duties.len(), duty_writes, "no duty re-drive");
    assert_eq!(ctrl.steady_count(), 0);

    assert!(!ctrl.run().expect("fresh again"));
    assert!(ctrl.read_comp() > comp_after_fresh);
}

#[test]
fn error_is_saturated_and_dead_banded() {
    let drive = SpyDrive::new();
    let tach = ScriptedTach::new([
        SpeedSample { rpm: 0.0, timestamp_us: 100_000 }, // error +50 -> sat +2
        SpeedSample { rpm: 14.4, timestamp_us: 200_000 }, // error -10 -> sat -2
        SpeedSample { rpm: 12.01, timestamp_us: 300_000 }, // error ~-0.04 -> dead band
    ]);
    let mut ctrl = controller(tach, drive, p_only(0.0), ControlCfg::default());
    ctrl.set_reference(0.5);

    ctrl.run().expect("run");
    assert!((ctrl.read_error() - 50.0).abs() < 1e-3);
    assert!((ctrl.read_adj_error() - 2.0).abs() < 1e-6);

    ctrl.run().expect("run");
    assert!((ctrl.read_error() + 10.0).abs() < 1e-3);
    assert!((ctrl.read_adj_error() + 2.0).abs() < 1e-6);

    ctrl.run().expect("run");
    assert!(ctrl.read_error().abs() < 0.1);
    assert_eq!(ctrl.read_adj_error(), 0.0, "dead band snaps to exactly zero");
}

#[test]
fn tracking_stop_ramps_down_through_the_compensated_path() {
    let drive = SpyDrive::new();
    let spy = drive.clone();
    let mut ctrl = controller(
        half_speed_tach(30),
        drive,
        p_only(1.0),
        ControlCfg::default(),
    );
    ctrl.set_reference(0.6);
    for _ in 0..4 {
        ctrl.run().expect("run");
    }
    assert!(ctrl.read_comp() >= 8.0 - 1e-4);

    // stop() is run() with the reference forced to zero: error saturates at
    // -2 against the still-turning motor, stepping the voltage down.
    let mut prev = ctrl.read_comp();
    for _ in 0..10 {
        ctrl.stop().expect("stop");
        assert!(ctrl.read_comp() <= prev);
        prev = ctrl.read_comp();
    }
    assert_eq!(prev, 0.0);
    assert_eq!(spy.last_duty(), Some(0.0));
}

#[test]
fn ramp_stop_steps_by_the_configured_volt() {
    let drive = SpyDrive::new();
    let control = ControlCfg {
        stop_policy: StopPolicy::Ramp { step_volt: 1.0 },
        ..ControlCfg::default()
    };
    let mut ctrl = controller(half_speed_tach(30), drive, p_only(1.0), control);
    ctrl.set_reference(0.6);
    for _ in 0..3 {
        ctrl.run().expect("run");
    }
    let start = ctrl.read_comp();
    assert!((start - 6.0).abs() < 1e-4);

    ctrl.stop().expect("stop");
    assert!((ctrl.read_comp() - (start - 1.0)).abs() < 1e-4);
    ctrl.stop().expect("stop");
    assert!((ctrl.read_comp() - (start - 2.0)).abs() < 1e-4);
}

#[test]
fn ramp_stop_cuts_to_zero_near_standstill() {
    let drive = SpyDrive::new();
    let spy = drive.clone();
    let control = ControlCfg {
        stop_policy: StopPolicy::Ramp { step_volt: 1.0 },
        ..ControlCfg::default()
    };
    // 0.1 rpm -> speed_volt ≈ 0.4, below the 1.0 V cutoff.
    let tach = ScriptedTach::ramp(&[0.1; 10], CYCLE_US, CYCLE_US);
    let mut ctrl = controller(tach, drive, p_only(1.0), control);
    ctrl.stop().expect("stop");
    assert_eq!(ctrl.read_comp(), 0.0);
    assert_eq!(spy.last_duty(), Some(0.0));
}

#[test]
fn compensation_voltage_clamps_to_the_rails() {
    let drive = SpyDrive::new();
    let spy = drive.clone();
    // Huge gain so single steps would fly past both rails.
    let mut ctrl = controller(
        half_speed_tach(40),
        drive,
        p_only(1_000.0),
        ControlCfg::default(),
    );
    ctrl.set_reference(1.0);
    for _ in 0..3 {
        ctrl.run().expect("run");
        assert!(ctrl.read_comp() <= 100.0);
    }
    assert_eq!(ctrl.read_comp(), 100.0);
    assert_eq!(spy.last_duty(), Some(1.0));

    ctrl.set_reference(0.0);
    for _ in 0..3 {
        ctrl.run().expect("run");
        assert!(ctrl.read_comp() >= 0.0);
    }
    assert_eq!(ctrl.read_comp(), 0.0);
}

#[test]
fn invalid_speed_readings_are_typed_sensor_faults() {
    for bad in [f64::NAN, -3.0] {
        let tach = ScriptedTach::new([SpeedSample { rpm: bad, timestamp_us: 100_000 }]);
        let mut ctrl = controller(tach, SpyDrive::new(), p_only(1.0), ControlCfg::default());
        let err = ctrl.run().expect_err("invalid rpm must fault");
        assert!(
            matches!(err.downcast_ref::<ControlError>(), Some(ControlError::Sensor(_))),
            "unexpected error: {err}"
        );
    }
}

#[test]
fn tachometer_failure_maps_to_hardware_error() {
    let mut ctrl = MotorControl::new(
        FaultyTach,
        SpyDrive::new(),
        p_only(1.0),
        ControlCfg::default(),
        loose_steady(),
    )
    .expect("build");
    let err = ctrl.run().expect_err("fault must propagate");
    let msg = format!("{err:#}");
    assert!(msg.contains("tachometer"), "unexpected error: {msg}");
}

#[test]
fn read_accessors_expose_reference_rpm() {
    let mut ctrl = controller(
        half_speed_tach(5),
        SpyDrive::new(),
        p_only(1.0),
        ControlCfg::default(),
    );
    ctrl.set_reference(0.5);
    assert!((ctrl.read_ref_rpm() - 12.0).abs() < 1e-6);
    ctrl.set_reference(-0.25);
    assert!((ctrl.read_ref_rpm() - 6.0).abs() < 1e-6);
    assert_eq!(ctrl.requested_direction(), Direction::CounterClockwise);
}

#[rstest]
#[case::bad_rated_rpm(ControlCfg { rated_rpm: 0.0, ..ControlCfg::default() }, "rated_rpm")]
#[case::bad_saturation(ControlCfg { error_saturation: -1.0, ..ControlCfg::default() }, "error_saturation")]
#[case::dead_band_swallows_everything(
    ControlCfg { dead_band: 3.0, error_saturation: 2.0, ..ControlCfg::default() },
    "dead_band"
)]
#[case::bad_ramp(
    ControlCfg { stop_policy: StopPolicy::Ramp { step_volt: 0.0 }, ..ControlCfg::default() },
    "ramp step"
)]
fn misconfiguration_fails_fast_at_construction(#[case] control: ControlCfg, #[case] needle: &str) {
    let err = MotorControl::new(
        half_speed_tach(1),
        SpyDrive::new(),
        p_only(1.0),
        control,
        loose_steady(),
    )
    .expect_err("invalid config must not build");
    assert!(
        matches!(err.downcast_ref::<BuildError>(), Some(BuildError::InvalidConfig(_))),
        "unexpected error: {err}"
    );
    assert!(format!("{err}").contains(needle), "message: {err}");
}

#[test]
fn invalid_steady_config_fails_fast_too() {
    let steady = SteadyCfg {
        epsilon: 0.0,
        threshold: 5,
        require_unsaturated: true,
    };
    let err = MotorControl::new(
        half_speed_tach(1),
        SpyDrive::new(),
        p_only(1.0),
        ControlCfg::default(),
        steady,
    )
    .expect_err("zero epsilon must not build");
    assert!(format!("{err}").contains("epsilon"));
}
