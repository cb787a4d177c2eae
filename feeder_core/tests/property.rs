use feeder_core::mocks::{ScriptedTach, SpyDrive};
use feeder_core::{
    CompensatorCfg, CompensatorKind, ControlCfg, MotorControl, MovingAverage, SteadyCfg,
    SteadyStateDetector,
};
use feeder_traits::SpeedSample;
use proptest::prelude::*;

proptest! {
    // The moving average always equals the mean of exactly the last N samples.
    #[test]
    fn moving_average_matches_tail_mean(samples in prop::collection::vec(-1000.0_f32..1000.0, 1..60)) {
        const N: usize = 5;
        let mut avg = MovingAverage::<N>::new();
        for &s in &samples {
            avg.add(s);
        }
        let tail = &samples[samples.len().saturating_sub(N)..];
        let expected: f32 = tail.iter().sum::<f32>() / tail.len() as f32;
        prop_assert!((avg.value() - expected).abs() < 1e-2,
            "avg {} vs expected {}", avg.value(), expected);
    }

    // Whatever the feedback does, the compensation voltage stays on [0, 100]
    // and the duty commanded to the bridge stays on [0, 1].
    #[test]
    fn compensation_voltage_never_leaves_its_range(
        rpms in prop::collection::vec(0.0_f64..60.0, 1..80),
        reference in -1.0_f32..1.0,
        kp in 0.0_f32..10.0,
        ki in 0.0_f32..1.0,
    ) {
        let tach = ScriptedTach::ramp(&rpms, 50_000, 50_000);
        let drive = SpyDrive::new();
        let spy = drive.clone();
        let gains = CompensatorCfg { kp, ki, kind: CompensatorKind::Pi };
        let mut ctrl = MotorControl::new(
            tach,
            drive,
            gains,
            ControlCfg::default(),
            SteadyCfg::default(),
        ).expect("build");
        ctrl.set_reference(reference);

        for _ in 0..rpms.len() {
            ctrl.run().expect("run");
            let comp = ctrl.read_comp();
            prop_assert!((0.0..=100.0).contains(&comp), "comp {comp} out of range");
        }
        for duty in spy.log().duties {
            prop_assert!((0.0..=1.0).contains(&duty), "duty {duty} out of range");
        }
    }

    // Steady is only ever reported after `threshold` consecutive quiet
    // cycles, and any loud cycle zeroes the counter.
    #[test]
    fn steady_requires_an_unbroken_quiet_run(
        comps in prop::collection::vec(0.0_f32..99.0, 1..100),
        threshold in 1_u32..8,
    ) {
        let epsilon = 0.5_f32;
        let mut det = SteadyStateDetector::new(SteadyCfg {
            epsilon,
            threshold,
            require_unsaturated: false,
        });
        let mut prev = 0.0_f32;
        let mut quiet_run = 0_u32;
        for &c in &comps {
            let steady = det.update(c);
            if (c - prev).abs() < epsilon {
                quiet_run += 1;
            } else {
                quiet_run = 0;
            }
            prev = c;
            prop_assert_eq!(det.count(), quiet_run);
            prop_assert_eq!(steady, quiet_run >= threshold);
        }
    }
}

/// Stale tails from the scripted tachometer must never advance the
/// controller state, regardless of how long they repeat.
#[test]
fn stale_tail_freezes_the_controller() {
    let tach = ScriptedTach::new([
        SpeedSample {
            rpm: 6.0,
            timestamp_us: 100_000,
        },
        SpeedSample {
            rpm: 6.0,
            timestamp_us: 200_000,
        },
    ]);
    let drive = SpyDrive::new();
    let mut ctrl = MotorControl::new(
        tach,
        drive,
        CompensatorCfg::default(),
        ControlCfg::default(),
        SteadyCfg::default(),
    )
    .expect("build");
    ctrl.set_reference(0.5);
    ctrl.run().expect("run");
    ctrl.run().expect("run");
    let frozen = ctrl.read_comp();
    for _ in 0..50 {
        assert!(!ctrl.run().expect("run"), "stale cycles are never steady");
        assert_eq!(ctrl.read_comp(), frozen);
    }
}
