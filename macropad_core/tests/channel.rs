use std::sync::Arc;

use macropad_core::error::{BuildError, PadError};
use macropad_core::mocks::RecordingSteps;
use macropad_core::{ChannelCfg, ChannelPhase, ControlChannel, Direction, SampleOutcome, StepMode};
use macropad_traits::clock::Clock;
use macropad_traits::clock::test_clock::ManualClock;
use rstest::rstest;

fn clocked() -> (ManualClock, Arc<dyn Clock + Send + Sync>) {
    let clock = ManualClock::new();
    let shared: Arc<dyn Clock + Send + Sync> = Arc::new(clock.clone());
    (clock, shared)
}

/// Channel that is ready on the first sample: no burst, no settle.
fn ready(cfg: ChannelCfg) -> (ControlChannel, RecordingSteps) {
    let (_clock, shared) = clocked();
    let mut out = RecordingSteps::new();
    let ch = ControlChannel::initialize(
        ChannelCfg {
            reset_burst: false,
            settle_ms: 0,
            ..cfg
        },
        shared,
        &mut out,
    )
    .unwrap();
    (ch, out)
}

#[test]
fn immediate_reset_burst_sends_output_steps_decreases() {
    let (_clock, shared) = clocked();
    let mut out = RecordingSteps::new();
    let cfg = ChannelCfg {
        reset_delay_ms: 0,
        ..ChannelCfg::default()
    };
    let ch = ControlChannel::initialize(cfg, shared, &mut out).unwrap();
    assert_eq!(out.downs(), 100);
    assert_eq!(out.ups(), 0);
    assert_eq!(ch.current_level(), 0);
    assert!(matches!(ch.phase(), ChannelPhase::Settling { .. }));
}

#[test]
fn reset_steps_overrides_burst_length() {
    let (_clock, shared) = clocked();
    let mut out = RecordingSteps::new();
    let cfg = ChannelCfg {
        reset_delay_ms: 0,
        reset_steps: Some(50),
        ..ChannelCfg::default()
    };
    ControlChannel::initialize(cfg, shared, &mut out).unwrap();
    assert_eq!(out.downs(), 50);
}

#[test]
fn deferred_burst_then_settle_then_ready() {
    let (clock, shared) = clocked();
    let mut out = RecordingSteps::new();
    let mut ch = ControlChannel::initialize(ChannelCfg::default(), shared, &mut out).unwrap();
    assert_eq!(out.total(), 0, "burst waits for the reset delay");

    clock.advance_ms(799);
    assert_eq!(ch.on_sample(4095, &mut out).unwrap(), SampleOutcome::NotReady);
    assert_eq!(out.total(), 0);

    clock.advance_ms(1);
    assert_eq!(
        ch.on_sample(4095, &mut out).unwrap(),
        SampleOutcome::Reset { steps: 100 }
    );
    assert_eq!(out.downs(), 100);

    // Settling: every sample is ignored until 500 ms have passed
    for _ in 0..10 {
        clock.advance_ms(49);
        assert_eq!(ch.on_sample(4095, &mut out).unwrap(), SampleOutcome::NotReady);
    }
    assert!(!ch.is_ready());
    assert_eq!(out.total(), 100);

    clock.advance_ms(10);
    let o = ch.on_sample(4095, &mut out).unwrap();
    assert!(ch.is_ready());
    assert_eq!(
        o,
        SampleOutcome::Stepped {
            direction: Direction::Up,
            steps: 100,
            level: 100
        }
    );
}

#[test]
fn without_burst_the_settle_delay_still_applies() {
    let (clock, shared) = clocked();
    let mut out = RecordingSteps::new();
    let cfg = ChannelCfg {
        reset_burst: false,
        ..ChannelCfg::default()
    };
    let mut ch = ControlChannel::initialize(cfg, shared, &mut out).unwrap();
    assert_eq!(ch.on_sample(2048, &mut out).unwrap(), SampleOutcome::NotReady);
    clock.advance_ms(500);
    assert_eq!(ch.on_sample(2048, &mut out).unwrap().emitted(), 50);
    assert_eq!(out.total(), 50);
}

#[test]
fn scenario_half_scale_then_deadband() {
    let (mut ch, mut out) = ready(ChannelCfg::default());
    assert_eq!(ch.on_sample(2048, &mut out).unwrap().emitted(), 50);
    assert_eq!(out.ups(), 50);
    assert_eq!(ch.on_sample(2070, &mut out).unwrap().emitted(), 0);
    assert_eq!(out.total(), 50);
    assert_eq!(ch.last_target(), Some(51));
}

#[test]
fn repeated_sample_is_idempotent_after_convergence() {
    let (mut ch, mut out) = ready(ChannelCfg::default());
    ch.on_sample(3000, &mut out).unwrap();
    let after_first = out.total();
    for _ in 0..20 {
        ch.on_sample(3000, &mut out).unwrap();
    }
    assert_eq!(out.total(), after_first);
}

#[rstest]
#[case(-1000, 0)]
#[case(i32::MIN, 0)]
#[case(4095 + 1000, 100)]
#[case(i32::MAX, 100)]
fn out_of_range_samples_clamp(#[case] raw: i32, #[case] level: u32) {
    let (mut ch, mut out) = ready(ChannelCfg::default());
    ch.on_sample(2048, &mut out).unwrap();
    ch.on_sample(raw, &mut out).unwrap();
    assert_eq!(ch.current_level(), level);
}

#[test]
fn below_min_behaves_like_min() {
    let cfg = ChannelCfg {
        raw_min: 24,
        raw_max: 993,
        ..ChannelCfg::default()
    };
    let (mut a, mut out_a) = ready(cfg.clone());
    let (mut b, mut out_b) = ready(cfg);
    a.on_sample(993, &mut out_a).unwrap();
    b.on_sample(993, &mut out_b).unwrap();
    assert_eq!(
        a.on_sample(24 - 1000, &mut out_a).unwrap(),
        b.on_sample(24, &mut out_b).unwrap()
    );
}

#[test]
fn zero_deadband_reacts_to_single_level() {
    let (mut ch, mut out) = ready(ChannelCfg {
        deadband: 0,
        ..ChannelCfg::default()
    });
    // 41/4095*100 ≈ 1.0 → level 1
    assert_eq!(ch.on_sample(41, &mut out).unwrap().emitted(), 1);
}

#[test]
fn ema_seeds_with_first_sample_then_converges() {
    let (mut ch, mut out) = ready(ChannelCfg {
        ema_alpha: Some(0.2),
        deadband: 0,
        ..ChannelCfg::default()
    });
    ch.on_sample(1000, &mut out).unwrap();
    assert_eq!(ch.filtered(), Some(1000.0));

    // A single spike barely moves the smoothed level
    let o = ch.on_sample(4095, &mut out).unwrap();
    assert!(o.emitted() <= 16, "{o:?}");

    for _ in 0..100 {
        ch.on_sample(4095, &mut out).unwrap();
    }
    assert_eq!(ch.current_level(), 100);
    let f = ch.filtered().unwrap();
    assert!((f - 4095.0).abs() < 1.0, "{f}");
}

#[test]
fn per_motion_emits_one_action_each_way() {
    let (mut ch, mut out) = ready(ChannelCfg {
        step_mode: StepMode::PerMotion,
        ..ChannelCfg::default()
    });
    assert_eq!(ch.on_sample(4095, &mut out).unwrap().emitted(), 1);
    assert_eq!(ch.current_level(), 100);
    let o = ch.on_sample(0, &mut out).unwrap();
    assert_eq!(
        o,
        SampleOutcome::Stepped {
            direction: Direction::Down,
            steps: 1,
            level: 0
        }
    );
    assert_eq!((out.ups(), out.downs()), (1, 1));
}

#[test]
fn sink_failure_mid_run_keeps_delivered_level() {
    let (_clock, shared) = clocked();
    let mut setup = RecordingSteps::new();
    let mut ch = ControlChannel::initialize(
        ChannelCfg {
            reset_burst: false,
            settle_ms: 0,
            ..ChannelCfg::default()
        },
        shared,
        &mut setup,
    )
    .unwrap();

    let mut out = RecordingSteps::new().fail_after(30);
    let err = ch.on_sample(4095, &mut out).expect_err("sink closes");
    assert_eq!(ch.current_level(), 30);
    assert!(err.downcast_ref::<PadError>().is_some(), "{err:?}");

    // A healthy sink resumes from the delivered level
    let mut out = RecordingSteps::new();
    assert_eq!(ch.on_sample(4095, &mut out).unwrap().emitted(), 70);
    assert_eq!(ch.current_level(), 100);
}

#[test]
fn failed_deferred_burst_is_retried() {
    let (clock, shared) = clocked();
    let mut out = RecordingSteps::new();
    let mut ch = ControlChannel::initialize(ChannelCfg::default(), shared, &mut out).unwrap();
    clock.advance_ms(800);

    let mut broken = RecordingSteps::new().fail_after(10);
    let err = ch.on_sample(0, &mut broken).expect_err("burst interrupted");
    assert!(format!("{err:#}").contains("after 10 of 100"), "{err:#}");
    assert!(matches!(ch.phase(), ChannelPhase::AwaitingReset { .. }));

    assert_eq!(
        ch.on_sample(0, &mut out).unwrap(),
        SampleOutcome::Reset { steps: 100 }
    );
}

#[rstest]
#[case(Some(0.0))]
#[case(Some(-0.5))]
#[case(Some(1.01))]
#[case(Some(f32::NAN))]
fn bad_alpha_is_rejected(#[case] alpha: Option<f32>) {
    let (_clock, shared) = clocked();
    let mut out = RecordingSteps::new();
    let err = ControlChannel::initialize(
        ChannelCfg {
            ema_alpha: alpha,
            ..ChannelCfg::default()
        },
        shared,
        &mut out,
    )
    .expect_err("invalid alpha");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidSmoothing(_))
    ));
}

#[test]
fn host_disconnect_maps_to_typed_error() {
    use macropad_core::{KeySteps, SliderChords};
    use macropad_hardware::RecordingHost;

    let (mut ch, _) = ready(ChannelCfg::default());
    let mut host = RecordingHost::new().disconnect_after(5);
    let mut out = KeySteps::new(&mut host, SliderChords::VOLUME);
    let err = ch.on_sample(4095, &mut out).expect_err("link drops");
    assert_eq!(err.downcast_ref::<PadError>(), Some(&PadError::Disconnected));
    assert_eq!(ch.current_level(), 5);
}
