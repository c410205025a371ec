#![no_main]
use std::sync::Arc;

use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use macropad_core::mocks::RecordingSteps;
use macropad_core::{ChannelCfg, ControlChannel, StepMode};
use macropad_traits::clock::test_clock::ManualClock;

#[derive(Debug, Arbitrary)]
struct Input {
    raw_min: i32,
    raw_max: i32,
    output_steps: u16,
    deadband: u16,
    alpha_permille: Option<u16>,
    per_motion: bool,
    samples: Vec<(i32, u8)>,
}

fuzz_target!(|input: Input| {
    let cfg = ChannelCfg {
        raw_min: input.raw_min,
        raw_max: input.raw_max,
        output_steps: u32::from(input.output_steps),
        deadband: u32::from(input.deadband),
        ema_alpha: input.alpha_permille.map(|p| f32::from(p) / 1000.0),
        settle_ms: 0,
        reset_burst: false,
        reset_delay_ms: 0,
        reset_steps: None,
        step_mode: if input.per_motion {
            StepMode::PerMotion
        } else {
            StepMode::PerLevel
        },
    };
    let steps = cfg.output_steps;
    let clock = ManualClock::new();
    let mut out = RecordingSteps::new();
    // Invalid configs are rejected with a typed error, never a panic.
    let Ok(mut ch) = ControlChannel::initialize(cfg, Arc::new(clock.clone()), &mut out) else {
        return;
    };
    for (raw, dt) in input.samples {
        clock.advance_ms(u64::from(dt));
        if ch.on_sample(raw, &mut out).is_err() {
            return;
        }
        assert!(ch.current_level() <= steps);
    }
});
