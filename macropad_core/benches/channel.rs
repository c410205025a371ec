use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use macropad_core::mocks::RecordingSteps;
use macropad_core::{ChannelCfg, ControlChannel};
use macropad_traits::clock::Clock;
use macropad_traits::clock::test_clock::ManualClock;

// Slow sweep across the ADC range with additive noise, like a hand on the slider
fn synth_sweep(n: usize, noise_amp: i32, seed: u32) -> Vec<i32> {
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        x
    };
    let span = (noise_amp * 2 + 1) as u32;
    (0..n)
        .map(|i| {
            let t = i as f32 / 2000.0;
            let base = ((t.sin() + 1.0) * 2047.5) as i32;
            base + (next() % span) as i32 - noise_amp
        })
        .collect()
}

fn ready_channel(alpha: Option<f32>) -> (ControlChannel, RecordingSteps) {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(ManualClock::new());
    let mut out = RecordingSteps::new();
    let cfg = ChannelCfg {
        ema_alpha: alpha,
        reset_burst: false,
        settle_ms: 0,
        ..ChannelCfg::default()
    };
    let ch = ControlChannel::initialize(cfg, clock, &mut out).expect("valid cfg");
    (ch, out)
}

pub fn bench_on_sample(c: &mut Criterion) {
    let mut g = c.benchmark_group("on_sample");
    // Quick runs: BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p macropad_core --bench channel
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    let trace = synth_sweep(50_000, 8, 0xC0FFEE);

    for alpha in [None, Some(0.1f32), Some(0.5)] {
        let label = alpha.map_or_else(|| "raw".to_string(), |a| format!("ema_{a}"));
        g.bench_function(label, |b| {
            b.iter_batched(
                || ready_channel(alpha),
                |(mut ch, mut out)| {
                    for &raw in &trace {
                        let o = ch.on_sample(black_box(raw), &mut out);
                        black_box(o.ok());
                    }
                    black_box(out.total());
                },
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

criterion_group!(channel, bench_on_sample);
criterion_main!(channel);
