#![no_main]
use libfuzzer_sys::fuzz_target;

// Arbitrary TOML must either fail to parse or validate without panicking.
fuzz_target!(|data: &str| {
    let Ok(cfg) = macropad_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        // A validated config always yields a usable raw range.
        let (min, max) = cfg.slider_range();
        assert!(max > min);
    }
});
