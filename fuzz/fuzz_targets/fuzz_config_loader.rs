#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // TOML parsing of Config must never panic; parse and validation errors are fine.
    let parsed = toml::from_str::<sprayer_config::Config>(data);
    match parsed {
        Ok(cfg) => {
            // Ensure validate() and valve resolution do not panic
            let _ = cfg.validate();
            let _ = cfg.valves.resolve();
        }
        Err(_e) => {
            // parse error is acceptable
        }
    }
});
