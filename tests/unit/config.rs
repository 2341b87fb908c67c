//! Unit tests for environment-based configuration

use macrofeed::config::Config;
use std::time::Duration;

// A single test touches RETRY_DELAY so parallel test threads never race
// on the process environment.
#[test]
fn retry_delay_falls_back_on_unusable_values() {
    for bad in ["-3", "inf", "NaN"] {
        std::env::set_var("RETRY_DELAY", bad);
        let config = Config::from_env();
        assert_eq!(
            config.retry_delay,
            Duration::from_secs(2),
            "RETRY_DELAY={bad} should fall back to the default"
        );
    }

    std::env::set_var("RETRY_DELAY", "0.5");
    let config = Config::from_env();
    assert_eq!(config.retry_delay, Duration::from_millis(500));

    std::env::remove_var("RETRY_DELAY");
}
