//! Unit tests for the sliding-window rate limiter

use macrofeed::limiter::{RateLimit, RateLimiter};
use macrofeed::models::ProviderId;
use std::collections::HashMap;
use tokio::time::{Duration, Instant};

fn limiter(calls_per_minute: usize, burst_limit: usize) -> RateLimiter {
    RateLimiter::new(HashMap::from([(
        ProviderId::Yahoo,
        RateLimit {
            calls_per_minute,
            burst_limit,
        },
    )]))
}

#[tokio::test(start_paused = true)]
async fn admits_within_budget_without_waiting() {
    let limiter = limiter(10, 10);
    let start = Instant::now();
    for _ in 0..10 {
        limiter.acquire(ProviderId::Yahoo).await;
    }
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn burst_guard_delays_the_next_call() {
    let limiter = limiter(30, 3);
    let start = Instant::now();
    for _ in 0..3 {
        limiter.acquire(ProviderId::Yahoo).await;
    }
    assert!(start.elapsed() < Duration::from_secs(1));

    // Fourth call exceeds the burst limit and must wait out the window.
    limiter.acquire(ProviderId::Yahoo).await;
    assert!(start.elapsed() >= Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn long_window_delays_until_oldest_call_ages_out() {
    let limiter = limiter(2, 10);
    let start = Instant::now();
    limiter.acquire(ProviderId::Yahoo).await;
    limiter.acquire(ProviderId::Yahoo).await;

    limiter.acquire(ProviderId::Yahoo).await;
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(60));
    assert!(elapsed < Duration::from_secs(121));
}

#[tokio::test(start_paused = true)]
async fn unknown_provider_uses_the_default_budget() {
    let limiter = limiter(2, 2);
    let start = Instant::now();
    // Fred has no explicit limit; default allows a burst of 5.
    for _ in 0..5 {
        limiter.acquire(ProviderId::Fred).await;
    }
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn three_windows_of_calls_take_at_least_two_windows_of_time() {
    let per_minute = 5;
    let limiter = limiter(per_minute, per_minute);
    let start = Instant::now();
    for _ in 0..(3 * per_minute) {
        limiter.acquire(ProviderId::Yahoo).await;
    }
    // 3N acquires at N per minute cannot finish before two full windows
    // have elapsed.
    assert!(start.elapsed() >= Duration::from_secs(120));
}

#[tokio::test(start_paused = true)]
async fn zero_budget_degrades_to_one_call_per_window() {
    let limiter = limiter(0, 0);
    let start = Instant::now();
    limiter.acquire(ProviderId::Yahoo).await;
    assert!(start.elapsed() < Duration::from_secs(1));

    limiter.acquire(ProviderId::Yahoo).await;
    assert!(start.elapsed() >= Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn providers_are_limited_independently() {
    let limiter = limiter(30, 1);
    let start = Instant::now();
    limiter.acquire(ProviderId::Yahoo).await;
    // Yahoo's burst is exhausted but Fred is untouched.
    limiter.acquire(ProviderId::Fred).await;
    assert!(start.elapsed() < Duration::from_secs(1));
}
