use crate::ElapsedClock;

use std::{thread::sleep, time::Duration};

/// WHAT: Paused time is excluded from elapsed
/// WHY: The HUD shows recorded time, not wall time
#[test]
fn given_paused_clock_when_time_passes_then_elapsed_frozen() {
    // Given: A running clock that is then paused
    let mut clock = ElapsedClock::default();
    clock.restart();
    sleep(Duration::from_millis(20));
    clock.pause();
    let frozen = clock.elapsed();

    // When: Time passes while paused
    sleep(Duration::from_millis(20));

    // Then: Elapsed has not moved
    assert_eq!(clock.elapsed(), frozen);
    assert!(frozen >= Duration::from_millis(20));
    assert!(!clock.is_running());

    // When: Resumed
    clock.resume();
    sleep(Duration::from_millis(10));

    // Then: Accumulation continues from the frozen value
    assert!(clock.elapsed() >= frozen + Duration::from_millis(10));
}

/// WHAT: Reset zeroes and stops the clock
/// WHY: A finished recording must not leak time into the next one
#[test]
fn given_running_clock_when_reset_then_zero() {
    let mut clock = ElapsedClock::default();
    clock.restart();
    clock.reset();

    assert_eq!(clock.elapsed(), Duration::ZERO);
    assert!(!clock.is_running());
}
