// tests/throttle.rs

use std::time::Duration;

use tokio::time::Instant;

use execbatch::exec::Throttle;

const INTERVAL: Duration = Duration::from_millis(100);

#[test]
fn first_request_emits_immediately() {
    let mut throttle = Throttle::new(INTERVAL);
    let now = Instant::now();

    assert!(throttle.request(now));
    assert!(!throttle.is_pending());
    assert_eq!(throttle.deadline(), None);
}

#[test]
fn requests_inside_the_interval_coalesce() {
    let mut throttle = Throttle::new(INTERVAL);
    let t0 = Instant::now();

    assert!(throttle.request(t0));
    assert!(!throttle.request(t0 + Duration::from_millis(10)));
    assert!(!throttle.request(t0 + Duration::from_millis(50)));

    assert!(throttle.is_pending());
    assert_eq!(throttle.deadline(), Some(t0 + INTERVAL));

    throttle.mark_emitted(t0 + INTERVAL);
    assert!(!throttle.is_pending());

    // Next window starts at the coalesced emission.
    assert!(!throttle.request(t0 + Duration::from_millis(150)));
    assert_eq!(throttle.deadline(), Some(t0 + INTERVAL * 2));
}

#[test]
fn request_after_quiet_period_emits_again() {
    let mut throttle = Throttle::new(INTERVAL);
    let t0 = Instant::now();

    assert!(throttle.request(t0));
    assert!(throttle.request(t0 + INTERVAL));
    assert!(throttle.request(t0 + INTERVAL * 5));
}

#[test]
fn cancel_pending_drops_the_deadline() {
    let mut throttle = Throttle::new(INTERVAL);
    let t0 = Instant::now();

    throttle.request(t0);
    throttle.request(t0 + Duration::from_millis(1));
    throttle.cancel_pending();

    assert!(!throttle.is_pending());
    assert_eq!(throttle.deadline(), None);
}
