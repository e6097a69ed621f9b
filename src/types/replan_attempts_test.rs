//! Tests for `ReplanAttempts`.

use super::ReplanAttempts;

#[test]
fn starts_at_zero() {
  let r = ReplanAttempts::default();
  assert_eq!(r.for_step(1), 0);
  assert_eq!(r.total, 0);
  assert_eq!(r.max_step_attempts(), 0);
}

#[test]
fn step_attempts_are_per_step() {
  let r = ReplanAttempts::default()
    .with_step_attempt(1)
    .with_step_attempt(1)
    .with_step_attempt(3);
  assert_eq!(r.for_step(1), 2);
  assert_eq!(r.for_step(2), 0);
  assert_eq!(r.for_step(3), 1);
  assert_eq!(r.max_step_attempts(), 2);
  assert_eq!(r.total, 0);
}

#[test]
fn revisions_only_touch_total() {
  let r = ReplanAttempts::default().with_revision().with_revision();
  assert_eq!(r.total, 2);
  assert!(r.per_step.is_empty());
}

#[test]
fn copies_leave_original_untouched() {
  let r = ReplanAttempts::default();
  let _ = r.with_step_attempt(1).with_revision();
  assert_eq!(r, ReplanAttempts::default());
}
