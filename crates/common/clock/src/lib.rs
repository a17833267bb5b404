use chrono::DateTime;
use chrono::Duration;
use chrono::FixedOffset;
use chrono::Local;
use mockall::automock;

pub type Timestamp = DateTime<FixedOffset>;

/// A source of wall-clock timestamps.
///
/// Components that report elapsed time take a `Clock` rather than calling
/// `Local::now()` directly, so tests can substitute a `MockClock` returning
/// scripted instants.
#[automock]
pub trait Clock: Sync + Send + 'static {
    fn now(&self) -> Timestamp;
}

#[derive(Clone)]
pub struct WallClock;

impl Clock for WallClock {
    fn now(&self) -> Timestamp {
        let local_time_now = Local::now();
        local_time_now.with_timezone(local_time_now.offset())
    }
}

/// Duration between `start` and the clock's current instant.
///
/// Returns a zero duration if the clock went backwards between the two reads.
pub fn elapsed_since(clock: &dyn Clock, start: Timestamp) -> Duration {
    let elapsed = clock.now() - start;
    if elapsed < Duration::zero() {
        Duration::zero()
    } else {
        elapsed
    }
}
