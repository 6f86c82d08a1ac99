use std::time::{Duration, Instant};

/// Poll `predicate` until it holds or `timeout` elapses. Returns whether the
/// predicate ever held. The engine's loops run on their own schedule, so
/// tests assert through this instead of sleeping fixed amounts.
pub fn wait_until(timeout: Duration, predicate: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if predicate() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}
