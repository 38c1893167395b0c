use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock `(seconds, subsec_nanos)` since the unix epoch; zero if the clock is behind it.
#[inline]
pub fn now_unix() -> (u64, u32) {
    let since = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    (since.as_secs(), since.subsec_nanos())
}

