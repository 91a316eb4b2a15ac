use std::collections::VecDeque;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use time::OffsetDateTime;

const CAPACITY: usize = 512;

static LOG_BUFFER: Lazy<RwLock<VecDeque<String>>> =
    Lazy::new(|| RwLock::new(VecDeque::with_capacity(CAPACITY)));

/// Appends a timestamped line, dropping the oldest once the buffer is full.
pub fn push_log(line: impl Into<String>) {
    let stamped = format!("{} {}", OffsetDateTime::now_utc(), line.into());
    let mut buffer = match LOG_BUFFER.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if buffer.len() >= CAPACITY {
        buffer.pop_front();
    }
    buffer.push_back(stamped);
}

pub fn snapshot() -> Vec<String> {
    LOG_BUFFER
        .read()
        .map(|buffer| buffer.iter().cloned().collect())
        .unwrap_or_default()
}
