//! Foundational low-level utilities shared across Hublink crates.
//!
//! Provides atomic file-write helpers, time utilities, and the append-only
//! JSONL event log used as the diagnostic side channel for webhook ingress.

pub mod atomic_io;
pub mod event_log;
pub mod time_utils;

pub use atomic_io::write_text_atomic;
pub use event_log::JsonlEventLog;
pub use time_utils::{current_unix_timestamp, current_unix_timestamp_ms};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_utils_round_trip_bounds() {
        let now_s = current_unix_timestamp();
        let now_ms = current_unix_timestamp_ms();
        let now_ms_s = now_ms / 1_000;
        assert!(now_ms_s >= now_s);
        assert!(now_ms_s <= now_s.saturating_add(1));
    }
}
