// Shared constants for endpoints and timing.

pub const DEFAULT_ENDPOINT: &str = "wss://ws.woltride.com";
/// Fixed reconnect delay. Known simplification: a production-grade
/// policy would use jittered exponential backoff with a cap.
pub const RECONNECT_DELAY_MS: u64 = 3_000;
pub const STATS_INTERVAL_SECS: u64 = 10;
pub const COMMAND_QUEUE_CAP: usize = 8;
