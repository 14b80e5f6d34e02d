use std::time::Duration;

pub const DEFAULT_SERVER_PORT: u16 = 3000;

pub const DEFAULT_OT_STATUS_HOST: &str = "127.0.0.1";
pub const DEFAULT_OT_STATUS_PORT: u16 = 7171;
pub const DEFAULT_OT_STATUS_TIMEOUT_MS: u64 = 3000;
pub const MAX_OT_STATUS_TIMEOUT_MS: u64 = 300_000;
pub const DEFAULT_OT_STATUS_MIN_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_OT_STATUS_RETRIES: u32 = 1;
pub const DEFAULT_OT_STATUS_RETRY_DELAY_MS: u64 = 1000;

/// Quiet period that ends an unframed status reply.
pub const STATUS_READ_IDLE_MS: u64 = 250;
/// Pause before the one extra read of a reply that came back empty.
pub const STATUS_EMPTY_GRACE_MS: u64 = 100;
pub const MAX_RAW_STATUS_BYTES: usize = 1_048_576;

pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn ot_status_host() -> String {
    std::env::var("OT_STATUS_HOST")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_OT_STATUS_HOST.to_string())
}

pub fn ot_status_port() -> u16 {
    std::env::var("OT_STATUS_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_OT_STATUS_PORT)
}

pub fn ot_status_timeout() -> Duration {
    std::env::var("OT_STATUS_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(|value| Duration::from_millis(value.min(MAX_OT_STATUS_TIMEOUT_MS)))
        .unwrap_or_else(|| Duration::from_millis(DEFAULT_OT_STATUS_TIMEOUT_MS))
}

pub fn ot_status_min_interval() -> Duration {
    std::env::var("OT_STATUS_MIN_INTERVAL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_OT_STATUS_MIN_INTERVAL_SECS))
}

pub fn ot_status_retries() -> u32 {
    std::env::var("OT_STATUS_RETRIES")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(DEFAULT_OT_STATUS_RETRIES)
}

pub fn ot_status_retry_delay() -> Duration {
    std::env::var("OT_STATUS_RETRY_DELAY_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(DEFAULT_OT_STATUS_RETRY_DELAY_MS))
}
