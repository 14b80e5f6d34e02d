use std::time::Duration;

pub const DEFAULT_STATUS_BASE_URL: &str = "http://127.0.0.1:3000/";
pub const STATUS_PATH: &str = "/server_status/";
pub const PLAYERS_PATH: &str = "/server_players/";

pub const SIDEBAR_POLL_INTERVAL_SECS: u64 = 60;
pub const INFO_PANEL_POLL_INTERVAL_SECS: u64 = 60;
pub const ONLINE_LIST_POLL_INTERVAL_SECS: u64 = 30;

pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;

/// Data attribute holding a widget's status endpoint.
pub const DATA_ENDPOINT: &str = "endpoint";
/// Data attribute holding a widget's poll interval in milliseconds.
pub const DATA_INTERVAL_MS: &str = "interval-ms";

pub fn status_base_url() -> String {
    std::env::var("STATUS_BASE_URL")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_STATUS_BASE_URL.to_string())
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{status_base_url, upstream_connect_timeout, upstream_http_timeout};

    #[test]
    fn base_url_falls_back_when_unset_or_blank() {
        temp_env::with_var_unset("STATUS_BASE_URL", || {
            assert_eq!(status_base_url(), "http://127.0.0.1:3000/");
        });
        temp_env::with_var("STATUS_BASE_URL", Some("   "), || {
            assert_eq!(status_base_url(), "http://127.0.0.1:3000/");
        });
        temp_env::with_var("STATUS_BASE_URL", Some(" https://ot.example/ "), || {
            assert_eq!(status_base_url(), "https://ot.example/");
        });
    }

    #[test]
    fn timeouts_ignore_zero_and_garbage() {
        temp_env::with_vars(
            [
                ("UPSTREAM_HTTP_TIMEOUT_SECS", Some("0")),
                ("UPSTREAM_CONNECT_TIMEOUT_SECS", Some("soon")),
            ],
            || {
                assert_eq!(upstream_http_timeout(), Duration::from_secs(10));
                assert_eq!(upstream_connect_timeout(), Duration::from_secs(3));
            },
        );
        temp_env::with_vars(
            [
                ("UPSTREAM_HTTP_TIMEOUT_SECS", Some("4")),
                ("UPSTREAM_CONNECT_TIMEOUT_SECS", Some("1")),
            ],
            || {
                assert_eq!(upstream_http_timeout(), Duration::from_secs(4));
                assert_eq!(upstream_connect_timeout(), Duration::from_secs(1));
            },
        );
    }
}
