pub mod notion_client;
pub mod webhook_client;

use std::time::Duration;

/// Shared reqwest client; every outbound call is bounded by `timeout`.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("scheduleBot/", env!("CARGO_PKG_VERSION")))
        .build()
}
