use std::time::Duration;

use anyhow::Result;

/// Bound on every upstream pricing request; a timed-out source counts as
/// failed and the fallback chain moves on.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the reqwest client used by the pricing providers.
pub fn http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent("folio/0.2")
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    Ok(client)
}
