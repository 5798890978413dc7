use std::time::Duration;

use reqwest::blocking::{Client, Response};
use tracing::info;

use crate::error::{CollectError, Result};
use crate::settings::Settings;

pub fn client(settings: &Settings) -> Result<Client> {
    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .build()
        .map_err(CollectError::HttpClient)
}

/// GET `url`, failing on transport errors and non-success statuses.
pub fn get(client: &Client, url: &str) -> Result<Response> {
    info!("GET {}", url);
    let resp = client.get(url).send().map_err(|source| CollectError::Fetch {
        url: url.to_string(),
        source,
    })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(CollectError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp)
}

/// GET `url` and read the whole body as text.
pub fn get_text(client: &Client, url: &str) -> Result<String> {
    get(client, url)?
        .text()
        .map_err(|source| CollectError::Fetch {
            url: url.to_string(),
            source,
        })
}
