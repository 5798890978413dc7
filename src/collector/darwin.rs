use std::io::Cursor;

use reqwest::blocking::Client;
use scraper::Html;

use super::Collector;
use crate::envelope::{PackagesEnvelope, ReleaseStream};
use crate::error::Result;
use crate::manual;
use crate::net;
use crate::settings::Settings;

/// nix-darwin options, scraped from the rendered manual.
pub struct DarwinManual {
    client: Client,
    url: String,
}

impl DarwinManual {
    pub fn new(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            url: settings.darwin_manual_url.clone(),
        }
    }

    fn load(&self) -> Result<Html> {
        let body = net::get_text(&self.client, &self.url)?;
        Ok(Html::parse_document(&body))
    }
}

impl Collector for DarwinManual {
    fn name(&self) -> &str {
        "darwin"
    }

    fn latest_release(&self) -> Result<String> {
        manual::release_version(&self.load()?)
    }

    /// The manual only ever shows the current release, so `release` is unused.
    /// The page is fetched again here; `latest_release` already loaded it once.
    fn download_release(&self, _release: &str) -> Result<Box<dyn ReleaseStream>> {
        enveloped(&self.load()?)
    }
}

/// Extract every option of `html` and wrap the JSON mapping for the indexer.
pub fn enveloped(html: &Html) -> Result<Box<dyn ReleaseStream>> {
    let packages = manual::extract_packages(html)?;
    let body = serde_json::to_vec(&packages)?;
    Ok(Box::new(PackagesEnvelope::new(Box::new(Cursor::new(body)))))
}
