use std::io::Read;

use reqwest::blocking::Client;
use serde::Deserialize;

use super::Collector;
use crate::envelope::{PackagesEnvelope, ReleaseStream};
use crate::error::{CollectError, Result};
use crate::net;

const COMMITS_URL: &str =
    "https://api.github.com/repos/nix-community/nur-search/commits?page=1&per_page=1";
const PACKAGES_URL: &str = "https://raw.githubusercontent.com/nix-community/nur-search";

#[derive(Debug, Deserialize)]
struct Commit {
    sha: String,
}

/// The NUR package index, versioned by nur-search commit.
pub struct NurSearch {
    client: Client,
}

impl NurSearch {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Sha of the first commit in a GitHub commits listing.
fn newest_sha(body: impl Read) -> Result<String> {
    let commits: Vec<Commit> = serde_json::from_reader(body)?;
    commits
        .into_iter()
        .next()
        .map(|c| c.sha)
        .ok_or_else(|| CollectError::MissingVersionMarker(COMMITS_URL.into()))
}

fn packages_url(sha: &str) -> String {
    format!("{}/{}/data/packages.json", PACKAGES_URL, sha)
}

impl Collector for NurSearch {
    fn name(&self) -> &str {
        "nur"
    }

    fn latest_release(&self) -> Result<String> {
        newest_sha(net::get(&self.client, COMMITS_URL)?)
    }

    fn download_release(&self, release: &str) -> Result<Box<dyn ReleaseStream>> {
        let resp = net::get(&self.client, &packages_url(release))?;
        Ok(Box::new(PackagesEnvelope::new(Box::new(resp))))
    }
}
