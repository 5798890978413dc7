use reqwest::blocking::Client;
use tracing::info;

use super::{s3, Collector};
use crate::envelope::ReleaseStream;
use crate::error::Result;
use crate::net;
use crate::settings::Settings;

const BROTLI_BUFFER: usize = 64 * 1024;

/// A release channel published to the `nix-releases` bucket as
/// `<prefix><release>/<file>.br`.
pub struct ReleaseChannel {
    client: Client,
    name: &'static str,
    s3_endpoint: String,
    releases_url: String,
    prefix: &'static str,
    start_after: &'static str,
    file: &'static str,
}

impl ReleaseChannel {
    pub fn nixpkgs(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            name: "nixpkgs",
            s3_endpoint: settings.s3_endpoint.clone(),
            releases_url: settings.releases_url.clone(),
            prefix: "nixpkgs/",
            // Latest release at the time of writing; listing starts here.
            start_after: "nixpkgs/nixpkgs-25.05pre747523.95ea544c84eb",
            file: "packages.json.br",
        }
    }

    pub fn nixos(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            name: "nixos",
            s3_endpoint: settings.s3_endpoint.clone(),
            releases_url: settings.releases_url.clone(),
            prefix: "nixos/unstable/",
            start_after: "nixos/unstable/nixos-25.05beta751650.64e75cd44acf",
            file: "options.json.br",
        }
    }

    pub fn release_url(&self, release: &str) -> String {
        let release = release.strip_prefix(self.prefix).unwrap_or(release);
        format!(
            "{}/{}{}/{}",
            self.releases_url.trim_end_matches('/'),
            self.prefix,
            release.trim_matches('/'),
            self.file
        )
    }
}

impl Collector for ReleaseChannel {
    fn name(&self) -> &str {
        self.name
    }

    fn latest_release(&self) -> Result<String> {
        let latest = s3::latest_key(&self.client, &self.s3_endpoint, self.prefix, self.start_after)?;
        Ok(latest.unwrap_or_else(|| self.start_after.to_string()))
    }

    fn download_release(&self, release: &str) -> Result<Box<dyn ReleaseStream>> {
        let url = self.release_url(release);
        let resp = net::get(&self.client, &url)?;
        info!("Streaming {} through brotli", self.file);
        Ok(Box::new(brotli::Decompressor::new(resp, BROTLI_BUFFER)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            output_dir: ".".into(),
            http_timeout_secs: 5,
            user_agent: "test".into(),
            s3_endpoint: "https://s3.invalid".into(),
            releases_url: "https://releases.nixos.org/".into(),
            darwin_manual_url: "https://manual.invalid".into(),
        }
    }

    #[test]
    fn nixpkgs_release_url() {
        let ch = ReleaseChannel::nixpkgs(Client::new(), &settings());
        assert_eq!(
            ch.release_url("nixpkgs/nixpkgs-25.11pre800000.0123456789ab"),
            "https://releases.nixos.org/nixpkgs/nixpkgs-25.11pre800000.0123456789ab/packages.json.br"
        );
    }

    #[test]
    fn nixos_release_url() {
        let ch = ReleaseChannel::nixos(Client::new(), &settings());
        assert_eq!(
            ch.release_url("nixos/unstable/nixos-25.11pre800000.0123456789ab/"),
            "https://releases.nixos.org/nixos/unstable/nixos-25.11pre800000.0123456789ab/options.json.br"
        );
    }

    #[test]
    fn bare_release_name() {
        let ch = ReleaseChannel::nixos(Client::new(), &settings());
        assert_eq!(
            ch.release_url("nixos-25.11pre1.abc"),
            "https://releases.nixos.org/nixos/unstable/nixos-25.11pre1.abc/options.json.br"
        );
    }
}
