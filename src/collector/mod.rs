pub mod channel;
pub mod darwin;
pub mod nur;
pub mod s3;

use clap::ValueEnum;
use reqwest::blocking::Client;

use crate::envelope::ReleaseStream;
use crate::error::Result;
use crate::settings::Settings;

/// One package ecosystem the indexer knows about.
///
/// `latest_release` returns an opaque identifier that is handed back
/// unchanged to `download_release`.
pub trait Collector {
    fn name(&self) -> &str;
    fn latest_release(&self) -> Result<String>;
    fn download_release(&self, release: &str) -> Result<Box<dyn ReleaseStream>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Ecosystem {
    Darwin,
    Nixos,
    Nixpkgs,
    Nur,
}

impl Ecosystem {
    pub fn collector(self, client: Client, settings: &Settings) -> Box<dyn Collector> {
        match self {
            Ecosystem::Darwin => Box::new(darwin::DarwinManual::new(client, settings)),
            Ecosystem::Nixos => Box::new(channel::ReleaseChannel::nixos(client, settings)),
            Ecosystem::Nixpkgs => Box::new(channel::ReleaseChannel::nixpkgs(client, settings)),
            Ecosystem::Nur => Box::new(nur::NurSearch::new(client)),
        }
    }

    pub fn output_file(self) -> &'static str {
        match self {
            Ecosystem::Darwin => "darwin.json",
            Ecosystem::Nixos => "nixos.json",
            Ecosystem::Nixpkgs => "nixpkgs.json",
            Ecosystem::Nur => "nur.json",
        }
    }
}
