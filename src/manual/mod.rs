//! Option records extracted from a rendered options manual.
//!
//! The manual is a `<dl>` of `dt span.term` / `dd` pairs. Each `dd` mixes
//! prose with labelled fields (`Type:`, `Default:`, `Example:`,
//! `Declared by:`), which are pulled out into a [`Package`]; what is left of
//! the block becomes the description.

pub mod fields;
pub mod labels;

use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CollectError, Result};

static TERM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dt span.term").unwrap());
static DEFINITION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dd").unwrap());
static VERSION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2.subtitle").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub r#type: String,
    pub default: String,
    pub example: String,
    #[serde(rename = "declarations")]
    pub declared_by: Vec<String>,
    pub description: String,
}

/// Option name -> record. Iteration order is unspecified.
pub type PackageMap = HashMap<String, Package>;

/// Pair every term with the definition block at the same position.
///
/// A count mismatch means the page layout changed; nothing is returned then.
pub fn extract_packages(html: &Html) -> Result<PackageMap> {
    let terms: Vec<_> = html.select(&TERM).collect();
    let definitions: Vec<_> = html.select(&DEFINITION).collect();

    if terms.len() != definitions.len() {
        return Err(CollectError::StructureMismatch {
            terms: terms.len(),
            definitions: definitions.len(),
        });
    }

    let mut packages = PackageMap::with_capacity(terms.len());
    for (term, definition) in terms.into_iter().zip(definitions) {
        let name = term.text().collect::<String>().trim().to_string();
        let pkg = fields::extract(name.clone(), definition);
        packages.insert(name, pkg);
    }

    info!("Extracted {} packages", packages.len());
    Ok(packages)
}

/// Version from the manual subtitle, e.g. "Version 25.05" -> "25.05".
pub fn release_version(html: &Html) -> Result<String> {
    let subtitle = html
        .select(&VERSION)
        .next()
        .ok_or_else(|| CollectError::MissingVersionMarker("h2.subtitle".into()))?;

    let text = subtitle.text().collect::<String>();
    let version = text
        .trim_start()
        .split_once(' ')
        .map(|(_, v)| v.trim())
        .unwrap_or_default();
    Ok(version.to_string())
}
