//! Shop profiles: the unit of per-shop configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::catalog::CatalogUrlConfig;
use super::selectors::SelectorSet;

/// Parsing protocol used for a shop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Basic phase (name + URL) then detail phase per product page.
    /// Deduplicates on product URL.
    #[default]
    TwoPhase,
    /// **Deprecated.** Single pass over catalog pages capturing name and price,
    /// deduplicated on name + normalized price and saved in one batch. Kept for
    /// shops whose product pages cannot be fetched; new profiles should use
    /// `TwoPhase`.
    LegacySinglePhase,
}

/// Static description of one shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopProfile {
    pub name: String,
    #[serde(default)]
    pub shop_url: Option<String>,
    pub base_urls: Vec<CatalogUrlConfig>,
    pub selectors: SelectorSet,
    #[serde(default)]
    pub mode: ParseMode,
    /// Overrides the global page ceiling for this shop
    #[serde(default)]
    pub max_pages: Option<u32>,
}

/// Loads shop profiles from a JSON array.
///
/// Profiles are only deserialized here; selectors and URLs are validated when
/// a `ShopParser` is built, so one broken profile does not hide the others.
pub fn load_profiles(path: &Path) -> Result<Vec<ShopProfile>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read shop profiles from {}", path.display()))?;
    let profiles: Vec<ShopProfile> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse shop profiles in {}", path.display()))?;
    Ok(profiles)
}

/// Profiles compiled into the binary from `shops.json`, used when no
/// `--shops-file` is given.
pub fn builtin_profiles() -> Result<Vec<ShopProfile>> {
    serde_json::from_str(BUILTIN_PROFILES).context("Failed to parse built-in shop profiles")
}

const BUILTIN_PROFILES: &str = include_str!("../../shops.json");

/// Keeps the profiles whose names appear in `names` (case-insensitive).
///
/// An empty filter keeps everything. Unknown names are logged.
pub fn select_profiles(profiles: Vec<ShopProfile>, names: &[String]) -> Vec<ShopProfile> {
    if names.is_empty() {
        return profiles;
    }
    for name in names {
        if !profiles.iter().any(|p| p.name.eq_ignore_ascii_case(name)) {
            log::warn!("No shop profile named '{}'", name);
        }
    }
    profiles
        .into_iter()
        .filter(|p| names.iter().any(|n| n.eq_ignore_ascii_case(&p.name)))
        .collect()
}
