//! Runtime configuration: registry endpoints, bundle hosts, storage keys, and session defaults.
//!
//! Every section is `#[serde(default)]`, so a TOML override only needs the keys it changes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dock id that always exists and is always pinned.
pub const FINDER_ID: &str = "finder";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid runtime config: {0}")]
/// Raised when a configuration document cannot be parsed.
pub struct ConfigError(String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
/// Top-level runtime configuration.
pub struct RuntimeConfig {
    /// Remote registry endpoints and cache policy.
    pub registry: RegistryConfig,
    /// Bundle CDN hosts.
    pub bundles: BundleConfig,
    /// Persisted-state keys.
    pub storage: StorageKeys,
    /// Dock defaults.
    pub dock: DockConfig,
    /// Window stacking.
    pub windows: WindowStackConfig,
    /// Quick Look key bindings.
    pub quick_look: QuickLookConfig,
    /// Installed-apps catalog snapshot policy.
    pub catalog: CatalogConfig,
}

impl RuntimeConfig {
    /// Parses a TOML override document on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document is not valid TOML for this shape.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|err| ConfigError(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Registry endpoints and the in-memory cache TTL.
pub struct RegistryConfig {
    /// Static catalog document (primary, unauthenticated, not rate limited).
    pub primary_url: String,
    /// Paginated source listing (fallback, rate limited).
    pub fallback_listing_url: String,
    /// Per-source configuration file URL; `{org}` and `{repo}` are substituted.
    pub fallback_config_url_template: String,
    /// Organisation owning the listed sources.
    pub org: String,
    /// Field of the package descriptor holding the shell namespace.
    pub manifest_field: String,
    /// Listing page size.
    pub page_size: u32,
    /// Upper bound on listing pages fetched.
    pub max_pages: u32,
    /// In-memory cache lifetime.
    pub ttl_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            primary_url: "https://raw.githubusercontent.com/desktop-apps/registry/main/registry.json"
                .to_string(),
            fallback_listing_url: "https://api.github.com/orgs/desktop-apps/repos".to_string(),
            fallback_config_url_template:
                "https://api.github.com/repos/{org}/{repo}/contents/package.json".to_string(),
            org: "desktop-apps".to_string(),
            manifest_field: "desktopApp".to_string(),
            page_size: 100,
            max_pages: 10,
            ttl_secs: 5 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Bundle URL template inputs.
pub struct BundleConfig {
    /// Scheme, host and path prefix of the primary CDN.
    pub cdn_base: String,
    /// Alternate host serving the same paths.
    pub fallback_host: String,
    /// Entry file inside a published version.
    pub entry_path: String,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            cdn_base: "https://cdn.jsdelivr.net/gh".to_string(),
            fallback_host: "fastly.jsdelivr.net".to_string(),
            entry_path: "dist/index.js".to_string(),
        }
    }
}

impl BundleConfig {
    /// Builds `<cdn_base>/<org>/<repo>@<version>/<entry_path>`.
    pub fn bundle_url(&self, org: &str, repo: &str, version: &str) -> String {
        format!(
            "{}/{org}/{repo}@{version}/{}",
            self.cdn_base.trim_end_matches('/'),
            self.entry_path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Keys of the JSON values persisted in the key/value store.
pub struct StorageKeys {
    /// Dock ordering.
    pub dock: String,
    /// Installed-application records.
    pub installed_apps: String,
    /// Registry snapshot used by the installed-apps catalog.
    pub registry_snapshot: String,
    /// Window stack snapshot.
    pub windows: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            dock: "desktop.dock.v1".to_string(),
            installed_apps: "desktop.installed-apps.v1".to_string(),
            registry_snapshot: "desktop.registry-snapshot.v1".to_string(),
            windows: "desktop.windows.v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Built-in dock arrangement.
pub struct DockConfig {
    /// Default dock ids in order. `finder` is always forced to exist.
    pub default_items: Vec<String>,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            default_items: [
                FINDER_ID,
                "launchpad",
                "safari",
                "messages",
                "mail",
                "notes",
                "calendar",
                "terminal",
                "app-store",
                "settings",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Window stacking configuration.
pub struct WindowStackConfig {
    /// Highest reserved z-index; window z-indices start above it.
    pub z_index_floor: u64,
}

impl Default for WindowStackConfig {
    fn default() -> Self {
        Self { z_index_floor: 100 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
/// Modifier that must accompany `F` to toggle Quick Look fullscreen.
pub enum PlatformModifier {
    /// Command key (macOS convention).
    Meta,
    /// Control key.
    Control,
    /// Either Command or Control.
    #[default]
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
/// Quick Look configuration.
pub struct QuickLookConfig {
    /// Fullscreen toggle modifier.
    pub fullscreen_modifier: PlatformModifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Installed-apps catalog configuration.
pub struct CatalogConfig {
    /// Lifetime of the persisted registry snapshot.
    pub snapshot_ttl_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            snapshot_ttl_secs: 60 * 60,
        }
    }
}
