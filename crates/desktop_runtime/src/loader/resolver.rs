//! Bundle location resolution: primary bundle URL plus the same path on an alternate host.

use desktop_app_contract::RegistryEntry;
use url::Url;

use crate::config::BundleConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where a bundle can be imported from.
pub struct BundleLocation {
    /// URL tried first.
    pub primary: String,
    /// URL tried once when the primary import fails.
    pub fallback: Option<String>,
}

/// Maps registry entries and explicit bundle URLs to import locations.
///
/// Hosts that load code differently (dynamic linking, subprocesses) swap the resolver and the
/// [`platform_host::BundleImporter`] together.
pub trait BundleResolver {
    /// Resolves an explicit bundle URL.
    fn resolve_url(&self, bundle_url: &str) -> BundleLocation;

    /// Resolves a registry entry.
    fn resolve(&self, entry: &RegistryEntry) -> BundleLocation {
        self.resolve_url(&entry.bundle_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Resolver that mirrors a bundle path onto a fallback CDN host.
pub struct CdnBundleResolver {
    fallback_host: String,
}

impl CdnBundleResolver {
    /// Resolver using the configured fallback host.
    pub fn new(config: &BundleConfig) -> Self {
        Self {
            fallback_host: config.fallback_host.clone(),
        }
    }

    fn fallback_for(&self, primary: &str) -> Option<String> {
        let mut url = Url::parse(primary).ok()?;
        if self.fallback_host.is_empty() || url.host_str() == Some(self.fallback_host.as_str()) {
            return None;
        }
        url.set_host(Some(&self.fallback_host)).ok()?;
        Some(url.into())
    }
}

impl BundleResolver for CdnBundleResolver {
    fn resolve_url(&self, bundle_url: &str) -> BundleLocation {
        BundleLocation {
            primary: bundle_url.to_string(),
            fallback: self.fallback_for(bundle_url),
        }
    }
}
