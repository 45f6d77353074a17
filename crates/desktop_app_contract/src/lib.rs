//! Shared contract types between the desktop session runtime, its host adapters, and loadable apps.
//!
//! The registry wire shapes (`AppRegistry`, `RegistryEntry`, `AppManifest`) use camelCase field
//! names so the same JSON document can be served to every shell build. Loaded applications carry
//! an opaque [`AppComponent`] handle that the shell mounts; this crate never renders anything
//! itself.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::{any::Any, collections::BTreeMap, collections::BTreeSet, fmt, rc::Rc};

use leptos::View;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable identifier for an installable application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Returns an app identifier when `raw` conforms to the lowercase `segment[.segment...]` policy.
    pub fn new(raw: impl Into<String>) -> Result<Self, String> {
        let raw = raw.into();
        if is_valid_application_id(&raw) {
            Ok(Self(raw))
        } else {
            Err(format!(
                "invalid application id `{raw}`; expected lowercase dotted segments"
            ))
        }
    }

    /// Returns the string form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creates an id without validation for compile-time/runtime trusted constants.
    pub fn trusted(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ApplicationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_valid_application_id(raw: &str) -> bool {
    if raw.is_empty() || raw.len() > 120 {
        return false;
    }

    raw.split('.').all(|part| {
        let bytes = part.as_bytes();
        !part.is_empty()
            && part.len() <= 64
            && (bytes[0].is_ascii_lowercase() || bytes[0].is_ascii_digit())
            && bytes
                .iter()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-' || *b == b'_')
            && !part.ends_with('-')
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
/// Catalog category used for grouping apps in the store UI.
pub enum AppCategory {
    /// Documents, notes and planning tools.
    Productivity,
    /// Editors, terminals and developer tooling.
    Development,
    /// Small system helpers.
    Utilities,
    /// Games and media.
    Entertainment,
    /// Mail, chat and messaging.
    Communication,
    /// Money and markets.
    Finance,
    /// Shell-owned system apps.
    System,
    /// Anything else, including unknown categories from newer registries.
    #[default]
    #[serde(other)]
    Other,
}

impl AppCategory {
    /// Returns a stable lowercase token for the category.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Productivity => "productivity",
            Self::Development => "development",
            Self::Utilities => "utilities",
            Self::Entertainment => "entertainment",
            Self::Communication => "communication",
            Self::Finance => "finance",
            Self::System => "system",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Declared capability tags an app requests from the shell.
pub enum AppPermission {
    /// Persisted key/value storage.
    Storage,
    /// Outbound network access.
    Network,
    /// Host notifications.
    Notifications,
    /// Clipboard read/write.
    Clipboard,
    /// Virtual filesystem access.
    Filesystem,
    /// Camera capture.
    Camera,
    /// Microphone capture.
    Microphone,
    /// Geolocation.
    Location,
    /// Tag not understood by this shell version.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Width/height pair in CSS pixels.
pub struct WindowSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Window sizing and instancing hints declared by an app.
pub struct WindowConfig {
    /// Size used when a window is first opened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_size: Option<WindowSize>,
    /// Minimum size while resizing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<WindowSize>,
    /// Maximum size while resizing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<WindowSize>,
    /// Whether the window may be resized.
    #[serde(default = "default_true")]
    pub resizable: bool,
    /// Whether several windows of the app may be open at once.
    #[serde(default)]
    pub multi_instance: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            default_size: None,
            min_size: None,
            max_size: None,
            resizable: true,
            multi_instance: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Describes an installable application.
///
/// Two manifests with the same `identifier` describe the same logical application and differ only
/// by `version`.
pub struct AppManifest {
    /// Globally unique identifier, stable across versions.
    pub identifier: ApplicationId,
    /// Human-readable display name.
    pub name: String,
    /// Semantic version string.
    pub version: String,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Author or publisher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Catalog category.
    #[serde(default)]
    pub category: AppCategory,
    /// Icon URL or icon id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Requested capability tags.
    #[serde(default)]
    pub permissions: BTreeSet<AppPermission>,
    /// Source repository URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Project homepage URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Window sizing hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_config: Option<WindowConfig>,
}

impl AppManifest {
    /// Creates a minimal manifest with default category and no optional metadata.
    pub fn new(identifier: ApplicationId, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            identifier,
            name: name.into(),
            version: version.into(),
            description: None,
            author: None,
            category: AppCategory::default(),
            icon: None,
            permissions: BTreeSet::new(),
            repository: None,
            homepage: None,
            window_config: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A manifest plus the metadata needed to locate its code bundle.
pub struct RegistryEntry {
    /// Display name as listed by the registry.
    pub name: String,
    /// Published version.
    pub version: String,
    /// Primary bundle URL.
    #[serde(rename = "bundleURL", alias = "bundleUrl")]
    pub bundle_url: String,
    /// Optional subresource integrity hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<String>,
    /// Embedded manifest.
    pub manifest: AppManifest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
/// Catalog of installable applications keyed by identifier.
pub struct AppRegistry {
    /// Registry entries keyed by application identifier.
    pub apps: BTreeMap<String, RegistryEntry>,
    /// Time the catalog was generated, as published by the source.
    #[serde(default)]
    pub updated: String,
}

impl AppRegistry {
    /// Looks up an entry by identifier.
    pub fn entry(&self, identifier: &str) -> Option<&RegistryEntry> {
        self.apps.get(identifier)
    }

    /// Returns whether the registry lists no apps.
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Where a loaded application came from.
pub enum AppSource {
    /// Compiled into the shell.
    Builtin,
    /// Resolved through the remote registry.
    Registry,
    /// Loaded from an explicit bundle URL.
    External,
}

#[derive(Clone)]
/// App mount context injected by the shell per window instance.
pub struct AppMountContext {
    /// App being mounted.
    pub app_id: ApplicationId,
    /// Window the app is mounted into.
    pub window_id: String,
    /// Launch params supplied at window-open time.
    pub launch_params: Value,
}

/// Static app mount function used by built-in apps.
pub type AppMountFn = fn(AppMountContext) -> View;

#[derive(Debug, Clone, Copy)]
/// Built-in app module compiled into the shell.
pub struct AppModule {
    mount_fn: AppMountFn,
}

impl AppModule {
    /// Creates a module from a mount function.
    pub const fn new(mount_fn: AppMountFn) -> Self {
        Self { mount_fn }
    }

    /// Mounts the app view with a shell-provided context.
    pub fn mount(self, context: AppMountContext) -> View {
        (self.mount_fn)(context)
    }
}

#[derive(Clone)]
/// Opaque renderable handle produced by loading an application.
pub enum AppComponent {
    /// Mount function compiled into the shell.
    Native(AppModule),
    /// Host-specific export produced by a bundle import (for example a JS module's default export).
    Foreign(Rc<dyn Any>),
}

impl AppComponent {
    /// Wraps a host-specific export.
    pub fn foreign<T: Any>(value: T) -> Self {
        Self::Foreign(Rc::new(value))
    }

    /// Returns the host-specific export when it has type `T`.
    pub fn downcast_foreign<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Foreign(value) => value.downcast_ref::<T>(),
            Self::Native(_) => None,
        }
    }

    /// Returns the native module, if any.
    pub fn native(&self) -> Option<AppModule> {
        match self {
            Self::Native(module) => Some(*module),
            Self::Foreign(_) => None,
        }
    }
}

impl fmt::Debug for AppComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(_) => f.write_str("AppComponent::Native"),
            Self::Foreign(_) => f.write_str("AppComponent::Foreign"),
        }
    }
}

#[derive(Clone)]
/// Result of importing a code bundle.
pub struct ImportedBundle {
    /// Default export, when the bundle exposes one.
    pub default_export: Option<AppComponent>,
}

impl ImportedBundle {
    /// Bundle whose default export is `component`.
    pub fn with_default(component: AppComponent) -> Self {
        Self {
            default_export: Some(component),
        }
    }

    /// Bundle that imported but exposes no default export.
    pub fn without_default() -> Self {
        Self {
            default_export: None,
        }
    }
}

#[derive(Debug, Clone)]
/// A loaded application, shared read-only with every consumer.
pub struct LoadedApplication {
    /// Manifest the app was loaded with.
    pub manifest: AppManifest,
    /// Renderable handle.
    pub component: AppComponent,
    /// Provenance of the load.
    pub source: AppSource,
}

impl LoadedApplication {
    /// Identifier of the loaded app.
    pub fn identifier(&self) -> &ApplicationId {
        &self.manifest.identifier
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn application_id_accepts_simple_and_dotted_names() {
        assert!(ApplicationId::new("finder").is_ok());
        assert!(ApplicationId::new("com.example.weather").is_ok());
        assert!(ApplicationId::new("app-store").is_ok());
        assert!(ApplicationId::new("").is_err());
        assert!(ApplicationId::new("Finder").is_err());
        assert!(ApplicationId::new("system..calc").is_err());
        assert!(ApplicationId::new("trailing-").is_err());
    }

    #[test]
    fn registry_entry_reads_camel_case_wire_shape() {
        let raw = json!({
            "name": "Weather",
            "version": "1.2.0",
            "bundleURL": "https://cdn.example/org/weather@1.2.0/dist/index.js",
            "manifest": {
                "identifier": "weather",
                "name": "Weather",
                "version": "1.2.0",
                "category": "utilities",
                "permissions": ["network", "teleport"],
                "windowConfig": { "defaultSize": { "width": 400, "height": 300 }, "multiInstance": true }
            }
        });

        let entry: RegistryEntry = serde_json::from_value(raw).expect("decode entry");
        assert_eq!(entry.manifest.category, AppCategory::Utilities);
        assert!(entry.manifest.permissions.contains(&AppPermission::Network));
        assert!(entry.manifest.permissions.contains(&AppPermission::Unknown));
        let window = entry.manifest.window_config.expect("window config");
        assert!(window.resizable);
        assert!(window.multi_instance);
        assert_eq!(
            window.default_size,
            Some(WindowSize {
                width: 400,
                height: 300
            })
        );
    }

    #[test]
    fn unknown_category_decodes_as_other() {
        let category: AppCategory = serde_json::from_value(json!("astrology")).expect("category");
        assert_eq!(category, AppCategory::Other);
        assert_eq!(AppCategory::Finance.token(), "finance");
    }

    #[test]
    fn foreign_component_downcasts_to_its_own_type_only() {
        let component = AppComponent::foreign(42_u32);
        assert_eq!(component.downcast_foreign::<u32>(), Some(&42));
        assert!(component.downcast_foreign::<String>().is_none());
        assert!(component.native().is_none());
    }
}
