//! Decoding for the rate-limited fallback listing: source pages, base64 configuration files, and
//! the shell namespace embedded in each package descriptor.

use std::collections::BTreeSet;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use desktop_app_contract::{
    AppCategory, AppManifest, AppPermission, ApplicationId, RegistryEntry, WindowConfig,
    WindowSize,
};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::BundleConfig;

#[derive(Debug, Deserialize)]
/// One source in a listing page.
pub(super) struct ListedSource {
    pub name: String,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Deserialize)]
struct ContentFile {
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PersonField {
    Name(String),
    Object { name: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LinkField {
    Url(String),
    Object { url: String },
}

#[derive(Debug, Deserialize)]
struct PackageDescriptor {
    name: Option<String>,
    version: Option<String>,
    description: Option<String>,
    author: Option<PersonField>,
    repository: Option<LinkField>,
    homepage: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShellNamespace {
    identifier: Option<String>,
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    category: AppCategory,
    icon: Option<String>,
    #[serde(default)]
    permissions: BTreeSet<AppPermission>,
    window: Option<WindowSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WindowSection {
    width: Option<u32>,
    height: Option<u32>,
    min_width: Option<u32>,
    min_height: Option<u32>,
    max_width: Option<u32>,
    max_height: Option<u32>,
    resizable: Option<bool>,
    multi_instance: Option<bool>,
}

impl WindowSection {
    fn into_config(self) -> WindowConfig {
        let size = |width: Option<u32>, height: Option<u32>| {
            width
                .zip(height)
                .map(|(width, height)| WindowSize { width, height })
        };
        WindowConfig {
            default_size: size(self.width, self.height),
            min_size: size(self.min_width, self.min_height),
            max_size: size(self.max_width, self.max_height),
            resizable: self.resizable.unwrap_or(true),
            multi_instance: self.multi_instance.unwrap_or(false),
        }
    }
}

/// Appends `per_page`/`page` query parameters to the listing URL.
pub(super) fn listing_page_url(base: &str, per_page: u32, page: u32) -> Result<String, String> {
    let mut url = Url::parse(base).map_err(|err| format!("invalid listing url `{base}`: {err}"))?;
    url.query_pairs_mut()
        .append_pair("per_page", &per_page.to_string())
        .append_pair("page", &page.to_string());
    Ok(url.into())
}

/// Substitutes `{org}` and `{repo}` in the configuration file URL template.
pub(super) fn config_file_url(template: &str, org: &str, repo: &str) -> String {
    template.replace("{org}", org).replace("{repo}", repo)
}

/// Decodes a contents-API response into the package descriptor JSON.
pub(super) fn decode_config_file(body: &str) -> Result<Value, String> {
    let file: ContentFile =
        serde_json::from_str(body).map_err(|err| format!("contents response invalid: {err}"))?;
    if let Some(encoding) = file.encoding.as_deref() {
        if !encoding.eq_ignore_ascii_case("base64") {
            return Err(format!("unsupported content encoding `{encoding}`"));
        }
    }

    // The contents API wraps base64 at 60 columns.
    let compact: String = file
        .content
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|err| format!("base64 decode failed: {err}"))?;
    let text = String::from_utf8(bytes).map_err(|err| format!("descriptor is not utf-8: {err}"))?;
    serde_json::from_str(&text).map_err(|err| format!("descriptor is not json: {err}"))
}

/// Derives a registry entry from a package descriptor's shell namespace.
pub(super) fn entry_from_descriptor(
    descriptor: Value,
    manifest_field: &str,
    org: &str,
    repo: &str,
    bundles: &BundleConfig,
) -> Result<RegistryEntry, String> {
    let namespace_value = descriptor
        .get(manifest_field)
        .cloned()
        .ok_or_else(|| format!("descriptor has no `{manifest_field}` field"))?;
    let namespace: ShellNamespace = serde_json::from_value(namespace_value)
        .map_err(|err| format!("`{manifest_field}` is invalid: {err}"))?;
    let package: PackageDescriptor = serde_json::from_value(descriptor)
        .map_err(|err| format!("descriptor is invalid: {err}"))?;

    let raw_id = namespace
        .identifier
        .or(namespace.id)
        .ok_or_else(|| format!("`{manifest_field}` declares no identifier"))?;
    let identifier = ApplicationId::new(raw_id)?;
    let version = package
        .version
        .filter(|version| !version.trim().is_empty())
        .ok_or_else(|| "descriptor declares no version".to_string())?;
    let name = namespace
        .name
        .or(package.name)
        .unwrap_or_else(|| repo.to_string());

    let mut manifest = AppManifest::new(identifier, name.clone(), version.clone());
    manifest.description = namespace.description.or(package.description);
    manifest.author = package.author.map(|author| match author {
        PersonField::Name(name) | PersonField::Object { name } => name,
    });
    manifest.category = namespace.category;
    manifest.icon = namespace.icon;
    manifest.permissions = namespace.permissions;
    manifest.repository = package.repository.map(|link| match link {
        LinkField::Url(url) | LinkField::Object { url } => url,
    });
    manifest.homepage = package.homepage;
    manifest.window_config = namespace.window.map(WindowSection::into_config);

    Ok(RegistryEntry {
        name,
        bundle_url: bundles.bundle_url(org, repo, &version),
        version,
        integrity: None,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn wrapped_base64(text: &str) -> String {
        let encoded = STANDARD.encode(text);
        encoded
            .as_bytes()
            .chunks(60)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn listing_url_appends_pagination() {
        assert_eq!(
            listing_page_url("https://api.test/orgs/acme/repos", 50, 3).expect("url"),
            "https://api.test/orgs/acme/repos?per_page=50&page=3"
        );
        assert!(listing_page_url("not a url", 1, 1).is_err());
    }

    #[test]
    fn config_file_decodes_wrapped_base64() {
        let descriptor = json!({
            "name": "weather-app",
            "version": "2.1.0",
            "desktopApp": { "id": "com.acme.weather" }
        })
        .to_string();
        let body = json!({ "content": wrapped_base64(&descriptor), "encoding": "base64" }).to_string();

        let decoded = decode_config_file(&body).expect("decode");
        assert_eq!(decoded["version"], "2.1.0");
        assert_eq!(decoded["desktopApp"]["id"], "com.acme.weather");
    }

    #[test]
    fn config_file_rejects_foreign_encoding_and_garbage() {
        let body = json!({ "content": "{}", "encoding": "utf-8" }).to_string();
        assert!(decode_config_file(&body).is_err());
        let body = json!({ "content": "@@@" }).to_string();
        assert!(decode_config_file(&body).is_err());
    }

    #[test]
    fn descriptor_maps_namespace_into_manifest_and_bundle_url() {
        let descriptor = json!({
            "name": "weather-app",
            "version": "2.1.0",
            "description": "package description",
            "author": { "name": "Acme" },
            "repository": { "type": "git", "url": "https://github.com/acme/weather" },
            "desktopApp": {
                "identifier": "com.acme.weather",
                "name": "Weather",
                "category": "utilities",
                "permissions": ["network", "teleport"],
                "window": { "width": 400, "height": 300, "resizable": false }
            }
        });

        let entry = entry_from_descriptor(
            descriptor,
            "desktopApp",
            "acme",
            "weather",
            &BundleConfig::default(),
        )
        .expect("entry");

        assert_eq!(
            entry.bundle_url,
            "https://cdn.jsdelivr.net/gh/acme/weather@2.1.0/dist/index.js"
        );
        assert_eq!(entry.name, "Weather");
        assert_eq!(entry.manifest.identifier.as_str(), "com.acme.weather");
        assert_eq!(entry.manifest.description.as_deref(), Some("package description"));
        assert_eq!(entry.manifest.author.as_deref(), Some("Acme"));
        assert_eq!(entry.manifest.category, AppCategory::Utilities);
        assert!(entry.manifest.permissions.contains(&AppPermission::Unknown));
        let window = entry.manifest.window_config.expect("window config");
        assert_eq!(window.default_size, Some(WindowSize { width: 400, height: 300 }));
        assert!(!window.resizable);
    }

    #[test]
    fn descriptor_without_namespace_or_identifier_is_rejected() {
        let bundles = BundleConfig::default();
        let missing = json!({ "name": "x", "version": "1.0.0" });
        assert!(entry_from_descriptor(missing, "desktopApp", "o", "r", &bundles).is_err());

        let anonymous = json!({ "version": "1.0.0", "desktopApp": { "name": "X" } });
        assert!(entry_from_descriptor(anonymous, "desktopApp", "o", "r", &bundles).is_err());

        let unversioned = json!({ "desktopApp": { "id": "x" } });
        assert!(entry_from_descriptor(unversioned, "desktopApp", "o", "r", &bundles).is_err());
    }
}
