use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const REQUIRED_APP: &str = "finder";

#[derive(Debug, Deserialize)]
struct BuiltinCatalog {
    schema_version: u32,
    apps: Vec<BuiltinApp>,
}

#[derive(Debug, Deserialize)]
struct BuiltinApp {
    identifier: String,
    name: String,
    version: String,
    category: String,
    icon: Option<String>,
    #[serde(default)]
    permissions: Vec<String>,
    window: Option<BuiltinWindow>,
}

#[derive(Debug, Deserialize)]
struct BuiltinWindow {
    width: u32,
    height: u32,
    min_width: Option<u32>,
    min_height: Option<u32>,
    #[serde(default = "default_true")]
    resizable: bool,
    #[serde(default)]
    multi_instance: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestJson {
    identifier: String,
    name: String,
    version: String,
    category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    permissions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    window_config: Option<WindowConfigJson>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WindowConfigJson {
    default_size: SizeJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_size: Option<SizeJson>,
    resizable: bool,
    multi_instance: bool,
}

#[derive(Debug, Serialize)]
struct SizeJson {
    width: u32,
    height: u32,
}

fn main() {
    let crate_root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let path = crate_root.join("builtin_apps.toml");
    println!("cargo:rerun-if-changed={}", path.display());

    let raw = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
    let catalog: BuiltinCatalog = toml::from_str(&raw)
        .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()));
    if catalog.schema_version != 1 {
        panic!(
            "builtin catalog schema mismatch in {}: expected 1 found {}",
            path.display(),
            catalog.schema_version
        );
    }

    let mut seen = BTreeSet::new();
    for app in &catalog.apps {
        if !seen.insert(app.identifier.clone()) {
            panic!("duplicate builtin app `{}`", app.identifier);
        }
        if app.version.split('.').any(|part| part.parse::<u64>().is_err()) {
            panic!(
                "builtin app `{}` has non-numeric version `{}`",
                app.identifier, app.version
            );
        }
    }
    if !seen.contains(REQUIRED_APP) {
        panic!("builtin catalog must declare `{REQUIRED_APP}`");
    }

    let manifests: Vec<ManifestJson> = catalog
        .apps
        .into_iter()
        .map(|app| ManifestJson {
            identifier: app.identifier,
            name: app.name,
            version: app.version,
            category: app.category,
            icon: app.icon,
            permissions: app.permissions,
            window_config: app.window.map(|window| WindowConfigJson {
                default_size: SizeJson {
                    width: window.width,
                    height: window.height,
                },
                min_size: window
                    .min_width
                    .zip(window.min_height)
                    .map(|(width, height)| SizeJson { width, height }),
                resizable: window.resizable,
                multi_instance: window.multi_instance,
            }),
        })
        .collect();

    let json = serde_json::to_string_pretty(&manifests).expect("serialize builtin app catalog");
    let generated = format!(
        "/// Build-time generated builtin app manifest catalog JSON.\n\
pub const BUILTIN_APP_CATALOG_JSON: &str = r##\"{}\"##;\n",
        json
    );

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR"));
    let out_file = out_dir.join("builtin_catalog_generated.rs");
    fs::write(&out_file, generated)
        .unwrap_or_else(|err| panic!("failed to write {}: {err}", out_file.display()));
}
