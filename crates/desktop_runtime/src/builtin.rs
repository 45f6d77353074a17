//! Applications compiled into the shell.

use desktop_app_contract::AppManifest;

include!(concat!(env!("OUT_DIR"), "/builtin_catalog_generated.rs"));

/// Returns the builtin app manifests declared in `builtin_apps.toml`.
///
/// The catalog is validated at build time; a decode failure here is logged and yields no apps.
pub fn builtin_manifests() -> Vec<AppManifest> {
    match serde_json::from_str(BUILTIN_APP_CATALOG_JSON) {
        Ok(manifests) => manifests,
        Err(err) => {
            leptos::logging::warn!("builtin app catalog decode failed: {err}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use desktop_app_contract::AppCategory;

    use super::*;
    use crate::config::FINDER_ID;

    #[test]
    fn generated_catalog_decodes_and_includes_finder() {
        let manifests = builtin_manifests();
        let finder = manifests
            .iter()
            .find(|manifest| manifest.identifier.as_str() == FINDER_ID)
            .expect("finder builtin");
        assert_eq!(finder.category, AppCategory::System);
        assert!(finder.window_config.is_some());
    }

    #[test]
    fn builtin_ids_are_valid_application_ids() {
        for manifest in builtin_manifests() {
            assert!(
                desktop_app_contract::ApplicationId::new(manifest.identifier.as_str()).is_ok(),
                "invalid builtin id {}",
                manifest.identifier
            );
        }
    }
}
