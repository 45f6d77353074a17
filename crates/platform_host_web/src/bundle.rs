//! Dynamic `import()` bridge for remote application bundles.
//!
//! The imported module's `default` export is handed to the shell untouched, wrapped as an
//! [`AppComponent::Foreign`](desktop_app_contract::AppComponent::Foreign) holding the `JsValue`.

use desktop_app_contract::ImportedBundle;
use platform_host::{BundleFuture, BundleImporter};

#[cfg(target_arch = "wasm32")]
mod imp {
    use desktop_app_contract::{AppComponent, ImportedBundle};
    use js_sys::{Promise, Reflect};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;

    #[wasm_bindgen(inline_js = r#"
export function jsImportBundle(url) {
  return import(/* webpackIgnore: true */ url);
}
"#)]
    extern "C" {
        #[wasm_bindgen(js_name = jsImportBundle)]
        fn js_import_bundle(url: &str) -> Promise;
    }

    fn js_error_to_string(err: JsValue) -> String {
        if let Some(text) = err.as_string() {
            return text;
        }
        if let Ok(message) = Reflect::get(&err, &JsValue::from_str("message")) {
            if let Some(text) = message.as_string() {
                return text;
            }
        }
        format!("{err:?}")
    }

    pub async fn import_bundle(url: &str) -> Result<ImportedBundle, String> {
        let module = JsFuture::from(js_import_bundle(url))
            .await
            .map_err(js_error_to_string)?;
        let default_export =
            Reflect::get(&module, &JsValue::from_str("default")).map_err(js_error_to_string)?;
        if default_export.is_function() || default_export.is_object() {
            Ok(ImportedBundle::with_default(AppComponent::foreign(
                default_export,
            )))
        } else {
            Ok(ImportedBundle::without_default())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use desktop_app_contract::ImportedBundle;

    pub async fn import_bundle(url: &str) -> Result<ImportedBundle, String> {
        Err(format!(
            "dynamic import is only available when compiled for wasm32: {url}"
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Browser bundle importer backed by dynamic `import()`.
pub struct WebBundleImporter;

impl BundleImporter for WebBundleImporter {
    fn import<'a>(&'a self, url: &'a str) -> BundleFuture<'a, Result<ImportedBundle, String>> {
        Box::pin(imp::import_bundle(url))
    }
}
