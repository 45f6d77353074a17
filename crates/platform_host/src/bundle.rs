//! Dynamic code-bundle import contracts and an in-memory adapter for tests.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use desktop_app_contract::ImportedBundle;
use futures::{
    channel::oneshot,
    future::{FutureExt, Shared},
};

/// Object-safe boxed future used by [`BundleImporter`].
pub type BundleFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service that imports a code bundle from a URL.
///
/// The web host performs a dynamic `import()`; other hosts may link a plugin or spawn a process.
pub trait BundleImporter {
    /// Imports the bundle at `url`.
    fn import<'a>(&'a self, url: &'a str) -> BundleFuture<'a, Result<ImportedBundle, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Importer for targets without dynamic loading; every import fails.
pub struct NoopBundleImporter;

impl BundleImporter for NoopBundleImporter {
    fn import<'a>(&'a self, url: &'a str) -> BundleFuture<'a, Result<ImportedBundle, String>> {
        Box::pin(async move { Err(format!("dynamic import unsupported on this host: {url}")) })
    }
}

type Gate = Shared<oneshot::Receiver<()>>;

#[derive(Clone, Default)]
/// In-memory importer serving registered bundles by exact URL and counting import attempts.
///
/// [`MemoryBundleImporter::hold`] parks every subsequent import until
/// [`MemoryBundleImporter::release`] so tests can observe overlapping loads.
pub struct MemoryBundleImporter {
    modules: Rc<RefCell<HashMap<String, Result<ImportedBundle, String>>>>,
    imports: Rc<RefCell<Vec<String>>>,
    gate: Rc<RefCell<Option<Gate>>>,
    release: Rc<RefCell<Option<oneshot::Sender<()>>>>,
}

impl MemoryBundleImporter {
    /// Serves `bundle` for `url`.
    pub fn provide(&self, url: impl Into<String>, bundle: ImportedBundle) {
        self.modules.borrow_mut().insert(url.into(), Ok(bundle));
    }

    /// Fails imports of `url` with `error`.
    pub fn fail(&self, url: impl Into<String>, error: impl Into<String>) {
        self.modules
            .borrow_mut()
            .insert(url.into(), Err(error.into()));
    }

    /// Parks imports until [`MemoryBundleImporter::release`] is called.
    pub fn hold(&self) {
        let (sender, receiver) = oneshot::channel();
        *self.gate.borrow_mut() = Some(receiver.shared());
        *self.release.borrow_mut() = Some(sender);
    }

    /// Resumes every parked import.
    pub fn release(&self) {
        self.gate.borrow_mut().take();
        if let Some(sender) = self.release.borrow_mut().take() {
            let _ = sender.send(());
        }
    }

    /// URLs imported so far, in order.
    pub fn imports(&self) -> Vec<String> {
        self.imports.borrow().clone()
    }

    /// Total number of import attempts.
    pub fn import_count(&self) -> usize {
        self.imports.borrow().len()
    }
}

impl BundleImporter for MemoryBundleImporter {
    fn import<'a>(&'a self, url: &'a str) -> BundleFuture<'a, Result<ImportedBundle, String>> {
        self.imports.borrow_mut().push(url.to_string());
        let gate = self.gate.borrow().clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.modules
                .borrow()
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(format!("failed to fetch dynamically imported module: {url}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use desktop_app_contract::AppComponent;
    use futures::{executor::LocalPool, task::LocalSpawnExt};

    use super::*;

    #[test]
    fn memory_importer_serves_registered_bundles() {
        let importer = MemoryBundleImporter::default();
        importer.provide(
            "https://cdn.test/a.js",
            ImportedBundle::with_default(AppComponent::foreign("a")),
        );

        let loaded = futures::executor::block_on(importer.import("https://cdn.test/a.js"))
            .expect("import");
        assert!(loaded.default_export.is_some());
        assert!(futures::executor::block_on(importer.import("https://cdn.test/b.js")).is_err());
        assert_eq!(importer.import_count(), 2);
    }

    #[test]
    fn held_imports_complete_after_release() {
        let importer = MemoryBundleImporter::default();
        importer.provide("u", ImportedBundle::without_default());
        importer.hold();

        let done = Rc::new(RefCell::new(false));
        let mut pool = LocalPool::new();
        {
            let importer = importer.clone();
            let done = done.clone();
            pool.spawner()
                .spawn_local(async move {
                    let _ = importer.import("u").await;
                    *done.borrow_mut() = true;
                })
                .expect("spawn");
        }

        pool.run_until_stalled();
        assert!(!*done.borrow());
        importer.release();
        pool.run_until_stalled();
        assert!(*done.borrow());
    }
}
