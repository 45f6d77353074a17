//! Installed applications: persisted records for builtin and user-installed apps, with change
//! notifications for other parts of the shell.

use std::{cell::RefCell, cmp::Ordering, collections::BTreeMap, rc::Rc};

use desktop_app_contract::{AppManifest, AppRegistry, AppSource, ApplicationId, RegistryEntry};
use leptos::logging::warn;
use platform_host::{Clock, KeyValueStore};
use serde::{Deserialize, Serialize};

use crate::{
    error::PersistenceError,
    observers::{Observers, SubscriptionHandle},
    persistence::{load_persisted, persist_or_warn},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One installed application.
pub struct InstalledApp {
    /// App identifier.
    pub identifier: ApplicationId,
    /// Installed version.
    pub version: String,
    /// Builtin or registry-installed.
    pub source: AppSource,
    /// Manifest at install time.
    pub manifest: AppManifest,
    /// Bundle the app was installed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_url: Option<String>,
    /// Install or last update time, unix milliseconds.
    pub installed_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Change notification emitted after every mutation.
pub enum InstalledAppEvent {
    /// A new app was installed.
    Installed(InstalledApp),
    /// An installed app moved to a new version.
    Updated {
        /// Version before the update.
        previous_version: String,
        /// Record after the update.
        app: InstalledApp,
    },
    /// An app was removed.
    Uninstalled(ApplicationId),
}

/// Persisted installed-apps records.
pub struct InstalledAppsStore {
    apps: RefCell<BTreeMap<ApplicationId, InstalledApp>>,
    store: Rc<dyn KeyValueStore>,
    key: String,
    clock: Rc<dyn Clock>,
    observers: Observers<InstalledAppEvent>,
    last_recovery: RefCell<Option<PersistenceError>>,
}

impl InstalledAppsStore {
    /// Loads records from `store[key]` and refreshes every builtin from `builtins`.
    ///
    /// Corrupt state is logged and replaced by the builtins alone.
    pub fn load(
        store: Rc<dyn KeyValueStore>,
        key: impl Into<String>,
        builtins: Vec<AppManifest>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let key = key.into();
        let (persisted, recovery) =
            match load_persisted::<Vec<InstalledApp>>(store.as_ref(), &key) {
                Ok(persisted) => (persisted.unwrap_or_default(), None),
                Err(err) => {
                    warn!("installed apps load failed, keeping builtins only: {err}");
                    (Vec::new(), Some(err))
                }
            };

        let mut apps: BTreeMap<ApplicationId, InstalledApp> = persisted
            .into_iter()
            .filter(|app| app.source != AppSource::Builtin)
            .map(|app| (app.identifier.clone(), app))
            .collect();
        for manifest in builtins {
            apps.insert(
                manifest.identifier.clone(),
                InstalledApp {
                    identifier: manifest.identifier.clone(),
                    version: manifest.version.clone(),
                    source: AppSource::Builtin,
                    manifest,
                    bundle_url: None,
                    installed_at_ms: 0,
                },
            );
        }

        let installed = Self {
            apps: RefCell::new(apps),
            store,
            key,
            clock,
            observers: Observers::default(),
            last_recovery: RefCell::new(recovery),
        };
        installed.persist();
        installed
    }

    /// Installs a registry entry. No-op when the app is already installed.
    pub fn install(&self, entry: &RegistryEntry) -> bool {
        let identifier = entry.manifest.identifier.clone();
        if self.is_installed(&identifier) {
            return false;
        }
        let app = InstalledApp {
            identifier: identifier.clone(),
            version: entry.version.clone(),
            source: AppSource::Registry,
            manifest: entry.manifest.clone(),
            bundle_url: Some(entry.bundle_url.clone()),
            installed_at_ms: self.clock.now_ms(),
        };
        self.apps.borrow_mut().insert(identifier, app.clone());
        self.persist();
        self.observers.emit(&InstalledAppEvent::Installed(app));
        true
    }

    /// Moves an installed registry app to `entry`'s version.
    ///
    /// No-op for builtins, apps that are not installed, and same-version entries.
    pub fn update(&self, entry: &RegistryEntry) -> bool {
        let identifier = &entry.manifest.identifier;
        let (previous_version, app) = {
            let mut apps = self.apps.borrow_mut();
            let Some(app) = apps.get_mut(identifier) else {
                return false;
            };
            if app.source == AppSource::Builtin || app.version == entry.version {
                return false;
            }
            let previous_version = std::mem::replace(&mut app.version, entry.version.clone());
            app.manifest = entry.manifest.clone();
            app.bundle_url = Some(entry.bundle_url.clone());
            app.installed_at_ms = self.clock.now_ms();
            (previous_version, app.clone())
        };
        self.persist();
        self.observers.emit(&InstalledAppEvent::Updated {
            previous_version,
            app,
        });
        true
    }

    /// Removes an installed app. Builtins cannot be uninstalled.
    pub fn uninstall(&self, identifier: &ApplicationId) -> bool {
        {
            let mut apps = self.apps.borrow_mut();
            match apps.get(identifier) {
                Some(app) if app.source != AppSource::Builtin => {
                    apps.remove(identifier);
                }
                _ => return false,
            }
        }
        self.persist();
        self.observers
            .emit(&InstalledAppEvent::Uninstalled(identifier.clone()));
        true
    }

    /// Every installed app, ordered by identifier.
    pub fn installed(&self) -> Vec<InstalledApp> {
        self.apps.borrow().values().cloned().collect()
    }

    /// Looks up one installed app.
    pub fn installed_app(&self, identifier: &ApplicationId) -> Option<InstalledApp> {
        self.apps.borrow().get(identifier).cloned()
    }

    /// Returns whether `identifier` is installed.
    pub fn is_installed(&self, identifier: &ApplicationId) -> bool {
        self.apps.borrow().contains_key(identifier)
    }

    /// Registry entries newer than the installed registry apps they match.
    pub fn updates_available(&self, registry: &AppRegistry) -> Vec<RegistryEntry> {
        self.apps
            .borrow()
            .values()
            .filter(|app| app.source != AppSource::Builtin)
            .filter_map(|app| {
                registry.entry(app.identifier.as_str()).filter(|entry| {
                    compare_versions(&entry.version, &app.version) == Ordering::Greater
                })
            })
            .cloned()
            .collect()
    }

    /// Calls `listener` after every install, update and uninstall.
    pub fn subscribe(
        &self,
        listener: impl Fn(&InstalledAppEvent) + 'static,
    ) -> SubscriptionHandle {
        self.observers.subscribe(listener)
    }

    /// Most recent load or write failure recovered by this store.
    pub fn last_recovery(&self) -> Option<PersistenceError> {
        self.last_recovery.borrow().clone()
    }

    fn persist(&self) {
        let records: Vec<InstalledApp> = self.installed();
        if let Some(err) = persist_or_warn(self.store.as_ref(), &self.key, &records, "installed apps")
        {
            *self.last_recovery.borrow_mut() = Some(err);
        }
    }
}

/// Compares dotted numeric versions. A leading `v` is ignored, missing segments count as zero, and
/// a pre-release (`1.0.0-beta`) sorts before its release.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let split = |raw: &str| -> (Vec<u64>, Option<String>) {
        let raw = raw.trim().trim_start_matches('v');
        let (core, pre) = match raw.split_once('-') {
            Some((core, pre)) => (core, Some(pre.to_string())),
            None => (raw, None),
        };
        let core = core
            .split('.')
            .map(|part| {
                let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
                digits.parse().unwrap_or(0)
            })
            .collect();
        (core, pre)
    };

    let (left_core, left_pre) = split(left);
    let (right_core, right_pre) = split(right);
    let len = left_core.len().max(right_core.len());
    for index in 0..len {
        let l = left_core.get(index).copied().unwrap_or(0);
        let r = right_core.get(index).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    match (left_pre, right_pre) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(l), Some(r)) => l.cmp(&r),
    }
}
