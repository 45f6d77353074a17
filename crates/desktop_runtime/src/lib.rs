//! Desktop session runtime: app registry resolution, module loading, and the live session state
//! (window stack, dock, Quick Look) with its persistence.
//!
//! Construct a [`DesktopSession`] at the shell's composition root and hand its components to the
//! views that need them. Host services come in through [`SessionHost`].

pub mod builtin;
pub mod catalog;
pub mod config;
pub mod dock;
pub mod error;
pub mod installed;
pub mod loader;
mod observers;
pub mod persistence;
pub mod quick_look;
pub mod registry;
pub mod session;
pub mod window_stack;

pub use catalog::{AppCatalog, CatalogFilter, RegistrySnapshot};
pub use config::{
    BundleConfig, CatalogConfig, ConfigError, DockConfig, PlatformModifier, QuickLookConfig,
    RegistryConfig, RuntimeConfig, StorageKeys, WindowStackConfig, FINDER_ID,
};
pub use dock::{DockItem, DockStore};
pub use error::{PersistenceError, RuntimeError};
pub use installed::{compare_versions, InstalledApp, InstalledAppEvent, InstalledAppsStore};
pub use loader::{BundleLocation, BundleResolver, CdnBundleResolver, LoadOutcome, ModuleLoader};
pub use observers::SubscriptionHandle;
pub use quick_look::{
    file_type, Dimensions, FileType, QuickLookFile, QuickLookNavigator, QuickLookState,
};
pub use registry::RegistryClient;
pub use session::{DesktopSession, SessionHost};
pub use window_stack::{WindowStack, WindowStackEntry, WindowStackSnapshot};
