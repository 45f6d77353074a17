//! Local task spawning on the browser event loop.

use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};

#[derive(Debug, Clone, Copy, Default)]
/// Spawner that queues futures on the page's microtask loop via `wasm_bindgen_futures`.
pub struct WebSpawner;

impl LocalSpawn for WebSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(future);
            Ok(())
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = future;
            Err(SpawnError::shutdown())
        }
    }

    fn status_local(&self) -> Result<(), SpawnError> {
        if cfg!(target_arch = "wasm32") {
            Ok(())
        } else {
            Err(SpawnError::shutdown())
        }
    }
}
