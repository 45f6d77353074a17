//! Background task spawning for work that must outlive the future that started it.
//!
//! Hosts expose a [`futures::task::LocalSpawn`] executor. Tests pass a `LocalPool` spawner.

use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};

#[derive(Debug, Clone, Copy, Default)]
/// Spawner for hosts without a local executor; every spawn is refused.
///
/// Callers keep driving their own futures, so work only progresses while someone awaits it.
pub struct NoopSpawner;

impl LocalSpawn for NoopSpawner {
    fn spawn_local_obj(&self, _future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        Err(SpawnError::shutdown())
    }

    fn status_local(&self) -> Result<(), SpawnError> {
        Err(SpawnError::shutdown())
    }
}

#[cfg(test)]
mod tests {
    use futures::task::LocalSpawnExt;

    use super::*;

    #[test]
    fn noop_spawner_refuses_work() {
        assert!(NoopSpawner.spawn_local(async {}).is_err());
        assert!(NoopSpawner.status_local().is_err());
    }
}
