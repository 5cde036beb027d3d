//! Process-scoped environment registry
//!
//! Keyed store of live [`Environment`] instances, guaranteeing at most one
//! per identifier even under concurrent first access. Constructed once by
//! the host and passed by handle; there is no package-level singleton, so
//! tests get isolated registries for free.
//!
//! # Fast path / slow path
//!
//! Lookups of already-created environments are plain `DashMap` reads and
//! never touch the creation lock. Only a miss takes the single
//! process-wide creation lock, looks up again to resolve the race where
//! two callers both missed, and runs the factory on a confirmed miss.
//! `DashMap` guarantees reads stay safe while another thread inserts,
//! which is what makes the lock-free fast path sound.

use crate::environment::Environment;
use dashmap::DashMap;
use parking_lot::Mutex;
use sqlenv_core::{EnvId, Result, MAX_ENVIRONMENTS};
use std::sync::Arc;
use tracing::{error, info};

/// Registry of live environments, keyed by [`EnvId`]
pub struct EnvRegistry {
    envs: DashMap<EnvId, Arc<Environment>>,
    create_lock: Mutex<()>,
}

impl EnvRegistry {
    /// Create an empty registry
    pub fn new() -> EnvRegistry {
        EnvRegistry {
            envs: DashMap::with_capacity(MAX_ENVIRONMENTS),
            create_lock: Mutex::new(()),
        }
    }

    /// Return the unique live environment for `id`, creating it on first
    /// access
    ///
    /// The factory runs at most once per identifier among all concurrent
    /// callers; every caller observes the same instance. A factory error
    /// is returned as-is and nothing is cached, so a later call retries.
    pub fn get_or_create<F>(&self, id: EnvId, factory: F) -> Result<Arc<Environment>>
    where
        F: FnOnce(EnvId) -> Result<Arc<Environment>>,
    {
        if let Some(env) = self.envs.get(&id) {
            return Ok(Arc::clone(env.value()));
        }

        let _guard = self.create_lock.lock();
        if let Some(env) = self.envs.get(&id) {
            return Ok(Arc::clone(env.value()));
        }

        info!(env = %id, "creating environment");
        let env = factory(id)?;
        self.envs.insert(id, Arc::clone(&env));
        Ok(env)
    }

    /// Evict `id` so a later [`EnvRegistry::get_or_create`] re-runs the
    /// factory; returns the evicted environment if it was present
    pub fn remove(&self, id: EnvId) -> Option<Arc<Environment>> {
        self.envs.remove(&id).map(|(_, env)| env)
    }

    /// Close and evict one environment; returns whether it was present
    ///
    /// A close failure is logged, not propagated: the entry is evicted
    /// either way.
    pub fn close_env(&self, id: EnvId) -> bool {
        match self.remove(id) {
            Some(env) => {
                if let Err(e) = env.close() {
                    error!(env = %id, error = %e, "error while closing environment");
                }
                true
            }
            None => false,
        }
    }

    /// Close every registered environment
    ///
    /// Snapshots the current entries first, then closes each one.
    /// Individual close failures are logged and do not block closing the
    /// rest; nothing is returned.
    pub fn close_all(&self) {
        let to_close: Vec<Arc<Environment>> =
            self.envs.iter().map(|e| Arc::clone(e.value())).collect();
        info!(count = to_close.len(), "closing all environments");
        for env in to_close {
            if let Err(e) = env.close() {
                error!(env = %env.id(), error = %e, "error while closing environment");
            }
        }
        self.envs.clear();
    }

    /// Check whether an environment is registered under `id`
    pub fn contains(&self, id: EnvId) -> bool {
        self.envs.contains_key(&id)
    }

    /// Number of registered environments
    pub fn len(&self) -> usize {
        self.envs.len()
    }

    /// Check if no environments are registered
    pub fn is_empty(&self) -> bool {
        self.envs.is_empty()
    }
}

impl Default for EnvRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EnvRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvRegistry")
            .field("environments", &self.len())
            .finish()
    }
}
