//! Operator-facing reinitialize: reset the store, then reload every cache.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::cache::{CacheLoadError, CacheLoader, LoadReport};

#[derive(Debug, Error)]
pub enum StoreResetError {
    #[error("failed to launch reset script `{script}`: {source}")]
    Spawn {
        script: String,
        #[source]
        source: std::io::Error,
    },
    #[error("reset script exited with {status}: {output}")]
    Failed { status: String, output: String },
}

/// Puts the relational store back into its known initial state.
#[async_trait]
pub trait StoreReset: Send + Sync {
    async fn reset(&self) -> Result<(), StoreResetError>;
}

#[derive(Debug, Error)]
pub enum ResetError {
    #[error("store reset failed: {0}")]
    Store(#[from] StoreResetError),
    #[error(transparent)]
    Load(#[from] CacheLoadError),
}

/// Runs the reinitialize sequence. The call returns only once the reload has
/// finished, and concurrent callers are serialized so two passes never
/// interleave on the same caches.
pub struct ResetService {
    store: Arc<dyn StoreReset>,
    loader: Arc<CacheLoader>,
    running: Mutex<()>,
}

impl ResetService {
    pub fn new(store: Arc<dyn StoreReset>, loader: Arc<CacheLoader>) -> Self {
        Self {
            store,
            loader,
            running: Mutex::new(()),
        }
    }

    #[instrument(skip(self))]
    pub async fn reinitialize(&self) -> Result<LoadReport, ResetError> {
        let _running = self.running.lock().await;

        if let Err(err) = self.store.reset().await {
            warn!(
                target = "isupipe::reset",
                error = %err,
                "Store reset failed; caches left untouched"
            );
            return Err(err.into());
        }

        let report = self.loader.load_all().await?;
        info!(
            target = "isupipe::reset",
            generation = report.generation,
            "Reinitialize complete"
        );
        Ok(report)
    }

    /// Reload caches without touching the store, as done once at startup.
    pub async fn reload(&self) -> Result<LoadReport, CacheLoadError> {
        let _running = self.running.lock().await;
        self.loader.load_all().await
    }
}
