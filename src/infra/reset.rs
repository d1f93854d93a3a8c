//! Store reset backed by the deployment's init script.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use crate::application::reset::{StoreReset, StoreResetError};

pub struct ScriptStoreReset {
    script: PathBuf,
}

impl ScriptStoreReset {
    pub fn new(script: PathBuf) -> Self {
        Self { script }
    }
}

#[async_trait]
impl StoreReset for ScriptStoreReset {
    async fn reset(&self) -> Result<(), StoreResetError> {
        let output = Command::new(&self.script)
            .output()
            .await
            .map_err(|source| StoreResetError::Spawn {
                script: self.script.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            warn!(
                target = "isupipe::reset",
                script = %self.script.display(),
                status = %output.status,
                output = %combined,
                "init script failed"
            );
            return Err(StoreResetError::Failed {
                status: output.status.to_string(),
                output: combined,
            });
        }

        info!(
            target = "isupipe::reset",
            script = %self.script.display(),
            "store reset to initial state"
        );
        Ok(())
    }
}
