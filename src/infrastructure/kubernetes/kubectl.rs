// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::config::KubectlConf;
use crate::shared::error::{DeployError, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

/// Checks a manifest file written to disk.
#[async_trait::async_trait]
pub trait ManifestValidator: Send + Sync {
    async fn validate_file(&self, path: &Path) -> Result<()>;
}

/// Runs `kubectl apply --dry-run=client --validate=true -f <file>`.
///
/// kubectl inherits the caller's working directory, so relative file paths
/// handed out by the harness resolve the same way for both.
#[derive(Debug, Clone)]
pub struct KubectlValidator {
    binary: String,
    context: Option<String>,
    work_dir: PathBuf,
}

impl KubectlValidator {
    pub fn new(binary: impl Into<String>, context: Option<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            context,
            work_dir: work_dir.into(),
        }
    }

    pub fn from_conf(conf: &KubectlConf) -> Self {
        Self::new(conf.binary.clone(), conf.context.clone(), conf.work_dir.clone())
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn args(&self, path: &Path) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(ref context) = self.context {
            args.push(format!("--context={}", context));
        }
        args.extend([
            "apply".to_string(),
            "--dry-run=client".to_string(),
            "--validate=true".to_string(),
            "-f".to_string(),
            path.display().to_string(),
        ]);
        args
    }
}

#[async_trait::async_trait]
impl ManifestValidator for KubectlValidator {
    async fn validate_file(&self, path: &Path) -> Result<()> {
        let args = self.args(path);
        debug!("{} {}", self.binary, args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                DeployError::ValidationError(format!("Failed to run {}: {}", self.binary, e))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(DeployError::ValidationError(format!(
                "{} rejected {} (exit code {}): {}",
                self.binary,
                path.display(),
                output.status.code().unwrap_or(-1),
                stderr
            )));
        }
        if !stderr.is_empty() {
            warn!("{} {} stderr: {}", self.binary, args.join(" "), stderr);
        }
        Ok(())
    }
}
