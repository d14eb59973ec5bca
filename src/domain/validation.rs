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

//! Dry-run validation of rendered artifacts.
//!
//! Each artifact is written to `<work_dir>/<index>__<name>.yaml` and handed to
//! a [`ManifestValidator`]. Secret-bearing artifacts never leave memory.

use crate::domain::artifact::ArtifactDescriptor;
use crate::infrastructure::kubernetes::ManifestValidator;
use crate::shared::error::{DeployError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Passed { path: PathBuf },
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationRecord {
    pub microservice: String,
    pub artifact: String,
    #[serde(flatten)]
    pub outcome: ValidationOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub records: Vec<ValidationRecord>,
}

impl ValidationReport {
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, ValidationOutcome::Passed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ValidationOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ValidationOutcome::Failed { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn extend(&mut self, other: ValidationReport) {
        self.records.extend(other.records);
    }

    /// Turns the first failure into a [`DeployError::ValidationError`].
    pub fn into_result(self) -> Result<Self> {
        let failure = self.records.iter().find_map(|r| match r.outcome {
            ValidationOutcome::Failed { ref reason } => {
                Some(format!("{}/{}: {}", r.microservice, r.artifact, reason))
            }
            _ => None,
        });
        match failure {
            Some(reason) => Err(DeployError::ValidationError(reason)),
            None => Ok(self),
        }
    }

    fn count(&self, pred: impl Fn(&ValidationOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }
}

pub struct ValidationHarness<V: ManifestValidator> {
    validator: V,
    work_dir: PathBuf,
    require: Option<String>,
}

impl<V: ManifestValidator> ValidationHarness<V> {
    pub fn new(validator: V, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            validator,
            work_dir: work_dir.into(),
            require: None,
        }
    }

    /// Every validated artifact must contain `text`.
    pub fn with_required_substring(mut self, text: Option<String>) -> Self {
        self.require = text.filter(|t| !t.is_empty());
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub async fn validate_all(
        &self,
        microservice: &str,
        artifacts: &[ArtifactDescriptor],
    ) -> Result<ValidationReport> {
        let dir = self.work_dir.join(microservice);
        std::fs::create_dir_all(&dir)?;

        let mut report = ValidationReport::default();
        for (index, artifact) in artifacts.iter().enumerate() {
            let outcome = self.validate_one(&dir, index, artifact).await?;
            if let ValidationOutcome::Failed { ref reason } = outcome {
                warn!("{}/{} failed validation: {}", microservice, artifact.name, reason);
            }
            report.records.push(ValidationRecord {
                microservice: microservice.to_string(),
                artifact: artifact.name.clone(),
                outcome,
            });
        }

        info!(
            "Validated {}: {} passed, {} skipped, {} failed",
            microservice,
            report.passed(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }

    async fn validate_one(
        &self,
        dir: &Path,
        index: usize,
        artifact: &ArtifactDescriptor,
    ) -> Result<ValidationOutcome> {
        if artifact.kind.is_secret_bearing() {
            warn!("Skipping validation of secret-bearing artifact {}", artifact.name);
            return Ok(ValidationOutcome::Skipped {
                reason: format!("{} artifacts are not validated", artifact.kind),
            });
        }

        if let Some(ref text) = self.require {
            if !artifact.content.contains(text.as_str()) {
                return Ok(ValidationOutcome::Failed {
                    reason: format!("required text '{}' not found", text),
                });
            }
        }

        if let Err(e) = check_yaml(artifact) {
            return Ok(ValidationOutcome::Failed {
                reason: e.to_string(),
            });
        }

        let path = dir.join(format!("{:02}__{}.yaml", index, artifact.name));
        std::fs::write(&path, &artifact.content)?;
        debug!("Wrote {} for validation", path.display());

        match self.validator.validate_file(&path).await {
            Ok(()) => Ok(ValidationOutcome::Passed { path }),
            Err(DeployError::ValidationError(reason)) => Ok(ValidationOutcome::Failed { reason }),
            Err(e) => Err(e),
        }
    }
}

/// Local syntax check: every document of the artifact must parse.
pub fn check_yaml(artifact: &ArtifactDescriptor) -> Result<usize> {
    let documents = artifact.documents().map_err(|e| {
        DeployError::ValidationError(format!("{} is not valid YAML: {}", artifact.name, e))
    })?;
    if documents.is_empty() {
        return Err(DeployError::ValidationError(format!(
            "{} contains no YAML documents",
            artifact.name
        )));
    }
    Ok(documents.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artifact::ArtifactKind;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingValidator {
        seen: Mutex<Vec<PathBuf>>,
        reject: Option<String>,
    }

    #[async_trait::async_trait]
    impl ManifestValidator for RecordingValidator {
        async fn validate_file(&self, path: &Path) -> Result<()> {
            self.seen.lock().unwrap().push(path.to_path_buf());
            let content = std::fs::read_to_string(path)?;
            match self.reject {
                Some(ref marker) if content.contains(marker.as_str()) => Err(
                    DeployError::ValidationError(format!("error: rejected {}", marker)),
                ),
                _ => Ok(()),
            }
        }
    }

    fn artifacts() -> Vec<ArtifactDescriptor> {
        vec![
            ArtifactDescriptor::new(
                ArtifactKind::SecretsFile,
                "pumpwood-auth__secrets",
                "kind: Secret\n",
            ),
            ArtifactDescriptor::new(
                ArtifactKind::Deploy,
                "pumpwood-auth__app",
                "kind: Deployment\nmetadata:\n  name: pumpwood-auth-app\n",
            ),
            ArtifactDescriptor::new(
                ArtifactKind::Service,
                "pumpwood-auth__service",
                "kind: Service\nmetadata:\n  name: pumpwood-auth\n",
            ),
        ]
    }

    #[tokio::test]
    async fn test_secrets_are_skipped_and_files_written() {
        let dir = tempfile::tempdir().unwrap();
        let harness = ValidationHarness::new(RecordingValidator::default(), dir.path());

        let report = harness.validate_all("pumpwood-auth", &artifacts()).await.unwrap();
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.passed(), 2);
        assert!(report.is_success());

        let seen = harness.validator.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].ends_with("pumpwood-auth/01__pumpwood-auth__app.yaml"));
        assert!(!dir
            .path()
            .join("pumpwood-auth/00__pumpwood-auth__secrets.yaml")
            .exists());
    }

    #[tokio::test]
    async fn test_required_substring() {
        let dir = tempfile::tempdir().unwrap();
        let harness = ValidationHarness::new(RecordingValidator::default(), dir.path())
            .with_required_substring(Some("pumpwood-auth-app".to_string()));

        let report = harness.validate_all("pumpwood-auth", &artifacts()).await.unwrap();
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.into_result(),
            Err(DeployError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_validator_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let validator = RecordingValidator {
            reject: Some("kind: Service".to_string()),
            ..Default::default()
        };
        let harness = ValidationHarness::new(validator, dir.path());

        let report = harness.validate_all("pumpwood-auth", &artifacts()).await.unwrap();
        let failed = report
            .records
            .iter()
            .find(|r| matches!(r.outcome, ValidationOutcome::Failed { .. }))
            .unwrap();
        assert_eq!(failed.artifact, "pumpwood-auth__service");
        let err = report.into_result().unwrap_err();
        assert!(err.to_string().contains("rejected kind: Service"));
    }

    #[test]
    fn test_check_yaml() {
        let ok = ArtifactDescriptor::new(ArtifactKind::Deploy, "a", "a: 1\n---\nb: 2\n");
        assert_eq!(check_yaml(&ok).unwrap(), 2);

        let broken = ArtifactDescriptor::new(ArtifactKind::Deploy, "b", "a: [1\n");
        assert!(check_yaml(&broken).is_err());

        let empty = ArtifactDescriptor::new(ArtifactKind::Deploy, "c", "");
        assert!(check_yaml(&empty).is_err());
    }
}
