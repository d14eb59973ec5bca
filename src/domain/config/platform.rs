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

//! Platform-wide configuration loaded from a TOML file.

use crate::domain::catalog;
use crate::domain::config::microservice::{is_valid_k8s_name, MicroserviceSpec};
use crate::domain::config::params::DeployParams;
use crate::shared::error::{DeployError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_REPOSITORY: &str = "docker.io/pumpwood";
pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";
pub const DEFAULT_IMAGE_PULL_POLICY: &str = "IfNotPresent";
pub const DEFAULT_OUTPUT_DIR: &str = "outputs/deploy_output";
pub const VALID_PULL_POLICIES: [&str; 3] = ["Always", "IfNotPresent", "Never"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConf {
    pub namespace: String,
    pub repository: String,
    pub cluster_domain: String,
    pub image_pull_policy: String,
    pub image_pull_secrets: Vec<String>,
    pub template_dir: Option<String>,
    pub output_dir: String,
    pub kubectl: KubectlConf,
    pub specs: Vec<MicroserviceSpec>,
    pub microservices: Vec<MicroserviceEntry>,
}

impl Default for PlatformConf {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            repository: DEFAULT_REPOSITORY.to_string(),
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
            image_pull_policy: DEFAULT_IMAGE_PULL_POLICY.to_string(),
            image_pull_secrets: Vec::new(),
            template_dir: None,
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            kubectl: KubectlConf::default(),
            specs: Vec::new(),
            microservices: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KubectlConf {
    pub binary: String,
    pub context: Option<String>,
    pub work_dir: String,
}

impl Default for KubectlConf {
    fn default() -> Self {
        Self {
            binary: "kubectl".to_string(),
            context: None,
            work_dir: "outputs/validation".to_string(),
        }
    }
}

/// One microservice to render: which spec, with which parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroserviceEntry {
    pub spec: String,
    pub parameters: DeployParams,
    pub env: BTreeMap<String, String>,
}

/// The settings every builder reads besides its own parameters.
#[derive(Debug, Clone)]
pub struct PlatformContext {
    pub namespace: String,
    pub repository: String,
    pub cluster_domain: String,
    pub image_pull_policy: String,
    pub image_pull_secrets: Vec<String>,
    pub template_dir: Option<PathBuf>,
}

impl Default for PlatformContext {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            repository: DEFAULT_REPOSITORY.to_string(),
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
            image_pull_policy: DEFAULT_IMAGE_PULL_POLICY.to_string(),
            image_pull_secrets: Vec::new(),
            template_dir: None,
        }
    }
}

impl PlatformContext {
    /// Resolves a template path against the configured template directory.
    pub fn template_path(&self, file: &str) -> Result<PathBuf> {
        let path = Path::new(file);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }

        match self.template_dir {
            Some(ref dir) => Ok(dir.join(path)),
            None => Err(DeployError::ConfigError(format!(
                "Relative template path '{}' needs template_dir to be configured",
                file
            ))),
        }
    }
}

impl PlatformConf {
    /// Load configuration from TOML file
    ///
    /// A relative `template_dir` is resolved against the directory holding the file.
    pub fn from<T: AsRef<Path>>(path: T) -> Result<Self> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|e| {
            DeployError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut conf = Self::from_toml(&content)?;

        if let Some(ref dir) = conf.template_dir {
            if Path::new(dir).is_relative() {
                let base = path.parent().unwrap_or_else(|| Path::new(""));
                conf.template_dir = Some(base.join(dir).to_string_lossy().into_owned());
            }
        }

        Ok(conf)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let conf: Self = toml::from_str(content)?;
        Ok(conf)
    }

    pub fn context(&self) -> PlatformContext {
        PlatformContext {
            namespace: self.namespace.clone(),
            repository: self.repository.clone(),
            cluster_domain: self.cluster_domain.clone(),
            image_pull_policy: self.image_pull_policy.clone(),
            image_pull_secrets: self.image_pull_secrets.clone(),
            template_dir: self.template_dir.as_ref().map(PathBuf::from),
        }
    }

    /// Inline specs shadow catalog specs of the same name.
    pub fn resolve_spec(&self, name: &str) -> Result<MicroserviceSpec> {
        self.specs
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .or_else(|| catalog::find(name))
            .ok_or_else(|| DeployError::UnknownSpec(name.to_string()))
    }

    pub fn entry_mut(&mut self, spec: &str) -> Option<&mut MicroserviceEntry> {
        self.microservices.iter_mut().find(|m| m.spec == spec)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_k8s_name(&self.namespace) {
            return Err(DeployError::ConfigError(format!(
                "Invalid namespace: {}",
                self.namespace
            )));
        }

        if self.repository.is_empty() {
            return Err(DeployError::ConfigError(
                "repository must not be empty".to_string(),
            ));
        }

        if !VALID_PULL_POLICIES.contains(&self.image_pull_policy.as_str()) {
            return Err(DeployError::ConfigError(format!(
                "Invalid image_pull_policy: {}",
                self.image_pull_policy
            )));
        }

        for spec in &self.specs {
            spec.validate()?;
        }

        let mut seen = std::collections::BTreeSet::new();
        for entry in &self.microservices {
            if !seen.insert(entry.spec.as_str()) {
                return Err(DeployError::ConfigError(format!(
                    "Microservice '{}' is configured twice",
                    entry.spec
                )));
            }
            self.resolve_spec(&entry.spec)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let conf = PlatformConf::from_toml("").unwrap();
        assert_eq!(conf.namespace, "default");
        assert_eq!(conf.kubectl.binary, "kubectl");
        assert!(conf.validate().is_ok());
    }

    #[test]
    fn test_invalid_pull_policy() {
        let conf = PlatformConf::from_toml(r#"image_pull_policy = "Sometimes""#).unwrap();
        assert!(conf.validate().is_err());
    }

    #[test]
    fn test_unknown_spec() {
        let conf = PlatformConf::from_toml(
            r#"
            [[microservices]]
            spec = "pumpwood-unknown"
            "#,
        )
        .unwrap();
        assert!(matches!(
            conf.validate(),
            Err(DeployError::UnknownSpec(_))
        ));
    }

    #[test]
    fn test_relative_template_path_needs_dir() {
        let ctx = PlatformContext::default();
        assert!(ctx.template_path("pod.yaml").is_err());
        assert_eq!(
            ctx.template_path("/etc/pumpwood/pod.yaml").unwrap(),
            PathBuf::from("/etc/pumpwood/pod.yaml")
        );

        let ctx = PlatformContext {
            template_dir: Some(PathBuf::from("/srv/templates")),
            ..Default::default()
        };
        assert_eq!(
            ctx.template_path("pod.yaml").unwrap(),
            PathBuf::from("/srv/templates/pod.yaml")
        );
    }
}
