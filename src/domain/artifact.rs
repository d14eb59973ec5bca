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

//! Artifact descriptors returned by manifest builders.

use crate::shared::error::{DeployError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Deploy,
    SecretsFile,
    Service,
    Ingress,
    ConfigMap,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Deploy => "deploy",
            ArtifactKind::SecretsFile => "secrets_file",
            ArtifactKind::Service => "service",
            ArtifactKind::Ingress => "ingress",
            ArtifactKind::ConfigMap => "config_map",
        }
    }

    /// Secret-bearing artifacts must not leave a secured context.
    pub fn is_secret_bearing(&self) -> bool {
        matches!(self, ArtifactKind::SecretsFile)
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = DeployError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "deploy" => Ok(ArtifactKind::Deploy),
            "secrets_file" => Ok(ArtifactKind::SecretsFile),
            "service" => Ok(ArtifactKind::Service),
            "ingress" => Ok(ArtifactKind::Ingress),
            "config_map" => Ok(ArtifactKind::ConfigMap),
            _ => Err(DeployError::ConfigError(format!(
                "Invalid artifact type: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep: Option<u64>,
}

impl ArtifactDescriptor {
    pub fn new(kind: ArtifactKind, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            content: content.into(),
            sleep: None,
        }
    }

    pub fn with_sleep(mut self, sleep: Option<u64>) -> Self {
        self.sleep = sleep;
        self
    }

    /// Serializes one Kubernetes object into a single-document artifact.
    pub fn from_resource<T: Serialize>(
        kind: ArtifactKind,
        name: impl Into<String>,
        resource: &T,
    ) -> Result<Self> {
        let content = serde_yaml::to_string(resource)?;
        Ok(Self::new(kind, name, content))
    }

    /// Parses every YAML document in `content`, failing on the first syntax error.
    pub fn documents(&self) -> Result<Vec<serde_yaml::Value>> {
        let mut docs = Vec::new();
        for document in serde_yaml::Deserializer::from_str(&self.content) {
            let value = serde_yaml::Value::deserialize(document)?;
            if !value.is_null() {
                docs.push(value);
            }
        }
        Ok(docs)
    }
}

/// Joins several YAML documents into one multi-document text.
pub fn join_documents(documents: &[String]) -> String {
    let mut content = String::new();
    for (i, doc) in documents.iter().enumerate() {
        if i > 0 {
            content.push_str("---\n");
        }
        content.push_str(doc);
        if !doc.ends_with('\n') {
            content.push('\n');
        }
    }
    content
}

/// Artifacts that are safe to validate outside a secured context.
pub fn validatable(artifacts: &[ArtifactDescriptor]) -> Vec<&ArtifactDescriptor> {
    artifacts
        .iter()
        .filter(|a| !a.kind.is_secret_bearing())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_as_snake_case() {
        let artifact = ArtifactDescriptor::new(ArtifactKind::SecretsFile, "secrets", "a: 1\n");
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["type"], "secrets_file");
        assert!(json.get("sleep").is_none());
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("ingress".parse::<ArtifactKind>().unwrap(), ArtifactKind::Ingress);
        assert!("statefulset".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn test_join_documents() {
        let joined = join_documents(&["a: 1\n".to_string(), "b: 2".to_string()]);
        assert_eq!(joined, "a: 1\n---\nb: 2\n");

        let artifact = ArtifactDescriptor::new(ArtifactKind::Deploy, "multi", joined);
        assert_eq!(artifact.documents().unwrap().len(), 2);
    }

    #[test]
    fn test_validatable_skips_secrets() {
        let artifacts = vec![
            ArtifactDescriptor::new(ArtifactKind::SecretsFile, "secrets", ""),
            ArtifactDescriptor::new(ArtifactKind::Deploy, "app", ""),
        ];
        let names: Vec<_> = validatable(&artifacts).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["app"]);
    }
}
