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

//! Per-microservice manifest specifications.
//!
//! A spec lists the fields a microservice needs and how they flow into the
//! secret, deployments, service, ingress and test database it renders.

use crate::domain::artifact::ArtifactKind;
use crate::infrastructure::constants::COMPONENT_TEST_DB;
use crate::shared::error::DeployError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const MAX_MICROSERVICE_NAME_LEN: usize = 45;
pub const DEFAULT_TEST_DB_VERSION_FIELD: &str = "test_db_version";
pub const DEFAULT_TEST_DB_PORT: i32 = 5432;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroserviceSpec {
    pub name: String,
    pub description: Option<String>,
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub secret: Vec<SecretKeySpec>,
    pub deployments: Vec<DeploymentSpec>,
    pub service: Option<ServiceSpec>,
    pub ingress: Option<IngressSpec>,
    pub endpoints: Vec<EndpointSpec>,
    pub raw_templates: Vec<RawTemplateSpec>,
    pub test_database: Option<TestDatabaseSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretKeySpec {
    pub key: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentSpec {
    pub component: String,
    pub image: String,
    pub version_field: String,
    pub replicas: u32,
    pub port: Option<i32>,
    pub health_path: Option<String>,
    pub env: Vec<EnvSpec>,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub trigger: Option<String>,
    pub sleep: Option<u64>,
    pub pod_template: Option<String>,
    pub graceful_shutdown: Option<u32>,
}

impl Default for DeploymentSpec {
    fn default() -> Self {
        Self {
            component: "app".to_string(),
            image: String::new(),
            version_field: "app_version".to_string(),
            replicas: 1,
            port: None,
            health_path: None,
            env: Vec::new(),
            cpu: None,
            memory: None,
            trigger: None,
            sleep: None,
            pod_template: None,
            graceful_shutdown: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvSpec {
    pub name: String,
    #[serde(flatten)]
    pub source: EnvSource,
}

impl EnvSpec {
    pub fn value(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            source: EnvSource::Value {
                value: value.to_string(),
            },
        }
    }

    pub fn field(name: &str, field: &str) -> Self {
        Self {
            name: name.to_string(),
            source: EnvSource::Field {
                field: field.to_string(),
                default: None,
            },
        }
    }

    pub fn secret(name: &str, key: &str) -> Self {
        Self {
            name: name.to_string(),
            source: EnvSource::Secret {
                key: key.to_string(),
            },
        }
    }

    pub fn endpoint(name: &str, microservice: &str, endpoint: &str) -> Self {
        Self {
            name: name.to_string(),
            source: EnvSource::Endpoint {
                microservice: microservice.to_string(),
                endpoint: endpoint.to_string(),
            },
        }
    }
}

/// Where an environment variable takes its value from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum EnvSource {
    Value {
        value: String,
    },
    /// Unset optional fields fall back to `default`, or drop the variable.
    Field {
        field: String,
        #[serde(default)]
        default: Option<String>,
    },
    Secret {
        key: String,
    },
    Endpoint {
        microservice: String,
        endpoint: String,
    },
    PodField {
        path: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ServiceType {
    #[default]
    ClusterIP,
    NodePort,
    LoadBalancer,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::ClusterIP => "ClusterIP",
            ServiceType::NodePort => "NodePort",
            ServiceType::LoadBalancer => "LoadBalancer",
        }
    }
}

impl std::str::FromStr for ServiceType {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ClusterIP" => Ok(ServiceType::ClusterIP),
            "NodePort" => Ok(ServiceType::NodePort),
            "LoadBalancer" => Ok(ServiceType::LoadBalancer),
            _ => Err(DeployError::ConfigError(format!(
                "Invalid service type: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSpec {
    pub component: String,
    pub port: i32,
    pub target_port: Option<i32>,
    pub service_type: ServiceType,
    pub load_balancer_ip_field: Option<String>,
    pub annotations: BTreeMap<String, String>,
}

impl Default for ServiceSpec {
    fn default() -> Self {
        Self {
            component: "app".to_string(),
            port: 80,
            target_port: None,
            service_type: ServiceType::ClusterIP,
            load_balancer_ip_field: None,
            annotations: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressSpec {
    pub path: String,
    pub path_type: String,
    pub host_field: Option<String>,
    pub ingress_class: Option<String>,
    pub tls_secret: Option<String>,
    pub trigger: Option<String>,
    pub annotations: BTreeMap<String, String>,
}

impl Default for IngressSpec {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            path_type: "Prefix".to_string(),
            host_field: None,
            ingress_class: None,
            tls_secret: None,
            trigger: None,
            annotations: BTreeMap::new(),
        }
    }
}

/// Extra endpoint published from a parameter holding a host or IP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub name: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    pub host_field: String,
    #[serde(default)]
    pub port: Option<i32>,
    #[serde(default)]
    pub path: String,
}

fn default_scheme() -> String {
    "http".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTemplateSpec {
    pub name: String,
    pub kind: ArtifactKind,
    pub file: String,
    #[serde(default)]
    pub trigger: Option<String>,
    #[serde(default)]
    pub sleep: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestDatabaseSpec {
    pub image: Option<String>,
    pub version_field: String,
    pub port: i32,
    pub sleep: Option<u64>,
}

impl Default for TestDatabaseSpec {
    fn default() -> Self {
        Self {
            image: None,
            version_field: DEFAULT_TEST_DB_VERSION_FIELD.to_string(),
            port: DEFAULT_TEST_DB_PORT,
            sleep: None,
        }
    }
}

impl MicroserviceSpec {
    pub fn declares(&self, field: &str) -> bool {
        self.required.iter().any(|f| f == field) || self.optional.iter().any(|f| f == field)
    }

    pub fn deployment(&self, component: &str) -> Option<&DeploymentSpec> {
        self.deployments.iter().find(|d| d.component == component)
    }

    pub fn secret_name(&self) -> String {
        format!("{}-secrets", self.name)
    }

    pub fn test_database_name(&self) -> String {
        format!("{}-test-db", self.name)
    }

    /// Every field this spec reads, in declaration order.
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        for s in &self.secret {
            fields.push(s.field.as_str());
        }
        for d in &self.deployments {
            fields.push(d.version_field.as_str());
            if let Some(ref t) = d.trigger {
                fields.push(t.as_str());
            }
            for e in &d.env {
                if let EnvSource::Field { ref field, .. } = e.source {
                    fields.push(field.as_str());
                }
            }
        }
        if let Some(ref svc) = self.service {
            if let Some(ref f) = svc.load_balancer_ip_field {
                fields.push(f.as_str());
            }
        }
        if let Some(ref ing) = self.ingress {
            if let Some(ref f) = ing.host_field {
                fields.push(f.as_str());
            }
            if let Some(ref t) = ing.trigger {
                fields.push(t.as_str());
            }
        }
        for e in &self.endpoints {
            fields.push(e.host_field.as_str());
        }
        for t in &self.raw_templates {
            if let Some(ref trigger) = t.trigger {
                fields.push(trigger.as_str());
            }
        }
        if let Some(ref db) = self.test_database {
            fields.push(db.version_field.as_str());
        }
        fields
    }

    /// Artifact names in render order, including every optional artifact.
    pub fn artifact_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if !self.secret.is_empty() {
            names.push(format!("{}__secrets", self.name));
        }
        for d in &self.deployments {
            names.push(format!("{}__{}", self.name, d.component));
        }
        if self.service.is_some() {
            names.push(format!("{}__service", self.name));
        }
        if self.ingress.is_some() {
            names.push(format!("{}__ingress", self.name));
        }
        for t in &self.raw_templates {
            names.push(format!("{}__{}", self.name, t.name));
        }
        if self.test_database.is_some() {
            names.push(format!("{}__test_db", self.name));
        }
        names
    }

    pub fn validate(&self) -> Result<(), DeployError> {
        if !is_valid_k8s_name(&self.name) {
            return Err(DeployError::ConfigError(format!(
                "Invalid microservice name: {}",
                self.name
            )));
        }

        if self.name.len() > MAX_MICROSERVICE_NAME_LEN {
            return Err(DeployError::ConfigError(format!(
                "microservice name too long (max {} chars): {}",
                MAX_MICROSERVICE_NAME_LEN, self.name
            )));
        }

        if let Some(field) = self.required.iter().find(|f| self.optional.contains(f)) {
            return Err(DeployError::ConfigError(format!(
                "{}: field '{}' is listed as both required and optional",
                self.name, field
            )));
        }

        for field in self.referenced_fields() {
            if !self.declares(field) {
                return Err(DeployError::ConfigError(format!(
                    "{}: field '{}' is used but not declared",
                    self.name, field
                )));
            }
        }

        let mut components = BTreeSet::new();
        for d in &self.deployments {
            if !is_valid_k8s_name(&d.component) {
                return Err(DeployError::ConfigError(format!(
                    "{}: invalid component name '{}'",
                    self.name, d.component
                )));
            }
            if d.component == COMPONENT_TEST_DB {
                return Err(DeployError::ConfigError(format!(
                    "{}: component name '{}' is reserved for the test database",
                    self.name, d.component
                )));
            }
            if !components.insert(d.component.as_str()) {
                return Err(DeployError::ConfigError(format!(
                    "{}: duplicated component '{}'",
                    self.name, d.component
                )));
            }
            if d.image.is_empty() {
                return Err(DeployError::ConfigError(format!(
                    "{}: component '{}' has no image",
                    self.name, d.component
                )));
            }
            for e in &d.env {
                if let EnvSource::Secret { ref key } = e.source {
                    if !self.secret.iter().any(|s| &s.key == key) {
                        return Err(DeployError::ConfigError(format!(
                            "{}: env '{}' references unknown secret key '{}'",
                            self.name, e.name, key
                        )));
                    }
                }
            }
        }

        if let Some(ref svc) = self.service {
            if !components.contains(svc.component.as_str()) {
                return Err(DeployError::ConfigError(format!(
                    "{}: service selects unknown component '{}'",
                    self.name, svc.component
                )));
            }
        }

        for t in &self.raw_templates {
            if !is_valid_k8s_name(&t.name) {
                return Err(DeployError::ConfigError(format!(
                    "{}: invalid raw template name '{}'",
                    self.name, t.name
                )));
            }
        }

        if self.ingress.is_some() && self.service.is_none() {
            return Err(DeployError::ConfigError(format!(
                "{}: ingress requires a service",
                self.name
            )));
        }

        let mut names = BTreeSet::new();
        for name in self.artifact_names() {
            if !names.insert(name.clone()) {
                return Err(DeployError::ConfigError(format!(
                    "{}: duplicated artifact name '{}'",
                    self.name, name
                )));
            }
        }

        Ok(())
    }
}

pub(crate) fn is_valid_k8s_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 63 {
        return false;
    }

    match Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$") {
        Ok(re) => re.is_match(name),
        Err(_) => false,
    }
}
