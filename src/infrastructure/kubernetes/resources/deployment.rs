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

use crate::domain::config::{DeploymentSpec, PlatformContext};
use crate::infrastructure::constants::*;
use crate::infrastructure::kubernetes::resources::pod::{
    load_pod_from_template_file, merge_pod_with_template, EnvValue, EnvironmentBuilder,
    LifecycleBuilder, PodBuilder,
};
use crate::shared::error::Result;
use k8s_openapi::api::apps::v1::{
    Deployment, DeploymentSpec as K8sDeploymentSpec, DeploymentStrategy, RollingUpdateDeployment,
};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, HTTPGetAction, LocalObjectReference, Pod, PodSpec,
    PodTemplateSpec, Probe, ResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub struct DeploymentBuilder {
    microservice: String,
    component: String,
    namespace: String,
    image: String,
    image_pull_policy: String,
    image_pull_secrets: Vec<String>,
    replicas: u32,
    port: Option<i32>,
    port_name: String,
    health_path: Option<String>,
    cpu: Option<String>,
    memory: Option<String>,
    graceful_shutdown: Option<u32>,
    env: Vec<(String, EnvValue)>,
    custom_env: BTreeMap<String, String>,
    pod_template: Option<PathBuf>,
}

impl PodBuilder for DeploymentBuilder {
    fn component_name(&self) -> &str {
        &self.component
    }

    fn microservice(&self) -> &str {
        &self.microservice
    }

    fn build_base_pod(&self) -> Result<Pod> {
        self.build_base_pod_impl()
    }

    fn pod_template_path(&self) -> Option<&Path> {
        self.pod_template.as_deref()
    }

    fn main_container_name(&self) -> String {
        self.component.clone()
    }
}

impl DeploymentBuilder {
    /// `image` is the fully qualified reference, `<repository>/<image>:<version>`.
    pub fn new(
        microservice: impl Into<String>,
        spec: &DeploymentSpec,
        context: &PlatformContext,
        image: impl Into<String>,
    ) -> Self {
        Self {
            microservice: microservice.into(),
            component: spec.component.clone(),
            namespace: context.namespace.clone(),
            image: image.into(),
            image_pull_policy: context.image_pull_policy.clone(),
            image_pull_secrets: context.image_pull_secrets.clone(),
            replicas: spec.replicas,
            port: spec.port,
            port_name: PORT_NAME_HTTP.to_string(),
            health_path: spec.health_path.clone(),
            cpu: spec.cpu.clone(),
            memory: spec.memory.clone(),
            graceful_shutdown: spec.graceful_shutdown,
            env: Vec::new(),
            custom_env: BTreeMap::new(),
            pod_template: None,
        }
    }

    pub fn with_env(mut self, env: Vec<(String, EnvValue)>) -> Self {
        self.env = env;
        self
    }

    pub fn with_custom_env(mut self, env: &BTreeMap<String, String>) -> Self {
        self.custom_env = env.clone();
        self
    }

    pub fn with_pod_template(mut self, path: Option<PathBuf>) -> Self {
        self.pod_template = path;
        self
    }

    pub fn with_port_name(mut self, name: impl Into<String>) -> Self {
        self.port_name = name.into();
        self
    }

    pub fn name(&self) -> String {
        format!("{}-{}", self.microservice, self.component)
    }

    pub fn build(&self) -> Result<Deployment> {
        let template_pod = match self.pod_template_path() {
            Some(path) => Some(load_pod_from_template_file(
                path,
                &self.main_container_name(),
            )?),
            None => None,
        };

        let builder_pod = self.build_base_pod()?;
        let final_pod = merge_pod_with_template(template_pod, builder_pod, self.get_labels())?;

        let deployment = Deployment {
            metadata: ObjectMeta {
                name: Some(self.name()),
                namespace: Some(self.namespace.clone()),
                labels: Some(self.get_labels()),
                ..Default::default()
            },
            spec: Some(K8sDeploymentSpec {
                replicas: Some(self.replicas as i32),
                selector: LabelSelector {
                    match_labels: Some(self.get_selector_labels()),
                    ..Default::default()
                },
                strategy: Some(DeploymentStrategy {
                    type_: Some(STRATEGY_TYPE_ROLLING_UPDATE.to_string()),
                    rolling_update: Some(RollingUpdateDeployment {
                        max_surge: Some(IntOrString::String(MAX_SURGE.to_string())),
                        max_unavailable: Some(IntOrString::String(
                            MAX_UNAVAILABLE.to_string(),
                        )),
                    }),
                }),
                template: PodTemplateSpec {
                    metadata: Some(final_pod.metadata),
                    spec: final_pod.spec,
                },
                ..Default::default()
            }),
            ..Default::default()
        };

        Ok(deployment)
    }

    fn build_base_pod_impl(&self) -> Result<Pod> {
        let env_vars = EnvironmentBuilder::new(self.microservice.clone())
            .with_vars(self.env.clone())
            .with_custom_vars(&self.custom_env)
            .build();

        let container = Container {
            name: self.main_container_name(),
            image: Some(self.image.clone()),
            image_pull_policy: Some(self.image_pull_policy.clone()),
            env: Some(env_vars),
            ports: self.port.map(|port| {
                vec![ContainerPort {
                    container_port: port,
                    name: Some(self.port_name.clone()),
                    protocol: Some(PROTOCOL_TCP.to_string()),
                    ..Default::default()
                }]
            }),
            readiness_probe: self.build_readiness_probe(),
            resources: self.build_resources(),
            lifecycle: LifecycleBuilder::build_graceful_shutdown(self.graceful_shutdown),
            ..Default::default()
        };

        let image_pull_secrets = if self.image_pull_secrets.is_empty() {
            None
        } else {
            Some(
                self.image_pull_secrets
                    .iter()
                    .map(|name| LocalObjectReference { name: name.clone() })
                    .collect(),
            )
        };

        Ok(Pod {
            metadata: ObjectMeta {
                labels: Some(self.get_labels()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![container],
                image_pull_secrets,
                restart_policy: Some(RESTART_POLICY_ALWAYS.to_string()),
                termination_grace_period_seconds: self
                    .graceful_shutdown
                    .map(|delay| i64::from(delay) + 30),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn build_readiness_probe(&self) -> Option<Probe> {
        let port = self.port?;
        let path = self.health_path.clone()?;

        Some(Probe {
            http_get: Some(HTTPGetAction {
                path: Some(path),
                port: IntOrString::Int(port),
                ..Default::default()
            }),
            initial_delay_seconds: Some(READINESS_INITIAL_DELAY),
            period_seconds: Some(READINESS_PERIOD),
            timeout_seconds: Some(READINESS_TIMEOUT),
            failure_threshold: Some(READINESS_FAILURE_THRESHOLD),
            ..Default::default()
        })
    }

    fn build_resources(&self) -> Option<ResourceRequirements> {
        let mut requests = BTreeMap::new();
        if let Some(ref cpu) = self.cpu {
            requests.insert("cpu".to_string(), Quantity(cpu.clone()));
        }
        if let Some(ref memory) = self.memory {
            requests.insert("memory".to_string(), Quantity(memory.clone()));
        }

        if requests.is_empty() {
            return None;
        }

        Some(ResourceRequirements {
            requests: Some(requests),
            ..Default::default()
        })
    }
}
