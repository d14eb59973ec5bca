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

use crate::domain::config::ServiceType;
use crate::infrastructure::constants::{PORT_NAME_HTTP, PROTOCOL_TCP};
use crate::infrastructure::kubernetes::resources::pod::resource_labels;
use crate::shared::error::{DeployError, Result};
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

pub struct ServiceBuilder {
    name: String,
    microservice: String,
    component: String,
    namespace: String,
    service_type: ServiceType,
    port_name: String,
    port: i32,
    target_port: i32,
    load_balancer_ip: Option<String>,
    annotations: BTreeMap<String, String>,
}

impl ServiceBuilder {
    /// The service selects pods of `microservice` labelled with `component`.
    pub fn new(
        name: impl Into<String>,
        microservice: impl Into<String>,
        component: impl Into<String>,
        namespace: impl Into<String>,
        port: i32,
    ) -> Self {
        Self {
            name: name.into(),
            microservice: microservice.into(),
            component: component.into(),
            namespace: namespace.into(),
            service_type: ServiceType::ClusterIP,
            port_name: PORT_NAME_HTTP.to_string(),
            port,
            target_port: port,
            load_balancer_ip: None,
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_config(
        mut self,
        service_type: ServiceType,
        target_port: Option<i32>,
        load_balancer_ip: Option<String>,
        annotations: BTreeMap<String, String>,
    ) -> Self {
        self.service_type = service_type;
        if let Some(target_port) = target_port {
            self.target_port = target_port;
        }
        self.load_balancer_ip = load_balancer_ip;
        self.annotations = annotations;
        self
    }

    pub fn with_port_name(mut self, name: impl Into<String>) -> Self {
        self.port_name = name.into();
        self
    }

    pub fn build(&self) -> Result<Service> {
        if self.load_balancer_ip.is_some() && self.service_type != ServiceType::LoadBalancer {
            return Err(DeployError::ConfigError(format!(
                "Service '{}' sets a load balancer IP but has type {}",
                self.name,
                self.service_type.as_str()
            )));
        }

        let mut selector = BTreeMap::new();
        selector.insert("app".to_string(), self.microservice.clone());
        selector.insert("component".to_string(), self.component.clone());

        let annotations = if self.annotations.is_empty() {
            None
        } else {
            Some(self.annotations.clone())
        };

        let service = Service {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: Some(self.get_labels()),
                annotations,
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                type_: Some(self.service_type.as_str().to_string()),
                ports: Some(vec![ServicePort {
                    name: Some(self.port_name.clone()),
                    port: self.port,
                    target_port: Some(IntOrString::Int(self.target_port)),
                    protocol: Some(PROTOCOL_TCP.to_string()),
                    ..Default::default()
                }]),
                selector: Some(selector),
                load_balancer_ip: self.load_balancer_ip.clone(),
                ..Default::default()
            }),
            ..Default::default()
        };

        Ok(service)
    }

    pub fn get_labels(&self) -> BTreeMap<String, String> {
        resource_labels(&self.microservice, &self.component)
    }
}
