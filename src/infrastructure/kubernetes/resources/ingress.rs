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

use crate::domain::config::IngressSpec;
use crate::infrastructure::kubernetes::resources::pod::resource_labels;
use crate::shared::error::Result;
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec as K8sIngressSpec, IngressTLS, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

pub struct IngressBuilder {
    name: String,
    microservice: String,
    namespace: String,
    service_name: String,
    service_port: i32,
    host: Option<String>,
    spec: IngressSpec,
}

impl IngressBuilder {
    pub fn new(
        name: impl Into<String>,
        microservice: impl Into<String>,
        namespace: impl Into<String>,
        spec: &IngressSpec,
    ) -> Self {
        Self {
            name: name.into(),
            microservice: microservice.into(),
            namespace: namespace.into(),
            service_name: String::new(),
            service_port: 80,
            host: None,
            spec: spec.clone(),
        }
    }

    pub fn with_backend(mut self, service_name: impl Into<String>, port: i32) -> Self {
        self.service_name = service_name.into();
        self.service_port = port;
        self
    }

    pub fn with_host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    pub fn build(&self) -> Result<Ingress> {
        let path = HTTPIngressPath {
            path: Some(self.spec.path.clone()),
            path_type: self.spec.path_type.clone(),
            backend: IngressBackend {
                service: Some(IngressServiceBackend {
                    name: self.service_name.clone(),
                    port: Some(ServiceBackendPort {
                        number: Some(self.service_port),
                        ..Default::default()
                    }),
                }),
                ..Default::default()
            },
        };

        let tls = match (&self.spec.tls_secret, &self.host) {
            (Some(secret), host) => Some(vec![IngressTLS {
                hosts: host.clone().map(|h| vec![h]),
                secret_name: Some(secret.clone()),
            }]),
            (None, _) => None,
        };

        let annotations = if self.spec.annotations.is_empty() {
            None
        } else {
            Some(self.spec.annotations.clone())
        };

        Ok(Ingress {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: Some(self.get_labels()),
                annotations,
                ..Default::default()
            },
            spec: Some(K8sIngressSpec {
                ingress_class_name: self.spec.ingress_class.clone(),
                rules: Some(vec![IngressRule {
                    host: self.host.clone(),
                    http: Some(HTTPIngressRuleValue { paths: vec![path] }),
                }]),
                tls,
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    /// Public URL of the rule, relative to the cluster ingress when no host is set.
    pub fn url(&self) -> String {
        let scheme = if self.spec.tls_secret.is_some() {
            "https"
        } else {
            "http"
        };
        match self.host {
            Some(ref host) => format!("{}://{}{}", scheme, host, self.spec.path),
            None => self.spec.path.clone(),
        }
    }

    pub fn get_labels(&self) -> BTreeMap<String, String> {
        resource_labels(&self.microservice, "ingress")
    }
}
