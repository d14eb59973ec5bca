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

//! Environment variable builder for Pumpwood deployments
//!
//! Every container gets the same base variables; spec-declared variables
//! come next and per-microservice overrides last. A later variable with
//! the same name replaces the earlier one in place.

use crate::infrastructure::constants::{
    ENV_MICROSERVICE_NAME, ENV_POD_IP, ENV_POD_NAME, ENV_POD_NAMESPACE,
};
use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, ObjectFieldSelector, SecretKeySelector};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    Literal(String),
    SecretKey { secret: String, key: String },
    PodField(String),
}

impl EnvValue {
    fn into_env_var(self, name: String) -> EnvVar {
        match self {
            EnvValue::Literal(value) => EnvVar {
                name,
                value: Some(value),
                ..Default::default()
            },
            EnvValue::SecretKey { secret, key } => EnvVar {
                name,
                value_from: Some(EnvVarSource {
                    secret_key_ref: Some(SecretKeySelector {
                        name: secret,
                        key,
                        optional: Some(false),
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            EnvValue::PodField(path) => EnvVar {
                name,
                value_from: Some(EnvVarSource {
                    field_ref: Some(ObjectFieldSelector {
                        field_path: path,
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
        }
    }
}

pub struct EnvironmentBuilder {
    microservice: String,
    vars: Vec<(String, EnvValue)>,
    custom_vars: BTreeMap<String, String>,
}

impl EnvironmentBuilder {
    pub fn new(microservice: impl Into<String>) -> Self {
        Self {
            microservice: microservice.into(),
            vars: Vec::new(),
            custom_vars: BTreeMap::new(),
        }
    }

    pub fn with_vars(mut self, vars: Vec<(String, EnvValue)>) -> Self {
        self.vars.extend(vars);
        self
    }

    pub fn with_custom_vars(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.custom_vars.extend(vars.clone());
        self
    }

    pub fn build(self) -> Vec<EnvVar> {
        let mut env_vars: Vec<EnvVar> = Vec::new();
        let base = self.build_base_env_vars();
        let custom = self
            .custom_vars
            .into_iter()
            .map(|(name, value)| (name, EnvValue::Literal(value)));

        for (name, value) in base.into_iter().chain(self.vars).chain(custom) {
            let var = value.into_env_var(name);
            match env_vars.iter_mut().find(|e| e.name == var.name) {
                Some(existing) => *existing = var,
                None => env_vars.push(var),
            }
        }
        env_vars
    }

    fn build_base_env_vars(&self) -> Vec<(String, EnvValue)> {
        vec![
            (
                ENV_MICROSERVICE_NAME.to_string(),
                EnvValue::Literal(self.microservice.clone()),
            ),
            (
                ENV_POD_NAMESPACE.to_string(),
                EnvValue::PodField("metadata.namespace".to_string()),
            ),
            (
                ENV_POD_NAME.to_string(),
                EnvValue::PodField("metadata.name".to_string()),
            ),
            (
                ENV_POD_IP.to_string(),
                EnvValue::PodField("status.podIP".to_string()),
            ),
        ]
    }
}
