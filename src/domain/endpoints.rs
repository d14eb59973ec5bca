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

//! Endpoint maps exchanged between manifest builders.

use crate::shared::error::{DeployError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ENDPOINT_INTERNAL: &str = "internal";
pub const ENDPOINT_EXTERNAL: &str = "external";
pub const ENDPOINT_LOAD_BALANCER: &str = "load_balancer";

/// Externally reachable addresses of one microservice, keyed by logical name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointMap {
    pub microservice: String,
    pub endpoints: BTreeMap<String, String>,
}

impl EndpointMap {
    pub fn new(microservice: impl Into<String>) -> Self {
        Self {
            microservice: microservice.into(),
            endpoints: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, address: impl Into<String>) {
        self.endpoints.insert(name.into(), address.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.endpoints.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Endpoint maps of the builders constructed so far.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    maps: BTreeMap<String, EndpointMap>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any map previously registered for the same microservice.
    pub fn register(&mut self, map: EndpointMap) {
        self.maps.insert(map.microservice.clone(), map);
    }

    pub fn get(&self, microservice: &str) -> Option<&EndpointMap> {
        self.maps.get(microservice)
    }

    pub fn resolve(&self, microservice: &str, endpoint: &str) -> Result<String> {
        self.maps
            .get(microservice)
            .and_then(|m| m.get(endpoint))
            .map(str::to_string)
            .ok_or_else(|| DeployError::unknown_endpoint(microservice, endpoint))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointMap> {
        self.maps.values()
    }
}

impl FromIterator<EndpointMap> for EndpointRegistry {
    fn from_iter<I: IntoIterator<Item = EndpointMap>>(iter: I) -> Self {
        let mut registry = Self::new();
        for map in iter {
            registry.register(map);
        }
        registry
    }
}
