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

use crate::infrastructure::constants::{COMPONENT_SECRETS, SECRET_TYPE_OPAQUE};
use crate::infrastructure::kubernetes::resources::pod::resource_labels;
use crate::shared::error::Result;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

/// Opaque secret holding the sensitive parameters of one microservice.
pub struct SecretBuilder {
    name: String,
    microservice: String,
    namespace: String,
    data: BTreeMap<String, String>,
}

impl SecretBuilder {
    pub fn new(
        name: impl Into<String>,
        microservice: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            microservice: microservice.into(),
            namespace: namespace.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn build(&self) -> Result<Secret> {
        let data = self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), ByteString(v.as_bytes().to_vec())))
            .collect();

        Ok(Secret {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: Some(self.get_labels()),
                ..Default::default()
            },
            type_: Some(SECRET_TYPE_OPAQUE.to_string()),
            data: Some(data),
            ..Default::default()
        })
    }

    pub fn get_labels(&self) -> BTreeMap<String, String> {
        resource_labels(&self.microservice, COMPONENT_SECRETS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_base64_encoded() {
        let secret = SecretBuilder::new("pumpwood-auth-secrets", "pumpwood-auth", "default")
            .with_entry("db_password", "s3cr3t: \"quoted\"")
            .build()
            .unwrap();

        assert_eq!(secret.type_.as_deref(), Some("Opaque"));
        let yaml = serde_yaml::to_string(&secret).unwrap();
        assert!(yaml.contains("kind: Secret"));
        assert!(!yaml.contains("s3cr3t"));

        let parsed: Secret = serde_yaml::from_str(&yaml).unwrap();
        let value = parsed.data.unwrap().remove("db_password").unwrap();
        assert_eq!(value.0, b"s3cr3t: \"quoted\"".to_vec());
    }
}
