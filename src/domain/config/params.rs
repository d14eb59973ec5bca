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

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::shared::error::{DeployError, Result};

/// Parameter values supplied for one microservice, keyed by field name.
///
/// A field counts as set only when it is present and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeployParams(BTreeMap<String, String>);

impl DeployParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn is_set(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn require(&self, microservice: &str, field: &str) -> Result<&str> {
        self.get(field)
            .ok_or_else(|| DeployError::missing_field(microservice, field))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DeployParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_value_is_not_set() {
        let params = DeployParams::new()
            .with("app_version", "1.0")
            .with("test_db_version", "");

        assert!(params.is_set("app_version"));
        assert!(!params.is_set("test_db_version"));
        assert!(!params.is_set("bucket_name"));
    }

    #[test]
    fn test_require_reports_field() {
        let params = DeployParams::new();
        match params.require("pumpwood-auth", "db_password") {
            Err(DeployError::MissingField { microservice, field }) => {
                assert_eq!(microservice, "pumpwood-auth");
                assert_eq!(field, "db_password");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
