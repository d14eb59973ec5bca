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

use crate::infrastructure::constants::{
    LABEL_APP, LABEL_COMPONENT, LABEL_MANAGED_BY, LABEL_MANAGED_BY_VALUE,
};
use crate::shared::error::Result;
use k8s_openapi::api::core::v1::Pod;
use std::collections::BTreeMap;
use std::path::Path;

pub trait PodBuilder {
    fn component_name(&self) -> &str;
    fn microservice(&self) -> &str;
    fn get_labels(&self) -> BTreeMap<String, String> {
        let mut labels = self.get_selector_labels();
        labels.insert(
            LABEL_MANAGED_BY.to_string(),
            LABEL_MANAGED_BY_VALUE.to_string(),
        );
        labels
    }

    fn get_selector_labels(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert(LABEL_APP.to_string(), self.microservice().to_string());
        labels.insert(
            LABEL_COMPONENT.to_string(),
            self.component_name().to_string(),
        );
        labels
    }

    fn build_base_pod(&self) -> Result<Pod>;

    fn pod_template_path(&self) -> Option<&Path>;

    fn main_container_name(&self) -> String;
}

/// Labels shared by resources that are not pods (secrets, services, ingresses).
pub fn resource_labels(microservice: &str, component: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(LABEL_APP.to_string(), microservice.to_string());
    labels.insert(LABEL_COMPONENT.to_string(), component.to_string());
    labels.insert(
        LABEL_MANAGED_BY.to_string(),
        LABEL_MANAGED_BY_VALUE.to_string(),
    );
    labels
}
