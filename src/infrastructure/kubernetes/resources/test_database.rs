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

use crate::domain::artifact::join_documents;
use crate::domain::config::{DeploymentSpec, PlatformContext, TestDatabaseSpec};
use crate::infrastructure::constants::{COMPONENT_TEST_DB, TEST_DB_IMAGE_PREFIX, TEST_DB_PORT_NAME};
use crate::infrastructure::kubernetes::resources::{DeploymentBuilder, ServiceBuilder};
use crate::shared::error::Result;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;

/// Throw-away database deployment used by integration environments.
///
/// Renders to a Deployment and a ClusterIP Service named `<microservice>-test-db`.
pub struct TestDatabaseBuilder {
    microservice: String,
    context: PlatformContext,
    spec: TestDatabaseSpec,
    version: String,
}

impl TestDatabaseBuilder {
    pub fn new(
        microservice: impl Into<String>,
        spec: &TestDatabaseSpec,
        context: &PlatformContext,
        version: impl Into<String>,
    ) -> Self {
        Self {
            microservice: microservice.into(),
            context: context.clone(),
            spec: spec.clone(),
            version: version.into(),
        }
    }

    pub fn name(&self) -> String {
        format!("{}-{}", self.microservice, COMPONENT_TEST_DB)
    }

    pub fn image(&self) -> String {
        let image = self
            .spec
            .image
            .clone()
            .unwrap_or_else(|| format!("{}{}", TEST_DB_IMAGE_PREFIX, self.microservice));
        format!("{}/{}:{}", self.context.repository, image, self.version)
    }

    pub fn build(&self) -> Result<(Deployment, Service)> {
        let deployment_spec = DeploymentSpec {
            component: COMPONENT_TEST_DB.to_string(),
            image: self.image(),
            port: Some(self.spec.port),
            ..Default::default()
        };

        let deployment =
            DeploymentBuilder::new(&self.microservice, &deployment_spec, &self.context, self.image())
                .with_port_name(TEST_DB_PORT_NAME)
                .build()?;

        let service = ServiceBuilder::new(
            self.name(),
            &self.microservice,
            COMPONENT_TEST_DB,
            &self.context.namespace,
            self.spec.port,
        )
        .with_port_name(TEST_DB_PORT_NAME)
        .build()?;

        Ok((deployment, service))
    }

    /// Both resources as one multi-document YAML string.
    pub fn render(&self) -> Result<String> {
        let (deployment, service) = self.build()?;
        Ok(join_documents(&[
            serde_yaml::to_string(&deployment)?,
            serde_yaml::to_string(&service)?,
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_two_documents() {
        let builder = TestDatabaseBuilder::new(
            "pumpwood-auth",
            &TestDatabaseSpec::default(),
            &PlatformContext::default(),
            "0.3",
        );
        assert_eq!(builder.image(), "docker.io/pumpwood/test-db-pumpwood-auth:0.3");

        let content = builder.render().unwrap();
        let docs: Vec<serde_yaml::Value> = serde_yaml::Deserializer::from_str(&content)
            .map(|doc| serde::Deserialize::deserialize(doc).unwrap())
            .collect();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["kind"], "Deployment");
        assert_eq!(docs[0]["metadata"]["name"], "pumpwood-auth-test-db");
        assert_eq!(docs[1]["kind"], "Service");
        assert_eq!(docs[1]["spec"]["ports"][0]["port"], 5432);
    }
}
