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

use crate::domain::artifact::{ArtifactDescriptor, ArtifactKind};
use crate::domain::config::{
    DeployParams, DeploymentSpec, EnvSource, IngressSpec, MicroserviceSpec, PlatformContext,
    ServiceSpec,
};
use crate::domain::endpoints::{
    EndpointMap, EndpointRegistry, ENDPOINT_EXTERNAL, ENDPOINT_INTERNAL, ENDPOINT_LOAD_BALANCER,
};
use crate::infrastructure::constants::{
    ARTIFACT_SUFFIX_INGRESS, ARTIFACT_SUFFIX_SECRETS, ARTIFACT_SUFFIX_SERVICE,
    ARTIFACT_SUFFIX_TEST_DB,
};
use crate::infrastructure::kubernetes::resources::pod::EnvValue;
use crate::infrastructure::kubernetes::resources::{
    DeploymentBuilder, IngressBuilder, SecretBuilder, ServiceBuilder, TestDatabaseBuilder,
};
use crate::infrastructure::templates::{TemplateContext, TemplateStore};
use crate::shared::error::{DeployError, Result};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Renders the manifests of one microservice.
pub trait ManifestBuilder {
    fn microservice(&self) -> &str;

    /// Ordered artifacts: secret, deployments, service, ingress, raw templates
    /// and the test database last.
    fn create_deployment_file(&self) -> Result<Vec<ArtifactDescriptor>>;

    /// Addresses other microservices may reference.
    fn end_points(&self) -> EndpointMap;
}

/// Manifest builder driven by a [`MicroserviceSpec`].
#[derive(Debug, Clone)]
pub struct MicroserviceBuilder {
    spec: MicroserviceSpec,
    params: DeployParams,
    context: PlatformContext,
    resolved_endpoints: BTreeMap<(String, String), String>,
    env_overrides: BTreeMap<String, String>,
}

impl MicroserviceBuilder {
    /// Checks the spec and the parameters up front; rendering can then only
    /// fail on template I/O.
    pub fn new(
        spec: MicroserviceSpec,
        params: DeployParams,
        context: &PlatformContext,
        registry: &EndpointRegistry,
    ) -> Result<Self> {
        spec.validate()?;

        for field in &spec.required {
            params.require(&spec.name, field)?;
        }
        for secret in &spec.secret {
            params.require(&spec.name, &secret.field)?;
        }
        for deployment in spec.deployments.iter() {
            if is_triggered(&params, deployment.trigger.as_deref()) {
                params.require(&spec.name, &deployment.version_field)?;
            }
        }

        for field in params.fields() {
            if !spec.declares(field) {
                warn!("{}: ignoring unknown parameter '{}'", spec.name, field);
            }
        }

        let mut resolved_endpoints = BTreeMap::new();
        for deployment in &spec.deployments {
            for env in &deployment.env {
                if let EnvSource::Endpoint {
                    ref microservice,
                    ref endpoint,
                } = env.source
                {
                    if microservice == &spec.name {
                        return Err(DeployError::ConfigError(format!(
                            "{}: env '{}' references its own endpoint '{}'",
                            spec.name, env.name, endpoint
                        )));
                    }
                    let address = registry.resolve(microservice, endpoint)?;
                    resolved_endpoints.insert((microservice.clone(), endpoint.clone()), address);
                }
            }
        }

        info!(
            "Configured {} ({} deployments, namespace {})",
            spec.name,
            spec.deployments.len(),
            context.namespace
        );

        Ok(Self {
            spec,
            params,
            context: context.clone(),
            resolved_endpoints,
            env_overrides: BTreeMap::new(),
        })
    }

    /// Extra environment variables added to every deployment, last wins.
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env_overrides = env;
        self
    }

    pub fn spec(&self) -> &MicroserviceSpec {
        &self.spec
    }

    pub fn params(&self) -> &DeployParams {
        &self.params
    }

    fn artifact_name(&self, suffix: &str) -> String {
        format!("{}__{}", self.spec.name, suffix)
    }

    fn render_secret(&self) -> Result<ArtifactDescriptor> {
        let mut builder =
            SecretBuilder::new(self.spec.secret_name(), &self.spec.name, &self.context.namespace);
        for entry in &self.spec.secret {
            let value = self.params.require(&self.spec.name, &entry.field)?;
            builder = builder.with_entry(&entry.key, value);
        }

        ArtifactDescriptor::from_resource(
            ArtifactKind::SecretsFile,
            self.artifact_name(ARTIFACT_SUFFIX_SECRETS),
            &builder.build()?,
        )
    }

    fn deployment_env(&self, deployment: &DeploymentSpec) -> Result<Vec<(String, EnvValue)>> {
        let mut vars = Vec::with_capacity(deployment.env.len());
        for env in &deployment.env {
            let value = match env.source {
                EnvSource::Value { ref value } => EnvValue::Literal(value.clone()),
                EnvSource::Field {
                    ref field,
                    ref default,
                } => match self.params.get(field).map(str::to_string).or(default.clone()) {
                    Some(value) => EnvValue::Literal(value),
                    None => continue,
                },
                EnvSource::Secret { ref key } => EnvValue::SecretKey {
                    secret: self.spec.secret_name(),
                    key: key.clone(),
                },
                EnvSource::Endpoint {
                    ref microservice,
                    ref endpoint,
                } => {
                    let address = self
                        .resolved_endpoints
                        .get(&(microservice.clone(), endpoint.clone()))
                        .ok_or_else(|| DeployError::unknown_endpoint(microservice, endpoint))?;
                    EnvValue::Literal(address.clone())
                }
                EnvSource::PodField { ref path } => EnvValue::PodField(path.clone()),
            };
            vars.push((env.name.clone(), value));
        }
        Ok(vars)
    }

    fn render_deployment(&self, deployment: &DeploymentSpec) -> Result<ArtifactDescriptor> {
        let version = self
            .params
            .require(&self.spec.name, &deployment.version_field)?;
        let image = format!("{}/{}:{}", self.context.repository, deployment.image, version);
        let pod_template = deployment
            .pod_template
            .as_deref()
            .map(|file| self.context.template_path(file))
            .transpose()?;

        let resource = DeploymentBuilder::new(&self.spec.name, deployment, &self.context, image)
            .with_env(self.deployment_env(deployment)?)
            .with_custom_env(&self.env_overrides)
            .with_pod_template(pod_template)
            .build()?;

        Ok(ArtifactDescriptor::from_resource(
            ArtifactKind::Deploy,
            self.artifact_name(&deployment.component),
            &resource,
        )?
        .with_sleep(deployment.sleep))
    }

    fn service_builder(&self, service: &ServiceSpec) -> ServiceBuilder {
        let target_port = service.target_port.or_else(|| {
            self.spec
                .deployment(&service.component)
                .and_then(|d| d.port)
        });

        ServiceBuilder::new(
            &self.spec.name,
            &self.spec.name,
            &service.component,
            &self.context.namespace,
            service.port,
        )
        .with_config(
            service.service_type,
            target_port,
            self.load_balancer_ip(service),
            service.annotations.clone(),
        )
    }

    fn load_balancer_ip(&self, service: &ServiceSpec) -> Option<String> {
        service
            .load_balancer_ip_field
            .as_deref()
            .and_then(|field| self.params.get(field))
            .map(str::to_string)
    }

    fn ingress_builder(&self, ingress: &IngressSpec, service: &ServiceSpec) -> IngressBuilder {
        let host = ingress
            .host_field
            .as_deref()
            .and_then(|field| self.params.get(field))
            .map(str::to_string);

        IngressBuilder::new(
            &self.spec.name,
            &self.spec.name,
            &self.context.namespace,
            ingress,
        )
        .with_backend(&self.spec.name, service.port)
        .with_host(host)
    }

    /// The ingress renders only together with a service and when its trigger is set.
    fn active_ingress(&self) -> Option<(&IngressSpec, &ServiceSpec)> {
        let ingress = self.spec.ingress.as_ref()?;
        let service = self.spec.service.as_ref()?;
        is_triggered(&self.params, ingress.trigger.as_deref()).then_some((ingress, service))
    }

    fn template_context(&self) -> TemplateContext {
        let mut context: TemplateContext = self
            .params
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        context.insert("microservice".to_string(), self.spec.name.clone());
        context.insert("namespace".to_string(), self.context.namespace.clone());
        context.insert("repository".to_string(), self.context.repository.clone());
        context
    }
}

impl ManifestBuilder for MicroserviceBuilder {
    fn microservice(&self) -> &str {
        &self.spec.name
    }

    fn create_deployment_file(&self) -> Result<Vec<ArtifactDescriptor>> {
        let mut artifacts = Vec::new();

        if !self.spec.secret.is_empty() {
            artifacts.push(self.render_secret()?);
        }

        for deployment in &self.spec.deployments {
            if is_triggered(&self.params, deployment.trigger.as_deref()) {
                artifacts.push(self.render_deployment(deployment)?);
            }
        }

        if let Some(ref service) = self.spec.service {
            artifacts.push(ArtifactDescriptor::from_resource(
                ArtifactKind::Service,
                self.artifact_name(ARTIFACT_SUFFIX_SERVICE),
                &self.service_builder(service).build()?,
            )?);
        }

        if let Some((ingress, service)) = self.active_ingress() {
            artifacts.push(ArtifactDescriptor::from_resource(
                ArtifactKind::Ingress,
                self.artifact_name(ARTIFACT_SUFFIX_INGRESS),
                &self.ingress_builder(ingress, service).build()?,
            )?);
        }

        let active_templates: Vec<_> = self
            .spec
            .raw_templates
            .iter()
            .filter(|t| is_triggered(&self.params, t.trigger.as_deref()))
            .collect();
        if !active_templates.is_empty() {
            let store = TemplateStore::new(&self.context);
            let context = self.template_context();
            for template in active_templates {
                let content = store.render(&template.file, &context)?;
                artifacts.push(
                    ArtifactDescriptor::new(
                        template.kind,
                        self.artifact_name(&template.name),
                        content,
                    )
                    .with_sleep(template.sleep),
                );
            }
        }

        if let Some(ref database) = self.spec.test_database {
            if let Some(version) = self.params.get(&database.version_field) {
                let builder =
                    TestDatabaseBuilder::new(&self.spec.name, database, &self.context, version);
                artifacts.push(
                    ArtifactDescriptor::new(
                        ArtifactKind::Deploy,
                        self.artifact_name(ARTIFACT_SUFFIX_TEST_DB),
                        builder.render()?,
                    )
                    .with_sleep(database.sleep),
                );
            }
        }

        for artifact in &artifacts {
            debug!(
                "Rendered {} ({}, {} bytes)",
                artifact.name,
                artifact.kind,
                artifact.content.len()
            );
        }
        info!("Rendered {} artifacts for {}", artifacts.len(), self.spec.name);

        Ok(artifacts)
    }

    fn end_points(&self) -> EndpointMap {
        let mut map = EndpointMap::new(&self.spec.name);

        if let Some(ref service) = self.spec.service {
            map.insert(
                ENDPOINT_INTERNAL,
                format!(
                    "http://{}.{}.svc.{}:{}",
                    self.spec.name, self.context.namespace, self.context.cluster_domain, service.port
                ),
            );
            if let Some(ip) = self.load_balancer_ip(service) {
                map.insert(
                    ENDPOINT_LOAD_BALANCER,
                    format!("http://{}:{}", ip, service.port),
                );
            }
        }

        if let Some((ingress, service)) = self.active_ingress() {
            map.insert(ENDPOINT_EXTERNAL, self.ingress_builder(ingress, service).url());
        }

        for endpoint in &self.spec.endpoints {
            if let Some(host) = self.params.get(&endpoint.host_field) {
                let port = endpoint.port.map(|p| format!(":{}", p)).unwrap_or_default();
                map.insert(
                    &endpoint.name,
                    format!("{}://{}{}{}", endpoint.scheme, host, port, endpoint.path),
                );
            }
        }

        map
    }
}

/// An item without a trigger is always rendered.
fn is_triggered(params: &DeployParams, trigger: Option<&str>) -> bool {
    trigger.map_or(true, |field| params.is_set(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog;
    use crate::domain::config::{EnvSpec, RawTemplateSpec};

    fn auth_params() -> DeployParams {
        DeployParams::new()
            .with("db_password", "db-pass")
            .with("microservice_password", "ms-pass")
            .with("secret_key", "key")
            .with("app_version", "1.0.0")
    }

    fn auth() -> MicroserviceBuilder {
        MicroserviceBuilder::new(
            catalog::auth(),
            auth_params(),
            &PlatformContext::default(),
            &EndpointRegistry::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_order_and_names() {
        let names: Vec<_> = auth()
            .create_deployment_file()
            .unwrap()
            .into_iter()
            .map(|a| (a.kind, a.name))
            .collect();
        assert_eq!(
            names,
            vec![
                (ArtifactKind::SecretsFile, "pumpwood-auth__secrets".to_string()),
                (ArtifactKind::Deploy, "pumpwood-auth__app".to_string()),
                (ArtifactKind::Service, "pumpwood-auth__service".to_string()),
                (ArtifactKind::Ingress, "pumpwood-auth__ingress".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_required_field() {
        let params = auth_params().with("app_version", "");
        let err = MicroserviceBuilder::new(
            catalog::auth(),
            params,
            &PlatformContext::default(),
            &EndpointRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DeployError::MissingField { ref field, .. } if field == "app_version"
        ));
    }

    #[test]
    fn test_unknown_params_are_accepted() {
        let params = auth_params().with("not_a_field", "x");
        assert!(MicroserviceBuilder::new(
            catalog::auth(),
            params,
            &PlatformContext::default(),
            &EndpointRegistry::new(),
        )
        .is_ok());
    }

    #[test]
    fn test_end_points() {
        let endpoints = auth().end_points();
        assert_eq!(
            endpoints.get(ENDPOINT_INTERNAL),
            Some("http://pumpwood-auth.default.svc.cluster.local:5000")
        );
        assert_eq!(endpoints.get(ENDPOINT_EXTERNAL), Some("/rest/registration/"));
        assert!(endpoints.get(ENDPOINT_LOAD_BALANCER).is_none());
    }

    #[test]
    fn test_endpoint_env_needs_registered_map() {
        let params = DeployParams::new()
            .with("microservice_password", "x")
            .with("app_version", "1")
            .with("worker_version", "1");

        let err = MicroserviceBuilder::new(
            catalog::estimation(),
            params.clone(),
            &PlatformContext::default(),
            &EndpointRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::UnknownEndpoint { .. }));

        let registry: EndpointRegistry = vec![auth().end_points()].into_iter().collect();
        let builder = MicroserviceBuilder::new(
            catalog::estimation(),
            params,
            &PlatformContext::default(),
            &registry,
        )
        .unwrap();
        let artifacts = builder.create_deployment_file().unwrap();
        assert!(artifacts[1]
            .content
            .contains("http://pumpwood-auth.default.svc.cluster.local:5000"));
    }

    #[test]
    fn test_self_endpoint_rejected() {
        let mut spec = catalog::auth();
        spec.deployments[0]
            .env
            .push(EnvSpec::endpoint("SELF", "pumpwood-auth", ENDPOINT_INTERNAL));
        let err = MicroserviceBuilder::new(
            spec,
            auth_params(),
            &PlatformContext::default(),
            &EndpointRegistry::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("its own endpoint"));
    }

    #[test]
    fn test_env_overrides_reach_every_deployment() {
        let mut overrides = BTreeMap::new();
        overrides.insert("DEBUG".to_string(), "TRUE".to_string());
        let artifacts = auth().with_env(overrides).create_deployment_file().unwrap();
        assert!(artifacts[1].content.contains("DEBUG"));
    }

    #[test]
    fn test_raw_template_treats_empty_field_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("db-conf.yaml"),
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: {microservice}-db\ndata:\n  host: {db_host!q}\n",
        )
        .unwrap();

        let mut spec = catalog::auth();
        spec.raw_templates.push(RawTemplateSpec {
            name: "db-conf".to_string(),
            kind: ArtifactKind::ConfigMap,
            file: "db-conf.yaml".to_string(),
            trigger: None,
            sleep: None,
        });
        let context = PlatformContext {
            template_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let build = |params: DeployParams| {
            MicroserviceBuilder::new(spec.clone(), params, &context, &EndpointRegistry::new())
                .unwrap()
                .create_deployment_file()
        };

        let artifacts = build(auth_params().with("db_host", "db.internal")).unwrap();
        let conf = artifacts
            .iter()
            .find(|a| a.name == "pumpwood-auth__db-conf")
            .unwrap();
        assert!(conf.content.contains("host: \"db.internal\""));

        for params in [auth_params(), auth_params().with("db_host", "")] {
            match build(params) {
                Err(DeployError::TemplateRender { reason, .. }) => {
                    assert!(reason.contains("db_host"), "{}", reason)
                }
                other => panic!("expected a render error, got {:?}", other),
            }
        }
    }
}
