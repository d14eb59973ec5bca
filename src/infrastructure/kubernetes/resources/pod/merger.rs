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

use crate::infrastructure::kubernetes::resources::pod::template::PumpwoodPod;
use crate::shared::error::{DeployError, Result};
use k8s_openapi::api::core::v1::{Container, Pod, VolumeMount};
use std::collections::{BTreeMap, HashSet};

/// Overlay a generated pod onto an optional user template.
///
/// Builder env wins on name clashes, everything else the template sets is kept
/// and only filled in from the builder when absent.
pub fn merge_pod_with_template(
    template_pod: Option<PumpwoodPod>,
    builder_pod: Pod,
    builder_labels: BTreeMap<String, String>,
) -> Result<Pod> {
    match template_pod {
        Some(template) => merge_with_template_impl(template, builder_pod, builder_labels),
        None => Ok(builder_pod),
    }
}

fn merge_with_template_impl(
    template: PumpwoodPod,
    builder_pod: Pod,
    builder_labels: BTreeMap<String, String>,
) -> Result<Pod> {
    let (mut final_pod, mut main) = template.into_parts();

    final_pod
        .metadata
        .labels
        .get_or_insert_with(BTreeMap::new)
        .extend(builder_labels);

    let template_volumes: HashSet<String> = final_pod
        .spec
        .as_ref()
        .and_then(|s| s.volumes.as_ref())
        .map(|vols| vols.iter().map(|v| v.name.clone()).collect())
        .unwrap_or_default();
    validate_volume_mounts(
        &main.name,
        main.volume_mounts.as_deref().unwrap_or_default(),
        &template_volumes,
    )?;

    let builder_spec = builder_pod.spec.unwrap_or_default();
    let builder_container = builder_spec
        .containers
        .into_iter()
        .next()
        .unwrap_or_default();

    merge_main_container(&mut main, builder_container);

    if let Some(ref mut spec) = final_pod.spec {
        if spec.image_pull_secrets.is_none() {
            spec.image_pull_secrets = builder_spec.image_pull_secrets;
        }
        if spec.restart_policy.is_none() {
            spec.restart_policy = builder_spec.restart_policy;
        }
        spec.containers.push(main);
    }

    Ok(final_pod)
}

fn merge_main_container(main: &mut Container, builder: Container) {
    let mut merged_env = main.env.take().unwrap_or_default();
    for builder_env_var in builder.env.unwrap_or_default() {
        match merged_env.iter_mut().find(|e| e.name == builder_env_var.name) {
            Some(existing) => *existing = builder_env_var,
            None => merged_env.push(builder_env_var),
        }
    }
    main.env = Some(merged_env);

    // Image and ports always follow the deployment spec.
    main.image = builder.image;
    main.image_pull_policy = builder.image_pull_policy;
    if builder.ports.is_some() {
        main.ports = builder.ports;
    }

    if main.args.is_none() {
        main.args = builder.args;
    }

    if main
        .resources
        .as_ref()
        .map_or(true, |r| r.requests.is_none() && r.limits.is_none())
    {
        main.resources = builder.resources;
    }

    if main.liveness_probe.is_none() {
        main.liveness_probe = builder.liveness_probe;
    }

    if main.readiness_probe.is_none() {
        main.readiness_probe = builder.readiness_probe;
    }

    if main.lifecycle.is_none() {
        main.lifecycle = builder.lifecycle;
    }
}

fn validate_volume_mounts(
    container: &str,
    mounts: &[VolumeMount],
    volumes: &HashSet<String>,
) -> Result<()> {
    let mut seen_paths = HashSet::new();
    for mount in mounts {
        if !volumes.contains(&mount.name) {
            return Err(DeployError::ConfigError(format!(
                "\n Volume mount refers to an undeclared volume in Pod template\n\
                \n  Container: '{}'\n\
                Volume Name: '{}'\n\
                mountPath: '{}'\n\
                \n Declare the volume under spec.volumes or remove the mount.\n",
                container, mount.name, mount.mount_path
            )));
        }
        if !seen_paths.insert(mount.mount_path.as_str()) {
            return Err(DeployError::ConfigError(format!(
                "Volume mount path '{}' is used more than once in container '{}'",
                mount.mount_path, container
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{EnvVar, PodSpec, Volume};

    fn env(name: &str, value: &str) -> EnvVar {
        EnvVar {
            name: name.to_string(),
            value: Some(value.to_string()),
            ..Default::default()
        }
    }

    fn builder_pod() -> Pod {
        Pod {
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "app".to_string(),
                    image: Some("docker.io/pumpwood/pumpwood-auth-app:1.0".to_string()),
                    env: Some(vec![env("DEBUG", "FALSE"), env("MICROSERVICE_NAME", "auth")]),
                    ..Default::default()
                }],
                restart_policy: Some("Always".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn template(mounts: Vec<VolumeMount>, volumes: Vec<Volume>) -> PumpwoodPod {
        let pod = Pod {
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "app".to_string(),
                    env: Some(vec![env("DEBUG", "TRUE"), env("LOG_LEVEL", "debug")]),
                    volume_mounts: Some(mounts),
                    ..Default::default()
                }],
                volumes: Some(volumes),
                ..Default::default()
            }),
            ..Default::default()
        };
        PumpwoodPod::new(pod, "app")
    }

    #[test]
    fn test_without_template_returns_builder_pod() {
        let pod = merge_pod_with_template(None, builder_pod(), BTreeMap::new()).unwrap();
        assert_eq!(pod, builder_pod());
    }

    #[test]
    fn test_builder_env_overrides_template() {
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), "pumpwood-auth".to_string());

        let pod = merge_pod_with_template(
            Some(template(vec![], vec![])),
            builder_pod(),
            labels,
        )
        .unwrap();

        let container = &pod.spec.as_ref().unwrap().containers[0];
        let env = container.env.as_ref().unwrap();
        let debug = env.iter().find(|e| e.name == "DEBUG").unwrap();
        assert_eq!(debug.value.as_deref(), Some("FALSE"));
        assert!(env.iter().any(|e| e.name == "LOG_LEVEL"));
        assert!(container.image.as_ref().unwrap().ends_with(":1.0"));
        assert_eq!(
            pod.metadata.labels.unwrap().get("app").map(String::as_str),
            Some("pumpwood-auth")
        );
        assert_eq!(pod.spec.unwrap().restart_policy.as_deref(), Some("Always"));
    }

    #[test]
    fn test_mount_without_volume_rejected() {
        let mount = VolumeMount {
            name: "cache".to_string(),
            mount_path: "/cache".to_string(),
            ..Default::default()
        };
        let err = merge_pod_with_template(
            Some(template(vec![mount], vec![])),
            builder_pod(),
            BTreeMap::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("undeclared volume"));
    }

    #[test]
    fn test_duplicate_mount_path_rejected() {
        let volume = Volume {
            name: "cache".to_string(),
            ..Default::default()
        };
        let mount = VolumeMount {
            name: "cache".to_string(),
            mount_path: "/cache".to_string(),
            ..Default::default()
        };
        let err = merge_pod_with_template(
            Some(template(vec![mount.clone(), mount], vec![volume])),
            builder_pod(),
            BTreeMap::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }
}
