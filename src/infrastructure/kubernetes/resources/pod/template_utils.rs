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
use k8s_openapi::api::core::v1::Pod;
use std::path::Path;

/// Load a pod template whose main container must be named `main_container_name`.
///
/// The path is used as given; callers resolve it against the configured
/// template directory first.
pub fn load_pod_from_template_file(
    path: &Path,
    main_container_name: &str,
) -> Result<PumpwoodPod> {
    if !path.exists() {
        return Err(DeployError::ConfigError(format!(
            "Pod template file does not exist: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        DeployError::ConfigError(format!(
            "Failed to read pod template file {}: {}",
            path.display(),
            e
        ))
    })?;

    let pod: Pod = serde_yaml::from_str(&content).map_err(|e| {
        DeployError::ConfigError(format!(
            "Failed to parse pod template file {}: {}",
            path.display(),
            e
        ))
    })?;

    let Some(ref spec) = pod.spec else {
        return Err(DeployError::ConfigError(format!(
            "Pod template file {} is missing spec section",
            path.display()
        )));
    };

    let container_names: Vec<&str> = spec.containers.iter().map(|c| c.name.as_str()).collect();
    if !container_names.contains(&main_container_name) {
        return Err(DeployError::ConfigError(format!(
            "\n Container name mismatch in Pod template\n\
            \n  Expected container name: '{}'\n\
            Found container names: {}\n\
            \n  containers:\n\
            - name: {}  # Must match the deployment component\n\
            \n  File: {}",
            main_container_name,
            container_names.join(", "),
            main_container_name,
            path.display()
        )));
    }

    Ok(PumpwoodPod::new(pod, main_container_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TEMPLATE: &str = r#"
apiVersion: v1
kind: Pod
metadata:
  labels:
    team: data
spec:
  nodeSelector:
    pool: workers
  containers:
    - name: app
      env:
        - name: LOG_LEVEL
          value: debug
"#;

    #[test]
    fn test_load_template() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TEMPLATE.as_bytes()).unwrap();

        let pod = load_pod_from_template_file(file.path(), "app").unwrap();
        assert_eq!(pod.get_main_container().name, "app");
        let rest = pod.get_pod_without_main_container();
        assert!(rest.spec.as_ref().unwrap().node_selector.is_some());
    }

    #[test]
    fn test_container_name_mismatch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TEMPLATE.as_bytes()).unwrap();

        let err = load_pod_from_template_file(file.path(), "worker").unwrap_err();
        assert!(err.to_string().contains("Container name mismatch"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_pod_from_template_file(Path::new("/nonexistent/pod.yaml"), "app")
            .unwrap_err();
        assert!(matches!(err, DeployError::ConfigError(_)));
    }
}
