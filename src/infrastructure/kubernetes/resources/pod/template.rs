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

use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};

/// A user-supplied pod split into its main container and everything else.
#[derive(Debug, Clone)]
pub struct PumpwoodPod {
    pod_without_main_container: Pod,
    main_container: Container,
}

impl PumpwoodPod {
    pub fn new(pod: Pod, main_container_name: &str) -> Self {
        let mut pod_without_main = pod;
        let mut main_container = None;

        match pod_without_main.spec {
            Some(ref mut spec) => {
                let containers = std::mem::take(&mut spec.containers);
                for container in containers {
                    if container.name == main_container_name && main_container.is_none() {
                        main_container = Some(container);
                    } else {
                        spec.containers.push(container);
                    }
                }
            }
            None => pod_without_main.spec = Some(PodSpec::default()),
        }

        let main = main_container.unwrap_or_else(|| Container {
            name: main_container_name.to_string(),
            ..Default::default()
        });

        Self {
            pod_without_main_container: pod_without_main,
            main_container: main,
        }
    }

    pub fn get_pod_without_main_container(&self) -> &Pod {
        &self.pod_without_main_container
    }

    pub fn get_main_container(&self) -> &Container {
        &self.main_container
    }

    pub fn into_parts(self) -> (Pod, Container) {
        (self.pod_without_main_container, self.main_container)
    }

    pub fn build_pod(&self) -> Pod {
        let mut pod = self.pod_without_main_container.clone();
        if let Some(ref mut spec) = pod.spec {
            spec.containers.push(self.main_container.clone());
        }
        pod
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(name: &str) -> Container {
        Container {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_splits_main_container() {
        let pod = Pod {
            spec: Some(PodSpec {
                containers: vec![container("sidecar"), container("app")],
                ..Default::default()
            }),
            ..Default::default()
        };

        let pumpwood_pod = PumpwoodPod::new(pod, "app");
        assert_eq!(pumpwood_pod.get_main_container().name, "app");
        let rest = pumpwood_pod.get_pod_without_main_container();
        assert_eq!(rest.spec.as_ref().unwrap().containers.len(), 1);

        let rebuilt = pumpwood_pod.build_pod();
        let names: Vec<_> = rebuilt
            .spec
            .unwrap()
            .containers
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["sidecar", "app"]);
    }

    #[test]
    fn test_missing_spec_gets_empty_main() {
        let pumpwood_pod = PumpwoodPod::new(Pod::default(), "worker");
        assert_eq!(pumpwood_pod.get_main_container().name, "worker");
        assert!(pumpwood_pod.get_pod_without_main_container().spec.is_some());
    }
}
