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

use crate::domain::config::platform::PlatformConf;
use crate::shared::error::{DeployError, Result};
use std::collections::{BTreeMap, HashMap};

/// Applies `-D key=value` overrides onto a loaded platform configuration.
///
/// Platform keys live under `platform.`; anything else is
/// `<microservice>.<field>` or `<microservice>.env.<VAR>` for a configured entry.
pub fn apply_to_platform_conf(configs: &HashMap<String, String>, conf: &mut PlatformConf) -> Result<()> {
    // sorted so repeated runs apply overrides in the same order
    let sorted: BTreeMap<&String, &String> = configs.iter().collect();

    for (key, value) in sorted {
        if let Some(platform_key) = key.strip_prefix("platform.") {
            apply_platform_key(platform_key, value, conf)?;
            continue;
        }

        let (microservice, rest) = key.split_once('.').ok_or_else(|| {
            DeployError::ConfigError(format!(
                "Invalid override key '{}'. Expected 'platform.<key>' or '<microservice>.<field>'",
                key
            ))
        })?;

        let entry = conf.entry_mut(microservice).ok_or_else(|| {
            DeployError::ConfigError(format!(
                "Override '{}' targets microservice '{}' which is not configured",
                key, microservice
            ))
        })?;

        if let Some(env_name) = rest.strip_prefix("env.") {
            entry.env.insert(env_name.to_string(), value.clone());
        } else {
            entry.parameters.insert(rest, value.clone());
        }
    }

    Ok(())
}

fn apply_platform_key(key: &str, value: &str, conf: &mut PlatformConf) -> Result<()> {
    match key {
        "namespace" => conf.namespace = value.to_string(),
        "repository" => conf.repository = value.to_string(),
        "cluster-domain" => conf.cluster_domain = value.to_string(),
        "image.pull-policy" => conf.image_pull_policy = value.to_string(),
        "image.pull-secrets" => conf.image_pull_secrets = parse_list(value),
        "template-dir" => conf.template_dir = Some(value.to_string()),
        "output-dir" => conf.output_dir = value.to_string(),
        "kubectl.binary" => conf.kubectl.binary = value.to_string(),
        "kubectl.context" => conf.kubectl.context = Some(value.to_string()),
        "kubectl.work-dir" => conf.kubectl.work_dir = value.to_string(),
        _ => {
            return Err(DeployError::ConfigError(format!(
                "Unknown platform override: platform.{}",
                key
            )))
        }
    }
    Ok(())
}

fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse dynamic configuration properties from -D key=value format
pub fn parse_dynamic_configs(configs: &[String]) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();

    for config in configs {
        let (key, value) = config.split_once('=').ok_or_else(|| {
            DeployError::ConfigError(format!(
                "Invalid config format: '{}'. Expected 'key=value'",
                config
            ))
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(DeployError::ConfigError(format!(
                "Empty key in config: '{}'",
                config
            )));
        }

        map.insert(key.to_string(), value.trim().to_string());
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::platform::MicroserviceEntry;

    fn conf_with_datalake() -> PlatformConf {
        PlatformConf {
            microservices: vec![MicroserviceEntry {
                spec: "pumpwood-datalake".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_platform_overrides() {
        let mut conf = conf_with_datalake();
        let configs = parse_dynamic_configs(&[
            "platform.namespace=staging".to_string(),
            "platform.image.pull-secrets=gcr, dockerhub".to_string(),
        ])
        .unwrap();

        apply_to_platform_conf(&configs, &mut conf).unwrap();
        assert_eq!(conf.namespace, "staging");
        assert_eq!(conf.image_pull_secrets, vec!["gcr", "dockerhub"]);
    }

    #[test]
    fn test_microservice_overrides() {
        let mut conf = conf_with_datalake();
        let configs = parse_dynamic_configs(&[
            "pumpwood-datalake.bucket_name=pumpwood-data".to_string(),
            "pumpwood-datalake.env.LOG_LEVEL=debug".to_string(),
        ])
        .unwrap();

        apply_to_platform_conf(&configs, &mut conf).unwrap();
        let entry = &conf.microservices[0];
        assert_eq!(entry.parameters.get("bucket_name"), Some("pumpwood-data"));
        assert_eq!(entry.env.get("LOG_LEVEL").map(String::as_str), Some("debug"));
    }

    #[test]
    fn test_override_unknown_microservice() {
        let mut conf = conf_with_datalake();
        let configs = parse_dynamic_configs(&["pumpwood-auth.app_version=1".to_string()]).unwrap();
        assert!(apply_to_platform_conf(&configs, &mut conf).is_err());
    }

    #[test]
    fn test_parse_dynamic_configs_rejects_bad_format() {
        assert!(parse_dynamic_configs(&["no-equals".to_string()]).is_err());
        assert!(parse_dynamic_configs(&["=value".to_string()]).is_err());

        let map = parse_dynamic_configs(&["a.b=c=d".to_string()]).unwrap();
        assert_eq!(map.get("a.b").map(String::as_str), Some("c=d"));
    }
}
