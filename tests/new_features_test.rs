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

use async_trait::async_trait;
use pumpwood_deploy::cli::deploy::write_artifacts;
use pumpwood_deploy::domain::config::{apply_to_platform_conf, parse_dynamic_configs};
use pumpwood_deploy::domain::ValidationOutcome;
use pumpwood_deploy::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

mod test_utils {
    use super::*;

    pub const REPORTS_CONF: &str = r#"
namespace = "pumpwood"
repository = "gcr.io/pumpwood"
template_dir = "templates"

[[specs]]
name = "pumpwood-reports"
required = ["app_version", "report_bucket"]
optional = ["cron_enabled"]

[[specs.deployments]]
component = "app"
image = "pumpwood-reports-app"
version_field = "app_version"
port = 5000
pod_template = "reports-pod.yaml"

[[specs.deployments.env]]
name = "REPORT_BUCKET"
from = "field"
field = "report_bucket"

[specs.service]
port = 5000

[[specs.raw_templates]]
name = "cronjob"
kind = "deploy"
file = "reports-cronjob.yaml"
trigger = "cron_enabled"
sleep = 5

[[microservices]]
spec = "pumpwood-reports"

[microservices.parameters]
app_version = "3.1.0"
report_bucket = "reports: 2025"
cron_enabled = "yes"
"#;

    pub const CRONJOB_TEMPLATE: &str = r#"apiVersion: batch/v1
kind: CronJob
metadata:
  name: {microservice}-cron
  namespace: {namespace}
  annotations: {{}}
spec:
  schedule: "0 3 * * *"
  jobTemplate:
    spec:
      template:
        spec:
          restartPolicy: OnFailure
          containers:
            - name: cron
              image: {repository}/pumpwood-reports-cron:{app_version}
              env:
                - name: REPORT_BUCKET
                  value: {report_bucket!q}
"#;

    pub const POD_TEMPLATE: &str = r#"apiVersion: v1
kind: Pod
spec:
  nodeSelector:
    pool: reports
  volumes:
    - name: scratch
      emptyDir: {}
  containers:
    - name: app
      volumeMounts:
        - name: scratch
          mountPath: /tmp/scratch
"#;

    /// Writes the config and its templates into a fresh directory.
    pub fn write_reports_platform(dir: &Path) -> PathBuf {
        let templates = dir.join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("reports-cronjob.yaml"), CRONJOB_TEMPLATE).unwrap();
        fs::write(templates.join("reports-pod.yaml"), POD_TEMPLATE).unwrap();

        let conf_path = dir.join("pumpwood-deploy.toml");
        fs::write(&conf_path, REPORTS_CONF).unwrap();
        conf_path
    }

    pub fn frontend_conf() -> PlatformConf {
        PlatformConf::from_toml(
            r#"
[[microservices]]
spec = "pumpwood-frontend"

[microservices.parameters]
version = "0.9.0"
gateway_public_ip = "10.0.0.7"
microservice_password = "ms-pass"
"#,
        )
        .unwrap()
    }

    /// Records every validated file; rejects files containing `reject`.
    #[derive(Default)]
    pub struct RecordingValidator {
        pub seen: Mutex<Vec<PathBuf>>,
        pub reject: Option<String>,
    }

    #[async_trait]
    impl ManifestValidator for RecordingValidator {
        async fn validate_file(&self, path: &Path) -> Result<()> {
            self.seen.lock().unwrap().push(path.to_path_buf());
            let content = fs::read_to_string(path)?;
            match self.reject {
                Some(ref marker) if content.contains(marker.as_str()) => Err(
                    DeployError::ValidationError(format!("exit code 1: rejected {}", marker)),
                ),
                _ => Ok(()),
            }
        }
    }
}

use test_utils::*;

#[test]
fn test_inline_spec_with_raw_template_and_pod_template() {
    let dir = tempfile::tempdir().unwrap();
    let conf_path = write_reports_platform(dir.path());

    let conf = PlatformConf::from(&conf_path).unwrap();
    let builders = build_all(&conf).unwrap();
    assert_eq!(builders.len(), 1);

    let artifacts = builders[0].create_deployment_file().unwrap();
    let names: Vec<_> = artifacts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "pumpwood-reports__app",
            "pumpwood-reports__service",
            "pumpwood-reports__cronjob",
        ]
    );

    let app = &artifacts[0].content;
    assert!(app.contains("gcr.io/pumpwood/pumpwood-reports-app:3.1.0"));
    assert!(app.contains("pool: reports"));
    assert!(app.contains("/tmp/scratch"));

    let cron = &artifacts[2];
    assert_eq!(cron.kind, ArtifactKind::Deploy);
    assert_eq!(cron.sleep, Some(5));
    assert!(cron.content.contains("name: pumpwood-reports-cron"));
    assert!(cron.content.contains("namespace: pumpwood"));
    assert!(cron.content.contains("annotations: {}"));
    assert!(cron
        .content
        .contains("gcr.io/pumpwood/pumpwood-reports-cron:3.1.0"));

    let docs = cron.documents().unwrap();
    let value = &docs[0]["spec"]["jobTemplate"]["spec"]["template"]["spec"]["containers"][0]
        ["env"][0]["value"];
    assert_eq!(value.as_str(), Some("reports: 2025"));
}

#[test]
fn test_raw_template_skipped_without_trigger() {
    let dir = tempfile::tempdir().unwrap();
    let conf_path = write_reports_platform(dir.path());

    let mut conf = PlatformConf::from(&conf_path).unwrap();
    let overrides = parse_dynamic_configs(&["pumpwood-reports.cron_enabled=".to_string()]).unwrap();
    apply_to_platform_conf(&overrides, &mut conf).unwrap();

    let builders = build_all(&conf).unwrap();
    let artifacts = builders[0].create_deployment_file().unwrap();
    assert_eq!(artifacts.len(), 2);
    assert!(artifacts.iter().all(|a| a.name != "pumpwood-reports__cronjob"));
}

#[test]
fn test_missing_raw_template_fails_render() {
    let dir = tempfile::tempdir().unwrap();
    let conf_path = write_reports_platform(dir.path());
    fs::remove_file(dir.path().join("templates/reports-cronjob.yaml")).unwrap();

    let conf = PlatformConf::from(&conf_path).unwrap();
    let builders = build_all(&conf).unwrap();
    assert!(matches!(
        builders[0].create_deployment_file(),
        Err(DeployError::TemplateRender { .. })
    ));
}

#[test]
fn test_dynamic_overrides() {
    let mut conf = frontend_conf();
    let overrides = parse_dynamic_configs(&[
        "platform.namespace=staging".to_string(),
        "platform.repository=registry.local/pumpwood".to_string(),
        "pumpwood-frontend.version=1.0.0".to_string(),
        "pumpwood-frontend.env.FEATURE_FLAGS=beta".to_string(),
    ])
    .unwrap();
    apply_to_platform_conf(&overrides, &mut conf).unwrap();

    assert_eq!(conf.namespace, "staging");
    let builders = build_all(&conf).unwrap();
    let artifacts = builders[0].create_deployment_file().unwrap();
    let app = &artifacts[1].content;
    assert!(app.contains("namespace: staging"));
    assert!(app.contains("registry.local/pumpwood/pumpwood-frontend:1.0.0"));
    assert!(app.contains("FEATURE_FLAGS"));
    assert!(app.contains("beta"));
}

#[test]
fn test_override_for_unconfigured_microservice() {
    let mut conf = frontend_conf();
    let overrides = parse_dynamic_configs(&["pumpwood-auth.app_version=1.0".to_string()]).unwrap();
    assert!(apply_to_platform_conf(&overrides, &mut conf).is_err());
}

#[test]
fn test_write_artifacts_layout() {
    let dir = tempfile::tempdir().unwrap();
    let builders = build_all(&frontend_conf()).unwrap();
    let rendered: Vec<_> = builders
        .iter()
        .map(|b| {
            (
                b.microservice().to_string(),
                b.create_deployment_file().unwrap(),
            )
        })
        .collect();

    write_artifacts(dir.path(), &rendered).unwrap();

    let ms_dir = dir.path().join("pumpwood-frontend");
    assert!(ms_dir.join("00__pumpwood-frontend__secrets.yaml").exists());
    assert!(ms_dir.join("01__pumpwood-frontend__app.yaml").exists());

    let index = fs::read_to_string(dir.path().join("index.json")).unwrap();
    assert!(index.contains("secrets_file"));
    assert!(!index.contains("ms-pass"));
}

#[tokio::test]
async fn test_harness_skips_secrets_and_validates_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let builders = build_all(&frontend_conf()).unwrap();
    let artifacts = builders[0].create_deployment_file().unwrap();

    let harness = ValidationHarness::new(RecordingValidator::default(), dir.path());
    let report = harness
        .validate_all("pumpwood-frontend", &artifacts)
        .await
        .unwrap();

    assert_eq!(report.skipped(), 1);
    assert_eq!(report.passed(), 1);
    assert!(report.is_success());
    assert!(matches!(
        report.records[0].outcome,
        ValidationOutcome::Skipped { .. }
    ));

    let written = dir
        .path()
        .join("pumpwood-frontend")
        .join("01__pumpwood-frontend__app.yaml");
    assert_eq!(fs::read_to_string(&written).unwrap(), artifacts[1].content);
    assert!(!dir
        .path()
        .join("pumpwood-frontend")
        .join("00__pumpwood-frontend__secrets.yaml")
        .exists());
}

#[tokio::test]
async fn test_harness_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    let builders = build_all(&frontend_conf()).unwrap();
    let artifacts = builders[0].create_deployment_file().unwrap();

    let validator = RecordingValidator {
        reject: Some("kind: Deployment".to_string()),
        ..Default::default()
    };
    let report = ValidationHarness::new(validator, dir.path())
        .validate_all("pumpwood-frontend", &artifacts)
        .await
        .unwrap();

    assert_eq!(report.failed(), 1);
    match report.clone().into_result() {
        Err(DeployError::ValidationError(reason)) => assert!(reason.contains("exit code 1")),
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_harness_required_substring() {
    let dir = tempfile::tempdir().unwrap();
    let builders = build_all(&frontend_conf()).unwrap();
    let artifacts = builders[0].create_deployment_file().unwrap();

    let validator = RecordingValidator::default();
    let harness = ValidationHarness::new(validator, dir.path())
        .with_required_substring(Some("pumpwood-gateway".to_string()));
    let report = harness
        .validate_all("pumpwood-frontend", &artifacts)
        .await
        .unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.skipped(), 1);
}

/// A stand-in kubectl that fails unless the file passed last exists.
#[cfg(unix)]
fn fake_kubectl(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("kubectl");
    fs::write(
        &path,
        "#!/bin/sh\nfor last; do :; done\n[ -f \"$last\" ] || { echo \"error: the path $last does not exist\" >&2; exit 1; }\n",
    )
    .unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[tokio::test]
async fn test_kubectl_sees_files_under_relative_work_dir() {
    let bin_dir = tempfile::tempdir().unwrap();
    let kubectl = fake_kubectl(bin_dir.path());

    let work = tempfile::tempdir_in(".").unwrap();
    let work_dir = work.path().strip_prefix(".").unwrap_or(work.path());
    assert!(work_dir.is_relative());

    let builders = build_all(&frontend_conf()).unwrap();
    let artifacts = builders[0].create_deployment_file().unwrap();

    let validator = KubectlValidator::new(kubectl.to_string_lossy(), None, work_dir);
    let report = ValidationHarness::new(validator, work_dir)
        .validate_all("pumpwood-frontend", &artifacts)
        .await
        .unwrap();

    assert_eq!(report.passed(), 1, "{:?}", report);
    assert!(report.is_success());
}

#[tokio::test]
#[ignore = "needs kubectl on PATH"]
async fn test_kubectl_dry_run() {
    let dir = tempfile::tempdir().unwrap();
    let builders = build_all(&frontend_conf()).unwrap();
    let artifacts = builders[0].create_deployment_file().unwrap();

    let validator = KubectlValidator::new("kubectl", None, dir.path());
    let report = ValidationHarness::new(validator, dir.path())
        .validate_all("pumpwood-frontend", &artifacts)
        .await
        .unwrap();

    assert!(report.is_success(), "{:?}", report);
}
