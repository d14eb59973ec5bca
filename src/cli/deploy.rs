//! Manifest rendering and validation commands

use crate::cli::display::{SpecSource, TableRenderer};
use crate::domain::catalog;
use crate::domain::config::{apply_to_platform_conf, parse_dynamic_configs, PlatformConf};
use crate::domain::deploy::{build_all, endpoint_registry, ManifestBuilder};
use crate::domain::{ArtifactDescriptor, ArtifactKind, ValidationHarness, ValidationReport};
use crate::infrastructure::kubernetes::KubectlValidator;
use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONFIG_ENV: &str = "PUMPWOOD_DEPLOY_CONFIG";

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Yaml,
    Json,
}

#[derive(Parser, Debug, Clone)]
pub struct RenderCommand {
    /// Path to the platform configuration file (pumpwood-deploy.toml)
    /// If not provided, reads PUMPWOOD_DEPLOY_CONFIG
    #[arg(long, value_name = "PATH")]
    pub config_file: Option<String>,

    /// Directory receiving <microservice>/<NN>__<artifact>.yaml and index.json
    /// Defaults to output_dir from the configuration file
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<String>,

    /// What to print once the files are written
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Dynamic configuration properties to override any settings (-D key=value)
    ///
    /// Platform: platform.namespace, platform.repository, platform.cluster-domain,
    /// platform.image.pull-policy, platform.image.pull-secrets (comma-separated),
    /// platform.template-dir, platform.output-dir
    /// Parameters: <microservice>.<field>, e.g. pumpwood-auth.app_version=1.2.0
    /// Environment: <microservice>.env.VAR_NAME
    ///
    /// Example: -Dplatform.namespace=staging -Dpumpwood-datalake.test_db_version=0.3
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ValidateCommand {
    #[arg(long, value_name = "PATH")]
    pub config_file: Option<String>,

    /// Fail artifacts whose content does not contain this text
    #[arg(long, value_name = "TEXT")]
    pub require: Option<String>,

    /// kubectl binary used for the dry run
    #[arg(long)]
    pub kubectl: Option<String>,

    /// Kubernetes context passed to kubectl
    #[arg(long)]
    pub context: Option<String>,

    /// Directory the validated files are written to
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<String>,

    /// Only check that every artifact parses as YAML, without kubectl
    #[arg(long)]
    pub local: bool,

    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct EndpointsCommand {
    #[arg(long, value_name = "PATH")]
    pub config_file: Option<String>,

    /// Print the endpoint maps as JSON
    #[arg(long)]
    pub json: bool,

    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SpecsCommand {
    /// Include inline specs declared in this configuration file
    #[arg(long, value_name = "PATH")]
    pub config_file: Option<String>,

    /// Print the full spec of one microservice as TOML
    #[arg(long, value_name = "NAME")]
    pub show: Option<String>,
}

/// One line of index.json
#[derive(Debug, Serialize)]
pub struct IndexEntry {
    pub microservice: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep: Option<u64>,
    pub file: String,
}

fn config_path(config_file: &Option<String>) -> anyhow::Result<String> {
    match config_file {
        Some(path) => Ok(path.clone()),
        None => std::env::var(CONFIG_ENV).map_err(|_| {
            anyhow::anyhow!(
                "Configuration file is required. Please specify --config-file or set {} environment variable",
                CONFIG_ENV
            )
        }),
    }
}

/// Load the platform configuration and apply `-D` overrides on top.
pub fn load_conf(config_file: &Option<String>, properties: &[String]) -> anyhow::Result<PlatformConf> {
    let path = config_path(config_file)?;
    if !Path::new(&path).exists() {
        anyhow::bail!("❌ Configuration file not found: {}", path);
    }

    let mut conf = PlatformConf::from(&path)
        .with_context(|| format!("Failed to load configuration from {}", path))?;

    if !properties.is_empty() {
        let overrides = parse_dynamic_configs(properties)
            .map_err(|e| anyhow::anyhow!("Failed to parse dynamic configs: {}", e))?;
        apply_to_platform_conf(&overrides, &mut conf)?;
    }

    info!("Loaded configuration from {}", path);
    Ok(conf)
}

fn render_all(conf: &PlatformConf) -> anyhow::Result<Vec<(String, Vec<ArtifactDescriptor>)>> {
    let builders = build_all(conf).context("Failed to configure manifest builders")?;
    builders
        .iter()
        .map(|b| {
            let artifacts = b
                .create_deployment_file()
                .with_context(|| format!("Failed to render {}", b.microservice()))?;
            Ok((b.microservice().to_string(), artifacts))
        })
        .collect()
}

/// Write every artifact below `dir` and return the index describing them.
pub fn write_artifacts(
    dir: &Path,
    rendered: &[(String, Vec<ArtifactDescriptor>)],
) -> anyhow::Result<Vec<IndexEntry>> {
    let mut index = Vec::new();
    for (microservice, artifacts) in rendered {
        let ms_dir = dir.join(microservice);
        std::fs::create_dir_all(&ms_dir)
            .with_context(|| format!("Cannot create {}", ms_dir.display()))?;

        for (i, artifact) in artifacts.iter().enumerate() {
            let file = format!("{:02}__{}.yaml", i, artifact.name);
            let path = ms_dir.join(&file);
            std::fs::write(&path, &artifact.content)
                .with_context(|| format!("Cannot write {}", path.display()))?;
            index.push(IndexEntry {
                microservice: microservice.clone(),
                kind: artifact.kind,
                name: artifact.name.clone(),
                sleep: artifact.sleep,
                file: format!("{}/{}", microservice, file),
            });
        }
    }

    let index_path = dir.join("index.json");
    std::fs::write(&index_path, serde_json::to_string_pretty(&index)?)
        .with_context(|| format!("Cannot write {}", index_path.display()))?;
    Ok(index)
}

impl RenderCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let conf = load_conf(&self.config_file, &self.properties)?;
        let rendered = render_all(&conf)?;

        let output_dir = PathBuf::from(
            self.output_dir
                .clone()
                .unwrap_or_else(|| conf.output_dir.clone()),
        );
        let index = write_artifacts(&output_dir, &rendered)?;

        match self.format {
            OutputFormat::Table => {
                let renderer = TableRenderer::new();
                for (microservice, artifacts) in &rendered {
                    println!("{}", renderer.render_artifacts(microservice, artifacts));
                }
            }
            OutputFormat::Yaml => {
                let documents: Vec<String> = rendered
                    .iter()
                    .flat_map(|(_, artifacts)| artifacts.iter().map(|a| a.content.clone()))
                    .collect();
                print!("{}", crate::domain::artifact::join_documents(&documents));
            }
            OutputFormat::Json => {
                let all: Vec<&ArtifactDescriptor> =
                    rendered.iter().flat_map(|(_, a)| a.iter()).collect();
                println!("{}", serde_json::to_string_pretty(&all)?);
            }
        }

        if self.format == OutputFormat::Table {
            println!(
                "✓ Wrote {} artifacts to {}",
                index.len(),
                output_dir.display()
            );
        }
        Ok(())
    }
}

impl ValidateCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let conf = load_conf(&self.config_file, &self.properties)?;
        let rendered = render_all(&conf)?;

        if self.local {
            for (_, artifacts) in &rendered {
                for artifact in artifacts {
                    let docs = crate::domain::check_yaml(artifact)?;
                    println!("✓ {} ({} documents)", artifact.name, docs);
                }
            }
            return Ok(());
        }

        let mut kubectl = conf.kubectl.clone();
        if let Some(ref binary) = self.kubectl {
            kubectl.binary = binary.clone();
        }
        if self.context.is_some() {
            kubectl.context = self.context.clone();
        }
        if let Some(ref dir) = self.work_dir {
            kubectl.work_dir = dir.clone();
        }

        let validator = KubectlValidator::from_conf(&kubectl);
        let work_dir = validator.work_dir().to_path_buf();
        let harness = ValidationHarness::new(validator, work_dir)
            .with_required_substring(self.require.clone());

        let mut report = ValidationReport::default();
        for (microservice, artifacts) in &rendered {
            report.extend(harness.validate_all(microservice, artifacts).await?);
        }

        println!("{}", TableRenderer::new().render_validation(&report));
        report
            .into_result()
            .map_err(|e| anyhow::anyhow!("❌ {}", e))?;
        Ok(())
    }
}

impl EndpointsCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let conf = load_conf(&self.config_file, &self.properties)?;
        let builders = build_all(&conf).context("Failed to configure manifest builders")?;
        let maps: Vec<_> = endpoint_registry(&builders).iter().cloned().collect();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&maps)?);
        } else {
            println!("{}", TableRenderer::new().render_endpoints(&maps));
        }
        Ok(())
    }
}

impl SpecsCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let mut specs: Vec<(SpecSource, _)> = catalog::builtin_specs()
            .into_iter()
            .map(|s| (SpecSource::Builtin, s))
            .collect();

        let path = self.config_file.clone().or_else(|| std::env::var(CONFIG_ENV).ok());
        if let Some(path) = path {
            let conf = PlatformConf::from(&path)
                .with_context(|| format!("Failed to load configuration from {}", path))?;
            for spec in conf.specs {
                specs.retain(|(_, s)| s.name != spec.name);
                specs.push((SpecSource::Inline, spec));
            }
        }

        if let Some(ref name) = self.show {
            let (_, spec) = specs
                .iter()
                .find(|(_, s)| &s.name == name)
                .ok_or_else(|| anyhow::anyhow!("Unknown microservice spec: {}", name))?;
            println!("{}", toml::to_string_pretty(spec)?);
            return Ok(());
        }

        println!("{}", TableRenderer::new().render_specs(&specs));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_artifacts_layout() {
        let dir = tempfile::tempdir().unwrap();
        let rendered = vec![(
            "pumpwood-frontend".to_string(),
            vec![
                ArtifactDescriptor::new(
                    ArtifactKind::SecretsFile,
                    "pumpwood-frontend__secrets",
                    "kind: Secret\n",
                ),
                ArtifactDescriptor::new(
                    ArtifactKind::Deploy,
                    "pumpwood-frontend__app",
                    "kind: Deployment\n",
                )
                .with_sleep(Some(5)),
            ],
        )];

        let index = write_artifacts(dir.path(), &rendered).unwrap();
        assert_eq!(index.len(), 2);
        assert!(dir
            .path()
            .join("pumpwood-frontend/01__pumpwood-frontend__app.yaml")
            .exists());

        let json: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("index.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(json[0]["type"], "secrets_file");
        assert!(json[0].get("sleep").is_none());
        assert_eq!(json[1]["sleep"], 5);
        assert!(json[1].get("content").is_none());
    }

    #[test]
    fn test_missing_config_file() {
        let err = load_conf(&Some("/nonexistent/pumpwood.toml".to_string()), &[]).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
