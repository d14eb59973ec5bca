// CLI command definitions

use super::deploy::{EndpointsCommand, RenderCommand, SpecsCommand, ValidateCommand};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "pumpwood-deploy",
    version,
    about = "Kubernetes manifest generator for Pumpwood microservices",
    long_about = "Renders Deployments, Secrets, Services and Ingress rules for Pumpwood microservices and validates them with kubectl dry runs"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Render manifests for every configured microservice and write them to disk
    Render(RenderCommand),

    /// Render manifests and validate them with kubectl --dry-run=client
    Validate(ValidateCommand),

    /// Show the endpoints each microservice exposes
    Endpoints(EndpointsCommand),

    /// List the known microservice specs
    Specs(SpecsCommand),
}
