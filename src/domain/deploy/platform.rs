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

use crate::domain::config::PlatformConf;
use crate::domain::deploy::builder::{ManifestBuilder, MicroserviceBuilder};
use crate::domain::endpoints::EndpointRegistry;
use crate::shared::error::Result;
use tracing::info;

/// Builders for every configured microservice, in configuration file order.
///
/// Endpoint maps of earlier entries are visible to later ones; a reference to
/// a microservice configured further down fails construction.
pub fn build_all(conf: &PlatformConf) -> Result<Vec<MicroserviceBuilder>> {
    conf.validate()?;

    let context = conf.context();
    let mut registry = EndpointRegistry::new();
    let mut builders = Vec::with_capacity(conf.microservices.len());

    for entry in &conf.microservices {
        let spec = conf.resolve_spec(&entry.spec)?;
        let builder =
            MicroserviceBuilder::new(spec, entry.parameters.clone(), &context, &registry)?
                .with_env(entry.env.clone());
        registry.register(builder.end_points());
        builders.push(builder);
    }

    info!(
        "Prepared {} microservices for namespace {}",
        builders.len(),
        context.namespace
    );
    Ok(builders)
}

/// Endpoint maps of all builders, keyed by microservice.
pub fn endpoint_registry(builders: &[MicroserviceBuilder]) -> EndpointRegistry {
    builders.iter().map(|b| b.end_points()).collect()
}
