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

use thiserror::Error;
pub type Result<T> = std::result::Result<T, DeployError>;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing required field '{field}' for microservice '{microservice}'")]
    MissingField { microservice: String, field: String },

    #[error("Unknown microservice spec: {0}")]
    UnknownSpec(String),

    #[error("Endpoint '{endpoint}' of microservice '{microservice}' is not available")]
    UnknownEndpoint {
        microservice: String,
        endpoint: String,
    },

    #[error("Template render error in '{template}': {reason}")]
    TemplateRender { template: String, reason: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl DeployError {
    pub fn missing_field(microservice: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            microservice: microservice.into(),
            field: field.into(),
        }
    }

    pub fn unknown_endpoint(microservice: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::UnknownEndpoint {
            microservice: microservice.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn template_render(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TemplateRender {
            template: template.into(),
            reason: reason.into(),
        }
    }
}
