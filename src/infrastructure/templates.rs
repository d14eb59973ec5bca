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

//! Raw YAML templates with `{field}` placeholders.
//!
//! `{field}` inserts the value verbatim, `{field!q}` inserts it as a YAML
//! double-quoted scalar and `{{` / `}}` produce literal braces.

use crate::domain::config::PlatformContext;
use crate::shared::error::{DeployError, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Values available to placeholders of one microservice's templates.
pub type TemplateContext = BTreeMap<String, String>;

/// Reads raw templates from the configured template directory.
pub struct TemplateStore {
    context: PlatformContext,
}

impl TemplateStore {
    pub fn new(context: &PlatformContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    pub fn path(&self, file: &str) -> Result<PathBuf> {
        self.context.template_path(file)
    }

    pub fn load(&self, file: &str) -> Result<String> {
        let path = self.path(file)?;
        debug!("Reading template {}", path.display());
        std::fs::read_to_string(&path).map_err(|e| {
            DeployError::template_render(file, format!("cannot read {}: {}", path.display(), e))
        })
    }

    /// Load `file`, substitute placeholders and check the result parses as YAML.
    pub fn render(&self, file: &str, context: &TemplateContext) -> Result<String> {
        let text = self.load(file)?;
        let rendered = render_template(file, &text, context)?;
        check_rendered_yaml(file, &rendered)?;
        Ok(rendered)
    }
}

/// Tokens of the placeholder syntax, longest first so `{{` wins over `{`.
const TOKEN_PATTERN: &str = r"\{\{|\}\}|\{([^{}\n]*)\}|[{}]";

pub fn render_template(name: &str, text: &str, context: &TemplateContext) -> Result<String> {
    let tokens = Regex::new(TOKEN_PATTERN)
        .map_err(|e| DeployError::template_render(name, format!("bad token pattern: {}", e)))?;

    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    for caps in tokens.captures_iter(text) {
        let Some(token) = caps.get(0) else {
            continue;
        };
        output.push_str(&text[last..token.start()]);
        last = token.end();

        match (token.as_str(), caps.get(1)) {
            ("{{", _) => output.push('{'),
            ("}}", _) => output.push('}'),
            (_, Some(placeholder)) => {
                output.push_str(&substitute(name, placeholder.as_str(), context)?)
            }
            ("{", None) => {
                return Err(DeployError::template_render(
                    name,
                    format!("unterminated placeholder at byte {}", token.start()),
                ))
            }
            _ => {
                return Err(DeployError::template_render(
                    name,
                    format!("single '}}' at byte {}", token.start()),
                ))
            }
        }
    }
    output.push_str(&text[last..]);

    Ok(output)
}

fn substitute(name: &str, placeholder: &str, context: &TemplateContext) -> Result<String> {
    let (field, conversion) = match placeholder.split_once('!') {
        Some((field, conversion)) => (field.trim(), Some(conversion.trim())),
        None => (placeholder.trim(), None),
    };

    if field.is_empty() {
        return Err(DeployError::template_render(name, "empty placeholder"));
    }
    if !field
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(DeployError::template_render(
            name,
            format!("invalid placeholder name '{}'", field),
        ));
    }

    let value = context.get(field).ok_or_else(|| {
        DeployError::template_render(name, format!("no value for placeholder '{}'", field))
    })?;

    match conversion {
        None => Ok(value.clone()),
        // JSON strings are valid YAML double-quoted scalars.
        Some("q") => Ok(serde_json::to_string(value)?),
        Some(other) => Err(DeployError::template_render(
            name,
            format!("unknown conversion '!{}' on '{}'", other, field),
        )),
    }
}

fn check_rendered_yaml(name: &str, rendered: &str) -> Result<()> {
    use serde::Deserialize;

    for document in serde_yaml::Deserializer::from_str(rendered) {
        serde_yaml::Value::deserialize(document).map_err(|e| {
            DeployError::template_render(name, format!("rendered text is not valid YAML: {}", e))
        })?;
    }
    Ok(())
}
