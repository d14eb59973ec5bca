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

pub mod artifact;
pub mod catalog;
pub mod config;
pub mod deploy;
pub mod endpoints;
pub mod validation;

pub use self::artifact::{ArtifactDescriptor, ArtifactKind};
pub use self::deploy::{ManifestBuilder, MicroserviceBuilder};
pub use self::endpoints::{EndpointMap, EndpointRegistry};
pub use self::validation::{check_yaml, ValidationHarness, ValidationOutcome, ValidationReport};
