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

/// Resource labels
pub const LABEL_APP: &str = "app";
pub const LABEL_COMPONENT: &str = "component";
pub const LABEL_MANAGED_BY: &str = "managed-by";
pub const LABEL_MANAGED_BY_VALUE: &str = "pumpwood-deploy";

/// Components
pub const COMPONENT_SECRETS: &str = "secrets";
pub const COMPONENT_TEST_DB: &str = "test-db";

/// Artifact name suffixes
pub const ARTIFACT_SUFFIX_SECRETS: &str = "secrets";
pub const ARTIFACT_SUFFIX_SERVICE: &str = "service";
pub const ARTIFACT_SUFFIX_INGRESS: &str = "ingress";
pub const ARTIFACT_SUFFIX_TEST_DB: &str = "test_db";

/// Base environment variable names
pub const ENV_MICROSERVICE_NAME: &str = "MICROSERVICE_NAME";
pub const ENV_POD_NAMESPACE: &str = "POD_NAMESPACE";
pub const ENV_POD_NAME: &str = "POD_NAME";
pub const ENV_POD_IP: &str = "POD_IP";

/// Readiness probe configuration
pub const READINESS_INITIAL_DELAY: i32 = 10;
pub const READINESS_PERIOD: i32 = 30;
pub const READINESS_TIMEOUT: i32 = 10;
pub const READINESS_FAILURE_THRESHOLD: i32 = 3;

/// Rolling update settings
pub const MAX_UNAVAILABLE: &str = "25%";
pub const MAX_SURGE: &str = "25%";
pub const STRATEGY_TYPE_ROLLING_UPDATE: &str = "RollingUpdate";

/// Restart policy
pub const RESTART_POLICY_ALWAYS: &str = "Always";

/// Secret type
pub const SECRET_TYPE_OPAQUE: &str = "Opaque";

/// Test database defaults
pub const TEST_DB_IMAGE_PREFIX: &str = "test-db-";
pub const TEST_DB_PORT_NAME: &str = "postgres";

/// Port names
pub const PORT_NAME_HTTP: &str = "http";

/// Protocol
pub const PROTOCOL_TCP: &str = "TCP";
