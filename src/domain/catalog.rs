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

//! Built-in specs for the Pumpwood microservices.

use crate::domain::config::microservice::{
    DeploymentSpec, EndpointSpec, EnvSource, EnvSpec, IngressSpec, MicroserviceSpec,
    SecretKeySpec, ServiceSpec, ServiceType, TestDatabaseSpec,
};
use crate::domain::endpoints::ENDPOINT_INTERNAL;

pub const AUTH: &str = "pumpwood-auth";
pub const DATALAKE: &str = "pumpwood-datalake";
pub const ESTIMATION: &str = "pumpwood-estimation";
pub const GATEWAY: &str = "pumpwood-gateway";
pub const FRONTEND: &str = "pumpwood-frontend";

const REST_PORT: i32 = 5000;
const HTTP_PORT: i32 = 80;

pub fn builtin_specs() -> Vec<MicroserviceSpec> {
    vec![auth(), datalake(), estimation(), gateway(), frontend()]
}

pub fn find(name: &str) -> Option<MicroserviceSpec> {
    builtin_specs().into_iter().find(|s| s.name == name)
}

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn secret(keys: &[&str]) -> Vec<SecretKeySpec> {
    keys.iter()
        .map(|k| SecretKeySpec {
            key: k.to_string(),
            field: k.to_string(),
        })
        .collect()
}

fn health_path(app: &str) -> Option<String> {
    Some(format!("/health-check/{}/", app))
}

pub fn auth() -> MicroserviceSpec {
    MicroserviceSpec {
        name: AUTH.to_string(),
        description: Some("Authentication and user registration".to_string()),
        required: fields(&["db_password", "microservice_password", "secret_key", "app_version"]),
        optional: fields(&["test_db_version", "ingress_host", "db_host"]),
        secret: secret(&["db_password", "microservice_password", "secret_key"]),
        deployments: vec![DeploymentSpec {
            component: "app".to_string(),
            image: "pumpwood-auth-app".to_string(),
            version_field: "app_version".to_string(),
            port: Some(REST_PORT),
            health_path: health_path("pumpwood-auth-app"),
            env: vec![
                EnvSpec::value("DB_USERNAME", "pumpwood"),
                EnvSpec {
                    name: "DB_HOST".to_string(),
                    source: EnvSource::Field {
                        field: "db_host".to_string(),
                        default: Some("pumpwood-auth-test-db".to_string()),
                    },
                },
                EnvSpec::value("DB_PORT", "5432"),
                EnvSpec::value("DB_DATABASE", "pumpwood"),
                EnvSpec::secret("DB_PASSWORD", "db_password"),
                EnvSpec::secret("SECRET_KEY", "secret_key"),
                EnvSpec::secret("MICROSERVICE_PASSWORD", "microservice_password"),
            ],
            cpu: Some("250m".to_string()),
            memory: Some("512Mi".to_string()),
            sleep: Some(10),
            graceful_shutdown: Some(10),
            ..Default::default()
        }],
        service: Some(ServiceSpec {
            port: REST_PORT,
            ..Default::default()
        }),
        ingress: Some(IngressSpec {
            path: "/rest/registration/".to_string(),
            host_field: Some("ingress_host".to_string()),
            ..Default::default()
        }),
        test_database: Some(TestDatabaseSpec {
            sleep: Some(20),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn datalake() -> MicroserviceSpec {
    let shared_env = vec![
        EnvSpec::field("BUCKET_NAME", "bucket_name"),
        EnvSpec {
            name: "STORAGE_TYPE".to_string(),
            source: EnvSource::Field {
                field: "storage_type".to_string(),
                default: Some("google_bucket".to_string()),
            },
        },
        EnvSpec::secret("MICROSERVICE_PASSWORD", "microservice_password"),
    ];

    let mut app_env = shared_env.clone();
    app_env.push(EnvSpec::value("WORKERS_TIMEOUT", "300"));

    MicroserviceSpec {
        name: DATALAKE.to_string(),
        description: Some("Data lake REST app and upload worker".to_string()),
        required: fields(&["microservice_password", "bucket_name", "app_version", "worker_version"]),
        optional: fields(&["test_db_version", "storage_type"]),
        secret: secret(&["microservice_password"]),
        deployments: vec![
            DeploymentSpec {
                component: "app".to_string(),
                image: "pumpwood-datalake-app".to_string(),
                version_field: "app_version".to_string(),
                port: Some(REST_PORT),
                health_path: health_path("pumpwood-datalake-app"),
                env: app_env,
                ..Default::default()
            },
            DeploymentSpec {
                component: "worker".to_string(),
                image: "pumpwood-datalake-dataloader".to_string(),
                version_field: "worker_version".to_string(),
                env: shared_env,
                ..Default::default()
            },
        ],
        test_database: Some(TestDatabaseSpec::default()),
        ..Default::default()
    }
}

pub fn estimation() -> MicroserviceSpec {
    let auth_url = EnvSpec::endpoint("AUTH_SERVER_URL", AUTH, ENDPOINT_INTERNAL);
    let password = EnvSpec::secret("MICROSERVICE_PASSWORD", "microservice_password");

    MicroserviceSpec {
        name: ESTIMATION.to_string(),
        description: Some("Model estimation app and its queue worker".to_string()),
        required: fields(&["microservice_password", "app_version", "worker_version"]),
        optional: fields(&["test_db_version", "ingress_host"]),
        secret: secret(&["microservice_password"]),
        deployments: vec![
            DeploymentSpec {
                component: "app".to_string(),
                image: "pumpwood-estimation-app".to_string(),
                version_field: "app_version".to_string(),
                port: Some(REST_PORT),
                health_path: health_path("pumpwood-estimation-app"),
                env: vec![auth_url.clone(), password.clone()],
                ..Default::default()
            },
            DeploymentSpec {
                component: "worker".to_string(),
                image: "pumpwood-estimation-worker".to_string(),
                version_field: "worker_version".to_string(),
                env: vec![
                    auth_url,
                    password,
                    EnvSpec {
                        name: "WORKER_NAME".to_string(),
                        source: EnvSource::PodField {
                            path: "metadata.name".to_string(),
                        },
                    },
                ],
                replicas: 2,
                graceful_shutdown: Some(30),
                ..Default::default()
            },
        ],
        service: Some(ServiceSpec {
            port: REST_PORT,
            ..Default::default()
        }),
        ingress: Some(IngressSpec {
            path: "/rest/estimation/".to_string(),
            host_field: Some("ingress_host".to_string()),
            ..Default::default()
        }),
        test_database: Some(TestDatabaseSpec::default()),
        ..Default::default()
    }
}

pub fn gateway() -> MicroserviceSpec {
    MicroserviceSpec {
        name: GATEWAY.to_string(),
        description: Some("Nginx gateway exposing the platform".to_string()),
        required: fields(&["version", "gateway_public_ip"]),
        deployments: vec![DeploymentSpec {
            component: "app".to_string(),
            image: "pumpwood-nginx-gateway".to_string(),
            version_field: "version".to_string(),
            port: Some(HTTP_PORT),
            health_path: Some("/health-check/pumpwood-nginx-gateway/".to_string()),
            ..Default::default()
        }],
        service: Some(ServiceSpec {
            port: HTTP_PORT,
            service_type: ServiceType::LoadBalancer,
            load_balancer_ip_field: Some("gateway_public_ip".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn frontend() -> MicroserviceSpec {
    MicroserviceSpec {
        name: FRONTEND.to_string(),
        description: Some("Web frontend served behind the gateway".to_string()),
        required: fields(&["version", "gateway_public_ip", "microservice_password"]),
        secret: secret(&["microservice_password"]),
        deployments: vec![DeploymentSpec {
            component: "app".to_string(),
            image: "pumpwood-frontend".to_string(),
            version_field: "version".to_string(),
            port: Some(HTTP_PORT),
            env: vec![
                EnvSpec::field("GATEWAY_PUBLIC_IP", "gateway_public_ip"),
                EnvSpec::secret("MICROSERVICE_PASSWORD", "microservice_password"),
            ],
            ..Default::default()
        }],
        endpoints: vec![EndpointSpec {
            name: "public".to_string(),
            scheme: "http".to_string(),
            host_field: "gateway_public_ip".to_string(),
            port: None,
            path: "/".to_string(),
        }],
        ..Default::default()
    }
}
