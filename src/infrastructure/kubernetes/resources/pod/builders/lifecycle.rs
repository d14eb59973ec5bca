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

use k8s_openapi::api::core::v1::{ExecAction, Lifecycle, LifecycleHandler};

pub struct LifecycleBuilder;

impl LifecycleBuilder {
    /// A preStop hook that keeps the pod alive while endpoints drain.
    pub fn build_graceful_shutdown(shutdown_delay: Option<u32>) -> Option<Lifecycle> {
        let delay = shutdown_delay.filter(|d| *d > 0)?;

        Some(Lifecycle {
            pre_stop: Some(LifecycleHandler {
                exec: Some(ExecAction {
                    command: Some(vec![
                        "/bin/sh".to_string(),
                        "-c".to_string(),
                        format!("sleep {}", delay),
                    ]),
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_delay_no_lifecycle() {
        assert!(LifecycleBuilder::build_graceful_shutdown(None).is_none());
        assert!(LifecycleBuilder::build_graceful_shutdown(Some(0)).is_none());
    }

    #[test]
    fn test_pre_stop_sleep() {
        let lifecycle = LifecycleBuilder::build_graceful_shutdown(Some(30)).unwrap();
        let command = lifecycle.pre_stop.unwrap().exec.unwrap().command.unwrap();
        assert_eq!(command[2], "sleep 30");
    }
}
