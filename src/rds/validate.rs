// This file is part of the terraform-provider-huaweicloud project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
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

use tf_provider::{AttributePath, Diagnostics};
use tf_provider::value::Value;

use crate::utils::{is_ip, strings, WithValidate};

use super::instance::is_hour_minute;
use super::state::{RdsBackupState, RdsInstanceState};

const REPLICATION_MODES: &[&str] = &["async", "sync", "semisync"];

#[async_trait]
impl WithValidate for RdsInstanceState<'_> {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(zones) = &self.availability_zone {
            if zones.is_empty() {
                diags.error_short(
                    "At least one availability zone is required",
                    attr_path.clone().attribute("availability_zone"),
                );
            }
        }
        if strings(&self.availability_zone).iter().any(|zone| zone.is_empty()) {
            diags.error_short(
                "Availability zones cannot be empty",
                attr_path.clone().attribute("availability_zone"),
            );
        }

        if let Value::Value(mode) = &self.ha_replication_mode {
            if !REPLICATION_MODES.contains(&mode.as_ref()) {
                diags.error(
                    "Invalid value",
                    format!("`{mode}` is not one of: {}", REPLICATION_MODES.join(", ")),
                    attr_path.clone().attribute("ha_replication_mode"),
                );
            }
        }

        if let Value::Value(ip) = &self.fixed_ip {
            if !is_ip(ip) {
                diags.error(
                    "Invalid IP address",
                    format!("`{ip}` is not a valid IP address"),
                    attr_path.clone().attribute("fixed_ip"),
                );
            }
        }

        for (name, value) in [
            ("maintain_begin", &self.maintain_begin),
            ("maintain_end", &self.maintain_end),
        ] {
            if let Value::Value(value) = value {
                if !is_hour_minute(value) {
                    diags.error(
                        "Invalid maintenance window",
                        format!("`{value}` is not formatted as HH:MM"),
                        attr_path.clone().attribute(name),
                    );
                }
            }
        }
        if self.maintain_begin.is_value() != self.maintain_end.is_value()
            && !self.maintain_begin.is_unknown()
            && !self.maintain_end.is_unknown()
        {
            diags.error_short(
                "`maintain_begin` and `maintain_end` must be set together",
                attr_path.clone().attribute("maintain_end"),
            );
        }

        if let Value::Value(volume) = &self.volume {
            if let Value::Value(size) = volume.size {
                if !(40..=4000).contains(&size) || size % 10 != 0 {
                    diags.error(
                        "Invalid volume size",
                        format!("Volume size must be a multiple of 10 between 40 and 4000, got {size}"),
                        attr_path.clone().attribute("volume").attribute("size"),
                    );
                }
            }
        }

        if let Value::Value(backup) = &self.backup_strategy {
            if let Value::Value(keep_days) = backup.keep_days {
                if !(0..=732).contains(&keep_days) {
                    diags.error(
                        "Invalid retention",
                        format!("Backups can be kept between 0 and 732 days, got {keep_days}"),
                        attr_path.attribute("backup_strategy").index(0).attribute("keep_days"),
                    );
                }
            }
        }
    }
}

#[async_trait]
impl WithValidate for RdsBackupState<'_> {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(name) = &self.name {
            let valid = (4..=64).contains(&name.len())
                && name.starts_with(|c: char| c.is_ascii_alphabetic())
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if !valid {
                diags.error(
                    "Invalid backup name",
                    "The name must start with a letter and contain 4 to 64 letters, digits, hyphens or underscores",
                    attr_path.attribute("name"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rds::state::VolumeBlock;

    fn instance() -> RdsInstanceState<'static> {
        RdsInstanceState {
            name: "db".into(),
            availability_zone: Value::Value(vec!["cn-north-4a".into()]),
            volume: Value::Value(VolumeBlock {
                volume_type: "CLOUDSSD".into(),
                size: Value::Value(40),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    async fn errors<T: WithValidate + Sync>(state: T) -> usize {
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default()).await;
        diags.errors.len()
    }

    #[tokio::test]
    async fn valid_instance() {
        assert_eq!(errors(instance()).await, 0);
        let state = RdsInstanceState {
            ha_replication_mode: "semisync".into(),
            fixed_ip: "192.168.0.10".into(),
            maintain_begin: "02:00".into(),
            maintain_end: "06:00".into(),
            ..instance()
        };
        assert_eq!(errors(state).await, 0);
    }

    #[tokio::test]
    async fn invalid_instance() {
        let state = RdsInstanceState {
            availability_zone: Value::Value(vec![]),
            ha_replication_mode: "fast".into(),
            fixed_ip: "192.168.0".into(),
            maintain_begin: "25:00".into(),
            volume: Value::Value(VolumeBlock {
                size: Value::Value(45),
                ..Default::default()
            }),
            ..instance()
        };
        // zones, mode, ip, begin, begin without end, size
        assert_eq!(errors(state).await, 6);
    }

    #[tokio::test]
    async fn backup_name() {
        let backup = |name: &'static str| RdsBackupState {
            name: name.into(),
            ..Default::default()
        };
        assert_eq!(errors(backup("nightly_01")).await, 0);
        assert_eq!(errors(backup("01-nightly")).await, 1);
        assert_eq!(errors(backup("abc")).await, 1);
    }
}
