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
use tf_provider::value::{Value, ValueString};

use crate::utils::{is_cidr, non_empty, WithNormalize, WithValidate};

use super::state::SecGroupRuleState;

const DIRECTIONS: &[&str] = &["ingress", "egress"];
const ETHERTYPES: &[&str] = &["IPv4", "IPv6"];
const ACTIONS: &[&str] = &["allow", "deny"];

fn check_one_of(
    diags: &mut Diagnostics,
    value: &ValueString,
    allowed: &[&str],
    attr_path: AttributePath,
) {
    if let Value::Value(value) = value {
        if !allowed.contains(&value.as_ref()) {
            diags.error(
                "Invalid value",
                format!("`{value}` is not one of: {}", allowed.join(", ")),
                attr_path,
            );
        }
    }
}

#[async_trait]
impl WithValidate for SecGroupRuleState<'_> {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        check_one_of(
            diags,
            &self.direction,
            DIRECTIONS,
            attr_path.clone().attribute("direction"),
        );
        check_one_of(
            diags,
            &self.ethertype,
            ETHERTYPES,
            attr_path.clone().attribute("ethertype"),
        );
        check_one_of(
            diags,
            &self.action,
            ACTIONS,
            attr_path.clone().attribute("action"),
        );

        if let Value::Value(priority) = self.priority {
            if !(1..=100).contains(&priority) {
                diags.error(
                    "Invalid priority",
                    format!("Priority must be between 1 and 100, got {priority}"),
                    attr_path.clone().attribute("priority"),
                );
            }
        }

        if let Value::Value(prefix) = &self.remote_ip_prefix {
            if !is_cidr(prefix) {
                diags.error(
                    "Invalid CIDR",
                    format!("`{prefix}` is not a valid CIDR notation"),
                    attr_path.clone().attribute("remote_ip_prefix"),
                );
            }
        }

        let remotes = [
            &self.remote_ip_prefix,
            &self.remote_group_id,
            &self.remote_address_group_id,
        ];
        if remotes.iter().filter(|remote| remote.is_value()).count() > 1 {
            diags.error_short(
                "Only one of `remote_ip_prefix`, `remote_group_id` and `remote_address_group_id` can be set",
                attr_path.clone().attribute("remote_ip_prefix"),
            );
        }

        let has_range = self.port_range_min.is_value() || self.port_range_max.is_value();
        if non_empty(&self.ports).is_some() && has_range {
            diags.error_short(
                "`ports` conflicts with `port_range_min` and `port_range_max`",
                attr_path.clone().attribute("ports"),
            );
        }
        if let (Value::Value(min), Value::Value(max)) = (&self.port_range_min, &self.port_range_max) {
            if min > max {
                diags.error(
                    "Invalid port range",
                    format!("`port_range_min` ({min}) is greater than `port_range_max` ({max})"),
                    attr_path.attribute("port_range_min"),
                );
            }
        }
    }
}

impl WithNormalize for SecGroupRuleState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.ethertype.is_null() {
            self.ethertype = Value::Value("IPv4".into());
        }
        if self.action.is_null() {
            self.action = Value::Value("allow".into());
        }
        if self.priority.is_null() {
            self.priority = Value::Value(1);
        }
    }
}
