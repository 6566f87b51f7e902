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

use crate::utils::{is_cidr, is_ip, WithNormalize, WithValidate};

use super::state::{RouteTableState, SubnetState, VpcState};

/// Next hop types accepted by custom routes
pub const ROUTE_TYPES: &[&str] = &["ecs", "eni", "vip", "nat", "peering", "vpn", "dc", "cc"];

fn check_cidr(diags: &mut Diagnostics, value: &ValueString, attr_path: AttributePath) {
    if let Value::Value(cidr) = value {
        if !is_cidr(cidr) {
            diags.error(
                "Invalid CIDR",
                format!("`{cidr}` is not a valid CIDR notation"),
                attr_path,
            );
        }
    }
}

fn check_ip(diags: &mut Diagnostics, value: &ValueString, attr_path: AttributePath) {
    if let Value::Value(ip) = value {
        if !is_ip(ip) {
            diags.error(
                "Invalid IP address",
                format!("`{ip}` is not a valid IP address"),
                attr_path,
            );
        }
    }
}

#[async_trait]
impl WithValidate for VpcState<'_> {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        check_cidr(diags, &self.cidr, attr_path.attribute("cidr"));
    }
}

#[async_trait]
impl WithValidate for SubnetState<'_> {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        check_cidr(diags, &self.cidr, attr_path.clone().attribute("cidr"));
        check_ip(diags, &self.gateway_ip, attr_path.clone().attribute("gateway_ip"));
        check_ip(diags, &self.primary_dns, attr_path.clone().attribute("primary_dns"));
        check_ip(
            diags,
            &self.secondary_dns,
            attr_path.clone().attribute("secondary_dns"),
        );
        for (i, dns) in self.dns_list.iter().flatten().enumerate() {
            check_ip(
                diags,
                dns,
                attr_path.clone().attribute("dns_list").index(i as i64),
            );
        }

        if self.secondary_dns.is_value() && self.primary_dns.is_null() {
            diags.error_short(
                "`secondary_dns` requires `primary_dns`",
                attr_path.attribute("secondary_dns"),
            );
        }
    }
}

#[async_trait]
impl WithValidate for RouteTableState<'_> {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        for (i, route) in self.route.iter().flatten().enumerate() {
            let Value::Value(route) = route else {
                continue;
            };
            let attr_path = attr_path.clone().attribute("route").index(i as i64);
            check_cidr(
                diags,
                &route.destination,
                attr_path.clone().attribute("destination"),
            );
            if let Value::Value(route_type) = &route.route_type {
                if !ROUTE_TYPES.contains(&route_type.as_ref()) {
                    diags.error(
                        "Invalid route type",
                        format!(
                            "`{route_type}` is not a valid route type, expected one of: {}",
                            ROUTE_TYPES.join(", ")
                        ),
                        attr_path.attribute("type"),
                    );
                }
            }
        }
    }
}

impl WithNormalize for SubnetState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.dhcp_enable.is_null() {
            self.dhcp_enable = Value::Value(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vpc::state::RouteState;

    #[tokio::test]
    async fn subnet_addresses() {
        let subnet = SubnetState {
            cidr: "192.168.0.0/24".into(),
            gateway_ip: "192.168.0.1".into(),
            secondary_dns: "100.125.1.250".into(),
            dns_list: Value::Value(vec!["8.8.8.8".into(), "dns.example.com".into()]),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        subnet.validate(&mut diags, AttributePath::default()).await;
        // invalid dns_list entry, secondary_dns without primary_dns
        assert_eq!(diags.errors.len(), 2);
    }

    #[tokio::test]
    async fn unknown_values_are_not_checked() {
        let subnet = SubnetState {
            cidr: Value::Unknown,
            gateway_ip: Value::Unknown,
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        subnet.validate(&mut diags, AttributePath::default()).await;
        assert!(diags.errors.is_empty());
    }

    #[tokio::test]
    async fn route_types() {
        let route = |route_type: &'static str| {
            Value::Value(RouteState {
                destination: "172.16.0.0/16".into(),
                route_type: route_type.into(),
                nexthop: "10.0.0.5".into(),
                ..Default::default()
            })
        };
        let table = RouteTableState {
            route: Value::Value(vec![route("ecs"), route("internet")]),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        table.validate(&mut diags, AttributePath::default()).await;
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn dhcp_enabled_by_default() {
        let mut subnet = SubnetState::default();
        subnet.normalize(&mut Diagnostics::default());
        assert_eq!(subnet.dhcp_enable, Value::Value(true));

        let mut subnet = SubnetState {
            dhcp_enable: Value::Value(false),
            ..Default::default()
        };
        subnet.normalize(&mut Diagnostics::default());
        assert_eq!(subnet.dhcp_enable, Value::Value(false));
    }
}
