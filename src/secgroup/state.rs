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

use serde::{Deserialize, Serialize};

use tf_provider::schema::AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
use tf_provider::map;
use tf_provider::schema::{Attribute, AttributeType, Block, Description, Schema};
use tf_provider::value::{Value, ValueBool, ValueList, ValueMap, ValueNumber, ValueString};

use crate::utils::{attribute, string_map, WithSchema};

/// Rule of a security group, as listed by the group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RuleItem<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub direction: ValueString<'a>,
    pub ethertype: ValueString<'a>,
    pub ports: ValueString<'a>,
    pub protocol: ValueString<'a>,
    pub remote_ip_prefix: ValueString<'a>,
    pub remote_group_id: ValueString<'a>,
    pub remote_address_group_id: ValueString<'a>,
    pub description: ValueString<'a>,
    pub action: ValueString<'a>,
    pub priority: ValueNumber,
    pub port_range_min: ValueNumber,
    pub port_range_max: ValueNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SecGroupState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub enterprise_project_id: ValueString<'a>,
    pub delete_default_rules: ValueBool,
    pub rules: ValueList<Value<RuleItem<'a>>>,
    pub tags: ValueMap<'a, ValueString<'a>>,
    pub created_at: ValueString<'a>,
    pub updated_at: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SecGroupRuleState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    pub security_group_id: ValueString<'a>,
    pub direction: ValueString<'a>,
    pub ethertype: ValueString<'a>,
    pub protocol: ValueString<'a>,
    pub ports: ValueString<'a>,
    pub port_range_min: ValueNumber,
    pub port_range_max: ValueNumber,
    pub remote_ip_prefix: ValueString<'a>,
    pub remote_group_id: ValueString<'a>,
    pub remote_address_group_id: ValueString<'a>,
    pub description: ValueString<'a>,
    pub action: ValueString<'a>,
    pub priority: ValueNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SecGroupItem<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub enterprise_project_id: ValueString<'a>,
    pub created_at: ValueString<'a>,
    pub updated_at: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SecGroupsState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub enterprise_project_id: ValueString<'a>,
    pub security_groups: ValueList<Value<SecGroupItem<'a>>>,
}

impl WithSchema for SecGroupState<'_> {
    fn schema() -> Schema {
        let string = |description: &'static str| {
            attribute(AttributeType::String, Computed, description)
        };
        let number = |description: &'static str| {
            attribute(AttributeType::Number, Computed, description)
        };
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => string("ID of the security group"),
                    "region" => attribute(
                        AttributeType::String,
                        OptionalComputed,
                        "The region in which to create the security group, defaults to the provider region",
                    ),
                    "name" => attribute(AttributeType::String, Required, "Name of the security group"),
                    "description" => attribute(AttributeType::String, Optional, "Supplementary information about the security group"),
                    "enterprise_project_id" => attribute(
                        AttributeType::String,
                        OptionalComputed,
                        "Enterprise project of the security group",
                    ),
                    "delete_default_rules" => attribute(
                        AttributeType::Bool,
                        Optional,
                        "Whether the default rules created with the group are deleted",
                    ),
                    "rules" => attribute(
                        AttributeType::AttributeList(map! {
                            "id" => string("ID of the rule"),
                            "direction" => string("Direction of the rule: ingress or egress"),
                            "ethertype" => string("IP version: IPv4 or IPv6"),
                            "ports" => string("Ports and port ranges of the rule"),
                            "protocol" => string("Protocol of the rule"),
                            "remote_ip_prefix" => string("Remote CIDR of the rule"),
                            "remote_group_id" => string("Remote security group of the rule"),
                            "remote_address_group_id" => string("Remote address group of the rule"),
                            "description" => string("Supplementary information about the rule"),
                            "action" => string("Action of the rule: allow or deny"),
                            "priority" => number("Priority of the rule"),
                            "port_range_min" => Attribute {
                                deprecated: true,
                                ..number("Lower bound of the port range, use `ports` instead")
                            },
                            "port_range_max" => Attribute {
                                deprecated: true,
                                ..number("Upper bound of the port range, use `ports` instead")
                            },
                        }),
                        Computed,
                        "Rules of the security group",
                    ),
                    "tags" => attribute(string_map(), Optional, "Key/value pairs to associate with the security group"),
                    "created_at" => string("Creation time"),
                    "updated_at" => string("Last update time"),
                },
                description: Description::plain("Networking security group"),
                ..Default::default()
            },
        }
    }
}

impl WithSchema for SecGroupRuleState<'_> {
    fn schema() -> Schema {
        let optional = |description: &'static str| {
            attribute(AttributeType::String, Optional, description)
        };
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => attribute(AttributeType::String, Computed, "ID of the rule"),
                    "region" => attribute(
                        AttributeType::String,
                        OptionalComputed,
                        "The region in which to create the rule, defaults to the provider region",
                    ),
                    "security_group_id" => attribute(AttributeType::String, Required, "Security group of the rule"),
                    "direction" => attribute(AttributeType::String, Required, "Direction of the rule: ingress or egress"),
                    "ethertype" => attribute(AttributeType::String, OptionalComputed, "IP version: IPv4 (default) or IPv6"),
                    "protocol" => optional("Protocol of the rule: tcp, udp, icmp, icmpv6 or a protocol number"),
                    "ports" => attribute(
                        AttributeType::String,
                        OptionalComputed,
                        "Ports and port ranges of the rule, e.g. `80,443,8000-8080`",
                    ),
                    "port_range_min" => attribute(AttributeType::Number, OptionalComputed, "Lower bound of the port range"),
                    "port_range_max" => attribute(AttributeType::Number, OptionalComputed, "Upper bound of the port range"),
                    "remote_ip_prefix" => attribute(AttributeType::String, OptionalComputed, "Remote CIDR of the rule"),
                    "remote_group_id" => optional("Remote security group of the rule"),
                    "remote_address_group_id" => optional("Remote address group of the rule"),
                    "description" => optional("Supplementary information about the rule"),
                    "action" => attribute(AttributeType::String, OptionalComputed, "Action of the rule: allow (default) or deny"),
                    "priority" => attribute(AttributeType::Number, OptionalComputed, "Priority of the rule, from 1 (default, highest) to 100"),
                },
                description: Description::plain("Rule of a networking security group, every change replaces the rule"),
                ..Default::default()
            },
        }
    }
}

impl WithSchema for SecGroupsState<'_> {
    fn schema() -> Schema {
        let filter = |description: &'static str| {
            attribute(AttributeType::String, Optional, description)
        };
        let computed = |description: &'static str| {
            attribute(AttributeType::String, Computed, description)
        };
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => filter("ID of the security group to look for"),
                    "region" => filter("Region to query, defaults to the provider region"),
                    "name" => filter("Name of the security groups to look for"),
                    "description" => filter("Description of the security groups to look for"),
                    "enterprise_project_id" => filter("Enterprise project of the security groups to look for"),
                    "security_groups" => attribute(
                        AttributeType::AttributeList(map! {
                            "id" => computed("ID of the security group"),
                            "name" => computed("Name of the security group"),
                            "description" => computed("Description of the security group"),
                            "enterprise_project_id" => computed("Enterprise project of the security group"),
                            "created_at" => computed("Creation time"),
                            "updated_at" => computed("Last update time"),
                        }),
                        Computed,
                        "Security groups matching the filters",
                    ),
                },
                description: Description::plain("List the security groups of a region"),
                ..Default::default()
            },
        }
    }
}
