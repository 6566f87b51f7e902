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
use tf_provider::schema::{Attribute, AttributeType, Block, Description, NestedBlock, Schema};
use tf_provider::value::{Value, ValueBool, ValueList, ValueMap, ValueSet, ValueString};

use crate::utils::{attribute, string_list, string_map, string_set, WithSchema};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VpcState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    pub name: ValueString<'a>,
    pub cidr: ValueString<'a>,
    pub description: ValueString<'a>,
    pub enterprise_project_id: ValueString<'a>,
    pub tags: ValueMap<'a, ValueString<'a>>,
    pub status: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SubnetState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    pub name: ValueString<'a>,
    pub cidr: ValueString<'a>,
    pub gateway_ip: ValueString<'a>,
    pub vpc_id: ValueString<'a>,
    pub availability_zone: ValueString<'a>,
    pub description: ValueString<'a>,
    pub ipv6_enable: ValueBool,
    pub dhcp_enable: ValueBool,
    pub primary_dns: ValueString<'a>,
    pub secondary_dns: ValueString<'a>,
    pub dns_list: ValueList<ValueString<'a>>,
    pub ntp_server_address: ValueString<'a>,
    pub dhcp_lease_time: ValueString<'a>,
    pub dhcp_ipv6_lease_time: ValueString<'a>,
    pub dhcp_domain_name: ValueString<'a>,
    pub subnet_id: ValueString<'a>,
    pub ipv4_subnet_id: ValueString<'a>,
    pub ipv6_subnet_id: ValueString<'a>,
    pub ipv6_cidr: ValueString<'a>,
    pub ipv6_gateway: ValueString<'a>,
    pub status: ValueString<'a>,
    pub tags: ValueMap<'a, ValueString<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RouteState<'a> {
    #[serde(borrow = "'a")]
    pub destination: ValueString<'a>,
    #[serde(rename = "type")]
    pub route_type: ValueString<'a>,
    pub nexthop: ValueString<'a>,
    pub description: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RouteTableState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    pub vpc_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub subnets: ValueSet<ValueString<'a>>,
    pub route: ValueList<Value<RouteState<'a>>>,
    pub default: ValueBool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VpcItem<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub cidr: ValueString<'a>,
    pub status: ValueString<'a>,
    pub description: ValueString<'a>,
    pub enterprise_project_id: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VpcsState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    pub name: ValueString<'a>,
    pub cidr: ValueString<'a>,
    pub status: ValueString<'a>,
    pub enterprise_project_id: ValueString<'a>,
    pub vpcs: ValueList<Value<VpcItem<'a>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SubnetItem<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub cidr: ValueString<'a>,
    pub status: ValueString<'a>,
    pub vpc_id: ValueString<'a>,
    pub gateway_ip: ValueString<'a>,
    pub availability_zone: ValueString<'a>,
    pub primary_dns: ValueString<'a>,
    pub secondary_dns: ValueString<'a>,
    pub dhcp_enable: ValueBool,
    pub ipv4_subnet_id: ValueString<'a>,
    pub ipv6_subnet_id: ValueString<'a>,
    pub ipv6_cidr: ValueString<'a>,
    pub description: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SubnetsState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    pub vpc_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub cidr: ValueString<'a>,
    pub status: ValueString<'a>,
    pub availability_zone: ValueString<'a>,
    pub subnets: ValueList<Value<SubnetItem<'a>>>,
}

fn region() -> Attribute {
    attribute(
        AttributeType::String,
        OptionalComputed,
        "The region in which to create the resource, defaults to the provider region",
    )
}

fn id() -> Attribute {
    attribute(AttributeType::String, Computed, "ID of the resource")
}

fn tags() -> Attribute {
    attribute(string_map(), Optional, "Key/value pairs to associate with the resource")
}

impl WithSchema for VpcState<'_> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id(),
                    "region" => region(),
                    "name" => attribute(AttributeType::String, Required, "Name of the VPC"),
                    "cidr" => attribute(AttributeType::String, Required, "Range of available subnets in the VPC"),
                    "description" => attribute(AttributeType::String, Optional, "Supplementary information about the VPC"),
                    "enterprise_project_id" => attribute(
                        AttributeType::String,
                        OptionalComputed,
                        "Enterprise project of the VPC",
                    ),
                    "tags" => tags(),
                    "status" => attribute(AttributeType::String, Computed, "Status of the VPC"),
                },
                description: Description::plain("Virtual Private Cloud"),
                ..Default::default()
            },
        }
    }
}

impl WithSchema for SubnetState<'_> {
    fn schema() -> Schema {
        let computed = |description: &'static str| {
            attribute(AttributeType::String, Computed, description)
        };
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id(),
                    "region" => region(),
                    "name" => attribute(AttributeType::String, Required, "Name of the subnet"),
                    "cidr" => attribute(AttributeType::String, Required, "Network segment of the subnet"),
                    "gateway_ip" => attribute(AttributeType::String, Required, "Gateway of the subnet"),
                    "vpc_id" => attribute(AttributeType::String, Required, "VPC the subnet belongs to"),
                    "availability_zone" => attribute(
                        AttributeType::String,
                        OptionalComputed,
                        "Availability zone of the subnet",
                    ),
                    "description" => attribute(AttributeType::String, Optional, "Supplementary information about the subnet"),
                    "ipv6_enable" => attribute(AttributeType::Bool, OptionalComputed, "Whether IPv6 is enabled, it cannot be disabled once enabled"),
                    "dhcp_enable" => attribute(AttributeType::Bool, OptionalComputed, "Whether DHCP is enabled, defaults to true"),
                    "primary_dns" => attribute(AttributeType::String, OptionalComputed, "IP address of DNS server 1"),
                    "secondary_dns" => attribute(AttributeType::String, OptionalComputed, "IP address of DNS server 2"),
                    "dns_list" => attribute(string_list(), OptionalComputed, "IP addresses of the DNS servers"),
                    "ntp_server_address" => attribute(AttributeType::String, Optional, "NTP server addresses, comma separated"),
                    "dhcp_lease_time" => attribute(AttributeType::String, OptionalComputed, "DHCP lease time of IPv4 addresses"),
                    "dhcp_ipv6_lease_time" => attribute(AttributeType::String, OptionalComputed, "DHCP lease time of IPv6 addresses"),
                    "dhcp_domain_name" => attribute(AttributeType::String, Optional, "Domain name configured in DHCP"),
                    "subnet_id" => Attribute {
                        deprecated: true,
                        ..computed("ID of the IPv4 subnet, use `ipv4_subnet_id` instead")
                    },
                    "ipv4_subnet_id" => computed("ID of the IPv4 subnet"),
                    "ipv6_subnet_id" => computed("ID of the IPv6 subnet"),
                    "ipv6_cidr" => computed("IPv6 network segment of the subnet"),
                    "ipv6_gateway" => computed("IPv6 gateway of the subnet"),
                    "status" => computed("Status of the subnet"),
                    "tags" => tags(),
                },
                description: Description::plain("VPC subnet"),
                ..Default::default()
            },
        }
    }
}

impl WithSchema for RouteTableState<'_> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id(),
                    "region" => region(),
                    "vpc_id" => attribute(AttributeType::String, Required, "VPC the route table belongs to"),
                    "name" => attribute(AttributeType::String, Required, "Name of the route table"),
                    "description" => attribute(AttributeType::String, Optional, "Supplementary information about the route table"),
                    "subnets" => attribute(string_set(), OptionalComputed, "Subnets associated with the route table"),
                    "default" => attribute(AttributeType::Bool, Computed, "Whether the route table is the default one of the VPC"),
                },
                blocks: map! {
                    "route" => NestedBlock::List(Block {
                        attributes: map! {
                            "destination" => attribute(AttributeType::String, Required, "Destination CIDR of the route"),
                            "type" => attribute(
                                AttributeType::String,
                                Required,
                                "Type of the next hop: ecs, eni, vip, nat, peering, vpn, dc or cc",
                            ),
                            "nexthop" => attribute(AttributeType::String, Required, "Next hop of the route"),
                            "description" => attribute(AttributeType::String, Optional, "Supplementary information about the route"),
                        },
                        description: Description::plain("Route of the table"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("Custom route table of a VPC"),
                ..Default::default()
            },
        }
    }
}

impl WithSchema for VpcsState<'_> {
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
                    "id" => filter("ID of the VPC to look for"),
                    "region" => filter("Region to query, defaults to the provider region"),
                    "name" => filter("Name of the VPCs to look for"),
                    "cidr" => filter("CIDR of the VPCs to look for"),
                    "status" => filter("Status of the VPCs to look for"),
                    "enterprise_project_id" => filter("Enterprise project of the VPCs to look for"),
                    "vpcs" => attribute(
                        AttributeType::AttributeList(map! {
                            "id" => computed("ID of the VPC"),
                            "name" => computed("Name of the VPC"),
                            "cidr" => computed("CIDR of the VPC"),
                            "status" => computed("Status of the VPC"),
                            "description" => computed("Description of the VPC"),
                            "enterprise_project_id" => computed("Enterprise project of the VPC"),
                        }),
                        Computed,
                        "VPCs matching the filters",
                    ),
                },
                description: Description::plain("List the VPCs of a region"),
                ..Default::default()
            },
        }
    }
}

impl WithSchema for SubnetsState<'_> {
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
                    "id" => filter("ID of the subnet to look for"),
                    "region" => filter("Region to query, defaults to the provider region"),
                    "vpc_id" => filter("VPC of the subnets to look for"),
                    "name" => filter("Name of the subnets to look for"),
                    "cidr" => filter("CIDR of the subnets to look for"),
                    "status" => filter("Status of the subnets to look for"),
                    "availability_zone" => filter("Availability zone of the subnets to look for"),
                    "subnets" => attribute(
                        AttributeType::AttributeList(map! {
                            "id" => computed("ID of the subnet"),
                            "name" => computed("Name of the subnet"),
                            "cidr" => computed("CIDR of the subnet"),
                            "status" => computed("Status of the subnet"),
                            "vpc_id" => computed("VPC of the subnet"),
                            "gateway_ip" => computed("Gateway of the subnet"),
                            "availability_zone" => computed("Availability zone of the subnet"),
                            "primary_dns" => computed("IP address of DNS server 1"),
                            "secondary_dns" => computed("IP address of DNS server 2"),
                            "dhcp_enable" => attribute(AttributeType::Bool, Computed, "Whether DHCP is enabled"),
                            "ipv4_subnet_id" => computed("ID of the IPv4 subnet"),
                            "ipv6_subnet_id" => computed("ID of the IPv6 subnet"),
                            "ipv6_cidr" => computed("IPv6 network segment of the subnet"),
                            "description" => computed("Description of the subnet"),
                        }),
                        Computed,
                        "Subnets matching the filters",
                    ),
                },
                description: Description::plain("List the subnets of a region"),
                ..Default::default()
            },
        }
    }
}
