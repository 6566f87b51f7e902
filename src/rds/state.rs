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
use tf_provider::value::{self, Value, ValueBool, ValueList, ValueMap, ValueNumber, ValueString};

use crate::utils::{attribute, string_list, string_map, WithSchema};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DbBlock<'a> {
    #[serde(borrow = "'a")]
    #[serde(rename = "type")]
    pub db_type: ValueString<'a>,
    pub version: ValueString<'a>,
    pub password: ValueString<'a>,
    pub port: ValueNumber,
    pub user_name: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VolumeBlock<'a> {
    #[serde(borrow = "'a")]
    #[serde(rename = "type")]
    pub volume_type: ValueString<'a>,
    pub size: ValueNumber,
    pub disk_encryption_id: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BackupStrategyBlock<'a> {
    #[serde(borrow = "'a")]
    pub start_time: ValueString<'a>,
    pub keep_days: ValueNumber,
    pub period: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RestoreBlock<'a> {
    #[serde(borrow = "'a")]
    pub instance_id: ValueString<'a>,
    pub backup_id: ValueString<'a>,
    pub database_name: ValueMap<'a, ValueString<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NodeItem<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub role: ValueString<'a>,
    pub status: ValueString<'a>,
    pub availability_zone: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RdsInstanceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub flavor: ValueString<'a>,
    pub availability_zone: ValueList<ValueString<'a>>,
    pub vpc_id: ValueString<'a>,
    pub subnet_id: ValueString<'a>,
    pub security_group_id: ValueString<'a>,
    pub param_group_id: ValueString<'a>,
    pub time_zone: ValueString<'a>,
    pub collation: ValueString<'a>,
    pub fixed_ip: ValueString<'a>,
    pub ha_replication_mode: ValueString<'a>,
    pub lower_case_table_names: ValueString<'a>,
    pub ssl_enable: ValueBool,
    pub enterprise_project_id: ValueString<'a>,
    pub maintain_begin: ValueString<'a>,
    pub maintain_end: ValueString<'a>,
    pub private_dns_name_prefix: ValueString<'a>,
    pub private_dns_names: ValueList<ValueString<'a>>,
    pub private_ips: ValueList<ValueString<'a>>,
    pub public_ips: ValueList<ValueString<'a>>,
    pub nodes: ValueList<Value<NodeItem<'a>>>,
    pub status: ValueString<'a>,
    pub created: ValueString<'a>,
    pub tags: ValueMap<'a, ValueString<'a>>,
    pub db: Value<DbBlock<'a>>,
    pub volume: Value<VolumeBlock<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub backup_strategy: Value<BackupStrategyBlock<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub restore: Value<RestoreBlock<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RdsBackupState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    pub instance_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub databases: ValueList<ValueString<'a>>,
    #[serde(rename = "type")]
    pub backup_type: ValueString<'a>,
    pub size: ValueNumber,
    pub status: ValueString<'a>,
    pub begin_time: ValueString<'a>,
    pub end_time: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RdsInstanceItem<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub status: ValueString<'a>,
    #[serde(rename = "type")]
    pub instance_type: ValueString<'a>,
    pub flavor: ValueString<'a>,
    pub vpc_id: ValueString<'a>,
    pub subnet_id: ValueString<'a>,
    pub security_group_id: ValueString<'a>,
    pub datastore_type: ValueString<'a>,
    pub datastore_version: ValueString<'a>,
    pub port: ValueNumber,
    pub private_ips: ValueList<ValueString<'a>>,
    pub public_ips: ValueList<ValueString<'a>>,
    pub enterprise_project_id: ValueString<'a>,
    pub time_zone: ValueString<'a>,
    pub created: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RdsInstancesState<'a> {
    #[serde(borrow = "'a")]
    pub region: ValueString<'a>,
    pub name: ValueString<'a>,
    #[serde(rename = "type")]
    pub instance_type: ValueString<'a>,
    pub datastore_type: ValueString<'a>,
    pub vpc_id: ValueString<'a>,
    pub subnet_id: ValueString<'a>,
    pub enterprise_project_id: ValueString<'a>,
    pub instances: ValueList<Value<RdsInstanceItem<'a>>>,
}

fn string(constraint: tf_provider::schema::AttributeConstraint, description: &'static str) -> Attribute {
    attribute(AttributeType::String, constraint, description)
}

impl WithSchema for RdsInstanceState<'_> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => string(Computed, "ID of the instance"),
                    "region" => string(
                        OptionalComputed,
                        "The region in which to create the instance, defaults to the provider region",
                    ),
                    "name" => string(Required, "Name of the instance"),
                    "description" => string(Optional, "Description of the instance"),
                    "flavor" => string(Required, "Specification code of the instance flavor"),
                    "availability_zone" => attribute(
                        string_list(),
                        Required,
                        "Availability zones of the instance, the first one hosts the primary node",
                    ),
                    "vpc_id" => string(Required, "VPC of the instance"),
                    "subnet_id" => string(Required, "Subnet of the instance"),
                    "security_group_id" => string(Required, "Security group of the instance"),
                    "param_group_id" => string(Optional, "Parameter template of the instance"),
                    "time_zone" => string(OptionalComputed, "UTC time zone of the instance"),
                    "collation" => string(OptionalComputed, "Collation of a SQL Server instance"),
                    "fixed_ip" => string(OptionalComputed, "Private IP address of the instance"),
                    "ha_replication_mode" => string(
                        Optional,
                        "Replication mode of a primary/standby instance: async, sync or semisync",
                    ),
                    "lower_case_table_names" => string(
                        Optional,
                        "Whether table names of a MySQL instance are case sensitive",
                    ),
                    "ssl_enable" => attribute(AttributeType::Bool, OptionalComputed, "Whether SSL is enabled"),
                    "enterprise_project_id" => string(OptionalComputed, "Enterprise project of the instance"),
                    "maintain_begin" => string(OptionalComputed, "Start of the maintenance window (HH:MM)"),
                    "maintain_end" => string(OptionalComputed, "End of the maintenance window (HH:MM)"),
                    "private_dns_name_prefix" => string(Computed, "Prefix of the private domain name"),
                    "private_dns_names" => attribute(string_list(), Computed, "Private domain names"),
                    "private_ips" => attribute(string_list(), Computed, "Private IP addresses"),
                    "public_ips" => attribute(string_list(), Computed, "Public IP addresses"),
                    "nodes" => attribute(
                        AttributeType::AttributeList(map! {
                            "id" => string(Computed, "ID of the node"),
                            "name" => string(Computed, "Name of the node"),
                            "role" => string(Computed, "Role of the node: master, slave or readreplica"),
                            "status" => string(Computed, "Status of the node"),
                            "availability_zone" => string(Computed, "Availability zone of the node"),
                        }),
                        Computed,
                        "Nodes of the instance",
                    ),
                    "status" => string(Computed, "Status of the instance"),
                    "created" => string(Computed, "Creation time of the instance"),
                    "tags" => attribute(string_map(), Optional, "Key/value pairs to associate with the instance"),
                },
                blocks: map! {
                    "db" => NestedBlock::Single(Block {
                        attributes: map! {
                            "type" => string(Required, "Database engine: MySQL, PostgreSQL or SQLServer"),
                            "version" => string(Required, "Database version"),
                            "password" => Attribute {
                                sensitive: true,
                                ..string(Optional, "Password of the database administrator")
                            },
                            "port" => attribute(AttributeType::Number, OptionalComputed, "Port of the database"),
                            "user_name" => string(Computed, "Name of the default user"),
                        },
                        description: Description::plain("Database engine of the instance"),
                        ..Default::default()
                    }),
                    "volume" => NestedBlock::Single(Block {
                        attributes: map! {
                            "type" => string(Required, "Volume type: ULTRAHIGH, LOCALSSD, CLOUDSSD or ESSD"),
                            "size" => attribute(AttributeType::Number, Required, "Volume size in GB, it can only be enlarged"),
                            "disk_encryption_id" => string(OptionalComputed, "Key used to encrypt the volume"),
                        },
                        description: Description::plain("Storage of the instance"),
                        ..Default::default()
                    }),
                    "backup_strategy" => NestedBlock::Optional(Block {
                        attributes: map! {
                            "start_time" => string(Required, "Backup window, formatted as hh:mm-HH:MM"),
                            "keep_days" => attribute(AttributeType::Number, OptionalComputed, "Number of days backups are kept"),
                            "period" => string(OptionalComputed, "Days of the week backups run, comma separated"),
                        },
                        description: Description::plain("Automated backup policy"),
                        ..Default::default()
                    }),
                    "restore" => NestedBlock::Optional(Block {
                        attributes: map! {
                            "instance_id" => string(Required, "Instance the backup belongs to"),
                            "backup_id" => string(Required, "Backup to restore"),
                            "database_name" => attribute(string_map(), Optional, "Databases to restore, old name to new name"),
                        },
                        description: Description::plain("Create the instance from a backup"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("Relational database instance"),
                ..Default::default()
            },
        }
    }
}

impl WithSchema for RdsBackupState<'_> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => string(Computed, "ID of the backup"),
                    "region" => string(
                        OptionalComputed,
                        "The region of the instance, defaults to the provider region",
                    ),
                    "instance_id" => string(Required, "Instance to back up"),
                    "name" => string(Required, "Name of the backup"),
                    "description" => string(Optional, "Description of the backup"),
                    "databases" => attribute(string_list(), Optional, "Databases to back up, all of them when empty"),
                    "type" => string(Computed, "Type of the backup"),
                    "size" => attribute(AttributeType::Number, Computed, "Size of the backup in KB"),
                    "status" => string(Computed, "Status of the backup"),
                    "begin_time" => string(Computed, "Start time of the backup"),
                    "end_time" => string(Computed, "End time of the backup"),
                },
                description: Description::plain("Manual backup of a relational database instance"),
                ..Default::default()
            },
        }
    }
}

impl WithSchema for RdsInstancesState<'_> {
    fn schema() -> Schema {
        let computed = |description: &'static str| string(Computed, description);
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "region" => string(Optional, "Region to query, defaults to the provider region"),
                    "name" => string(Optional, "Name of the instances to look for"),
                    "type" => string(Optional, "Type of the instances to look for: Single, Ha or Replica"),
                    "datastore_type" => string(Optional, "Database engine of the instances to look for"),
                    "vpc_id" => string(Optional, "VPC of the instances to look for"),
                    "subnet_id" => string(Optional, "Subnet of the instances to look for"),
                    "enterprise_project_id" => string(Optional, "Enterprise project of the instances to look for"),
                    "instances" => attribute(
                        AttributeType::AttributeList(map! {
                            "id" => computed("ID of the instance"),
                            "name" => computed("Name of the instance"),
                            "status" => computed("Status of the instance"),
                            "type" => computed("Type of the instance"),
                            "flavor" => computed("Flavor of the instance"),
                            "vpc_id" => computed("VPC of the instance"),
                            "subnet_id" => computed("Subnet of the instance"),
                            "security_group_id" => computed("Security group of the instance"),
                            "datastore_type" => computed("Database engine of the instance"),
                            "datastore_version" => computed("Database version of the instance"),
                            "port" => attribute(AttributeType::Number, Computed, "Port of the database"),
                            "private_ips" => attribute(string_list(), Computed, "Private IP addresses"),
                            "public_ips" => attribute(string_list(), Computed, "Public IP addresses"),
                            "enterprise_project_id" => computed("Enterprise project of the instance"),
                            "time_zone" => computed("Time zone of the instance"),
                            "created" => computed("Creation time of the instance"),
                        }),
                        Computed,
                        "Instances matching the filters",
                    ),
                },
                description: Description::plain("List the relational database instances of a region"),
                ..Default::default()
            },
        }
    }
}
