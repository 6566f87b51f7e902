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
use serde_json::Value as Json;
use tracing::debug;

use tf_provider::{DataSource, Diagnostics};
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty};

use crate::client::ClientHandle;
use crate::pagination::{list_all, PageStyle};
use crate::utils::{json_bool, json_non_empty, json_str, matches, non_empty, WithSchema};

use super::state::{SubnetItem, SubnetsState, VpcItem, VpcsState};
use super::SERVICE;

const PAGE_LIMIT: usize = 100;

fn vpc_item<'a>(vpc: &Json) -> VpcItem<'a> {
    VpcItem {
        id: json_str(vpc, "id"),
        name: json_str(vpc, "name"),
        cidr: json_str(vpc, "cidr"),
        status: json_str(vpc, "status"),
        description: json_non_empty(vpc, "description"),
        enterprise_project_id: json_str(vpc, "enterprise_project_id"),
    }
}

fn subnet_item<'a>(subnet: &Json) -> SubnetItem<'a> {
    SubnetItem {
        id: json_str(subnet, "id"),
        name: json_str(subnet, "name"),
        cidr: json_str(subnet, "cidr"),
        status: json_str(subnet, "status"),
        vpc_id: json_str(subnet, "vpc_id"),
        gateway_ip: json_str(subnet, "gateway_ip"),
        availability_zone: json_str(subnet, "availability_zone"),
        primary_dns: json_str(subnet, "primary_dns"),
        secondary_dns: json_str(subnet, "secondary_dns"),
        dhcp_enable: json_bool(subnet, "dhcp_enable"),
        ipv4_subnet_id: json_str(subnet, "neutron_subnet_id"),
        ipv6_subnet_id: json_non_empty(subnet, "neutron_subnet_id_v6"),
        ipv6_cidr: json_non_empty(subnet, "cidr_v6"),
        description: json_non_empty(subnet, "description"),
    }
}

impl VpcsState<'_> {
    fn matches(&self, vpc: &Json) -> bool {
        matches(vpc, "id", &self.id)
            && matches(vpc, "name", &self.name)
            && matches(vpc, "cidr", &self.cidr)
            && matches(vpc, "status", &self.status)
            && matches(vpc, "enterprise_project_id", &self.enterprise_project_id)
    }
}

impl SubnetsState<'_> {
    fn matches(&self, subnet: &Json) -> bool {
        matches(subnet, "id", &self.id)
            && matches(subnet, "vpc_id", &self.vpc_id)
            && matches(subnet, "name", &self.name)
            && matches(subnet, "cidr", &self.cidr)
            && matches(subnet, "status", &self.status)
            && matches(subnet, "availability_zone", &self.availability_zone)
    }
}

#[derive(Debug, Default, Clone)]
pub struct VpcsDataSource {
    client: ClientHandle,
}

impl VpcsDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for VpcsDataSource {
    type State<'a> = VpcsState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(VpcsState::schema())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.client.get(diags)?;
        let region = client.region(&config.region).to_owned();
        let service = client.connect(diags, SERVICE, &region).await?;

        let mut query = Vec::new();
        if let Some(enterprise_project_id) = non_empty(&config.enterprise_project_id) {
            query.push(("enterprise_project_id", enterprise_project_id));
        }
        let vpcs = match list_all(
            &service,
            "/v1/{project_id}/vpcs",
            &query,
            "vpcs",
            PageStyle::Marker { limit: PAGE_LIMIT },
        )
        .await
        {
            Ok(vpcs) => vpcs,
            Err(err) => {
                diags.root_error("Failed to list the VPCs", err.to_string());
                return None;
            }
        };

        let mut state = config.clone();
        state.region = region.into();
        state.vpcs = Value::Value(
            vpcs.iter()
                .filter(|vpc| config.matches(vpc))
                .map(|vpc| Value::Value(vpc_item(vpc)))
                .collect(),
        );
        debug!(count = state.vpcs.iter().flatten().count(), "Listed VPCs");
        Some(state)
    }
}

#[derive(Debug, Default, Clone)]
pub struct SubnetsDataSource {
    client: ClientHandle,
}

impl SubnetsDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for SubnetsDataSource {
    type State<'a> = SubnetsState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SubnetsState::schema())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.client.get(diags)?;
        let region = client.region(&config.region).to_owned();
        let service = client.connect(diags, SERVICE, &region).await?;

        let mut query = Vec::new();
        if let Some(vpc_id) = non_empty(&config.vpc_id) {
            query.push(("vpc_id", vpc_id));
        }
        let subnets = match list_all(
            &service,
            "/v1/{project_id}/subnets",
            &query,
            "subnets",
            PageStyle::Marker { limit: PAGE_LIMIT },
        )
        .await
        {
            Ok(subnets) => subnets,
            Err(err) => {
                diags.root_error("Failed to list the subnets", err.to_string());
                return None;
            }
        };

        let mut state = config.clone();
        state.region = region.into();
        state.subnets = Value::Value(
            subnets
                .iter()
                .filter(|subnet| config.matches(subnet))
                .map(|subnet| Value::Value(subnet_item(subnet)))
                .collect(),
        );
        debug!(count = state.subnets.iter().flatten().count(), "Listed subnets");
        Some(state)
    }
}
