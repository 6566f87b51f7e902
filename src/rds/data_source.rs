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
use crate::utils::{json_i64, json_str, json_str_list, matches, non_empty, WithSchema};

use super::state::{RdsInstanceItem, RdsInstancesState};
use super::SERVICE;

const PAGE_LIMIT: usize = 100;

fn instance_item<'a>(instance: &Json) -> RdsInstanceItem<'a> {
    RdsInstanceItem {
        id: json_str(instance, "id"),
        name: json_str(instance, "name"),
        status: json_str(instance, "status"),
        instance_type: json_str(instance, "type"),
        flavor: json_str(instance, "flavor_ref"),
        vpc_id: json_str(instance, "vpc_id"),
        subnet_id: json_str(instance, "subnet_id"),
        security_group_id: json_str(instance, "security_group_id"),
        datastore_type: json_str(&instance["datastore"], "type"),
        datastore_version: json_str(&instance["datastore"], "version"),
        port: json_i64(instance, "port"),
        private_ips: json_str_list(instance, "private_ips"),
        public_ips: json_str_list(instance, "public_ips"),
        enterprise_project_id: json_str(instance, "enterprise_project_id"),
        time_zone: json_str(instance, "time_zone"),
        created: json_str(instance, "created"),
    }
}

impl RdsInstancesState<'_> {
    /// The list API matches names by prefix, keep exact matches only
    fn matches(&self, instance: &Json) -> bool {
        let datastore = match non_empty(&self.datastore_type) {
            Some(datastore) => instance["datastore"]["type"]
                .as_str()
                .is_some_and(|found| found.eq_ignore_ascii_case(datastore)),
            None => true,
        };
        datastore
            && matches(instance, "name", &self.name)
            && matches(instance, "type", &self.instance_type)
            && matches(instance, "vpc_id", &self.vpc_id)
            && matches(instance, "subnet_id", &self.subnet_id)
            && matches(instance, "enterprise_project_id", &self.enterprise_project_id)
    }
}

#[derive(Debug, Default, Clone)]
pub struct RdsInstancesDataSource {
    client: ClientHandle,
}

impl RdsInstancesDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for RdsInstancesDataSource {
    type State<'a> = RdsInstancesState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(RdsInstancesState::schema())
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

        let query: Vec<(&str, &str)> = [
            ("name", &config.name),
            ("type", &config.instance_type),
            ("datastore_type", &config.datastore_type),
            ("vpc_id", &config.vpc_id),
            ("subnet_id", &config.subnet_id),
            ("enterprise_project_id", &config.enterprise_project_id),
        ]
        .into_iter()
        .filter_map(|(key, value)| Some((key, non_empty(value)?)))
        .collect();
        let instances = match list_all(
            &service,
            "/v3/{project_id}/instances",
            &query,
            "instances",
            PageStyle::Offset { limit: PAGE_LIMIT },
        )
        .await
        {
            Ok(instances) => instances,
            Err(err) => {
                diags.root_error("Failed to list the RDS instances", err.to_string());
                return None;
            }
        };

        let mut state = config.clone();
        state.region = region.into();
        state.instances = Value::Value(
            instances
                .iter()
                .filter(|instance| config.matches(instance))
                .map(|instance| Value::Value(instance_item(instance)))
                .collect(),
        );
        debug!(
            count = state.instances.iter().flatten().count(),
            "Listed RDS instances"
        );
        Some(state)
    }
}
