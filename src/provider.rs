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

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::info;

use tf_provider::{map, AttributePath, DynamicDataSource, DynamicResource, Provider};
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty};

use crate::client::{Client, ClientHandle};
use crate::config::{Config, ProviderState};
use crate::rds::{RdsBackupResource, RdsInstanceResource, RdsInstancesDataSource};
use crate::secgroup::{SecGroupResource, SecGroupRuleResource, SecGroupsDataSource};
use crate::utils::WithSchema;
use crate::vpc::{
    RouteTableResource, SubnetResource, SubnetsDataSource, VpcResource, VpcsDataSource,
};

#[derive(Debug, Default, Clone)]
pub struct HuaweiCloudProvider {
    client: ClientHandle,
}

#[async_trait]
impl Provider for HuaweiCloudProvider {
    type Config<'a> = ProviderState<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut tf_provider::Diagnostics) -> Option<Schema> {
        Some(ProviderState::schema())
    }

    async fn validate<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        config: Self::Config<'a>,
    ) -> Option<()> {
        for (service, endpoint) in config.endpoints.iter().flatten() {
            if let Value::Value(endpoint) = endpoint {
                if let Err(err) = url::Url::parse(endpoint) {
                    diags.error(
                        "Invalid endpoint",
                        format!("`{endpoint}` is not a valid URL: {err}"),
                        AttributePath::new("endpoints").key(service.to_string()),
                    );
                }
            }
        }
        if let Value::Value(max_retries) = config.max_retries {
            if u32::try_from(max_retries).is_err() {
                diags.error(
                    "Invalid `max_retries`",
                    format!("`max_retries` must be between 0 and {}, got {max_retries}", u32::MAX),
                    AttributePath::new("max_retries"),
                );
            }
        }

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn configure<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let config = Config::from_state(diags, &config)?;
        if let Err(err) = config.check_endpoints() {
            diags.error(
                "Invalid endpoint",
                err.to_string(),
                AttributePath::new("endpoints"),
            );
            return None;
        }

        let region = config.region.clone();
        match Client::new(config) {
            Ok(client) => {
                self.client.set(client);
                info!(terraform_version, region, "Provider configured");
                Some(())
            }
            Err(err) => {
                diags.root_error("Failed to create the API client", err.to_string());
                None
            }
        }
    }

    fn get_resources(
        &self,
        _diags: &mut tf_provider::Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        let client = &self.client;
        Some(map! {
            "vpc" => VpcResource::new(client.clone()),
            "vpc_subnet" => SubnetResource::new(client.clone()),
            "vpc_route_table" => RouteTableResource::new(client.clone()),
            "networking_secgroup" => SecGroupResource::new(client.clone()),
            "networking_secgroup_rule" => SecGroupRuleResource::new(client.clone()),
            "rds_instance" => RdsInstanceResource::new(client.clone()),
            "rds_backup" => RdsBackupResource::new(client.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut tf_provider::Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        let client = &self.client;
        Some(map! {
            "vpcs" => VpcsDataSource::new(client.clone()),
            "vpc_subnets" => SubnetsDataSource::new(client.clone()),
            "networking_secgroups" => SecGroupsDataSource::new(client.clone()),
            "rds_instances" => RdsInstancesDataSource::new(client.clone()),
        })
    }
}
