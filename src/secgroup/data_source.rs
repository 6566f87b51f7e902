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
use crate::utils::{json_non_empty, json_str, matches, non_empty, WithSchema};

use super::state::{SecGroupItem, SecGroupsState};
use super::SERVICE;

const PAGE_LIMIT: usize = 100;

fn group_item<'a>(group: &Json) -> SecGroupItem<'a> {
    SecGroupItem {
        id: json_str(group, "id"),
        name: json_str(group, "name"),
        description: json_non_empty(group, "description"),
        enterprise_project_id: json_str(group, "enterprise_project_id"),
        created_at: json_str(group, "created_at"),
        updated_at: json_str(group, "updated_at"),
    }
}

impl SecGroupsState<'_> {
    fn matches(&self, group: &Json) -> bool {
        matches(group, "id", &self.id)
            && matches(group, "name", &self.name)
            && matches(group, "description", &self.description)
            && matches(group, "enterprise_project_id", &self.enterprise_project_id)
    }
}

#[derive(Debug, Default, Clone)]
pub struct SecGroupsDataSource {
    client: ClientHandle,
}

impl SecGroupsDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for SecGroupsDataSource {
    type State<'a> = SecGroupsState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SecGroupsState::schema())
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
            ("id", &config.id),
            ("name", &config.name),
            ("enterprise_project_id", &config.enterprise_project_id),
        ]
        .into_iter()
        .filter_map(|(key, value)| Some((key, non_empty(value)?)))
        .collect();
        let groups = match list_all(
            &service,
            "/v3/{project_id}/vpc/security-groups",
            &query,
            "security_groups",
            PageStyle::Marker { limit: PAGE_LIMIT },
        )
        .await
        {
            Ok(groups) => groups,
            Err(err) => {
                diags.root_error("Failed to list the security groups", err.to_string());
                return None;
            }
        };

        let mut state = config.clone();
        state.region = region.into();
        state.security_groups = Value::Value(
            groups
                .iter()
                .filter(|group| config.matches(group))
                .map(|group| Value::Value(group_item(group)))
                .collect(),
        );
        debug!(
            count = state.security_groups.iter().flatten().count(),
            "Listed security groups"
        );
        Some(state)
    }
}
