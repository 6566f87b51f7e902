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

use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use serde_json::{json, Value as Json};
use tracing::{debug, info, warn};

use tf_provider::{AttributePath, Diagnostics, Resource};
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty};

use crate::client::{ApiError, Client, ClientHandle, ServiceClient};
use crate::diff::{equal_time, keep_prior_if};
use crate::tags;
use crate::utils::{
    bool_or, check_deleted, json_i64, json_non_empty, json_str, known, prune, replace_if_changed,
    WithSchema,
};
use crate::wait::{Refreshed, StateChangeConf, DELETED};

use super::rule::{delete_rule, port_range};
use super::state::{RuleItem, SecGroupState};
use super::SERVICE;

const DELETE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Default rules deleted at the same time
const DELETE_CONCURRENCY: usize = 4;

fn group_path_v1(id: &str) -> String {
    format!("/v1/{{project_id}}/security-groups/{id}")
}

fn group_path_v3(id: &str) -> String {
    format!("/v3/{{project_id}}/vpc/security-groups/{id}")
}

fn tags_path(id: &str) -> String {
    format!("/v2.0/{{project_id}}/security-groups/{id}")
}

fn rule_v1<'a>(rule: &Json) -> Value<RuleItem<'a>> {
    Value::Value(RuleItem {
        id: json_str(rule, "id"),
        direction: json_str(rule, "direction"),
        ethertype: json_str(rule, "ethertype"),
        protocol: json_str(rule, "protocol"),
        remote_ip_prefix: json_str(rule, "remote_ip_prefix"),
        remote_group_id: json_str(rule, "remote_group_id"),
        description: json_str(rule, "description"),
        port_range_min: json_i64(rule, "port_range_min"),
        port_range_max: json_i64(rule, "port_range_max"),
        ..Default::default()
    })
}

/// Rule listed by the v3 API, whose ports are given as `multiport`
fn rule_v3<'a>(rule: &Json) -> anyhow::Result<Value<RuleItem<'a>>> {
    let ports = json_non_empty(rule, "multiport");
    let (port_range_min, port_range_max) = match port_range(ports.as_str())? {
        Some((min, max)) => (Value::Value(min), Value::Value(max)),
        None => (Value::Null, Value::Null),
    };
    Ok(Value::Value(RuleItem {
        id: json_str(rule, "id"),
        direction: json_str(rule, "direction"),
        ethertype: json_str(rule, "ethertype"),
        protocol: json_str(rule, "protocol"),
        remote_ip_prefix: json_str(rule, "remote_ip_prefix"),
        remote_group_id: json_str(rule, "remote_group_id"),
        remote_address_group_id: json_str(rule, "remote_address_group_id"),
        description: json_str(rule, "description"),
        action: json_str(rule, "action"),
        priority: json_i64(rule, "priority"),
        ports,
        port_range_min,
        port_range_max,
    }))
}

fn group_id(group: &Json) -> Result<String, ApiError> {
    group["id"]
        .as_str()
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ApiError::Other("the new security group has no id".to_owned()))
}

fn rule_ids(group: &Json) -> Vec<String> {
    group["security_group_rules"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|rule| rule["id"].as_str())
        .map(str::to_owned)
        .collect()
}

impl SecGroupState<'_> {
    fn flatten_v1(&mut self, group: &Json, region: &str) {
        self.id = json_str(group, "id");
        self.region = region.to_owned().into();
        self.name = json_str(group, "name");
        self.description = json_non_empty(group, "description");
        self.enterprise_project_id = json_str(group, "enterprise_project_id");
        self.rules = Value::Value(
            group["security_group_rules"]
                .as_array()
                .into_iter()
                .flatten()
                .map(rule_v1)
                .collect(),
        );
    }

    /// Override the v1 attributes with the richer v3 ones
    fn flatten_v3(&mut self, group: &Json) -> anyhow::Result<()> {
        self.rules = Value::Value(
            group["security_group_rules"]
                .as_array()
                .into_iter()
                .flatten()
                .map(rule_v3)
                .collect::<anyhow::Result<_>>()?,
        );
        self.name = json_str(group, "name");
        self.description = json_non_empty(group, "description");
        self.created_at = json_str(group, "created_at");
        self.updated_at = json_str(group, "updated_at");
        Ok(())
    }
}

/// Update name and description through the v2.0 API
async fn update_v2(service: &ServiceClient<'_>, id: &str, body: &Json) -> Result<(), ApiError> {
    service
        .put(&format!("/v2.0/security-groups/{id}"), body)
        .await?;
    Ok(())
}

/// One step of the deletion loop
async fn delete_step(service: &ServiceClient<'_>, id: &str) -> anyhow::Result<Refreshed<()>> {
    debug!(id, "Attempting to delete security group");
    match service.get(&group_path_v1(id)).await {
        Ok(_) => (),
        Err(err) if err.is_not_found() => {
            info!(id, "Successfully deleted security group");
            return Ok(Refreshed::Gone);
        }
        Err(err) => return Err(err.into()),
    }
    match service.delete(&group_path_v1(id)).await {
        Ok(_) => {
            debug!(id, "Security group still active");
            Ok(Refreshed::State((), "ACTIVE".to_owned()))
        }
        Err(err) if err.is_not_found() => {
            info!(id, "Successfully deleted security group");
            Ok(Refreshed::Gone)
        }
        // still in use
        Err(err) if err.is_conflict() => Ok(Refreshed::State((), "ACTIVE".to_owned())),
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Default, Clone)]
pub struct SecGroupResource {
    client: ClientHandle,
}

impl SecGroupResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    async fn refresh<'a>(
        &self,
        diags: &mut Diagnostics,
        client: &Client,
        mut state: SecGroupState<'a>,
    ) -> Option<Value<SecGroupState<'a>>> {
        let region = client.region(&state.region).to_owned();
        let service = client.connect(diags, SERVICE, &region).await?;
        let id = state.id.as_str().to_owned();
        let (prior_created, prior_updated) = (state.created_at.clone(), state.updated_at.clone());

        match service.get(&group_path_v1(&id)).await {
            Ok(response) => state.flatten_v1(&response["security_group"], &region),
            Err(err) => return check_deleted(diags, err, "Failed to read the security group"),
        }

        // the v3 API is not published in every region
        match service.get(&group_path_v3(&id)).await {
            Ok(response) => {
                if let Err(err) = state.flatten_v3(&response["security_group"]) {
                    diags.error(
                        "Failed to read the rules of the security group",
                        err.to_string(),
                        AttributePath::new("rules"),
                    );
                    return None;
                }
            }
            Err(err) => debug!(id, %err, "Security group not readable through the v3 API"),
        }
        keep_prior_if(&prior_created, &mut state.created_at, equal_time);
        keep_prior_if(&prior_updated, &mut state.updated_at, equal_time);

        match tags::get(&service, &tags_path(&id)).await {
            Ok(tags) => state.tags = tags::flatten(tags),
            Err(err) => warn!(id, %err, "Failed to fetch the tags of the security group"),
        }
        Some(Value::Value(state))
    }

    /// Create the group, through the v1 API when the v3 one is not published
    ///
    /// Returns the id and the new group.
    async fn create_group(
        &self,
        service: &ServiceClient<'_>,
        state: &SecGroupState<'_>,
        enterprise_project_id: Option<String>,
    ) -> Result<(String, Json), ApiError> {
        // creation only takes the name and the enterprise project
        let body = prune(json!({
            "security_group": {
                "name": state.name.as_str(),
                "enterprise_project_id": enterprise_project_id,
            }
        }));
        let description = state.description.as_str();
        debug!(%body, "Create security group");
        match service
            .post("/v3/{project_id}/vpc/security-groups", &body)
            .await
        {
            Ok(response) => {
                let group = response["security_group"].clone();
                let id = group_id(&group)?;
                if !description.is_empty() {
                    let body = json!({"security_group": {"description": description}});
                    service.put(&group_path_v3(&id), &body).await?;
                }
                return Ok((id, group));
            }
            Err(err) if err.is_not_found() => {
                info!("Security group v3 API unavailable, falling back on v1");
            }
            Err(err) => return Err(err),
        }

        let group = service
            .post("/v1/{project_id}/security-groups", &body)
            .await?["security_group"]
            .clone();
        let id = group_id(&group)?;

        // the v1 API does not handle descriptions
        if !description.is_empty() {
            let body = json!({
                "security_group": {
                    "name": state.name.as_str(),
                    "description": description,
                }
            });
            update_v2(service, &id, &body).await?;
        }
        Ok((id, group))
    }
}

#[async_trait]
impl Resource for SecGroupResource {
    type State<'a> = Value<SecGroupState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SecGroupState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, _config: Self::State<'a>) -> Option<()> {
        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags)?;
        let state = known(diags, state)?;
        let state = self.refresh(diags, &client, state).await?;
        Some((state, private_state))
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = known(diags, proposed_state)?;
        self.client.plan_region(&mut state.region);
        self.client
            .plan_enterprise_project(&mut state.enterprise_project_id);
        state.id = Value::Unknown;
        state.rules = Value::Unknown;
        state.created_at = Value::Unknown;
        state.updated_at = Value::Unknown;
        Some((Value::Value(state), Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let prior = known(diags, prior_state)?;
        let mut state = known(diags, proposed_state)?;

        let mut trigger_replace = Vec::new();
        replace_if_changed(
            &mut trigger_replace,
            AttributePath::new("region"),
            &prior.region,
            &state.region,
        );
        replace_if_changed(
            &mut trigger_replace,
            AttributePath::new("enterprise_project_id"),
            &prior.enterprise_project_id,
            &state.enterprise_project_id,
        );
        if bool_or(&prior.delete_default_rules, false) != bool_or(&state.delete_default_rules, false)
        {
            trigger_replace.push(AttributePath::new("delete_default_rules"));
        }

        if state.name != prior.name || state.description != prior.description {
            state.updated_at = Value::Unknown;
        }
        Some((Value::Value(state), prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags)?;
        let mut state = known(diags, planned_state)?;
        let region = client.region(&state.region).to_owned();
        let service = client.connect(diags, SERVICE, &region).await?;

        let enterprise_project_id = client
            .config()
            .enterprise_project_id(&state.enterprise_project_id);
        let (id, group) = match self
            .create_group(&service, &state, enterprise_project_id)
            .await
        {
            Ok(created) => created,
            Err(err) => {
                diags.root_error("Failed to create the security group", err.to_string());
                return None;
            }
        };
        info!(id, "Security group created");
        state.id = id.clone().into();

        if bool_or(&state.delete_default_rules, false) {
            let service = &service;
            let deleted = stream::iter(rule_ids(&group))
                .map(|rule| async move { delete_rule(service, &rule).await })
                .buffer_unordered(DELETE_CONCURRENCY)
                .try_collect::<Vec<()>>()
                .await;
            if let Err(err) = deleted {
                diags.error(
                    "Failed to delete a default security group rule",
                    err.to_string(),
                    AttributePath::new("delete_default_rules"),
                );
                return None;
            }
        }

        if let Err(err) = tags::create(&service, &tags_path(&id), &state.tags).await {
            diags.error(
                "Failed to set the tags of the security group",
                err.to_string(),
                AttributePath::new("tags"),
            );
            return None;
        }

        let state = self.refresh(diags, &client, state).await?;
        Some((state, planned_private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags)?;
        let prior = known(diags, prior_state)?;
        let mut state = known(diags, planned_state)?;
        let region = client.region(&state.region).to_owned();
        let service = client.connect(diags, SERVICE, &region).await?;
        let id = prior.id.as_str().to_owned();

        if state.name != prior.name || state.description != prior.description {
            let body = json!({
                "security_group": {
                    "name": state.name.as_str(),
                    "description": state.description.as_str(),
                }
            });
            debug!(id, %body, "Update security group");
            let result = match service.put(&group_path_v3(&id), &body).await {
                Err(err) if err.is_not_found() => update_v2(&service, &id, &body).await,
                result => result.map(|_| ()),
            };
            if let Err(err) = result {
                diags.root_error("Failed to update the security group", err.to_string());
                return None;
            }
        }

        if state.tags != prior.tags {
            if let Err(err) =
                tags::update(&service, &tags_path(&id), &prior.tags, &state.tags).await
            {
                diags.error(
                    "Failed to update the tags of the security group",
                    err.to_string(),
                    AttributePath::new("tags"),
                );
                return None;
            }
        }

        state.id = prior.id;
        let state = self.refresh(diags, &client, state).await?;
        Some((state, planned_private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let client = self.client.get(diags)?;
        let state = known(diags, state)?;
        let region = client.region(&state.region).to_owned();
        let service = client.connect(diags, SERVICE, &region).await?;

        let conf = client.pace(StateChangeConf {
            pending: &["ACTIVE"],
            target: &[DELETED],
            delay: Duration::from_secs(5),
            min_timeout: Duration::from_secs(3),
            timeout: DELETE_TIMEOUT,
            ..Default::default()
        });
        let (service, id) = (&service, state.id.as_str());
        match conf.wait_for_state(move || delete_step(service, id)).await {
            Ok(_) => Some(()),
            Err(err) => {
                diags.root_error(
                    format!("Failed to delete the security group {id}"),
                    err.to_string(),
                );
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags)?;
        let state = SecGroupState {
            id: id.into(),
            ..Default::default()
        };
        match self.refresh(diags, &client, state).await? {
            Value::Value(state) => Some((Value::Value(state), Default::default())),
            _ => {
                diags.root_error_short("Cannot import a security group that does not exist");
                None
            }
        }
    }
}
