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
use serde_json::{json, Value as Json};
use tracing::{debug, info, warn};

use tf_provider::{AttributePath, Diagnostics, Resource};
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty};

use crate::client::{Client, ClientHandle, ServiceClient};
use crate::diff::{equal_trim_space, keep_prior_if};
use crate::tags;
use crate::utils::{
    check_deleted, created_id, json_non_empty, json_str, known, prune, replace_if_changed,
    WithSchema, WithValidate,
};
use crate::wait::{Refreshed, StateChangeConf, DELETED};

use super::state::VpcState;
use super::SERVICE;

const TIMEOUT: Duration = Duration::from_secs(10 * 60);

impl VpcState<'_> {
    fn flatten(&mut self, vpc: &Json, region: &str) {
        self.id = json_str(vpc, "id");
        self.region = region.to_owned().into();
        self.name = json_str(vpc, "name");
        self.cidr = json_str(vpc, "cidr");
        self.description = json_non_empty(vpc, "description");
        self.enterprise_project_id = json_str(vpc, "enterprise_project_id");
        self.status = json_str(vpc, "status");
    }
}

fn vpc_path(id: &str) -> String {
    format!("/v1/{{project_id}}/vpcs/{id}")
}

fn tags_path(id: &str) -> String {
    format!("/v2.0/{{project_id}}/vpcs/{id}")
}

async fn refresh_status(service: &ServiceClient<'_>, id: &str) -> anyhow::Result<Refreshed<()>> {
    match service.get(&vpc_path(id)).await {
        Ok(response) => {
            let status = response["vpc"]["status"].as_str().unwrap_or_default();
            Ok(Refreshed::State((), status.to_owned()))
        }
        Err(err) if err.is_not_found() => Ok(Refreshed::Gone),
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Default, Clone)]
pub struct VpcResource {
    client: ClientHandle,
}

impl VpcResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    async fn refresh<'a>(
        &self,
        diags: &mut Diagnostics,
        client: &Client,
        mut state: VpcState<'a>,
    ) -> Option<Value<VpcState<'a>>> {
        let region = client.region(&state.region).to_owned();
        let service = client.connect(diags, SERVICE, &region).await?;
        let id = state.id.as_str().to_owned();

        let prior_description = state.description.clone();
        match service.get(&vpc_path(&id)).await {
            Ok(response) => state.flatten(&response["vpc"], &region),
            Err(err) => return check_deleted(diags, err, "Failed to read the VPC"),
        }
        keep_prior_if(&prior_description, &mut state.description, equal_trim_space);
        match tags::get(&service, &tags_path(&id)).await {
            Ok(tags) => state.tags = tags::flatten(tags),
            Err(err) => warn!(id, %err, "Failed to fetch the tags of the VPC"),
        }
        Some(Value::Value(state))
    }
}

#[async_trait]
impl Resource for VpcResource {
    type State<'a> = Value<VpcState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(VpcState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(config) = &config {
            config.validate(diags, AttributePath::default()).await;
        }

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
        self.client.plan_enterprise_project(&mut state.enterprise_project_id);
        state.id = Value::Unknown;
        state.status = Value::Unknown;
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
        if state.cidr != prior.cidr {
            state.status = Value::Unknown;
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

        let body = prune(json!({
            "vpc": {
                "name": state.name.as_str(),
                "cidr": state.cidr.as_str(),
                "description": state.description.as_str(),
                "enterprise_project_id": client.config().enterprise_project_id(&state.enterprise_project_id),
            }
        }));
        debug!(%body, "Create VPC");
        let id = match service.post("/v1/{project_id}/vpcs", &body).await {
            Ok(response) => created_id(diags, &response["vpc"]["id"], "Failed to create the VPC")?,
            Err(err) => {
                diags.root_error("Failed to create the VPC", err.to_string());
                return None;
            }
        };
        info!(id, "VPC created");

        let conf = client.pace(StateChangeConf {
            pending: &["CREATING"],
            target: &["OK"],
            delay: Duration::from_secs(5),
            min_timeout: Duration::from_secs(3),
            timeout: TIMEOUT,
            ..Default::default()
        });
        let (service_ref, id_ref) = (&service, id.as_str());
        if let Err(err) = conf
            .wait_for_state(move || refresh_status(service_ref, id_ref))
            .await
        {
            diags.root_error(
                format!("Failed to wait for VPC {id} to become OK"),
                err.to_string(),
            );
            return None;
        }

        if let Err(err) = tags::create(&service, &tags_path(&id), &state.tags).await {
            diags.error(
                "Failed to set the tags of the VPC",
                err.to_string(),
                AttributePath::new("tags"),
            );
            return None;
        }

        state.id = id.into();
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

        if state.name != prior.name
            || state.cidr != prior.cidr
            || state.description != prior.description
        {
            let body = json!({
                "vpc": {
                    "name": state.name.as_str(),
                    "cidr": state.cidr.as_str(),
                    "description": state.description.as_str(),
                }
            });
            debug!(%body, "Update VPC");
            if let Err(err) = service.put(&vpc_path(&id), &body).await {
                diags.root_error("Failed to update the VPC", err.to_string());
                return None;
            }
        }

        if state.tags != prior.tags {
            if let Err(err) =
                tags::update(&service, &tags_path(&id), &prior.tags, &state.tags).await
            {
                diags.error(
                    "Failed to update the tags of the VPC",
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
        let id = state.id.as_str();

        match service.delete(&vpc_path(id)).await {
            Ok(_) => (),
            Err(err) if err.is_not_found() => return Some(()),
            Err(err) => {
                diags.root_error("Failed to delete the VPC", err.to_string());
                return None;
            }
        }

        let conf = client.pace(StateChangeConf {
            pending: &["OK", "CREATING"],
            target: &[DELETED],
            delay: Duration::from_secs(5),
            min_timeout: Duration::from_secs(3),
            timeout: TIMEOUT,
            ..Default::default()
        });
        let service = &service;
        match conf.wait_for_state(move || refresh_status(service, id)).await {
            Ok(_) => {
                info!(id, "VPC deleted");
                Some(())
            }
            Err(err) => {
                diags.root_error("Failed to wait for the VPC deletion", err.to_string());
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
        let state = VpcState {
            id: id.into(),
            ..Default::default()
        };
        match self.refresh(diags, &client, state).await? {
            Value::Value(state) => Some((Value::Value(state), Default::default())),
            _ => {
                diags.root_error_short("Cannot import a VPC that does not exist");
                None
            }
        }
    }
}
