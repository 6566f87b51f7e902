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

use std::borrow::Cow;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use serde_json::{json, Value as Json};
use tracing::{debug, info};

use tf_provider::{AttributePath, Diagnostics, Resource};
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty};

use crate::client::{ApiError, Client, ClientHandle, ServiceClient};
use crate::utils::{
    check_deleted, created_id, json_i64, json_non_empty, json_str, known, prune, strings,
    WithSchema, WithValidate,
};
use crate::wait::{Refreshed, StateChangeConf, DELETED};

use super::state::RdsBackupState;
use super::SERVICE;

const TIMEOUT: Duration = Duration::from_secs(30 * 60);

impl RdsBackupState<'_> {
    fn create_body(&self) -> Json {
        let databases: Vec<Json> = strings(&self.databases)
            .into_iter()
            .map(|name| json!({ "name": name }))
            .collect();
        prune(json!({
            "instance_id": self.instance_id.as_str(),
            "name": self.name.as_str(),
            "description": self.description.as_str(),
            "databases": databases,
        }))
    }

    fn flatten(&mut self, backup: &Json, region: &str) {
        self.id = json_str(backup, "id");
        self.region = region.to_owned().into();
        self.instance_id = json_str(backup, "instance_id");
        self.name = json_str(backup, "name");
        self.description = json_non_empty(backup, "description");
        self.backup_type = json_str(backup, "type");
        self.size = json_i64(backup, "size");
        self.status = json_str(backup, "status");
        self.begin_time = json_str(backup, "begin_time");
        self.end_time = json_str(backup, "end_time");

        let databases: Vec<_> = backup["databases"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|database| database["name"].as_str())
            .map(|name| Value::Value(Cow::Owned(name.to_owned())))
            .collect();
        self.databases = if databases.is_empty() {
            Value::Null
        } else {
            Value::Value(databases)
        };
    }
}

async fn fetch_backup(
    service: &ServiceClient<'_>,
    instance_id: &str,
    id: &str,
) -> Result<Option<Json>, ApiError> {
    let mut response = service
        .list(
            "/v3/{project_id}/backups",
            &[("instance_id", instance_id), ("backup_id", id)],
        )
        .await?;
    match response.get_mut("backups").map(Json::take) {
        Some(Json::Array(mut backups)) if !backups.is_empty() => Ok(Some(backups.swap_remove(0))),
        _ => Ok(None),
    }
}

async fn refresh_status(
    service: &ServiceClient<'_>,
    instance_id: &str,
    id: &str,
) -> anyhow::Result<Refreshed<()>> {
    match fetch_backup(service, instance_id, id).await {
        Ok(Some(backup)) => {
            let status = backup["status"].as_str().unwrap_or_default();
            if status == "FAILED" {
                bail!("backup {id} failed");
            }
            Ok(Refreshed::State((), status.to_owned()))
        }
        Ok(None) => Ok(Refreshed::Gone),
        Err(err) if err.is_not_found() => Ok(Refreshed::Gone),
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Default, Clone)]
pub struct RdsBackupResource {
    client: ClientHandle,
}

impl RdsBackupResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    async fn refresh<'a>(
        &self,
        diags: &mut Diagnostics,
        client: &Client,
        mut state: RdsBackupState<'a>,
    ) -> Option<Value<RdsBackupState<'a>>> {
        let region = client.region(&state.region).to_owned();
        let service = client.connect(diags, SERVICE, &region).await?;

        match fetch_backup(&service, state.instance_id.as_str(), state.id.as_str()).await {
            Ok(Some(backup)) => state.flatten(&backup, &region),
            Ok(None) => {
                debug!(id = state.id.as_str(), "RDS backup is gone");
                return Some(Value::Null);
            }
            Err(err) => return check_deleted(diags, err, "Failed to read the RDS backup"),
        }
        Some(Value::Value(state))
    }
}

#[async_trait]
impl Resource for RdsBackupResource {
    type State<'a> = Value<RdsBackupState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(RdsBackupState::schema())
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
        state.id = Value::Unknown;
        state.backup_type = Value::Unknown;
        state.size = Value::Unknown;
        state.status = Value::Unknown;
        state.begin_time = Value::Unknown;
        state.end_time = Value::Unknown;
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
        let state = known(diags, proposed_state)?;

        let mut trigger_replace = Vec::new();
        if prior.region != state.region {
            trigger_replace.push(AttributePath::new("region"));
        }
        if prior.instance_id != state.instance_id {
            trigger_replace.push(AttributePath::new("instance_id"));
        }
        if prior.name != state.name {
            trigger_replace.push(AttributePath::new("name"));
        }
        if prior.description != state.description {
            trigger_replace.push(AttributePath::new("description"));
        }
        if prior.databases != state.databases {
            trigger_replace.push(AttributePath::new("databases"));
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

        let body = state.create_body();
        debug!(%body, "Create RDS backup");
        let id = match service.post("/v3/{project_id}/backups", &body).await {
            Ok(response) => {
                created_id(diags, &response["backup"]["id"], "Failed to create the RDS backup")?
            }
            Err(err) => {
                diags.root_error("Failed to create the RDS backup", err.to_string());
                return None;
            }
        };
        info!(id, "RDS backup created");

        let conf = client.pace(StateChangeConf {
            pending: &["BUILDING"],
            target: &["COMPLETED"],
            delay: Duration::from_secs(10),
            poll_interval: Duration::from_secs(10),
            timeout: TIMEOUT,
            ..Default::default()
        });
        let (service_ref, instance_id, id_ref) = (&service, state.instance_id.as_str(), id.as_str());
        if let Err(err) = conf
            .wait_for_state(move || refresh_status(service_ref, instance_id, id_ref))
            .await
        {
            diags.root_error(
                format!("Failed to wait for RDS backup {id} to complete"),
                err.to_string(),
            );
            return None;
        }

        state.id = id.into();
        let state = self.refresh(diags, &client, state).await?;
        Some((state, planned_private_state))
    }

    async fn update<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        Some((planned_state, planned_private_state))
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
        let (instance_id, id) = (state.instance_id.as_str(), state.id.as_str());

        match service.delete(&format!("/v3/{{project_id}}/backups/{id}")).await {
            Ok(_) => (),
            Err(err) if err.is_not_found() => return Some(()),
            Err(err) => {
                diags.root_error("Failed to delete the RDS backup", err.to_string());
                return None;
            }
        }

        let conf = client.pace(StateChangeConf {
            pending: &["COMPLETED", "DELETING", "BUILDING"],
            target: &[DELETED],
            delay: Duration::from_secs(10),
            poll_interval: Duration::from_secs(10),
            timeout: TIMEOUT,
            ..Default::default()
        });
        let service = &service;
        match conf
            .wait_for_state(move || refresh_status(service, instance_id, id))
            .await
        {
            Ok(_) => {
                info!(id, "RDS backup deleted");
                Some(())
            }
            Err(err) => {
                diags.root_error("Failed to wait for the RDS backup deletion", err.to_string());
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Some((instance_id, backup_id)) = id.split_once('/') else {
            diags.root_error(
                "Invalid import ID",
                format!("`{id}` is not formatted as <instance_id>/<backup_id>"),
            );
            return None;
        };
        let client = self.client.get(diags)?;
        let state = RdsBackupState {
            id: backup_id.to_owned().into(),
            instance_id: instance_id.to_owned().into(),
            ..Default::default()
        };
        match self.refresh(diags, &client, state).await? {
            Value::Value(state) => Some((Value::Value(state), Default::default())),
            _ => {
                diags.root_error_short("Cannot import an RDS backup that does not exist");
                None
            }
        }
    }
}
