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
use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use tracing::{debug, info};

use tf_provider::{AttributePath, Diagnostics, Resource};
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty};

use crate::client::{ApiError, Client, ClientHandle, ServiceClient};
use crate::utils::{
    check_deleted, created_id, json_bool, json_non_empty, json_str, known, prune,
    replace_if_changed, unknown_if_null, WithSchema, WithValidate,
};

use super::state::{RouteState, RouteTableState};
use super::SERVICE;

/// Route as exchanged with the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "type")]
    pub route_type: String,
    pub destination: String,
    pub nexthop: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Changes to apply to the routes of a table
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RouteChanges {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<Route>,
    #[serde(rename = "mod", skip_serializing_if = "Vec::is_empty")]
    pub modify: Vec<Route>,
    #[serde(rename = "del", skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<Route>,
}

impl RouteChanges {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.modify.is_empty() && self.delete.is_empty()
    }
}

/// Compare two route lists, keyed by destination
pub fn diff_routes(old: &[Route], new: &[Route]) -> RouteChanges {
    let old: BTreeMap<&str, &Route> = old.iter().map(|r| (r.destination.as_str(), r)).collect();
    let new: BTreeMap<&str, &Route> = new.iter().map(|r| (r.destination.as_str(), r)).collect();

    let mut changes = RouteChanges::default();
    for (destination, route) in &new {
        match old.get(destination) {
            None => changes.add.push((*route).clone()),
            Some(prior) if prior != route => changes.modify.push((*route).clone()),
            Some(_) => (),
        }
    }
    changes.delete = old
        .iter()
        .filter(|(destination, _)| !new.contains_key(*destination))
        .map(|(_, route)| (*route).clone())
        .collect();
    changes
}

impl RouteTableState<'_> {
    fn routes(&self) -> Vec<Route> {
        self.route
            .iter()
            .flatten()
            .filter_map(|route| route.as_ref_option())
            .map(|route| Route {
                route_type: route.route_type.as_str().to_owned(),
                destination: route.destination.as_str().to_owned(),
                nexthop: route.nexthop.as_str().to_owned(),
                description: route.description.as_str().to_owned(),
            })
            .collect()
    }

    fn subnet_ids(&self) -> BTreeSet<String> {
        self.subnets
            .iter()
            .flatten()
            .filter_map(|id| id.as_deref_option())
            .map(str::to_owned)
            .collect()
    }

    fn flatten(&mut self, table: &Json, region: &str) {
        self.id = json_str(table, "id");
        self.region = region.to_owned().into();
        self.vpc_id = json_str(table, "vpc_id");
        self.name = json_str(table, "name");
        self.description = json_non_empty(table, "description");
        self.default = json_bool(table, "default");

        // system routes are not managed by the table resource
        self.route = Value::Value(
            table["routes"]
                .as_array()
                .into_iter()
                .flatten()
                .filter(|route| route["type"].as_str() != Some("local"))
                .map(|route| {
                    Value::Value(RouteState {
                        destination: json_str(route, "destination"),
                        route_type: json_str(route, "type"),
                        nexthop: json_str(route, "nexthop"),
                        description: json_non_empty(route, "description"),
                    })
                })
                .collect(),
        );
        self.subnets = Value::Value(
            table["subnets"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|subnet| subnet["id"].as_str())
                .map(|id| Value::Value(Cow::Owned(id.to_owned())))
                .collect(),
        );
    }
}

fn table_path(id: &str) -> String {
    format!("/v1/{{project_id}}/routetables/{id}")
}

/// Associate and disassociate subnets
async fn associate(
    service: &ServiceClient<'_>,
    id: &str,
    associate: &BTreeSet<String>,
    disassociate: &BTreeSet<String>,
) -> Result<(), ApiError> {
    if associate.is_empty() && disassociate.is_empty() {
        return Ok(());
    }
    let body = prune(json!({
        "routetable": {
            "subnets": {
                "associate": associate,
                "disassociate": disassociate,
            }
        }
    }));
    debug!(id, %body, "Update route table subnets");
    service
        .post(&format!("{}/action", table_path(id)), &body)
        .await?;
    Ok(())
}

#[derive(Debug, Default, Clone)]
pub struct RouteTableResource {
    client: ClientHandle,
}

impl RouteTableResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    async fn refresh<'a>(
        &self,
        diags: &mut Diagnostics,
        client: &Client,
        mut state: RouteTableState<'a>,
    ) -> Option<Value<RouteTableState<'a>>> {
        let region = client.region(&state.region).to_owned();
        let service = client.connect(diags, SERVICE, &region).await?;
        match service.get(&table_path(state.id.as_str())).await {
            Ok(response) => state.flatten(&response["routetable"], &region),
            Err(err) => return check_deleted(diags, err, "Failed to read the route table"),
        }
        Some(Value::Value(state))
    }
}

#[async_trait]
impl Resource for RouteTableResource {
    type State<'a> = Value<RouteTableState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(RouteTableState::schema())
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
        unknown_if_null(&mut state.subnets);
        state.id = Value::Unknown;
        state.default = Value::Unknown;
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
        replace_if_changed(
            &mut trigger_replace,
            AttributePath::new("region"),
            &prior.region,
            &state.region,
        );
        replace_if_changed(
            &mut trigger_replace,
            AttributePath::new("vpc_id"),
            &prior.vpc_id,
            &state.vpc_id,
        );
        Some((Value::Value(state), prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        if let Value::Value(prior) = &prior_state {
            if prior.default == Value::Value(true) {
                diags.root_error(
                    "Cannot delete a default route table",
                    format!(
                        "Route table {} is the default route table of VPC {}, it is deleted with the VPC.",
                        prior.id, prior.vpc_id
                    ),
                );
                return None;
            }
        }
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
            "routetable": {
                "name": state.name.as_str(),
                "vpc_id": state.vpc_id.as_str(),
                "description": state.description.as_str(),
                "routes": state.routes(),
            }
        }));
        debug!(%body, "Create route table");
        let id = match service.post("/v1/{project_id}/routetables", &body).await {
            Ok(response) => created_id(
                diags,
                &response["routetable"]["id"],
                "Failed to create the route table",
            )?,
            Err(err) => {
                diags.root_error("Failed to create the route table", err.to_string());
                return None;
            }
        };
        info!(id, "Route table created");

        if let Err(err) = associate(&service, &id, &state.subnet_ids(), &BTreeSet::new()).await {
            diags.error(
                "Failed to associate subnets with the route table",
                err.to_string(),
                AttributePath::new("subnets"),
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

        let changes = diff_routes(&prior.routes(), &state.routes());
        if state.name != prior.name || state.description != prior.description || !changes.is_empty()
        {
            let mut table = json!({ "name": state.name.as_str() });
            if state.description != prior.description {
                table["description"] = json!(state.description.as_str());
            }
            if !changes.is_empty() {
                table["routes"] = json!(changes);
            }
            let body = json!({ "routetable": table });
            debug!(id, %body, "Update route table");
            if let Err(err) = service.put(&table_path(&id), &body).await {
                diags.root_error("Failed to update the route table", err.to_string());
                return None;
            }
        }

        // an unknown set of subnets leaves the associations unchanged
        if state.subnets.is_value() {
            let old = prior.subnet_ids();
            let new = state.subnet_ids();
            let to_associate: BTreeSet<String> = new.difference(&old).cloned().collect();
            let to_disassociate: BTreeSet<String> = old.difference(&new).cloned().collect();
            if let Err(err) = associate(&service, &id, &to_associate, &to_disassociate).await {
                diags.error(
                    "Failed to update the subnets of the route table",
                    err.to_string(),
                    AttributePath::new("subnets"),
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

        if state.default == Value::Value(true) {
            diags.root_error_short("Cannot delete a default route table");
            return None;
        }

        if let Err(err) = associate(&service, id, &BTreeSet::new(), &state.subnet_ids()).await {
            if !err.is_not_found() {
                diags.root_error(
                    "Failed to disassociate the subnets of the route table",
                    err.to_string(),
                );
                return None;
            }
        }

        match service.delete(&table_path(id)).await {
            Ok(_) => {
                info!(id, "Route table deleted");
                Some(())
            }
            Err(err) if err.is_not_found() => Some(()),
            Err(err) => {
                diags.root_error("Failed to delete the route table", err.to_string());
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
        let state = RouteTableState {
            id: id.into(),
            ..Default::default()
        };
        match self.refresh(diags, &client, state).await? {
            Value::Value(state) => Some((Value::Value(state), Default::default())),
            _ => {
                diags.root_error_short("Cannot import a route table that does not exist");
                None
            }
        }
    }
}
