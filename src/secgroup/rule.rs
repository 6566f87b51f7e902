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

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value as Json};
use tracing::{debug, info};

use tf_provider::{AttributePath, Diagnostics, Resource};
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty};

use crate::client::{ApiError, Client, ClientHandle, ServiceClient};
use crate::utils::{
    check_deleted, created_id, json_i64, json_non_empty, json_str, known, non_empty, prune,
    unknown_if_null, WithNormalize, WithSchema, WithValidate,
};

use super::state::SecGroupRuleState;
use super::SERVICE;

/// Parse the port range of a rule
///
/// `"80"` and `"8000-8080"` are ranges, a list of ports (`"80,443"`) has none.
pub fn port_range(multiport: &str) -> Result<Option<(i64, i64)>> {
    if multiport.is_empty() || multiport.contains(',') {
        return Ok(None);
    }
    let parse = |port: &str| {
        port.parse::<i64>()
            .map_err(|_| anyhow!("the parameter format of the 'ports' is invalid: `{multiport}`"))
    };
    match multiport.split_once('-') {
        Some((min, max)) => Ok(Some((parse(min)?, parse(max)?))),
        None => {
            let port = parse(multiport)?;
            Ok(Some((port, port)))
        }
    }
}

/// Path of a rule in the v3 API
pub(crate) fn rule_path_v3(id: &str) -> String {
    format!("/v3/{{project_id}}/vpc/security-group-rules/{id}")
}

/// Path of a rule in the v1 API
pub(crate) fn rule_path_v1(id: &str) -> String {
    format!("/v1/{{project_id}}/security-group-rules/{id}")
}

/// Delete a rule, through the v1 API when the v3 one is not published in the region
pub(crate) async fn delete_rule(service: &ServiceClient<'_>, id: &str) -> Result<(), ApiError> {
    match service.delete(&rule_path_v3(id)).await {
        Err(err) if err.is_not_found() => match service.delete(&rule_path_v1(id)).await {
            Err(err) if err.is_not_found() => Ok(()),
            result => result.map(|_| ()),
        },
        result => result.map(|_| ()),
    }
}

impl SecGroupRuleState<'_> {
    /// Ports of the rule, built from the port range when `ports` is not set
    fn multiport(&self) -> Option<String> {
        if let Some(ports) = non_empty(&self.ports) {
            return Some(ports.to_owned());
        }
        match (&self.port_range_min, &self.port_range_max) {
            (Value::Value(min), Value::Value(max)) => Some(format!("{min}-{max}")),
            (Value::Value(port), _) | (_, Value::Value(port)) => Some(port.to_string()),
            _ => None,
        }
    }

    fn create_body(&self) -> Json {
        prune(json!({
            "security_group_rule": {
                "security_group_id": self.security_group_id.as_str(),
                "direction": self.direction.as_str(),
                "ethertype": self.ethertype.as_str(),
                "protocol": self.protocol.as_str(),
                "multiport": self.multiport(),
                "remote_ip_prefix": self.remote_ip_prefix.as_str(),
                "remote_group_id": self.remote_group_id.as_str(),
                "remote_address_group_id": self.remote_address_group_id.as_str(),
                "description": self.description.as_str(),
                "action": self.action.as_str(),
                "priority": self.priority.as_ref_option(),
            }
        }))
    }

    fn flatten(&mut self, rule: &Json, region: &str) -> Result<()> {
        self.id = json_str(rule, "id");
        self.region = region.to_owned().into();
        self.security_group_id = json_str(rule, "security_group_id");
        self.direction = json_str(rule, "direction");
        self.ethertype = json_str(rule, "ethertype");
        self.protocol = json_non_empty(rule, "protocol");
        self.remote_ip_prefix = json_non_empty(rule, "remote_ip_prefix");
        self.remote_group_id = json_non_empty(rule, "remote_group_id");
        self.remote_address_group_id = json_non_empty(rule, "remote_address_group_id");
        self.description = json_non_empty(rule, "description");
        self.action = json_str(rule, "action");
        self.priority = json_i64(rule, "priority");

        self.ports = json_non_empty(rule, "multiport");
        (self.port_range_min, self.port_range_max) = match port_range(self.ports.as_str())? {
            Some((min, max)) => (Value::Value(min), Value::Value(max)),
            None => (Value::Null, Value::Null),
        };
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct SecGroupRuleResource {
    client: ClientHandle,
}

impl SecGroupRuleResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    async fn refresh<'a>(
        &self,
        diags: &mut Diagnostics,
        client: &Client,
        mut state: SecGroupRuleState<'a>,
    ) -> Option<Value<SecGroupRuleState<'a>>> {
        let region = client.region(&state.region).to_owned();
        let service = client.connect(diags, SERVICE, &region).await?;
        let rule = match service.get(&rule_path_v3(state.id.as_str())).await {
            Ok(response) => response["security_group_rule"].clone(),
            Err(err) => return check_deleted(diags, err, "Failed to read the security group rule"),
        };
        if let Err(err) = state.flatten(&rule, &region) {
            diags.error(
                "Failed to read the security group rule",
                err.to_string(),
                AttributePath::new("ports"),
            );
            return None;
        }
        Some(Value::Value(state))
    }
}

#[async_trait]
impl Resource for SecGroupRuleResource {
    type State<'a> = Value<SecGroupRuleState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SecGroupRuleState::schema())
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
        state.normalize(diags);
        self.client.plan_region(&mut state.region);
        state.id = Value::Unknown;

        // the API reports the port range in both forms
        if state.ports.is_null() {
            let bounds_unknown =
                state.port_range_min.is_unknown() || state.port_range_max.is_unknown();
            state.ports = match state.multiport() {
                _ if bounds_unknown => Value::Unknown,
                Some(ports) => Value::Value(ports.into()),
                None => Value::Null,
            };
        }
        if state.ports.is_unknown() {
            unknown_if_null(&mut state.port_range_min);
            unknown_if_null(&mut state.port_range_max);
        } else {
            // a single bound is read back as a range of one port
            match port_range(state.ports.as_str()) {
                Ok(Some((min, max))) => {
                    if state.port_range_min.is_null() {
                        state.port_range_min = Value::Value(min);
                    }
                    if state.port_range_max.is_null() {
                        state.port_range_max = Value::Value(max);
                    }
                }
                Ok(None) => (),
                Err(err) => {
                    diags.error("Invalid ports", err.to_string(), AttributePath::new("ports"));
                    return None;
                }
            }
        }
        if state.remote_group_id.is_null() && state.remote_address_group_id.is_null() {
            unknown_if_null(&mut state.remote_ip_prefix);
        }
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
        state.normalize(diags);

        // every argument forces a new rule
        let mut trigger_replace = Vec::new();
        macro_rules! replace_if_changed {
            ($($field:ident),*) => {
                $(
                    if prior.$field != state.$field {
                        trigger_replace.push(AttributePath::new(stringify!($field)));
                    }
                )*
            };
        }
        replace_if_changed!(
            region,
            security_group_id,
            direction,
            ethertype,
            protocol,
            ports,
            port_range_min,
            port_range_max,
            remote_ip_prefix,
            remote_group_id,
            remote_address_group_id,
            description,
            action,
            priority
        );
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
        debug!(%body, "Create security group rule");
        let id = match service
            .post("/v3/{project_id}/vpc/security-group-rules", &body)
            .await
        {
            Ok(response) => created_id(
                diags,
                &response["security_group_rule"]["id"],
                "Failed to create the security group rule",
            )?,
            Err(err) => {
                diags.root_error("Failed to create the security group rule", err.to_string());
                return None;
            }
        };
        info!(id, "Security group rule created");

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
        // rules are replaced on any change
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

        match service.delete(&rule_path_v3(state.id.as_str())).await {
            Ok(_) => {
                info!(id = %state.id, "Security group rule deleted");
                Some(())
            }
            Err(err) if err.is_not_found() => Some(()),
            Err(err) => {
                diags.root_error("Failed to delete the security group rule", err.to_string());
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
        let state = SecGroupRuleState {
            id: id.into(),
            ..Default::default()
        };
        match self.refresh(diags, &client, state).await? {
            Value::Value(state) => Some((Value::Value(state), Default::default())),
            _ => {
                diags.root_error_short("Cannot import a security group rule that does not exist");
                None
            }
        }
    }
}
