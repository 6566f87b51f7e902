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

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use serde_json::{json, Value as Json};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use tf_provider::{AttributePath, Diagnostics, Resource};
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty};

use crate::client::{ApiError, Client, ClientHandle, ServiceClient};
use crate::diff::{equal_comma_separated, equal_fold, equal_version_prefix, keep_prior_if};
use crate::tags;
use crate::utils::{
    check_deleted, created_id, json_bool, json_i64, json_non_empty, json_str, json_str_list, known,
    non_empty, prune, replace_if_changed, string_map_of, strings, unknown_if_null, WithSchema,
    WithValidate,
};
use crate::wait::{Refreshed, StateChangeConf, WaitError, DELETED};

use super::state::{BackupStrategyBlock, DbBlock, NodeItem, RdsInstanceState, VolumeBlock};
use super::SERVICE;

const TIMEOUT: Duration = Duration::from_secs(30 * 60);
const DEFAULT_BACKUP_PERIOD: &str = "1,2,3,4,5,6,7";
/// Error codes returned while another operation holds the instance
const BUSY_CODES: &[&str] = &["DBS.201202", "DBS.200047"];

pub(crate) fn is_hour_minute(s: &str) -> bool {
    match s.split_once(':') {
        Some((hour, minute)) => {
            hour.len() == 2
                && minute.len() == 2
                && hour.parse::<u8>().is_ok_and(|hour| hour < 24)
                && minute.parse::<u8>().is_ok_and(|minute| minute < 60)
        }
        None => false,
    }
}

/// Split a `HH:MM-HH:MM` maintenance window into its bounds
pub fn parse_maintenance_window(window: &str) -> Option<(&str, &str)> {
    let (begin, end) = window.split_once('-')?;
    (is_hour_minute(begin) && is_hour_minute(end)).then_some((begin, end))
}

fn is_busy(err: &ApiError) -> bool {
    err.has_status(&[400, 409])
        && err
            .error_code()
            .is_some_and(|code| BUSY_CODES.contains(&code))
}

fn node_item<'a>(node: &Json) -> Value<NodeItem<'a>> {
    Value::Value(NodeItem {
        id: json_str(node, "id"),
        name: json_str(node, "name"),
        role: json_str(node, "role"),
        status: json_str(node, "status"),
        availability_zone: json_str(node, "availability_zone"),
    })
}

/// Availability zones of the nodes, the primary one first
fn node_zones(nodes: &[Json]) -> Vec<String> {
    let mut nodes: Vec<&Json> = nodes
        .iter()
        .filter(|node| node["role"] != "readreplica")
        .collect();
    nodes.sort_by_key(|node| node["role"] != "master");
    nodes
        .iter()
        .filter_map(|node| node["availability_zone"].as_str())
        .map(str::to_owned)
        .collect()
}

impl RdsInstanceState<'_> {
    pub(crate) fn create_body(&self, region: &str, enterprise_project_id: Option<String>) -> Json {
        let db = self.db.as_ref_option();
        let volume = self.volume.as_ref_option();
        let ha = non_empty(&self.ha_replication_mode)
            .map(|mode| json!({"mode": "ha", "replication_mode": mode}));
        let backup_strategy = self.backup_strategy.as_ref_option().map(|backup| {
            json!({
                "start_time": backup.start_time.as_str(),
                "keep_days": backup.keep_days.as_ref_option(),
            })
        });
        let restore_point = self.restore.as_ref_option().map(|restore| {
            json!({
                "type": "backup",
                "instance_id": restore.instance_id.as_str(),
                "backup_id": restore.backup_id.as_str(),
                "database_name": string_map_of(&restore.database_name),
            })
        });

        prune(json!({
            "name": self.name.as_str(),
            "flavor_ref": self.flavor.as_str(),
            "vpc_id": self.vpc_id.as_str(),
            "subnet_id": self.subnet_id.as_str(),
            "security_group_id": self.security_group_id.as_str(),
            "configuration_id": self.param_group_id.as_str(),
            "time_zone": self.time_zone.as_str(),
            "data_vip": self.fixed_ip.as_str(),
            "disk_encryption_id": volume.map(|volume| volume.disk_encryption_id.as_str()),
            "collation": self.collation.as_str(),
            "port": db.and_then(|db| db.port.as_ref_option()).map(i64::to_string),
            "enterprise_project_id": enterprise_project_id,
            "region": region,
            "availability_zone": strings(&self.availability_zone).join(","),
            "datastore": {
                "type": db.map(|db| db.db_type.as_str()),
                "version": db.map(|db| db.version.as_str()),
            },
            "volume": {
                "type": volume.map(|volume| volume.volume_type.as_str()),
                "size": volume.and_then(|volume| volume.size.as_ref_option()),
            },
            "ha": ha,
            "backup_strategy": backup_strategy,
            "unchangeable_param": {
                "lower_case_table_names": self.lower_case_table_names.as_str(),
            },
            "restore_point": restore_point,
            "password": db.map(|db| db.password.as_str()),
        }))
    }

    /// Fill the state from an element of the instance list
    ///
    /// Write-only arguments (password, parameter template, restore point) keep their prior value.
    pub(crate) fn flatten(&mut self, instance: &Json, region: &str) {
        self.id = json_str(instance, "id");
        self.region = region.to_owned().into();
        self.name = json_str(instance, "name");
        self.description = json_non_empty(instance, "alias");
        self.status = json_str(instance, "status");
        self.created = json_str(instance, "created");
        self.flavor = json_str(instance, "flavor_ref");
        self.vpc_id = json_str(instance, "vpc_id");
        self.subnet_id = json_str(instance, "subnet_id");
        self.security_group_id = json_str(instance, "security_group_id");
        self.time_zone = json_str(instance, "time_zone");
        self.collation = json_str(instance, "collation");
        self.enterprise_project_id = json_str(instance, "enterprise_project_id");
        self.ha_replication_mode = json_non_empty(&instance["ha"], "replication_mode");
        self.ssl_enable = json_bool(instance, "enable_ssl");
        self.private_ips = json_str_list(instance, "private_ips");
        self.public_ips = json_str_list(instance, "public_ips");
        self.fixed_ip = match instance["private_ips"][0].as_str() {
            Some(ip) => ip.to_owned().into(),
            None => Value::Null,
        };
        self.private_dns_names = json_str_list(instance, "private_dns_names");
        self.private_dns_name_prefix = match instance["private_dns_names"][0].as_str() {
            Some(name) => name.split('.').next().unwrap_or(name).to_owned().into(),
            None => Value::Null,
        };

        if let Some((begin, end)) = instance["maintenance_window"]
            .as_str()
            .and_then(parse_maintenance_window)
        {
            self.maintain_begin = begin.to_owned().into();
            self.maintain_end = end.to_owned().into();
        }

        let nodes = instance["nodes"].as_array().map(Vec::as_slice).unwrap_or_default();
        self.nodes = Value::Value(nodes.iter().map(node_item).collect());
        let zones = node_zones(nodes);
        if !zones.is_empty() {
            self.availability_zone = Value::Value(zones.into_iter().map(Into::into).collect());
        }

        let password = self
            .db
            .as_ref_option()
            .map(|db| db.password.clone())
            .unwrap_or_default();
        self.db = Value::Value(DbBlock {
            db_type: json_str(&instance["datastore"], "type"),
            version: json_str(&instance["datastore"], "version"),
            password,
            port: json_i64(instance, "port"),
            user_name: json_str(instance, "db_user_name"),
        });
        self.volume = Value::Value(VolumeBlock {
            volume_type: json_str(&instance["volume"], "type"),
            size: json_i64(&instance["volume"], "size"),
            disk_encryption_id: json_str(instance, "disk_encryption_id"),
        });

        // The block is optional: only track the policy once it is managed
        if let Value::Value(backup) = &mut self.backup_strategy {
            backup.start_time = json_str(&instance["backup_strategy"], "start_time");
            backup.keep_days = json_i64(&instance["backup_strategy"], "keep_days");
        }

        self.tags = tags::flatten(tags::from_json(&instance["tags"]));
    }
}

pub(crate) fn instance_path(id: &str) -> String {
    format!("/v3/{{project_id}}/instances/{id}")
}

/// First element of the instance list filtered on `id`
pub(crate) async fn fetch_instance(
    service: &ServiceClient<'_>,
    id: &str,
) -> Result<Option<Json>, ApiError> {
    let mut response = service
        .list("/v3/{project_id}/instances", &[("id", id)])
        .await?;
    match response.get_mut("instances").map(Json::take) {
        Some(Json::Array(mut instances)) if !instances.is_empty() => {
            Ok(Some(instances.swap_remove(0)))
        }
        _ => Ok(None),
    }
}

pub(crate) async fn refresh_status(
    service: &ServiceClient<'_>,
    id: &str,
) -> anyhow::Result<Refreshed<()>> {
    match fetch_instance(service, id).await {
        Ok(Some(instance)) => {
            let status = instance["status"].as_str().unwrap_or_default();
            if status == "FAILED" {
                bail!("instance {id} is in FAILED status");
            }
            Ok(Refreshed::State((), status.to_owned()))
        }
        Ok(None) => Ok(Refreshed::Gone),
        Err(err) if err.is_not_found() => Ok(Refreshed::Gone),
        Err(err) => Err(err.into()),
    }
}

async fn refresh_job(service: &ServiceClient<'_>, job_id: &str) -> anyhow::Result<Refreshed<()>> {
    let response = service
        .list("/v3/{project_id}/jobs", &[("id", job_id)])
        .await?;
    let job = &response["job"];
    let status = job["status"].as_str().unwrap_or_default();
    if status == "Failed" {
        let reason = job["fail_reason"].as_str().unwrap_or("no reason given");
        bail!("job {job_id} failed: {reason}");
    }
    Ok(Refreshed::State((), status.to_owned()))
}

/// Operations on one instance
struct InstanceApi<'c> {
    client: &'c Client,
    service: &'c ServiceClient<'c>,
    id: &'c str,
}

impl InstanceApi<'_> {
    fn path(&self, suffix: &str) -> String {
        format!("{}{suffix}", instance_path(self.id))
    }

    async fn wait_status(
        &self,
        pending: &'static [&'static str],
        target: &'static [&'static str],
        delay: Duration,
        poll_interval: Duration,
    ) -> Result<(), WaitError> {
        let conf = self.client.pace(StateChangeConf {
            pending,
            target,
            delay,
            poll_interval,
            timeout: TIMEOUT,
            ..Default::default()
        });
        let (service, id) = (self.service, self.id);
        conf.wait_for_state(move || refresh_status(service, id))
            .await
            .map(|_| ())
    }

    async fn wait_active(&self) -> Result<(), WaitError> {
        self.wait_status(
            &[
                "BUILD",
                "BACKING UP",
                "MODIFYING",
                "MODIFYING DATABASE PORT",
                "RESTARTING",
            ],
            &["ACTIVE"],
            Duration::from_secs(10),
            Duration::from_secs(10),
        )
        .await
    }

    /// Wait for the job of an asynchronous operation, if the API started one
    async fn wait_job(&self, response: &Json) -> Result<(), WaitError> {
        let Some(job_id) = response["job_id"].as_str() else {
            return Ok(());
        };
        debug!(id = self.id, job_id, "Wait for job");
        let conf = self.client.pace(StateChangeConf {
            pending: &["Running"],
            target: &["Completed"],
            delay: Duration::from_secs(10),
            poll_interval: Duration::from_secs(10),
            timeout: TIMEOUT,
            ..Default::default()
        });
        let service = self.service;
        conf.wait_for_state(move || refresh_job(service, job_id))
            .await
            .map(|_| ())
    }

    /// Run an operation, retrying it while another operation holds the instance
    async fn retry<F, Fut>(&self, mut operation: F) -> anyhow::Result<Json>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Json, ApiError>>,
    {
        let deadline = Instant::now() + TIMEOUT;
        loop {
            match operation().await {
                Err(err) if is_busy(&err) && Instant::now() < deadline => {
                    debug!(id = self.id, %err, "Instance is busy, waiting for it to become ACTIVE");
                    self.wait_active().await?;
                }
                result => return Ok(result?),
            }
        }
    }

    async fn put(&self, suffix: &str, body: Json) -> anyhow::Result<Json> {
        let (service, path, body) = (self.service, &self.path(suffix), &body);
        debug!(id = self.id, path, %body, "Update instance");
        self.retry(move || service.put(path, body)).await
    }

    async fn post(&self, suffix: &str, body: Json) -> anyhow::Result<Json> {
        let (service, path, body) = (self.service, &self.path(suffix), &body);
        debug!(id = self.id, path, %body, "Update instance");
        self.retry(move || service.post(path, body)).await
    }

    async fn rename(&self, name: &str) -> anyhow::Result<()> {
        self.put("/name", json!({ "name": name })).await?;
        self.wait_active().await?;
        Ok(())
    }

    async fn set_description(&self, description: &str) -> anyhow::Result<()> {
        self.put("/alias", json!({ "alias": description })).await?;
        Ok(())
    }

    async fn resize_flavor(&self, flavor: &str) -> anyhow::Result<()> {
        let response = self
            .post("/action", json!({"resize_flavor": {"spec_code": flavor}}))
            .await?;
        self.wait_job(&response).await?;
        self.wait_status(
            &["MODIFYING"],
            &["ACTIVE"],
            Duration::from_secs(15),
            Duration::from_secs(15),
        )
        .await?;
        Ok(())
    }

    async fn enlarge_volume(&self, size: i64) -> anyhow::Result<()> {
        let response = self
            .post("/action", json!({"enlarge_volume": {"size": size}}))
            .await?;
        self.wait_job(&response).await?;
        self.wait_active().await?;
        Ok(())
    }

    async fn set_backup_policy(&self, backup: &BackupStrategyBlock<'_>) -> anyhow::Result<()> {
        let period = non_empty(&backup.period).unwrap_or(DEFAULT_BACKUP_PERIOD);
        self.put(
            "/backups/policy",
            json!({
                "backup_policy": {
                    "keep_days": backup.keep_days.as_ref_option(),
                    "start_time": backup.start_time.as_str(),
                    "period": period,
                }
            }),
        )
        .await?;
        self.wait_active().await?;
        Ok(())
    }

    async fn set_password(&self, password: &str) -> anyhow::Result<()> {
        self.post("/password", json!({ "db_user_pwd": password }))
            .await?;
        Ok(())
    }

    async fn set_port(&self, port: i64) -> anyhow::Result<()> {
        let response = self.put("/port", json!({ "port": port })).await?;
        self.wait_job(&response).await?;
        self.wait_status(
            &["MODIFYING DATABASE PORT"],
            &["ACTIVE"],
            Duration::from_secs(5),
            Duration::from_secs(3),
        )
        .await?;
        Ok(())
    }

    async fn set_security_group(&self, security_group_id: &str) -> anyhow::Result<()> {
        self.put(
            "/security-group",
            json!({ "security_group_id": security_group_id }),
        )
        .await?;
        self.wait_active().await?;
        Ok(())
    }

    async fn set_ssl(&self, enable: bool) -> anyhow::Result<()> {
        self.put("/ssl", json!({ "ssl_option": enable })).await?;
        Ok(())
    }

    async fn set_maintenance_window(&self, begin: &str, end: &str) -> anyhow::Result<()> {
        self.put(
            "/ops-window",
            json!({ "start_time": begin, "end_time": end }),
        )
        .await?;
        Ok(())
    }
}

/// Report the failure of an update step on the attribute it belongs to
fn step_error(diags: &mut Diagnostics, attribute: &'static str, err: anyhow::Error) {
    diags.error(
        format!("Failed to update `{attribute}` of the RDS instance"),
        format!("{err:#}"),
        AttributePath::new(attribute),
    );
}

#[derive(Debug, Default, Clone)]
pub struct RdsInstanceResource {
    client: ClientHandle,
}

impl RdsInstanceResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    async fn refresh<'a>(
        &self,
        diags: &mut Diagnostics,
        client: &Client,
        mut state: RdsInstanceState<'a>,
    ) -> Option<Value<RdsInstanceState<'a>>> {
        let region = client.region(&state.region).to_owned();
        let service = client.connect(diags, SERVICE, &region).await?;
        let id = state.id.as_str().to_owned();

        let prior = state.clone();
        match fetch_instance(&service, &id).await {
            Ok(Some(instance)) => state.flatten(&instance, &region),
            Ok(None) => {
                warn!(id, "RDS instance is gone, removing it from the state");
                return Some(Value::Null);
            }
            Err(err) => return check_deleted(diags, err, "Failed to read the RDS instance"),
        }

        if let (Value::Value(prior_db), Value::Value(db)) = (&prior.db, &mut state.db) {
            keep_prior_if(&prior_db.db_type, &mut db.db_type, equal_fold);
            keep_prior_if(&prior_db.version, &mut db.version, |prior, remote| {
                equal_version_prefix(remote, prior)
            });
        }

        if let Value::Value(backup) = &mut state.backup_strategy {
            match service.get(&format!("{}/backups/policy", instance_path(&id))).await {
                Ok(response) => {
                    backup.period = json_str(&response["backup_policy"], "period");
                    if let Value::Value(prior_backup) = &prior.backup_strategy {
                        keep_prior_if(&prior_backup.period, &mut backup.period, equal_comma_separated);
                    }
                }
                Err(err) => warn!(id, %err, "Failed to fetch the backup policy of the RDS instance"),
            }
        }

        Some(Value::Value(state))
    }
}

#[async_trait]
impl Resource for RdsInstanceResource {
    type State<'a> = Value<RdsInstanceState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(RdsInstanceState::schema())
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
        state.created = Value::Unknown;
        state.nodes = Value::Unknown;
        state.private_ips = Value::Unknown;
        state.public_ips = Value::Unknown;
        state.private_dns_names = Value::Unknown;
        state.private_dns_name_prefix = Value::Unknown;
        unknown_if_null(&mut state.time_zone);
        unknown_if_null(&mut state.collation);
        unknown_if_null(&mut state.fixed_ip);
        unknown_if_null(&mut state.ssl_enable);
        unknown_if_null(&mut state.maintain_begin);
        unknown_if_null(&mut state.maintain_end);
        if let Value::Value(db) = &mut state.db {
            unknown_if_null(&mut db.port);
            db.user_name = Value::Unknown;
        }
        if let Value::Value(volume) = &mut state.volume {
            unknown_if_null(&mut volume.disk_encryption_id);
        }
        if let Value::Value(backup) = &mut state.backup_strategy {
            unknown_if_null(&mut backup.keep_days);
            unknown_if_null(&mut backup.period);
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

        let mut trigger_replace = Vec::new();
        macro_rules! replace_if_changed {
            ($($field:ident),*) => {
                $(
                    replace_if_changed(
                        &mut trigger_replace,
                        AttributePath::new(stringify!($field)),
                        &prior.$field,
                        &state.$field,
                    );
                )*
            };
        }
        replace_if_changed!(
            region,
            availability_zone,
            vpc_id,
            subnet_id,
            lower_case_table_names,
            time_zone,
            restore,
            ha_replication_mode,
            collation,
            enterprise_project_id,
            fixed_ip,
            param_group_id
        );

        let prior_db = prior.db.as_ref_option();
        let db = state.db.as_ref_option();
        if prior_db.map(|db| &db.db_type) != db.map(|db| &db.db_type) {
            trigger_replace.push(AttributePath::new("db").attribute("type"));
        }
        if prior_db.map(|db| &db.version) != db.map(|db| &db.version) {
            trigger_replace.push(AttributePath::new("db").attribute("version"));
        }

        let prior_volume = prior.volume.as_ref_option();
        let volume = state.volume.as_ref_option();
        if prior_volume.map(|v| &v.volume_type) != volume.map(|v| &v.volume_type) {
            trigger_replace.push(AttributePath::new("volume").attribute("type"));
        }
        if prior_volume.map(|v| &v.disk_encryption_id) != volume.map(|v| &v.disk_encryption_id) {
            trigger_replace.push(AttributePath::new("volume").attribute("disk_encryption_id"));
        }
        let sizes = (
            prior_volume.and_then(|v| v.size.as_ref_option()),
            volume.and_then(|v| v.size.as_ref_option()),
        );
        if let (Some(old), Some(new)) = sizes {
            if new < old {
                diags.error(
                    "The volume cannot be shrunk",
                    format!("The volume size can only be enlarged, from {old} GB to {new} GB"),
                    AttributePath::new("volume").attribute("size"),
                );
                return None;
            }
        }

        if let Value::Value(db) = &mut state.db {
            unknown_if_null(&mut db.port);
        }
        if let Value::Value(backup) = &mut state.backup_strategy {
            unknown_if_null(&mut backup.keep_days);
            unknown_if_null(&mut backup.period);
        }
        if state != prior {
            state.status = Value::Unknown;
            state.nodes = Value::Unknown;
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

        let body = state.create_body(
            &region,
            client.config().enterprise_project_id(&state.enterprise_project_id),
        );
        debug!(name = state.name.as_str(), "Create RDS instance");
        let response = match service.post("/v3/{project_id}/instances", &body).await {
            Ok(response) => response,
            Err(err) => {
                diags.root_error("Failed to create the RDS instance", err.to_string());
                return None;
            }
        };
        let id = created_id(
            diags,
            &response["instance"]["id"],
            "Failed to create the RDS instance",
        )?;
        info!(id, "RDS instance created");

        let api = InstanceApi {
            client: &client,
            service: &service,
            id: &id,
        };
        if let Err(err) = api.wait_job(&response).await {
            diags.root_error(
                format!("Failed to wait for the creation job of RDS instance {id}"),
                err.to_string(),
            );
            return None;
        }
        if let Err(err) = api
            .wait_status(
                &["BUILD"],
                &["ACTIVE", "BACKING UP"],
                Duration::from_secs(20),
                Duration::from_secs(10),
            )
            .await
        {
            diags.root_error(
                format!("Failed to wait for RDS instance {id} to become ACTIVE"),
                err.to_string(),
            );
            return None;
        }

        if let Err(err) = tags::create(&service, &instance_path(&id), &state.tags).await {
            diags.error(
                "Failed to set the tags of the RDS instance",
                err.to_string(),
                AttributePath::new("tags"),
            );
            return None;
        }

        // Settings the creation API does not take
        if let Some(description) = non_empty(&state.description) {
            if let Err(err) = api.set_description(description).await {
                step_error(diags, "description", err);
                return None;
            }
        }
        if let Value::Value(true) = state.ssl_enable {
            if let Err(err) = api.set_ssl(true).await {
                step_error(diags, "ssl_enable", err);
                return None;
            }
        }
        if let (Some(begin), Some(end)) = (
            non_empty(&state.maintain_begin),
            non_empty(&state.maintain_end),
        ) {
            if let Err(err) = api.set_maintenance_window(begin, end).await {
                step_error(diags, "maintain_begin", err);
                return None;
            }
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
        let api = InstanceApi {
            client: &client,
            service: &service,
            id: &id,
        };

        if state.name != prior.name {
            if let Err(err) = api.rename(state.name.as_str()).await {
                step_error(diags, "name", err);
                return None;
            }
        }
        if state.description != prior.description {
            if let Err(err) = api.set_description(state.description.as_str()).await {
                step_error(diags, "description", err);
                return None;
            }
        }
        if state.flavor != prior.flavor {
            if let Err(err) = api.resize_flavor(state.flavor.as_str()).await {
                step_error(diags, "flavor", err);
                return None;
            }
        }

        let size = |volume: &Value<VolumeBlock>| {
            volume
                .as_ref_option()
                .and_then(|volume| volume.size.as_ref_option().copied())
        };
        if let (Some(old), Some(new)) = (size(&prior.volume), size(&state.volume)) {
            let result = match new.cmp(&old) {
                std::cmp::Ordering::Greater => api.enlarge_volume(new).await,
                std::cmp::Ordering::Less => Err(anyhow!(
                    "the volume size can only be enlarged, from {old} GB to {new} GB"
                )),
                std::cmp::Ordering::Equal => Ok(()),
            };
            if let Err(err) = result {
                step_error(diags, "volume", err);
                return None;
            }
        }

        if state.backup_strategy != prior.backup_strategy {
            if let Value::Value(backup) = &state.backup_strategy {
                if let Err(err) = api.set_backup_policy(backup).await {
                    step_error(diags, "backup_strategy", err);
                    return None;
                }
            }
        }

        let prior_db = prior.db.as_ref_option();
        let db = state.db.as_ref_option();
        let password = db.and_then(|db| non_empty(&db.password));
        if password.is_some() && password != prior_db.and_then(|db| non_empty(&db.password)) {
            if let Err(err) = api.set_password(password.unwrap_or_default()).await {
                step_error(diags, "db", err);
                return None;
            }
        }
        let port = db.and_then(|db| db.port.as_ref_option().copied());
        if let Some(port) = port {
            if Some(port) != prior_db.and_then(|db| db.port.as_ref_option().copied()) {
                if let Err(err) = api.set_port(port).await {
                    step_error(diags, "db", err);
                    return None;
                }
            }
        }

        if state.security_group_id != prior.security_group_id {
            if let Err(err) = api
                .set_security_group(state.security_group_id.as_str())
                .await
            {
                step_error(diags, "security_group_id", err);
                return None;
            }
        }
        if let Value::Value(enable) = state.ssl_enable {
            if state.ssl_enable != prior.ssl_enable {
                if let Err(err) = api.set_ssl(enable).await {
                    step_error(diags, "ssl_enable", err);
                    return None;
                }
            }
        }
        if state.maintain_begin != prior.maintain_begin || state.maintain_end != prior.maintain_end
        {
            if let (Some(begin), Some(end)) = (
                non_empty(&state.maintain_begin),
                non_empty(&state.maintain_end),
            ) {
                if let Err(err) = api.set_maintenance_window(begin, end).await {
                    step_error(diags, "maintain_begin", err);
                    return None;
                }
            }
        }

        if state.tags != prior.tags {
            if let Err(err) =
                tags::update(&service, &instance_path(&id), &prior.tags, &state.tags).await
            {
                diags.error(
                    "Failed to update the tags of the RDS instance",
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
        let api = InstanceApi {
            client: &client,
            service: &service,
            id,
        };

        let (service_ref, path) = (&service, &instance_path(id));
        if let Err(err) = api.retry(move || service_ref.delete(path)).await {
            if err
                .downcast_ref::<ApiError>()
                .is_some_and(ApiError::is_not_found)
            {
                return Some(());
            }
            diags.root_error("Failed to delete the RDS instance", format!("{err:#}"));
            return None;
        }

        match api
            .wait_status(
                &["ACTIVE", "BACKING UP", "BUILD"],
                &[DELETED],
                Duration::from_secs(15),
                Duration::from_secs(5),
            )
            .await
        {
            Ok(()) => {
                info!(id, "RDS instance deleted");
                Some(())
            }
            Err(err) => {
                diags.root_error("Failed to wait for the RDS instance deletion", err.to_string());
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
        let state = RdsInstanceState {
            id: id.into(),
            ..Default::default()
        };
        match self.refresh(diags, &client, state).await? {
            Value::Value(state) => Some((Value::Value(state), Default::default())),
            _ => {
                diags.root_error_short("Cannot import an RDS instance that does not exist");
                None
            }
        }
    }
}
