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

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{json, Value as Json};
use tracing::{debug, info, warn};

use tf_provider::{AttributePath, Diagnostics, Resource};
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty};

use crate::client::{Client, ClientHandle, ServiceClient};
use crate::tags;
use crate::utils::{
    bool_or, check_deleted, created_id, json_bool, json_non_empty, json_str, json_str_list, known,
    prune, replace_if_changed, strings, unknown_if_null, WithNormalize, WithSchema, WithValidate,
};
use crate::wait::{Refreshed, StateChangeConf, DELETED};

use super::state::SubnetState;
use super::SERVICE;

const CREATE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Private DNS servers of the regions
const PRIVATE_DNS: &[(&str, &[&str])] = &[
    ("cn-north-1", &["100.125.1.250", "100.125.21.250"]),
    ("cn-north-4", &["100.125.1.250", "100.125.129.250"]),
    ("cn-north-9", &["100.125.1.250", "100.125.107.250"]),
    ("cn-east-2", &["100.125.17.29", "100.125.135.29"]),
    ("cn-east-3", &["100.125.1.250", "100.125.64.250"]),
    ("cn-south-1", &["100.125.1.250", "100.125.136.29"]),
    ("cn-south-4", &["100.125.0.167"]),
    ("cn-southwest-2", &["100.125.1.250", "100.125.129.250"]),
    ("ap-southeast-1", &["100.125.1.250", "100.125.3.250"]),
    ("ap-southeast-2", &["100.125.1.250", "100.125.1.251"]),
    ("ap-southeast-3", &["100.125.1.250", "100.125.128.250"]),
    ("af-south-1", &["100.125.1.250", "100.125.1.14"]),
    ("tr-west-1", &["100.125.2.250", "100.125.2.251"]),
    ("sa-brazil-1", &["100.125.1.22", "100.125.1.90"]),
    ("na-mexico-1", &["100.125.1.22", "100.125.1.90"]),
    ("la-north-2", &["100.125.1.250", "100.125.1.242"]),
    ("la-south-2", &["100.125.1.250", "100.125.0.250"]),
    ("sa-chile-1", &["100.125.1.250", "100.125.0.250"]),
];

const PUBLIC_DNS: &[&str] = &["8.8.8.8", "114.114.114.114"];
const DNS_SERVICE: &str = "dns";

/// Extra DHCP options, by attribute
const DHCP_OPTIONS: &[(&str, &str)] = &[
    ("ntp_server_address", "ntp"),
    ("dhcp_lease_time", "addresstime"),
    ("dhcp_ipv6_lease_time", "ipv6_addresstime"),
    ("dhcp_domain_name", "domainname"),
];

/// DNS servers of a new subnet, when they can be decided offline
///
/// An explicit list wins. Without it, nothing is sent when `primary_dns` is
/// set, otherwise the private servers of the region are used. `None` means
/// that the region is not known and its name servers must be looked up.
pub fn dns_list(state: &SubnetState, region: &str) -> Option<Vec<String>> {
    let explicit = strings(&state.dns_list);
    if !explicit.is_empty() {
        return Some(explicit.into_iter().map(str::to_owned).collect());
    }
    if state.primary_dns.is_value() && !state.primary_dns.as_str().is_empty() {
        return Some(Vec::new());
    }
    PRIVATE_DNS
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, servers)| servers.iter().map(|s| s.to_string()).collect())
}

/// Name servers of a region, from the DNS service
///
/// Falls back to public servers when the lookup fails or returns nothing.
pub async fn region_dns(client: &Client, region: &str) -> Vec<String> {
    let servers = match client.service(DNS_SERVICE, region).await {
        Ok(dns) => dns
            .list("/v2/nameservers", &[("server_region", region)])
            .await
            .map(|response| nameserver_addresses(&response)),
        Err(err) => Err(err),
    };
    match servers {
        Ok(servers) if !servers.is_empty() => servers,
        Ok(_) => {
            warn!(region, "No name servers found for the region, using public ones");
            PUBLIC_DNS.iter().map(|s| s.to_string()).collect()
        }
        Err(err) => {
            warn!(region, %err, "Failed to look up the name servers, using public ones");
            PUBLIC_DNS.iter().map(|s| s.to_string()).collect()
        }
    }
}

/// Addresses of the first name server of a `/v2/nameservers` response
fn nameserver_addresses(response: &Json) -> Vec<String> {
    response["nameservers"][0]["ns_records"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|record| record["address"].as_str())
        .filter(|address| !address.is_empty())
        .map(str::to_owned)
        .collect()
}

impl SubnetState<'_> {
    fn dhcp_option(&self, option: &str) -> Option<&str> {
        let value = match option {
            "ntp" => &self.ntp_server_address,
            "addresstime" => &self.dhcp_lease_time,
            "ipv6_addresstime" => &self.dhcp_ipv6_lease_time,
            "domainname" => &self.dhcp_domain_name,
            _ => return None,
        };
        value.as_deref_option().filter(|s| !s.is_empty())
    }

    /// Extra DHCP options of the subnet
    ///
    /// On update, `ntp` and `domainname` are always sent so that they are cleared when removed.
    pub fn dhcp_options(&self, update: bool) -> Vec<Json> {
        DHCP_OPTIONS
            .iter()
            .filter_map(|(_, option)| match self.dhcp_option(option) {
                Some(value) => Some(json!({"opt_name": option, "opt_value": value})),
                None if update && matches!(*option, "ntp" | "domainname") => {
                    Some(json!({"opt_name": option, "opt_value": null}))
                }
                None => None,
            })
            .collect()
    }

    fn create_body(&self, dns_list: &[String]) -> Json {
        prune(json!({
            "subnet": {
                "name": self.name.as_str(),
                "cidr": self.cidr.as_str(),
                "gateway_ip": self.gateway_ip.as_str(),
                "vpc_id": self.vpc_id.as_str(),
                "description": self.description.as_str(),
                "availability_zone": self.availability_zone.as_deref_option(),
                "ipv6_enable": bool_or(&self.ipv6_enable, false),
                "dhcp_enable": bool_or(&self.dhcp_enable, true),
                "primary_dns": self.primary_dns.as_deref_option(),
                "secondary_dns": self.secondary_dns.as_deref_option(),
                "dnsList": dns_list,
                "extra_dhcp_opts": self.dhcp_options(false),
            }
        }))
    }

    /// Body of the update request, `None` when only the tags changed
    fn update_body(&self, prior: &SubnetState) -> Option<Json> {
        let dhcp_changed = self.ntp_server_address != prior.ntp_server_address
            || self.dhcp_lease_time != prior.dhcp_lease_time
            || self.dhcp_ipv6_lease_time != prior.dhcp_ipv6_lease_time
            || self.dhcp_domain_name != prior.dhcp_domain_name;
        let changed = dhcp_changed
            || self.name != prior.name
            || self.description != prior.description
            || self.dhcp_enable != prior.dhcp_enable
            || self.ipv6_enable != prior.ipv6_enable
            || self.primary_dns != prior.primary_dns
            || self.secondary_dns != prior.secondary_dns
            || self.dns_list != prior.dns_list;
        if !changed {
            return None;
        }

        // name and dhcp_enable are mandatory
        let mut subnet = json!({
            "name": self.name.as_str(),
            "dhcp_enable": bool_or(&self.dhcp_enable, true),
        });
        if self.ipv6_enable != prior.ipv6_enable && bool_or(&self.ipv6_enable, false) {
            subnet["ipv6_enable"] = json!(true);
        }
        if self.description != prior.description {
            subnet["description"] = json!(self.description.as_str());
        }
        if self.primary_dns != prior.primary_dns {
            subnet["primary_dns"] = json!(self.primary_dns.as_str());
        }
        if self.secondary_dns != prior.secondary_dns {
            subnet["secondary_dns"] = json!(self.secondary_dns.as_str());
        }
        if self.dns_list != prior.dns_list {
            subnet["dnsList"] = json!(strings(&self.dns_list));
        }
        if dhcp_changed {
            subnet["extra_dhcp_opts"] = json!(self.dhcp_options(true));
        }
        Some(json!({ "subnet": subnet }))
    }

    fn flatten(&mut self, subnet: &Json, region: &str) {
        self.id = json_str(subnet, "id");
        self.region = region.to_owned().into();
        self.name = json_str(subnet, "name");
        self.description = json_non_empty(subnet, "description");
        self.cidr = json_str(subnet, "cidr");
        self.gateway_ip = json_str(subnet, "gateway_ip");
        self.vpc_id = json_str(subnet, "vpc_id");
        self.availability_zone = json_str(subnet, "availability_zone");
        self.ipv6_enable = json_bool(subnet, "ipv6_enable");
        self.dhcp_enable = json_bool(subnet, "dhcp_enable");
        self.primary_dns = json_str(subnet, "primary_dns");
        self.secondary_dns = json_str(subnet, "secondary_dns");
        self.dns_list = json_str_list(subnet, "dnsList");
        self.subnet_id = json_str(subnet, "neutron_subnet_id");
        self.ipv4_subnet_id = json_str(subnet, "neutron_subnet_id");
        self.ipv6_subnet_id = json_non_empty(subnet, "neutron_subnet_id_v6");
        self.ipv6_cidr = json_non_empty(subnet, "cidr_v6");
        self.ipv6_gateway = json_non_empty(subnet, "gateway_ip_v6");
        self.status = json_str(subnet, "status");

        self.ntp_server_address = Value::Null;
        self.dhcp_lease_time = Value::Null;
        self.dhcp_ipv6_lease_time = Value::Null;
        self.dhcp_domain_name = Value::Null;
        for option in subnet["extra_dhcp_opts"].as_array().into_iter().flatten() {
            let value = json_non_empty(option, "opt_value");
            match option["opt_name"].as_str() {
                Some("ntp") => self.ntp_server_address = value,
                Some("addresstime") => self.dhcp_lease_time = value,
                Some("ipv6_addresstime") => self.dhcp_ipv6_lease_time = value,
                Some("domainname") => self.dhcp_domain_name = value,
                _ => (),
            }
        }
    }
}

fn subnet_path(id: &str) -> String {
    format!("/v1/{{project_id}}/subnets/{id}")
}

fn tags_path(id: &str) -> String {
    format!("/v2.0/{{project_id}}/subnets/{id}")
}

async fn refresh_status(service: &ServiceClient<'_>, id: &str) -> anyhow::Result<Refreshed<Json>> {
    let response = service.get(&subnet_path(id)).await?;
    let subnet = response["subnet"].clone();
    let status = subnet["status"].as_str().unwrap_or_default().to_owned();
    match status.as_str() {
        "ACTIVE" => Ok(Refreshed::State(subnet, status)),
        "DOWN" | "ERROR" => Err(anyhow!("subnet status: '{status}'")),
        _ => Ok(Refreshed::State(subnet, "UNKNOWN".to_owned())),
    }
}

/// One step of the deletion loop: check the subnet still exists, then try to delete it
async fn delete_step(
    service: &ServiceClient<'_>,
    vpc_id: &str,
    id: &str,
) -> anyhow::Result<Refreshed<()>> {
    let active = Ok(Refreshed::State((), "ACTIVE".to_owned()));
    match service.get(&subnet_path(id)).await {
        Ok(_) => (),
        Err(err) if err.is_not_found() => {
            info!(id, "Successfully deleted subnet");
            return Ok(Refreshed::Gone);
        }
        // flow control or temporary permission errors
        Err(err) if err.has_status(&[500, 403]) => {
            debug!(id, %err, "Failed to get subnet, retrying");
            return active;
        }
        Err(err) => return Err(err.into()),
    }

    match service
        .delete(&format!("/v1/{{project_id}}/vpcs/{vpc_id}/subnets/{id}"))
        .await
    {
        Ok(_) => active,
        Err(err) if err.has_status(&[404, 400]) => {
            info!(id, "Successfully deleted subnet");
            Ok(Refreshed::Gone)
        }
        Err(err) if err.has_status(&[500, 409]) => {
            debug!(id, %err, "Failed to delete subnet, retrying");
            active
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Default, Clone)]
pub struct SubnetResource {
    client: ClientHandle,
}

impl SubnetResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    async fn refresh<'a>(
        &self,
        diags: &mut Diagnostics,
        client: &Client,
        mut state: SubnetState<'a>,
    ) -> Option<Value<SubnetState<'a>>> {
        let region = client.region(&state.region).to_owned();
        let service = client.connect(diags, SERVICE, &region).await?;
        let id = state.id.as_str().to_owned();

        let subnet = match service.get(&subnet_path(&id)).await {
            Ok(response) => response["subnet"].clone(),
            Err(err) => return check_deleted(diags, err, "Failed to read the subnet"),
        };
        state.flatten(&subnet, &region);

        match tags::get(&service, &tags_path(&id)).await {
            Ok(tags) => state.tags = tags::flatten(tags),
            Err(err) => warn!(id, %err, "Failed to fetch the tags of the subnet"),
        }
        Some(Value::Value(state))
    }
}

#[async_trait]
impl Resource for SubnetResource {
    type State<'a> = Value<SubnetState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SubnetState::schema())
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
        state.status = Value::Unknown;
        state.subnet_id = Value::Unknown;
        state.ipv4_subnet_id = Value::Unknown;
        state.ipv6_subnet_id = Value::Unknown;
        state.ipv6_cidr = Value::Unknown;
        state.ipv6_gateway = Value::Unknown;
        unknown_if_null(&mut state.availability_zone);
        unknown_if_null(&mut state.ipv6_enable);
        unknown_if_null(&mut state.primary_dns);
        unknown_if_null(&mut state.secondary_dns);
        unknown_if_null(&mut state.dns_list);
        unknown_if_null(&mut state.dhcp_lease_time);
        unknown_if_null(&mut state.dhcp_ipv6_lease_time);

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

        let mut trigger_replace = Vec::new();
        for (name, prior, proposed) in [
            ("region", &prior.region, &state.region),
            ("cidr", &prior.cidr, &state.cidr),
            ("gateway_ip", &prior.gateway_ip, &state.gateway_ip),
            ("vpc_id", &prior.vpc_id, &state.vpc_id),
            ("availability_zone", &prior.availability_zone, &state.availability_zone),
        ] {
            replace_if_changed(&mut trigger_replace, AttributePath::new(name), prior, proposed);
        }

        if bool_or(&prior.ipv6_enable, false) && state.ipv6_enable == Value::Value(false) {
            diags.error(
                "IPv6 cannot be disabled",
                "IPv6 cannot be disabled once it has been enabled on a subnet.",
                AttributePath::new("ipv6_enable"),
            );
            return None;
        }
        if prior.ipv6_enable != state.ipv6_enable {
            state.ipv6_subnet_id = Value::Unknown;
            state.ipv6_cidr = Value::Unknown;
            state.ipv6_gateway = Value::Unknown;
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

        let dns = match dns_list(&state, &region) {
            Some(dns) => dns,
            None => region_dns(&client, &region).await,
        };
        let body = state.create_body(&dns);
        debug!(%body, "Create VPC subnet");
        let id = match service.post("/v1/{project_id}/subnets", &body).await {
            Ok(response) => {
                created_id(diags, &response["subnet"]["id"], "Failed to create the VPC subnet")?
            }
            Err(err) => {
                diags.root_error("Failed to create the VPC subnet", err.to_string());
                return None;
            }
        };
        info!(id, "VPC subnet created");

        let conf = client.pace(StateChangeConf {
            pending: &["UNKNOWN"],
            target: &["ACTIVE"],
            delay: Duration::from_secs(5),
            poll_interval: Duration::from_secs(5),
            timeout: CREATE_TIMEOUT,
            ..Default::default()
        });
        let (service_ref, id_ref) = (&service, id.as_str());
        if let Err(err) = conf
            .wait_for_state(move || refresh_status(service_ref, id_ref))
            .await
        {
            diags.root_error(
                format!("Failed to wait for subnet {id} to become ACTIVE"),
                err.to_string(),
            );
            return None;
        }

        if let Err(err) = tags::create(&service, &tags_path(&id), &state.tags).await {
            diags.error(
                "Failed to set the tags of the subnet",
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
        let state = known(diags, planned_state)?;
        let region = client.region(&state.region).to_owned();
        let service = client.connect(diags, SERVICE, &region).await?;
        let id = prior.id.as_str().to_owned();

        if let Some(body) = state.update_body(&prior) {
            debug!(%body, "Update VPC subnet");
            let path = format!(
                "/v1/{{project_id}}/vpcs/{}/subnets/{id}",
                state.vpc_id.as_str()
            );
            if let Err(err) = service.put(&path, &body).await {
                diags.root_error("Failed to update the VPC subnet", err.to_string());
                return None;
            }
        }

        if state.tags != prior.tags {
            if let Err(err) =
                tags::update(&service, &tags_path(&id), &prior.tags, &state.tags).await
            {
                diags.error(
                    "Failed to update the tags of the subnet",
                    err.to_string(),
                    AttributePath::new("tags"),
                );
                return None;
            }
        }

        let mut state = state;
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
            poll_interval: Duration::from_secs(5),
            timeout: DELETE_TIMEOUT,
            ..Default::default()
        });
        let (service, vpc_id, id) = (&service, state.vpc_id.as_str(), state.id.as_str());
        match conf
            .wait_for_state(move || delete_step(service, vpc_id, id))
            .await
        {
            Ok(_) => Some(()),
            Err(err) => {
                diags.root_error("Failed to delete the VPC subnet", err.to_string());
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
        let state = SubnetState {
            id: id.into(),
            ..Default::default()
        };
        match self.refresh(diags, &client, state).await? {
            Value::Value(mut state) => {
                state.normalize(diags);
                Some((Value::Value(state), Default::default()))
            }
            _ => {
                diags.root_error_short("Cannot import a subnet that does not exist");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subnet() -> SubnetState<'static> {
        SubnetState {
            name: "subnet".into(),
            cidr: "192.168.0.0/24".into(),
            gateway_ip: "192.168.0.1".into(),
            vpc_id: "vpc-1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn explicit_dns_list_wins() {
        let state = SubnetState {
            dns_list: Value::Value(vec!["1.1.1.1".into()]),
            primary_dns: "100.125.1.250".into(),
            ..subnet()
        };
        assert_eq!(dns_list(&state, "cn-north-4"), Some(vec!["1.1.1.1".to_owned()]));
    }

    #[test]
    fn primary_dns_disables_the_default_list() {
        let state = SubnetState {
            primary_dns: "100.125.1.250".into(),
            ..subnet()
        };
        assert_eq!(dns_list(&state, "cn-north-4"), Some(vec![]));
    }

    #[test]
    fn unknown_regions_are_looked_up() {
        assert_eq!(
            dns_list(&subnet(), "cn-east-3"),
            Some(vec!["100.125.1.250".to_owned(), "100.125.64.250".to_owned()])
        );
        assert_eq!(dns_list(&subnet(), "xx-unknown-1"), None);
    }

    #[test]
    fn first_nameserver_records() {
        let response = json!({
            "nameservers": [
                {"ns_records": [
                    {"address": "100.125.0.1"},
                    {"hostname": "ns"},
                    {"address": "100.125.0.2"},
                ]},
                {"ns_records": [{"address": "100.125.9.9"}]},
            ]
        });
        assert_eq!(nameserver_addresses(&response), vec!["100.125.0.1", "100.125.0.2"]);
        assert!(nameserver_addresses(&json!({"nameservers": []})).is_empty());
    }

    #[test]
    fn dhcp_options_mapping() {
        let state = SubnetState {
            dhcp_lease_time: "24h".into(),
            dhcp_domain_name: "example.com".into(),
            ..subnet()
        };
        assert_eq!(
            state.dhcp_options(false),
            vec![
                json!({"opt_name": "addresstime", "opt_value": "24h"}),
                json!({"opt_name": "domainname", "opt_value": "example.com"}),
            ]
        );
        assert_eq!(
            state.dhcp_options(true),
            vec![
                json!({"opt_name": "ntp", "opt_value": null}),
                json!({"opt_name": "addresstime", "opt_value": "24h"}),
                json!({"opt_name": "domainname", "opt_value": "example.com"}),
            ]
        );
    }

    #[test]
    fn create_body_drops_empty_values() {
        let dns = dns_list(&subnet(), "cn-north-4").unwrap_or_default();
        let body = subnet().create_body(&dns);
        assert_eq!(
            body,
            json!({
                "subnet": {
                    "name": "subnet",
                    "cidr": "192.168.0.0/24",
                    "gateway_ip": "192.168.0.1",
                    "vpc_id": "vpc-1",
                    "ipv6_enable": false,
                    "dhcp_enable": true,
                    "dnsList": ["100.125.1.250", "100.125.129.250"],
                }
            })
        );
    }

    #[test]
    fn update_body() {
        let prior = SubnetState {
            ntp_server_address: "10.0.0.1".into(),
            dhcp_enable: Value::Value(true),
            ..subnet()
        };
        assert_eq!(prior.clone().update_body(&prior), None);

        let state = SubnetState {
            name: "renamed".into(),
            ntp_server_address: Value::Null,
            ..prior.clone()
        };
        assert_eq!(
            state.update_body(&prior),
            Some(json!({
                "subnet": {
                    "name": "renamed",
                    "dhcp_enable": true,
                    "extra_dhcp_opts": [
                        {"opt_name": "ntp", "opt_value": null},
                        {"opt_name": "domainname", "opt_value": null},
                    ],
                }
            }))
        );
    }

    #[test]
    fn flatten_subnet() {
        let mut state = SubnetState::default();
        state.flatten(
            &json!({
                "id": "s-1",
                "name": "subnet",
                "description": "",
                "cidr": "192.168.0.0/24",
                "gateway_ip": "192.168.0.1",
                "vpc_id": "vpc-1",
                "status": "ACTIVE",
                "dhcp_enable": true,
                "ipv6_enable": false,
                "neutron_subnet_id": "n-1",
                "dnsList": ["100.125.1.250"],
                "extra_dhcp_opts": [
                    {"opt_name": "addresstime", "opt_value": "24h"},
                    {"opt_name": "ntp", "opt_value": "10.0.0.1"},
                ],
            }),
            "cn-north-4",
        );
        assert_eq!(state.id.as_str(), "s-1");
        assert_eq!(state.region.as_str(), "cn-north-4");
        assert!(state.description.is_null());
        assert_eq!(state.subnet_id.as_str(), "n-1");
        assert_eq!(state.ipv4_subnet_id.as_str(), "n-1");
        assert!(state.ipv6_subnet_id.is_null());
        assert_eq!(state.dhcp_lease_time.as_str(), "24h");
        assert_eq!(state.ntp_server_address.as_str(), "10.0.0.1");
        assert!(state.dhcp_domain_name.is_null());
        assert_eq!(strings(&state.dns_list), vec!["100.125.1.250"]);
    }
}
