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

use std::collections::BTreeSet;

use serde_json::{json, Value as Json};
use tf_provider::{DataSource, Diagnostics, Resource};
use tf_provider::value::{Value, ValueEmpty, ValueString};
use wiremock::matchers::{
    body_json, body_partial_json, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

use terraform_provider_huaweicloud::client::ClientHandle;
use terraform_provider_huaweicloud::vpc::{
    RouteState, RouteTableResource, RouteTableState, SubnetResource, SubnetState,
    SubnetsDataSource, SubnetsState, VpcResource, VpcState, VpcsDataSource, VpcsState,
};

mod common;

fn subnet_json(status: &str) -> Json {
    json!({
        "subnet": {
            "id": "s1",
            "name": "subnet",
            "cidr": "192.168.0.0/24",
            "gateway_ip": "192.168.0.1",
            "vpc_id": "vpc-1",
            "status": status,
            "dhcp_enable": true,
            "ipv6_enable": false,
            "primary_dns": "100.125.1.250",
            "secondary_dns": "100.125.129.250",
            "dnsList": ["100.125.1.250", "100.125.129.250"],
            "neutron_subnet_id": "n1",
            "availability_zone": "",
            "extra_dhcp_opts": [{"opt_name": "ntp", "opt_value": "10.0.0.1"}],
        }
    })
}

fn planned() -> SubnetState<'static> {
    SubnetState {
        region: common::REGION.into(),
        name: "subnet".into(),
        cidr: "192.168.0.0/24".into(),
        gateway_ip: "192.168.0.1".into(),
        vpc_id: "vpc-1".into(),
        ntp_server_address: "10.0.0.1".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn subnet_lifecycle() {
    let server = MockServer::start().await;
    let resource = SubnetResource::new(common::handle(&server));

    Mock::given(method("POST"))
        .and(path("/v1/p1/subnets"))
        .and(body_partial_json(json!({
            "subnet": {
                "name": "subnet",
                "dhcp_enable": true,
                "dnsList": ["100.125.1.250", "100.125.129.250"],
                "extra_dhcp_opts": [{"opt_name": "ntp", "opt_value": "10.0.0.1"}],
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(subnet_json("UNKNOWN")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/p1/subnets/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(subnet_json("UNKNOWN")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/p1/subnets/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(subnet_json("ACTIVE")))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.0/p1/subnets/s1/tags"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"tags": [{"key": "env", "value": "test"}]})),
        )
        .mount(&server)
        .await;

    let mut diags = Diagnostics::default();
    let (state, _) = resource
        .create(
            &mut diags,
            Value::Value(planned()),
            Value::Value(planned()),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .expect("subnet should be created");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);

    let state = state.as_ref_option().expect("subnet should exist");
    assert_eq!(state.id.as_str(), "s1");
    assert_eq!(state.status.as_str(), "ACTIVE");
    assert_eq!(state.subnet_id.as_str(), "n1");
    assert_eq!(state.ntp_server_address.as_str(), "10.0.0.1");
    assert!(state.dhcp_lease_time.is_null());
    let tags = state.tags.as_ref_option().expect("tags should be read");
    assert_eq!(tags.get("env"), Some(&ValueString::from("test")));

    // Deletion: the subnet is still there once, then gone
    Mock::given(method("DELETE"))
        .and(path("/v1/p1/vpcs/vpc-1/subnets/s1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/p1/subnets/s1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut diags = Diagnostics::default();
    resource
        .destroy(
            &mut diags,
            Value::Value(state.clone()),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .expect("subnet should be deleted");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
}

#[tokio::test]
async fn deleted_subnet_is_removed_from_state() {
    let server = MockServer::start().await;
    let resource = SubnetResource::new(common::handle(&server));

    Mock::given(method("GET"))
        .and(path("/v1/p1/subnets/s1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let state = SubnetState {
        id: "s1".into(),
        ..planned()
    };
    let mut diags = Diagnostics::default();
    let (state, _) = resource
        .read(
            &mut diags,
            Value::Value(state),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .expect("read should succeed");
    assert!(diags.errors.is_empty());
    assert!(state.is_null());
}

#[tokio::test]
async fn create_failure_is_reported() {
    let server = MockServer::start().await;
    let resource = SubnetResource::new(common::handle(&server));

    Mock::given(method("POST"))
        .and(path("/v1/p1/subnets"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "VPC.0003",
            "message": "cidr is invalid",
        })))
        .mount(&server)
        .await;

    let mut diags = Diagnostics::default();
    let created = resource
        .create(
            &mut diags,
            Value::Value(planned()),
            Value::Value(planned()),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await;
    assert!(created.is_none());
    assert_eq!(diags.errors.len(), 1);
}

#[tokio::test]
async fn vpcs_are_listed_across_pages() {
    let server = MockServer::start().await;
    let data_source = VpcsDataSource::new(common::handle(&server));

    let first: Vec<Json> = (0..100)
        .map(|i| json!({"id": format!("vpc-{i:03}"), "name": format!("vpc-{i:03}"), "cidr": "10.0.0.0/16", "status": "OK"}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/v1/p1/vpcs"))
        .and(query_param("limit", "100"))
        .and(query_param("marker", "vpc-099"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vpcs": [
                {"id": "vpc-web", "name": "web", "cidr": "192.168.0.0/16", "status": "OK", "description": "front"},
                {"id": "vpc-web-2", "name": "web-2", "cidr": "192.168.0.0/16", "status": "OK"},
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/p1/vpcs"))
        .and(query_param_is_missing("marker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"vpcs": first})))
        .expect(2)
        .mount(&server)
        .await;

    let mut diags = Diagnostics::default();
    let state = data_source
        .read(&mut diags, VpcsState::default(), ValueEmpty::default())
        .await
        .expect("vpcs should be listed");
    assert!(diags.errors.is_empty());
    assert_eq!(state.region.as_str(), common::REGION);
    assert_eq!(state.vpcs.iter().flatten().count(), 102);

    let config = VpcsState {
        name: "web".into(),
        ..Default::default()
    };
    let state = data_source
        .read(&mut diags, config, ValueEmpty::default())
        .await
        .expect("vpcs should be listed");
    let vpcs: Vec<_> = state.vpcs.iter().flatten().collect();
    assert_eq!(vpcs.len(), 1);
    let vpc = vpcs[0].as_ref_option().expect("vpc should be known");
    assert_eq!(vpc.id.as_str(), "vpc-web");
    assert_eq!(vpc.description.as_str(), "front");
}

/// Handle on a client whose default region has no known private DNS servers
fn unlisted_region(server: &MockServer) -> ClientHandle {
    common::init_tracing();
    let mut config = common::config(server);
    config.region = "xx-west-1".to_owned();
    config
        .endpoints
        .insert("dns".to_owned(), format!("{}/", server.uri()));
    let handle = ClientHandle::default();
    handle.set(common::client(config));
    handle
}

fn unlisted_planned() -> SubnetState<'static> {
    SubnetState {
        region: "xx-west-1".into(),
        ntp_server_address: Value::Null,
        ..planned()
    }
}

#[tokio::test]
async fn subnet_dns_is_looked_up_for_unlisted_regions() {
    let server = MockServer::start().await;
    let resource = SubnetResource::new(unlisted_region(&server));

    Mock::given(method("GET"))
        .and(path("/v2/nameservers"))
        .and(query_param("server_region", "xx-west-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nameservers": [{
                "hostname": "ns.xx-west-1",
                "ns_records": [{"address": "100.125.0.1"}, {"address": "100.125.0.2"}],
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/p1/subnets"))
        .and(body_partial_json(json!({
            "subnet": {"dnsList": ["100.125.0.1", "100.125.0.2"]}
        })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "VPC.0003",
            "message": "stop here",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut diags = Diagnostics::default();
    let created = resource
        .create(
            &mut diags,
            Value::Value(unlisted_planned()),
            Value::Value(unlisted_planned()),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await;
    assert!(created.is_none());
    assert_eq!(diags.errors.len(), 1);
}

#[tokio::test]
async fn subnet_dns_falls_back_on_public_servers() {
    let server = MockServer::start().await;
    let resource = SubnetResource::new(unlisted_region(&server));

    Mock::given(method("GET"))
        .and(path("/v2/nameservers"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/p1/subnets"))
        .and(body_partial_json(json!({
            "subnet": {"dnsList": ["8.8.8.8", "114.114.114.114"]}
        })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "VPC.0003",
            "message": "stop here",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut diags = Diagnostics::default();
    let created = resource
        .create(
            &mut diags,
            Value::Value(unlisted_planned()),
            Value::Value(unlisted_planned()),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await;
    assert!(created.is_none());
    assert_eq!(diags.errors.len(), 1);
}

#[tokio::test]
async fn subnets_are_filtered() {
    let server = MockServer::start().await;
    let data_source = SubnetsDataSource::new(common::handle(&server));

    Mock::given(method("GET"))
        .and(path("/v1/p1/subnets"))
        .and(query_param("vpc_id", "vpc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subnets": [
                {"id": "s1", "name": "a", "vpc_id": "vpc-1", "status": "ACTIVE", "availability_zone": "cn-north-4a"},
                {"id": "s2", "name": "b", "vpc_id": "vpc-1", "status": "ACTIVE", "availability_zone": "cn-north-4b", "neutron_subnet_id": "n2"},
                {"id": "s3", "name": "c", "vpc_id": "vpc-2", "status": "ACTIVE", "availability_zone": "cn-north-4b"},
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = SubnetsState {
        vpc_id: "vpc-1".into(),
        availability_zone: "cn-north-4b".into(),
        ..Default::default()
    };
    let mut diags = Diagnostics::default();
    let state = data_source
        .read(&mut diags, config, ValueEmpty::default())
        .await
        .expect("subnets should be listed");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    assert_eq!(state.region.as_str(), common::REGION);

    let subnets: Vec<_> = state
        .subnets
        .iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .collect();
    assert_eq!(subnets.len(), 1);
    assert_eq!(subnets[0].id.as_str(), "s2");
    assert_eq!(subnets[0].ipv4_subnet_id.as_str(), "n2");
}

fn vpc_json(status: &str, description: &str) -> Json {
    json!({
        "vpc": {
            "id": "vpc-1",
            "name": "main",
            "cidr": "192.168.0.0/16",
            "description": description,
            "status": status,
            "enterprise_project_id": "0",
        }
    })
}

fn vpc_planned(description: &str) -> VpcState<'static> {
    VpcState {
        region: common::REGION.into(),
        name: "main".into(),
        cidr: "192.168.0.0/16".into(),
        description: description.to_owned().into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn vpc_lifecycle() {
    let server = MockServer::start().await;
    let resource = VpcResource::new(common::handle(&server));

    Mock::given(method("POST"))
        .and(path("/v1/p1/vpcs"))
        .and(body_json(json!({
            "vpc": {"name": "main", "cidr": "192.168.0.0/16", "description": "first"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(vpc_json("CREATING", "first")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.0/p1/vpcs/vpc-1/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tags": []})))
        .mount(&server)
        .await;
    let creating = Mock::given(method("GET"))
        .and(path("/v1/p1/vpcs/vpc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vpc_json("CREATING", "first")))
        .up_to_n_times(1)
        .expect(1)
        .mount_as_scoped(&server)
        .await;
    let created = Mock::given(method("GET"))
        .and(path("/v1/p1/vpcs/vpc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vpc_json("OK", "first")))
        .mount_as_scoped(&server)
        .await;

    let mut diags = Diagnostics::default();
    let (state, _) = resource
        .create(
            &mut diags,
            Value::Value(vpc_planned("first")),
            Value::Value(vpc_planned("first")),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .expect("vpc should be created");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    drop((creating, created));

    let prior = state.as_ref_option().expect("vpc should exist").clone();
    assert_eq!(prior.id.as_str(), "vpc-1");
    assert_eq!(prior.status.as_str(), "OK");
    assert_eq!(prior.enterprise_project_id.as_str(), "0");

    // Update of the description
    Mock::given(method("PUT"))
        .and(path("/v1/p1/vpcs/vpc-1"))
        .and(body_json(json!({
            "vpc": {"name": "main", "cidr": "192.168.0.0/16", "description": "second"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(vpc_json("OK", "second")))
        .expect(1)
        .mount(&server)
        .await;
    let updated = Mock::given(method("GET"))
        .and(path("/v1/p1/vpcs/vpc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vpc_json("OK", "second")))
        .expect(1)
        .mount_as_scoped(&server)
        .await;

    let planned = VpcState {
        description: "second".into(),
        ..prior.clone()
    };
    let mut diags = Diagnostics::default();
    let (state, _) = resource
        .update(
            &mut diags,
            Value::Value(prior),
            Value::Value(planned.clone()),
            Value::Value(planned),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .expect("vpc should be updated");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    drop(updated);
    let state = state.as_ref_option().expect("vpc should exist").clone();
    assert_eq!(state.description.as_str(), "second");

    // Deletion: the VPC is still there once, then gone
    Mock::given(method("DELETE"))
        .and(path("/v1/p1/vpcs/vpc-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/p1/vpcs/vpc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vpc_json("OK", "second")))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/p1/vpcs/vpc-1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1..)
        .mount(&server)
        .await;

    let mut diags = Diagnostics::default();
    resource
        .destroy(
            &mut diags,
            Value::Value(state),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .expect("vpc should be deleted");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
}

#[tokio::test]
async fn vpc_without_id_is_not_created() {
    let server = MockServer::start().await;
    let resource = VpcResource::new(common::handle(&server));

    Mock::given(method("POST"))
        .and(path("/v1/p1/vpcs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"vpc": {"name": "main"}})))
        .expect(1)
        .mount(&server)
        .await;

    let mut diags = Diagnostics::default();
    let created = resource
        .create(
            &mut diags,
            Value::Value(vpc_planned("")),
            Value::Value(vpc_planned("")),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await;
    assert!(created.is_none());
    assert_eq!(diags.errors.len(), 1);
}

fn route(destination: &str, nexthop: &str) -> Value<RouteState<'static>> {
    Value::Value(RouteState {
        destination: destination.to_owned().into(),
        route_type: "peering".into(),
        nexthop: nexthop.to_owned().into(),
        ..Default::default()
    })
}

fn table_json(routes: Json, subnets: Json) -> Json {
    json!({
        "routetable": {
            "id": "rt-1",
            "name": "rt",
            "vpc_id": "vpc-1",
            "default": false,
            "routes": routes,
            "subnets": subnets,
        }
    })
}

#[tokio::test]
async fn route_table_lifecycle() {
    let server = MockServer::start().await;
    let resource = RouteTableResource::new(common::handle(&server));

    Mock::given(method("POST"))
        .and(path("/v1/p1/routetables"))
        .and(body_json(json!({
            "routetable": {
                "name": "rt",
                "vpc_id": "vpc-1",
                "routes": [
                    {"type": "peering", "destination": "10.1.0.0/16", "nexthop": "peer-1"},
                    {"type": "peering", "destination": "172.16.0.0/16", "nexthop": "peer-1"},
                ],
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"routetable": {"id": "rt-1"}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/p1/routetables/rt-1/action"))
        .and(body_json(json!({"routetable": {"subnets": {"associate": ["s1"]}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    let created = Mock::given(method("GET"))
        .and(path("/v1/p1/routetables/rt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(table_json(
            json!([
                {"type": "local", "destination": "192.168.0.0/16", "nexthop": "-"},
                {"type": "peering", "destination": "10.1.0.0/16", "nexthop": "peer-1"},
                {"type": "peering", "destination": "172.16.0.0/16", "nexthop": "peer-1"},
            ]),
            json!([{"id": "s1"}]),
        )))
        .expect(1)
        .mount_as_scoped(&server)
        .await;

    let planned = RouteTableState {
        region: common::REGION.into(),
        vpc_id: "vpc-1".into(),
        name: "rt".into(),
        subnets: Value::Value(BTreeSet::from(["s1".into()])),
        route: Value::Value(vec![
            route("10.1.0.0/16", "peer-1"),
            route("172.16.0.0/16", "peer-1"),
        ]),
        ..Default::default()
    };
    let mut diags = Diagnostics::default();
    let (state, _) = resource
        .create(
            &mut diags,
            Value::Value(planned.clone()),
            Value::Value(planned),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .expect("route table should be created");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    drop(created);

    let prior = state.as_ref_option().expect("route table should exist").clone();
    assert_eq!(prior.id.as_str(), "rt-1");
    assert_eq!(prior.default, Value::Value(false));
    assert_eq!(prior.route.iter().flatten().count(), 2, "local routes are skipped");

    // One route changes its next hop, one is added and one is removed
    Mock::given(method("PUT"))
        .and(path("/v1/p1/routetables/rt-1"))
        .and(body_json(json!({
            "routetable": {
                "name": "rt",
                "routes": {
                    "add": [{"type": "peering", "destination": "10.2.0.0/16", "nexthop": "peer-2"}],
                    "mod": [{"type": "peering", "destination": "172.16.0.0/16", "nexthop": "peer-2"}],
                    "del": [{"type": "peering", "destination": "10.1.0.0/16", "nexthop": "peer-1"}],
                },
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/p1/routetables/rt-1/action"))
        .and(body_json(json!({
            "routetable": {"subnets": {"associate": ["s2"], "disassociate": ["s1"]}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    let updated = Mock::given(method("GET"))
        .and(path("/v1/p1/routetables/rt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(table_json(
            json!([
                {"type": "peering", "destination": "10.2.0.0/16", "nexthop": "peer-2"},
                {"type": "peering", "destination": "172.16.0.0/16", "nexthop": "peer-2"},
            ]),
            json!([{"id": "s2"}]),
        )))
        .expect(1)
        .mount_as_scoped(&server)
        .await;

    let planned = RouteTableState {
        subnets: Value::Value(BTreeSet::from(["s2".into()])),
        route: Value::Value(vec![
            route("10.2.0.0/16", "peer-2"),
            route("172.16.0.0/16", "peer-2"),
        ]),
        ..prior.clone()
    };
    let mut diags = Diagnostics::default();
    let (state, _) = resource
        .update(
            &mut diags,
            Value::Value(prior),
            Value::Value(planned.clone()),
            Value::Value(planned),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .expect("route table should be updated");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    drop(updated);
    let state = state.as_ref_option().expect("route table should exist").clone();
    assert_eq!(state.subnets, Value::Value(BTreeSet::from(["s2".into()])));

    // Deletion disassociates the remaining subnets first
    Mock::given(method("POST"))
        .and(path("/v1/p1/routetables/rt-1/action"))
        .and(body_json(json!({"routetable": {"subnets": {"disassociate": ["s2"]}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/p1/routetables/rt-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut diags = Diagnostics::default();
    resource
        .destroy(
            &mut diags,
            Value::Value(state),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .expect("route table should be deleted");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
}

#[tokio::test]
async fn default_route_table_cannot_be_destroyed() {
    let server = MockServer::start().await;
    let resource = RouteTableResource::new(common::handle(&server));

    let state = RouteTableState {
        id: "rt-0".into(),
        region: common::REGION.into(),
        vpc_id: "vpc-1".into(),
        name: "default".into(),
        default: Value::Value(true),
        ..Default::default()
    };
    let mut diags = Diagnostics::default();
    let planned = resource
        .plan_destroy(
            &mut diags,
            Value::Value(state.clone()),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await;
    assert!(planned.is_none());
    assert_eq!(diags.errors.len(), 1);

    // no request reaches the API either
    let mut diags = Diagnostics::default();
    let destroyed = resource
        .destroy(
            &mut diags,
            Value::Value(state),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await;
    assert!(destroyed.is_none());
    assert_eq!(diags.errors.len(), 1);
    assert!(server
        .received_requests()
        .await
        .unwrap_or_default()
        .is_empty());
}
