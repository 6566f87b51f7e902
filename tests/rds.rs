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
use std::collections::BTreeMap;

use serde_json::{json, Value as Json};
use tf_provider::{AttributePath, DataSource, Diagnostics, Resource};
use tf_provider::value::{Value, ValueEmpty, ValueMap, ValueString};
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use terraform_provider_huaweicloud::rds::{
    DbBlock, RdsBackupResource, RdsBackupState, RdsInstanceResource, RdsInstanceState,
    RdsInstancesDataSource, RdsInstancesState, VolumeBlock,
};

mod common;

fn tags(tags: &[(&'static str, &'static str)]) -> ValueMap<'static, ValueString<'static>> {
    Value::Value(
        tags.iter()
            .map(|(key, value)| (Cow::Borrowed(*key), ValueString::from(*value)))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn planned() -> RdsInstanceState<'static> {
    RdsInstanceState {
        region: common::REGION.into(),
        name: "db".into(),
        description: "primary".into(),
        flavor: "rds.mysql.n1.large.2".into(),
        availability_zone: Value::Value(vec!["cn-north-4a".into()]),
        vpc_id: "vpc-1".into(),
        subnet_id: "subnet-1".into(),
        security_group_id: "sg-1".into(),
        tags: tags(&[("env", "test")]),
        db: Value::Value(DbBlock {
            db_type: "mysql".into(),
            version: "8.0".into(),
            password: "Secret#123".into(),
            port: Value::Unknown,
            user_name: Value::Unknown,
        }),
        volume: Value::Value(VolumeBlock {
            volume_type: "CLOUDSSD".into(),
            size: Value::Value(40),
            disk_encryption_id: Value::Unknown,
        }),
        ..Default::default()
    }
}

fn instance(status: &str, alias: &str, tags: Json) -> Json {
    json!({
        "id": "rds-1",
        "name": "db",
        "status": status,
        "alias": alias,
        "type": "Single",
        "flavor_ref": "rds.mysql.n1.large.2",
        "vpc_id": "vpc-1",
        "subnet_id": "subnet-1",
        "security_group_id": "sg-1",
        "datastore": {"type": "MySQL", "version": "8.0.28"},
        "volume": {"type": "CLOUDSSD", "size": 40},
        "port": 3306,
        "db_user_name": "root",
        "enable_ssl": false,
        "time_zone": "UTC",
        "private_ips": ["192.168.0.10"],
        "public_ips": [],
        "private_dns_names": ["abc123.internal.cn-north-4.mysql.rds.myhuaweicloud.com"],
        "maintenance_window": "02:00-06:00",
        "created": "2024-05-06T07:08:09+0000",
        "nodes": [{
            "id": "node-1",
            "name": "db_node0",
            "role": "master",
            "status": "ACTIVE",
            "availability_zone": "cn-north-4a",
        }],
        "tags": tags,
    })
}

fn instances(instances: &[Json]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "instances": instances,
        "total_count": instances.len(),
    }))
}

async fn mount_instance_status(server: &MockServer, status: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path("/v3/p1/instances"))
        .and(query_param("id", "rds-1"))
        .respond_with(instances(&[instance(status, "primary", json!([]))]))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn instance_create() {
    let server = MockServer::start().await;
    let resource = RdsInstanceResource::new(common::handle(&server));

    Mock::given(method("POST"))
        .and(path("/v3/p1/instances"))
        .and(body_partial_json(json!({
            "name": "db",
            "availability_zone": "cn-north-4a",
            "datastore": {"type": "mysql", "version": "8.0"},
            "volume": {"type": "CLOUDSSD", "size": 40},
            "password": "Secret#123",
            "region": "cn-north-4",
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "instance": {"id": "rds-1", "status": "BUILD"},
            "job_id": "job-1",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/jobs"))
        .and(query_param("id", "job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job": {"status": "Running"}})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/jobs"))
        .and(query_param("id", "job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job": {"status": "Completed"}})))
        .mount(&server)
        .await;
    mount_instance_status(&server, "BUILD", 1).await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/instances"))
        .and(query_param("id", "rds-1"))
        .respond_with(instances(&[instance(
            "ACTIVE",
            "primary",
            json!([{"key": "env", "value": "test"}]),
        )]))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/p1/instances/rds-1/tags/action"))
        .and(body_json(json!({
            "action": "create",
            "tags": [{"key": "env", "value": "test"}],
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v3/p1/instances/rds-1/alias"))
        .and(body_json(json!({"alias": "primary"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
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
        .expect("instance should be created");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);

    let state = state.as_ref_option().expect("instance should exist");
    assert_eq!(state.id.as_str(), "rds-1");
    assert_eq!(state.status.as_str(), "ACTIVE");
    assert_eq!(state.description.as_str(), "primary");
    assert_eq!(state.fixed_ip.as_str(), "192.168.0.10");
    assert_eq!(state.private_dns_name_prefix.as_str(), "abc123");
    assert_eq!(state.maintain_begin.as_str(), "02:00");
    assert_eq!(state.maintain_end.as_str(), "06:00");
    assert_eq!(state.nodes.iter().flatten().count(), 1);
    assert!(state.backup_strategy.is_null());

    // Equivalent remote values keep the configured spelling
    let db = state.db.as_ref_option().expect("db should be set");
    assert_eq!(db.db_type.as_str(), "mysql");
    assert_eq!(db.version.as_str(), "8.0");
    assert_eq!(db.password.as_str(), "Secret#123");
    assert_eq!(db.port, Value::Value(3306));
    assert_eq!(db.user_name.as_str(), "root");
    assert_eq!(state.tags, tags(&[("env", "test")]));
}

#[tokio::test]
async fn instance_update_waits_while_busy() {
    let server = MockServer::start().await;
    let resource = RdsInstanceResource::new(common::handle(&server));

    Mock::given(method("PUT"))
        .and(path("/v3/p1/instances/rds-1/alias"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error_code": "DBS.200047",
            "error_msg": "Another operation is being performed on the DB instance.",
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v3/p1/instances/rds-1/alias"))
        .and(body_json(json!({"alias": "secondary"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    mount_instance_status(&server, "BACKING UP", 1).await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/instances"))
        .and(query_param("id", "rds-1"))
        .respond_with(instances(&[instance(
            "ACTIVE",
            "secondary",
            json!([{"key": "env", "value": "prod"}]),
        )]))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/p1/instances/rds-1/tags/action"))
        .and(body_json(json!({
            "action": "delete",
            "tags": [{"key": "env", "value": "test"}],
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/p1/instances/rds-1/tags/action"))
        .and(body_json(json!({
            "action": "create",
            "tags": [{"key": "env", "value": "prod"}],
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let prior = RdsInstanceState {
        id: "rds-1".into(),
        ..planned()
    };
    let next = RdsInstanceState {
        description: "secondary".into(),
        tags: tags(&[("env", "prod")]),
        ..prior.clone()
    };
    let mut diags = Diagnostics::default();
    let (state, _) = resource
        .update(
            &mut diags,
            Value::Value(prior),
            Value::Value(next.clone()),
            Value::Value(next),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .expect("instance should be updated");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);

    let state = state.as_ref_option().expect("instance should exist");
    assert_eq!(state.description.as_str(), "secondary");
    assert_eq!(state.tags, tags(&[("env", "prod")]));
}

#[tokio::test]
async fn instance_destroy_retries_while_busy() {
    let server = MockServer::start().await;
    let resource = RdsInstanceResource::new(common::handle(&server));

    Mock::given(method("DELETE"))
        .and(path("/v3/p1/instances/rds-1"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error_code": "DBS.201202",
            "error_msg": "The DB instance is being backed up.",
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v3/p1/instances/rds-1"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"job_id": "job-2"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_instance_status(&server, "BACKING UP", 1).await;
    mount_instance_status(&server, "ACTIVE", 1).await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/instances"))
        .and(query_param("id", "rds-1"))
        .respond_with(instances(&[]))
        .mount(&server)
        .await;

    let state = RdsInstanceState {
        id: "rds-1".into(),
        ..planned()
    };
    let mut diags = Diagnostics::default();
    resource
        .destroy(
            &mut diags,
            Value::Value(state),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .expect("instance should be deleted");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
}

#[tokio::test]
async fn instance_destroy_reports_other_errors() {
    let server = MockServer::start().await;
    let resource = RdsInstanceResource::new(common::handle(&server));

    Mock::given(method("DELETE"))
        .and(path("/v3/p1/instances/rds-1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error_code": "DBS.200019",
            "error_msg": "Insufficient permissions.",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = RdsInstanceState {
        id: "rds-1".into(),
        ..planned()
    };
    let mut diags = Diagnostics::default();
    let deleted = resource
        .destroy(
            &mut diags,
            Value::Value(state),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await;
    assert!(deleted.is_none());
    assert_eq!(diags.errors.len(), 1);
}

#[tokio::test]
async fn deleted_instance_is_removed_from_state() {
    let server = MockServer::start().await;
    let resource = RdsInstanceResource::new(common::handle(&server));

    Mock::given(method("GET"))
        .and(path("/v3/p1/instances"))
        .and(query_param("id", "rds-1"))
        .respond_with(instances(&[]))
        .mount(&server)
        .await;

    let state = RdsInstanceState {
        id: "rds-1".into(),
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
async fn instance_plan() {
    let server = MockServer::start().await;
    let resource = RdsInstanceResource::new(common::handle(&server));

    let proposed = RdsInstanceState {
        region: Value::Null,
        ..planned()
    };
    let mut diags = Diagnostics::default();
    let (state, _) = resource
        .plan_create(
            &mut diags,
            Value::Value(proposed.clone()),
            Value::Value(proposed),
            ValueEmpty::default(),
        )
        .await
        .expect("plan should succeed");
    let state = state.as_ref_option().expect("planned state");
    assert_eq!(state.region.as_str(), common::REGION);
    assert!(state.id.is_unknown());
    assert!(state.fixed_ip.is_unknown());
    assert!(state.enterprise_project_id.is_unknown());

    let prior = RdsInstanceState {
        id: "rds-1".into(),
        ..planned()
    };
    let mut upgraded = prior.clone();
    if let Value::Value(db) = &mut upgraded.db {
        db.version = "8.4".into();
    }
    let (_, _, triggers) = resource
        .plan_update(
            &mut diags,
            Value::Value(prior.clone()),
            Value::Value(upgraded.clone()),
            Value::Value(upgraded),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .expect("plan should succeed");
    assert_eq!(triggers, vec![AttributePath::new("db").attribute("version")]);

    let mut shrunk = prior.clone();
    if let Value::Value(volume) = &mut shrunk.volume {
        volume.size = Value::Value(20);
    }
    let planned = resource
        .plan_update(
            &mut diags,
            Value::Value(prior),
            Value::Value(shrunk.clone()),
            Value::Value(shrunk),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await;
    assert!(planned.is_none());
    assert_eq!(diags.errors.len(), 1);
}

fn backup(status: &str) -> Json {
    json!({
        "id": "bk-1",
        "instance_id": "rds-1",
        "name": "nightly",
        "type": "manual",
        "size": 2048,
        "status": status,
        "begin_time": "2024-05-06T07:08:09+0000",
        "end_time": "2024-05-06T07:18:09+0000",
        "databases": [{"name": "app"}],
    })
}

#[tokio::test]
async fn backup_lifecycle() {
    let server = MockServer::start().await;
    let resource = RdsBackupResource::new(common::handle(&server));

    Mock::given(method("POST"))
        .and(path("/v3/p1/backups"))
        .and(body_json(json!({
            "instance_id": "rds-1",
            "name": "nightly",
            "databases": [{"name": "app"}],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "backup": {"id": "bk-1", "status": "BUILDING"},
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/backups"))
        .and(query_param("instance_id", "rds-1"))
        .and(query_param("backup_id", "bk-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"backups": [backup("BUILDING")]})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/backups"))
        .and(query_param("instance_id", "rds-1"))
        .and(query_param("backup_id", "bk-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"backups": [backup("COMPLETED")]})))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    let planned = RdsBackupState {
        region: common::REGION.into(),
        instance_id: "rds-1".into(),
        name: "nightly".into(),
        databases: Value::Value(vec!["app".into()]),
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
        .expect("backup should be created");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    let state = state.as_ref_option().expect("backup should exist").clone();
    assert_eq!(state.id.as_str(), "bk-1");
    assert_eq!(state.status.as_str(), "COMPLETED");
    assert_eq!(state.backup_type.as_str(), "manual");
    assert_eq!(state.size, Value::Value(2048));

    Mock::given(method("DELETE"))
        .and(path("/v3/p1/backups/bk-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/backups"))
        .and(query_param("backup_id", "bk-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"backups": [backup("DELETING")]})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/backups"))
        .and(query_param("backup_id", "bk-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"backups": []})))
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
        .expect("backup should be deleted");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
}

#[tokio::test]
async fn backup_import_id_is_checked() {
    let server = MockServer::start().await;
    let resource = RdsBackupResource::new(common::handle(&server));

    let mut diags = Diagnostics::default();
    let imported = resource.import(&mut diags, "bk-1".to_owned()).await;
    assert!(imported.is_none());
    assert_eq!(diags.errors.len(), 1);
}

#[tokio::test]
async fn instances_are_filtered() {
    let server = MockServer::start().await;
    let data_source = RdsInstancesDataSource::new(common::handle(&server));

    Mock::given(method("GET"))
        .and(path("/v3/p1/instances"))
        .and(query_param("name", "db"))
        .and(query_param("datastore_type", "MySQL"))
        .and(query_param("limit", "100"))
        .and(query_param_is_missing("offset"))
        .respond_with(instances(&[
            instance("ACTIVE", "primary", json!([])),
            json!({
                "id": "rds-2",
                "name": "db-replica",
                "status": "ACTIVE",
                "type": "Replica",
                "datastore": {"type": "MySQL", "version": "8.0.28"},
            }),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let config = RdsInstancesState {
        name: "db".into(),
        datastore_type: "MySQL".into(),
        ..Default::default()
    };
    let mut diags = Diagnostics::default();
    let state = data_source
        .read(&mut diags, config, ValueEmpty::default())
        .await
        .expect("instances should be listed");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);

    let found: Vec<_> = state
        .instances
        .iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id.as_str(), "rds-1");
    assert_eq!(found[0].instance_type.as_str(), "Single");
    assert_eq!(found[0].port, Value::Value(3306));
}
