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

use tf_provider::{Diagnostics, Provider};
use tf_provider::value::{Value, ValueString};

use terraform_provider_huaweicloud::config::ProviderState;
use terraform_provider_huaweicloud::HuaweiCloudProvider;

#[test]
fn registered_resources() {
    let provider = HuaweiCloudProvider::default();
    let mut diags = Diagnostics::default();

    let resources = provider.get_resources(&mut diags).expect("resources");
    let mut names: Vec<&str> = resources.keys().map(String::as_str).collect();
    names.sort_unstable();
    assert_eq!(
        names,
        [
            "networking_secgroup",
            "networking_secgroup_rule",
            "rds_backup",
            "rds_instance",
            "vpc",
            "vpc_route_table",
            "vpc_subnet",
        ]
    );

    let data_sources = provider.get_data_sources(&mut diags).expect("data sources");
    let mut names: Vec<&str> = data_sources.keys().map(String::as_str).collect();
    names.sort_unstable();
    assert_eq!(
        names,
        ["networking_secgroups", "rds_instances", "vpc_subnets", "vpcs"]
    );
    assert!(diags.errors.is_empty());
}

#[tokio::test]
async fn invalid_configuration() {
    let provider = HuaweiCloudProvider::default();
    let mut diags = Diagnostics::default();
    let config = ProviderState {
        endpoints: Value::Value(BTreeMap::from([
            (Cow::from("vpc"), ValueString::from("https://vpc.example.com/")),
            (Cow::from("rds"), ValueString::from("not a url")),
        ])),
        max_retries: Value::Value(-1),
        ..Default::default()
    };
    assert!(provider.validate(&mut diags, config).await.is_none());
    assert_eq!(diags.errors.len(), 2);

    let mut diags = Diagnostics::default();
    let config = ProviderState {
        region: "cn-north-4".into(),
        max_retries: Value::Unknown,
        ..Default::default()
    };
    assert!(provider.validate(&mut diags, config).await.is_some());
}

#[tokio::test]
async fn resources_require_configuration() {
    use tf_provider::Resource;
    use terraform_provider_huaweicloud::client::ClientHandle;
    use terraform_provider_huaweicloud::vpc::{VpcResource, VpcState};

    let resource = VpcResource::new(ClientHandle::default());
    let mut diags = Diagnostics::default();
    let state = VpcState {
        id: "vpc-1".into(),
        ..Default::default()
    };
    let read = resource
        .read(
            &mut diags,
            Value::Value(state),
            Default::default(),
            Default::default(),
        )
        .await;
    assert!(read.is_none());
    assert_eq!(diags.errors.len(), 1);
}
