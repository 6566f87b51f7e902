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

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::time::Duration;

use terraform_provider_huaweicloud::client::{Client, ClientHandle};
use terraform_provider_huaweicloud::config::Config;
use wiremock::MockServer;

pub const REGION: &str = "cn-north-4";
pub const PROJECT: &str = "p1";

pub fn init_tracing() {
    _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Configuration sending every service to the mock server
pub fn config(server: &MockServer) -> Config {
    let endpoint = format!("{}/", server.uri());
    Config {
        region: REGION.to_owned(),
        access_key: "AK".to_owned(),
        secret_key: "SK".to_owned(),
        project_id: Some(PROJECT.to_owned()),
        auth_url: format!("{}/v3", server.uri()),
        cloud: "example.com".to_owned(),
        endpoints: BTreeMap::from([
            ("vpc".to_owned(), endpoint.clone()),
            ("rds".to_owned(), endpoint),
        ]),
        max_retries: 2,
        ..Default::default()
    }
}

pub fn client(config: Config) -> Client {
    Client::new(config)
        .expect("client should build")
        .with_poll_interval(Duration::from_millis(10))
        .with_backoff_unit(Duration::from_millis(10))
}

pub fn handle(server: &MockServer) -> ClientHandle {
    init_tracing();
    let handle = ClientHandle::default();
    handle.set(client(config(server)));
    handle
}
