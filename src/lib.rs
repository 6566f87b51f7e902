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

//! Terraform and OpenTofu provider for Huawei Cloud
//!
//! The provider manages VPCs, subnets, route tables, security groups and RDS instances.
//! Every resource talks to the regional service endpoints through a signed [`client::Client`]
//! shared by the [`HuaweiCloudProvider`] once it is configured.

pub mod client;
pub mod config;
pub mod diff;
pub mod pagination;
pub mod provider;
pub mod rds;
pub mod secgroup;
pub mod tags;
pub mod vpc;
pub mod wait;

mod utils;

pub use provider::HuaweiCloudProvider;
