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

//! VPC networking: VPCs, subnets and custom route tables

mod data_source;
mod network;
mod route_table;
mod state;
mod subnet;
mod validate;

pub use data_source::{SubnetsDataSource, VpcsDataSource};
pub use network::VpcResource;
pub use route_table::{diff_routes, Route, RouteChanges, RouteTableResource};
pub use state::{
    RouteState, RouteTableState, SubnetItem, SubnetState, SubnetsState, VpcItem, VpcState, VpcsState,
};
pub use subnet::{dns_list, region_dns, SubnetResource};
pub use validate::ROUTE_TYPES;

pub(crate) const SERVICE: &str = "vpc";
