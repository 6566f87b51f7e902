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

//! Relational database service: instances and manual backups

mod backup;
mod data_source;
mod instance;
mod state;
mod validate;

pub use backup::RdsBackupResource;
pub use data_source::RdsInstancesDataSource;
pub use instance::{parse_maintenance_window, RdsInstanceResource};
pub use state::{
    BackupStrategyBlock, DbBlock, NodeItem, RdsBackupState, RdsInstanceItem, RdsInstanceState,
    RdsInstancesState, RestoreBlock, VolumeBlock,
};

pub(crate) const SERVICE: &str = "rds";
