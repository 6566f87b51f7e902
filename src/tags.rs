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

//! Resource tags
//!
//! Tags are managed through the `{resource}/tags/action` batch API of each
//! service: removed or changed tags are deleted first, then new or changed
//! tags are created.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use tf_provider::value::{Value, ValueMap, ValueString};

use crate::client::{ApiError, ServiceClient};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Tags as written in the configuration
pub fn expand(tags: &ValueMap<'_, ValueString<'_>>) -> Vec<Tag> {
    tags.iter()
        .flatten()
        .map(|(key, value)| Tag::new(key.as_ref(), value.as_str()))
        .collect()
}

/// Tags as stored in the state
///
/// No tag at all is stored as null so that an absent `tags` attribute stays absent.
pub fn flatten<'a>(tags: Vec<Tag>) -> ValueMap<'a, ValueString<'a>> {
    if tags.is_empty() {
        return Value::Null;
    }
    Value::Value(
        tags.into_iter()
            .map(|tag| (Cow::Owned(tag.key), Value::Value(Cow::Owned(tag.value))))
            .collect(),
    )
}

/// Compute the tags to delete and the tags to create
///
/// A tag whose value changed is both deleted and created.
pub fn diff(old: &[Tag], new: &[Tag]) -> (Vec<Tag>, Vec<Tag>) {
    let old_map: BTreeMap<&str, &str> = old
        .iter()
        .map(|tag| (tag.key.as_str(), tag.value.as_str()))
        .collect();
    let new_map: BTreeMap<&str, &str> = new
        .iter()
        .map(|tag| (tag.key.as_str(), tag.value.as_str()))
        .collect();

    let to_delete = old_map
        .iter()
        .filter(|(key, value)| new_map.get(*key) != Some(*value))
        .map(|(key, value)| Tag::new(*key, *value))
        .collect();
    let to_create = new_map
        .iter()
        .filter(|(key, value)| old_map.get(*key) != Some(*value))
        .map(|(key, value)| Tag::new(*key, *value))
        .collect();
    (to_delete, to_create)
}

/// Run a batch tag action on a resource
pub async fn batch(
    service: &ServiceClient<'_>,
    resource_path: &str,
    action: &str,
    tags: &[Tag],
) -> Result<(), ApiError> {
    if tags.is_empty() {
        return Ok(());
    }
    debug!(resource_path, action, count = tags.len(), "Update tags");
    service
        .post(
            &format!("{resource_path}/tags/action"),
            &json!({ "action": action, "tags": tags }),
        )
        .await?;
    Ok(())
}

/// Set the tags of a newly created resource
pub async fn create(
    service: &ServiceClient<'_>,
    resource_path: &str,
    tags: &ValueMap<'_, ValueString<'_>>,
) -> Result<(), ApiError> {
    batch(service, resource_path, "create", &expand(tags)).await
}

/// Apply the difference between two tag sets
pub async fn update(
    service: &ServiceClient<'_>,
    resource_path: &str,
    old: &ValueMap<'_, ValueString<'_>>,
    new: &ValueMap<'_, ValueString<'_>>,
) -> Result<(), ApiError> {
    let (to_delete, to_create) = diff(&expand(old), &expand(new));
    batch(service, resource_path, "delete", &to_delete).await?;
    batch(service, resource_path, "create", &to_create).await
}

/// Read the tags of a resource
pub async fn get(service: &ServiceClient<'_>, resource_path: &str) -> Result<Vec<Tag>, ApiError> {
    let mut response = service.get(&format!("{resource_path}/tags")).await?;
    match response.get_mut("tags").map(serde_json::Value::take) {
        Some(tags) if tags.is_array() => Ok(serde_json::from_value(tags)?),
        _ => Ok(Vec::new()),
    }
}

/// Tags embedded in a resource body (`[{key, value}]`)
pub fn from_json(json: &serde_json::Value) -> Vec<Tag> {
    json.as_array()
        .into_iter()
        .flatten()
        .filter_map(|tag| serde_json::from_value(tag.clone()).ok())
        .collect()
}
