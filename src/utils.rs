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

use std::net::IpAddr;

use async_trait::async_trait;
use serde_json::Value as Json;
use tracing::warn;

use tf_provider::{AttributePath, Diagnostics};
use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Description, Schema};
use tf_provider::value::{Value, ValueBool, ValueList, ValueNumber, ValueString};

use crate::client::ApiError;

pub(crate) trait WithSchema {
    fn schema() -> Schema;
}

#[async_trait]
pub(crate) trait WithValidate {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath);
}

pub(crate) trait WithNormalize {
    fn normalize(&mut self, diags: &mut Diagnostics);
}

/// Build an attribute with the given type and constraint
pub(crate) fn attribute(
    attr_type: AttributeType,
    constraint: AttributeConstraint,
    description: &'static str,
) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

pub(crate) fn string_list() -> AttributeType {
    AttributeType::List(AttributeType::String.into())
}

pub(crate) fn string_set() -> AttributeType {
    AttributeType::Set(AttributeType::String.into())
}

pub(crate) fn string_map() -> AttributeType {
    AttributeType::Map(AttributeType::String.into())
}

/// Unwrap the state given by the framework
///
/// Configured states are always known objects, a null here means the framework
/// handed over something that cannot be processed.
pub(crate) fn known<T>(diags: &mut Diagnostics, state: Value<T>) -> Option<T> {
    match state {
        Value::Value(state) => Some(state),
        Value::Null => {
            diags.root_error_short("Unexpected null state");
            None
        }
        Value::Unknown => {
            diags.root_error_short("Unexpected unknown state");
            None
        }
    }
}

/// Mark a value unknown if the practitioner left it empty
pub(crate) fn unknown_if_null<T>(value: &mut Value<T>) {
    if value.is_null() {
        *value = Value::Unknown;
    }
}

/// Record a replacement trigger if a value changed
pub(crate) fn replace_if_changed<T: PartialEq>(
    triggers: &mut Vec<AttributePath>,
    path: AttributePath,
    prior: &Value<T>,
    proposed: &Value<T>,
) {
    if prior != proposed {
        triggers.push(path);
    }
}

/// Turn a failed read into a null state when the object no longer exists
pub(crate) fn check_deleted<T>(
    diags: &mut Diagnostics,
    err: ApiError,
    summary: &'static str,
) -> Option<Value<T>> {
    if err.is_not_found() {
        warn!(%err, "Resource is gone, removing it from the state");
        Some(Value::Null)
    } else {
        diags.root_error(summary, err.to_string());
        None
    }
}

/// Id of a newly created object
///
/// A response without id is reported as a failed creation.
pub(crate) fn created_id(
    diags: &mut Diagnostics,
    id: &Json,
    summary: &'static str,
) -> Option<String> {
    match id.as_str().filter(|id| !id.is_empty()) {
        Some(id) => Some(id.to_owned()),
        None => {
            diags.root_error(summary, "The API response does not contain the id of the new object");
            None
        }
    }
}

pub(crate) fn bool_or(value: &ValueBool, default: bool) -> bool {
    value.as_ref_option().copied().unwrap_or(default)
}

pub(crate) fn is_ip(s: &str) -> bool {
    s.parse::<IpAddr>().is_ok()
}

/// `address/prefix`, with a prefix no longer than the address
pub(crate) fn is_cidr(s: &str) -> bool {
    let Some((address, prefix)) = s.split_once('/') else {
        return false;
    };
    let max = match address.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => 32,
        Ok(IpAddr::V6(_)) => 128,
        Err(_) => return false,
    };
    prefix.parse::<u8>().is_ok_and(|prefix| prefix <= max)
}

/// Known, non empty string
pub(crate) fn non_empty<'a>(value: &'a ValueString<'_>) -> Option<&'a str> {
    value.as_deref_option().filter(|s| !s.is_empty())
}

/// Region of a resource, falling back on the region of the provider
pub(crate) fn region_or<'a>(value: &'a ValueString<'_>, default: &'a str) -> &'a str {
    non_empty(value).unwrap_or(default)
}

pub(crate) fn json_str<'a>(json: &Json, key: &str) -> ValueString<'a> {
    match json.get(key) {
        Some(Json::String(s)) => Value::Value(Cow::Owned(s.clone())),
        Some(Json::Number(n)) => Value::Value(Cow::Owned(n.to_string())),
        Some(Json::Bool(b)) => Value::Value(Cow::Owned(b.to_string())),
        _ => Value::Null,
    }
}

/// String field where an empty string means the attribute is not set
pub(crate) fn json_non_empty<'a>(json: &Json, key: &str) -> ValueString<'a> {
    match json_str(json, key) {
        Value::Value(s) if s.is_empty() => Value::Null,
        value => value,
    }
}

pub(crate) fn json_i64(json: &Json, key: &str) -> ValueNumber {
    match json.get(key) {
        Some(Json::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .into(),
        Some(Json::String(s)) => s.parse::<i64>().ok().into(),
        _ => Value::Null,
    }
}

pub(crate) fn json_bool(json: &Json, key: &str) -> ValueBool {
    match json.get(key) {
        Some(Json::Bool(b)) => Value::Value(*b),
        Some(Json::String(s)) => s.parse::<bool>().ok().into(),
        _ => Value::Null,
    }
}

pub(crate) fn json_str_list<'a>(json: &Json, key: &str) -> ValueList<ValueString<'a>> {
    match json.get(key) {
        Some(Json::Array(items)) => Value::Value(
            items
                .iter()
                .filter_map(Json::as_str)
                .map(|s| Value::Value(Cow::Owned(s.to_owned())))
                .collect(),
        ),
        _ => Value::Null,
    }
}

/// Whether a listed object matches a filter, unset filters match everything
pub(crate) fn matches(item: &Json, key: &str, filter: &ValueString) -> bool {
    match non_empty(filter) {
        Some(expected) => item[key].as_str() == Some(expected),
        None => true,
    }
}

/// Collect the known strings of a list
pub(crate) fn strings<'a>(list: &'a ValueList<ValueString<'_>>) -> Vec<&'a str> {
    list.iter()
        .flatten()
        .filter_map(|s| s.as_deref_option())
        .collect()
}

pub(crate) fn string_map_of<'a>(
    map: &'a tf_provider::value::ValueMap<'_, ValueString<'_>>,
) -> BTreeMap<&'a str, &'a str> {
    map.iter()
        .flatten()
        .filter_map(|(k, v)| Some((k.as_ref(), v.as_deref_option()?)))
        .collect()
}

/// Remove nulls, empty strings and empty collections from a request body
pub(crate) fn prune(value: Json) -> Json {
    match value {
        Json::Object(map) => Json::Object(
            map.into_iter()
                .map(|(k, v)| (k, prune(v)))
                .filter(|(_, v)| !is_empty(v))
                .collect(),
        ),
        Json::Array(items) => Json::Array(
            items
                .into_iter()
                .map(prune)
                .filter(|v| !is_empty(v))
                .collect(),
        ),
        value => value,
    }
}

fn is_empty(value: &Json) -> bool {
    match value {
        Json::Null => true,
        Json::String(s) => s.is_empty(),
        Json::Array(items) => items.is_empty(),
        Json::Object(map) => map.is_empty(),
        _ => false,
    }
}
