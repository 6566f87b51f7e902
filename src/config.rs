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

//! Provider configuration
//!
//! Every attribute of the provider block can also be given through a `HW_*`
//! environment variable. Values set in the configuration take precedence.

use std::collections::BTreeMap;
use std::env;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use tf_provider::{map, AttributePath, Diagnostics};
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueBool, ValueMap, ValueNumber, ValueString};

use crate::utils::{attribute, string_map, WithSchema};

pub const DEFAULT_CLOUD: &str = "myhuaweicloud.com";
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Services that are not bound to a region
const GLOBAL_SERVICES: &[&str] = &["cdn", "dns", "eps", "bss", "tms"];

/// Provider block as written by the practitioner
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderState<'a> {
    #[serde(borrow = "'a")]
    pub region: ValueString<'a>,
    pub access_key: ValueString<'a>,
    pub secret_key: ValueString<'a>,
    pub security_token: ValueString<'a>,
    pub project_id: ValueString<'a>,
    pub domain_id: ValueString<'a>,
    pub domain_name: ValueString<'a>,
    pub auth_url: ValueString<'a>,
    pub cloud: ValueString<'a>,
    pub endpoints: ValueMap<'a, ValueString<'a>>,
    pub insecure: ValueBool,
    pub enterprise_project_id: ValueString<'a>,
    pub max_retries: ValueNumber,
}

impl WithSchema for ProviderState<'_> {
    fn schema() -> Schema {
        let optional_string = |description: &'static str| {
            attribute(
                AttributeType::String,
                AttributeConstraint::Optional,
                description,
            )
        };
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "region" => optional_string("The region to use (`HW_REGION_NAME`)"),
                    "access_key" => optional_string("The access key for API operations (`HW_ACCESS_KEY`)"),
                    "secret_key" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("The secret key for API operations (`HW_SECRET_KEY`)"),
                        constraint: AttributeConstraint::Optional,
                        sensitive: true,
                        ..Default::default()
                    },
                    "security_token" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Security token of temporary credentials (`HW_SECURITY_TOKEN`)"),
                        constraint: AttributeConstraint::Optional,
                        sensitive: true,
                        ..Default::default()
                    },
                    "project_id" => optional_string("The ID of the project to login with (`HW_PROJECT_ID`)"),
                    "domain_id" => optional_string("The ID of the domain to scope to (`HW_DOMAIN_ID`)"),
                    "domain_name" => optional_string("The name of the domain to scope to (`HW_DOMAIN_NAME`)"),
                    "auth_url" => optional_string("The identity authentication URL (`HW_AUTH_URL`)"),
                    "cloud" => optional_string("The endpoint of cloud provider (`HW_CLOUD`), defaults to myhuaweicloud.com"),
                    "endpoints" => attribute(
                        string_map(),
                        AttributeConstraint::Optional,
                        "The custom endpoints used to override the default endpoint URL",
                    ),
                    "insecure" => attribute(
                        AttributeType::Bool,
                        AttributeConstraint::Optional,
                        "Trust self-signed certificates (`HW_INSECURE`)",
                    ),
                    "enterprise_project_id" => optional_string("Default enterprise project ID of resources (`HW_ENTERPRISE_PROJECT_ID`)"),
                    "max_retries" => attribute(
                        AttributeType::Number,
                        AttributeConstraint::Optional,
                        "Maximum number of retries on throttled requests (`HW_MAX_RETRIES`)",
                    ),
                },
                description: Description::plain("Huawei Cloud provider"),
                ..Default::default()
            },
        }
    }
}

/// Resolved provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub security_token: Option<String>,
    pub project_id: Option<String>,
    pub domain_id: Option<String>,
    pub domain_name: Option<String>,
    pub auth_url: String,
    pub cloud: String,
    pub endpoints: BTreeMap<String, String>,
    pub insecure: bool,
    pub enterprise_project_id: Option<String>,
    pub max_retries: u32,
}

fn pick(value: &ValueString, var: &str, lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    value
        .as_deref_option()
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .or_else(|| lookup(var).filter(|s| !s.is_empty()))
}

impl Config {
    /// Resolve the configuration against the process environment
    pub fn from_state(diags: &mut Diagnostics, state: &ProviderState) -> Option<Self> {
        Self::resolve(diags, state, |var| env::var(var).ok())
    }

    /// Resolve the configuration with a custom environment
    pub fn resolve(
        diags: &mut Diagnostics,
        state: &ProviderState,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<Self> {
        let region = pick(&state.region, "HW_REGION_NAME", &lookup);
        let access_key = pick(&state.access_key, "HW_ACCESS_KEY", &lookup);
        let secret_key = pick(&state.secret_key, "HW_SECRET_KEY", &lookup);

        let Some(region) = region else {
            diags.error(
                "Missing region",
                "The region must be set with the `region` attribute or the `HW_REGION_NAME` environment variable.",
                AttributePath::new("region"),
            );
            return None;
        };
        let (access_key, secret_key) = match (access_key, secret_key) {
            (Some(ak), Some(sk)) => (ak, sk),
            (None, None) => {
                diags.root_error(
                    "Missing credentials",
                    "Both `access_key` and `secret_key` must be set, either in the provider block or with `HW_ACCESS_KEY` and `HW_SECRET_KEY`.",
                );
                return None;
            }
            (Some(_), None) => {
                diags.error_short(
                    "`secret_key` must be set along with `access_key`",
                    AttributePath::new("secret_key"),
                );
                return None;
            }
            (None, Some(_)) => {
                diags.error_short(
                    "`access_key` must be set along with `secret_key`",
                    AttributePath::new("access_key"),
                );
                return None;
            }
        };

        let cloud =
            pick(&state.cloud, "HW_CLOUD", &lookup).unwrap_or_else(|| DEFAULT_CLOUD.to_owned());

        let endpoints: BTreeMap<String, String> = state
            .endpoints
            .iter()
            .flatten()
            .filter_map(|(k, v)| Some((k.to_string(), v.as_deref_option()?.to_owned())))
            .map(|(k, v)| (k, normalize_endpoint(v)))
            .collect();

        let auth_url = pick(&state.auth_url, "HW_AUTH_URL", &lookup)
            .or_else(|| {
                endpoints
                    .get("iam")
                    .map(|endpoint| format!("{endpoint}v3"))
            })
            .unwrap_or_else(|| format!("https://iam.{region}.{cloud}/v3"));

        let insecure = match state.insecure {
            Value::Value(insecure) => insecure,
            _ => lookup("HW_INSECURE")
                .map(|s| s == "true" || s == "1")
                .unwrap_or_default(),
        };

        let max_retries = match state.max_retries {
            Value::Value(n) => match u32::try_from(n) {
                Ok(n) => n,
                Err(_) => {
                    diags.error(
                        "Invalid `max_retries`",
                        format!("`max_retries` must be between 0 and {}, got {n}", u32::MAX),
                        AttributePath::new("max_retries"),
                    );
                    return None;
                }
            },
            _ => match lookup("HW_MAX_RETRIES").map(|s| s.parse::<u32>()) {
                Some(Ok(n)) => n,
                Some(Err(err)) => {
                    diags.root_error("Invalid `HW_MAX_RETRIES`", err.to_string());
                    return None;
                }
                None => DEFAULT_MAX_RETRIES,
            },
        };

        Some(Self {
            region,
            access_key,
            secret_key,
            security_token: pick(&state.security_token, "HW_SECURITY_TOKEN", &lookup),
            project_id: pick(&state.project_id, "HW_PROJECT_ID", &lookup),
            domain_id: pick(&state.domain_id, "HW_DOMAIN_ID", &lookup),
            domain_name: pick(&state.domain_name, "HW_DOMAIN_NAME", &lookup),
            auth_url: auth_url.trim_end_matches('/').to_owned(),
            cloud,
            endpoints,
            insecure,
            enterprise_project_id: pick(
                &state.enterprise_project_id,
                "HW_ENTERPRISE_PROJECT_ID",
                &lookup,
            ),
            max_retries,
        })
    }

    /// Base URL of a service in a region, always ending with `/`
    pub fn endpoint(&self, service: &str, region: &str) -> String {
        if let Some(endpoint) = self.endpoints.get(service) {
            return endpoint.clone();
        }
        if GLOBAL_SERVICES.contains(&service) {
            format!("https://{service}.{}/", self.cloud)
        } else {
            format!("https://{service}.{region}.{}/", self.cloud)
        }
    }

    /// Enterprise project of a resource, falling back on the provider default
    pub fn enterprise_project_id(&self, value: &ValueString) -> Option<String> {
        value
            .as_deref_option()
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .or_else(|| self.enterprise_project_id.clone())
    }

    /// Check that an endpoint override is an absolute URL
    pub fn check_endpoints(&self) -> Result<()> {
        for (service, endpoint) in &self.endpoints {
            url::Url::parse(endpoint)
                .map_err(|err| anyhow!("invalid endpoint for `{service}`: {err}"))?;
        }
        Ok(())
    }
}

fn normalize_endpoint(mut endpoint: String) -> String {
    if !endpoint.ends_with('/') {
        endpoint.push('/');
    }
    endpoint
}
