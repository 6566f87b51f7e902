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

//! Signed REST client
//!
//! A [`Client`] is built once when the provider is configured and shared by
//! every resource through a [`ClientHandle`]. Per-service calls go through a
//! [`ServiceClient`], bound to a region and its project.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use reqwest::{header::AUTHORIZATION, Method, StatusCode};
use serde_json::Value as Json;
use time::OffsetDateTime;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

use tf_provider::Diagnostics;
use tf_provider::value::{Value, ValueString};

use crate::config::Config;
use crate::wait::StateChangeConf;

mod error;
pub mod signer;

pub use error::ApiError;
use signer::{sdk_date, Signer, HEADER_DATE};

pub const USER_AGENT: &str = "terraform-provider-iac";

/// Requests that take longer are aborted
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug)]
pub struct Client {
    config: Config,
    http: reqwest::Client,
    signer: Signer,
    projects: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
    backoff_unit: Duration,
    poll_interval: Option<Duration>,
}

impl Client {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(config.insecure)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let mut projects = HashMap::new();
        if let Some(project_id) = &config.project_id {
            projects.insert(
                config.region.clone(),
                Arc::new(OnceCell::from(project_id.clone())),
            );
        }

        Ok(Self {
            signer: Signer::new(&config.access_key, &config.secret_key),
            config,
            http,
            projects: Mutex::new(projects),
            backoff_unit: Duration::from_secs(60),
            poll_interval: None,
        })
    }

    /// Change the unit of the back-off on throttled requests (one minute by default)
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Poll every wait loop at a fixed pace, without initial delay
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Apply the pace of the client to a wait loop
    pub fn pace(&self, mut conf: StateChangeConf) -> StateChangeConf {
        if let Some(interval) = self.poll_interval {
            conf.delay = Duration::ZERO;
            conf.poll_interval = interval;
            conf.min_timeout = Duration::ZERO;
        }
        conf
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Region of a resource, falling back on the provider region
    pub fn region<'a>(&'a self, region: &'a ValueString<'_>) -> &'a str {
        crate::utils::region_or(region, &self.config.region)
    }

    /// Project of a region
    ///
    /// Projects are looked up by name through IAM and cached for the lifetime of the client.
    /// Concurrent lookups of the same region share a single request.
    pub async fn project_id(&self, region: &str) -> Result<String, ApiError> {
        let cell = self.project_cell(region);
        cell.get_or_try_init(|| self.lookup_project(region))
            .await
            .cloned()
    }

    fn project_cell(&self, region: &str) -> Arc<OnceCell<String>> {
        let mut projects = self.projects.lock().unwrap_or_else(PoisonError::into_inner);
        projects.entry(region.to_owned()).or_default().clone()
    }

    async fn lookup_project(&self, region: &str) -> Result<String, ApiError> {
        info!(region, "Load project id");
        let url = Url::parse_with_params(
            &format!("{}/projects", self.config.auth_url),
            &[("name", region)],
        )?;
        let response = self.send(Method::GET, url, None, None).await?;

        let mut found = None;
        for project in response
            .get("projects")
            .and_then(Json::as_array)
            .into_iter()
            .flatten()
        {
            let (Some(name), Some(id)) = (
                project.get("name").and_then(Json::as_str),
                project.get("id").and_then(Json::as_str),
            ) else {
                continue;
            };
            if name == region {
                found = Some(id.to_owned());
            } else {
                // other regions listed in the answer are cached as well
                _ = self.project_cell(name).set(id.to_owned());
            }
        }

        found.ok_or_else(|| {
            ApiError::Other(format!("Wrong name or no access to the region: {region}"))
        })
    }

    /// Client for a service in a region
    pub async fn service(&self, service: &str, region: &str) -> Result<ServiceClient<'_>, ApiError> {
        let project_id = self.project_id(region).await?;
        Ok(ServiceClient {
            client: self,
            endpoint: self.config.endpoint(service, region),
            region: region.to_owned(),
            project_id,
        })
    }

    /// Client for a service, reporting failures as diagnostics
    pub async fn connect(
        &self,
        diags: &mut Diagnostics,
        service: &str,
        region: &str,
    ) -> Option<ServiceClient<'_>> {
        match self.service(service, region).await {
            Ok(service) => Some(service),
            Err(err) => {
                diags.root_error(
                    format!("Failed to create the `{service}` client"),
                    err.to_string(),
                );
                None
            }
        }
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Json>,
        project_id: Option<&str>,
    ) -> Result<Json, ApiError> {
        let body = body.map(serde_json::to_vec).transpose()?.unwrap_or_default();
        let mut retries = 0;
        loop {
            let request = self.sign(method.clone(), &url, &body, project_id)?;
            debug!(%method, %url, "Send request");
            let response = self.http.execute(request).await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS && retries < self.config.max_retries {
                let minutes = 2u32.saturating_pow(retries).min(30);
                warn!(%url, minutes, "Received StatusTooManyRequests response code, backing off");
                tokio::time::sleep(self.backoff_unit * minutes).await;
                retries += 1;
                continue;
            }

            let bytes = response.bytes().await?;
            if !status.is_success() {
                debug!(%method, %url, %status, "Request failed");
                return Err(ApiError::from_response(
                    status.as_u16(),
                    method.as_str(),
                    url.as_str(),
                    &bytes,
                ));
            }
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(Json::Null);
            }
            return Ok(serde_json::from_slice(&bytes)?);
        }
    }

    fn sign(
        &self,
        method: Method,
        url: &Url,
        body: &[u8],
        project_id: Option<&str>,
    ) -> Result<reqwest::Request, ApiError> {
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_owned(),
            (None, _) => return Err(ApiError::Other(format!("missing host in `{url}`"))),
        };

        let mut headers = BTreeMap::from([
            ("Host".to_owned(), host),
            (HEADER_DATE.to_owned(), sdk_date(OffsetDateTime::now_utc())?),
        ]);
        if !body.is_empty() {
            headers.insert("Content-Type".to_owned(), "application/json".to_owned());
        }
        match (project_id, &self.config.domain_id) {
            (Some(project_id), _) => {
                headers.insert("X-Project-Id".to_owned(), project_id.to_owned());
            }
            (None, Some(domain_id)) => {
                headers.insert("X-Domain-Id".to_owned(), domain_id.clone());
            }
            (None, None) => (),
        }
        if let Some(token) = &self.config.security_token {
            headers.insert("X-Security-Token".to_owned(), token.clone());
        }

        let authorization = self
            .signer
            .authorization(method.as_str(), url, &headers, body)?;

        let mut builder = self
            .http
            .request(method, url.clone())
            .header(AUTHORIZATION, authorization);
        for (name, value) in headers.iter().filter(|(name, _)| *name != "Host") {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !body.is_empty() {
            builder = builder.body(body.to_vec());
        }
        Ok(builder.build()?)
    }
}

/// Client bound to a service endpoint and a project
#[derive(Debug, Clone)]
pub struct ServiceClient<'c> {
    client: &'c Client,
    endpoint: String,
    region: String,
    project_id: String,
}

impl ServiceClient<'_> {
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn config(&self) -> &Config {
        self.client.config()
    }

    /// Resolve a path relative to the service endpoint
    ///
    /// `{project_id}` placeholders are replaced by the project of the client.
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let path = path.replace("{project_id}", &self.project_id);
        let mut url = Url::parse(&self.endpoint)?.join(path.trim_start_matches('/'))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Json>,
    ) -> Result<Json, ApiError> {
        let url = self.url(path, query)?;
        self.client
            .send(method, url, body, Some(&self.project_id))
            .await
    }

    pub async fn get(&self, path: &str) -> Result<Json, ApiError> {
        self.request(Method::GET, path, &[], None).await
    }

    pub async fn list(&self, path: &str, query: &[(&str, &str)]) -> Result<Json, ApiError> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Json) -> Result<Json, ApiError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Json) -> Result<Json, ApiError> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Json, ApiError> {
        self.request(Method::DELETE, path, &[], None).await
    }
}

/// Client shared between the provider and its resources
///
/// The client only exists once the provider has been configured.
#[derive(Debug, Clone, Default)]
pub struct ClientHandle(Arc<RwLock<Option<Arc<Client>>>>);

impl ClientHandle {
    pub fn set(&self, client: Client) {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(client));
    }

    pub fn client(&self) -> Option<Arc<Client>> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get the client, reporting an error if the provider has not been configured
    pub fn get(&self, diags: &mut Diagnostics) -> Option<Arc<Client>> {
        let client = self.client();
        if client.is_none() {
            diags.root_error(
                "Provider is not configured",
                "The provider must be configured before resources or data sources can be used.",
            );
        }
        client
    }

    /// Default the region of a planned resource to the provider region
    pub fn plan_region(&self, region: &mut ValueString<'_>) {
        if region.is_null() {
            *region = match self.client() {
                Some(client) => Value::Value(client.config().region.clone().into()),
                None => Value::Unknown,
            };
        }
    }

    /// Default the enterprise project of a planned resource to the provider one
    ///
    /// Without a provider default, the project is only known after creation.
    pub fn plan_enterprise_project(&self, enterprise_project_id: &mut ValueString<'_>) {
        if enterprise_project_id.is_null() {
            *enterprise_project_id = self
                .client()
                .and_then(|client| client.config().enterprise_project_id.clone())
                .map_or(Value::Unknown, |id| Value::Value(id.into()));
        }
    }
}
