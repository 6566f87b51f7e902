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

use std::future::Future;

use serde_json::Value as Json;
use tracing::debug;

use crate::client::{ApiError, ServiceClient};

/// How a list API pages its results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStyle {
    /// `limit` + `marker`, the id of the last element of the previous page
    Marker { limit: usize },
    /// `limit` + `offset`, the number of elements already read
    Offset { limit: usize },
}

impl PageStyle {
    fn limit(&self) -> usize {
        match *self {
            PageStyle::Marker { limit } | PageStyle::Offset { limit } => limit,
        }
    }
}

/// Fetch pages until an empty or incomplete page is returned
///
/// `fetch` gets the paging query parameters and returns the elements of the page.
pub async fn paginate<F, Fut, E>(style: PageStyle, mut fetch: F) -> Result<Vec<Json>, E>
where
    F: FnMut(Vec<(&'static str, String)>) -> Fut,
    Fut: Future<Output = Result<Vec<Json>, E>>,
{
    let limit = style.limit();
    let mut all = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let mut query = vec![("limit", limit.to_string())];
        match style {
            PageStyle::Marker { .. } => {
                if let Some(marker) = &marker {
                    query.push(("marker", marker.clone()));
                }
            }
            PageStyle::Offset { .. } => {
                if !all.is_empty() {
                    query.push(("offset", all.len().to_string()));
                }
            }
        }

        let page = fetch(query).await?;
        let len = page.len();
        debug!(len, total = all.len() + len, "Fetched page");
        if len == 0 {
            break;
        }
        marker = page
            .last()
            .and_then(|item| item.get("id"))
            .and_then(Json::as_str)
            .map(str::to_owned);
        all.extend(page);

        if len < limit {
            break;
        }
        if matches!(style, PageStyle::Marker { .. }) && marker.is_none() {
            break;
        }
    }

    Ok(all)
}

/// List every element of a paginated API
///
/// `items_key` names the array holding the elements in the response body.
pub async fn list_all(
    service: &ServiceClient<'_>,
    path: &str,
    query: &[(&str, &str)],
    items_key: &str,
    style: PageStyle,
) -> Result<Vec<Json>, ApiError> {
    paginate(style, move |paging| async move {
        let query: Vec<(&str, &str)> = query
            .iter()
            .copied()
            .chain(paging.iter().map(|(k, v)| (*k, v.as_str())))
            .collect();
        let mut response = service.list(path, &query).await?;
        match response.get_mut(items_key).map(Json::take) {
            Some(Json::Array(items)) => Ok(items),
            Some(Json::Null) | None => Ok(Vec::new()),
            Some(other) => Err(ApiError::Other(format!(
                "unexpected `{items_key}` in list response: {other}"
            ))),
        }
    })
    .await
}
